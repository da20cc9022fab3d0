use serde_json::json;

use patchbase::{
    core::store::{DocStore, StoreError},
    query::{
        filter::{Filter, PathSegment},
        find::{Direction, Order, Query},
    },
};

fn seeded() -> DocStore {
    let store = DocStore::in_memory();
    store.create("1", json!({"age": 10, "name": "Ann"})).expect("create");
    store.create("2", json!({"age": 30, "name": "bob"})).expect("create");
    store.create("3", json!({"age": 20, "name": "Cara"})).expect("create");
    store
}

fn keys(store: &DocStore, query: &Query) -> Vec<String> {
    store
        .find(query)
        .expect("find")
        .into_iter()
        .map(|doc| doc.key)
        .collect()
}

#[test]
fn gt_with_ordering_and_limit() {
    let store = seeded();
    let query = Query {
        filter: Filter::And(vec![Filter::Gt {
            path: vec!["age".into()],
            value: json!(15),
        }]),
        limit: Some(1),
        skip: None,
        order_by: vec![Order {
            path: vec!["age".into()],
            direction: Direction::Asc,
        }],
    };

    let found = store.find(&query).expect("find");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].key, "3");
    assert_eq!(found[0].value, json!({"age": 20, "name": "Cara"}));
}

#[test]
fn comparison_and_equality_operators() {
    let store = seeded();

    let eq = Query::new(Filter::Eq {
        path: vec!["age".into()],
        value: json!(30),
    });
    assert_eq!(keys(&store, &eq), vec!["2"]);

    let ne = Query::new(Filter::Ne {
        path: vec!["age".into()],
        value: json!(30),
    });
    assert_eq!(keys(&store, &ne), vec!["1", "3"]);

    let lte = Query::new(Filter::Lte {
        path: vec!["age".into()],
        value: json!(20),
    });
    assert_eq!(keys(&store, &lte), vec!["1", "3"]);

    let gte = Query::new(Filter::Gte {
        path: vec!["age".into()],
        value: json!(20),
    });
    assert_eq!(keys(&store, &gte), vec!["2", "3"]);

    let lt = Query::new(Filter::Lt {
        path: vec!["age".into()],
        value: json!(10),
    });
    assert!(keys(&store, &lt).is_empty());

    // String comparison is lexicographic.
    let names = Query::new(Filter::Gt {
        path: vec!["name".into()],
        value: json!("Ann"),
    });
    assert_eq!(keys(&store, &names), vec!["2", "3"]);
}

#[test]
fn logical_operators_compose() {
    let store = seeded();

    let both = Query::new(Filter::And(vec![
        Filter::Gt {
            path: vec!["age".into()],
            value: json!(15),
        },
        Filter::Lt {
            path: vec!["age".into()],
            value: json!(25),
        },
    ]));
    assert_eq!(keys(&store, &both), vec!["3"]);

    let either = Query::new(Filter::Or(vec![
        Filter::Eq {
            path: vec!["age".into()],
            value: json!(10),
        },
        Filter::Eq {
            path: vec!["age".into()],
            value: json!(30),
        },
    ]));
    assert_eq!(keys(&store, &either), vec!["1", "2"]);

    let negated = Query::new(Filter::Not(Box::new(Filter::Gt {
        path: vec!["age".into()],
        value: json!(15),
    })));
    assert_eq!(keys(&store, &negated), vec!["1"]);

    // Vacuous n-ary filters.
    assert_eq!(keys(&store, &Query::new(Filter::And(vec![]))).len(), 3);
    assert!(keys(&store, &Query::new(Filter::Or(vec![]))).is_empty());
}

#[test]
fn existence_and_null_checks() {
    let store = DocStore::in_memory();
    store.create("a", json!({"opt": 1})).expect("create");
    store.create("b", json!({"opt": null})).expect("create");
    store.create("c", json!({})).expect("create");

    let exists = Query::new(Filter::Exists {
        path: vec!["opt".into()],
    });
    assert_eq!(keys(&store, &exists), vec!["a", "b"]);

    let is_null = Query::new(Filter::IsNull {
        path: vec!["opt".into()],
    });
    assert_eq!(keys(&store, &is_null), vec!["b"]);

    // An absent leaf is unequal to everything and incomparable.
    let ne = Query::new(Filter::Ne {
        path: vec!["opt".into()],
        value: json!(1),
    });
    assert_eq!(keys(&store, &ne), vec!["b", "c"]);
    let gt = Query::new(Filter::Gt {
        path: vec!["opt".into()],
        value: json!(0),
    });
    assert_eq!(keys(&store, &gt), vec!["a"]);
}

#[test]
fn string_operators() {
    let store = seeded();

    let prefix = Query::new(Filter::StartsWith {
        path: vec!["name".into()],
        value: "C".to_string(),
    });
    assert_eq!(keys(&store, &prefix), vec!["3"]);

    let pattern = Query::new(Filter::Matches {
        path: vec!["name".into()],
        pattern: "^b".to_string(),
        case_insensitive: false,
    });
    assert_eq!(keys(&store, &pattern), vec!["2"]);

    let any_case = Query::new(Filter::Matches {
        path: vec!["name".into()],
        pattern: "^a".to_string(),
        case_insensitive: true,
    });
    assert_eq!(keys(&store, &any_case), vec!["1"]);

    // Non-string leaves never match string operators.
    let on_number = Query::new(Filter::StartsWith {
        path: vec!["age".into()],
        value: "1".to_string(),
    });
    assert!(keys(&store, &on_number).is_empty());

    let bad = Query::new(Filter::Matches {
        path: vec!["name".into()],
        pattern: "(".to_string(),
        case_insensitive: false,
    });
    assert!(matches!(store.find(&bad), Err(StoreError::Input(_))));
}

#[test]
fn cross_type_comparisons_are_false() {
    let store = DocStore::in_memory();
    store.create("a", json!({"v": 5})).expect("create");
    store.create("b", json!({"v": "5"})).expect("create");

    let gt_number = Query::new(Filter::Gt {
        path: vec!["v".into()],
        value: json!(1),
    });
    assert_eq!(keys(&store, &gt_number), vec!["a"]);

    let gt_string = Query::new(Filter::Gt {
        path: vec!["v".into()],
        value: json!("1"),
    });
    assert_eq!(keys(&store, &gt_string), vec!["b"]);
}

#[test]
fn nested_paths_walk_objects_and_arrays() {
    let store = DocStore::in_memory();
    store
        .create("a", json!({"profile": {"tags": ["alpha", "beta"]}}))
        .expect("create");
    store
        .create("b", json!({"profile": {"tags": ["gamma"]}}))
        .expect("create");

    let query = Query::new(Filter::Eq {
        path: vec![
            PathSegment::from("profile"),
            PathSegment::from("tags"),
            PathSegment::from(1usize),
        ],
        value: json!("beta"),
    });
    assert_eq!(keys(&store, &query), vec!["a"]);
}

#[test]
fn tombstones_are_excluded_from_scans() {
    let store = seeded();
    store.remove("2").expect("remove");

    let all = Query::new(Filter::And(vec![]));
    assert_eq!(keys(&store, &all), vec!["1", "3"]);
}

#[test]
fn ordering_is_stable_and_multi_key() {
    let store = DocStore::in_memory();
    store.create("a", json!({"group": 2, "n": 1})).expect("create");
    store.create("b", json!({"group": 1, "n": 2})).expect("create");
    store.create("c", json!({"group": 1, "n": 1})).expect("create");
    store.create("d", json!({"n": 9})).expect("create");

    let query = Query {
        filter: Filter::And(vec![]),
        limit: None,
        skip: None,
        order_by: vec![
            Order {
                path: vec!["group".into()],
                direction: Direction::Asc,
            },
            Order {
                path: vec!["n".into()],
                direction: Direction::Desc,
            },
        ],
    };

    // Missing group sorts first; within group 1, n descends.
    assert_eq!(keys(&store, &query), vec!["d", "b", "c", "a"]);

    // Ties keep ascending key scan order.
    let tie = Query {
        filter: Filter::And(vec![]),
        limit: None,
        skip: None,
        order_by: vec![Order {
            path: vec!["group".into()],
            direction: Direction::Asc,
        }],
    };
    assert_eq!(keys(&store, &tie), vec!["d", "b", "c", "a"]);
}

#[test]
fn pagination_applies_skip_then_limit() {
    let store = DocStore::in_memory();
    for i in 0..5u64 {
        store
            .create(&format!("k{i}"), json!({"n": i}))
            .expect("create");
    }

    let page = Query {
        filter: Filter::And(vec![]),
        limit: Some(2),
        skip: Some(1),
        order_by: vec![Order {
            path: vec!["n".into()],
            direction: Direction::Asc,
        }],
    };
    assert_eq!(keys(&store, &page), vec!["k1", "k2"]);

    let tail = Query {
        filter: Filter::And(vec![]),
        limit: None,
        skip: Some(4),
        order_by: vec![Order {
            path: vec!["n".into()],
            direction: Direction::Asc,
        }],
    };
    assert_eq!(keys(&store, &tail), vec!["k4"]);

    let beyond = Query {
        filter: Filter::And(vec![]),
        limit: Some(3),
        skip: Some(10),
        order_by: vec![],
    };
    assert!(keys(&store, &beyond).is_empty());
}

#[test]
fn filters_parse_from_json_and_reject_unknown_operators() {
    let parsed = Filter::from_value(json!({
        "and": [
            {"gt": {"path": ["age"], "value": 15}},
            {"startsWith": {"path": ["name"], "value": "C"}}
        ]
    }))
    .expect("parse");

    let store = seeded();
    assert_eq!(keys(&store, &Query::new(parsed)), vec!["3"]);

    let unknown = Filter::from_value(json!({
        "frobnicate": {"path": ["age"], "value": 1}
    }));
    assert!(matches!(unknown, Err(StoreError::Input(_))));
}
