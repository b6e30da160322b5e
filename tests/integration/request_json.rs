#[path = "support.rs"]
mod support;

use requery::request::builder::{ctx, lit, stored};
use requery::request::{AggregateFunc, BinaryOp};
use requery::{Request, Value};
use support::sql;

const ADULT_NAMES: &str = r#"{
    "type": "map",
    "subject": {
        "type": "filter",
        "subject": {"type": "stored_items", "table": "users"},
        "predicate": {
            "type": "binary",
            "op": "ge",
            "subject": {
                "type": "attribute",
                "subject": {"type": "context"},
                "name": "age"
            },
            "other": {"type": "literal", "value": {"t": "Int", "v": 18}}
        }
    },
    "new_value": {
        "type": "attribute",
        "subject": {"type": "context", "depth": 0},
        "name": "name"
    }
}"#;

#[test]
fn json_request_matches_builder() {
    let parsed = Request::from_json(ADULT_NAMES).unwrap();
    let built = stored("users")
        .filter(ctx().attr("age").ge(lit(18)))
        .map(ctx().attr("name"));
    assert_eq!(parsed, built);
    assert_eq!(
        sql(&parsed),
        "SELECT users_1.name FROM users AS users_1 WHERE users_1.age >= 18"
    );
}

#[test]
fn encoding_is_stable() {
    let req = stored("orders").len();
    let json = req.to_json().unwrap();
    assert_eq!(
        json,
        r#"{"type":"aggregate","func":"len","subject":{"type":"stored_items","table":"orders"}}"#
    );
    assert_eq!(Request::from_json(&json).unwrap(), req);
}

#[test]
fn slice_range_defaults_to_open_bounds() {
    let json = r#"{"type": "slice", "subject": {"type": "stored_items", "table": "users"},
                   "range": {"stop": 2}}"#;
    let req = Request::from_json(json).unwrap();
    assert_eq!(req, stored("users").slice(None, Some(2)));
}

#[test]
fn dict_fields_decode_from_object() {
    let json = r#"{"type": "dict", "fields": {
        "total": {"type": "aggregate", "func": "sum", "subject": {
            "type": "map",
            "subject": {"type": "stored_items", "table": "orders"},
            "new_value": {"type": "attribute", "subject": {"type": "context"}, "name": "total"}
        }},
        "flag": {"type": "literal", "value": {"t": "Bool", "v": true}}
    }}"#;
    let req = Request::from_json(json).unwrap();
    let Request::Dict { fields } = &req else {
        panic!("expected dict, got {req:?}");
    };
    assert_eq!(fields.keys().collect::<Vec<_>>(), ["flag", "total"]);
    assert!(matches!(
        fields["total"],
        Request::Aggregate {
            func: AggregateFunc::Sum,
            ..
        }
    ));
    assert_eq!(fields["flag"].as_literal(), Some(&Value::Bool(true)));
    assert_eq!(
        sql(&req),
        "SELECT TRUE AS flag, (SELECT sum(orders_1.total) FROM orders AS orders_1) AS total"
    );
}

#[test]
fn unknown_operator_is_a_decode_error() {
    let json = r#"{"type": "binary", "op": "pow",
                   "subject": {"type": "literal", "value": {"t": "Int", "v": 2}},
                   "other": {"type": "literal", "value": {"t": "Int", "v": 3}}}"#;
    let err = Request::from_json(json).unwrap_err();
    assert!(err.to_string().contains("pow"), "{err}");
    assert_eq!(
        serde_json::to_string(&BinaryOp::Ne).unwrap(),
        "\"ne\""
    );
}
