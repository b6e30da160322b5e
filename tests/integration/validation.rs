#[path = "support.rs"]
mod support;

use requery::request::builder::{ctx, ctx_at, dict, lit, stored};
use requery::request::{RequestKind, SliceRange};
use requery::{CompileError, CompileOptions, Compiler, Reason, Request, ScalarType, Type};
use support::{catalog, rejection};

fn reason(request: &Request) -> Reason {
    match rejection(request) {
        CompileError::Invalid(err) => err.reason,
        other => panic!("expected a validation failure, got {other}"),
    }
}

#[test]
fn context_outside_any_scope_is_rejected() {
    assert_eq!(
        reason(&ctx()),
        Reason::InvalidScope {
            depth: 0,
            available: 0
        }
    );
    assert_eq!(
        reason(&stored("users").filter(ctx_at(-1).attr("age").gt(lit(1)))),
        Reason::InvalidScope {
            depth: -1,
            available: 1
        }
    );
}

#[test]
fn list_operations_reject_scalars_and_records() {
    match reason(&stored("users").one().map(ctx())) {
        Reason::ExpectedList { operation, found } => {
            assert_eq!(operation, RequestKind::Map);
            assert!(found.is_record());
        }
        other => panic!("unexpected reason {other:?}"),
    }
    match reason(&lit(4).sum()) {
        Reason::ExpectedList { found, .. } => assert_eq!(found, Type::Scalar(ScalarType::Int)),
        other => panic!("unexpected reason {other:?}"),
    }
}

#[test]
fn attribute_requires_a_known_field() {
    let err = rejection(&stored("users").map(ctx().attr("email")));
    assert_eq!(err.code(), "UnknownAttribute");
    assert_eq!(
        err.to_string(),
        "[UnknownAttribute] record has no field 'email' (fields: age, id, name) (in Attribute)"
    );
}

#[test]
fn dict_fields_cannot_hold_lists() {
    let req = stored("users").map(dict([("orders", stored("orders"))]));
    assert_eq!(
        reason(&req),
        Reason::ListInRecord {
            field: "orders".into()
        }
    );
}

#[test]
fn slice_bounds_and_step() {
    assert_eq!(
        reason(&stored("users").slice(Some(-1), None)),
        Reason::NegativeSlice { index: -1 }
    );
    let stepped = stored("users").slice_range(SliceRange {
        start: Some(0),
        stop: Some(10),
        step: Some(2),
    });
    assert_eq!(reason(&stepped), Reason::SliceStep { step: 2 });
}

#[test]
fn one_inside_a_scope_is_rejected() {
    let req = stored("users").filter(stored("orders").one().attr("total").gt(lit(1)));
    assert_eq!(reason(&req), Reason::NestedOne);
}

#[test]
fn unsupported_regex_is_rejected_before_lowering() {
    let err = rejection(&stored("users").filter(ctx().attr("name").matches("a+b")));
    assert_eq!(err.code(), "UnsupportedRegex");
    assert!(err.to_string().contains("unsupported symbol '+'"));
}

#[test]
fn unknown_relation_is_rejected() {
    assert_eq!(
        reason(&stored("invoices")),
        Reason::UnknownTable {
            table: "invoices".into()
        }
    );
}

#[test]
fn failing_subtree_is_reported() {
    let bad = ctx().attr("height");
    let req = stored("users").map(dict([("h", bad.clone())]));
    match rejection(&req) {
        CompileError::Invalid(err) => assert_eq!(*err.node, bad),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn configured_limits_apply() {
    let catalog = catalog();
    let mut req = stored("users");
    for _ in 0..8 {
        req = req.filter(ctx().attr("age").gt(lit(0)));
    }
    let compiler = Compiler::new(&catalog).with_options(CompileOptions {
        max_depth: 4,
        ..CompileOptions::default()
    });
    let err = compiler.compile(&req).unwrap_err();
    assert_eq!(err.code(), "TooDeep");
    assert!(Compiler::new(&catalog).compile(&req).is_ok());
}

#[test]
fn limits_are_checked_before_tables_are_resolved() {
    let catalog = catalog();
    let mut req = stored("missing");
    for _ in 0..8 {
        req = req.distinct();
    }
    let compiler = Compiler::new(&catalog).with_options(CompileOptions {
        max_depth: 4,
        ..CompileOptions::default()
    });
    assert_eq!(compiler.compile(&req).unwrap_err().code(), "TooDeep");
    assert_eq!(
        Compiler::new(&catalog).compile(&req).unwrap_err().code(),
        "UnknownTable"
    );
}
