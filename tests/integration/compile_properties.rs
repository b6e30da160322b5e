#[path = "support.rs"]
mod support;

use proptest::prelude::*;
use requery::request::builder::{ctx, ctx_at, lit, stored};
use requery::request::SortKey;
use requery::{Compiler, Request};
use support::catalog;

fn predicate() -> impl Strategy<Value = Request> {
    let leaf = prop_oneof![
        (0i64..100).prop_map(|n| ctx().attr("age").gt(lit(n))),
        "[a-z]{1,6}".prop_map(|s| ctx().attr("name").equals(lit(s))),
        "[a-z.]{1,6}".prop_map(|p| ctx().attr("name").matches(p)),
        Just(ctx().attr("id").le(ctx().attr("age"))),
    ];
    leaf.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a.and(b)),
            (inner.clone(), inner).prop_map(|(a, b)| a.or(b)),
        ]
    })
}

/// Lists of users built from the list operations.
fn users_list() -> impl Strategy<Value = Request> {
    let base = Just(stored("users")).boxed();
    base.prop_recursive(4, 16, 1, |inner| {
        prop_oneof![
            (inner.clone(), predicate()).prop_map(|(list, p)| list.filter(p)),
            (inner.clone(), any::<bool>()).prop_map(|(list, desc)| {
                let key = ctx().attr("age");
                list.sort_by([if desc { SortKey::desc(key) } else { SortKey::asc(key) }])
            }),
            (inner.clone(), 0i64..5, 0i64..10)
                .prop_map(|(list, start, len)| list.slice(Some(start), Some(start + len))),
            inner.prop_map(|list| list.distinct()),
        ]
    })
}

/// Nested requests whose context references may point past the open scopes.
fn scoped() -> impl Strategy<Value = Request> {
    (-3i32..4, -3i32..4).prop_map(|(outer, inner)| {
        stored("users").map(
            stored("orders")
                .filter(ctx_at(inner).equals(ctx_at(outer)))
                .len(),
        )
    })
}

proptest! {
    #[test]
    fn valid_lists_always_lower(list in users_list()) {
        let catalog = catalog();
        let compiled = Compiler::new(&catalog).compile(&list);
        prop_assert!(compiled.is_ok(), "{:?}", compiled);
        let sql = compiled.unwrap().to_sql();
        prop_assert!(sql.starts_with("SELECT "));
    }

    #[test]
    fn compile_is_deterministic(list in users_list()) {
        let catalog = catalog();
        let compiler = Compiler::new(&catalog);
        let first = compiler.compile(&list).unwrap().to_sql();
        let second = compiler.compile(&list).unwrap().to_sql();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn validation_guards_scope_resolution(req in scoped()) {
        let catalog = catalog();
        let compiler = Compiler::new(&catalog);
        let compilation = compiler.compilation(&req);
        // Lowering may only fail where validation already did.
        if compilation.validate().is_ok() {
            let lowered = compilation.lower(compilation.initial_query());
            prop_assert!(lowered.is_ok(), "{:?}", lowered);
        }
    }

    #[test]
    fn every_stored_items_gets_its_own_alias(copies in 1usize..6) {
        let catalog = catalog();
        let mut req = stored("users");
        for _ in 1..copies {
            req = req + stored("users");
        }
        let compiled = Compiler::new(&catalog).compile(&req).unwrap();
        let names: Vec<String> = compiled
            .aliases()
            .iter()
            .map(|alias| alias.name().to_owned())
            .collect();
        let expected: Vec<String> = (1..=copies).map(|n| format!("users_{n}")).collect();
        prop_assert_eq!(names, expected);
    }
}
