#[path = "support.rs"]
mod support;

use requery::request::builder::{ctx, ctx_at, dict, lit, stored};
use requery::request::SortKey;
use requery::TableDef;
use support::{compile, sql};

const USERS: &str = "users_1.age, users_1.id, users_1.name FROM users AS users_1";

#[test]
fn stored_items_project_every_column() {
    assert_eq!(sql(&stored("users")), format!("SELECT {USERS}"));
}

#[test]
fn filter_splits_conjunctions_into_where() {
    let req = stored("users").filter(
        ctx()
            .attr("age")
            .gt(lit(30))
            .and(ctx().attr("name").not_equals(lit("bob"))),
    );
    assert_eq!(
        sql(&req),
        format!("SELECT {USERS} WHERE users_1.age > 30 AND users_1.name <> 'bob'")
    );
}

#[test]
fn disjunction_stays_grouped() {
    let req = stored("users").filter(
        ctx()
            .attr("age")
            .lt(lit(18))
            .or(ctx().attr("age").gt(lit(65))),
    );
    assert_eq!(
        sql(&req),
        format!("SELECT {USERS} WHERE (users_1.age < 18 OR users_1.age > 65)")
    );
}

#[test]
fn map_to_dict_projects_fields_in_key_order() {
    let req = stored("users").map(dict([
        ("years", ctx().attr("age")),
        ("who", ctx().attr("name")),
    ]));
    assert_eq!(
        sql(&req),
        "SELECT users_1.name AS who, users_1.age AS years FROM users AS users_1"
    );
}

#[test]
fn record_valued_field_is_flattened_with_prefixed_labels() {
    let req = stored("users").map(dict([("who", ctx())]));
    assert_eq!(
        sql(&req),
        "SELECT users_1.age AS who__age, users_1.id AS who__id, users_1.name AS who__name \
         FROM users AS users_1"
    );
}

#[test]
fn reserved_labels_are_quoted() {
    let req = stored("users").map(dict([("order", ctx().attr("id"))]));
    assert_eq!(
        sql(&req),
        "SELECT users_1.id AS \"order\" FROM users AS users_1"
    );
}

#[test]
fn aggregates_replace_the_projection() {
    assert_eq!(
        sql(&stored("users").len()),
        "SELECT count(1) FROM users AS users_1"
    );
    assert_eq!(
        sql(&stored("orders").map(ctx().attr("total")).sum()),
        "SELECT sum(orders_1.total) FROM orders AS orders_1"
    );
    assert_eq!(
        sql(&stored("users").map(ctx().attr("age")).min()),
        "SELECT min(users_1.age) FROM users AS users_1"
    );
    assert_eq!(
        sql(&stored("users").map(ctx().attr("name")).distinct()),
        "SELECT DISTINCT users_1.name FROM users AS users_1"
    );
}

#[test]
fn slice_becomes_limit_offset_subquery() {
    let req = stored("users").slice(Some(2), Some(5));
    assert_eq!(
        sql(&req),
        "SELECT anon_2.age, anon_2.id, anon_2.name FROM (SELECT users_1.age, users_1.id, \
         users_1.name FROM users AS users_1 LIMIT 3 OFFSET 2) AS anon_2"
    );
}

#[test]
fn slice_with_inverted_bounds_is_empty() {
    let req = stored("users").slice(Some(5), Some(2));
    assert_eq!(
        sql(&req),
        "SELECT anon_2.age, anon_2.id, anon_2.name FROM (SELECT users_1.age, users_1.id, \
         users_1.name FROM users AS users_1 LIMIT 0 OFFSET 5) AS anon_2"
    );
}

#[test]
fn one_limits_top_level_result() {
    let req = stored("users")
        .filter(ctx().attr("id").equals(lit(7)))
        .one();
    assert_eq!(
        sql(&req),
        format!("SELECT {USERS} WHERE users_1.id = 7 LIMIT 1")
    );
}

#[test]
fn sort_keys_keep_precedence() {
    let req = stored("users").sort_by([
        SortKey::desc(ctx().attr("age")),
        SortKey::asc(ctx().attr("name")),
    ]);
    assert_eq!(
        sql(&req),
        format!("SELECT {USERS} ORDER BY users_1.age DESC, users_1.name ASC")
    );
}

#[test]
fn group_by_adds_key_column() {
    let req = stored("users").group_by(ctx().attr("age"), dict([("count", ctx().len())]));
    assert_eq!(
        sql(&req),
        "SELECT count(1) AS count, users_1.age AS key FROM users AS users_1 \
         GROUP BY users_1.age"
    );
}

#[test]
fn regex_becomes_like() {
    let anchored = stored("users").filter(ctx().attr("name").matches("^a.b$"));
    assert_eq!(
        sql(&anchored),
        format!("SELECT {USERS} WHERE users_1.name LIKE 'a_b' ESCAPE '\\'")
    );
    let floating = stored("users").filter(ctx().attr("name").matches("50%_off"));
    assert_eq!(
        sql(&floating),
        format!("SELECT {USERS} WHERE users_1.name LIKE '%50\\%\\_off%' ESCAPE '\\'")
    );
}

#[test]
fn list_addition_is_a_union() {
    let young = stored("users").filter(ctx().attr("age").lt(lit(18)));
    let old = stored("users").filter(ctx().attr("age").gt(lit(65)));
    assert_eq!(
        sql(&(young + old)),
        "SELECT anon_3.age, anon_3.id, anon_3.name FROM (\
         SELECT users_1.age, users_1.id, users_1.name FROM users AS users_1 \
         WHERE users_1.age < 18 \
         UNION \
         SELECT users_2.age, users_2.id, users_2.name FROM users AS users_2 \
         WHERE users_2.age > 65\
         ) AS anon_3"
    );
}

#[test]
fn union_members_scan_only_their_own_table() {
    let ids = stored("users").map(ctx().attr("id")) + stored("orders").map(ctx().attr("user_id"));
    assert_eq!(
        sql(&ids),
        "SELECT anon_3.id FROM (SELECT users_1.id FROM users AS users_1 \
         UNION SELECT orders_2.user_id FROM orders AS orders_2) AS anon_3"
    );
}

#[test]
fn record_addition_merges_fields() {
    let req = stored("users").one() + dict([("extra", lit(1))]);
    assert_eq!(
        sql(&req),
        "SELECT 1 AS extra, users_1.age, users_1.id, users_1.name FROM users AS users_1 \
         LIMIT 1"
    );
}

#[test]
fn attribute_of_one_stays_a_single_row() {
    assert_eq!(
        sql(&stored("users").one().attr("name")),
        "SELECT users_1.name FROM users AS users_1 LIMIT 1"
    );
}

#[test]
fn dict_field_keeps_ordering_and_limit_of_one() {
    let req = dict([(
        "first",
        stored("users")
            .sort_by([SortKey::asc(ctx().attr("name"))])
            .one()
            .attr("name"),
    )]);
    assert_eq!(
        sql(&req),
        "SELECT (SELECT users_1.name FROM users AS users_1 ORDER BY users_1.name ASC LIMIT 1) \
         AS first"
    );
}

#[test]
fn counts_of_unrelated_tables_are_independent_subqueries() {
    let req = stored("users").len() + stored("orders").len();
    assert_eq!(
        sql(&req),
        "SELECT (SELECT count(1) FROM users AS users_1) + \
         (SELECT count(1) FROM orders AS orders_2)"
    );
}

#[test]
fn scalar_operators_render_inline() {
    assert_eq!(
        sql(&stored("users").map(ctx().attr("age") + lit(1))),
        "SELECT users_1.age + 1 FROM users AS users_1"
    );
    assert_eq!(
        sql(&stored("orders").map((ctx().attr("total") - lit(1.5)) * lit(2))),
        "SELECT (orders_1.total - 1.5) * 2 FROM orders AS orders_1"
    );
    assert_eq!(sql(&(lit("a") + lit("b"))), "SELECT 'a' + 'b'");
}

#[test]
fn string_functions() {
    assert_eq!(
        sql(&stored("users").map(ctx().attr("name").upper())),
        "SELECT upper(users_1.name) FROM users AS users_1"
    );
    assert_eq!(
        sql(&stored("users").map(ctx().attr("name").lower())),
        "SELECT lower(users_1.name) FROM users AS users_1"
    );
    assert_eq!(
        sql(&stored("users").map(ctx().attr("age").to_text())),
        "SELECT CAST(users_1.age AS TEXT) FROM users AS users_1"
    );
}

#[test]
fn correlated_subrequest_reads_outer_scope() {
    let req = stored("users").map(dict([(
        "older",
        stored("users")
            .filter(ctx().attr("age").gt(ctx_at(1).attr("age")))
            .len(),
    )]));
    let compiled = compile(&req).unwrap();
    let names: Vec<_> = compiled
        .aliases()
        .iter()
        .map(|alias| (alias.table().name().to_owned(), alias.name().to_owned()))
        .collect();
    assert_eq!(
        names,
        [
            ("users".to_owned(), "users_1".to_owned()),
            ("users".to_owned(), "users_2".to_owned())
        ]
    );
    assert_eq!(
        compiled.to_sql(),
        "SELECT (SELECT count(1) FROM users AS users_2 WHERE users_2.age > users_1.age) \
         AS older FROM users AS users_1"
    );
}

#[test]
fn catalog_columns_drive_the_projection() {
    let catalog = requery::InMemoryCatalog::new()
        .with_table(TableDef::new("user").with_column("select", requery::ScalarType::Text));
    let compiled = requery::Compiler::new(&catalog)
        .compile(&stored("user"))
        .unwrap();
    assert_eq!(
        compiled.to_sql(),
        "SELECT user_1.\"select\" FROM \"user\" AS user_1"
    );
}
