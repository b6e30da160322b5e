use std::fs;

use requery::request::builder::stored;
use requery::{CompileOptions, Compiler, ConfigError, InMemoryCatalog, ScalarType, TableDef};

#[test]
fn options_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requery.toml");
    let options = CompileOptions {
        max_depth: 32,
        max_nodes: 500,
        subquery_alias: "sub".into(),
    };
    options.persist(&path).unwrap();
    assert_eq!(CompileOptions::load(&path).unwrap(), options);
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    fs::write(&path, "[limits]\nmax_nodes = 64\n").unwrap();
    let options = CompileOptions::load(&path).unwrap();
    assert_eq!(options.max_nodes, 64);
    assert_eq!(options.max_depth, CompileOptions::default().max_depth);
    assert_eq!(options.subquery_alias, "anon");
}

#[test]
fn loaded_alias_base_names_subqueries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("naming.toml");
    fs::write(&path, "[naming]\nsubquery_alias = \"page\"\n").unwrap();
    let catalog = InMemoryCatalog::new()
        .with_table(TableDef::new("items").with_column("sku", ScalarType::Text));
    let compiled = Compiler::new(&catalog)
        .with_options(CompileOptions::load(&path).unwrap())
        .compile(&stored("items").slice(None, Some(10)))
        .unwrap();
    assert_eq!(
        compiled.to_sql(),
        "SELECT page_2.sku FROM (SELECT items_1.sku FROM items AS items_1 LIMIT 10) AS page_2"
    );
}

#[test]
fn unreadable_and_malformed_files_report_their_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = CompileOptions::load(&missing).unwrap_err();
    assert!(matches!(err, ConfigError::Read { ref path, .. } if path == &missing));

    let malformed = dir.path().join("bad.toml");
    fs::write(&malformed, "[limits]\nmax_depth = \"deep\"\n").unwrap();
    let err = CompileOptions::load(&malformed).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == &malformed));
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn out_of_range_values_are_rejected() {
    let err = CompileOptions::from_toml_str("[limits]\nmax_depth = 0\n").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "limits.max_depth",
            ..
        }
    ));
    let err = CompileOptions::from_toml_str("[naming]\nsubquery_alias = \"two words\"\n")
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "naming.subquery_alias",
            ..
        }
    ));
    assert!(CompileOptions::from_toml_str("[limits]\nmax_rows = 3\n").is_err());
}
