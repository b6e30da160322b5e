#![allow(dead_code)]

use requery::{Compiled, CompileError, Compiler, InMemoryCatalog, Request, ScalarType, TableDef};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once; `RUST_LOG=requery=trace` shows compile events.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_table(
            TableDef::new("users")
                .with_column("id", ScalarType::Int)
                .with_column("name", ScalarType::Text)
                .with_column("age", ScalarType::Int),
        )
        .with_table(
            TableDef::new("orders")
                .with_column("id", ScalarType::Int)
                .with_column("user_id", ScalarType::Int)
                .with_column("total", ScalarType::Float),
        )
}

pub fn compile(request: &Request) -> Result<Compiled, CompileError> {
    init_tracing();
    let catalog = catalog();
    Compiler::new(&catalog).compile(request)
}

pub fn sql(request: &Request) -> String {
    match compile(request) {
        Ok(compiled) => compiled.to_sql(),
        Err(err) => panic!("compile failed for {request:?}: {err}"),
    }
}

pub fn rejection(request: &Request) -> CompileError {
    match compile(request) {
        Ok(compiled) => panic!("expected rejection, compiled to {compiled}"),
        Err(err) => err,
    }
}
