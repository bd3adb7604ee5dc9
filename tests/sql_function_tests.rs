use convoke::dispatch::{FunctionCall, FunctionRegistry};
use convoke::functions::{GetDbSchema, RunSqlQuery};
use rusqlite::Connection;
use std::sync::Arc;

fn seeded_db() -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();
    conn.execute_batch(
        "CREATE TABLE albums (id INTEGER, title TEXT);
         INSERT INTO albums VALUES (1, 'Back in Black'), (2, 'Powerage');",
    )
    .unwrap();
    file
}

#[tokio::test]
async fn test_schema_then_query_through_dispatch() {
    let db = seeded_db();
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(GetDbSchema::new(db.path())));
    registry.register(Arc::new(RunSqlQuery::new(db.path())));

    let schema_call = FunctionCall::from_wire("call_1", "get_db_schema", "").unwrap();
    let schema = registry.dispatch(&schema_call).await;
    assert!(schema.output.contains("CREATE TABLE albums ("));
    assert!(schema.output.contains("title TEXT"));

    let query_call = FunctionCall::from_wire(
        "call_2",
        "run_sql_query",
        r#"{"query": "SELECT title FROM albums ORDER BY id DESC"}"#,
    )
    .unwrap();
    let rows = registry.dispatch(&query_call).await;
    assert_eq!(rows.output, "(Powerage)\n(Back in Black)");
}

#[tokio::test]
async fn test_schema_function_rejects_arguments() {
    let db = seeded_db();
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(GetDbSchema::new(db.path())));

    let call = FunctionCall::from_wire("call_3", "get_db_schema", r#"{"table": "albums"}"#).unwrap();
    let output = registry.dispatch(&call).await;
    assert_eq!(output.output, "Unexpected parameters");
}

#[tokio::test]
async fn test_sql_error_text_is_the_tool_answer() {
    let db = seeded_db();
    let mut registry = FunctionRegistry::new();
    registry.register(Arc::new(RunSqlQuery::new(db.path())));

    let call = FunctionCall::from_wire(
        "call_4",
        "run_sql_query",
        r#"{"query": "SELECT * FROM missing_table"}"#,
    )
    .unwrap();
    let output = registry.dispatch(&call).await;
    assert!(output.output.contains("missing_table"));
}
