//! SQLite-backed database functions.
//!
//! Two functions over one file-backed SQLite database: a schema introspector
//! the model calls first to learn the tables, and a raw query runner it uses
//! to answer questions.
//!
//! `RunSqlQuery` passes model-originated SQL to the database verbatim. That
//! raw pass-through is the intended contract of this function, inherited
//! from the service it fronts; point it only at databases you are willing to
//! expose to the model.

use crate::convoke::function::{AssistantFunction, FunctionError, Property, PropertyType};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};
use std::path::PathBuf;

fn open(path: &PathBuf) -> Result<Connection, FunctionError> {
    Connection::open(path).map_err(|e| FunctionError::ExecutionFailed(e.to_string()))
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} byte blob>", b.len()),
    }
}

/// Renders the database schema as one `CREATE TABLE` statement per table.
pub struct GetDbSchema {
    db_path: PathBuf,
}

impl GetDbSchema {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

#[async_trait]
impl AssistantFunction for GetDbSchema {
    fn name(&self) -> &str {
        "get_db_schema"
    }

    fn description(&self) -> Option<&str> {
        Some("Get the schema of the database")
    }

    async fn call(&self, _args: &Map<String, Value>) -> Result<String, FunctionError> {
        let conn = open(&self.db_path)?;
        let mut table_names: Vec<String> = Vec::new();
        {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
                .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
            for name in rows {
                table_names.push(name.map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?);
            }
        }

        let mut statements = Vec::with_capacity(table_names.len());
        for table in &table_names {
            let mut stmt = conn
                .prepare(&format!("PRAGMA table_info({})", table))
                .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
            let columns = stmt
                .query_map([], |row| {
                    Ok(format!(
                        "{} {}",
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?
                    ))
                })
                .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
            statements.push(format!(
                "CREATE TABLE {} (\n{}\n);",
                table,
                columns.join(",\n")
            ));
        }
        Ok(statements.join("\n\n"))
    }
}

/// Runs a raw SQL query and renders the rows line by line.
pub struct RunSqlQuery {
    db_path: PathBuf,
    parameters: Vec<Property>,
}

impl RunSqlQuery {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            parameters: vec![Property::new("query", PropertyType::String)
                .with_description("The SQL query to run")
                .required()],
        }
    }
}

#[async_trait]
impl AssistantFunction for RunSqlQuery {
    fn name(&self) -> &str {
        "run_sql_query"
    }

    fn description(&self) -> Option<&str> {
        Some("Run a SQL query on the database")
    }

    fn parameters(&self) -> &[Property] {
        &self.parameters
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<String, FunctionError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FunctionError::InvalidArguments("query must be a string".into()))?;
        let conn = open(&self.db_path)?;
        let mut stmt = conn
            .prepare(query)
            .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
        let column_count = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                let mut fields = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    fields.push(render_value(row.get_ref(i)?));
                }
                Ok(format!("({})", fields.join(", ")))
            })
            .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FunctionError::ExecutionFailed(e.to_string()))?;
        Ok(rows.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_db() -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let conn = Connection::open(file.path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE artists (id INTEGER, name TEXT);
             INSERT INTO artists VALUES (1, 'AC/DC'), (2, 'Accept');",
        )
        .unwrap();
        file
    }

    #[tokio::test]
    async fn test_schema_renders_create_statements() {
        let db = fixture_db();
        let schema = GetDbSchema::new(db.path());
        let out = schema.call(&Map::new()).await.unwrap();
        assert!(out.starts_with("CREATE TABLE artists ("));
        assert!(out.contains("id INTEGER"));
        assert!(out.contains("name TEXT"));
    }

    #[tokio::test]
    async fn test_query_renders_rows() {
        let db = fixture_db();
        let runner = RunSqlQuery::new(db.path());
        let mut args = Map::new();
        args.insert(
            "query".to_string(),
            Value::String("SELECT id, name FROM artists ORDER BY id".to_string()),
        );
        let out = runner.call(&args).await.unwrap();
        assert_eq!(out, "(1, AC/DC)\n(2, Accept)");
    }

    #[tokio::test]
    async fn test_bad_query_becomes_execution_failure() {
        let db = fixture_db();
        let runner = RunSqlQuery::new(db.path());
        let mut args = Map::new();
        args.insert(
            "query".to_string(),
            Value::String("SELECT nothing FROM nowhere".to_string()),
        );
        let err = runner.call(&args).await.unwrap_err();
        assert!(matches!(err, FunctionError::ExecutionFailed(_)));
    }
}
