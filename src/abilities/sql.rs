// src/abilities/sql.rs

//! SQL abilities over a local SQLite database.
//!
//! `sql-query` runs a query and formats the rows as text; `sql-schema`
//! describes the tables so the planner can write sensible queries against
//! them. Both are only registered when `[abilities].database_path` is set.

use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use tracing::debug;

use crate::abilities::Ability;
use crate::errors::{ReasonLoopError, Result};
use crate::llm::Role;

/// Rows beyond this are elided from query output.
const MAX_ROWS: usize = 100;

pub struct SqlQuery {
    db_path: PathBuf,
}

impl SqlQuery {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl Ability for SqlQuery {
    fn name(&self) -> &str {
        "sql-query"
    }

    async fn execute(&self, input: &str, _role: Option<Role>) -> Result<String> {
        let db_path = self.db_path.clone();
        let query = input.trim().to_string();

        // rusqlite is synchronous; keep it off the async executor threads.
        let output = tokio::task::spawn_blocking(move || run_query(&db_path, &query))
            .await
            .map_err(|e| sql_error("sql-query", format!("query task panicked: {e}")))??;

        Ok(output)
    }
}

pub struct SqlSchema {
    db_path: PathBuf,
}

impl SqlSchema {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl Ability for SqlSchema {
    fn name(&self) -> &str {
        "sql-schema"
    }

    async fn execute(&self, _input: &str, _role: Option<Role>) -> Result<String> {
        let db_path = self.db_path.clone();

        let output = tokio::task::spawn_blocking(move || describe_schema(&db_path))
            .await
            .map_err(|e| sql_error("sql-schema", format!("schema task panicked: {e}")))??;

        Ok(output)
    }
}

fn sql_error(ability: &str, message: String) -> ReasonLoopError {
    ReasonLoopError::AbilityError {
        ability: ability.to_string(),
        message,
    }
}

fn run_query(db_path: &PathBuf, query: &str) -> Result<String> {
    let conn = Connection::open(db_path)
        .map_err(|e| sql_error("sql-query", format!("failed to open database: {e}")))?;

    let mut stmt = conn
        .prepare(query)
        .map_err(|e| sql_error("sql-query", format!("invalid query: {e}")))?;

    let column_names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let column_count = column_names.len();

    let mut rows = stmt
        .query([])
        .map_err(|e| sql_error("sql-query", format!("query failed: {e}")))?;

    let mut lines = vec![column_names.join(" | ")];
    let mut row_count = 0usize;
    let mut truncated = false;

    while let Some(row) = rows
        .next()
        .map_err(|e| sql_error("sql-query", format!("failed to read row: {e}")))?
    {
        if row_count >= MAX_ROWS {
            truncated = true;
            break;
        }

        let mut fields = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value = row
                .get_ref(i)
                .map_err(|e| sql_error("sql-query", format!("failed to read column: {e}")))?;
            fields.push(format_value(value));
        }
        lines.push(fields.join(" | "));
        row_count += 1;
    }

    debug!(rows = row_count, truncated, "sql query completed");

    if row_count == 0 {
        return Ok(format!("{}\n(no rows)", lines[0]));
    }

    if truncated {
        lines.push(format!("... (first {MAX_ROWS} rows shown)"));
    }

    Ok(lines.join("\n"))
}

fn format_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).to_string(),
        ValueRef::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

fn describe_schema(db_path: &PathBuf) -> Result<String> {
    let conn = Connection::open(db_path)
        .map_err(|e| sql_error("sql-schema", format!("failed to open database: {e}")))?;

    let mut stmt = conn
        .prepare("SELECT name, sql FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .map_err(|e| sql_error("sql-schema", format!("failed to read schema: {e}")))?;

    let tables = stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let sql: Option<String> = row.get(1)?;
            Ok((name, sql))
        })
        .map_err(|e| sql_error("sql-schema", format!("failed to read schema: {e}")))?;

    let mut out = String::new();
    for table in tables {
        let (name, sql) =
            table.map_err(|e| sql_error("sql-schema", format!("failed to read table: {e}")))?;

        out.push_str(&format!("Table: {name}\n"));
        if let Some(sql) = sql {
            out.push_str(&format!("{sql}\n"));
        }
        out.push('\n');
    }

    if out.is_empty() {
        return Ok("(no tables)".to_string());
    }

    Ok(out.trim_end().to_string())
}
