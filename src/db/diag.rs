//! Schema diagnostics: verify that the expected tables and columns exist.
//!
//! Queries sqlite_master and pragma_table_info and reports what is present
//! and what is missing. Surfaced through the `--check-schema` CLI mode.

use rusqlite::Connection;

use crate::error::Result;

/// Expected tables and the columns each must have.
const EXPECTED_SCHEMA: &[(&str, &[&str])] = &[
    ("users", &["id", "email", "name", "created_at"]),
    (
        "profiles",
        &["id", "user_id", "role", "created_at", "updated_at"],
    ),
    (
        "api_keys",
        &[
            "id",
            "user_id",
            "name",
            "key_prefix",
            "key_hash",
            "created_at",
            "revoked_at",
        ],
    ),
    (
        "invoices",
        &[
            "id",
            "customer_name",
            "customer_email",
            "amount_cents",
            "currency",
            "status",
            "created_at",
        ],
    ),
    (
        "payment_records",
        &[
            "id",
            "invoice_id",
            "processor_ref",
            "status",
            "amount_cents",
            "created_at",
        ],
    ),
    (
        "refunds",
        &[
            "id",
            "invoice_id",
            "processor_refund_id",
            "payment_intent_id",
            "amount_cents",
            "reason",
            "admin_notes",
            "status",
            "refunded_by",
            "created_at",
        ],
    ),
];

/// Outcome of a schema check.
#[derive(Debug, Default)]
pub struct SchemaReport {
    pub present_tables: Vec<String>,
    pub missing_tables: Vec<String>,
    /// (table, column) pairs that exist in the expectation but not the db
    pub missing_columns: Vec<(String, String)>,
}

impl SchemaReport {
    pub fn is_ok(&self) -> bool {
        self.missing_tables.is_empty() && self.missing_columns.is_empty()
    }
}

fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let cols = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cols)
}

/// Check the live database against the expected schema.
pub fn check_schema(conn: &Connection) -> Result<SchemaReport> {
    let mut report = SchemaReport::default();

    for (table, expected_cols) in EXPECTED_SCHEMA {
        if !table_exists(conn, table)? {
            report.missing_tables.push(table.to_string());
            continue;
        }
        report.present_tables.push(table.to_string());

        let actual = table_columns(conn, table)?;
        for col in *expected_cols {
            if !actual.iter().any(|c| c == col) {
                report.missing_columns.push((table.to_string(), col.to_string()));
            }
        }
    }

    Ok(report)
}
