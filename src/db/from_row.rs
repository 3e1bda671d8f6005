//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! This module provides a `FromRow` trait that models can implement to
//! define how they are constructed from database rows, plus helper functions
//! for common query patterns.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking when the database contains an
/// invalid value (corruption, migration errors, etc.).
fn parse_enum<T>(
    row: &Row,
    col: usize,
    col_name: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(col)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const USER_COLS: &str = "id, email, name, created_at";

pub const USER_WITH_PROFILE_COLS: &str = "u.id, u.email, u.name, p.role, u.created_at";

pub const PROFILE_COLS: &str = "id, user_id, role, created_at, updated_at";

pub const API_KEY_COLS: &str = "id, user_id, name, key_prefix, key_hash, created_at, revoked_at";

pub const INVOICE_COLS: &str =
    "id, customer_name, customer_email, amount_cents, currency, status, created_at";

pub const PAYMENT_RECORD_COLS: &str =
    "id, invoice_id, processor_ref, status, amount_cents, created_at";

pub const REFUND_COLS: &str = "id, invoice_id, processor_refund_id, payment_intent_id, amount_cents, reason, admin_notes, status, refunded_by, created_at";

// ============ FromRow Implementations ============

impl FromRow for User {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for UserWithProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // role comes from a LEFT JOIN and may be NULL (no profile row)
        let role = row
            .get::<_, Option<String>>(3)?
            .and_then(|s| s.parse().ok());
        Ok(UserWithProfile {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            role,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            user_id: row.get(1)?,
            role: parse_enum(row, 2, "role", |s| s.parse().ok())?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl FromRow for ApiKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ApiKey {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            key_prefix: row.get(3)?,
            key_hash: row.get(4)?,
            created_at: row.get(5)?,
            revoked_at: row.get(6)?,
        })
    }
}

impl FromRow for Invoice {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Invoice {
            id: row.get(0)?,
            customer_name: row.get(1)?,
            customer_email: row.get(2)?,
            amount_cents: row.get(3)?,
            currency: row.get(4)?,
            status: parse_enum(row, 5, "status", InvoiceStatus::from_str)?,
            created_at: row.get(6)?,
        })
    }
}

impl FromRow for PaymentRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        // The prefix-sniffing rule is applied exactly once, here at the
        // ingestion boundary. A stored reference with an unknown prefix is
        // data corruption and fails the row mapping loudly.
        Ok(PaymentRecord {
            id: row.get(0)?,
            invoice_id: row.get(1)?,
            reference: parse_enum(row, 2, "processor_ref", ProcessorReference::parse)?,
            status: parse_enum(row, 3, "status", PaymentStatus::from_str)?,
            amount_cents: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl FromRow for Refund {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Refund {
            id: row.get(0)?,
            invoice_id: row.get(1)?,
            processor_refund_id: row.get(2)?,
            payment_intent_id: row.get(3)?,
            amount_cents: row.get(4)?,
            reason: row.get(5)?,
            admin_notes: row.get(6)?,
            status: row.get(7)?,
            refunded_by: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}
