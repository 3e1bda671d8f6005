use chrono::Utc;
use rusqlite::{Connection, params};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;

use super::from_row::{
    API_KEY_COLS, INVOICE_COLS, PAYMENT_RECORD_COLS, PROFILE_COLS, REFUND_COLS, USER_COLS,
    USER_WITH_PROFILE_COLS, query_all, query_one,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Users & profiles ============

/// Create a user. Emails are stored lowercased.
pub fn create_user(conn: &Connection, input: &CreateUser) -> Result<User> {
    let id = EntityType::User.gen_id();
    let now = now();
    let email = input.email.trim().to_lowercase();

    conn.execute(
        "INSERT INTO users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, &email, &input.name, now],
    )?;

    Ok(User {
        id,
        email,
        name: input.name.clone(),
        created_at: now,
    })
}

pub fn get_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLS),
        &[&id],
    )
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    query_one(
        conn,
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLS),
        &[&email.trim().to_lowercase()],
    )
}

/// Get a single identity merged with its profile row (if any).
pub fn get_user_with_profile(conn: &Connection, id: &str) -> Result<Option<UserWithProfile>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id WHERE u.id = ?1",
            USER_WITH_PROFILE_COLS
        ),
        &[&id],
    )
}

/// List identities merged with profile rows, newest first, paginated.
pub fn list_users_with_profiles_paginated(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserWithProfile>, i64)> {
    let users = query_all(
        conn,
        &format!(
            "SELECT {} FROM users u LEFT JOIN profiles p ON p.user_id = u.id
             ORDER BY u.created_at DESC, u.id LIMIT ?1 OFFSET ?2",
            USER_WITH_PROFILE_COLS
        ),
        &[&limit, &offset],
    )?;
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok((users, total))
}

pub fn get_profile_by_user(conn: &Connection, user_id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE user_id = ?1", PROFILE_COLS),
        &[&user_id],
    )
}

/// Upsert a role onto a user's profile, creating the profile row if the
/// user does not have one yet.
pub fn upsert_profile_role(conn: &Connection, user_id: &str, role: ProfileRole) -> Result<Profile> {
    let now = now();
    let id = EntityType::Profile.gen_id();

    conn.execute(
        "INSERT INTO profiles (id, user_id, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(user_id) DO UPDATE SET role = excluded.role, updated_at = excluded.updated_at",
        params![&id, &user_id, role.as_str(), now],
    )?;

    get_profile_by_user(conn, user_id)?
        .ok_or_else(|| crate::error::AppError::Internal("profile missing after upsert".into()))
}

// ============ API keys ============

fn hash_api_key(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Generate a new raw API key. Shown once; only the hash is stored.
pub fn generate_api_key() -> String {
    format!(
        "omk_{}{}",
        Uuid::new_v4().as_simple(),
        Uuid::new_v4().as_simple()
    )
}

/// Create an API key for a user. Returns the record and the raw key.
pub fn create_api_key(conn: &Connection, user_id: &str, name: &str) -> Result<(ApiKey, String)> {
    let raw = generate_api_key();
    let id = EntityType::ApiKey.gen_id();
    let now = now();
    let key_prefix: String = raw.chars().take(12).collect();
    let key_hash = hash_api_key(&raw);

    conn.execute(
        "INSERT INTO api_keys (id, user_id, name, key_prefix, key_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &user_id, &name, &key_prefix, &key_hash, now],
    )?;

    let key = ApiKey {
        id,
        user_id: user_id.to_string(),
        name: name.to_string(),
        key_prefix,
        key_hash,
        created_at: now,
        revoked_at: None,
    };
    Ok((key, raw))
}

/// Resolve a raw bearer token to its user, ignoring revoked keys.
pub fn get_user_by_api_key(conn: &Connection, raw: &str) -> Result<Option<User>> {
    let key_hash = hash_api_key(raw);
    query_one(
        conn,
        &format!(
            "SELECT {} FROM users u
             JOIN api_keys k ON k.user_id = u.id
             WHERE k.key_hash = ?1 AND k.revoked_at IS NULL",
            USER_WITH_API_KEY_COLS
        ),
        &[&key_hash],
    )
}

const USER_WITH_API_KEY_COLS: &str = "u.id, u.email, u.name, u.created_at";

pub fn revoke_api_key(conn: &Connection, key_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE api_keys SET revoked_at = ?1 WHERE id = ?2 AND revoked_at IS NULL",
        params![now(), key_id],
    )?;
    Ok(affected > 0)
}

pub fn get_api_key_by_id(conn: &Connection, key_id: &str) -> Result<Option<ApiKey>> {
    query_one(
        conn,
        &format!("SELECT {} FROM api_keys WHERE id = ?1", API_KEY_COLS),
        &[&key_id],
    )
}

// ============ Invoices ============

pub fn create_invoice(conn: &Connection, input: &CreateInvoice) -> Result<Invoice> {
    let id = EntityType::Invoice.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO invoices (id, customer_name, customer_email, amount_cents, currency, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            &id,
            &input.customer_name,
            &input.customer_email,
            input.amount_cents,
            &input.currency,
            InvoiceStatus::Open.as_str(),
            now
        ],
    )?;

    Ok(Invoice {
        id,
        customer_name: input.customer_name.clone(),
        customer_email: input.customer_email.clone(),
        amount_cents: input.amount_cents,
        currency: input.currency.clone(),
        status: InvoiceStatus::Open,
        created_at: now,
    })
}

pub fn get_invoice_by_id(conn: &Connection, id: &str) -> Result<Option<Invoice>> {
    query_one(
        conn,
        &format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLS),
        &[&id],
    )
}

pub fn set_invoice_status(conn: &Connection, id: &str, status: InvoiceStatus) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE invoices SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    Ok(affected > 0)
}

// ============ Payment records ============

/// Insert a payment record. `processor_ref` is the raw processor id
/// (either `pi_...` or `ch_...`); the tagged parse happens at read time.
pub fn create_payment_record(
    conn: &Connection,
    invoice_id: &str,
    processor_ref: &str,
    status: PaymentStatus,
    amount_cents: i64,
) -> Result<PaymentRecord> {
    let id = EntityType::PaymentRecord.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO payment_records (id, invoice_id, processor_ref, status, amount_cents, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![&id, &invoice_id, &processor_ref, status.as_str(), amount_cents, now],
    )?;

    get_payment_record(conn, &id)?.ok_or_else(|| {
        crate::error::AppError::Internal("payment record missing after insert".into())
    })
}

pub fn get_payment_record(conn: &Connection, id: &str) -> Result<Option<PaymentRecord>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_records WHERE id = ?1",
            PAYMENT_RECORD_COLS
        ),
        &[&id],
    )
}

/// The most recent succeeded payment record for an invoice, if any.
///
/// This is the record the refund flow resolves a charge from. Ties on the
/// second-resolution timestamp are broken by insertion order.
pub fn latest_succeeded_payment_record(
    conn: &Connection,
    invoice_id: &str,
) -> Result<Option<PaymentRecord>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_records
             WHERE invoice_id = ?1 AND status = 'succeeded'
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            PAYMENT_RECORD_COLS
        ),
        &[&invoice_id],
    )
}

/// Mark a payment record succeeded, optionally replacing the stored
/// reference (the newer flow swaps the intent ref for the charge ref once
/// the charge is known).
pub fn mark_payment_record_succeeded(
    conn: &Connection,
    id: &str,
    processor_ref: Option<&str>,
) -> Result<bool> {
    let affected = match processor_ref {
        Some(reference) => conn.execute(
            "UPDATE payment_records SET status = 'succeeded', processor_ref = ?1 WHERE id = ?2",
            params![reference, id],
        )?,
        None => conn.execute(
            "UPDATE payment_records SET status = 'succeeded' WHERE id = ?1",
            params![id],
        )?,
    };
    Ok(affected > 0)
}

// ============ Refunds ============

/// Record a completed processor-side refund.
///
/// Callers must only reach this after the processor confirmed the refund;
/// a failure here is reported as degraded success, never as a rollback.
pub fn create_refund(conn: &Connection, input: &CreateRefund) -> Result<Refund> {
    let id = EntityType::Refund.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO refunds (id, invoice_id, processor_refund_id, payment_intent_id, amount_cents,
                              reason, admin_notes, status, refunded_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &id,
            &input.invoice_id,
            &input.processor_refund_id,
            &input.payment_intent_id,
            input.amount_cents,
            &input.reason,
            &input.admin_notes,
            &input.status,
            &input.refunded_by,
            now
        ],
    )?;

    Ok(Refund {
        id,
        invoice_id: input.invoice_id.clone(),
        processor_refund_id: input.processor_refund_id.clone(),
        payment_intent_id: input.payment_intent_id.clone(),
        amount_cents: input.amount_cents,
        reason: input.reason.clone(),
        admin_notes: input.admin_notes.clone(),
        status: input.status.clone(),
        refunded_by: input.refunded_by.clone(),
        created_at: now,
    })
}

pub fn list_refunds_by_invoice(conn: &Connection, invoice_id: &str) -> Result<Vec<Refund>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM refunds WHERE invoice_id = ?1 ORDER BY created_at DESC, rowid DESC",
            REFUND_COLS
        ),
        &[&invoice_id],
    )
}

/// Count operators with an admin profile. Used by bootstrap to decide
/// whether a first admin needs to be created.
pub fn count_admin_profiles(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE role = 'admin'",
        [],
        |row| row.get(0),
    )
    .map_err(Into::into)
}
