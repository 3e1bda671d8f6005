use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Users (identity - source of truth for name/email)
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- Profiles (role flag lives here, separate from identity)
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK (role IN ('admin', 'staff')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_user ON profiles(user_id);

        -- API keys (bearer credentials; only the hash is stored)
        CREATE TABLE IF NOT EXISTS api_keys (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            key_prefix TEXT NOT NULL,
            key_hash TEXT NOT NULL UNIQUE,
            created_at INTEGER NOT NULL,
            revoked_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys(user_id);
        CREATE INDEX IF NOT EXISTS idx_api_keys_hash ON api_keys(key_hash);

        -- Invoices (bookings; referenced by the payment flow, owned here)
        CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            currency TEXT NOT NULL DEFAULT 'usd',
            status TEXT NOT NULL CHECK (status IN ('open', 'paid', 'void')),
            created_at INTEGER NOT NULL
        );

        -- Payment records (one row per payment attempt against an invoice).
        -- processor_ref holds either a payment-intent id (pi_...) or a
        -- charge id (ch_...): older rows store only the intent reference.
        CREATE TABLE IF NOT EXISTS payment_records (
            id TEXT PRIMARY KEY,
            invoice_id TEXT NOT NULL REFERENCES invoices(id) ON DELETE CASCADE,
            processor_ref TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'succeeded', 'failed')),
            amount_cents INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_payment_records_invoice ON payment_records(invoice_id, status, created_at);

        -- Refunds (written once per successful processor-side refund;
        -- never updated or deleted)
        CREATE TABLE IF NOT EXISTS refunds (
            id TEXT PRIMARY KEY,
            invoice_id TEXT NOT NULL,
            processor_refund_id TEXT NOT NULL,
            payment_intent_id TEXT,
            amount_cents INTEGER NOT NULL,
            reason TEXT NOT NULL,
            admin_notes TEXT,
            status TEXT NOT NULL,
            refunded_by TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_refunds_invoice ON refunds(invoice_id);
        "#,
    )
}
