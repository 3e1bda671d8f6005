//! Database tests for payment records, refunds and the reference-parsing
//! boundary.

use rusqlite::Connection;

mod common;
use common::*;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    init_db(&conn).unwrap();
    conn
}

#[test]
fn test_latest_succeeded_payment_record_prefers_newest() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);

    create_test_payment_record(&conn, &invoice.id, "pi_older", PaymentStatus::Succeeded);
    create_test_payment_record(&conn, &invoice.id, "ch_newer", PaymentStatus::Succeeded);

    let record = queries::latest_succeeded_payment_record(&conn, &invoice.id)
        .unwrap()
        .unwrap();
    assert_eq!(record.reference.raw(), "ch_newer");
}

#[test]
fn test_latest_succeeded_payment_record_skips_other_statuses() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);

    create_test_payment_record(&conn, &invoice.id, "ch_good", PaymentStatus::Succeeded);
    create_test_payment_record(&conn, &invoice.id, "pi_pending", PaymentStatus::Pending);
    create_test_payment_record(&conn, &invoice.id, "ch_bad", PaymentStatus::Failed);

    let record = queries::latest_succeeded_payment_record(&conn, &invoice.id)
        .unwrap()
        .unwrap();
    assert_eq!(record.reference.raw(), "ch_good");
}

#[test]
fn test_payment_record_reference_styles_parse_to_variants() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);

    let by_charge =
        create_test_payment_record(&conn, &invoice.id, "ch_direct", PaymentStatus::Succeeded);
    assert_eq!(
        by_charge.reference,
        ProcessorReference::Charge("ch_direct".to_string())
    );

    let by_intent =
        create_test_payment_record(&conn, &invoice.id, "pi_legacy", PaymentStatus::Succeeded);
    assert_eq!(
        by_intent.reference,
        ProcessorReference::Intent("pi_legacy".to_string())
    );
}

#[test]
fn test_corrupt_processor_ref_fails_row_mapping() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);

    // Bypass the queries layer to simulate a corrupted stored reference.
    conn.execute(
        "INSERT INTO payment_records (id, invoice_id, processor_ref, status, amount_cents, created_at)
         VALUES ('om_pay_corrupt', ?1, 'tok_garbage', 'succeeded', 1000, 0)",
        [&invoice.id],
    )
    .unwrap();

    let result = queries::latest_succeeded_payment_record(&conn, &invoice.id);
    assert!(result.is_err());
}

#[test]
fn test_mark_payment_record_succeeded_can_replace_reference() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);
    let record =
        create_test_payment_record(&conn, &invoice.id, "pi_initial", PaymentStatus::Pending);

    // The newer flow swaps the intent ref for the charge ref once known.
    let updated =
        queries::mark_payment_record_succeeded(&conn, &record.id, Some("ch_resolved")).unwrap();
    assert!(updated);

    let reloaded = queries::get_payment_record(&conn, &record.id).unwrap().unwrap();
    assert_eq!(reloaded.status, PaymentStatus::Succeeded);
    assert_eq!(
        reloaded.reference,
        ProcessorReference::Charge("ch_resolved".to_string())
    );
}

#[test]
fn test_refund_round_trip() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);
    let admin = create_test_user(&conn, "admin@example.com", "Admin");

    let refund = queries::create_refund(
        &conn,
        &CreateRefund {
            invoice_id: invoice.id.clone(),
            processor_refund_id: "re_abc123".to_string(),
            payment_intent_id: Some("pi_abc123".to_string()),
            amount_cents: 6000,
            reason: "event cancelled".to_string(),
            admin_notes: None,
            status: "succeeded".to_string(),
            refunded_by: admin.id.clone(),
        },
    )
    .unwrap();

    assert!(refund.id.starts_with("om_ref_"));

    let listed = queries::list_refunds_by_invoice(&conn, &invoice.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].processor_refund_id, "re_abc123");
    assert_eq!(listed[0].amount_cents, 6000);
    assert_eq!(listed[0].refunded_by, admin.id);
    assert!(listed[0].admin_notes.is_none());
}

#[test]
fn test_api_key_round_trip_and_revocation() {
    let conn = setup();
    let (user, raw) = create_test_user_with_key(&conn, "ops@example.com");

    let resolved = queries::get_user_by_api_key(&conn, &raw).unwrap().unwrap();
    assert_eq!(resolved.id, user.id);

    // a different token resolves to nothing
    assert!(queries::get_user_by_api_key(&conn, "omk_other").unwrap().is_none());

    let key_id: String = conn
        .query_row(
            "SELECT id FROM api_keys WHERE user_id = ?1",
            [&user.id],
            |row| row.get(0),
        )
        .unwrap();
    assert!(queries::revoke_api_key(&conn, &key_id).unwrap());
    assert!(queries::get_user_by_api_key(&conn, &raw).unwrap().is_none());

    // revoking twice is a no-op
    assert!(!queries::revoke_api_key(&conn, &key_id).unwrap());
}

#[test]
fn test_profile_upsert_and_merge() {
    let conn = setup();
    let user = create_test_user(&conn, "user@example.com", "User");

    // no profile yet: merged row has no role
    let merged = queries::get_user_with_profile(&conn, &user.id).unwrap().unwrap();
    assert!(merged.role.is_none());

    let profile = queries::upsert_profile_role(&conn, &user.id, ProfileRole::Staff).unwrap();
    assert_eq!(profile.role, ProfileRole::Staff);

    let profile = queries::upsert_profile_role(&conn, &user.id, ProfileRole::Admin).unwrap();
    assert_eq!(profile.role, ProfileRole::Admin);

    let merged = queries::get_user_with_profile(&conn, &user.id).unwrap().unwrap();
    assert_eq!(merged.role, Some(ProfileRole::Admin));

    assert_eq!(queries::count_admin_profiles(&conn).unwrap(), 1);
}

#[test]
fn test_user_emails_are_normalized() {
    let conn = setup();
    let user = create_test_user(&conn, "  Mixed@Example.COM ", "Mixed");
    assert_eq!(user.email, "mixed@example.com");

    let found = queries::get_user_by_email(&conn, "MIXED@example.com").unwrap();
    assert!(found.is_some());
}

#[test]
fn test_invoice_round_trip() {
    let conn = setup();
    let invoice = create_test_invoice(&conn);

    let reloaded = queries::get_invoice_by_id(&conn, &invoice.id).unwrap().unwrap();
    assert_eq!(reloaded.status, InvoiceStatus::Open);
    assert_eq!(reloaded.amount_cents, 25_000);

    assert!(queries::set_invoice_status(&conn, &invoice.id, InvoiceStatus::Paid).unwrap());
    let reloaded = queries::get_invoice_by_id(&conn, &invoice.id).unwrap().unwrap();
    assert_eq!(reloaded.status, InvoiceStatus::Paid);
}
