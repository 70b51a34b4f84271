//! Invoice ledger queries and the pending -> completed compare-and-swap

#[path = "../common/mod.rs"]
mod common;

use common::*;

fn pending(payload: &str, telegram_id: i64) -> CreateInvoice {
    CreateInvoice {
        payload: payload.to_string(),
        telegram_id,
        currency: STARS_CURRENCY.to_string(),
        declared_amount: 1,
    }
}

#[test]
fn test_create_and_get_pending_invoice() {
    let conn = setup_test_db();
    create_test_account(&conn, 1, "buyer");

    assert!(queries::create_pending_invoice(&conn, &pending("p1", 1)).unwrap());

    let invoice = queries::get_invoice(&conn, "p1").unwrap().unwrap();
    assert_eq!(invoice.telegram_id, 1);
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.award_amount, 0);
    assert_eq!(invoice.currency.as_deref(), Some("XTR"));
    assert_eq!(invoice.declared_amount, Some(1));
    assert!(invoice.source.is_none());
    assert!(invoice.completed_at.is_none());
}

#[test]
fn test_create_pending_invoice_first_writer_wins() {
    let conn = setup_test_db();
    create_test_account(&conn, 1, "buyer");
    create_test_account(&conn, 2, "other");

    assert!(queries::create_pending_invoice(&conn, &pending("p1", 1)).unwrap());
    assert!(
        !queries::create_pending_invoice(&conn, &pending("p1", 2)).unwrap(),
        "duplicate payload should not insert"
    );

    let invoice = queries::get_invoice(&conn, "p1").unwrap().unwrap();
    assert_eq!(invoice.telegram_id, 1, "existing row must be untouched");
}

#[test]
fn test_pending_invoice_requires_existing_account() {
    let conn = setup_test_db();
    let result = queries::create_pending_invoice(&conn, &pending("p1", 12345));
    assert!(result.is_err(), "foreign key should reject unknown accounts");
}

#[test]
fn test_get_invoice_nonexistent() {
    let conn = setup_test_db();
    assert!(queries::get_invoice(&conn, "nope").unwrap().is_none());
}

#[test]
fn test_mark_invoice_completed_succeeds_once() {
    let conn = setup_test_db();
    create_test_account(&conn, 1, "buyer");
    queries::create_pending_invoice(&conn, &pending("p1", 1)).unwrap();

    let (invoice, first) =
        queries::mark_invoice_completed(&conn, &webhook_signal(1, "p1", "ch_1"), AWARD_AMOUNT)
            .unwrap();
    assert!(first, "first completion should win");
    assert_eq!(invoice.status, InvoiceStatus::Completed);
    assert_eq!(invoice.award_amount, AWARD_AMOUNT);
    assert_eq!(invoice.source, Some(PaymentSource::Webhook));
    assert_eq!(invoice.telegram_charge_id.as_deref(), Some("ch_1"));
    assert!(invoice.completed_at.is_some());

    let (again, second) =
        queries::mark_invoice_completed(&conn, &app_signal(1, "p1"), AWARD_AMOUNT).unwrap();
    assert!(!second, "second completion should lose");
    assert_eq!(again.source, Some(PaymentSource::Webhook), "winner's record is kept");
    assert_eq!(again.completed_at, invoice.completed_at);
}

#[test]
fn test_mark_invoice_completed_without_pending_row() {
    let conn = setup_test_db();
    create_test_account(&conn, 1, "buyer");

    let (invoice, won) =
        queries::mark_invoice_completed(&conn, &app_signal(1, "client_made"), AWARD_AMOUNT)
            .unwrap();

    assert!(won, "unseen payload is inserted as completed");
    assert_eq!(invoice.status, InvoiceStatus::Completed);
    assert_eq!(invoice.source, Some(PaymentSource::App));
}

#[test]
fn test_mark_invoice_completed_other_owner_untouched() {
    let conn = setup_test_db();
    create_test_account(&conn, 1, "owner");
    create_test_account(&conn, 2, "intruder");
    queries::create_pending_invoice(&conn, &pending("p1", 1)).unwrap();

    let (invoice, won) =
        queries::mark_invoice_completed(&conn, &app_signal(2, "p1"), AWARD_AMOUNT).unwrap();

    assert!(!won);
    assert_eq!(invoice.telegram_id, 1);
    assert_eq!(invoice.status, InvoiceStatus::Pending);
}

#[test]
fn test_list_invoices_for_account() {
    let conn = setup_test_db();
    create_test_account(&conn, 1, "buyer");
    create_test_account(&conn, 2, "other");
    queries::create_pending_invoice(&conn, &pending("a", 1)).unwrap();
    queries::create_pending_invoice(&conn, &pending("b", 1)).unwrap();
    queries::create_pending_invoice(&conn, &pending("c", 2)).unwrap();

    let invoices = queries::list_invoices_for_account(&conn, 1).unwrap();
    let payloads: Vec<&str> = invoices.iter().map(|i| i.payload.as_str()).collect();
    assert_eq!(payloads, vec!["b", "a"], "newest first, own invoices only");
}
