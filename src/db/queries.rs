use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{AppError, Result, msg};
use crate::models::*;

use super::from_row::{ACCOUNT_COLS, INVOICE_COLS, FromRow, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Accounts ============

/// Create the account for `input.telegram_id`, or refresh its name hints.
///
/// A single upsert, so two first-contact requests for the same user cannot
/// both insert. Missing hints keep the stored values.
pub fn get_or_create_account(conn: &Connection, input: &UpsertAccount) -> Result<Account> {
    let now = now();
    let account = conn.query_row(
        &format!(
            "INSERT INTO accounts (telegram_id, username, first_name, coins, total_clicks, created_at, updated_at)
             VALUES (?1, ?2, ?3, 0, 0, ?4, ?4)
             ON CONFLICT(telegram_id) DO UPDATE SET
                 username = COALESCE(excluded.username, accounts.username),
                 first_name = COALESCE(excluded.first_name, accounts.first_name),
                 updated_at = excluded.updated_at
             RETURNING {}",
            ACCOUNT_COLS
        ),
        params![input.telegram_id, &input.username, &input.first_name, now],
        Account::from_row,
    )?;
    Ok(account)
}

pub fn get_account(conn: &Connection, telegram_id: i64) -> Result<Option<Account>> {
    query_one(
        conn,
        &format!("SELECT {} FROM accounts WHERE telegram_id = ?1", ACCOUNT_COLS),
        &[&telegram_id],
    )
}

/// SQLite stores an overflowing integer sum as REAL, so every balance update
/// is guarded against passing this ceiling.
const MAX_COUNTER: i64 = i64::MAX;

/// A guarded update touched no row: either the account is missing (`None`) or
/// the new balance would not fit.
fn missing_or_overflow(conn: &Connection, telegram_id: i64) -> Result<Option<Account>> {
    match get_account(conn, telegram_id)? {
        Some(_) => Err(AppError::BadRequest(msg::BALANCE_OVERFLOW.into())),
        None => Ok(None),
    }
}

/// Add `amount` coins without touching the click counter.
/// Returns `None` if the account does not exist.
pub fn credit_account(conn: &Connection, telegram_id: i64, amount: i64) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            &format!(
                "UPDATE accounts SET coins = coins + ?1, updated_at = ?2
                 WHERE telegram_id = ?3 AND coins <= ?4 - ?1
                 RETURNING {}",
                ACCOUNT_COLS
            ),
            params![amount, now(), telegram_id, MAX_COUNTER],
            Account::from_row,
        )
        .optional()?;

    match account {
        Some(account) => Ok(Some(account)),
        None => missing_or_overflow(conn, telegram_id),
    }
}

/// Add `amount` coins and one click. Returns `None` if the account does not exist.
pub fn increment_click(conn: &Connection, telegram_id: i64, amount: i64) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            &format!(
                "UPDATE accounts SET coins = coins + ?1, total_clicks = total_clicks + 1, updated_at = ?2
                 WHERE telegram_id = ?3 AND coins <= ?4 - ?1 AND total_clicks < ?4
                 RETURNING {}",
                ACCOUNT_COLS
            ),
            params![amount, now(), telegram_id, MAX_COUNTER],
            Account::from_row,
        )
        .optional()?;

    match account {
        Some(account) => Ok(Some(account)),
        None => missing_or_overflow(conn, telegram_id),
    }
}

/// Accounts by balance, highest first. Ties go to whoever joined first.
pub fn top_accounts(conn: &Connection, limit: i64) -> Result<Vec<Account>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM accounts ORDER BY coins DESC, id ASC LIMIT ?1",
            ACCOUNT_COLS
        ),
        &[&limit],
    )
}

pub fn count_accounts(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM accounts", [], |row| row.get(0))
        .map_err(Into::into)
}

// ============ Invoices ============

/// Record a freshly issued invoice as pending.
///
/// Returns `false` if the payload already exists; the first writer wins and the
/// existing row is left untouched.
pub fn create_pending_invoice(conn: &Connection, input: &CreateInvoice) -> Result<bool> {
    let affected = conn.execute(
        "INSERT INTO invoices (payload, telegram_id, currency, declared_amount, award_amount, status, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, 'pending', ?5)
         ON CONFLICT(payload) DO NOTHING",
        params![
            &input.payload,
            input.telegram_id,
            &input.currency,
            input.declared_amount,
            now()
        ],
    )?;
    Ok(affected > 0)
}

pub fn get_invoice(conn: &Connection, payload: &str) -> Result<Option<Invoice>> {
    query_one(
        conn,
        &format!("SELECT {} FROM invoices WHERE payload = ?1", INVOICE_COLS),
        &[&payload],
    )
}

/// Atomically move an invoice to `completed`, returning whether this call did it.
///
/// - no row for the payload: inserted directly as completed, returns `true`
/// - pending row owned by the same account: completed with `award_amount`, returns `true`
/// - already completed (or owned by another account): untouched, returns `false`
///
/// The status check lives in the upsert's `WHERE` clause, so two concurrent
/// callers can never both observe `pending` and both win.
pub fn mark_invoice_completed(
    conn: &Connection,
    input: &CompleteInvoice,
    award_amount: i64,
) -> Result<(Invoice, bool)> {
    let now = now();
    let affected = conn.execute(
        "INSERT INTO invoices (payload, telegram_id, currency, declared_amount, award_amount, status, source, telegram_charge_id, created_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 'completed', ?6, ?7, ?8, ?8)
         ON CONFLICT(payload) DO UPDATE SET
             status = 'completed',
             award_amount = excluded.award_amount,
             currency = COALESCE(invoices.currency, excluded.currency),
             declared_amount = COALESCE(invoices.declared_amount, excluded.declared_amount),
             source = excluded.source,
             telegram_charge_id = COALESCE(excluded.telegram_charge_id, invoices.telegram_charge_id),
             completed_at = excluded.completed_at
         WHERE invoices.status = 'pending' AND invoices.telegram_id = excluded.telegram_id",
        params![
            &input.payload,
            input.telegram_id,
            &input.currency,
            input.declared_amount,
            award_amount,
            input.source.as_ref(),
            &input.telegram_charge_id,
            now
        ],
    )?;

    let invoice = get_invoice(conn, &input.payload)?.ok_or_else(|| {
        AppError::Internal(format!("invoice {} vanished after upsert", input.payload))
    })?;

    Ok((invoice, affected > 0))
}

/// An account's invoices, newest first.
pub fn list_invoices_for_account(conn: &Connection, telegram_id: i64) -> Result<Vec<Invoice>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM invoices WHERE telegram_id = ?1 ORDER BY created_at DESC, rowid DESC",
            INVOICE_COLS
        ),
        &[&telegram_id],
    )
}
