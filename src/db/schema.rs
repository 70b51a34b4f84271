use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    // WAL lets leaderboard reads proceed while a payment transaction holds the write lock.
    // In-memory databases ignore it and stay in "memory" journal mode.
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;

        -- Accounts (one per Telegram user, never deleted)
        -- id records insertion order; telegram_id is the external identity
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            telegram_id INTEGER NOT NULL UNIQUE,
            username TEXT,
            first_name TEXT,
            coins INTEGER NOT NULL DEFAULT 0 CHECK (coins >= 0),
            total_clicks INTEGER NOT NULL DEFAULT 0 CHECK (total_clicks >= 0),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_accounts_leaderboard ON accounts(coins DESC, id ASC);

        -- Invoices (Telegram Stars purchases, deduplicated by payload)
        -- status moves pending -> completed exactly once; completed is terminal
        CREATE TABLE IF NOT EXISTS invoices (
            payload TEXT PRIMARY KEY,
            telegram_id INTEGER NOT NULL REFERENCES accounts(telegram_id),
            currency TEXT,
            declared_amount INTEGER,
            award_amount INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL CHECK (status IN ('pending', 'completed')),
            source TEXT CHECK (source IS NULL OR source IN ('app', 'webhook')),
            telegram_charge_id TEXT,
            created_at INTEGER NOT NULL,
            completed_at INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_invoices_account ON invoices(telegram_id, created_at DESC);
        "#,
    )?;
    Ok(())
}
