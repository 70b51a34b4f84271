use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use starclicker::config::Config;
use starclicker::db::{AppState, create_pool, init_db, queries};
use starclicker::handlers;
use starclicker::models::UpsertAccount;
use starclicker::payments::TelegramClient;

#[derive(Parser, Debug)]
#[command(name = "starclicker")]
#[command(about = "Telegram Mini App clicker backend with Telegram Stars purchases")]
struct Cli {
    /// Seed the database with a few dev accounts so the leaderboard is not empty
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds dev accounts with some clicks. Only runs when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_accounts(&conn).expect("Failed to count accounts");
    if count > 0 {
        tracing::info!("Database already has accounts, skipping seed");
        return;
    }

    let players = [
        (1_000_001, "alice", "Alice", 120),
        (1_000_002, "bob", "Bob", 75),
        (1_000_003, "carol", "Carol", 30),
    ];

    for (telegram_id, username, first_name, clicks) in players {
        queries::get_or_create_account(
            &conn,
            &UpsertAccount {
                telegram_id,
                username: Some(username.to_string()),
                first_name: Some(first_name.to_string()),
            },
        )
        .expect("Failed to create dev account");

        for _ in 0..clicks {
            queries::increment_click(&conn, telegram_id, 1).expect("Failed to seed clicks");
        }

        tracing::info!("Seeded dev account {} ({} clicks)", telegram_id, clicks);
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "starclicker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let telegram = match &config.bot_token {
        Some(token) => Some(TelegramClient::new(&config.telegram_api_url, token)),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set: invoices will be recorded but not sent");
            None
        }
    };

    if config.webhook_secret.is_none() {
        tracing::warn!("TELEGRAM_WEBHOOK_SECRET not set: webhook deliveries are not authenticated");
    }

    let state = AppState {
        db: db_pool,
        telegram,
        invoice: config.invoice.clone(),
        webhook_secret: config.webhook_secret.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set STARCLICKER_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // The Mini App is served from its own origin.
    let app = handlers::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Starclicker server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
