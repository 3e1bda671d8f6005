use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omega_payments::config::Config;
use omega_payments::db::{AppState, create_pool, diag, init_db, queries};
use omega_payments::handlers;
use omega_payments::models::{CreateInvoice, CreateUser, PaymentStatus, ProfileRole};
use omega_payments::payments::ProcessorClient;

#[derive(Parser, Debug)]
#[command(name = "omega-payments")]
#[command(about = "Payments backend for the OMEGA event-services site")]
struct Cli {
    /// Seed the database with dev data (admin user, invoice, payment records)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,

    /// Check that the expected tables and columns exist, print a report
    /// and exit (nonzero if anything is missing)
    #[arg(long)]
    check_schema: bool,
}

fn bootstrap_first_admin(state: &AppState, email: &str) {
    let conn = state.db.get().expect("Failed to get db connection for bootstrap");

    let count = queries::count_admin_profiles(&conn).expect("Failed to count admin profiles");
    if count > 0 {
        tracing::info!("Admin profiles already exist, skipping bootstrap");
        return;
    }

    let input = CreateUser {
        email: email.to_string(),
        name: "Bootstrap Admin".to_string(),
    };
    let user = queries::create_user(&conn, &input).expect("Failed to create bootstrap admin");
    queries::upsert_profile_role(&conn, &user.id, ProfileRole::Admin)
        .expect("Failed to set bootstrap admin role");
    let (_, api_key) =
        queries::create_api_key(&conn, &user.id, "Bootstrap").expect("Failed to create API key");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Email: {}", email);
    tracing::info!("API Key: {}", api_key);
    tracing::info!("============================================");
    tracing::info!("SAVE THIS API KEY - IT WILL NOT BE SHOWN AGAIN");
    tracing::info!("============================================");
}

/// Seeds the database with dev data for testing: an admin, an invoice and
/// one succeeded payment record of each reference style.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let count = queries::count_admin_profiles(&conn).expect("Failed to count admin profiles");
    if count > 0 {
        tracing::info!("Database already seeded, skipping");
        return;
    }

    let admin = queries::create_user(
        &conn,
        &CreateUser {
            email: "admin@omega.dev".to_string(),
            name: "Dev Admin".to_string(),
        },
    )
    .expect("Failed to create dev admin");
    queries::upsert_profile_role(&conn, &admin.id, ProfileRole::Admin)
        .expect("Failed to set dev admin role");
    let (_, api_key) =
        queries::create_api_key(&conn, &admin.id, "Dev").expect("Failed to create dev API key");

    let invoice = queries::create_invoice(
        &conn,
        &CreateInvoice {
            customer_name: "Dev Customer".to_string(),
            customer_email: "customer@omega.dev".to_string(),
            amount_cents: 25_000,
            currency: "usd".to_string(),
        },
    )
    .expect("Failed to create dev invoice");

    // One record of each reference style so both refund resolution paths
    // are reachable against a dev processor account.
    queries::create_payment_record(
        &conn,
        &invoice.id,
        "pi_dev_seed_intent",
        PaymentStatus::Succeeded,
        12_500,
    )
    .expect("Failed to create dev payment record");
    queries::create_payment_record(
        &conn,
        &invoice.id,
        "ch_dev_seed_charge",
        PaymentStatus::Succeeded,
        12_500,
    )
    .expect("Failed to create dev payment record");

    tracing::info!("Seeded dev data: invoice {}", invoice.id);
    tracing::info!("Dev admin API key: {}", api_key);
}

fn run_schema_check(database_path: &str) -> i32 {
    let pool = create_pool(database_path).expect("Failed to create database pool");
    let conn = pool.get().expect("Failed to get connection");

    let report = diag::check_schema(&conn).expect("Schema check failed");

    println!("Schema check for {}", database_path);
    for table in &report.present_tables {
        println!("  ok      {}", table);
    }
    for table in &report.missing_tables {
        println!("  MISSING {}", table);
    }
    for (table, column) in &report.missing_columns {
        println!("  MISSING {}.{}", table, column);
    }

    if report.is_ok() {
        println!("All expected tables and columns present.");
        0
    } else {
        println!(
            "{} missing table(s), {} missing column(s).",
            report.missing_tables.len(),
            report.missing_columns.len()
        );
        1
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Schema diagnostic mode runs before normal startup and exits.
    if cli.check_schema {
        dotenvy::dotenv().ok();
        let db_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "omega.db".to_string());
        std::process::exit(run_schema_check(&db_path));
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omega_payments=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }
    if config.processor_secret_key.is_empty() {
        tracing::warn!("PROCESSOR_SECRET_KEY is not set; processor calls will fail");
    }

    // Create database connection pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    // Processor client is built once here and injected through AppState;
    // handlers never construct their own.
    let processor = match &config.processor_base_url {
        Some(base_url) => ProcessorClient::with_base_url(&config.processor_secret_key, base_url),
        None => ProcessorClient::new(&config.processor_secret_key),
    };

    let state = AppState {
        db: db_pool,
        processor,
        admin_emails: config.admin_emails.clone(),
        base_url: config.base_url.clone(),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set OMEGA_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Bootstrap first admin if configured (fallback for non-seed usage)
    if let Some(ref email) = config.bootstrap_admin_email {
        bootstrap_first_admin(&state, email);
    }

    // Build the application router
    let app = Router::new()
        .merge(handlers::payments::router(state.clone()))
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("OMEGA payments server listening on {}", addr);

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
