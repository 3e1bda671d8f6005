mod from_row;
mod schema;
pub mod diag;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::payments::ProcessorClient;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool, the processor client and
/// request-scoped configuration. Clients are built once at startup and
/// injected; handlers never construct their own.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Payment processor API client
    pub processor: ProcessorClient,
    /// Static allow-list of admin emails (first tier of the admin check)
    pub admin_emails: Vec<String>,
    /// Base URL for callbacks (e.g., https://api.example.com)
    pub base_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
