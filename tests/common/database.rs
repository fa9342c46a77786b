//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr};
use std::env;
use std::sync::Once;

static INIT_SYNC: Once = Once::new();

/// Initialize synchronous global state (logging, configuration)
fn init_sync_globals() {
    INIT_SYNC.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
        crimewatch::app_config::init();
    });
}

/// Setup test database - a fresh in-memory SQLite database with every table
/// created from the entity definitions.
///
/// Set TEST_DATABASE_URL to run against another backend; that database must
/// be empty.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    init_sync_globals();

    let database_url =
        env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let db = crimewatch::db::connect(&database_url, 1).await?;
    crimewatch::db::create_schema(&db).await?;

    Ok(db)
}
