//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the treasury and cash-flow domains, built on
//! SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] hold the SQL
//! and row mapping, [`adapters`] implement the domain ports on top of them.
//!
//! # Consistency
//!
//! The bill payment unit runs in a single SERIALIZABLE transaction that
//! locks the bill row. Balances change only through an additive upsert, so
//! concurrent settlements into one account never lose an update.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresTreasuryStore;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/treasury")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresTreasuryStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::{PostgresCashflowSource, PostgresTreasuryStore};

use tracing::info;

/// Applies pending schema migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
