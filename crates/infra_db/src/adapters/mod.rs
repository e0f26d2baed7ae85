//! Domain Adapters
//!
//! PostgreSQL implementations of the treasury and cash-flow ports. Each
//! adapter translates rows to domain types through the repository layer and
//! database errors to port errors.
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresTreasuryStore;
//! use domain_treasury::TreasuryStore;
//!
//! let store = PostgresTreasuryStore::new(pool);
//! let bill = store.find_bill(organization_id, bill_id).await?;
//! ```

pub mod treasury;
pub mod cashflow;

pub use treasury::PostgresTreasuryStore;
pub use cashflow::PostgresCashflowSource;
