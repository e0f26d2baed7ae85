//! Test Utilities Crate
//!
//! Shared fixtures, builders and harnesses for the treasury test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed amounts, dates and identifiers
//! - `builders`: Builders for bills, payment commands, terms and transactions
//! - `harness`: In-memory processor and cash-flow service wiring
//! - `database`: PostgreSQL container management
//! - `assertions`: Assertion helpers for money and bill status
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod harness;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use harness::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
