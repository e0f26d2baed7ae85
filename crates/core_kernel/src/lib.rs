//! Core Kernel - Foundational types for the treasury core
//!
//! This crate provides the building blocks shared by the domain crates:
//! - Money types with precise decimal arithmetic and per-currency buckets
//! - Calendar month keys and inclusive date ranges for reporting
//! - Strongly-typed identifiers
//! - Port error and health-check types for the adapter layer

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, CurrencyAmounts, NaiveCrossCurrencyTotal};
pub use temporal::{MonthKey, DateRange, TemporalError};
pub use identifiers::{
    OrganizationId, ProjectId, BillId, BillPaymentId, CashBoxId, BankAccountId,
    TransactionId, PaymentId, PayrollId, PaymentTermId, EntityId, BudgetId,
};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
