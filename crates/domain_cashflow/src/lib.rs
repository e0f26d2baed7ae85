//! Cash-flow Domain - Projections and period consumption
//!
//! This crate answers two read-side questions for treasury:
//!
//! - **Where is cash going?** Recurring payment terms are expanded into dated
//!   events over a horizon and totalled per currency and per month, then
//!   combined with current account balances into projected balances.
//! - **Where did cash go?** Payments, treasury transactions, payroll and bill
//!   payments of a period are summed per currency and compared with project
//!   budgets.
//!
//! Every figure is kept per currency. The only cross-currency number, the
//! dashboard's legacy naive total, is labelled as display only.

pub mod payment_term;
pub mod expander;
pub mod projection;
pub mod consumption;
pub mod budget;
pub mod ports;
pub mod service;
pub mod adapters;
pub mod error;

pub use payment_term::{EntityType, PaymentTerm, Recurrence, TermStatus, TermType};
pub use expander::{expand, ProjectedCashEvent, TermSchedule};
pub use projection::{
    project, project_balances, project_range, BalanceProjection, CashflowProjection,
    CashflowTotals, MonthlyCashflow, ProjectionFilters, TotalsByCurrency,
};
pub use consumption::{
    aggregate, BillPaymentRecord, CategoryConsumption, ConsumptionCategory, ConsumptionInputs,
    MonthlyConsumption, PeriodConsumption, Payment, PaymentStatus, PayrollRun, RevenueExpense,
};
pub use budget::{budget_vs_consumed, BudgetVsConsumed, ProjectBudget};
pub use ports::{ConsumptionSource, PaymentTermSource};
pub use service::{CashflowService, ConsumptionView, ProjectionView, MAX_CONSUMPTION_MONTHS};
pub use error::CashflowError;
