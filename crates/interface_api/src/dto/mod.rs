//! Request and response bodies

pub mod payments;
pub mod cashflow;
pub mod dashboard;
