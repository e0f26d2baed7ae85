//! Request handlers

pub mod payments;
pub mod cashflow;
pub mod dashboard;
pub mod health;
