//! Repository implementations for treasury and cash-flow data
//!
//! Repositories encapsulate SQL and map between database rows and domain
//! types. Queries are checked at runtime (`query_as` with `FromRow` rows) and
//! enumerations are stored as text, parsed back through the domain
//! `FromStr` impls.
//!
//! Methods that must join an outer transaction take `&mut PgConnection`;
//! pass `&mut *tx` from a `sqlx::Transaction`.

pub mod bills;
pub mod ledger;
pub mod transactions;
pub mod payment_terms;
pub mod reporting;

pub use bills::BillRepository;
pub use ledger::LedgerRepository;
pub use transactions::TransactionRepository;
pub use payment_terms::PaymentTermRepository;
pub use reporting::ReportingRepository;

use std::str::FromStr;

use core_kernel::{Currency, Money};
use rust_decimal::Decimal;

use crate::error::DatabaseError;

/// Parses a text column into a domain enum
pub(crate) fn parse_column<T>(column: &str, value: &str) -> Result<T, DatabaseError>
where
    T: FromStr,
{
    value
        .parse()
        .map_err(|_| DatabaseError::invalid_value(column, value))
}

/// Rebuilds a Money value from its amount and currency columns
pub(crate) fn money(amount: Decimal, currency: &str) -> Result<Money, DatabaseError> {
    let currency: Currency = parse_column("currency", currency)?;
    Ok(Money::new(amount, currency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_treasury::BillStatus;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_column() {
        assert_eq!(parse_column::<BillStatus>("status", "PARTIAL").unwrap(), BillStatus::Partial);
        assert!(parse_column::<BillStatus>("status", "OVERDUE").is_err());
    }

    #[test]
    fn test_money_rejects_unknown_currency() {
        assert_eq!(money(dec!(5), "USD").unwrap(), Money::new(dec!(5), Currency::USD));
        assert!(matches!(money(dec!(5), "GBP"), Err(DatabaseError::InvalidValue(_))));
    }
}
