//! Tests for core_kernel error types

use chrono::NaiveDate;
use core_kernel::{DateRange, MoneyError, PortError, TemporalError};

#[test]
fn test_port_error_constructors() {
    let error = PortError::not_found("Bill", "BILL-42");
    assert!(error.is_not_found());
    assert_eq!(error.to_string(), "Not found: Bill with id BILL-42");

    assert!(matches!(
        PortError::validation("negative periods"),
        PortError::Validation { field: None, .. }
    ));
}

#[test]
fn test_port_error_transience() {
    assert!(PortError::connection("pool closed").is_transient());
    assert!(!PortError::internal("bad row").is_transient());
    assert!(!PortError::transformation("unknown currency 'GBP'").is_transient());
}

#[test]
fn test_money_error_names_both_currencies() {
    let error = MoneyError::CurrencyMismatch("PESOS".to_string(), "EUR".to_string());
    let message = error.to_string();
    assert!(message.contains("PESOS"));
    assert!(message.contains("EUR"));
}

#[test]
fn test_inverted_range_reports_bounds() {
    let start = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

    match DateRange::new(start, end) {
        Err(TemporalError::InvalidPeriod { start, end }) => {
            assert_eq!(start, "2025-03-31");
            assert_eq!(end, "2025-01-01");
        }
        other => panic!("Expected InvalidPeriod, got {other:?}"),
    }
}
