//! Custom Test Assertions
//!
//! Assertion helpers for treasury types with messages that name the
//! currency and amounts involved.

use core_kernel::{Currency, CurrencyAmounts, Money};
use domain_treasury::BillStatus;
use rust_decimal::Decimal;

/// Asserts that a Money value has the given amount in the given currency
pub fn assert_money_eq(actual: &Money, amount: Decimal, currency: Currency) {
    assert_eq!(
        actual.currency(),
        currency,
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        currency
    );
    assert_eq!(
        actual.amount(),
        amount,
        "Amount mismatch in {}: actual={}, expected={}",
        currency,
        actual.amount(),
        amount
    );
}

/// Asserts that every supported currency has an entry
pub fn assert_all_currencies_present(amounts: &CurrencyAmounts) {
    let present: Vec<Currency> = amounts.iter().map(|(c, _)| c).collect();
    for currency in Currency::ALL {
        assert!(
            present.contains(&currency),
            "Missing currency {currency} in {present:?}"
        );
    }
}

/// Asserts that only `currency` carries a non-zero amount
pub fn assert_only_currency(amounts: &CurrencyAmounts, currency: Currency, expected: Decimal) {
    for (c, amount) in amounts.iter() {
        if c == currency {
            assert_eq!(amount, expected, "Unexpected total in {c}");
        } else {
            assert!(amount.is_zero(), "Amount leaked into {c}: {amount}");
        }
    }
}

/// Asserts that a status sequence never leaves PAID once reached
pub fn assert_status_monotonic(statuses: &[BillStatus]) {
    if let Some(first_paid) = statuses.iter().position(|s| *s == BillStatus::Paid) {
        let after = &statuses[first_paid..];
        assert!(
            after.iter().all(|s| *s == BillStatus::Paid),
            "Bill regressed after PAID: {statuses:?}"
        );
    }
}
