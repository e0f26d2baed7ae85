//! Property-Based Test Generators
//!
//! Proptest strategies producing values that respect the treasury
//! invariants: positive amounts, supported currencies, valid dates.

use chrono::NaiveDate;
use core_kernel::{Currency, Money};
use domain_cashflow::Recurrence;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for the supported currencies
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![Just(Currency::PESOS), Just(Currency::USD), Just(Currency::EUR)]
}

/// Strategy for positive amounts with two decimal places
pub fn positive_amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for positive Money in any supported currency
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::new(amount, currency))
}

/// Strategy for recurrence intervals
pub fn recurrence_strategy() -> impl Strategy<Value = Recurrence> {
    prop_oneof![
        Just(Recurrence::Weekly),
        Just(Recurrence::Biweekly),
        Just(Recurrence::Monthly),
        Just(Recurrence::Quarterly),
        Just(Recurrence::Semiannual),
        Just(Recurrence::Annual),
    ]
}

/// Strategy for start dates between 2020 and 2030, any day of month
pub fn start_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2031i32, 1u32..13u32, 1u32..32u32).prop_filter_map(
        "day outside month",
        |(year, month, day)| NaiveDate::from_ymd_opt(year, month, day),
    )
}

/// Strategy for a bill total and a split of it into installments
///
/// Installments are positive and sum to exactly the total.
pub fn payment_split_strategy() -> impl Strategy<Value = (Decimal, Vec<Decimal>)> {
    prop::collection::vec(1i64..1_000_000i64, 1..8).prop_map(|cents| {
        let parts: Vec<Decimal> = cents.iter().map(|c| Decimal::new(*c, 2)).collect();
        let total = parts.iter().copied().sum();
        (total, parts)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_positive_money_is_positive(money in positive_money_strategy()) {
            prop_assert!(money.is_positive());
        }

        #[test]
        fn test_split_sums_to_total((total, parts) in payment_split_strategy()) {
            let sum: Decimal = parts.iter().copied().sum();
            prop_assert_eq!(sum, total);
            prop_assert!(parts.iter().all(|p| *p > Decimal::ZERO));
        }
    }
}
