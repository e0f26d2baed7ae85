//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//!
//! The three supported currencies are never interconvertible: arithmetic
//! across currencies is rejected, and the only place a cross-currency figure
//! may exist is [`NaiveCrossCurrencyTotal`], which is for display only.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Currencies the treasury operates in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    PESOS,
    USD,
    EUR,
}

impl Currency {
    /// Every supported currency, in reporting order
    pub const ALL: [Currency; 3] = [Currency::PESOS, Currency::USD, Currency::EUR];

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::PESOS => "$",
            Currency::USD => "US$",
            Currency::EUR => "€",
        }
    }

    /// Returns the storage/wire code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::PESOS => "PESOS",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PESOS" => Ok(Currency::PESOS),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            other => Err(MoneyError::InvalidCurrency(other.to_string())),
        }
    }
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: cannot operate on {0} and {1}")]
    CurrencyMismatch(String, String),

    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally; use
/// [`Money::round_to_currency`] for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates Money from an integer amount in minor units (e.g., cents)
    pub fn from_minor(minor_units: i64, currency: Currency) -> Self {
        let divisor = Decimal::new(10_i64.pow(currency.decimal_places()), 0);
        Self::new(Decimal::new(minor_units, 0) / divisor, currency)
    }

    /// Creates a zero amount in the specified currency
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: dec!(0),
            currency,
        }
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self {
            amount: self.amount.abs(),
            currency: self.currency,
        }
    }

    /// Rounds to the currency's standard decimal places
    pub fn round_to_currency(&self) -> Self {
        Self {
            amount: self.amount.round_dp(self.currency.decimal_places()),
            currency: self.currency,
        }
    }

    /// Checked addition that returns an error on currency mismatch
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount + other.amount, self.currency))
    }

    /// Checked subtraction that returns an error on currency mismatch
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.ensure_same_currency(other)?;
        Ok(Self::new(self.amount - other.amount, self.currency))
    }

    /// Divides by a scalar
    pub fn divide(&self, divisor: Decimal) -> Result<Self, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.amount / divisor, self.currency))
    }

    /// Sums an iterator of Money values that must all share `currency`
    pub fn sum_in<'a>(
        currency: Currency,
        values: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Money, MoneyError> {
        values
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.checked_add(m))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.to_string(),
                other.currency.to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount,
            dp = dp as usize
        )
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.checked_add(&other)
            .expect("Currency mismatch in Money::add")
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self.checked_sub(&other)
            .expect("Currency mismatch in Money::sub")
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.amount, self.currency)
    }
}

/// Per-currency decimal amounts
///
/// Keyed by the closed [`Currency`] enum, so a key outside the supported set
/// cannot be represented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyAmounts(BTreeMap<Currency, Decimal>);

impl CurrencyAmounts {
    /// Creates an empty map
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a map holding zero for every supported currency
    pub fn zeroed() -> Self {
        Self(Currency::ALL.iter().map(|c| (*c, Decimal::ZERO)).collect())
    }

    /// Adds `amount` to the bucket for `currency`
    pub fn add(&mut self, currency: Currency, amount: Decimal) {
        *self.0.entry(currency).or_insert(Decimal::ZERO) += amount;
    }

    /// Adds a Money value to its own currency bucket
    pub fn add_money(&mut self, money: &Money) {
        self.add(money.currency(), money.amount());
    }

    /// Returns the amount for `currency`, zero when absent
    pub fn get(&self, currency: Currency) -> Decimal {
        self.0.get(&currency).copied().unwrap_or(Decimal::ZERO)
    }

    /// Iterates buckets in currency order
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }

    /// Merges another map into this one bucket by bucket
    pub fn merge(&mut self, other: &CurrencyAmounts) {
        for (currency, amount) in other.iter() {
            self.add(currency, amount);
        }
    }

    /// Returns true if every bucket is zero
    pub fn is_zero(&self) -> bool {
        self.0.values().all(|a| a.is_zero())
    }
}

impl FromIterator<(Currency, Decimal)> for CurrencyAmounts {
    fn from_iter<I: IntoIterator<Item = (Currency, Decimal)>>(iter: I) -> Self {
        let mut amounts = CurrencyAmounts::new();
        for (currency, amount) in iter {
            amounts.add(currency, amount);
        }
        amounts
    }
}

/// Legacy display aggregate that adds amounts of different currencies as if
/// they were interchangeable.
///
/// The value is meaningless for decision making. It exists because older
/// dashboard views show a single figure; nothing in the crate reads
/// `naive_sum` back into a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NaiveCrossCurrencyTotal {
    pub naive_sum: Decimal,
    pub label: &'static str,
}

impl NaiveCrossCurrencyTotal {
    pub const LABEL: &'static str = "naive sum across currencies, display only";

    pub fn from_amounts(amounts: &CurrencyAmounts) -> Self {
        Self {
            naive_sum: amounts.iter().map(|(_, a)| a).sum(),
            label: Self::LABEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::PESOS);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::PESOS);
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(dec!(100.00), Currency::USD);
        let b = Money::new(dec!(50.00), Currency::USD);

        assert_eq!((a + b).amount(), dec!(150.00));
        assert_eq!((a - b).amount(), dec!(50.00));
    }

    #[test]
    fn test_currency_mismatch() {
        let usd = Money::new(dec!(100.00), Currency::USD);
        let eur = Money::new(dec!(100.00), Currency::EUR);

        let result = usd.checked_add(&eur);
        assert!(matches!(result, Err(MoneyError::CurrencyMismatch(_, _))));
    }

    #[test]
    fn test_currency_parse_rejects_unknown_codes() {
        assert_eq!("pesos".parse::<Currency>(), Ok(Currency::PESOS));
        assert_eq!(
            "GBP".parse::<Currency>(),
            Err(MoneyError::InvalidCurrency("GBP".to_string()))
        );
    }

    #[test]
    fn test_sum_in_rejects_foreign_currency() {
        let values = [
            Money::new(dec!(10), Currency::PESOS),
            Money::new(dec!(5), Currency::USD),
        ];
        assert!(Money::sum_in(Currency::PESOS, values.iter()).is_err());
    }

    #[test]
    fn test_currency_amounts_keep_buckets_apart() {
        let mut amounts = CurrencyAmounts::new();
        amounts.add(Currency::PESOS, dec!(1000));
        amounts.add(Currency::USD, dec!(10));
        amounts.add(Currency::PESOS, dec!(-250));

        assert_eq!(amounts.get(Currency::PESOS), dec!(750));
        assert_eq!(amounts.get(Currency::USD), dec!(10));
        assert_eq!(amounts.get(Currency::EUR), Decimal::ZERO);
    }

    #[test]
    fn test_naive_total_is_labelled() {
        let amounts: CurrencyAmounts = [(Currency::PESOS, dec!(100)), (Currency::USD, dec!(1))]
            .into_iter()
            .collect();
        let naive = NaiveCrossCurrencyTotal::from_amounts(&amounts);
        assert_eq!(naive.naive_sum, dec!(101));
        assert_eq!(naive.label, NaiveCrossCurrencyTotal::LABEL);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_arithmetic_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::from_minor(a, Currency::PESOS);
            let mb = Money::from_minor(b, Currency::PESOS);
            let mc = Money::from_minor(c, Currency::PESOS);

            prop_assert_eq!((ma + mb) + mc, ma + (mb + mc));
        }
    }
}
