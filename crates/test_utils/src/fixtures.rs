//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for bills, payment terms and periods. Values are
//! fixed so assertions can be written against known totals.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{Currency, DateRange, Money, OrganizationId};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Bill total used by the partial/full payment scenarios
    pub fn pesos_1000() -> Money {
        Money::new(dec!(1000), Currency::PESOS)
    }

    pub fn pesos_400() -> Money {
        Money::new(dec!(400), Currency::PESOS)
    }

    pub fn pesos_600() -> Money {
        Money::new(dec!(600), Currency::PESOS)
    }

    pub fn usd_100() -> Money {
        Money::new(dec!(100), Currency::USD)
    }

    pub fn eur_250() -> Money {
        Money::new(dec!(250), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// First day of the reference quarter
    pub fn q1_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    /// Last day of the reference quarter
    pub fn q1_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
    }

    pub fn q1() -> DateRange {
        DateRange::new(Self::q1_start(), Self::q1_end()).unwrap()
    }

    /// Due date used for open bills
    pub fn due_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
    }

    /// A payment timestamp inside the reference quarter
    pub fn payment_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 14, 30, 0).unwrap()
    }
}

/// Fixture for identifier test data
pub struct IdFixtures;

impl IdFixtures {
    /// A deterministic organization ID
    pub fn organization_id() -> OrganizationId {
        OrganizationId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap())
    }

    /// A second organization, for tenancy isolation tests
    pub fn other_organization_id() -> OrganizationId {
        OrganizationId::from_uuid(Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap())
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn bill_number() -> &'static str {
        "F-0001"
    }

    pub fn client_name() -> &'static str {
        "Constructora Andina"
    }

    pub fn provider_name() -> &'static str {
        "Hormigones del Sur"
    }

    /// A random company name, for tests that create many entities
    pub fn random_entity_name() -> String {
        CompanyName().fake()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_amounts_add_up() {
        let paid = MoneyFixtures::pesos_400() + MoneyFixtures::pesos_600();
        assert_eq!(paid, MoneyFixtures::pesos_1000());
    }

    #[test]
    fn test_quarter_spans_three_months() {
        assert_eq!(TemporalFixtures::q1().months().len(), 3);
    }

    #[test]
    fn test_random_entity_name_not_empty() {
        assert!(!StringFixtures::random_entity_name().is_empty());
    }

    #[test]
    fn test_organizations_differ() {
        assert_ne!(IdFixtures::organization_id(), IdFixtures::other_organization_id());
    }
}
