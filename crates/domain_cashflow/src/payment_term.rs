//! Recurring payment terms
//!
//! A payment term is an agreed recurring obligation with a client or a
//! provider: a fixed amount that repeats on a recurrence for a number of
//! periods.

use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{EntityId, Money, OrganizationId, PaymentTermId};

/// Whether the term brings money in or takes it out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermType {
    Income,
    Expense,
}

impl TermType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermType::Income => "INCOME",
            TermType::Expense => "EXPENSE",
        }
    }
}

impl FromStr for TermType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TermType::Income),
            "EXPENSE" => Ok(TermType::Expense),
            other => Err(format!("unknown term type '{other}'")),
        }
    }
}

/// Counterparty kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Client,
    Provider,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Client => "CLIENT",
            EntityType::Provider => "PROVIDER",
        }
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" => Ok(EntityType::Client),
            "PROVIDER" => Ok(EntityType::Provider),
            other => Err(format!("unknown entity type '{other}'")),
        }
    }
}

/// How often a term repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Weekly => "WEEKLY",
            Recurrence::Biweekly => "BIWEEKLY",
            Recurrence::Monthly => "MONTHLY",
            Recurrence::Quarterly => "QUARTERLY",
            Recurrence::Semiannual => "SEMIANNUAL",
            Recurrence::Annual => "ANNUAL",
        }
    }

    /// Date of occurrence `n` (0-based) counted from `start`
    ///
    /// Month-based recurrences are computed from the start date rather than
    /// from the previous occurrence, so a term anchored on the 31st lands on
    /// the last day of short months and returns to the 31st afterwards.
    /// `None` when the date overflows the calendar.
    pub fn occurrence(&self, start: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Recurrence::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
            Recurrence::Biweekly => start.checked_add_days(Days::new(14 * u64::from(n))),
            Recurrence::Monthly => start.checked_add_months(Months::new(n)),
            Recurrence::Quarterly => start.checked_add_months(Months::new(n.checked_mul(3)?)),
            Recurrence::Semiannual => start.checked_add_months(Months::new(n.checked_mul(6)?)),
            Recurrence::Annual => start.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WEEKLY" => Ok(Recurrence::Weekly),
            "BIWEEKLY" => Ok(Recurrence::Biweekly),
            "MONTHLY" => Ok(Recurrence::Monthly),
            "QUARTERLY" => Ok(Recurrence::Quarterly),
            "SEMIANNUAL" => Ok(Recurrence::Semiannual),
            "ANNUAL" => Ok(Recurrence::Annual),
            other => Err(format!("unknown recurrence '{other}'")),
        }
    }
}

/// Only active terms are projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermStatus {
    Active,
    Inactive,
}

impl TermStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TermStatus::Active => "ACTIVE",
            TermStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for TermStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(TermStatus::Active),
            "INACTIVE" => Ok(TermStatus::Inactive),
            other => Err(format!("unknown term status '{other}'")),
        }
    }
}

/// A recurring obligation with a client or provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTerm {
    pub id: PaymentTermId,
    pub organization_id: OrganizationId,
    pub term_type: TermType,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    /// Display name of the client or provider
    pub entity_name: String,
    /// Amount per period
    pub amount: Money,
    pub start_date: NaiveDate,
    pub recurrence: Recurrence,
    /// Number of occurrences
    pub periods: u32,
    pub status: TermStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentTerm {
    /// Creates an active term
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organization_id: OrganizationId,
        term_type: TermType,
        entity_type: EntityType,
        entity_id: EntityId,
        entity_name: impl Into<String>,
        amount: Money,
        start_date: NaiveDate,
        recurrence: Recurrence,
        periods: u32,
    ) -> Self {
        Self {
            id: PaymentTermId::new_v7(),
            organization_id,
            term_type,
            entity_type,
            entity_id,
            entity_name: entity_name.into(),
            amount,
            start_date,
            recurrence,
            periods,
            status: TermStatus::Active,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_status(mut self, status: TermStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == TermStatus::Active
    }

    /// Date of the last occurrence, if any
    pub fn last_occurrence(&self) -> Option<NaiveDate> {
        let last = self.periods.checked_sub(1)?;
        self.recurrence.occurrence(self.start_date, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_based_recurrences() {
        let start = date(2025, 1, 1);
        assert_eq!(Recurrence::Weekly.occurrence(start, 2), Some(date(2025, 1, 15)));
        assert_eq!(Recurrence::Biweekly.occurrence(start, 2), Some(date(2025, 1, 29)));
    }

    #[test]
    fn test_month_end_anchor_is_kept() {
        let start = date(2025, 1, 31);
        assert_eq!(Recurrence::Monthly.occurrence(start, 1), Some(date(2025, 2, 28)));
        assert_eq!(Recurrence::Monthly.occurrence(start, 2), Some(date(2025, 3, 31)));
        assert_eq!(Recurrence::Quarterly.occurrence(start, 1), Some(date(2025, 4, 30)));
    }

    #[test]
    fn test_longer_recurrences() {
        let start = date(2024, 2, 29);
        assert_eq!(Recurrence::Semiannual.occurrence(start, 1), Some(date(2024, 8, 29)));
        assert_eq!(Recurrence::Annual.occurrence(start, 1), Some(date(2025, 2, 28)));
    }

    #[test]
    fn test_recurrence_parsing() {
        assert_eq!("biweekly".parse::<Recurrence>(), Ok(Recurrence::Biweekly));
        assert!("DAILY".parse::<Recurrence>().is_err());
    }
}
