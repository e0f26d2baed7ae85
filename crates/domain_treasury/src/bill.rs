//! Bills and their payment status
//!
//! Bills are created by the billing workflow outside this crate. The only
//! mutation performed here is the status recomputation that follows a
//! payment, see [`Bill::status_after`].

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BillId, Currency, Money, OrganizationId, ProjectId};

use crate::transaction::{categories, TransactionType};

/// Whether the bill is issued to a client or received from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillType {
    /// Issued to a client: payments are cash in
    Client,
    /// Received from a provider: payments are cash out
    Provider,
}

impl BillType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillType::Client => "CLIENT",
            BillType::Provider => "PROVIDER",
        }
    }

    /// Sign applied to the settlement account balance
    pub fn ledger_sign(&self) -> Decimal {
        match self {
            BillType::Client => Decimal::ONE,
            BillType::Provider => Decimal::NEGATIVE_ONE,
        }
    }

    /// Direction of the mirrored treasury transaction
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            BillType::Client => TransactionType::Income,
            BillType::Provider => TransactionType::Expense,
        }
    }

    /// Category of the mirrored treasury transaction
    pub fn transaction_category(&self) -> &'static str {
        match self {
            BillType::Client => categories::COLLECTION,
            BillType::Provider => categories::PROVIDER_PAYMENTS,
        }
    }
}

impl FromStr for BillType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(BillType::Client),
            "PROVIDER" => Ok(BillType::Provider),
            other => Err(format!("unknown bill type '{other}'")),
        }
    }
}

/// Stored bill status
///
/// `DRAFT → {PENDING, SENT} → PARTIAL → PAID`, with `CANCELLED` reachable
/// from any non-paid state. Overdue is not stored; see
/// [`Bill::display_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillStatus {
    Draft,
    Pending,
    Sent,
    Partial,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Draft => "DRAFT",
            BillStatus::Pending => "PENDING",
            BillStatus::Sent => "SENT",
            BillStatus::Partial => "PARTIAL",
            BillStatus::Paid => "PAID",
            BillStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses that count as open for the overdue predicate
    pub fn is_open(&self) -> bool {
        matches!(self, BillStatus::Pending | BillStatus::Sent | BillStatus::Partial)
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(BillStatus::Draft),
            "PENDING" => Ok(BillStatus::Pending),
            "SENT" => Ok(BillStatus::Sent),
            "PARTIAL" => Ok(BillStatus::Partial),
            "PAID" => Ok(BillStatus::Paid),
            "CANCELLED" => Ok(BillStatus::Cancelled),
            other => Err(format!("unknown bill status '{other}'")),
        }
    }
}

/// Status as seen by queries, with overdue derived from the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayStatus {
    Draft,
    Pending,
    Sent,
    Partial,
    Paid,
    Cancelled,
    Overdue,
}

impl From<BillStatus> for DisplayStatus {
    fn from(status: BillStatus) -> Self {
        match status {
            BillStatus::Draft => DisplayStatus::Draft,
            BillStatus::Pending => DisplayStatus::Pending,
            BillStatus::Sent => DisplayStatus::Sent,
            BillStatus::Partial => DisplayStatus::Partial,
            BillStatus::Paid => DisplayStatus::Paid,
            BillStatus::Cancelled => DisplayStatus::Cancelled,
        }
    }
}

/// A client or provider bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    /// Unique identifier
    pub id: BillId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Project the bill belongs to
    pub project_id: Option<ProjectId>,
    /// Client or provider bill
    pub bill_type: BillType,
    /// Human-readable bill number
    pub number: String,
    /// Display name of the client or provider
    pub entity_name: String,
    /// Bill total; its currency is the bill currency
    pub total: Money,
    /// Stored status
    pub status: BillStatus,
    /// Due date
    pub due_date: NaiveDate,
    /// Set when the bill transitions to paid
    pub paid_date: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Creates a pending bill
    pub fn new(
        organization_id: OrganizationId,
        bill_type: BillType,
        number: impl Into<String>,
        entity_name: impl Into<String>,
        total: Money,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: BillId::new_v7(),
            organization_id,
            project_id: None,
            bill_type,
            number: number.into(),
            entity_name: entity_name.into(),
            total,
            status: BillStatus::Pending,
            due_date,
            paid_date: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the project
    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    /// Sets the stored status
    pub fn with_status(mut self, status: BillStatus) -> Self {
        self.status = status;
        self
    }

    /// The bill currency
    pub fn currency(&self) -> Currency {
        self.total.currency()
    }

    /// Amount still payable given what has been paid so far
    pub fn remaining(&self, paid_total: Decimal) -> Money {
        Money::new(self.total.amount() - paid_total, self.currency())
    }

    /// Status after the paid total reaches `paid_total`
    ///
    /// Paid once the total is covered, partial while something is paid,
    /// otherwise unchanged. A paid bill never regresses.
    pub fn status_after(&self, paid_total: Decimal) -> BillStatus {
        if paid_total >= self.total.amount() || self.status == BillStatus::Paid {
            BillStatus::Paid
        } else if paid_total > Decimal::ZERO {
            BillStatus::Partial
        } else {
            self.status
        }
    }

    /// Due date has passed and the bill is still open
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && self.status.is_open()
    }

    /// Status including the derived overdue state
    pub fn display_status(&self, today: NaiveDate) -> DisplayStatus {
        if self.is_overdue(today) {
            DisplayStatus::Overdue
        } else {
            self.status.into()
        }
    }

    /// Short summary attached to payment responses
    pub fn summary(&self) -> BillSummary {
        BillSummary {
            id: self.id,
            number: self.number.clone(),
            bill_type: self.bill_type,
            entity_name: self.entity_name.clone(),
            total: self.total,
            status: self.status,
            paid_date: self.paid_date,
        }
    }
}

/// Bill summary returned alongside a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillSummary {
    pub id: BillId,
    pub number: String,
    pub bill_type: BillType,
    pub entity_name: String,
    pub total: Money,
    pub status: BillStatus,
    pub paid_date: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bill(status: BillStatus, due: NaiveDate) -> Bill {
        Bill::new(
            OrganizationId::new(),
            BillType::Client,
            "F-0001",
            "Constructora Sur",
            Money::new(dec!(1000), Currency::PESOS),
            due,
        )
        .with_status(status)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_status_after_partial_and_full() {
        let b = bill(BillStatus::Pending, date(2025, 1, 31));
        assert_eq!(b.status_after(dec!(400)), BillStatus::Partial);
        assert_eq!(b.status_after(dec!(1000)), BillStatus::Paid);
        assert_eq!(b.status_after(Decimal::ZERO), BillStatus::Pending);
    }

    #[test]
    fn test_paid_never_regresses() {
        let b = bill(BillStatus::Paid, date(2025, 1, 31));
        assert_eq!(b.status_after(dec!(10)), BillStatus::Paid);
    }

    #[test]
    fn test_overdue_is_derived() {
        let today = date(2025, 2, 1);
        assert!(bill(BillStatus::Sent, date(2025, 1, 31)).is_overdue(today));
        assert!(bill(BillStatus::Partial, date(2025, 1, 31)).is_overdue(today));
        assert!(!bill(BillStatus::Paid, date(2025, 1, 31)).is_overdue(today));
        assert!(!bill(BillStatus::Draft, date(2025, 1, 31)).is_overdue(today));
        assert!(!bill(BillStatus::Pending, date(2025, 2, 1)).is_overdue(today));

        assert_eq!(
            bill(BillStatus::Pending, date(2025, 1, 1)).display_status(today),
            DisplayStatus::Overdue
        );
    }

    #[test]
    fn test_remaining() {
        let b = bill(BillStatus::Partial, date(2025, 1, 31));
        assert_eq!(b.remaining(dec!(400)), Money::new(dec!(600), Currency::PESOS));
    }
}
