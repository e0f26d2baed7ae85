//! Port definitions consumed by the bill payment processor
//!
//! Adapters live in [`crate::adapters`] (in-process) and in `infra_db`
//! (Postgres).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, DomainPort, Money, OrganizationId, PortError, TransactionId};

use crate::bill::Bill;
use crate::error::{NotificationError, TreasuryError};
use crate::payment::{BillPayment, SettlementAccount};
use crate::settlement::PaymentDraft;

/// Outcome of a committed payment unit
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedPayment {
    pub payment: BillPayment,
    /// The bill as written by the unit
    pub bill: Bill,
    /// Settlement account balance after the ledger delta
    pub balance_after: Decimal,
    pub remaining: Money,
    pub transitioned_to_paid: bool,
    pub transaction_id: TransactionId,
}

/// Bills, payments, and the atomic payment unit
#[async_trait]
pub trait TreasuryStore: DomainPort {
    /// Finds a bill within an organization
    async fn find_bill(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Option<Bill>, PortError>;

    /// Sum of payments recorded against a bill
    async fn paid_total(&self, bill_id: BillId) -> Result<Decimal, PortError>;

    /// Whether the settlement account exists in the organization
    async fn account_exists(
        &self,
        organization_id: OrganizationId,
        account: &SettlementAccount,
    ) -> Result<bool, PortError>;

    /// Runs the payment unit atomically
    ///
    /// Locks the bill, re-checks it with
    /// [`plan_settlement`](crate::settlement::plan_settlement), then writes
    /// the payment, ledger delta, mirrored transaction and bill status
    /// together or not at all. Returns `LedgerWriteConflict` when a
    /// concurrent writer forced a rollback.
    async fn commit_payment(&self, draft: &PaymentDraft) -> Result<CommittedPayment, TreasuryError>;

    /// Payments of a bill, most recent first
    async fn list_payments(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Vec<BillPayment>, PortError>;
}

/// Event handed to the notifier when a bill becomes fully paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPaidEvent {
    pub organization_id: OrganizationId,
    pub bill_id: BillId,
    pub bill_number: String,
    pub entity_name: String,
    pub total: Money,
    pub paid_date: Option<DateTime<Utc>>,
    pub final_payment: BillPayment,
}

impl BillPaidEvent {
    pub fn new(bill: &Bill, payment: &BillPayment) -> Self {
        Self {
            organization_id: bill.organization_id,
            bill_id: bill.id,
            bill_number: bill.number.clone(),
            entity_name: bill.entity_name.clone(),
            total: bill.total,
            paid_date: bill.paid_date,
            final_payment: payment.clone(),
        }
    }
}

/// Post-commit hook fired once per bill transition to paid
#[async_trait]
pub trait BillNotifier: Send + Sync {
    async fn notify_bill_paid(&self, bill: &Bill, payment: &BillPayment) -> Result<(), NotificationError>;
}
