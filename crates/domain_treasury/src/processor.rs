//! Bill payment processor
//!
//! Orchestrates one payment: fail-fast validation against the current bill,
//! the atomic payment unit in the store (retried on write conflicts), and
//! the best-effort notification once the bill becomes fully paid.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use core_kernel::{
    BankAccountId, BillId, BillPaymentId, CashBoxId, Currency, Money, OrganizationId,
    TransactionId,
};

use crate::bill::BillSummary;
use crate::error::TreasuryError;
use crate::payment::{BillPayment, PaymentMethod, SettlementAccount};
use crate::ports::{BillNotifier, CommittedPayment, TreasuryStore};
use crate::settlement::{check_payable, check_remaining, PaymentDraft};

/// Request to apply a payment against a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyPaymentCommand {
    pub organization_id: OrganizationId,
    pub bill_id: BillId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Defaults to the bill currency
    pub currency: Option<Currency>,
    /// Defaults to now
    pub payment_date: Option<DateTime<Utc>>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub cash_box_id: Option<CashBoxId>,
    pub bank_account_id: Option<BankAccountId>,
}

/// Result of a successful payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentReceipt {
    pub payment: BillPayment,
    pub bill: BillSummary,
    pub settlement: SettlementAccount,
    /// Settlement account balance in the bill currency after this payment
    pub balance_after: Decimal,
    pub remaining: Money,
    pub bill_paid: bool,
}

/// Retry schedule for the atomic payment unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Delay before attempt `n + 1` is `backoff * n`
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// No delay between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(50))
    }
}

/// Applies payments against bills
pub struct BillPaymentProcessor {
    store: Arc<dyn TreasuryStore>,
    notifier: Arc<dyn BillNotifier>,
    retry: RetryPolicy,
}

impl BillPaymentProcessor {
    pub fn new(store: Arc<dyn TreasuryStore>, notifier: Arc<dyn BillNotifier>) -> Self {
        Self {
            store,
            notifier,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Applies a payment
    ///
    /// Validation runs in a fixed order and stops at the first failure:
    /// bill lookup, payable status, amount, currency, settlement account,
    /// remaining balance. The store repeats the status and remaining checks
    /// under the bill lock, so a concurrent payment can still be rejected
    /// with `OverpaymentRejected` after passing here.
    ///
    /// # Errors
    ///
    /// Any validation kind of [`TreasuryError`], `TransientFailure` when the
    /// unit kept conflicting, or `Store` for infrastructure failures.
    pub async fn apply_payment(&self, command: ApplyPaymentCommand) -> Result<PaymentReceipt, TreasuryError> {
        let bill = self
            .store
            .find_bill(command.organization_id, command.bill_id)
            .await?
            .ok_or_else(|| TreasuryError::BillNotFound(command.bill_id.to_string()))?;

        check_payable(&bill)?;

        if command.amount <= Decimal::ZERO {
            return Err(TreasuryError::InvalidAmount(format!(
                "payment amount must be positive, got {}",
                command.amount
            )));
        }

        let currency = command.currency.unwrap_or_else(|| bill.currency());
        if currency != bill.currency() {
            return Err(TreasuryError::InvalidCurrency(format!(
                "payment in {} against a bill in {}",
                currency,
                bill.currency()
            )));
        }
        if command.amount.normalize().scale() > currency.decimal_places() {
            return Err(TreasuryError::InvalidAmount(format!(
                "payment amount {} has more than {} decimal places for {}",
                command.amount,
                currency.decimal_places(),
                currency
            )));
        }
        let amount = Money::new(command.amount, currency);

        let settlement = SettlementAccount::from_parts(command.cash_box_id, command.bank_account_id)?;
        if !self.store.account_exists(command.organization_id, &settlement).await? {
            return Err(TreasuryError::AccountNotFound(settlement.to_string()));
        }

        let paid_total = self.store.paid_total(bill.id).await?;
        check_remaining(&bill, paid_total, &amount)?;

        let draft = PaymentDraft {
            payment_id: BillPaymentId::new_v7(),
            transaction_id: TransactionId::new_v7(),
            organization_id: command.organization_id,
            bill_id: bill.id,
            amount,
            method: command.method,
            payment_date: command.payment_date.unwrap_or_else(Utc::now),
            reference: command.reference,
            notes: command.notes,
            settlement,
        };

        let committed = self.commit_with_retry(&draft).await?;

        info!(
            bill_id = %committed.bill.id,
            payment_id = %committed.payment.id,
            amount = %committed.payment.amount,
            status = %committed.bill.status,
            "Bill payment applied"
        );

        if committed.transitioned_to_paid {
            if let Err(error) = self
                .notifier
                .notify_bill_paid(&committed.bill, &committed.payment)
                .await
            {
                warn!(
                    bill_id = %committed.bill.id,
                    payment_id = %committed.payment.id,
                    %error,
                    "Bill paid notification failed"
                );
            }
        }

        Ok(PaymentReceipt {
            settlement: committed.payment.settlement,
            bill: committed.bill.summary(),
            balance_after: committed.balance_after,
            remaining: committed.remaining,
            bill_paid: committed.transitioned_to_paid,
            payment: committed.payment,
        })
    }

    /// Payments recorded against a bill, most recent first
    ///
    /// # Errors
    ///
    /// `BillNotFound` when the bill is not in the organization.
    pub async fn list_payments(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Vec<BillPayment>, TreasuryError> {
        if self.store.find_bill(organization_id, bill_id).await?.is_none() {
            return Err(TreasuryError::BillNotFound(bill_id.to_string()));
        }
        Ok(self.store.list_payments(organization_id, bill_id).await?)
    }

    async fn commit_with_retry(&self, draft: &PaymentDraft) -> Result<CommittedPayment, TreasuryError> {
        let mut attempt = 1;
        loop {
            match self.store.commit_payment(draft).await {
                Err(TreasuryError::LedgerWriteConflict) if attempt < self.retry.max_attempts => {
                    debug!(bill_id = %draft.bill_id, attempt, "Payment unit conflicted, retrying");
                    tokio::time::sleep(self.retry.delay_after(attempt)).await;
                    attempt += 1;
                }
                Err(TreasuryError::LedgerWriteConflict) => {
                    warn!(bill_id = %draft.bill_id, attempt, "Payment unit gave up after conflicts");
                    return Err(TreasuryError::TransientFailure { attempts: attempt });
                }
                other => return other,
            }
        }
    }
}
