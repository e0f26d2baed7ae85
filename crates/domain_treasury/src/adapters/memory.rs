//! In-memory treasury store
//!
//! One `tokio::sync::Mutex` guards all state and is held for the whole
//! payment unit, which gives the same serialization the Postgres adapter
//! gets from its bill row lock.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;
use tracing::instrument;

use core_kernel::{
    BankAccountId, BillId, CashBoxId, DomainPort, HealthCheckResult, HealthCheckable,
    OrganizationId, PortError,
};

use crate::bill::{Bill, BillType};
use crate::error::TreasuryError;
use crate::ledger::{AccountBalance, AccountBalanceKey, AccountBalanceLedger, InMemoryLedger};
use crate::payment::{BillPayment, SettlementAccount};
use crate::ports::{CommittedPayment, TreasuryStore};
use crate::settlement::{plan_settlement, PaymentDraft};
use crate::transaction::Transaction;

#[derive(Debug, Default)]
struct TreasuryState {
    bills: HashMap<BillId, Bill>,
    payments: Vec<BillPayment>,
    transactions: Vec<Transaction>,
    ledger: InMemoryLedger,
    cash_boxes: HashMap<CashBoxId, OrganizationId>,
    bank_accounts: HashMap<BankAccountId, OrganizationId>,
}

impl TreasuryState {
    fn paid_total(&self, bill_id: BillId) -> Decimal {
        self.payments
            .iter()
            .filter(|p| p.bill_id == bill_id)
            .map(|p| p.amount.amount())
            .sum()
    }
}

/// Mutex-guarded store implementing [`TreasuryStore`] and [`AccountBalanceLedger`]
#[derive(Debug, Default)]
pub struct InMemoryTreasuryStore {
    state: Mutex<TreasuryState>,
    pending_conflicts: AtomicU32,
}

impl InMemoryTreasuryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_bill(&self, bill: Bill) {
        self.state.lock().await.bills.insert(bill.id, bill);
    }

    pub async fn register_cash_box(&self, organization_id: OrganizationId) -> CashBoxId {
        let id = CashBoxId::new_v7();
        self.state.lock().await.cash_boxes.insert(id, organization_id);
        id
    }

    pub async fn register_bank_account(&self, organization_id: OrganizationId) -> BankAccountId {
        let id = BankAccountId::new_v7();
        self.state.lock().await.bank_accounts.insert(id, organization_id);
        id
    }

    /// Appends a treasury transaction that did not come from a bill payment
    pub async fn record_transaction(&self, transaction: Transaction) {
        self.state.lock().await.transactions.push(transaction);
    }

    /// Snapshot of a bill
    pub async fn bill(&self, bill_id: BillId) -> Option<Bill> {
        self.state.lock().await.bills.get(&bill_id).cloned()
    }

    /// Snapshot of every transaction of an organization, in insertion order
    pub async fn transactions(&self, organization_id: OrganizationId) -> Vec<Transaction> {
        self.state
            .lock()
            .await
            .transactions
            .iter()
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .collect()
    }

    /// Snapshot of every bill payment of an organization with its bill type
    pub async fn bill_payments(&self, organization_id: OrganizationId) -> Vec<(BillPayment, BillType)> {
        let state = self.state.lock().await;
        state
            .payments
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .filter_map(|p| state.bills.get(&p.bill_id).map(|b| (p.clone(), b.bill_type)))
            .collect()
    }

    /// Makes the next `count` payment units fail with `LedgerWriteConflict`
    pub fn inject_write_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl DomainPort for InMemoryTreasuryStore {}

#[async_trait]
impl TreasuryStore for InMemoryTreasuryStore {
    async fn find_bill(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Option<Bill>, PortError> {
        Ok(self
            .state
            .lock()
            .await
            .bills
            .get(&bill_id)
            .filter(|b| b.organization_id == organization_id)
            .cloned())
    }

    async fn paid_total(&self, bill_id: BillId) -> Result<Decimal, PortError> {
        Ok(self.state.lock().await.paid_total(bill_id))
    }

    async fn account_exists(
        &self,
        organization_id: OrganizationId,
        account: &SettlementAccount,
    ) -> Result<bool, PortError> {
        let state = self.state.lock().await;
        let owner = match account {
            SettlementAccount::CashBox(id) => state.cash_boxes.get(id),
            SettlementAccount::BankAccount(id) => state.bank_accounts.get(id),
        };
        Ok(owner == Some(&organization_id))
    }

    #[instrument(skip(self, draft), fields(bill_id = %draft.bill_id, payment_id = %draft.payment_id))]
    async fn commit_payment(&self, draft: &PaymentDraft) -> Result<CommittedPayment, TreasuryError> {
        let mut state = self.state.lock().await;

        if self.take_conflict() {
            return Err(TreasuryError::LedgerWriteConflict);
        }

        let bill = state
            .bills
            .get(&draft.bill_id)
            .filter(|b| b.organization_id == draft.organization_id)
            .cloned()
            .ok_or_else(|| TreasuryError::BillNotFound(draft.bill_id.to_string()))?;
        let paid_total = state.paid_total(bill.id);

        let now = Utc::now();
        let plan = plan_settlement(&bill, paid_total, draft, now)?;

        let balance_after = state
            .ledger
            .apply(bill.organization_id, plan.ledger_key, plan.ledger_delta, now);
        state.payments.push(plan.payment.clone());
        state.transactions.push(plan.transaction.clone());

        let mut updated = bill;
        updated.status = plan.new_status;
        updated.paid_date = plan.paid_date;
        state.bills.insert(updated.id, updated.clone());

        Ok(CommittedPayment {
            payment: plan.payment,
            bill: updated,
            balance_after,
            remaining: plan.remaining_after,
            transitioned_to_paid: plan.transitions_to_paid,
            transaction_id: plan.transaction.id,
        })
    }

    async fn list_payments(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Vec<BillPayment>, PortError> {
        let mut payments: Vec<BillPayment> = self
            .state
            .lock()
            .await
            .payments
            .iter()
            .filter(|p| p.bill_id == bill_id && p.organization_id == organization_id)
            .cloned()
            .collect();
        payments.sort_by(|a, b| {
            b.payment_date
                .cmp(&a.payment_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(payments)
    }
}

#[async_trait]
impl AccountBalanceLedger for InMemoryTreasuryStore {
    async fn apply_delta(
        &self,
        organization_id: OrganizationId,
        key: AccountBalanceKey,
        delta: Decimal,
    ) -> Result<Decimal, PortError> {
        Ok(self
            .state
            .lock()
            .await
            .ledger
            .apply(organization_id, key, delta, Utc::now()))
    }

    async fn get_balance(&self, key: AccountBalanceKey) -> Result<Decimal, PortError> {
        Ok(self.state.lock().await.ledger.balance(&key))
    }

    async fn balances_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AccountBalance>, PortError> {
        Ok(self.state.lock().await.ledger.rows_for(organization_id))
    }
}

#[async_trait]
impl HealthCheckable for InMemoryTreasuryStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy("in_memory_treasury", 0)
    }
}
