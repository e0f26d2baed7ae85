//! PostgreSQL Treasury Adapter
//!
//! Implements [`TreasuryStore`] and [`AccountBalanceLedger`] on top of the
//! bill, ledger and transaction repositories.
//!
//! # The payment unit
//!
//! `commit_payment` runs in one SERIALIZABLE transaction:
//!
//! 1. lock the bill row (`SELECT ... FOR UPDATE`)
//! 2. read the paid total and re-plan the settlement against it
//! 3. insert the payment, upsert the ledger delta, insert the mirrored
//!    transaction and write the bill status
//! 4. commit
//!
//! Any failure before the commit rolls everything back when the transaction
//! is dropped. Serialization failures and deadlocks surface as
//! `TreasuryError::LedgerWriteConflict` for the processor to retry.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    BillId, DomainPort, HealthCheckResult, HealthCheckable, OrganizationId, PortError,
};
use domain_treasury::{
    plan_settlement, AccountBalance, AccountBalanceKey, AccountBalanceLedger, Bill, BillPayment,
    CommittedPayment, PaymentDraft, SettlementAccount, TreasuryError, TreasuryStore,
};

use crate::error::DatabaseError;
use crate::repositories::{BillRepository, LedgerRepository, TransactionRepository};

/// PostgreSQL-backed treasury store and balance ledger
#[derive(Debug, Clone)]
pub struct PostgresTreasuryStore {
    bills: BillRepository,
    ledger: LedgerRepository,
    transactions: TransactionRepository,
    pool: PgPool,
}

impl PostgresTreasuryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            bills: BillRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool.clone()),
            pool,
        }
    }

    /// Bill repository, for setup and operations outside the port
    pub fn bills(&self) -> &BillRepository {
        &self.bills
    }

    /// Transaction repository, for reads outside the port
    pub fn transactions(&self) -> &TransactionRepository {
        &self.transactions
    }

    async fn commit_unit(&self, draft: &PaymentDraft) -> Result<CommittedPayment, TreasuryError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;

        let row = BillRepository::find_for_update(&mut *tx, draft.organization_id, draft.bill_id)
            .await?
            .ok_or_else(|| TreasuryError::BillNotFound(draft.bill_id.to_string()))?;
        let bill = Bill::try_from(row)?;
        let paid_total = BillRepository::paid_total_in(&mut *tx, bill.id).await?;

        let now = Utc::now();
        let plan = plan_settlement(&bill, paid_total, draft, now)?;

        BillRepository::insert_payment(&mut *tx, &plan.payment).await?;
        let balance_after =
            LedgerRepository::apply_delta_in(&mut *tx, bill.organization_id, plan.ledger_key, plan.ledger_delta)
                .await?;
        TransactionRepository::insert_in(&mut *tx, &plan.transaction).await?;
        BillRepository::update_status(&mut *tx, bill.id, plan.new_status, plan.paid_date).await?;

        tx.commit().await.map_err(DatabaseError::from)?;

        debug!(
            bill_id = %bill.id,
            payment_id = %plan.payment.id,
            status = %plan.new_status,
            "Payment unit committed"
        );

        let mut updated = bill;
        updated.status = plan.new_status;
        updated.paid_date = plan.paid_date;

        Ok(CommittedPayment {
            payment: plan.payment,
            bill: updated,
            balance_after,
            remaining: plan.remaining_after,
            transitioned_to_paid: plan.transitions_to_paid,
            transaction_id: plan.transaction.id,
        })
    }
}

impl DomainPort for PostgresTreasuryStore {}

#[async_trait]
impl HealthCheckable for PostgresTreasuryStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("postgres-treasury-store", latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-treasury-store",
                latency_ms,
                format!("Database error: {e}"),
            ),
        }
    }
}

#[async_trait]
impl TreasuryStore for PostgresTreasuryStore {
    async fn find_bill(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Option<Bill>, PortError> {
        let row = self.bills.find(organization_id, bill_id).await?;
        row.map(Bill::try_from).transpose().map_err(PortError::from)
    }

    async fn paid_total(&self, bill_id: BillId) -> Result<Decimal, PortError> {
        Ok(self.bills.paid_total(bill_id).await?)
    }

    async fn account_exists(
        &self,
        organization_id: OrganizationId,
        account: &SettlementAccount,
    ) -> Result<bool, PortError> {
        Ok(self.bills.account_exists(organization_id, account).await?)
    }

    #[instrument(skip(self, draft), fields(bill_id = %draft.bill_id, payment_id = %draft.payment_id))]
    async fn commit_payment(&self, draft: &PaymentDraft) -> Result<CommittedPayment, TreasuryError> {
        self.commit_unit(draft).await
    }

    async fn list_payments(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Vec<BillPayment>, PortError> {
        let rows = self.bills.list_payments(organization_id, bill_id).await?;
        rows.into_iter()
            .map(BillPayment::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PortError::from)
    }
}

#[async_trait]
impl AccountBalanceLedger for PostgresTreasuryStore {
    async fn apply_delta(
        &self,
        organization_id: OrganizationId,
        key: AccountBalanceKey,
        delta: Decimal,
    ) -> Result<Decimal, PortError> {
        Ok(self.ledger.apply_delta(organization_id, key, delta).await?)
    }

    async fn get_balance(&self, key: AccountBalanceKey) -> Result<Decimal, PortError> {
        Ok(self.ledger.get_balance(key).await?)
    }

    async fn balances_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AccountBalance>, PortError> {
        Ok(self.ledger.balances_for_organization(organization_id).await?)
    }
}
