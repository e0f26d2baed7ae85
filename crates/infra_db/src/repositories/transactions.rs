//! Treasury transaction repository

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{DateRange, OrganizationId, PayrollId, ProjectId, TransactionId};
use domain_treasury::{SettlementAccount, Transaction};

use super::{money, parse_column};
use crate::error::DatabaseError;

/// Repository for the append-only `transactions` table
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records a transaction in its own statement
    pub async fn insert(&self, transaction: &Transaction) -> Result<(), DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_in(&mut conn, transaction).await
    }

    /// Records a transaction inside the caller's transaction
    ///
    /// Bill payment mirrors carry a unique `BILL-PAY-` reference; a second
    /// mirror for the same payment fails with `DuplicateEntry`.
    pub async fn insert_in(conn: &mut PgConnection, transaction: &Transaction) -> Result<(), DatabaseError> {
        let settlement = transaction.settlement.as_ref();
        sqlx::query(
            r#"
            INSERT INTO transactions (
                transaction_id, organization_id, amount, currency, tx_type, category,
                reference, description, tx_date, cash_box_id, bank_account_id,
                project_id, payroll_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(transaction.id.as_uuid())
        .bind(transaction.organization_id.as_uuid())
        .bind(transaction.amount.amount())
        .bind(transaction.amount.currency().code())
        .bind(transaction.tx_type.as_str())
        .bind(&transaction.category)
        .bind(&transaction.reference)
        .bind(&transaction.description)
        .bind(transaction.date)
        .bind(settlement.and_then(|s| s.cash_box_id()).map(Uuid::from))
        .bind(settlement.and_then(|s| s.bank_account_id()).map(Uuid::from))
        .bind(transaction.project_id.map(Uuid::from))
        .bind(transaction.payroll_id.map(Uuid::from))
        .bind(transaction.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Transactions dated within `period`, both ends inclusive
    pub async fn list_for_period(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<Transaction>, DatabaseError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT transaction_id, organization_id, amount, currency, tx_type, category,
                   reference, description, tx_date, cash_box_id, bank_account_id,
                   project_id, payroll_id, created_at
            FROM transactions
            WHERE organization_id = $1
              AND (tx_date AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
            ORDER BY tx_date, created_at
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    /// Transactions carrying exactly `reference`
    pub async fn find_by_reference(&self, reference: &str) -> Result<Vec<Transaction>, DatabaseError> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT transaction_id, organization_id, amount, currency, tx_type, category,
                   reference, description, tx_date, cash_box_id, bank_account_id,
                   project_id, payroll_id, created_at
            FROM transactions
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Transaction::try_from).collect()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransactionRow {
    pub transaction_id: Uuid,
    pub organization_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub tx_type: String,
    pub category: String,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub tx_date: DateTime<Utc>,
    pub cash_box_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub payroll_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = DatabaseError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let settlement = match (row.cash_box_id, row.bank_account_id) {
            (None, None) => None,
            (cash_box, bank) => Some(
                SettlementAccount::from_parts(cash_box.map(Into::into), bank.map(Into::into))
                    .map_err(|_| DatabaseError::invalid_value("settlement account", row.transaction_id))?,
            ),
        };

        Ok(Transaction {
            id: TransactionId::from(row.transaction_id),
            organization_id: OrganizationId::from(row.organization_id),
            amount: money(row.amount, &row.currency)?,
            tx_type: parse_column("tx_type", &row.tx_type)?,
            category: row.category,
            reference: row.reference,
            description: row.description,
            date: row.tx_date,
            settlement,
            project_id: row.project_id.map(ProjectId::from),
            payroll_id: row.payroll_id.map(PayrollId::from),
            created_at: row.created_at,
        })
    }
}
