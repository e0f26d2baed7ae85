//! Bill and bill payment repository
//!
//! Besides plain reads, this repository provides the locked reads and the
//! writes used inside the payment unit; those take a connection so the
//! caller controls the transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{BillId, BillPaymentId, OrganizationId, ProjectId};
use domain_treasury::{Bill, BillPayment, BillStatus, SettlementAccount};

use super::{money, parse_column};
use crate::error::DatabaseError;

const BILL_COLUMNS: &str = r#"
    bill_id, organization_id, project_id, bill_type, number, entity_name,
    total, currency, status, due_date, paid_date, created_at
"#;

const PAYMENT_COLUMNS: &str = r#"
    payment_id, bill_id, organization_id, amount, currency, method, payment_date,
    reference, notes, cash_box_id, bank_account_id, created_at
"#;

/// Repository for bills and their payments
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

impl BillRepository {
    /// Creates a new BillRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Finds a bill within an organization
    pub async fn find(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Option<BillRow>, DatabaseError> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE bill_id = $1 AND organization_id = $2"
        );
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill_id.as_uuid())
            .bind(organization_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Finds a bill and locks its row until the surrounding transaction ends
    ///
    /// Concurrent payment units against the same bill queue up here.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Option<BillRow>, DatabaseError> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE bill_id = $1 AND organization_id = $2 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill_id.as_uuid())
            .bind(organization_id.as_uuid())
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Sum of payments recorded against a bill
    pub async fn paid_total(&self, bill_id: BillId) -> Result<Decimal, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::paid_total_in(&mut conn, bill_id).await
    }

    /// Sum of payments, read inside the caller's transaction
    pub async fn paid_total_in(conn: &mut PgConnection, bill_id: BillId) -> Result<Decimal, DatabaseError> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM bill_payments WHERE bill_id = $1",
        )
        .bind(bill_id.as_uuid())
        .fetch_one(&mut *conn)
        .await?;
        Ok(total)
    }

    /// Whether a cash box or bank account belongs to the organization
    pub async fn account_exists(
        &self,
        organization_id: OrganizationId,
        account: &SettlementAccount,
    ) -> Result<bool, DatabaseError> {
        let sql = match account {
            SettlementAccount::CashBox(_) => {
                "SELECT EXISTS (SELECT 1 FROM cash_boxes WHERE cash_box_id = $1 AND organization_id = $2)"
            }
            SettlementAccount::BankAccount(_) => {
                "SELECT EXISTS (SELECT 1 FROM bank_accounts WHERE bank_account_id = $1 AND organization_id = $2)"
            }
        };
        let exists: bool = sqlx::query_scalar(sql)
            .bind(account.account_uuid())
            .bind(organization_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Inserts a payment inside the caller's transaction
    pub async fn insert_payment(conn: &mut PgConnection, payment: &BillPayment) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO bill_payments (
                payment_id, bill_id, organization_id, amount, currency, method,
                payment_date, reference, notes, cash_box_id, bank_account_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.bill_id.as_uuid())
        .bind(payment.organization_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.method.as_str())
        .bind(payment.payment_date)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(payment.settlement.cash_box_id().map(Uuid::from))
        .bind(payment.settlement.bank_account_id().map(Uuid::from))
        .bind(payment.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Writes the recomputed status inside the caller's transaction
    pub async fn update_status(
        conn: &mut PgConnection,
        bill_id: BillId,
        status: BillStatus,
        paid_date: Option<DateTime<Utc>>,
    ) -> Result<(), DatabaseError> {
        sqlx::query("UPDATE bills SET status = $2, paid_date = $3, updated_at = now() WHERE bill_id = $1")
            .bind(bill_id.as_uuid())
            .bind(status.as_str())
            .bind(paid_date)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Payments of a bill, most recent first
    pub async fn list_payments(
        &self,
        organization_id: OrganizationId,
        bill_id: BillId,
    ) -> Result<Vec<BillPaymentRow>, DatabaseError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM bill_payments \
             WHERE bill_id = $1 AND organization_id = $2 \
             ORDER BY payment_date DESC, created_at DESC"
        );
        let rows = sqlx::query_as::<_, BillPaymentRow>(&sql)
            .bind(bill_id.as_uuid())
            .bind(organization_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a bill; bills are otherwise created by the billing workflow
    pub async fn insert_bill(&self, bill: &Bill) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO bills (
                bill_id, organization_id, project_id, bill_type, number, entity_name,
                total, currency, status, due_date, paid_date, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(bill.id.as_uuid())
        .bind(bill.organization_id.as_uuid())
        .bind(bill.project_id.map(Uuid::from))
        .bind(bill.bill_type.as_str())
        .bind(&bill.number)
        .bind(&bill.entity_name)
        .bind(bill.total.amount())
        .bind(bill.currency().code())
        .bind(bill.status.as_str())
        .bind(bill.due_date)
        .bind(bill.paid_date)
        .bind(bill.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Registers a cash box
    pub async fn insert_cash_box(
        &self,
        organization_id: OrganizationId,
        name: &str,
    ) -> Result<Uuid, DatabaseError> {
        let id = Uuid::now_v7();
        sqlx::query("INSERT INTO cash_boxes (cash_box_id, organization_id, name) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(organization_id.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Registers a bank account
    pub async fn insert_bank_account(
        &self,
        organization_id: OrganizationId,
        bank_name: &str,
    ) -> Result<Uuid, DatabaseError> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO bank_accounts (bank_account_id, organization_id, bank_name) VALUES ($1, $2, $3)",
        )
        .bind(id)
        .bind(organization_id.as_uuid())
        .bind(bank_name)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }
}

/// Database row for a bill
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillRow {
    pub bill_id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub bill_type: String,
    pub number: String,
    pub entity_name: String,
    pub total: Decimal,
    pub currency: String,
    pub status: String,
    pub due_date: NaiveDate,
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BillRow> for Bill {
    type Error = DatabaseError;

    fn try_from(row: BillRow) -> Result<Self, Self::Error> {
        Ok(Bill {
            id: BillId::from(row.bill_id),
            organization_id: OrganizationId::from(row.organization_id),
            project_id: row.project_id.map(ProjectId::from),
            bill_type: parse_column("bill_type", &row.bill_type)?,
            number: row.number,
            entity_name: row.entity_name,
            total: money(row.total, &row.currency)?,
            status: parse_column("status", &row.status)?,
            due_date: row.due_date,
            paid_date: row.paid_date,
            created_at: row.created_at,
        })
    }
}

/// Database row for a bill payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillPaymentRow {
    pub payment_id: Uuid,
    pub bill_id: Uuid,
    pub organization_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub payment_date: DateTime<Utc>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub cash_box_id: Option<Uuid>,
    pub bank_account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<BillPaymentRow> for BillPayment {
    type Error = DatabaseError;

    fn try_from(row: BillPaymentRow) -> Result<Self, Self::Error> {
        let settlement = SettlementAccount::from_parts(
            row.cash_box_id.map(Into::into),
            row.bank_account_id.map(Into::into),
        )
        .map_err(|_| DatabaseError::invalid_value("settlement account", row.payment_id))?;

        Ok(BillPayment {
            id: BillPaymentId::from(row.payment_id),
            bill_id: BillId::from(row.bill_id),
            organization_id: OrganizationId::from(row.organization_id),
            amount: money(row.amount, &row.currency)?,
            method: parse_column("method", &row.method)?,
            payment_date: row.payment_date,
            reference: row.reference,
            notes: row.notes,
            settlement,
            created_at: row.created_at,
        })
    }
}
