//! Read models for the consumption dashboard
//!
//! Every query is bounded by organization and an inclusive date period.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

use core_kernel::{BudgetId, CurrencyAmounts, DateRange, OrganizationId, PaymentId, PayrollId, ProjectId};
use domain_cashflow::{BillPaymentRecord, Payment, PaymentStatus, PayrollRun, ProjectBudget};
use domain_treasury::BillPayment;

use super::bills::BillPaymentRow;
use super::{money, parse_column};
use crate::error::DatabaseError;

/// Repository for the dashboard's read-only queries
#[derive(Debug, Clone)]
pub struct ReportingRepository {
    pool: PgPool,
}

impl ReportingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Direct payments settled within `period`
    pub async fn settled_payments(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT payment_id, organization_id, amount, currency, direction, status,
                   paid_date, description
            FROM payments
            WHERE organization_id = $1
              AND status = $2
              AND paid_date BETWEEN $3 AND $4
            ORDER BY paid_date
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(PaymentStatus::Paid.as_str())
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Payment::try_from).collect()
    }

    /// Payroll runs paid within `period` with their net pay per currency
    pub async fn payroll_runs(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<PayrollRun>, DatabaseError> {
        let rows = sqlx::query_as::<_, PayrollNetPayRow>(
            r#"
            SELECT r.payroll_id, r.organization_id, r.pay_date, n.currency, n.net_pay
            FROM payroll_runs r
            JOIN payroll_net_pay n ON n.payroll_id = r.payroll_id
            WHERE r.organization_id = $1
              AND r.pay_date BETWEEN $2 AND $3
            ORDER BY r.pay_date, r.payroll_id
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;

        let mut runs: BTreeMap<(NaiveDate, Uuid), PayrollRun> = BTreeMap::new();
        for row in rows {
            let currency = parse_column("currency", &row.currency)?;
            runs.entry((row.pay_date, row.payroll_id))
                .or_insert_with(|| PayrollRun {
                    id: PayrollId::from(row.payroll_id),
                    organization_id: OrganizationId::from(row.organization_id),
                    pay_date: row.pay_date,
                    net_pay: CurrencyAmounts::new(),
                })
                .net_pay
                .add(currency, row.net_pay);
        }
        Ok(runs.into_values().collect())
    }

    /// Bill payments dated within `period`, with the type of the bill paid
    pub async fn bill_payments(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<BillPaymentRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillPaymentWithTypeRow>(
            r#"
            SELECT p.payment_id, p.bill_id, p.organization_id, p.amount, p.currency, p.method,
                   p.payment_date, p.reference, p.notes, p.cash_box_id, p.bank_account_id,
                   p.created_at, b.bill_type
            FROM bill_payments p
            JOIN bills b ON b.bill_id = p.bill_id
            WHERE p.organization_id = $1
              AND (p.payment_date AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
            ORDER BY p.payment_date, p.created_at
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(BillPaymentRecord {
                    bill_type: parse_column("bill_type", &row.bill_type)?,
                    payment: BillPayment::try_from(row.payment)?,
                })
            })
            .collect()
    }

    /// Active project budgets overlapping `period`
    ///
    /// Budgets are stored one row per currency and folded back together here.
    pub async fn project_budgets(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<ProjectBudget>, DatabaseError> {
        let rows = sqlx::query_as::<_, BudgetRow>(
            r#"
            SELECT budget_id, organization_id, project_id, project_name, currency, total,
                   start_date, end_date, active
            FROM project_budgets
            WHERE organization_id = $1
              AND active
              AND start_date <= $3
              AND end_date >= $2
            ORDER BY budget_id, currency
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(period.start)
        .bind(period.end)
        .fetch_all(&self.pool)
        .await?;

        let mut budgets: BTreeMap<Uuid, ProjectBudget> = BTreeMap::new();
        for row in rows {
            let currency = parse_column("currency", &row.currency)?;
            budgets
                .entry(row.budget_id)
                .or_insert_with(|| ProjectBudget {
                    id: BudgetId::from(row.budget_id),
                    organization_id: OrganizationId::from(row.organization_id),
                    project_id: ProjectId::from(row.project_id),
                    project_name: row.project_name.clone(),
                    total_by_currency: CurrencyAmounts::new(),
                    start_date: row.start_date,
                    end_date: row.end_date,
                    active: row.active,
                })
                .total_by_currency
                .add(currency, row.total);
        }
        Ok(budgets.into_values().collect())
    }

    /// Records a direct payment
    pub async fn insert_payment(&self, payment: &Payment) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, organization_id, amount, currency, direction, status,
                paid_date, description
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.organization_id.as_uuid())
        .bind(payment.amount.amount())
        .bind(payment.amount.currency().code())
        .bind(payment.direction.as_str())
        .bind(payment.status.as_str())
        .bind(payment.paid_date)
        .bind(&payment.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Records a payroll run and its net pay per currency
    pub async fn insert_payroll_run(&self, run: &PayrollRun) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO payroll_runs (payroll_id, organization_id, pay_date) VALUES ($1, $2, $3)")
            .bind(run.id.as_uuid())
            .bind(run.organization_id.as_uuid())
            .bind(run.pay_date)
            .execute(&mut *tx)
            .await?;
        for (currency, net_pay) in run.net_pay.iter() {
            sqlx::query("INSERT INTO payroll_net_pay (payroll_id, currency, net_pay) VALUES ($1, $2, $3)")
                .bind(run.id.as_uuid())
                .bind(currency.code())
                .bind(net_pay)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Records a project budget, one row per currency
    pub async fn insert_budget(&self, budget: &ProjectBudget) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for (currency, total) in budget.total_by_currency.iter() {
            sqlx::query(
                r#"
                INSERT INTO project_budgets (
                    budget_id, organization_id, project_id, project_name, currency, total,
                    start_date, end_date, active
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(budget.id.as_uuid())
            .bind(budget.organization_id.as_uuid())
            .bind(budget.project_id.as_uuid())
            .bind(&budget.project_name)
            .bind(currency.code())
            .bind(total)
            .bind(budget.start_date)
            .bind(budget.end_date)
            .bind(budget.active)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub payment_id: Uuid,
    pub organization_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub direction: String,
    pub status: String,
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DatabaseError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: PaymentId::from(row.payment_id),
            organization_id: OrganizationId::from(row.organization_id),
            amount: money(row.amount, &row.currency)?,
            direction: parse_column("direction", &row.direction)?,
            status: parse_column("status", &row.status)?,
            paid_date: row.paid_date,
            description: row.description,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PayrollNetPayRow {
    payroll_id: Uuid,
    organization_id: Uuid,
    pay_date: NaiveDate,
    currency: String,
    net_pay: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct BillPaymentWithTypeRow {
    #[sqlx(flatten)]
    payment: BillPaymentRow,
    bill_type: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct BudgetRow {
    budget_id: Uuid,
    organization_id: Uuid,
    project_id: Uuid,
    project_name: String,
    currency: String,
    total: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
    active: bool,
}
