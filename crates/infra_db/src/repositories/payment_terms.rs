//! Payment term repository

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{EntityId, OrganizationId, PaymentTermId};
use domain_cashflow::{PaymentTerm, TermStatus};

use super::{money, parse_column};
use crate::error::DatabaseError;

/// Repository for recurring payment terms
#[derive(Debug, Clone)]
pub struct PaymentTermRepository {
    pool: PgPool,
}

impl PaymentTermRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active terms of an organization, oldest first
    pub async fn active_terms(&self, organization_id: OrganizationId) -> Result<Vec<PaymentTerm>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentTermRow>(
            r#"
            SELECT term_id, organization_id, term_type, entity_type, entity_id, entity_name,
                   amount, currency, start_date, recurrence, periods, status, description,
                   created_at
            FROM payment_terms
            WHERE organization_id = $1 AND status = $2
            ORDER BY start_date, created_at
            "#,
        )
        .bind(organization_id.as_uuid())
        .bind(TermStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PaymentTerm::try_from).collect()
    }

    pub async fn insert(&self, term: &PaymentTerm) -> Result<(), DatabaseError> {
        let periods = i32::try_from(term.periods)
            .map_err(|_| DatabaseError::invalid_value("periods", term.periods))?;

        sqlx::query(
            r#"
            INSERT INTO payment_terms (
                term_id, organization_id, term_type, entity_type, entity_id, entity_name,
                amount, currency, start_date, recurrence, periods, status, description,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(term.id.as_uuid())
        .bind(term.organization_id.as_uuid())
        .bind(term.term_type.as_str())
        .bind(term.entity_type.as_str())
        .bind(term.entity_id.as_uuid())
        .bind(&term.entity_name)
        .bind(term.amount.amount())
        .bind(term.amount.currency().code())
        .bind(term.start_date)
        .bind(term.recurrence.as_str())
        .bind(periods)
        .bind(term.status.as_str())
        .bind(&term.description)
        .bind(term.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentTermRow {
    pub term_id: Uuid,
    pub organization_id: Uuid,
    pub term_type: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub start_date: NaiveDate,
    pub recurrence: String,
    pub periods: i32,
    pub status: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PaymentTermRow> for PaymentTerm {
    type Error = DatabaseError;

    fn try_from(row: PaymentTermRow) -> Result<Self, Self::Error> {
        let periods = u32::try_from(row.periods)
            .map_err(|_| DatabaseError::invalid_value("periods", row.periods))?;

        Ok(PaymentTerm {
            id: PaymentTermId::from(row.term_id),
            organization_id: OrganizationId::from(row.organization_id),
            term_type: parse_column("term_type", &row.term_type)?,
            entity_type: parse_column("entity_type", &row.entity_type)?,
            entity_id: EntityId::from(row.entity_id),
            entity_name: row.entity_name,
            amount: money(row.amount, &row.currency)?,
            start_date: row.start_date,
            recurrence: parse_column("recurrence", &row.recurrence)?,
            periods,
            status: parse_column("status", &row.status)?,
            description: row.description,
            created_at: row.created_at,
        })
    }
}
