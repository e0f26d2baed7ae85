//! Account balance repository
//!
//! Balances are only ever changed with a single upsert that adds the delta
//! to whatever is stored, so two writers settling into the same account
//! cannot overwrite each other.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::OrganizationId;
use domain_treasury::{AccountBalance, AccountBalanceKey};

use super::parse_column;
use crate::error::DatabaseError;

/// Repository for the `account_balances` table
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds `delta` to a balance in its own transaction
    pub async fn apply_delta(
        &self,
        organization_id: OrganizationId,
        key: AccountBalanceKey,
        delta: Decimal,
    ) -> Result<Decimal, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::apply_delta_in(&mut conn, organization_id, key, delta).await
    }

    /// Adds `delta` to a balance inside the caller's transaction
    ///
    /// # Returns
    ///
    /// The balance after the increment
    pub async fn apply_delta_in(
        conn: &mut PgConnection,
        organization_id: OrganizationId,
        key: AccountBalanceKey,
        delta: Decimal,
    ) -> Result<Decimal, DatabaseError> {
        let balance: Decimal = sqlx::query_scalar(
            r#"
            INSERT INTO account_balances (
                account_id, account_kind, currency, organization_id, balance, updated_at
            ) VALUES ($1, $2, $3, $4, $5, now())
            ON CONFLICT (account_id, account_kind, currency)
            DO UPDATE SET balance = account_balances.balance + EXCLUDED.balance,
                          updated_at = now()
            RETURNING balance
            "#,
        )
        .bind(key.account_id)
        .bind(key.account_kind.as_str())
        .bind(key.currency.code())
        .bind(organization_id.as_uuid())
        .bind(delta)
        .fetch_one(&mut *conn)
        .await?;
        Ok(balance)
    }

    /// Current balance, zero when the row does not exist yet
    pub async fn get_balance(&self, key: AccountBalanceKey) -> Result<Decimal, DatabaseError> {
        let balance: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT balance FROM account_balances
            WHERE account_id = $1 AND account_kind = $2 AND currency = $3
            "#,
        )
        .bind(key.account_id)
        .bind(key.account_kind.as_str())
        .bind(key.currency.code())
        .fetch_optional(&self.pool)
        .await?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    /// Every balance row of an organization
    pub async fn balances_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AccountBalance>, DatabaseError> {
        let rows = sqlx::query_as::<_, BalanceRow>(
            r#"
            SELECT account_id, account_kind, currency, organization_id, balance, updated_at
            FROM account_balances
            WHERE organization_id = $1
            ORDER BY account_kind, account_id, currency
            "#,
        )
        .bind(organization_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccountBalance::try_from).collect()
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BalanceRow {
    pub account_id: Uuid,
    pub account_kind: String,
    pub currency: String,
    pub organization_id: Uuid,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BalanceRow> for AccountBalance {
    type Error = DatabaseError;

    fn try_from(row: BalanceRow) -> Result<Self, Self::Error> {
        Ok(AccountBalance {
            key: AccountBalanceKey::new(
                row.account_id,
                parse_column("account_kind", &row.account_kind)?,
                parse_column("currency", &row.currency)?,
            ),
            organization_id: OrganizationId::from(row.organization_id),
            balance: row.balance,
            updated_at: row.updated_at,
        })
    }
}
