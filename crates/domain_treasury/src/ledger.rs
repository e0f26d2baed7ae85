//! Account balance ledger
//!
//! Current balance per `(account, account kind, currency)`. Balances are
//! created lazily on the first movement and afterwards only incremented or
//! decremented; nothing overwrites a stored balance.
//!
//! # Invariants
//!
//! - The stored balance equals the signed sum of every delta applied to the key
//! - `get_balance` on an absent key is zero, not an error
//! - Every balance mutation goes through `apply_delta`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use core_kernel::{Currency, CurrencyAmounts, DomainPort, OrganizationId, PortError};

use crate::payment::{AccountKind, SettlementAccount};

/// Identifies one balance row
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountBalanceKey {
    pub account_id: Uuid,
    pub account_kind: AccountKind,
    pub currency: Currency,
}

impl AccountBalanceKey {
    pub fn new(account_id: Uuid, account_kind: AccountKind, currency: Currency) -> Self {
        Self {
            account_id,
            account_kind,
            currency,
        }
    }

    /// Key for the balance a payment settles into
    pub fn for_settlement(settlement: &SettlementAccount, currency: Currency) -> Self {
        Self::new(settlement.account_uuid(), settlement.kind(), currency)
    }
}

/// A stored balance row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub key: AccountBalanceKey,
    pub organization_id: OrganizationId,
    pub balance: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Sums balances per currency, never across currencies
pub fn totals_by_currency(balances: &[AccountBalance]) -> CurrencyAmounts {
    let mut totals = CurrencyAmounts::zeroed();
    for row in balances {
        totals.add(row.key.currency, row.balance);
    }
    totals
}

/// The single choke point for balance mutations
///
/// Implementations must apply `apply_delta` as one atomic increment so
/// concurrent settlements into the same account never lose an update.
#[async_trait]
pub trait AccountBalanceLedger: DomainPort {
    /// Adds `delta` to the balance for `key`, creating the row if needed
    ///
    /// # Returns
    ///
    /// The balance after the increment
    async fn apply_delta(
        &self,
        organization_id: OrganizationId,
        key: AccountBalanceKey,
        delta: Decimal,
    ) -> Result<Decimal, PortError>;

    /// Current balance, zero for an absent key
    async fn get_balance(&self, key: AccountBalanceKey) -> Result<Decimal, PortError>;

    /// Every balance row of an organization
    async fn balances_for_organization(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AccountBalance>, PortError>;
}

/// In-process balance table
///
/// Not synchronised on its own; owners wrap it in the same lock that guards
/// the rest of their atomic unit.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLedger {
    rows: HashMap<AccountBalanceKey, AccountBalance>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert-with-increment
    pub fn apply(
        &mut self,
        organization_id: OrganizationId,
        key: AccountBalanceKey,
        delta: Decimal,
        now: DateTime<Utc>,
    ) -> Decimal {
        let row = self.rows.entry(key).or_insert_with(|| AccountBalance {
            key,
            organization_id,
            balance: Decimal::ZERO,
            updated_at: now,
        });
        row.balance += delta;
        row.updated_at = now;
        row.balance
    }

    /// Current balance, zero for an absent key
    pub fn balance(&self, key: &AccountBalanceKey) -> Decimal {
        self.rows.get(key).map(|r| r.balance).unwrap_or(Decimal::ZERO)
    }

    /// Rows owned by an organization, ordered by key
    pub fn rows_for(&self, organization_id: OrganizationId) -> Vec<AccountBalance> {
        let mut rows: Vec<AccountBalance> = self
            .rows
            .values()
            .filter(|r| r.organization_id == organization_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.key);
        rows
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn balance_equals_signed_sum_of_deltas(
            deltas in proptest::collection::vec(-1_000_000i64..1_000_000i64, 0..64)
        ) {
            let mut ledger = InMemoryLedger::new();
            let org = OrganizationId::new();
            let key = AccountBalanceKey::new(Uuid::new_v4(), AccountKind::CashBox, Currency::PESOS);

            let mut running = Decimal::ZERO;
            for minor in &deltas {
                let delta = Decimal::new(*minor, 2);
                running += delta;
                prop_assert_eq!(ledger.apply(org, key, delta, Utc::now()), running);
            }
            prop_assert_eq!(ledger.balance(&key), running);
        }
    }
}
