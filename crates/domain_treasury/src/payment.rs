//! Bill payments and settlement accounts
//!
//! A bill payment is immutable once created. It always settles into exactly
//! one treasury account, which the [`SettlementAccount`] enum enforces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{BankAccountId, BillId, BillPaymentId, CashBoxId, Money, OrganizationId};

use crate::error::TreasuryError;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Cash
    Cash,
    /// Bank transfer
    Transfer,
    /// Check/cheque
    Check,
    /// Credit or debit card
    Card,
    /// Anything else
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Check => "CHECK",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Other => "OTHER",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "TRANSFER" | "BANK_TRANSFER" => Ok(PaymentMethod::Transfer),
            "CHECK" => Ok(PaymentMethod::Check),
            "CARD" => Ok(PaymentMethod::Card),
            "OTHER" => Ok(PaymentMethod::Other),
            other => Err(format!("unknown payment method '{other}'")),
        }
    }
}

/// Kind of treasury account a balance belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    CashBox,
    BankAccount,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::CashBox => "CASH_BOX",
            AccountKind::BankAccount => "BANK_ACCOUNT",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH_BOX" => Ok(AccountKind::CashBox),
            "BANK_ACCOUNT" => Ok(AccountKind::BankAccount),
            other => Err(format!("unknown account kind '{other}'")),
        }
    }
}

/// The treasury account a payment settles into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementAccount {
    CashBox(CashBoxId),
    BankAccount(BankAccountId),
}

impl SettlementAccount {
    /// Builds the settlement account from the two optional request fields
    ///
    /// # Errors
    ///
    /// `MissingSettlementAccount` unless exactly one is given.
    pub fn from_parts(
        cash_box_id: Option<CashBoxId>,
        bank_account_id: Option<BankAccountId>,
    ) -> Result<Self, TreasuryError> {
        match (cash_box_id, bank_account_id) {
            (Some(id), None) => Ok(SettlementAccount::CashBox(id)),
            (None, Some(id)) => Ok(SettlementAccount::BankAccount(id)),
            _ => Err(TreasuryError::MissingSettlementAccount),
        }
    }

    /// Rebuilds a settlement account from its stored kind and id
    pub fn from_kind(kind: AccountKind, id: Uuid) -> Self {
        match kind {
            AccountKind::CashBox => SettlementAccount::CashBox(CashBoxId::from_uuid(id)),
            AccountKind::BankAccount => SettlementAccount::BankAccount(BankAccountId::from_uuid(id)),
        }
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            SettlementAccount::CashBox(_) => AccountKind::CashBox,
            SettlementAccount::BankAccount(_) => AccountKind::BankAccount,
        }
    }

    /// Raw account id, used as the ledger key
    pub fn account_uuid(&self) -> Uuid {
        match self {
            SettlementAccount::CashBox(id) => *id.as_uuid(),
            SettlementAccount::BankAccount(id) => *id.as_uuid(),
        }
    }

    pub fn cash_box_id(&self) -> Option<CashBoxId> {
        match self {
            SettlementAccount::CashBox(id) => Some(*id),
            SettlementAccount::BankAccount(_) => None,
        }
    }

    pub fn bank_account_id(&self) -> Option<BankAccountId> {
        match self {
            SettlementAccount::BankAccount(id) => Some(*id),
            SettlementAccount::CashBox(_) => None,
        }
    }
}

impl fmt::Display for SettlementAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementAccount::CashBox(id) => write!(f, "{id}"),
            SettlementAccount::BankAccount(id) => write!(f, "{id}"),
        }
    }
}

/// A payment applied against a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPayment {
    /// Unique identifier
    pub id: BillPaymentId,
    /// Bill being paid
    pub bill_id: BillId,
    /// Organization owning the bill
    pub organization_id: OrganizationId,
    /// Payment amount, in the bill currency
    pub amount: Money,
    /// Payment method
    pub method: PaymentMethod,
    /// Date the money moved
    pub payment_date: DateTime<Utc>,
    /// External reference (bank ref, receipt number)
    pub reference: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Account the money settled into or out of
    pub settlement: SettlementAccount,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_settlement_account() {
        let cash = CashBoxId::new();
        let bank = BankAccountId::new();

        assert_eq!(
            SettlementAccount::from_parts(Some(cash), None).unwrap(),
            SettlementAccount::CashBox(cash)
        );
        assert_eq!(
            SettlementAccount::from_parts(None, Some(bank)).unwrap().kind(),
            AccountKind::BankAccount
        );
        assert!(matches!(
            SettlementAccount::from_parts(None, None),
            Err(TreasuryError::MissingSettlementAccount)
        ));
        assert!(matches!(
            SettlementAccount::from_parts(Some(cash), Some(bank)),
            Err(TreasuryError::MissingSettlementAccount)
        ));
    }

    #[test]
    fn test_settlement_round_trips_through_kind() {
        let account = SettlementAccount::BankAccount(BankAccountId::new());
        let rebuilt = SettlementAccount::from_kind(account.kind(), account.account_uuid());
        assert_eq!(rebuilt, account);
    }

    #[test]
    fn test_payment_method_parsing_is_case_insensitive() {
        assert_eq!("transfer".parse::<PaymentMethod>(), Ok(PaymentMethod::Transfer));
        assert!("barter".parse::<PaymentMethod>().is_err());
    }
}
