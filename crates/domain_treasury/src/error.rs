//! Treasury domain errors

use core_kernel::{Money, MoneyError, PortError};
use thiserror::Error;

/// Errors that can occur while applying or reading bill payments
///
/// Every variant is a distinct kind so the API layer can map it to a
/// structured response without parsing messages.
#[derive(Debug, Error)]
pub enum TreasuryError {
    /// Bill not found in the caller's organization
    #[error("Bill not found: {0}")]
    BillNotFound(String),

    /// Settlement account not found in the bill's organization
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The bill is already fully paid
    #[error("Bill {0} is already paid")]
    BillAlreadyPaid(String),

    /// The bill is in a state that does not accept payments
    #[error("Bill {bill} does not accept payments in status {status}")]
    BillNotPayable {
        bill: String,
        status: String,
    },

    /// The payment would take the paid total above the bill total
    #[error("Payment of {attempted} exceeds the remaining balance of {remaining}")]
    OverpaymentRejected {
        remaining: Money,
        attempted: Money,
    },

    /// Amount is zero, negative or otherwise unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency is unknown or does not match the bill
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Neither or both of cash box and bank account were given
    #[error("Exactly one settlement account (cash box or bank account) is required")]
    MissingSettlementAccount,

    /// The atomic payment unit could not commit because of a concurrent writer
    #[error("Ledger write conflict")]
    LedgerWriteConflict,

    /// The payment unit kept conflicting after every retry
    #[error("Payment could not be committed after {attempts} attempts")]
    TransientFailure {
        attempts: u32,
    },

    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(#[from] PortError),
}

impl TreasuryError {
    /// Stable machine-readable kind, used in API responses and logs
    pub fn kind(&self) -> &'static str {
        match self {
            TreasuryError::BillNotFound(_) => "BillNotFound",
            TreasuryError::AccountNotFound(_) => "AccountNotFound",
            TreasuryError::BillAlreadyPaid(_) => "BillAlreadyPaid",
            TreasuryError::BillNotPayable { .. } => "BillNotPayable",
            TreasuryError::OverpaymentRejected { .. } => "OverpaymentRejected",
            TreasuryError::InvalidAmount(_) => "InvalidAmount",
            TreasuryError::InvalidCurrency(_) => "InvalidCurrency",
            TreasuryError::MissingSettlementAccount => "MissingSettlementAccount",
            TreasuryError::LedgerWriteConflict => "LedgerWriteConflict",
            TreasuryError::TransientFailure { .. } => "TransientFailure",
            TreasuryError::Store(_) => "StoreFailure",
        }
    }

    /// Referenced entity is missing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TreasuryError::BillNotFound(_) | TreasuryError::AccountNotFound(_)
        )
    }

    /// Request was rejected by validation before any write
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TreasuryError::BillAlreadyPaid(_)
                | TreasuryError::BillNotPayable { .. }
                | TreasuryError::OverpaymentRejected { .. }
                | TreasuryError::InvalidAmount(_)
                | TreasuryError::InvalidCurrency(_)
                | TreasuryError::MissingSettlementAccount
        )
    }

    /// Remaining balance carried by an overpayment rejection
    pub fn remaining(&self) -> Option<Money> {
        match self {
            TreasuryError::OverpaymentRejected { remaining, .. } => Some(*remaining),
            _ => None,
        }
    }
}

impl From<MoneyError> for TreasuryError {
    fn from(error: MoneyError) -> Self {
        match error {
            MoneyError::CurrencyMismatch(..) | MoneyError::InvalidCurrency(_) => {
                TreasuryError::InvalidCurrency(error.to_string())
            }
            MoneyError::InvalidAmount(_) | MoneyError::DivisionByZero => {
                TreasuryError::InvalidAmount(error.to_string())
            }
        }
    }
}

/// Failure of the post-commit bill-paid notification
///
/// Never surfaced to callers; the processor logs it and moves on.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification channel closed")]
    ChannelClosed,

    #[error("Notification queue is full")]
    QueueFull,

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}
