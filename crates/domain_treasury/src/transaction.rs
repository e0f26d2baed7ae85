//! Treasury transactions
//!
//! Transactions are the append-only treasury ledger entries shown in
//! reports. Some are entered by hand; others are generated by bill payments,
//! client collections or payroll runs and carry a reference prefix that
//! identifies their origin.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{BillPaymentId, Money, OrganizationId, PayrollId, ProjectId, TransactionId};

use crate::payment::SettlementAccount;

/// Direction of a treasury movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type '{other}'")),
        }
    }
}

/// Category names used by generated and hand-entered transactions
pub mod categories {
    pub const COLLECTION: &str = "Cobranza";
    pub const COLLECTION_SHORT: &str = "Cobro";
    pub const PROVIDER_PAYMENTS: &str = "Pagos Proveedores";
    pub const PAYROLL: &str = "Nómina";
    pub const BILL_PAYMENT: &str = "Pago Factura";
    pub const BILL: &str = "Factura";
    pub const INCOME: &str = "Ingreso";
    pub const EXPENSE: &str = "Egreso";
    pub const TRANSFER: &str = "Transferencia";
    pub const ADJUSTMENT: &str = "Ajuste";
    pub const INTEREST: &str = "Interés";
    pub const FEE: &str = "Comisión";
}

/// Reference prefixes that identify generated transactions
pub mod references {
    use core_kernel::BillPaymentId;

    /// Mirrors of bill payments
    pub const BILL_PAYMENT_PREFIX: &str = "BILL-PAY-";
    /// Client collections and payroll payouts
    pub const PAYMENT_PREFIX: &str = "PAY-";
    pub const EXPENSE_PREFIX: &str = "EXPENSE-";
    pub const PURCHASE_PREFIX: &str = "PURCHASE-";
    pub const MANUAL_MARKER: &str = "MANUAL";
    pub const IMPORT_MARKER: &str = "IMPORT";

    /// Reference written on the transaction mirroring a bill payment
    pub fn bill_payment(payment_id: BillPaymentId) -> String {
        format!("{}{}", BILL_PAYMENT_PREFIX, payment_id.as_uuid())
    }
}

/// A treasury ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// Owning organization
    pub organization_id: OrganizationId,
    /// Amount, always positive; direction comes from `tx_type`
    pub amount: Money,
    /// Income or expense
    pub tx_type: TransactionType,
    /// Category name
    pub category: String,
    /// Origin reference, e.g. `BILL-PAY-<id>`
    pub reference: Option<String>,
    /// Free-text description
    pub description: Option<String>,
    /// Movement date
    pub date: DateTime<Utc>,
    /// Treasury account moved
    pub settlement: Option<SettlementAccount>,
    /// Project the movement is charged to
    pub project_id: Option<ProjectId>,
    /// Payroll run that generated the movement
    pub payroll_id: Option<PayrollId>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Creates a hand-entered transaction
    pub fn new(
        organization_id: OrganizationId,
        amount: Money,
        tx_type: TransactionType,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::new_v7(),
            organization_id,
            amount,
            tx_type,
            category: category.into(),
            reference: None,
            description: None,
            date,
            settlement: None,
            project_id: None,
            payroll_id: None,
            created_at: Utc::now(),
        }
    }

    /// Sets the reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the settlement account
    pub fn with_settlement(mut self, settlement: SettlementAccount) -> Self {
        self.settlement = Some(settlement);
        self
    }

    /// Sets the project
    pub fn with_project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = project_id;
        self
    }

    /// Sets the payroll run
    pub fn with_payroll(mut self, payroll_id: PayrollId) -> Self {
        self.payroll_id = Some(payroll_id);
        self
    }

    /// Reference or empty string
    pub fn reference_str(&self) -> &str {
        self.reference.as_deref().unwrap_or("")
    }

    /// Returns true when this transaction mirrors `payment_id`
    pub fn mirrors_bill_payment(&self, payment_id: BillPaymentId) -> bool {
        self.reference_str() == references::bill_payment(payment_id)
    }
}
