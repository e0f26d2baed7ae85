//! Bill payment DTOs

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{BankAccountId, BillId, CashBoxId, Currency, OrganizationId};
use domain_treasury::{ApplyPaymentCommand, PaymentMethod, PaymentReceipt, TreasuryError};

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyPaymentRequest {
    pub organization_id: OrganizationId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Parsed after deserialization so unknown codes report `InvalidCurrency`
    #[validate(length(max = 16))]
    pub currency: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    #[validate(length(max = 255))]
    pub reference: Option<String>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    pub cash_box_id: Option<CashBoxId>,
    pub bank_account_id: Option<BankAccountId>,
}

impl ApplyPaymentRequest {
    pub fn into_command(self, bill_id: BillId) -> Result<ApplyPaymentCommand, TreasuryError> {
        let currency = self
            .currency
            .as_deref()
            .map(Currency::from_str)
            .transpose()?;

        Ok(ApplyPaymentCommand {
            organization_id: self.organization_id,
            bill_id,
            amount: self.amount,
            method: self.method,
            currency,
            payment_date: self.payment_date,
            reference: self.reference,
            notes: self.notes,
            cash_box_id: self.cash_box_id,
            bank_account_id: self.bank_account_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApplyPaymentResponse {
    pub payment: PaymentReceipt,
    pub message: String,
}

impl From<PaymentReceipt> for ApplyPaymentResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        let message = if receipt.bill_paid {
            format!("Payment applied; bill {} is fully paid", receipt.bill.number)
        } else {
            format!(
                "Payment applied; {} remaining on bill {}",
                receipt.remaining, receipt.bill.number
            )
        };
        Self {
            payment: receipt,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrganizationQuery {
    pub organization_id: OrganizationId,
}
