//! Settlement rules for a single bill payment
//!
//! Everything the atomic payment unit writes is decided here, from the bill
//! as read under lock and its paid total at that moment. Store adapters call
//! [`plan_settlement`] inside their unit and then persist the plan verbatim,
//! so the in-memory and Postgres stores cannot drift apart.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use core_kernel::{BillId, BillPaymentId, Money, OrganizationId, TransactionId};

use crate::bill::{Bill, BillStatus, BillType};
use crate::error::TreasuryError;
use crate::ledger::AccountBalanceKey;
use crate::payment::{BillPayment, PaymentMethod, SettlementAccount};
use crate::transaction::{references, Transaction};

/// A validated payment request, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentDraft {
    pub payment_id: BillPaymentId,
    pub transaction_id: TransactionId,
    pub organization_id: OrganizationId,
    pub bill_id: BillId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub payment_date: DateTime<Utc>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub settlement: SettlementAccount,
}

/// All writes of one payment unit
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPlan {
    pub payment: BillPayment,
    pub ledger_key: AccountBalanceKey,
    pub ledger_delta: Decimal,
    pub transaction: Transaction,
    pub new_status: BillStatus,
    pub paid_date: Option<DateTime<Utc>>,
    pub paid_total_after: Decimal,
    pub transitions_to_paid: bool,
    pub remaining_after: Money,
}

/// Rejects bills that do not accept payments
pub fn check_payable(bill: &Bill) -> Result<(), TreasuryError> {
    match bill.status {
        BillStatus::Paid => Err(TreasuryError::BillAlreadyPaid(bill.id.to_string())),
        BillStatus::Cancelled => Err(TreasuryError::BillNotPayable {
            bill: bill.id.to_string(),
            status: bill.status.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Rejects a payment larger than what is still owed
pub fn check_remaining(bill: &Bill, paid_total: Decimal, amount: &Money) -> Result<(), TreasuryError> {
    let remaining = bill.remaining(paid_total);
    if amount.amount() > remaining.amount() {
        return Err(TreasuryError::OverpaymentRejected {
            remaining,
            attempted: *amount,
        });
    }
    Ok(())
}

/// Decides every write of the payment unit
///
/// Re-runs the payable and remaining checks, so callers can hand it the bill
/// they just locked and trust the outcome.
pub fn plan_settlement(
    bill: &Bill,
    paid_total: Decimal,
    draft: &PaymentDraft,
    now: DateTime<Utc>,
) -> Result<SettlementPlan, TreasuryError> {
    check_payable(bill)?;
    if draft.amount.currency() != bill.currency() {
        return Err(TreasuryError::InvalidCurrency(format!(
            "payment in {} against a bill in {}",
            draft.amount.currency(),
            bill.currency()
        )));
    }
    check_remaining(bill, paid_total, &draft.amount)?;

    let paid_total_after = paid_total + draft.amount.amount();
    let new_status = bill.status_after(paid_total_after);
    let transitions_to_paid = new_status == BillStatus::Paid && bill.status != BillStatus::Paid;
    let paid_date = if transitions_to_paid {
        Some(now)
    } else {
        bill.paid_date
    };

    let payment = BillPayment {
        id: draft.payment_id,
        bill_id: bill.id,
        organization_id: bill.organization_id,
        amount: draft.amount,
        method: draft.method,
        payment_date: draft.payment_date,
        reference: draft.reference.clone(),
        notes: draft.notes.clone(),
        settlement: draft.settlement,
        created_at: now,
    };

    let mut transaction = Transaction::new(
        bill.organization_id,
        draft.amount,
        bill.bill_type.transaction_type(),
        bill.bill_type.transaction_category(),
        draft.payment_date,
    )
    .with_reference(references::bill_payment(draft.payment_id))
    .with_description(mirror_description(bill))
    .with_settlement(draft.settlement)
    .with_project(bill.project_id);
    transaction.id = draft.transaction_id;
    transaction.created_at = now;

    Ok(SettlementPlan {
        payment,
        ledger_key: AccountBalanceKey::for_settlement(&draft.settlement, bill.currency()),
        ledger_delta: bill.bill_type.ledger_sign() * draft.amount.amount(),
        transaction,
        new_status,
        paid_date,
        paid_total_after,
        transitions_to_paid,
        remaining_after: bill.remaining(paid_total_after),
    })
}

fn mirror_description(bill: &Bill) -> String {
    match bill.bill_type {
        BillType::Client => {
            format!("Cobro factura {} - {}", bill.number, bill.entity_name)
        }
        BillType::Provider => {
            format!("Pago factura {} - {}", bill.number, bill.entity_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{categories, TransactionType};
    use chrono::NaiveDate;
    use core_kernel::{CashBoxId, Currency};
    use rust_decimal_macros::dec;

    fn bill(bill_type: BillType, total: Decimal) -> Bill {
        Bill::new(
            OrganizationId::new(),
            bill_type,
            "F-0042",
            "Ferretería Norte",
            Money::new(total, Currency::PESOS),
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        )
    }

    fn draft(bill: &Bill, amount: Decimal) -> PaymentDraft {
        PaymentDraft {
            payment_id: BillPaymentId::new_v7(),
            transaction_id: TransactionId::new_v7(),
            organization_id: bill.organization_id,
            bill_id: bill.id,
            amount: Money::new(amount, bill.currency()),
            method: PaymentMethod::Cash,
            payment_date: Utc::now(),
            reference: None,
            notes: None,
            settlement: SettlementAccount::CashBox(CashBoxId::new()),
        }
    }

    #[test]
    fn test_client_payment_plan() {
        let b = bill(BillType::Client, dec!(1000));
        let d = draft(&b, dec!(400));
        let plan = plan_settlement(&b, Decimal::ZERO, &d, Utc::now()).unwrap();

        assert_eq!(plan.ledger_delta, dec!(400));
        assert_eq!(plan.new_status, BillStatus::Partial);
        assert!(!plan.transitions_to_paid);
        assert!(plan.paid_date.is_none());
        assert_eq!(plan.remaining_after.amount(), dec!(600));
        assert_eq!(plan.transaction.tx_type, TransactionType::Income);
        assert_eq!(plan.transaction.category, categories::COLLECTION);
        assert!(plan.transaction.mirrors_bill_payment(d.payment_id));
        assert_eq!(plan.ledger_key.currency, Currency::PESOS);
    }

    #[test]
    fn test_provider_payment_debits_and_closes() {
        let b = bill(BillType::Provider, dec!(250));
        let plan = plan_settlement(&b, dec!(50), &draft(&b, dec!(200)), Utc::now()).unwrap();

        assert_eq!(plan.ledger_delta, dec!(-200));
        assert_eq!(plan.new_status, BillStatus::Paid);
        assert!(plan.transitions_to_paid);
        assert!(plan.paid_date.is_some());
        assert!(plan.remaining_after.is_zero());
        assert_eq!(plan.transaction.category, categories::PROVIDER_PAYMENTS);
    }

    #[test]
    fn test_overpayment_reports_remaining() {
        let b = bill(BillType::Client, dec!(1000));
        let err = plan_settlement(&b, dec!(600), &draft(&b, dec!(600)), Utc::now()).unwrap_err();
        assert_eq!(err.remaining(), Some(Money::new(dec!(400), Currency::PESOS)));
    }

    #[test]
    fn test_paid_and_cancelled_are_rejected() {
        let paid = bill(BillType::Client, dec!(10)).with_status(BillStatus::Paid);
        assert!(matches!(check_payable(&paid), Err(TreasuryError::BillAlreadyPaid(_))));

        let cancelled = bill(BillType::Client, dec!(10)).with_status(BillStatus::Cancelled);
        assert!(matches!(
            check_payable(&cancelled),
            Err(TreasuryError::BillNotPayable { .. })
        ));
    }

    #[test]
    fn test_currency_must_match_bill() {
        let b = bill(BillType::Client, dec!(100));
        let mut d = draft(&b, dec!(10));
        d.amount = Money::new(dec!(10), Currency::USD);
        assert!(matches!(
            plan_settlement(&b, Decimal::ZERO, &d, Utc::now()),
            Err(TreasuryError::InvalidCurrency(_))
        ));
    }
}
