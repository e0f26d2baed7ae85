//! Transaction origin classification
//!
//! Reports split treasury transactions by where the money came from. The
//! rules below are evaluated top to bottom and the first one that decides
//! wins; the last rule always decides, so classification is total.
//!
//! Rule order matters: reference prefixes are the most reliable signal, the
//! category comes next and the free-text description is only scanned when
//! nothing else matched.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transaction::{categories, references, Transaction, TransactionType};

/// Where a treasury movement originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionOrigin {
    /// Client collections
    Clients,
    /// Payroll payouts
    Employees,
    /// Bill payments
    Bills,
    /// Hand-entered or imported treasury movements
    Treasury,
}

impl TransactionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOrigin::Clients => "CLIENTS",
            TransactionOrigin::Employees => "EMPLOYEES",
            TransactionOrigin::Bills => "BILLS",
            TransactionOrigin::Treasury => "TREASURY",
        }
    }
}

impl fmt::Display for TransactionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the decision table
#[derive(Clone, Copy)]
pub struct ClassificationRule {
    /// Diagnostic name
    pub name: &'static str,
    /// Returns the origin when the rule applies
    pub decide: fn(&Transaction) -> Option<TransactionOrigin>,
}

impl fmt::Debug for ClassificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationRule").field("name", &self.name).finish()
    }
}

const PAYROLL_KEYWORDS: &[&str] = &[
    "nómina", "nomina", "sueldo", "salario", "payroll", "salary", "empleado", "aguinaldo",
];
const CLIENT_KEYWORDS: &[&str] = &["cobranza", "cobro", "cliente", "client", "collection"];
const BILL_KEYWORDS: &[&str] = &["factura", "proveedor", "invoice", "provider", "supplier"];
const TREASURY_KEYWORDS: &[&str] = &[
    "transferencia", "ajuste", "interés", "interes", "comisión", "comision", "bancari", "caja",
];

/// The ordered decision table
pub static RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "client_collection_reference",
        decide: client_collection_reference,
    },
    ClassificationRule {
        name: "payroll_payout_reference",
        decide: payroll_payout_reference,
    },
    ClassificationRule {
        name: "bill_payment_reference",
        decide: bill_payment_reference,
    },
    ClassificationRule {
        name: "treasury_reference",
        decide: treasury_reference,
    },
    ClassificationRule {
        name: "category",
        decide: by_category,
    },
    ClassificationRule {
        name: "description_keywords",
        decide: by_description,
    },
    ClassificationRule {
        name: "default",
        decide: |_| Some(TransactionOrigin::Treasury),
    },
];

/// Classifies a transaction
pub fn classify(tx: &Transaction) -> TransactionOrigin {
    classify_with_rule(tx).0
}

/// Classifies a transaction and reports the deciding rule
pub fn classify_with_rule(tx: &Transaction) -> (TransactionOrigin, &'static str) {
    RULES
        .iter()
        .find_map(|rule| (rule.decide)(tx).map(|origin| (origin, rule.name)))
        .unwrap_or((TransactionOrigin::Treasury, "default"))
}

fn client_collection_reference(tx: &Transaction) -> Option<TransactionOrigin> {
    (tx.reference_str().starts_with(references::PAYMENT_PREFIX)
        && tx.category == categories::COLLECTION
        && tx.tx_type == TransactionType::Income)
        .then_some(TransactionOrigin::Clients)
}

fn payroll_payout_reference(tx: &Transaction) -> Option<TransactionOrigin> {
    (tx.reference_str().starts_with(references::PAYMENT_PREFIX)
        && tx.category == categories::PAYROLL
        && tx.tx_type == TransactionType::Expense)
        .then_some(TransactionOrigin::Employees)
}

fn bill_payment_reference(tx: &Transaction) -> Option<TransactionOrigin> {
    tx.reference_str()
        .starts_with(references::BILL_PAYMENT_PREFIX)
        .then_some(TransactionOrigin::Bills)
}

fn treasury_reference(tx: &Transaction) -> Option<TransactionOrigin> {
    let reference = tx.reference_str();
    (reference.starts_with(references::EXPENSE_PREFIX)
        || reference.starts_with(references::PURCHASE_PREFIX)
        || reference.contains(references::MANUAL_MARKER)
        || reference.contains(references::IMPORT_MARKER))
    .then_some(TransactionOrigin::Treasury)
}

fn by_category(tx: &Transaction) -> Option<TransactionOrigin> {
    match tx.category.as_str() {
        categories::PAYROLL => Some(TransactionOrigin::Employees),
        categories::COLLECTION | categories::COLLECTION_SHORT => Some(TransactionOrigin::Clients),
        categories::BILL_PAYMENT | categories::BILL => Some(TransactionOrigin::Bills),
        categories::INCOME
        | categories::EXPENSE
        | categories::TRANSFER
        | categories::ADJUSTMENT
        | categories::INTEREST
        | categories::FEE => Some(TransactionOrigin::Treasury),
        _ => None,
    }
}

fn by_description(tx: &Transaction) -> Option<TransactionOrigin> {
    let description = tx.description.as_deref()?.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| description.contains(w));

    if mentions(PAYROLL_KEYWORDS) {
        Some(TransactionOrigin::Employees)
    } else if mentions(CLIENT_KEYWORDS) {
        Some(TransactionOrigin::Clients)
    } else if mentions(BILL_KEYWORDS) {
        Some(TransactionOrigin::Bills)
    } else if mentions(TREASURY_KEYWORDS) {
        Some(TransactionOrigin::Treasury)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{BillPaymentId, Currency, Money, OrganizationId};
    use rust_decimal_macros::dec;

    fn tx(tx_type: TransactionType, category: &str) -> Transaction {
        Transaction::new(
            OrganizationId::new(),
            Money::new(dec!(100), Currency::PESOS),
            tx_type,
            category,
            Utc::now(),
        )
    }

    #[test]
    fn test_client_collection_needs_all_three_signals() {
        let t = tx(TransactionType::Income, categories::COLLECTION).with_reference("PAY-123");
        assert_eq!(
            classify_with_rule(&t),
            (TransactionOrigin::Clients, "client_collection_reference")
        );

        // Expense with the same reference falls through to the category rule
        let t = tx(TransactionType::Expense, categories::COLLECTION).with_reference("PAY-123");
        assert_eq!(classify_with_rule(&t), (TransactionOrigin::Clients, "category"));
    }

    #[test]
    fn test_payroll_payout() {
        let t = tx(TransactionType::Expense, categories::PAYROLL).with_reference("PAY-77");
        assert_eq!(classify(&t), TransactionOrigin::Employees);
    }

    #[test]
    fn test_bill_payment_reference_beats_category() {
        let t = tx(TransactionType::Income, categories::INCOME)
            .with_reference(references::bill_payment(BillPaymentId::new()));
        assert_eq!(
            classify_with_rule(&t),
            (TransactionOrigin::Bills, "bill_payment_reference")
        );
    }

    #[test]
    fn test_treasury_references() {
        for reference in ["EXPENSE-9", "PURCHASE-1", "2025-MANUAL-4", "IMPORT:bank.csv"] {
            let t = tx(TransactionType::Expense, categories::PAYROLL).with_reference(reference);
            assert_eq!(classify(&t), TransactionOrigin::Treasury, "{reference}");
        }
    }

    #[test]
    fn test_category_table() {
        let cases = [
            (categories::PAYROLL, TransactionOrigin::Employees),
            (categories::COLLECTION_SHORT, TransactionOrigin::Clients),
            (categories::BILL, TransactionOrigin::Bills),
            (categories::BILL_PAYMENT, TransactionOrigin::Bills),
            (categories::INTEREST, TransactionOrigin::Treasury),
            (categories::FEE, TransactionOrigin::Treasury),
        ];
        for (category, expected) in cases {
            assert_eq!(classify(&tx(TransactionType::Income, category)), expected, "{category}");
        }
    }

    #[test]
    fn test_description_keywords_are_case_insensitive() {
        let t = tx(TransactionType::Expense, "Varios").with_description("Pago SUELDO marzo");
        assert_eq!(
            classify_with_rule(&t),
            (TransactionOrigin::Employees, "description_keywords")
        );

        let t = tx(TransactionType::Expense, "Varios").with_description("Factura proveedor cemento");
        assert_eq!(classify(&t), TransactionOrigin::Bills);
    }

    #[test]
    fn test_default_is_treasury() {
        let t = tx(TransactionType::Income, "Varios").with_description("misc");
        assert_eq!(classify_with_rule(&t), (TransactionOrigin::Treasury, "default"));
    }

    #[test]
    fn test_last_rule_always_decides() {
        let last = RULES.last().map(|r| (r.decide)(&tx(TransactionType::Income, "")));
        assert_eq!(last, Some(Some(TransactionOrigin::Treasury)));
    }
}
