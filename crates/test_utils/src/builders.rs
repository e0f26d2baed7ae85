//! Test Data Builders
//!
//! Builders for bills, payment terms, transactions and payment commands.
//! Tests set only the fields they care about; everything else has a default.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{
    BankAccountId, CashBoxId, Currency, EntityId, Money, OrganizationId, ProjectId,
};
use domain_cashflow::{EntityType, PaymentTerm, Recurrence, TermStatus, TermType};
use domain_treasury::{
    categories, ApplyPaymentCommand, Bill, BillStatus, BillType, PaymentMethod, Transaction,
    TransactionType,
};
use rust_decimal::Decimal;

use crate::fixtures::{IdFixtures, MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for bills
pub struct BillBuilder {
    organization_id: OrganizationId,
    bill_type: BillType,
    number: String,
    entity_name: String,
    total: Money,
    status: BillStatus,
    due_date: NaiveDate,
    project_id: Option<ProjectId>,
}

impl Default for BillBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BillBuilder {
    /// A pending client bill of 1000 PESOS
    pub fn new() -> Self {
        Self {
            organization_id: IdFixtures::organization_id(),
            bill_type: BillType::Client,
            number: StringFixtures::bill_number().to_string(),
            entity_name: StringFixtures::client_name().to_string(),
            total: MoneyFixtures::pesos_1000(),
            status: BillStatus::Pending,
            due_date: TemporalFixtures::due_date(),
            project_id: None,
        }
    }

    /// A pending provider bill
    pub fn provider() -> Self {
        Self::new()
            .with_type(BillType::Provider)
            .with_entity_name(StringFixtures::provider_name())
    }

    pub fn for_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = organization_id;
        self
    }

    pub fn with_type(mut self, bill_type: BillType) -> Self {
        self.bill_type = bill_type;
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = number.into();
        self
    }

    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    pub fn with_status(mut self, status: BillStatus) -> Self {
        self.status = status;
        self
    }

    pub fn due_on(mut self, due_date: NaiveDate) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn build(self) -> Bill {
        let bill = Bill::new(
            self.organization_id,
            self.bill_type,
            self.number,
            self.entity_name,
            self.total,
            self.due_date,
        )
        .with_status(self.status);
        match self.project_id {
            Some(project_id) => bill.with_project(project_id),
            None => bill,
        }
    }
}

/// Builder for payment commands
pub struct PaymentCommandBuilder {
    command: ApplyPaymentCommand,
}

impl PaymentCommandBuilder {
    /// A cash payment of `amount` against `bill`, in the bill currency
    pub fn against(bill: &Bill, amount: Decimal) -> Self {
        Self {
            command: ApplyPaymentCommand {
                organization_id: bill.organization_id,
                bill_id: bill.id,
                amount,
                method: PaymentMethod::Cash,
                currency: None,
                payment_date: None,
                reference: None,
                notes: None,
                cash_box_id: None,
                bank_account_id: None,
            },
        }
    }

    pub fn into_cash_box(mut self, id: CashBoxId) -> Self {
        self.command.cash_box_id = Some(id);
        self.command.bank_account_id = None;
        self
    }

    pub fn into_bank_account(mut self, id: BankAccountId) -> Self {
        self.command.method = PaymentMethod::Transfer;
        self.command.bank_account_id = Some(id);
        self.command.cash_box_id = None;
        self
    }

    pub fn in_currency(mut self, currency: Currency) -> Self {
        self.command.currency = Some(currency);
        self
    }

    pub fn dated(mut self, payment_date: DateTime<Utc>) -> Self {
        self.command.payment_date = Some(payment_date);
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.command.reference = Some(reference.into());
        self
    }

    pub fn build(self) -> ApplyPaymentCommand {
        self.command
    }
}

/// Builder for payment terms
pub struct PaymentTermBuilder {
    organization_id: OrganizationId,
    term_type: TermType,
    entity_type: EntityType,
    entity_name: String,
    amount: Money,
    start_date: NaiveDate,
    recurrence: Recurrence,
    periods: u32,
    status: TermStatus,
    description: Option<String>,
}

impl Default for PaymentTermBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentTermBuilder {
    /// A monthly client income of 100 USD over three periods
    pub fn new() -> Self {
        Self {
            organization_id: IdFixtures::organization_id(),
            term_type: TermType::Income,
            entity_type: EntityType::Client,
            entity_name: StringFixtures::client_name().to_string(),
            amount: MoneyFixtures::usd_100(),
            start_date: TemporalFixtures::q1_start(),
            recurrence: Recurrence::Monthly,
            periods: 3,
            status: TermStatus::Active,
            description: None,
        }
    }

    /// A provider expense
    pub fn expense() -> Self {
        Self {
            term_type: TermType::Expense,
            entity_type: EntityType::Provider,
            entity_name: StringFixtures::provider_name().to_string(),
            ..Self::new()
        }
    }

    pub fn for_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = organization_id;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn starting(mut self, start_date: NaiveDate) -> Self {
        self.start_date = start_date;
        self
    }

    pub fn every(mut self, recurrence: Recurrence, periods: u32) -> Self {
        self.recurrence = recurrence;
        self.periods = periods;
        self
    }

    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.status = TermStatus::Inactive;
        self
    }

    pub fn build(self) -> PaymentTerm {
        let term = PaymentTerm::new(
            self.organization_id,
            self.term_type,
            self.entity_type,
            EntityId::new(),
            self.entity_name,
            self.amount,
            self.start_date,
            self.recurrence,
            self.periods,
        )
        .with_status(self.status);
        match self.description {
            Some(description) => term.with_description(description),
            None => term,
        }
    }
}

/// Builder for hand-entered treasury transactions
pub struct TransactionBuilder {
    organization_id: OrganizationId,
    amount: Money,
    tx_type: TransactionType,
    category: String,
    reference: Option<String>,
    description: Option<String>,
    date: DateTime<Utc>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    /// An expense of 100 USD with an adjustment category
    pub fn new() -> Self {
        Self {
            organization_id: IdFixtures::organization_id(),
            amount: MoneyFixtures::usd_100(),
            tx_type: TransactionType::Expense,
            category: categories::ADJUSTMENT.to_string(),
            reference: None,
            description: None,
            date: TemporalFixtures::payment_time(),
        }
    }

    pub fn for_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_id = organization_id;
        self
    }

    pub fn income(mut self) -> Self {
        self.tx_type = TransactionType::Income;
        self
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn build(self) -> Transaction {
        let mut tx = Transaction::new(
            self.organization_id,
            self.amount,
            self.tx_type,
            self.category,
            self.date,
        );
        tx.reference = self.reference;
        tx.description = self.description;
        tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bill_builder_defaults() {
        let bill = BillBuilder::new().build();
        assert_eq!(bill.bill_type, BillType::Client);
        assert_eq!(bill.status, BillStatus::Pending);
        assert_eq!(bill.total, MoneyFixtures::pesos_1000());
    }

    #[test]
    fn test_provider_bill() {
        let bill = BillBuilder::provider().with_total(MoneyFixtures::eur_250()).build();
        assert_eq!(bill.bill_type, BillType::Provider);
        assert_eq!(bill.currency(), Currency::EUR);
    }

    #[test]
    fn test_payment_command_switches_account() {
        let bill = BillBuilder::new().build();
        let bank = BankAccountId::new();
        let command = PaymentCommandBuilder::against(&bill, dec!(10))
            .into_cash_box(CashBoxId::new())
            .into_bank_account(bank)
            .build();
        assert_eq!(command.cash_box_id, None);
        assert_eq!(command.bank_account_id, Some(bank));
        assert_eq!(command.method, PaymentMethod::Transfer);
    }

    #[test]
    fn test_term_builder() {
        let term = PaymentTermBuilder::expense()
            .every(Recurrence::Quarterly, 4)
            .inactive()
            .build();
        assert_eq!(term.term_type, TermType::Expense);
        assert_eq!(term.periods, 4);
        assert!(!term.is_active());
    }
}
