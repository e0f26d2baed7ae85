//! Period consumption for the dashboard
//!
//! Sums what actually moved in a period from four sources, each kept apart
//! per currency:
//!
//! 1. settled payments (client collections and other direct payments)
//! 2. hand-entered treasury transactions
//! 3. payroll net pay
//! 4. bill payments
//!
//! Treasury transactions generated by the other three sources are skipped so
//! nothing is counted twice.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use core_kernel::{
    CurrencyAmounts, DateRange, Money, MonthKey, NaiveCrossCurrencyTotal, OrganizationId,
    PaymentId, PayrollId,
};
use domain_treasury::{
    categories, classify, references, BillPayment, BillType, Transaction, TransactionOrigin,
    TransactionType,
};

/// Lifecycle of a direct payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "CANCELLED" => Ok(PaymentStatus::Cancelled),
            other => Err(format!("unknown payment status '{other}'")),
        }
    }
}

/// A direct payment, in or out, outside the bill workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub organization_id: OrganizationId,
    pub amount: Money,
    pub direction: TransactionType,
    pub status: PaymentStatus,
    /// Set once settled
    pub paid_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl Payment {
    /// Settlement date when the payment is paid
    pub fn settled_on(&self) -> Option<NaiveDate> {
        match self.status {
            PaymentStatus::Paid => self.paid_date,
            _ => None,
        }
    }
}

/// Net pay of one payroll run, per currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRun {
    pub id: PayrollId,
    pub organization_id: OrganizationId,
    pub pay_date: NaiveDate,
    pub net_pay: CurrencyAmounts,
}

/// A bill payment together with the type of the bill it paid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillPaymentRecord {
    pub payment: BillPayment,
    pub bill_type: BillType,
}

/// Everything the aggregation reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsumptionInputs {
    pub payments: Vec<Payment>,
    pub transactions: Vec<Transaction>,
    pub payroll: Vec<PayrollRun>,
    pub bill_payments: Vec<BillPaymentRecord>,
}

/// Source a consumption figure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsumptionCategory {
    Payments,
    Treasury,
    Payroll,
    BillPayments,
}

impl ConsumptionCategory {
    pub const ALL: [ConsumptionCategory; 4] = [
        ConsumptionCategory::Payments,
        ConsumptionCategory::Treasury,
        ConsumptionCategory::Payroll,
        ConsumptionCategory::BillPayments,
    ];
}

/// Revenue and expense, each per currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueExpense {
    pub revenue_by_currency: CurrencyAmounts,
    pub expense_by_currency: CurrencyAmounts,
}

impl Default for RevenueExpense {
    fn default() -> Self {
        Self {
            revenue_by_currency: CurrencyAmounts::zeroed(),
            expense_by_currency: CurrencyAmounts::zeroed(),
        }
    }
}

impl RevenueExpense {
    fn record(&mut self, direction: TransactionType, amount: &Money) {
        match direction {
            TransactionType::Income => self.revenue_by_currency.add_money(amount),
            TransactionType::Expense => self.expense_by_currency.add_money(amount),
        }
    }
}

/// One source's share of the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConsumption {
    pub category: ConsumptionCategory,
    #[serde(flatten)]
    pub amounts: RevenueExpense,
}

/// One calendar month of the period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyConsumption {
    pub month: MonthKey,
    #[serde(flatten)]
    pub amounts: RevenueExpense,
}

/// Result of [`aggregate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodConsumption {
    pub period: DateRange,
    pub monthly_revenue_by_currency: CurrencyAmounts,
    pub monthly_expense_by_currency: CurrencyAmounts,
    pub category_breakdown: Vec<CategoryConsumption>,
    /// Every month touched by the period, chronological
    pub monthly: Vec<MonthlyConsumption>,
    /// Revenue minus expense summed across currencies; display only
    pub naive_cross_currency_total: NaiveCrossCurrencyTotal,
}

impl PeriodConsumption {
    /// Expense per currency in `month`, zeros when the month is outside the period
    pub fn expense_in(&self, month: MonthKey) -> CurrencyAmounts {
        self.monthly
            .iter()
            .find(|m| m.month == month)
            .map(|m| m.amounts.expense_by_currency.clone())
            .unwrap_or_else(CurrencyAmounts::zeroed)
    }
}

/// Whether a treasury transaction counts as hand-entered treasury movement
///
/// Payroll transactions, payment mirrors and anything the classifier
/// attributes to bills, employees or clients are already counted by their
/// own source.
pub fn counts_as_treasury(tx: &Transaction) -> bool {
    if tx.category == categories::PAYROLL
        || tx.reference_str().starts_with(references::PAYMENT_PREFIX)
        || tx.payroll_id.is_some()
    {
        return false;
    }
    classify(tx) == TransactionOrigin::Treasury
}

struct Accumulator {
    period: DateRange,
    categories: BTreeMap<ConsumptionCategory, RevenueExpense>,
    months: BTreeMap<MonthKey, RevenueExpense>,
}

impl Accumulator {
    fn new(period: DateRange) -> Self {
        Self {
            period,
            categories: ConsumptionCategory::ALL
                .iter()
                .map(|c| (*c, RevenueExpense::default()))
                .collect(),
            months: period
                .months()
                .into_iter()
                .map(|m| (m, RevenueExpense::default()))
                .collect(),
        }
    }

    fn record(&mut self, category: ConsumptionCategory, date: NaiveDate, direction: TransactionType, amount: &Money) {
        if !self.period.contains(date) {
            return;
        }
        self.categories.entry(category).or_default().record(direction, amount);
        self.months.entry(MonthKey::of(date)).or_default().record(direction, amount);
    }
}

fn day_of(timestamp: &DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// Aggregates revenue and expense for `period`
pub fn aggregate(inputs: &ConsumptionInputs, period: DateRange) -> PeriodConsumption {
    let mut acc = Accumulator::new(period);

    for payment in &inputs.payments {
        if let Some(date) = payment.settled_on() {
            acc.record(ConsumptionCategory::Payments, date, payment.direction, &payment.amount);
        }
    }

    for tx in inputs.transactions.iter().filter(|t| counts_as_treasury(t)) {
        acc.record(ConsumptionCategory::Treasury, day_of(&tx.date), tx.tx_type, &tx.amount);
    }

    for run in &inputs.payroll {
        for (currency, amount) in run.net_pay.iter() {
            acc.record(
                ConsumptionCategory::Payroll,
                run.pay_date,
                TransactionType::Expense,
                &Money::new(amount, currency),
            );
        }
    }

    for record in &inputs.bill_payments {
        acc.record(
            ConsumptionCategory::BillPayments,
            day_of(&record.payment.payment_date),
            record.bill_type.transaction_type(),
            &record.payment.amount,
        );
    }

    let mut totals = RevenueExpense::default();
    for amounts in acc.categories.values() {
        totals.revenue_by_currency.merge(&amounts.revenue_by_currency);
        totals.expense_by_currency.merge(&amounts.expense_by_currency);
    }

    let mut net = totals.revenue_by_currency.clone();
    for (currency, amount) in totals.expense_by_currency.iter() {
        net.add(currency, -amount);
    }

    PeriodConsumption {
        period,
        monthly_revenue_by_currency: totals.revenue_by_currency,
        monthly_expense_by_currency: totals.expense_by_currency,
        category_breakdown: acc
            .categories
            .into_iter()
            .map(|(category, amounts)| CategoryConsumption { category, amounts })
            .collect(),
        monthly: acc
            .months
            .into_iter()
            .map(|(month, amounts)| MonthlyConsumption { month, amounts })
            .collect(),
        naive_cross_currency_total: NaiveCrossCurrencyTotal::from_amounts(&net),
    }
}
