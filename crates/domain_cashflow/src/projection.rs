//! Cash-flow projection
//!
//! Expands every active payment term over a horizon, filters the events and
//! totals them per currency, overall and per calendar month. Amounts in
//! different currencies are never added together.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{Currency, CurrencyAmounts, DateRange, MonthKey};
use domain_treasury::ledger::{totals_by_currency, AccountBalance};

use crate::error::CashflowError;
use crate::expander::{expand, ProjectedCashEvent};
use crate::payment_term::{EntityType, PaymentTerm, TermType};

/// Caller filters applied to the expanded events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionFilters {
    pub event_type: Option<TermType>,
    pub entity_type: Option<EntityType>,
    pub currency: Option<Currency>,
    /// Case-insensitive substring of the entity name or description
    pub search: Option<String>,
}

impl ProjectionFilters {
    pub fn matches(&self, event: &ProjectedCashEvent) -> bool {
        if self.event_type.is_some_and(|t| t != event.event_type) {
            return false;
        }
        if self.entity_type.is_some_and(|t| t != event.entity_type) {
            return false;
        }
        if self.currency.is_some_and(|c| c != event.amount.currency()) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                event.entity_name.to_lowercase().contains(&needle)
                    || event
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Income, expense and net for one currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashflowTotals {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_cashflow: Decimal,
}

impl CashflowTotals {
    fn record(&mut self, event: &ProjectedCashEvent) {
        let amount = event.amount.amount();
        match event.event_type {
            TermType::Income => self.total_income += amount,
            TermType::Expense => self.total_expense += amount,
        }
        self.net_cashflow = self.total_income - self.total_expense;
    }
}

/// Totals keyed by currency, always holding every supported currency
pub type TotalsByCurrency = BTreeMap<Currency, CashflowTotals>;

fn zeroed_totals() -> TotalsByCurrency {
    Currency::ALL.iter().map(|c| (*c, CashflowTotals::default())).collect()
}

fn record(totals: &mut TotalsByCurrency, event: &ProjectedCashEvent) {
    totals.entry(event.amount.currency()).or_default().record(event);
}

/// Totals of one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCashflow {
    pub month: MonthKey,
    pub totals_by_currency: TotalsByCurrency,
    pub event_count: usize,
}

/// Result of [`project`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashflowProjection {
    pub horizon: DateRange,
    /// Chronological, only months with at least one event
    pub summary_by_month: Vec<MonthlyCashflow>,
    /// Sorted by date, then term id, then period number
    pub details: Vec<ProjectedCashEvent>,
    pub totals_by_currency: TotalsByCurrency,
}

/// Projects active terms over `[today, today + months_ahead months]`
///
/// # Errors
///
/// `InvalidHorizon` when the horizon end overflows the calendar.
pub fn project(
    terms: &[PaymentTerm],
    today: NaiveDate,
    months_ahead: u32,
    filters: &ProjectionFilters,
) -> Result<CashflowProjection, CashflowError> {
    let horizon = DateRange::months_ahead(today, months_ahead)
        .map_err(|e| CashflowError::InvalidHorizon(e.to_string()))?;
    Ok(project_range(terms, horizon, filters))
}

/// Projects active terms over an explicit horizon
pub fn project_range(
    terms: &[PaymentTerm],
    horizon: DateRange,
    filters: &ProjectionFilters,
) -> CashflowProjection {
    let mut details: Vec<ProjectedCashEvent> = terms
        .iter()
        .filter(|t| t.is_active())
        .flat_map(|t| expand(t, horizon.start, horizon.end))
        .filter(|e| filters.matches(e))
        .collect();
    details.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.source_term_id.cmp(&b.source_term_id))
            .then(a.period_number.cmp(&b.period_number))
    });

    let mut totals_by_currency = zeroed_totals();
    let mut months: BTreeMap<MonthKey, MonthlyCashflow> = BTreeMap::new();
    for event in &details {
        record(&mut totals_by_currency, event);

        let month = MonthKey::of(event.date);
        let bucket = months.entry(month).or_insert_with(|| MonthlyCashflow {
            month,
            totals_by_currency: zeroed_totals(),
            event_count: 0,
        });
        record(&mut bucket.totals_by_currency, event);
        bucket.event_count += 1;
    }

    CashflowProjection {
        horizon,
        summary_by_month: months.into_values().collect(),
        details,
        totals_by_currency,
    }
}

/// Current and projected balance per currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceProjection {
    pub current_balance: CurrencyAmounts,
    pub net_cashflow: CurrencyAmounts,
    pub projected_balance: CurrencyAmounts,
}

/// Combines a projection with the current account balances
///
/// `projected[c] = current[c] + net[c]`, computed for each currency alone.
pub fn project_balances(projection: &CashflowProjection, balances: &[AccountBalance]) -> BalanceProjection {
    let current_balance = totals_by_currency(balances);
    let net_cashflow: CurrencyAmounts = projection
        .totals_by_currency
        .iter()
        .map(|(c, t)| (*c, t.net_cashflow))
        .collect();

    let mut projected_balance = current_balance.clone();
    projected_balance.merge(&net_cashflow);

    BalanceProjection {
        current_balance,
        net_cashflow,
        projected_balance,
    }
}
