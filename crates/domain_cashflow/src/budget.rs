//! Budgeted vs consumed
//!
//! Each active project budget is spread evenly over the calendar months its
//! project spans and compared, month by month, with the expense actually
//! consumed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{BudgetId, CurrencyAmounts, DateRange, MonthKey, OrganizationId, ProjectId};

use crate::consumption::PeriodConsumption;

/// Budget of a project, per currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectBudget {
    pub id: BudgetId,
    pub organization_id: OrganizationId,
    pub project_id: ProjectId,
    pub project_name: String,
    pub total_by_currency: CurrencyAmounts,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

impl ProjectBudget {
    /// Calendar months spanned by the project, at least one
    pub fn months_spanned(&self) -> u32 {
        MonthKey::of(self.start_date)
            .months_through(&MonthKey::of(self.end_date))
            .max(1)
    }

    /// Whether `month` falls within the project span
    pub fn spans(&self, month: MonthKey) -> bool {
        MonthKey::of(self.start_date) <= month && month <= MonthKey::of(self.end_date)
    }

    /// Budget allotted to each spanned month
    pub fn monthly_budget(&self) -> CurrencyAmounts {
        let months = Decimal::from(self.months_spanned());
        self.total_by_currency
            .iter()
            .map(|(currency, total)| (currency, (total / months).round_dp(2)))
            .collect()
    }
}

/// Budget and consumption of one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVsConsumed {
    pub month: MonthKey,
    pub budgeted_by_currency: CurrencyAmounts,
    pub consumed_by_currency: CurrencyAmounts,
    /// Budgeted minus consumed; negative when over budget
    pub variance_by_currency: CurrencyAmounts,
}

/// Month-by-month budget comparison over `period`
pub fn budget_vs_consumed(
    budgets: &[ProjectBudget],
    consumption: &PeriodConsumption,
    period: DateRange,
) -> Vec<BudgetVsConsumed> {
    let mut budgeted: BTreeMap<MonthKey, CurrencyAmounts> = period
        .months()
        .into_iter()
        .map(|m| (m, CurrencyAmounts::zeroed()))
        .collect();

    for budget in budgets.iter().filter(|b| b.active) {
        let monthly = budget.monthly_budget();
        for (month, amounts) in budgeted.iter_mut() {
            if budget.spans(*month) {
                amounts.merge(&monthly);
            }
        }
    }

    budgeted
        .into_iter()
        .map(|(month, budgeted_by_currency)| {
            let consumed_by_currency = consumption.expense_in(month);
            let mut variance_by_currency = budgeted_by_currency.clone();
            for (currency, amount) in consumed_by_currency.iter() {
                variance_by_currency.add(currency, -amount);
            }
            BudgetVsConsumed {
                month,
                budgeted_by_currency,
                consumed_by_currency,
                variance_by_currency,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumption::{aggregate, ConsumptionInputs, PayrollRun};
    use core_kernel::{Currency, PayrollId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn budget(total: CurrencyAmounts, start: NaiveDate, end: NaiveDate) -> ProjectBudget {
        ProjectBudget {
            id: BudgetId::new(),
            organization_id: OrganizationId::new(),
            project_id: ProjectId::new(),
            project_name: "Edificio Centro".into(),
            total_by_currency: total,
            start_date: start,
            end_date: end,
            active: true,
        }
    }

    #[test]
    fn test_monthly_budget_is_even_split() {
        let b = budget(
            [(Currency::USD, dec!(1200)), (Currency::PESOS, dec!(100))].into_iter().collect(),
            date(2025, 1, 15),
            date(2025, 4, 2),
        );
        assert_eq!(b.months_spanned(), 4);
        assert_eq!(b.monthly_budget().get(Currency::USD), dec!(300));
        assert_eq!(b.monthly_budget().get(Currency::PESOS), dec!(25));
    }

    #[test]
    fn test_budget_vs_consumed() {
        let period = DateRange::new(date(2025, 1, 1), date(2025, 2, 28)).unwrap();
        let inputs = ConsumptionInputs {
            payroll: vec![PayrollRun {
                id: PayrollId::new(),
                organization_id: OrganizationId::new(),
                pay_date: date(2025, 2, 28),
                net_pay: [(Currency::PESOS, dec!(80))].into_iter().collect(),
            }],
            ..Default::default()
        };
        let consumption = aggregate(&inputs, period);

        let mut inactive = budget(
            [(Currency::PESOS, dec!(999))].into_iter().collect(),
            date(2025, 1, 1),
            date(2025, 12, 31),
        );
        inactive.active = false;
        let budgets = vec![
            budget([(Currency::PESOS, dec!(200))].into_iter().collect(), date(2025, 2, 1), date(2025, 3, 31)),
            inactive,
        ];

        let rows = budget_vs_consumed(&budgets, &consumption, period);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].budgeted_by_currency.get(Currency::PESOS), Decimal::ZERO);
        assert_eq!(rows[1].budgeted_by_currency.get(Currency::PESOS), dec!(100));
        assert_eq!(rows[1].consumed_by_currency.get(Currency::PESOS), dec!(80));
        assert_eq!(rows[1].variance_by_currency.get(Currency::PESOS), dec!(20));
    }
}
