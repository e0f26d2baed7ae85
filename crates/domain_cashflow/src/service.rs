//! Cash-flow services
//!
//! Loads inputs through the ports and hands them to the pure projection and
//! consumption functions.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use core_kernel::{DateRange, OrganizationId};
use domain_treasury::AccountBalanceLedger;

use crate::budget::{budget_vs_consumed, BudgetVsConsumed};
use crate::consumption::{aggregate, PeriodConsumption};
use crate::error::CashflowError;
use crate::ports::{ConsumptionSource, PaymentTermSource};
use crate::projection::{project, project_balances, BalanceProjection, CashflowProjection, ProjectionFilters};

/// Longest consumption period, in calendar months
pub const MAX_CONSUMPTION_MONTHS: u32 = 120;

/// Projection plus the balances it leads to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionView {
    #[serde(flatten)]
    pub projection: CashflowProjection,
    pub balances: BalanceProjection,
}

/// Consumption plus the budget comparison for the same period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumptionView {
    #[serde(flatten)]
    pub consumption: PeriodConsumption,
    pub budget_vs_consumed: Vec<BudgetVsConsumed>,
}

/// Read-side service for projections and the consumption dashboard
pub struct CashflowService {
    terms: Arc<dyn PaymentTermSource>,
    ledger: Arc<dyn AccountBalanceLedger>,
    consumption: Arc<dyn ConsumptionSource>,
}

impl CashflowService {
    pub fn new(
        terms: Arc<dyn PaymentTermSource>,
        ledger: Arc<dyn AccountBalanceLedger>,
        consumption: Arc<dyn ConsumptionSource>,
    ) -> Self {
        Self {
            terms,
            ledger,
            consumption,
        }
    }

    /// Projects the organization's active terms and current balances
    pub async fn projection(
        &self,
        organization_id: OrganizationId,
        today: NaiveDate,
        months_ahead: u32,
        filters: &ProjectionFilters,
    ) -> Result<ProjectionView, CashflowError> {
        let terms = self.terms.active_terms(organization_id).await?;
        let projection = project(&terms, today, months_ahead, filters)?;
        let balances = self.ledger.balances_for_organization(organization_id).await?;

        debug!(
            organization_id = %organization_id,
            terms = terms.len(),
            events = projection.details.len(),
            "Cash-flow projection built"
        );

        Ok(ProjectionView {
            balances: project_balances(&projection, &balances),
            projection,
        })
    }

    /// Revenue, expense and budget comparison for `period`
    pub async fn consumption(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<ConsumptionView, CashflowError> {
        let period = period.within_months(MAX_CONSUMPTION_MONTHS)?;
        let inputs = self.consumption.consumption_inputs(organization_id, period).await?;
        let budgets = self.consumption.project_budgets(organization_id, period).await?;

        let consumption = aggregate(&inputs, period);
        let budget_vs_consumed = budget_vs_consumed(&budgets, &consumption, period);

        Ok(ConsumptionView {
            consumption,
            budget_vs_consumed,
        })
    }
}
