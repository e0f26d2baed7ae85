//! Read-only ports feeding projections and dashboards

use async_trait::async_trait;

use core_kernel::{DateRange, DomainPort, OrganizationId, PortError};

use crate::budget::ProjectBudget;
use crate::consumption::ConsumptionInputs;
use crate::payment_term::PaymentTerm;

/// Source of payment terms
#[async_trait]
pub trait PaymentTermSource: DomainPort {
    /// Active terms of an organization
    async fn active_terms(&self, organization_id: OrganizationId) -> Result<Vec<PaymentTerm>, PortError>;
}

/// Source of the records summed by the consumption dashboard
#[async_trait]
pub trait ConsumptionSource: DomainPort {
    /// Payments, transactions, payroll runs and bill payments dated in `period`
    async fn consumption_inputs(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<ConsumptionInputs, PortError>;

    /// Active project budgets overlapping `period`
    async fn project_budgets(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<ProjectBudget>, PortError>;
}
