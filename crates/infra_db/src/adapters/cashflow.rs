//! PostgreSQL Cash-flow Adapter
//!
//! Implements the read-only cash-flow ports over the payment term and
//! reporting repositories.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use core_kernel::{DateRange, DomainPort, OrganizationId, PortError};
use domain_cashflow::{
    BillPaymentRecord, ConsumptionInputs, ConsumptionSource, PaymentTerm, PaymentTermSource,
    ProjectBudget,
};

use crate::repositories::{PaymentTermRepository, ReportingRepository, TransactionRepository};

#[derive(Debug, Clone)]
pub struct PostgresCashflowSource {
    terms: PaymentTermRepository,
    reporting: ReportingRepository,
    transactions: TransactionRepository,
}

impl PostgresCashflowSource {
    pub fn new(pool: PgPool) -> Self {
        Self {
            terms: PaymentTermRepository::new(pool.clone()),
            reporting: ReportingRepository::new(pool.clone()),
            transactions: TransactionRepository::new(pool),
        }
    }

    pub fn terms(&self) -> &PaymentTermRepository {
        &self.terms
    }

    pub fn reporting(&self) -> &ReportingRepository {
        &self.reporting
    }
}

impl DomainPort for PostgresCashflowSource {}

#[async_trait]
impl PaymentTermSource for PostgresCashflowSource {
    async fn active_terms(&self, organization_id: OrganizationId) -> Result<Vec<PaymentTerm>, PortError> {
        Ok(self.terms.active_terms(organization_id).await?)
    }
}

#[async_trait]
impl ConsumptionSource for PostgresCashflowSource {
    async fn consumption_inputs(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<ConsumptionInputs, PortError> {
        let payments = self.reporting.settled_payments(organization_id, period).await?;
        let transactions = self.transactions.list_for_period(organization_id, period).await?;
        let payroll = self.reporting.payroll_runs(organization_id, period).await?;
        let bill_payments: Vec<BillPaymentRecord> =
            self.reporting.bill_payments(organization_id, period).await?;

        debug!(
            organization_id = %organization_id,
            payments = payments.len(),
            transactions = transactions.len(),
            payroll = payroll.len(),
            bill_payments = bill_payments.len(),
            "Consumption inputs loaded"
        );

        Ok(ConsumptionInputs {
            payments,
            transactions,
            payroll,
            bill_payments,
        })
    }

    async fn project_budgets(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<ProjectBudget>, PortError> {
        Ok(self.reporting.project_budgets(organization_id, period).await?)
    }
}
