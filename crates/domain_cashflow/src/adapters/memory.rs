//! In-memory cash-flow source
//!
//! Holds terms, direct payments, payroll runs and budgets itself and reads
//! transactions and bill payments back from the in-memory treasury store,
//! so dashboards see exactly what the payment processor committed.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use core_kernel::{DateRange, DomainPort, OrganizationId, PortError};
use domain_treasury::adapters::InMemoryTreasuryStore;

use crate::budget::ProjectBudget;
use crate::consumption::{BillPaymentRecord, ConsumptionInputs, Payment, PayrollRun};
use crate::payment_term::PaymentTerm;
use crate::ports::{ConsumptionSource, PaymentTermSource};

#[derive(Debug, Default)]
struct CashflowState {
    terms: Vec<PaymentTerm>,
    payments: Vec<Payment>,
    payroll: Vec<PayrollRun>,
    budgets: Vec<ProjectBudget>,
}

/// Implements [`PaymentTermSource`] and [`ConsumptionSource`] in memory
#[derive(Debug)]
pub struct InMemoryCashflowSource {
    state: RwLock<CashflowState>,
    treasury: Arc<InMemoryTreasuryStore>,
}

impl InMemoryCashflowSource {
    pub fn new(treasury: Arc<InMemoryTreasuryStore>) -> Self {
        Self {
            state: RwLock::new(CashflowState::default()),
            treasury,
        }
    }

    pub async fn add_term(&self, term: PaymentTerm) {
        self.state.write().await.terms.push(term);
    }

    pub async fn add_payment(&self, payment: Payment) {
        self.state.write().await.payments.push(payment);
    }

    pub async fn add_payroll_run(&self, run: PayrollRun) {
        self.state.write().await.payroll.push(run);
    }

    pub async fn add_budget(&self, budget: ProjectBudget) {
        self.state.write().await.budgets.push(budget);
    }
}

impl DomainPort for InMemoryCashflowSource {}

#[async_trait]
impl PaymentTermSource for InMemoryCashflowSource {
    async fn active_terms(&self, organization_id: OrganizationId) -> Result<Vec<PaymentTerm>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .terms
            .iter()
            .filter(|t| t.organization_id == organization_id && t.is_active())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConsumptionSource for InMemoryCashflowSource {
    async fn consumption_inputs(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<ConsumptionInputs, PortError> {
        let transactions = self
            .treasury
            .transactions(organization_id)
            .await
            .into_iter()
            .filter(|t| period.contains(t.date.date_naive()))
            .collect();
        let bill_payments = self
            .treasury
            .bill_payments(organization_id)
            .await
            .into_iter()
            .filter(|(p, _)| period.contains(p.payment_date.date_naive()))
            .map(|(payment, bill_type)| BillPaymentRecord { payment, bill_type })
            .collect();

        let state = self.state.read().await;
        Ok(ConsumptionInputs {
            payments: state
                .payments
                .iter()
                .filter(|p| p.organization_id == organization_id)
                .filter(|p| p.settled_on().is_some_and(|d| period.contains(d)))
                .cloned()
                .collect(),
            transactions,
            payroll: state
                .payroll
                .iter()
                .filter(|r| r.organization_id == organization_id && period.contains(r.pay_date))
                .cloned()
                .collect(),
            bill_payments,
        })
    }

    async fn project_budgets(
        &self,
        organization_id: OrganizationId,
        period: DateRange,
    ) -> Result<Vec<ProjectBudget>, PortError> {
        Ok(self
            .state
            .read()
            .await
            .budgets
            .iter()
            .filter(|b| b.organization_id == organization_id && b.active)
            .filter(|b| b.start_date <= period.end && period.start <= b.end_date)
            .cloned()
            .collect())
    }
}
