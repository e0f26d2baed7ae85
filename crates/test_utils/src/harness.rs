//! In-memory wiring for service and API tests

use std::sync::Arc;

use core_kernel::{BankAccountId, CashBoxId, OrganizationId};
use domain_cashflow::adapters::InMemoryCashflowSource;
use domain_cashflow::CashflowService;
use domain_treasury::adapters::{InMemoryTreasuryStore, NoopNotifier};
use domain_treasury::{Bill, BillNotifier, BillPaymentProcessor, RetryPolicy};

use crate::fixtures::IdFixtures;

/// An organization with one cash box and one bank account, held in memory
pub struct TreasuryHarness {
    pub store: Arc<InMemoryTreasuryStore>,
    pub source: Arc<InMemoryCashflowSource>,
    pub organization_id: OrganizationId,
    pub cash_box: CashBoxId,
    pub bank_account: BankAccountId,
}

impl TreasuryHarness {
    pub async fn new() -> Self {
        Self::for_organization(IdFixtures::organization_id()).await
    }

    pub async fn for_organization(organization_id: OrganizationId) -> Self {
        let store = Arc::new(InMemoryTreasuryStore::new());
        let source = Arc::new(InMemoryCashflowSource::new(store.clone()));
        let cash_box = store.register_cash_box(organization_id).await;
        let bank_account = store.register_bank_account(organization_id).await;
        Self {
            store,
            source,
            organization_id,
            cash_box,
            bank_account,
        }
    }

    /// Stores the bill and returns it
    pub async fn insert_bill(&self, bill: Bill) -> Bill {
        self.store.insert_bill(bill.clone()).await;
        bill
    }

    /// Processor without notifications and without retry backoff
    pub fn processor(&self) -> BillPaymentProcessor {
        self.processor_with(Arc::new(NoopNotifier))
    }

    pub fn processor_with(&self, notifier: Arc<dyn BillNotifier>) -> BillPaymentProcessor {
        BillPaymentProcessor::new(self.store.clone(), notifier).with_retry(RetryPolicy::immediate(3))
    }

    pub fn cashflow_service(&self) -> CashflowService {
        CashflowService::new(self.source.clone(), self.store.clone(), self.source.clone())
    }
}
