//! Integration tests for domain_treasury against the in-memory adapters

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use core_kernel::{BankAccountId, BillId, CashBoxId, Currency, Money, OrganizationId};

use domain_treasury::adapters::{ChannelNotifier, InMemoryTreasuryStore, NoopNotifier};
use domain_treasury::{
    classify, AccountBalanceKey, AccountBalanceLedger, AccountKind, ApplyPaymentCommand, Bill,
    BillNotifier, BillPayment, BillPaymentProcessor, BillStatus, BillType, NotificationError,
    PaymentMethod, RetryPolicy, SettlementAccount, TransactionOrigin, TreasuryError,
};

struct Harness {
    store: Arc<InMemoryTreasuryStore>,
    org: OrganizationId,
    cash_box: CashBoxId,
    bank: BankAccountId,
}

impl Harness {
    async fn new() -> Self {
        let store = Arc::new(InMemoryTreasuryStore::new());
        let org = OrganizationId::new();
        let cash_box = store.register_cash_box(org).await;
        let bank = store.register_bank_account(org).await;
        Self {
            store,
            org,
            cash_box,
            bank,
        }
    }

    async fn bill(&self, bill_type: BillType, total: Decimal, currency: Currency) -> Bill {
        let bill = Bill::new(
            self.org,
            bill_type,
            "F-0001",
            "Constructora Sur",
            Money::new(total, currency),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        );
        self.store.insert_bill(bill.clone()).await;
        bill
    }

    fn processor(&self, notifier: Arc<dyn BillNotifier>) -> BillPaymentProcessor {
        BillPaymentProcessor::new(self.store.clone(), notifier).with_retry(RetryPolicy::immediate(3))
    }

    fn cash(&self, bill_id: BillId, amount: Decimal) -> ApplyPaymentCommand {
        ApplyPaymentCommand {
            organization_id: self.org,
            bill_id,
            amount,
            method: PaymentMethod::Cash,
            currency: None,
            payment_date: None,
            reference: None,
            notes: None,
            cash_box_id: Some(self.cash_box),
            bank_account_id: None,
        }
    }

    fn cash_key(&self, currency: Currency) -> AccountBalanceKey {
        AccountBalanceKey::new(*self.cash_box.as_uuid(), AccountKind::CashBox, currency)
    }
}

/// Counts deliveries and optionally fails them
#[derive(Default)]
struct RecordingNotifier {
    calls: AtomicU32,
    fail: bool,
}

#[async_trait]
impl BillNotifier for RecordingNotifier {
    async fn notify_bill_paid(&self, _bill: &Bill, _payment: &BillPayment) -> Result<(), NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotificationError::Delivery("smtp unreachable".into()))
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Payment application scenarios
// ============================================================================

mod apply_payment_tests {
    use super::*;

    #[tokio::test]
    async fn test_partial_then_full_then_rejected() {
        let h = Harness::new().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let processor = h.processor(notifier.clone());
        let bill = h.bill(BillType::Client, dec!(1000), Currency::PESOS).await;

        // Partial payment
        let receipt = processor.apply_payment(h.cash(bill.id, dec!(400))).await.unwrap();
        assert_eq!(receipt.bill.status, BillStatus::Partial);
        assert_eq!(receipt.remaining, Money::new(dec!(600), Currency::PESOS));
        assert_eq!(receipt.balance_after, dec!(400));
        assert!(!receipt.bill_paid);
        assert_eq!(h.store.get_balance(h.cash_key(Currency::PESOS)).await.unwrap(), dec!(400));

        // Settling payment
        let receipt = processor.apply_payment(h.cash(bill.id, dec!(600))).await.unwrap();
        assert_eq!(receipt.bill.status, BillStatus::Paid);
        assert!(receipt.bill.paid_date.is_some());
        assert!(receipt.remaining.is_zero());
        assert!(receipt.bill_paid);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);

        // Paid bill accepts nothing more
        let err = processor.apply_payment(h.cash(bill.id, dec!(1))).await.unwrap_err();
        assert!(matches!(err, TreasuryError::BillAlreadyPaid(_)));
        assert_eq!(h.store.get_balance(h.cash_key(Currency::PESOS)).await.unwrap(), dec!(1000));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_payment_debits_bank_account() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Provider, dec!(300), Currency::USD).await;

        let mut command = h.cash(bill.id, dec!(120));
        command.cash_box_id = None;
        command.bank_account_id = Some(h.bank);
        command.method = PaymentMethod::Transfer;

        let receipt = processor.apply_payment(command).await.unwrap();
        assert_eq!(receipt.settlement, SettlementAccount::BankAccount(h.bank));
        assert_eq!(receipt.balance_after, dec!(-120));

        let transactions = h.store.transactions(h.org).await;
        assert_eq!(transactions.len(), 1);
        assert!(transactions[0].mirrors_bill_payment(receipt.payment.id));
        assert_eq!(transactions[0].amount, Money::new(dec!(120), Currency::USD));
        assert_eq!(classify(&transactions[0]), TransactionOrigin::Bills);
    }

    #[tokio::test]
    async fn test_overpayment_reports_remaining() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(1000), Currency::PESOS).await;

        processor.apply_payment(h.cash(bill.id, dec!(700))).await.unwrap();
        let err = processor.apply_payment(h.cash(bill.id, dec!(300.01))).await.unwrap_err();

        assert_eq!(err.kind(), "OverpaymentRejected");
        assert_eq!(err.remaining(), Some(Money::new(dec!(300), Currency::PESOS)));
    }

    #[tokio::test]
    async fn test_list_payments_reads_back_newest_first() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(100), Currency::EUR).await;

        let mut first = h.cash(bill.id, dec!(10));
        first.payment_date = Some(Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap());
        let mut second = h.cash(bill.id, dec!(20));
        second.payment_date = Some(Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap());

        let a = processor.apply_payment(first).await.unwrap();
        let b = processor.apply_payment(second).await.unwrap();

        let listed = processor.list_payments(h.org, bill.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, b.payment.id);
        assert_eq!(listed[1].id, a.payment.id);
        assert_eq!(listed[0].amount, Money::new(dec!(20), Currency::EUR));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_payment() {
        let h = Harness::new().await;
        let notifier = Arc::new(RecordingNotifier {
            calls: AtomicU32::new(0),
            fail: true,
        });
        let processor = h.processor(notifier.clone());
        let bill = h.bill(BillType::Client, dec!(50), Currency::PESOS).await;

        let receipt = processor.apply_payment(h.cash(bill.id, dec!(50))).await.unwrap();
        assert!(receipt.bill_paid);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.store.bill(bill.id).await.map(|b| b.status),
            Some(BillStatus::Paid)
        );
    }

    #[tokio::test]
    async fn test_channel_notifier_receives_paid_event() {
        let h = Harness::new().await;
        let (notifier, mut rx) = ChannelNotifier::new(8);
        let processor = h.processor(Arc::new(notifier));
        let bill = h.bill(BillType::Client, dec!(80), Currency::USD).await;

        processor.apply_payment(h.cash(bill.id, dec!(80))).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.bill_id, bill.id);
        assert_eq!(event.total, Money::new(dec!(80), Currency::USD));
    }
}

// ============================================================================
// Validation order
// ============================================================================

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_bill() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let err = processor.apply_payment(h.cash(BillId::new(), dec!(1))).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_bill_of_other_organization_is_not_found() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(10), Currency::PESOS).await;

        let mut command = h.cash(bill.id, dec!(1));
        command.organization_id = OrganizationId::new();
        assert!(matches!(
            processor.apply_payment(command).await,
            Err(TreasuryError::BillNotFound(_))
        ));
        assert!(matches!(
            processor.list_payments(OrganizationId::new(), bill.id).await,
            Err(TreasuryError::BillNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_bill_is_not_payable() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = Bill::new(
            h.org,
            BillType::Client,
            "F-9",
            "Anulada",
            Money::new(dec!(10), Currency::PESOS),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .with_status(BillStatus::Cancelled);
        h.store.insert_bill(bill.clone()).await;

        let err = processor.apply_payment(h.cash(bill.id, dec!(1))).await.unwrap_err();
        assert_eq!(err.kind(), "BillNotPayable");
    }

    #[tokio::test]
    async fn test_non_positive_amount() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(10), Currency::PESOS).await;

        for amount in [Decimal::ZERO, dec!(-5)] {
            let err = processor.apply_payment(h.cash(bill.id, amount)).await.unwrap_err();
            assert!(matches!(err, TreasuryError::InvalidAmount(_)), "{amount}");
        }
    }

    #[tokio::test]
    async fn test_amount_finer_than_currency_precision() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(10), Currency::PESOS).await;

        for amount in [dec!(0.00001), dec!(5.005)] {
            let err = processor.apply_payment(h.cash(bill.id, amount)).await.unwrap_err();
            assert!(matches!(err, TreasuryError::InvalidAmount(_)), "{amount}");
        }

        // trailing zeros beyond the currency precision are fine
        let receipt = processor.apply_payment(h.cash(bill.id, dec!(2.5000))).await.unwrap();
        assert_eq!(receipt.payment.amount, Money::new(dec!(2.50), Currency::PESOS));
    }

    #[tokio::test]
    async fn test_currency_must_match_bill() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(10), Currency::PESOS).await;

        let mut command = h.cash(bill.id, dec!(5));
        command.currency = Some(Currency::USD);
        assert!(matches!(
            processor.apply_payment(command).await,
            Err(TreasuryError::InvalidCurrency(_))
        ));
    }

    #[tokio::test]
    async fn test_settlement_account_rules() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(10), Currency::PESOS).await;

        let mut neither = h.cash(bill.id, dec!(5));
        neither.cash_box_id = None;
        assert!(matches!(
            processor.apply_payment(neither).await,
            Err(TreasuryError::MissingSettlementAccount)
        ));

        let mut both = h.cash(bill.id, dec!(5));
        both.bank_account_id = Some(h.bank);
        assert!(matches!(
            processor.apply_payment(both).await,
            Err(TreasuryError::MissingSettlementAccount)
        ));

        let mut foreign = h.cash(bill.id, dec!(5));
        foreign.cash_box_id = Some(CashBoxId::new());
        assert!(matches!(
            processor.apply_payment(foreign).await,
            Err(TreasuryError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_amount_reported_before_missing_account() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(10), Currency::PESOS).await;

        let mut command = h.cash(bill.id, Decimal::ZERO);
        command.cash_box_id = None;
        assert!(matches!(
            processor.apply_payment(command).await,
            Err(TreasuryError::InvalidAmount(_))
        ));
    }
}

// ============================================================================
// Concurrency and retries
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_payments_cannot_overpay() {
        let h = Harness::new().await;
        let processor = Arc::new(h.processor(Arc::new(NoopNotifier)));
        let bill = h.bill(BillType::Client, dec!(1000), Currency::PESOS).await;

        let (p1, p2) = (processor.clone(), processor.clone());
        let (c1, c2) = (h.cash(bill.id, dec!(600)), h.cash(bill.id, dec!(600)));
        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { p1.apply_payment(c1).await }),
            tokio::spawn(async move { p2.apply_payment(c2).await }),
        );
        let results = [r1.unwrap(), r2.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(TreasuryError::OverpaymentRejected { .. })))
                .count(),
            1
        );
        assert_eq!(h.store.get_balance(h.cash_key(Currency::PESOS)).await.unwrap(), dec!(600));
        assert_eq!(processor.list_payments(h.org, bill.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conflicts_are_retried() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(100), Currency::PESOS).await;

        h.store.inject_write_conflicts(2);
        let receipt = processor.apply_payment(h.cash(bill.id, dec!(100))).await.unwrap();
        assert!(receipt.bill_paid);
    }

    #[tokio::test]
    async fn test_persistent_conflicts_surface_transient_failure() {
        let h = Harness::new().await;
        let processor = h.processor(Arc::new(NoopNotifier));
        let bill = h.bill(BillType::Client, dec!(100), Currency::PESOS).await;

        h.store.inject_write_conflicts(3);
        let err = processor.apply_payment(h.cash(bill.id, dec!(100))).await.unwrap_err();
        assert!(matches!(err, TreasuryError::TransientFailure { attempts: 3 }));
        assert_eq!(h.store.get_balance(h.cash_key(Currency::PESOS)).await.unwrap(), Decimal::ZERO);
        assert!(h.store.transactions(h.org).await.is_empty());
    }
}

// ============================================================================
// Conservation properties
// ============================================================================

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn paid_total_never_exceeds_bill_total(
            total_minor in 1i64..500_000,
            attempts in proptest::collection::vec(1i64..200_000, 1..12),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            rt.block_on(async {
                let h = Harness::new().await;
                let processor = h.processor(Arc::new(NoopNotifier));
                let total = Decimal::new(total_minor, 2);
                let bill = h.bill(BillType::Client, total, Currency::PESOS).await;

                let mut accepted = Decimal::ZERO;
                for minor in attempts {
                    let amount = Decimal::new(minor, 2);
                    match processor.apply_payment(h.cash(bill.id, amount)).await {
                        Ok(_) => accepted += amount,
                        Err(TreasuryError::OverpaymentRejected { .. })
                        | Err(TreasuryError::BillAlreadyPaid(_)) => {}
                        Err(other) => panic!("unexpected error {other}"),
                    }
                }

                let balance = h.store.get_balance(h.cash_key(Currency::PESOS)).await.unwrap();
                let payments = processor.list_payments(h.org, bill.id).await.unwrap();
                let paid: Decimal = payments.iter().map(|p| p.amount.amount()).sum();

                assert!(accepted <= total);
                assert_eq!(balance, accepted);
                assert_eq!(paid, accepted);
                assert_eq!(h.store.transactions(h.org).await.len(), payments.len());

                let status = h.store.bill(bill.id).await.map(|b| b.status);
                if accepted == total {
                    assert_eq!(status, Some(BillStatus::Paid));
                } else if accepted > Decimal::ZERO {
                    assert_eq!(status, Some(BillStatus::Partial));
                }
            });
        }
    }
}
