//! PostgreSQL adapter tests
//!
//! Each test starts its own container; run with `cargo test -- --ignored`.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{BankAccountId, CashBoxId, Currency, OrganizationId};
use domain_cashflow::{CashflowService, ConsumptionCategory, ConsumptionSource, PaymentTermSource};
use domain_treasury::adapters::NoopNotifier;
use domain_treasury::{
    references, AccountBalanceKey, AccountBalanceLedger, AccountKind, Bill, BillPaymentProcessor,
    BillStatus, RetryPolicy, TreasuryError, TreasuryStore,
};
use infra_db::{PostgresCashflowSource, PostgresTreasuryStore};
use test_utils::{
    db_test, pool_in_time_zone, BillBuilder, IdFixtures, MoneyFixtures, PaymentCommandBuilder, PaymentTermBuilder,
    TemporalFixtures,
};

struct Accounts {
    cash_box: CashBoxId,
    bank_account: BankAccountId,
}

async fn accounts(store: &PostgresTreasuryStore, org: OrganizationId) -> Accounts {
    let cash_box = store.bills().insert_cash_box(org, "Caja principal").await.unwrap();
    let bank_account = store.bills().insert_bank_account(org, "Banco Nación").await.unwrap();
    Accounts {
        cash_box: CashBoxId::from_uuid(cash_box),
        bank_account: BankAccountId::from_uuid(bank_account),
    }
}

async fn stored_bill(store: &PostgresTreasuryStore, bill: Bill) -> Bill {
    store.bills().insert_bill(&bill).await.unwrap();
    bill
}

fn processor(store: Arc<PostgresTreasuryStore>) -> BillPaymentProcessor {
    BillPaymentProcessor::new(store, Arc::new(NoopNotifier)).with_retry(RetryPolicy::immediate(5))
}

db_test!(test_partial_then_full_payment_round_trip, |pool| {
    let store = Arc::new(PostgresTreasuryStore::new(pool));
    let org = IdFixtures::organization_id();
    let accounts = accounts(&store, org).await;
    let bill = stored_bill(&store, BillBuilder::new().build()).await;
    let processor = processor(store.clone());

    let first = processor
        .apply_payment(
            PaymentCommandBuilder::against(&bill, dec!(400))
                .into_cash_box(accounts.cash_box)
                .build(),
        )
        .await
        .unwrap();
    assert_eq!(first.bill.status, BillStatus::Partial);
    assert_eq!(first.remaining, MoneyFixtures::pesos_600());

    let second = processor
        .apply_payment(
            PaymentCommandBuilder::against(&bill, dec!(600))
                .into_cash_box(accounts.cash_box)
                .build(),
        )
        .await
        .unwrap();
    assert!(second.bill_paid);
    assert_eq!(second.balance_after, dec!(1000));

    let stored = store.find_bill(org, bill.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BillStatus::Paid);
    assert!(stored.paid_date.is_some());

    let payments = processor.list_payments(org, bill.id).await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].id, second.payment.id);

    let mirrors = store
        .transactions()
        .find_by_reference(&references::bill_payment(second.payment.id))
        .await
        .unwrap();
    assert_eq!(mirrors.len(), 1);
    assert_eq!(mirrors[0].amount, MoneyFixtures::pesos_600());
});

db_test!(test_concurrent_overpayment_admits_exactly_one, |pool| {
    let store = Arc::new(PostgresTreasuryStore::new(pool));
    let org = IdFixtures::organization_id();
    let accounts = accounts(&store, org).await;
    let bill = stored_bill(&store, BillBuilder::new().build()).await;

    let a = processor(store.clone());
    let b = processor(store.clone());
    let command = |amount| {
        PaymentCommandBuilder::against(&bill, amount)
            .into_bank_account(accounts.bank_account)
            .build()
    };

    let (first, second) = tokio::join!(
        a.apply_payment(command(dec!(600))),
        b.apply_payment(command(dec!(600)))
    );

    let outcomes = [first, second];
    let accepted = outcomes.iter().filter(|r| r.is_ok()).count();
    let rejected = outcomes
        .iter()
        .filter(|r| matches!(r, Err(TreasuryError::OverpaymentRejected { .. })))
        .count();
    assert_eq!(accepted, 1);
    assert_eq!(rejected, 1);

    assert_eq!(store.paid_total(bill.id).await.unwrap(), dec!(600));
    let key = AccountBalanceKey::new(
        *accounts.bank_account.as_uuid(),
        AccountKind::BankAccount,
        Currency::PESOS,
    );
    assert_eq!(store.get_balance(key).await.unwrap(), dec!(600));
});

db_test!(test_ledger_upsert_is_additive, |pool| {
    let store = PostgresTreasuryStore::new(pool);
    let org = IdFixtures::organization_id();
    let accounts = accounts(&store, org).await;
    let key = AccountBalanceKey::new(*accounts.cash_box.as_uuid(), AccountKind::CashBox, Currency::USD);

    assert_eq!(store.get_balance(key).await.unwrap(), dec!(0));
    store.apply_delta(org, key, dec!(150)).await.unwrap();
    let after = store.apply_delta(org, key, dec!(-40.25)).await.unwrap();
    assert_eq!(after, dec!(109.75));

    let balances = store.balances_for_organization(org).await.unwrap();
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].balance, dec!(109.75));

    let other = store
        .balances_for_organization(IdFixtures::other_organization_id())
        .await
        .unwrap();
    assert!(other.is_empty());
});

db_test!(test_unknown_account_rejected_before_writing, |pool| {
    let store = Arc::new(PostgresTreasuryStore::new(pool));
    let bill = stored_bill(&store, BillBuilder::new().build()).await;

    let result = processor(store.clone())
        .apply_payment(
            PaymentCommandBuilder::against(&bill, dec!(100))
                .into_cash_box(CashBoxId::new())
                .build(),
        )
        .await;

    assert!(matches!(result, Err(TreasuryError::AccountNotFound(_))));
    assert_eq!(store.paid_total(bill.id).await.unwrap(), dec!(0));
});

db_test!(test_active_terms_and_consumption_read_back, |pool| {
    let treasury = Arc::new(PostgresTreasuryStore::new(pool.clone()));
    let source = Arc::new(PostgresCashflowSource::new(pool));
    let org = IdFixtures::organization_id();
    let accounts = accounts(&treasury, org).await;

    source.terms().insert(&PaymentTermBuilder::new().build()).await.unwrap();
    source.terms().insert(&PaymentTermBuilder::expense().inactive().build()).await.unwrap();
    let terms = source.active_terms(org).await.unwrap();
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].amount, MoneyFixtures::usd_100());

    let bill = stored_bill(&treasury, BillBuilder::new().build()).await;
    processor(treasury.clone())
        .apply_payment(
            PaymentCommandBuilder::against(&bill, dec!(400))
                .into_cash_box(accounts.cash_box)
                .dated(TemporalFixtures::payment_time())
                .build(),
        )
        .await
        .unwrap();

    let inputs = source.consumption_inputs(org, TemporalFixtures::q1()).await.unwrap();
    assert_eq!(inputs.bill_payments.len(), 1);
    assert_eq!(inputs.transactions.len(), 1);

    let service = CashflowService::new(source.clone(), treasury.clone(), source.clone());
    let view = service.consumption(org, TemporalFixtures::q1()).await.unwrap();
    let bill_share = view
        .consumption
        .category_breakdown
        .iter()
        .find(|c| c.category == ConsumptionCategory::BillPayments)
        .unwrap();
    assert_eq!(bill_share.amounts.revenue_by_currency.get(Currency::PESOS), dec!(400));

    // the mirrored transaction is not counted a second time
    let treasury_share = view
        .consumption
        .category_breakdown
        .iter()
        .find(|c| c.category == ConsumptionCategory::Treasury)
        .unwrap();
    assert!(treasury_share.amounts.revenue_by_currency.is_zero());
});

db_test!(test_period_bounds_follow_utc_whatever_the_session_zone, |pool| {
    let tokyo = pool_in_time_zone(&pool, "Asia/Tokyo").await.unwrap();
    let treasury = Arc::new(PostgresTreasuryStore::new(tokyo.clone()));
    let source = PostgresCashflowSource::new(tokyo);
    let org = IdFixtures::organization_id();
    let accounts = accounts(&treasury, org).await;
    let bill = stored_bill(&treasury, BillBuilder::new().build()).await;

    // already April 1 in Tokyo, still March 31 in UTC
    let last_evening = Utc.with_ymd_and_hms(2025, 3, 31, 23, 30, 0).unwrap();
    // already January 1 in Tokyo, still December 31 in UTC
    let new_years_eve = Utc.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
    for (amount, paid_at) in [(dec!(400), last_evening), (dec!(100), new_years_eve)] {
        processor(treasury.clone())
            .apply_payment(
                PaymentCommandBuilder::against(&bill, amount)
                    .into_cash_box(accounts.cash_box)
                    .dated(paid_at)
                    .build(),
            )
            .await
            .unwrap();
    }

    let inputs = source.consumption_inputs(org, TemporalFixtures::q1()).await.unwrap();
    assert_eq!(inputs.bill_payments.len(), 1);
    assert_eq!(inputs.bill_payments[0].payment.payment_date, last_evening);
    assert_eq!(inputs.transactions.len(), 1);
    assert_eq!(inputs.transactions[0].date, last_evening);
});
