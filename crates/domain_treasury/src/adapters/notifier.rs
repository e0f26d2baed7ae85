//! Bill-paid notifiers
//!
//! [`ChannelNotifier`] hands events to a bounded `mpsc` channel and never
//! waits on delivery; [`spawn_dispatcher`] drains the channel on its own
//! task. Email or webhook delivery plugs in behind the dispatcher.

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::info;

use crate::bill::Bill;
use crate::error::NotificationError;
use crate::payment::BillPayment;
use crate::ports::{BillNotifier, BillPaidEvent};

/// Notifier that enqueues events without blocking the request
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<BillPaidEvent>,
}

impl ChannelNotifier {
    /// Creates the notifier and the receiving end of its queue
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<BillPaidEvent>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl BillNotifier for ChannelNotifier {
    async fn notify_bill_paid(&self, bill: &Bill, payment: &BillPayment) -> Result<(), NotificationError> {
        self.sender
            .try_send(BillPaidEvent::new(bill, payment))
            .map_err(|e| match e {
                TrySendError::Full(_) => NotificationError::QueueFull,
                TrySendError::Closed(_) => NotificationError::ChannelClosed,
            })
    }
}

/// Notifier that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl BillNotifier for NoopNotifier {
    async fn notify_bill_paid(&self, _bill: &Bill, _payment: &BillPayment) -> Result<(), NotificationError> {
        Ok(())
    }
}

/// Drains the queue until every sender is dropped
pub fn spawn_dispatcher(mut receiver: mpsc::Receiver<BillPaidEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            info!(
                organization_id = %event.organization_id,
                bill_id = %event.bill_id,
                bill_number = %event.bill_number,
                total = %event.total,
                "Bill fully paid"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::BillType;
    use crate::payment::{PaymentMethod, SettlementAccount};
    use chrono::{NaiveDate, Utc};
    use core_kernel::{BillPaymentId, CashBoxId, Currency, Money, OrganizationId};
    use rust_decimal_macros::dec;

    fn paid_bill() -> (Bill, BillPayment) {
        let bill = Bill::new(
            OrganizationId::new(),
            BillType::Client,
            "F-1",
            "Cliente Uno",
            Money::new(dec!(50), Currency::EUR),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );
        let payment = BillPayment {
            id: BillPaymentId::new(),
            bill_id: bill.id,
            organization_id: bill.organization_id,
            amount: bill.total,
            method: PaymentMethod::Transfer,
            payment_date: Utc::now(),
            reference: None,
            notes: None,
            settlement: SettlementAccount::CashBox(CashBoxId::new()),
            created_at: Utc::now(),
        };
        (bill, payment)
    }

    #[tokio::test]
    async fn test_channel_notifier_enqueues_event() {
        let (notifier, mut rx) = ChannelNotifier::new(4);
        let (bill, payment) = paid_bill();

        notifier.notify_bill_paid(&bill, &payment).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.bill_id, bill.id);
        assert_eq!(event.final_payment.id, payment.id);
    }

    #[tokio::test]
    async fn test_full_and_closed_queues_are_errors() {
        let (notifier, rx) = ChannelNotifier::new(1);
        let (bill, payment) = paid_bill();

        notifier.notify_bill_paid(&bill, &payment).await.unwrap();
        assert!(matches!(
            notifier.notify_bill_paid(&bill, &payment).await,
            Err(NotificationError::QueueFull)
        ));

        drop(rx);
        assert!(matches!(
            notifier.notify_bill_paid(&bill, &payment).await,
            Err(NotificationError::ChannelClosed)
        ));
    }
}
