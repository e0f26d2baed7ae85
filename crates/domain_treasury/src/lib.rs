//! Treasury Domain - Bill payments and account balances
//!
//! This crate applies payments against client and provider bills while
//! keeping treasury balances consistent:
//!
//! - A payment settles into exactly one cash box or bank account
//! - The account balance for the bill currency moves by `+amount` for client
//!   bills and `-amount` for provider bills
//! - Every payment is mirrored by one treasury transaction referenced
//!   `BILL-PAY-<paymentId>`
//! - The bill status is recomputed from the paid total
//!
//! All of the above happens in one atomic unit owned by the
//! [`TreasuryStore`] port. Currencies are never mixed: every balance and
//! every total is keyed by currency.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_treasury::{BillPaymentProcessor, ApplyPaymentCommand};
//!
//! let processor = BillPaymentProcessor::new(store, notifier);
//! let receipt = processor.apply_payment(command).await?;
//! println!("remaining: {}", receipt.remaining);
//! ```

pub mod bill;
pub mod payment;
pub mod transaction;
pub mod ledger;
pub mod classifier;
pub mod settlement;
pub mod ports;
pub mod processor;
pub mod adapters;
pub mod error;

pub use bill::{Bill, BillStatus, BillSummary, BillType, DisplayStatus};
pub use payment::{AccountKind, BillPayment, PaymentMethod, SettlementAccount};
pub use transaction::{categories, references, Transaction, TransactionType};
pub use ledger::{AccountBalance, AccountBalanceKey, AccountBalanceLedger, InMemoryLedger};
pub use classifier::{classify, classify_with_rule, TransactionOrigin, RULES};
pub use settlement::{plan_settlement, PaymentDraft, SettlementPlan};
pub use ports::{BillNotifier, BillPaidEvent, CommittedPayment, TreasuryStore};
pub use processor::{ApplyPaymentCommand, BillPaymentProcessor, PaymentReceipt, RetryPolicy};
pub use error::{NotificationError, TreasuryError};
