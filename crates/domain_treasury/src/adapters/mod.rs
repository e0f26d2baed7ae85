//! In-process adapters for the treasury ports
//!
//! - [`memory`]: a mutex-guarded store used by tests and local runs
//! - [`notifier`]: a channel-backed bill-paid notifier

pub mod memory;
pub mod notifier;

pub use memory::InMemoryTreasuryStore;
pub use notifier::{spawn_dispatcher, ChannelNotifier, NoopNotifier};
