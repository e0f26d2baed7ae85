//! In-process adapters for the cash-flow ports

pub mod memory;

pub use memory::InMemoryCashflowSource;
