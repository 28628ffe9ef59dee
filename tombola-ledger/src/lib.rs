//! Tombola Ledger
//!
//! In-memory value-transfer primitive backing the lottery settlement
//! engine: fungible account balances, atomic transfers, and unique
//! ticket receipts bound to an owner account.
//!
//! # Invariants
//!
//! - Value conservation: Σ(balances) == Σ(deposits) for all time
//! - Atomicity: a failed transfer leaves no partial state
//! - Receipt uniqueness: a receipt id is minted at most once and
//!   owned by exactly one account until burned

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod book;
pub mod error;
pub mod types;

// Re-exports
pub use book::Ledger;
pub use error::{Error, Result};
pub use types::{AccountId, JournalEntry, TicketReceiptId};
