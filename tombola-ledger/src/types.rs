//! Core types for the ledger
//!
//! All amounts are integer micro-units. Integer arithmetic keeps the
//! settlement engine's floor-division payout rules exact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account identifier (wallet address, escrow account, platform sink)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique id of a minted ticket receipt
///
/// Issuers namespace their receipts (for example
/// `round-a::ticket::1`), so several issuers can share one ledger
/// without colliding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TicketReceiptId(String);

impl TicketReceiptId {
    /// Create new receipt ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One executed transfer, recorded append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique entry ID
    pub entry_id: Uuid,

    /// Debited account
    pub from: AccountId,

    /// Credited account
    pub to: AccountId,

    /// Amount moved (micro-units)
    pub amount: u64,

    /// Wall-clock time the entry was recorded
    pub recorded_at: DateTime<Utc>,
}
