//! Error types for the ledger

use crate::types::{AccountId, TicketReceiptId};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Account balance too low for the requested transfer
    #[error("insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        /// Account being debited
        account: AccountId,
        /// Amount the transfer needed
        required: u64,
        /// Amount actually available
        available: u64,
    },

    /// Account has never been opened
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    /// Receipt id already minted
    #[error("ticket receipt {0} already exists")]
    ReceiptExists(TicketReceiptId),

    /// Receipt id not minted, or already burned
    #[error("ticket receipt {0} not found")]
    ReceiptNotFound(TicketReceiptId),

    /// Deposit of zero value
    #[error("deposit amount must be positive")]
    ZeroDeposit,
}
