//! Error types for the settlement engine
//!
//! Every guard failure maps to its own variant so callers can tell
//! apart, for example, a second claim (`AlreadyClaimed`) from a claim
//! by a stranger (`NotAFunder`). Guards are evaluated in a fixed
//! order, so the returned variant is stable and diagnostic.

use crate::types::LotteryStatus;
use thiserror::Error;
use tombola_ledger::AccountId;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement engine errors
#[derive(Error, Debug)]
pub enum Error {
    /// Call arrived through an intermediary program
    #[error("indirect invocation rejected: caller must be the originating account")]
    IndirectCall,

    /// Operation invalid for the current lifecycle status
    #[error("operation requires {expected} status, lottery is {actual}")]
    WrongStatus {
        /// Status the operation requires
        expected: &'static str,
        /// Current status
        actual: LotteryStatus,
    },

    /// Funding window already closed
    #[error("funding window is closed")]
    FundingClosed,

    /// Start attempted before the start block
    #[error("start block not yet reached")]
    NotYetStarted,

    /// Start attempted at or after the end block
    #[error("lottery end block already passed")]
    AlreadyEnded,

    /// Draw attempted before the end block
    #[error("draw is only available from the end block onward")]
    DrawTooEarly,

    /// Start attempted with an empty prize pool
    #[error("cannot start a lottery with no funders")]
    NoFunders,

    /// Purchase attempted inside the pre-draw safety margin
    #[error("ticket sales are closed this close to the draw")]
    SalesClosed,

    /// All funder slots taken
    #[error("all funder slots are filled")]
    SlotsFull,

    /// All tickets sold
    #[error("all available tickets are sold")]
    SoldOut,

    /// Played number outside the difficulty range
    #[error("number {number} out of range, must be below {limit}")]
    NumberOutOfRange {
        /// Number that was played
        number: u64,
        /// Exclusive upper bound (10^difficulty)
        limit: u64,
    },

    /// Number already played by another ticket
    #[error("number {0} was already sold")]
    DuplicateNumber(u64),

    /// Account already funded this lottery
    #[error("account {0} already funded this lottery")]
    DuplicateFunder(AccountId),

    /// Caller never funded this lottery
    #[error("caller is not a funder of this lottery")]
    NotAFunder,

    /// Payout or refund already collected
    #[error("funds were already claimed")]
    AlreadyClaimed,

    /// Ticket never existed, or was burned/claimed/refunded
    #[error("ticket {0} does not exist")]
    TicketNotFound(u64),

    /// Caller does not own the ticket
    #[error("caller does not own ticket {ticket_id}")]
    NotTicketOwner {
        /// Ticket being acted on
        ticket_id: u64,
    },

    /// Ticket is not the winning ticket
    #[error("ticket {ticket_id} is not the winning ticket")]
    NotWinningTicket {
        /// Ticket being acted on
        ticket_id: u64,
    },

    /// The winning ticket must be claimed, not burned
    #[error("ticket {ticket_id} is the winning ticket and cannot be burned")]
    WinningTicket {
        /// Ticket being acted on
        ticket_id: u64,
    },

    /// Caller is not authorized (wrong admin)
    #[error("caller is not the lottery admin")]
    Unauthorized,

    /// Ledger collaborator error
    #[error("ledger error: {0}")]
    Ledger(#[from] tombola_ledger::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}
