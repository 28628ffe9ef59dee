//! Core types for the settlement engine

use serde::{Deserialize, Serialize};
use std::fmt;
use tombola_ledger::AccountId;

/// Host timeline position (monotonic block counter)
pub type BlockHeight = u64;

/// Ticket purchases are rejected this close to the end block, so a
/// seed that is already revealed but not yet applied cannot be sniped.
pub const BUY_BLOCK_MARGIN: BlockHeight = 6;

/// Lottery lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum LotteryStatus {
    /// Collecting funder stakes, tickets not yet on sale
    Funding = 1,
    /// Ticket window open
    Active = 2,
    /// Drawn with a matching ticket; prize claimable
    Won = 3,
    /// Drawn with no matching ticket; funders recover stakes + revenue
    Finished = 4,
    /// Cancelled by the admin; refunds claimable
    Cancelled = 5,
}

impl LotteryStatus {
    /// Terminal statuses never transition again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LotteryStatus::Won | LotteryStatus::Finished | LotteryStatus::Cancelled
        )
    }
}

impl fmt::Display for LotteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LotteryStatus::Funding => "funding",
            LotteryStatus::Active => "active",
            LotteryStatus::Won => "won",
            LotteryStatus::Finished => "finished",
            LotteryStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Funder record
///
/// Created on `fund`, never deleted. `claimed` covers both the payout
/// claim (Won/Finished) and the cancellation refund; the two outcomes
/// are mutually exclusive over one lottery's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Funder {
    /// Funder's account
    pub address: AccountId,

    /// Stake received by the escrow account
    pub has_funded: bool,

    /// Payout or refund already collected
    pub claimed: bool,
}

/// Ticket record
///
/// Mirrors the receipt held by the ledger; `active` flips to false
/// when the receipt is burned (prize claim, cleanup burn, or refund).
/// Ids are sequential from 1 and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Sequential ticket id (1-based)
    pub id: u64,

    /// Owner account
    pub owner: AccountId,

    /// Played number, `0 <= number < 10^difficulty`
    pub number: u64,

    /// False once burned, claimed, or refunded
    pub active: bool,
}

/// Invocation context for a mutating operation
///
/// Carries the acting account, the ultimate originating account, and
/// the current timeline position. Every mutating entry point rejects
/// calls where the two accounts differ, so a call proxied through an
/// intermediary program cannot impersonate its origin.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Account invoking the operation
    pub caller: AccountId,

    /// Account that originated the request
    pub origin: AccountId,

    /// Current block height
    pub height: BlockHeight,
}

impl CallContext {
    /// Context for a direct invocation (caller is the origin)
    pub fn direct(caller: AccountId, height: BlockHeight) -> Self {
        Self {
            origin: caller.clone(),
            caller,
            height,
        }
    }

    /// Context for a call relayed by an intermediary on behalf of `origin`
    pub fn proxied(caller: AccountId, origin: AccountId, height: BlockHeight) -> Self {
        Self {
            caller,
            origin,
            height,
        }
    }

    /// True when the invoking account is the originating account
    pub fn is_direct(&self) -> bool {
        self.caller == self.origin
    }
}
