//! Tombola Settlement Engine
//!
//! Implements the pooled-funding lottery state machine: funders escrow
//! fixed stakes into a prize pool, players buy numbered tickets during
//! an active window, a seed pinned to the lottery's end block is drawn
//! and truncated to the configured difficulty, and the pool settles to
//! either the winning ticket holder or back to the funders.
//!
//! # Lifecycle
//!
//! ```text
//! Funding ──start──▶ Active ──draw──▶ Won | Finished
//!    │                  │
//!    └───────cancel─────┴──▶ Cancelled
//! ```
//!
//! `Won`, `Finished`, and `Cancelled` are terminal; no transition is
//! ever reversed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tombola_engine::{CallContext, FixedBeacon, LotteryConfig, LotteryEngine};
//! use tombola_ledger::{AccountId, Ledger};
//!
//! let ledger = Arc::new(Ledger::new());
//! let funder = AccountId::new("funder");
//! ledger.deposit(&funder, 10_000).unwrap();
//!
//! let config = LotteryConfig::default();
//! let mut engine =
//!     LotteryEngine::new(config, ledger, Box::new(FixedBeacon::new(86_916))).unwrap();
//!
//! engine.fund(&CallContext::direct(funder, 1)).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod randomness;
pub mod types;

// Re-exports
pub use config::{ConfigError, LotteryConfig};
pub use engine::LotteryEngine;
pub use error::{Error, Result};
pub use randomness::{truncate_seed, FixedBeacon, HashBeacon, RandomnessBeacon};
pub use types::{BlockHeight, CallContext, Funder, LotteryStatus, Ticket, BUY_BLOCK_MARGIN};
