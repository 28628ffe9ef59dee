//! Configuration for the settlement engine
//!
//! A lottery deployment is fully described by one `LotteryConfig`.
//! Validation runs before the engine touches any state and reports
//! the first failing field as a typed error.

use crate::types::BlockHeight;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tombola_ledger::AccountId;

/// Configuration validation errors, one per field rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Name must be a lowercase kebab-case slug
    #[error("name {0:?} is not a valid slug (lowercase alphanumerics separated by '-')")]
    InvalidSlug(String),

    /// Difficulty outside 1..=10
    #[error("difficulty {0} out of range, must be within 1..=10")]
    DifficultyOutOfRange(u8),

    /// End block not after start block
    #[error("end block {end} must be greater than start block {start}")]
    WindowInverted {
        /// Configured start block
        start: BlockHeight,
        /// Configured end block
        end: BlockHeight,
    },

    /// Pre-start buffer reaches past the start block
    #[error("start block buffer {buffer} exceeds start block {start}")]
    BufferExceedsStart {
        /// Configured buffer
        buffer: BlockHeight,
        /// Configured start block
        start: BlockHeight,
    },

    /// Slot size must be positive
    #[error("slot size must be positive")]
    ZeroSlotSize,

    /// Ticket price must be positive
    #[error("ticket price must be positive")]
    ZeroTicketPrice,

    /// At least one funder slot required
    #[error("at least one funder slot is required")]
    ZeroSlots,

    /// At least one ticket must be sellable
    #[error("at least one ticket must be available")]
    ZeroTickets,

    /// Config file could not be read or parsed
    #[error("failed to load config: {0}")]
    Load(String),
}

/// Lottery deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotteryConfig {
    /// Lottery name (kebab-case slug, names the escrow account)
    pub name: String,

    /// Admin account authorized for cancellation and reassignment
    pub admin: AccountId,

    /// Platform account receiving the per-ticket fee
    pub platform: AccountId,

    /// Block at which ticket sales may start
    pub start_block: BlockHeight,

    /// Block at which the draw becomes available
    pub end_block: BlockHeight,

    /// Funding closes this many blocks before the start block
    pub start_block_buffer: BlockHeight,

    /// Decimal digits kept when truncating the drawn seed (1..=10)
    pub difficulty: u8,

    /// Per-ticket charge credited to the sold-tickets pool
    pub ticket_price: u64,

    /// Per-ticket platform fee, paid separately from the price
    pub fee: u64,

    /// Maximum number of tickets that may ever be sold
    pub available_tickets: u64,

    /// Maximum number of funders
    pub slots: u64,

    /// Fixed contribution each funder escrows
    pub slot_size: u64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            name: "tombola-ticket".to_string(),
            admin: AccountId::new("admin"),
            platform: AccountId::new("platform"),
            start_block: 10,
            end_block: 50,
            start_block_buffer: 0,
            difficulty: 5,
            ticket_price: 97,
            fee: 3,
            available_tickets: 5,
            slots: 10,
            slot_size: 1_000,
        }
    }
}

impl LotteryConfig {
    /// Validate all field rules, reporting the first violation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_slug(&self.name) {
            return Err(ConfigError::InvalidSlug(self.name.clone()));
        }
        if self.difficulty < 1 || self.difficulty > 10 {
            return Err(ConfigError::DifficultyOutOfRange(self.difficulty));
        }
        if self.end_block <= self.start_block {
            return Err(ConfigError::WindowInverted {
                start: self.start_block,
                end: self.end_block,
            });
        }
        if self.start_block_buffer > self.start_block {
            return Err(ConfigError::BufferExceedsStart {
                buffer: self.start_block_buffer,
                start: self.start_block,
            });
        }
        if self.slot_size == 0 {
            return Err(ConfigError::ZeroSlotSize);
        }
        if self.ticket_price == 0 {
            return Err(ConfigError::ZeroTicketPrice);
        }
        if self.slots == 0 {
            return Err(ConfigError::ZeroSlots);
        }
        if self.available_tickets == 0 {
            return Err(ConfigError::ZeroTickets);
        }
        Ok(())
    }

    /// Exclusive upper bound of playable numbers: 10^difficulty
    ///
    /// `validate` bounds difficulty at 10, so this fits in a u64.
    pub fn number_limit(&self) -> u64 {
        10u64.pow(u32::from(self.difficulty))
    }

    /// Last block (exclusive) at which funding is accepted
    pub fn funding_close(&self) -> BlockHeight {
        self.start_block - self.start_block_buffer
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("failed to read config: {}", e)))?;
        let config: LotteryConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Load(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = LotteryConfig::default();

        if let Ok(name) = std::env::var("TOMBOLA_NAME") {
            config.name = name;
        }
        if let Ok(admin) = std::env::var("TOMBOLA_ADMIN") {
            config.admin = AccountId::new(admin);
        }
        if let Ok(difficulty) = std::env::var("TOMBOLA_DIFFICULTY") {
            config.difficulty = difficulty
                .parse()
                .map_err(|e| ConfigError::Load(format!("bad TOMBOLA_DIFFICULTY: {}", e)))?;
        }
        if let Ok(price) = std::env::var("TOMBOLA_TICKET_PRICE") {
            config.ticket_price = price
                .parse()
                .map_err(|e| ConfigError::Load(format!("bad TOMBOLA_TICKET_PRICE: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Lowercase alphanumeric groups separated by single hyphens
fn is_slug(name: &str) -> bool {
    !name.is_empty()
        && name
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()))
}
