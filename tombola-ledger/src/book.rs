//! Account book
//!
//! Holds balances, ticket receipts, and the transfer journal behind a
//! single lock. Every mutating call either completes fully or leaves
//! the book untouched.
//!
//! # Example
//!
//! ```
//! use tombola_ledger::{AccountId, Ledger};
//!
//! let ledger = Ledger::new();
//! let alice = AccountId::new("alice");
//! let bob = AccountId::new("bob");
//!
//! ledger.deposit(&alice, 1_000).unwrap();
//! ledger.open_account(&bob);
//! ledger.transfer(&alice, &bob, 400).unwrap();
//!
//! assert_eq!(ledger.balance(&alice), 600);
//! assert_eq!(ledger.balance(&bob), 400);
//! assert!(ledger.check_conservation());
//! ```

use crate::{
    types::{AccountId, JournalEntry, TicketReceiptId},
    Error, Result,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Book {
    balances: BTreeMap<AccountId, u64>,
    receipts: BTreeMap<TicketReceiptId, AccountId>,
    journal: Vec<JournalEntry>,
    total_deposited: u64,
}

/// In-memory account book
#[derive(Debug, Default)]
pub struct Ledger {
    book: RwLock<Book>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with a zero balance (no-op if it exists)
    pub fn open_account(&self, account: &AccountId) {
        let mut book = self.book.write();
        book.balances.entry(account.clone()).or_insert(0);
    }

    /// Credit external value into an account
    ///
    /// This is the only way value enters the ledger; the conservation
    /// check compares total balances against total deposits.
    pub fn deposit(&self, account: &AccountId, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(Error::ZeroDeposit);
        }
        let mut book = self.book.write();
        *book.balances.entry(account.clone()).or_insert(0) += amount;
        book.total_deposited += amount;
        Ok(())
    }

    /// Move value between two accounts, atomically
    ///
    /// Returns the journal entry id. A zero-amount transfer is legal
    /// (a lottery may charge no platform fee) and still journaled.
    pub fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<Uuid> {
        let mut book = self.book.write();

        let available = *book
            .balances
            .get(from)
            .ok_or_else(|| Error::UnknownAccount(from.clone()))?;
        if available < amount {
            return Err(Error::InsufficientFunds {
                account: from.clone(),
                required: amount,
                available,
            });
        }

        *book.balances.get_mut(from).expect("checked above") -= amount;
        *book.balances.entry(to.clone()).or_insert(0) += amount;

        let entry = JournalEntry {
            entry_id: Uuid::new_v4(),
            from: from.clone(),
            to: to.clone(),
            amount,
            recorded_at: Utc::now(),
        };
        let entry_id = entry.entry_id;
        tracing::debug!(%from, %to, amount, "transfer executed");
        book.journal.push(entry);

        Ok(entry_id)
    }

    /// Mint a unique ticket receipt to an owner
    pub fn mint_ticket(&self, owner: &AccountId, receipt_id: &TicketReceiptId) -> Result<()> {
        let mut book = self.book.write();
        if book.receipts.contains_key(receipt_id) {
            return Err(Error::ReceiptExists(receipt_id.clone()));
        }
        book.receipts.insert(receipt_id.clone(), owner.clone());
        tracing::debug!(%owner, %receipt_id, "ticket receipt minted");
        Ok(())
    }

    /// Burn a ticket receipt
    pub fn burn_ticket(&self, receipt_id: &TicketReceiptId) -> Result<()> {
        let mut book = self.book.write();
        if book.receipts.remove(receipt_id).is_none() {
            return Err(Error::ReceiptNotFound(receipt_id.clone()));
        }
        tracing::debug!(%receipt_id, "ticket receipt burned");
        Ok(())
    }

    /// Current owner of a receipt, if it exists
    pub fn receipt_owner(&self, receipt_id: &TicketReceiptId) -> Option<AccountId> {
        self.book.read().receipts.get(receipt_id).cloned()
    }

    /// Current balance of an account (0 if never opened)
    pub fn balance(&self, account: &AccountId) -> u64 {
        self.book.read().balances.get(account).copied().unwrap_or(0)
    }

    /// Full transfer journal, in execution order
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.book.read().journal.clone()
    }

    /// Check value conservation invariant
    ///
    /// Transfers move value but never create or destroy it, so the sum
    /// of all balances must equal the sum of all deposits.
    pub fn check_conservation(&self) -> bool {
        let book = self.book.read();
        let total: u64 = book.balances.values().sum();
        total == book.total_deposited
    }
}
