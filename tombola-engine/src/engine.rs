//! Main settlement engine
//!
//! One `LotteryEngine` instance owns the full state of one lottery
//! deployment: configuration, funder records, ticket records, the
//! number index, and the lifecycle status. Every mutating operation
//! runs as one indivisible unit: all guards are checked before any
//! value moves, so a failed call leaves zero mutations behind.
//!
//! Guard evaluation order is fixed for every operation: the
//! caller-identity guard first, then lifecycle status, then timing,
//! then ownership and capacity. Error variants are therefore stable
//! across calls and usable for diagnostics.

use crate::{
    config::LotteryConfig,
    randomness::{truncate_seed, RandomnessBeacon},
    types::{BlockHeight, CallContext, Funder, LotteryStatus, Ticket, BUY_BLOCK_MARGIN},
    Error, Result,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tombola_ledger::{AccountId, Ledger, TicketReceiptId};

/// Pooled-funding lottery settlement engine
#[derive(Debug)]
pub struct LotteryEngine {
    /// Validated deployment configuration
    config: LotteryConfig,

    /// Lifecycle status
    status: LotteryStatus,

    /// Current admin (reassignable)
    admin: AccountId,

    /// The engine's own escrow account on the ledger
    escrow: AccountId,

    /// Funder records, keyed by account
    funders: BTreeMap<AccountId, Funder>,

    /// Ticket records, keyed by sequential id
    tickets: BTreeMap<u64, Ticket>,

    /// Played number → ticket id, unique per number
    numbers: BTreeMap<u64, u64>,

    /// Running total of funder contributions (the jackpot)
    prize_pool: u64,

    /// Running total of ticket-price revenue (fees excluded)
    sold_tickets_pool: u64,

    /// Drawn number, set exactly once at draw time
    drawn_number: Option<u64>,

    /// Winning ticket, set at draw time if a ticket matched
    winner_ticket_id: Option<u64>,

    /// Monotonic ticket id counter; ids start at 1
    ticket_sequence: u64,

    /// Value-transfer collaborator
    ledger: Arc<Ledger>,

    /// Randomness collaborator
    beacon: Box<dyn RandomnessBeacon>,
}

impl LotteryEngine {
    /// Create an engine for a fresh lottery in `Funding` status
    ///
    /// Validates the configuration and opens the escrow and platform
    /// accounts on the ledger.
    pub fn new(
        config: LotteryConfig,
        ledger: Arc<Ledger>,
        beacon: Box<dyn RandomnessBeacon>,
    ) -> Result<Self> {
        config.validate()?;

        let escrow = AccountId::new(format!("{}::escrow", config.name));
        ledger.open_account(&escrow);
        ledger.open_account(&config.platform);

        tracing::info!(
            name = %config.name,
            start_block = config.start_block,
            end_block = config.end_block,
            difficulty = config.difficulty,
            "lottery created"
        );

        Ok(Self {
            admin: config.admin.clone(),
            escrow,
            status: LotteryStatus::Funding,
            funders: BTreeMap::new(),
            tickets: BTreeMap::new(),
            numbers: BTreeMap::new(),
            prize_pool: 0,
            sold_tickets_pool: 0,
            drawn_number: None,
            winner_ticket_id: None,
            ticket_sequence: 0,
            ledger,
            beacon,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Funder pool
    // ------------------------------------------------------------------

    /// Escrow one `slot_size` stake into the prize pool
    pub fn fund(&mut self, ctx: &CallContext) -> Result<()> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Funding, "funding")?;
        if ctx.height >= self.config.funding_close() {
            return Err(Error::FundingClosed);
        }
        if self.funders.contains_key(&ctx.caller) {
            return Err(Error::DuplicateFunder(ctx.caller.clone()));
        }
        if self.funders.len() as u64 >= self.config.slots {
            return Err(Error::SlotsFull);
        }

        self.ledger
            .transfer(&ctx.caller, &self.escrow, self.config.slot_size)?;
        self.funders.insert(
            ctx.caller.clone(),
            Funder {
                address: ctx.caller.clone(),
                has_funded: true,
                claimed: false,
            },
        );
        self.prize_pool += self.config.slot_size;

        tracing::info!(
            funder = %ctx.caller,
            prize_pool = self.prize_pool,
            "funder joined the pool"
        );
        Ok(())
    }

    /// Open ticket sales once the start block is reached
    pub fn start(&mut self, ctx: &CallContext) -> Result<()> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Funding, "funding")?;
        if ctx.height < self.config.start_block {
            return Err(Error::NotYetStarted);
        }
        if ctx.height >= self.config.end_block {
            return Err(Error::AlreadyEnded);
        }
        if self.funders.is_empty() {
            return Err(Error::NoFunders);
        }

        self.status = LotteryStatus::Active;
        tracing::info!(height = ctx.height, "lottery started");
        Ok(())
    }

    /// Collect the funder payout after the lottery settles
    ///
    /// Finished: stake plus an equal share of ticket revenue.
    /// Won: equal share of ticket revenue only (the jackpot went to
    /// the winning ticket). Shares round down; the remainder stays in
    /// escrow. Returns the amount paid.
    pub fn claim_funds(&mut self, ctx: &CallContext) -> Result<u64> {
        self.ensure_direct(ctx)?;
        if !matches!(self.status, LotteryStatus::Won | LotteryStatus::Finished) {
            return Err(Error::WrongStatus {
                expected: "won or finished",
                actual: self.status,
            });
        }
        let funder = self.funders.get(&ctx.caller).ok_or(Error::NotAFunder)?;
        if funder.claimed {
            return Err(Error::AlreadyClaimed);
        }

        let share = self.sold_tickets_pool / self.funders.len() as u64;
        let payout = match self.status {
            LotteryStatus::Finished => self.config.slot_size + share,
            _ => share,
        };

        self.ledger.transfer(&self.escrow, &ctx.caller, payout)?;
        self.funders
            .get_mut(&ctx.caller)
            .expect("funder checked above")
            .claimed = true;

        tracing::info!(funder = %ctx.caller, payout, "funder claimed payout");
        Ok(payout)
    }

    // ------------------------------------------------------------------
    // Ticket market
    // ------------------------------------------------------------------

    /// Buy a ticket on `number` for `recipient`, paid by the caller
    ///
    /// Returns the new ticket id. The price, the fee, and the receipt
    /// mint settle together: any failed guard leaves no value moved
    /// and no ticket issued.
    pub fn buy_ticket(
        &mut self,
        ctx: &CallContext,
        recipient: &AccountId,
        number: u64,
    ) -> Result<u64> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Active, "active")?;
        if ctx.height + BUY_BLOCK_MARGIN >= self.config.end_block {
            return Err(Error::SalesClosed);
        }
        let limit = self.config.number_limit();
        if number >= limit {
            return Err(Error::NumberOutOfRange { number, limit });
        }
        if self.numbers.contains_key(&number) {
            return Err(Error::DuplicateNumber(number));
        }
        if self.ticket_sequence >= self.config.available_tickets {
            return Err(Error::SoldOut);
        }

        // Both transfers must succeed or neither may happen; check the
        // combined charge before moving anything.
        let charge = self.config.ticket_price + self.config.fee;
        let available = self.ledger.balance(&ctx.caller);
        if available < charge {
            return Err(Error::Ledger(tombola_ledger::Error::InsufficientFunds {
                account: ctx.caller.clone(),
                required: charge,
                available,
            }));
        }

        // The receipt mints before either transfer, so a mint failure
        // moves no value.
        let ticket_id = self.ticket_sequence + 1;
        self.ledger
            .mint_ticket(recipient, &self.receipt_id(ticket_id))?;
        self.ledger
            .transfer(&ctx.caller, &self.escrow, self.config.ticket_price)?;
        if self.config.fee > 0 {
            self.ledger
                .transfer(&ctx.caller, &self.config.platform, self.config.fee)?;
        }

        self.ticket_sequence = ticket_id;
        self.tickets.insert(
            ticket_id,
            Ticket {
                id: ticket_id,
                owner: recipient.clone(),
                number,
                active: true,
            },
        );
        self.numbers.insert(number, ticket_id);
        self.sold_tickets_pool += self.config.ticket_price;

        tracing::info!(
            buyer = %ctx.caller,
            owner = %recipient,
            ticket_id,
            number,
            "ticket sold"
        );
        Ok(ticket_id)
    }

    /// Draw the winning number from the seed pinned to the end block
    ///
    /// The seed is always the one associated with `end_block`, however
    /// late the draw runs, so the result is reproducible. Sets the
    /// drawn number exactly once and moves the lottery to `Won` if a
    /// ticket matches, `Finished` otherwise. Returns the drawn number.
    pub fn draw_numbers(&mut self, ctx: &CallContext) -> Result<u64> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Active, "active")?;
        if ctx.height < self.config.end_block {
            return Err(Error::DrawTooEarly);
        }

        let seed = self.beacon.seed_at(self.config.end_block);
        let drawn = truncate_seed(seed, self.config.difficulty);
        self.drawn_number = Some(drawn);

        match self.numbers.get(&drawn) {
            Some(&ticket_id) => {
                self.status = LotteryStatus::Won;
                self.winner_ticket_id = Some(ticket_id);
                tracing::info!(drawn, ticket_id, "lottery won");
            }
            None => {
                self.status = LotteryStatus::Finished;
                tracing::info!(drawn, "lottery finished with no winner");
            }
        }
        Ok(drawn)
    }

    /// Pay the full prize pool to the winning ticket's owner
    ///
    /// Burns the ticket receipt, so a repeated claim fails with
    /// `TicketNotFound`. Returns the amount paid.
    pub fn claim_prize(&mut self, ctx: &CallContext, ticket_id: u64) -> Result<u64> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Won, "won")?;
        let ticket = self
            .tickets
            .get(&ticket_id)
            .filter(|t| t.active)
            .ok_or(Error::TicketNotFound(ticket_id))?;
        if ticket.owner != ctx.caller {
            return Err(Error::NotTicketOwner { ticket_id });
        }
        if self.winner_ticket_id != Some(ticket_id) {
            return Err(Error::NotWinningTicket { ticket_id });
        }

        let prize = self.prize_pool;
        self.ledger.transfer(&self.escrow, &ctx.caller, prize)?;
        self.ledger.burn_ticket(&self.receipt_id(ticket_id))?;
        self.tickets
            .get_mut(&ticket_id)
            .expect("ticket checked above")
            .active = false;

        tracing::info!(winner = %ctx.caller, ticket_id, prize, "prize claimed");
        Ok(prize)
    }

    /// Burn a non-winning ticket after settlement (no value moves)
    pub fn burn_ticket(&mut self, ctx: &CallContext, ticket_id: u64) -> Result<()> {
        self.ensure_direct(ctx)?;
        if !matches!(self.status, LotteryStatus::Won | LotteryStatus::Finished) {
            return Err(Error::WrongStatus {
                expected: "won or finished",
                actual: self.status,
            });
        }
        let ticket = self
            .tickets
            .get(&ticket_id)
            .filter(|t| t.active)
            .ok_or(Error::TicketNotFound(ticket_id))?;
        if ticket.owner != ctx.caller {
            return Err(Error::NotTicketOwner { ticket_id });
        }
        if self.winner_ticket_id == Some(ticket_id) {
            return Err(Error::WinningTicket { ticket_id });
        }

        self.ledger.burn_ticket(&self.receipt_id(ticket_id))?;
        self.tickets
            .get_mut(&ticket_id)
            .expect("ticket checked above")
            .active = false;

        tracing::info!(ticket_id, "ticket burned");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cancellation & refunds
    // ------------------------------------------------------------------

    /// Cancel the lottery (admin only); refunds are pull-based
    pub fn cancel(&mut self, ctx: &CallContext) -> Result<()> {
        self.ensure_direct(ctx)?;
        if ctx.caller != self.admin {
            return Err(Error::Unauthorized);
        }
        if !matches!(self.status, LotteryStatus::Funding | LotteryStatus::Active) {
            return Err(Error::WrongStatus {
                expected: "funding or active",
                actual: self.status,
            });
        }

        self.status = LotteryStatus::Cancelled;
        tracing::info!(admin = %ctx.caller, "lottery cancelled");
        Ok(())
    }

    /// Recover the exact stake after cancellation; returns the amount
    pub fn get_fund_refund(&mut self, ctx: &CallContext) -> Result<u64> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Cancelled, "cancelled")?;
        let funder = self.funders.get(&ctx.caller).ok_or(Error::NotAFunder)?;
        if funder.claimed {
            return Err(Error::AlreadyClaimed);
        }

        let refund = self.config.slot_size;
        self.ledger.transfer(&self.escrow, &ctx.caller, refund)?;
        self.funders
            .get_mut(&ctx.caller)
            .expect("funder checked above")
            .claimed = true;
        self.prize_pool -= refund;

        tracing::info!(funder = %ctx.caller, refund, "fund refunded");
        Ok(refund)
    }

    /// Recover the ticket price after cancellation; the fee stays with
    /// the platform. Burns the ticket; returns the amount.
    pub fn get_ticket_refund(&mut self, ctx: &CallContext, ticket_id: u64) -> Result<u64> {
        self.ensure_direct(ctx)?;
        self.ensure_status(LotteryStatus::Cancelled, "cancelled")?;
        let ticket = self
            .tickets
            .get(&ticket_id)
            .filter(|t| t.active)
            .ok_or(Error::TicketNotFound(ticket_id))?;
        if ticket.owner != ctx.caller {
            return Err(Error::NotTicketOwner { ticket_id });
        }

        let refund = self.config.ticket_price;
        self.ledger.transfer(&self.escrow, &ctx.caller, refund)?;
        self.ledger.burn_ticket(&self.receipt_id(ticket_id))?;
        self.tickets
            .get_mut(&ticket_id)
            .expect("ticket checked above")
            .active = false;
        self.sold_tickets_pool -= refund;

        tracing::info!(ticket_id, refund, "ticket refunded");
        Ok(refund)
    }

    // ------------------------------------------------------------------
    // Admin
    // ------------------------------------------------------------------

    /// Reassign the admin role; chains and reverts are allowed
    pub fn update_admin(&mut self, ctx: &CallContext, new_admin: AccountId) -> Result<()> {
        self.ensure_direct(ctx)?;
        if ctx.caller != self.admin {
            return Err(Error::Unauthorized);
        }

        tracing::info!(old = %self.admin, new = %new_admin, "admin updated");
        self.admin = new_admin;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only queries (never fail; absent data is None)
    // ------------------------------------------------------------------

    /// Current lifecycle status
    pub fn status(&self) -> LotteryStatus {
        self.status
    }

    /// Drawn number, absent until the draw ran
    pub fn drawn_number(&self) -> Option<u64> {
        self.drawn_number
    }

    /// Winning ticket id, absent unless the lottery is `Won`
    pub fn winner_ticket_id(&self) -> Option<u64> {
        self.winner_ticket_id
    }

    /// Running total of funder contributions
    pub fn prize_pool(&self) -> u64 {
        self.prize_pool
    }

    /// Running total of ticket-price revenue
    pub fn sold_tickets_pool(&self) -> u64 {
        self.sold_tickets_pool
    }

    /// Played number of a ticket, if the ticket was ever issued
    pub fn ticket_number(&self, ticket_id: u64) -> Option<u64> {
        self.tickets.get(&ticket_id).map(|t| t.number)
    }

    /// Ticket id holding a number, if the number was sold
    pub fn ticket_id_for_number(&self, number: u64) -> Option<u64> {
        self.numbers.get(&number).copied()
    }

    /// Full ticket record, if the ticket was ever issued
    pub fn ticket(&self, ticket_id: u64) -> Option<&Ticket> {
        self.tickets.get(&ticket_id)
    }

    /// Number of recorded funders
    pub fn funder_count(&self) -> u64 {
        self.funders.len() as u64
    }

    /// Number of tickets ever sold
    pub fn tickets_sold(&self) -> u64 {
        self.ticket_sequence
    }

    /// Whether an account funded this lottery
    pub fn is_funder(&self, account: &AccountId) -> bool {
        self.funders.contains_key(account)
    }

    /// Current admin account
    pub fn admin(&self) -> &AccountId {
        &self.admin
    }

    /// The engine's escrow account on the ledger
    pub fn escrow_account(&self) -> &AccountId {
        &self.escrow
    }

    /// Ledger receipt id for a ticket, namespaced by the lottery name
    /// so lotteries sharing a ledger never collide
    pub fn receipt_id(&self, ticket_id: u64) -> TicketReceiptId {
        TicketReceiptId::new(format!("{}::ticket::{}", self.config.name, ticket_id))
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    /// Caller-identity guard, checked before every other guard
    fn ensure_direct(&self, ctx: &CallContext) -> Result<()> {
        if !ctx.is_direct() {
            return Err(Error::IndirectCall);
        }
        Ok(())
    }

    fn ensure_status(&self, expected: LotteryStatus, label: &'static str) -> Result<()> {
        if self.status != expected {
            return Err(Error::WrongStatus {
                expected: label,
                actual: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::FixedBeacon;

    const START: BlockHeight = 10;
    const END: BlockHeight = 50;

    fn account(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn ctx(name: &str, height: BlockHeight) -> CallContext {
        CallContext::direct(account(name), height)
    }

    /// Engine over the default config with a fixed 86_916 seed and a
    /// handful of funded wallets.
    fn test_engine() -> (Arc<Ledger>, LotteryEngine) {
        test_engine_with_seed(86_916)
    }

    fn test_engine_with_seed(seed: u128) -> (Arc<Ledger>, LotteryEngine) {
        let ledger = Arc::new(Ledger::new());
        for name in ["funder_1", "funder_2", "funder_3", "buyer_1", "buyer_2", "admin"] {
            ledger.deposit(&account(name), 100_000).unwrap();
        }
        let engine = LotteryEngine::new(
            LotteryConfig::default(),
            ledger.clone(),
            Box::new(FixedBeacon::new(seed)),
        )
        .unwrap();
        (ledger, engine)
    }

    /// Fund with one funder and start at the start block.
    fn funded_and_started(engine: &mut LotteryEngine) {
        engine.fund(&ctx("funder_1", 1)).unwrap();
        engine.start(&ctx("funder_1", START)).unwrap();
    }

    #[test]
    fn test_fund_records_funder_and_pool() {
        let (ledger, mut engine) = test_engine();

        engine.fund(&ctx("funder_1", 1)).unwrap();
        assert_eq!(engine.prize_pool(), 1_000);
        assert_eq!(engine.funder_count(), 1);
        assert!(engine.is_funder(&account("funder_1")));
        assert_eq!(ledger.balance(engine.escrow_account()), 1_000);
        assert_eq!(ledger.balance(&account("funder_1")), 99_000);
    }

    #[test]
    fn test_fund_twice_rejected() {
        let (_ledger, mut engine) = test_engine();

        engine.fund(&ctx("funder_1", 1)).unwrap();
        let err = engine.fund(&ctx("funder_1", 2)).unwrap_err();
        assert!(matches!(err, Error::DuplicateFunder(a) if a == account("funder_1")));
        assert_eq!(engine.prize_pool(), 1_000);
    }

    #[test]
    fn test_fund_after_slots_filled_rejected() {
        let ledger = Arc::new(Ledger::new());
        let mut config = LotteryConfig::default();
        config.slots = 2;
        for i in 0..3 {
            ledger.deposit(&account(&format!("f{i}")), 10_000).unwrap();
        }
        let mut engine =
            LotteryEngine::new(config, ledger, Box::new(FixedBeacon::new(0))).unwrap();

        engine.fund(&ctx("f0", 1)).unwrap();
        engine.fund(&ctx("f1", 1)).unwrap();
        assert!(matches!(engine.fund(&ctx("f2", 1)), Err(Error::SlotsFull)));
    }

    #[test]
    fn test_fund_after_window_close_rejected() {
        let (_ledger, mut engine) = test_engine();

        let err = engine.fund(&ctx("funder_1", START)).unwrap_err();
        assert!(matches!(err, Error::FundingClosed));
    }

    #[test]
    fn test_fund_respects_start_block_buffer() {
        let ledger = Arc::new(Ledger::new());
        ledger.deposit(&account("funder_1"), 10_000).unwrap();
        let mut config = LotteryConfig::default();
        config.start_block_buffer = 4; // funding closes at block 6
        let mut engine =
            LotteryEngine::new(config, ledger, Box::new(FixedBeacon::new(0))).unwrap();

        assert!(matches!(
            engine.fund(&ctx("funder_1", 6)),
            Err(Error::FundingClosed)
        ));
        engine.fund(&ctx("funder_1", 5)).unwrap();
    }

    #[test]
    fn test_start_requires_window_and_funder() {
        let (_ledger, mut engine) = test_engine();

        engine.fund(&ctx("funder_1", 1)).unwrap();

        assert!(matches!(
            engine.start(&ctx("funder_1", START - 1)),
            Err(Error::NotYetStarted)
        ));
        assert!(matches!(
            engine.start(&ctx("funder_1", END)),
            Err(Error::AlreadyEnded)
        ));
        engine.start(&ctx("funder_1", START)).unwrap();
        assert_eq!(engine.status(), LotteryStatus::Active);
    }

    #[test]
    fn test_start_without_funders_rejected() {
        let (_ledger, mut engine) = test_engine();
        assert!(matches!(
            engine.start(&ctx("funder_1", START)),
            Err(Error::NoFunders)
        ));
    }

    #[test]
    fn test_buy_ticket_issues_sequential_ids() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        let id1 = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 1_245)
            .unwrap();
        let id2 = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_2"), 54_321)
            .unwrap();
        assert_eq!((id1, id2), (1, 2));

        // Price goes to escrow, fee to the platform
        assert_eq!(engine.sold_tickets_pool(), 194);
        assert_eq!(ledger.balance(&account("platform")), 6);
        assert_eq!(
            ledger.receipt_owner(&engine.receipt_id(1)),
            Some(account("buyer_1"))
        );
        assert_eq!(
            ledger.receipt_owner(&engine.receipt_id(2)),
            Some(account("buyer_2"))
        );
        assert_eq!(engine.ticket_number(id1), Some(1_245));
        assert_eq!(engine.ticket_number(id2), Some(54_321));
        assert_eq!(engine.ticket_number(99), None);
        assert_eq!(engine.ticket_id_for_number(54_321), Some(2));
    }

    #[test]
    fn test_buy_ticket_rejected_while_funding() {
        let (_ledger, mut engine) = test_engine();
        engine.fund(&ctx("funder_1", 1)).unwrap();

        let err = engine
            .buy_ticket(&ctx("buyer_1", 5), &account("buyer_1"), 12_345)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::WrongStatus { expected: "active", .. }
        ));
    }

    #[test]
    fn test_buy_ticket_number_range() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        // difficulty 5 → limit 100_000
        let err = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 100_000)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NumberOutOfRange { number: 100_000, limit: 100_000 }
        ));

        let id = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 99_999)
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_buy_ticket_duplicate_number_rejected() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 7)
            .unwrap();
        let err = engine
            .buy_ticket(&ctx("buyer_2", START + 1), &account("buyer_2"), 7)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateNumber(7)));
    }

    #[test]
    fn test_buy_ticket_sold_out() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        for n in 0..5 {
            engine
                .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), n)
                .unwrap();
        }
        let err = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 99)
            .unwrap_err();
        assert!(matches!(err, Error::SoldOut));
    }

    #[test]
    fn test_buy_ticket_inside_margin_rejected() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        // END - 6 is the first blocked height
        let err = engine
            .buy_ticket(
                &ctx("buyer_1", END - BUY_BLOCK_MARGIN),
                &account("buyer_1"),
                1,
            )
            .unwrap_err();
        assert!(matches!(err, Error::SalesClosed));

        engine
            .buy_ticket(
                &ctx("buyer_1", END - BUY_BLOCK_MARGIN - 1),
                &account("buyer_1"),
                1,
            )
            .unwrap();
    }

    #[test]
    fn test_buy_ticket_insufficient_funds_moves_nothing() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        let poor = account("poor");
        ledger.deposit(&poor, 99).unwrap(); // price 97 + fee 3 = 100
        let err = engine
            .buy_ticket(&CallContext::direct(poor.clone(), START + 1), &poor, 11)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(tombola_ledger::Error::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.balance(&poor), 99);
        assert_eq!(engine.tickets_sold(), 0);
        assert_eq!(engine.sold_tickets_pool(), 0);
    }

    #[test]
    fn test_draw_with_matching_ticket_wins() {
        let (_ledger, mut engine) = test_engine(); // seed 86_916, difficulty 5
        funded_and_started(&mut engine);

        let winner_id = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 86_916)
            .unwrap();
        let drawn = engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        assert_eq!(drawn, 86_916);
        assert_eq!(engine.status(), LotteryStatus::Won);
        assert_eq!(engine.winner_ticket_id(), Some(winner_id));
        assert_eq!(engine.drawn_number(), Some(86_916));
    }

    #[test]
    fn test_draw_without_match_finishes() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 123)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        assert_eq!(engine.status(), LotteryStatus::Finished);
        assert_eq!(engine.winner_ticket_id(), None);
        assert_eq!(engine.drawn_number(), Some(86_916));
    }

    #[test]
    fn test_draw_too_early_rejected() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        assert!(matches!(
            engine.draw_numbers(&ctx("funder_1", END - 1)),
            Err(Error::DrawTooEarly)
        ));
    }

    #[test]
    fn test_draw_cannot_run_twice() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        let err = engine.draw_numbers(&ctx("funder_1", END + 1)).unwrap_err();
        assert!(matches!(err, Error::WrongStatus { expected: "active", .. }));
    }

    #[test]
    fn test_low_seed_draws_number_with_fewer_digits() {
        // seed 100_032 mod 10^5 = 32: numeric equality must match a
        // ticket played on 32, never a zero-padded "00032" mismatch.
        let (_ledger, mut engine) = test_engine_with_seed(100_032);
        funded_and_started(&mut engine);

        engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 32)
            .unwrap();
        let drawn = engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        assert_eq!(drawn, 32);
        assert_eq!(engine.status(), LotteryStatus::Won);
    }

    #[test]
    fn test_claim_prize_pays_full_pool_and_burns() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        let id = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 86_916)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        let before = ledger.balance(&account("buyer_1"));
        let prize = engine.claim_prize(&ctx("buyer_1", END + 1), id).unwrap();
        assert_eq!(prize, 1_000);
        assert_eq!(ledger.balance(&account("buyer_1")), before + 1_000);
        assert_eq!(ledger.receipt_owner(&engine.receipt_id(id)), None);

        // Receipt burned, so the repeat claim sees no ticket
        let err = engine.claim_prize(&ctx("buyer_1", END + 2), id).unwrap_err();
        assert!(matches!(err, Error::TicketNotFound(_)));
    }

    #[test]
    fn test_claim_prize_wrong_owner_and_wrong_ticket() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        let winner = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 86_916)
            .unwrap();
        let loser = engine
            .buy_ticket(&ctx("buyer_2", START + 1), &account("buyer_2"), 4)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        // buyer_2 owns a ticket, but not this one
        let err = engine.claim_prize(&ctx("buyer_2", END + 1), winner).unwrap_err();
        assert!(matches!(err, Error::NotTicketOwner { .. }));

        // buyer_2 owns this one, but it did not win
        let err = engine.claim_prize(&ctx("buyer_2", END + 1), loser).unwrap_err();
        assert!(matches!(err, Error::NotWinningTicket { .. }));
    }

    #[test]
    fn test_claim_funds_after_finished_pays_stake_plus_share() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        for n in 0..5 {
            engine
                .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 12_300 + n)
                .unwrap();
        }
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();
        assert_eq!(engine.status(), LotteryStatus::Finished);

        let before = ledger.balance(&account("funder_1"));
        let payout = engine.claim_funds(&ctx("funder_1", END + 1)).unwrap();
        // stake 1_000 + 5 tickets × 97
        assert_eq!(payout, 1_485);
        assert_eq!(ledger.balance(&account("funder_1")), before + 1_485);
    }

    #[test]
    fn test_claim_funds_after_won_pays_share_only() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        for n in 0..4 {
            engine
                .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), n)
                .unwrap();
        }
        engine
            .buy_ticket(&ctx("buyer_2", START + 1), &account("buyer_2"), 86_916)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();
        assert_eq!(engine.status(), LotteryStatus::Won);

        let payout = engine.claim_funds(&ctx("funder_1", END + 1)).unwrap();
        // 5 tickets × 97, no stake return
        assert_eq!(payout, 485);
    }

    #[test]
    fn test_claim_funds_share_rounds_down() {
        let ledger = Arc::new(Ledger::new());
        let mut config = LotteryConfig::default();
        config.ticket_price = 100;
        config.fee = 0;
        for name in ["f1", "f2", "f3", "buyer"] {
            ledger.deposit(&account(name), 10_000).unwrap();
        }
        let mut engine =
            LotteryEngine::new(config, ledger.clone(), Box::new(FixedBeacon::new(86_916)))
                .unwrap();
        for name in ["f1", "f2", "f3"] {
            engine.fund(&ctx(name, 1)).unwrap();
        }
        engine.start(&ctx("f1", START)).unwrap();
        for n in 0..5 {
            engine
                .buy_ticket(&ctx("buyer", START + 1), &account("buyer"), n)
                .unwrap();
        }
        engine.draw_numbers(&ctx("f1", END)).unwrap();

        // revenue 500 over 3 funders → floor(500/3) = 166 each + stake
        for name in ["f1", "f2", "f3"] {
            assert_eq!(engine.claim_funds(&ctx(name, END + 1)).unwrap(), 1_166);
        }
        // 500 - 3×166 = 2 stays in escrow
        assert_eq!(ledger.balance(engine.escrow_account()), 2);
    }

    #[test]
    fn test_claim_funds_twice_fails_distinctly() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        engine.claim_funds(&ctx("funder_1", END + 1)).unwrap();
        let second = engine.claim_funds(&ctx("funder_1", END + 2)).unwrap_err();
        assert!(matches!(second, Error::AlreadyClaimed));

        let stranger = engine.claim_funds(&ctx("buyer_1", END + 2)).unwrap_err();
        assert!(matches!(stranger, Error::NotAFunder));
    }

    #[test]
    fn test_burn_ticket_cleanup() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        let winner = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 86_916)
            .unwrap();
        let loser = engine
            .buy_ticket(&ctx("buyer_2", START + 1), &account("buyer_2"), 9)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        // Winning ticket cannot be burned away
        let err = engine.burn_ticket(&ctx("buyer_1", END + 1), winner).unwrap_err();
        assert!(matches!(err, Error::WinningTicket { .. }));

        // Non-winning ticket burns with no value movement
        let before = ledger.balance(&account("buyer_2"));
        engine.burn_ticket(&ctx("buyer_2", END + 1), loser).unwrap();
        assert_eq!(ledger.balance(&account("buyer_2")), before);
        assert_eq!(ledger.receipt_owner(&engine.receipt_id(loser)), None);

        let err = engine.burn_ticket(&ctx("buyer_2", END + 2), loser).unwrap_err();
        assert!(matches!(err, Error::TicketNotFound(_)));
    }

    #[test]
    fn test_burn_ticket_requires_ownership() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        let id = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 9)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();

        let err = engine.burn_ticket(&ctx("buyer_2", END + 1), id).unwrap_err();
        assert!(matches!(err, Error::NotTicketOwner { .. }));
    }

    #[test]
    fn test_cancel_only_admin_and_only_before_settlement() {
        let (_ledger, mut engine) = test_engine();

        let err = engine.cancel(&ctx("funder_1", 5)).unwrap_err();
        assert!(matches!(err, Error::Unauthorized));

        engine.cancel(&ctx("admin", 5)).unwrap();
        assert_eq!(engine.status(), LotteryStatus::Cancelled);

        // Terminal: cancelling again is a status error
        let err = engine.cancel(&ctx("admin", 6)).unwrap_err();
        assert!(matches!(err, Error::WrongStatus { .. }));
    }

    #[test]
    fn test_refunds_after_cancellation() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        let id = engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 42)
            .unwrap();
        engine.cancel(&ctx("admin", START + 2)).unwrap();

        // Funder gets exactly the stake back
        let funder_before = ledger.balance(&account("funder_1"));
        assert_eq!(engine.get_fund_refund(&ctx("funder_1", START + 3)).unwrap(), 1_000);
        assert_eq!(ledger.balance(&account("funder_1")), funder_before + 1_000);
        assert_eq!(engine.prize_pool(), 0);

        // Buyer gets the price back; the fee stays with the platform
        let buyer_before = ledger.balance(&account("buyer_1"));
        assert_eq!(
            engine.get_ticket_refund(&ctx("buyer_1", START + 3), id).unwrap(),
            97
        );
        assert_eq!(ledger.balance(&account("buyer_1")), buyer_before + 97);
        assert_eq!(ledger.balance(&account("platform")), 3);
        assert_eq!(engine.sold_tickets_pool(), 0);

        // Second attempts fail distinctly
        assert!(matches!(
            engine.get_fund_refund(&ctx("funder_1", START + 4)),
            Err(Error::AlreadyClaimed)
        ));
        assert!(matches!(
            engine.get_ticket_refund(&ctx("buyer_1", START + 4), id),
            Err(Error::TicketNotFound(_))
        ));
        assert!(matches!(
            engine.get_fund_refund(&ctx("buyer_1", START + 4)),
            Err(Error::NotAFunder)
        ));
    }

    #[test]
    fn test_refunds_rejected_outside_cancellation() {
        let (_ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);

        let err = engine.get_fund_refund(&ctx("funder_1", START + 1)).unwrap_err();
        assert!(matches!(err, Error::WrongStatus { expected: "cancelled", .. }));
    }

    #[test]
    fn test_update_admin_chain() {
        let (_ledger, mut engine) = test_engine();

        engine
            .update_admin(&ctx("admin", 1), account("admin_2"))
            .unwrap();
        assert_eq!(engine.admin(), &account("admin_2"));

        // Old admin lost the role
        let err = engine
            .update_admin(&ctx("admin", 2), account("admin_3"))
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized));

        // New admin can hand it back
        engine
            .update_admin(&ctx("admin_2", 3), account("admin"))
            .unwrap();
        assert_eq!(engine.admin(), &account("admin"));
    }

    #[test]
    fn test_indirect_calls_rejected_before_other_guards() {
        let (_ledger, mut engine) = test_engine();

        // Even a call that would otherwise fail on status fails on
        // indirection first.
        let proxied = CallContext::proxied(account("relay"), account("funder_1"), 1);
        assert!(matches!(engine.fund(&proxied), Err(Error::IndirectCall)));
        assert!(matches!(engine.start(&proxied), Err(Error::IndirectCall)));
        assert!(matches!(
            engine.buy_ticket(&proxied, &account("funder_1"), 1),
            Err(Error::IndirectCall)
        ));
        assert!(matches!(engine.draw_numbers(&proxied), Err(Error::IndirectCall)));
        assert!(matches!(engine.claim_prize(&proxied, 1), Err(Error::IndirectCall)));
        assert!(matches!(engine.claim_funds(&proxied), Err(Error::IndirectCall)));
        assert!(matches!(engine.burn_ticket(&proxied, 1), Err(Error::IndirectCall)));
        assert!(matches!(engine.cancel(&proxied), Err(Error::IndirectCall)));
        assert!(matches!(engine.get_fund_refund(&proxied), Err(Error::IndirectCall)));
        assert!(matches!(
            engine.get_ticket_refund(&proxied, 1),
            Err(Error::IndirectCall)
        ));
        assert!(matches!(
            engine.update_admin(&proxied, account("mallory")),
            Err(Error::IndirectCall)
        ));
    }

    #[test]
    fn test_ledger_conservation_through_full_round() {
        let (ledger, mut engine) = test_engine();
        funded_and_started(&mut engine);
        engine
            .buy_ticket(&ctx("buyer_1", START + 1), &account("buyer_1"), 86_916)
            .unwrap();
        engine.draw_numbers(&ctx("funder_1", END)).unwrap();
        engine.claim_prize(&ctx("buyer_1", END + 1), 1).unwrap();
        engine.claim_funds(&ctx("funder_1", END + 1)).unwrap();

        assert!(ledger.check_conservation());
    }
}
