//! Lottery round simulation binary
//!
//! Runs one complete round end to end against an in-memory ledger:
//! funders stake, buyers purchase random unique numbers, the draw
//! settles, and everyone claims. Prints a JSON summary of the outcome.

use anyhow::Context;
use rand::Rng;
use std::sync::Arc;
use tombola_engine::{
    CallContext, HashBeacon, LotteryConfig, LotteryEngine, LotteryStatus,
};
use tombola_ledger::{AccountId, Ledger};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting tombola simulation");

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => LotteryConfig::from_file(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => LotteryConfig::from_env().context("loading config from environment")?,
    };

    let ledger = Arc::new(Ledger::new());
    let mut rng = rand::thread_rng();

    // Wallets: one per funder slot, one buyer per available ticket
    let funders: Vec<AccountId> = (0..config.slots)
        .map(|i| AccountId::new(format!("funder-{i}")))
        .collect();
    let buyers: Vec<AccountId> = (0..config.available_tickets)
        .map(|i| AccountId::new(format!("buyer-{i}")))
        .collect();
    for wallet in funders.iter().chain(buyers.iter()) {
        ledger.deposit(wallet, config.slot_size + config.ticket_price + config.fee)?;
    }

    let end_block = config.end_block;
    let start_block = config.start_block;
    let slot_size = config.slot_size;
    let number_limit = config.number_limit();
    let admin = config.admin.clone();

    let mut engine = LotteryEngine::new(
        config,
        ledger.clone(),
        Box::new(HashBeacon::generate()),
    )?;
    ledger.open_account(&admin);

    // Funding phase
    for funder in &funders {
        engine.fund(&CallContext::direct(funder.clone(), 1))?;
    }
    engine.start(&CallContext::direct(funders[0].clone(), start_block))?;

    // Ticket phase: each buyer plays a fresh random number
    let buy_height = start_block + 1;
    for buyer in &buyers {
        loop {
            let number = rng.gen_range(0..number_limit);
            match engine.buy_ticket(
                &CallContext::direct(buyer.clone(), buy_height),
                buyer,
                number,
            ) {
                Ok(ticket_id) => {
                    tracing::info!(%buyer, ticket_id, number, "ticket purchased");
                    break;
                }
                Err(tombola_engine::Error::DuplicateNumber(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    // Settlement phase
    let drawn = engine.draw_numbers(&CallContext::direct(admin.clone(), end_block))?;
    tracing::info!(drawn, status = %engine.status(), "draw complete");

    let mut prize_paid = 0;
    if engine.status() == LotteryStatus::Won {
        let ticket_id = engine
            .winner_ticket_id()
            .expect("won status implies a winning ticket");
        let winner = engine
            .ticket(ticket_id)
            .expect("winning ticket exists")
            .owner
            .clone();
        prize_paid = engine.claim_prize(&CallContext::direct(winner, end_block + 1), ticket_id)?;
    }
    let mut funder_payouts = 0;
    for funder in &funders {
        funder_payouts += engine.claim_funds(&CallContext::direct(funder.clone(), end_block + 1))?;
    }

    anyhow::ensure!(ledger.check_conservation(), "ledger conservation violated");

    let summary = serde_json::json!({
        "status": engine.status().to_string(),
        "drawn_number": drawn,
        "winner_ticket_id": engine.winner_ticket_id(),
        "prize_pool": slot_size * funders.len() as u64,
        "prize_paid": prize_paid,
        "funder_payouts": funder_payouts,
        "tickets_sold": engine.tickets_sold(),
        "escrow_remainder": ledger.balance(engine.escrow_account()),
        "journal_entries": ledger.journal().len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    tracing::info!("Simulation complete");
    Ok(())
}
