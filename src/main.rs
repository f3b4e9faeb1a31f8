//! Contention demo: workers take numbered tickets and pass through one
//! critical section in (ticket, slot) order.
//!
//! Random delays before taking a ticket and inside the critical section make
//! the interleavings visible in the log output. Run with
//! `RUST_LOG=info cargo run`.
//!
//! Registration is two-phase on purpose: every worker gets its slot before
//! any worker starts taking tickets, because the ticket scan assumes the
//! worker population is final.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info};

use bakery_lock::{Slot, Turnstile};

const MAX_WORKERS: usize = 20;
const WORKERS: usize = 8;

fn main() {
    tracing_subscriber::fmt::init();

    let turnstile = Arc::new(Turnstile::new(MAX_WORKERS));

    let mut slots = Vec::with_capacity(WORKERS);
    for _ in 0..WORKERS {
        match turnstile.register() {
            Ok(slot) => slots.push(slot),
            Err(e) => {
                error!("registration failed: {e}");
                std::process::exit(1);
            }
        }
    }

    let handles: Vec<_> = slots
        .into_iter()
        .map(|slot| {
            let turnstile = Arc::clone(&turnstile);
            thread::spawn(move || serve(&turnstile, slot))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

fn serve(turnstile: &Turnstile, slot: Slot) {
    let name = format!("Worker-{slot}");
    let mut rng = rand::rng();

    thread::sleep(Duration::from_millis(rng.random_range(0..20)));

    let pending = turnstile.take_ticket(slot);
    info!(worker = %name, ticket = pending.ticket(), "ticket assigned");

    let guard = pending.wait();
    info!(worker = %name, ticket = guard.ticket(), "entering critical section");

    thread::sleep(Duration::from_millis(rng.random_range(0..10)));
    info!(worker = %name, "served");
}
