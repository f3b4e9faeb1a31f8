//! The bakery protocol proper: the shared `choosing`/`ticket` arrays and the
//! take-ticket / wait-for-turn / release cycle over them.
//!
//! No lock guards these arrays. Mutual exclusion emerges from the access
//! discipline alone: raise `choosing`, scan for the current maximum ticket,
//! publish max+1, clear `choosing`, then defer to every slot whose
//! `(ticket, slot)` pair is lower. Every protocol load and store is `SeqCst`
//! so all threads observe that four-step sequence in order; anything weaker
//! breaks both mutual exclusion and progress.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::registry::{CapacityExceeded, Registry, Slot};

const ORD: Ordering = Ordering::SeqCst;

/// One shared turnstile, passed by handle to every worker.
///
/// Capacity is fixed at construction; the arrays never grow.
#[derive(Debug)]
pub struct Turnstile {
    registry: Registry,
    choosing: Box<[AtomicBool]>,
    tickets: Box<[AtomicU64]>,
}

impl Turnstile {
    /// Creates a turnstile hosting up to `capacity` workers.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "turnstile needs at least one slot");
        Turnstile {
            registry: Registry::new(capacity),
            choosing: (0..capacity).map(|_| AtomicBool::new(false)).collect(),
            tickets: (0..capacity).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    /// Reserves a slot for a new worker.
    ///
    /// The ticket scan reads the live registered count, so the protocol is
    /// only well defined once the worker population is final: register every
    /// worker first, then let them start taking tickets.
    pub fn register(&self) -> Result<Slot, CapacityExceeded> {
        self.registry.register()
    }

    /// Takes a numbered ticket for `slot` without waiting for the turn.
    ///
    /// The ticket is withdrawn when the returned guard drops, on every exit
    /// path; call [`PendingTurn::wait`] to enter the critical section.
    pub fn take_ticket(&self, slot: Slot) -> PendingTurn<'_> {
        let ticket = self.assign_ticket(slot);
        PendingTurn {
            turnstile: self,
            slot,
            ticket,
        }
    }

    /// Takes a ticket and waits for the turn in one step.
    pub fn lock(&self, slot: Slot) -> TurnGuard<'_> {
        self.take_ticket(slot).wait()
    }

    fn assign_ticket(&self, slot: Slot) -> u64 {
        self.choosing[slot.0].store(true, ORD);

        // Plain reads, not a locked snapshot; other slots may be writing
        // their own tickets mid-scan. The wait loop re-validates against
        // live values, so a stale maximum only costs a tie.
        let registered = self.registry.registered();
        let max = self.tickets[..registered]
            .iter()
            .map(|t| t.load(ORD))
            .max()
            .unwrap_or(0);
        let ticket = max + 1;
        self.tickets[slot.0].store(ticket, ORD);

        self.choosing[slot.0].store(false, ORD);
        ticket
    }

    fn wait_turn(&self, slot: Slot, ticket: u64) {
        for i in 0..self.registry.registered() {
            if i == slot.0 {
                continue;
            }

            // Slot i may be mid-assignment; its ticket is unstable until
            // choosing clears.
            while self.choosing[i].load(ORD) {
                spin();
            }

            // Defer while slot i holds a lower (ticket, slot) pair. Lower
            // ticket goes first; equal tickets fall to the lower slot.
            loop {
                let theirs = self.tickets[i].load(ORD);
                if theirs == 0 || ticket < theirs || (ticket == theirs && slot.0 < i) {
                    break;
                }
                spin();
            }
        }
    }

    // The single write that lets anyone spinning on this slot move on.
    fn release(&self, slot: Slot) {
        self.tickets[slot.0].store(0, ORD);
    }
}

fn spin() {
    std::hint::spin_loop();
    std::thread::yield_now();
}

/// A taken ticket that has not been served yet.
///
/// Dropping it withdraws the ticket, so an abandoned wait can never stall the
/// slots queued behind it.
#[must_use = "a pending turn blocks lower-priority slots until waited on or dropped"]
#[derive(Debug)]
pub struct PendingTurn<'a> {
    turnstile: &'a Turnstile,
    slot: Slot,
    ticket: u64,
}

impl<'a> PendingTurn<'a> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Spins until every slot ahead in `(ticket, slot)` order has released,
    /// then hands back permission to run the critical section.
    pub fn wait(self) -> TurnGuard<'a> {
        self.turnstile.wait_turn(self.slot, self.ticket);
        let guard = TurnGuard {
            turnstile: self.turnstile,
            slot: self.slot,
            ticket: self.ticket,
        };
        // The ticket now belongs to the guard; dropping self here would
        // release it out from under the critical section.
        std::mem::forget(self);
        guard
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        self.turnstile.release(self.slot);
    }
}

/// RAII permission to run the critical section; at most one per turnstile is
/// live at any instant. The ticket resets to 0 on drop, panic included.
#[derive(Debug)]
pub struct TurnGuard<'a> {
    turnstile: &'a Turnstile,
    slot: Slot,
    ticket: u64,
}

impl TurnGuard<'_> {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        self.turnstile.release(self.slot);
    }
}
