//! Lamport's bakery algorithm: fair, starvation-free mutual exclusion built
//! from plain shared-memory reads and writes — no compare-and-swap on the
//! protocol fields, no kernel mutex.
//!
//! A [`Turnstile`] hosts a fixed number of worker slots. Each worker registers
//! once, then repeatedly takes a numbered ticket and spins until every slot
//! with a lower `(ticket, slot)` pair has been served. Lower ticket goes
//! first; equal tickets fall to the lower slot index. The only
//! read-modify-write atomic in the whole protocol is the registration
//! counter.
//!
//! All registration must finish before any worker takes a ticket; see
//! [`Turnstile::register`].

pub mod registry;
pub mod turnstile;

pub use registry::{CapacityExceeded, Slot};
pub use turnstile::{PendingTurn, TurnGuard, Turnstile};
