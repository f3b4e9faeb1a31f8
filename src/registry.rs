//! Slot issuance for the turnstile.
//!
//! Registration is the one place the protocol needs a true atomic
//! read-modify-write: the counter is bumped with a compare-and-increment that
//! never moves past capacity, so the k-th successful registration always gets
//! slot k and no slot is ever handed out twice.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use thiserror::Error;

/// Every slot in the turnstile is already registered.
///
/// Fatal for the caller: a worker without a slot must not take part in the
/// protocol.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("worker capacity exceeded: all {capacity} slots are registered")]
pub struct CapacityExceeded {
    pub capacity: usize,
}

/// A worker's fixed index into the shared arrays, assigned once at
/// registration and held for the worker's entire lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(pub(crate) usize);

impl Slot {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues dense slot indices up to a fixed capacity.
#[derive(Debug)]
pub(crate) struct Registry {
    capacity: usize,
    registered: AtomicUsize,
}

impl Registry {
    pub(crate) fn new(capacity: usize) -> Self {
        Registry {
            capacity,
            registered: AtomicUsize::new(0),
        }
    }

    /// Reserves the next slot index.
    pub(crate) fn register(&self) -> Result<Slot, CapacityExceeded> {
        self.registered
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .map(Slot)
            .map_err(|_| CapacityExceeded {
                capacity: self.capacity,
            })
    }

    /// How many slots have been issued so far.
    pub(crate) fn registered(&self) -> usize {
        self.registered.load(Ordering::SeqCst)
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
