//! Request generations: a newer request makes older in-flight results stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic counter shared by every request of one client session.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding all earlier tickets.
    pub fn begin(&self) -> RequestTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

/// Handle for one request. Its result is only wanted while it is current.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn latest_generation(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is_current(&self) -> bool {
        self.latest_generation() == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_ticket_supersedes_older() {
        let generation = RequestGeneration::new();
        let first = generation.begin();
        assert!(first.is_current());

        let second = generation.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(second.generation(), 2);
        assert_eq!(first.latest_generation(), 2);
    }

    #[test]
    fn clones_share_the_counter() {
        let generation = RequestGeneration::new();
        let ticket = generation.begin();
        generation.clone().begin();
        assert!(!ticket.is_current());
        assert_eq!(generation.current(), 2);
    }
}
