//! Service counters.
//!
//! Plain atomics, shared behind an `Arc` between the registry and the
//! embedding binary. There is no exporter here; the embedding environment
//! decides what to do with the numbers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct ServiceMetrics {
    pub players_added: AtomicU64,
    pub players_removed: AtomicU64,
    pub active_players: AtomicU64,
    pub ticks: AtomicU64,
    pub behaviour_errors: AtomicU64,
    pub roster_entries_skipped: AtomicU64,
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            players_added: AtomicU64::new(0),
            players_removed: AtomicU64::new(0),
            active_players: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            behaviour_errors: AtomicU64::new(0),
            roster_entries_skipped: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_add(&self) {
        self.players_added.fetch_add(1, Ordering::Relaxed);
        self.active_players.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remove(&self) {
        self.players_removed.fetch_add(1, Ordering::Relaxed);
        self.active_players.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_tick(&self, behaviour_errors: u64) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        if behaviour_errors > 0 {
            self.behaviour_errors
                .fetch_add(behaviour_errors, Ordering::Relaxed);
        }
    }

    pub fn record_roster_skip(&self) {
        self.roster_entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_tracks_active() {
        let metrics = ServiceMetrics::new();

        metrics.record_add();
        metrics.record_add();
        metrics.record_remove();

        assert_eq!(metrics.players_added.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.players_removed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.active_players.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_tick_accumulates_errors() {
        let metrics = ServiceMetrics::new();

        metrics.record_tick(0);
        metrics.record_tick(3);

        assert_eq!(metrics.ticks.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.behaviour_errors.load(Ordering::Relaxed), 3);
    }
}
