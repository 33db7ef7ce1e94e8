use std::time::{Duration, Instant};

/// Tracks request timing for one host
///
/// The politeness limiter keeps one of these per host and shares it across
/// every crawl in the process.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests granted to this host so far
    pub request_count: u64,

    /// Time slot reserved by the most recent request to this host
    pub last_request_time: Option<Instant>,
}

impl HostState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a request was made (or reserved) at `at`
    fn record_request(&mut self, at: Instant) {
        self.request_count += 1;
        self.last_request_time = Some(at);
    }

    /// Reserves the earliest slot at or after `now` and returns it
    ///
    /// Reservations are spaced by `min_interval` even when the previous slot
    /// lies in the future, so concurrent callers queue up instead of bursting.
    pub fn reserve_slot(&mut self, min_interval: Duration, now: Instant) -> Instant {
        let slot = match self.last_request_time {
            Some(last) if last + min_interval > now => last + min_interval,
            _ => now,
        };
        self.record_request(slot);
        slot
    }
}
