//! Process-wide per-host politeness limiter
//!
//! Every fetch, static or browser-rendered, from every concurrent crawl, waits
//! here before touching the network. Callers reserve the next free slot for
//! their host under a lock and then sleep outside of it, so waiting on one
//! host never blocks requests to another.

use crate::state::HostState;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum interval between requests to the same host
#[derive(Debug)]
pub struct Politeness {
    min_interval: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl Politeness {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until a request to `host` is allowed
    ///
    /// Returns how many requests the host has been granted, this one included.
    pub async fn acquire(&self, host: &str) -> u64 {
        let (slot, granted) = {
            let mut hosts = self.hosts.lock().await;
            let state = hosts.entry(host.to_string()).or_insert_with(HostState::new);
            let slot = state.reserve_slot(self.min_interval, Instant::now().into_std());
            (slot, state.request_count)
        };

        let slot = Instant::from_std(slot);
        if slot > Instant::now() {
            tracing::trace!(host, wait = ?(slot - Instant::now()), "Waiting for politeness slot");
            tokio::time::sleep_until(slot).await;
        }
        granted
    }
}
