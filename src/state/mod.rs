//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the engine's state machine for one venue/year crawl
//! - `HostState`: per-host request timing used by the politeness limiter

mod crawl_state;
mod host_state;

pub use crawl_state::CrawlState;
pub use host_state::HostState;
