//! URL handling module for Paper-Harvest
//!
//! Canonical URLs are the identity used by the visited set, so the same paper
//! reached through two differently-spelled links is dispatched only once.
//! Host extraction keys the per-host politeness limiter.

mod domain;
mod normalize;

pub use domain::extract_host;
pub use normalize::canonicalize_url;
