use super::schedule::ScheduleSite;

/// Presentation types followed on the NeurIPS schedule
pub const NEURIPS_TYPES: &[&str] = &["Poster", "Oral", "Spotlight Poster", "Spotlight"];

pub fn adapter() -> ScheduleSite {
    ScheduleSite::new("NeurIPS", "https://nips.cc", (2018..=2024).collect(), NEURIPS_TYPES)
}
