use super::schedule::ScheduleSite;

/// Presentation types followed on the ICLR schedule
///
/// 2023 used combined "venue / tier" labels instead of the plain ones.
pub const ICLR_TYPES: &[&str] = &[
    "Poster",
    "Oral",
    "Spotlight Poster",
    "Spotlight",
    "In-Person Poster presentation / top 5% paper",
    "In-Person presentation / poster accept",
    "Virtual presentation / top 25% paper",
    "In-Person Poster presentation / top 25% paper",
    "Virtual Poster presentation / top 5% paper",
    "Virtual Poster presentation / top 25% paper",
    "In-Person Poster presentation / poster accept",
    "Virtual presentation / top 5% paper",
    "Virtual Poster presentation / poster accept",
    "In-Person Oral presentation / top 25% paper",
    "In-Person Oral presentation / top 5% paper",
    "Virtual presentation / poster accept",
];

pub fn adapter() -> ScheduleSite {
    ScheduleSite::new(
        "ICLR",
        "https://iclr.cc",
        vec![2018, 2019, 2021, 2022, 2023, 2024],
        ICLR_TYPES,
    )
}
