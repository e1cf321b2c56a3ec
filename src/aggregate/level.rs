//! Five-step activity level of a project's recent window.

use serde::Serialize;

use crate::models::ActivityLogEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityLevel {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ActivityLevel {
    /// Meter weight in `[0, 100]`.
    #[must_use]
    pub fn weight(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Low => 25,
            Self::Medium => 50,
            Self::High => 75,
            Self::VeryHigh => 100,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "No activity",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }

    /// Badge variant used when rendering the level.
    #[must_use]
    pub fn variant(self) -> &'static str {
        match self {
            Self::None => "secondary",
            Self::Low => "success",
            Self::Medium => "info",
            Self::High => "warning",
            Self::VeryHigh => "danger",
        }
    }
}

/// Map a change total onto a level. All thresholds are strict.
#[must_use]
pub fn classify_total(total_changes: u64) -> ActivityLevel {
    match total_changes {
        t if t > 100 => ActivityLevel::VeryHigh,
        t if t > 50 => ActivityLevel::High,
        t if t > 10 => ActivityLevel::Medium,
        t if t > 0 => ActivityLevel::Low,
        _ => ActivityLevel::None,
    }
}

/// Level of a window: every added, modified and deleted file counts once.
#[must_use]
pub fn classify_window(entries: &[ActivityLogEntry]) -> ActivityLevel {
    let total = entries
        .iter()
        .map(ActivityLogEntry::total_changes)
        .fold(0, u64::saturating_add);
    classify_total(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_strict() {
        let cases = [
            (0, ActivityLevel::None, 0),
            (1, ActivityLevel::Low, 25),
            (10, ActivityLevel::Low, 25),
            (11, ActivityLevel::Medium, 50),
            (50, ActivityLevel::Medium, 50),
            (51, ActivityLevel::High, 75),
            (100, ActivityLevel::High, 75),
            (101, ActivityLevel::VeryHigh, 100),
        ];
        for (total, level, weight) in cases {
            let got = classify_total(total);
            assert_eq!(got, level, "total {total}");
            assert_eq!(got.weight(), weight, "total {total}");
        }
    }

    #[test]
    fn weight_never_decreases() {
        let mut previous = 0;
        for total in 0..=250 {
            let w = classify_total(total).weight();
            assert!(w >= previous, "weight dropped at {total}");
            previous = w;
        }
    }

    #[test]
    fn window_counts_deletions() {
        let entries = vec![
            ActivityLogEntry {
                files_added: 4,
                files_modified: 3,
                ..Default::default()
            },
            ActivityLogEntry {
                files_deleted: 4,
                ..Default::default()
            },
        ];
        assert_eq!(classify_window(&entries), ActivityLevel::Medium);
        assert_eq!(classify_window(&[]), ActivityLevel::None);
    }

    #[test]
    fn huge_window_saturates_to_very_high() {
        let big = ActivityLogEntry {
            files_added: u64::MAX,
            files_modified: u64::MAX,
            files_deleted: 1,
            ..Default::default()
        };
        assert_eq!(big.total_changes(), u64::MAX);
        assert_eq!(classify_window(&[big.clone(), big]), ActivityLevel::VeryHigh);
    }

    #[test]
    fn labels_and_variants() {
        assert_eq!(ActivityLevel::None.label(), "No activity");
        assert_eq!(ActivityLevel::VeryHigh.label(), "Very High");
        assert_eq!(ActivityLevel::Medium.variant(), "info");
        assert_eq!(ActivityLevel::High.variant(), "warning");
    }
}
