//! Similarity measures for fuzzy invoice-number matching.

use crate::models::config::ScorerKind;

/// Similarity of two normalized keys on a 0-100 scale.
pub trait Scorer: Send + Sync {
    fn score(&self, a: &str, b: &str) -> u8;
}

/// Best normalized-Levenshtein similarity of the shorter key against every
/// equally long window of the longer one.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialRatio;

impl Scorer for PartialRatio {
    fn score(&self, a: &str, b: &str) -> u8 {
        let (short, long) = if a.chars().count() <= b.chars().count() {
            (a, b)
        } else {
            (b, a)
        };
        let short_len = short.chars().count();
        if short_len == 0 {
            return 0;
        }

        let long_chars: Vec<char> = long.chars().collect();
        let best = long_chars
            .windows(short_len)
            .map(|window| {
                let window: String = window.iter().collect();
                strsim::normalized_levenshtein(short, &window)
            })
            .fold(0.0_f64, f64::max);

        // Truncate; the epsilon absorbs float error on exact tenths.
        (best * 100.0 + 1e-9).floor().clamp(0.0, 100.0) as u8
    }
}

/// 80 when either key contains the other, else 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct Containment;

const CONTAINMENT_SCORE: u8 = 80;

impl Scorer for Containment {
    fn score(&self, a: &str, b: &str) -> u8 {
        if a.is_empty() || b.is_empty() {
            return 0;
        }
        if a.contains(b) || b.contains(a) {
            CONTAINMENT_SCORE
        } else {
            0
        }
    }
}

/// Scorer implementation for a configured kind.
pub fn scorer_for(kind: ScorerKind) -> Box<dyn Scorer> {
    match kind {
        ScorerKind::PartialRatio => Box::new(PartialRatio),
        ScorerKind::Containment => Box::new(Containment),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ratio() {
        let scorer = PartialRatio;
        assert_eq!(scorer.score("INV123", "INV123"), 100);
        assert_eq!(scorer.score("INV123", "XXINV123YY"), 100);
        assert_eq!(scorer.score("INV20240007", "INV2024007"), 90);
        assert_eq!(scorer.score("ABC", "XYZ"), 0);
        assert_eq!(scorer.score("", "INV1"), 0);
    }

    #[test]
    fn test_partial_ratio_truncates() {
        let scorer = PartialRatio;
        // 6/7 and 11/13 similar.
        assert_eq!(scorer.score("ABCDEFG", "ABCDEFX"), 85);
        assert_eq!(scorer.score("INV2024000007", "INV2024000099"), 84);
    }

    #[test]
    fn test_partial_ratio_is_symmetric() {
        let scorer = PartialRatio;
        assert_eq!(
            scorer.score("INV2024007", "INV20240007"),
            scorer.score("INV20240007", "INV2024007")
        );
    }

    #[test]
    fn test_containment() {
        let scorer = Containment;
        assert_eq!(scorer.score("INV123", "INV1234"), 80);
        assert_eq!(scorer.score("INV1234", "INV123"), 80);
        assert_eq!(scorer.score("INV123", "INV124"), 0);
    }

    #[test]
    fn test_scorer_for() {
        assert_eq!(scorer_for(ScorerKind::Containment).score("A1", "A12"), 80);
        assert_eq!(scorer_for(ScorerKind::PartialRatio).score("A1", "A12"), 100);
    }
}
