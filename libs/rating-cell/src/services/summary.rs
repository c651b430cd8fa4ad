use std::collections::BTreeMap;

use crate::models::{RatingSummary, MAX_SCORE, MIN_SCORE};

pub fn summarize(scores: &[u8]) -> RatingSummary {
    let valid: Vec<u8> = scores
        .iter()
        .copied()
        .filter(|s| (MIN_SCORE..=MAX_SCORE).contains(s))
        .collect();

    let mut distribution: BTreeMap<String, u32> =
        (MIN_SCORE..=MAX_SCORE).map(|s| (s.to_string(), 0)).collect();
    for score in &valid {
        *distribution.entry(score.to_string()).or_default() += 1;
    }

    let count = valid.len() as u32;
    let average = if count == 0 {
        0.0
    } else {
        let total: u32 = valid.iter().map(|&s| u32::from(s)).sum();
        (total as f64 / count as f64 * 100.0).round() / 100.0
    };

    RatingSummary { count, average, distribution }
}
