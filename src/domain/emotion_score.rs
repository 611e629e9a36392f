//! Emotion tag aggregation.
//!
//! Reduces a set of journaled trades into a normalized distribution of
//! emotion-tag occurrences. Pure function of its input; recomputed on every
//! call.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::domain::emotion::{self, EmotionTag};
use crate::domain::trade::Trade;

/// One entry of the aggregated distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionBucket {
    /// Normalized tag name (uppercased, trimmed).
    pub tag: String,
    /// The vocabulary tag, or `None` for tags outside the fixed vocabulary.
    /// Unrecognized tags stay in the distribution but are excluded from
    /// stability scoring.
    pub known: Option<EmotionTag>,
    /// Occurrences across all trades. A trade with two tags contributes one
    /// occurrence to each of the two buckets.
    pub count: usize,
    /// Share of total tag occurrences, percent, one decimal place.
    pub share_pct: f64,
    /// Number of distinct trades that carried this tag at least once.
    pub trade_count: usize,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    trade_count: usize,
}

/// Aggregate per-trade emotion tags into percentage buckets.
///
/// A trade with no tags (or only blank tags) counts as implicitly NEUTRAL.
/// Zero trades yield an empty distribution; downstream scoring treats that
/// as the neutral default rather than dividing by zero.
pub fn aggregate(trades: &[Trade]) -> Vec<EmotionBucket> {
    let mut buckets: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut total_occurrences = 0usize;

    for trade in trades {
        let mut tags: Vec<String> = trade
            .emotions
            .iter()
            .map(|raw| emotion::normalize(raw))
            .filter(|tag| !tag.is_empty())
            .collect();

        if tags.is_empty() {
            tags.push(EmotionTag::Neutral.as_str().to_string());
        }

        let mut seen_this_trade: BTreeSet<&str> = BTreeSet::new();
        for tag in &tags {
            let entry = buckets.entry(tag.clone()).or_default();
            entry.count += 1;
            total_occurrences += 1;
            if seen_this_trade.insert(tag.as_str()) {
                entry.trade_count += 1;
            }
        }
    }

    if total_occurrences == 0 {
        return Vec::new();
    }

    let mut distribution: Vec<EmotionBucket> = buckets
        .into_iter()
        .map(|(tag, acc)| {
            let share = acc.count as f64 / total_occurrences as f64 * 100.0;
            EmotionBucket {
                known: EmotionTag::parse(&tag),
                tag,
                count: acc.count,
                share_pct: round1(share),
                trade_count: acc.trade_count,
            }
        })
        .collect();

    // Deterministic ordering: largest bucket first, name breaks ties.
    distribution.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

    distribution
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
