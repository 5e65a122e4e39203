//! Picks the next audio clip to hand to a labeler.
//!
//! Selection runs in two stages:
//! - Narrowing: optional cooldown and lease filters drop items that were
//!   labeled or served very recently, unless that would drop every item.
//! - [`select_next`]: strict priority preemption (high, then medium, then
//!   low), then the least-labeled group inside that tier, then a uniform
//!   random pick inside the group.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use uuid::Uuid;

use crate::models::item::{LabelItem, Priority};

/// Tiers in preemption order.
const TIERS: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

/// Choose one item from `candidates`, or `None` if there are none.
///
/// Callers must already have dropped items at or above the label threshold.
pub fn select_next<'a, I, R>(candidates: I, rng: &mut R) -> Option<&'a LabelItem>
where
    I: IntoIterator<Item = &'a LabelItem>,
    R: Rng + ?Sized,
{
    let mut buckets: [Vec<&'a LabelItem>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for item in candidates {
        let tier = TIERS.iter().position(|p| *p == item.priority).unwrap_or(1);
        buckets[tier].push(item);
    }

    let bucket = buckets.iter().find(|b| !b.is_empty())?;

    let fewest = bucket.iter().map(|item| item.label_count).min()?;
    let group: Vec<&'a LabelItem> = bucket
        .iter()
        .copied()
        .filter(|item| item.label_count == fewest)
        .collect();

    group.choose(rng).copied()
}

/// Keep the items that pass `keep`; if none pass, keep everything.
pub fn prefer<'a, F>(candidates: Vec<&'a LabelItem>, keep: F) -> Vec<&'a LabelItem>
where
    F: Fn(&LabelItem) -> bool,
{
    let kept: Vec<&'a LabelItem> = candidates.iter().copied().filter(|i| keep(*i)).collect();
    if kept.is_empty() {
        candidates
    } else {
        kept
    }
}

/// Whether `item` was labeled within `window` of `now`.
pub fn in_cooldown(item: &LabelItem, window: Duration, now: DateTime<Utc>) -> bool {
    match item.last_labeled_at {
        Some(at) => now - at < window,
        None => false,
    }
}

/// Drop recently labeled items. A zero or absent window is a no-op.
pub fn outside_cooldown<'a>(
    candidates: Vec<&'a LabelItem>,
    window: Option<Duration>,
    now: DateTime<Utc>,
) -> Vec<&'a LabelItem> {
    match window {
        Some(w) if w > Duration::zero() => prefer(candidates, |item| !in_cooldown(item, w, now)),
        _ => candidates,
    }
}

/// Drop items currently leased to another labeler.
pub fn without_leased<'a>(
    candidates: Vec<&'a LabelItem>,
    leased: &HashSet<Uuid>,
) -> Vec<&'a LabelItem> {
    if leased.is_empty() {
        return candidates;
    }
    prefer(candidates, |item| !leased.contains(&item.id))
}

/// Items still below `threshold`, i.e. the caller-side pre-filter.
pub fn below_threshold(items: &[LabelItem], threshold: i32) -> Vec<&LabelItem> {
    items.iter().filter(|i| i.label_count < threshold).collect()
}
