//! Picking the related entity that best matches a scraped name

use crate::kind::EntityInfo;
use crate::text::{distance, normalize};

/// Largest edit distance at which a candidate can still be chosen
pub const MAX_NAME_DISTANCE: usize = 2;

/// Choose the candidate whose name is closest to `hint`.
///
/// With an empty hint a lone candidate is returned as-is. Otherwise names
/// are compared after [`normalize`]; candidates further than
/// [`MAX_NAME_DISTANCE`] are dropped, as are inexact matches whose distance
/// is at least the hint's length. Ties keep the earliest candidate.
/// `None` means nothing could be picked confidently.
pub fn best_match<'a>(candidates: &'a [EntityInfo], hint: &str) -> Option<&'a EntityInfo> {
    if hint.is_empty() && candidates.len() == 1 {
        return candidates.first();
    }

    let hint = normalize(hint);
    let hint_len = hint.chars().count();

    let mut best: Option<(&EntityInfo, usize)> = None;
    for candidate in candidates {
        let dist = distance(&hint, &normalize(&candidate.name)).distance();
        if dist > MAX_NAME_DISTANCE {
            continue;
        }
        // Short hints are too easy to reach with a couple of edits.
        if dist > 0 && hint_len <= dist {
            continue;
        }
        if best.map_or(true, |(_, best_dist)| dist < best_dist) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(candidate, _)| candidate)
}
