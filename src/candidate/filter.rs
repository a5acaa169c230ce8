//! Best-class score filtering.

use crate::boxes::CornerBox;
use crate::candidate::Candidate;
use crate::decode::DecodedBoxes;
use crate::trace::{trace_event, trace_span};

/// Returns the highest `objectness * class_prob` and its class index.
///
/// Ties resolve to the lowest class index. Returns `None` for an empty class
/// distribution.
pub fn best_class(objectness: f32, class_probs: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (class_index, &prob) in class_probs.iter().enumerate() {
        let score = objectness * prob;
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((class_index, score)),
        }
    }
    best
}

/// Keeps boxes whose best-class score is strictly above `threshold`.
///
/// `corners` must be index-aligned with `decoded`. Output preserves the
/// flattened input order. Returns `None` when no box passes so callers can
/// short-circuit.
pub fn filter_boxes(
    corners: &[CornerBox],
    decoded: &DecodedBoxes,
    threshold: f32,
) -> Option<Vec<Candidate>> {
    debug_assert_eq!(corners.len(), decoded.len());
    let _span = trace_span!("filter_boxes", boxes = corners.len(), threshold = threshold).entered();

    let mut kept = Vec::new();
    for (index, (bbox, &objectness)) in corners.iter().zip(decoded.objectness()).enumerate() {
        let Some(probs) = decoded.class_probs(index) else {
            continue;
        };
        let Some((class_index, score)) = best_class(objectness, probs) else {
            continue;
        };
        if score > threshold {
            kept.push(Candidate {
                bbox: *bbox,
                score,
                class_index,
                index,
            });
        }
    }

    trace_event!("filtered_candidates", count = kept.len());
    if kept.is_empty() {
        return None;
    }
    Some(kept)
}
