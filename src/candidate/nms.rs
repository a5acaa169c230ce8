//! Greedy IoU non-maximum suppression.

use crate::boxes::CornerBox;
use crate::candidate::score_cmp_desc;
use crate::trace::{trace_event, trace_span};

/// Output of [`non_max_suppression`], in acceptance order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Suppressed {
    /// Input indices of the kept boxes, highest score first.
    pub indices: Vec<usize>,
    /// Kept boxes, aligned with `indices`.
    pub boxes: Vec<CornerBox>,
    /// Kept scores, aligned with `indices`.
    pub scores: Vec<f32>,
}

impl Suppressed {
    /// Returns the number of kept boxes.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing was kept.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Applies greedy NMS to `boxes` with their `scores`.
///
/// Boxes are visited by descending score with ties broken by ascending input
/// index. Each unsuppressed box is kept and suppresses every later box whose
/// IoU with it exceeds `iou_threshold`. Runs in O(n^2).
pub fn non_max_suppression(boxes: &[CornerBox], scores: &[f32], iou_threshold: f32) -> Suppressed {
    debug_assert_eq!(boxes.len(), scores.len());
    let n = boxes.len().min(scores.len());
    let _span = trace_span!("nms", candidates = n, iou_threshold = iou_threshold).entered();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| score_cmp_desc((scores[a], a), (scores[b], b)));

    let mut suppressed = vec![false; n];
    let mut kept = Suppressed::default();

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        kept.indices.push(i);
        kept.boxes.push(boxes[i]);
        kept.scores.push(scores[i]);

        for &j in &order[pos + 1..] {
            if !suppressed[j] && boxes[i].iou(&boxes[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    trace_event!("nms_kept", kept = kept.len(), suppressed = n - kept.len());
    kept
}
