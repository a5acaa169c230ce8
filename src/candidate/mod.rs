//! Candidate selection and pruning.
//!
//! Includes the best-class score filter and greedy IoU non-maximum
//! suppression.

pub(crate) mod filter;
pub(crate) mod nms;

use crate::boxes::CornerBox;
use std::cmp::Ordering;

/// Box that survived the score filter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Corner box (normalized until the pipeline rescales it).
    pub bbox: CornerBox,
    /// `objectness * class_prob` of the best class.
    pub score: f32,
    /// Index of the best class.
    pub class_index: usize,
    /// Flattened `(row, col, anchor)` position in the activation.
    pub index: usize,
}

/// Descending score, ties broken by ascending index.
pub(crate) fn score_cmp_desc(a: (f32, usize), b: (f32, usize)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}
