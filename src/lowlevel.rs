//! Individual pipeline stages for custom post-processing.
//!
//! Most users should prefer [`crate::Detector`]. These functions expose each
//! stage so callers can, for example, run NMS on boxes from another source or
//! inspect the decoded distribution before filtering.

pub use crate::boxes::{to_corners, CornerBox};
pub use crate::candidate::filter::{best_class, filter_boxes};
pub use crate::candidate::nms::{non_max_suppression, Suppressed};
pub use crate::candidate::Candidate;
#[cfg(feature = "rayon")]
pub use crate::decode::rayon::decode_par;
pub use crate::decode::{decode, DecodedBoxes};
