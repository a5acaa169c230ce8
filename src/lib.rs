//! yolopost turns raw YOLO-family detector activations into labeled boxes.
//!
//! The pipeline decodes anchor-cell activations, converts center/size boxes to
//! corners, filters by best-class score, suppresses overlaps with greedy NMS and
//! reports clamped pixel-space detections. Network loading and the forward pass
//! stay outside the crate behind [`InferenceProvider`]. Row-parallel decoding is
//! available via the `rayon` feature.

pub mod anchors;
pub mod boxes;
mod candidate;
pub mod decode;
pub mod labels;
pub mod lowlevel;
pub mod pipeline;
pub mod tensor;
mod trace;
pub mod util;

pub use anchors::{AnchorSet, DEFAULT_ANCHORS};
pub use boxes::CornerBox;
pub use labels::COCO_CLASSES;
pub use pipeline::{
    detect, DetectConfig, Detection, Detector, InferenceProvider, DEFAULT_CLASS_PROB_THRESHOLD,
    DEFAULT_FILTER_BOXES_THRESHOLD, DEFAULT_IMAGE_DIM, DEFAULT_IOU_THRESHOLD,
};
pub use tensor::{ActivationView, OwnedActivation};
pub use util::{YoloError, YoloResult};

pub use candidate::Candidate;
