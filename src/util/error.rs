//! Error types for yolopost.

use thiserror::Error;

/// Result alias for yolopost operations.
pub type YoloResult<T> = std::result::Result<T, YoloError>;

/// Errors that can occur when decoding detector output.
///
/// Every variant is an input-contract violation by the caller; "nothing
/// detected" is never an error and yields an empty result instead.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum YoloError {
    /// One of the activation dimensions is zero.
    #[error("invalid activation dimensions: {grid_h}x{grid_w}x{num_anchors}x{channels}")]
    InvalidDimensions {
        grid_h: usize,
        grid_w: usize,
        num_anchors: usize,
        channels: usize,
    },
    /// The backing buffer length does not match the declared shape.
    #[error("activation buffer has {got} elements, shape requires {needed}")]
    BufferLengthMismatch { needed: usize, got: usize },
    /// The activation shape cannot be interpreted as a detector head.
    #[error("invalid activation shape {shape:?}: {reason}")]
    InvalidShape {
        shape: Vec<usize>,
        reason: &'static str,
    },
    /// A leading batch dimension other than 1 was supplied.
    #[error("batch size {batch} is not supported, expected 1")]
    BatchNotSupported { batch: usize },
    /// The per-anchor channel count is not `5 + num_classes`.
    #[error("activation has {channels} channels per anchor, expected {expected} (5 + {num_classes} classes)")]
    ChannelMismatch {
        channels: usize,
        expected: usize,
        num_classes: usize,
    },
    /// The activation anchor dimension disagrees with the anchor set.
    #[error("activation has {activation} anchors per cell, anchor set has {anchors}")]
    AnchorMismatch { activation: usize, anchors: usize },
    /// The anchor set is empty or holds non-positive sizes.
    #[error("invalid anchor set: {reason}")]
    InvalidAnchors { reason: &'static str },
    /// A configuration field is out of range.
    #[error("invalid config: {reason}")]
    InvalidConfig { reason: &'static str },
    /// A class index has no entry in the class-name table.
    #[error("class index {index} out of bounds for {len} class names")]
    ClassIndexOutOfBounds { index: usize, len: usize },
    /// The inference provider failed to produce an activation.
    #[error("inference failed: {0}")]
    Inference(String),
}
