//! Box decoding from raw anchor-cell activations.
//!
//! For every grid cell `(row, col)` and anchor `a` the raw channels
//! `[tx, ty, tw, th, t_obj, logits..]` become
//!
//! - `center = ((sigmoid(tx) + col) / grid_w, (sigmoid(ty) + row) / grid_h)`
//! - `size = (anchor_w * exp(tw) / grid_w, anchor_h * exp(th) / grid_h)`
//! - `objectness = sigmoid(t_obj)`
//! - `class_probs = softmax(logits)`
//!
//! Outputs are normalized to the full image and stored structure-of-arrays in
//! flattened `(row, col, anchor)` order.

use crate::anchors::AnchorSet;
use crate::tensor::{ActivationView, BOX_CHANNELS};
use crate::trace::{trace_event, trace_span};
use crate::util::math::{sigmoid, softmax_into};
use crate::util::{YoloError, YoloResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Decoded boxes for one frame, indexed by flattened `(row, col, anchor)`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedBoxes {
    center_xy: Vec<[f32; 2]>,
    size_wh: Vec<[f32; 2]>,
    objectness: Vec<f32>,
    class_probs: Vec<f32>,
    num_classes: usize,
}

impl DecodedBoxes {
    pub(crate) fn with_capacity(boxes: usize, num_classes: usize) -> Self {
        Self {
            center_xy: Vec::with_capacity(boxes),
            size_wh: Vec::with_capacity(boxes),
            objectness: Vec::with_capacity(boxes),
            class_probs: Vec::with_capacity(boxes * num_classes),
            num_classes,
        }
    }

    /// Returns the number of decoded boxes.
    pub fn len(&self) -> usize {
        self.objectness.len()
    }

    /// Returns true if no boxes were decoded.
    pub fn is_empty(&self) -> bool {
        self.objectness.is_empty()
    }

    /// Returns the number of classes per box.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Box centers `(x, y)` normalized to the image.
    pub fn center_xy(&self) -> &[[f32; 2]] {
        &self.center_xy
    }

    /// Box sizes `(w, h)` normalized to the image.
    pub fn size_wh(&self) -> &[[f32; 2]] {
        &self.size_wh
    }

    /// Per-box objectness in `[0, 1]`.
    pub fn objectness(&self) -> &[f32] {
        &self.objectness
    }

    /// Class distribution of box `idx`.
    pub fn class_probs(&self, idx: usize) -> Option<&[f32]> {
        let start = idx.checked_mul(self.num_classes)?;
        self.class_probs.get(start..start + self.num_classes)
    }

    /// All class distributions, `num_classes` values per box.
    pub fn class_probs_flat(&self) -> &[f32] {
        &self.class_probs
    }

    #[cfg(feature = "rayon")]
    pub(crate) fn append(&mut self, mut other: DecodedBoxes) {
        debug_assert_eq!(self.num_classes, other.num_classes);
        self.center_xy.append(&mut other.center_xy);
        self.size_wh.append(&mut other.size_wh);
        self.objectness.append(&mut other.objectness);
        self.class_probs.append(&mut other.class_probs);
    }
}

/// Decodes every anchor cell of `activation` with the given priors.
pub fn decode(activation: ActivationView<'_>, anchors: &AnchorSet) -> YoloResult<DecodedBoxes> {
    check_anchors(activation, anchors)?;
    let _span = trace_span!(
        "decode",
        grid_h = activation.grid_h(),
        grid_w = activation.grid_w(),
        anchors = anchors.len()
    )
    .entered();

    let mut out = DecodedBoxes::with_capacity(activation.num_boxes(), activation.num_classes());
    for row in 0..activation.grid_h() {
        decode_row(activation, anchors, row, &mut out);
    }

    trace_event!("decoded_boxes", count = out.len());
    Ok(out)
}

pub(crate) fn check_anchors(activation: ActivationView<'_>, anchors: &AnchorSet) -> YoloResult<()> {
    if activation.num_anchors() != anchors.len() {
        return Err(YoloError::AnchorMismatch {
            activation: activation.num_anchors(),
            anchors: anchors.len(),
        });
    }
    Ok(())
}

/// Appends the decoded boxes of grid row `row` to `out`.
pub(crate) fn decode_row(
    activation: ActivationView<'_>,
    anchors: &AnchorSet,
    row: usize,
    out: &mut DecodedBoxes,
) {
    let grid_w = activation.grid_w() as f32;
    let grid_h = activation.grid_h() as f32;
    let channels = activation.channels();
    let num_classes = activation.num_classes();
    let Some(cells) = activation.row(row) else {
        return;
    };

    for (cell_idx, cell) in cells.chunks_exact(channels).enumerate() {
        let col = cell_idx / anchors.len();
        let (anchor_w, anchor_h) = anchors.as_slice()[cell_idx % anchors.len()];

        out.center_xy.push([
            (sigmoid(cell[0]) + col as f32) / grid_w,
            (sigmoid(cell[1]) + row as f32) / grid_h,
        ]);
        out.size_wh.push([
            anchor_w * cell[2].exp() / grid_w,
            anchor_h * cell[3].exp() / grid_h,
        ]);
        out.objectness.push(sigmoid(cell[4]));

        let start = out.class_probs.len();
        out.class_probs.resize(start + num_classes, 0.0);
        softmax_into(&cell[BOX_CHANNELS..], &mut out.class_probs[start..]);
    }
}
