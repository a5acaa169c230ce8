//! Row-parallel decoding (feature-gated).
//!
//! Each grid row is decoded on its own task with the same per-cell math as the
//! sequential path, then rows are concatenated in order, so results are
//! bit-identical to [`super::decode`].

use crate::anchors::AnchorSet;
use crate::decode::{check_anchors, decode_row, DecodedBoxes};
use crate::tensor::ActivationView;
use crate::trace::{trace_event, trace_span};
use crate::util::YoloResult;
use rayon::prelude::*;

/// Decodes `activation` with grid rows processed in parallel.
pub fn decode_par(activation: ActivationView<'_>, anchors: &AnchorSet) -> YoloResult<DecodedBoxes> {
    check_anchors(activation, anchors)?;
    let _span = trace_span!(
        "decode_par",
        grid_h = activation.grid_h(),
        grid_w = activation.grid_w(),
        anchors = anchors.len()
    )
    .entered();

    let per_row = activation.grid_w() * activation.num_anchors();
    let num_classes = activation.num_classes();
    let rows: Vec<DecodedBoxes> = (0..activation.grid_h())
        .into_par_iter()
        .map(|row| {
            let mut part = DecodedBoxes::with_capacity(per_row, num_classes);
            decode_row(activation, anchors, row, &mut part);
            part
        })
        .collect();

    let mut out = DecodedBoxes::with_capacity(activation.num_boxes(), num_classes);
    for part in rows {
        out.append(part);
    }

    trace_event!("decoded_boxes", count = out.len());
    Ok(out)
}
