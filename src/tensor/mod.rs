//! Raw detector activations.
//!
//! `ActivationView` is a borrowed 4D view over a contiguous `f32` buffer laid
//! out as `[grid_h, grid_w, num_anchors, 5 + num_classes]` in row-major order.
//! Each anchor cell holds `[tx, ty, tw, th, t_obj, logit_0 .. logit_{C-1}]`.
//! The batch dimension is assumed to be 1 and stripped before this stage.

use crate::util::{YoloError, YoloResult};

/// Number of box and objectness channels preceding the class logits.
pub const BOX_CHANNELS: usize = 5;

/// Borrowed view of one frame of detector output.
#[derive(Copy, Clone, Debug)]
pub struct ActivationView<'a> {
    data: &'a [f32],
    grid_h: usize,
    grid_w: usize,
    num_anchors: usize,
    channels: usize,
}

impl<'a> ActivationView<'a> {
    /// Creates a view over `[grid_h, grid_w, num_anchors, channels]`.
    pub fn new(
        data: &'a [f32],
        grid_h: usize,
        grid_w: usize,
        num_anchors: usize,
        channels: usize,
    ) -> YoloResult<Self> {
        let needed = required_len(grid_h, grid_w, num_anchors, channels)?;
        if data.len() != needed {
            return Err(YoloError::BufferLengthMismatch {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            grid_h,
            grid_w,
            num_anchors,
            channels,
        })
    }

    /// Creates a view over the network's natural `[grid_h, grid_w, A * (5 + C)]`
    /// layout, splitting the last axis into `num_anchors` groups.
    pub fn from_flat_channels(
        data: &'a [f32],
        grid_h: usize,
        grid_w: usize,
        num_anchors: usize,
        flat_channels: usize,
    ) -> YoloResult<Self> {
        if num_anchors == 0 || flat_channels % num_anchors != 0 {
            return Err(YoloError::InvalidShape {
                shape: vec![grid_h, grid_w, flat_channels],
                reason: "channel axis is not divisible by the anchor count",
            });
        }
        Self::new(
            data,
            grid_h,
            grid_w,
            num_anchors,
            flat_channels / num_anchors,
        )
    }

    /// Creates a view from a shape as reported by an inference runtime.
    ///
    /// `channels` is the per-anchor channel count the caller expects
    /// (`5 + num_classes`). Accepted shapes:
    /// - `[H, W, A * (5 + C)]`
    /// - `[1, H, W, A * (5 + C)]`
    /// - `[H, W, A, 5 + C]`
    /// - `[1, H, W, A, 5 + C]`
    ///
    /// 4D shapes are told apart by the last axis. With a single anchor both
    /// forms coincide and the shape reads as batched.
    pub fn from_shape(
        data: &'a [f32],
        shape: &[usize],
        num_anchors: usize,
        channels: usize,
    ) -> YoloResult<Self> {
        let flat = num_anchors.checked_mul(channels);
        match *shape {
            [h, w, last] => {
                if Some(last) != flat {
                    return Err(YoloError::InvalidShape {
                        shape: shape.to_vec(),
                        reason: "channel axis is not anchors * (5 + classes)",
                    });
                }
                Self::from_flat_channels(data, h, w, num_anchors, last)
            }
            [batch, h, w, last] if Some(last) == flat => {
                check_batch(batch)?;
                Self::from_flat_channels(data, h, w, num_anchors, last)
            }
            [h, w, a, c] if c == channels => {
                check_anchor_axis(a, num_anchors)?;
                Self::new(data, h, w, a, c)
            }
            [_, _, _, _] => Err(YoloError::InvalidShape {
                shape: shape.to_vec(),
                reason: "last axis matches neither 5 + classes nor anchors * (5 + classes)",
            }),
            [batch, h, w, a, c] => {
                check_batch(batch)?;
                check_anchor_axis(a, num_anchors)?;
                if c != channels {
                    return Err(YoloError::ChannelMismatch {
                        channels: c,
                        expected: channels,
                        num_classes: channels.saturating_sub(BOX_CHANNELS),
                    });
                }
                Self::new(data, h, w, a, c)
            }
            _ => Err(YoloError::InvalidShape {
                shape: shape.to_vec(),
                reason: "expected 3, 4 or 5 dimensions",
            }),
        }
    }

    /// Returns the number of grid rows.
    pub fn grid_h(&self) -> usize {
        self.grid_h
    }

    /// Returns the number of grid columns.
    pub fn grid_w(&self) -> usize {
        self.grid_w
    }

    /// Returns the number of anchors predicted per cell.
    pub fn num_anchors(&self) -> usize {
        self.num_anchors
    }

    /// Returns the channel count per anchor (`5 + num_classes`).
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the number of class logits per anchor.
    pub fn num_classes(&self) -> usize {
        self.channels - BOX_CHANNELS
    }

    /// Returns the number of predicted boxes (`grid_h * grid_w * num_anchors`).
    pub fn num_boxes(&self) -> usize {
        self.grid_h * self.grid_w * self.num_anchors
    }

    /// Returns the backing slice.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Returns the channels of one anchor cell, if in bounds.
    pub fn cell(&self, row: usize, col: usize, anchor: usize) -> Option<&'a [f32]> {
        if row >= self.grid_h || col >= self.grid_w || anchor >= self.num_anchors {
            return None;
        }
        let start = ((row * self.grid_w + col) * self.num_anchors + anchor) * self.channels;
        self.data.get(start..start + self.channels)
    }

    /// Returns all anchor cells of grid row `row` as one contiguous slice.
    pub fn row(&self, row: usize) -> Option<&'a [f32]> {
        if row >= self.grid_h {
            return None;
        }
        let len = self.grid_w * self.num_anchors * self.channels;
        let start = row * len;
        self.data.get(start..start + len)
    }
}

/// Owned activation tensor, as returned by an inference provider.
#[derive(Clone, Debug)]
pub struct OwnedActivation {
    data: Vec<f32>,
    grid_h: usize,
    grid_w: usize,
    num_anchors: usize,
    channels: usize,
}

impl OwnedActivation {
    /// Wraps a `[grid_h, grid_w, num_anchors, channels]` buffer.
    pub fn new(
        data: Vec<f32>,
        grid_h: usize,
        grid_w: usize,
        num_anchors: usize,
        channels: usize,
    ) -> YoloResult<Self> {
        ActivationView::new(&data, grid_h, grid_w, num_anchors, channels)?;
        Ok(Self {
            data,
            grid_h,
            grid_w,
            num_anchors,
            channels,
        })
    }

    /// Wraps a buffer whose shape follows [`ActivationView::from_shape`].
    pub fn from_shape(
        data: Vec<f32>,
        shape: &[usize],
        num_anchors: usize,
        channels: usize,
    ) -> YoloResult<Self> {
        let view = ActivationView::from_shape(&data, shape, num_anchors, channels)?;
        let (grid_h, grid_w, num_anchors, channels) = (
            view.grid_h(),
            view.grid_w(),
            view.num_anchors(),
            view.channels(),
        );
        Ok(Self {
            data,
            grid_h,
            grid_w,
            num_anchors,
            channels,
        })
    }

    /// Returns a borrowed view of the activation.
    pub fn view(&self) -> ActivationView<'_> {
        ActivationView {
            data: &self.data,
            grid_h: self.grid_h,
            grid_w: self.grid_w,
            num_anchors: self.num_anchors,
            channels: self.channels,
        }
    }

    /// Consumes the activation and returns its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}

fn check_batch(batch: usize) -> YoloResult<()> {
    if batch != 1 {
        return Err(YoloError::BatchNotSupported { batch });
    }
    Ok(())
}

fn check_anchor_axis(activation: usize, anchors: usize) -> YoloResult<()> {
    if activation != anchors {
        return Err(YoloError::AnchorMismatch {
            activation,
            anchors,
        });
    }
    Ok(())
}

fn required_len(
    grid_h: usize,
    grid_w: usize,
    num_anchors: usize,
    channels: usize,
) -> YoloResult<usize> {
    let invalid = YoloError::InvalidDimensions {
        grid_h,
        grid_w,
        num_anchors,
        channels,
    };
    if grid_h == 0 || grid_w == 0 || num_anchors == 0 || channels == 0 {
        return Err(invalid);
    }
    if channels < BOX_CHANNELS {
        return Err(YoloError::InvalidShape {
            shape: vec![grid_h, grid_w, num_anchors, channels],
            reason: "fewer than 5 channels per anchor",
        });
    }
    grid_h
        .checked_mul(grid_w)
        .and_then(|v| v.checked_mul(num_anchors))
        .and_then(|v| v.checked_mul(channels))
        .ok_or(invalid)
}
