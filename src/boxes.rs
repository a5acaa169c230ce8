//! Axis-aligned corner boxes.

use crate::decode::DecodedBoxes;

/// Box in `(top, left, bottom, right)` form.
///
/// Coordinates are normalized to the image until the pipeline rescales them to
/// pixels. A well-formed box has `top <= bottom` and `left <= right`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CornerBox {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl CornerBox {
    /// Creates a box from its corners.
    pub fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Creates a box from a center `(x, y)` and size `(w, h)`.
    #[inline]
    pub fn from_center_size(center_xy: [f32; 2], size_wh: [f32; 2]) -> Self {
        let [cx, cy] = center_xy;
        let [half_w, half_h] = [size_wh[0] / 2.0, size_wh[1] / 2.0];
        Self {
            top: cy - half_h,
            left: cx - half_w,
            bottom: cy + half_h,
            right: cx + half_w,
        }
    }

    /// Box height (`bottom - top`).
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Box width (`right - left`).
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Box area.
    pub fn area(&self) -> f32 {
        self.height() * self.width()
    }

    /// Scales vertical coordinates by `height` and horizontal ones by `width`.
    pub fn scale(&self, height: f32, width: f32) -> Self {
        Self {
            top: self.top * height,
            left: self.left * width,
            bottom: self.bottom * height,
            right: self.right * width,
        }
    }

    /// Clamps the box to `[0, height] x [0, width]`.
    ///
    /// Only the outer edges move: `top` and `left` are raised to 0, `bottom`
    /// and `right` are capped at the image size.
    pub fn clamp(&self, height: f32, width: f32) -> Self {
        Self {
            top: self.top.max(0.0),
            left: self.left.max(0.0),
            bottom: self.bottom.min(height),
            right: self.right.min(width),
        }
    }

    /// Intersection-over-union with `other`; 0 when the union is empty.
    pub fn iou(&self, other: &CornerBox) -> f32 {
        let inter_h = (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0);
        let inter_w = (self.right.min(other.right) - self.left.max(other.left)).max(0.0);
        let intersection = inter_h * inter_w;
        let union = self.area() + other.area() - intersection;
        if union == 0.0 {
            return 0.0;
        }
        intersection / union
    }
}

/// Converts every decoded center/size pair into a corner box.
pub fn to_corners(decoded: &DecodedBoxes) -> Vec<CornerBox> {
    decoded
        .center_xy()
        .iter()
        .zip(decoded.size_wh())
        .map(|(&center, &size)| CornerBox::from_center_size(center, size))
        .collect()
}
