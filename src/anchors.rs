//! Anchor box priors.

use crate::util::{YoloError, YoloResult};

/// Tiny-YOLO anchors in grid-cell units, one `(width, height)` pair per
/// predicted box slot.
pub const DEFAULT_ANCHORS: [(f32, f32); 5] = [
    (0.57273, 0.677385),
    (1.87446, 2.06253),
    (3.33843, 5.47434),
    (7.88282, 3.52778),
    (9.77052, 9.16828),
];

/// Ordered set of `(width, height)` box priors expressed in grid cells.
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorSet {
    sizes: Vec<(f32, f32)>,
}

impl AnchorSet {
    /// Creates an anchor set; every size must be finite and positive.
    pub fn new(sizes: Vec<(f32, f32)>) -> YoloResult<Self> {
        if sizes.is_empty() {
            return Err(YoloError::InvalidAnchors {
                reason: "anchor set is empty",
            });
        }
        for &(w, h) in &sizes {
            if !w.is_finite() || !h.is_finite() {
                return Err(YoloError::InvalidAnchors {
                    reason: "non-finite anchor size",
                });
            }
            if w <= 0.0 || h <= 0.0 {
                return Err(YoloError::InvalidAnchors {
                    reason: "anchor sizes must be > 0",
                });
            }
        }
        Ok(Self { sizes })
    }

    /// Creates an anchor set from a flat `[w0, h0, w1, h1, ...]` list.
    pub fn from_flat(values: &[f32]) -> YoloResult<Self> {
        if values.len() % 2 != 0 {
            return Err(YoloError::InvalidAnchors {
                reason: "flat anchor list must hold (width, height) pairs",
            });
        }
        Self::new(values.chunks_exact(2).map(|p| (p[0], p[1])).collect())
    }

    /// Returns the number of anchors.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns true if the set holds no anchors.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Returns the `(width, height)` of anchor `idx`.
    pub fn get(&self, idx: usize) -> Option<(f32, f32)> {
        self.sizes.get(idx).copied()
    }

    /// Returns all anchor sizes in order.
    pub fn as_slice(&self) -> &[(f32, f32)] {
        &self.sizes
    }

    /// Iterates over anchor sizes in order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.sizes.iter().copied()
    }
}

impl Default for AnchorSet {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_ANCHORS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AnchorSet, DEFAULT_ANCHORS};
    use crate::util::YoloError;

    #[test]
    fn default_holds_five_anchors() {
        let anchors = AnchorSet::default();
        assert_eq!(anchors.len(), 5);
        assert_eq!(anchors.get(4), Some(DEFAULT_ANCHORS[4]));
        assert!(anchors.get(5).is_none());
    }

    #[test]
    fn rejects_degenerate_sizes() {
        assert_eq!(
            AnchorSet::new(vec![]).unwrap_err(),
            YoloError::InvalidAnchors {
                reason: "anchor set is empty"
            }
        );
        assert!(AnchorSet::new(vec![(1.0, 0.0)]).is_err());
        assert!(AnchorSet::new(vec![(f32::NAN, 1.0)]).is_err());
    }

    #[test]
    fn from_flat_pairs_values() {
        let anchors = AnchorSet::from_flat(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(anchors.as_slice(), &[(1.0, 2.0), (3.0, 4.0)]);
        assert!(AnchorSet::from_flat(&[1.0, 2.0, 3.0]).is_err());
    }
}
