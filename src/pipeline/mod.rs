//! End-to-end detection pipeline.
//!
//! `Detector` runs decode, corner conversion, the coarse score filter, pixel
//! rescaling, NMS, the final class-probability threshold and clamping, in that
//! order. The two thresholds are independent: `filter_boxes_threshold` decides
//! which boxes take part in suppression, `class_prob_threshold` decides which
//! suppression survivors are reported.

use crate::anchors::AnchorSet;
use crate::boxes::to_corners;
use crate::candidate::filter::filter_boxes;
use crate::candidate::nms::non_max_suppression;
#[cfg(feature = "rayon")]
use crate::decode::rayon::decode_par;
use crate::decode::{decode, DecodedBoxes};
use crate::labels::coco_class_names;
use crate::tensor::{ActivationView, OwnedActivation, BOX_CHANNELS};
use crate::trace::{frame_span, trace_event};
use crate::util::{YoloError, YoloResult};

/// Default final per-detection acceptance threshold.
pub const DEFAULT_CLASS_PROB_THRESHOLD: f32 = 0.4;
/// Default NMS overlap threshold.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.4;
/// Default coarse pre-NMS threshold.
pub const DEFAULT_FILTER_BOXES_THRESHOLD: f32 = 0.01;
/// Default square network input resolution in pixels.
pub const DEFAULT_IMAGE_DIM: usize = 416;

/// Configuration for [`Detector`].
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Final acceptance threshold applied after NMS (inclusive).
    pub class_prob_threshold: f32,
    /// Boxes overlapping a kept box by more than this IoU are suppressed.
    pub iou_threshold: f32,
    /// Coarse threshold applied before NMS (exclusive).
    pub filter_boxes_threshold: f32,
    /// Class-index to label table; its length fixes the expected class count.
    pub class_names: Vec<String>,
    /// Box priors, one per predicted slot in each grid cell.
    pub anchors: AnchorSet,
    /// Square input resolution used to rescale and clamp boxes.
    pub image_dim: usize,
    /// Decode grid rows in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            class_prob_threshold: DEFAULT_CLASS_PROB_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            filter_boxes_threshold: DEFAULT_FILTER_BOXES_THRESHOLD,
            class_names: coco_class_names(),
            anchors: AnchorSet::default(),
            image_dim: DEFAULT_IMAGE_DIM,
            parallel: false,
        }
    }
}

impl DetectConfig {
    /// Checks that every field is usable.
    pub fn validate(&self) -> YoloResult<()> {
        let thresholds = [
            self.class_prob_threshold,
            self.iou_threshold,
            self.filter_boxes_threshold,
        ];
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(YoloError::InvalidConfig {
                reason: "thresholds must be finite",
            });
        }
        if thresholds.iter().any(|t| !(0.0..=1.0).contains(t)) {
            return Err(YoloError::InvalidConfig {
                reason: "thresholds must lie in [0, 1]",
            });
        }
        if self.class_names.is_empty() {
            return Err(YoloError::InvalidConfig {
                reason: "class_names must not be empty",
            });
        }
        if self.image_dim == 0 {
            return Err(YoloError::InvalidConfig {
                reason: "image_dim must be > 0",
            });
        }
        Ok(())
    }

    /// Channel count each anchor cell must carry for this class table.
    pub fn expected_channels(&self) -> usize {
        BOX_CHANNELS + self.class_names.len()
    }
}

/// One labeled box in pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub class_index: usize,
    pub class_prob: f32,
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

/// Source of raw activations, typically a wrapped neural-network runtime.
///
/// `predict` runs the forward pass for one input and returns the activation
/// with the batch dimension stripped.
pub trait InferenceProvider {
    type Input: ?Sized;
    type Error: std::fmt::Display;

    fn predict(&self, input: &Self::Input) -> Result<OwnedActivation, Self::Error>;
}

/// Reusable detector holding a validated configuration.
#[derive(Clone, Debug, Default)]
pub struct Detector {
    cfg: DetectConfig,
}

impl Detector {
    /// Creates a detector, validating `cfg`.
    pub fn new(cfg: DetectConfig) -> YoloResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Runs `provider` once on `input` and decodes its activation.
    pub fn run<P: InferenceProvider>(
        &self,
        provider: &P,
        input: &P::Input,
    ) -> YoloResult<Vec<Detection>> {
        let activation = provider
            .predict(input)
            .map_err(|err| YoloError::Inference(err.to_string()))?;
        self.detect(activation.view())
    }

    /// Turns one frame of raw activation into detections.
    ///
    /// Returns an empty vector when nothing clears `filter_boxes_threshold`.
    pub fn detect(&self, activation: ActivationView<'_>) -> YoloResult<Vec<Detection>> {
        let cfg = &self.cfg;
        let _span = frame_span(activation).entered();

        let expected = cfg.expected_channels();
        if activation.channels() != expected {
            return Err(YoloError::ChannelMismatch {
                channels: activation.channels(),
                expected,
                num_classes: cfg.class_names.len(),
            });
        }

        let decoded = self.decode(activation)?;
        let corners = to_corners(&decoded);
        let Some(candidates) = filter_boxes(&corners, &decoded, cfg.filter_boxes_threshold) else {
            return Ok(Vec::new());
        };
        drop(corners);
        drop(decoded);

        let dim = cfg.image_dim as f32;
        let boxes: Vec<_> = candidates.iter().map(|c| c.bbox.scale(dim, dim)).collect();
        let scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();
        let kept = non_max_suppression(&boxes, &scores, cfg.iou_threshold);

        let mut detections = Vec::with_capacity(kept.len());
        for ((&idx, bbox), &score) in kept.indices.iter().zip(&kept.boxes).zip(&kept.scores) {
            if score < cfg.class_prob_threshold {
                continue;
            }
            let class_index = candidates[idx].class_index;
            let class_name = cfg.class_names.get(class_index).ok_or(
                YoloError::ClassIndexOutOfBounds {
                    index: class_index,
                    len: cfg.class_names.len(),
                },
            )?;
            let clamped = bbox.clamp(dim, dim);
            detections.push(Detection {
                class_name: class_name.clone(),
                class_index,
                class_prob: score,
                top: clamped.top,
                left: clamped.left,
                bottom: clamped.bottom,
                right: clamped.right,
            });
        }

        trace_event!("detections", count = detections.len());
        Ok(detections)
    }

    #[cfg(feature = "rayon")]
    fn decode(&self, activation: ActivationView<'_>) -> YoloResult<DecodedBoxes> {
        if self.cfg.parallel {
            decode_par(activation, &self.cfg.anchors)
        } else {
            decode(activation, &self.cfg.anchors)
        }
    }

    #[cfg(not(feature = "rayon"))]
    fn decode(&self, activation: ActivationView<'_>) -> YoloResult<DecodedBoxes> {
        decode(activation, &self.cfg.anchors)
    }
}

/// One-shot detection with `cfg`.
pub fn detect(activation: ActivationView<'_>, cfg: &DetectConfig) -> YoloResult<Vec<Detection>> {
    Detector::new(cfg.clone())?.detect(activation)
}

#[cfg(test)]
mod tests {
    use super::{DetectConfig, Detector, InferenceProvider};
    use crate::anchors::AnchorSet;
    use crate::tensor::OwnedActivation;
    use crate::util::YoloError;

    #[test]
    fn default_config_is_valid() {
        let cfg = DetectConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.class_names.len(), 80);
        assert_eq!(cfg.anchors.len(), 5);
        assert_eq!(cfg.image_dim, 416);
        assert_eq!(cfg.expected_channels(), 85);
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let bad = [
            DetectConfig {
                iou_threshold: f32::NAN,
                ..DetectConfig::default()
            },
            DetectConfig {
                class_prob_threshold: 1.5,
                ..DetectConfig::default()
            },
            DetectConfig {
                class_names: Vec::new(),
                ..DetectConfig::default()
            },
            DetectConfig {
                image_dim: 0,
                ..DetectConfig::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(
                cfg.validate(),
                Err(YoloError::InvalidConfig { .. })
            ));
        }
    }

    struct FailingModel;

    impl InferenceProvider for FailingModel {
        type Input = [f32];
        type Error = String;

        fn predict(&self, _input: &[f32]) -> Result<OwnedActivation, String> {
            Err("device lost".to_string())
        }
    }

    #[test]
    fn provider_errors_surface_as_inference() {
        let detector = Detector::new(DetectConfig {
            class_names: vec!["a".to_string()],
            anchors: AnchorSet::new(vec![(1.0, 1.0)]).unwrap(),
            ..DetectConfig::default()
        })
        .unwrap();
        let err = detector.run(&FailingModel, &[0.0][..]).unwrap_err();
        assert_eq!(err, YoloError::Inference("device lost".to_string()));
    }
}
