use yolopost::lowlevel::{best_class, decode, non_max_suppression};
use yolopost::{
    ActivationView, AnchorSet, CornerBox, DetectConfig, Detector, InferenceProvider,
    OwnedActivation, YoloError, COCO_CLASSES,
};

const CHANNELS: usize = 5 + 80;

/// Single 1x1 cell with one anchor whose first class dominates.
fn single_cell_activation() -> Vec<f32> {
    let mut data = vec![0.0f32; CHANNELS];
    data[4] = 10.0;
    data[5] = 10.0;
    data
}

fn single_anchor_config() -> DetectConfig {
    DetectConfig {
        anchors: AnchorSet::new(vec![(1.0, 1.0)]).unwrap(),
        class_prob_threshold: 0.1,
        ..DetectConfig::default()
    }
}

#[test]
fn single_cell_spans_full_image() {
    let data = single_cell_activation();
    let view = ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap();
    let detector = Detector::new(single_anchor_config()).unwrap();

    let detections = detector.detect(view).unwrap();
    assert_eq!(detections.len(), 1);

    let det = &detections[0];
    assert_eq!(det.class_name, COCO_CLASSES[0]);
    assert_eq!(det.class_index, 0);
    assert!(det.class_prob > 0.99, "class_prob {}", det.class_prob);
    assert!(det.class_prob <= 1.0);
    assert!(det.top.abs() < 1e-3);
    assert!(det.left.abs() < 1e-3);
    assert!((det.bottom - 416.0).abs() < 1e-3);
    assert!((det.right - 416.0).abs() < 1e-3);
}

#[test]
fn negative_objectness_yields_no_detections() {
    let grid = 3;
    let anchors = AnchorSet::default();
    let mut data = vec![0.0f32; grid * grid * anchors.len() * CHANNELS];
    for cell in data.chunks_exact_mut(CHANNELS) {
        cell[4] = -100.0;
        cell[5] = 25.0;
    }
    let view = ActivationView::new(&data, grid, grid, anchors.len(), CHANNELS).unwrap();
    let detections = Detector::default().detect(view).unwrap();
    assert!(detections.is_empty());
}

#[test]
fn final_threshold_drops_weak_survivors() {
    // objectness 0.5, uniform over 80 classes: score ~0.00625 after the filter
    let mut data = vec![0.0f32; CHANNELS];
    data[4] = 0.0;
    let view = ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap();
    let cfg = DetectConfig {
        filter_boxes_threshold: 0.001,
        ..single_anchor_config()
    };
    let detections = Detector::new(cfg).unwrap().detect(view).unwrap();
    assert!(detections.is_empty());
}

/// Best-class score of the single-cell activation, computed by the same stages
/// the detector runs.
fn single_cell_score() -> f32 {
    let data = single_cell_activation();
    let view = ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap();
    let decoded = decode(view, &AnchorSet::new(vec![(1.0, 1.0)]).unwrap()).unwrap();
    best_class(decoded.objectness()[0], decoded.class_probs(0).unwrap())
        .unwrap()
        .1
}

#[test]
fn final_threshold_keeps_score_on_the_boundary() {
    let score = single_cell_score();
    let data = single_cell_activation();
    let view = ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap();
    let cfg = DetectConfig {
        class_prob_threshold: score,
        ..single_anchor_config()
    };
    let detections = Detector::new(cfg).unwrap().detect(view).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_prob, score);
}

#[test]
fn filter_threshold_drops_score_on_the_boundary() {
    let score = single_cell_score();
    let data = single_cell_activation();
    let view = ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap();
    let cfg = DetectConfig {
        filter_boxes_threshold: score,
        class_prob_threshold: 0.0,
        ..single_anchor_config()
    };
    let detections = Detector::new(cfg).unwrap().detect(view).unwrap();
    assert!(detections.is_empty());
}

#[test]
fn overlapping_cells_keep_higher_score() {
    // 1x2 grid with very wide anchors so both predicted boxes cover the image.
    let mut data = vec![0.0f32; 2 * CHANNELS];
    data[4] = 3.0;
    data[5] = 10.0;
    data[CHANNELS + 4] = 6.0;
    data[CHANNELS + 5 + 2] = 10.0;
    let view = ActivationView::new(&data, 1, 2, 1, CHANNELS).unwrap();
    let cfg = DetectConfig {
        anchors: AnchorSet::new(vec![(8.0, 1.0)]).unwrap(),
        ..single_anchor_config()
    };
    let detections = Detector::new(cfg).unwrap().detect(view).unwrap();

    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_name, COCO_CLASSES[2]);
    assert_eq!(detections[0].left, 0.0);
    assert_eq!(detections[0].right, 416.0);
}

#[test]
fn two_overlapping_boxes_keep_best() {
    let boxes = [
        CornerBox::new(0.0, 0.0, 100.0, 100.0),
        CornerBox::new(0.0, 0.0, 100.0, 90.0),
    ];
    assert!((boxes[0].iou(&boxes[1]) - 0.9).abs() < 1e-6);
    let kept = non_max_suppression(&boxes, &[0.9, 0.8], 0.5);
    assert_eq!(kept.indices, vec![0]);
    assert_eq!(kept.scores, vec![0.9]);
}

#[test]
fn channel_mismatch_is_rejected() {
    let data = vec![0.0f32; 7];
    let view = ActivationView::new(&data, 1, 1, 1, 7).unwrap();
    let err = Detector::new(single_anchor_config())
        .unwrap()
        .detect(view)
        .unwrap_err();
    assert_eq!(
        err,
        YoloError::ChannelMismatch {
            channels: 7,
            expected: 85,
            num_classes: 80,
        }
    );
}

#[test]
fn anchor_mismatch_is_rejected() {
    let data = vec![0.0f32; 2 * CHANNELS];
    let view = ActivationView::new(&data, 1, 1, 2, CHANNELS).unwrap();
    let err = Detector::new(single_anchor_config())
        .unwrap()
        .detect(view)
        .unwrap_err();
    assert_eq!(
        err,
        YoloError::AnchorMismatch {
            activation: 2,
            anchors: 1,
        }
    );
}

#[test]
fn custom_class_table_labels_detections() {
    let mut data = vec![0.0f32; 7];
    data[4] = 10.0;
    data[6] = 10.0;
    let view = ActivationView::new(&data, 1, 1, 1, 7).unwrap();
    let cfg = DetectConfig {
        class_names: vec!["cat".to_string(), "dog".to_string()],
        ..single_anchor_config()
    };
    let detections = Detector::new(cfg).unwrap().detect(view).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].class_name, "dog");
}

struct FixedModel {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl InferenceProvider for FixedModel {
    type Input = ();
    type Error = YoloError;

    fn predict(&self, _input: &()) -> Result<OwnedActivation, YoloError> {
        OwnedActivation::from_shape(self.data.clone(), &self.shape, 1, CHANNELS)
    }
}

#[test]
fn run_accepts_batched_provider_output() {
    let model = FixedModel {
        shape: vec![1, 1, 1, CHANNELS],
        data: single_cell_activation(),
    };
    let detector = Detector::new(single_anchor_config()).unwrap();
    let via_provider = detector.run(&model, &()).unwrap();

    let data = single_cell_activation();
    let direct = detector
        .detect(ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap())
        .unwrap();
    assert_eq!(via_provider, direct);
}

#[test]
fn run_rejects_multi_image_batches() {
    let model = FixedModel {
        shape: vec![2, 1, 1, CHANNELS],
        data: [single_cell_activation(), single_cell_activation()].concat(),
    };
    let detector = Detector::new(single_anchor_config()).unwrap();
    let err = detector.run(&model, &()).unwrap_err();
    assert_eq!(
        err,
        YoloError::Inference("batch size 2 is not supported, expected 1".to_string())
    );
}

#[test]
fn free_function_matches_detector() {
    let data = single_cell_activation();
    let view = ActivationView::new(&data, 1, 1, 1, CHANNELS).unwrap();
    let cfg = single_anchor_config();
    let a = yolopost::detect(view, &cfg).unwrap();
    let b = Detector::new(cfg).unwrap().detect(view).unwrap();
    assert_eq!(a, b);
}
