#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolopost::lowlevel::{decode, decode_par};
use yolopost::{ActivationView, AnchorSet, DetectConfig, Detector};

fn make_activation(grid_h: usize, grid_w: usize, anchors: usize, channels: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(17);
    (0..grid_h * grid_w * anchors * channels)
        .map(|_| rng.random_range(-5.0..5.0))
        .collect()
}

#[test]
fn parallel_decode_matches_sequential() {
    let anchors = AnchorSet::default();
    let data = make_activation(13, 11, anchors.len(), 25);
    let view = ActivationView::new(&data, 13, 11, anchors.len(), 25).unwrap();

    let seq = decode(view, &anchors).unwrap();
    let par = decode_par(view, &anchors).unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_detector_matches_sequential() {
    let anchors = AnchorSet::default();
    let data = make_activation(13, 13, anchors.len(), 85);
    let view = ActivationView::new(&data, 13, 13, anchors.len(), 85).unwrap();

    let base = DetectConfig {
        class_prob_threshold: 0.05,
        ..DetectConfig::default()
    };
    let seq = Detector::new(DetectConfig {
        parallel: false,
        ..base.clone()
    })
    .unwrap();
    let par = Detector::new(DetectConfig {
        parallel: true,
        ..base
    })
    .unwrap();

    assert_eq!(seq.detect(view).unwrap(), par.detect(view).unwrap());
}
