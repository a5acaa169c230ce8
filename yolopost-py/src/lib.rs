//! Python bindings for yolopost.
//!
//! Exposes the detector to Python via PyO3, taking activations as numpy
//! `float32` arrays.

use numpy::{PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use yolopost::{
    ActivationView, AnchorSet, DetectConfig as RustDetectConfig, Detection as RustDetection,
    Detector as RustDetector, YoloError,
};

/// Convert a YoloError to a Python exception.
fn to_py_err(err: YoloError) -> PyErr {
    match err {
        YoloError::Inference(_) => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Labeled box in pixel coordinates.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    #[pyo3(get)]
    pub class_name: String,
    #[pyo3(get)]
    pub class_index: usize,
    /// Objectness times class probability.
    #[pyo3(get)]
    pub class_prob: f32,
    #[pyo3(get)]
    pub top: f32,
    #[pyo3(get)]
    pub left: f32,
    #[pyo3(get)]
    pub bottom: f32,
    #[pyo3(get)]
    pub right: f32,
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        format!(
            "Detection(class_name='{}', class_prob={:.4}, top={:.1}, left={:.1}, bottom={:.1}, right={:.1})",
            self.class_name, self.class_prob, self.top, self.left, self.bottom, self.right
        )
    }
}

impl From<RustDetection> for Detection {
    fn from(d: RustDetection) -> Self {
        Self {
            class_name: d.class_name,
            class_index: d.class_index,
            class_prob: d.class_prob,
            top: d.top,
            left: d.left,
            bottom: d.bottom,
            right: d.right,
        }
    }
}

/// Configuration for the detection pipeline.
#[pyclass]
#[derive(Clone)]
pub struct DetectConfig {
    inner: RustDetectConfig,
}

#[pymethods]
impl DetectConfig {
    /// Create a new DetectConfig.
    ///
    /// Args:
    ///     class_prob_threshold: Final acceptance threshold (default: 0.4)
    ///     iou_threshold: NMS overlap threshold (default: 0.4)
    ///     filter_boxes_threshold: Coarse pre-NMS threshold (default: 0.01)
    ///     class_names: Class label list (default: 80 COCO labels)
    ///     anchors: List of (width, height) priors in grid cells (default: tiny-YOLO anchors)
    ///     image_dim: Square input resolution in pixels (default: 416)
    ///     parallel: Decode grid rows in parallel (default: False)
    #[new]
    #[pyo3(signature = (
        class_prob_threshold = 0.4,
        iou_threshold = 0.4,
        filter_boxes_threshold = 0.01,
        class_names = None,
        anchors = None,
        image_dim = 416,
        parallel = false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        class_prob_threshold: f32,
        iou_threshold: f32,
        filter_boxes_threshold: f32,
        class_names: Option<Vec<String>>,
        anchors: Option<Vec<(f32, f32)>>,
        image_dim: usize,
        parallel: bool,
    ) -> PyResult<Self> {
        let defaults = RustDetectConfig::default();
        let anchors = match anchors {
            Some(sizes) => AnchorSet::new(sizes).map_err(to_py_err)?,
            None => defaults.anchors,
        };
        let inner = RustDetectConfig {
            class_prob_threshold,
            iou_threshold,
            filter_boxes_threshold,
            class_names: class_names.unwrap_or(defaults.class_names),
            anchors,
            image_dim,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Number of classes the detector expects.
    #[getter]
    fn num_classes(&self) -> usize {
        self.inner.class_names.len()
    }

    /// Number of anchors per grid cell.
    #[getter]
    fn num_anchors(&self) -> usize {
        self.inner.anchors.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "DetectConfig(class_prob_threshold={}, iou_threshold={}, filter_boxes_threshold={}, num_classes={}, num_anchors={}, image_dim={})",
            self.inner.class_prob_threshold,
            self.inner.iou_threshold,
            self.inner.filter_boxes_threshold,
            self.inner.class_names.len(),
            self.inner.anchors.len(),
            self.inner.image_dim
        )
    }
}

/// Reusable detector for per-frame post-processing.
#[pyclass]
pub struct Detector {
    inner: RustDetector,
}

#[pymethods]
impl Detector {
    /// Create a detector.
    ///
    /// Args:
    ///     config: DetectConfig (default: DetectConfig())
    #[new]
    #[pyo3(signature = (config = None))]
    fn new(config: Option<DetectConfig>) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let inner = RustDetector::new(cfg).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Decode one frame of raw detector output.
    ///
    /// Args:
    ///     activation: C-contiguous float32 array shaped (H, W, A, 5+C),
    ///         (H, W, A*(5+C)), (1, H, W, A*(5+C)) or (1, H, W, A, 5+C).
    ///         With a single anchor a 4D array reads as batched.
    ///
    /// Returns:
    ///     List of Detection objects, best score first
    fn detect(&self, activation: PyReadonlyArrayDyn<'_, f32>) -> PyResult<Vec<Detection>> {
        detect_array(&self.inner, &activation)
    }

    fn __repr__(&self) -> String {
        let cfg = self.inner.config();
        format!(
            "Detector(num_classes={}, num_anchors={}, image_dim={})",
            cfg.class_names.len(),
            cfg.anchors.len(),
            cfg.image_dim
        )
    }
}

/// Convenience function running the pipeline on one activation.
///
/// For repeated frames, build a Detector once and call detect() on it.
///
/// Args:
///     activation: float32 array, see Detector.detect
///     class_prob_threshold: Final acceptance threshold (default: 0.4)
///     iou_threshold: NMS overlap threshold (default: 0.4)
///     filter_boxes_threshold: Coarse pre-NMS threshold (default: 0.01)
///     class_names: Class label list (default: 80 COCO labels)
///     anchors: List of (width, height) priors in grid cells (default: tiny-YOLO anchors)
///     image_dim: Square input resolution in pixels (default: 416)
#[pyfunction]
#[pyo3(signature = (
    activation,
    class_prob_threshold = 0.4,
    iou_threshold = 0.4,
    filter_boxes_threshold = 0.01,
    class_names = None,
    anchors = None,
    image_dim = 416
))]
fn detect(
    activation: PyReadonlyArrayDyn<'_, f32>,
    class_prob_threshold: f32,
    iou_threshold: f32,
    filter_boxes_threshold: f32,
    class_names: Option<Vec<String>>,
    anchors: Option<Vec<(f32, f32)>>,
    image_dim: usize,
) -> PyResult<Vec<Detection>> {
    let cfg = DetectConfig::new(
        class_prob_threshold,
        iou_threshold,
        filter_boxes_threshold,
        class_names,
        anchors,
        image_dim,
        false,
    )?;
    let detector = RustDetector::new(cfg.inner).map_err(to_py_err)?;
    detect_array(&detector, &activation)
}

fn detect_array(
    detector: &RustDetector,
    activation: &PyReadonlyArrayDyn<'_, f32>,
) -> PyResult<Vec<Detection>> {
    let cfg = detector.config();
    let view = ActivationView::from_shape(
        activation.as_slice()?,
        activation.shape(),
        cfg.anchors.len(),
        cfg.expected_channels(),
    )
    .map_err(to_py_err)?;
    let detections = detector.detect(view).map_err(to_py_err)?;
    Ok(detections.into_iter().map(Detection::from).collect())
}

/// Python module for yolopost.
#[pymodule]
fn _yolopost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<DetectConfig>()?;
    m.add_class::<Detector>()?;
    m.add_function(wrap_pyfunction!(detect, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
