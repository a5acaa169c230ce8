//! Feature-gated tracing macros.
//!
//! With the `tracing` feature enabled these forward to the `tracing` crate.
//! Without it they expand to nothing, so per-frame decoding pays no cost.

/// Opens a debug-level span around one pipeline stage.
#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::debug_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::NoopSpan
    };
}

/// Records stage counters (candidates kept, boxes suppressed and so on).
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
    ($name:expr) => {
        tracing::debug!(name: $name)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
    ($name:expr) => {};
}

pub(crate) use trace_event;
pub(crate) use trace_span;

use crate::tensor::ActivationView;

/// Span covering one frame, tagged with the head geometry.
#[cfg(feature = "tracing")]
pub(crate) fn frame_span(activation: ActivationView<'_>) -> tracing::Span {
    tracing::debug_span!(
        "detect",
        grid_h = activation.grid_h(),
        grid_w = activation.grid_w(),
        anchors = activation.num_anchors(),
        classes = activation.num_classes()
    )
}

#[cfg(not(feature = "tracing"))]
pub(crate) fn frame_span(_activation: ActivationView<'_>) -> NoopSpan {
    NoopSpan
}

/// Stand-in guard so `trace_span!(..).entered()` works without the feature.
#[cfg(not(feature = "tracing"))]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
