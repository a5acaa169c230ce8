//! Numeric helpers for activation decoding.

/// Logistic sigmoid.
#[inline]
pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Writes the softmax of `logits` into `out`.
///
/// The maximum logit is subtracted before exponentiating so large logits do
/// not overflow.
pub(crate) fn softmax_into(logits: &[f32], out: &mut [f32]) {
    debug_assert_eq!(logits.len(), out.len());
    if logits.is_empty() {
        return;
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for (dst, &logit) in out.iter_mut().zip(logits) {
        let e = (logit - max).exp();
        *dst = e;
        sum += e;
    }
    for dst in out.iter_mut() {
        *dst /= sum;
    }
}
