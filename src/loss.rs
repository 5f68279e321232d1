//! Squared-error helpers shared by the backends and the evaluator.
//!
//! Training minimizes `0.5 * sum((y - t)^2)` per sample, so the upstream
//! gradient is simply `y - t` (the FANN linear error function).

/// Sum of squared differences.
///
/// Shape contract: `pred.len() == target.len()`.
#[inline]
pub fn sum_squared_error(pred: &[f32], target: &[f32]) -> f32 {
    debug_assert_eq!(pred.len(), target.len());

    let mut sum_sq = 0.0_f32;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq = diff.mul_add(diff, sum_sq);
    }
    sum_sq
}

/// Sum of absolute differences.
#[inline]
pub fn sum_absolute_error(pred: &[f32], target: &[f32]) -> f32 {
    debug_assert_eq!(pred.len(), target.len());

    pred.iter().zip(target).map(|(&p, &t)| (p - t).abs()).sum()
}

/// Writes `d_pred = pred - target` and returns the sum of squared differences.
///
/// Shape contract:
/// - `pred.len() == target.len()`
/// - `pred.len() == d_pred.len()`
#[inline]
pub fn squared_error_backward(pred: &[f32], target: &[f32], d_pred: &mut [f32]) -> f32 {
    debug_assert_eq!(pred.len(), target.len());
    debug_assert_eq!(pred.len(), d_pred.len());

    let mut sum_sq = 0.0_f32;
    for i in 0..pred.len() {
        let diff = pred[i] - target[i];
        sum_sq = diff.mul_add(diff, sum_sq);
        d_pred[i] = diff;
    }
    sum_sq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_and_gradient() {
        let pred = [1.0_f32, -1.0];
        let target = [0.5_f32, 0.0];
        let mut d = [0.0_f32; 2];
        let sse = squared_error_backward(&pred, &target, &mut d);
        assert!((sse - 1.25).abs() < 1e-6);
        assert_eq!(d, [0.5, -1.0]);
        assert_eq!(sum_squared_error(&pred, &target), sse);
    }

    #[test]
    fn absolute_error() {
        assert!((sum_absolute_error(&[1.0, -1.0], &[0.5, 0.0]) - 1.5).abs() < 1e-6);
    }
}
