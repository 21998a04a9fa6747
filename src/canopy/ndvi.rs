//! Simulated NDVI trajectories over normalized thermal time.
//!
//! Two regimes, matching how a wheat canopy actually greens up and dies
//! off:
//!
//! * **Vegetative (emergence → heading)** — flat at the bare-soil level,
//!   then a saturating exponential rise, then a plateau near the maximum.
//!   Non-decreasing by construction.
//! * **Grain fill (heading → maturity)** — decay from the NDVI reached at
//!   heading toward senescence, slow at first and accelerating, reaching
//!   the senescent baseline at full normalized time.
//!
//! Inputs are normalized thermal time in `[0, 1]`; NaN inputs (from a
//! degenerate normalization) propagate to NaN outputs.
use crate::constants::NDVI_RISE_SHAPE;

/// Vegetative NDVI at one normalized-time point.
///
/// * `t <= lower`: the curve holds at `lower` (bare-soil greenness).
/// * `lower < t < upper`: saturating exponential rise, continuous at both
///   ends.
/// * `t >= upper`: plateau at `ndvi_max`.
#[inline]
pub fn ndvi_vegetative_at(t: f64, lower: f64, upper: f64, ndvi_max: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    if t <= lower {
        return lower;
    }
    if t >= upper {
        return ndvi_max;
    }
    let s = (t - lower) / (upper - lower);
    let rise = (1.0 - (-NDVI_RISE_SHAPE * s).exp()) / (1.0 - (-NDVI_RISE_SHAPE).exp());
    lower + (ndvi_max - lower) * rise
}

/// Vegetative NDVI curve over a normalized thermal-time series.
///
/// Arguments
/// -----------------
/// * `norm_tt`: normalized thermal time from emergence to heading.
/// * `lower`: normalized-time threshold below which the curve is flat
///   (also the held minimum NDVI value).
/// * `upper`: normalized-time threshold of the plateau.
/// * `ndvi_max`: plateau NDVI.
///
/// Return
/// ----------
/// * Simulated NDVI series, same length as `norm_tt`; the last value is
///   the NDVI at heading.
pub fn ndvi_vegetative(norm_tt: &[f64], lower: f64, upper: f64, ndvi_max: f64) -> Vec<f64> {
    norm_tt
        .iter()
        .map(|&t| ndvi_vegetative_at(t, lower, upper, ndvi_max))
        .collect()
}

/// Grain-fill NDVI decay from the heading anchor.
///
/// `v(t) = anchor · (1 − t²)` — equals the anchor at `t = 0`, declines
/// slowly through early grain fill, and hits the senescent baseline at
/// `t = 1`. The anchor is whatever NDVI the vegetative curve (or its
/// GPP-based recalibration) reached at heading, not a fixed global
/// maximum.
pub fn ndvi_grainfill(norm_tt: &[f64], anchor: f64) -> Vec<f64> {
    norm_tt
        .iter()
        .map(|&t| if t.is_nan() { f64::NAN } else { anchor * (1.0 - t * t) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const LOWER: f64 = 0.2;
    const UPPER: f64 = 0.8;
    const MAX: f64 = 0.95;

    #[test]
    fn vegetative_holds_flat_below_lower_threshold() {
        assert_eq!(ndvi_vegetative_at(0.0, LOWER, UPPER, MAX), LOWER);
        assert_eq!(ndvi_vegetative_at(0.19, LOWER, UPPER, MAX), LOWER);
    }

    #[test]
    fn vegetative_plateaus_at_max() {
        assert_eq!(ndvi_vegetative_at(0.8, LOWER, UPPER, MAX), MAX);
        assert_eq!(ndvi_vegetative_at(1.0, LOWER, UPPER, MAX), MAX);
    }

    #[test]
    fn vegetative_is_continuous_at_both_thresholds() {
        let eps = 1e-9;
        assert_relative_eq!(
            ndvi_vegetative_at(LOWER + eps, LOWER, UPPER, MAX),
            LOWER,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            ndvi_vegetative_at(UPPER - eps, LOWER, UPPER, MAX),
            MAX,
            epsilon = 1e-6
        );
    }

    #[test]
    fn vegetative_is_non_decreasing() {
        let grid: Vec<f64> = (0..=1000).map(|i| i as f64 / 1000.0).collect();
        let curve = ndvi_vegetative(&grid, LOWER, UPPER, MAX);
        for w in curve.windows(2) {
            assert!(w[1] >= w[0] - 1e-12, "curve decreased: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn grainfill_starts_at_anchor_and_dies_to_zero() {
        let curve = ndvi_grainfill(&[0.0, 0.5, 1.0], 0.72);
        assert_relative_eq!(curve[0], 0.72);
        assert_relative_eq!(curve[1], 0.72 * 0.75);
        assert_relative_eq!(curve[2], 0.0);
    }

    #[test]
    fn nan_time_propagates() {
        assert!(ndvi_vegetative_at(f64::NAN, LOWER, UPPER, MAX).is_nan());
        assert!(ndvi_grainfill(&[f64::NAN], 0.9)[0].is_nan());
    }
}
