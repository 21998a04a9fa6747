//! # Thermal-time engine
//!
//! Daily thermal quantities derived from the weather window, plus the
//! small numeric kernel shared by the estimation stages.
//!
//! ## Overview
//! -----------------
//! * [`day_temperature`] – weighted TMIN/TMAX blend approximating daytime
//!   canopy temperature.
//! * [`growing_degree_days`] – classic `(TMIN+TMAX)/2 − Tbase`, floored
//!   at zero, NaN-propagating.
//! * [`adjusted_thermal_day`] – fractional daily progress toward
//!   grain-fill completion, used for maturity timing (distinct from raw
//!   GDD).
//! * [`cumsum`], [`nanmax`], [`nanmin`], [`argmin_nearest`],
//!   [`normalize`] – cumulative-series helpers with explicit NaN
//!   semantics.
//!
//! ## NaN policy
//! -----------------
//! A missing daily value (NaN) must flow through as "value unavailable"
//! and never panic or silently clamp: `growing_degree_days` keeps the NaN
//! instead of flooring it, `cumsum` lets it poison the suffix, and the
//! reductions ignore NaN entries the way the rest of the pipeline expects
//! (max over the valid prefix of a poisoned cumulative sum).
use crate::constants::Celsius;

/// Daytime temperature as a weighted blend of the daily extremes.
///
/// `TDay_i = w·TMIN_i + (1−w)·TMAX_i`, elementwise. The weight is the
/// configured `tmin_weight` (0.25 puts three quarters of the weight on
/// TMAX).
///
/// Arguments
/// -----------------
/// * `tmin`, `tmax`: equal-length daily extreme series (°C).
/// * `tmin_weight`: weight of TMIN in the blend.
///
/// Return
/// ----------
/// * Daily day-temperature series; empty when the inputs disagree in
///   length (the caller treats an empty series as stage failure).
pub fn day_temperature(tmin: &[Celsius], tmax: &[Celsius], tmin_weight: f64) -> Vec<Celsius> {
    if tmin.len() != tmax.len() {
        return Vec::new();
    }
    tmin.iter()
        .zip(tmax.iter())
        .map(|(lo, hi)| tmin_weight * lo + (1.0 - tmin_weight) * hi)
        .collect()
}

/// Growing degree days for one day: `max(0, (TMIN+TMAX)/2 − Tbase)`.
///
/// A NaN in either extreme yields NaN, not zero: a missing observation
/// must read as "unavailable" downstream, never as "no growth".
#[inline]
pub fn gdd_day(tmin: Celsius, tmax: Celsius, base: Celsius) -> f64 {
    let mean = (tmin + tmax) / 2.0;
    if mean.is_nan() {
        f64::NAN
    } else {
        (mean - base).max(0.0)
    }
}

/// Growing degree days over a daily series.
///
/// Arguments
/// -----------------
/// * `tmin`, `tmax`: equal-length daily extreme series (°C).
/// * `base`: crop base temperature (°C).
///
/// Return
/// ----------
/// * Daily GDD series; empty on a length mismatch.
pub fn growing_degree_days(tmin: &[Celsius], tmax: &[Celsius], base: Celsius) -> Vec<f64> {
    if tmin.len() != tmax.len() {
        return Vec::new();
    }
    tmin.iter()
        .zip(tmax.iter())
        .map(|(lo, hi)| gdd_day(*lo, *hi, base))
        .collect()
}

/// Fractional daily progress toward grain-fill completion.
///
/// The temperature-dependent grain-fill duration in calendar days is
/// `scale·e^{rate·TAVG}`; one day at that temperature therefore advances
/// grain filling by `threshold / duration` adjusted days, capped at one
/// full day. With the calibrated coefficients (`rate < 0`) the progress
/// value lies in `(0, 1]` and increases with temperature, so warm sites
/// reach the configured adjusted-day total sooner.
///
/// Arguments
/// -----------------
/// * `tavg`: daily mean temperature series (°C).
/// * `threshold`: duration cap (adjusted days) of the calibration.
/// * `scale`, `rate`: duration-curve coefficients.
///
/// Return
/// ----------
/// * Daily progress series; NaN inputs propagate.
pub fn adjusted_thermal_day(tavg: &[Celsius], threshold: f64, scale: f64, rate: f64) -> Vec<f64> {
    tavg.iter()
        .map(|t| {
            let duration = scale * (rate * t).exp();
            let progress = threshold / duration;
            if progress.is_nan() {
                f64::NAN
            } else {
                progress.min(1.0)
            }
        })
        .collect()
}

/// Running sum of a series. NaN entries poison the suffix, matching the
/// "unavailable from here on" reading used by the threshold searches.
pub fn cumsum(series: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    series
        .iter()
        .map(|v| {
            total += v;
            total
        })
        .collect()
}

/// Maximum over the non-NaN entries; NaN when none exist.
pub fn nanmax(series: &[f64]) -> f64 {
    series
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, |acc, v| if acc.is_nan() || v > acc { v } else { acc })
}

/// Mean over the non-NaN entries; NaN when none exist.
pub fn nanmean(series: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in series.iter().copied().filter(|v| !v.is_nan()) {
        sum += v;
        n += 1;
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// Minimum over the non-NaN entries; NaN when none exist.
pub fn nanmin(series: &[f64]) -> f64 {
    series
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NAN, |acc, v| if acc.is_nan() || v < acc { v } else { acc })
}

/// Index of the entry nearest to `target` by absolute difference.
///
/// The first occurrence wins on exact ties (strict `<` while scanning),
/// which makes threshold-date selection deterministic. NaN entries are
/// skipped.
///
/// Return
/// ----------
/// * `Some(index)` of the nearest valid entry, `None` when the series is
///   empty or all-NaN.
pub fn argmin_nearest(series: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in series.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        let d = (v - target).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Round to a fixed number of decimal places, the convention used for
/// every reported aggregate (1 for temperatures, 3 for carbon fluxes…).
#[inline]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Min–max normalization of a cumulative series into `[0, 1]`.
///
/// `(g − min g)/(max g − min g)`, with NaN-ignoring extrema. A zero range
/// produces an all-NaN series: the caller must treat that period as
/// unavailable rather than guess a trajectory.
pub fn normalize(series: &[f64]) -> Vec<f64> {
    let lo = nanmin(series);
    let hi = nanmax(series);
    let range = hi - lo;
    series.iter().map(|v| (v - lo) / range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gdd_non_negative_and_zero_below_base() {
        for (lo, hi) in [(0.0, 10.0), (-8.0, 2.0), (-20.0, -4.0), (15.0, 30.0)] {
            let g = gdd_day(lo, hi, 5.0);
            assert!(g >= 0.0);
            if (lo + hi) / 2.0 <= 5.0 {
                assert_eq!(g, 0.0);
            }
        }
    }

    #[test]
    fn gdd_nan_propagates() {
        assert!(gdd_day(f64::NAN, 20.0, 0.0).is_nan());
        let series = growing_degree_days(&[10.0, f64::NAN], &[20.0, 25.0], 0.0);
        assert_eq!(series[0], 15.0);
        assert!(series[1].is_nan());
    }

    #[test]
    fn day_temperature_is_weighted_blend() {
        let t = day_temperature(&[10.0], &[30.0], 0.25);
        assert_relative_eq!(t[0], 25.0);
    }

    #[test]
    fn adjusted_day_bounded_and_monotone_in_temperature() {
        let series = adjusted_thermal_day(&[5.0, 10.0, 15.0, 20.0, 25.0, 30.0], 42.0, 150.0, -0.06);
        for w in series.windows(2) {
            assert!(w[0] > 0.0 && w[0] <= 1.0);
            assert!(w[1] >= w[0]);
        }
        // Hot days saturate at one full adjusted day.
        assert_relative_eq!(series[5], 1.0);
    }

    #[test]
    fn argmin_ties_prefer_lower_index() {
        // 170 and 190 are equally far from 180.
        let c = [100.0, 170.0, 190.0, 260.0];
        assert_eq!(argmin_nearest(&c, 180.0), Some(1));
    }

    #[test]
    fn argmin_skips_nan() {
        let c = [f64::NAN, 12.0, 30.0];
        assert_eq!(argmin_nearest(&c, 10.0), Some(1));
        assert_eq!(argmin_nearest(&[f64::NAN], 1.0), None);
        assert_eq!(argmin_nearest(&[], 1.0), None);
    }

    #[test]
    fn normalize_endpoints() {
        let g = [2.0, 5.0, 9.0, 20.0];
        let n = normalize(&g);
        assert_relative_eq!(n[0], 0.0);
        assert_relative_eq!(n[3], 1.0);
        assert!(n.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn normalize_zero_range_is_nan() {
        let n = normalize(&[3.0, 3.0, 3.0]);
        assert!(n.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn cumsum_poisons_suffix_after_nan() {
        let c = cumsum(&[1.0, f64::NAN, 2.0]);
        assert_eq!(c[0], 1.0);
        assert!(c[1].is_nan() && c[2].is_nan());
        // The valid prefix still carries the max.
        assert_eq!(nanmax(&c), 1.0);
    }
}
