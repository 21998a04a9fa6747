//! Light interception (iPAR) and the temperature reduction factor.
//!
//! The fraction of photosynthetically active radiation a wheat canopy
//! intercepts tracks its greenness linearly: `iPAR = 1.25·NDVI − offset`
//! (Asrar 1984; Campos 2018 recalibrated the offset for wheat). The
//! fraction is clamped into the configured bounds — a senescent canopy
//! intercepts nothing, a closed one cannot top 100 %.
//!
//! `PRFT = 1 − 0.0025·(TDay − TOpt)²` is reproduced literally: it may go
//! negative under extreme day temperatures and callers must **not**
//! clamp it, because the calibration relies on the raw parabola.
use crate::constants::{NDVI_IPAR_SLOPE, PRFT_CURVATURE};

/// Photosynthesis reduction factor for one day temperature.
///
/// Exactly `1 − 0.0025·(TDay − TOpt)²`: symmetric around the optimum,
/// equal to 1 there, unbounded below.
#[inline]
pub fn prft_at(tday: f64, topt: f64) -> f64 {
    1.0 - PRFT_CURVATURE * (tday - topt) * (tday - topt)
}

/// PRFT over a day-temperature series.
pub fn prft(tday: &[f64], topt: f64) -> Vec<f64> {
    tday.iter().map(|&t| prft_at(t, topt)).collect()
}

/// NDVI → intercepted PAR fraction, unclamped.
#[inline]
pub fn ndvi_to_ipar(ndvi: f64, offset: f64) -> f64 {
    NDVI_IPAR_SLOPE * ndvi - offset
}

/// Clamp an iPAR fraction into the configured bounds.
#[inline]
pub fn clamp_ipar(ipar: f64, bounds: (f64, f64)) -> f64 {
    if ipar.is_nan() {
        return f64::NAN;
    }
    ipar.clamp(bounds.0, bounds.1)
}

/// Stitch a vegetative series to a grain-fill series, dropping the
/// duplicated heading-day value at the junction.
pub fn concat_season(vegetative: &[f64], grainfill: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(vegetative.len() + grainfill.len().saturating_sub(1));
    out.extend_from_slice(vegetative);
    if grainfill.len() > 1 {
        out.extend_from_slice(&grainfill[1..]);
    }
    out
}

/// The iPAR decomposition of one season variant.
#[derive(Debug, Clone, Default)]
pub struct IparSeries {
    /// Simulated NDVI over the whole season (vegetative ∥ grain fill).
    pub ndvi: Vec<f64>,
    /// iPAR over the whole season.
    pub season: Vec<f64>,
    /// iPAR over the vegetative segment only.
    pub vegetative: Vec<f64>,
    /// iPAR over the grain-fill segment only.
    pub grainfill: Vec<f64>,
}

/// Total light interception for one vegetative/grain-fill pairing.
///
/// Arguments
/// -----------------
/// * `sim_ndvi_vegetative`: simulated NDVI from emergence to heading.
/// * `sim_ndvi_grainfill`: simulated NDVI from heading to maturity.
/// * `offset`: intercept of the NDVI → iPAR line.
/// * `bounds`: clamp bounds for the iPAR fraction.
///
/// Return
/// ----------
/// * [`IparSeries`] with the concatenated NDVI, the season iPAR and both
///   segment series. The duplicated heading-day sample is dropped from
///   the grain-fill side of the concatenations.
pub fn estimate_ipar(
    sim_ndvi_vegetative: &[f64],
    sim_ndvi_grainfill: &[f64],
    offset: f64,
    bounds: (f64, f64),
) -> IparSeries {
    let vegetative: Vec<f64> = sim_ndvi_vegetative
        .iter()
        .map(|&v| clamp_ipar(ndvi_to_ipar(v, offset), bounds))
        .collect();
    let grainfill: Vec<f64> = sim_ndvi_grainfill
        .iter()
        .map(|&v| clamp_ipar(ndvi_to_ipar(v, offset), bounds))
        .collect();

    IparSeries {
        ndvi: concat_season(sim_ndvi_vegetative, sim_ndvi_grainfill),
        season: concat_season(&vegetative, &grainfill),
        vegetative,
        grainfill,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn prft_is_one_at_optimum_and_symmetric() {
        assert_eq!(prft_at(18.0, 18.0), 1.0);
        for d in [0.5, 3.0, 7.5, 20.0] {
            assert_relative_eq!(prft_at(18.0 + d, 18.0), prft_at(18.0 - d, 18.0));
        }
    }

    #[test]
    fn prft_goes_negative_uncapped() {
        // 1 - 0.0025 * 25^2 = -0.5625; the literal formula is preserved.
        assert_relative_eq!(prft_at(43.0, 18.0), -0.5625);
    }

    #[test]
    fn ipar_line_and_clamp() {
        assert_relative_eq!(ndvi_to_ipar(0.8, 0.19), 0.81);
        // A bare canopy would regress negative; the clamp floors it.
        assert_eq!(clamp_ipar(ndvi_to_ipar(0.1, 0.19), (0.0, 1.0)), 0.0);
        assert_eq!(clamp_ipar(2.0, (0.0, 1.0)), 1.0);
        assert!(clamp_ipar(f64::NAN, (0.0, 1.0)).is_nan());
    }

    #[test]
    fn season_concat_drops_duplicate_heading_sample() {
        let veg = [0.2, 0.5, 0.9];
        let gf = [0.9, 0.6, 0.3];
        assert_eq!(concat_season(&veg, &gf), vec![0.2, 0.5, 0.9, 0.6, 0.3]);
        assert_eq!(concat_season(&veg, &[0.9]), vec![0.2, 0.5, 0.9]);
        assert_eq!(concat_season(&[], &gf), vec![0.6, 0.3]);
    }

    #[test]
    fn estimate_ipar_shapes() {
        let veg = [0.2, 0.6, 0.95];
        let gf = [0.95, 0.5, 0.0];
        let out = estimate_ipar(&veg, &gf, 0.19, (0.0, 1.0));
        assert_eq!(out.ndvi.len(), 5);
        assert_eq!(out.season.len(), 5);
        assert_eq!(out.vegetative.len(), 3);
        assert_eq!(out.grainfill.len(), 3);
        // Junction value appears once.
        assert_relative_eq!(out.season[2], clamp_ipar(ndvi_to_ipar(0.95, 0.19), (0.0, 1.0)));
        assert_relative_eq!(out.season[3], clamp_ipar(ndvi_to_ipar(0.5, 0.19), (0.0, 1.0)));
    }
}
