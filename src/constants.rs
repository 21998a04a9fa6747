//! # Constants and type definitions
//!
//! This module centralizes the **calibrated literals** and **common type
//! aliases** used throughout the crate. Anything a user may legitimately
//! want to tune lives in [`ModelParams`](crate::params::ModelParams)
//! instead; the values below are calibration results, not tunables, and
//! changing any of them invalidates the regressions they were fitted
//! with.

// -------------------------------------------------------------------------------------------------
// Calibrated literals
// -------------------------------------------------------------------------------------------------

/// Slope of the empirical NDVI-at-heading recalibration from accumulated
/// vegetative GPP: `NDVI_head = GPP_NDVI_SLOPE * max(cGPP_EH) + GPP_NDVI_INTERCEPT`.
pub const GPP_NDVI_SLOPE: f64 = 0.00024355578828840187;

/// Intercept of the NDVI-at-heading recalibration.
pub const GPP_NDVI_INTERCEPT: f64 = 0.5755361655424565;

/// Lowest NDVI observed in the curve training data; floor of the
/// de-normalization that maps simulated curves back into NDVI units.
pub const NDVI_SERIES_MIN: f64 = 0.16;

/// Highest NDVI observed in the curve training data.
pub const NDVI_SERIES_MAX: f64 = 0.94;

/// Slope of the NDVI → iPAR line (Asrar 1984 / Campos 2018 family).
pub const NDVI_IPAR_SLOPE: f64 = 1.25;

/// Photosynthetically active fraction of total incoming solar radiation.
pub const PAR_FRACTION: f64 = 0.5;

/// Curvature of the photosynthesis reduction factor,
/// `PRFT = 1 - PRFT_CURVATURE * (TDay - TOpt)^2`.
pub const PRFT_CURVATURE: f64 = 0.0025;

/// Shape constant of the vegetative NDVI rise between its two
/// normalized-time thresholds; larger values steepen the early rise.
pub const NDVI_RISE_SHAPE: f64 = 4.5;

/// Length of the per-site weather window, in days after sowing. Estimation
/// needs weather well past any plausible maturity date.
pub const WINDOW_DAYS: u64 = 365;

// -------------------------------------------------------------------------------------------------
// Heading regressions: days to heading from daylength at the DAP mark
// -------------------------------------------------------------------------------------------------

// `(intercept, slope)` pairs of the piecewise daylength regressions,
// `days = intercept - slope * daylength_hours`. The short-day set applies
// below the regime boundary, the long-day set at or above it.

/// Main nursery set (ESWYT/IDYN/HTWYT), short-day regime.
pub const HEADING_MAIN_SHORT: (f64, f64) = (491.27, 38.62);
/// Main nursery set, long-day regime.
pub const HEADING_MAIN_LONG: (f64, f64) = (115.36, 3.87);
/// SAWYT set (earlier material), short-day regime.
pub const HEADING_SAWYT_SHORT: (f64, f64) = (617.68, 51.406);
/// SAWYT set, long-day regime.
pub const HEADING_SAWYT_LONG: (f64, f64) = (87.38, 2.36);

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Temperature in degrees Celsius.
pub type Celsius = f64;
/// Daylength in hours.
pub type Hours = f64;
/// Solar radiation in MJ m⁻² d⁻¹.
pub type MegajoulePerSquareMeter = f64;
/// Unique identifier of a trial plot.
pub type SiteId = u64;
/// Numeric identifier of a trial location.
pub type LocationId = u32;
