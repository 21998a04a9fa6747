//! # Model parameters
//!
//! This module defines the [`ModelParams`] configuration struct and its
//! builder, which centralize every tunable constant of the phenology and
//! light-use-efficiency pipeline: the thermal-time settings, the daylength
//! regression regime boundary, the adjusted-thermal-day coefficients for
//! maturity timing, the NDVI curve thresholds, and the radiation-use and
//! yield conversion factors.
//!
//! ## Purpose
//!
//! [`ModelParams`] is passed **by reference** into every component call;
//! there is no global parameter object. When a stage accepts an explicit
//! override (e.g. a custom GDD base for one experiment), the layered
//! resolution order *explicit argument → configured value* is made
//! explicit by [`resolve`] instead of scattered conditionals.
//!
//! ## Example
//!
//! ```rust
//! use iparyield::params::ModelParams;
//!
//! let params = ModelParams::builder()
//!     .gdd_required_to_emergence(160.0)
//!     .rue(2.8)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.days_after_planting, 35);
//! ```
//!
//! ## See also
//! ------------
//! * [`crate::constants`] – calibrated literals that are *not* tunable.
//! * [`crate::model::YieldModel`] – owns a `ModelParams` next to the weather table.
use std::fmt;

use crate::constants::Hours;
use crate::errors::YieldModelError;

/// Resolve a layered parameter: an explicit per-call override wins over
/// the configured value.
///
/// Arguments
/// -----------------
/// * `explicit`: Optional caller-supplied override.
/// * `configured`: Value from the active [`ModelParams`].
///
/// Return
/// ----------
/// * The effective parameter value.
#[inline]
pub fn resolve(explicit: Option<f64>, configured: f64) -> f64 {
    explicit.unwrap_or(configured)
}

/// Tunable parameters of the phenology and yield pipeline.
///
/// Fields
/// -----------------
/// **Thermal time**
/// * `tmin_weight` – weight of TMIN in the day-temperature blend
///   (`TDay = w·TMIN + (1-w)·TMAX`).
/// * `gdd_base_temperature` – crop base temperature for GDD (°C).
/// * `optimum_temperature` – PRFT optimum day temperature (°C).
///
/// **Phenology estimation**
/// * `gdd_required_to_emergence` – cumulative GDD at which emergence is
///   declared.
/// * `days_after_planting` – DAP mark at which daylength is read for the
///   heading regression.
/// * `daylength_regime_boundary` – daylength (h) separating the short-day
///   and long-day regression sets; the long-day set applies on `>=`.
/// * `daylength_coefficient` – twilight coefficient of the daylength
///   formula (0 = sunrise/sunset at zero elevation).
/// * `tadj_threshold`, `tadj_scale`, `tadj_rate` – adjusted-thermal-day
///   coefficients driving grain-fill progress.
/// * `days_grain_filling` – adjusted-day total from heading to maturity.
///
/// **Canopy / NDVI**
/// * `ndvi_lower_threshold` – normalized time below which the vegetative
///   curve stays flat at its minimum.
/// * `ndvi_upper_threshold` – normalized time at which the vegetative
///   curve reaches its plateau.
/// * `ndvi_max` – plateau NDVI of the vegetative curve.
/// * `ndvi_ipar_offset` – intercept of the NDVI → iPAR line.
/// * `ipar_bounds` – clamp bounds applied to the iPAR fraction.
///
/// **Carbon / yield**
/// * `rue` – radiation use efficiency (g MJ⁻¹).
/// * `yield_factor` – converts summed grain-fill GPP (g m⁻²) into grain
///   yield (t ha⁻¹); the default folds the 0.01 unit conversion together
///   with a 0.45 harvest index.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub tmin_weight: f64,
    pub gdd_base_temperature: f64,
    pub optimum_temperature: f64,

    pub gdd_required_to_emergence: f64,
    pub days_after_planting: u32,
    pub daylength_regime_boundary: Hours,
    pub daylength_coefficient: f64,
    pub tadj_threshold: f64,
    pub tadj_scale: f64,
    pub tadj_rate: f64,
    pub days_grain_filling: f64,

    pub ndvi_lower_threshold: f64,
    pub ndvi_upper_threshold: f64,
    pub ndvi_max: f64,
    pub ndvi_ipar_offset: f64,
    pub ipar_bounds: (f64, f64),

    pub rue: f64,
    pub yield_factor: f64,
}

impl ModelParams {
    /// Construct a new [`ModelParams`] with the calibrated default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a [`ModelParamsBuilder`] to override defaults step by step.
    pub fn builder() -> ModelParamsBuilder {
        ModelParamsBuilder::new()
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams {
            tmin_weight: 0.25,
            gdd_base_temperature: 0.0,
            optimum_temperature: 18.0,

            gdd_required_to_emergence: 180.0,
            days_after_planting: 35,
            daylength_regime_boundary: 10.8,
            daylength_coefficient: 0.0,
            tadj_threshold: 42.0,
            tadj_scale: 150.0,
            tadj_rate: -0.06,
            days_grain_filling: 40.0,

            ndvi_lower_threshold: 0.2,
            ndvi_upper_threshold: 0.8,
            ndvi_max: 0.95,
            ndvi_ipar_offset: 0.19,
            ipar_bounds: (0.0, 1.0),

            rue: 3.0,
            yield_factor: 0.0045,
        }
    }
}

impl fmt::Display for ModelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tbase={}, TOpt={}, GDDemg={}, DAP={}, boundary={}h, RUE={}, yf={}",
            self.gdd_base_temperature,
            self.optimum_temperature,
            self.gdd_required_to_emergence,
            self.days_after_planting,
            self.daylength_regime_boundary,
            self.rue,
            self.yield_factor
        )
    }
}

/// Fluent builder for [`ModelParams`].
///
/// `build` validates the combination before handing out the struct, so a
/// nonsensical configuration (inverted NDVI thresholds, negative RUE, …)
/// is rejected early instead of surfacing as NaNs mid-pipeline.
#[derive(Debug, Clone)]
pub struct ModelParamsBuilder {
    p: ModelParams,
}

impl ModelParamsBuilder {
    pub fn new() -> Self {
        ModelParamsBuilder {
            p: ModelParams::default(),
        }
    }

    pub fn tmin_weight(mut self, v: f64) -> Self {
        self.p.tmin_weight = v;
        self
    }

    pub fn gdd_base_temperature(mut self, v: f64) -> Self {
        self.p.gdd_base_temperature = v;
        self
    }

    pub fn optimum_temperature(mut self, v: f64) -> Self {
        self.p.optimum_temperature = v;
        self
    }

    pub fn gdd_required_to_emergence(mut self, v: f64) -> Self {
        self.p.gdd_required_to_emergence = v;
        self
    }

    pub fn days_after_planting(mut self, v: u32) -> Self {
        self.p.days_after_planting = v;
        self
    }

    pub fn daylength_regime_boundary(mut self, v: f64) -> Self {
        self.p.daylength_regime_boundary = v;
        self
    }

    pub fn daylength_coefficient(mut self, v: f64) -> Self {
        self.p.daylength_coefficient = v;
        self
    }

    pub fn tadj_threshold(mut self, v: f64) -> Self {
        self.p.tadj_threshold = v;
        self
    }

    pub fn tadj_scale(mut self, v: f64) -> Self {
        self.p.tadj_scale = v;
        self
    }

    pub fn tadj_rate(mut self, v: f64) -> Self {
        self.p.tadj_rate = v;
        self
    }

    pub fn days_grain_filling(mut self, v: f64) -> Self {
        self.p.days_grain_filling = v;
        self
    }

    pub fn ndvi_lower_threshold(mut self, v: f64) -> Self {
        self.p.ndvi_lower_threshold = v;
        self
    }

    pub fn ndvi_upper_threshold(mut self, v: f64) -> Self {
        self.p.ndvi_upper_threshold = v;
        self
    }

    pub fn ndvi_max(mut self, v: f64) -> Self {
        self.p.ndvi_max = v;
        self
    }

    pub fn ndvi_ipar_offset(mut self, v: f64) -> Self {
        self.p.ndvi_ipar_offset = v;
        self
    }

    pub fn ipar_bounds(mut self, lo: f64, hi: f64) -> Self {
        self.p.ipar_bounds = (lo, hi);
        self
    }

    pub fn rue(mut self, v: f64) -> Self {
        self.p.rue = v;
        self
    }

    pub fn yield_factor(mut self, v: f64) -> Self {
        self.p.yield_factor = v;
        self
    }

    /// Validate the configuration and return the final [`ModelParams`].
    ///
    /// Return
    /// ----------
    /// * `Ok(ModelParams)` – the validated configuration.
    /// * `Err(YieldModelError::InvalidParameter)` – an out-of-range value
    ///   or an inverted threshold pair.
    pub fn build(self) -> Result<ModelParams, YieldModelError> {
        let p = self.p;
        if !(0.0..=1.0).contains(&p.tmin_weight) {
            return Err(YieldModelError::InvalidParameter(
                "tmin_weight must be within [0, 1]",
            ));
        }
        if p.ndvi_lower_threshold >= p.ndvi_upper_threshold {
            return Err(YieldModelError::InvalidParameter(
                "ndvi_lower_threshold must be below ndvi_upper_threshold",
            ));
        }
        if p.ipar_bounds.0 >= p.ipar_bounds.1 {
            return Err(YieldModelError::InvalidParameter(
                "ipar_bounds must be an increasing pair",
            ));
        }
        if p.rue <= 0.0 || p.yield_factor <= 0.0 || p.days_grain_filling <= 0.0 {
            return Err(YieldModelError::InvalidParameter(
                "rue, yield_factor and days_grain_filling must be positive",
            ));
        }
        Ok(p)
    }
}

impl Default for ModelParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
