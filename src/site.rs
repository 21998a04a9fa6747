//! # Per-site pipeline orchestration
//!
//! ## Overview
//! -----------------
//! A [`Site`] owns everything one trial plot accumulates while the model
//! runs: the resolved phenology dates, the weather window, the daily GDD
//! series, one [`PeriodData`] per available period variant, one
//! [`SeasonData`] per season pairing, the corrected NDVI trajectory and
//! the error records. [`Site::fit`] drives the fixed stage order:
//!
//! ```text
//! resolve dates → estimate phenology → build periods → thermal series
//!              → simulate NDVI → light interception → GPP → yield
//! ```
//!
//! ## Error semantics
//! -----------------
//! Every stage catches its own failure and appends a structured
//! [`SiteError`] instead of aborting: a site with a bad maturity date
//! still reports its vegetative statistics, and one failing site never
//! poisons its siblings. Absence of an output field is the signal that a
//! stage could not complete; the error list says why.
//!
//! ## See also
//! ------------
//! * [`crate::sites::SiteFit`] – batch fit over a whole site set.
//! * [`crate::model::YieldModel`] – the shared read-only collaborators.
use itertools::izip;
use log::{debug, warn};

use crate::canopy::ipar::{concat_season, estimate_ipar};
use crate::canopy::ndvi::{ndvi_grainfill, ndvi_vegetative};
use crate::canopy::prft;
use crate::constants::{
    LocationId, SiteId, GPP_NDVI_INTERCEPT, GPP_NDVI_SLOPE, NDVI_SERIES_MAX, NDVI_SERIES_MIN,
    PAR_FRACTION, WINDOW_DAYS,
};
use crate::errors::YieldModelError;
use crate::model::YieldModel;
use crate::periods::{
    build_periods, PeriodMap, PeriodVariant, SeasonData, SeasonMap, SeasonVariant,
};
use crate::phenology::estimator::{estimate_emergence, estimate_heading, estimate_maturity};
use crate::phenology::{add_days, Nursery, PhenologyDates, TrialRecord};
use crate::thermal::{cumsum, day_temperature, growing_degree_days, nanmax, normalize, round_to};
use crate::weather::WeatherWindow;

/// One structured error record attached to a site.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteError {
    pub uid: SiteId,
    pub location: LocationId,
    pub message: String,
}

impl std::fmt::Display for SiteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}: {}", self.uid, self.location, self.message)
    }
}

/// Simulated yields, one per grain-fill flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct YieldEstimates {
    /// Observed heading and maturity (t ha⁻¹).
    pub observed: Option<f64>,
    /// Estimated heading, observed maturity.
    pub pred_heading: Option<f64>,
    /// Observed heading, estimated maturity.
    pub pred_maturity: Option<f64>,
    /// Both estimated.
    pub pred_both: Option<f64>,
}

/// One trial plot and everything the pipeline derives for it.
#[derive(Debug, Clone, Default)]
pub struct Site {
    pub uid: SiteId,
    pub location: LocationId,
    pub trial: TrialRecord,
    pub nursery: Nursery,

    /// Observed and predicted stage dates.
    pub dates: PhenologyDates,
    /// Weather slice `[sowing, sowing + 365 d]` for this location.
    pub window: Option<WeatherWindow>,
    /// Daily GDD aligned with the window rows.
    pub gdd: Vec<f64>,
    /// Per-period records keyed by variant.
    pub periods: PeriodMap,
    /// Per-season records keyed by pairing.
    pub seasons: SeasonMap,
    /// Corrected, de-normalized NDVI trajectory from heading to maturity.
    pub ndvi: Option<Vec<f64>>,
    /// Simulated yields per grain-fill flavour.
    pub yields: YieldEstimates,

    /// Structured error records accumulated across stages.
    pub errors: Vec<SiteError>,
}

impl Site {
    /// Construct a site from its trial attributes.
    pub fn new(uid: SiteId, location: LocationId, trial: TrialRecord) -> Self {
        let nursery = Nursery::from_label(trial.nursery.as_deref());
        Site {
            uid,
            location,
            trial,
            nursery,
            ..Site::default()
        }
    }

    /// Append a structured error record for a failed stage.
    fn record_error(&mut self, stage: &str, err: &YieldModelError) {
        warn!("site {} - {}: {stage}: {err}", self.uid, self.location);
        self.errors.push(SiteError {
            uid: self.uid,
            location: self.location,
            message: format!("{stage}: {err}"),
        });
    }

    /// Convenience accessor: the growing-season weather statistics
    /// (sowing → maturity period).
    pub fn season_stats(&self) -> Option<crate::periods::WeatherStats> {
        self.periods
            .get(&PeriodVariant::SowingMaturity)
            .and_then(|p| p.stats)
    }

    /// Run the full per-site pipeline.
    ///
    /// Every stage catches its own failure into [`Site::errors`] and the
    /// pipeline continues with whatever partial state exists. The method
    /// never panics on bad trial data.
    pub fn fit(&mut self, model: &YieldModel) {
        if !self.resolve_phenology(model) {
            return;
        }
        self.estimate_phenology(model);
        self.build_period_records();
        self.compute_thermal_series(model);
        self.simulate_ndvi(model);
        self.compute_light_interception(model);
        self.compute_gpp_and_yield(model);
        debug!(
            "site {} - {}: fit complete, {} periods, {} errors",
            self.uid,
            self.location,
            self.periods.len(),
            self.errors.len()
        );
    }

    // ------------------------------------------------------------------
    // Stage 1: observed dates and the weather window
    // ------------------------------------------------------------------

    /// Resolve observed dates and slice the weather window. Returns
    /// `false` when the site cannot proceed at all (no sowing date or no
    /// weather rows).
    fn resolve_phenology(&mut self, model: &YieldModel) -> bool {
        match self.trial.resolve_dates() {
            Ok(dates) => self.dates = dates,
            Err(err) => {
                self.record_error("resolving phenology dates", &err);
                return false;
            }
        }
        // Safe: resolve_dates guarantees sowing.
        let Some(sowing) = self.dates.sowing else {
            return false;
        };
        let Some(end) = add_days(sowing, WINDOW_DAYS as i64) else {
            self.record_error(
                "resolving phenology dates",
                &YieldModelError::MissingSowingDate,
            );
            return false;
        };
        match model.weather.window(self.location, sowing, end) {
            Ok(window) => {
                self.window = Some(window);
                true
            }
            Err(err) => {
                self.record_error("slicing weather window", &err);
                false
            }
        }
    }

    // ------------------------------------------------------------------
    // Stage 2: estimated phenology
    // ------------------------------------------------------------------

    /// Fill the predicted emergence, heading and maturity dates. All
    /// three estimates run even when the observed date exists, because
    /// the predicted period variants need them.
    fn estimate_phenology(&mut self, model: &YieldModel) {
        let params = &model.params;
        let Some(window) = self.window.clone() else {
            return;
        };
        let Some(sowing) = self.dates.sowing else {
            return;
        };

        self.gdd = growing_degree_days(&window.tmin(), &window.tmax(), params.gdd_base_temperature);

        match estimate_emergence(&window, &self.gdd, sowing, params) {
            Ok(est) => {
                self.dates.pred_emergence = Some(est.date);
                self.dates.pred_days_to_emergence = Some(est.days_from_sowing);
            }
            Err(err) => self.record_error("estimating emergence date", &err),
        }

        match estimate_heading(sowing, self.trial.latitude, self.nursery, params) {
            Ok(est) => {
                self.dates.date_at_dap = Some(est.date_at_dap);
                self.dates.daylength_at_dap = Some(est.daylength_at_dap);
                self.dates.pred_days_to_heading = Some(est.days_to_heading);
                self.dates.pred_heading = Some(est.date);
            }
            Err(err) => self.record_error("estimating heading date", &err),
        }

        if let Some(heading) = self.dates.heading {
            match estimate_maturity(&window, heading, sowing, params) {
                Ok(est) => {
                    self.dates.pred_maturity_h = Some(est.date);
                    self.dates.pred_days_hm = Some(est.days_from_heading);
                    self.dates.pred_days_to_maturity_h = Some(est.days_from_sowing);
                }
                Err(err) => self.record_error("estimating maturity from observed heading", &err),
            }
        }
        if let Some(pred_heading) = self.dates.pred_heading {
            match estimate_maturity(&window, pred_heading, sowing, params) {
                Ok(est) => {
                    self.dates.pred_maturity_ph = Some(est.date);
                    self.dates.pred_days_phm = Some(est.days_from_heading);
                    self.dates.pred_days_to_maturity_ph = Some(est.days_from_sowing);
                }
                Err(err) => self.record_error("estimating maturity from estimated heading", &err),
            }
        }
    }

    // ------------------------------------------------------------------
    // Stage 3: periods and their aggregates
    // ------------------------------------------------------------------

    /// Build the `(start, end]` filters and base aggregates for every
    /// available period variant. Callable on its own (e.g. with only
    /// observed dates); ordering violations land in the error list.
    pub fn build_period_records(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let (periods, violations) = build_periods(&self.dates, window, &self.gdd);
        self.periods = periods;
        for err in violations {
            self.record_error("building period filters", &err);
        }
    }

    // ------------------------------------------------------------------
    // Stage 4: normalized thermal time, day temperature, PRFT, radiation
    // ------------------------------------------------------------------

    /// Fill the per-period series the canopy stages consume, for the
    /// vegetative and grain-fill families.
    fn compute_thermal_series(&mut self, model: &YieldModel) {
        let params = &model.params;
        let Some(window) = self.window.clone() else {
            return;
        };
        for variant in PeriodVariant::ALL {
            if !(variant.is_vegetative() || variant.is_grainfill()) {
                continue;
            }
            let Some(period) = self.periods.get_mut(&variant) else {
                continue;
            };

            let cgdd = period.cum_gdd_series(&self.gdd);
            period.norm_tt = Some(normalize(&cgdd));

            let tmin = window.select(&period.mask, |r| r.tmin);
            let tmax = window.select(&period.mask, |r| r.tmax);
            let tday = day_temperature(&tmin, &tmax, params.tmin_weight);
            period.prft = Some(prft(&tday, params.optimum_temperature));
            period.tday = Some(tday);
            period.solrad = Some(window.select(&period.mask, |r| r.solrad));
        }
    }

    // ------------------------------------------------------------------
    // Stage 5: simulated NDVI
    // ------------------------------------------------------------------

    /// Simulate the NDVI trajectory of every vegetative period, then the
    /// grain-fill decays anchored on the NDVI reached at heading.
    fn simulate_ndvi(&mut self, model: &YieldModel) {
        let params = &model.params;

        for variant in PeriodVariant::ALL.into_iter().filter(|v| v.is_vegetative()) {
            let Some(period) = self.periods.get_mut(&variant) else {
                continue;
            };
            let Some(norm_tt) = &period.norm_tt else {
                continue;
            };
            let curve = ndvi_vegetative(
                norm_tt,
                params.ndvi_lower_threshold,
                params.ndvi_upper_threshold,
                params.ndvi_max,
            );
            period.ndvi_at_heading = curve.last().copied().filter(|v| !v.is_nan());
            period.sim_ndvi = Some(curve);
        }

        for variant in PeriodVariant::ALL.into_iter().filter(|v| v.is_grainfill()) {
            let Some(anchors) = variant.ndvi_anchor_priority() else {
                continue;
            };
            let anchor = anchors
                .iter()
                .find_map(|a| self.periods.get(a).and_then(|p| p.ndvi_at_heading));
            let Some(anchor) = anchor else {
                continue;
            };
            let Some(period) = self.periods.get_mut(&variant) else {
                continue;
            };
            let Some(norm_tt) = &period.norm_tt else {
                continue;
            };
            period.sim_ndvi = Some(ndvi_grainfill(norm_tt, anchor));
        }
    }

    // ------------------------------------------------------------------
    // Stage 6: light interception
    // ------------------------------------------------------------------

    /// iPAR per season pairing and per segment, plus the concatenated
    /// PRFT/radiation series and the daily intercepted PAR flux.
    fn compute_light_interception(&mut self, model: &YieldModel) {
        let params = &model.params;

        for season in SeasonVariant::ALL {
            let veg = season.vegetative();
            let gf = season.grainfill();

            // Both halves need a normalized trajectory and a curve.
            let (Some(veg_period), Some(gf_period)) =
                (self.periods.get(&veg), self.periods.get(&gf))
            else {
                continue;
            };
            let (Some(veg_ndvi), Some(gf_ndvi)) = (&veg_period.sim_ndvi, &gf_period.sim_ndvi)
            else {
                continue;
            };

            let series = estimate_ipar(
                veg_ndvi,
                gf_ndvi,
                params.ndvi_ipar_offset,
                params.ipar_bounds,
            );

            let mut data = SeasonData {
                ipar_total: Some(round_to(series.season.iter().sum(), 3)),
                ..SeasonData::default()
            };

            // Concatenated PRFT and radiation, duplicate heading sample
            // dropped on the grain-fill side.
            if let (Some(vp), Some(gp)) = (&veg_period.prft, &gf_period.prft) {
                data.prft = Some(concat_season(vp, gp));
            }
            if let (Some(vs), Some(gs)) = (&veg_period.solrad, &gf_period.solrad) {
                data.solrad = Some(concat_season(vs, gs));
            }

            if let (Some(prft), Some(solrad)) = (&data.prft, &data.solrad) {
                if prft.len() == series.season.len() && solrad.len() == series.season.len() {
                    let fipar: Vec<f64> = izip!(&series.season, prft, solrad)
                        .map(|(i, p, s)| i * p * s * PAR_FRACTION)
                        .collect();
                    data.fipar_total = Some(round_to(fipar.iter().sum(), 3));
                    data.fipar = Some(fipar);
                }
            }

            data.norm_ipar = Some(normalize(&series.season));

            // Segment iPAR lands on the period records; totals at
            // reporting precision.
            let veg_total = round_to(series.vegetative.iter().sum(), 3);
            let gf_total = round_to(series.grainfill.iter().sum(), 3);
            if let Some(p) = self.periods.get_mut(&veg) {
                p.ipar_total = Some(veg_total);
                p.ipar = Some(series.vegetative.clone());
            }
            if let Some(p) = self.periods.get_mut(&gf) {
                p.ipar_total = Some(gf_total);
                p.ipar = Some(series.grainfill.clone());
            }

            data.ndvi = Some(series.ndvi);
            data.ipar = Some(series.season);
            self.seasons.insert(season, data);
        }
    }

    // ------------------------------------------------------------------
    // Stage 7: GPP and yield
    // ------------------------------------------------------------------

    /// Daily GPP per season and per segment, the NDVI-at-heading
    /// recalibration, and the simulated yields.
    fn compute_gpp_and_yield(&mut self, model: &YieldModel) {
        let params = &model.params;

        // Season GPP: SolRad · 0.5 · RUE · PRFT · iPAR.
        for season in SeasonVariant::ALL {
            let Some(data) = self.seasons.get_mut(&season) else {
                continue;
            };
            let (Some(ipar), Some(prft), Some(solrad)) = (&data.ipar, &data.prft, &data.solrad)
            else {
                continue;
            };
            if ipar.len() != prft.len() || ipar.len() != solrad.len() {
                continue;
            }
            let gpp: Vec<f64> = izip!(ipar, prft, solrad)
                .map(|(i, p, s)| s * PAR_FRACTION * params.rue * p * i)
                .collect();
            let cum = nanmax(&cumsum(&gpp));
            data.cum_gpp = (!cum.is_nan()).then(|| round_to(cum, 3));
            data.gpp = Some(gpp);
        }

        // Segment GPP for the vegetative and grain-fill families.
        let mut corrected_eh_anchor = None;
        for variant in PeriodVariant::ALL {
            if !(variant.is_vegetative() || variant.is_grainfill()) {
                continue;
            }
            let Some(period) = self.periods.get_mut(&variant) else {
                continue;
            };
            let (Some(ipar), Some(prft), Some(solrad)) =
                (&period.ipar, &period.prft, &period.solrad)
            else {
                continue;
            };
            if ipar.len() != prft.len() || ipar.len() != solrad.len() {
                continue;
            }
            let gpp: Vec<f64> = izip!(ipar, prft, solrad)
                .map(|(i, p, s)| s * PAR_FRACTION * params.rue * p * i)
                .collect();
            let cum = nanmax(&cumsum(&gpp));
            period.cum_gpp = (!cum.is_nan()).then(|| round_to(cum, 3));
            period.gpp_total = Some(round_to(gpp.iter().sum(), 3));
            period.gpp = Some(gpp);

            // Recalibrate the NDVI reached at heading from accumulated
            // vegetative carbon gain. The stored anchor is at reporting
            // precision; the corrected trajectory below uses the raw one.
            if variant.is_vegetative() && !cum.is_nan() {
                let anchor = GPP_NDVI_SLOPE * cum + GPP_NDVI_INTERCEPT;
                period.ndvi_at_heading = Some(round_to(anchor, 3));
                if variant == PeriodVariant::EmergenceHeading {
                    corrected_eh_anchor = Some(anchor);
                }
            }
        }

        // The observed-phenology corrected NDVI trajectory: recompute the
        // heading→maturity decay from the recalibrated anchor and map it
        // back into NDVI units.
        if let Some(anchor) = corrected_eh_anchor {
            let hm_norm_tt = self
                .periods
                .get(&PeriodVariant::HeadingMaturity)
                .and_then(|p| p.norm_tt.clone());
            if let Some(norm_tt) = hm_norm_tt {
                let corrected = ndvi_grainfill(&norm_tt, anchor);
                self.ndvi = Some(
                    corrected
                        .iter()
                        .map(|v| v * (NDVI_SERIES_MAX - NDVI_SERIES_MIN) + NDVI_SERIES_MIN)
                        .collect(),
                );
            }
        }

        // Yield per grain-fill flavour.
        let yield_for = |periods: &PeriodMap, variant: PeriodVariant| -> Option<f64> {
            let total = periods.get(&variant)?.gpp_total?;
            Some(round_to(total * params.yield_factor, 2))
        };
        self.yields = YieldEstimates {
            observed: yield_for(&self.periods, PeriodVariant::HeadingMaturity),
            pred_heading: yield_for(&self.periods, PeriodVariant::PredHeadingMaturity),
            pred_maturity: yield_for(&self.periods, PeriodVariant::HeadingPredMaturity),
            pred_both: yield_for(&self.periods, PeriodVariant::PredHeadingPredMaturity),
        };
        for variant in PeriodVariant::ALL.into_iter().filter(|v| v.is_grainfill()) {
            let sim = yield_for(&self.periods, variant);
            if let Some(period) = self.periods.get_mut(&variant) {
                period.sim_yield = sim;
            }
        }
    }
}
