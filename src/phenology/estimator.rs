//! # Gap filling for missing stage dates
//!
//! ## Overview
//! -----------------
//! Three estimators, one per stage, each anchored on the sowing date and
//! the per-site weather window:
//!
//! * **Emergence** – the window date whose cumulative GDD is nearest to
//!   the configured requirement (first index wins on ties).
//! * **Heading** – a piecewise linear regression on the daylength read a
//!   configured number of days after planting, with separate coefficient
//!   sets for SAWYT material and for everything else; the long-day set
//!   applies from the regime boundary upward (inclusive).
//! * **Maturity** – accumulate fractional adjusted thermal days from a
//!   heading anchor until the grain-filling total is reached. Both the
//!   observed and the predicted heading anchor produce their own
//!   estimate, because downstream period variants may need either.
//!
//! All three return plain `Result`s; the site orchestrator converts
//! failures into per-site error records.
use chrono::NaiveDate;

use crate::constants::{
    Hours, HEADING_MAIN_LONG, HEADING_MAIN_SHORT, HEADING_SAWYT_LONG, HEADING_SAWYT_SHORT,
};
use crate::errors::YieldModelError;
use crate::params::ModelParams;
use crate::phenology::daylength::daylength;
use crate::phenology::{add_days, Nursery};
use crate::thermal::{adjusted_thermal_day, argmin_nearest, cumsum, round_to};
use crate::weather::WeatherWindow;

/// Emergence estimate: date plus its day offset from sowing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmergenceEstimate {
    pub date: NaiveDate,
    pub days_from_sowing: i64,
}

/// Heading estimate with the daylength reading that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingEstimate {
    pub date_at_dap: NaiveDate,
    pub daylength_at_dap: Hours,
    pub days_to_heading: i64,
    pub date: NaiveDate,
}

/// Maturity estimate anchored on one heading date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaturityEstimate {
    pub date: NaiveDate,
    pub days_from_heading: i64,
    pub days_from_sowing: i64,
}

/// Estimate the emergence date from cumulative GDD over the window.
///
/// Arguments
/// -----------------
/// * `window`: per-site weather window, row 0 on the sowing date.
/// * `gdd`: daily GDD series aligned with the window rows.
/// * `sowing`: sowing date.
/// * `params`: active configuration (`gdd_required_to_emergence`).
///
/// Return
/// ----------
/// * `Ok(EmergenceEstimate)` – window date nearest the GDD requirement.
/// * `Err(YieldModelError::EmptyCumulativeSeries)` – empty or all-NaN
///   cumulative series.
pub fn estimate_emergence(
    window: &WeatherWindow,
    gdd: &[f64],
    sowing: NaiveDate,
    params: &ModelParams,
) -> Result<EmergenceEstimate, YieldModelError> {
    let cgdd = cumsum(gdd);
    let idx = argmin_nearest(&cgdd, params.gdd_required_to_emergence)
        .ok_or(YieldModelError::EmptyCumulativeSeries("emergence GDD"))?;
    let date = window
        .date(idx)
        .ok_or(YieldModelError::EmptyCumulativeSeries("emergence GDD"))?;
    Ok(EmergenceEstimate {
        date,
        days_from_sowing: (date - sowing).num_days(),
    })
}

/// Days to heading from the daylength at the DAP mark.
///
/// The regime boundary is inclusive on the `>=` side; the result is
/// truncated to a whole day count.
pub fn days_to_heading(daylength_hours: Hours, nursery: Nursery, params: &ModelParams) -> i64 {
    let short_day = daylength_hours < params.daylength_regime_boundary;
    let (intercept, slope) = match (nursery.is_sawyt(), short_day) {
        (true, true) => HEADING_SAWYT_SHORT,
        (true, false) => HEADING_SAWYT_LONG,
        (false, true) => HEADING_MAIN_SHORT,
        (false, false) => HEADING_MAIN_LONG,
    };
    (intercept - slope * daylength_hours) as i64
}

/// Estimate the heading date from photoperiod.
///
/// Arguments
/// -----------------
/// * `sowing`: sowing date.
/// * `latitude`: site latitude; required for the daylength reading.
/// * `nursery`: nursery class selecting the coefficient set.
/// * `params`: active configuration (`days_after_planting`,
///   `daylength_regime_boundary`, `daylength_coefficient`).
///
/// Return
/// ----------
/// * `Ok(HeadingEstimate)` – DAP date, its daylength (2 decimals, the
///   reported precision), the regressed day count and the heading date.
/// * `Err(YieldModelError::MissingLatitude)` – no latitude on record.
pub fn estimate_heading(
    sowing: NaiveDate,
    latitude: Option<f64>,
    nursery: Nursery,
    params: &ModelParams,
) -> Result<HeadingEstimate, YieldModelError> {
    let latitude = latitude.ok_or(YieldModelError::MissingLatitude)?;
    let date_at_dap = add_days(sowing, params.days_after_planting as i64)
        .ok_or(YieldModelError::MissingSowingDate)?;
    let dl = round_to(
        daylength(date_at_dap, latitude, params.daylength_coefficient),
        2,
    );
    let days = days_to_heading(dl, nursery, params);
    let date = add_days(sowing, days).ok_or(YieldModelError::MissingSowingDate)?;
    Ok(HeadingEstimate {
        date_at_dap,
        daylength_at_dap: dl,
        days_to_heading: days,
        date,
    })
}

/// Estimate the maturity date from one heading anchor.
///
/// Accumulates [`adjusted_thermal_day`] over the window rows dated on or
/// after the anchor and picks the date where the running total is nearest
/// to `days_grain_filling`.
///
/// Arguments
/// -----------------
/// * `window`: per-site weather window.
/// * `anchor`: observed or predicted heading date.
/// * `sowing`: sowing date, for the days-from-sowing count.
/// * `params`: active configuration (`tadj_*`, `days_grain_filling`).
///
/// Return
/// ----------
/// * `Ok(MaturityEstimate)` for this anchor.
/// * `Err(YieldModelError::EmptyCumulativeSeries)` – no window rows on or
///   after the anchor, or all-NaN progress.
pub fn estimate_maturity(
    window: &WeatherWindow,
    anchor: NaiveDate,
    sowing: NaiveDate,
    params: &ModelParams,
) -> Result<MaturityEstimate, YieldModelError> {
    let mask = window.mask_from(anchor);
    if mask.is_empty() {
        return Err(YieldModelError::EmptyCumulativeSeries("adjusted days"));
    }
    let tavg = window.select(&mask, |r| r.tavg);
    let progress = adjusted_thermal_day(
        &tavg,
        params.tadj_threshold,
        params.tadj_scale,
        params.tadj_rate,
    );
    let cprogress = cumsum(&progress);
    let idx = argmin_nearest(&cprogress, params.days_grain_filling)
        .ok_or(YieldModelError::EmptyCumulativeSeries("adjusted days"))?;
    let date = window
        .date(mask[idx])
        .ok_or(YieldModelError::EmptyCumulativeSeries("adjusted days"))?;
    Ok(MaturityEstimate {
        date,
        days_from_heading: (date - anchor).num_days(),
        days_from_sowing: (date - sowing).num_days(),
    })
}
