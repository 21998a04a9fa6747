//! # Phenology: trial inputs, stage dates, and their estimation
//!
//! ## Overview
//! -----------------
//! A trial record carries, at minimum, a sowing date; the other stage
//! dates (emergence, heading, anthesis, maturity) are frequently missing
//! or reported only as day offsets from sowing. This module provides:
//!
//! * [`TrialRecord`] – the raw per-plot attributes as they arrive from a
//!   trial dataset (date strings with legacy sentinels, day offsets,
//!   latitude, nursery label),
//! * [`PhenologyDates`] – the resolved observed/predicted date matrix a
//!   site accumulates while the pipeline runs,
//! * [`Nursery`] – the nursery classes, which select the heading
//!   regression coefficient set,
//! * [`estimator`] – gap filling for emergence, heading and maturity,
//! * [`daylength`] – the photoperiod formula behind the heading
//!   regression.
//!
//! ## Date hygiene
//! -----------------
//! Trial exports encode missing dates as `""`, `"None"`, `"nan"` or
//! `"null"`. [`parse_trial_date`] maps all of those to `None` and only
//! fails on a present-but-malformed string, so a half-filled record
//! degrades to "stage unavailable" instead of an error cascade.
pub mod daylength;
pub mod estimator;

use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::errors::YieldModelError;

/// Sentinel strings that mean "no date" in trial exports.
const MISSING_SENTINELS: [&str; 4] = ["", "None", "nan", "null"];

/// Parse an optional trial date string.
///
/// Return
/// ----------
/// * `Ok(None)` – absent or carrying a missing-value sentinel.
/// * `Ok(Some(date))` – a well-formed `YYYY-MM-DD` value.
/// * `Err(YieldModelError::InvalidDate)` – present but malformed.
pub fn parse_trial_date(raw: Option<&str>) -> Result<Option<NaiveDate>, YieldModelError> {
    let Some(s) = raw else { return Ok(None) };
    let trimmed = s.trim();
    if MISSING_SENTINELS.contains(&trimmed) {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| YieldModelError::InvalidDate(trimmed.to_string()))
}

/// Wheat nursery classes of the international trial network.
///
/// Only the SAWYT material (semi-arid adapted, earlier heading) uses its
/// own regression coefficients; every other class shares the main set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Nursery {
    Sawyt,
    Eswyt,
    Idyn,
    Htwyt,
    #[default]
    Other,
}

impl Nursery {
    /// Classify a free-form nursery label. Unknown labels fall into
    /// [`Nursery::Other`], which behaves like the main set.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(str::trim) {
            Some("SAWYT") => Nursery::Sawyt,
            Some("ESWYT") => Nursery::Eswyt,
            Some("IDYN") => Nursery::Idyn,
            Some("HTWYT") => Nursery::Htwyt,
            _ => Nursery::Other,
        }
    }

    /// Whether this class uses the SAWYT-specific heading coefficients.
    #[inline]
    pub fn is_sawyt(self) -> bool {
        matches!(self, Nursery::Sawyt)
    }
}

/// Raw per-plot trial attributes, as exported by a trial dataset.
///
/// Stage dates may arrive as strings (with sentinels) or as day offsets
/// from sowing; both are accepted, the explicit date winning when both
/// are present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrialRecord {
    pub sowing: Option<String>,
    pub emergence: Option<String>,
    pub heading: Option<String>,
    pub anthesis: Option<String>,
    pub maturity: Option<String>,
    pub days_to_emergence: Option<i64>,
    pub days_to_heading: Option<i64>,
    pub days_to_anthesis: Option<i64>,
    pub days_to_maturity: Option<i64>,
    pub latitude: Option<f64>,
    pub nursery: Option<String>,
}

impl TrialRecord {
    /// Resolve the observed date matrix against this record.
    ///
    /// Sowing is required; each optional stage resolves from its date
    /// string first, then from its day offset. A malformed sowing string
    /// is an error; a malformed optional stage resolves to `None` via the
    /// sentinel rules of [`parse_trial_date`].
    ///
    /// Return
    /// ----------
    /// * `Ok(PhenologyDates)` with the observed fields populated.
    /// * `Err(YieldModelError::MissingSowingDate)` when sowing is absent
    ///   or a sentinel; `Err(YieldModelError::InvalidDate)` when any
    ///   present string is malformed.
    pub fn resolve_dates(&self) -> Result<PhenologyDates, YieldModelError> {
        let sowing = parse_trial_date(self.sowing.as_deref())?
            .ok_or(YieldModelError::MissingSowingDate)?;

        let resolve_stage = |raw: &Option<String>,
                             offset: Option<i64>|
         -> Result<Option<NaiveDate>, YieldModelError> {
            if let Some(date) = parse_trial_date(raw.as_deref())? {
                return Ok(Some(date));
            }
            Ok(offset.and_then(|d| add_days(sowing, d)))
        };

        Ok(PhenologyDates {
            sowing: Some(sowing),
            emergence: resolve_stage(&self.emergence, self.days_to_emergence)?,
            heading: resolve_stage(&self.heading, self.days_to_heading)?,
            anthesis: resolve_stage(&self.anthesis, self.days_to_anthesis)?,
            maturity: resolve_stage(&self.maturity, self.days_to_maturity)?,
            ..PhenologyDates::default()
        })
    }
}

/// Signed day offset from a date; `None` on calendar overflow.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64))
    } else {
        date.checked_sub_days(Days::new((-days) as u64))
    }
}

/// The observed/predicted stage-date matrix of one site.
///
/// Observed fields come from the trial record; predicted fields are
/// filled by [`estimator`]. `None` always means "unavailable" — whether
/// a stage failed is visible in the site's error list, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhenologyDates {
    pub sowing: Option<NaiveDate>,
    pub emergence: Option<NaiveDate>,
    pub heading: Option<NaiveDate>,
    pub anthesis: Option<NaiveDate>,
    pub maturity: Option<NaiveDate>,

    /// Emergence estimated from cumulative GDD.
    pub pred_emergence: Option<NaiveDate>,
    pub pred_days_to_emergence: Option<i64>,

    /// The daylength reading behind the heading estimate.
    pub date_at_dap: Option<NaiveDate>,
    pub daylength_at_dap: Option<f64>,
    pub pred_days_to_heading: Option<i64>,
    pub pred_heading: Option<NaiveDate>,

    /// Maturity estimated from the observed heading anchor.
    pub pred_maturity_h: Option<NaiveDate>,
    pub pred_days_hm: Option<i64>,
    pub pred_days_to_maturity_h: Option<i64>,

    /// Maturity estimated from the predicted heading anchor.
    pub pred_maturity_ph: Option<NaiveDate>,
    pub pred_days_phm: Option<i64>,
    pub pred_days_to_maturity_ph: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn sentinels_read_as_missing() {
        for s in ["", "None", "nan", "null"] {
            assert_eq!(parse_trial_date(Some(s)).unwrap(), None);
        }
        assert_eq!(parse_trial_date(None).unwrap(), None);
    }

    #[test]
    fn malformed_date_is_an_error() {
        assert!(matches!(
            parse_trial_date(Some("15/11/2015")),
            Err(YieldModelError::InvalidDate(_))
        ));
    }

    #[test]
    fn offsets_resolve_against_sowing() {
        let record = TrialRecord {
            sowing: Some("2015-11-15".into()),
            heading: Some("nan".into()),
            days_to_heading: Some(90),
            maturity: Some("2016-04-20".into()),
            days_to_maturity: Some(999), // explicit date wins
            ..TrialRecord::default()
        };
        let dates = record.resolve_dates().unwrap();
        assert_eq!(dates.sowing, Some(day(2015, 11, 15)));
        assert_eq!(dates.heading, Some(day(2016, 2, 13)));
        assert_eq!(dates.maturity, Some(day(2016, 4, 20)));
        assert_eq!(dates.emergence, None);
    }

    #[test]
    fn missing_sowing_is_fatal_for_the_record() {
        let record = TrialRecord {
            sowing: Some("null".into()),
            ..TrialRecord::default()
        };
        assert!(matches!(
            record.resolve_dates(),
            Err(YieldModelError::MissingSowingDate)
        ));
    }

    #[test]
    fn nursery_labels_classify() {
        assert!(Nursery::from_label(Some("SAWYT")).is_sawyt());
        assert!(!Nursery::from_label(Some("ESWYT")).is_sawyt());
        assert!(!Nursery::from_label(Some("21st HRWYT")).is_sawyt());
        assert!(!Nursery::from_label(None).is_sawyt());
    }
}
