//! # Weather table and per-site windows
//!
//! ## Overview
//! -----------------
//! The weather dataset is the only shared collaborator of the pipeline:
//! one row per `(location, date)` with the daily extremes, the mean
//! temperature, solar radiation and precipitation. It is loaded once
//! (from CSV or built in memory), never mutated afterwards, and sliced
//! into per-site [`WeatherWindow`]s — so concurrent read access from
//! independent site fits needs no locking.
//!
//! ## CSV layout
//! -----------------
//! ```text
//! location,Date,TMIN,TMAX,TAVG,SolRad,PCP
//! 17,2015-11-15,9.8,24.6,17.2,19.4,0.0
//! ```
//!
//! Dates are `YYYY-MM-DD`. Missing numeric cells should be written as
//! `NaN`; they flow through the thermal engine as "unavailable".
//!
//! ## See also
//! ------------
//! * [`crate::thermal`] – consumes the column slices produced here.
//! * [`crate::periods`] – builds `(start, end]` row masks over a window.
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::constants::{Celsius, LocationId, MegajoulePerSquareMeter};
use crate::errors::YieldModelError;

/// One day of weather at one trial location.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherRecord {
    #[serde(rename = "location")]
    pub location: LocationId,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "TMIN")]
    pub tmin: Celsius,
    #[serde(rename = "TMAX")]
    pub tmax: Celsius,
    #[serde(rename = "TAVG")]
    pub tavg: Celsius,
    #[serde(rename = "SolRad")]
    pub solrad: MegajoulePerSquareMeter,
    #[serde(rename = "PCP")]
    pub precip: f64,
}

/// The full multi-location weather dataset.
///
/// Rows are stored as loaded; [`window`](WeatherTable::window) filters and
/// sorts per site, so the table itself needs no particular order.
#[derive(Debug, Clone, Default)]
pub struct WeatherTable {
    records: Vec<WeatherRecord>,
}

impl WeatherTable {
    /// Wrap an in-memory record set.
    pub fn new(records: Vec<WeatherRecord>) -> Self {
        WeatherTable { records }
    }

    /// Load a weather table from a CSV file with headers
    /// `location,Date,TMIN,TMAX,TAVG,SolRad,PCP`.
    ///
    /// Return
    /// ----------
    /// * `Ok(WeatherTable)` with all parsed rows.
    /// * `Err(YieldModelError::CsvError)` on a malformed row,
    ///   `Err(YieldModelError::IoError)` on a filesystem failure.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, YieldModelError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let mut records = Vec::new();
        for row in reader.deserialize::<WeatherRecord>() {
            records.push(row?);
        }
        Ok(WeatherTable { records })
    }

    /// Number of rows in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no rows at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All rows, in load order.
    #[inline]
    pub fn records(&self) -> &[WeatherRecord] {
        &self.records
    }

    /// Slice the table into a per-site window: every row of `location`
    /// with `start <= date <= end`, sorted by date.
    ///
    /// Arguments
    /// -----------------
    /// * `location`: trial location id.
    /// * `start`: first date of the window (the sowing date).
    /// * `end`: last date of the window, inclusive.
    ///
    /// Return
    /// ----------
    /// * `Ok(WeatherWindow)` with at least one row.
    /// * `Err(YieldModelError::EmptyWeatherWindow)` when nothing matches —
    ///   recorded on the site by the caller, not fatal to the run.
    pub fn window(
        &self,
        location: LocationId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<WeatherWindow, YieldModelError> {
        let mut rows: Vec<WeatherRecord> = self
            .records
            .iter()
            .filter(|r| r.location == location && r.date >= start && r.date <= end)
            .cloned()
            .collect();
        if rows.is_empty() {
            return Err(YieldModelError::EmptyWeatherWindow {
                location,
                start,
                end,
            });
        }
        rows.sort_by_key(|r| r.date);
        Ok(WeatherWindow { rows })
    }
}

/// The weather slice one site works on: a single location, dates ordered
/// ascending, row 0 on the window start (normally the sowing date).
#[derive(Debug, Clone)]
pub struct WeatherWindow {
    rows: Vec<WeatherRecord>,
}

impl WeatherWindow {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn rows(&self) -> &[WeatherRecord] {
        &self.rows
    }

    /// Date of row `i`.
    #[inline]
    pub fn date(&self, i: usize) -> Option<NaiveDate> {
        self.rows.get(i).map(|r| r.date)
    }

    /// Row indices with `start < date <= end` — the half-open period
    /// filter used by every named period.
    pub fn mask_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.date > start && r.date <= end)
            .map(|(i, _)| i)
            .collect()
    }

    /// Row indices with `date >= from` (maturity accumulation starts on
    /// the heading day itself).
    pub fn mask_from(&self, from: NaiveDate) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.date >= from)
            .map(|(i, _)| i)
            .collect()
    }

    // Column extraction over the whole window.

    pub fn tmin(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.tmin).collect()
    }

    pub fn tmax(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.tmax).collect()
    }

    pub fn tavg(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.tavg).collect()
    }

    pub fn solrad(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.solrad).collect()
    }

    pub fn precip(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.precip).collect()
    }

    /// Extract one column restricted to a row mask.
    pub fn select<F>(&self, mask: &[usize], column: F) -> Vec<f64>
    where
        F: Fn(&WeatherRecord) -> f64,
    {
        mask.iter().map(|&i| column(&self.rows[i])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: LocationId, date: NaiveDate) -> WeatherRecord {
        WeatherRecord {
            location,
            date,
            tmin: 10.0,
            tmax: 25.0,
            tavg: 17.5,
            solrad: 20.0,
            precip: 0.0,
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_filters_location_and_dates() {
        let mut rows = Vec::new();
        for d in 1..=20 {
            rows.push(record(1, day(2016, 1, d)));
            rows.push(record(2, day(2016, 1, d)));
        }
        let table = WeatherTable::new(rows);
        let w = table.window(1, day(2016, 1, 5), day(2016, 1, 10)).unwrap();
        assert_eq!(w.len(), 6);
        assert_eq!(w.date(0), Some(day(2016, 1, 5)));
        assert!(w.rows().iter().all(|r| r.location == 1));
    }

    #[test]
    fn empty_window_is_an_error() {
        let table = WeatherTable::new(vec![record(1, day(2016, 1, 1))]);
        let err = table.window(9, day(2016, 1, 1), day(2016, 2, 1));
        assert!(matches!(
            err,
            Err(YieldModelError::EmptyWeatherWindow { location: 9, .. })
        ));
    }

    #[test]
    fn masks_are_half_open() {
        let rows = (1..=10).map(|d| record(1, day(2016, 3, d))).collect();
        let table = WeatherTable::new(rows);
        let w = table.window(1, day(2016, 3, 1), day(2016, 3, 10)).unwrap();

        let mask = w.mask_between(day(2016, 3, 2), day(2016, 3, 5));
        let dates: Vec<_> = mask.iter().map(|&i| w.date(i).unwrap()).collect();
        // Start excluded, end included.
        assert_eq!(dates, vec![day(2016, 3, 3), day(2016, 3, 4), day(2016, 3, 5)]);

        let from = w.mask_from(day(2016, 3, 8));
        assert_eq!(from.len(), 3);
        assert_eq!(w.date(from[0]), Some(day(2016, 3, 8)));
    }
}
