//! # Batch fit over a site set
//!
//! ## Overview
//! -----------------
//! A [`SiteSet`] maps each site id to its [`Site`]. This module
//! implements the [`SiteFit`] trait on `SiteSet`, providing:
//!
//! * `fit_all_sites` – run the full per-site pipeline on **every site**,
//! * `number_of_sites` / `total_errors` – quick set-level metrics,
//! * `yield_stats` – summary statistics on the simulated yields.
//!
//! All sites are processed against the same [`YieldModel`] (parameters +
//! weather table). Failures are **per-site**: a site that cannot resolve
//! its dates ends up with error records and partial attributes, and the
//! batch keeps going.
//!
//! ## Execution modes
//! -----------------
//! With the `progress` feature the batch loop renders a live progress bar
//! (via `indicatif`) with a moving-average iteration time, which helps
//! spot pathological sites in large trial networks.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use iparyield::model::YieldModel;
//! use iparyield::params::ModelParams;
//! use iparyield::phenology::TrialRecord;
//! use iparyield::site::Site;
//! use iparyield::sites::{SiteFit, SiteSet};
//!
//! # fn demo(trials: Vec<(u64, u32, TrialRecord)>) -> Result<(), iparyield::errors::YieldModelError> {
//! let model = YieldModel::from_csv_path("weather.csv", ModelParams::default())?;
//!
//! let mut sites = SiteSet::default();
//! for (uid, location, trial) in trials {
//!     sites.insert(uid, Site::new(uid, location, trial));
//! }
//!
//! let outcome = sites.fit_all_sites(&model);
//! eprintln!("fitted {} sites, {} with errors", outcome.fitted, outcome.with_errors);
//! if let Some(stats) = sites.yield_stats() {
//!     eprintln!("{:#}", stats);
//! }
//! # Ok(()) }
//! ```
use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;

use crate::constants::SiteId;
use crate::model::YieldModel;
use crate::site::Site;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "progress")]
use self::progress_bar::{fmt_dur, IterTimer};
#[cfg(feature = "progress")]
use std::time::Duration;

#[cfg(feature = "progress")]
pub mod progress_bar;

/// All sites of a run, keyed by site id with the crate-wide fast hasher.
pub type SiteSet = HashMap<SiteId, Site, RandomState>;

/// Set-level outcome of a batch fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FitOutcome {
    /// Sites processed.
    pub fitted: usize,
    /// Sites that accumulated at least one error record.
    pub with_errors: usize,
}

/// Summary statistics for the simulated yields of a site set.
///
/// Percentiles use the *nearest-rank* method: the index is
/// `round(q × (N−1))`, clamped to the valid range, which stays stable on
/// small samples.
///
/// Display
/// -----------------
/// * `format!("{}", stats)` – compact single line:
///   ```text
///   n=120, min=1.24, p25=2.81, median=3.55, p95=5.90, max=7.02
///   ```
/// * `format!("{:#}", stats)` – pretty multi-line table.
#[derive(Debug, Clone, Copy)]
pub struct YieldStats {
    /// Number of sites with a simulated yield.
    pub n: usize,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p95: f64,
    pub max: f64,
}

impl fmt::Display for YieldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Simulated yield (t/ha) — summary")?;
            writeln!(f, "--------------------------------")?;
            writeln!(f, "n      : {}", self.n)?;
            writeln!(f, "min    : {:.2}", self.min)?;
            writeln!(f, "p25    : {:.2}", self.p25)?;
            writeln!(f, "median : {:.2}", self.median)?;
            writeln!(f, "p95    : {:.2}", self.p95)?;
            write!(f, "max    : {:.2}", self.max)
        } else {
            write!(
                f,
                "n={}, min={:.2}, p25={:.2}, median={:.2}, p95={:.2}, max={:.2}",
                self.n, self.min, self.p25, self.median, self.p95, self.max
            )
        }
    }
}

pub trait SiteFit {
    /// Fit the yield model on **every site** of the set, in place.
    ///
    /// All sites run against the same model; per-site failures become
    /// error records on the site and never abort the batch.
    ///
    /// Arguments
    /// -----------------
    /// * `model`: shared parameters and weather table.
    ///
    /// Return
    /// ----------
    /// * A [`FitOutcome`] with the processed and errored counts.
    fn fit_all_sites(&mut self, model: &YieldModel) -> FitOutcome;

    /// Number of sites in the set.
    fn number_of_sites(&self) -> usize;

    /// Total error records accumulated across all sites.
    fn total_errors(&self) -> usize;

    /// Distribution statistics over the best available simulated yield
    /// of each site (observed-phenology yield when present, otherwise
    /// the first predicted flavour carrying a value).
    ///
    /// Return
    /// ----------
    /// * `None` when no site carries any simulated yield.
    fn yield_stats(&self) -> Option<YieldStats>;
}

/// Best available simulated yield of one site: the observed flavour when
/// present, then the progressively more predicted ones.
fn best_yield(site: &Site) -> Option<f64> {
    site.yields
        .observed
        .or(site.yields.pred_heading)
        .or(site.yields.pred_maturity)
        .or(site.yields.pred_both)
}

impl SiteFit for SiteSet {
    #[cfg(not(feature = "progress"))]
    fn fit_all_sites(&mut self, model: &YieldModel) -> FitOutcome {
        let mut outcome = FitOutcome::default();
        for site in self.values_mut() {
            site.fit(model);
            outcome.fitted += 1;
            if !site.errors.is_empty() {
                outcome.with_errors += 1;
            }
        }
        outcome
    }

    #[cfg(feature = "progress")]
    fn fit_all_sites(&mut self, model: &YieldModel) -> FitOutcome {
        let total = self.len() as u64;
        let pb = ProgressBar::new(total.max(1));
        pb.set_style(
            ProgressStyle::with_template(
                "{bar:40.green/white} {pos}/{len} ({percent:>3}%) | {per_sec} | ETA {eta_precise} | {msg}",
            )
            .expect("indicatif template"),
        );
        pb.enable_steady_tick(Duration::from_millis(200));

        let mut outcome = FitOutcome::default();
        let mut it_timer = IterTimer::new(0.2);

        for site in self.values_mut() {
            let last = it_timer.tick();
            let avg = it_timer.avg();
            pb.set_message(format!("last: {}, avg: {}", fmt_dur(last), fmt_dur(avg)));

            site.fit(model);
            outcome.fitted += 1;
            if !site.errors.is_empty() {
                outcome.with_errors += 1;
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        outcome
    }

    #[inline]
    fn number_of_sites(&self) -> usize {
        self.len()
    }

    #[inline]
    fn total_errors(&self) -> usize {
        self.values().map(|s| s.errors.len()).sum()
    }

    fn yield_stats(&self) -> Option<YieldStats> {
        let mut yields: Vec<f64> = self.values().filter_map(best_yield).collect();
        if yields.is_empty() {
            return None;
        }
        yields.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        #[inline]
        fn q_index(n: usize, q: f64) -> usize {
            let pos = q * (n as f64 - 1.0);
            let idx = pos.round() as isize;
            idx.clamp(0, (n as isize) - 1) as usize
        }

        let n = yields.len();
        Some(YieldStats {
            n,
            min: yields[0],
            max: yields[n - 1],
            p25: yields[q_index(n, 0.25)],
            median: yields[q_index(n, 0.50)],
            p95: yields[q_index(n, 0.95)],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site_with_yield(uid: SiteId, y: f64) -> Site {
        let mut site = Site::new(uid, 1, Default::default());
        site.yields.observed = Some(y);
        site
    }

    #[test]
    fn yield_stats_nearest_rank_small_sample() {
        let mut set = SiteSet::default();
        for (i, y) in [3.0, 1.0, 2.0].into_iter().enumerate() {
            set.insert(i as SiteId, site_with_yield(i as SiteId, y));
        }
        let stats = set.yield_stats().unwrap();
        assert_eq!(stats.n, 3);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.p95, 3.0);
        assert_eq!(stats.max, 3.0);
    }

    #[test]
    fn yield_stats_empty_when_nothing_simulated() {
        let mut set = SiteSet::default();
        set.insert(1, Site::new(1, 1, Default::default()));
        assert!(set.yield_stats().is_none());
        assert_eq!(set.number_of_sites(), 1);
        assert_eq!(set.total_errors(), 0);
    }

    #[test]
    fn display_forms() {
        let stats = YieldStats {
            n: 2,
            min: 1.0,
            p25: 1.0,
            median: 2.0,
            p95: 3.0,
            max: 3.0,
        };
        let compact = format!("{stats}");
        assert!(compact.contains("median=2.00"));
        let pretty = format!("{stats:#}");
        assert!(pretty.contains("median : 2.00"));
    }
}
