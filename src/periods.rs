//! # Named growth periods and their weather aggregates
//!
//! ## Overview
//! -----------------
//! Every derived quantity of the pipeline is attached to a **named date
//! interval** between two phenology events — sowing to emergence, heading
//! to maturity, and all the combinations that substitute a predicted date
//! for a missing observed one. Rather than hand-writing one code block
//! per combination, this module enumerates them:
//!
//! * [`PhenoEvent`] – the nine anchor events a period can start or end
//!   on (observed and predicted stage dates plus the DAP mark).
//! * [`PeriodVariant`] – the 19 named intervals, each a `(start, end]`
//!   filter over the site's weather window.
//! * [`SeasonVariant`] – the 8 vegetative × grain-fill pairings that form
//!   a full emergence-to-maturity season for the light-interception and
//!   GPP stages.
//! * [`PeriodData`] – the fixed per-period sub-record (day count, weather
//!   statistics, cumulative GDD, and the series later stages fill in).
//!
//! Computation iterates `PeriodVariant::ALL`, so adding a variant means
//! adding an enum row, not copying a block.
//!
//! ## Availability semantics
//! -----------------
//! A period is *unavailable* (absent from the map) when an endpoint date
//! is missing or its filter matches no weather rows — that is normal and
//! silent. A grain-fill period whose start is on or after its end is an
//! **ordering violation**: the period is dropped *and* a structured error
//! is reported to the caller.
use ahash::RandomState;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::errors::YieldModelError;
use crate::phenology::PhenologyDates;
use crate::thermal::{cumsum, nanmax, nanmean, round_to};
use crate::weather::WeatherWindow;

/// Map from period variant to its per-period record, with the crate-wide
/// fast hasher.
pub type PeriodMap = HashMap<PeriodVariant, PeriodData, RandomState>;

/// The anchor events a period can start or end on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhenoEvent {
    Sowing,
    Emergence,
    PredEmergence,
    Heading,
    PredHeading,
    Maturity,
    /// Maturity predicted from the observed heading anchor.
    PredMaturityH,
    /// Maturity predicted from the predicted heading anchor.
    PredMaturityPh,
    /// The date `days_after_planting` days after sowing.
    DapMark,
}

impl PhenoEvent {
    /// Human-readable name used in ordering-violation errors.
    pub fn describe(self) -> &'static str {
        match self {
            PhenoEvent::Sowing => "sowing",
            PhenoEvent::Emergence => "observed emergence",
            PhenoEvent::PredEmergence => "estimated emergence",
            PhenoEvent::Heading => "observed heading",
            PhenoEvent::PredHeading => "estimated heading",
            PhenoEvent::Maturity => "observed maturity",
            PhenoEvent::PredMaturityH => "estimated maturity",
            PhenoEvent::PredMaturityPh => "estimated maturity",
            PhenoEvent::DapMark => "the days-after-planting mark",
        }
    }
}

impl PhenologyDates {
    /// Resolve an anchor event to its date, when available.
    pub fn event_date(&self, event: PhenoEvent) -> Option<NaiveDate> {
        match event {
            PhenoEvent::Sowing => self.sowing,
            PhenoEvent::Emergence => self.emergence,
            PhenoEvent::PredEmergence => self.pred_emergence,
            PhenoEvent::Heading => self.heading,
            PhenoEvent::PredHeading => self.pred_heading,
            PhenoEvent::Maturity => self.maturity,
            PhenoEvent::PredMaturityH => self.pred_maturity_h,
            PhenoEvent::PredMaturityPh => self.pred_maturity_ph,
            PhenoEvent::DapMark => self.date_at_dap,
        }
    }
}

/// The 19 named period variants.
///
/// Suffix convention in `Display` and attribute names: a lowercase `p`
/// marks the predicted flavour of the event that follows (`pEH` = from
/// predicted emergence to observed heading).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodVariant {
    SowingEmergence,
    SowingPredEmergence,
    EmergenceHeading,
    PredEmergenceHeading,
    EmergencePredHeading,
    PredEmergencePredHeading,
    EmergenceMaturity,
    PredEmergenceMaturity,
    PredEmergencePredMaturity,
    SowingMaturity,
    SowingPredMaturity,
    SowingHeading,
    SowingPredHeading,
    HeadingMaturity,
    HeadingPredMaturity,
    PredHeadingMaturity,
    PredHeadingPredMaturity,
    DapMarkHeading,
    DapMarkPredHeading,
}

impl PeriodVariant {
    /// Every variant, in reporting order.
    pub const ALL: [PeriodVariant; 19] = [
        PeriodVariant::SowingEmergence,
        PeriodVariant::SowingPredEmergence,
        PeriodVariant::EmergenceHeading,
        PeriodVariant::PredEmergenceHeading,
        PeriodVariant::EmergencePredHeading,
        PeriodVariant::PredEmergencePredHeading,
        PeriodVariant::EmergenceMaturity,
        PeriodVariant::PredEmergenceMaturity,
        PeriodVariant::PredEmergencePredMaturity,
        PeriodVariant::SowingMaturity,
        PeriodVariant::SowingPredMaturity,
        PeriodVariant::SowingHeading,
        PeriodVariant::SowingPredHeading,
        PeriodVariant::HeadingMaturity,
        PeriodVariant::HeadingPredMaturity,
        PeriodVariant::PredHeadingMaturity,
        PeriodVariant::PredHeadingPredMaturity,
        PeriodVariant::DapMarkHeading,
        PeriodVariant::DapMarkPredHeading,
    ];

    /// The `(start, end)` anchor events of this period. Predicted
    /// maturity always refers to the estimate whose heading flavour
    /// matches the period's other anchor, except the sowing- and
    /// emergence-rooted spans which use the observed-heading estimate.
    pub fn bounds(self) -> (PhenoEvent, PhenoEvent) {
        use PeriodVariant::*;
        use PhenoEvent::*;
        match self {
            SowingEmergence => (Sowing, Emergence),
            SowingPredEmergence => (Sowing, PredEmergence),
            EmergenceHeading => (Emergence, Heading),
            PredEmergenceHeading => (PredEmergence, Heading),
            EmergencePredHeading => (Emergence, PredHeading),
            PredEmergencePredHeading => (PredEmergence, PredHeading),
            EmergenceMaturity => (Emergence, Maturity),
            PredEmergenceMaturity => (PredEmergence, Maturity),
            PredEmergencePredMaturity => (PredEmergence, PredMaturityH),
            SowingMaturity => (Sowing, Maturity),
            SowingPredMaturity => (Sowing, PredMaturityH),
            SowingHeading => (Sowing, Heading),
            SowingPredHeading => (Sowing, PredHeading),
            HeadingMaturity => (Heading, Maturity),
            HeadingPredMaturity => (Heading, PredMaturityH),
            PredHeadingMaturity => (PredHeading, Maturity),
            PredHeadingPredMaturity => (PredHeading, PredMaturityPh),
            DapMarkHeading => (DapMark, Heading),
            DapMarkPredHeading => (DapMark, PredHeading),
        }
    }

    /// Attribute-name suffix (`EH`, `pEpH`, …), matching the reporting
    /// convention of the trial network.
    pub fn suffix(self) -> &'static str {
        use PeriodVariant::*;
        match self {
            SowingEmergence => "SE",
            SowingPredEmergence => "SpE",
            EmergenceHeading => "EH",
            PredEmergenceHeading => "pEH",
            EmergencePredHeading => "EpH",
            PredEmergencePredHeading => "pEpH",
            EmergenceMaturity => "EM",
            PredEmergenceMaturity => "pEM",
            PredEmergencePredMaturity => "pEpM",
            SowingMaturity => "SM",
            SowingPredMaturity => "SpM",
            SowingHeading => "SH",
            SowingPredHeading => "SpH",
            HeadingMaturity => "HM",
            HeadingPredMaturity => "HpM",
            PredHeadingMaturity => "pHM",
            PredHeadingPredMaturity => "pHpM",
            DapMarkHeading => "dDAS_H",
            DapMarkPredHeading => "dDAS_pH",
        }
    }

    /// Vegetative family: the four emergence → heading flavours whose
    /// thermal time is normalized and fed to the rising NDVI curve.
    pub fn is_vegetative(self) -> bool {
        matches!(
            self,
            PeriodVariant::EmergenceHeading
                | PeriodVariant::PredEmergenceHeading
                | PeriodVariant::EmergencePredHeading
                | PeriodVariant::PredEmergencePredHeading
        )
    }

    /// Grain-fill family: the four heading → maturity flavours. These are
    /// the only periods checked for an ordering violation.
    pub fn is_grainfill(self) -> bool {
        matches!(
            self,
            PeriodVariant::HeadingMaturity
                | PeriodVariant::HeadingPredMaturity
                | PeriodVariant::PredHeadingMaturity
                | PeriodVariant::PredHeadingPredMaturity
        )
    }

    /// Anchor lookup order for the grain-fill NDVI curve: which
    /// vegetative variants supply the NDVI-at-heading value, most
    /// specific first.
    pub fn ndvi_anchor_priority(self) -> Option<[PeriodVariant; 2]> {
        use PeriodVariant::*;
        match self {
            HeadingMaturity | HeadingPredMaturity => Some([EmergenceHeading, PredEmergenceHeading]),
            PredHeadingMaturity | PredHeadingPredMaturity => {
                Some([EmergencePredHeading, PredEmergencePredHeading])
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for PeriodVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// The 8 vegetative × grain-fill pairings forming a full season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonVariant {
    /// Observed phenology end to end (EH + HM).
    Observed,
    /// Estimated emergence, observed heading and maturity (pEH + HM).
    PredEmergence,
    /// Estimated heading (EpH + pHM).
    PredHeading,
    /// Estimated emergence and heading (pEpH + pHM).
    PredEmergenceHeading,
    /// Estimated maturity (EH + HpM).
    PredMaturity,
    /// Estimated emergence and maturity (pEH + HpM).
    PredEmergenceMaturity,
    /// Estimated heading and maturity (EpH + pHpM).
    PredHeadingMaturity,
    /// Fully estimated phenology (pEpH + pHpM).
    AllPredicted,
}

impl SeasonVariant {
    pub const ALL: [SeasonVariant; 8] = [
        SeasonVariant::Observed,
        SeasonVariant::PredEmergence,
        SeasonVariant::PredHeading,
        SeasonVariant::PredEmergenceHeading,
        SeasonVariant::PredMaturity,
        SeasonVariant::PredEmergenceMaturity,
        SeasonVariant::PredHeadingMaturity,
        SeasonVariant::AllPredicted,
    ];

    /// The vegetative half of the pairing.
    pub fn vegetative(self) -> PeriodVariant {
        use SeasonVariant::*;
        match self {
            Observed | PredMaturity => PeriodVariant::EmergenceHeading,
            PredEmergence | PredEmergenceMaturity => PeriodVariant::PredEmergenceHeading,
            PredHeading | PredHeadingMaturity => PeriodVariant::EmergencePredHeading,
            PredEmergenceHeading | AllPredicted => PeriodVariant::PredEmergencePredHeading,
        }
    }

    /// The grain-fill half of the pairing.
    pub fn grainfill(self) -> PeriodVariant {
        use SeasonVariant::*;
        match self {
            Observed | PredEmergence => PeriodVariant::HeadingMaturity,
            PredHeading | PredEmergenceHeading => PeriodVariant::PredHeadingMaturity,
            PredMaturity | PredEmergenceMaturity => PeriodVariant::HeadingPredMaturity,
            PredHeadingMaturity | AllPredicted => PeriodVariant::PredHeadingPredMaturity,
        }
    }

    /// Attribute-name suffix (`EHHM`, `pEpHpHpM`, …).
    pub fn suffix(self) -> &'static str {
        use SeasonVariant::*;
        match self {
            Observed => "EHHM",
            PredEmergence => "pEHHM",
            PredHeading => "EpHpHM",
            PredEmergenceHeading => "pEpHpHM",
            PredMaturity => "EHHpM",
            PredEmergenceMaturity => "pEHHpM",
            PredHeadingMaturity => "EpHpHpM",
            AllPredicted => "pEpHpHpM",
        }
    }
}

impl std::fmt::Display for SeasonVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Aggregated weather over one period, at reporting precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherStats {
    /// Mean daily minimum temperature, 1 decimal (°C).
    pub tmin: f64,
    /// Mean daily maximum temperature, 1 decimal (°C).
    pub tmax: f64,
    /// Mean daily mean temperature, 1 decimal (°C).
    pub tavg: f64,
    /// Mean daily solar radiation, 1 decimal (MJ m⁻² d⁻¹).
    pub solrad: f64,
    /// Total precipitation, whole millimetres.
    pub precip: f64,
}

/// Fixed per-period sub-record. The mask and the simple aggregates are
/// filled by [`build_periods`]; the series fields are filled by the
/// later simulation stages, and stay `None` when a stage could not run
/// for this variant.
#[derive(Debug, Clone, Default)]
pub struct PeriodData {
    /// Window row indices in `(start, end]`.
    pub mask: Vec<usize>,
    /// Number of weather rows (days) in the period.
    pub days: usize,
    /// Aggregated weather at reporting precision.
    pub stats: Option<WeatherStats>,
    /// Max of the cumulative GDD over the period rows.
    pub cum_gdd: Option<f64>,
    /// Normalized thermal time (vegetative and grain-fill families).
    pub norm_tt: Option<Vec<f64>>,
    /// Simulated NDVI trajectory.
    pub sim_ndvi: Option<Vec<f64>>,
    /// NDVI reached at heading (vegetative family; later overwritten by
    /// the GPP recalibration).
    pub ndvi_at_heading: Option<f64>,
    /// Day temperature series.
    pub tday: Option<Vec<f64>>,
    /// Photosynthesis reduction factor series.
    pub prft: Option<Vec<f64>>,
    /// Solar radiation series.
    pub solrad: Option<Vec<f64>>,
    /// Light-interception series for this segment.
    pub ipar: Option<Vec<f64>>,
    /// Sum of the segment iPAR, 3 decimals.
    pub ipar_total: Option<f64>,
    /// Daily GPP series for this segment.
    pub gpp: Option<Vec<f64>>,
    /// Max of cumulative GPP, 3 decimals.
    pub cum_gpp: Option<f64>,
    /// Sum of GPP, 3 decimals.
    pub gpp_total: Option<f64>,
    /// Simulated grain yield (grain-fill family only), 2 decimals.
    pub sim_yield: Option<f64>,
}

/// Map from season variant to its per-season record.
pub type SeasonMap = HashMap<SeasonVariant, SeasonData, RandomState>;

/// Per-season sub-record: the series spanning a full vegetative +
/// grain-fill pairing. Filled by the light-interception and GPP stages;
/// `None` means the pairing was unavailable for this site.
#[derive(Debug, Clone, Default)]
pub struct SeasonData {
    /// Simulated NDVI over the whole season.
    pub ndvi: Option<Vec<f64>>,
    /// Season iPAR series.
    pub ipar: Option<Vec<f64>>,
    /// Sum of the season iPAR, 3 decimals.
    pub ipar_total: Option<f64>,
    /// Concatenated PRFT series.
    pub prft: Option<Vec<f64>>,
    /// Concatenated solar radiation series.
    pub solrad: Option<Vec<f64>>,
    /// Daily intercepted PAR flux: `iPAR · PRFT · SolRad · 0.5`.
    pub fipar: Option<Vec<f64>>,
    /// Sum of the daily intercepted PAR flux, 3 decimals.
    pub fipar_total: Option<f64>,
    /// Min–max normalized season iPAR.
    pub norm_ipar: Option<Vec<f64>>,
    /// Daily GPP series over the season.
    pub gpp: Option<Vec<f64>>,
    /// Max of cumulative season GPP, 3 decimals.
    pub cum_gpp: Option<f64>,
}

impl PeriodData {
    /// Build the base record for one accepted mask: day count, weather
    /// statistics and cumulative GDD.
    pub fn from_mask(window: &WeatherWindow, mask: Vec<usize>, gdd: &[f64]) -> Self {
        let tmin = window.select(&mask, |r| r.tmin);
        let tmax = window.select(&mask, |r| r.tmax);
        let tavg = window.select(&mask, |r| r.tavg);
        let solrad = window.select(&mask, |r| r.solrad);
        let precip = window.select(&mask, |r| r.precip);

        let stats = WeatherStats {
            tmin: round_to(nanmean(&tmin), 1),
            tmax: round_to(nanmean(&tmax), 1),
            tavg: round_to(nanmean(&tavg), 1),
            solrad: round_to(nanmean(&solrad), 1),
            precip: round_to(precip.iter().sum(), 0),
        };

        // A missing GDD series (phenology stage skipped) reads as NaN.
        let gdd_slice: Vec<f64> = mask
            .iter()
            .map(|&i| gdd.get(i).copied().unwrap_or(f64::NAN))
            .collect();
        let cum_gdd = nanmax(&cumsum(&gdd_slice));

        PeriodData {
            days: mask.len(),
            stats: Some(stats),
            cum_gdd: if cum_gdd.is_nan() { None } else { Some(cum_gdd) },
            mask,
            ..PeriodData::default()
        }
    }

    /// Cumulative GDD series over the period rows (unreduced).
    pub fn cum_gdd_series(&self, gdd: &[f64]) -> Vec<f64> {
        let slice: Vec<f64> = self
            .mask
            .iter()
            .map(|&i| gdd.get(i).copied().unwrap_or(f64::NAN))
            .collect();
        cumsum(&slice)
    }
}

/// Build every available period for a site.
///
/// Arguments
/// -----------------
/// * `dates`: resolved observed/predicted date matrix.
/// * `window`: the site's weather window.
/// * `gdd`: daily GDD aligned with the window rows.
///
/// Return
/// ----------
/// * The map of accepted periods, and the ordering-violation errors
///   encountered while building it (recorded by the caller on the site).
///
/// A variant is skipped silently when an endpoint is unavailable or its
/// filter matches no rows; only a grain-fill `start >= end` produces an
/// error entry.
pub fn build_periods(
    dates: &PhenologyDates,
    window: &WeatherWindow,
    gdd: &[f64],
) -> (PeriodMap, Vec<YieldModelError>) {
    let mut periods = PeriodMap::default();
    let mut violations = Vec::new();

    for variant in PeriodVariant::ALL {
        let (start_event, end_event) = variant.bounds();
        let (Some(start), Some(end)) = (
            dates.event_date(start_event),
            dates.event_date(end_event),
        ) else {
            continue;
        };

        if variant.is_grainfill() && start >= end {
            violations.push(YieldModelError::PeriodOrdering {
                start: start_event.describe().to_string(),
                end: end_event.describe().to_string(),
            });
            continue;
        }

        let mask = window.mask_between(start, end);
        if mask.is_empty() {
            continue;
        }
        periods.insert(variant, PeriodData::from_mask(window, mask, gdd));
    }

    (periods, violations)
}
