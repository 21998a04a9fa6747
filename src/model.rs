//! # YieldModel: parameters and weather, wired together
//!
//! This module defines the [`YieldModel`] struct, the central façade that
//! wires together the two read-only collaborators every per-site
//! computation needs:
//!
//! 1. **Model parameters** ([`ModelParams`](crate::params::ModelParams)) —
//!    thermal-time, phenology, canopy and yield constants.
//! 2. **Weather table** ([`WeatherTable`](crate::weather::WeatherTable)) —
//!    the daily records for every trial location, loaded once and only
//!    ever sliced afterwards.
//!
//! The model is passed by shared reference into [`Site::fit`](crate::site::Site::fit)
//! and the batch trait; it holds no per-site state, so one instance can
//! serve any number of sites, including from parallel workers.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use iparyield::model::YieldModel;
//! use iparyield::params::ModelParams;
//! use iparyield::phenology::TrialRecord;
//! use iparyield::site::Site;
//!
//! let model = YieldModel::from_csv_path("weather.csv", ModelParams::default())?;
//!
//! let trial = TrialRecord {
//!     sowing: Some("2015-11-15".into()),
//!     latitude: Some(27.5),
//!     ..TrialRecord::default()
//! };
//! let mut site = Site::new(1, 17, trial);
//! site.fit(&model);
//! println!("simulated yield: {:?}", site.yields.pred_both);
//! # Ok::<(), iparyield::errors::YieldModelError>(())
//! ```
use std::path::Path;

use crate::errors::YieldModelError;
use crate::params::ModelParams;
use crate::weather::WeatherTable;

/// The shared, read-only context of a model run.
#[derive(Debug, Clone, Default)]
pub struct YieldModel {
    pub params: ModelParams,
    pub weather: WeatherTable,
}

impl YieldModel {
    /// Wire a model from already-loaded parts.
    pub fn new(params: ModelParams, weather: WeatherTable) -> Self {
        YieldModel { params, weather }
    }

    /// Load the weather table from CSV and wire the model.
    ///
    /// Return
    /// ----------
    /// * `Ok(YieldModel)` ready for per-site fits.
    /// * `Err(YieldModelError)` on an unreadable or malformed file.
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        params: ModelParams,
    ) -> Result<Self, YieldModelError> {
        Ok(YieldModel {
            params,
            weather: WeatherTable::from_csv_path(path)?,
        })
    }
}
