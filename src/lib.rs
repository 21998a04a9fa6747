//! Estimation of wheat phenology, canopy light interception and grain
//! yield for multi-environment field trials.
//!
//! Given a sowing date, a latitude and a daily weather table, the model
//! fills missing stage dates (emergence, heading, maturity) from thermal
//! time and photoperiod regressions, simulates an NDVI trajectory per
//! growth period, converts it into intercepted radiation, accumulates
//! gross primary production and scales it into a simulated grain yield —
//! once per observed/estimated phenology combination, so downstream
//! analyses can compare like with like.
//!
//! Entry points: [`model::YieldModel`] (parameters + weather),
//! [`site::Site::fit`] for one plot, [`sites::SiteFit`] for a whole set.
pub mod canopy;
pub mod constants;
pub mod errors;
pub mod model;
pub mod params;
pub mod periods;
pub mod phenology;
pub mod site;
pub mod sites;
pub mod thermal;
pub mod weather;

pub use errors::YieldModelError;
pub use model::YieldModel;
pub use params::ModelParams;
pub use periods::{PeriodVariant, SeasonVariant};
pub use phenology::TrialRecord;
pub use site::Site;
pub use sites::{SiteFit, SiteSet};
