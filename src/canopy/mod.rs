//! # Canopy: simulated greenness and light interception
//!
//! ## Overview
//! -----------------
//! Once the thermal-time trajectory of a period is normalized into
//! `[0, 1]`, the canopy layer turns it into radiation capture:
//!
//! 1. [`ndvi`] – the two NDVI regimes: a rising vegetative curve from
//!    emergence to heading, and a senescence decay from heading to
//!    maturity anchored on the NDVI reached at heading.
//! 2. [`ipar`] – the NDVI → fractional light interception line, the
//!    temperature reduction factor (PRFT), and the season-long
//!    concatenation that stitches a vegetative segment to a grain-fill
//!    segment without double-counting the heading day.
//!
//! Every function here is a pure elementwise transformation; period
//! bookkeeping stays in [`crate::periods`] and [`crate::site`].
pub mod ipar;
pub mod ndvi;

pub use self::ipar::{clamp_ipar, estimate_ipar, ndvi_to_ipar, prft, IparSeries};
pub use self::ndvi::{ndvi_grainfill, ndvi_vegetative};
