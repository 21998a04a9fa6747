//! Astronomical daylength (photoperiod) from date and latitude.
//!
//! Implements the CBM daylength model of Forsythe et al. (1995), the
//! standard choice for photoperiod-driven crop phenology. The twilight
//! coefficient `p` shifts the effective sunrise/sunset elevation angle:
//! `p = 0` is the geometric sunrise, `p = 6` the civil-twilight variant.
use chrono::{Datelike, NaiveDate};

use crate::constants::Hours;

/// Daylength in hours for a date and latitude.
///
/// Arguments
/// -----------------
/// * `date`: calendar date (only the day of year matters).
/// * `latitude`: site latitude in degrees, north positive.
/// * `p`: twilight coefficient in degrees (0 = sunrise/sunset).
///
/// Return
/// ----------
/// * Daylength in hours, clamped to `[0, 24]` for polar day/night.
pub fn daylength(date: NaiveDate, latitude: f64, p: f64) -> Hours {
    let doy = date.ordinal() as f64;

    // Revolution angle and solar declination (Forsythe 1995, eqs. 1-2).
    let theta = 0.2163108 + 2.0 * (0.9671396 * (0.00860 * (doy - 186.0)).tan()).atan();
    let phi = (0.39795 * theta.cos()).asin();

    let lat_rad = latitude.to_radians();
    let p_rad = p.to_radians();

    let cos_hour_angle =
        (p_rad.sin() + lat_rad.sin() * phi.sin()) / (lat_rad.cos() * phi.cos());

    // Polar night / polar day fall outside acos's domain.
    if cos_hour_angle <= -1.0 {
        return 0.0;
    }
    if cos_hour_angle >= 1.0 {
        return 24.0;
    }

    24.0 - (24.0 / std::f64::consts::PI) * cos_hour_angle.acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn equator_is_near_twelve_hours_year_round() {
        for date in [day(2016, 3, 20), day(2016, 6, 21), day(2016, 12, 21)] {
            let dl = daylength(date, 0.0, 0.0);
            assert_relative_eq!(dl, 12.0, epsilon = 0.25);
        }
    }

    #[test]
    fn northern_winter_days_are_short() {
        let winter = daylength(day(2015, 12, 20), 27.5, 0.0);
        let summer = daylength(day(2016, 6, 20), 27.5, 0.0);
        assert!(winter < 11.0, "winter daylength {winter}");
        assert!(summer > 13.0, "summer daylength {summer}");
    }

    #[test]
    fn polar_night_clamps_to_zero() {
        assert_eq!(daylength(day(2015, 12, 21), 80.0, 0.0), 0.0);
        assert_eq!(daylength(day(2015, 6, 21), 80.0, 0.0), 24.0);
    }

    #[test]
    fn twilight_coefficient_lengthens_the_day() {
        let base = daylength(day(2016, 4, 1), 45.0, 0.0);
        let civil = daylength(day(2016, 4, 1), 45.0, 6.0);
        assert!(civil > base);
    }
}
