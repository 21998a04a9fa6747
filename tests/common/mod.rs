use chrono::{Days, NaiveDate};

use iparyield::phenology::TrialRecord;
use iparyield::weather::{WeatherRecord, WeatherTable};

/// Constant daily weather of the reference scenario: TMIN 10, TMAX 25,
/// SolRad 20, no precipitation — 17.5 GDD per day at Tbase 0.
pub fn constant_weather(
    location: u32,
    start: NaiveDate,
    days: u64,
) -> WeatherTable {
    weather_with(location, start, days, 10.0, 25.0, 20.0, 0.0)
}

pub fn weather_with(
    location: u32,
    start: NaiveDate,
    days: u64,
    tmin: f64,
    tmax: f64,
    solrad: f64,
    precip: f64,
) -> WeatherTable {
    let records = (0..days)
        .map(|i| WeatherRecord {
            location,
            date: start.checked_add_days(Days::new(i)).unwrap(),
            tmin,
            tmax,
            tavg: (tmin + tmax) / 2.0,
            solrad,
            precip,
        })
        .collect();
    WeatherTable::new(records)
}

/// Sowing-only trial record of the reference scenario.
pub fn reference_trial() -> TrialRecord {
    TrialRecord {
        sowing: Some("2015-11-15".into()),
        latitude: Some(27.5),
        nursery: Some("ESWYT".into()),
        ..TrialRecord::default()
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
