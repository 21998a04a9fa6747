use thiserror::Error;

/// Failure modes of the yield model.
///
/// Errors are raised by individual pipeline stages and, during a per-site
/// [`fit`](crate::site::Site::fit), converted into structured
/// [`SiteError`](crate::site::SiteError) records on the site rather than
/// aborting the run. Only the data-loading entry points surface these
/// directly to the caller.
#[derive(Error, Debug)]
pub enum YieldModelError {
    #[error("Invalid date string `{0}`: expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Sowing date is missing or not valid")]
    MissingSowingDate,

    #[error("Latitude is missing; daylength cannot be computed")]
    MissingLatitude,

    #[error("Weather table has no rows for location {location} between {start} and {end}")]
    EmptyWeatherWindow {
        location: u32,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    #[error("Cumulative series for {0} is empty; threshold search impossible")]
    EmptyCumulativeSeries(&'static str),

    #[error("Series length mismatch: {0} vs {1}")]
    SeriesLengthMismatch(usize, usize),

    #[error("{start} is on or after {end}")]
    PeriodOrdering { start: String, end: String },

    #[error("Invalid parameter value: {0}")]
    InvalidParameter(&'static str),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for YieldModelError {
    fn eq(&self, other: &Self) -> bool {
        use YieldModelError::*;
        match (self, other) {
            (InvalidDate(a), InvalidDate(b)) => a == b,
            (MissingSowingDate, MissingSowingDate) => true,
            (MissingLatitude, MissingLatitude) => true,
            (
                EmptyWeatherWindow {
                    location: l1,
                    start: s1,
                    end: e1,
                },
                EmptyWeatherWindow {
                    location: l2,
                    start: s2,
                    end: e2,
                },
            ) => l1 == l2 && s1 == s2 && e1 == e2,
            (EmptyCumulativeSeries(a), EmptyCumulativeSeries(b)) => a == b,
            (SeriesLengthMismatch(a1, b1), SeriesLengthMismatch(a2, b2)) => a1 == a2 && b1 == b2,
            (PeriodOrdering { start: s1, end: e1 }, PeriodOrdering { start: s2, end: e2 }) => {
                s1 == s2 && e1 == e2
            }
            (InvalidParameter(a), InvalidParameter(b)) => a == b,

            // Wrapped foreign errors are not comparable: equality on variant only.
            (CsvError(_), CsvError(_)) => true,
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
