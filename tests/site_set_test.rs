mod common;

use common::{constant_weather, day, reference_trial};

use iparyield::model::YieldModel;
use iparyield::params::ModelParams;
use iparyield::phenology::TrialRecord;
use iparyield::site::Site;
use iparyield::sites::{SiteFit, SiteSet};

/// One failing site must not poison its siblings: the batch keeps going,
/// the broken site carries error records, the good ones carry yields.
#[test]
fn batch_fit_isolates_failing_sites() {
    let model = YieldModel::new(
        ModelParams::default(),
        constant_weather(17, day(2015, 11, 15), 400),
    );

    let mut sites = SiteSet::default();
    sites.insert(1, Site::new(1, 17, reference_trial()));

    // Malformed sowing date: the stage fails, the site records it.
    let broken = TrialRecord {
        sowing: Some("15/11/2015".into()),
        latitude: Some(27.5),
        ..TrialRecord::default()
    };
    sites.insert(2, Site::new(2, 17, broken));

    // Unknown location: no weather rows.
    let nowhere = TrialRecord {
        sowing: Some("2015-11-15".into()),
        latitude: Some(27.5),
        ..TrialRecord::default()
    };
    sites.insert(3, Site::new(3, 99, nowhere));

    let outcome = sites.fit_all_sites(&model);
    assert_eq!(outcome.fitted, 3);
    assert_eq!(outcome.with_errors, 2);
    assert_eq!(sites.number_of_sites(), 3);
    assert_eq!(sites.total_errors(), 2);

    let good = &sites[&1];
    assert!(good.errors.is_empty());
    assert!(good.yields.pred_both.is_some());

    let broken = &sites[&2];
    assert_eq!(broken.errors.len(), 1);
    assert!(broken.periods.is_empty());
    assert_eq!(broken.yields.pred_both, None);

    let nowhere = &sites[&3];
    assert_eq!(nowhere.errors.len(), 1);
    assert!(nowhere.errors[0].message.contains("no rows for location 99"));

    // Stats cover the single site that produced a yield.
    let stats = sites.yield_stats().unwrap();
    assert_eq!(stats.n, 1);
    assert_eq!(stats.min, stats.max);
}

/// Sites are independent: fitting the same trial twice against the same
/// model is deterministic down to the reported attributes.
#[test]
fn repeated_fits_are_deterministic() {
    let model = YieldModel::new(
        ModelParams::default(),
        constant_weather(17, day(2015, 11, 15), 400),
    );

    let mut a = Site::new(1, 17, reference_trial());
    let mut b = Site::new(1, 17, reference_trial());
    a.fit(&model);
    b.fit(&model);

    assert_eq!(a.dates, b.dates);
    assert_eq!(a.yields, b.yields);
    assert_eq!(a.errors, b.errors);
}
