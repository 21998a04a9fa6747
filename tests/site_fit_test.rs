mod common;

use common::{constant_weather, day, reference_trial};

use iparyield::model::YieldModel;
use iparyield::params::ModelParams;
use iparyield::periods::{PeriodVariant, SeasonVariant};
use iparyield::phenology::TrialRecord;
use iparyield::site::Site;

/// Reference scenario: sowing 2015-11-15 at latitude 27.5, non-SAWYT
/// nursery, 400 days of constant weather, nothing observed beyond the
/// sowing date. The whole predicted chain must come out.
#[test]
fn sowing_only_site_runs_the_predicted_chain_end_to_end() {
    let model = YieldModel::new(
        ModelParams::default(),
        constant_weather(17, day(2015, 11, 15), 400),
    );
    let mut site = Site::new(1, 17, reference_trial());
    site.fit(&model);

    assert!(site.errors.is_empty(), "unexpected errors: {:?}", site.errors);

    // Emergence: 17.5 GDD/day, requirement 180 → cumulative 175 on day 9
    // beats 192.5 on day 10.
    assert_eq!(site.dates.pred_days_to_emergence, Some(9));
    assert_eq!(site.dates.pred_emergence, Some(day(2015, 11, 24)));

    // Daylength 35 days after sowing (2015-12-20) at 27.5°N is ~10.26 h,
    // below the 10.8 h boundary → short-day regression, truncated.
    let dl = site.dates.daylength_at_dap.unwrap();
    assert!(dl < 10.8, "daylength {dl} should select the short-day regime");
    assert_eq!(site.dates.date_at_dap, Some(day(2015, 12, 20)));
    assert_eq!(site.dates.pred_days_to_heading, Some(95));
    assert_eq!(site.dates.pred_heading, Some(day(2016, 2, 18)));

    // Maturity from the predicted heading: constant TAVG 17.5 gives
    // ~0.8 adjusted days per day, so 40 adjusted days ≈ 50 calendar days.
    assert_eq!(site.dates.pred_days_phm, Some(49));
    assert_eq!(site.dates.pred_maturity_ph, Some(day(2016, 4, 7)));
    // No observed heading anchor → no observed-heading maturity.
    assert_eq!(site.dates.pred_maturity_h, None);

    // Only the all-predicted period chain exists.
    assert!(site.periods.contains_key(&PeriodVariant::SowingPredEmergence));
    assert!(site
        .periods
        .contains_key(&PeriodVariant::PredEmergencePredHeading));
    assert!(site
        .periods
        .contains_key(&PeriodVariant::PredHeadingPredMaturity));
    assert!(!site.periods.contains_key(&PeriodVariant::HeadingMaturity));
    assert!(!site.periods.contains_key(&PeriodVariant::SowingMaturity));

    // The all-predicted season carries NDVI, iPAR and GPP.
    let season = &site.seasons[&SeasonVariant::AllPredicted];
    assert!(season.ipar_total.unwrap() > 0.0);
    assert!(season.cum_gpp.unwrap() > 0.0);

    // And the yield for the fully-estimated flavour is present and
    // plausible; the observed flavours stay absent.
    let y = site.yields.pred_both.expect("predicted yield missing");
    assert!(y >= 0.0, "yield must be non-negative, got {y}");
    assert!(y < 20.0, "implausible wheat yield {y} t/ha");
    assert_eq!(site.yields.observed, None);
    assert_eq!(
        site.periods[&PeriodVariant::PredHeadingPredMaturity].sim_yield,
        Some(y)
    );
}

/// A site with only sowing and heading observed, and no predicted
/// maturity of either flavour: building period filters directly must not
/// panic, and every heading→maturity attribute stays absent.
#[test]
fn period_filters_survive_missing_maturity() {
    let model = YieldModel::new(
        ModelParams::default(),
        constant_weather(17, day(2015, 11, 15), 400),
    );
    let trial = TrialRecord {
        sowing: Some("2015-11-15".into()),
        heading: Some("2016-02-20".into()),
        latitude: Some(27.5),
        ..TrialRecord::default()
    };
    let mut site = Site::new(2, 17, trial);
    site.dates = site.trial.resolve_dates().unwrap();
    site.window = Some(
        model
            .weather
            .window(17, day(2015, 11, 15), day(2016, 11, 14))
            .unwrap(),
    );

    site.build_period_records();

    assert!(site.errors.is_empty());
    assert!(site.periods.contains_key(&PeriodVariant::SowingHeading));
    assert!(!site.periods.contains_key(&PeriodVariant::HeadingMaturity));
    assert!(!site
        .periods
        .contains_key(&PeriodVariant::HeadingPredMaturity));
    assert!(!site
        .periods
        .contains_key(&PeriodVariant::PredHeadingPredMaturity));
}

/// Observed heading on or after observed maturity: the grain-fill period
/// is dropped, an error is recorded with the site's identifiers, and the
/// day count for heading→maturity stays unset.
#[test]
fn heading_after_maturity_is_reported_and_dropped() {
    let model = YieldModel::new(
        ModelParams::default(),
        constant_weather(3, day(2015, 11, 15), 400),
    );
    let trial = TrialRecord {
        sowing: Some("2015-11-15".into()),
        heading: Some("2016-04-20".into()),
        maturity: Some("2016-04-20".into()),
        latitude: Some(27.5),
        ..TrialRecord::default()
    };
    let mut site = Site::new(42, 3, trial);
    site.fit(&model);

    let ordering_errors: Vec<_> = site
        .errors
        .iter()
        .filter(|e| e.message.contains("observed heading"))
        .collect();
    assert!(
        !ordering_errors.is_empty(),
        "expected an ordering error, got {:?}",
        site.errors
    );
    assert_eq!(ordering_errors[0].uid, 42);
    assert_eq!(ordering_errors[0].location, 3);

    assert!(!site.periods.contains_key(&PeriodVariant::HeadingMaturity));
    assert_eq!(site.yields.observed, None);

    // The rest of the site still computed: sowing→maturity statistics
    // and the sowing→heading span survive.
    assert!(site.periods.contains_key(&PeriodVariant::SowingMaturity));
    assert!(site.periods.contains_key(&PeriodVariant::SowingHeading));
    assert!(site.season_stats().is_some());
}

/// Fully observed phenology: the observed season wins, the corrected
/// NDVI trajectory exists and lives inside the de-normalization bounds.
#[test]
fn observed_phenology_produces_corrected_ndvi_and_yield() {
    let model = YieldModel::new(
        ModelParams::default(),
        constant_weather(17, day(2015, 11, 15), 400),
    );
    let trial = TrialRecord {
        sowing: Some("2015-11-15".into()),
        emergence: Some("2015-11-26".into()),
        heading: Some("2016-02-20".into()),
        maturity: Some("2016-04-15".into()),
        latitude: Some(27.5),
        nursery: Some("ESWYT".into()),
        ..TrialRecord::default()
    };
    let mut site = Site::new(7, 17, trial);
    site.fit(&model);

    assert!(site.errors.is_empty(), "unexpected errors: {:?}", site.errors);

    let y = site.yields.observed.expect("observed yield missing");
    assert!(y > 0.0);

    // Corrected NDVI: recomputed from the GPP-recalibrated anchor and
    // de-normalized into real NDVI units.
    let ndvi = site.ndvi.as_ref().expect("corrected NDVI missing");
    let hm_days = site.periods[&PeriodVariant::HeadingMaturity].days;
    assert_eq!(ndvi.len(), hm_days);
    assert!(ndvi.iter().all(|v| (0.0..=1.0).contains(v)));
    // Senescence floor: the last value sits at the training-data minimum.
    assert!((ndvi.last().unwrap() - 0.16).abs() < 1e-9);

    // The recalibrated anchor replaced the curve-derived one, using the
    // literal calibration coefficients.
    let eh = &site.periods[&PeriodVariant::EmergenceHeading];
    let anchor = eh.ndvi_at_heading.unwrap();
    let expected = 0.00024355578828840187 * eh.cum_gpp.unwrap() + 0.5755361655424565;
    let expected = (expected * 1000.0).round() / 1000.0;
    assert!(
        (anchor - expected).abs() < 2e-3,
        "anchor {anchor} != recalibrated {expected}"
    );

    // Growing-season statistics at reporting precision.
    let stats = site.season_stats().unwrap();
    assert_eq!(stats.tmin, 10.0);
    assert_eq!(stats.tavg, 17.5);
    assert_eq!(stats.precip, 0.0);

    // All four yield flavours exist here, since every anchor resolved.
    assert!(site.yields.pred_heading.is_some());
    assert!(site.yields.pred_maturity.is_some());
    assert!(site.yields.pred_both.is_some());
}
