use adv_turbulence::data::outlier::{mask_outliers, masked_mean, masked_stats};
use adv_turbulence::data::reynolds::OFF_DIAGONAL_PAIRS;
use adv_turbulence::{
    decompose, log_law_profile, process_file, AdvError, BottomFrame, Channel, LogLawParams,
    PipelineConfig, ProfileAccumulator, TimeSeries, VelocityFrame,
};

/// A short synthetic record: a steady 0.3 m/s stream with deterministic wobble.
fn synthetic_record(rows: usize) -> VelocityFrame {
    let t: Vec<f64> = (0..rows).map(|i| i as f64 / 50.0).collect();
    let u = t.iter().map(|t| 0.30 + 0.02 * (7.0 * t).sin()).collect();
    let v = t.iter().map(|t| 0.01 * (11.0 * t).cos()).collect();
    let w = t.iter().map(|t| 0.005 * (5.0 * t).sin() - 0.001).collect();
    VelocityFrame::from_columns(t, u, v, w).unwrap()
}

#[test]
fn test_single_pass_masking_keeps_the_outlier() {
    let u = TimeSeries::from_raw(
        "u",
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![1.0, 2.0, 3.0, 4.0, 100.0],
    )
    .unwrap();
    let stats = masked_stats(&u).unwrap();
    assert!((stats.mean - 22.0).abs() < 1e-12);
    assert!((stats.std.unwrap() - 43.6).abs() < 0.05);

    let masked = mask_outliers(&u, 3.0).unwrap();
    assert_eq!(masked.values()[4], Some(100.0));
    assert_eq!(masked.masked_count(), 0);
}

#[test]
fn test_all_masked_series_has_no_mean() {
    let s = TimeSeries::new("u", vec![0.0, 1.0, 2.0], vec![None, None, None]).unwrap();
    assert!(matches!(masked_mean(&s), Err(AdvError::InsufficientData { .. })));
    assert!(matches!(masked_stats(&s), Err(AdvError::InsufficientData { .. })));
}

#[test]
fn test_bottom_scenario() {
    let velocity = synthetic_record(10);
    let bottom =
        BottomFrame::from_columns(vec![0.0, 1.0, 2.0], vec![0.10, 0.11, 0.09]).unwrap();
    let config = PipelineConfig {
        probe_offset: 0.05,
        ..PipelineConfig::default()
    };
    let result = process_file(&velocity, &bottom, &config).unwrap();
    let expected = [0.05, 0.06, 0.04];
    for (got, want) in result.elevation.values().iter().zip(expected) {
        assert!((got.unwrap() - want).abs() < 1e-12);
    }
}

#[test]
fn test_constant_record_scenario() {
    let velocity =
        VelocityFrame::from_columns(vec![0.0, 1.0, 2.0], vec![2.0; 3], vec![0.0; 3], vec![0.0; 3])
            .unwrap();
    let bottom = BottomFrame::from_columns(vec![0.0], vec![0.1]).unwrap();
    let result = process_file(&velocity, &bottom, &PipelineConfig::default()).unwrap();
    let d = &result.decomposition;
    assert_eq!(d.mean.u, 2.0);
    for c in Channel::ALL {
        assert!(d.fluctuation[c].values().iter().all(|v| *v == Some(0.0)));
    }
    for s in d.stress.entries() {
        assert!(s.values().iter().all(|v| *v == Some(0.0)));
    }
    assert_eq!(d.tke, 0.0);
}

#[test]
fn test_decomposition_properties_on_synthetic_record() {
    let d = decompose(&synthetic_record(500)).unwrap();

    for c in Channel::ALL {
        let m = masked_mean(&d.fluctuation[c]).unwrap();
        assert!(m.abs() <= 1e-9 * d.mean[c].abs().max(1.0));
    }

    for (i, j) in OFF_DIAGONAL_PAIRS {
        let stored = d.stress.component(i, j);
        let swapped = d.fluctuation[j]
            .zip_with(&d.fluctuation[i], "swapped", |a, b| a * b)
            .unwrap();
        assert_eq!(stored.values(), swapped.values());
        assert_eq!(stored, d.stress.component(j, i));
    }

    assert!(d.tke > 0.0);
    let mean = d.mean_stress().unwrap();
    assert!(mean.uu >= 0.0 && mean.vv >= 0.0 && mean.ww >= 0.0);
    assert!((d.tke - mean.half_trace()).abs() < 1e-15);
}

#[test]
fn test_masking_and_raw_modes_both_supported() {
    let t: Vec<f64> = (0..40).map(|i| i as f64 / 50.0).collect();
    let mut u = vec![0.3; 40];
    u[10] = 2.5;
    let velocity = VelocityFrame::from_columns(t, u, vec![0.0; 40], vec![0.0; 40]).unwrap();
    let bottom = BottomFrame::from_columns(vec![0.0], vec![0.1]).unwrap();

    let masked = process_file(&velocity, &bottom, &PipelineConfig::default()).unwrap();
    let raw = process_file(
        &velocity,
        &bottom,
        &PipelineConfig {
            mask_outliers: false,
            ..PipelineConfig::default()
        },
    )
    .unwrap();

    assert_eq!(masked.masked.u, 1);
    assert!(masked.decomposition.tke < 1e-20);
    assert!(raw.decomposition.tke > 0.01);
    assert_eq!(
        masked.decomposition.stress.uu.len(),
        raw.decomposition.stress.uu.len()
    );
}

#[test]
fn test_log_law_scenario() {
    let profile = log_law_profile(&LogLawParams::new(0.15, 0.205, 0.001)).unwrap();
    assert!(profile.shear_velocity > 0.0);

    let top = profile.samples.last().unwrap();
    assert_eq!(top.elevation, 0.15);
    assert!(profile
        .samples
        .iter()
        .all(|s| s.velocity <= top.velocity));
    assert!(profile
        .samples
        .windows(2)
        .all(|w| w[1].velocity > w[0].velocity));
}

#[test]
fn test_log_law_rejects_non_positive_inputs() {
    assert!(matches!(
        log_law_profile(&LogLawParams::new(0.15, 0.205, -0.001)),
        Err(AdvError::InvalidParameter { .. })
    ));
    assert!(matches!(
        log_law_profile(&LogLawParams::new(-0.15, 0.205, 0.001)),
        Err(AdvError::InvalidParameter { .. })
    ));
}

#[test]
fn test_records_are_independent() {
    let bottom_low = BottomFrame::from_columns(vec![0.0], vec![0.07]).unwrap();
    let bottom_high = BottomFrame::from_columns(vec![0.0], vec![0.15]).unwrap();
    let record = synthetic_record(100);
    let config = PipelineConfig::default();

    let first = process_file(&record, &bottom_high, &config).unwrap();
    let other = process_file(&synthetic_record(37), &bottom_low, &config).unwrap();
    let again = process_file(&record, &bottom_high, &config).unwrap();
    assert_eq!(first, again);

    let mut profile = ProfileAccumulator::new();
    profile.push_result(&first).unwrap();
    profile.push_result(&other).unwrap();
    let points = profile.profile();
    assert!(points[0].elevation < points[1].elevation);
}

#[test]
fn test_inexact_constant_channel_survives_tight_threshold() {
    let t: Vec<f64> = (0..10).map(|i| i as f64 / 50.0).collect();
    let velocity =
        VelocityFrame::from_columns(t, vec![0.1; 10], vec![0.31; 10], vec![0.0; 10]).unwrap();
    let bottom = BottomFrame::from_columns(vec![0.0], vec![0.1]).unwrap();
    let config = PipelineConfig {
        z_threshold: 0.5,
        ..PipelineConfig::default()
    };

    let result = process_file(&velocity, &bottom, &config).unwrap();
    assert_eq!(result.masked.u, 0);
    assert_eq!(result.masked.v, 0);
    assert_eq!(result.velocity, velocity);
    assert!(result.decomposition.tke < 1e-30);
}
