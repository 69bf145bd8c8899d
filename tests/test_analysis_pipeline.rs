// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end runs of the analysis modes on a temporary data directory.

use std::fs;
use std::io::Write;
use std::path::Path;

use avalanche::analysis::{
    run_batch, AnalysisContext, AnalysisError, BatchPlan, ExperimentKey, RawRecording,
    StateTable, ThresholdedDataset,
};
use avalanche::config::{load_config, AvalancheConfig, CONFIG_FILE_NAME};
use avalanche::stats::DataType;
use tempfile::tempdir;

/// Poisson-like bursts from a fixed LCG so runs are reproducible.
fn synthetic_recording(seed: u64, len: usize) -> RawRecording {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let mut activity = Vec::with_capacity(len);
    let mut coarse = Vec::with_capacity(len);
    let mut sub = Vec::with_capacity(len);
    let mut level = 0.0;
    for _ in 0..len {
        level = 0.8 * level + if next() < 0.05 { 20.0 * next() } else { 0.0 };
        activity.push(level);
        coarse.push(level + 0.1 * next());
        sub.push(if next() < 0.1 { level } else { 0.0 });
    }
    RawRecording { activity, coarse, sub }
}

fn write_experiment(data_dir: &Path, key: &ExperimentKey, reps: usize) {
    for rep in 0..reps {
        let path = data_dir.join(format!("{}.json", key.raw_stem(rep)));
        synthetic_recording(key.d as u64 * 1000 + rep as u64 + 1, 2_000)
            .save(&path)
            .unwrap();
    }
}

fn config_for(data_dir: &Path) -> AvalancheConfig {
    let mut config = AvalancheConfig::default();
    config.system.data_dir = data_dir.to_path_buf();
    config.analysis.threshold = 2.0;
    config.analysis.binsizes = vec![1, 2, 4];
    config
}

#[test]
fn test_full_analysis_run() {
    let dir = tempdir().unwrap();
    let ctx = AnalysisContext::from_config(config_for(dir.path())).unwrap();
    let states = StateTable::default();

    let keys: Vec<ExperimentKey> = [2, 4]
        .iter()
        .map(|&d| states.key("critical", d).unwrap())
        .collect();
    for key in &keys {
        write_experiment(dir.path(), key, 3);
    }

    // threshold
    let datasets = ctx.run_threshold().unwrap();
    assert_eq!(datasets.len(), 2);
    let dataset = ThresholdedDataset::load(&datasets[0]).unwrap();
    assert_eq!(dataset.repetitions(), 3);
    assert_eq!(dataset.activity[0].len(), 2_000);

    // save_ps: 2 experiments x 3 binsizes x 2 datatypes
    let tables = ctx.run_save_ps().unwrap();
    assert_eq!(tables.len(), 12);

    let ps_path = ctx.layout().ps_path(&keys[0], 2.0, 3, DataType::Coarse, 1);
    let text = fs::read_to_string(&ps_path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("# S\tpS_mean\tpS_std"));
    let mass: f64 = lines
        .map(|line| line.split('\t').nth(1).unwrap().parse::<f64>().unwrap())
        .sum();
    assert!((mass - 1.0).abs() < 1e-9, "p(S) mean sums to {}", mass);

    // save_mav: one (m, h) group, one table per binsize
    let mav_tables = ctx.run_save_mav(None).unwrap();
    assert_eq!(mav_tables.len(), 3);
    assert!(mav_tables[0]
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("m0.99900_h2.000e-06_b01_th2.0"));

    // tau + alpha go to the results log
    ctx.run_tau().unwrap();
    ctx.run_alpha().unwrap();
    let entries = ctx.results_log().read_entries().unwrap();
    assert_eq!(entries.len(), 2 * (1 + 3 + 1));
    assert!(entries.iter().any(|e| e.label == "critical_d04_th2.0" && e.kind == "alpha_scaling"));
}

#[test]
fn test_mask_restricts_discovery() {
    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.analysis.mask = Some("d04".to_string());
    let ctx = AnalysisContext::from_config(config).unwrap();

    for d in [2, 4] {
        write_experiment(dir.path(), &ExperimentKey::new(0.9, 2e-4, d), 1);
    }
    let datasets = ctx.run_threshold().unwrap();
    assert_eq!(datasets.len(), 1);
    assert!(datasets[0].to_str().unwrap().contains("_d04_th2.0"));
}

#[test]
fn test_batch_reports_each_job() {
    let dir = tempdir().unwrap();
    let mut config = config_for(dir.path());
    config.analysis.reps = Some(2);
    config.system.max_workers = 2;
    let ctx = AnalysisContext::from_config(config).unwrap();

    let plan = BatchPlan::new(vec![0.9], vec![2e-4], vec![2, 4, 6]);
    for key in plan.jobs().iter().filter(|k| k.d != 6) {
        write_experiment(dir.path(), key, 2);
    }

    let report = run_batch(&ctx, &plan).unwrap();
    assert_eq!(report.succeeded().count(), 2);
    let failed: Vec<u32> = report.failed().map(|o| o.key.d).collect();
    assert_eq!(failed, vec![6]);

    for outcome in report.succeeded() {
        let summary = outcome.result.as_ref().unwrap();
        assert!(summary.thresholded.is_file());
        assert_eq!(summary.tables.len(), 6);
    }
}

#[test]
fn test_empty_data_directory_is_fatal() {
    let dir = tempdir().unwrap();
    let ctx = AnalysisContext::from_config(config_for(dir.path())).unwrap();
    match ctx.run_threshold() {
        Err(AnalysisError::NoInputFiles { mode, .. }) => assert_eq!(mode, "threshold"),
        other => panic!("expected NoInputFiles, got {:?}", other),
    }
}

#[test]
fn test_configuration_file_drives_context() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join(CONFIG_FILE_NAME);
    let mut file = fs::File::create(&config_path).unwrap();
    writeln!(file, "[system]").unwrap();
    writeln!(file, "data_dir = {:?}", dir.path().join("dat").display().to_string()).unwrap();
    writeln!(file, "[analysis]").unwrap();
    writeln!(file, "binsizes = [1, 8]").unwrap();
    writeln!(file, "[filter]").unwrap();
    writeln!(file, "enabled = true").unwrap();

    let config = load_config(Some(&config_path), None).unwrap();
    let ctx = AnalysisContext::from_config(config).unwrap();
    assert!(ctx.layout().filtered());
    assert!(ctx
        .layout()
        .thresholded_dir()
        .ends_with("dat/thresholded_filtered"));
}
