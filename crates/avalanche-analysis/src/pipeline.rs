// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Analysis modes.

| Mode        | Input                        | Output                                  |
|-------------|------------------------------|-----------------------------------------|
| `threshold` | raw recordings               | thresholded dataset                     |
| `save_ps`   | thresholded datasets         | p(S) tables per datatype and binsize    |
| `save_mav`  | thresholded datasets by (m,h)| m_av against distance per binsize       |
| `tau`       | activity in thresholded data | tau mean/std in the results log         |
| `alpha`     | coarse events                | alpha per binsize and its scaling       |

Each `run_*` method processes every discovered experiment. An experiment
whose files are missing, unreadable or malformed is logged and skipped;
the mode fails with
[`AnalysisError::NoInputFiles`] only when discovery comes back empty.
*/

use std::path::PathBuf;
use tracing::{debug, info, warn};

use avalanche_config::{validate_config, AvalancheConfig};
use avalanche_core::{
    bin_data, fit_alpha_scaling, get_s, m_avalanche, tau_linear, threshold_trace, BandPass,
    DataType, EventMode, FitResult, FitWindow, SizeDistribution, StatsError, ThresholdConfig,
};

use crate::error::{AnalysisError, AnalysisResult};
use crate::key::{format_threshold, ExperimentGroup, ExperimentKey, StateTable};
use crate::results::{ResultEntry, ResultsLog};
use crate::store::{write_text, DatasetLayout, RawRecording, ThresholdedDataset};

/// Power-law fits of one experiment across binsizes
#[derive(Debug, Clone)]
pub struct AlphaSummary {
    /// `(binsize, alpha)` with alpha = -slope of log p(S) against log S
    pub per_binsize: Vec<(usize, FitResult)>,
    /// Slope of log alpha against log binsize
    pub scaling: FitResult,
}

/// Everything the analysis modes need, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    config: AvalancheConfig,
    layout: DatasetLayout,
    threshold: ThresholdConfig,
    datatypes: Vec<DataType>,
    window: FitWindow,
    states: StateTable,
    results: ResultsLog,
}

impl AnalysisContext {
    /// Validate `config` and build the typed settings.
    pub fn from_config(config: AvalancheConfig) -> AnalysisResult<Self> {
        validate_config(&config)?;

        let event_mode: EventMode = config.analysis.event_mode.parse()?;
        let mut threshold =
            ThresholdConfig::new(config.analysis.threshold)?.with_event_mode(event_mode);
        if config.filter.enabled {
            threshold = threshold.with_filter(BandPass::new(
                config.filter.sample_rate_hz,
                config.filter.low_cut_hz,
                config.filter.high_cut_hz,
            )?);
        }

        let datatypes = config
            .analysis
            .datatypes
            .iter()
            .map(|d| d.parse::<DataType>())
            .collect::<Result<Vec<_>, StatsError>>()?;
        let window = FitWindow::new(config.fitting.ps_s_min, config.fitting.ps_s_max)?;

        let data_dir = config.system.data_dir.clone();
        let results_path = if config.system.results_log.is_absolute() {
            config.system.results_log.clone()
        } else {
            data_dir.join(&config.system.results_log)
        };

        Ok(Self {
            layout: DatasetLayout::new(data_dir, config.filter.enabled),
            states: StateTable::new(config.states.clone()),
            results: ResultsLog::new(results_path),
            config,
            threshold,
            datatypes,
            window,
        })
    }

    pub fn config(&self) -> &AvalancheConfig {
        &self.config
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    pub fn states(&self) -> &StateTable {
        &self.states
    }

    pub fn results_log(&self) -> &ResultsLog {
        &self.results
    }

    /// Configured threshold in standard deviations
    pub fn threshold(&self) -> f64 {
        self.threshold.threshold
    }

    fn mask(&self) -> Option<&str> {
        self.config.analysis.mask.as_deref()
    }

    /// Label used in the results log: the state name when (m, h) matches a
    /// configured state, the dataset stem otherwise.
    pub fn label(&self, key: &ExperimentKey, threshold: f64) -> String {
        match self.states.name_of(key) {
            Some(name) => format!("{}_d{:02}_th{}", name, key.d, format_threshold(threshold)),
            None => key.thresholded_stem(threshold),
        }
    }

    /// Repetitions to analyse out of the `available` stored ones.
    fn select_reps(&self, available: usize) -> usize {
        match self.config.analysis.reps {
            Some(reps) if reps > available => {
                warn!(
                    "{} repetitions requested but only {} stored; using {}",
                    reps, available, available
                );
                available
            }
            Some(reps) => reps,
            None => available,
        }
    }

    fn load_thresholded(&self, key: &ExperimentKey, threshold: f64) -> AnalysisResult<ThresholdedDataset> {
        ThresholdedDataset::load(&self.layout.thresholded_path(key, threshold))
    }

    // ----- threshold -------------------------------------------------------

    /// Threshold every repetition of `key` (both datatypes) and store the
    /// dataset. Returns its path.
    pub fn threshold_experiment(&self, key: &ExperimentKey) -> AnalysisResult<PathBuf> {
        let reps = match self.config.analysis.reps {
            Some(reps) => reps,
            None => self.layout.count_raw_repetitions(key),
        };
        if reps == 0 {
            return Err(AnalysisError::MissingInput {
                path: self.layout.raw_path(key, 0),
            });
        }

        let th = self.threshold();
        let mut dataset = ThresholdedDataset::new(*key, th, self.layout.filtered());
        for rep in 0..reps {
            let recording = RawRecording::load(&self.layout.raw_path(key, rep))?;
            for datatype in DataType::ALL {
                let events = threshold_trace(recording.signal(datatype), &self.threshold);
                dataset.events_mut(datatype).push(events);
            }
            dataset.activity.push(recording.activity);
            debug!("{}: thresholded repetition {}", key, rep);
        }

        let path = self.layout.thresholded_path(key, th);
        dataset.save(&path)?;
        info!("Thresholded {} ({} repetitions) -> {}", key, reps, path.display());
        Ok(path)
    }

    pub fn run_threshold(&self) -> AnalysisResult<Vec<PathBuf>> {
        let keys = self.layout.discover_raw(self.mask())?;
        if keys.is_empty() {
            return Err(self.no_input("threshold", self.layout.data_dir().to_path_buf()));
        }
        let mut written = Vec::new();
        for key in &keys {
            written.extend(skip_failed(self.threshold_experiment(key))?);
        }
        Ok(written)
    }

    // ----- save_ps ---------------------------------------------------------

    /// p(S) tables of one thresholded dataset for every configured binsize
    /// and datatype. Returns the written paths.
    pub fn save_ps_experiment(&self, key: &ExperimentKey, threshold: f64) -> AnalysisResult<Vec<PathBuf>> {
        let dataset = self.load_thresholded(key, threshold)?;
        let reps = self.select_reps(dataset.repetitions());

        let mut written = Vec::new();
        for &binsize in &self.config.analysis.binsizes {
            for &datatype in &self.datatypes {
                let rows = &dataset.events(datatype)[..reps];
                let distribution = size_distribution(rows, binsize)?;
                if distribution.empty_repetitions() > 0 {
                    warn!(
                        "{} {} b={}: {} of {} repetitions had no avalanches",
                        key,
                        datatype,
                        binsize,
                        distribution.empty_repetitions(),
                        reps
                    );
                }

                let path = self.layout.ps_path(key, threshold, reps, datatype, binsize);
                write_text(&path, &distribution.to_tsv())?;
                debug!("wrote {}", path.display());
                written.push(path);
            }
        }
        info!("Saved p(S) for {} (th {}, {} tables)", key, format_threshold(threshold), written.len());
        Ok(written)
    }

    pub fn run_save_ps(&self) -> AnalysisResult<Vec<PathBuf>> {
        let datasets = self.layout.discover_thresholded(None, self.mask())?;
        if datasets.is_empty() {
            return Err(self.no_input("save_ps", self.layout.thresholded_dir()));
        }
        let mut written = Vec::new();
        for (key, threshold) in &datasets {
            if let Some(tables) = skip_failed(self.save_ps_experiment(key, *threshold))? {
                written.extend(tables);
            }
        }
        Ok(written)
    }

    // ----- save_mav --------------------------------------------------------

    /// m_av mean/std across repetitions for each distance of `group`, one
    /// table per binsize. Distances without a dataset are logged and skipped.
    pub fn save_mav_group(&self, group: &ExperimentGroup, d_list: &[u32]) -> AnalysisResult<Vec<PathBuf>> {
        let threshold = self.threshold();
        let mut written = Vec::new();

        for &binsize in &self.config.analysis.binsizes {
            let mut table = String::from("# d\tmav_mean\tmav_std\n");
            let mut rows = 0;

            for &d in d_list {
                let key = group.key(d);
                let path = self.layout.thresholded_path(&key, threshold);
                if !path.is_file() {
                    warn!("{}: no dataset for d = {} at {}; skipping", group.prefix(), d, path.display());
                    continue;
                }
                let Some((mean, std)) = skip_failed(self.mav_of_dataset(&path, binsize))? else {
                    continue;
                };
                info!("b = {}, d = {}: m_av = {:.3} +- {:.3}", binsize, d, mean, std);

                table.push_str(&format!("{}\t{:e}\t{:e}\n", d, mean, std));
                rows += 1;
            }

            if rows == 0 {
                warn!("{}: no datasets for b = {}; table not written", group.prefix(), binsize);
                continue;
            }
            let path = self.layout.mav_path(group, binsize, threshold);
            write_text(&path, &table)?;
            written.push(path);
        }
        Ok(written)
    }

    /// m_av mean/std across the repetitions of one stored dataset.
    fn mav_of_dataset(&self, path: &std::path::Path, binsize: usize) -> AnalysisResult<(f64, f64)> {
        let dataset = ThresholdedDataset::load(path)?;
        let reps = self.select_reps(dataset.repetitions());

        let mut estimates = Vec::with_capacity(reps);
        for row in &dataset.coarse[..reps] {
            estimates.push(m_avalanche(&bin_data(row, binsize)?).estimate);
        }
        Ok(mean_std(&estimates))
    }

    /// m_av tables for every (m, h) group at the configured threshold.
    /// `d_list` replaces each group's discovered distances when given.
    pub fn run_save_mav(&self, d_list: Option<&[u32]>) -> AnalysisResult<Vec<PathBuf>> {
        let groups = self.layout.group_thresholded(self.threshold(), self.mask())?;
        if groups.is_empty() {
            return Err(self.no_input("save_mav", self.layout.thresholded_dir()));
        }
        let mut written = Vec::new();
        for group in &groups {
            info!("Analysing m_av of {}", group.prefix());
            let distances = d_list.unwrap_or(&group.d_list);
            if let Some(tables) = skip_failed(self.save_mav_group(group, distances))? {
                written.extend(tables);
            }
        }
        Ok(written)
    }

    // ----- tau -------------------------------------------------------------

    /// Autocorrelation time of the stored activity, mean and std across
    /// repetitions in ms. Appended to the results log as `tau_ms`.
    pub fn tau_experiment(&self, key: &ExperimentKey, threshold: f64) -> AnalysisResult<FitResult> {
        let dataset = self.load_thresholded(key, threshold)?;
        let reps = self.select_reps(dataset.repetitions());
        let fitting = &self.config.fitting;

        let taus: Vec<f64> = dataset.activity[..reps]
            .iter()
            .map(|activity| tau_linear(activity, fitting.timestep_ms, fitting.tau_max_lag).estimate)
            .collect();
        let (mean, std) = mean_std(&taus);
        let n_valid = taus.iter().filter(|t| t.is_finite()).count();
        let result = FitResult::new(mean, std, n_valid);

        info!("{}: tau = {:.1} +- {:.1} ms ({} of {} repetitions)", key, mean, std, n_valid, reps);
        self.results.append(&ResultEntry::new(
            self.label(key, threshold),
            "tau_ms",
            result.estimate,
            result.std_error,
        ))?;
        Ok(result)
    }

    pub fn run_tau(&self) -> AnalysisResult<Vec<(ExperimentKey, FitResult)>> {
        let datasets = self.layout.discover_thresholded(Some(self.threshold()), self.mask())?;
        if datasets.is_empty() {
            return Err(self.no_input("tau", self.layout.thresholded_dir()));
        }
        let mut fits = Vec::new();
        for (key, th) in &datasets {
            if let Some(fit) = skip_failed(self.tau_experiment(key, *th))? {
                fits.push((*key, fit));
            }
        }
        Ok(fits)
    }

    // ----- alpha -----------------------------------------------------------

    /// Power-law exponent of the coarse p(S) per binsize, then the scaling
    /// of the exponent with binsize. Every fit is appended to the results log.
    pub fn alpha_experiment(&self, key: &ExperimentKey, threshold: f64) -> AnalysisResult<AlphaSummary> {
        let dataset = self.load_thresholded(key, threshold)?;
        let reps = self.select_reps(dataset.repetitions());
        let label = self.label(key, threshold);

        let mut per_binsize = Vec::new();
        for &binsize in &self.config.analysis.binsizes {
            let distribution = size_distribution(&dataset.coarse[..reps], binsize)?;
            let fit = distribution.fit_power_law(self.window);
            let alpha = FitResult::new(-fit.estimate, fit.std_error, fit.n_points);
            if !alpha.is_valid() {
                warn!("{} b={}: power-law fit has {} usable points", key, binsize, fit.n_points);
            }
            self.results.append(&ResultEntry::new(
                label.clone(),
                format!("alpha_b{:02}", binsize),
                alpha.estimate,
                alpha.std_error,
            ))?;
            per_binsize.push((binsize, alpha));
        }

        let points: Vec<(usize, f64)> = per_binsize.iter().map(|(b, fit)| (*b, fit.estimate)).collect();
        let scaling = fit_alpha_scaling(&points);
        info!("{}: alpha ~ b^({:.3} +- {:.3})", key, scaling.estimate, scaling.std_error);
        self.results.append(&ResultEntry::new(
            label,
            "alpha_scaling",
            scaling.estimate,
            scaling.std_error,
        ))?;

        Ok(AlphaSummary { per_binsize, scaling })
    }

    pub fn run_alpha(&self) -> AnalysisResult<Vec<(ExperimentKey, AlphaSummary)>> {
        let datasets = self.layout.discover_thresholded(Some(self.threshold()), self.mask())?;
        if datasets.is_empty() {
            return Err(self.no_input("alpha", self.layout.thresholded_dir()));
        }
        let mut summaries = Vec::new();
        for (key, th) in &datasets {
            if let Some(summary) = skip_failed(self.alpha_experiment(key, *th))? {
                summaries.push((*key, summary));
            }
        }
        Ok(summaries)
    }

    fn no_input(&self, mode: &str, dir: PathBuf) -> AnalysisError {
        AnalysisError::NoInputFiles {
            mode: mode.to_string(),
            dir,
        }
    }
}

/// Per-experiment failures are logged and skip that experiment; anything
/// else ends the mode.
fn skip_failed<T>(result: AnalysisResult<T>) -> AnalysisResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_per_experiment() => {
            warn!("{}; skipping", e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// p(S) over repetitions of thresholded rows at one binsize
fn size_distribution(rows: &[Vec<u32>], binsize: usize) -> AnalysisResult<SizeDistribution> {
    let sizes = rows
        .iter()
        .map(|row| Ok(get_s(&bin_data(row, binsize)?)))
        .collect::<AnalysisResult<Vec<_>>>()?;
    Ok(SizeDistribution::from_repetitions(&sizes))
}

/// Mean and population std of the finite values; NaN when there are none.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    let var = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn context(data_dir: &std::path::Path) -> AnalysisContext {
        let mut config = AvalancheConfig::default();
        config.system.data_dir = data_dir.to_path_buf();
        config.analysis.threshold = 1.0;
        config.analysis.binsizes = vec![1, 2];
        AnalysisContext::from_config(config).unwrap()
    }

    fn bursty(len: usize, phase: usize) -> Vec<f64> {
        (0..len)
            .map(|t| if (t + phase) % 10 < 2 { 10.0 + (t % 3) as f64 } else { 0.0 })
            .collect()
    }

    fn write_raw(ctx: &AnalysisContext, key: &ExperimentKey, reps: usize) {
        for rep in 0..reps {
            RawRecording {
                activity: bursty(200, rep).iter().map(|v| v * 0.1 + 1.0).collect(),
                coarse: bursty(200, rep),
                sub: bursty(200, rep + 3),
            }
            .save(&ctx.layout().raw_path(key, rep))
            .unwrap();
        }
    }

    #[test]
    fn test_mean_std() {
        assert_eq!(mean_std(&[1.0, 3.0]), (2.0, 1.0));
        let (m, s) = mean_std(&[f64::NAN, 2.0, f64::INFINITY]);
        assert_eq!((m, s), (2.0, 0.0));
        assert!(mean_std(&[]).0.is_nan());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AvalancheConfig::default();
        config.analysis.binsizes = vec![0];
        assert!(matches!(
            AnalysisContext::from_config(config),
            Err(AnalysisError::Config(_))
        ));
    }

    #[test]
    fn test_threshold_then_save_ps() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let key = ExperimentKey::new(0.9, 2e-4, 4);
        write_raw(&ctx, &key, 3);

        let written = ctx.run_threshold().unwrap();
        assert_eq!(written, vec![ctx.layout().thresholded_path(&key, 1.0)]);

        let dataset = ThresholdedDataset::load(&written[0]).unwrap();
        assert_eq!(dataset.repetitions(), 3);
        assert_eq!(dataset.coarse[0].len(), 200);
        assert!(dataset.coarse[0].iter().any(|&e| e > 0));

        let tables = ctx.run_save_ps().unwrap();
        // 2 binsizes x 2 datatypes
        assert_eq!(tables.len(), 4);
        let text = fs::read_to_string(ctx.layout().ps_path(&key, 1.0, 3, DataType::Coarse, 1)).unwrap();
        assert!(text.starts_with("# S\tpS_mean\tpS_std"));
    }

    #[test]
    fn test_no_input_is_fatal() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        assert!(matches!(ctx.run_threshold(), Err(AnalysisError::NoInputFiles { .. })));
        assert!(matches!(ctx.run_save_ps(), Err(AnalysisError::NoInputFiles { .. })));
        assert!(matches!(ctx.run_save_mav(None), Err(AnalysisError::NoInputFiles { .. })));
        assert!(matches!(ctx.run_tau(), Err(AnalysisError::NoInputFiles { .. })));
        assert!(matches!(ctx.run_alpha(), Err(AnalysisError::NoInputFiles { .. })));
    }

    #[test]
    fn test_save_mav_skips_missing_distance() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        for d in [2, 4] {
            let key = ExperimentKey::new(0.9, 2e-4, d);
            write_raw(&ctx, &key, 2);
            ctx.threshold_experiment(&key).unwrap();
        }

        let written = ctx.run_save_mav(Some(&[2, 4, 6])).unwrap();
        assert_eq!(written.len(), 2);

        let text = fs::read_to_string(&written[0]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# d\tmav_mean\tmav_std");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2\t"));
        assert!(lines[2].starts_with("4\t"));
    }

    #[test]
    fn test_tau_and_alpha_append_to_results_log() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let key = ctx.states().key("subcritical", 8).unwrap();
        write_raw(&ctx, &key, 2);
        ctx.threshold_experiment(&key).unwrap();

        ctx.run_tau().unwrap();
        let summaries = ctx.run_alpha().unwrap();
        assert_eq!(summaries[0].1.per_binsize.len(), 2);

        let entries = ctx.results_log().read_entries().unwrap();
        let kinds: Vec<&str> = entries.iter().map(|e| e.kind.as_str()).collect();
        assert_eq!(kinds, vec!["tau_ms", "alpha_b01", "alpha_b02", "alpha_scaling"]);
        assert!(entries.iter().all(|e| e.label == "subcritical_d08_th1.0"));
    }

    #[test]
    fn test_missing_input_skips_experiment() {
        let dir = tempdir().unwrap();
        let mut config = AvalancheConfig::default();
        config.system.data_dir = dir.path().to_path_buf();
        config.analysis.threshold = 1.0;
        config.analysis.reps = Some(2);
        let ctx = AnalysisContext::from_config(config).unwrap();

        let complete = ExperimentKey::new(0.9, 2e-4, 2);
        let partial = ExperimentKey::new(0.9, 2e-4, 4);
        write_raw(&ctx, &complete, 2);
        write_raw(&ctx, &partial, 1);

        let written = ctx.run_threshold().unwrap();
        assert_eq!(written, vec![ctx.layout().thresholded_path(&complete, 1.0)]);
    }

    #[test]
    fn test_corrupt_dataset_does_not_stop_mode() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path());
        let good = ExperimentKey::new(0.9, 2e-4, 4);
        let corrupt = ExperimentKey::new(0.9, 2e-4, 2);
        write_raw(&ctx, &good, 2);
        ctx.threshold_experiment(&good).unwrap();
        fs::write(ctx.layout().thresholded_path(&corrupt, 1.0), "{\"key\":").unwrap();

        let tables = ctx.run_save_ps().unwrap();
        assert_eq!(tables.len(), 4);
        assert!(ctx.layout().ps_path(&good, 1.0, 2, DataType::Coarse, 1).is_file());

        let taus = ctx.run_tau().unwrap();
        assert_eq!(taus.len(), 1);
        assert_eq!(taus[0].0, good);

        let written = ctx.run_save_mav(None).unwrap();
        assert_eq!(written.len(), 2);
        let text = fs::read_to_string(&written[0]).unwrap();
        let rows: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("4\t"));
    }

    #[test]
    fn test_missing_repetition_reported() {
        let dir = tempdir().unwrap();
        let mut config = AvalancheConfig::default();
        config.system.data_dir = dir.path().to_path_buf();
        config.analysis.reps = Some(3);
        let ctx = AnalysisContext::from_config(config).unwrap();

        let key = ExperimentKey::new(0.9, 2e-4, 2);
        write_raw(&ctx, &key, 2);
        match ctx.threshold_experiment(&key) {
            Err(AnalysisError::MissingInput { path }) => {
                assert_eq!(path, ctx.layout().raw_path(&key, 2));
            }
            other => panic!("expected MissingInput, got {:?}", other),
        }
    }
}
