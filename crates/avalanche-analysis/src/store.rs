// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Dataset storage and discovery.

Directory layout under the data directory:

```text
<data>/
  <stem>_rNN.json                                  raw recording, one per repetition
  thresholded_{filtered|unfiltered}/
    <stem>_thX.Y.json                              thresholded dataset
  analyzed_{filtered|unfiltered}/
    <stem>_thX.Y_repNN/pS_<datatype>_bNN.tsv       p(S) tables
    branching_mav/<prefix>bNN_thX.Y.tsv            m_av against distance
```
*/

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use avalanche_core::DataType;

use crate::error::{AnalysisError, AnalysisResult};
use crate::key::{format_threshold, ExperimentGroup, ExperimentKey};

const JSON_EXT: &str = "json";

/// One repetition of a simulated recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecording {
    /// Population activity per timestep
    pub activity: Vec<f64>,
    pub coarse: Vec<f64>,
    pub sub: Vec<f64>,
}

impl RawRecording {
    pub fn signal(&self, datatype: DataType) -> &[f64] {
        match datatype {
            DataType::Coarse => &self.coarse,
            DataType::Sub => &self.sub,
        }
    }

    pub fn load(path: &Path) -> AnalysisResult<Self> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> AnalysisResult<()> {
        write_json(path, self)
    }
}

/// Thresholded event rows of every repetition of one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdedDataset {
    pub key: ExperimentKey,
    pub threshold: f64,
    pub filtered: bool,
    /// repetition x time
    pub coarse: Vec<Vec<u32>>,
    /// repetition x time
    pub sub: Vec<Vec<u32>>,
    /// Raw population activity, repetition x time
    pub activity: Vec<Vec<f64>>,
}

impl ThresholdedDataset {
    pub fn new(key: ExperimentKey, threshold: f64, filtered: bool) -> Self {
        Self {
            key,
            threshold,
            filtered,
            coarse: Vec::new(),
            sub: Vec::new(),
            activity: Vec::new(),
        }
    }

    pub fn events(&self, datatype: DataType) -> &[Vec<u32>] {
        match datatype {
            DataType::Coarse => &self.coarse,
            DataType::Sub => &self.sub,
        }
    }

    pub fn events_mut(&mut self, datatype: DataType) -> &mut Vec<Vec<u32>> {
        match datatype {
            DataType::Coarse => &mut self.coarse,
            DataType::Sub => &mut self.sub,
        }
    }

    /// Number of stored repetitions
    pub fn repetitions(&self) -> usize {
        self.coarse.len()
    }

    pub fn load(path: &Path) -> AnalysisResult<Self> {
        let dataset: Self = read_json(path)?;
        let reps = dataset.coarse.len();
        if dataset.sub.len() != reps || dataset.activity.len() != reps {
            return Err(AnalysisError::MalformedDataset {
                path: path.to_path_buf(),
                reason: format!(
                    "repetition counts differ: coarse {}, sub {}, activity {}",
                    reps,
                    dataset.sub.len(),
                    dataset.activity.len()
                ),
            });
        }
        Ok(dataset)
    }

    pub fn save(&self, path: &Path) -> AnalysisResult<()> {
        write_json(path, self)
    }
}

/// Paths of every artefact under one data directory
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    data_dir: PathBuf,
    filtered: bool,
}

impl DatasetLayout {
    pub fn new(data_dir: impl Into<PathBuf>, filtered: bool) -> Self {
        Self {
            data_dir: data_dir.into(),
            filtered,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn filtered(&self) -> bool {
        self.filtered
    }

    fn suffix(&self) -> &'static str {
        if self.filtered {
            "filtered"
        } else {
            "unfiltered"
        }
    }

    pub fn raw_path(&self, key: &ExperimentKey, rep: usize) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", key.raw_stem(rep), JSON_EXT))
    }

    pub fn thresholded_dir(&self) -> PathBuf {
        self.data_dir.join(format!("thresholded_{}", self.suffix()))
    }

    pub fn thresholded_path(&self, key: &ExperimentKey, threshold: f64) -> PathBuf {
        self.thresholded_dir()
            .join(format!("{}.{}", key.thresholded_stem(threshold), JSON_EXT))
    }

    pub fn analyzed_dir(&self) -> PathBuf {
        self.data_dir.join(format!("analyzed_{}", self.suffix()))
    }

    pub fn ps_dir(&self, key: &ExperimentKey, threshold: f64, reps: usize) -> PathBuf {
        self.analyzed_dir()
            .join(format!("{}_rep{:02}", key.thresholded_stem(threshold), reps))
    }

    pub fn ps_path(
        &self,
        key: &ExperimentKey,
        threshold: f64,
        reps: usize,
        datatype: DataType,
        binsize: usize,
    ) -> PathBuf {
        self.ps_dir(key, threshold, reps)
            .join(format!("pS_{}_b{:02}.tsv", datatype, binsize))
    }

    pub fn mav_dir(&self) -> PathBuf {
        self.analyzed_dir().join("branching_mav")
    }

    pub fn mav_path(&self, group: &ExperimentGroup, binsize: usize, threshold: f64) -> PathBuf {
        self.mav_dir().join(format!(
            "{}b{:02}_th{}.tsv",
            group.prefix(),
            binsize,
            format_threshold(threshold)
        ))
    }

    /// Unique experiments with at least one raw recording, sorted.
    pub fn discover_raw(&self, mask: Option<&str>) -> AnalysisResult<Vec<ExperimentKey>> {
        let mut keys: Vec<ExperimentKey> = Vec::new();
        for stem in json_stems(&self.data_dir, mask)? {
            match ExperimentKey::parse_raw(&stem) {
                Ok((key, _)) => {
                    if !keys.iter().any(|k| k.stem() == key.stem()) {
                        keys.push(key);
                    }
                }
                Err(e) => debug!("skipping {}: {}", stem, e),
            }
        }
        keys.sort_by(ExperimentKey::total_cmp);
        Ok(keys)
    }

    /// Number of consecutive raw repetitions starting at `_r00`.
    pub fn count_raw_repetitions(&self, key: &ExperimentKey) -> usize {
        (0..).take_while(|&rep| self.raw_path(key, rep).is_file()).count()
    }

    /// Thresholded datasets, optionally restricted to one threshold, sorted.
    pub fn discover_thresholded(
        &self,
        threshold: Option<f64>,
        mask: Option<&str>,
    ) -> AnalysisResult<Vec<(ExperimentKey, f64)>> {
        let wanted = threshold.map(format_threshold);
        let mut found = Vec::new();
        for stem in json_stems(&self.thresholded_dir(), mask)? {
            match ExperimentKey::parse_thresholded(&stem) {
                Ok((key, th)) => {
                    if wanted.as_deref().map_or(true, |w| w == format_threshold(th)) {
                        found.push((key, th));
                    }
                }
                Err(e) => debug!("skipping {}: {}", stem, e),
            }
        }
        found.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        Ok(found)
    }

    /// Thresholded datasets at `threshold` grouped by (m, h), each with its
    /// sorted distance list.
    pub fn group_thresholded(
        &self,
        threshold: f64,
        mask: Option<&str>,
    ) -> AnalysisResult<Vec<ExperimentGroup>> {
        let mut groups: BTreeMap<String, ExperimentGroup> = BTreeMap::new();
        for (key, _) in self.discover_thresholded(Some(threshold), mask)? {
            let group = groups
                .entry(key.group_prefix())
                .or_insert_with(|| ExperimentGroup {
                    m: key.m,
                    h: key.h,
                    d_list: Vec::new(),
                });
            if !group.d_list.contains(&key.d) {
                group.d_list.push(key.d);
            }
        }
        let mut groups: Vec<ExperimentGroup> = groups.into_values().collect();
        for group in &mut groups {
            group.d_list.sort_unstable();
        }
        groups.sort_by(|a, b| a.m.total_cmp(&b.m).then(a.h.total_cmp(&b.h)));
        Ok(groups)
    }
}

/// File stems of the `.json` files directly inside `dir` that contain `mask`.
/// A missing directory has no files.
fn json_stems(dir: &Path, mask: Option<&str>) -> AnalysisResult<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(AnalysisError::io(dir, e)),
    };

    let mut stems = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AnalysisError::io(dir, e))?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(JSON_EXT) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if mask.map_or(true, |m| stem.contains(m)) {
            stems.push(stem.to_string());
        }
    }
    stems.sort();
    Ok(stems)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> AnalysisResult<T> {
    let file = fs::File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| AnalysisError::json(path, e))
}

/// Serialize `value` to a `.tmp` sibling and rename it over `path`, so an
/// interrupted write never leaves a truncated document behind.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> AnalysisResult<()> {
    create_parent(path)?;
    let tmp = temp_sibling(path);
    let result = write_json_file(&tmp, value).and_then(|()| {
        fs::rename(&tmp, path).map_err(|e| AnalysisError::io(path, e))
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> AnalysisResult<()> {
    let file = fs::File::create(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value).map_err(|e| AnalysisError::json(path, e))?;
    writer.flush().map_err(|e| AnalysisError::io(path, e))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| AnalysisError::io(path, e))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents`, replacing any previous file.
pub fn write_text(path: &Path, contents: &str) -> AnalysisResult<()> {
    create_parent(path)?;
    fs::write(path, contents).map_err(|e| AnalysisError::io(path, e))
}

fn create_parent(path: &Path) -> AnalysisResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AnalysisError::io(parent, e))?;
    }
    Ok(())
}
