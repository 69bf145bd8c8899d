// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Append-only log of fitted quantities
//!
//! One tab-separated line per entry: `label  kind  estimate  error`.
//! Lines starting with `#` are comments.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, AnalysisResult};

/// One fitted quantity
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    /// Experiment label, e.g. `critical_d08_th3.0`
    pub label: String,
    /// Quantity, e.g. `tau_ms`, `alpha_b04`, `alpha_scaling`
    pub kind: String,
    pub estimate: f64,
    pub error: f64,
}

impl ResultEntry {
    pub fn new(label: impl Into<String>, kind: impl Into<String>, estimate: f64, error: f64) -> Self {
        Self {
            label: label.into(),
            kind: kind.into(),
            estimate,
            error,
        }
    }

    pub fn to_line(&self) -> String {
        format!("{}\t{}\t{}\t{}", self.label, self.kind, self.estimate, self.error)
    }

    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split('\t');
        let label = fields.next()?;
        let kind = fields.next()?;
        let estimate = fields.next()?.parse().ok()?;
        let error = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(label, kind, estimate, error))
    }
}

#[derive(Debug, Clone)]
pub struct ResultsLog {
    path: PathBuf,
}

impl ResultsLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry, creating the file (with a header) if needed.
    pub fn append(&self, entry: &ResultEntry) -> AnalysisResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| AnalysisError::io(parent, e))?;
        }
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AnalysisError::io(&self.path, e))?;

        let mut text = String::new();
        if is_new {
            text.push_str(&format!(
                "# results log created {}\n# label\tkind\testimate\terror\n",
                chrono::Utc::now().to_rfc3339()
            ));
        }
        text.push_str(&entry.to_line());
        text.push('\n');
        file.write_all(text.as_bytes())
            .map_err(|e| AnalysisError::io(&self.path, e))
    }

    /// All entries in file order. Comment lines are skipped.
    pub fn read_entries(&self) -> AnalysisResult<Vec<ResultEntry>> {
        let content = fs::read_to_string(&self.path).map_err(|e| AnalysisError::io(&self.path, e))?;
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty())
            .map(|(n, line)| {
                ResultEntry::parse_line(line).ok_or_else(|| AnalysisError::MalformedDataset {
                    path: self.path.clone(),
                    reason: format!("line {} is not 'label\\tkind\\testimate\\terror'", n + 1),
                })
            })
            .collect()
    }
}
