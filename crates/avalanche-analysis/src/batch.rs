// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parallel batch over many experiments
//!
//! A job is one [`ExperimentKey`]: `threshold` followed by `save_ps`. Jobs
//! run on a dedicated rayon pool. A failing or panicking job is recorded in
//! the [`BatchReport`] and never stops its siblings.

use rayon::prelude::*;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::key::ExperimentKey;
use crate::pipeline::AnalysisContext;

/// Distances used when none are given
pub const DEFAULT_D_LIST: [u32; 5] = [2, 4, 6, 8, 10];

/// Parameter lists of a batch. `m` and `h` are paired by index, then
/// crossed with every `d`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub m: Vec<f64>,
    pub h: Vec<f64>,
    pub d: Vec<u32>,
}

impl BatchPlan {
    pub fn new(m: Vec<f64>, h: Vec<f64>, d: Vec<u32>) -> Self {
        Self { m, h, d }
    }

    /// Keys of every job, in (pair, d) order. Repeated keys are scheduled
    /// once, since their jobs would write the same files.
    pub fn jobs(&self) -> Vec<ExperimentKey> {
        if self.m.len() != self.h.len() {
            warn!(
                "m list has {} values and h list has {}; unpaired values are ignored",
                self.m.len(),
                self.h.len()
            );
        }
        let mut seen = HashSet::new();
        self.m
            .iter()
            .zip(&self.h)
            .flat_map(|(&m, &h)| self.d.iter().map(move |&d| ExperimentKey::new(m, h, d)))
            .filter(|key| {
                let fresh = seen.insert(key.stem());
                if !fresh {
                    warn!("duplicate batch job {}; scheduled once", key);
                }
                fresh
            })
            .collect()
    }
}

/// Artefacts of a successful job
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub thresholded: PathBuf,
    pub tables: Vec<PathBuf>,
}

/// Result of processing a single job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub key: ExperimentKey,
    pub result: Result<JobSummary, String>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Run every job of `plan`, `system.max_workers` at a time (0 = one per core).
///
/// # Errors
///
/// Only pool construction fails the batch; job errors are in the report.
pub fn run_batch(ctx: &AnalysisContext, plan: &BatchPlan) -> AnalysisResult<BatchReport> {
    let jobs = plan.jobs();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.config().system.max_workers)
        .build()
        .map_err(|e| AnalysisError::Pool(e.to_string()))?;

    info!("Running {} jobs on {} threads", jobs.len(), pool.current_num_threads());
    let start = Instant::now();

    let outcomes: Vec<JobOutcome> =
        pool.install(|| jobs.par_iter().map(|key| run_job(ctx, key)).collect());

    let report = BatchReport { outcomes };
    let failed = report.failed().count();
    info!(
        "Batch finished in {:.1}s: {} succeeded, {} failed",
        start.elapsed().as_secs_f64(),
        report.outcomes.len() - failed,
        failed
    );
    Ok(report)
}

fn run_job(ctx: &AnalysisContext, key: &ExperimentKey) -> JobOutcome {
    let start = Instant::now();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| -> AnalysisResult<JobSummary> {
        let thresholded = ctx.threshold_experiment(key)?;
        let tables = ctx.save_ps_experiment(key, ctx.threshold())?;
        Ok(JobSummary { thresholded, tables })
    }));

    let result = match outcome {
        Ok(Ok(summary)) => Ok(summary),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
    };
    if let Err(reason) = &result {
        error!("{} failed: {}", key, reason);
    }

    JobOutcome {
        key: *key,
        result,
        elapsed_secs: start.elapsed().as_secs_f64(),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
