// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Core type definitions shared by every stage of the pipeline.

pub mod error;
pub mod fit;
pub mod trace;

pub use error::{Result, StatsError};
pub use fit::{BranchingEstimate, FitResult, LinearFit};
pub use trace::{
    ActivityTrace, AvalancheSizeList, BinnedTrace, DataType, EventMode, ThresholdConfig,
    ThresholdedTrace,
};
