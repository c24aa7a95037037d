// Copyright 2026 Batchwise Contributors
// SPDX-License-Identifier: Apache-2.0

//! Batchwise runtime library — bioprocess batch reporting.
//!
//! Derives per-batch aggregate statistics and paired sensor-difference time
//! series from fermentation sensor streams and batch/phase metadata. The
//! reporting core in [`report`] is stateless and read-only over a populated
//! [`store::BatchStore`]; [`ingest`] and [`render`] are the thin adapters on
//! either side of it.

pub mod cli;
pub mod ingest;
pub mod model;
pub mod render;
pub mod report;
pub mod store;
