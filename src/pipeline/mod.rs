// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build pipeline: batching, evaluation and result caching

mod batcher;
mod cache;
mod evaluator;

pub use batcher::{BatchPlan, Batcher, MergeCache};
pub use cache::ResultCache;
pub use evaluator::{BooleanEvaluator, Evaluation, OpFailure};
