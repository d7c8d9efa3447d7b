// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::Error;
use crate::mad::MadConfig;
use crate::mad::PartialResult;
use crate::rank::RankSketch;

/// Combines the partial results of many partitions into one.
///
/// Reduction is a pure function of its inputs: the inputs are never modified and a new
/// [`PartialResult`] is returned. Because merging rank sketches is associative and commutative
/// up to their approximation error, partial results may be reduced in any order or grouping,
/// including as a parallel tree with [`reduce_tree`](Self::reduce_tree).
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use madsketch::mad::{Estimator, MadConfig, PartitionCollector, Reducer, SingleValuedColumn};
/// let config = Arc::new(MadConfig::builder("mad", "value").build().unwrap());
/// let partials = [vec![1.0, 1.0, 1.0, 1.0], vec![1.0, 1.0, 1.0, 1.0]]
///     .into_iter()
///     .map(|values| {
///         let mut collector = PartitionCollector::new(config.clone(), SingleValuedColumn::default());
///         collector.start();
///         collector.collect_values(values);
///         collector.finish()
///     })
///     .collect::<Vec<_>>();
///
/// let merged = Reducer::new(config).reduce(partials).unwrap();
/// assert_eq!(merged.size(), 8);
/// assert_eq!(Estimator::value(&merged), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Reducer {
    config: Arc<MadConfig>,
}

impl Reducer {
    /// Creates a reducer for the aggregation described by `config`.
    pub fn new(config: Arc<MadConfig>) -> Self {
        Reducer { config }
    }

    /// Reduces `results` into a single partial result.
    ///
    /// The first result leads: the merged result carries its name and format, and its
    /// compression sizes the accumulator every deviation sketch is merged into. A single result
    /// is returned unchanged.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter) if `results`
    ///   is empty.
    /// * [`ErrorKind::InconsistentPartialResults`](crate::error::ErrorKind::InconsistentPartialResults)
    ///   if a result belongs to another aggregation or was rendered with another format.
    pub fn reduce(&self, mut results: Vec<PartialResult>) -> Result<PartialResult, Error> {
        if results.len() == 1 {
            if let Some(result) = results.pop() {
                self.check_leader(&result)?;
                return Ok(result);
            }
        }
        self.merge_all(&results)
    }

    /// Reduces `results` as a tree of merges, each merging at most `fan_in` results.
    ///
    /// All merges of one tree level run in parallel on the rayon thread pool. The result is
    /// equivalent to [`reduce`](Self::reduce) up to the approximation error of the sketches.
    ///
    /// # Errors
    ///
    /// Same as [`reduce`](Self::reduce); in addition `fan_in` below 2 is
    /// [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter).
    pub fn reduce_tree(
        &self,
        results: Vec<PartialResult>,
        fan_in: usize,
    ) -> Result<PartialResult, Error> {
        if fan_in < 2 {
            return Err(Error::invalid_parameter(format!(
                "[fan_in] must be at least 2, found [{fan_in}]"
            ))
            .with_context("aggregation", self.config.name()));
        }

        let mut level = results;
        let mut depth = 0;
        while level.len() > 1 {
            tracing::debug!(
                aggregation = self.config.name(),
                depth,
                num_inputs = level.len(),
                fan_in,
                "reducing tree level"
            );
            level = level
                .par_chunks(fan_in)
                .map(|chunk| self.merge_all(chunk))
                .collect::<Result<Vec<_>, _>>()?;
            depth += 1;
        }
        self.reduce(level)
    }

    fn merge_all(&self, results: &[PartialResult]) -> Result<PartialResult, Error> {
        let Some(leader) = results.first() else {
            return Err(Error::invalid_parameter("no partial results to reduce")
                .with_context("aggregation", self.config.name()));
        };
        self.check_leader(leader)?;

        let mut merged = RankSketch::make(leader.deviations().compression());
        for (index, result) in results.iter().enumerate() {
            if result.name() != leader.name() {
                return Err(Error::inconsistent_partials(format!(
                    "cannot reduce partial result of [{}] into [{}]",
                    result.name(),
                    leader.name()
                ))
                .with_context("index", index));
            }
            if result.format() != leader.format() {
                return Err(Error::inconsistent_partials(format!(
                    "partial result format {:?} does not match {:?}",
                    result.format(),
                    leader.format()
                ))
                .with_context("aggregation", leader.name())
                .with_context("index", index));
            }
            merged.merge_from(result.deviations());
        }

        tracing::debug!(
            aggregation = leader.name(),
            num_inputs = results.len(),
            total_weight = merged.size(),
            "reduced partial results"
        );
        Ok(PartialResult::new(
            leader.name().to_string(),
            leader.format(),
            merged,
        ))
    }

    fn check_leader(&self, leader: &PartialResult) -> Result<(), Error> {
        if leader.name() != self.config.name() {
            return Err(Error::inconsistent_partials(format!(
                "cannot reduce partial result of [{}] into [{}]",
                leader.name(),
                self.config.name()
            )));
        }
        Ok(())
    }
}
