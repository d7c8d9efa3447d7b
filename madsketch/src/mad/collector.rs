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

use crate::mad::MadConfig;
use crate::mad::PartialResult;
use crate::mad::ValueSource;
use crate::mad::source::DocId;
use crate::rank::RankSketch;

/// Lifecycle phase of a [`PartitionCollector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorPhase {
    /// Created; [`start`](PartitionCollector::start) has not been called.
    Idle,
    /// Accepting documents.
    Collecting,
    /// [`finish`](PartitionCollector::finish) produced the partial result.
    Finalized,
}

#[derive(Debug)]
enum State {
    Idle,
    Collecting(RankSketch),
    Finalized,
}

/// Collects the values of one partition and turns them into a [`PartialResult`].
///
/// A collector is owned by the worker that scans its partition and is never shared, so it
/// needs no synchronization. It moves through `Idle → Collecting → Finalized`; calling an
/// operation in the wrong phase is a programming error and panics.
///
/// Collection is a single forward pass. Values are summarized in a value sketch, and
/// [`finish`](Self::finish) derives the deviation sketch from it in two internal phases: first
/// the local median is estimated, then the absolute deviation of every centroid from that
/// median is weighed into a fresh sketch. Memory stays bounded by the compression regardless
/// of the partition size.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use madsketch::mad::{Estimator, MadConfig, PartitionCollector, SingleValuedColumn};
/// let config = Arc::new(MadConfig::builder("mad", "latency").build().unwrap());
/// let column: SingleValuedColumn = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0].into_iter().collect();
///
/// let mut collector = PartitionCollector::new(config, column);
/// collector.start();
/// for doc in 0..6 {
///     collector.collect(doc);
/// }
/// let partial = collector.finish();
/// assert_eq!(Estimator::value(&partial), 1.5);
/// ```
#[derive(Debug)]
pub struct PartitionCollector<S> {
    config: Arc<MadConfig>,
    source: S,
    state: State,
}

impl<S: ValueSource> PartitionCollector<S> {
    /// Creates an idle collector reading values from `source`.
    pub fn new(config: Arc<MadConfig>, source: S) -> Self {
        PartitionCollector {
            config,
            source,
            state: State::Idle,
        }
    }

    /// Returns the current lifecycle phase.
    pub fn phase(&self) -> CollectorPhase {
        match self.state {
            State::Idle => CollectorPhase::Idle,
            State::Collecting(_) => CollectorPhase::Collecting,
            State::Finalized => CollectorPhase::Finalized,
        }
    }

    /// Allocates the working value sketch and starts accepting documents.
    ///
    /// # Panics
    ///
    /// Panics if the collector is not idle.
    pub fn start(&mut self) {
        assert_eq!(
            self.phase(),
            CollectorPhase::Idle,
            "collector must be idle to start"
        );
        self.state = State::Collecting(RankSketch::make(self.config.compression()));
    }

    /// Adds every value `doc` has for the field; a document without values adds nothing.
    ///
    /// # Panics
    ///
    /// Panics if the collector is not collecting.
    pub fn collect(&mut self, doc: DocId) {
        let State::Collecting(sketch) = &mut self.state else {
            panic!("collector must be started before collecting documents");
        };
        for value in self.source.values(doc) {
            sketch.insert(value);
        }
    }

    /// Adds values that were extracted outside of the value source.
    ///
    /// # Panics
    ///
    /// Panics if the collector is not collecting.
    pub fn collect_values(&mut self, values: impl IntoIterator<Item = f64>) {
        let State::Collecting(sketch) = &mut self.state else {
            panic!("collector must be started before collecting values");
        };
        for value in values {
            sketch.insert(value);
        }
    }

    /// Finalizes the partition.
    ///
    /// A partition without any value yields an empty result, which is neutral under reduction.
    ///
    /// # Panics
    ///
    /// Panics if the collector is not collecting.
    pub fn finish(&mut self) -> PartialResult {
        assert_eq!(
            self.phase(),
            CollectorPhase::Collecting,
            "collector must be started before it is finished"
        );
        let State::Collecting(values) = std::mem::replace(&mut self.state, State::Finalized) else {
            unreachable!("phase was checked above");
        };

        let name = self.config.name().to_string();
        let format = self.config.format();
        let compression = self.config.compression();

        if values.is_empty() {
            tracing::debug!(aggregation = %name, "finalized empty partition");
            return PartialResult::new(name, format, RankSketch::make(compression));
        }

        let size = values.size();
        let median = values.quantile(0.5);
        let deviations = RankSketch::make_weighted(
            compression,
            values
                .into_iter()
                .map(|(mean, weight)| ((mean - median).abs(), weight)),
        );
        tracing::debug!(
            aggregation = %name,
            size,
            median,
            num_centroids = deviations.num_centroids(),
            "finalized partition"
        );
        PartialResult::new(name, format, deviations)
    }
}
