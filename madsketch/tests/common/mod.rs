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

#![allow(dead_code)]

use std::sync::Arc;

use madsketch::mad::MadConfig;
use madsketch::mad::PartialResult;
use madsketch::mad::PartitionCollector;
use madsketch::mad::SingleValuedColumn;

/// Median of `values` by sorting; the mean of both middle values for an even length.
pub fn exact_median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Exact median absolute deviation of `values`.
pub fn exact_mad(values: &[f64]) -> f64 {
    let median = exact_median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
    exact_median(&deviations)
}

/// Runs a collector over `values`, one document per value.
pub fn collect_partition(config: &Arc<MadConfig>, values: &[f64]) -> PartialResult {
    let column: SingleValuedColumn = values.iter().copied().collect();
    let num_docs = column.num_docs() as u32;
    let mut collector = PartitionCollector::new(config.clone(), column);
    collector.start();
    for doc in 0..num_docs {
        collector.collect(doc);
    }
    collector.finish()
}

/// Splits `values` round-robin over `partitions` partitions.
pub fn split_round_robin(values: &[f64], partitions: usize) -> Vec<Vec<f64>> {
    let mut split = vec![Vec::with_capacity(values.len() / partitions + 1); partitions];
    for (i, &value) in values.iter().enumerate() {
        split[i % partitions].push(value);
    }
    split
}

pub fn config() -> Arc<MadConfig> {
    Arc::new(MadConfig::builder("mad", "value").build().unwrap())
}
