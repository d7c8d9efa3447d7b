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

//! Median absolute deviation of a numeric field over a partitioned document collection.
//!
//! The median absolute deviation (MAD) is the median of the absolute differences between each
//! value and the median of all values. It is a robust measure of spread: a handful of outliers
//! barely moves it.
//!
//! Computing it exactly needs every value in one place. Here each partition instead summarizes
//! its values with a bounded-memory [`RankSketch`](crate::rank::RankSketch) and the partial
//! results are merged:
//!
//! 1. A [`PartitionCollector`] reads the values of every matching document from a
//!    [`ValueSource`] and, when finished, turns them into a [`PartialResult`] holding a sketch
//!    of absolute deviations from the partition's median.
//! 2. A [`Reducer`] merges the partial results of all partitions, in any order and possibly as
//!    a parallel tree.
//! 3. The [`Estimator`] reads the median of the merged deviations and renders a
//!    [`MadResponse`].
//!
//! All stages share one immutable [`MadConfig`].
//!
//! # Usage
//!
//! ```rust
//! # use std::sync::Arc;
//! # use madsketch::mad::{Estimator, MadConfig, PartitionCollector, Reducer, SingleValuedColumn};
//! let config = Arc::new(
//!     MadConfig::from_json(r#"{"name": "mad", "field": "price", "format": {"decimal": {"scale": 1}}}"#)
//!         .unwrap(),
//! );
//!
//! let partitions = [vec![1.0, 2.0, 3.0], vec![], vec![4.0, 5.0, 100.0]];
//! let partials = partitions
//!     .into_iter()
//!     .map(|values| {
//!         let column: SingleValuedColumn = values.into_iter().collect();
//!         let num_docs = column.num_docs() as u32;
//!         let mut collector = PartitionCollector::new(config.clone(), column);
//!         collector.start();
//!         for doc in 0..num_docs {
//!             collector.collect(doc);
//!         }
//!         collector.finish()
//!     })
//!     .collect::<Vec<_>>();
//!
//! let merged = Reducer::new(config).reduce(partials).unwrap();
//! let response = Estimator::response(&merged);
//! assert_eq!(merged.size(), 6);
//! assert!(response.value.is_some());
//! ```

mod collector;
mod config;
mod estimator;
mod format;
mod partial;
mod reducer;
mod source;

pub use self::collector::CollectorPhase;
pub use self::collector::PartitionCollector;
pub use self::config::MadConfig;
pub use self::config::MadConfigBuilder;
pub use self::estimator::Estimator;
pub use self::estimator::MadResponse;
pub use self::format::ValueFormat;
pub use self::partial::PartialResult;
pub use self::reducer::Reducer;
pub use self::source::DocId;
pub use self::source::FnValueSource;
pub use self::source::MultiValuedColumn;
pub use self::source::SingleValuedColumn;
pub use self::source::ValueSource;
