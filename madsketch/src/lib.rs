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

//! # madsketch
//!
//! Approximate median absolute deviation over partitioned data, built on a mergeable rank
//! sketch.
//!
//! * [`rank`] holds [`RankSketch`](rank::RankSketch), a merging t-digest answering quantile
//!   queries in memory bounded by its compression.
//! * [`mad`] holds the aggregation: per-partition collection, reduction of partial results
//!   and estimation of the final value.
//!
//! Partial results and rank sketches serialize to a compact big-endian binary format so they
//! can be shipped between nodes.
//!
//! The library logs through [`tracing`](https://docs.rs/tracing) and never installs a
//! subscriber; applications choose where the events go.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod codec;

pub mod error;
pub mod mad;
pub mod rank;
