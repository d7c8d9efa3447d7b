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

//! Mergeable rank sketch for estimating quantiles of a numeric distribution.
//!
//! [`RankSketch`] is a merging t-digest, following the MergingDigest described in
//! [Computing Extremely Accurate Quantiles Using t-Digests][paper] by Ted Dunning and Otmar
//! Ertl. It summarizes an unbounded stream of values with a number of centroids bounded by a
//! function of the `compression` parameter: a larger compression keeps more centroids and
//! answers more accurately.
//!
//! Sketches are mergeable. Merging is associative and commutative up to the approximation
//! error of the sketch, which is what allows partial sketches built on independent partitions to
//! be combined in any order, or as an arbitrary reduction tree.
//!
//! The smallest and largest centroids are never absorbed into their neighbours, so
//! `quantile(0.0)` and `quantile(1.0)` are the exact extremes. Quantiles in between are linearly
//! interpolated between centroids. While every centroid still carries a single value the answer
//! is the exact sample quantile.
//!
//! # Usage
//!
//! ```rust
//! # use madsketch::rank::RankSketch;
//! let mut sketch = RankSketch::new(100.0).unwrap();
//! for value in [1.0, 2.0, 3.0, 4.0] {
//!     sketch.insert(value);
//! }
//! assert_eq!(sketch.size(), 4);
//! assert_eq!(sketch.quantile(0.5), 2.5);
//! ```
//!
//! [paper]: https://arxiv.org/abs/1902.04023

mod iter;
mod serialization;
mod sketch;

pub use self::iter::RankSketchIntoIter;
pub use self::sketch::DEFAULT_COMPRESSION;
pub use self::sketch::RankSketch;
