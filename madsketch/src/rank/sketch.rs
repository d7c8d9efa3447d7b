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

use std::borrow::Cow;
use std::cmp::Ordering;
use std::num::NonZeroU64;

use crate::error::Error;

/// The default compression if one is not specified.
pub const DEFAULT_COMPRESSION: f64 = 100.0;
/// Multiplier for buffer size relative to centroids capacity.
const BUFFER_MULTIPLIER: usize = 4;
/// Weight of a single inserted value.
const UNIT_WEIGHT: NonZeroU64 = NonZeroU64::MIN;

/// Mergeable sketch for estimating quantiles of a numeric distribution.
///
/// See the [module level documentation](super) for more.
#[derive(Debug, Clone)]
pub struct RankSketch {
    compression: f64,

    reverse_merge: bool,
    min: f64,
    max: f64,

    pub(super) centroids: Vec<Centroid>,
    centroids_weight: u64,
    centroids_capacity: usize,
    buffer: Vec<f64>,
}

impl Default for RankSketch {
    fn default() -> Self {
        RankSketch::make(DEFAULT_COMPRESSION)
    }
}

impl RankSketch {
    /// Creates an empty sketch with the given compression.
    ///
    /// # Errors
    ///
    /// If compression is not a finite, strictly positive number, returns
    /// [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter).
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let sketch = RankSketch::new(100.0).unwrap();
    /// assert_eq!(sketch.compression(), 100.0);
    /// assert!(RankSketch::new(0.0).is_err());
    /// ```
    pub fn new(compression: f64) -> Result<Self, Error> {
        check_compression(compression)?;
        Ok(Self::make(compression))
    }

    pub(crate) fn make(compression: f64) -> Self {
        debug_assert!(compression.is_finite() && compression > 0.0);

        let fudge = if compression < 30.0 { 30 } else { 10 };
        // `as` saturates for huge compressions
        let centroids_capacity = ((2.0 * compression).ceil() as usize).saturating_add(fudge);

        RankSketch {
            compression,
            reverse_merge: false,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            centroids: vec![],
            centroids_weight: 0,
            centroids_capacity,
            buffer: vec![],
        }
    }

    /// Builds a sketch from `(value, weight)` pairs.
    ///
    /// Pairs with a non-finite value or a zero weight are skipped.
    ///
    /// # Errors
    ///
    /// If compression is not a finite, strictly positive number, returns
    /// [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter).
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let sketch = RankSketch::from_weighted(100.0, [(1.0, 2), (5.0, 1)]).unwrap();
    /// assert_eq!(sketch.size(), 3);
    /// assert_eq!(sketch.min_value(), Some(1.0));
    /// assert_eq!(sketch.quantile(1.0), 5.0);
    /// ```
    pub fn from_weighted<I>(compression: f64, pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (f64, u64)>,
    {
        check_compression(compression)?;
        let (incoming, total_weight) = weighted_centroids(pairs);
        let total_weight = total_weight
            .ok_or_else(|| Error::invalid_parameter("total weight of the pairs overflows u64"))?;
        let mut sketch = Self::make(compression);
        if !incoming.is_empty() {
            sketch.do_merge(incoming, total_weight);
        }
        Ok(sketch)
    }

    /// Like [`from_weighted`](Self::from_weighted) for a compression that was already
    /// validated; an overflowing total weight saturates.
    pub(crate) fn make_weighted<I>(compression: f64, pairs: I) -> Self
    where
        I: IntoIterator<Item = (f64, u64)>,
    {
        let (incoming, total_weight) = weighted_centroids(pairs);
        let mut sketch = Self::make(compression);
        if !incoming.is_empty() {
            sketch.do_merge(incoming, total_weight.unwrap_or(u64::MAX));
        }
        sketch
    }

    // for deserialization; centroids must be sorted by mean
    pub(super) fn from_parts(compression: f64, centroids: Vec<Centroid>, weight: u64) -> Self {
        let mut sketch = Self::make(compression);
        if let (Some(first), Some(last)) = (centroids.first(), centroids.last()) {
            sketch.min = first.mean;
            sketch.max = last.mean;
        }
        sketch.centroids = centroids;
        sketch.centroids_weight = weight;
        sketch
    }

    /// Inserts a value into the sketch.
    ///
    /// [f64::NAN], [f64::INFINITY], and [f64::NEG_INFINITY] values are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let mut sketch = RankSketch::default();
    /// sketch.insert(1.0);
    /// sketch.insert(f64::NAN);
    /// assert_eq!(sketch.size(), 1);
    /// ```
    pub fn insert(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        if self.buffer.len() >= self.buffer_capacity() {
            self.compress();
        }

        self.buffer.push(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Returns the compression this sketch was configured with.
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Returns true if the sketch has not seen any data.
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty() && self.buffer.is_empty()
    }

    /// Returns the total inserted weight, that is the number of values seen.
    pub fn size(&self) -> u64 {
        self.centroids_weight.saturating_add(self.buffer.len() as u64)
    }

    /// Returns minimum value seen by the sketch; `None` if the sketch is empty.
    pub fn min_value(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.min)
        }
    }

    /// Returns maximum value seen by the sketch; `None` if the sketch is empty.
    pub fn max_value(&self) -> Option<f64> {
        if self.is_empty() {
            None
        } else {
            Some(self.max)
        }
    }

    /// Returns the number of centroids retained by the last compression.
    ///
    /// Values inserted since then are buffered and not counted.
    pub fn num_centroids(&self) -> usize {
        self.centroids.len()
    }

    pub(super) fn num_buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Merges `other` into this sketch.
    ///
    /// The compression of this sketch is kept. Merging an empty sketch is a no-op.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let mut left = RankSketch::default();
    /// let mut right = RankSketch::default();
    /// left.insert(1.0);
    /// right.insert(2.0);
    /// left.merge_from(&right);
    /// assert_eq!(left.size(), 2);
    /// ```
    pub fn merge_from(&mut self, other: &RankSketch) {
        if other.is_empty() {
            return;
        }

        let mut incoming = Vec::with_capacity(
            self.buffer.len() + other.centroids.len() + other.buffer.len() + self.centroids.len(),
        );
        incoming.extend(self.buffer.iter().map(|&mean| Centroid::unit(mean)));
        incoming.extend(other.buffer.iter().map(|&mean| Centroid::unit(mean)));
        incoming.extend_from_slice(&other.centroids);
        self.do_merge(incoming, other.size().saturating_add(self.buffer.len() as u64));
    }

    /// Returns a new sketch holding the union of this sketch and `other`.
    ///
    /// The result uses the smaller of both compressions, so its accuracy is bounded by the less
    /// accurate input. Neither input is modified.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let mut left = RankSketch::new(50.0).unwrap();
    /// let mut right = RankSketch::new(200.0).unwrap();
    /// left.insert(1.0);
    /// right.insert(3.0);
    /// let merged = left.merge(&right);
    /// assert_eq!(merged.compression(), 50.0);
    /// assert_eq!(merged.quantile(0.5), 2.0);
    /// ```
    pub fn merge(&self, other: &RankSketch) -> RankSketch {
        let mut merged = RankSketch::make(self.compression.min(other.compression));
        merged.merge_from(self);
        merged.merge_from(other);
        merged
    }

    /// Computes the approximate quantile value corresponding to the given normalized rank.
    ///
    /// Returns [f64::NAN] if the sketch is empty.
    ///
    /// # Panics
    ///
    /// Panics if rank is not in [0.0, 1.0].
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let mut sketch = RankSketch::default();
    /// assert!(sketch.quantile(0.5).is_nan());
    /// for value in [1.0, 2.0, 3.0, 4.0, 5.0, 100.0] {
    ///     sketch.insert(value);
    /// }
    /// assert_eq!(sketch.quantile(0.0), 1.0);
    /// assert_eq!(sketch.quantile(0.5), 3.5);
    /// assert_eq!(sketch.quantile(1.0), 100.0);
    /// ```
    pub fn quantile(&self, rank: f64) -> f64 {
        assert!((0.0..=1.0).contains(&rank), "rank must be in [0.0, 1.0]");

        if self.is_empty() {
            return f64::NAN;
        }
        self.compressed().quantile_of_centroids(rank)
    }

    fn quantile_of_centroids(&self, rank: f64) -> f64 {
        debug_assert!(self.buffer.is_empty(), "buffer must be compressed");

        let last_index = (self.centroids_weight - 1) as f64;
        let index = rank * last_index;

        // Each centroid sits at the index of its middle value; min and max anchor both ends.
        let mut prev_index = 0.;
        let mut prev_mean = self.min;
        let mut weight_so_far = 0.;
        for c in &self.centroids {
            let center = weight_so_far + (c.weight() - 1.) / 2.;
            if index <= center {
                return interpolate(prev_index, prev_mean, center, c.mean, index);
            }
            prev_index = center;
            prev_mean = c.mean;
            weight_so_far += c.weight();
        }
        interpolate(prev_index, prev_mean, last_index, self.max, index)
    }

    /// Processes buffered values, merging centroids back toward the bound implied by the
    /// compression.
    ///
    /// This runs automatically once the insertion buffer fills up, before quantile queries,
    /// and before serialization.
    pub fn compress(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let incoming = self.buffer.iter().map(|&mean| Centroid::unit(mean)).collect();
        self.do_merge(incoming, self.buffer.len() as u64)
    }

    /// Returns this sketch with the buffer compressed, cloning only when there is buffered data.
    pub(super) fn compressed(&self) -> Cow<'_, RankSketch> {
        if self.buffer.is_empty() {
            Cow::Borrowed(self)
        } else {
            let mut sketch = self.clone();
            sketch.compress();
            Cow::Owned(sketch)
        }
    }

    fn buffer_capacity(&self) -> usize {
        self.centroids_capacity.saturating_mul(BUFFER_MULTIPLIER)
    }

    /// Merges the given centroids into this sketch.
    ///
    /// # Contract
    ///
    /// * `incoming` must have at least one centroid.
    /// * `incoming` already holds every value of `self.buffer`, so the buffer is cleared.
    /// * No `NAN` values are present in `incoming`.
    fn do_merge(&mut self, mut incoming: Vec<Centroid>, weight: u64) {
        incoming.extend(std::mem::take(&mut self.centroids));
        incoming.sort_by(centroid_cmp);
        if self.reverse_merge {
            incoming.reverse();
        }
        self.centroids_weight = self.centroids_weight.saturating_add(weight);

        let centroids_weight = self.centroids_weight as f64;
        let normalizer = scale_function::normalizer(2. * self.compression, centroids_weight);

        let len = incoming.len();
        self.centroids.push(incoming[0]);
        let mut weight_so_far = 0.;
        for (current, &c) in incoming.iter().enumerate().skip(1) {
            let last = self.centroids.len() - 1;
            let proposed_weight = self.centroids[last].weight() + c.weight();
            let mut add_this = false;
            // the extremes are never absorbed, which keeps min and max exact
            if current != 1 && current != len - 1 {
                let q0 = weight_so_far / centroids_weight;
                let q2 = (weight_so_far + proposed_weight) / centroids_weight;
                add_this = proposed_weight
                    <= centroids_weight
                        * scale_function::max(q0, normalizer)
                            .min(scale_function::max(q2, normalizer));
            }
            if add_this {
                self.centroids[last].add(c);
            } else {
                weight_so_far += self.centroids[last].weight();
                self.centroids.push(c);
            }
        }

        if self.reverse_merge {
            self.centroids.reverse();
        }
        let num_centroids = self.centroids.len();
        self.min = self.min.min(self.centroids[0].mean);
        self.max = self.max.max(self.centroids[num_centroids - 1].mean);
        self.reverse_merge = !self.reverse_merge;
        self.buffer.clear();

        tracing::trace!(
            num_centroids,
            total_weight = self.centroids_weight,
            compression = self.compression,
            "recompressed rank sketch"
        );
    }
}

/// Collects the valid pairs; the total weight is `None` if it overflows.
fn weighted_centroids<I>(pairs: I) -> (Vec<Centroid>, Option<u64>)
where
    I: IntoIterator<Item = (f64, u64)>,
{
    let pairs = pairs.into_iter();
    let mut incoming = Vec::with_capacity(pairs.size_hint().0);
    let mut total_weight = Some(0u64);
    for (mean, weight) in pairs {
        let Some(weight) = NonZeroU64::new(weight) else {
            continue;
        };
        if !mean.is_finite() {
            continue;
        }
        total_weight = total_weight.and_then(|total| total.checked_add(weight.get()));
        incoming.push(Centroid { mean, weight });
    }
    (incoming, total_weight)
}

pub(super) fn check_compression(compression: f64) -> Result<(), Error> {
    if compression.is_finite() && compression > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_parameter(format!(
            "compression must be a finite number greater than 0, got {compression}"
        )))
    }
}

fn centroid_cmp(a: &Centroid, b: &Centroid) -> Ordering {
    match a.mean.partial_cmp(&b.mean) {
        Some(order) => order,
        None => unreachable!("NaN values should never be present in centroids"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Centroid {
    pub(super) mean: f64,
    pub(super) weight: NonZeroU64,
}

impl Centroid {
    fn unit(mean: f64) -> Self {
        Centroid {
            mean,
            weight: UNIT_WEIGHT,
        }
    }

    fn add(&mut self, other: Centroid) {
        let (self_weight, other_weight) = (self.weight(), other.weight());
        let total_weight = self_weight + other_weight;
        self.weight = self.weight.saturating_add(other.weight.get());

        let (self_mean, other_mean) = (self.mean, other.mean);
        let ratio_other = other_weight / total_weight;
        let delta = other_mean - self_mean;
        self.mean = if delta.is_finite() {
            delta.mul_add(ratio_other, self_mean)
        } else {
            let ratio_self = self_weight / total_weight;
            self_mean.mul_add(ratio_self, other_mean * ratio_other)
        };

        debug_assert!(
            self.mean.is_finite(),
            "Centroid's mean must be finite; self: {self_mean}, other: {other_mean}"
        );
    }

    pub(super) fn weight(&self) -> f64 {
        self.weight.get() as f64
    }
}

/// Generates cluster sizes proportional to `q*(1-q)`.
///
/// The use of a normalizing function results in a strictly bounded number of clusters no matter
/// how many samples.
///
/// Corresponds to K_2 in the t-digest paper.
mod scale_function {
    pub(super) fn max(q: f64, normalizer: f64) -> f64 {
        q * (1. - q) / normalizer
    }

    pub(super) fn normalizer(compression: f64, n: f64) -> f64 {
        compression / z(compression, n)
    }

    pub(super) fn z(compression: f64, n: f64) -> f64 {
        4. * (n / compression).ln() + 24.
    }
}

/// Linear interpolation at `x` on the segment `(x0, y0)`-`(x1, y1)`.
fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if x1 <= x0 || y0 == y1 {
        return y1;
    }
    weighted_average(y0, x1 - x, y1, x - x0)
}

const fn weighted_average(x1: f64, w1: f64, x2: f64, w2: f64) -> f64 {
    (x1 * w1 + x2 * w2) / (w1 + w2)
}
