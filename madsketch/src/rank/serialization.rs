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

//! Binary format of a [`RankSketch`]:
//!
//! | field            | encoding                                     |
//! |------------------|----------------------------------------------|
//! | `compression`    | 8-byte big-endian IEEE-754 float             |
//! | `centroid_count` | unsigned LEB128 varint                       |
//! | `centroids`      | `centroid_count` × (`mean` f64, `weight` f64) |
//!
//! The sketch is compressed before it is written, so buffered values are part of the
//! centroids.

use std::num::NonZeroU64;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::varint_len;
use crate::error::Error;
use crate::rank::RankSketch;
use crate::rank::sketch::Centroid;
use crate::rank::sketch::check_compression;

const CENTROID_SIZE: usize = 2 * size_of::<f64>();
/// Largest integer an f64 represents exactly; weights beyond it cannot come from a real count.
const MAX_EXACT_WEIGHT: f64 = MAX_EXACT_TOTAL_WEIGHT as f64;
const MAX_EXACT_TOTAL_WEIGHT: u64 = 1 << 53;

impl RankSketch {
    /// Serializes this sketch to bytes.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::rank::RankSketch;
    /// let mut sketch = RankSketch::default();
    /// sketch.insert(1.0);
    /// sketch.insert(2.0);
    /// let bytes = sketch.serialize();
    /// let decoded = RankSketch::deserialize(&bytes).unwrap();
    /// assert_eq!(decoded.quantile(0.5), sketch.quantile(0.5));
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(self.serialized_size_hint());
        self.write_to(&mut bytes);
        bytes.into_bytes()
    }

    /// Deserializes a sketch from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedData`](crate::error::ErrorKind::MalformedData) if the bytes
    /// are truncated, carry trailing data, or describe an invalid sketch.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let sketch = Self::read_from(&mut cursor)?;
        if cursor.remaining() != 0 {
            return Err(Error::malformed(format!(
                "{} trailing bytes after rank sketch",
                cursor.remaining()
            )));
        }
        Ok(sketch)
    }

    pub(crate) fn serialized_size_hint(&self) -> usize {
        // buffered values count as unit centroids, so this is an upper bound until compressed
        let num_centroids = self.num_centroids() + self.num_buffered();
        size_of::<f64>() + varint_len(num_centroids as u64) + num_centroids * CENTROID_SIZE
    }

    pub(crate) fn write_to(&self, bytes: &mut SketchBytes) {
        let sketch = self.compressed();
        bytes.write_f64_be(sketch.compression());
        bytes.write_varint(sketch.centroids.len() as u64);
        for centroid in &sketch.centroids {
            bytes.write_f64_be(centroid.mean);
            bytes.write_f64_be(centroid.weight());
        }
    }

    pub(crate) fn read_from(cursor: &mut SketchSlice<'_>) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |err| Error::insufficient_data(tag).set_source(err)
        }

        let compression = cursor.read_f64_be().map_err(make_error("compression"))?;
        check_compression(compression)
            .map_err(|err| Error::malformed(err.message().to_string()))?;

        let num_centroids = cursor.read_varint().map_err(make_error("centroid_count"))?;
        if num_centroids > (cursor.remaining() / CENTROID_SIZE) as u64 {
            return Err(Error::insufficient_data("centroids")
                .with_context("centroid_count", num_centroids)
                .with_context("remaining_bytes", cursor.remaining()));
        }

        let mut centroids = Vec::with_capacity(num_centroids as usize);
        let mut total_weight = 0u64;
        let mut previous_mean = f64::NEG_INFINITY;
        for _ in 0..num_centroids {
            let mean = cursor.read_f64_be().map_err(make_error("mean"))?;
            let weight = cursor.read_f64_be().map_err(make_error("weight"))?;
            if !mean.is_finite() {
                return Err(Error::malformed(format!(
                    "centroid mean must be finite, got {mean}"
                )));
            }
            if mean < previous_mean {
                return Err(Error::malformed("centroids must be sorted by mean")
                    .with_context("previous", previous_mean)
                    .with_context("current", mean));
            }
            let weight = check_weight(weight)?;
            // weights travel as f64, so larger totals cannot come from a real count
            total_weight += weight.get();
            if total_weight > MAX_EXACT_TOTAL_WEIGHT {
                return Err(Error::malformed(format!(
                    "total centroid weight exceeds 2^53, got at least {total_weight}"
                )));
            }
            previous_mean = mean;
            centroids.push(Centroid { mean, weight });
        }

        Ok(RankSketch::from_parts(compression, centroids, total_weight))
    }
}

fn check_weight(weight: f64) -> Result<NonZeroU64, Error> {
    if !(1.0..=MAX_EXACT_WEIGHT).contains(&weight) || weight.fract() != 0.0 {
        return Err(Error::malformed(format!(
            "centroid weight must be a positive integer, got {weight}"
        )));
    }
    NonZeroU64::new(weight as u64)
        .ok_or_else(|| Error::malformed("centroid weight cannot be zero"))
}
