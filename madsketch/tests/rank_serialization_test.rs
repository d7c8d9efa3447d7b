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

use googletest::assert_that;
use googletest::prelude::contains_substring;
use madsketch::error::ErrorKind;
use madsketch::rank::RankSketch;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

const RANKS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];

#[test]
fn test_empty() {
    let sketch = RankSketch::new(100.0).unwrap();
    let bytes = sketch.serialize();
    // compression and a zero centroid count
    assert_eq!(bytes.len(), 9);
    assert_eq!(&bytes[..8], &100.0f64.to_be_bytes());
    assert_eq!(bytes[8], 0);

    let decoded = RankSketch::deserialize(&bytes).unwrap();
    assert!(decoded.is_empty());
    assert_eq!(decoded.compression(), 100.0);
    assert!(decoded.quantile(0.5).is_nan());
}

#[test]
fn test_single_value() {
    let mut sketch = RankSketch::new(50.0).unwrap();
    sketch.insert(123.0);

    let bytes = sketch.serialize();
    assert_eq!(bytes.len(), 8 + 1 + 16);
    assert_eq!(&bytes[9..17], &123.0f64.to_be_bytes());
    assert_eq!(&bytes[17..], &1.0f64.to_be_bytes());

    let decoded = RankSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded.compression(), 50.0);
    assert_eq!(decoded.size(), 1);
    assert_eq!(decoded.min_value(), Some(123.0));
    assert_eq!(decoded.max_value(), Some(123.0));
}

#[test]
fn test_many_values_round_trip() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut sketch = RankSketch::default();
    for _ in 0..50_000 {
        sketch.insert(rng.gen_range(-1_000.0..1_000.0));
    }

    let decoded = RankSketch::deserialize(&sketch.serialize()).unwrap();
    assert_eq!(decoded.size(), sketch.size());
    assert_eq!(decoded.min_value(), sketch.min_value());
    assert_eq!(decoded.max_value(), sketch.max_value());
    for rank in RANKS {
        assert_eq!(decoded.quantile(rank), sketch.quantile(rank), "rank {rank}");
    }

    // a decoded sketch serializes to the same bytes
    assert_eq!(decoded.serialize(), sketch.serialize());
}

#[test]
fn test_round_trip_with_buffered_values() {
    let mut sketch = RankSketch::default();
    for i in 0..100 {
        sketch.insert((i * 7 % 100) as f64);
    }
    let decoded = RankSketch::deserialize(&sketch.serialize()).unwrap();
    for rank in RANKS {
        assert_eq!(decoded.quantile(rank), sketch.quantile(rank), "rank {rank}");
    }
}

#[test]
fn test_rejects_truncated_input() {
    let mut sketch = RankSketch::default();
    for value in [1.0, 2.0, 3.0] {
        sketch.insert(value);
    }
    let bytes = sketch.serialize();
    for len in 0..bytes.len() {
        let err = RankSketch::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedData);
        assert_that!(err.message(), contains_substring("insufficient data"));
    }
}

#[test]
fn test_rejects_trailing_bytes() {
    let mut bytes = RankSketch::default().serialize();
    bytes.extend_from_slice(&[0, 0]);
    let err = RankSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
    assert_that!(err.message(), contains_substring("2 trailing bytes"));
}

#[test]
fn test_rejects_invalid_compression() {
    let mut bytes = RankSketch::default().serialize();
    bytes[..8].copy_from_slice(&(-1.0f64).to_be_bytes());
    let err = RankSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

#[test]
fn test_rejects_unsorted_centroids() {
    let mut sketch = RankSketch::default();
    sketch.insert(1.0);
    sketch.insert(2.0);
    let mut bytes = sketch.serialize();
    // swap the two means
    bytes[9..17].copy_from_slice(&2.0f64.to_be_bytes());
    bytes[25..33].copy_from_slice(&1.0f64.to_be_bytes());
    let err = RankSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

#[test]
fn test_rejects_zero_weight() {
    let mut sketch = RankSketch::default();
    sketch.insert(1.0);
    let mut bytes = sketch.serialize();
    bytes[17..25].copy_from_slice(&0.0f64.to_be_bytes());
    let err = RankSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
}

fn encode_sketch(compression: f64, centroids: &[(f64, f64)]) -> Vec<u8> {
    assert!(centroids.len() < 128, "count must fit a one-byte varint");
    let mut bytes = compression.to_be_bytes().to_vec();
    bytes.push(centroids.len() as u8);
    for (mean, weight) in centroids {
        bytes.extend_from_slice(&mean.to_be_bytes());
        bytes.extend_from_slice(&weight.to_be_bytes());
    }
    bytes
}

#[test]
fn test_rejects_total_weight_beyond_two_pow_53() {
    let heavy = (1u64 << 53) as f64;
    let bytes = encode_sketch(100.0, &[(1.0, heavy), (2.0, heavy), (3.0, heavy)]);
    let err = RankSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedData);
    assert_that!(err.message(), contains_substring("exceeds 2^53"));
}

#[test]
fn test_merging_heaviest_decoded_sketches() {
    let half = (1u64 << 52) as f64;
    let bytes = encode_sketch(100.0, &[(1.0, half), (2.0, half)]);
    let sketch = RankSketch::deserialize(&bytes).unwrap();
    assert_eq!(sketch.size(), 1 << 53);

    let merged = sketch.merge(&sketch).merge(&sketch);
    assert_eq!(merged.size(), 3 << 53);
    assert_eq!(merged.min_value(), Some(1.0));
    assert_eq!(merged.max_value(), Some(2.0));
}
