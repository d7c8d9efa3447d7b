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

use crate::rank::RankSketch;
use crate::rank::sketch::Centroid;

impl IntoIterator for RankSketch {
    type Item = (f64, u64);
    type IntoIter = RankSketchIntoIter;

    /// Compresses the sketch and yields its centroids as `(mean, weight)` in ascending order of
    /// mean.
    fn into_iter(mut self) -> Self::IntoIter {
        self.compress();
        RankSketchIntoIter {
            centroids: std::mem::take(&mut self.centroids).into_iter(),
        }
    }
}

/// Iterator over the centroids of a [`RankSketch`].
pub struct RankSketchIntoIter {
    centroids: std::vec::IntoIter<Centroid>,
}

impl Iterator for RankSketchIntoIter {
    type Item = (f64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        self.centroids
            .next()
            .map(|centroid| (centroid.mean, centroid.weight.get()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.centroids.size_hint()
    }
}

impl ExactSizeIterator for RankSketchIntoIter {}
