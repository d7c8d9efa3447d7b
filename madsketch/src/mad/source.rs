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

//! Per-document numeric value extraction.
//!
//! The aggregation never reads field storage directly. It asks a [`ValueSource`] for the
//! values of each matching document, which keeps single-valued fields, multi-valued fields and
//! scripted values behind one interface.

/// Identifier of a document within a partition.
pub type DocId = u32;

/// Yields the numeric values of a document.
///
/// A document may have zero, one or several values. Calling [`values`](Self::values) again for
/// the same document restarts the sequence.
pub trait ValueSource {
    /// Iterator over the values of one document.
    type Values<'a>: Iterator<Item = f64>
    where
        Self: 'a;

    /// Returns the values of `doc`; empty when the document has no value for the field.
    fn values(&self, doc: DocId) -> Self::Values<'_>;
}

/// A column holding at most one value per document.
///
/// # Examples
///
/// ```
/// # use madsketch::mad::{SingleValuedColumn, ValueSource};
/// let column = SingleValuedColumn::new(vec![Some(1.0), None]);
/// assert_eq!(column.values(0).collect::<Vec<_>>(), vec![1.0]);
/// assert_eq!(column.values(1).count(), 0);
/// assert_eq!(column.values(7).count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SingleValuedColumn {
    values: Vec<Option<f64>>,
}

impl SingleValuedColumn {
    /// Creates a column where `values[doc]` is the value of `doc`.
    pub fn new(values: Vec<Option<f64>>) -> Self {
        SingleValuedColumn { values }
    }

    /// Number of documents in the column.
    pub fn num_docs(&self) -> usize {
        self.values.len()
    }
}

impl FromIterator<f64> for SingleValuedColumn {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        SingleValuedColumn::new(iter.into_iter().map(Some).collect())
    }
}

impl ValueSource for SingleValuedColumn {
    type Values<'a> = std::option::IntoIter<f64>;

    fn values(&self, doc: DocId) -> Self::Values<'_> {
        self.values.get(doc as usize).copied().flatten().into_iter()
    }
}

/// A column holding any number of values per document, stored contiguously.
///
/// # Examples
///
/// ```
/// # use madsketch::mad::{MultiValuedColumn, ValueSource};
/// let column = MultiValuedColumn::from_docs([vec![1.0, 2.0], vec![], vec![3.0]]);
/// assert_eq!(column.num_docs(), 3);
/// assert_eq!(column.values(0).collect::<Vec<_>>(), vec![1.0, 2.0]);
/// assert_eq!(column.values(1).count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MultiValuedColumn {
    // values of doc `d` are `values[offsets[d]..offsets[d + 1]]`
    offsets: Vec<usize>,
    values: Vec<f64>,
}

impl Default for MultiValuedColumn {
    fn default() -> Self {
        MultiValuedColumn {
            offsets: vec![0],
            values: vec![],
        }
    }
}

impl MultiValuedColumn {
    /// Builds a column from the values of each document in order.
    pub fn from_docs<D, V>(docs: D) -> Self
    where
        D: IntoIterator<Item = V>,
        V: IntoIterator<Item = f64>,
    {
        let mut column = MultiValuedColumn::default();
        for doc in docs {
            column.push_doc(doc);
        }
        column
    }

    /// Appends a document with the given values.
    pub fn push_doc(&mut self, values: impl IntoIterator<Item = f64>) {
        self.values.extend(values);
        self.offsets.push(self.values.len());
    }

    /// Number of documents in the column.
    pub fn num_docs(&self) -> usize {
        self.offsets.len() - 1
    }
}

impl ValueSource for MultiValuedColumn {
    type Values<'a> = std::iter::Copied<std::slice::Iter<'a, f64>>;

    fn values(&self, doc: DocId) -> Self::Values<'_> {
        let doc = doc as usize;
        let values = match (self.offsets.get(doc), self.offsets.get(doc + 1)) {
            (Some(&start), Some(&end)) => &self.values[start..end],
            _ => &[],
        };
        values.iter().copied()
    }
}

/// Values computed by a function of the document, such as a script.
///
/// # Examples
///
/// ```
/// # use madsketch::mad::{FnValueSource, ValueSource};
/// let doubled = FnValueSource::new(|doc: u32| [doc as f64 * 2.0]);
/// assert_eq!(doubled.values(21).collect::<Vec<_>>(), vec![42.0]);
/// ```
#[derive(Debug, Clone)]
pub struct FnValueSource<F> {
    f: F,
}

impl<F> FnValueSource<F> {
    /// Wraps `f`, which returns the values of a document.
    pub fn new(f: F) -> Self {
        FnValueSource { f }
    }
}

impl<F, I> ValueSource for FnValueSource<F>
where
    F: Fn(DocId) -> I,
    I: IntoIterator<Item = f64>,
{
    type Values<'a>
        = I::IntoIter
    where
        Self: 'a;

    fn values(&self, doc: DocId) -> Self::Values<'_> {
        (self.f)(doc).into_iter()
    }
}
