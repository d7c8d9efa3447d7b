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

//! Binary format of a [`PartialResult`]:
//!
//! | field            | encoding                                          |
//! |------------------|---------------------------------------------------|
//! | `serial_version` | 1 byte, currently `1`                             |
//! | `family`         | 1 byte, `42`                                      |
//! | `name`           | LEB128 varint byte length, then UTF-8 bytes       |
//! | `format`         | tag byte (`0` raw, `1` decimal followed by scale) |
//! | `deviations`     | rank sketch                                       |

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::family::Family;
use crate::codec::varint_len;
use crate::error::Error;
use crate::mad::MadConfig;
use crate::mad::ValueFormat;
use crate::rank::RankSketch;

const SERIAL_VERSION: u8 = 1;

/// The finalized state of one partition, or of several partitions already reduced together.
///
/// It carries the aggregation name, the output format and a [`RankSketch`] of absolute
/// deviations from the median. A partial result is immutable: the reducer builds new ones
/// instead of modifying its inputs, so partial results may be shared between threads freely.
///
/// # Examples
///
/// ```
/// # use madsketch::mad::{MadConfig, PartialResult};
/// let config = MadConfig::builder("mad", "price").build().unwrap();
/// let empty = PartialResult::empty(&config);
/// assert!(empty.is_empty());
///
/// let bytes = empty.serialize();
/// let decoded = PartialResult::deserialize(&bytes).unwrap();
/// assert_eq!(decoded.name(), "mad");
/// assert_eq!(decoded.size(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct PartialResult {
    name: String,
    format: ValueFormat,
    deviations: RankSketch,
}

impl PartialResult {
    pub(crate) fn new(name: String, format: ValueFormat, deviations: RankSketch) -> Self {
        PartialResult {
            name,
            format,
            deviations,
        }
    }

    /// Creates the result of a partition with no values for the field.
    pub fn empty(config: &MadConfig) -> Self {
        PartialResult::new(
            config.name().to_string(),
            config.format(),
            RankSketch::make(config.compression()),
        )
    }

    /// Name of the aggregation this result belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output format the final value is rendered with.
    pub fn format(&self) -> ValueFormat {
        self.format
    }

    /// Distribution of absolute deviations from the median.
    pub fn deviations(&self) -> &RankSketch {
        &self.deviations
    }

    /// Number of values that contributed to this result.
    pub fn size(&self) -> u64 {
        self.deviations.size()
    }

    /// Returns true if no value contributed to this result.
    pub fn is_empty(&self) -> bool {
        self.deviations.is_empty()
    }

    /// Serializes this result to bytes for transport to the reducing node.
    pub fn serialize(&self) -> Vec<u8> {
        let capacity = 2
            + varint_len(self.name.len() as u64)
            + self.name.len()
            + 2
            + self.deviations.serialized_size_hint();
        let mut bytes = SketchBytes::with_capacity(capacity);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(Family::MAD.id);
        bytes.write_str(&self.name);
        self.format.write_to(&mut bytes);
        self.deviations.write_to(&mut bytes);
        bytes.into_bytes()
    }

    /// Deserializes a result produced by [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedData`](crate::error::ErrorKind::MalformedData) if the bytes
    /// are truncated, carry trailing data, or any field fails validation.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
            move |err| Error::insufficient_data(tag).set_source(err)
        }

        let mut cursor = SketchSlice::new(bytes);
        let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
        if serial_version != SERIAL_VERSION {
            return Err(Error::unsupported_serial_version(
                SERIAL_VERSION,
                serial_version,
            ));
        }
        let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
        Family::MAD.validate_id(family_id)?;

        let name = cursor.read_string().map_err(make_error("name"))?;
        let format = ValueFormat::read_from(&mut cursor)?;
        let deviations = RankSketch::read_from(&mut cursor)
            .map_err(|err| err.with_context("aggregation", &name))?;

        if cursor.remaining() != 0 {
            return Err(Error::malformed(format!(
                "{} trailing bytes after partial result",
                cursor.remaining()
            ))
            .with_context("aggregation", &name));
        }
        Ok(PartialResult::new(name, format, deviations))
    }
}
