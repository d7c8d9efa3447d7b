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

use serde::Deserialize;
use serde::Serialize;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

const TAG_RAW: u8 = 0;
const TAG_DECIMAL: u8 = 1;

/// How a computed value is rendered for display.
///
/// In JSON a format is written as `"raw"` or `{"decimal": {"scale": 2}}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    /// The value is reported as a bare number, without a string rendering.
    #[default]
    Raw,
    /// The value is additionally rendered with a fixed number of fractional digits.
    Decimal {
        /// Number of digits after the decimal point.
        scale: u8,
    },
}

impl ValueFormat {
    /// Renders `value`, or returns `None` for the raw format.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::mad::ValueFormat;
    /// assert_eq!(ValueFormat::Raw.format(1.5), None);
    /// assert_eq!(ValueFormat::Decimal { scale: 2 }.format(1.5).as_deref(), Some("1.50"));
    /// ```
    pub fn format(&self, value: f64) -> Option<String> {
        match self {
            ValueFormat::Raw => None,
            ValueFormat::Decimal { scale } => Some(format!("{value:.*}", *scale as usize)),
        }
    }

    pub(crate) fn write_to(&self, bytes: &mut SketchBytes) {
        match self {
            ValueFormat::Raw => bytes.write_u8(TAG_RAW),
            ValueFormat::Decimal { scale } => {
                bytes.write_u8(TAG_DECIMAL);
                bytes.write_u8(*scale);
            }
        }
    }

    pub(crate) fn read_from(cursor: &mut SketchSlice<'_>) -> Result<Self, Error> {
        let tag = cursor
            .read_u8()
            .map_err(|err| Error::insufficient_data("format").set_source(err))?;
        match tag {
            TAG_RAW => Ok(ValueFormat::Raw),
            TAG_DECIMAL => {
                let scale = cursor
                    .read_u8()
                    .map_err(|err| Error::insufficient_data("format scale").set_source(err))?;
                Ok(ValueFormat::Decimal { scale })
            }
            tag => Err(Error::malformed(format!("unknown value format tag {tag}"))),
        }
    }
}
