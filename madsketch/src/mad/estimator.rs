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

use crate::error::Error;
use crate::mad::PartialResult;

/// Extracts the final median absolute deviation from a reduced [`PartialResult`].
///
/// The estimate is the median of the merged deviation sketch. Every partition measures
/// deviations from its own local median, so the estimate is approximate; for well-behaved
/// distributions and a compression of at least 100 the relative error stays within a few
/// percent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Estimator;

impl Estimator {
    /// Returns the estimated median absolute deviation, or [f64::NAN] when no value
    /// contributed to `result`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::mad::{Estimator, MadConfig, PartialResult};
    /// let config = MadConfig::builder("mad", "value").build().unwrap();
    /// assert!(Estimator::value(&PartialResult::empty(&config)).is_nan());
    /// ```
    pub fn value(result: &PartialResult) -> f64 {
        result.deviations().quantile(0.5)
    }

    /// Renders the estimate of `result` for the response.
    ///
    /// # Examples
    ///
    /// ```
    /// # use madsketch::mad::{Estimator, MadConfig, PartialResult};
    /// let config = MadConfig::builder("mad", "value").build().unwrap();
    /// let response = Estimator::response(&PartialResult::empty(&config));
    /// assert_eq!(response.value, None);
    /// assert_eq!(response.to_json(), r#"{"value":null}"#);
    /// ```
    pub fn response(result: &PartialResult) -> MadResponse {
        let value = Estimator::value(result);
        if value.is_nan() {
            return MadResponse::default();
        }
        MadResponse {
            value: Some(value),
            value_as_string: result.format().format(value),
        }
    }
}

/// Response object of the aggregation.
///
/// `value` is `null` when no document contributed a value. `value_as_string` is only present
/// for a non-raw format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MadResponse {
    /// The estimate; `None` when there was nothing to estimate from.
    #[serde(default)]
    pub value: Option<f64>,
    /// The estimate rendered with the requested format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_as_string: Option<String>,
}

impl MadResponse {
    /// Returns the estimate, or [f64::NAN] when the response carries no value.
    pub fn mad(&self) -> f64 {
        self.value.unwrap_or(f64::NAN)
    }

    /// Renders this response as a JSON object.
    pub fn to_json(&self) -> String {
        // a struct of an optional number and an optional string always serializes
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parses a rendered response.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedData`](crate::error::ErrorKind::MalformedData) if `json`
    /// is not a response object.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|err| Error::malformed("failed to parse aggregation response").set_source(err))
    }
}
