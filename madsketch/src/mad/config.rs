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
use crate::mad::ValueFormat;
use crate::rank::DEFAULT_COMPRESSION;

/// Request-level configuration of a median absolute deviation aggregation.
///
/// A `MadConfig` is validated when it is built or parsed and is immutable afterwards. The
/// same value is handed to every [`PartitionCollector`](crate::mad::PartitionCollector) and to
/// the [`Reducer`](crate::mad::Reducer) of a request.
///
/// # Examples
///
/// ```
/// # use madsketch::mad::MadConfig;
/// let config = MadConfig::from_json(r#"{"name": "load_mad", "field": "load"}"#).unwrap();
/// assert_eq!(config.field(), "load");
/// assert_eq!(config.compression(), 100.0);
///
/// let err = MadConfig::builder("load_mad", "load").compression(0.0).build().unwrap_err();
/// assert_eq!(err.kind(), madsketch::error::ErrorKind::InvalidParameter);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMadConfig")]
pub struct MadConfig {
    name: String,
    field: String,
    compression: f64,
    format: ValueFormat,
}

/// Unvalidated shape of the JSON configuration.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMadConfig {
    name: String,
    field: String,
    #[serde(default = "default_compression")]
    compression: f64,
    #[serde(default)]
    format: ValueFormat,
}

fn default_compression() -> f64 {
    DEFAULT_COMPRESSION
}

impl TryFrom<RawMadConfig> for MadConfig {
    type Error = Error;

    fn try_from(raw: RawMadConfig) -> Result<Self, Self::Error> {
        let config = MadConfig {
            name: raw.name,
            field: raw.field,
            compression: raw.compression,
            format: raw.format,
        };
        config.validate()?;
        Ok(config)
    }
}

impl MadConfig {
    /// Starts building a configuration for the aggregation `name` over the numeric `field`.
    pub fn builder(name: impl Into<String>, field: impl Into<String>) -> MadConfigBuilder {
        MadConfigBuilder {
            name: name.into(),
            field: field.into(),
            compression: DEFAULT_COMPRESSION,
            format: ValueFormat::Raw,
        }
    }

    /// Parses and validates a JSON configuration object.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidParameter`](crate::error::ErrorKind::InvalidParameter) if the
    /// JSON is malformed, has unknown keys, misses `name` or `field`, or carries invalid values.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let raw: RawMadConfig = serde_json::from_str(json).map_err(|err| {
            Error::invalid_parameter("failed to parse aggregation configuration").set_source(err)
        })?;
        MadConfig::try_from(raw)
    }

    /// Checks every parameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::invalid_parameter("aggregation name must not be empty"));
        }
        if self.field.is_empty() {
            return Err(Error::invalid_parameter("[field] must not be empty")
                .with_context("aggregation", &self.name));
        }
        if !(self.compression.is_finite() && self.compression > 0.0) {
            return Err(Error::invalid_parameter(format!(
                "[compression] must be greater than 0, found [{}]",
                self.compression
            ))
            .with_context("aggregation", &self.name));
        }
        Ok(())
    }

    /// Name of the aggregation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the numeric field the values are read from.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Compression of every rank sketch built for this aggregation.
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// How the final value is rendered.
    pub fn format(&self) -> ValueFormat {
        self.format
    }
}

/// Builder for [`MadConfig`].
#[derive(Debug, Clone)]
pub struct MadConfigBuilder {
    name: String,
    field: String,
    compression: f64,
    format: ValueFormat,
}

impl MadConfigBuilder {
    /// Sets the sketch compression (default: 100).
    pub fn compression(mut self, compression: f64) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the display format (default: [`ValueFormat::Raw`]).
    pub fn format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    /// Validates the parameters and builds the configuration.
    pub fn build(self) -> Result<MadConfig, Error> {
        let config = MadConfig {
            name: self.name,
            field: self.field,
            compression: self.compression,
            format: self.format,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let config = MadConfig::builder("mad", "number").build().unwrap();
        assert_eq!(config.compression(), 100.0);
        assert_eq!(config.format(), ValueFormat::Raw);
    }

    #[test]
    fn test_from_json_with_all_fields() {
        let config = MadConfig::from_json(
            r#"{"name": "mad", "field": "latency", "compression": 250.5, "format": {"decimal": {"scale": 2}}}"#,
        )
        .unwrap();
        assert_eq!(config.name(), "mad");
        assert_eq!(config.field(), "latency");
        assert_eq!(config.compression(), 250.5);
        assert_eq!(config.format(), ValueFormat::Decimal { scale: 2 });
    }

    #[test]
    fn test_rejects_non_positive_compression() {
        for compression in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = MadConfig::builder("mad", "number")
                .compression(compression)
                .build()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        }

        let err = MadConfig::from_json(r#"{"name": "mad", "field": "number", "compression": -5}"#)
            .unwrap_err();
        assert_snapshot!(err, @"InvalidParameter, context: { aggregation: mad } => [compression] must be greater than 0, found [-5]");
    }

    #[test]
    fn test_rejects_missing_field() {
        let err = MadConfig::from_json(r#"{"name": "mad"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);

        let err = MadConfig::builder("mad", "").build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = MadConfig::from_json(r#"{"name": "mad", "field": "n", "method": "x"}"#)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let config = MadConfig::builder("mad", "number")
            .compression(42.0)
            .build()
            .unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: MadConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let invalid = json.replace("42.0", "0.0");
        assert!(serde_json::from_str::<MadConfig>(&invalid).is_err());
    }
}
