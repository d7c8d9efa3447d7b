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

//! Errors returned by madsketch.
//!
//! Every fallible operation returns [`Error`]. Callers branch on its [`ErrorKind`]; the message
//! and the key/value context are meant for humans.

use std::fmt;

/// Category of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A configuration value or argument is invalid.
    InvalidParameter,
    /// Partial results handed to a reduction were produced by incompatible configurations.
    InconsistentPartialResults,
    /// The serialized bytes could not be decoded.
    MalformedData,
}

impl ErrorKind {
    /// Returns the name of this kind.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "InvalidParameter",
            ErrorKind::InconsistentPartialResults => "InconsistentPartialResults",
            ErrorKind::MalformedData => "MalformedData",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.into_static())
    }
}

/// The error type of madsketch.
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Creates an error of `kind` with a human readable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            context: vec![],
            source: None,
        }
    }

    /// Attaches a `key: value` pair describing where the error happened.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Records the underlying cause of this error.
    ///
    /// # Panics
    ///
    /// Panics if a source was already recorded.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::error::Error as _;
    /// use madsketch::error::{Error, ErrorKind};
    ///
    /// let error = Error::new(ErrorKind::MalformedData, "failed to decode partial result");
    /// assert!(error.source().is_none());
    /// let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
    /// assert!(error.set_source(eof).source().is_some());
    /// ```
    pub fn set_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        assert!(self.source.is_none(), "error source is already set");
        self.source = Some(src.into());
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message, without kind, context or source.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Error {
    pub(crate) fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameter, msg)
    }

    pub(crate) fn inconsistent_partials(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InconsistentPartialResults, msg)
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedData, msg)
    }

    pub(crate) fn insufficient_data(tag: &'static str) -> Self {
        Self::malformed(format!("insufficient data: {tag}"))
    }

    pub(crate) fn invalid_family(expected: u8, actual: u8, name: &'static str) -> Self {
        Self::malformed(format!(
            "invalid family: expected {expected} ({name}), got {actual}"
        ))
    }

    pub(crate) fn unsupported_serial_version(expected: u8, actual: u8) -> Self {
        Self::malformed(format!(
            "unsupported serial version: expected {expected}, got {actual}"
        ))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f
                .debug_struct("Error")
                .field("kind", &self.kind)
                .field("message", &self.message)
                .field("context", &self.context)
                .field("source", &self.source)
                .finish();
        }

        // multi-line layout, readable in `unwrap` panics
        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;
        if !self.context.is_empty() {
            writeln!(f, "\nContext:")?;
            for (key, value) in &self.context {
                writeln!(f, "   {key}: {value}")?;
            }
        }
        if let Some(source) = &self.source {
            writeln!(f, "\nSource:\n   {source:#}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.context.is_empty() {
            let context = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, ", context: {{ {context} }}")?;
        }
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|source| source.as_ref())
    }
}
