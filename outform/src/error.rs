//! Error types: per-attempt failures the retry loop absorbs, and fatal
//! configuration errors it does not.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of the model-invocation collaborator (network, timeout, HTTP).
///
/// Consumes one attempt like any other failure; the loop carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("model invocation failed: {0}")]
pub struct TransportError(pub String);

/// A failure within a single attempt.
///
/// Every variant is caught by the retry controller, rendered into the
/// diagnostic text shown to the model on the next attempt, and never
/// propagated to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttemptError {
    /// The collaborator itself failed; there is no response to repair.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Sanitized text still failed to parse as JSON.
    #[error("invalid json: {message}")]
    Decode {
        /// Parser error message.
        message: String,
        /// The sanitized text that failed to parse.
        raw: String,
    },

    /// Top-level shape did not match the input mode.
    #[error("{0}")]
    Structure(String),

    /// A required schema key is absent from a decoded object.
    #[error("{field} not in json output")]
    MissingField {
        /// Name of the absent field.
        field: String,
    },

    /// An enumeration field held a value that cannot be coerced.
    #[error("field {field}: {message}")]
    InvalidValue {
        /// Name of the offending field.
        field: String,
        /// What was wrong with the value.
        message: String,
    },
}

/// Programmer errors that retrying cannot fix. Returned as `Err` from
/// [`Extractor::extract`](crate::extractor::Extractor::extract) before the
/// first attempt is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The schema has no fields.
    #[error("schema has no fields")]
    EmptySchema,

    /// An enumeration field has an empty choice list.
    #[error("enumeration field {0} has no choices")]
    EmptyChoices(String),

    /// A list-input request carries zero prompts.
    #[error("list-input request carries no prompts")]
    NoPrompts,
}

/// Record of one failed attempt, kept for the exhaustion report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// The attempt number (1-indexed).
    pub attempt_number: usize,
    /// Sanitized response text, when a response was received at all.
    pub raw_response: Option<String>,
    /// Rendered failure description.
    pub error: String,
    /// Elapsed time since the call started.
    pub elapsed: Duration,
}

/// Why an extraction call gave up: every attempt in the budget failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhaustionReport {
    /// Attempts consumed (equals the request's budget).
    pub attempts: usize,
    /// Per-attempt failure records, in order.
    pub history: Vec<AttemptRecord>,
}
