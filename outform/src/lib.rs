//! Schema-constrained extraction of structured JSON from LLM text.
//!
//! Generative models are unreliable about output format: responses arrive
//! fenced, single-quoted, partially valid, or missing fields. This crate
//! turns a declarative [`OutputSchema`] into natural-language formatting
//! instructions, repairs near-JSON responses with an auditable rewrite
//! pipeline, validates and coerces the decoded values, and retries with the
//! model's own prior mistake in view until the attempt budget runs out.
//!
//! The model invocation itself lives behind the [`ModelClient`] trait; an
//! HTTP implementation ships in the companion `outform-openai` crate.

/// Boundary trait for the model-invocation collaborator.
pub mod client;
/// Per-attempt and configuration error types.
pub mod error;
/// The retry controller and result types.
pub mod extractor;
/// Per-call metrics and token estimation.
pub mod metrics;
/// Format-instruction and diagnostic composition.
pub mod prompt;
/// Immutable per-call request input.
pub mod request;
/// The ordered repair pipeline for near-JSON text.
pub mod sanitize;
/// Declarative output-shape description.
pub mod schema;

mod validate;

pub use client::ModelClient;
pub use error::{AttemptError, AttemptRecord, ConfigError, ExhaustionReport, TransportError};
pub use extractor::{Extraction, Extractor};
pub use metrics::{ExtractionMetrics, estimate_tokens};
pub use request::{DEFAULT_MODEL, ExtractionRequest, PromptInput};
pub use sanitize::sanitize;
pub use schema::{FieldSpec, OutputSchema};

/// Common imports for engine users.
pub mod prelude {
    pub use crate::client::ModelClient;
    pub use crate::error::{ConfigError, TransportError};
    pub use crate::extractor::{Extraction, Extractor};
    pub use crate::metrics::ExtractionMetrics;
    pub use crate::request::{ExtractionRequest, PromptInput};
    pub use crate::schema::{FieldSpec, OutputSchema};
}
