//! The retry controller: compose → invoke → sanitize → decode → validate,
//! with failure context accumulated across attempts.

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::ModelClient;
use crate::error::{AttemptError, AttemptRecord, ConfigError, ExhaustionReport};
use crate::metrics::{ExtractionMetrics, estimate_tokens};
use crate::prompt::{failure_feedback, format_instructions};
use crate::request::{ExtractionRequest, PromptInput};
use crate::sanitize::sanitize;
use crate::schema::FieldSpec;
use crate::validate::{conform, decode};

/// Result of a completed extraction call.
///
/// Exhaustion is a value, not an error: after the attempt budget runs out the
/// engine reports what happened instead of raising. Callers that want the
/// historical empty-sequence contract can flatten with [`Extraction::into_values`],
/// with the caveat that an empty `Many` is then indistinguishable from failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// One schema-shaped value (single-prompt mode).
    Single(Value),
    /// One schema-shaped value per input prompt, in input order.
    Many(Vec<Value>),
    /// Every attempt in the budget failed.
    Exhausted(ExhaustionReport),
}

impl Extraction {
    /// Returns `true` when the attempt budget ran out without a valid result.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// Flattens to a plain sequence: the validated values on success, the
    /// empty sequence on exhaustion.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        match self {
            Self::Single(value) => vec![value],
            Self::Many(values) => values,
            Self::Exhausted(_) => Vec::new(),
        }
    }
}

/// Schema-constrained extraction engine over a model collaborator.
///
/// Holds nothing but the collaborator handle; every call owns its own
/// attempt state, and calls never share or cache anything.
///
/// # Examples
///
/// ```no_run
/// use outform::prelude::*;
/// # async fn run(client: impl ModelClient) -> Result<(), ConfigError> {
/// let schema = OutputSchema::new()
///     .text("title", "title of the unit")
///     .text("chapters", "an array of chapters for the unit");
///
/// let request = ExtractionRequest::new(
///     "You are an AI capable of curating course content.",
///     "Create a unit about photosynthesis.",
///     schema,
/// )
/// .with_temperature(0.7);
///
/// let extractor = Extractor::new(client);
/// let (extraction, metrics) = extractor.extract(&request).await?;
/// if extraction.is_exhausted() {
///     eprintln!("gave up after {} attempts", metrics.attempts);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Extractor<C> {
    client: C,
}

impl<C: ModelClient> Extractor<C> {
    /// Creates an engine around an explicitly passed collaborator handle.
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Borrows the collaborator handle.
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Runs the retry loop for one request.
    ///
    /// Any per-attempt failure (transport included) consumes one unit of
    /// the attempt budget and feeds the next attempt's diagnostics; it is
    /// never returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] only for programmer errors that retrying
    /// cannot fix: a zero-field schema, an enumeration field with no
    /// choices, or an empty prompt list.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<(Extraction, ExtractionMetrics), ConfigError> {
        validate_config(request)?;

        let start = Instant::now();
        let list_input = request.input.is_list();
        let instructions = format_instructions(&request.schema, list_input);
        let user_prompt = request.input.joined();

        let mut diagnostics = String::new();
        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut metrics = ExtractionMetrics::default();

        for attempt in 1..=request.max_attempts {
            let system_prompt =
                format!("{}{instructions}{diagnostics}", request.system_prompt);
            metrics.estimated_prompt_tokens +=
                estimate_tokens(&system_prompt) + estimate_tokens(&user_prompt);
            if request.verbose {
                info!(attempt, %system_prompt, %user_prompt, "sending prompts");
            } else {
                debug!(attempt, %system_prompt, %user_prompt, "sending prompts");
            }

            let raw = match self
                .client
                .invoke(&request.model, request.temperature, &system_prompt, &user_prompt)
                .await
            {
                Ok(raw) => raw,
                Err(transport) => {
                    let error = AttemptError::from(transport);
                    warn!(attempt, %error, "attempt failed");
                    diagnostics.push_str(&failure_feedback(None, &error));
                    history.push(AttemptRecord {
                        attempt_number: attempt,
                        raw_response: None,
                        error: error.to_string(),
                        elapsed: start.elapsed(),
                    });
                    continue;
                }
            };
            metrics.estimated_response_tokens += estimate_tokens(&raw);
            if request.verbose {
                info!(attempt, response = %raw, "model responded");
            } else {
                debug!(attempt, response = %raw, "model responded");
            }

            let cleaned = sanitize(&raw);
            match decode(&cleaned).and_then(|value| conform(value, request, &mut metrics.coercions))
            {
                Ok(mut items) => {
                    metrics.attempts = attempt;
                    metrics.wall_time = start.elapsed();
                    let extraction = if list_input {
                        Extraction::Many(items)
                    } else {
                        // Single mode wraps the decoded value, so exactly one
                        // item comes back.
                        items.pop().map_or_else(
                            || Extraction::Many(Vec::new()),
                            Extraction::Single,
                        )
                    };
                    return Ok((extraction, metrics));
                }
                Err(error) => {
                    warn!(attempt, %error, "attempt failed");
                    diagnostics.push_str(&failure_feedback(Some(&cleaned), &error));
                    history.push(AttemptRecord {
                        attempt_number: attempt,
                        raw_response: Some(cleaned),
                        error: error.to_string(),
                        elapsed: start.elapsed(),
                    });
                }
            }
        }

        metrics.attempts = request.max_attempts;
        metrics.wall_time = start.elapsed();
        warn!(
            attempts = request.max_attempts,
            "extraction exhausted its attempt budget"
        );
        Ok((
            Extraction::Exhausted(ExhaustionReport {
                attempts: request.max_attempts,
                history,
            }),
            metrics,
        ))
    }
}

fn validate_config(request: &ExtractionRequest) -> Result<(), ConfigError> {
    if request.schema.is_empty() {
        return Err(ConfigError::EmptySchema);
    }
    for (name, spec) in request.schema.fields() {
        if let FieldSpec::Choice { options, .. } = spec {
            if options.is_empty() {
                return Err(ConfigError::EmptyChoices(name.to_string()));
            }
        }
    }
    if let PromptInput::List(prompts) = &request.input {
        if prompts.is_empty() {
            return Err(ConfigError::NoPrompts);
        }
    }
    Ok(())
}
