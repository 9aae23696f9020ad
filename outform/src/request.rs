//! Immutable per-call input for the extraction engine.

use crate::schema::OutputSchema;

/// Model used when the caller does not override it.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// One user prompt, or an ordered sequence of them.
///
/// A sequence switches the engine into list-input mode: the model is told to
/// emit one JSON object per input element, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptInput {
    /// Single-prompt mode.
    Single(String),
    /// List-input mode.
    List(Vec<String>),
}

impl PromptInput {
    /// Returns `true` in list-input mode.
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// The text handed to the collaborator as the user prompt. A sequence
    /// joins with `,`, matching the string conversion the model was
    /// historically shown.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::Single(prompt) => prompt.clone(),
            Self::List(prompts) => prompts.join(","),
        }
    }
}

impl From<&str> for PromptInput {
    fn from(prompt: &str) -> Self {
        Self::Single(prompt.to_string())
    }
}

impl From<String> for PromptInput {
    fn from(prompt: String) -> Self {
        Self::Single(prompt)
    }
}

impl From<Vec<String>> for PromptInput {
    fn from(prompts: Vec<String>) -> Self {
        Self::List(prompts)
    }
}

impl From<&[&str]> for PromptInput {
    fn from(prompts: &[&str]) -> Self {
        Self::List(prompts.iter().map(ToString::to_string).collect())
    }
}

/// Everything one extraction call needs, fixed for the call's lifetime.
///
/// # Examples
///
/// ```
/// use outform::request::ExtractionRequest;
/// use outform::schema::OutputSchema;
///
/// let schema = OutputSchema::new().text("title", "title of the unit");
/// let request = ExtractionRequest::new("You are a course planner.", "Plan a unit on calculus.", schema)
///     .with_temperature(0.7)
///     .with_max_attempts(3);
/// assert_eq!(request.max_attempts, 3);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Base system prompt; format instructions and accumulated diagnostics
    /// are appended to it on every attempt.
    pub system_prompt: String,
    /// The user prompt(s).
    pub input: PromptInput,
    /// Expected output shape.
    pub schema: OutputSchema,
    /// Request-level default category for enumeration fields without their
    /// own default. `None` leaves out-of-set answers untouched.
    pub default_choice: Option<String>,
    /// Collapse each validated object to the ordered sequence of its field
    /// values (a singleton collapses further to the bare value).
    pub values_only: bool,
    /// Model identifier, passed opaquely to the collaborator.
    pub model: String,
    /// Sampling temperature, passed opaquely to the collaborator.
    pub temperature: f32,
    /// Attempt budget; always at least 1.
    pub max_attempts: usize,
    /// Log composed prompts and raw responses at `info` instead of `debug`.
    pub verbose: bool,
}

impl ExtractionRequest {
    /// Creates a request with the historical defaults: no default category,
    /// objects kept as objects, [`DEFAULT_MODEL`], temperature 1.0, three
    /// attempts, quiet logging.
    #[must_use]
    pub fn new(
        system_prompt: impl Into<String>,
        input: impl Into<PromptInput>,
        schema: OutputSchema,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            input: input.into(),
            schema,
            default_choice: None,
            values_only: false,
            model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            max_attempts: 3,
            verbose: false,
        }
    }

    /// Sets the request-level default category.
    #[must_use]
    pub fn with_default_choice(mut self, default: impl Into<String>) -> Self {
        self.default_choice = Some(default.into());
        self
    }

    /// Sets value-only collapse.
    #[must_use]
    pub const fn with_values_only(mut self, values_only: bool) -> Self {
        self.values_only = values_only;
        self
    }

    /// Overrides the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the attempt budget, clamped to at least one attempt.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = if max_attempts == 0 { 1 } else { max_attempts };
        self
    }

    /// Toggles verbose prompt/response logging.
    #[must_use]
    pub const fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}
