//! Declarative description of the JSON shape the model is asked to produce.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

/// An angle-bracket placeholder such as `<topic>`, in a key or a value.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| compiled(r"<.*?>"));

/// A bracketed sequence in the serialized schema text.
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| compiled(r"\[.*?\]"));

/// Compiles a hard-coded pattern.
#[allow(clippy::expect_used)]
pub(crate) fn compiled(pattern: &str) -> Regex {
    Regex::new(pattern).expect("hard-coded pattern compiles")
}

/// What a single schema field expects from the model.
///
/// Values and keys may contain `<...>` placeholders, which tell the model to
/// synthesize content (or invent the key name) instead of copying the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    /// Free-text field: the description is shown to the model; validation
    /// only confirms the key is present.
    Text(String),
    /// Enumeration field: the model should answer with one of `options`.
    Choice {
        /// Allowed choices, in the order they are shown to the model.
        options: Vec<String>,
        /// Substituted when the model answers outside the set. Overrides the
        /// request-level default category for this field.
        default: Option<String>,
    },
}

/// Ordered mapping from field name to [`FieldSpec`].
///
/// Built once, then shared read-only across any number of extraction calls.
/// Field order is preserved: it is the order shown to the model and the order
/// of values emitted by value-only collapse.
///
/// # Examples
///
/// ```
/// use outform::schema::OutputSchema;
///
/// let schema = OutputSchema::new()
///     .text("title", "title of the unit")
///     .choice("difficulty", ["beginner", "intermediate", "advanced"]);
///
/// assert_eq!(schema.len(), 2);
/// assert!(schema.wants_list_output());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputSchema {
    fields: Vec<(String, FieldSpec)>,
}

impl OutputSchema {
    /// Creates an empty schema. A schema must gain at least one field before
    /// it is usable in a request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a free-text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.fields
            .push((name.into(), FieldSpec::Text(description.into())));
        self
    }

    /// Adds an enumeration field with the given allowed choices.
    #[must_use]
    pub fn choice<I, S>(self, name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choice_field(name, options, None)
    }

    /// Adds an enumeration field with a field-level default choice.
    #[must_use]
    pub fn choice_with_default<I, S>(
        self,
        name: impl Into<String>,
        options: I,
        default: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choice_field(name, options, Some(default.into()))
    }

    fn choice_field<I, S>(mut self, name: impl Into<String>, options: I, default: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options.into_iter().map(Into::into).collect();
        self.fields
            .push((name.into(), FieldSpec::Choice { options, default }));
        self
    }

    /// Returns `true` if the schema has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Renders the schema as the JSON text shown to the model.
    ///
    /// Free-text fields render as their description string, enumeration
    /// fields as the array of choices, e.g.
    /// `{"title":"title of the unit","difficulty":["beginner","advanced"]}`.
    #[must_use]
    pub fn to_prompt_json(&self) -> String {
        let mut map = Map::new();
        for (name, spec) in &self.fields {
            let value = match spec {
                FieldSpec::Text(description) => Value::String(description.clone()),
                FieldSpec::Choice { options, .. } => Value::Array(
                    options.iter().cloned().map(Value::String).collect(),
                ),
            };
            map.insert(name.clone(), value);
        }
        Value::Object(map).to_string()
    }

    /// List-output mode heuristic: the serialized schema contains a bracketed
    /// sequence (an enumeration field, or brackets inside a description).
    #[must_use]
    pub fn wants_list_output(&self) -> bool {
        BRACKETED.is_match(&self.to_prompt_json())
    }

    /// Dynamic-key mode heuristic: the serialized schema contains an
    /// angle-bracket placeholder anywhere, in a key or a value.
    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        PLACEHOLDER.is_match(&self.to_prompt_json())
    }

    /// Returns `true` for placeholder keys such as `<topic>`: the model
    /// invents the key name, so presence cannot be checked literally.
    #[must_use]
    pub fn is_placeholder_key(key: &str) -> bool {
        PLACEHOLDER.is_match(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_json_preserves_field_order() {
        let schema = OutputSchema::new()
            .text("title", "title of the unit")
            .text("summary", "one-line summary");
        assert_eq!(
            schema.to_prompt_json(),
            r#"{"title":"title of the unit","summary":"one-line summary"}"#
        );
    }

    #[test]
    fn choice_field_renders_as_array() {
        let schema = OutputSchema::new().choice("difficulty", ["easy", "hard"]);
        assert_eq!(schema.to_prompt_json(), r#"{"difficulty":["easy","hard"]}"#);
    }

    #[test]
    fn list_output_detected_from_enumeration() {
        let text_only = OutputSchema::new().text("title", "a title");
        assert!(!text_only.wants_list_output());

        let with_choice = OutputSchema::new().choice("kind", ["a", "b"]);
        assert!(with_choice.wants_list_output());
    }

    #[test]
    fn list_output_detected_from_bracketed_description() {
        let schema = OutputSchema::new().text("chapters", "an array of chapters [..]");
        assert!(schema.wants_list_output());
    }

    #[test]
    fn placeholders_detected_in_keys_and_values() {
        assert!(!OutputSchema::new().text("title", "a title").has_placeholders());
        assert!(
            OutputSchema::new()
                .text("<topic>", "description of the topic")
                .has_placeholders()
        );
        assert!(
            OutputSchema::new()
                .text("greeting", "Say hello to <name>")
                .has_placeholders()
        );
    }

    #[test]
    fn placeholder_keys_are_recognized() {
        assert!(OutputSchema::is_placeholder_key("<topic>"));
        assert!(OutputSchema::is_placeholder_key("the <n>th item"));
        assert!(!OutputSchema::is_placeholder_key("topic"));
    }
}
