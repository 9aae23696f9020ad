//! Decoding and schema-driven validation/coercion of sanitized text.

use serde_json::Value;
use tracing::debug;

use crate::error::AttemptError;
use crate::request::ExtractionRequest;
use crate::schema::{FieldSpec, OutputSchema};

/// Parses sanitized text as JSON.
pub(crate) fn decode(sanitized: &str) -> Result<Value, AttemptError> {
    serde_json::from_str(sanitized).map_err(|err| AttemptError::Decode {
        message: err.to_string(),
        raw: sanitized.to_string(),
    })
}

/// Checks and normalizes a decoded value against the request's schema.
///
/// Returns one validated value per decoded object: the whole top-level array
/// in list-input mode, a one-element vector otherwise. `coercions` counts
/// silent enumeration repairs (default substitutions and colon truncations).
pub(crate) fn conform(
    decoded: Value,
    request: &ExtractionRequest,
    coercions: &mut usize,
) -> Result<Vec<Value>, AttemptError> {
    let mut items = if request.input.is_list() {
        match decoded {
            Value::Array(items) => items,
            other => {
                return Err(AttemptError::Structure(format!(
                    "expected an array of json objects, one per input element, got {}",
                    kind(&other)
                )));
            }
        }
    } else {
        vec![decoded]
    };

    for item in &mut items {
        conform_object(item, request, coercions)?;
    }

    if request.values_only {
        for item in &mut items {
            *item = collapse_values(item.take());
        }
    }

    Ok(items)
}

fn conform_object(
    item: &mut Value,
    request: &ExtractionRequest,
    coercions: &mut usize,
) -> Result<(), AttemptError> {
    let Value::Object(object) = item else {
        return Err(AttemptError::Structure(format!(
            "expected a json object, got {}",
            kind(item)
        )));
    };

    for (name, spec) in request.schema.fields() {
        // The model invents placeholder key names, so presence cannot be
        // checked literally.
        if OutputSchema::is_placeholder_key(name) {
            continue;
        }

        let Some(value) = object.get_mut(name) else {
            return Err(AttemptError::MissingField {
                field: name.to_string(),
            });
        };

        if let FieldSpec::Choice { options, default } = spec {
            let default = default.as_deref().or(request.default_choice.as_deref());
            coerce_choice(name, value, options, default, coercions)?;
        }
    }

    Ok(())
}

/// Normalizes one enumeration value: collapse a sequence to its first
/// element, substitute the default for anything outside the choice set, and
/// truncate `"choice: explanation"` chatter at the first colon.
fn coerce_choice(
    field: &str,
    value: &mut Value,
    options: &[String],
    default: Option<&str>,
    coercions: &mut usize,
) -> Result<(), AttemptError> {
    if let Value::Array(seq) = value {
        match seq.first().cloned() {
            Some(first) => *value = first,
            None => {
                return substitute_or_fail(field, value, default, coercions, "an empty sequence");
            }
        }
    }

    let Value::String(text) = value else {
        let got = kind(value);
        return substitute_or_fail(field, value, default, coercions, got);
    };

    if !options.iter().any(|option| option == text) {
        if let Some(default) = default {
            debug!(field, got = %text, substituted = default, "out-of-set choice replaced");
            *coercions += 1;
            *text = default.to_string();
        }
    }

    if let Some(colon) = text.find(':') {
        debug!(field, value = %text, "choice truncated at colon");
        *coercions += 1;
        text.truncate(colon);
    }

    Ok(())
}

fn substitute_or_fail(
    field: &str,
    value: &mut Value,
    default: Option<&str>,
    coercions: &mut usize,
    got: &str,
) -> Result<(), AttemptError> {
    match default {
        Some(default) => {
            debug!(field, got, substituted = default, "unusable choice replaced");
            *coercions += 1;
            *value = Value::String(default.to_string());
            Ok(())
        }
        None => Err(AttemptError::InvalidValue {
            field: field.to_string(),
            message: format!("expected one of the listed choices, got {got}"),
        }),
    }
}

/// Replaces a validated object with the ordered sequence of its field
/// values; a singleton collapses further to the bare value.
fn collapse_values(object: Value) -> Value {
    let Value::Object(map) = object else {
        return object;
    };
    let mut values: Vec<Value> = map.into_iter().map(|(_, value)| value).collect();
    if values.len() == 1 {
        values.swap_remove(0)
    } else {
        Value::Array(values)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::OutputSchema;
    use serde_json::json;

    fn request(schema: OutputSchema) -> ExtractionRequest {
        ExtractionRequest::new("sys", "user", schema)
    }

    #[test]
    fn presence_is_enough_for_text_fields() {
        let req = request(OutputSchema::new().text("title", "a title"));
        let mut coercions = 0;
        let items = conform(json!({"title": 42}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"title": 42})]);
        assert_eq!(coercions, 0);
    }

    #[test]
    fn missing_field_names_the_field() {
        let req = request(OutputSchema::new().text("title", "a title"));
        let mut coercions = 0;
        let err = conform(json!({"name": "x"}), &req, &mut coercions).unwrap_err();
        assert_eq!(
            err,
            AttemptError::MissingField {
                field: "title".to_string()
            }
        );
    }

    #[test]
    fn placeholder_keys_skip_the_presence_check() {
        let req = request(OutputSchema::new().text("<topic>", "description of the topic"));
        let mut coercions = 0;
        assert!(conform(json!({"geology": "rocks"}), &req, &mut coercions).is_ok());
    }

    #[test]
    fn out_of_set_choice_takes_the_default() {
        let req = request(OutputSchema::new().choice("kind", ["a", "b"]))
            .with_default_choice("a");
        let mut coercions = 0;
        let items = conform(json!({"kind": "c"}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"kind": "a"})]);
        assert_eq!(coercions, 1);
    }

    #[test]
    fn out_of_set_choice_without_default_is_kept() {
        let req = request(OutputSchema::new().choice("kind", ["a", "b"]));
        let mut coercions = 0;
        let items = conform(json!({"kind": "c"}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"kind": "c"})]);
        assert_eq!(coercions, 0);
    }

    #[test]
    fn sequence_choice_collapses_to_first_element_before_the_check() {
        let req = request(OutputSchema::new().choice("kind", ["a", "b"]))
            .with_default_choice("a");
        let mut coercions = 0;
        let items = conform(json!({"kind": ["b", "z"]}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"kind": "b"})]);
        assert_eq!(coercions, 0);
    }

    #[test]
    fn choice_with_explanation_is_truncated_at_the_colon() {
        let req = request(OutputSchema::new().choice("kind", ["a", "b"]));
        let mut coercions = 0;
        let items = conform(json!({"kind": "a: some explanation"}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"kind": "a"})]);
        assert_eq!(coercions, 1);
    }

    #[test]
    fn field_level_default_beats_the_request_default() {
        let schema = OutputSchema::new().choice_with_default("kind", ["a", "b"], "b");
        let req = request(schema).with_default_choice("a");
        let mut coercions = 0;
        let items = conform(json!({"kind": "z"}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"kind": "b"})]);
    }

    #[test]
    fn non_string_choice_without_default_is_an_error() {
        let req = request(OutputSchema::new().choice("kind", ["a", "b"]));
        let mut coercions = 0;
        let err = conform(json!({"kind": 5}), &req, &mut coercions).unwrap_err();
        assert!(matches!(err, AttemptError::InvalidValue { .. }));
    }

    #[test]
    fn non_string_choice_with_default_is_replaced() {
        let req = request(OutputSchema::new().choice("kind", ["a", "b"]))
            .with_default_choice("a");
        let mut coercions = 0;
        let items = conform(json!({"kind": 5}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!({"kind": "a"})]);
        assert_eq!(coercions, 1);
    }

    #[test]
    fn list_input_requires_a_top_level_array() {
        let schema = OutputSchema::new().text("title", "a title");
        let req = ExtractionRequest::new("sys", vec!["p1".to_string(), "p2".to_string()], schema);
        let mut coercions = 0;
        let err = conform(json!({"title": "x"}), &req, &mut coercions).unwrap_err();
        assert!(matches!(err, AttemptError::Structure(_)));
    }

    #[test]
    fn primitive_element_is_a_structure_error() {
        let req = request(OutputSchema::new().text("title", "a title"));
        let mut coercions = 0;
        let err = conform(json!("just text"), &req, &mut coercions).unwrap_err();
        assert!(matches!(err, AttemptError::Structure(_)));
    }

    #[test]
    fn values_only_collapses_to_ordered_values() {
        let schema = OutputSchema::new()
            .text("title", "a title")
            .text("query", "a query");
        let req = request(schema).with_values_only(true);
        let mut coercions = 0;
        let items = conform(json!({"title": "x", "query": "y"}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!(["x", "y"])]);
    }

    #[test]
    fn values_only_singleton_collapses_to_the_bare_value() {
        let req = request(OutputSchema::new().text("title", "a title")).with_values_only(true);
        let mut coercions = 0;
        let items = conform(json!({"title": "x"}), &req, &mut coercions).unwrap();
        assert_eq!(items, vec![json!("x")]);
    }
}
