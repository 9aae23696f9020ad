//! Deterministic composition of format instructions and failure diagnostics.

use crate::error::AttemptError;
use crate::schema::OutputSchema;

/// Builds the format-instruction text appended to the caller's system prompt.
///
/// Pure function of the schema and the input mode. The fragments:
///
/// - always: the serialized schema and the JSON-only / no-escape instruction;
/// - list-output mode (bracketed sequence in the schema): the model must emit
///   an array of objects, and list-valued fields classify into one element;
/// - dynamic-key mode (`<...>` anywhere in the schema): placeholder-filling
///   instructions with a worked example;
/// - list-input mode: one JSON object per input element, in input order.
///
/// # Examples
///
/// ```
/// use outform::prompt::format_instructions;
/// use outform::schema::OutputSchema;
///
/// let schema = OutputSchema::new().text("title", "title of the unit");
/// let instructions = format_instructions(&schema, false);
/// assert!(instructions.contains("json format"));
/// assert!(instructions.contains("title of the unit"));
/// ```
#[must_use]
pub fn format_instructions(schema: &OutputSchema, list_input: bool) -> String {
    let serialized = schema.to_prompt_json();
    let list_output = schema.wants_list_output();

    let mut out = if list_output {
        format!("\nYou are to output an array of objects in the following json format: {serialized}.")
    } else {
        format!("\nYou are to output the following in json format: {serialized}.")
    };
    out.push_str(" \nDo not put quotation marks or escape character \\ in the output fields.");

    if list_output {
        out.push_str("\nIf output field is a list, classify output into the best element of the list.");
    }

    if schema.has_placeholders() {
        out.push_str(
            "\nAny text enclosed by < and > indicates you must generate content to replace it. \
             Example input: Go to <location>, Example output: Go to the garden",
        );
        out.push_str(
            "\nAny output key containing < and > indicates you must generate the key name to replace it. \
             Example input: {'<location>': 'description of location'}, \
             Example output: {school: a place for education}",
        );
    }

    if list_input {
        out.push_str("\nGenerate an array of json, one json for each input element.");
    }

    out
}

/// Renders one failed attempt into the diagnostic block appended to the next
/// system prompt, so the model is shown its own previous mistake verbatim.
///
/// Transport failures carry no response, so only the error line is emitted.
#[must_use]
pub fn failure_feedback(raw_response: Option<&str>, error: &AttemptError) -> String {
    let mut out = String::new();
    if let Some(raw) = raw_response {
        out.push_str("\n\nResult: ");
        out.push_str(raw);
    }
    out.push_str("\n\nError message: ");
    out.push_str(&error.to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_instruction_omits_array_phrasing() {
        let schema = OutputSchema::new().text("title", "a title");
        let instructions = format_instructions(&schema, false);
        assert!(instructions.starts_with("\nYou are to output the following in json format:"));
        assert!(!instructions.contains("array of objects"));
        assert!(instructions.contains("Do not put quotation marks"));
    }

    #[test]
    fn enumeration_schema_switches_to_array_instruction() {
        let schema = OutputSchema::new().choice("kind", ["quiz", "lecture"]);
        let instructions = format_instructions(&schema, false);
        assert!(instructions.contains("an array of objects in the following json format"));
        assert!(instructions.contains("classify output into the best element of the list"));
    }

    #[test]
    fn placeholder_schema_adds_worked_example() {
        let schema = OutputSchema::new().text("<topic>", "description of the topic");
        let instructions = format_instructions(&schema, false);
        assert!(instructions.contains("Go to <location>"));
        assert!(instructions.contains("generate the key name"));
    }

    #[test]
    fn list_input_adds_one_object_per_element() {
        let schema = OutputSchema::new().text("title", "a title");
        let instructions = format_instructions(&schema, true);
        assert!(instructions.contains("one json for each input element"));
    }

    #[test]
    fn feedback_echoes_response_and_error() {
        let error = AttemptError::MissingField {
            field: "title".to_string(),
        };
        let feedback = failure_feedback(Some(r#"{"name": "x"}"#), &error);
        assert!(feedback.contains("Result: {\"name\": \"x\"}"));
        assert!(feedback.contains("Error message: title not in json output"));
    }

    #[test]
    fn transport_feedback_has_no_result_block() {
        let error = AttemptError::Transport(crate::error::TransportError("timed out".to_string()));
        let feedback = failure_feedback(None, &error);
        assert!(!feedback.contains("Result:"));
        assert!(feedback.contains("Error message: model invocation failed: timed out"));
    }
}
