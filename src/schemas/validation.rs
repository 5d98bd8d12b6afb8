use crate::schemas::SchemaHandle;
use jsonschema::{Draft, JSONSchema};
use serde_json::{json, Value};

const MAX_SCHEMA_ERRORS: usize = 3;
pub(crate) const ASK_FOLLOW_UP_TOOL_NAME: &str = "ask_follow_up";
pub(crate) const SUBMIT_ITINERARY_TOOL_NAME: &str = "submit_itinerary";
pub(crate) const ITINERARY_ARGUMENT: &str = "itinerary";

/// Check a structured payload against a schema.
///
/// Returns human-readable violations (at most three, plus a truncation note).
/// An empty list means the payload conforms.
pub(crate) fn schema_violations(schema: &SchemaHandle, payload: &Value) -> Vec<String> {
    let validator = match JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema.schema_json())
    {
        Ok(validator) => validator,
        Err(err) => {
            return vec![format!(
                "failed to prepare `{}` schema for validation: {}",
                schema.schema_name(),
                err
            )]
        }
    };

    let mut details = Vec::new();

    if let Err(errors) = validator.validate(payload) {
        for (idx, error) in errors.enumerate() {
            if idx < MAX_SCHEMA_ERRORS {
                let mut path = error.instance_path.to_string();
                if path.is_empty() {
                    path = "<root>".to_string();
                }
                details.push(format!("{}: {}", path, error));
            } else {
                details.push("additional errors truncated".to_string());
                break;
            }
        }
    }

    details
}

/// Tool the model calls when it needs more information from the traveler.
pub(crate) fn ask_follow_up_tool_definition(schema: &SchemaHandle) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": ASK_FOLLOW_UP_TOOL_NAME,
            "description": "Ask the traveler ONE follow-up question about a missing or ambiguous trip detail, and report the details collected so far.",
            "parameters": {
                "type": "object",
                "properties": schema.properties(),
                "required": schema.required()
            }
        }
    })
}

/// Tool the model calls with the finished itinerary, carrying the full schema.
pub(crate) fn submit_itinerary_tool_definition(schema: &SchemaHandle) -> Value {
    let mut itinerary_param = serde_json::Map::new();
    itinerary_param.insert("type".to_string(), json!("object"));
    itinerary_param.insert(
        "description".to_string(),
        json!(format!(
            "The {} data structure. This must match the schema exactly.",
            schema.schema_name()
        )),
    );
    itinerary_param.insert("properties".to_string(), schema.properties());
    itinerary_param.insert("required".to_string(), schema.required());

    json!({
        "type": "function",
        "function": {
            "name": SUBMIT_ITINERARY_TOOL_NAME,
            "description": format!(
                "Finish the conversation by providing the complete {} once destination, duration, travelers and budget are known.",
                schema.schema_name()
            ),
            "parameters": {
                "type": "object",
                "properties": { ITINERARY_ARGUMENT: Value::Object(itinerary_param) },
                "required": [ITINERARY_ARGUMENT]
            }
        }
    })
}

/// Append the structured-response requirement to a system prompt, once.
pub(crate) fn with_schema_instructions(system_prompt: &str, schema: &SchemaHandle) -> String {
    if system_prompt.contains("Structured response requirement:") {
        return system_prompt.to_string();
    }

    format!(
        "{}\n\nStructured response requirement: while details are missing you MUST call the `{}` tool. When you have everything, you MUST call the `{}` tool with a JSON payload that strictly conforms to the `{}` schema. This is the ONLY way to finish the conversation.",
        system_prompt,
        ASK_FOLLOW_UP_TOOL_NAME,
        SUBMIT_ITINERARY_TOOL_NAME,
        schema.schema_name()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::CompletionSchema;
    use crate::types::{itinerary::ItineraryResult, trip::FollowUp};

    #[test]
    fn test_conforming_itinerary_has_no_violations() {
        let payload = json!({
            "destination": "Lisbon, Portugal",
            "duration_days": 4,
            "activities": [{ "name": "Belém Tower", "category": "historical" }],
            "accommodations": [{ "name": "Casa Alfama", "price_per_night": 140.0 }]
        });
        assert!(schema_violations(ItineraryResult::schema(), &payload).is_empty());
    }

    #[test]
    fn test_violations_are_truncated() {
        let payload = json!({
            "destination": 12,
            "duration_days": "four",
            "activities": "many",
            "accommodations": false,
            "currency": 3
        });
        let violations = schema_violations(ItineraryResult::schema(), &payload);
        assert_eq!(violations.len(), MAX_SCHEMA_ERRORS + 1);
        assert_eq!(violations.last().unwrap(), "additional errors truncated");
    }

    #[test]
    fn test_submit_tool_embeds_itinerary_schema() {
        let tool = submit_itinerary_tool_definition(ItineraryResult::schema());
        assert_eq!(tool["function"]["name"], SUBMIT_ITINERARY_TOOL_NAME);
        let params = &tool["function"]["parameters"];
        assert_eq!(params["required"], json!([ITINERARY_ARGUMENT]));
        let itinerary = &params["properties"][ITINERARY_ARGUMENT];
        assert!(itinerary["properties"]["activities"].is_object());
        assert!(itinerary["properties"]["accommodations"].is_object());
    }

    #[test]
    fn test_follow_up_tool_requires_question() {
        let tool = ask_follow_up_tool_definition(FollowUp::schema());
        let params = &tool["function"]["parameters"];
        assert!(params["properties"]["question"].is_object());
        assert_eq!(params["required"], json!(["question"]));
    }

    #[test]
    fn test_schema_instructions_added_once() {
        let schema = ItineraryResult::schema();
        let once = with_schema_instructions("Base prompt", schema);
        assert!(once.contains(SUBMIT_ITINERARY_TOOL_NAME));
        let twice = with_schema_instructions(&once, schema);
        assert_eq!(once, twice);
    }
}
