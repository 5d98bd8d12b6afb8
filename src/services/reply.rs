use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    error::{PlannerError, Result},
    schemas::{
        validation::{ASK_FOLLOW_UP_TOOL_NAME, ITINERARY_ARGUMENT, SUBMIT_ITINERARY_TOOL_NAME},
        CompletionSchema,
    },
    types::{response::deserialize_structured_response, trip::FollowUp, trip::TripRequest},
};

pub(crate) const REPHRASE_QUESTION: &str =
    "I had trouble understanding that. Could you please rephrase your request?";

/// Keys that mark a bare JSON object as an itinerary rather than a question.
const ITINERARY_KEYS: [&str; 3] = ["activities", "accommodations", "daily_plan"];

/// What the AI service asked the session to do next.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AssistantReply {
    Question {
        follow_up: FollowUp,
        /// Set when the question arrived as an `ask_follow_up` tool call
        tool_call_id: Option<String>,
        arguments: Option<Value>,
    },
    Itinerary {
        payload: Value,
    },
}

impl AssistantReply {
    fn question(follow_up: FollowUp) -> Self {
        AssistantReply::Question {
            follow_up,
            tool_call_id: None,
            arguments: None,
        }
    }
}

/// Interpret a chat-completions response.
///
/// Tool calls win over plain content, and `submit_itinerary` wins over
/// `ask_follow_up` when both are present.
pub(crate) fn parse_reply(response: &Value) -> Result<AssistantReply> {
    let message = response
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| PlannerError::Api {
            status: 200,
            message: "response did not contain `choices[0].message`".to_string(),
        })?;

    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let Some(call) = find_tool_call(tool_calls, SUBMIT_ITINERARY_TOOL_NAME) {
        return Ok(itinerary_from_tool_call(call));
    }

    if let Some(call) = find_tool_call(tool_calls, ASK_FOLLOW_UP_TOOL_NAME) {
        return Ok(question_from_tool_call(call));
    }

    for call in tool_calls {
        warn!(
            target: "itinerary::session",
            tool = function_name(call).unwrap_or("<unnamed>"),
            "ignoring unknown tool call"
        );
    }

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Ok(reply_from_content(content))
}

fn find_tool_call<'a>(tool_calls: &'a [Value], name: &str) -> Option<&'a Value> {
    tool_calls
        .iter()
        .find(|call| function_name(call) == Some(name))
}

fn function_name(tool_call: &Value) -> Option<&str> {
    tool_call
        .get("function")
        .and_then(|function| function.get("name"))
        .and_then(Value::as_str)
}

fn tool_call_id(tool_call: &Value) -> Option<String> {
    tool_call
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Arguments arrive as a JSON string; some providers send an object instead.
fn tool_arguments(tool_call: &Value) -> std::result::Result<Value, serde_json::Error> {
    match tool_call.get("function").and_then(|f| f.get("arguments")) {
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Value::Object(Map::new())),
        Some(Value::String(raw)) => serde_json::from_str(raw),
        Some(other) => Ok(other.clone()),
        None => Ok(Value::Object(Map::new())),
    }
}

fn itinerary_from_tool_call(call: &Value) -> AssistantReply {
    let arguments = tool_arguments(call).unwrap_or_else(|err| {
        warn!(
            target: "itinerary::session",
            "`{}` arguments are not valid JSON: {}",
            SUBMIT_ITINERARY_TOOL_NAME,
            err
        );
        Value::Object(Map::new())
    });

    let payload = match arguments.get(ITINERARY_ARGUMENT).cloned() {
        Some(Value::String(nested)) => {
            serde_json::from_str(&nested).unwrap_or_else(|_| Value::Object(Map::new()))
        }
        Some(nested) if nested.is_object() => nested,
        _ => arguments,
    };

    AssistantReply::Itinerary { payload }
}

fn question_from_tool_call(call: &Value) -> AssistantReply {
    let tool_call_id = tool_call_id(call);
    let rephrase = |tool_call_id| AssistantReply::Question {
        follow_up: FollowUp::new(REPHRASE_QUESTION),
        tool_call_id,
        arguments: None,
    };

    let arguments = match tool_arguments(call) {
        Ok(Value::Object(arguments)) => arguments,
        Ok(other) => {
            warn!(target: "itinerary::session", "follow-up arguments are not an object: {}", other);
            return rephrase(tool_call_id);
        }
        Err(err) => {
            warn!(target: "itinerary::session", error = %err, "unreadable follow-up question");
            return rephrase(tool_call_id);
        }
    };

    let Some(question) = arguments
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
    else {
        warn!(target: "itinerary::session", "follow-up arguments carry no question");
        return rephrase(tool_call_id);
    };

    let value = Value::Object(arguments.clone());
    let follow_up = match deserialize_structured_response::<FollowUp>(&value, FollowUp::schema()) {
        Ok(mut follow_up) => {
            follow_up.question = question.to_string();
            follow_up.needs_disambiguation = follow_up
                .needs_disambiguation
                .filter(|s| !s.trim().is_empty());
            follow_up
        }
        Err(err) => {
            debug!(target: "itinerary::session", error = %err, "reading follow-up field by field");
            follow_up_from_object(question, &arguments, false)
        }
    };

    AssistantReply::Question {
        follow_up,
        tool_call_id,
        arguments: Some(value),
    }
}

/// Fallback for models that answer in plain text instead of calling a tool.
fn reply_from_content(content: &str) -> AssistantReply {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return AssistantReply::question(FollowUp::new(REPHRASE_QUESTION));
    }

    let Some(Value::Object(obj)) = serde_json::from_str::<Value>(strip_code_fences(trimmed)).ok()
    else {
        return AssistantReply::question(FollowUp::new(trimmed));
    };
    debug!(target: "itinerary::session", "reply content is a JSON object");

    if let Some(nested) = obj.get(ITINERARY_ARGUMENT).filter(|v| v.is_object()) {
        return AssistantReply::Itinerary {
            payload: nested.clone(),
        };
    }

    if ITINERARY_KEYS.iter().any(|key| obj.contains_key(*key)) {
        return AssistantReply::Itinerary {
            payload: Value::Object(obj),
        };
    }

    let question = ["next_question", "question"]
        .iter()
        .filter_map(|key| obj.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|q| !q.is_empty());

    match question {
        Some(question) => AssistantReply::question(follow_up_from_object(question, &obj, true)),
        None => AssistantReply::question(FollowUp::new(trimmed)),
    }
}

/// Best-effort read of collection fields from a question object.
///
/// Without a `collected` object, the fields may sit at the top level when
/// `flat` is set, as models often do when answering in plain JSON.
fn follow_up_from_object(question: &str, obj: &Map<String, Value>, flat: bool) -> FollowUp {
    let mut follow_up = FollowUp::new(question);

    let collected = match obj.get("collected") {
        Some(collected) => TripRequest::from_value_lenient(collected),
        None if flat => TripRequest::from_value_lenient(&Value::Object(obj.clone())),
        None => TripRequest::default(),
    };
    follow_up.collected = (collected != TripRequest::default()).then_some(collected);

    follow_up.missing_fields = obj
        .get("missing_fields")
        .and_then(Value::as_array)
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    follow_up.needs_disambiguation = obj
        .get("needs_disambiguation")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    follow_up
}

/// Remove a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````).
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_response(name: &str, arguments: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": name, "arguments": arguments }
                    }]
                }
            }]
        })
    }

    fn text_response(content: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[test]
    fn test_follow_up_tool_call() {
        let response = tool_response(
            ASK_FOLLOW_UP_TOOL_NAME,
            r#"{"question":"How many days?","collected":{"destination":"Rome, Italy"},"missing_fields":["duration"]}"#,
        );
        match parse_reply(&response).unwrap() {
            AssistantReply::Question {
                follow_up,
                tool_call_id,
                arguments,
            } => {
                assert_eq!(follow_up.question, "How many days?");
                assert_eq!(
                    follow_up.collected.unwrap().destination.as_deref(),
                    Some("Rome, Italy")
                );
                assert_eq!(tool_call_id.as_deref(), Some("call_1"));
                assert!(arguments.is_some());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_follow_up_asks_to_rephrase() {
        let response = tool_response(ASK_FOLLOW_UP_TOOL_NAME, r#"{"question": 42}"#);
        match parse_reply(&response).unwrap() {
            AssistantReply::Question {
                follow_up,
                tool_call_id,
                ..
            } => {
                assert_eq!(follow_up.question, REPHRASE_QUESTION);
                assert_eq!(tool_call_id.as_deref(), Some("call_1"));
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    fn follow_up_of(reply: AssistantReply) -> (FollowUp, Option<Value>) {
        match reply {
            AssistantReply::Question {
                follow_up,
                arguments,
                ..
            } => (follow_up, arguments),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_bad_side_fields_keep_the_question() {
        let response = tool_response(
            ASK_FOLLOW_UP_TOOL_NAME,
            r#"{"question":"What is your total budget?","missing_fields":null}"#,
        );
        let (follow_up, arguments) = follow_up_of(parse_reply(&response).unwrap());
        assert_eq!(follow_up.question, "What is your total budget?");
        assert!(follow_up.missing_fields.is_empty());
        assert!(arguments.is_some());

        let response = tool_response(
            ASK_FOLLOW_UP_TOOL_NAME,
            r#"{"question":"What currency?","collected":{"destination":"Oslo, Norway","budget":{"total_amount":1500}}}"#,
        );
        let (follow_up, _) = follow_up_of(parse_reply(&response).unwrap());
        assert_eq!(follow_up.question, "What currency?");
        let collected = follow_up.collected.unwrap();
        assert_eq!(collected.destination.as_deref(), Some("Oslo, Norway"));
        assert!(collected.budget.is_none());

        let response = tool_response(
            ASK_FOLLOW_UP_TOOL_NAME,
            r#"{"question":"Any kids?","collected":{"travelers":{"adults":2,"children":null}},"missing_fields":["budget"]}"#,
        );
        let (follow_up, _) = follow_up_of(parse_reply(&response).unwrap());
        assert_eq!(follow_up.question, "Any kids?");
        let travelers = follow_up.collected.unwrap().travelers.unwrap();
        assert_eq!((travelers.adults, travelers.children), (2, 0));
        assert_eq!(follow_up.missing_fields, vec!["budget"]);
    }

    #[test]
    fn test_follow_up_without_question_asks_to_rephrase() {
        for arguments in [r#"{"question":"   "}"#, r#"{"collected":{}}"#, "[1, 2]", "{oops"] {
            let response = tool_response(ASK_FOLLOW_UP_TOOL_NAME, arguments);
            let (follow_up, stored) = follow_up_of(parse_reply(&response).unwrap());
            assert_eq!(follow_up.question, REPHRASE_QUESTION, "for {arguments}");
            assert!(stored.is_none());
        }
    }

    #[test]
    fn test_submit_itinerary_tool_call() {
        let response = tool_response(
            SUBMIT_ITINERARY_TOOL_NAME,
            r#"{"itinerary":{"destination":"Rome, Italy","duration_days":3}}"#,
        );
        assert_eq!(
            parse_reply(&response).unwrap(),
            AssistantReply::Itinerary {
                payload: json!({"destination": "Rome, Italy", "duration_days": 3})
            }
        );
    }

    #[test]
    fn test_invalid_itinerary_arguments_become_empty_payload() {
        let response = tool_response(SUBMIT_ITINERARY_TOOL_NAME, "{not json");
        assert_eq!(
            parse_reply(&response).unwrap(),
            AssistantReply::Itinerary { payload: json!({}) }
        );
    }

    #[test]
    fn test_submit_wins_over_follow_up() {
        let response = json!({
            "choices": [{
                "message": {
                    "tool_calls": [
                        { "id": "a", "function": { "name": ASK_FOLLOW_UP_TOOL_NAME, "arguments": "{\"question\":\"?\"}" } },
                        { "id": "b", "function": { "name": SUBMIT_ITINERARY_TOOL_NAME, "arguments": "{\"itinerary\":{}}" } }
                    ]
                }
            }]
        });
        assert!(matches!(
            parse_reply(&response).unwrap(),
            AssistantReply::Itinerary { .. }
        ));
    }

    #[test]
    fn test_plain_text_is_relayed() {
        let reply = parse_reply(&text_response("Which city in Spain?")).unwrap();
        assert_eq!(reply, AssistantReply::question(FollowUp::new("Which city in Spain?")));

        let empty = parse_reply(&text_response("   ")).unwrap();
        assert_eq!(empty, AssistantReply::question(FollowUp::new(REPHRASE_QUESTION)));
    }

    #[test]
    fn test_fenced_json_question() {
        let content = "```json\n{\"destination\": \"Kashmir\", \"duration\": 14, \"next_question\": \"How many people are traveling?\", \"missing_fields\": [\"travelers\"]}\n```";
        match parse_reply(&text_response(content)).unwrap() {
            AssistantReply::Question { follow_up, .. } => {
                assert_eq!(follow_up.question, "How many people are traveling?");
                let collected = follow_up.collected.unwrap();
                assert_eq!(collected.destination.as_deref(), Some("Kashmir"));
                assert_eq!(collected.duration_days, Some(14));
                assert_eq!(follow_up.missing_fields, vec!["travelers"]);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn test_fenced_json_itinerary() {
        let content = "```\n{\"destination\": \"Goa, India\", \"activities\": []}\n```";
        assert!(matches!(
            parse_reply(&text_response(content)).unwrap(),
            AssistantReply::Itinerary { .. }
        ));
    }

    #[test]
    fn test_missing_message_is_api_error() {
        let err = parse_reply(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, PlannerError::Api { .. }));
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("{}"), "{}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
    }
}
