use async_trait::async_trait;
use itinerary_agent_rs::{
    run_interactive, ChatBackend, Planner, PlannerError, Result, SessionEnd, SessionTurn,
};
use serde_json::{json, Value};
use std::{
    io::Cursor,
    sync::{Arc, Mutex},
};

/// Backend that plays back canned replies in order.
#[derive(Debug)]
struct ScriptedBackend {
    replies: Mutex<Vec<Result<Value>>>,
    calls: Mutex<usize>,
}

impl ScriptedBackend {
    fn new(mut replies: Vec<Result<Value>>) -> Arc<Self> {
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, _body: &Value) -> Result<Value> {
        *self.calls.lock().unwrap() += 1;
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Ok(question("call_more", "Anything else?")))
    }
}

fn question(id: &str, text: &str) -> Value {
    json!({
        "choices": [{ "message": { "tool_calls": [{
            "id": id,
            "type": "function",
            "function": {
                "name": "ask_follow_up",
                "arguments": json!({ "question": text }).to_string()
            }
        }]}}]
    })
}

fn itinerary() -> Value {
    let payload = json!({
        "itinerary": {
            "destination": "Lisbon, Portugal",
            "duration_days": 4,
            "activities": [{ "name": "Belem Tower", "category": "historical" }],
            "accommodations": [{ "name": "Alfama Guesthouse", "price_per_night": 90 }],
            "costs": { "accommodation": 360, "food": 240 }
        }
    });
    json!({
        "choices": [{ "message": { "tool_calls": [{
            "id": "call_done",
            "type": "function",
            "function": { "name": "submit_itinerary", "arguments": payload.to_string() }
        }]}}]
    })
}

fn output_text(output: Vec<u8>) -> String {
    String::from_utf8(output).unwrap()
}

#[tokio::test]
async fn test_multi_turn_conversation_completes() {
    let backend = ScriptedBackend::new(vec![
        Ok(question("call_1", "How many days will you stay?")),
        Ok(question("call_2", "Who is traveling?")),
        Ok(itinerary()),
    ]);
    let planner = Planner::with_backend(backend.clone());
    let mut session = planner.session();
    let mut input = Cursor::new("4 days\n2 adults, 1500 EUR\n");
    let mut output = Vec::new();

    let end = run_interactive(&mut session, Some("Lisbon"), &mut input, &mut output)
        .await
        .unwrap();

    let outcome = match end {
        SessionEnd::Completed(outcome) => outcome,
        SessionEnd::Cancelled => panic!("session should complete"),
    };
    assert_eq!(backend.calls(), 3);
    assert_eq!(outcome.exchanges, 3);
    assert_eq!(outcome.question_count(), 2);
    assert_eq!(
        outcome.itinerary.destination.as_deref(),
        Some("Lisbon, Portugal")
    );
    assert!(matches!(outcome.turns.first(), Some(SessionTurn::Request { .. })));
    assert!(matches!(outcome.turns.last(), Some(SessionTurn::Itinerary { .. })));

    let text = output_text(output);
    assert!(text.contains("How many days will you stay?"));
    assert!(text.contains("Who is traveling?"));
}

#[tokio::test]
async fn test_cancel_word_stops_without_contacting_service() {
    let backend = ScriptedBackend::new(vec![Ok(question("call_1", "Which country?"))]);
    let planner = Planner::with_backend(backend.clone());
    let mut session = planner.session();
    let mut input = Cursor::new("/cancel\n");
    let mut output = Vec::new();

    let end = run_interactive(&mut session, Some("Paris"), &mut input, &mut output)
        .await
        .unwrap();

    assert!(matches!(end, SessionEnd::Cancelled));
    assert_eq!(backend.calls(), 1);
    assert!(output_text(output).contains("Planning cancelled."));
}

#[test]
fn test_end_of_input_cancels() {
    let backend = ScriptedBackend::new(vec![]);
    let planner = Planner::with_backend(backend.clone());
    let mut session = planner.session();
    let mut input = Cursor::new("");
    let mut output = Vec::new();

    let end = tokio_test::block_on(run_interactive(&mut session, None, &mut input, &mut output))
        .unwrap();

    assert!(matches!(end, SessionEnd::Cancelled));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_empty_input_reprompts() {
    let backend = ScriptedBackend::new(vec![Ok(itinerary())]);
    let planner = Planner::with_backend(backend.clone());
    let mut session = planner.session();
    let mut input = Cursor::new("\n   \n\nLisbon, 4 days, 2 adults, 1500 EUR\n");
    let mut output = Vec::new();

    let end = run_interactive(&mut session, None, &mut input, &mut output)
        .await
        .unwrap();

    assert!(matches!(end, SessionEnd::Completed(_)));
    assert_eq!(backend.calls(), 1);
    assert_eq!(output_text(output).matches("Describe your trip: ").count(), 4);
}

#[tokio::test]
async fn test_api_error_is_reported_and_answer_can_be_retried() {
    let backend = ScriptedBackend::new(vec![
        Ok(question("call_1", "How many days?")),
        Err(PlannerError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        }),
        Ok(itinerary()),
    ]);
    let planner = Planner::with_backend(backend.clone());
    let mut session = planner.session();
    let mut input = Cursor::new("4\n4\n");
    let mut output = Vec::new();

    let end = run_interactive(&mut session, Some("Lisbon"), &mut input, &mut output)
        .await
        .unwrap();

    let outcome = match end {
        SessionEnd::Completed(outcome) => outcome,
        SessionEnd::Cancelled => panic!("session should complete"),
    };
    // The failed answer was rolled back, so only one answer is on record.
    let answers = outcome
        .turns
        .iter()
        .filter(|turn| matches!(turn, SessionTurn::Answer { .. }))
        .count();
    assert_eq!(answers, 1);
    assert_eq!(outcome.exchanges, 2);

    let text = output_text(output);
    assert!(text.contains("upstream unavailable"));
    assert!(text.contains("Answer again to retry"));
}

#[tokio::test]
async fn test_max_turns_ends_the_loop() {
    let backend = ScriptedBackend::new(vec![]);
    let planner = Planner::with_backend(backend.clone()).with_max_turns(2);
    let mut session = planner.session();
    let mut input = Cursor::new("one\ntwo\nthree\nfour\n");
    let mut output = Vec::new();

    let err = run_interactive(&mut session, Some("Somewhere"), &mut input, &mut output)
        .await
        .unwrap_err();

    assert!(matches!(err, PlannerError::MaxTurns(2)));
    assert_eq!(backend.calls(), 2);
}
