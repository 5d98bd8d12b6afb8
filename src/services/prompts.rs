use crate::{
    schemas::{validation::with_schema_instructions, CompletionSchema},
    types::{itinerary::ItineraryResult, trip::TripRequest},
};

const BASE_PROMPT: &str = "You are a friendly travel planner. Before planning, collect four details from the traveler: \
destination (city and country), duration (1-365 days), travelers (adults and children) and budget (total amount and currency).

Rules:
- Ask about ONE missing detail at a time, in this order: destination, duration, travelers, budget.
- If a destination is ambiguous (for example \"Paris\" or \"Springfield\"), ask which country is meant and set `needs_disambiguation` instead of accepting it.
- Report everything collected so far in `collected` with every question, and list what is still missing in `missing_fields`.
- Once all four details are known, produce the itinerary: must-visit activities, a day-by-day plan, accommodation options that suit the budget, an estimated cost breakdown, and practical recommendations. All amounts use the traveler's currency.";

/// Build the system prompt for the next exchange.
///
/// The current collection state is embedded so the model does not have to
/// re-derive it from the transcript.
pub(crate) fn system_prompt(request: &TripRequest, ambiguity: Option<&str>) -> String {
    let mut prompt = BASE_PROMPT.to_string();

    prompt.push_str("\n\n## Collected so far\n");
    prompt.push_str(&request.summary());

    if let Some(budget) = &request.budget {
        if let Some(tier) = budget.accommodation_type {
            prompt.push_str(&format!("\nSuggested accommodation tier: {}", tier));
        }
    }

    if let Some(question) = ambiguity {
        prompt.push_str(&format!(
            "\nThe destination is still ambiguous ({}). Resolve it before anything else.",
            question
        ));
    }

    if request.is_complete() {
        prompt.push_str("\nAll details are known: submit the itinerary now.");
    }

    with_schema_instructions(&prompt, ItineraryResult::schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::{Budget, Travelers};

    #[test]
    fn test_prompt_reflects_collection_state() {
        let empty = system_prompt(&TripRequest::default(), None);
        assert!(empty.contains("No data collected yet"));
        assert!(empty.contains("ask_follow_up"));
        assert!(empty.contains("submit_itinerary"));
        assert!(!empty.contains("submit the itinerary now"));

        let mut request = TripRequest::default();
        request.merge(
            TripRequest {
                destination: Some("Kyoto, Japan".to_string()),
                duration_days: Some(4),
                travelers: Some(Travelers {
                    adults: 2,
                    children: 0,
                }),
                budget: Some(Budget {
                    total_amount: 2000.0,
                    currency: "usd".to_string(),
                    accommodation_type: None,
                }),
            },
            false,
        );
        let full = system_prompt(&request, None);
        assert!(full.contains("Kyoto, Japan"));
        assert!(full.contains("Suggested accommodation tier"));
        assert!(full.contains("submit the itinerary now"));
    }

    #[test]
    fn test_prompt_mentions_ambiguity() {
        let prompt = system_prompt(&TripRequest::default(), Some("Paris, France or Paris, Texas?"));
        assert!(prompt.contains("still ambiguous"));
    }
}
