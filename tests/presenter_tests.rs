use itinerary_agent_rs::{
    presenter::{self, OutputFormat, UNKNOWN},
    ItineraryResult,
};
use serde_json::json;

#[test]
fn test_malformed_payloads_render_with_placeholders() {
    let payloads = [
        json!({}),
        json!(null),
        json!("not an object"),
        json!({ "destination": 42, "duration_days": "a week" }),
        json!({ "activities": "none", "accommodations": [null, 3], "costs": [] }),
        json!({ "costs": { "total": "about 1,200 USD" } }),
    ];

    for payload in payloads {
        let itinerary = ItineraryResult::from_value_lenient(&payload);
        for format in [OutputFormat::Text, OutputFormat::Markdown, OutputFormat::Json] {
            let rendered = presenter::render(&itinerary, format).unwrap();
            assert!(!rendered.is_empty());
        }

        let text = presenter::render(&itinerary, OutputFormat::Text).unwrap();
        for section in ["DESTINATION", "DURATION", "ACTIVITIES & ATTRACTIONS", "ACCOMMODATIONS", "COSTS", "METRICS"] {
            assert!(text.contains(section), "missing {section} for {payload}");
        }
        assert!(text.contains(UNKNOWN), "no placeholder for {payload}");
    }
}

#[test]
fn test_lenient_total_is_rendered() {
    let itinerary = ItineraryResult::from_value_lenient(&json!({
        "currency": "USD",
        "costs": { "total": "about 1,200 USD" }
    }));
    let text = presenter::render(&itinerary, OutputFormat::Text).unwrap();
    assert!(text.contains("Total: 1200.00 USD"));
}

#[test]
fn test_saved_markdown_reads_back_identically() {
    let itinerary = ItineraryResult::from_value_lenient(&json!({
        "destination": "Hallstatt, Austria",
        "duration_days": 2,
        "activities": [{ "name": "Skywalk", "significance": "Lake views ✨" }],
        "recommendations": "Arrive early.\nBring cash."
    }));
    let rendered = presenter::render(&itinerary, OutputFormat::Markdown).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hallstatt.md");
    presenter::save(&path, &rendered).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), rendered.as_bytes());
}
