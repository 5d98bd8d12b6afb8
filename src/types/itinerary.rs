use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::trip::{TripRequest, Travelers};

/// Structured travel plan returned by the AI service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ItineraryResult {
    /// Destination city and country (e.g., "Paris, France")
    pub destination: Option<String>,
    /// Two or three sentences about the destination
    pub destination_overview: Option<String>,
    /// Trip length in days
    pub duration_days: Option<u32>,
    /// Traveler composition the plan is designed for
    pub travelers: Option<Travelers>,
    /// Currency code used for all monetary fields (e.g., "USD")
    pub currency: Option<String>,
    /// Must-visit places and activities
    pub activities: Vec<Activity>,
    /// Day-by-day plan
    pub daily_plan: Vec<DayPlan>,
    /// Recommended places to stay
    pub accommodations: Vec<Accommodation>,
    /// Estimated cost breakdown for the whole trip
    pub costs: Option<CostBreakdown>,
    /// Practical tips and follow-up actions
    pub recommendations: Option<String>,
    /// Seconds spent generating the itinerary
    #[schemars(skip)]
    pub generation_seconds: Option<f64>,
}

crate::completion_schema!(ItineraryResult, "ItineraryResult");

/// A must-visit place or activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Activity {
    /// Name of the place or activity
    pub name: Option<String>,
    /// Category such as historical, cultural, natural, entertainment
    pub category: Option<String>,
    /// Why it is worth visiting
    pub significance: Option<String>,
    /// Suggested time to spend, e.g. "2-3 hours"
    pub estimated_duration: Option<String>,
}

/// One day of the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DayPlan {
    /// 1-based day number
    pub day: Option<u32>,
    /// Short theme for the day
    pub title: Option<String>,
    /// Activities in chronological order
    pub activities: Vec<String>,
    /// Estimated spend for the day in the plan currency
    pub estimated_cost: Option<f64>,
}

/// A lodging option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Accommodation {
    /// Hotel or property name
    pub name: Option<String>,
    /// Neighborhood or address
    pub location: Option<String>,
    /// Price per night in the plan currency
    pub price_per_night: Option<f64>,
    /// How close it is to the planned activities, e.g. "Near Marine Drive"
    pub proximity_score: Option<String>,
    /// Rating such as "4.3/5"
    pub rating: Option<String>,
}

/// Trip cost estimate by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CostBreakdown {
    pub accommodation: Option<f64>,
    pub activities: Option<f64>,
    pub food: Option<f64>,
    pub transport: Option<f64>,
    pub other: Option<f64>,
    /// Total estimated cost for the whole trip
    pub total: Option<f64>,
}

impl CostBreakdown {
    /// Category amounts paired with their labels.
    pub fn categories(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("Accommodation", self.accommodation),
            ("Activities", self.activities),
            ("Food", self.food),
            ("Transport", self.transport),
            ("Other", self.other),
        ]
    }

    /// The stated total, or the sum of known categories.
    pub fn effective_total(&self) -> Option<f64> {
        if self.total.is_some() {
            return self.total;
        }
        let known: Vec<f64> = self
            .categories()
            .iter()
            .filter_map(|(_, amount)| *amount)
            .collect();
        if known.is_empty() {
            None
        } else {
            Some(known.iter().sum())
        }
    }

    fn is_empty(&self) -> bool {
        self.total.is_none() && self.categories().iter().all(|(_, amount)| amount.is_none())
    }
}

impl ItineraryResult {
    /// Read whatever can be read from an AI payload.
    ///
    /// Never fails: wrong-typed values become `None`, unknown keys are
    /// ignored, and a non-object payload yields an empty result.
    pub fn from_value_lenient(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let (destination, nested_overview) = match field(obj, &["destination", "location"]) {
            Some(Value::Object(info)) => (
                destination_name(info),
                field(info, &["overview", "description"]).and_then(text),
            ),
            Some(other) => (text(other), None),
            None => (None, None),
        };

        let mut costs = field(obj, &["costs", "cost_breakdown", "budget_breakdown"])
            .and_then(Value::as_object)
            .map(cost_breakdown)
            .unwrap_or_default();
        if costs.total.is_none() {
            costs.total = field(obj, &["total_estimated_cost", "total_cost"]).and_then(amount);
        }

        Self {
            destination,
            destination_overview: field(obj, &["destination_overview", "overview"])
                .and_then(text)
                .or(nested_overview),
            duration_days: field(obj, &["duration_days", "duration", "days"]).and_then(count),
            travelers: field(obj, &["travelers", "travellers"]).and_then(travelers),
            currency: field(obj, &["currency"]).and_then(text),
            activities: list(obj, &["activities", "must_visit_places", "places"])
                .filter_map(activity)
                .collect(),
            daily_plan: list(obj, &["daily_plan", "itinerary", "daily_itineraries"])
                .filter_map(day_plan)
                .collect(),
            accommodations: list(obj, &["accommodations", "accommodation_options", "hotels"])
                .filter_map(accommodation)
                .collect(),
            costs: (!costs.is_empty()).then_some(costs),
            recommendations: field(obj, &["recommendations", "notes", "tips"]).and_then(text),
            generation_seconds: field(obj, &["generation_seconds"]).and_then(amount),
        }
    }

    /// Fill fields the AI left out from the details collected locally.
    pub fn backfill(&mut self, request: &TripRequest) {
        if self.destination.is_none() {
            self.destination = request.destination.clone();
        }
        if self.duration_days.is_none() {
            self.duration_days = request.duration_days;
        }
        if self.travelers.is_none() {
            self.travelers = request.travelers;
        }
        if self.currency.is_none() {
            self.currency = request.budget.as_ref().map(|b| b.currency.clone());
        }
    }
}

pub(super) fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| !value.is_null())
}

fn list<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> impl Iterator<Item = &'a Value> {
    field(obj, keys)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

pub(super) fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First run of digits in a string, with thousands separators removed.
fn leading_number(s: &str) -> Option<&str> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let rest = &s[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ',' || c == '.'))
        .unwrap_or(rest.len());
    Some(rest[..end].trim_end_matches(['.', ',']))
}

pub(super) fn amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s)?.replace(',', "").parse().ok(),
        _ => None,
    }
}

pub(super) fn count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => leading_number(s)?.replace(',', "").parse().ok(),
        _ => None,
    }
}

fn destination_name(info: &Map<String, Value>) -> Option<String> {
    let name = field(info, &["name", "city"]).and_then(text);
    let country = field(info, &["country"]).and_then(text);
    match (name, country) {
        (Some(name), Some(country)) if !name.contains(&country) => {
            Some(format!("{}, {}", name, country))
        }
        (Some(name), _) => Some(name),
        (None, country) => country,
    }
}

pub(super) fn travelers(value: &Value) -> Option<Travelers> {
    match value {
        Value::Object(obj) => {
            let adults = field(obj, &["adults"]).and_then(count);
            let children = field(obj, &["children"]).and_then(count).unwrap_or(0);
            let adults = adults.or_else(|| {
                field(obj, &["total"])
                    .and_then(count)
                    .map(|total| total.saturating_sub(children))
            })?;
            Some(Travelers { adults, children })
        }
        other => count(other).map(|adults| Travelers {
            adults,
            children: 0,
        }),
    }
}

fn activity(value: &Value) -> Option<Activity> {
    match value {
        Value::Object(obj) => Some(Activity {
            name: field(obj, &["name", "title", "activity"]).and_then(text),
            category: field(obj, &["category", "type"]).and_then(text),
            significance: field(obj, &["significance", "description"]).and_then(text),
            estimated_duration: field(obj, &["estimated_duration", "duration"]).and_then(text),
        }),
        other => text(other).map(|name| Activity {
            name: Some(name),
            ..Activity::default()
        }),
    }
}

fn day_plan(value: &Value) -> Option<DayPlan> {
    let obj = value.as_object()?;
    Some(DayPlan {
        day: field(obj, &["day", "day_number"]).and_then(count),
        title: field(obj, &["title", "theme"]).and_then(text),
        activities: list(obj, &["activities"])
            .filter_map(|item| match item {
                Value::Object(inner) => field(inner, &["name", "title", "activity"]).and_then(text),
                other => text(other),
            })
            .collect(),
        estimated_cost: field(obj, &["estimated_cost", "total_estimated_cost", "cost"])
            .and_then(amount),
    })
}

fn accommodation(value: &Value) -> Option<Accommodation> {
    match value {
        Value::Object(obj) => Some(Accommodation {
            name: field(obj, &["name", "hotel"]).and_then(text),
            location: field(obj, &["location", "neighborhood", "address"]).and_then(text),
            price_per_night: field(
                obj,
                &["price_per_night", "price", "nightly_rate", "cost_per_night"],
            )
            .and_then(amount),
            proximity_score: field(obj, &["proximity_score", "proximity"]).and_then(text),
            rating: field(obj, &["rating"]).and_then(text),
        }),
        other => text(other).map(|name| Accommodation {
            name: Some(name),
            ..Accommodation::default()
        }),
    }
}

fn cost_breakdown(obj: &Map<String, Value>) -> CostBreakdown {
    CostBreakdown {
        accommodation: field(obj, &["accommodation", "lodging"]).and_then(amount),
        activities: field(obj, &["activities"]).and_then(amount),
        food: field(obj, &["food", "meals"]).and_then(amount),
        transport: field(obj, &["transport", "transportation"]).and_then(amount),
        other: field(obj, &["other", "miscellaneous"]).and_then(amount),
        total: field(obj, &["total"]).and_then(amount),
    }
}
