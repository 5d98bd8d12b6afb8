use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::itinerary::{amount, count, field, text, travelers};

pub const MIN_DURATION_DAYS: u32 = 1;
pub const MAX_DURATION_DAYS: u32 = 365;
pub const MIN_BUDGET: f64 = 1.0;

/// Accommodation tier derived from the budget per person per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AccommodationType {
    Budget,
    MidRange,
    Luxury,
}

impl AccommodationType {
    /// Classify a trip budget using currency-specific daily thresholds.
    pub fn classify(total_budget: f64, travelers: u32, duration_days: u32, currency: &str) -> Self {
        let divisor = f64::from(travelers) * f64::from(duration_days);
        if divisor <= 0.0 {
            return AccommodationType::MidRange;
        }
        let per_person_per_day = total_budget / divisor;

        let (budget_below, mid_up_to) = match currency.trim().to_uppercase().as_str() {
            "USD" => (50.0, 150.0),
            "INR" => (4000.0, 12000.0),
            "EUR" => (45.0, 135.0),
            _ => return AccommodationType::MidRange,
        };

        if per_person_per_day < budget_below {
            AccommodationType::Budget
        } else if per_person_per_day <= mid_up_to {
            AccommodationType::MidRange
        } else {
            AccommodationType::Luxury
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccommodationType::Budget => "budget",
            AccommodationType::MidRange => "mid-range",
            AccommodationType::Luxury => "luxury",
        }
    }
}

impl fmt::Display for AccommodationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Travelers {
    /// Number of adults
    pub adults: u32,
    /// Number of children
    #[serde(default)]
    pub children: u32,
}

impl Travelers {
    pub fn total(&self) -> u32 {
        self.adults.saturating_add(self.children)
    }
}

impl fmt::Display for Travelers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} adults, {} children", self.adults, self.children)
    }
}

/// Total trip budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Budget {
    /// Total amount for the whole trip
    pub total_amount: f64,
    /// ISO currency code, e.g. "USD"
    pub currency: String,
    /// Derived locally from the other collected fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub accommodation_type: Option<AccommodationType>,
}

/// Trip preferences gathered over the conversation.
///
/// The same shape is used for the partial updates the AI reports with each
/// follow-up question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct TripRequest {
    /// Destination city and country, e.g. "Paris, France"
    pub destination: Option<String>,
    /// Trip length in days (1-365)
    pub duration_days: Option<u32>,
    /// Traveler composition
    pub travelers: Option<Travelers>,
    /// Total budget with currency
    pub budget: Option<Budget>,
}

/// Follow-up question payload returned by the AI service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FollowUp {
    /// The single question to relay to the traveler
    pub question: String,
    /// Trip details collected so far
    #[serde(default)]
    pub collected: Option<TripRequest>,
    /// Names of the core fields still missing
    #[serde(default)]
    pub missing_fields: Vec<String>,
    /// Set when the destination is ambiguous and needs a country
    #[serde(default)]
    pub needs_disambiguation: Option<String>,
}

crate::completion_schema!(FollowUp, "FollowUp");

impl FollowUp {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            collected: None,
            missing_fields: Vec::new(),
            needs_disambiguation: None,
        }
    }
}

impl TripRequest {
    /// Core fields still absent, in collection order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.destination.is_none() {
            missing.push("destination");
        }
        if self.duration_days.is_none() {
            missing.push("duration");
        }
        if self.travelers.is_none() {
            missing.push("travelers");
        }
        if self.budget.is_none() {
            missing.push("budget");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Read each field on its own, dropping the ones that cannot be read.
    ///
    /// A budget without a currency is dropped rather than guessed.
    pub fn from_value_lenient(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let budget = field(obj, &["budget"])
            .and_then(Value::as_object)
            .and_then(|budget| {
                Some(Budget {
                    total_amount: field(budget, &["total_amount", "amount", "total"])
                        .and_then(amount)?,
                    currency: field(budget, &["currency"]).and_then(text)?,
                    accommodation_type: None,
                })
            });

        Self {
            destination: field(obj, &["destination"]).and_then(text),
            duration_days: field(obj, &["duration_days", "duration"]).and_then(count),
            travelers: field(obj, &["travelers", "travellers"]).and_then(travelers),
            budget,
        }
    }

    /// Merge a partial update, keeping only values that pass validation.
    ///
    /// Returns a note for every rejected value. A destination is ignored while
    /// `ambiguous` is set.
    pub fn merge(&mut self, update: TripRequest, ambiguous: bool) -> Vec<String> {
        let mut rejected = Vec::new();

        if let Some(destination) = update.destination {
            let destination = destination.trim();
            if ambiguous {
                rejected.push(format!(
                    "destination `{}` needs disambiguation",
                    destination
                ));
            } else if !destination.is_empty() {
                self.destination = Some(destination.to_string());
            }
        }

        if let Some(days) = update.duration_days {
            if (MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&days) {
                self.duration_days = Some(days);
            } else {
                rejected.push(format!(
                    "duration {} is outside {}-{} days",
                    days, MIN_DURATION_DAYS, MAX_DURATION_DAYS
                ));
            }
        }

        if let Some(travelers) = update.travelers {
            if travelers.total() > 0 {
                self.travelers = Some(travelers);
            } else {
                rejected.push("travelers must include at least one person".to_string());
            }
        }

        if let Some(budget) = update.budget {
            if budget.total_amount >= MIN_BUDGET && budget.total_amount.is_finite() {
                let currency = budget.currency.trim().to_uppercase();
                self.budget = Some(Budget {
                    total_amount: budget.total_amount,
                    currency: if currency.is_empty() {
                        "USD".to_string()
                    } else {
                        currency
                    },
                    accommodation_type: None,
                });
            } else {
                rejected.push(format!("budget {} is below the minimum", budget.total_amount));
            }
        }

        self.refresh_accommodation_type();
        rejected
    }

    fn refresh_accommodation_type(&mut self) {
        let (Some(travelers), Some(days), Some(budget)) =
            (self.travelers, self.duration_days, self.budget.as_mut())
        else {
            return;
        };
        budget.accommodation_type = Some(AccommodationType::classify(
            budget.total_amount,
            travelers.total(),
            days,
            &budget.currency,
        ));
    }

    /// One-line description of what has been collected so far.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(destination) = &self.destination {
            parts.push(format!("Destination: {}", destination));
        }
        if let Some(days) = self.duration_days {
            parts.push(format!("Duration: {} days", days));
        }
        if let Some(travelers) = &self.travelers {
            parts.push(format!("Travelers: {}", travelers));
        }
        if let Some(budget) = &self.budget {
            parts.push(format!("Budget: {} {}", budget.total_amount, budget.currency));
        }

        let missing = self.missing_fields();
        if !missing.is_empty() {
            parts.push(format!("Missing: {}", missing.join(", ")));
        }

        if self.destination.is_none()
            && self.duration_days.is_none()
            && self.travelers.is_none()
            && self.budget.is_none()
        {
            return "No data collected yet".to_string();
        }

        parts.join("; ")
    }
}
