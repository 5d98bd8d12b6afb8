pub mod itinerary;
pub mod outcome;
pub mod response;
pub mod trip;

pub use itinerary::{Accommodation, Activity, CostBreakdown, DayPlan, ItineraryResult};
pub use outcome::{ItineraryOutcome, TokenUsage};
pub use response::deserialize_structured_response;
pub use trip::{AccommodationType, Budget, FollowUp, Travelers, TripRequest};
