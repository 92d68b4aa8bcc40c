pub mod response;
pub mod result;
pub mod travel;

pub use response::{deserialize_structured_response, AgentResponse};
pub use result::{PipelineState, StepReport, ValidatedOutput};
pub use travel::{
    AccommodationTier, Activity, ActivityType, BudgetBreakdown, CityRecommendation,
    CityRecommendationSet, DayPlan, EstimatedCost, Interest, Meal, Season, TravelPlan,
    TripFields, TripRequest,
};
