use crate::completion_schema;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a closed set of user-facing labels with lookup by exact label.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            /// Exact, case-sensitive match against the label.
            pub fn from_label(label: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|value| value.as_str() == label)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum! {
    /// What the traveller wants from a destination (city selection).
    Interest {
        Beach => "Beach",
        Mountains => "Mountains",
        CityLife => "City Life",
        Culture => "Culture",
        Food => "Food",
        Adventure => "Adventure",
        Relaxation => "Relaxation",
        Nightlife => "Nightlife",
    }
}

labelled_enum! {
    /// Activities requested for the itinerary (travel planning).
    ActivityType {
        Sightseeing => "Sightseeing",
        Museums => "Museums",
        Shopping => "Shopping",
        LocalFood => "Local Food",
        AdventureSports => "Adventure Sports",
        Relaxation => "Relaxation",
        Nightlife => "Nightlife",
    }
}

labelled_enum! {
    AccommodationTier {
        Budget => "Budget",
        MidRange => "Mid-range",
        Luxury => "Luxury",
    }
}

labelled_enum! {
    Season {
        Spring => "Spring",
        Summer => "Summer",
        Fall => "Fall",
        Winter => "Winter",
    }
}

/// Raw trip fields as submitted by a form, before any validation.
///
/// Every field is optional; which ones a step needs is decided when the
/// typed [`TripRequest`] is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripFields {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub preferences: Option<Vec<String>>,
    #[serde(default)]
    pub activities: Option<Vec<String>>,
    #[serde(default)]
    pub accommodation: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// A validated planning request. Built by `TripRequest::for_city_selection`
/// or `TripRequest::for_travel_planning`, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripRequest {
    pub(crate) origin: Option<String>,
    pub(crate) destination: Option<String>,
    pub(crate) start_date: Option<NaiveDate>,
    pub(crate) end_date: Option<NaiveDate>,
    pub(crate) interests: Vec<Interest>,
    pub(crate) activities: Vec<ActivityType>,
    pub(crate) accommodation: Option<AccommodationTier>,
    pub(crate) season: Option<Season>,
    pub(crate) budget: Option<f64>,
    pub(crate) duration: Option<u32>,
}

impl TripRequest {
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn interests(&self) -> &[Interest] {
        &self.interests
    }

    pub fn activities(&self) -> &[ActivityType] {
        &self.activities
    }

    pub fn accommodation(&self) -> Option<AccommodationTier> {
        self.accommodation
    }

    pub fn season(&self) -> Option<Season> {
        self.season
    }

    /// Daily budget in USD.
    pub fn budget(&self) -> Option<f64> {
        self.budget
    }

    pub fn duration(&self) -> Option<u32> {
        self.duration
    }

    /// Number of travel days, inclusive of both dates when they are known.
    pub fn trip_days(&self) -> Option<u32> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => u32::try_from((end - start).num_days() + 1).ok(),
            _ => self.duration,
        }
    }

    /// Ceiling for the whole trip: daily budget times travel days.
    pub fn budget_ceiling(&self) -> Option<f64> {
        let daily = self.budget?;
        Some(daily * f64::from(self.trip_days().unwrap_or(1)))
    }
}

/// Estimated daily spend in a recommended city, in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EstimatedCost {
    #[schemars(range(min = 0))]
    pub accommodation: f64,
    #[schemars(range(min = 0))]
    pub food: f64,
    #[schemars(range(min = 0))]
    pub activities: f64,
    #[schemars(range(min = 0))]
    pub total_per_day: f64,
}

/// One candidate destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CityRecommendation {
    pub name: String,
    pub country: String,
    pub description: String,
    /// Conventionally in [0, 1]; not clamped.
    pub match_score: f64,
    pub highlights: Vec<String>,
    pub estimated_cost: EstimatedCost,
}

/// City recommendations returned by the city selection expert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[completion_schema(name = "CityRecommendationSet")]
pub struct CityRecommendationSet {
    /// Candidate cities, best match first
    pub recommended_cities: Vec<CityRecommendation>,
}

impl CityRecommendationSet {
    pub fn names(&self) -> Vec<&str> {
        self.recommended_cities
            .iter()
            .map(|city| city.name.as_str())
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<&CityRecommendation> {
        self.recommended_cities
            .iter()
            .find(|city| city.name.eq_ignore_ascii_case(name.trim()))
    }

    /// `(name, match score, daily cost)` rows for a side-by-side comparison.
    pub fn comparison_rows(&self) -> Vec<(&str, f64, f64)> {
        self.recommended_cities
            .iter()
            .map(|city| {
                (
                    city.name.as_str(),
                    city.match_score,
                    city.estimated_cost.total_per_day,
                )
            })
            .collect()
    }
}

/// A scheduled activity within a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Activity {
    #[serde(default)]
    pub time: String,
    pub activity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    #[schemars(range(min = 0))]
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Meal {
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    #[schemars(range(min = 0))]
    pub cost: f64,
}

/// Per-day itinerary entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DayPlan {
    /// 1-based day counter within the itinerary
    pub day: u32,
    /// ISO-8601 date of the day
    pub date: String,
    /// Activities in chronological order
    pub activities: Vec<Activity>,
    pub meals: Vec<Meal>,
}

/// Trip-wide spend by category, in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetBreakdown {
    #[schemars(range(min = 0))]
    pub accommodation: f64,
    #[schemars(range(min = 0))]
    pub food: f64,
    #[schemars(range(min = 0))]
    pub activities: f64,
    #[schemars(range(min = 0))]
    pub transportation: f64,
    /// Must equal the sum of the four categories
    #[schemars(range(min = 0))]
    pub total: f64,
}

impl BudgetBreakdown {
    pub fn parts_sum(&self) -> f64 {
        self.accommodation + self.food + self.activities + self.transportation
    }
}

/// Final itinerary produced by the travel planning expert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[completion_schema(name = "TravelPlan")]
pub struct TravelPlan {
    /// Day-by-day itinerary
    pub itinerary: Vec<DayPlan>,
    /// Cost breakdown for the whole trip
    pub budget_breakdown: BudgetBreakdown,
    /// Free-text tips for the traveller
    pub recommendations: Vec<String>,
    /// Destination city, when the agent echoes it back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl TravelPlan {
    pub fn activity_count(&self) -> usize {
        self.itinerary.iter().map(|day| day.activities.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::CompletionSchema;

    #[test]
    fn labels_round_trip_through_lookup() {
        assert_eq!(Interest::from_label("City Life"), Some(Interest::CityLife));
        assert_eq!(Interest::from_label("city life"), None);
        assert_eq!(
            AccommodationTier::from_label("Mid-range"),
            Some(AccommodationTier::MidRange)
        );
        assert_eq!(ActivityType::LocalFood.to_string(), "Local Food");
        assert_eq!(Interest::ALL.len(), 8);
    }

    #[test]
    fn trip_days_prefers_dates_over_duration() {
        let request = TripRequest {
            origin: None,
            destination: Some("Lisbon".into()),
            start_date: NaiveDate::from_ymd_opt(2030, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2030, 5, 7),
            interests: vec![],
            activities: vec![ActivityType::Sightseeing],
            accommodation: Some(AccommodationTier::Budget),
            season: None,
            budget: Some(150.0),
            duration: Some(3),
        };

        assert_eq!(request.trip_days(), Some(7));
        assert_eq!(request.budget_ceiling(), Some(1050.0));
    }

    #[test]
    fn completion_schemas_list_required_keys() {
        let schema = TravelPlan::schema().schema_json();
        let required = schema["required"].as_array().unwrap();
        for key in ["itinerary", "budget_breakdown", "recommendations"] {
            assert!(required.iter().any(|value| value == key), "missing {key}");
        }
        assert!(!required.iter().any(|value| value == "destination"));

        let cities = CityRecommendationSet::schema();
        assert_eq!(cities.schema_name(), "CityRecommendationSet");
        assert_eq!(cities.schema_json()["title"], "CityRecommendationSet");
    }
}
