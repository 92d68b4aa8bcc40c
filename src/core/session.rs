use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::travel::{CityRecommendationSet, TravelPlan};

/// Where the traveller is in the two-step flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlanningStep {
    #[default]
    CitySelection,
    TravelPlanning,
}

impl fmt::Display for PlanningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlanningStep::CitySelection => "City Selection",
            PlanningStep::TravelPlanning => "Travel Planning",
        })
    }
}

/// Per-session result slots.
///
/// Passed by value into each planner step and handed back updated; nothing
/// else holds on to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub current_step: PlanningStep,
    pub selected_cities: Option<CityRecommendationSet>,
    pub travel_plan: Option<TravelPlan>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every result and go back to city selection.
    pub fn restart(self) -> Self {
        Self::new()
    }

    /// Store a city list and move on to planning. Any earlier plan belonged
    /// to the previous list and is cleared.
    pub(crate) fn with_cities(self, cities: CityRecommendationSet) -> Self {
        Self {
            current_step: PlanningStep::TravelPlanning,
            selected_cities: Some(cities),
            travel_plan: None,
        }
    }

    pub(crate) fn with_plan(mut self, plan: TravelPlan) -> Self {
        self.travel_plan = Some(plan);
        self
    }

    pub fn has_plan(&self) -> bool {
        self.travel_plan.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guardrails::fallback_city_recommendations;

    #[test]
    fn cities_advance_the_step_and_restart_clears() {
        let session = SessionState::new();
        assert_eq!(session.current_step, PlanningStep::CitySelection);

        let session = session.with_cities(fallback_city_recommendations());
        assert_eq!(session.current_step, PlanningStep::TravelPlanning);
        assert!(session.selected_cities.is_some());

        let session = session.restart();
        assert_eq!(session, SessionState::default());
    }
}
