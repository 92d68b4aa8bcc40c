use crate::{
    core::session::PlanningStep,
    error::PlannerError,
    types::travel::{CityRecommendationSet, TravelPlan},
};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};

/// States of one planning run.
///
/// `Idle → Requested → AgentInvoked → ParseAttempted → {Valid,
/// InvalidReported, FallbackSubstituted}`. An input rejection or a failed
/// agent call ends the run in `InvalidReported` early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Requested,
    AgentInvoked,
    ParseAttempted,
    Valid,
    InvalidReported,
    FallbackSubstituted,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineState::Valid
                | PipelineState::InvalidReported
                | PipelineState::FallbackSubstituted
        )
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Requested)
                | (Requested, AgentInvoked)
                | (Requested, InvalidReported)
                | (AgentInvoked, ParseAttempted)
                | (AgentInvoked, InvalidReported)
                | (ParseAttempted, Valid)
                | (ParseAttempted, InvalidReported)
                | (ParseAttempted, FallbackSubstituted)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A structurally valid, sanitized agent result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidatedOutput {
    Cities(CityRecommendationSet),
    Plan(TravelPlan),
}

impl ValidatedOutput {
    pub fn as_cities(&self) -> Option<&CityRecommendationSet> {
        match self {
            ValidatedOutput::Cities(cities) => Some(cities),
            ValidatedOutput::Plan(_) => None,
        }
    }

    pub fn as_plan(&self) -> Option<&TravelPlan> {
        match self {
            ValidatedOutput::Plan(plan) => Some(plan),
            ValidatedOutput::Cities(_) => None,
        }
    }
}

/// What one planner step produced.
///
/// `Valid` carries a result and no error; `FallbackSubstituted` carries the
/// fallback result and the error that caused it; `InvalidReported` carries
/// only the error.
#[derive(Debug)]
pub struct StepReport {
    pub step: PlanningStep,
    pub trace: Vec<PipelineState>,
    pub result: Option<ValidatedOutput>,
    pub error: Option<PlannerError>,
    pub duration: Duration,
}

impl StepReport {
    pub fn final_state(&self) -> PipelineState {
        self.trace.last().copied().unwrap_or(PipelineState::Idle)
    }

    /// Whether the caller received something it can display.
    pub fn is_usable(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_degraded(&self) -> bool {
        self.final_state() == PipelineState::FallbackSubstituted
    }

    /// Human-readable account of the run.
    pub fn replay(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("=== {} ===", self.step));
        lines.push(format!("Duration: {:.2}s", self.duration.as_secs_f64()));
        lines.push(format!(
            "States: {}",
            self.trace
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" -> ")
        ));

        if let Some(error) = &self.error {
            lines.push(format!("Error [{}]: {}", error.error_code(), error.user_message()));
        }

        match &self.result {
            Some(ValidatedOutput::Cities(cities)) => {
                lines.push(format!(
                    "Cities: {}",
                    cities.names().join(", ")
                ));
            }
            Some(ValidatedOutput::Plan(plan)) => {
                lines.push(format!(
                    "Plan: {} days, {} activities, total ${:.2}",
                    plan.itinerary.len(),
                    plan.activity_count(),
                    plan.budget_breakdown.total
                ));
            }
            None => lines.push("No usable result".to_string()),
        }

        lines.join("\n")
    }
}
