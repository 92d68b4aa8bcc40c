//! The two planning steps: pick candidate cities, then plan the trip.
//!
//! Each step validates input, makes exactly one agent call, runs the output
//! through the guardrails and records every state it passed through. Errors
//! end the step; nothing here retries.

use std::time::Instant;

use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use crate::{
    config::PlannerConfig,
    core::{
        agent::{AgentInvoker, AgentRole},
        session::{PlanningStep, SessionState},
    },
    error::PlannerError,
    guardrails::{ExpectedShape, OutputValidator, ValidationContext},
    services::prompts::{city_selection_prompt, travel_plan_prompt},
    types::{PipelineState, StepReport, TripFields, TripRequest, ValidatedOutput},
};

/// Trace of one step run.
struct Run {
    step: PlanningStep,
    trace: Vec<PipelineState>,
    started: Instant,
}

impl Run {
    fn start(step: PlanningStep) -> Self {
        let mut run = Self {
            step,
            trace: vec![PipelineState::Idle],
            started: Instant::now(),
        };
        run.advance(PipelineState::Requested);
        run
    }

    fn advance(&mut self, next: PipelineState) {
        let current = self.trace.last().copied().unwrap_or(PipelineState::Idle);
        debug_assert!(
            current.can_advance_to(next),
            "illegal transition {current} -> {next}"
        );
        info!(
            target: "trip_planner::pipeline",
            step = %self.step,
            from = %current,
            to = %next,
            "state transition"
        );
        self.trace.push(next);
    }

    fn reject(mut self, error: PlannerError) -> StepReport {
        warn!(
            target: "trip_planner::pipeline",
            step = %self.step,
            code = error.error_code(),
            %error,
            "step failed"
        );
        self.advance(PipelineState::InvalidReported);
        self.finish(None, Some(error))
    }

    fn finish(self, result: Option<ValidatedOutput>, error: Option<PlannerError>) -> StepReport {
        StepReport {
            step: self.step,
            trace: self.trace,
            result,
            error,
            duration: self.started.elapsed(),
        }
    }
}

/// Runs planning steps against an [`AgentInvoker`].
#[derive(Debug)]
pub struct Planner<I> {
    invoker: I,
    config: PlannerConfig,
    today: Option<NaiveDate>,
}

impl<I: AgentInvoker> Planner<I> {
    pub fn new(invoker: I) -> Self {
        Self {
            invoker,
            config: PlannerConfig::default(),
            today: None,
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Fix the date that trip dates are checked against.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn validator(&self) -> OutputValidator {
        OutputValidator::new().with_fallback_policy(self.config.fallback_policy)
    }

    /// City selection step. A usable result (valid or fallback) is stored in
    /// the session, which then moves on to travel planning.
    pub async fn select_cities(
        &self,
        session: SessionState,
        fields: &TripFields,
    ) -> (SessionState, StepReport) {
        let mut run = Run::start(PlanningStep::CitySelection);

        let request = match TripRequest::for_city_selection_on(fields, self.today()) {
            Ok(request) => request,
            Err(rejection) => return (session, run.reject(rejection.into())),
        };

        let prompt = city_selection_prompt(&request);
        let response = self
            .invoker
            .invoke(AgentRole::CitySelectionExpert, &prompt)
            .await;
        run.advance(PipelineState::AgentInvoked);
        let response = match response {
            Ok(response) => response,
            Err(error) => return (session, run.reject(error)),
        };

        run.advance(PipelineState::ParseAttempted);
        let outcome = self
            .validator()
            .validate_and_repair(&response, ExpectedShape::CityList);
        run.advance(outcome.state());

        let (result, error) = outcome.into_parts();
        let session = match result.as_ref().and_then(ValidatedOutput::as_cities) {
            Some(cities) => session.with_cities(cities.clone()),
            None => session,
        };
        (session, run.finish(result, error.map(PlannerError::from)))
    }

    /// Travel planning step. Needs a stored city list that contains the
    /// requested destination. A valid plan is stored in the session; a
    /// failed one is reported with no substitute.
    pub async fn plan_trip(
        &self,
        session: SessionState,
        fields: &TripFields,
    ) -> (SessionState, StepReport) {
        let mut run = Run::start(PlanningStep::TravelPlanning);

        let Some(cities) = session.selected_cities.as_ref() else {
            let error = PlannerError::Session("Select cities before planning a trip".to_string());
            return (session, run.reject(error));
        };

        let request = match TripRequest::for_travel_planning_on(fields, self.today()) {
            Ok(request) => request,
            Err(rejection) => return (session, run.reject(rejection.into())),
        };

        let destination = request.destination().unwrap_or_default();
        let Some(city) = cities.find(destination) else {
            let error = PlannerError::Session(format!(
                "{destination} is not one of the recommended cities ({})",
                cities.names().join(", ")
            ));
            return (session, run.reject(error));
        };

        let prompt = travel_plan_prompt(&request, Some(city));
        let response = self
            .invoker
            .invoke(AgentRole::TravelPlanningExpert, &prompt)
            .await;
        run.advance(PipelineState::AgentInvoked);
        let response = match response {
            Ok(response) => response,
            Err(error) => return (session, run.reject(error)),
        };

        run.advance(PipelineState::ParseAttempted);
        let context = ValidationContext {
            budget_ceiling: request.budget_ceiling(),
        };
        let outcome = self
            .validator()
            .with_context(context)
            .validate_and_repair(&response, ExpectedShape::TravelPlan);
        run.advance(outcome.state());

        let (result, error) = outcome.into_parts();
        let session = match result.as_ref().and_then(ValidatedOutput::as_plan) {
            Some(plan) => session.with_plan(plan.clone()),
            None => session,
        };
        (session, run.finish(result, error.map(PlannerError::from)))
    }
}
