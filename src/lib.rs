//! trip-planner-rs: guardrails around a two-step, LLM-driven travel planner
//!
//! A traveller's request is validated, handed to a role-specific agent that
//! may call provider tools (weather, events, budget and so on), and the
//! agent's text is parsed, shape-checked, checked against business rules
//! and sanitized before anyone sees it. Malformed city lists are replaced
//! by a fixed fallback list; provider failures degrade to default data.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner_rs::{Agent, Planner, SessionState, TripFields};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let planner = Planner::new(Agent::from_env()?);
//!
//!     let fields = TripFields {
//!         budget: Some(3000.0),
//!         duration: Some(7),
//!         preferences: Some(vec!["Beach".into(), "Food".into()]),
//!         ..TripFields::default()
//!     };
//!
//!     let (session, report) = planner.select_cities(SessionState::new(), &fields).await;
//!     println!("{}", report.replay());
//!     if let Some(cities) = &session.selected_cities {
//!         println!("{:?}", cities.names());
//!     }
//!     Ok(())
//! }
//! ```

extern crate self as trip_planner_rs;

pub mod config;
pub mod core;
pub mod error;
pub mod guardrails;
pub mod schemas;
pub mod services;
pub mod tools;
pub mod types;

pub use config::{FallbackPolicy, PlannerConfig, ProviderConfig};
pub use core::{Agent, AgentInvoker, AgentRole, Planner, PlanningStep, SessionState};
pub use error::{PlannerError, Result};
pub use guardrails::{ExpectedShape, OutputValidator, RepairOutcome};
pub use schemas::{schema_type_name, CompletionSchema, SchemaHandle};
pub use tools::{FunctionFactory, ProviderClient, Tool};
pub use trip_planner_macros::{completion_schema, tool};
pub use types::{
    AgentResponse, CityRecommendationSet, PipelineState, StepReport, TravelPlan, TripFields,
    TripRequest, ValidatedOutput,
};

#[cfg(feature = "cli")]
pub mod cli;
