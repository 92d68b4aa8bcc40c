pub mod agent;
pub mod planner;
pub mod session;

pub use agent::{Agent, AgentInvoker, AgentRole};
pub use planner::Planner;
pub use session::{PlanningStep, SessionState};
