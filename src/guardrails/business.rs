use thiserror::Error;
use tracing::debug;

use crate::types::travel::{BudgetBreakdown, DayPlan, TravelPlan};

/// Allowed overrun relative to the declared budget.
pub const BUDGET_SLACK: f64 = 1.1;
/// Largest difference between `total` and the sum of its parts that still
/// counts as equal (half a cent).
pub const TOTAL_TOLERANCE: f64 = 0.005;

/// Facts from the request that output rules are checked against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValidationContext {
    /// Spend ceiling for the whole trip, if the traveller declared a budget.
    pub budget_ceiling: Option<f64>,
}

impl ValidationContext {
    pub fn with_budget_ceiling(budget: f64) -> Self {
        Self {
            budget_ceiling: Some(budget),
        }
    }
}

/// A structurally valid plan that breaks a cross-field rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BusinessViolation {
    #[error("Total must equal sum of all costs (expected {expected:.2}, got {actual:.2})")]
    TotalMismatch { expected: f64, actual: f64 },

    #[error("Costs exceed budget constraints ({total:.2} is more than 110% of {budget:.2})")]
    BudgetExceeded { total: f64, budget: f64 },

    #[error("Activities on day {day} exceed time constraints")]
    TimeConflict { day: u32 },
}

/// Whether `total_cost` stays within the budget plus 10%.
pub fn validate_budget_constraints(budget: f64, total_cost: f64) -> bool {
    total_cost <= budget * BUDGET_SLACK
}

/// `total` must equal the sum of the other four categories.
pub fn check_breakdown_total(breakdown: &BudgetBreakdown) -> Result<(), BusinessViolation> {
    let expected = breakdown.parts_sum();
    if (breakdown.total - expected).abs() > TOTAL_TOLERANCE {
        return Err(BusinessViolation::TotalMismatch {
            expected,
            actual: breakdown.total,
        });
    }
    Ok(())
}

/// Scheduling check for the day's activities.
///
/// Always passes: activity `time`/`duration` are free text today.
// TODO: parse `time` and `duration` and report overlapping activity windows per day.
pub fn check_time_constraints(itinerary: &[DayPlan]) -> Result<(), BusinessViolation> {
    let scheduled = itinerary
        .iter()
        .flat_map(|day| &day.activities)
        .filter(|activity| !activity.time.is_empty())
        .count();
    debug!(
        target: "trip_planner::guardrails",
        scheduled,
        "time constraint check skipped"
    );
    Ok(())
}

/// All cross-field rules for a travel plan, in order: breakdown total,
/// budget ceiling (when the context has one), then scheduling.
pub fn validate_business_rules(
    plan: &TravelPlan,
    context: &ValidationContext,
) -> Result<(), BusinessViolation> {
    check_breakdown_total(&plan.budget_breakdown)?;

    if let Some(budget) = context.budget_ceiling {
        let total = plan.budget_breakdown.total;
        if !validate_budget_constraints(budget, total) {
            return Err(BusinessViolation::BudgetExceeded { total, budget });
        }
    }

    if plan.itinerary.iter().any(|day| !day.activities.is_empty()) {
        check_time_constraints(&plan.itinerary)?;
    }

    Ok(())
}
