//! Turns raw agent text into a checked, sanitized result.
//!
//! Stages run in a fixed order and the first failure ends the check:
//! parse, top-level shape, per-item structure, JSON schema, typed decode,
//! business rules (travel plans), description sanitization, then the
//! sensitive-content scan over the whole serialized result.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    config::FallbackPolicy,
    guardrails::{
        business::{validate_business_rules, BusinessViolation, ValidationContext},
        fallback::fallback_city_recommendations,
        safety::find_sensitive_keyword,
        sanitize::sanitize_description,
    },
    schemas::{validation::validate_structured_payload, CompletionSchema, SchemaHandle},
    types::{
        deserialize_structured_response, AgentResponse, CityRecommendationSet, PipelineState,
        TravelPlan, ValidatedOutput,
    },
};

const CITY_FIELDS: &[&str] = &[
    "name",
    "country",
    "description",
    "match_score",
    "highlights",
    "estimated_cost",
];
const COST_FIELDS: &[&str] = &["accommodation", "food", "activities", "total_per_day"];
const PLAN_FIELDS: &[&str] = &["itinerary", "budget_breakdown", "recommendations"];
const DAY_FIELDS: &[&str] = &["day", "date", "activities", "meals"];
const BREAKDOWN_FIELDS: &[&str] = &[
    "accommodation",
    "food",
    "activities",
    "transportation",
    "total",
];

/// Which document the agent was asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedShape {
    CityList,
    TravelPlan,
}

impl ExpectedShape {
    pub fn schema(&self) -> &'static SchemaHandle {
        match self {
            ExpectedShape::CityList => CityRecommendationSet::schema(),
            ExpectedShape::TravelPlan => TravelPlan::schema(),
        }
    }
}

/// JSON that parsed but is missing keys or has the wrong structure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeViolation {
    #[error("Invalid response format: expected a JSON object")]
    NotAnObject,

    #[error("Invalid response format: missing {}", quoted(.0))]
    MissingKeys(Vec<String>),

    #[error("Invalid response format: '{field}' should be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("City {index} is missing required fields: {}", quoted(.fields))]
    CityMissingFields { index: usize, fields: Vec<String> },

    #[error("City {index}: 'estimated_cost' should be an object")]
    CostNotAnObject { index: usize },

    #[error("City {index}: 'estimated_cost' is missing fields: {}", quoted(.fields))]
    CostMissingFields { index: usize, fields: Vec<String> },

    #[error("Day {index} is missing required fields: {}", quoted(.fields))]
    DayMissingFields { index: usize, fields: Vec<String> },

    #[error("'budget_breakdown' is missing fields: {}", quoted(.fields))]
    BreakdownMissingFields { fields: Vec<String> },

    #[error("Invalid response format: {0}")]
    Schema(String),
}

fn quoted(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| format!("'{field}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Coarse category of an output failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputErrorKind {
    Parse,
    Shape,
    BusinessRule,
    SensitiveContent,
}

impl OutputErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            OutputErrorKind::Parse => "PARSE_ERROR",
            OutputErrorKind::Shape => "SHAPE_VIOLATION",
            OutputErrorKind::BusinessRule => "BUSINESS_RULE_VIOLATION",
            OutputErrorKind::SensitiveContent => "SENSITIVE_CONTENT",
        }
    }
}

/// Why an agent output could not be accepted.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OutputError {
    #[error("Invalid JSON response from the AI: {message}")]
    Parse { message: String },

    #[error(transparent)]
    Shape(#[from] ShapeViolation),

    #[error(transparent)]
    BusinessRule(#[from] BusinessViolation),

    #[error("Output contains sensitive content")]
    SensitiveContent { keyword: &'static str },
}

impl OutputError {
    pub fn kind(&self) -> OutputErrorKind {
        match self {
            OutputError::Parse { .. } => OutputErrorKind::Parse,
            OutputError::Shape(_) => OutputErrorKind::Shape,
            OutputError::BusinessRule(_) => OutputErrorKind::BusinessRule,
            OutputError::SensitiveContent { .. } => OutputErrorKind::SensitiveContent,
        }
    }

    /// Format and rule failures may clear up on another agent call; a content
    /// policy hit is not worth retrying automatically.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OutputError::SensitiveContent { .. })
    }
}

/// Result of [`OutputValidator::validate_and_repair`].
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    Valid(ValidatedOutput),
    /// Degraded but usable: the fixed fallback plus the error that caused it.
    FallbackSubstituted {
        result: ValidatedOutput,
        error: OutputError,
    },
    InvalidReported(OutputError),
}

impl RepairOutcome {
    pub fn state(&self) -> PipelineState {
        match self {
            RepairOutcome::Valid(_) => PipelineState::Valid,
            RepairOutcome::FallbackSubstituted { .. } => PipelineState::FallbackSubstituted,
            RepairOutcome::InvalidReported(_) => PipelineState::InvalidReported,
        }
    }

    pub fn result(&self) -> Option<&ValidatedOutput> {
        match self {
            RepairOutcome::Valid(result) | RepairOutcome::FallbackSubstituted { result, .. } => {
                Some(result)
            }
            RepairOutcome::InvalidReported(_) => None,
        }
    }

    pub fn error(&self) -> Option<&OutputError> {
        match self {
            RepairOutcome::Valid(_) => None,
            RepairOutcome::FallbackSubstituted { error, .. }
            | RepairOutcome::InvalidReported(error) => Some(error),
        }
    }

    pub fn into_parts(self) -> (Option<ValidatedOutput>, Option<OutputError>) {
        match self {
            RepairOutcome::Valid(result) => (Some(result), None),
            RepairOutcome::FallbackSubstituted { result, error } => (Some(result), Some(error)),
            RepairOutcome::InvalidReported(error) => (None, Some(error)),
        }
    }
}

/// Validate with the default policy (fallback on parse failure only) and no
/// budget ceiling.
pub fn validate_and_repair(response: &AgentResponse, shape: ExpectedShape) -> RepairOutcome {
    OutputValidator::new().validate_and_repair(response, shape)
}

/// Output checks plus the fallback decision.
#[derive(Debug, Clone, Default)]
pub struct OutputValidator {
    fallback_policy: FallbackPolicy,
    context: ValidationContext,
}

impl OutputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }

    pub fn with_context(mut self, context: ValidationContext) -> Self {
        self.context = context;
        self
    }

    /// Extract, check and, for city lists, fall back when allowed.
    pub fn validate_and_repair(
        &self,
        response: &AgentResponse,
        shape: ExpectedShape,
    ) -> RepairOutcome {
        let text = response.extract_text();

        match self.validate(&text, shape) {
            Ok(result) => {
                info!(target: "trip_planner::guardrails", ?shape, "agent output accepted");
                RepairOutcome::Valid(result)
            }
            Err(error) if self.may_fall_back(shape, &error) => {
                warn!(
                    target: "trip_planner::guardrails",
                    ?shape,
                    %error,
                    "substituting fallback city list"
                );
                RepairOutcome::FallbackSubstituted {
                    result: ValidatedOutput::Cities(fallback_city_recommendations()),
                    error,
                }
            }
            Err(error) => {
                warn!(target: "trip_planner::guardrails", ?shape, %error, "agent output rejected");
                RepairOutcome::InvalidReported(error)
            }
        }
    }

    fn may_fall_back(&self, shape: ExpectedShape, error: &OutputError) -> bool {
        if shape != ExpectedShape::CityList {
            return false;
        }
        match self.fallback_policy {
            FallbackPolicy::OnParseFailure => matches!(error, OutputError::Parse { .. }),
            FallbackPolicy::OnAnyFailure => true,
            FallbackPolicy::Never => false,
        }
    }

    /// Run every check on already-extracted text, with no fallback.
    pub fn validate(&self, text: &str, shape: ExpectedShape) -> Result<ValidatedOutput, OutputError> {
        let document: Value = serde_json::from_str(text).map_err(|err| OutputError::Parse {
            message: err.to_string(),
        })?;

        let result = match shape {
            ExpectedShape::CityList => {
                check_city_list_shape(&document)?;
                let mut cities: CityRecommendationSet = decode(&document, shape)?;
                for city in &mut cities.recommended_cities {
                    city.description = sanitize_description(&city.description);
                }
                ValidatedOutput::Cities(cities)
            }
            ExpectedShape::TravelPlan => {
                check_travel_plan_shape(&document)?;
                let mut plan: TravelPlan = decode(&document, shape)?;
                validate_business_rules(&plan, &self.context)?;
                for activity in plan.itinerary.iter_mut().flat_map(|day| &mut day.activities) {
                    activity.description = sanitize_description(&activity.description);
                }
                ValidatedOutput::Plan(plan)
            }
        };

        // Scan the whole document, including keys the typed result drops.
        let serialized = serde_json::to_string(&sanitized_document(document, shape))
            .map_err(|err| OutputError::Parse {
                message: err.to_string(),
            })?;
        if let Some(keyword) = find_sensitive_keyword(&serialized) {
            debug!(target: "trip_planner::guardrails", keyword, "denylisted keyword in output");
            return Err(OutputError::SensitiveContent { keyword });
        }

        Ok(result)
    }
}

/// The parsed document with the same description fields sanitized as in the
/// typed result.
fn sanitized_document(mut document: Value, shape: ExpectedShape) -> Value {
    let (list, nested) = match shape {
        ExpectedShape::CityList => ("recommended_cities", None),
        ExpectedShape::TravelPlan => ("itinerary", Some("activities")),
    };
    let entries = document
        .get_mut(list)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten();
    let targets: Vec<&mut Value> = match nested {
        None => entries.collect(),
        Some(key) => entries
            .filter_map(|entry| entry.get_mut(key).and_then(Value::as_array_mut))
            .flatten()
            .collect(),
    };
    for target in targets {
        if let Some(Value::String(description)) = target.get_mut("description") {
            *description = sanitize_description(description);
        }
    }
    document
}

/// Strict schema check, then typed decode.
fn decode<T: CompletionSchema>(document: &Value, shape: ExpectedShape) -> Result<T, ShapeViolation> {
    validate_structured_payload(shape.schema(), document).map_err(ShapeViolation::Schema)?;
    deserialize_structured_response::<T>(document).map_err(ShapeViolation::Schema)
}

fn missing_keys(object: &Map<String, Value>, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|key| !object.contains_key(**key))
        .map(|key| key.to_string())
        .collect()
}

fn wrong_type(field: impl Into<String>, expected: &'static str) -> ShapeViolation {
    ShapeViolation::WrongType {
        field: field.into(),
        expected,
    }
}

/// Keyed mapping with a `recommended_cities` list whose entries carry every
/// city field and a complete `estimated_cost` mapping. City indexes in
/// violations are 1-based.
pub fn check_city_list_shape(document: &Value) -> Result<(), ShapeViolation> {
    let root = document.as_object().ok_or(ShapeViolation::NotAnObject)?;
    let cities = root
        .get("recommended_cities")
        .ok_or_else(|| ShapeViolation::MissingKeys(vec!["recommended_cities".to_string()]))?
        .as_array()
        .ok_or_else(|| wrong_type("recommended_cities", "a list"))?;

    for (idx, city) in cities.iter().enumerate() {
        let index = idx + 1;
        let city = city
            .as_object()
            .ok_or_else(|| wrong_type(format!("recommended_cities[{idx}]"), "an object"))?;

        let fields = missing_keys(city, CITY_FIELDS);
        if !fields.is_empty() {
            return Err(ShapeViolation::CityMissingFields { index, fields });
        }

        let cost = city
            .get("estimated_cost")
            .and_then(Value::as_object)
            .ok_or(ShapeViolation::CostNotAnObject { index })?;

        let fields = missing_keys(cost, COST_FIELDS);
        if !fields.is_empty() {
            return Err(ShapeViolation::CostMissingFields { index, fields });
        }
    }

    Ok(())
}

/// Keyed mapping with an itinerary of complete days, a complete budget
/// breakdown and a recommendations list. Day indexes are 1-based.
pub fn check_travel_plan_shape(document: &Value) -> Result<(), ShapeViolation> {
    let root = document.as_object().ok_or(ShapeViolation::NotAnObject)?;

    let missing = missing_keys(root, PLAN_FIELDS);
    if !missing.is_empty() {
        return Err(ShapeViolation::MissingKeys(missing));
    }

    let itinerary = root["itinerary"]
        .as_array()
        .ok_or_else(|| wrong_type("itinerary", "a list"))?;
    for (idx, day) in itinerary.iter().enumerate() {
        let day = day
            .as_object()
            .ok_or_else(|| wrong_type(format!("itinerary[{idx}]"), "an object"))?;
        let fields = missing_keys(day, DAY_FIELDS);
        if !fields.is_empty() {
            return Err(ShapeViolation::DayMissingFields {
                index: idx + 1,
                fields,
            });
        }
    }

    let breakdown = root["budget_breakdown"]
        .as_object()
        .ok_or_else(|| wrong_type("budget_breakdown", "an object"))?;
    let fields = missing_keys(breakdown, BREAKDOWN_FIELDS);
    if !fields.is_empty() {
        return Err(ShapeViolation::BreakdownMissingFields { fields });
    }

    if !root["recommendations"].is_array() {
        return Err(wrong_type("recommendations", "a list"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_root_is_not_an_object() {
        assert_eq!(
            check_city_list_shape(&json!([1, 2])),
            Err(ShapeViolation::NotAnObject)
        );
    }

    #[test]
    fn reports_every_missing_city_field() {
        let document = json!({"recommended_cities": [
            {"name": "Oslo", "country": "Norway", "description": "Fjords", "match_score": 0.5,
             "highlights": [], "estimated_cost": {"accommodation": 1, "food": 1, "activities": 1, "total_per_day": 3}},
            {"name": "Rome"}
        ]});

        let err = check_city_list_shape(&document).unwrap_err();
        assert_eq!(
            err,
            ShapeViolation::CityMissingFields {
                index: 2,
                fields: vec![
                    "country".into(),
                    "description".into(),
                    "match_score".into(),
                    "highlights".into(),
                    "estimated_cost".into()
                ]
            }
        );
        assert!(err.to_string().starts_with("City 2 is missing required fields: 'country'"));
    }

    #[test]
    fn cost_must_be_a_mapping() {
        let document = json!({"recommended_cities": [
            {"name": "Oslo", "country": "Norway", "description": "Fjords", "match_score": 0.5,
             "highlights": [], "estimated_cost": 120}
        ]});
        assert_eq!(
            check_city_list_shape(&document),
            Err(ShapeViolation::CostNotAnObject { index: 1 })
        );
    }

    #[test]
    fn plan_lists_all_missing_top_level_keys() {
        assert_eq!(
            check_travel_plan_shape(&json!({"itinerary": []})),
            Err(ShapeViolation::MissingKeys(vec![
                "budget_breakdown".into(),
                "recommendations".into()
            ]))
        );
    }

    #[test]
    fn error_kinds_map_to_codes() {
        let err = OutputError::from(ShapeViolation::NotAnObject);
        assert_eq!(err.kind(), OutputErrorKind::Shape);
        assert_eq!(err.kind().error_code(), "SHAPE_VIOLATION");
        assert!(!OutputError::SensitiveContent { keyword: "drugs" }.is_retryable());
    }

    #[test]
    fn sanitized_document_keeps_unknown_keys() {
        let document = json!({
            "note": "Extra <b>key</b>",
            "itinerary": [{"activities": [{"description": "Go <i>now</i>!", "tip": "http://x.co"}]}]
        });

        let sanitized = sanitized_document(document, ExpectedShape::TravelPlan);
        assert_eq!(sanitized["itinerary"][0]["activities"][0]["description"], "Go now");
        assert_eq!(sanitized["itinerary"][0]["activities"][0]["tip"], "http://x.co");
        assert_eq!(sanitized["note"], "Extra <b>key</b>");
    }
}
