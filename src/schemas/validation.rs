use crate::schemas::SchemaHandle;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use tracing::debug;

const MAX_SCHEMA_ERRORS: usize = 3;

/// Validate a payload against a schema handle (draft 7).
///
/// On failure returns a one-line summary of the first few violations, each
/// prefixed with its instance path (`<root>` for the document itself).
pub fn validate_structured_payload(
    schema: &SchemaHandle,
    payload: &Value,
) -> std::result::Result<(), String> {
    let validator = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema.schema_json())
        .map_err(|err| {
            format!(
                "failed to prepare `{}` schema for validation: {}",
                schema.schema_name(),
                err
            )
        })?;

    if let Err(errors) = validator.validate(payload) {
        let mut details = Vec::new();
        let mut truncated = false;

        for (idx, error) in errors.enumerate() {
            if idx < MAX_SCHEMA_ERRORS {
                let mut path = error.instance_path.to_string();
                if path.is_empty() {
                    path = "<root>".to_string();
                }
                details.push(format!("{}: {}", path, error));
            } else {
                truncated = true;
                break;
            }
        }

        let mut detail_str = if details.is_empty() {
            "payload failed schema validation".to_string()
        } else {
            details.join("; ")
        };

        if truncated {
            detail_str.push_str("; additional errors truncated");
        }

        debug!(
            target: "trip_planner::schema",
            schema = schema.schema_name(),
            detail = %detail_str
        );

        return Err(format!(
            "does not match `{}` schema: {}",
            schema.schema_name(),
            detail_str
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::CompletionSchema;
    use crate::types::travel::CityRecommendationSet;
    use serde_json::json;

    fn city(match_score: Value, total_per_day: Value) -> Value {
        json!({
            "recommended_cities": [{
                "name": "Porto",
                "country": "Portugal",
                "description": "River city",
                "match_score": match_score,
                "highlights": ["Ribeira"],
                "estimated_cost": {
                    "accommodation": 70,
                    "food": 30,
                    "activities": 20,
                    "total_per_day": total_per_day
                }
            }]
        })
    }

    #[test]
    fn accepts_integer_and_float_numbers() {
        let schema = CityRecommendationSet::schema();
        assert!(validate_structured_payload(schema, &city(json!(1), json!(120.5))).is_ok());
    }

    #[test]
    fn reports_path_of_non_numeric_score() {
        let schema = CityRecommendationSet::schema();
        let err = validate_structured_payload(schema, &city(json!("high"), json!(120)))
            .unwrap_err();
        assert!(err.contains("/recommended_cities/0/match_score"), "{err}");
    }

    #[test]
    fn rejects_negative_costs() {
        let schema = CityRecommendationSet::schema();
        let err =
            validate_structured_payload(schema, &city(json!(0.8), json!(-5))).unwrap_err();
        assert!(err.contains("total_per_day"), "{err}");
    }
}
