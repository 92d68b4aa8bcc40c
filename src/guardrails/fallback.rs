use serde_json::{json, Value};

use crate::types::travel::{CityRecommendation, CityRecommendationSet, EstimatedCost};

/// The fixed one-city document substituted when a city list cannot be used.
pub fn fallback_city_document() -> Value {
    json!({
        "recommended_cities": [
            {
                "name": "Barcelona",
                "country": "Spain",
                "description": "A vibrant city known for its beaches and rich cultural heritage.",
                "match_score": 0.9,
                "highlights": ["Sagrada Familia", "Beach", "Local Cuisine"],
                "estimated_cost": {
                    "accommodation": 80,
                    "food": 40,
                    "activities": 30,
                    "total_per_day": 150
                }
            }
        ]
    })
}

/// Typed form of [`fallback_city_document`].
pub fn fallback_city_recommendations() -> CityRecommendationSet {
    CityRecommendationSet {
        recommended_cities: vec![CityRecommendation {
            name: "Barcelona".to_string(),
            country: "Spain".to_string(),
            description: "A vibrant city known for its beaches and rich cultural heritage."
                .to_string(),
            match_score: 0.9,
            highlights: vec![
                "Sagrada Familia".to_string(),
                "Beach".to_string(),
                "Local Cuisine".to_string(),
            ],
            estimated_cost: EstimatedCost {
                accommodation: 80.0,
                food: 40.0,
                activities: 30.0,
                total_per_day: 150.0,
            },
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_and_typed_fallback_agree() {
        let parsed: CityRecommendationSet =
            serde_json::from_value(fallback_city_document()).unwrap();
        assert_eq!(parsed, fallback_city_recommendations());
    }
}
