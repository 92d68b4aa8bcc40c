//! How well a candidate city fits the traveller, as a score in [0, 1].

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use crate::types::travel::{CityRecommendation, Interest, Season};

const PER_KEYWORD: f64 = 0.1;
const BUDGET_WEIGHT: f64 = 0.3;

fn interest_keywords(interest: Interest) -> &'static [&'static str] {
    match interest {
        Interest::Beach => &["coastal", "beach", "seaside", "ocean"],
        Interest::Mountains => &["mountain", "hiking", "skiing", "alpine"],
        Interest::CityLife => &["urban", "metropolitan", "city", "downtown"],
        Interest::Culture => &["museum", "art", "history", "cultural", "heritage"],
        Interest::Food => &["cuisine", "restaurant", "gastronomy", "culinary"],
        Interest::Adventure => &["adventure", "outdoor", "sports", "activities"],
        Interest::Relaxation => &["spa", "wellness", "peaceful", "tranquil"],
        Interest::Nightlife => &["nightlife", "entertainment", "bars", "clubs"],
    }
}

fn season_keywords(season: Season) -> &'static [&'static str] {
    match season {
        Season::Spring => &["mild", "spring", "pleasant", "temperate"],
        Season::Summer => &["hot", "summer", "warm", "sunny"],
        Season::Fall => &["autumn", "fall", "cool", "mild"],
        Season::Winter => &["cold", "winter", "snow", "chilly"],
    }
}

/// Keyword hits in the description for each preference and the season,
/// plus up to 0.3 for the daily cost against the daily budget, clamped to
/// [0, 1]. Unknown preference or season labels score nothing.
pub fn calculate_match_score<S: AsRef<str>>(
    city: &CityRecommendation,
    preferences: &[S],
    budget: f64,
    season: &str,
) -> f64 {
    let description = city.description.to_lowercase();
    let hits = |keywords: &[&str]| {
        keywords
            .iter()
            .filter(|keyword| description.contains(*keyword))
            .count() as f64
    };

    let mut score: f64 = preferences
        .iter()
        .filter_map(|label| Interest::from_label(label.as_ref()))
        .map(|interest| PER_KEYWORD * hits(interest_keywords(interest)))
        .sum();

    let daily_cost = city.estimated_cost.total_per_day;
    if daily_cost <= budget {
        score += BUDGET_WEIGHT;
    } else if budget > 0.0 {
        let overrun = (daily_cost - budget) / budget;
        score += (BUDGET_WEIGHT * (1.0 - overrun)).max(0.0);
    }

    if let Some(season) = Season::from_label(season) {
        score += PER_KEYWORD * hits(season_keywords(season));
    }

    score.clamp(0.0, 1.0)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MatchScoreParams {
    pub city: CityRecommendation,
    /// Interest labels, e.g. "Beach", "Culture"
    pub preferences: Vec<String>,
    /// Daily budget in USD
    pub budget: f64,
    /// Spring, Summer, Fall or Winter
    pub season: String,
}

crate::tool!(
    name = "calculate_match_score",
    description = "Score from 0 to 1 for how well a city matches preferences, daily budget and season",
    params = MatchScoreParams,
    |params: MatchScoreParams| async move {
        let score = calculate_match_score(
            &params.city,
            &params.preferences,
            params.budget,
            &params.season,
        );
        Ok::<_, String>(json!({
            "city": params.city.name,
            "match_score": score
        }))
    }
);
