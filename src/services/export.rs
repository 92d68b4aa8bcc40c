//! Travel plan export: indented JSON, or one CSV row per activity.

use crate::{error::Result, types::travel::TravelPlan};

pub const CSV_HEADER: [&str; 7] = ["Day", "Date", "Time", "Activity", "Location", "Duration", "Cost"];

/// Export formats offered to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{other}' (expected json or csv)")),
        }
    }
}

pub fn export(plan: &TravelPlan, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(plan),
        ExportFormat::Csv => Ok(to_csv(plan)),
    }
}

/// The plan as 2-space indented JSON.
pub fn to_json(plan: &TravelPlan) -> Result<String> {
    Ok(serde_json::to_string_pretty(plan)?)
}

/// Flatten the itinerary to CSV, CRLF line endings, fields quoted when they
/// contain a comma, quote or line break.
pub fn to_csv(plan: &TravelPlan) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER);

    for day in &plan.itinerary {
        let day_number = day.day.to_string();
        for activity in &day.activities {
            let cost = activity.cost.to_string();
            push_row(
                &mut out,
                [
                    day_number.as_str(),
                    day.date.as_str(),
                    activity.time.as_str(),
                    activity.activity.as_str(),
                    activity.location.as_str(),
                    activity.duration.as_str(),
                    cost.as_str(),
                ],
            );
        }
    }
    out
}

fn push_row<const N: usize>(out: &mut String, fields: [&str; N]) {
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        std::borrow::Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        std::borrow::Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::travel::{Activity, BudgetBreakdown, DayPlan};

    fn plan() -> TravelPlan {
        TravelPlan {
            itinerary: vec![DayPlan {
                day: 1,
                date: "2026-04-01".into(),
                activities: vec![
                    Activity {
                        time: "09:00".into(),
                        activity: "Belém Tower".into(),
                        description: "Riverside fortress".into(),
                        location: "Belém, Lisbon".into(),
                        duration: "2 hours".into(),
                        cost: 6.0,
                    },
                    Activity {
                        time: "14:00".into(),
                        activity: "Say \"olá\"".into(),
                        description: String::new(),
                        location: "Alfama".into(),
                        duration: "1 hour".into(),
                        cost: 0.5,
                    },
                ],
                meals: vec![],
            }],
            budget_breakdown: BudgetBreakdown {
                accommodation: 100.0,
                food: 50.0,
                activities: 6.5,
                transportation: 20.0,
                total: 176.5,
            },
            recommendations: vec!["Wear comfortable shoes".into()],
            destination: None,
        }
    }

    #[test]
    fn csv_has_one_row_per_activity() {
        let csv = to_csv(&plan());
        let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Day,Date,Time,Activity,Location,Duration,Cost");
        assert_eq!(lines[1], "1,2026-04-01,09:00,Belém Tower,\"Belém, Lisbon\",2 hours,6");
        assert_eq!(lines[2], "1,2026-04-01,14:00,\"Say \"\"olá\"\"\",Alfama,1 hour,0.5");
    }

    #[test]
    fn json_uses_field_names_and_indentation() {
        let json = to_json(&plan()).unwrap();
        assert!(json.contains("\n  \"itinerary\": ["));
        assert!(json.contains("\"budget_breakdown\""));
        assert!(!json.contains("\"destination\""));
        let parsed: TravelPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, plan());
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
