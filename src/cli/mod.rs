use crate::{
    config::{FallbackPolicy, PlannerConfig},
    error::PlannerError,
    guardrails::{validate_input_on, ExpectedShape, InputVerdict, OutputValidator, ValidationContext},
    services::export::{export, ExportFormat},
    tools::calculator::evaluate,
    types::{AgentResponse, CityRecommendationSet, TravelPlan, TripFields},
    Agent, Planner, SessionState,
};
use anyhow::{anyhow, Context};
use chrono::{Local, NaiveDate};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{fs, io::Read, time::Duration};
use tracing::{error, info};

fn file_arg(help: &'static str) -> Arg {
    Arg::new("file").help(help).value_name("FILE").index(1)
}

/// One flag per trip field; values given here override the JSON file.
fn trip_field_args() -> Vec<Arg> {
    let single = |id: &'static str, value: &'static str, help: &'static str| {
        Arg::new(id).long(id).value_name(value).help(help)
    };
    let repeated = |id: &'static str, value: &'static str, help: &'static str| {
        Arg::new(id)
            .long(id)
            .value_name(value)
            .help(help)
            .action(ArgAction::Append)
    };

    vec![
        single("origin", "CITY", "Departure city"),
        single("destination", "CITY", "Destination city"),
        single("start-date", "YYYY-MM-DD", "First day of the trip"),
        single("end-date", "YYYY-MM-DD", "Last day of the trip"),
        single("budget", "USD", "Daily budget"),
        single("duration", "DAYS", "Trip length in days"),
        repeated("preference", "INTEREST", "Interest such as Beach or Culture (repeatable)"),
        repeated("activity", "ACTIVITY", "Activity such as Museums (repeatable)"),
        single("accommodation", "TIER", "Budget, Mid-range or Luxury"),
        single("season", "SEASON", "Spring, Summer, Fall or Winter"),
    ]
}

fn command() -> Command {
    Command::new("trip-planner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Guardrailed travel planning: validate trip input, check agent output, plan trips")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("validate-input")
                .about("Check trip fields against the input rules")
                .arg(file_arg("Trip fields as JSON ('-' for stdin)"))
                .args(trip_field_args())
                .arg(
                    Arg::new("today")
                        .long("today")
                        .value_name("YYYY-MM-DD")
                        .help("Date that trip dates are compared with (defaults to today)"),
                ),
        )
        .subcommand(
            Command::new("validate-output")
                .about("Parse, check and repair raw agent output")
                .arg(file_arg("Raw agent output ('-' for stdin)").default_value("-"))
                .arg(
                    Arg::new("shape")
                        .short('s')
                        .long("shape")
                        .value_name("SHAPE")
                        .help("Expected document: city-list or travel-plan")
                        .default_value("city-list"),
                )
                .arg(
                    Arg::new("budget")
                        .short('b')
                        .long("budget")
                        .value_name("USD")
                        .help("Trip budget; plan totals may exceed it by at most 10%"),
                )
                .arg(
                    Arg::new("fallback")
                        .long("fallback")
                        .value_name("POLICY")
                        .help("When to substitute the fallback city list: parse, any or never")
                        .default_value("parse"),
                ),
        )
        .subcommand(
            Command::new("calc")
                .about("Evaluate an arithmetic expression")
                .arg(
                    Arg::new("expression")
                        .help("Expression using + - * / and parentheses")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Export a travel plan")
                .arg(file_arg("Travel plan as JSON ('-' for stdin)").default_value("-"))
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_name("FORMAT")
                        .help("json or csv")
                        .default_value("json"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Run city selection, then travel planning when a destination is given")
                .arg(file_arg("Trip fields as JSON ('-' for stdin)"))
                .args(trip_field_args())
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .value_name("MODEL")
                        .help("Chat model to use (or set OPENAI_MODEL)"),
                )
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .value_name("SECONDS")
                        .help("Request timeout in seconds")
                        .default_value("120"),
                )
                .arg(
                    Arg::new("max-iterations")
                        .short('i')
                        .long("max-iterations")
                        .value_name("COUNT")
                        .help("Maximum agent turns per step")
                        .default_value("10"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the final session as JSON instead of the step replays"),
                ),
        )
}

/// CLI entry point. Returns whether the command produced a usable result.
pub async fn run() -> anyhow::Result<bool> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let matches = command().get_matches();
    match matches.subcommand() {
        Some(("validate-input", sub)) => validate_input_cmd(sub),
        Some(("validate-output", sub)) => validate_output_cmd(sub),
        Some(("calc", sub)) => calc_cmd(sub),
        Some(("export", sub)) => export_cmd(sub),
        Some(("plan", sub)) => plan_cmd(sub).await,
        _ => Err(anyhow!("unknown subcommand")),
    }
}

fn read_source(path: &str) -> anyhow::Result<String> {
    if path == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
    }
}

fn read_file_arg(matches: &ArgMatches) -> anyhow::Result<String> {
    let path = matches
        .get_one::<String>("file")
        .map(String::as_str)
        .unwrap_or("-");
    read_source(path)
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> anyhow::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    matches
        .get_one::<String>(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|err| anyhow!("invalid --{name} '{raw}': {err}"))
        })
        .transpose()
}

/// Trip fields from the optional JSON file, overridden by field flags.
fn trip_fields(matches: &ArgMatches) -> anyhow::Result<TripFields> {
    let mut fields = match matches.get_one::<String>("file") {
        Some(path) => serde_json::from_str(&read_source(path)?)
            .context("trip fields must be a JSON object")?,
        None => TripFields::default(),
    };

    let text = |name: &str| matches.get_one::<String>(name).cloned();
    let list = |name: &str| {
        matches
            .get_many::<String>(name)
            .map(|values| values.cloned().collect::<Vec<_>>())
    };

    fields.origin = text("origin").or(fields.origin);
    fields.destination = text("destination").or(fields.destination);
    fields.start_date = text("start-date").or(fields.start_date);
    fields.end_date = text("end-date").or(fields.end_date);
    fields.accommodation = text("accommodation").or(fields.accommodation);
    fields.season = text("season").or(fields.season);
    fields.preferences = list("preference").or(fields.preferences);
    fields.activities = list("activity").or(fields.activities);
    fields.budget = parse_arg::<f64>(matches, "budget")?.or(fields.budget);
    fields.duration = parse_arg::<i64>(matches, "duration")?.or(fields.duration);

    Ok(fields)
}

fn validate_input_cmd(matches: &ArgMatches) -> anyhow::Result<bool> {
    let fields = trip_fields(matches)?;
    let today =
        parse_arg::<NaiveDate>(matches, "today")?.unwrap_or_else(|| Local::now().date_naive());

    let verdict = InputVerdict::from(validate_input_on(&fields, today));
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(verdict.accepted)
}

fn validate_output_cmd(matches: &ArgMatches) -> anyhow::Result<bool> {
    let raw = read_file_arg(matches)?;
    let shape = match matches.get_one::<String>("shape").map(String::as_str) {
        Some("city-list") | Some("cities") | None => ExpectedShape::CityList,
        Some("travel-plan") | Some("plan") => ExpectedShape::TravelPlan,
        Some(other) => {
            return Err(anyhow!("unknown shape '{other}' (expected city-list or travel-plan)"))
        }
    };
    let policy = match matches.get_one::<String>("fallback").map(String::as_str) {
        Some("parse") | None => FallbackPolicy::OnParseFailure,
        Some("any") => FallbackPolicy::OnAnyFailure,
        Some("never") => FallbackPolicy::Never,
        Some(other) => return Err(anyhow!("unknown fallback policy '{other}'")),
    };
    let context = match parse_arg::<f64>(matches, "budget")? {
        Some(budget) => ValidationContext::with_budget_ceiling(budget),
        None => ValidationContext::default(),
    };

    let outcome = OutputValidator::new()
        .with_fallback_policy(policy)
        .with_context(context)
        .validate_and_repair(&AgentResponse::text(raw), shape);
    info!("validation finished in state {}", outcome.state());

    let (result, error) = outcome.into_parts();
    if let Some(error) = error {
        let payload = PlannerError::from(error).to_error_payload();
        eprintln!("{}", serde_json::to_string_pretty(&payload)?);
    }
    match result {
        Some(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn calc_cmd(matches: &ArgMatches) -> anyhow::Result<bool> {
    let expression = matches
        .get_one::<String>("expression")
        .ok_or_else(|| anyhow!("an expression is required"))?;
    let value = evaluate(expression).with_context(|| format!("cannot evaluate '{expression}'"))?;
    println!("{value}");
    Ok(true)
}

fn export_cmd(matches: &ArgMatches) -> anyhow::Result<bool> {
    let format = parse_arg::<ExportFormat>(matches, "format")?.unwrap_or(ExportFormat::Json);
    let plan: TravelPlan = serde_json::from_str(&read_file_arg(matches)?)
        .context("input is not a travel plan document")?;
    print!("{}", export(&plan, format)?);
    Ok(true)
}

fn print_comparison(cities: &CityRecommendationSet) {
    println!("{:<24} {:>6} {:>10}", "City", "Match", "Per day");
    for (name, score, daily) in cities.comparison_rows() {
        println!("{name:<24} {:>5.0}% {:>9.2}$", score * 100.0, daily);
    }
    println!();
}

async fn plan_cmd(matches: &ArgMatches) -> anyhow::Result<bool> {
    let fields = trip_fields(matches)?;
    let timeout_seconds = parse_arg::<u64>(matches, "timeout")?.unwrap_or(120);
    let max_iterations = parse_arg::<usize>(matches, "max-iterations")?.unwrap_or(10);

    let mut agent = Agent::from_env()?
        .with_timeout(Duration::from_secs(timeout_seconds))
        .with_max_iterations(max_iterations);
    if let Some(model) = matches.get_one::<String>("model") {
        agent = agent.with_model(model.as_str());
    }
    info!("Using model: {}", agent.model());

    let planner = Planner::new(agent).with_config(PlannerConfig::default());
    let print_replays = !matches.get_flag("json");

    let (session, report) = planner.select_cities(SessionState::new(), &fields).await;
    if print_replays {
        println!("{}\n", report.replay());
        if let Some(cities) = &session.selected_cities {
            print_comparison(cities);
        }
    }
    if !report.is_usable() {
        if let Some(err) = &report.error {
            error!("city selection failed: {err}");
        }
        return Ok(false);
    }

    let mut usable = true;
    let session = if fields.destination.is_some() {
        let (session, report) = planner.plan_trip(session, &fields).await;
        if print_replays {
            println!("{}", report.replay());
        }
        if let Some(err) = &report.error {
            error!("travel planning failed: {err}");
        }
        usable = report.is_usable();
        session
    } else {
        session
    };

    if !print_replays {
        println!("{}", serde_json::to_string_pretty(&session)?);
    }
    Ok(usable)
}
