use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{InvestmentGoal, InvestorProfile};
use crate::narrator::Narrator;
use crate::plan::run_plan;
use crate::snapshot::{ComparisonSnapshot, SnapshotSlot};

/// Investor inputs as entered on the command line. Rates are in percent.
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long, default_value_t = 30)]
    pub age: u32,
    #[arg(long, default_value_t = 100_000.0, help = "Monthly income")]
    pub monthly_income: f64,
    #[arg(long, default_value_t = 20_000.0, help = "Planned monthly investment (SIP)")]
    pub monthly_investment: f64,
    #[arg(long, default_value_t = 0.0)]
    pub current_savings: f64,
    #[arg(long, default_value_t = 15)]
    pub horizon_years: u32,
    #[arg(
        long,
        default_value_t = 5.0,
        help = "Expected annual inflation in percent, e.g. 5"
    )]
    pub inflation_rate: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Fixed-deposit annual rate in percent, e.g. 7"
    )]
    pub fd_rate: f64,
    #[arg(
        long = "goal",
        value_delimiter = ',',
        value_parser = parse_goal,
        default_values_t = [InvestmentGoal::WealthCreation],
        help = "Investment goal, most important first; repeat or comma-separate"
    )]
    pub goals: Vec<InvestmentGoal>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("--{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("--{0} must be a finite amount >= 0")]
    InvalidAmount(&'static str),

    #[error("at least one --goal is required")]
    NoGoals,

    #[error("goal {0} is selected more than once")]
    DuplicateGoal(InvestmentGoal),

    #[error("unknown goal {0:?}")]
    UnknownGoal(String),

    #[error("allocation must be a JSON object of asset class weights: {0}")]
    Allocation(String),
}

fn parse_goal(raw: &str) -> Result<InvestmentGoal, String> {
    InvestmentGoal::from_label(raw).ok_or_else(|| ProfileError::UnknownGoal(raw.to_string()).to_string())
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ProfileError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ProfileError::OutOfRange { field, min, max })
    }
}

fn check_amount(field: &'static str, value: f64) -> Result<(), ProfileError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ProfileError::InvalidAmount(field))
    }
}

pub fn build_profile(args: ProfileArgs) -> Result<InvestorProfile, ProfileError> {
    check_range("age", f64::from(args.age), 18.0, 100.0)?;
    check_range("horizon-years", f64::from(args.horizon_years), 1.0, 60.0)?;
    check_amount("monthly-income", args.monthly_income)?;
    check_amount("monthly-investment", args.monthly_investment)?;
    check_amount("current-savings", args.current_savings)?;
    check_range("inflation-rate", args.inflation_rate, 0.0, 15.0)?;
    check_range("fd-rate", args.fd_rate, 1.0, 12.0)?;

    if args.goals.is_empty() {
        return Err(ProfileError::NoGoals);
    }
    for (idx, goal) in args.goals.iter().enumerate() {
        if args.goals[..idx].contains(goal) {
            return Err(ProfileError::DuplicateGoal(*goal));
        }
    }

    Ok(InvestorProfile {
        age: args.age,
        monthly_income: args.monthly_income,
        monthly_investment: args.monthly_investment,
        current_savings: args.current_savings,
        horizon_years: args.horizon_years,
        inflation_rate: args.inflation_rate / 100.0,
        fd_rate: args.fd_rate / 100.0,
        goals: args.goals,
    })
}

/// Parses a raw allocation override such as `{"Equity": 60, "Debt": 40}`.
pub fn parse_allocation_json(raw: &str) -> Result<Map<String, Value>, ProfileError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ProfileError::Allocation(format!("got {other}"))),
        Err(e) => Err(ProfileError::Allocation(e.to_string())),
    }
}

pub fn default_profile_args() -> ProfileArgs {
    ProfileArgs {
        age: 30,
        monthly_income: 100_000.0,
        monthly_investment: 20_000.0,
        current_savings: 0.0,
        horizon_years: 15,
        inflation_rate: 5.0,
        fd_rate: 7.0,
        goals: vec![InvestmentGoal::WealthCreation],
    }
}

/// Goals arrive as a JSON array or, in query strings, comma-separated.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoalList {
    Many(Vec<String>),
    Joined(String),
}

impl GoalList {
    fn labels(&self) -> Vec<&str> {
        match self {
            GoalList::Many(labels) => labels.iter().map(String::as_str).collect(),
            GoalList::Joined(joined) => joined
                .split(',')
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AdvisePayload {
    age: Option<u32>,
    monthly_income: Option<f64>,
    monthly_investment: Option<f64>,
    current_savings: Option<f64>,
    horizon_years: Option<u32>,
    inflation_rate: Option<f64>,
    fd_rate: Option<f64>,
    goals: Option<GoalList>,
    allocation: Option<Map<String, Value>>,
}

#[derive(Debug)]
struct AdviseRequest {
    profile: InvestorProfile,
    allocation: Option<Map<String, Value>>,
}

fn advise_request_from_payload(payload: AdvisePayload) -> Result<AdviseRequest, ProfileError> {
    let mut args = default_profile_args();

    if let Some(v) = payload.age {
        args.age = v;
    }
    if let Some(v) = payload.monthly_income {
        args.monthly_income = v;
    }
    if let Some(v) = payload.monthly_investment {
        args.monthly_investment = v;
    }
    if let Some(v) = payload.current_savings {
        args.current_savings = v;
    }
    if let Some(v) = payload.horizon_years {
        args.horizon_years = v;
    }
    if let Some(v) = payload.inflation_rate {
        args.inflation_rate = v;
    }
    if let Some(v) = payload.fd_rate {
        args.fd_rate = v;
    }
    if let Some(goals) = payload.goals {
        args.goals = goals
            .labels()
            .into_iter()
            .map(|label| {
                InvestmentGoal::from_label(label)
                    .ok_or_else(|| ProfileError::UnknownGoal(label.to_string()))
            })
            .collect::<Result<_, _>>()?;
    }

    Ok(AdviseRequest {
        profile: build_profile(args)?,
        allocation: payload.allocation,
    })
}

#[derive(Clone)]
pub struct AppState {
    narrator: Arc<dyn Narrator>,
    snapshots: Arc<SnapshotSlot>,
}

impl AppState {
    pub fn new(narrator: Arc<dyn Narrator>) -> Self {
        Self {
            narrator,
            snapshots: Arc::new(SnapshotSlot::new()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonResponse {
    #[serde(flatten)]
    snapshot: ComparisonSnapshot,
    top_goal: Option<InvestmentGoal>,
    summary_line: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/advise",
            get(advise_get_handler).post(advise_post_handler),
        )
        .route(
            "/api/comparison",
            get(comparison_get_handler).delete(comparison_delete_handler),
        )
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("advisor HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{}/api/advise", addr.port());

    axum::serve(listener, router(state)).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn advise_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<AdvisePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => advise_handler_impl(state, payload).await,
        Err(rejection) => error_response(rejection.status(), &rejection.body_text()),
    }
}

async fn advise_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<AdvisePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => advise_handler_impl(state, payload).await,
        Err(rejection) => error_response(rejection.status(), &rejection.body_text()),
    }
}

async fn advise_handler_impl(state: AppState, payload: AdvisePayload) -> Response {
    let request = match advise_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => {
            warn!("rejected advisory request: {err}");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let plan = run_plan(
        request.profile,
        request.allocation.as_ref(),
        state.narrator.as_ref(),
    )
    .await;
    state.snapshots.set(ComparisonSnapshot::from_plan(&plan));
    json_response(StatusCode::OK, plan)
}

async fn comparison_get_handler(State(state): State<AppState>) -> Response {
    match state.snapshots.get() {
        Some(snapshot) => json_response(
            StatusCode::OK,
            ComparisonResponse {
                top_goal: snapshot.top_goal(),
                summary_line: snapshot.summary_line(),
                snapshot,
            },
        ),
        None => error_response(
            StatusCode::NOT_FOUND,
            "No advisory run yet; request /api/advise first",
        ),
    }
}

async fn comparison_delete_handler(State(state): State<AppState>) -> Response {
    state.snapshots.clear();
    with_cache_control(StatusCode::NO_CONTENT)
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn advise_request_from_json(json: &str) -> Result<AdviseRequest, String> {
    let payload = serde_json::from_str::<AdvisePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    advise_request_from_payload(payload).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrator::DisabledNarrator;
    use clap::Parser;
    use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE};

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        profile: ProfileArgs,
    }

    fn sample_args() -> ProfileArgs {
        default_profile_args()
    }

    async fn spawn_app() -> String {
        let state = AppState::new(Arc::new(DisabledNarrator));
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("test address");
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.expect("test server");
        });
        format!("http://{addr}")
    }

    #[test]
    fn build_profile_converts_percent_rates_to_fractions() {
        let profile = build_profile(sample_args()).expect("valid defaults");
        assert_eq!(profile.age, 30);
        assert_eq!(profile.horizon_years, 15);
        assert_approx(profile.inflation_rate, 0.05);
        assert_approx(profile.fd_rate, 0.07);
        assert_eq!(profile.goals, vec![InvestmentGoal::WealthCreation]);
    }

    #[test]
    fn build_profile_rejects_age_outside_form_range() {
        for age in [17, 101] {
            let mut args = sample_args();
            args.age = age;
            let err = build_profile(args).expect_err("must reject age");
            assert!(err.to_string().contains("--age"), "{err}");
        }
    }

    #[test]
    fn build_profile_rejects_horizon_outside_form_range() {
        for horizon in [0, 61] {
            let mut args = sample_args();
            args.horizon_years = horizon;
            let err = build_profile(args).expect_err("must reject horizon");
            assert!(err.to_string().contains("--horizon-years"));
        }
    }

    #[test]
    fn build_profile_rejects_negative_or_non_finite_amounts() {
        let mut args = sample_args();
        args.monthly_investment = -1.0;
        assert_eq!(
            build_profile(args),
            Err(ProfileError::InvalidAmount("monthly-investment"))
        );

        let mut args = sample_args();
        args.monthly_income = f64::NAN;
        assert_eq!(
            build_profile(args),
            Err(ProfileError::InvalidAmount("monthly-income"))
        );
    }

    #[test]
    fn build_profile_rejects_rates_outside_form_range() {
        let mut args = sample_args();
        args.inflation_rate = 15.5;
        let err = build_profile(args).expect_err("must reject inflation");
        assert_eq!(err.to_string(), "--inflation-rate must be between 0 and 15");

        let mut args = sample_args();
        args.fd_rate = 0.5;
        let err = build_profile(args).expect_err("must reject fd rate");
        assert_eq!(err.to_string(), "--fd-rate must be between 1 and 12");
    }

    #[test]
    fn build_profile_requires_distinct_goals() {
        let mut args = sample_args();
        args.goals.clear();
        assert_eq!(build_profile(args), Err(ProfileError::NoGoals));

        let mut args = sample_args();
        args.goals = vec![
            InvestmentGoal::Retirement,
            InvestmentGoal::Education,
            InvestmentGoal::Retirement,
        ];
        assert_eq!(
            build_profile(args),
            Err(ProfileError::DuplicateGoal(InvestmentGoal::Retirement))
        );
    }

    #[test]
    fn cli_flags_parse_goals_and_defaults() {
        let cli = TestCli::try_parse_from([
            "advisor",
            "--age",
            "52",
            "--goal",
            "retirement,emergency-fund",
            "--inflation-rate",
            "6",
        ])
        .expect("valid flags");
        assert_eq!(cli.profile.age, 52);
        assert_eq!(cli.profile.horizon_years, 15);
        assert_eq!(
            cli.profile.goals,
            vec![InvestmentGoal::Retirement, InvestmentGoal::EmergencyFund]
        );

        let defaults = TestCli::try_parse_from(["advisor"]).expect("defaults");
        assert_eq!(defaults.profile.goals, vec![InvestmentGoal::WealthCreation]);
        assert_approx(defaults.profile.fd_rate, 7.0);
    }

    #[test]
    fn cli_rejects_unknown_goal() {
        assert!(TestCli::try_parse_from(["advisor", "--goal", "yacht"]).is_err());
    }

    #[test]
    fn advise_request_from_json_parses_web_keys() {
        let request = advise_request_from_json(
            r#"{
                "age": 45,
                "monthlyIncome": 150000,
                "monthlyInvestment": 30000,
                "currentSavings": 500000,
                "horizonYears": 10,
                "inflationRate": 6,
                "fdRate": 7.5,
                "goals": ["Retirement", "Education"],
                "allocation": {"Equity": 70, "Debt": 30}
            }"#,
        )
        .expect("valid payload");

        let profile = &request.profile;
        assert_eq!(profile.age, 45);
        assert_eq!(profile.horizon_years, 10);
        assert_approx(profile.monthly_income, 150_000.0);
        assert_approx(profile.current_savings, 500_000.0);
        assert_approx(profile.inflation_rate, 0.06);
        assert_approx(profile.fd_rate, 0.075);
        assert_eq!(
            profile.goals,
            vec![InvestmentGoal::Retirement, InvestmentGoal::Education]
        );
        let allocation = request.allocation.expect("allocation kept");
        assert_eq!(allocation["Equity"], 70);
    }

    #[test]
    fn advise_request_from_json_uses_form_defaults_for_missing_keys() {
        let request = advise_request_from_json("{}").expect("empty payload is valid");
        assert_eq!(request.profile.age, 30);
        assert_approx(request.profile.monthly_investment, 20_000.0);
        assert!(request.allocation.is_none());
    }

    #[test]
    fn advise_request_from_json_rejects_unknown_goal() {
        let err = advise_request_from_json(r#"{"goals": ["Retirement", "Yacht"]}"#)
            .expect_err("must reject unknown goal");
        assert!(err.contains("Yacht"));
    }

    #[test]
    fn parse_allocation_json_requires_object() {
        assert!(parse_allocation_json(r#"{"Equity": 1}"#).is_ok());
        assert!(matches!(
            parse_allocation_json("[1, 2]"),
            Err(ProfileError::Allocation(_))
        ));
        assert!(matches!(
            parse_allocation_json("{oops"),
            Err(ProfileError::Allocation(_))
        ));
    }

    #[tokio::test]
    async fn advise_then_compare_then_clear() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let before = client
            .get(format!("{base}/api/comparison"))
            .send()
            .await
            .expect("comparison request");
        assert_eq!(before.status(), reqwest::StatusCode::NOT_FOUND);
        assert_eq!(
            before
                .headers()
                .get(CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store")
        );

        let advise = client
            .post(format!("{base}/api/advise"))
            .json(&serde_json::json!({ "goals": ["Wealth Creation", "Other"] }))
            .send()
            .await
            .expect("advise request");
        assert_eq!(advise.status(), reqwest::StatusCode::OK);
        let plan: Value = advise.json().await.expect("plan json");
        assert_eq!(plan["adviceSource"], "fallback");
        assert_eq!(plan["risk"]["tier"], "High");
        assert_eq!(plan["allocation"]["Equity"], 0.75);
        assert_eq!(plan["projection"]["years"].as_array().map(Vec::len), Some(15));
        assert_eq!(plan["funds"].as_array().map(Vec::len), Some(3));

        let comparison: Value = client
            .get(format!("{base}/api/comparison"))
            .send()
            .await
            .expect("comparison request")
            .json()
            .await
            .expect("comparison json");
        assert_eq!(
            comparison["summaryLine"],
            "Top goal priority: Wealth Creation with overall risk profile inferred as High."
        );
        assert_eq!(comparison["topGoal"], "Wealth Creation");
        assert_eq!(comparison["riskTier"], "High");
        assert_eq!(comparison["fdRate"], 0.07);
        assert_eq!(
            comparison["portfolioFuture"],
            plan["projection"]["portfolioFutureValue"]
        );

        let cleared = client
            .delete(format!("{base}/api/comparison"))
            .send()
            .await
            .expect("delete request");
        assert_eq!(cleared.status(), reqwest::StatusCode::NO_CONTENT);

        let after = client
            .get(format!("{base}/api/comparison"))
            .send()
            .await
            .expect("comparison request");
        assert_eq!(after.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn advise_get_reads_query_parameters() {
        let base = spawn_app().await;
        let plan: Value = reqwest::get(format!(
            "{base}/api/advise?age=60&horizonYears=3&goals=Emergency%20Fund,Other"
        ))
        .await
        .expect("advise request")
        .json()
        .await
        .expect("plan json");

        assert_eq!(plan["profile"]["age"], 60);
        assert_eq!(plan["risk"]["tier"], "Low");
        assert_eq!(plan["profile"]["goals"][0], "Emergency Fund");
        assert_eq!(plan["projection"]["years"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn invalid_inputs_return_json_errors() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let out_of_range = client
            .get(format!("{base}/api/advise?age=17"))
            .send()
            .await
            .expect("advise request");
        assert_eq!(out_of_range.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = out_of_range.json().await.expect("error json");
        assert_eq!(body["error"], "--age must be between 18 and 100");

        let malformed = client
            .post(format!("{base}/api/advise"))
            .header(CONTENT_TYPE, "application/json")
            .body("{not json")
            .send()
            .await
            .expect("advise request");
        assert_eq!(malformed.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = malformed.json().await.expect("error json");
        assert!(body["error"].is_string());

        let missing = client
            .get(format!("{base}/nowhere"))
            .send()
            .await
            .expect("request");
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
        let body: Value = missing.json().await.expect("error json");
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let base = spawn_app().await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .expect("health request")
            .json()
            .await
            .expect("health json");
        assert_eq!(body["status"], "ok");
    }
}
