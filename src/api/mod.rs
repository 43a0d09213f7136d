use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;

use crate::core::{
    ComparisonInputs, ComparisonRow, EngineError, ImpactConfig, ImpactMonthPoint, ImpactOutcome,
    RateSpec, run_comparison, solve_impact, solve_impact_with_trace,
};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BENCHMARK_RATE: f64 = 14.9;
const DEFAULT_EXEMPT_MULTIPLIER: f64 = 95.0;
const DEFAULT_TAXED_MULTIPLIER: f64 = 110.0;
const DEFAULT_AMOUNT: f64 = 10_000.0;
const DEFAULT_HORIZONS: &str = "180,360,720,1080";
const DEFAULT_TARGET_DIFFERENCE: f64 = 2_000.0;
const DEFAULT_INITIAL_CAPITAL: f64 = 8_000.0;
const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 2_500.0;
const MAX_HORIZONS: usize = 64;

#[derive(Parser, Debug)]
#[command(
    name = "yieldgap",
    about = "Fixed-income calculator: CDB vs LCI/LCA comparison and time-to-impact solver"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API over HTTP
    Serve(ServeArgs),
    /// Compare net returns of the exempt and taxed vehicles at fixed horizons
    Compare(CompareArgs),
    /// Find how many months until the net difference reaches a target
    Impact(ImpactArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long, default_value_t = DEFAULT_AMOUNT, help = "Amount invested in each vehicle")]
    pub amount: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_BENCHMARK_RATE,
        help = "Benchmark (CDI) annual rate in percent"
    )]
    pub benchmark_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_EXEMPT_MULTIPLIER,
        help = "Exempt vehicle (LCI/LCA) rate as percent of the benchmark"
    )]
    pub exempt_multiplier: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_TAXED_MULTIPLIER,
        help = "Taxed vehicle (CDB) rate as percent of the benchmark"
    )]
    pub taxed_multiplier: f64,
    #[arg(
        long,
        help = "Exempt vehicle annual rate in percent; overrides the benchmark multiple"
    )]
    pub exempt_annual_rate: Option<f64>,
    #[arg(
        long,
        help = "Taxed vehicle annual rate in percent; overrides the benchmark multiple"
    )]
    pub taxed_annual_rate: Option<f64>,
    #[arg(
        long,
        value_delimiter = ',',
        default_value = DEFAULT_HORIZONS,
        help = "Comma-separated holding periods in days"
    )]
    pub horizon_days: Vec<u32>,
    #[arg(long, help = "Start date (YYYY-MM-DD) used for maturity dates; defaults to today")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Args, Debug, Clone)]
pub struct ImpactArgs {
    #[arg(
        long,
        default_value_t = DEFAULT_TARGET_DIFFERENCE,
        help = "Net difference between the vehicles to reach"
    )]
    pub target_difference: f64,
    #[arg(long, default_value_t = DEFAULT_INITIAL_CAPITAL)]
    pub initial_capital: f64,
    #[arg(long, default_value_t = DEFAULT_MONTHLY_CONTRIBUTION)]
    pub monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_BENCHMARK_RATE,
        help = "Benchmark (CDI) annual rate in percent"
    )]
    pub benchmark_rate: f64,
    #[arg(long, default_value_t = DEFAULT_EXEMPT_MULTIPLIER)]
    pub exempt_multiplier: f64,
    #[arg(long, default_value_t = DEFAULT_TAXED_MULTIPLIER)]
    pub taxed_multiplier: f64,
    #[arg(long, help = "Include the month-by-month trajectory")]
    pub trace: bool,
}

impl From<&CompareArgs> for ComparisonInputs {
    fn from(args: &CompareArgs) -> Self {
        let rate = |annual: Option<f64>, multiplier: f64| match annual {
            Some(percent) => RateSpec::Annual { percent },
            None => RateSpec::of_benchmark(args.benchmark_rate, multiplier),
        };
        ComparisonInputs {
            principal: args.amount,
            exempt_rate: rate(args.exempt_annual_rate, args.exempt_multiplier),
            taxed_rate: rate(args.taxed_annual_rate, args.taxed_multiplier),
            horizon_days: args.horizon_days.clone(),
            start_date: args.start_date,
        }
    }
}

impl From<&ImpactArgs> for ImpactConfig {
    fn from(args: &ImpactArgs) -> Self {
        ImpactConfig {
            target_difference: args.target_difference,
            initial_capital: args.initial_capital,
            monthly_contribution: args.monthly_contribution,
            benchmark_rate: args.benchmark_rate,
            exempt_multiplier: args.exempt_multiplier,
            taxed_multiplier: args.taxed_multiplier,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ComparePayload {
    amount: Option<f64>,
    #[serde(alias = "cdiRate")]
    benchmark_rate: Option<f64>,
    #[serde(alias = "lciRate")]
    exempt_multiplier: Option<f64>,
    #[serde(alias = "cdbRate")]
    taxed_multiplier: Option<f64>,
    exempt_annual_rate: Option<f64>,
    taxed_annual_rate: Option<f64>,
    horizons: Option<String>,
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ImpactPayload {
    #[serde(alias = "targetImpact")]
    target_difference: Option<f64>,
    initial_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    #[serde(alias = "cdiRate")]
    benchmark_rate: Option<f64>,
    #[serde(alias = "lciRatePercent")]
    exempt_multiplier: Option<f64>,
    #[serde(alias = "cdbRatePercent")]
    taxed_multiplier: Option<f64>,
    trace: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompareResponse {
    principal: f64,
    exempt_annual_rate: f64,
    taxed_annual_rate: f64,
    rows: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImpactResponse {
    target_difference: f64,
    exempt_annual_rate: f64,
    taxed_annual_rate: f64,
    outcome: ImpactOutcome,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace: Option<Vec<ImpactMonthPoint>>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Serve(args) => run_http_server(SocketAddr::new(args.host, args.port))
            .await
            .map_err(|e| format!("server error: {e}")),
        Command::Compare(mut args) => {
            if args.start_date.is_none() {
                args.start_date = Some(today());
            }
            let response = run_compare(&ComparisonInputs::from(&args)).map_err(|e| e.to_string())?;
            print_json(&response)
        }
        Command::Impact(args) => {
            let response =
                run_impact(&ImpactConfig::from(&args), args.trace).map_err(|e| e.to_string())?;
            print_json(&response)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("encoding error: {e}"))?;
    println!("{json}");
    Ok(())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/compare",
            get(compare_get_handler).post(compare_post_handler),
        )
        .route(
            "/api/impact",
            get(impact_get_handler).post(impact_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "yieldgap HTTP API listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn compare_get_handler(Query(payload): Query<ComparePayload>) -> Response {
    compare_handler_impl(payload)
}

async fn compare_post_handler(Json(payload): Json<ComparePayload>) -> Response {
    compare_handler_impl(payload)
}

fn compare_handler_impl(payload: ComparePayload) -> Response {
    let mut inputs = match compare_inputs_from_payload(payload) {
        Ok(inputs) => inputs,
        Err(msg) => {
            tracing::warn!(error = %msg, "rejected compare request");
            return error_response(StatusCode::BAD_REQUEST, &msg);
        }
    };
    if inputs.start_date.is_none() {
        inputs.start_date = Some(today());
    }

    match run_compare(&inputs) {
        Ok(response) => {
            tracing::debug!(horizons = response.rows.len(), "comparison computed");
            json_response(StatusCode::OK, response)
        }
        Err(err) => {
            tracing::warn!(error = %err, "comparison rejected");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

async fn impact_get_handler(Query(payload): Query<ImpactPayload>) -> Response {
    impact_handler_impl(payload).await
}

async fn impact_post_handler(Json(payload): Json<ImpactPayload>) -> Response {
    impact_handler_impl(payload).await
}

async fn impact_handler_impl(payload: ImpactPayload) -> Response {
    let (config, include_trace) = impact_request_from_payload(payload);

    let joined = tokio::task::spawn_blocking(move || run_impact(&config, include_trace)).await;
    match joined {
        Ok(Ok(response)) => {
            tracing::debug!(
                reached = response.outcome.is_reached(),
                "impact simulation finished"
            );
            json_response(StatusCode::OK, response)
        }
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "impact request rejected");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        Err(err) => {
            tracing::error!(error = %err, "impact simulation task failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Simulation failed")
        }
    }
}

fn run_compare(inputs: &ComparisonInputs) -> Result<CompareResponse, EngineError> {
    let rows = run_comparison(inputs)?;
    Ok(CompareResponse {
        principal: inputs.principal,
        exempt_annual_rate: inputs.exempt_rate.annual_percent(),
        taxed_annual_rate: inputs.taxed_rate.annual_percent(),
        rows,
    })
}

fn run_impact(config: &ImpactConfig, include_trace: bool) -> Result<ImpactResponse, EngineError> {
    let (outcome, trace) = if include_trace {
        let (outcome, points) = solve_impact_with_trace(config)?;
        (outcome, Some(points))
    } else {
        (solve_impact(config)?, None)
    };
    Ok(ImpactResponse {
        target_difference: config.target_difference,
        exempt_annual_rate: config.exempt_rate().annual_percent(),
        taxed_annual_rate: config.taxed_rate().annual_percent(),
        outcome,
        message: impact_message(config.target_difference, &outcome),
        trace,
    })
}

fn impact_message(target_difference: f64, outcome: &ImpactOutcome) -> String {
    let target = format_brl(target_difference);
    match outcome {
        ImpactOutcome::Reached(summary) => format!(
            "Difference of {target} reached in {} and {} ({} in total). Final difference: {}.",
            plural(summary.years, "year", "years"),
            plural(summary.remainder_months, "month", "months"),
            plural(summary.months, "month", "months"),
            format_brl(summary.final_difference),
        ),
        ImpactOutcome::NotReached(shortfall) => format!(
            "Difference of {target} was not reached within {}. The largest difference reached was {}.",
            plural(shortfall.horizon_cap_years, "year", "years"),
            format_brl(shortfall.max_difference),
        ),
    }
}

fn plural(count: u32, one: &str, many: &str) -> String {
    if count == 1 {
        format!("{count} {one}")
    } else {
        format!("{count} {many}")
    }
}

/// Brazilian real formatting: `.` groups thousands and `,` separates cents.
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        return format!("R$ {value}");
    }

    // Stay in f64: amounts past u64::MAX cents must not saturate.
    let total_cents = (value.abs() * 100.0).round();
    let cents = total_cents % 100.0;
    let digits = format!("{:.0}", (total_cents - cents) / 100.0);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && total_cents > 0.0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{cents:02.0}")
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
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
fn compare_inputs_from_json(json: &str) -> Result<ComparisonInputs, String> {
    let payload = serde_json::from_str::<ComparePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    compare_inputs_from_payload(payload)
}

#[cfg(test)]
fn impact_request_from_json(json: &str) -> Result<(ImpactConfig, bool), String> {
    let payload = serde_json::from_str::<ImpactPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(impact_request_from_payload(payload))
}

fn compare_inputs_from_payload(payload: ComparePayload) -> Result<ComparisonInputs, String> {
    let mut args = default_compare_args();

    if let Some(v) = payload.amount {
        args.amount = v;
    }
    if let Some(v) = payload.benchmark_rate {
        args.benchmark_rate = v;
    }
    if let Some(v) = payload.exempt_multiplier {
        args.exempt_multiplier = v;
    }
    if let Some(v) = payload.taxed_multiplier {
        args.taxed_multiplier = v;
    }
    if payload.exempt_annual_rate.is_some() {
        args.exempt_annual_rate = payload.exempt_annual_rate;
    }
    if payload.taxed_annual_rate.is_some() {
        args.taxed_annual_rate = payload.taxed_annual_rate;
    }
    if let Some(v) = payload.horizons {
        args.horizon_days = parse_horizons(&v)?;
    }
    if let Some(v) = payload.start_date {
        args.start_date = Some(v);
    }

    Ok(ComparisonInputs::from(&args))
}

fn impact_request_from_payload(payload: ImpactPayload) -> (ImpactConfig, bool) {
    let mut args = default_impact_args();

    if let Some(v) = payload.target_difference {
        args.target_difference = v;
    }
    if let Some(v) = payload.initial_capital {
        args.initial_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.benchmark_rate {
        args.benchmark_rate = v;
    }
    if let Some(v) = payload.exempt_multiplier {
        args.exempt_multiplier = v;
    }
    if let Some(v) = payload.taxed_multiplier {
        args.taxed_multiplier = v;
    }
    if let Some(v) = payload.trace {
        args.trace = v;
    }

    (ImpactConfig::from(&args), args.trace)
}

fn parse_horizons(raw: &str) -> Result<Vec<u32>, String> {
    let horizons = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| format!("horizons must be day counts, got `{part}`"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if horizons.is_empty() {
        return Err("horizons must list at least one day count".to_string());
    }
    if horizons.len() > MAX_HORIZONS {
        return Err(format!("horizons accepts at most {MAX_HORIZONS} entries"));
    }
    Ok(horizons)
}

fn default_compare_args() -> CompareArgs {
    CompareArgs {
        amount: DEFAULT_AMOUNT,
        benchmark_rate: DEFAULT_BENCHMARK_RATE,
        exempt_multiplier: DEFAULT_EXEMPT_MULTIPLIER,
        taxed_multiplier: DEFAULT_TAXED_MULTIPLIER,
        exempt_annual_rate: None,
        taxed_annual_rate: None,
        horizon_days: crate::core::DEFAULT_HORIZON_DAYS.to_vec(),
        start_date: None,
    }
}

fn default_impact_args() -> ImpactArgs {
    ImpactArgs {
        target_difference: DEFAULT_TARGET_DIFFERENCE,
        initial_capital: DEFAULT_INITIAL_CAPITAL,
        monthly_contribution: DEFAULT_MONTHLY_CONTRIBUTION,
        benchmark_rate: DEFAULT_BENCHMARK_RATE,
        exempt_multiplier: DEFAULT_EXEMPT_MULTIPLIER,
        taxed_multiplier: DEFAULT_TAXED_MULTIPLIER,
        trace: false,
    }
}
