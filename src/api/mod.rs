use axum::{
    Router,
    extract::{Json, Path, Query, RawQuery, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use crate::core::validation::{FieldError, LoanInputs, validate};
use crate::core::{
    Loan, PaymentConfig, PayoffResult, PayoffSummary, Scenario, calculate_payoff_schedule,
    minimum_payment,
};
use crate::error::AppError;
use crate::export::{default_file_name, schedule_to_csv};
use crate::share::{SharedScenario, decode_share_query, encode_share_query};
use crate::store::{ScenarioStore, ScenarioUpdate};

/// Hard ceiling on simulated months accepted from callers (1000 years).
pub const MAX_SCHEDULE_MONTHS: u32 = 12_000;

const CURRENT_LOAN_ID: &str = "current";
const CURRENT_LOAN_NAME: &str = "Current Loan";

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    #[arg(long, default_value_t = 450_000.0, help = "Loan principal")]
    pub principal: f64,
    #[arg(long, default_value_t = 7.0, help = "Annual percentage rate, e.g. 7 for 7%")]
    pub apr: f64,
    #[arg(long, default_value_t = 5_000.0)]
    pub monthly_payment: f64,
    #[arg(
        long,
        default_value_t = 120,
        help = "Maximum payoff duration in months"
    )]
    pub max_duration: u32,
    #[arg(
        long,
        default_value_t = 5_000.0,
        help = "Extra payment applied at the end of each year"
    )]
    pub annual_lump_sum: f64,
    #[arg(
        long,
        default_value_t = 5,
        help = "Number of years the annual lump sum is paid"
    )]
    pub lump_sum_years: u32,
    #[arg(long, help = "Display name for the loan")]
    pub name: Option<String>,
}

/// Web and share-link keys. Every field is optional and overlays the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SchedulePayload {
    principal: Option<f64>,
    apr: Option<f64>,
    #[serde(alias = "monthlyPayment")]
    payment: Option<f64>,
    #[serde(alias = "maxDuration")]
    duration: Option<u32>,
    #[serde(alias = "annualLumpSum")]
    lumpsum: Option<f64>,
    #[serde(alias = "lumpSumYears")]
    lumpyears: Option<u32>,
    name: Option<String>,
}

impl SchedulePayload {
    fn is_empty(&self) -> bool {
        self.principal.is_none()
            && self.apr.is_none()
            && self.payment.is_none()
            && self.duration.is_none()
            && self.lumpsum.is_none()
            && self.lumpyears.is_none()
            && self.name.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScenarioPayload {
    #[serde(rename = "scenarioName")]
    scenario_name: Option<String>,
    #[serde(flatten)]
    inputs: SchedulePayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MinimumPaymentQuery {
    principal: Option<f64>,
    apr: Option<f64>,
    #[serde(alias = "termMonths")]
    term: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub loan: Loan,
    pub payments: PaymentConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub loan: Loan,
    pub payments: PaymentConfig,
    pub result: PayoffResult,
    pub summary: PayoffSummary,
    pub warnings: Vec<FieldError>,
    /// Level payment that would retire the loan in exactly `maxDuration` months.
    pub minimum_payment: f64,
    pub share_query: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MinimumPaymentResponse {
    principal: f64,
    apr: f64,
    term_months: u32,
    minimum_payment: f64,
}

#[derive(Debug, Serialize)]
struct ShareResponse {
    query: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    pub scenarios_file: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<ScenarioStore>>,
}

impl AppState {
    pub fn new(store: ScenarioStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, ScenarioStore>, AppError> {
        self.store.lock().map_err(|_| AppError::StorePoisoned)
    }
}

pub fn default_schedule_args() -> ScheduleArgs {
    ScheduleArgs {
        principal: 450_000.0,
        apr: 7.0,
        monthly_payment: 5_000.0,
        max_duration: 120,
        annual_lump_sum: 5_000.0,
        lump_sum_years: 5,
        name: None,
    }
}

pub fn build_request(args: ScheduleArgs) -> Result<ScheduleRequest, String> {
    for (name, value) in [
        ("--principal", args.principal),
        ("--apr", args.apr),
        ("--monthly-payment", args.monthly_payment),
        ("--annual-lump-sum", args.annual_lump_sum),
    ] {
        if !value.is_finite() {
            return Err(format!("{name} must be a finite number"));
        }
    }

    if args.max_duration > MAX_SCHEDULE_MONTHS {
        return Err(format!(
            "--max-duration must be <= {MAX_SCHEDULE_MONTHS} months"
        ));
    }

    Ok(ScheduleRequest {
        loan: Loan {
            id: CURRENT_LOAN_ID.to_string(),
            name: args.name.unwrap_or_else(|| CURRENT_LOAN_NAME.to_string()),
            principal: args.principal,
            apr: args.apr,
        },
        payments: PaymentConfig {
            monthly_payment: args.monthly_payment,
            annual_lump_sum: args.annual_lump_sum,
            lump_sum_years: args.lump_sum_years,
            max_duration: args.max_duration,
        },
    })
}

pub fn build_schedule_response(request: ScheduleRequest) -> ScheduleResponse {
    let ScheduleRequest { loan, payments } = request;
    let result = calculate_payoff_schedule(loan.principal, loan.apr, &payments);
    let summary = PayoffSummary::from_result(loan.principal, &payments, &result);
    let warnings = validate(&LoanInputs {
        loan_amount: loan.principal,
        apr: loan.apr,
        monthly_payment: payments.monthly_payment,
        max_duration: f64::from(payments.max_duration),
        annual_lump_sum: payments.annual_lump_sum,
        lump_sum_years: f64::from(payments.lump_sum_years),
    });
    let share_query = match encode_share_query(&loan, &payments) {
        Ok(query) => Some(query),
        Err(err) => {
            tracing::warn!(error = %err, "could not build share query");
            None
        }
    };

    ScheduleResponse {
        minimum_payment: minimum_payment(loan.principal, loan.apr, payments.max_duration),
        loan,
        payments,
        result,
        summary,
        warnings,
        share_query,
    }
}

fn apply_payload(args: &mut ScheduleArgs, payload: SchedulePayload) {
    if let Some(v) = payload.principal {
        args.principal = v;
    }
    if let Some(v) = payload.apr {
        args.apr = v;
    }
    if let Some(v) = payload.payment {
        args.monthly_payment = v;
    }
    if let Some(v) = payload.duration {
        args.max_duration = v;
    }
    if let Some(v) = payload.lumpsum {
        args.annual_lump_sum = v;
    }
    if let Some(v) = payload.lumpyears {
        args.lump_sum_years = v;
    }
    if let Some(v) = payload.name {
        args.name = Some(v);
    }
}

fn request_from_payload(payload: SchedulePayload) -> Result<ScheduleRequest, String> {
    let mut args = default_schedule_args();
    apply_payload(&mut args, payload);
    build_request(args)
}

fn args_from_scenario(scenario: &Scenario) -> ScheduleArgs {
    ScheduleArgs {
        principal: scenario.loan.principal,
        apr: scenario.loan.apr,
        monthly_payment: scenario.payments.monthly_payment,
        max_duration: scenario.payments.max_duration,
        annual_lump_sum: scenario.payments.annual_lump_sum,
        lump_sum_years: scenario.payments.lump_sum_years,
        name: Some(scenario.loan.name.clone()),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/schedule",
            get(schedule_get_handler).post(schedule_post_handler),
        )
        .route("/api/schedule.csv", get(schedule_csv_handler))
        .route("/api/minimum-payment", get(minimum_payment_handler))
        .route(
            "/api/share",
            get(share_decode_handler).post(share_encode_handler),
        )
        .route(
            "/api/scenarios",
            get(list_scenarios_handler).post(create_scenario_handler),
        )
        .route(
            "/api/scenarios/:id",
            get(get_scenario_handler)
                .put(update_scenario_handler)
                .delete(delete_scenario_handler),
        )
        .route(
            "/api/scenarios/:id/duplicate",
            post(duplicate_scenario_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(config: ServeConfig) -> Result<(), AppError> {
    let store = match &config.scenarios_file {
        Some(path) => ScenarioStore::open(path)?,
        None => ScenarioStore::in_memory(),
    };
    let scenarios = store.path().map(|p| p.display().to_string());
    let app = router(AppState::new(store));

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, ?scenarios, "loan payoff HTTP API listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn schedule_get_handler(Query(payload): Query<SchedulePayload>) -> Response {
    schedule_handler_impl(payload)
}

async fn schedule_post_handler(Json(payload): Json<SchedulePayload>) -> Response {
    schedule_handler_impl(payload)
}

fn schedule_handler_impl(payload: SchedulePayload) -> Response {
    match request_from_payload(payload) {
        Ok(request) => json_response(StatusCode::OK, build_schedule_response(request)),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn schedule_csv_handler(Query(payload): Query<SchedulePayload>) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = calculate_payoff_schedule(
        request.loan.principal,
        request.loan.apr,
        &request.payments,
    );

    match schedule_to_csv(&result.schedule) {
        Ok(body) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                default_file_name(Utc::now().timestamp_millis())
            );
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                    (header::CACHE_CONTROL, "no-store".to_string()),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn minimum_payment_handler(Query(query): Query<MinimumPaymentQuery>) -> Response {
    let (Some(principal), Some(apr), Some(term)) = (query.principal, query.apr, query.term) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "principal, apr and term are required",
        );
    };
    if term == 0 {
        return error_response(StatusCode::BAD_REQUEST, "term must be > 0");
    }

    json_response(
        StatusCode::OK,
        MinimumPaymentResponse {
            principal,
            apr,
            term_months: term,
            minimum_payment: minimum_payment(principal, apr, term),
        },
    )
}

async fn share_encode_handler(Json(payload): Json<SchedulePayload>) -> Response {
    let request = match request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    match encode_share_query(&request.loan, &request.payments) {
        Ok(query) => json_response(StatusCode::OK, ShareResponse { query }),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn share_decode_handler(RawQuery(query): RawQuery) -> Response {
    match decode_share_query(query.as_deref().unwrap_or_default()) {
        Some(shared) => json_response::<SharedScenario>(StatusCode::OK, shared),
        None => error_response(
            StatusCode::BAD_REQUEST,
            "share link must include numeric principal, apr and payment",
        ),
    }
}

async fn list_scenarios_handler(State(state): State<AppState>) -> Response {
    match state.store() {
        Ok(store) => json_response(StatusCode::OK, store.list()),
        Err(err) => err.into_response(),
    }
}

async fn get_scenario_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let store = match state.store() {
        Ok(store) => store,
        Err(err) => return err.into_response(),
    };
    match store.get(&id) {
        Some(scenario) => json_response(StatusCode::OK, scenario),
        None => scenario_not_found(&id),
    }
}

async fn create_scenario_handler(
    State(state): State<AppState>,
    Json(payload): Json<ScenarioPayload>,
) -> Response {
    let request = match request_from_payload(payload.inputs) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    let result = calculate_payoff_schedule(
        request.loan.principal,
        request.loan.apr,
        &request.payments,
    );

    let mut store = match state.store() {
        Ok(store) => store,
        Err(err) => return err.into_response(),
    };
    let name = payload
        .scenario_name
        .unwrap_or_else(|| format!("Scenario {}", store.list().len() + 1));

    match store.save(name, request.loan, request.payments, result) {
        Ok(scenario) => {
            tracing::info!(id = %scenario.id, name = %scenario.name, "saved scenario");
            json_response(StatusCode::CREATED, scenario)
        }
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn update_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ScenarioPayload>,
) -> Response {
    let mut store = match state.store() {
        Ok(store) => store,
        Err(err) => return err.into_response(),
    };
    let Some(existing) = store.get(&id) else {
        return scenario_not_found(&id);
    };

    let mut update = ScenarioUpdate {
        name: payload.scenario_name,
        ..ScenarioUpdate::default()
    };
    if !payload.inputs.is_empty() {
        let mut args = args_from_scenario(existing);
        apply_payload(&mut args, payload.inputs);
        let request = match build_request(args) {
            Ok(request) => request,
            Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
        };
        update.result = Some(calculate_payoff_schedule(
            request.loan.principal,
            request.loan.apr,
            &request.payments,
        ));
        update.loan = Some(Loan {
            id: existing.loan.id.clone(),
            ..request.loan
        });
        update.payments = Some(request.payments);
    }

    match store.update(&id, update) {
        Ok(Some(scenario)) => {
            tracing::info!(id = %scenario.id, "updated scenario");
            json_response(StatusCode::OK, scenario)
        }
        Ok(None) => scenario_not_found(&id),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn delete_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let mut store = match state.store() {
        Ok(store) => store,
        Err(err) => return err.into_response(),
    };
    match store.delete(&id) {
        Ok(true) => {
            tracing::info!(%id, "deleted scenario");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => scenario_not_found(&id),
        Err(err) => AppError::from(err).into_response(),
    }
}

async fn duplicate_scenario_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let mut store = match state.store() {
        Ok(store) => store,
        Err(err) => return err.into_response(),
    };
    match store.duplicate(&id) {
        Ok(Some(copy)) => {
            tracing::info!(source = %id, id = %copy.id, "duplicated scenario");
            json_response(StatusCode::CREATED, copy)
        }
        Ok(None) => scenario_not_found(&id),
        Err(err) => AppError::from(err).into_response(),
    }
}

fn scenario_not_found(id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, &format!("scenario {id} not found"))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

pub(crate) fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
