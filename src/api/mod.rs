use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Json, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::challenge::{ChallengeRecord, ParsedChallenge};
use crate::core::{
    DEFAULT_MAX_CHART_POINTS, Product, ProductCatalog, ProjectionError, ProjectionResult,
    SimulationParams, estimated_final_amount, project, project_seeded,
};

pub const DEFAULT_PRODUCT: &str = "balanced";
pub const DEFAULT_AMOUNT: f64 = 1_000.0;
pub const DEFAULT_DAYS: u32 = 90;
pub const MAX_DAYS: u32 = 36_500;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("unknown product `{0}`")]
    UnknownProduct(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Projection(_) => StatusCode::BAD_REQUEST,
            ApiError::UnknownProduct(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(status = status.as_u16(), error = %self, "request rejected");
        error_response(status, &self.to_string())
    }
}

/// Simulation request as sent by the app. Every field is optional and
/// falls back to the input form defaults.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    pub product: Option<String>,
    pub amount: Option<f64>,
    pub days: Option<u32>,
    pub deposits: Option<f64>,
    pub frequency: Option<u32>,
    pub max_chart_points: Option<u32>,
    pub seed: Option<u64>,
    pub daily_rate: Option<f64>,
    pub volatility: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub product: Product,
    pub params: SimulationParams,
    pub seed: Option<u64>,
}

impl SimulationRequest {
    pub fn run(&self) -> Result<ProjectionResult, ProjectionError> {
        match self.seed {
            Some(seed) => project_seeded(&self.params, seed),
            None => project(&self.params),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    pub product: Product,
    pub params: SimulationParams,
    pub seed: Option<u64>,
    pub estimated_final_amount: f64,
    pub result: ProjectionResult,
}

#[derive(Debug, Serialize)]
struct ProductsResponse<'a> {
    products: &'a [Product],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChallengePayload {
    Many(Vec<ChallengeRecord>),
    One(Box<ChallengeRecord>),
}

#[derive(Debug, Serialize)]
struct ChallengesResponse {
    challenges: Vec<ParsedChallenge>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
pub struct AppState {
    catalog: Arc<ProductCatalog>,
}

impl AppState {
    pub fn new(catalog: ProductCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/products", get(products_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route("/api/challenges/parse", post(challenges_parse_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, catalog: ProductCatalog) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let products = catalog.products().len();
    let app = router(AppState::new(catalog));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, products, "growth projection API listening");

    axum::serve(listener, app).await
}

async fn products_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        ProductsResponse {
            products: state.catalog.products(),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    State(state): State<AppState>,
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(payload) = payload?;
    simulate_handler_impl(&state, payload)
}

async fn simulate_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<SimulatePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    simulate_handler_impl(&state, payload)
}

fn simulate_handler_impl(state: &AppState, payload: SimulatePayload) -> Result<Response, ApiError> {
    let request = resolve_request(&state.catalog, payload)?;
    let response = build_simulate_response(request)?;
    debug!(
        product = %response.product.id,
        days = response.params.duration_days,
        points = response.result.ideal.series.len(),
        "simulation served"
    );
    Ok(json_response(StatusCode::OK, response))
}

async fn challenges_parse_handler(
    payload: Result<Json<ChallengePayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let records = match payload {
        ChallengePayload::Many(records) => records,
        ChallengePayload::One(record) => vec![*record],
    };
    let challenges = records.iter().map(ChallengeRecord::parse).collect();
    Ok(json_response(StatusCode::OK, ChallengesResponse { challenges }))
}

pub fn resolve_request(
    catalog: &ProductCatalog,
    payload: SimulatePayload,
) -> Result<SimulationRequest, ApiError> {
    let product_id = payload.product.as_deref().unwrap_or(DEFAULT_PRODUCT);
    let product = catalog
        .get(product_id)
        .cloned()
        .ok_or_else(|| ApiError::UnknownProduct(product_id.to_string()))?;

    let principal = payload.amount.unwrap_or(DEFAULT_AMOUNT);
    if !principal.is_finite() || principal <= 0.0 {
        return Err(ApiError::BadRequest("amount must be > 0".to_string()));
    }

    let duration_days = payload.days.unwrap_or(DEFAULT_DAYS);
    if !(1..=MAX_DAYS).contains(&duration_days) {
        return Err(ApiError::BadRequest(format!(
            "days must be between 1 and {MAX_DAYS}"
        )));
    }

    let deposit_amount = payload.deposits.unwrap_or(0.0);
    if !deposit_amount.is_finite() || deposit_amount < 0.0 {
        return Err(ApiError::BadRequest("deposits must be >= 0".to_string()));
    }

    let daily_rate = payload.daily_rate.unwrap_or(product.daily_rate);
    if !daily_rate.is_finite() {
        return Err(ApiError::BadRequest("dailyRate must be finite".to_string()));
    }

    let volatility = payload.volatility.unwrap_or(product.volatility);
    if !volatility.is_finite() || volatility < 0.0 {
        return Err(ApiError::BadRequest(
            "volatility must be finite and >= 0".to_string(),
        ));
    }

    let max_chart_points = payload.max_chart_points.unwrap_or(DEFAULT_MAX_CHART_POINTS);
    if max_chart_points == 0 {
        return Err(ApiError::BadRequest(
            "maxChartPoints must be > 0".to_string(),
        ));
    }

    let params = SimulationParams {
        principal,
        daily_rate,
        volatility,
        duration_days,
        deposit_amount,
        deposit_interval_days: payload.frequency.unwrap_or(0),
        max_chart_points,
    };

    Ok(SimulationRequest {
        product,
        params,
        seed: payload.seed,
    })
}

pub fn build_simulate_response(request: SimulationRequest) -> Result<SimulateResponse, ApiError> {
    let result = request.run()?;
    let estimated = estimated_final_amount(
        request.params.principal,
        request.params.daily_rate,
        request.params.duration_days,
    );

    Ok(SimulateResponse {
        product: request.product,
        params: request.params,
        seed: request.seed,
        estimated_final_amount: estimated,
        result,
    })
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
