use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::advisory::engine::{apply_advisory_rules, evaluate_advisories};
use crate::advisory::AdvisoryEvent;
use crate::config::Config;
use crate::engine::predictor::predict;
use crate::engine::profiles::{crop_catalog, CropCatalogEntry};
use crate::engine::{PredictionResult, SoilReading, SoilType, WeatherReading};
use crate::store::cache::HistoryCache;
use crate::store::client::TableStore;
use crate::store::{FarmerProfile, PredictionRecord, ProfileChanges, RegionalAlert};

#[derive(Clone)]
struct ApiState {
    config: Config,
    db_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Deserialize)]
struct PredictRequest {
    crop_type: String,
    temperature: f64,
    humidity: f64,
    rainfall: f64,
    soil_type: String,
    soil_moisture: f64,
    user_id: Option<String>,
    #[serde(default = "default_true")]
    persist: bool,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    crop_type: String,
    result: PredictionResult,
    advisories: Vec<AdvisoryEvent>,
    persisted: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct HistoryRequest {
    user_id: Option<String>,
    crop_type: Option<String>,
    limit: Option<usize>,
    #[serde(default)]
    local: bool,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    user_id: String,
    records: Vec<PredictionRecord>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct AlertsRequest {
    region: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct AlertsResponse {
    alerts: Vec<RegionalAlert>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ProfileRequest {
    user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileUpdateRequest {
    user_id: Option<String>,
    #[serde(flatten)]
    changes: ProfileChangesInput,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct ProfileChangesInput {
    full_name: Option<String>,
    location: Option<String>,
    primary_crop: Option<String>,
    farm_size: Option<String>,
    phone: Option<String>,
}

impl From<ProfileChangesInput> for ProfileChanges {
    fn from(value: ProfileChangesInput) -> Self {
        Self {
            full_name: value.full_name,
            location: value.location,
            primary_crop: value.primary_crop,
            farm_size: value.farm_size,
            phone: value.phone,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct CropsResponse {
    crops: Vec<CropCatalogEntry>,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let state = ApiState {
        db_path: config.resolved_db_path(),
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/predict", post(predict_handler))
        .route("/v1/history", post(history))
        .route("/v1/alerts", post(alerts))
        .route("/v1/crops", get(crops))
        .route("/v1/profile", post(profile))
        .route("/v1/profile/update", post(profile_update))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("REST API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config.redacted())
}

async fn crops() -> Json<ApiResponse<CropsResponse>> {
    ok(CropsResponse {
        crops: crop_catalog(),
    })
}

async fn predict_handler(
    State(state): State<ApiState>,
    Json(request): Json<PredictRequest>,
) -> ApiResult<PredictResponse> {
    let soil_type = SoilType::from_str(&request.soil_type)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let weather = WeatherReading {
        temperature: request.temperature,
        humidity: request.humidity,
        rainfall: request.rainfall,
    };
    let soil = SoilReading {
        soil_type,
        moisture: request.soil_moisture,
    };

    let result = predict(&request.crop_type, &weather, &soil);

    let user_id = request
        .user_id
        .clone()
        .unwrap_or_else(|| state.config.farmer.user_id.clone());
    let record =
        PredictionRecord::from_result(&user_id, &request.crop_type, &result, &weather, &soil);

    let mut persisted = false;
    if request.persist {
        if user_id.trim().is_empty() {
            return Err(ApiError::bad_request(
                "user_id is required to persist a prediction",
            ));
        }
        let cache = open_cache(&state)?;
        cache.insert_prediction(&record).map_err(ApiError::internal)?;
        if let Some(store) = open_store(&state)? {
            store
                .insert_prediction(&record)
                .await
                .map_err(ApiError::internal)?;
        }
        persisted = true;
    }

    // Advisories are informational; collaborator failures here must not
    // sink the prediction itself.
    let recent_history = if user_id.trim().is_empty() {
        Vec::new()
    } else {
        open_cache(&state)
            .and_then(|cache| cache.load_history(&user_id, None, 20).map_err(ApiError::internal))
            .unwrap_or_else(|_| Vec::new())
    };
    let regional_alerts = match open_store(&state)? {
        Some(store) => store.active_alerts(region_filter(&state), 10).await.unwrap_or_else(|err| {
            warn!("failed fetching regional alerts: {err}");
            Vec::new()
        }),
        None => Vec::new(),
    };
    let advisories = apply_advisory_rules(
        evaluate_advisories(&request.crop_type, &result, &recent_history, &regional_alerts),
        &state.config,
    );

    Ok(ok(PredictResponse {
        crop_type: request.crop_type,
        result,
        advisories,
        persisted,
    }))
}

async fn history(
    State(state): State<ApiState>,
    Json(request): Json<HistoryRequest>,
) -> ApiResult<HistoryResponse> {
    let user_id = resolve_user(&state, request.user_id.as_deref())?;
    let limit = request.limit.unwrap_or(20).max(1);

    let records = if request.local {
        let cache = open_cache(&state)?;
        cache
            .load_history(&user_id, request.crop_type.as_deref(), limit)
            .map_err(ApiError::internal)?
    } else {
        match open_store(&state)? {
            Some(store) => store
                .load_predictions(&user_id, request.crop_type.as_deref(), limit)
                .await
                .map_err(ApiError::internal)?,
            None => {
                let cache = open_cache(&state)?;
                cache
                    .load_history(&user_id, request.crop_type.as_deref(), limit)
                    .map_err(ApiError::internal)?
            }
        }
    };

    Ok(ok(HistoryResponse { user_id, records }))
}

async fn alerts(
    State(state): State<ApiState>,
    Json(request): Json<AlertsRequest>,
) -> ApiResult<AlertsResponse> {
    let store = open_store(&state)?
        .ok_or_else(|| ApiError::bad_request("remote store is not configured"))?;
    let limit = request.limit.unwrap_or(10).max(1);
    let region = request
        .region
        .as_deref()
        .or_else(|| non_empty(&state.config.farmer.region));
    let alerts = store
        .active_alerts(region, limit)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(AlertsResponse { alerts }))
}

async fn profile(
    State(state): State<ApiState>,
    Json(request): Json<ProfileRequest>,
) -> ApiResult<Option<FarmerProfile>> {
    let user_id = resolve_user(&state, request.user_id.as_deref())?;
    let store = open_store(&state)?
        .ok_or_else(|| ApiError::bad_request("remote store is not configured"))?;
    let profile = store
        .load_profile(&user_id)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(profile))
}

async fn profile_update(
    State(state): State<ApiState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> ApiResult<&'static str> {
    let user_id = resolve_user(&state, request.user_id.as_deref())?;
    let changes: ProfileChanges = request.changes.into();
    if changes.is_empty() {
        return Err(ApiError::bad_request("no profile fields to update"));
    }
    let store = open_store(&state)?
        .ok_or_else(|| ApiError::bad_request("remote store is not configured"))?;
    store
        .update_profile(&user_id, &changes)
        .await
        .map_err(ApiError::internal)?;
    Ok(ok("updated"))
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

fn default_true() -> bool {
    true
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn region_filter(state: &ApiState) -> Option<&str> {
    non_empty(&state.config.farmer.region)
}

fn resolve_user(
    state: &ApiState,
    requested: Option<&str>,
) -> std::result::Result<String, ApiError> {
    let user_id = requested
        .map(str::to_string)
        .unwrap_or_else(|| state.config.farmer.user_id.clone());
    if user_id.trim().is_empty() {
        return Err(ApiError::bad_request(
            "user_id is required (flag, request body, or config)",
        ));
    }
    Ok(user_id)
}

fn open_cache(state: &ApiState) -> std::result::Result<HistoryCache, ApiError> {
    HistoryCache::open(&state.db_path).map_err(ApiError::internal)
}

/// Remote store handle, or None when the store is disabled/unconfigured.
fn open_store(state: &ApiState) -> std::result::Result<Option<TableStore>, ApiError> {
    if !state.config.store.enabled || state.config.store.url.trim().is_empty() {
        return Ok(None);
    }
    TableStore::new(&state.config.store)
        .map(Some)
        .map_err(ApiError::internal)
}
