use std::sync::Arc;

use axum::extract::{Path, Query, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use geojson::{Feature, FeatureCollection};
use nextbus::{AvailableRoutes, NextBus, PredictionReply, Status, StopExport, StopsChecksum};
use realtime::{Error, HttpError};
use serde::Deserialize;
use tracing::warn;

use crate::provider::Provider;

type HttpResult<T> = Result<Json<T>, HttpError>;

#[derive(Clone)]
pub struct AppState {
    service: Arc<NextBus<Provider>>,
    app_key: Option<Arc<str>>,
    operator_key: Option<Arc<str>>,
}

impl AppState {
    #[must_use]
    pub fn new(service: NextBus<Provider>, app_key: Option<String>, operator_key: Option<String>) -> Self {
        Self { service: Arc::new(service), app_key: app_key.map(Into::into), operator_key: operator_key.map(Into::into) }
    }
}

#[derive(Debug, Default, Deserialize)]
struct KeyParams {
    key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NearbyParams {
    n: Option<String>,
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/stopdb/db", get(stop_export))
        .route("/api/stop/{sid}", get(stop))
        .route("/api/near/{lat}/{lng}", get(nearby))
        .route("/api/bus/{vid}", get(bus))
        .route("/api/pattern/{pid}", get(pattern))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_app_key));

    let operator = Router::new()
        .route("/api/toggledisable", get(toggle_disable))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_operator_key))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_app_key));

    Router::new()
        .route("/api/availableroutes", get(available_routes))
        .route("/api/stopdb/checksum", get(stops_checksum))
        .route("/api/find/{q}", get(find))
        .route("/api/onroute/{rt}", get(on_route))
        .route("/api/isdisabled", get(is_disabled))
        .merge(protected)
        .merge(operator)
        .with_state(state)
}

async fn require_app_key(
    State(state): State<AppState>, Query(params): Query<KeyParams>, request: Request, next: Next,
) -> Result<Response, HttpError> {
    check_key(state.app_key.as_deref(), params.key.as_deref(), "app")?;
    Ok(next.run(request).await)
}

async fn require_operator_key(
    State(state): State<AppState>, Query(params): Query<OperatorParams>, request: Request, next: Next,
) -> Result<Response, HttpError> {
    // an operator key must be configured for the toggle to be usable at all
    let expected = state.operator_key.as_deref().unwrap_or_default();
    check_key(Some(expected), params.operator.as_deref(), "operator")?;
    Ok(next.run(request).await)
}

#[derive(Debug, Default, Deserialize)]
struct OperatorParams {
    operator: Option<String>,
}

fn check_key(expected: Option<&str>, given: Option<&str>, kind: &str) -> Result<(), Error> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if !expected.is_empty() && given == Some(expected) {
        return Ok(());
    }
    warn!(monotonic_counter.rejected_requests = 1, kind, "request without a valid key");
    Err(Error::Unauthorized(format!("a valid {kind} key is required")))
}

#[axum::debug_handler]
async fn available_routes(State(state): State<AppState>) -> HttpResult<AvailableRoutes> {
    Ok(Json(state.service.available_routes().await?))
}

#[axum::debug_handler]
async fn stops_checksum(State(state): State<AppState>) -> HttpResult<StopsChecksum> {
    Ok(Json(state.service.stops_checksum().await?))
}

#[axum::debug_handler]
async fn stop_export(State(state): State<AppState>) -> HttpResult<StopExport> {
    Ok(Json(state.service.stop_export().await?))
}

#[axum::debug_handler]
async fn stop(State(state): State<AppState>, Path(sid): Path<String>) -> HttpResult<PredictionReply> {
    Ok(Json(state.service.stop_predictions(&sid).await?))
}

#[axum::debug_handler]
async fn nearby(
    State(state): State<AppState>, Path((lat, lng)): Path<(String, String)>,
    Query(params): Query<NearbyParams>,
) -> HttpResult<FeatureCollection> {
    Ok(Json(state.service.nearby(&lat, &lng, params.n.as_deref()).await?))
}

#[axum::debug_handler]
async fn find(State(state): State<AppState>, Path(q): Path<String>) -> HttpResult<FeatureCollection> {
    Ok(Json(state.service.find(&q).await?))
}

#[axum::debug_handler]
async fn on_route(State(state): State<AppState>, Path(rt): Path<String>) -> HttpResult<FeatureCollection> {
    Ok(Json(state.service.vehicles_on_route(&rt).await?))
}

#[axum::debug_handler]
async fn bus(State(state): State<AppState>, Path(vid): Path<String>) -> HttpResult<Feature> {
    Ok(Json(state.service.vehicle(&vid).await?))
}

#[axum::debug_handler]
async fn pattern(State(state): State<AppState>, Path(pid): Path<String>) -> HttpResult<Feature> {
    Ok(Json(state.service.pattern(&pid).await?))
}

#[axum::debug_handler]
async fn is_disabled(State(state): State<AppState>) -> HttpResult<Status> {
    Ok(Json(state.service.status()))
}

#[axum::debug_handler]
async fn toggle_disable(State(state): State<AppState>) -> HttpResult<Status> {
    Ok(Json(state.service.toggle_disabled()))
}
