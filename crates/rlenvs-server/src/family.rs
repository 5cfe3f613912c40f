//! Per-family router for single-instance environment registries.
//!
//! Every family exposes the same operation set; the handlers are generic
//! over the environment type and receive their registry as axum state.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use rlenvs::env::{Action, Environment, Info};
use rlenvs::factory::MakeOptions;
use rlenvs::registry::{ClientIndex, DynamicsView, EnvRegistry};

use crate::error::ApiError;

#[derive(Deserialize)]
pub(crate) struct IndexQuery {
    pub cidx: ClientIndex,
}

#[derive(Deserialize)]
pub(crate) struct MakeBody {
    pub version: Option<String>,
    pub cidx: ClientIndex,
    /// Family-specific options travel inline in the body
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

#[derive(Deserialize)]
struct ResetBody {
    seed: Option<u64>,
    cidx: ClientIndex,
    #[serde(default)]
    options: Info,
}

#[derive(Deserialize)]
struct StepBody {
    action: Action,
    cidx: ClientIndex,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DynamicsQuery {
    cidx: ClientIndex,
    state_id: u64,
    action_id: Option<u64>,
}

pub fn router<E: Environment + 'static>(registry: Arc<EnvRegistry<E>>) -> Router {
    Router::new()
        .route("/action-space", get(action_space::<E>))
        .route("/is-alive", get(is_alive::<E>))
        .route("/make", post(make::<E>))
        .route("/close", post(close::<E>))
        .route("/reset", post(reset::<E>))
        .route("/step", post(step::<E>))
        .route("/dynamics", get(dynamics::<E>))
        .route("/sync", post(sync))
        .with_state(registry)
}

async fn action_space<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
) -> Json<Value> {
    Json(json!({ "action_space": registry.action_space().describe() }))
}

async fn is_alive<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<Value>, ApiError> {
    let alive = registry.is_alive(query.cidx)?;
    Ok(Json(json!({ "result": alive })))
}

async fn make<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
    Json(body): Json<MakeBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    registry.make(
        body.cidx,
        body.version.as_deref(),
        &MakeOptions::new(body.options),
    )?;
    info!("created environment {} at index {}", registry.family(), body.cidx);
    Ok((StatusCode::CREATED, Json(json!({ "result": true }))))
}

async fn close<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
    Query(query): Query<IndexQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    registry.close(query.cidx)?;
    info!("closed environment {} at index {}", registry.family(), query.cidx);
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Environment is closed" })),
    ))
}

async fn reset<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
    Json(body): Json<ResetBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let time_step = registry.reset(body.cidx, body.seed, &body.options)?;
    info!("reset environment {} at index {}", registry.family(), body.cidx);
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "time_step": time_step })),
    ))
}

async fn step<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
    Json(body): Json<StepBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let time_step = registry.step(body.cidx, &body.action)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "time_step": time_step })),
    ))
}

/// Full per-state table when `actionId` is omitted (201), single
/// state-action branch list otherwise (200).
async fn dynamics<E: Environment + 'static>(
    State(registry): State<Arc<EnvRegistry<E>>>,
    Query(query): Query<DynamicsQuery>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let view = registry.dynamics(query.cidx, query.state_id, query.action_id)?;
    let status = match view {
        DynamicsView::Row(_) => StatusCode::CREATED,
        DynamicsView::Branches(_) => StatusCode::OK,
    };
    Ok((status, Json(json!({ "dynamics": view }))))
}

/// Placeholder kept for client compatibility; it has no effect.
pub(crate) async fn sync() -> (StatusCode, Json<Value>) {
    (StatusCode::ACCEPTED, Json(json!({ "message": "OK" })))
}
