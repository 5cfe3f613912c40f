//! Per-family router for vectorized environment registries.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use rlenvs::env::{Action, Environment, Info};
use rlenvs::factory::MakeOptions;
use rlenvs::registry::ClientIndex;
use rlenvs::vector::{VecEnvRegistry, VECTORIZATION_MODE};

use crate::error::ApiError;
use crate::family::{self, IndexQuery, MakeBody};

#[derive(Deserialize)]
struct ResetBody {
    seed: Option<u64>,
    cidx: ClientIndex,
    #[serde(default)]
    options: Info,
}

#[derive(Deserialize)]
struct StepBody {
    actions: Vec<Action>,
    cidx: ClientIndex,
}

pub fn router<E: Environment + 'static>(registry: Arc<VecEnvRegistry<E>>) -> Router {
    Router::new()
        .route("/action-space", get(action_space::<E>))
        .route("/vec-mode", get(vec_mode))
        .route("/is-alive", get(is_alive::<E>))
        .route("/make", post(make::<E>))
        .route("/close", post(close::<E>))
        .route("/reset", post(reset::<E>))
        .route("/step", post(step::<E>))
        .route("/sync", post(family::sync))
        .with_state(registry)
}

async fn action_space<E: Environment + 'static>(
    State(registry): State<Arc<VecEnvRegistry<E>>>,
) -> Json<Value> {
    Json(json!({ "action_space": registry.action_space().describe() }))
}

async fn vec_mode() -> Json<Value> {
    Json(json!({ "vector_mode": VECTORIZATION_MODE }))
}

async fn is_alive<E: Environment + 'static>(
    State(registry): State<Arc<VecEnvRegistry<E>>>,
    Query(query): Query<IndexQuery>,
) -> Result<Json<Value>, ApiError> {
    let alive = registry.is_alive(query.cidx)?;
    Ok(Json(json!({ "result": alive })))
}

async fn make<E: Environment + 'static>(
    State(registry): State<Arc<VecEnvRegistry<E>>>,
    Json(body): Json<MakeBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let num_envs = registry.make(
        body.cidx,
        body.version.as_deref(),
        &MakeOptions::new(body.options),
    )?;
    info!(
        "created {} copies of {} at index {}",
        num_envs,
        registry.family(),
        body.cidx
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "result": true,
            "vector_mode": VECTORIZATION_MODE,
            "num_envs": num_envs,
        })),
    ))
}

async fn close<E: Environment + 'static>(
    State(registry): State<Arc<VecEnvRegistry<E>>>,
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
    State(registry): State<Arc<VecEnvRegistry<E>>>,
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
    State(registry): State<Arc<VecEnvRegistry<E>>>,
    Json(body): Json<StepBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let time_step = registry.step(body.cidx, &body.actions)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "time_step": time_step })),
    ))
}
