//! Capability discovery routes.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Names of the environments the catalogue serves, in `Family-version`
/// form as clients expect them.
pub const AVAILABLE_ENVS: [&str; 11] = [
    "FrozenLake-4x4",
    "FrozenLake-8x8",
    "CliffWalking-v0",
    "Taxi-v3",
    "Blackjack-v1",
    "CartPole-v1",
    "MountainCar-v0",
    "Acrobot-v1",
    "Pendulum-v1",
    "GymWalk-v1",
    "QuadrotorSim-v0",
];

pub fn router() -> Router {
    Router::new()
        .route("/gymnasium", get(backend))
        .route("/gymnasium/envs", get(envs))
}

async fn backend() -> Json<Value> {
    Json(json!({ "message": "Gymnasium found on server" }))
}

async fn envs() -> Json<Value> {
    Json(json!({ "envs": AVAILABLE_ENVS }))
}
