//! HTTP service exposing the environment registries.
//!
//! One router per environment family, each owning its registry; the
//! registries are constructed here and injected as axum state, never held
//! as process globals.

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use rlenvs::registry::EnvRegistry;
use rlenvs::vector::VecEnvRegistry;
use rlenvs_envs::{
    AcrobotFactory, BlackjackFactory, CartPoleFactory, CliffWalkingFactory, FrozenLakeFactory,
    GymWalkFactory, MountainCarFactory, PendulumFactory, QuadrotorSimFactory, TaxiFactory,
};

pub mod api_info;
pub mod error;
pub mod family;
pub mod vector_family;

/// Build the full application router with fresh registries.
pub fn app() -> Router {
    let acrobot_single = family::router(Arc::new(EnvRegistry::new(
        "Acrobot",
        Box::new(AcrobotFactory),
    )));
    let acrobot_vector = vector_family::router(Arc::new(VecEnvRegistry::new(
        "Acrobot",
        Box::new(AcrobotFactory),
    )));

    let gymnasium = Router::new()
        .nest(
            "/frozen-lake-env",
            family::router(Arc::new(EnvRegistry::new(
                "FrozenLake",
                Box::new(FrozenLakeFactory),
            ))),
        )
        .nest(
            "/cliff-walking-env",
            family::router(Arc::new(EnvRegistry::new(
                "CliffWalking",
                Box::new(CliffWalkingFactory),
            ))),
        )
        .nest(
            "/taxi-env",
            family::router(Arc::new(EnvRegistry::new("Taxi", Box::new(TaxiFactory)))),
        )
        .nest(
            "/black-jack-env",
            family::router(Arc::new(EnvRegistry::new(
                "Blackjack",
                Box::new(BlackjackFactory),
            ))),
        )
        .nest(
            "/cart-pole-env",
            family::router(Arc::new(EnvRegistry::new(
                "CartPole",
                Box::new(CartPoleFactory),
            ))),
        )
        .nest(
            "/mountain-car-env",
            family::router(Arc::new(EnvRegistry::new(
                "MountainCar",
                Box::new(MountainCarFactory),
            ))),
        )
        .nest("/acrobot-env", acrobot_single.nest("/v", acrobot_vector))
        .nest(
            "/pendulum-env",
            family::router(Arc::new(EnvRegistry::new(
                "Pendulum",
                Box::new(PendulumFactory),
            ))),
        );

    Router::new()
        .nest("/api/gymnasium", gymnasium)
        .nest(
            "/api/gdrl/gym-walk-env",
            family::router(Arc::new(EnvRegistry::new(
                "GymWalk",
                Box::new(GymWalkFactory),
            ))),
        )
        .nest(
            "/api/gym-pybullet-drones/quadcopter-sim-env",
            family::router(Arc::new(EnvRegistry::new(
                "QuadrotorSim",
                Box::new(QuadrotorSimFactory),
            ))),
        )
        .nest("/api-info", api_info::router())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
