//! Router assembly.
//!
//! Three tiers: public routes, the auth surface, and gated routes behind
//! the access-control gate. Role checks happen inside handlers, after the
//! gate has resolved an identity.

use crate::api;
use crate::auth::{api as auth_api, auth_middleware, AuthState};
use crate::middleware::request_logging;
use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Build the full application router over the shared state.
pub fn build_app(state: AuthState) -> Router {
    let rutas_publicas = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth_api::register))
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/logout", post(auth_api::logout))
        .route("/api/auth/forgot-password", post(auth_api::forgot_password))
        .route("/api/auth/reset-password", post(auth_api::reset_password))
        .route("/api/productos", get(api::productos::listar))
        .with_state(state.clone());

    let rutas_protegidas = Router::new()
        .route("/api/auth/verify", get(auth_api::verify))
        .route(
            "/api/usuarios",
            get(api::usuarios::listar).post(api::usuarios::crear),
        )
        .route(
            "/api/usuarios/:id",
            put(api::usuarios::actualizar).delete(api::usuarios::eliminar),
        )
        .route("/api/productos", post(api::productos::crear))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(rutas_publicas)
        .merge(rutas_protegidas)
        .layer(middleware::from_fn(request_logging))
}
