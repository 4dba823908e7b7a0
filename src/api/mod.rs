//! CRUD API Endpoints
//! Mission: Account administration and the producto catalog

pub mod productos;
pub mod usuarios;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors of the CRUD surface, mapped to `{"message": ...}` bodies.
#[derive(Debug)]
pub enum ApiError {
    CamposFaltantes(&'static str),
    SinPermisos,
    NoPuedesEliminarte,
    UsuarioNoEncontrado,
    CorreoRegistrado,
    CodigoRegistrado,
    SinCambios,
    Interno,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, mensaje) = match self {
            ApiError::CamposFaltantes(detalle) => (StatusCode::BAD_REQUEST, detalle),
            ApiError::SinPermisos => (
                StatusCode::FORBIDDEN,
                "No tienes permisos para acceder a esta ruta",
            ),
            ApiError::NoPuedesEliminarte => (
                StatusCode::BAD_REQUEST,
                "No puedes eliminar tu propio usuario",
            ),
            ApiError::UsuarioNoEncontrado => (StatusCode::NOT_FOUND, "Usuario no encontrado"),
            ApiError::CorreoRegistrado => (StatusCode::CONFLICT, "El correo ya está registrado"),
            ApiError::CodigoRegistrado => (StatusCode::CONFLICT, "El código ya está registrado"),
            ApiError::SinCambios => (StatusCode::BAD_REQUEST, "No hay campos para actualizar"),
            ApiError::Interno => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor",
            ),
        };

        (status, Json(json!({ "message": mensaje }))).into_response()
    }
}

impl From<crate::auth::middleware::AuthError> for ApiError {
    fn from(e: crate::auth::middleware::AuthError) -> Self {
        match e {
            crate::auth::middleware::AuthError::SinPermisos => ApiError::SinPermisos,
            _ => ApiError::Interno,
        }
    }
}
