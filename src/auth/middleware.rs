//! Access-Control Gate
//! Mission: Resolve a request's token to an identity before handlers run

use crate::auth::api::AuthState;
use crate::auth::models::Claims;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::json;
use tracing::warn;

/// Name of the session cookie (fallback when the header is absent).
pub const COOKIE_TOKEN: &str = "token";

/// Allow-list for admin-only operations.
pub const SOLO_ADMIN: &[&str] = &["admin"];

/// Token from the `Authorization: Bearer` header, else the session cookie.
pub fn extraer_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let del_header = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    del_header.or_else(|| jar.get(COOKIE_TOKEN).map(|c| c.value().to_string()))
}

/// Gate applied to every protected route.
///
/// The revocation check runs before any signature/expiry trust: a revoked
/// token that would still verify must be rejected. On success the resolved
/// claims land in the request extensions.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extraer_token(req.headers(), &jar).ok_or(AuthError::TokenFaltante)?;

    let revocado = state.ledger.esta_revocado(&token).map_err(|e| {
        warn!(error = %e, "No se pudo consultar la lista de revocados");
        AuthError::Interno
    })?;
    if revocado {
        return Err(AuthError::TokenInvalido);
    }

    let claims = state
        .jwt
        .verificar_token(&token)
        .map_err(|_| AuthError::TokenInvalido)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Role gate: a separate step applied after authentication. Unknown role
/// strings are simply never in the allow-list.
pub fn exigir_rol(claims: &Claims, permitidos: &[&str]) -> Result<(), AuthError> {
    if permitidos.contains(&claims.rol.as_str()) {
        Ok(())
    } else {
        Err(AuthError::SinPermisos)
    }
}

/// Gate failures. Revoked, expired, and tampered tokens all collapse to
/// `TokenInvalido` on the wire; internally they are distinct paths.
#[derive(Debug)]
pub enum AuthError {
    TokenFaltante,
    TokenInvalido,
    SinPermisos,
    Interno,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, mensaje) = match self {
            AuthError::TokenFaltante => (StatusCode::FORBIDDEN, "Token no proporcionado"),
            AuthError::TokenInvalido => (StatusCode::UNAUTHORIZED, "Token inválido o expirado"),
            AuthError::SinPermisos => (
                StatusCode::FORBIDDEN,
                "No tienes permisos para acceder a esta ruta",
            ),
            AuthError::Interno => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor",
            ),
        };

        (status, Json(json!({ "message": mensaje }))).into_response()
    }
}
