//! Authentication API Endpoints
//! Mission: Registration, login/logout, session verify, password recovery

use crate::auth::{
    jwt::JwtHandler,
    middleware::{extraer_token, COOKIE_TOKEN},
    models::{
        Claims, LoginRequest, OlvidoPasswordRequest, RegistroRequest, ResetPasswordRequest,
        ROL_USUARIO,
    },
    password,
    reset::{EntregaReset, ResetError, ResetService},
    revocation::RevocationLedger,
};
use crate::mail::Mailer;
use crate::store::{NuevoUsuario, Store};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    Extension, Json,
};
use axum_extra::extract::CookieJar;
use cookie::{time::Duration, Cookie, SameSite};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state. The signing secret lives inside `jwt`,
/// injected once at startup.
#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<Store>,
    pub jwt: Arc<JwtHandler>,
    pub ledger: RevocationLedger,
    pub reset: Arc<ResetService>,
    pub produccion: bool,
}

impl AuthState {
    pub fn new(
        store: Arc<Store>,
        jwt: Arc<JwtHandler>,
        mailer: Option<Mailer>,
        frontend_origin: String,
        produccion: bool,
    ) -> Self {
        let ledger = RevocationLedger::new(store.clone(), jwt.clone());
        let reset = Arc::new(ResetService::new(store.clone(), mailer, frontend_origin));

        Self {
            store,
            jwt,
            ledger,
            reset,
            produccion,
        }
    }
}

/// Session cookie: http-only, TTL-bound; Secure + SameSite=None only in
/// production (cross-site frontend), Lax otherwise.
fn cookie_sesion(token: &str, max_age_secs: i64, produccion: bool) -> String {
    let builder = Cookie::build((COOKIE_TOKEN, token))
        .path("/")
        .http_only(true)
        .max_age(Duration::seconds(max_age_secs));

    let cookie = if produccion {
        builder.secure(true).same_site(SameSite::None).build()
    } else {
        builder.same_site(SameSite::Lax).build()
    };

    cookie.to_string()
}

fn cookie_limpia(produccion: bool) -> String {
    cookie_sesion("", 0, produccion)
}

/// Register - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegistroRequest>,
) -> Result<Json<Value>, AuthApiError> {
    if payload.nombre.trim().is_empty()
        || payload.correo.trim().is_empty()
        || payload.password.trim().is_empty()
    {
        return Err(AuthApiError::CamposFaltantes);
    }

    if state
        .store
        .buscar_por_correo(&payload.correo)
        .map_err(|_| AuthApiError::Interno)?
        .is_some()
    {
        return Err(AuthApiError::CorreoRegistrado);
    }

    // Blank codigo is stored as NULL so the UNIQUE column never collides
    // on the empty string.
    let codigo = payload
        .codigo
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    if let Some(codigo) = codigo.as_deref() {
        if state
            .store
            .buscar_por_codigo(codigo)
            .map_err(|_| AuthApiError::Interno)?
            .is_some()
        {
            return Err(AuthApiError::CodigoRegistrado);
        }
    }

    let password_hash = password::hash_password(&payload.password).map_err(|e| {
        warn!(error = %e, "No se pudo hashear la contraseña");
        AuthApiError::Interno
    })?;

    let nuevo = NuevoUsuario {
        nombre: payload.nombre,
        apellido: payload.apellido,
        documento: payload.documento,
        ruc: payload.ruc,
        razon_social: payload.razon_social,
        codigo,
        agencia: payload.agencia,
        canal: payload.canal,
        perfil: payload.perfil,
        correo: payload.correo,
        password: password_hash,
        rol: payload.rol.unwrap_or_else(|| ROL_USUARIO.to_string()),
    };

    let id = state
        .store
        .crear_usuario(&nuevo)
        .map_err(|_| AuthApiError::Interno)?;

    info!("✅ Usuario registrado: {} (id {})", nuevo.correo, id);

    Ok(Json(json!({
        "message": "Usuario registrado correctamente",
        "id": id,
    })))
}

/// Login - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AuthApiError> {
    let usuario = state
        .store
        .buscar_por_correo(&payload.correo)
        .map_err(|_| AuthApiError::Interno)?
        .ok_or(AuthApiError::UsuarioNoEncontrado)?;

    let valida = password::verificar_password(&payload.password, &usuario.password)
        .map_err(|e| {
            warn!(usuario_id = usuario.id, error = %e, "Hash almacenado ilegible");
            AuthApiError::Interno
        })?;

    if !valida {
        warn!("❌ Intento de login fallido: {}", payload.correo);
        return Err(AuthApiError::PasswordIncorrecta);
    }

    let (token, expires_in) = state
        .jwt
        .emitir_token(&usuario)
        .map_err(|_| AuthApiError::Interno)?;

    info!("🔐 Login exitoso: {} ({})", usuario.correo, usuario.rol);

    let cookie = cookie_sesion(&token, expires_in, state.produccion);
    let cuerpo = Json(json!({
        "message": "Login exitoso",
        "token": token,
        "usuario": usuario,
    }));

    Ok((AppendHeaders([(header::SET_COOKIE, cookie)]), cuerpo).into_response())
}

/// Verify session - GET /api/auth/verify (protected)
///
/// Confirms the gate's claims against the live account row; the account
/// may have been deleted since the token was issued.
pub async fn verify(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, AuthApiError> {
    let id = claims.usuario_id().ok_or(AuthApiError::Interno)?;

    let usuario = state
        .store
        .buscar_por_id(id)
        .map_err(|_| AuthApiError::Interno)?
        .ok_or(AuthApiError::UsuarioNoExiste)?;

    Ok(Json(json!({
        "message": "Autenticado",
        "usuario": usuario,
    })))
}

/// Logout - POST /api/auth/logout
///
/// Records the presented token in the revocation ledger and clears the
/// session cookie. Malformed tokens are recorded too; logout never fails
/// on garbage input.
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, AuthApiError> {
    if let Some(token) = extraer_token(&headers, &jar) {
        state.ledger.revocar(&token).map_err(|e| {
            warn!(error = %e, "No se pudo registrar el token revocado");
            AuthApiError::Interno
        })?;
    }

    let cuerpo = Json(json!({ "message": "Sesión cerrada" }));
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie_limpia(state.produccion))]),
        cuerpo,
    )
        .into_response())
}

/// Forgot password - POST /api/auth/forgot-password
///
/// The unknown-codigo error is distinguishable on purpose: existing
/// clients rely on it. See the design notes before "hardening" this.
pub async fn forgot_password(
    State(state): State<AuthState>,
    Json(payload): Json<OlvidoPasswordRequest>,
) -> Result<Json<Value>, AuthApiError> {
    if payload.codigo.trim().is_empty() {
        return Err(AuthApiError::CamposFaltantes);
    }

    let usuario = state
        .store
        .buscar_por_codigo(&payload.codigo)
        .map_err(|_| AuthApiError::Interno)?
        .ok_or(AuthApiError::UsuarioNoEncontrado)?;

    let entrega = state
        .reset
        .solicitar(&usuario)
        .await
        .map_err(|_| AuthApiError::Interno)?;

    match entrega {
        EntregaReset::Enviada => Ok(Json(json!({
            "message": "Correo de recuperación enviado",
        }))),
        EntregaReset::Degradada { debug_token } => Ok(Json(json!({
            "message": "Correo de recuperación enviado",
            "debugToken": debug_token,
        }))),
    }
}

/// Reset password - POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AuthState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AuthApiError> {
    if payload.token.trim().is_empty() || payload.password.trim().is_empty() {
        return Err(AuthApiError::CamposFaltantes);
    }

    let password_hash = password::hash_password(&payload.password).map_err(|_| AuthApiError::Interno)?;

    state
        .reset
        .consumir(&payload.token, &password_hash)
        .map_err(|e| match e {
            ResetError::TokenNoEncontrado => AuthApiError::TokenInvalido,
            ResetError::TokenExpirado => AuthApiError::TokenExpirado,
            ResetError::Interno(causa) => {
                warn!(error = %causa, "Fallo al consumir reset token");
                AuthApiError::Interno
            }
        })?;

    Ok(Json(json!({
        "message": "Contraseña actualizada correctamente",
    })))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    CamposFaltantes,
    CorreoRegistrado,
    CodigoRegistrado,
    UsuarioNoEncontrado,
    PasswordIncorrecta,
    UsuarioNoExiste,
    TokenInvalido,
    TokenExpirado,
    Interno,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, mensaje) = match self {
            AuthApiError::CamposFaltantes => (StatusCode::BAD_REQUEST, "Faltan campos obligatorios"),
            AuthApiError::CorreoRegistrado => {
                (StatusCode::CONFLICT, "El correo ya está registrado")
            }
            AuthApiError::CodigoRegistrado => {
                (StatusCode::CONFLICT, "El código ya está registrado")
            }
            AuthApiError::UsuarioNoEncontrado => (StatusCode::BAD_REQUEST, "Usuario no encontrado"),
            AuthApiError::PasswordIncorrecta => (StatusCode::BAD_REQUEST, "Contraseña incorrecta"),
            AuthApiError::UsuarioNoExiste => (StatusCode::NOT_FOUND, "Usuario no encontrado"),
            AuthApiError::TokenInvalido => (StatusCode::BAD_REQUEST, "Token inválido"),
            AuthApiError::TokenExpirado => (StatusCode::BAD_REQUEST, "Token expirado"),
            AuthApiError::Interno => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error interno del servidor",
            ),
        };

        (status, Json(json!({ "message": mensaje }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_de_sesion_por_entorno() {
        let dev = cookie_sesion("abc", 7200, false);
        assert!(dev.contains("token=abc"));
        assert!(dev.contains("HttpOnly"));
        assert!(dev.contains("Max-Age=7200"));
        assert!(dev.contains("SameSite=Lax"));
        assert!(!dev.contains("Secure"));

        let prod = cookie_sesion("abc", 7200, true);
        assert!(prod.contains("Secure"));
        assert!(prod.contains("SameSite=None"));
    }

    #[test]
    fn test_cookie_limpia_expira() {
        let limpia = cookie_limpia(false);
        assert!(limpia.contains("token=;"));
        assert!(limpia.contains("Max-Age=0"));
    }

    #[test]
    fn test_codigos_de_error() {
        assert_eq!(
            AuthApiError::CorreoRegistrado.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthApiError::PasswordIncorrecta.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthApiError::UsuarioNoExiste.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthApiError::TokenExpirado.into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
