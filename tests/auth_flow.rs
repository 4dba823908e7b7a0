//! End-to-end tests for the auth surface.
//!
//! Each test builds the full router over a temporary SQLite database and
//! drives it with `tower::ServiceExt::oneshot`, so the gate, the handlers,
//! and the store run exactly as in production.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use canje_backend::{
    auth::{AuthState, JwtHandler},
    build_app,
    store::Store,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tower::ServiceExt;

fn app() -> (Router, NamedTempFile) {
    let temp = NamedTempFile::new().unwrap();
    let store = Arc::new(Store::new(temp.path().to_str().unwrap()).unwrap());
    let jwt = Arc::new(JwtHandler::new("secreto-de-integracion".to_string()));
    let state = AuthState::new(store, jwt, None, "http://localhost:5173".to_string(), false);
    (build_app(state), temp)
}

async fn enviar(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }

    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&v).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, body)
}

async fn registrar(app: &Router, nombre: &str, correo: &str, password: &str, rol: Option<&str>) {
    let mut cuerpo = json!({ "nombre": nombre, "correo": correo, "password": password });
    if let Some(r) = rol {
        cuerpo["rol"] = json!(r);
    }
    let (status, _) = enviar(app, Method::POST, "/api/auth/register", None, Some(cuerpo)).await;
    assert_eq!(status, StatusCode::OK);
}

async fn login(app: &Router, correo: &str, password: &str) -> String {
    let (status, body) = enviar(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "correo": correo, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn registro_devuelve_id_y_duplicado_409() {
    let (app, _temp) = app();

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "nombre": "Ana", "correo": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["id"].as_i64().unwrap() > 0);

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "nombre": "Otra", "correo": "a@x.com", "password": "secret2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "El correo ya está registrado");
}

#[tokio::test]
async fn login_y_verify_devuelven_la_misma_identidad() {
    let (app, _temp) = app();
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "correo": "a@x.com", "password": "mala" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Contraseña incorrecta");

    // Three consecutive logins each yield an independently valid token.
    for _ in 0..3 {
        let token = login(&app, "a@x.com", "secret1").await;
        let (status, body) =
            enviar(&app, Method::GET, "/api/auth/verify", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Autenticado");
        assert_eq!(body["usuario"]["correo"], "a@x.com");
        assert_eq!(body["usuario"]["rol"], "usuario");
    }
}

#[tokio::test]
async fn login_con_correo_desconocido() {
    let (app, _temp) = app();

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "correo": "nadie@x.com", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Usuario no encontrado");
}

#[tokio::test]
async fn gate_rechaza_sin_token_y_con_basura() {
    let (app, _temp) = app();

    let (status, body) = enviar(&app, Method::GET, "/api/auth/verify", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Token no proporcionado");

    let (status, body) =
        enviar(&app, Method::GET, "/api/auth/verify", Some("no.es.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token inválido o expirado");
}

#[tokio::test]
async fn logout_revoca_el_token() {
    let (app, _temp) = app();
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;
    let token = login(&app, "a@x.com", "secret1").await;

    let (status, body) =
        enviar(&app, Method::POST, "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sesión cerrada");

    // Unexpired, well-signed, but revoked: the gate must reject it.
    let (status, body) = enviar(&app, Method::GET, "/api/auth/verify", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token inválido o expirado");
}

#[tokio::test]
async fn cookie_autentica_cuando_falta_el_header() {
    let (app, _temp) = app();
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;
    let token = login(&app, "a@x.com", "secret1").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/verify")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_emite_cookie_de_sesion() {
    let (app, _temp) = app();
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "correo": "a@x.com", "password": "secret1" })).unwrap(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn flujo_completo_de_reset_password() {
    let (app, _temp) = app();

    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "nombre": "Ana",
            "correo": "a@x.com",
            "password": "secret1",
            "codigo": "C001",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Unknown business code is distinguishable (kept by design).
    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "codigo": "NOEXISTE" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Usuario no encontrado");

    // No mail transport configured: the response degrades to a debugToken.
    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "codigo": "C001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let debug_token = body["debugToken"].as_str().unwrap().to_string();
    assert_eq!(debug_token.len(), 48);

    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": debug_token, "password": "nueva123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Old password is gone; the new one works.
    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "correo": "a@x.com", "password": "secret1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    login(&app, "a@x.com", "nueva123").await;

    // Consumed exactly once.
    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/auth/reset-password",
        None,
        Some(json!({ "token": debug_token, "password": "otra456" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Token inválido");
}

#[tokio::test]
async fn registro_con_codigo_en_blanco_no_colisiona() {
    let (app, _temp) = app();

    // Whitespace-only codigo normalizes to NULL; two such registrations
    // must not trip the UNIQUE column.
    for (correo, codigo) in [("a@x.com", "   "), ("b@x.com", "")] {
        let (status, _) = enviar(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "nombre": "Ana",
                "correo": correo,
                "password": "secret1",
                "codigo": codigo,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn eliminar_usuario_con_reset_pendiente() {
    let (app, _temp) = app();
    registrar(&app, "Root", "admin@x.com", "admin123", Some("admin")).await;

    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "nombre": "Ana",
            "correo": "a@x.com",
            "password": "secret1",
            "codigo": "C001",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "codigo": "C001" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The outstanding reset token must not block the delete.
    let token_admin = login(&app, "admin@x.com", "admin123").await;
    let (status, body) = enviar(
        &app,
        Method::DELETE,
        "/api/usuarios/2",
        Some(&token_admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Usuario eliminado");
}

#[tokio::test]
async fn creacion_admin_respeta_conflictos_de_codigo() {
    let (app, _temp) = app();
    registrar(&app, "Root", "admin@x.com", "admin123", Some("admin")).await;
    let token_admin = login(&app, "admin@x.com", "admin123").await;

    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/usuarios",
        Some(&token_admin),
        Some(json!({
            "nombre": "Ana",
            "correo": "a@x.com",
            "password": "secret1",
            "codigo": "C9",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/usuarios",
        Some(&token_admin),
        Some(json!({
            "nombre": "Otra",
            "correo": "b@x.com",
            "password": "secret2",
            "codigo": "C9",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "El código ya está registrado");
}

#[tokio::test]
async fn rol_gate_en_administracion_de_usuarios() {
    let (app, _temp) = app();
    registrar(&app, "Root", "admin@x.com", "admin123", Some("admin")).await;
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;

    let token_admin = login(&app, "admin@x.com", "admin123").await;
    let token_usuario = login(&app, "a@x.com", "secret1").await;

    // The usuario role can list but not delete.
    let (status, _) = enviar(&app, Method::GET, "/api/usuarios", Some(&token_usuario), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = enviar(
        &app,
        Method::DELETE,
        "/api/usuarios/1",
        Some(&token_usuario),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "No tienes permisos para acceder a esta ruta");

    // Admin cannot delete themself (registered first, id 1).
    let (status, body) = enviar(
        &app,
        Method::DELETE,
        "/api/usuarios/1",
        Some(&token_admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No puedes eliminar tu propio usuario");

    // Deleting a missing account is 404.
    let (status, _) = enviar(
        &app,
        Method::DELETE,
        "/api/usuarios/999",
        Some(&token_admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting the other account succeeds.
    let (status, body) = enviar(
        &app,
        Method::DELETE,
        "/api/usuarios/2",
        Some(&token_admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Usuario eliminado");
}

#[tokio::test]
async fn actualizacion_con_lista_blanca_de_campos() {
    let (app, _temp) = app();
    registrar(&app, "Root", "admin@x.com", "admin123", Some("admin")).await;
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;

    let token_admin = login(&app, "admin@x.com", "admin123").await;
    let token_usuario = login(&app, "a@x.com", "secret1").await;

    // Self-update of an allow-listed field.
    let (status, _) = enviar(
        &app,
        Method::PUT,
        "/api/usuarios/2",
        Some(&token_usuario),
        Some(json!({ "nombre": "Ana María" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A non-admin cannot escalate via rol, even on their own row.
    let (status, _) = enviar(
        &app,
        Method::PUT,
        "/api/usuarios/2",
        Some(&token_usuario),
        Some(json!({ "rol": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nor touch someone else's row.
    let (status, _) = enviar(
        &app,
        Method::PUT,
        "/api/usuarios/1",
        Some(&token_usuario),
        Some(json!({ "nombre": "Hackeado" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin may grant points and roles.
    let (status, _) = enviar(
        &app,
        Method::PUT,
        "/api/usuarios/2",
        Some(&token_admin),
        Some(json!({ "puntos_totales": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Empty patch is a validation error.
    let (status, _) = enviar(
        &app,
        Method::PUT,
        "/api/usuarios/2",
        Some(&token_admin),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn productos_publicos_y_creacion_solo_admin() {
    let (app, _temp) = app();
    registrar(&app, "Root", "admin@x.com", "admin123", Some("admin")).await;
    registrar(&app, "Ana", "a@x.com", "secret1", None).await;

    // Public listing needs no token.
    let (status, body) = enviar(&app, Method::GET, "/api/productos", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);

    let token_admin = login(&app, "admin@x.com", "admin123").await;
    let token_usuario = login(&app, "a@x.com", "secret1").await;

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/productos",
        Some(&token_admin),
        Some(json!({ "nombre": "Taza", "puntos": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["estado"], "disponible");

    let (status, _) = enviar(
        &app,
        Method::POST,
        "/api/productos",
        Some(&token_usuario),
        Some(json!({ "nombre": "Gorra", "puntos": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = enviar(
        &app,
        Method::POST,
        "/api/productos",
        Some(&token_admin),
        Some(json!({ "descripcion": "sin nombre" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Faltan campos obligatorios: nombre o puntos");

    let (status, body) = enviar(&app, Method::GET, "/api/productos", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}
