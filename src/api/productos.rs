//! Producto catalog endpoints.

use crate::api::ApiError;
use crate::auth::{
    middleware::{exigir_rol, SOLO_ADMIN},
    models::Claims,
    AuthState,
};
use crate::store::{NuevoProducto, Producto};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct CrearProductoRequest {
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub puntos: Option<i64>,
    pub stock: Option<i64>,
    pub link_imagen: Option<String>,
    pub estado: Option<String>,
}

/// GET /api/productos (public catalog)
pub async fn listar(State(state): State<AuthState>) -> Result<Json<Vec<Producto>>, ApiError> {
    let productos = state
        .store
        .listar_productos_disponibles()
        .map_err(|_| ApiError::Interno)?;
    Ok(Json(productos))
}

/// POST /api/productos (admin)
pub async fn crear(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CrearProductoRequest>,
) -> Result<(StatusCode, Json<Producto>), ApiError> {
    exigir_rol(&claims, SOLO_ADMIN)?;

    let nombre = payload.nombre.filter(|n| !n.trim().is_empty());
    let (Some(nombre), Some(puntos)) = (nombre, payload.puntos) else {
        return Err(ApiError::CamposFaltantes(
            "Faltan campos obligatorios: nombre o puntos",
        ));
    };

    let nuevo = NuevoProducto {
        nombre,
        descripcion: payload.descripcion.unwrap_or_default(),
        puntos,
        stock: payload.stock.unwrap_or(0),
        link_imagen: payload.link_imagen.unwrap_or_default(),
        estado: payload
            .estado
            .unwrap_or_else(|| crate::store::ESTADO_DISPONIBLE.to_string()),
    };

    let producto = state
        .store
        .crear_producto(&nuevo)
        .map_err(|_| ApiError::Interno)?;

    info!("📦 Producto creado: {} (id {})", producto.nombre, producto.id);

    Ok((StatusCode::CREATED, Json(producto)))
}
