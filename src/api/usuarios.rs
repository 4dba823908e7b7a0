//! Account administration endpoints.
//!
//! Listing requires any authenticated role; create/delete are admin-only.
//! Updates go through an allow-listed patch: non-admins may touch only
//! their own row and never `rol` or `puntos_totales`.

use crate::api::ApiError;
use crate::auth::{
    middleware::{exigir_rol, SOLO_ADMIN},
    models::{ActualizarUsuarioRequest, Claims, RegistroRequest, Usuario, ROL_ADMIN, ROL_USUARIO},
    password,
    AuthState,
};
use crate::store::{CambiosUsuario, NuevoUsuario};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

/// GET /api/usuarios (any authenticated role)
pub async fn listar(
    State(state): State<AuthState>,
    Extension(_claims): Extension<Claims>,
) -> Result<Json<Vec<Usuario>>, ApiError> {
    let usuarios = state.store.listar_usuarios().map_err(|_| ApiError::Interno)?;
    Ok(Json(usuarios))
}

/// POST /api/usuarios (admin)
pub async fn crear(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RegistroRequest>,
) -> Result<Json<Value>, ApiError> {
    exigir_rol(&claims, SOLO_ADMIN)?;

    if payload.nombre.trim().is_empty()
        || payload.correo.trim().is_empty()
        || payload.password.trim().is_empty()
    {
        return Err(ApiError::CamposFaltantes("Faltan campos obligatorios"));
    }

    if state
        .store
        .buscar_por_correo(&payload.correo)
        .map_err(|_| ApiError::Interno)?
        .is_some()
    {
        return Err(ApiError::CorreoRegistrado);
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
            .map_err(|_| ApiError::Interno)?
            .is_some()
        {
            return Err(ApiError::CodigoRegistrado);
        }
    }

    let password_hash =
        password::hash_password(&payload.password).map_err(|_| ApiError::Interno)?;

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
        .map_err(|_| ApiError::Interno)?;

    info!("✅ Usuario creado por admin: {} (id {})", nuevo.correo, id);

    Ok(Json(json!({
        "id": id,
        "nombre": nuevo.nombre,
        "correo": nuevo.correo,
        "rol": nuevo.rol,
    })))
}

/// PUT /api/usuarios/:id
pub async fn actualizar(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ActualizarUsuarioRequest>,
) -> Result<Json<Value>, ApiError> {
    let es_admin = claims.rol == ROL_ADMIN;

    if !es_admin {
        // Self-service only, and never the privileged fields.
        if claims.usuario_id() != Some(id) || payload.toca_campos_privilegiados() {
            return Err(ApiError::SinPermisos);
        }
    }

    if payload.vacio() {
        return Err(ApiError::SinCambios);
    }

    if let Some(correo) = payload.correo.as_deref() {
        let en_uso = state
            .store
            .buscar_por_correo(correo)
            .map_err(|_| ApiError::Interno)?
            .map(|u| u.id != id)
            .unwrap_or(false);
        if en_uso {
            return Err(ApiError::CorreoRegistrado);
        }
    }

    let password_hash = match payload.password.as_deref() {
        Some(p) if p.trim().is_empty() => {
            return Err(ApiError::CamposFaltantes("La contraseña no puede estar vacía"));
        }
        Some(p) => Some(password::hash_password(p).map_err(|_| ApiError::Interno)?),
        None => None,
    };

    let cambios = CambiosUsuario {
        nombre: payload.nombre,
        apellido: payload.apellido,
        documento: payload.documento,
        ruc: payload.ruc,
        razon_social: payload.razon_social,
        agencia: payload.agencia,
        canal: payload.canal,
        perfil: payload.perfil,
        correo: payload.correo,
        password: password_hash,
        rol: payload.rol,
        puntos_totales: payload.puntos_totales,
    };

    let filas = state
        .store
        .actualizar_usuario(id, &cambios)
        .map_err(|e| {
            warn!(usuario_id = id, error = %e, "Fallo al actualizar usuario");
            ApiError::Interno
        })?;

    if filas == 0 {
        return Err(ApiError::UsuarioNoEncontrado);
    }

    Ok(Json(json!({ "message": "Usuario actualizado" })))
}

/// DELETE /api/usuarios/:id (admin; never your own account)
pub async fn eliminar(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    exigir_rol(&claims, SOLO_ADMIN)?;

    if claims.usuario_id() == Some(id) {
        return Err(ApiError::NoPuedesEliminarte);
    }

    let eliminado = state
        .store
        .eliminar_usuario(id)
        .map_err(|_| ApiError::Interno)?;

    if !eliminado {
        return Err(ApiError::UsuarioNoEncontrado);
    }

    info!("🗑️  Usuario eliminado: {id}");

    Ok(Json(json!({ "message": "Usuario eliminado" })))
}
