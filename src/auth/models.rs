//! Authentication Models
//! Mission: Define user account and credential data structures

use serde::{Deserialize, Serialize};

/// Known role values. Roles are an open string enum at the data layer;
/// anything else is simply never in an allow-list.
pub const ROL_USUARIO: &str = "usuario";
pub const ROL_ADMIN: &str = "admin";

/// User account. The wire field names match the upstream API (Spanish).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: i64,
    pub nombre: String,
    pub apellido: Option<String>,
    pub documento: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub codigo: Option<String>,
    pub agencia: Option<String>,
    pub canal: Option<String>,
    pub perfil: Option<String>,
    pub correo: String,
    #[serde(skip_serializing, default)]
    pub password: String, // bcrypt hash - never serialize
    pub rol: String,
    pub puntos_totales: i64,
}

/// JWT claims payload.
///
/// `rol` is a snapshot taken at login; a role change on the account does
/// not take effect until the token expires (the token TTL is the upper
/// bound on role-change propagation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (usuario id)
    pub codigo: Option<String>,
    pub rol: String,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn usuario_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegistroRequest {
    pub nombre: String,
    pub apellido: Option<String>,
    pub documento: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub codigo: Option<String>,
    pub agencia: Option<String>,
    pub canal: Option<String>,
    pub perfil: Option<String>,
    pub correo: String,
    pub password: String,
    pub rol: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub correo: String,
    pub password: String,
}

/// Forgot-password request body (account located by business code)
#[derive(Debug, Deserialize)]
pub struct OlvidoPasswordRequest {
    pub codigo: String,
}

/// Reset-password request body
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Allow-listed update patch: one named optional field per mutable
/// attribute. Arbitrary key/value pass-through is deliberately not
/// supported; `rol` and `puntos_totales` are admin-only.
#[derive(Debug, Default, Deserialize)]
pub struct ActualizarUsuarioRequest {
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub documento: Option<String>,
    pub ruc: Option<String>,
    pub razon_social: Option<String>,
    pub agencia: Option<String>,
    pub canal: Option<String>,
    pub perfil: Option<String>,
    pub correo: Option<String>,
    pub password: Option<String>,
    pub rol: Option<String>,
    pub puntos_totales: Option<i64>,
}

impl ActualizarUsuarioRequest {
    /// True when no field is present at all.
    pub fn vacio(&self) -> bool {
        self.nombre.is_none()
            && self.apellido.is_none()
            && self.documento.is_none()
            && self.ruc.is_none()
            && self.razon_social.is_none()
            && self.agencia.is_none()
            && self.canal.is_none()
            && self.perfil.is_none()
            && self.correo.is_none()
            && self.password.is_none()
            && self.rol.is_none()
            && self.puntos_totales.is_none()
    }

    /// True when the patch touches admin-only fields.
    pub fn toca_campos_privilegiados(&self) -> bool {
        self.rol.is_some() || self.puntos_totales.is_some()
    }
}

#[cfg(test)]
pub(crate) fn usuario_de_prueba() -> Usuario {
    Usuario {
        id: 1,
        nombre: "Ana".to_string(),
        apellido: None,
        documento: None,
        ruc: None,
        razon_social: None,
        codigo: Some("C001".to_string()),
        agencia: None,
        canal: None,
        perfil: None,
        correo: "a@x.com".to_string(),
        password: "$2b$10$secreto".to_string(),
        rol: ROL_USUARIO.to_string(),
        puntos_totales: 0,
    }
}
