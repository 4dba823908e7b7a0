//! Reset-Token Handshake
//! Mission: Single-use, time-bounded out-of-band password recovery

use crate::auth::models::Usuario;
use crate::mail::Mailer;
use crate::store::Store;
use anyhow::Result;
use chrono::Utc;
use rand::RngCore;
use std::sync::Arc;
use tracing::{info, warn};

/// Entropy of the opaque token, in raw bytes (hex-encoded on the wire).
pub const RESET_TOKEN_BYTES: usize = 24;

/// Reset tokens live one hour.
pub const RESET_TTL_SECS: i64 = 3600;

/// High-entropy opaque token, hex-encoded.
pub fn generar_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Outcome of the request/deliver steps.
#[derive(Debug)]
pub enum EntregaReset {
    /// Mail dispatched.
    Enviada,
    /// No transport, or the transport failed: the caller must surface the
    /// raw token for manual out-of-band completion.
    Degradada { debug_token: String },
}

/// Terminal failures of the consume step.
#[derive(Debug)]
pub enum ResetError {
    TokenNoEncontrado,
    TokenExpirado,
    Interno(anyhow::Error),
}

impl std::fmt::Display for ResetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetError::TokenNoEncontrado => write!(f, "Reset token not found"),
            ResetError::TokenExpirado => write!(f, "Reset token expired"),
            ResetError::Interno(e) => write!(f, "Reset failed: {e}"),
        }
    }
}

impl std::error::Error for ResetError {}

impl From<anyhow::Error> for ResetError {
    fn from(e: anyhow::Error) -> Self {
        ResetError::Interno(e)
    }
}

/// The three-step handshake: request, deliver, consume.
pub struct ResetService {
    store: Arc<Store>,
    mailer: Option<Mailer>,
    frontend_origin: String,
}

impl ResetService {
    pub fn new(store: Arc<Store>, mailer: Option<Mailer>, frontend_origin: String) -> Self {
        Self {
            store,
            mailer,
            frontend_origin,
        }
    }

    /// Steps 1-2: generate and store a token bound to the account, then
    /// deliver it best-effort. Transport failure degrades, never fails.
    pub async fn solicitar(&self, usuario: &Usuario) -> Result<EntregaReset> {
        let token = generar_token();
        let ahora = Utc::now().timestamp();
        self.store
            .crear_reset_token(&token, usuario.id, ahora + RESET_TTL_SECS, ahora)?;

        let Some(mailer) = &self.mailer else {
            info!(usuario_id = usuario.id, "Sin transporte de correo; entregando debugToken");
            return Ok(EntregaReset::Degradada { debug_token: token });
        };

        let enlace = format!("{}/reset-password?token={token}", self.frontend_origin);
        let texto = format!("Usa este enlace para restablecer tu contraseña: {enlace}");
        let html = format!(
            "<p>Para restablecer tu contraseña haz clic <a href=\"{enlace}\">aquí</a>. \
             El enlace expira en una hora.</p>"
        );

        match mailer
            .enviar(&usuario.correo, "Recupera tu contraseña", &texto, &html)
            .await
        {
            Ok(()) => Ok(EntregaReset::Enviada),
            Err(e) => {
                warn!(usuario_id = usuario.id, error = %e, "Fallo el envío de correo; entregando debugToken");
                Ok(EntregaReset::Degradada { debug_token: token })
            }
        }
    }

    /// Step 3: consume exactly once. The row is deleted on success, so a
    /// second presentation fails with `TokenNoEncontrado`.
    pub fn consumir(&self, token: &str, password_hash: &str) -> Result<(), ResetError> {
        let fila = self
            .store
            .buscar_reset_token(token)?
            .ok_or(ResetError::TokenNoEncontrado)?;

        if fila.expira_en < Utc::now().timestamp() {
            // The row is useless now; drop it at discovery.
            self.store.eliminar_reset_token(token)?;
            return Err(ResetError::TokenExpirado);
        }

        let actualizado = self.store.actualizar_password(fila.usuario_id, password_hash)?;
        self.store.eliminar_reset_token(token)?;

        if !actualizado {
            // Account deleted between request and consume.
            return Err(ResetError::TokenNoEncontrado);
        }

        info!(usuario_id = fila.usuario_id, "Contraseña restablecida");
        Ok(())
    }
}
