//! Revocation Ledger
//! Mission: Deny tokens that must no longer be accepted, signed or not

use crate::auth::jwt::JwtHandler;
use crate::store::Store;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Expiry given to revoked tokens that do not parse. Garbage presented at
/// logout still gets recorded, it just ages out quickly.
const EXPIRACION_FALLBACK_SECS: i64 = 3600;

/// Denylist of raw token values, each bounded by the token's own expiry.
/// Rows past that expiry are purged lazily on insert; the underlying
/// token would fail verification anyway.
#[derive(Clone)]
pub struct RevocationLedger {
    store: Arc<Store>,
    jwt: Arc<JwtHandler>,
}

impl RevocationLedger {
    pub fn new(store: Arc<Store>, jwt: Arc<JwtHandler>) -> Self {
        Self { store, jwt }
    }

    /// Record a token as revoked. Never fails on malformed input: a token
    /// whose expiry cannot be recovered is stored with a short fallback.
    pub fn revocar(&self, token: &str) -> Result<()> {
        let ahora = Utc::now().timestamp();
        let expira_en = self
            .jwt
            .decodificar_expiracion(token)
            .unwrap_or(ahora + EXPIRACION_FALLBACK_SECS);

        debug!(expira_en, "Registrando token revocado");
        self.store.revocar_token(token, expira_en, ahora)
    }

    /// Point lookup. Checked BEFORE signature/expiry trust is extended on
    /// every protected request.
    pub fn esta_revocado(&self, token: &str) -> Result<bool> {
        self.store.token_revocado(token)
    }
}
