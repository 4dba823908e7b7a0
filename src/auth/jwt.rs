//! JWT Token Handler
//! Mission: Issue and verify signed, time-bounded session tokens

use crate::auth::models::{Claims, Usuario};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

/// Session token lifetime. Fixed policy constant; shorter TTLs used in
/// tests go through `with_ttl` and never change this default.
pub const TOKEN_TTL_SECS: i64 = 2 * 3600;

/// HS256 issuer/verifier. The signing secret is injected at construction
/// and is immutable process state from then on.
pub struct JwtHandler {
    secret: String,
    ttl: Duration,
}

impl JwtHandler {
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    /// Override the TTL. Test/dev use only.
    pub fn with_ttl(secret: String, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Issue a token carrying identity and a role snapshot.
    pub fn emitir_token(&self, usuario: &Usuario) -> Result<(String, i64)> {
        let ahora = Utc::now();
        let expira = ahora
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: usuario.id.to_string(),
            codigo: usuario.codigo.clone(),
            rol: usuario.rol.clone(),
            iat: ahora.timestamp() as usize,
            exp: expira.timestamp() as usize,
        };

        debug!(
            usuario_id = usuario.id,
            rol = %usuario.rol,
            "Emitiendo token de sesión"
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to sign token")?;

        Ok((token, self.ttl.num_seconds()))
    }

    /// Verify signature and expiry. Both failure modes collapse to one
    /// error so callers cannot distinguish tampered from expired.
    pub fn verificar_token(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .context("Token inválido o expirado")?;

        Ok(decoded.claims)
    }

    /// Recover the `exp` claim of a well-signed token without enforcing
    /// expiry. Used by the revocation ledger to bound a denylist row's
    /// lifetime. Returns None when the signature or format is bad.
    pub fn decodificar_expiracion(&self, token: &str) -> Option<i64> {
        let mut validation = Validation::default();
        validation.validate_exp = false;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .ok()
        .map(|data| data.claims.exp as i64)
    }
}
