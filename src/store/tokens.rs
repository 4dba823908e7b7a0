//! Revoked-token and reset-token rows.
//!
//! Both tables are expiry-bounded; expired rows are swept on every insert
//! so storage stays proportional to live tokens.

use anyhow::{Context, Result};
use rusqlite::params;

use super::Store;

/// A stored password-reset token.
#[derive(Debug, Clone)]
pub struct ResetTokenRow {
    pub token: String,
    pub usuario_id: i64,
    pub expira_en: i64, // unix seconds
}

impl Store {
    /// Record a revoked token. `ahora` drives the lazy purge of rows whose
    /// own expiry has already passed.
    pub fn revocar_token(&self, token: &str, expira_en: i64, ahora: i64) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM tokens_revocados WHERE expira_en < ?1",
            params![ahora],
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO tokens_revocados (token, expira_en) VALUES (?1, ?2)",
            params![token, expira_en],
        )
        .context("Failed to record revoked token")?;

        Ok(())
    }

    /// Point lookup by exact token value.
    pub fn token_revocado(&self, token: &str) -> Result<bool> {
        let conn = self.conn()?;
        let existe: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tokens_revocados WHERE token = ?1)",
            params![token],
            |row| row.get(0),
        )?;
        Ok(existe)
    }

    #[cfg(test)]
    pub fn contar_tokens_revocados(&self) -> Result<i64> {
        let conn = self.conn()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM tokens_revocados", [], |row| row.get(0))?)
    }

    pub fn crear_reset_token(
        &self,
        token: &str,
        usuario_id: i64,
        expira_en: i64,
        ahora: i64,
    ) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM reset_tokens WHERE expira_en < ?1",
            params![ahora],
        )?;

        conn.execute(
            "INSERT INTO reset_tokens (token, usuario_id, expira_en) VALUES (?1, ?2, ?3)",
            params![token, usuario_id, expira_en],
        )
        .context("Failed to store reset token")?;

        Ok(())
    }

    pub fn buscar_reset_token(&self, token: &str) -> Result<Option<ResetTokenRow>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT token, usuario_id, expira_en FROM reset_tokens WHERE token = ?1")?;

        match stmt.query_row(params![token], |row| {
            Ok(ResetTokenRow {
                token: row.get(0)?,
                usuario_id: row.get(1)?,
                expira_en: row.get(2)?,
            })
        }) {
            Ok(fila) => Ok(Some(fila)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn eliminar_reset_token(&self, token: &str) -> Result<bool> {
        let conn = self.conn()?;
        let filas = conn.execute("DELETE FROM reset_tokens WHERE token = ?1", params![token])?;
        Ok(filas > 0)
    }
}
