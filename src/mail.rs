//! Outbound Mail
//! Mission: Best-effort delivery of transactional mail via an HTTP mail API

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use tracing::info;

/// One outbound message.
#[derive(Debug, Serialize)]
pub struct CorreoSaliente {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// JSON-over-HTTP mail transport (Resend/Mailgun-style endpoint).
/// Construction is optional: with no `MAIL_API_URL`/`MAIL_API_KEY` the
/// service runs without a transport and callers degrade gracefully.
#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl Mailer {
    pub fn new(client: reqwest::Client, api_url: String, api_key: String, from: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
        }
    }

    /// Build from environment. Returns None when the transport is not
    /// configured.
    pub fn desde_env(client: reqwest::Client) -> Option<Self> {
        let api_url = env::var("MAIL_API_URL").ok().filter(|v| !v.trim().is_empty())?;
        let api_key = env::var("MAIL_API_KEY").ok().filter(|v| !v.trim().is_empty())?;
        let from = env::var("MAIL_FROM")
            .unwrap_or_else(|_| "no-reply@canje.local".to_string());

        Some(Self::new(client, api_url, api_key, from))
    }

    /// Send one message. Errors are meant to be caught at the caller and
    /// downgraded, never propagated past the reset handshake boundary.
    pub async fn enviar(&self, to: &str, subject: &str, text: &str, html: &str) -> Result<()> {
        let correo = CorreoSaliente {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            text: text.to_string(),
            html: html.to_string(),
        };

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&correo)
            .send()
            .await
            .context("Mail API request failed")?;

        if !resp.status().is_success() {
            return Err(anyhow!("Mail API returned status {}", resp.status()));
        }

        info!(to, subject, "Correo enviado");
        Ok(())
    }
}
