//! Notification dispatch boundary.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::DispatchError;
use crate::notification::Notification;

/// Delivers a rendered notification. Best-effort: the pipeline logs a
/// failure and never retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Telegram Bot API `sendMessage`.
pub struct TelegramNotifier {
    http: reqwest::Client,
    endpoint: String,
    default_chat: Option<String>,
}

impl TelegramNotifier {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        default_chat: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Http(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), bot_token),
            default_chat,
        })
    }

    fn payload(&self, notification: &Notification) -> Result<Value, DispatchError> {
        let chat_id = notification
            .channel
            .as_ref()
            .or(self.default_chat.as_ref())
            .ok_or(DispatchError::NoChannel)?;
        Ok(telegram_payload(chat_id, notification))
    }
}

/// Request body for `sendMessage`.
pub fn telegram_payload(chat_id: &str, notification: &Notification) -> Value {
    let mut payload = json!({
        "chat_id": chat_id,
        "text": notification.text,
        "parse_mode": "Markdown",
        "disable_web_page_preview": true,
    });
    if !notification.buttons.is_empty() {
        payload["reply_markup"] = json!({ "inline_keyboard": notification.buttons });
    }
    payload
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
        let payload = self.payload(notification)?;
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DispatchError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DispatchError::Api {
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(chat = %payload["chat_id"], "notification delivered");
        Ok(())
    }
}

/// Writes notifications to the log instead of delivering them. Used when no
/// bot token is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
        let links: Vec<&str> = notification
            .buttons
            .iter()
            .flatten()
            .map(|b| b.url.as_str())
            .collect();
        tracing::info!(
            channel = ?notification.channel,
            links = ?links,
            "notification\n{}",
            notification.text
        );
        Ok(())
    }
}
