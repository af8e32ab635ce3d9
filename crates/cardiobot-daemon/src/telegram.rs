//! Telegram transport adapter.
//!
//! Long-polls `getUpdates`, normalizes messages from the authorized user
//! into core intents, and delivers outbound messages. HTTP runs on the
//! shared tokio runtime via `Handle::block_on`; every request is bounded by
//! the client timeout.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use cardiobot_core::{Intent, IntentKind, Outbound};

use crate::config::TelegramConfig;

/// Reply to `/start` and `/help`, straight from the transport layer.
pub const HELP_TEXT: &str = "Команды бота:\n\n\
/morning - Начать утреннее измерение давления\n\
/evening - Начать вечернее измерение давления\n\
/cancel - Отменить текущее измерение\n\
/help - Показать эту справку\n\n\
Бот будет автоматически напоминать вам о необходимости измерения давления.";

/// One normalized inbound event.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Routed through the session store.
    Intent(Intent),
    /// Answered directly by the transport with [`HELP_TEXT`].
    Help { user_id: String },
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    chat: Chat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

pub struct TelegramClient {
    http: reqwest::Client,
    handle: Handle,
    api_base: String,
    token: String,
    authorized_user: String,
    long_poll_secs: u64,
    /// Next update id to request; advances past everything already seen.
    offset: AtomicI64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, handle: Handle) -> Result<Self, Box<dyn std::error::Error>> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.long_poll_secs + 10))
            .build()?;
        Ok(Self {
            http,
            handle,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            authorized_user: config.user_id.clone(),
            long_poll_secs: config.long_poll_secs,
            offset: AtomicI64::new(0),
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Fetch and normalize the next batch of updates. Blocks up to the
    /// long-poll window when nothing is pending.
    pub fn poll_events(&self) -> Result<Vec<InboundEvent>, Box<dyn std::error::Error>> {
        let url = self.api_url("getUpdates");
        let offset = self.offset.load(Ordering::SeqCst);
        let response: UpdatesResponse = self.handle.block_on(async {
            self.http
                .get(&url)
                .query(&[
                    ("timeout", self.long_poll_secs.to_string()),
                    ("offset", offset.to_string()),
                ])
                .send()
                .await?
                .error_for_status()?
                .json()
                .await
        })?;

        if !response.ok {
            return Err("telegram getUpdates answered ok=false".into());
        }

        let mut events = Vec::new();
        for update in response.result {
            self.offset.fetch_max(update.update_id + 1, Ordering::SeqCst);
            let Some(message) = update.message else {
                continue;
            };
            let chat_id = message.chat.id.to_string();
            if chat_id != self.authorized_user {
                debug!(chat_id = %chat_id, "update from unauthorized chat dropped");
                continue;
            }
            let Some(text) = message.text else {
                continue;
            };
            if let Some(event) = normalize(&chat_id, &text) {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Deliver one outbound message, retrying once with a warning on a
    /// transport error.
    pub fn send(&self, outbound: &Outbound) -> Result<(), Box<dyn std::error::Error>> {
        self.send_text(&outbound.user_id, &outbound.text)
    }

    pub fn send_text(&self, chat_id: &str, text: &str) -> Result<(), Box<dyn std::error::Error>> {
        let url = self.api_url("sendMessage");
        let body = json!({ "chat_id": chat_id, "text": text });

        for attempt in 1..=2 {
            let result = self.handle.block_on(async {
                self.http
                    .post(&url)
                    .json(&body)
                    .send()
                    .await?
                    .error_for_status()?;
                Ok::<_, reqwest::Error>(())
            });
            match result {
                Ok(()) => return Ok(()),
                Err(err) if attempt == 1 => {
                    warn!(error = %err, "send failed, retrying once");
                }
                Err(err) => return Err(err.into()),
            }
        }
        unreachable!("loop returns on the second attempt");
    }
}

/// Map one message to an inbound event. Unknown commands are ignored, any
/// other text feeds the active session.
fn normalize(user_id: &str, text: &str) -> Option<InboundEvent> {
    let trimmed = text.trim();
    let kind = match trimmed {
        "/start" | "/help" => {
            return Some(InboundEvent::Help {
                user_id: user_id.to_string(),
            })
        }
        "/morning" => IntentKind::StartMorning,
        "/evening" => IntentKind::StartEvening,
        "/cancel" => IntentKind::Cancel,
        other if other.starts_with('/') => {
            debug!(command = other, "unknown command ignored");
            return None;
        }
        other => IntentKind::TextInput {
            text: other.to_string(),
        },
    };
    Some(InboundEvent::Intent(Intent::new(user_id, kind, Utc::now())))
}
