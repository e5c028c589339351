//! Telegram delivery channel
//!
//! Posts rendered alerts to the Bot API. Groups upgraded to supergroups
//! report `migrate_to_chat_id`: the destination is swapped in place and the
//! same message resent once per hop, so the caller sees a single delivery.
//! The migrated id is logged so operators can update their configuration —
//! the next restart would otherwise resend through the old id again.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Errors that can occur during delivery
#[derive(Debug)]
pub enum NotifyError {
    /// Network-level failure reaching the Bot API
    Transport(String),
    /// The API rejected the message for a non-migration reason
    Rejected {
        status: u16,
        description: String,
        retry_after: Option<u64>,
    },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Transport(msg) => write!(f, "Telegram transport error: {}", msg),
            NotifyError::Rejected {
                status,
                description,
                retry_after,
            } => {
                write!(f, "Telegram API error ({}): {}", status, description)?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for NotifyError {}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    migrate_to_chat_id: Option<i64>,
    retry_after: Option<u64>,
}

/// Classified outcome of one sendMessage attempt
#[derive(Debug, PartialEq)]
enum SendOutcome {
    Delivered,
    Migrated(i64),
    Rejected {
        status: u16,
        description: String,
        retry_after: Option<u64>,
    },
}

fn classify_response(status: u16, success: bool, body: Option<ApiResponse>) -> SendOutcome {
    match body {
        Some(body) => {
            if body.ok {
                return SendOutcome::Delivered;
            }
            let parameters = body.parameters.unwrap_or(ResponseParameters {
                migrate_to_chat_id: None,
                retry_after: None,
            });
            if let Some(new_id) = parameters.migrate_to_chat_id {
                return SendOutcome::Migrated(new_id);
            }
            SendOutcome::Rejected {
                status,
                description: body
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
                retry_after: parameters.retry_after,
            }
        }
        // Unparseable body: trust the HTTP status
        None if success => SendOutcome::Delivered,
        None => SendOutcome::Rejected {
            status,
            description: "unparseable response body".to_string(),
            retry_after: None,
        },
    }
}

/// Client for delivering alerts to a Telegram chat
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a new notifier for the given bot token and chat
    pub fn new(token: String, chat_id: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token,
            chat_id,
        }
    }

    /// The current destination chat id (changes after a migration)
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    /// Deliver one HTML message.
    ///
    /// A migration signal updates the destination and resends transparently;
    /// every subsequent send uses the new id. Any other rejection is
    /// returned to the caller, who logs and drops the notification.
    pub async fn send(&mut self, text: &str) -> Result<(), NotifyError> {
        loop {
            let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
            let request = SendMessageRequest {
                chat_id: &self.chat_id,
                text,
                parse_mode: "HTML",
                disable_web_page_preview: false,
            };

            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| NotifyError::Transport(e.to_string()))?;

            let status = response.status();
            let body = response.json::<ApiResponse>().await.ok();

            match classify_response(status.as_u16(), status.is_success(), body) {
                SendOutcome::Delivered => return Ok(()),
                SendOutcome::Migrated(new_id) => {
                    let migrated = new_id.to_string();
                    if migrated == self.chat_id {
                        return Err(NotifyError::Rejected {
                            status: status.as_u16(),
                            description: "migration loop to current chat id".to_string(),
                            retry_after: None,
                        });
                    }
                    tracing::warn!(
                        from = %self.chat_id,
                        to = %migrated,
                        "Chat migrated; resending and switching destination. Update the configured chat id."
                    );
                    self.chat_id = migrated;
                }
                SendOutcome::Rejected {
                    status,
                    description,
                    retry_after,
                } => {
                    return Err(NotifyError::Rejected {
                        status,
                        description,
                        retry_after,
                    })
                }
            }
        }
    }
}
