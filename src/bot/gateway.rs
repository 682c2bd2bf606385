//! Message gateway client - delivers replies through the Telegram Bot API.
//!
//! The gateway is stateless. Delivery failures are returned to the caller, which
//! logs them; nothing here retries.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

/// Outbound side of the chat platform.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Sends plain UTF-8 text to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SetWebhook<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "Option::default")]
    result: Option<T>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(Error::Gateway {
                message: format!(
                    "{method} failed: {}",
                    self.description.as_deref().unwrap_or("no description")
                ),
            });
        }
        self.result.ok_or_else(|| Error::Gateway {
            message: format!("{method} returned no result"),
        })
    }
}

/// The bot account as reported by `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotIdentity {
    /// Telegram id of the bot account
    pub id: i64,
    /// Display name of the bot
    pub first_name: String,
    /// Handle without the leading `@`
    #[serde(default)]
    pub username: Option<String>,
}

/// Telegram Bot API client. The token is part of the endpoint and never logged.
pub struct TelegramGateway {
    client: Client,
    endpoint: String,
}

impl TelegramGateway {
    /// Client for the Bot API at `api_url`, authenticated with `token`.
    #[must_use]
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(method, "Calling Telegram API");
        let response: ApiResponse<T> = self
            .client
            .post(format!("{}/{method}", self.endpoint))
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        response.into_result(method)
    }

    /// Validates the token and returns the bot account.
    pub async fn get_me(&self) -> Result<BotIdentity> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Registers `url` as the webhook the platform posts updates to.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let accepted: bool = self.call("setWebhook", &SetWebhook { url }).await?;
        if accepted {
            Ok(())
        } else {
            Err(Error::Gateway {
                message: format!("setWebhook refused {url}"),
            })
        }
    }
}

#[async_trait]
impl MessageGateway for TelegramGateway {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", &SendMessage { chat_id, text })
            .await?;
        Ok(())
    }
}
