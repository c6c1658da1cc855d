//! Slack integration — polls a channel's recent history for mentions.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::config::AccountConfig;
use crate::models::item::{ActionableItem, ItemKind, SourceType};
use crate::{AppError, Result};

use super::{Integration, IntegrationKey};

const DEFAULT_BASE_URL: &str = "https://slack.com/api";
const HISTORY_LIMIT: usize = 50;
const TITLE_LIMIT: usize = 80;

/// Polls a Slack channel via the Web API.
///
/// When the account settings carry a `user_id`, only messages mentioning
/// that user are surfaced; otherwise every plain channel message is.
pub struct SlackIntegration {
    key: IntegrationKey,
    enabled: bool,
    token: String,
    base_url: String,
    channel: Option<String>,
    user_id: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct HistoryResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    messages: Vec<HistoryMessage>,
}

#[derive(Deserialize)]
struct HistoryMessage {
    #[serde(rename = "type")]
    message_type: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: String,
    ts: String,
}

impl SlackIntegration {
    /// Construct a handle for one configured Slack account.
    #[must_use]
    pub fn new(account: &AccountConfig, client: reqwest::Client) -> Self {
        let base_url = account
            .settings
            .get("base_url")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self {
            key: IntegrationKey::new(SourceType::Slack, account.account_id.clone()),
            enabled: account.enabled,
            token: account.token.clone(),
            base_url,
            channel: account.settings.get("channel").cloned(),
            user_id: account.settings.get("user_id").cloned(),
            client,
        }
    }

    async fn fetch_history(&self) -> Result<Vec<ActionableItem>> {
        let channel = self.channel.as_deref().ok_or_else(|| {
            AppError::Poll(format!("no channel configured for {}", self.key))
        })?;
        let url = format!(
            "{}/conversations.history?channel={channel}&limit={HISTORY_LIMIT}",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| AppError::Poll(format!("slack history fetch failed: {err}")))?;
        let history: HistoryResponse = response
            .json()
            .await
            .map_err(|err| AppError::Poll(format!("slack history decode failed: {err}")))?;
        if !history.ok {
            return Err(AppError::Poll(format!(
                "slack history returned error: {}",
                history.error.unwrap_or_else(|| "unknown".to_owned())
            )));
        }

        let items = history
            .messages
            .iter()
            .filter(|msg| msg.message_type == "message" && msg.subtype.is_none())
            .filter(|msg| !msg.text.trim().is_empty())
            .filter(|msg| self.mentions_me(&msg.text))
            .map(|msg| self.to_item(msg, channel))
            .collect();
        Ok(items)
    }

    fn mentions_me(&self, text: &str) -> bool {
        match self.user_id.as_deref() {
            Some(user_id) => text.contains(&format!("<@{user_id}>")),
            None => true,
        }
    }

    fn to_item(&self, message: &HistoryMessage, channel: &str) -> ActionableItem {
        let title: String = message
            .text
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(TITLE_LIMIT)
            .collect();

        let mut item = ActionableItem::new(ItemKind::Message, SourceType::Slack, title);
        item.description = Some(message.text.clone());
        item.source_ref = Some(format!("{channel}:{}", message.ts));
        item.account_id = Some(self.key.account_id.clone());
        item.metadata = serde_json::json!({
            "sender": message.user,
            "channel": channel,
            "ts": message.ts,
        });
        item
    }
}

impl Integration for SlackIntegration {
    fn key(&self) -> &IntegrationKey {
        &self.key
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn authenticate(&self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move {
            if self.token.is_empty() {
                return Err(AppError::Auth(format!("no token configured for {}", self.key)));
            }
            let url = format!("{}/auth.test", self.base_url);
            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|err| AppError::Auth(format!("slack auth test failed: {err}")))?;
            let envelope: ApiEnvelope = response
                .json()
                .await
                .map_err(|err| AppError::Auth(format!("slack auth decode failed: {err}")))?;
            if !envelope.ok {
                return Err(AppError::Auth(format!(
                    "slack auth rejected: {}",
                    envelope.error.unwrap_or_else(|| "unknown".to_owned())
                )));
            }
            Ok(true)
        })
    }

    fn poll(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ActionableItem>>> + Send + '_>> {
        Box::pin(self.fetch_history())
    }
}
