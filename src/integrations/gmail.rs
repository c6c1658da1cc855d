//! Gmail integration — polls unread inbox messages.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::config::AccountConfig;
use crate::models::item::{ActionableItem, ItemKind, SourceType};
use crate::{AppError, Result};

use super::{Integration, IntegrationKey};

const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";
const MAX_MESSAGES: usize = 25;

/// Polls a Gmail mailbox for unread messages via the REST API.
pub struct GmailIntegration {
    key: IntegrationKey,
    enabled: bool,
    token: String,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    id: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

impl GmailIntegration {
    /// Construct a handle for one configured Gmail account.
    #[must_use]
    pub fn new(account: &AccountConfig, client: reqwest::Client) -> Self {
        let base_url = account
            .settings
            .get("base_url")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        Self {
            key: IntegrationKey::new(SourceType::Gmail, account.account_id.clone()),
            enabled: account.enabled,
            token: account.token.clone(),
            base_url,
            client,
        }
    }

    async fn fetch_unread(&self) -> Result<Vec<ActionableItem>> {
        let list_url = format!(
            "{}/users/me/messages?q=is:unread%20in:inbox&maxResults={MAX_MESSAGES}",
            self.base_url
        );
        let response = self
            .client
            .get(&list_url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| AppError::Poll(format!("gmail message list failed: {err}")))?;
        let list: MessageListResponse = check_status(response, "gmail message list")
            .await?
            .json()
            .await
            .map_err(|err| AppError::Poll(format!("gmail message list decode failed: {err}")))?;

        let mut items = Vec::with_capacity(list.messages.len());
        for message_ref in list.messages.iter().take(MAX_MESSAGES) {
            items.push(self.fetch_message(&message_ref.id).await?);
        }
        Ok(items)
    }

    async fn fetch_message(&self, id: &str) -> Result<ActionableItem> {
        let url = format!(
            "{}/users/me/messages/{id}?format=metadata&metadataHeaders=Subject&metadataHeaders=From",
            self.base_url
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| AppError::Poll(format!("gmail message fetch failed: {err}")))?;
        let message: MessageResponse = check_status(response, "gmail message fetch")
            .await?
            .json()
            .await
            .map_err(|err| AppError::Poll(format!("gmail message decode failed: {err}")))?;

        Ok(self.to_item(message))
    }

    fn to_item(&self, message: MessageResponse) -> ActionableItem {
        let header = |name: &str| {
            message.payload.as_ref().and_then(|payload| {
                payload
                    .headers
                    .iter()
                    .find(|h| h.name.eq_ignore_ascii_case(name))
                    .map(|h| h.value.clone())
            })
        };
        let subject = header("Subject").unwrap_or_else(|| "(no subject)".to_owned());
        let sender = header("From");

        let mut item = ActionableItem::new(ItemKind::Email, SourceType::Gmail, subject);
        item.description = message.snippet.clone();
        item.source_ref = Some(message.id.clone());
        item.account_id = Some(self.key.account_id.clone());
        item.metadata = serde_json::json!({
            "sender": sender,
            "url": format!("https://mail.google.com/mail/u/0/#inbox/{}", message.id),
        });
        item
    }
}

/// Fail with `Auth` on credential rejections and `Poll` on other statuses.
async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(AppError::Auth(format!("{what} rejected: {status}")));
    }
    if !status.is_success() {
        return Err(AppError::Poll(format!("{what} returned {status}")));
    }
    Ok(response)
}

impl Integration for GmailIntegration {
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
            let url = format!("{}/users/me/profile", self.base_url);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await
                .map_err(|err| AppError::Auth(format!("gmail profile check failed: {err}")))?;
            check_status(response, "gmail profile check").await?;
            Ok(true)
        })
    }

    fn poll(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ActionableItem>>> + Send + '_>> {
        Box::pin(self.fetch_unread())
    }
}
