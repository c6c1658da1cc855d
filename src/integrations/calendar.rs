//! Calendar integration — polls the upcoming week's event feed.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::config::AccountConfig;
use crate::models::item::{ActionableItem, ItemKind, SourceType};
use crate::{AppError, Result};

use super::{Integration, IntegrationKey};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";
const LOOKAHEAD_DAYS: i64 = 7;
const MAX_EVENTS: usize = 25;

/// Polls a calendar event feed for upcoming events.
pub struct CalendarIntegration {
    key: IntegrationKey,
    enabled: bool,
    token: String,
    base_url: String,
    calendar_id: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Deserialize)]
struct Event {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "htmlLink", default)]
    html_link: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
    #[serde(default)]
    organizer: Option<EventOrganizer>,
}

#[derive(Deserialize)]
struct EventTime {
    #[serde(rename = "dateTime", default)]
    date_time: Option<String>,
}

#[derive(Deserialize)]
struct EventOrganizer {
    #[serde(default)]
    email: Option<String>,
}

impl CalendarIntegration {
    /// Construct a handle for one configured calendar account.
    #[must_use]
    pub fn new(account: &AccountConfig, client: reqwest::Client) -> Self {
        let base_url = account
            .settings
            .get("base_url")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        let calendar_id = account
            .settings
            .get("calendar_id")
            .cloned()
            .unwrap_or_else(|| "primary".to_owned());
        Self {
            key: IntegrationKey::new(SourceType::Calendar, account.account_id.clone()),
            enabled: account.enabled,
            token: account.token.clone(),
            base_url,
            calendar_id,
            client,
        }
    }

    async fn fetch_events(&self) -> Result<Vec<ActionableItem>> {
        let now = Utc::now();
        let horizon = now + chrono::Duration::days(LOOKAHEAD_DAYS);
        let url = format!(
            "{}/calendars/{}/events?singleEvents=true&orderBy=startTime\
             &timeMin={}&timeMax={}&maxResults={MAX_EVENTS}",
            self.base_url,
            self.calendar_id,
            now.to_rfc3339(),
            horizon.to_rfc3339(),
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| AppError::Poll(format!("calendar event fetch failed: {err}")))?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AppError::Auth(format!("calendar event fetch rejected: {status}")));
        }
        if !status.is_success() {
            return Err(AppError::Poll(format!("calendar event fetch returned {status}")));
        }
        let list: EventListResponse = response
            .json()
            .await
            .map_err(|err| AppError::Poll(format!("calendar event decode failed: {err}")))?;

        Ok(list.items.iter().map(|event| self.to_item(event)).collect())
    }

    fn to_item(&self, event: &Event) -> ActionableItem {
        let title = event
            .summary
            .clone()
            .unwrap_or_else(|| "(untitled event)".to_owned());
        let start = event
            .start
            .as_ref()
            .and_then(|time| time.date_time.as_deref())
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let mut item = ActionableItem::new(ItemKind::Event, SourceType::Calendar, title);
        item.description = event.description.clone();
        item.source_ref = Some(event.id.clone());
        item.due_hint = start;
        item.account_id = Some(self.key.account_id.clone());
        item.metadata = serde_json::json!({
            "sender": event.organizer.as_ref().and_then(|org| org.email.clone()),
            "url": event.html_link,
        });
        item
    }
}

impl Integration for CalendarIntegration {
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
            Ok(true)
        })
    }

    fn poll(&self) -> Pin<Box<dyn Future<Output = Result<Vec<ActionableItem>>> + Send + '_>> {
        Box::pin(self.fetch_events())
    }
}
