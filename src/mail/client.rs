//! Gmail REST adapter.
//!
//! Exposes exactly what the core needs from the provider: list/read message
//! summaries and send a message. Token lifecycle lives in [`TokenStore`];
//! this client only asks it for a bearer token per call.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AdapterError;
use crate::mail::auth::TokenStore;

/// Production Gmail API base URL.
const GMAIL_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// One listed message, reduced to the fields the agents consume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub snippet: String,
}

/// Receipt for a sent message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub message_id: String,
}

/// Gmail client over the REST API.
pub struct GmailClient {
    http: reqwest::Client,
    tokens: Arc<TokenStore>,
    base_url: String,
    from_address: String,
}

impl GmailClient {
    pub fn new(tokens: Arc<TokenStore>, http: reqwest::Client, from_address: &str) -> Self {
        Self {
            http,
            tokens,
            base_url: GMAIL_BASE.to_string(),
            from_address: from_address.to_string(),
        }
    }

    /// Point the client at an alternate API base (tests, proxies).
    pub fn with_base_url(
        tokens: Arc<TokenStore>,
        http: reqwest::Client,
        from_address: &str,
        base_url: &str,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::new(tokens, http, from_address)
        }
    }

    /// List up to `max_results` messages matching `query`, with headers
    /// resolved to `{id, subject, sender, snippet}`.
    pub async fn list_messages(
        &self,
        max_results: u32,
        query: Option<&str>,
    ) -> Result<Vec<MessageSummary>, AdapterError> {
        let token = self.tokens.access_token().await?;

        let mut request = self
            .http
            .get(format!("{}/users/me/messages", self.base_url))
            .bearer_auth(&token)
            .query(&[("maxResults", max_results.to_string())]);
        if let Some(q) = query {
            request = request.query(&[("q", q)]);
        }

        let listing: MessageListing = check(request.send().await)?
            .json()
            .await
            .map_err(|e| AdapterError::Http(format!("malformed list response: {e}")))?;

        let mut summaries = Vec::with_capacity(listing.messages.len());
        for entry in listing.messages {
            summaries.push(self.fetch_summary(&token, &entry.id).await?);
        }

        info!(count = summaries.len(), "Listed messages");
        Ok(summaries)
    }

    /// Send a message; returns the provider-assigned message id.
    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<SendReceipt, AdapterError> {
        let token = self.tokens.access_token().await?;

        let message = lettre::Message::builder()
            .from(self
                .from_address
                .parse()
                .map_err(|e| AdapterError::InvalidAddress(format!("from {:?}: {e}", self.from_address)))?)
            .to(to
                .parse()
                .map_err(|e| AdapterError::InvalidAddress(format!("to {to:?}: {e}")))?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| AdapterError::Encode(e.to_string()))?;

        let raw = URL_SAFE.encode(message.formatted());

        let response = check(
            self.http
                .post(format!("{}/users/me/messages/send", self.base_url))
                .bearer_auth(&token)
                .json(&serde_json::json!({ "raw": raw }))
                .send()
                .await,
        )?;

        let sent: SentMessage = response
            .json()
            .await
            .map_err(|e| AdapterError::Http(format!("malformed send response: {e}")))?;

        info!(message_id = %sent.id, to = to, "Message sent");
        Ok(SendReceipt {
            message_id: sent.id,
        })
    }

    async fn fetch_summary(
        &self,
        token: &str,
        id: &str,
    ) -> Result<MessageSummary, AdapterError> {
        let response = check(
            self.http
                .get(format!("{}/users/me/messages/{id}", self.base_url))
                .bearer_auth(token)
                .query(&[
                    ("format", "metadata"),
                    ("metadataHeaders", "Subject"),
                    ("metadataHeaders", "From"),
                ])
                .send()
                .await,
        )?;

        let detail: MessageDetail = response
            .json()
            .await
            .map_err(|e| AdapterError::Http(format!("malformed message response: {e}")))?;

        let header = |name: &str| {
            detail
                .payload
                .headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case(name))
                .map(|h| h.value.clone())
                .unwrap_or_default()
        };
        let subject = header("Subject");
        let sender = header("From");

        Ok(MessageSummary {
            id: detail.id,
            subject,
            sender,
            snippet: detail.snippet,
        })
    }
}

/// Map transport failures and non-2xx statuses to `AdapterError`.
fn check(
    result: Result<reqwest::Response, reqwest::Error>,
) -> Result<reqwest::Response, AdapterError> {
    let response = result.map_err(|e| AdapterError::Http(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdapterError::Api {
            status: status.as_u16(),
            message: format!("request to {} rejected", response.url().path()),
        });
    }
    Ok(response)
}

// ── Wire formats ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MessageListing {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageDetail {
    id: String,
    #[serde(default)]
    snippet: String,
    payload: MessagePayload,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_listing_tolerates_missing_messages_field() {
        let listing: MessageListing = serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(listing.messages.is_empty());
    }

    #[test]
    fn message_detail_parses_gmail_shape() {
        let raw = r#"{
            "id": "m-1",
            "snippet": "Quick question about the invoice",
            "payload": {
                "headers": [
                    {"name": "Subject", "value": "Invoice"},
                    {"name": "From", "value": "alice@example.com"}
                ]
            }
        }"#;
        let detail: MessageDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.id, "m-1");
        assert_eq!(detail.payload.headers.len(), 2);
    }
}
