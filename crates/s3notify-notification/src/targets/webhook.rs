use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, header::CONTENT_TYPE};
use s3notify_common::error::{NotifyError, Result};
use tracing::{debug, info};

use crate::{
    adapter::build_document,
    types::{Embed, UploadEvent, WebhookPayload},
};

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

/// Moves one serialized payload to the webhook endpoint. Implementations
/// report network failures as [`NotifyError::Transport`] and hand back every
/// response, whatever its status.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post_json(&self, endpoint: &str, body: Vec<u8>) -> Result<WebhookResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(NotifyError::transport)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post_json(&self, endpoint: &str, body: Vec<u8>) -> Result<WebhookResponse> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(NotifyError::transport)?;

        let status = response.status().as_u16();
        if status == StatusCode::NO_CONTENT.as_u16() {
            return Ok(WebhookResponse {
                status,
                body: String::new(),
            });
        }

        let body = response.text().await.map_err(NotifyError::transport)?;
        Ok(WebhookResponse { status, body })
    }
}

pub struct WebhookSender {
    endpoint: String,
    transport: Box<dyn WebhookTransport>,
}

impl WebhookSender {
    pub fn with_transport(endpoint: String, transport: Box<dyn WebhookTransport>) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    pub async fn notify(&self, event: &UploadEvent) -> Result<()> {
        let embed = build_document(event);
        self.send(embed, &event.bucket, &event.key).await
    }

    /// Delivers a single embed. Only `204 No Content` counts as success.
    pub async fn send(&self, embed: Embed, bucket: &str, key: &str) -> Result<()> {
        let payload = WebhookPayload::single(embed);
        let body = serde_json::to_vec(&payload)?;
        debug!(bytes = body.len(), "posting webhook payload");

        let response = self.transport.post_json(&self.endpoint, body).await?;
        if response.status != StatusCode::NO_CONTENT.as_u16() {
            return Err(NotifyError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }

        info!(bucket, key, "sent upload notification to webhook");
        Ok(())
    }
}
