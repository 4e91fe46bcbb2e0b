// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound sends through the Cloud API `messages` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use plugline_config::model::WhatsAppConfig;
use plugline_core::{
    AdapterType, ChannelAdapter, ConversationId, HealthStatus, MessageId, OutboundPayload,
    PluginAdapter, PluglineError,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentId>,
}

#[derive(Debug, Deserialize)]
struct SentId {
    id: String,
}

/// WhatsApp Cloud API sender implementing [`ChannelAdapter`].
#[derive(Debug, Clone)]
pub struct WhatsAppChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl WhatsAppChannel {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, PluglineError> {
        let token = config
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PluglineError::Config("whatsapp.access_token is not set".into()))?;
        let phone_number_id = config
            .phone_number_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| PluglineError::Config("whatsapp.phone_number_id is not set".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                PluglineError::Config(format!("invalid access token header value: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| PluglineError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/{}/{}/messages",
                config.base_url.trim_end_matches('/'),
                config.api_version,
                phone_number_id
            ),
        })
    }
}

/// Builds the JSON body for one outbound message.
pub fn message_body(to: &ConversationId, payload: &OutboundPayload) -> Value {
    match payload {
        OutboundPayload::Text(body) => json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to.as_str(),
            "type": "text",
            "text": {"body": body}
        }),
        OutboundPayload::Image { media_id, caption } => {
            let mut image = json!({"id": media_id});
            if let Some(caption) = caption {
                image["caption"] = json!(caption);
            }
            json!({
                "messaging_product": "whatsapp",
                "recipient_type": "individual",
                "to": to.as_str(),
                "type": "image",
                "image": image
            })
        }
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    async fn send(
        &self,
        to: &ConversationId,
        payload: OutboundPayload,
    ) -> Result<MessageId, PluglineError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&message_body(to, &payload))
            .send()
            .await
            .map_err(|e| PluglineError::Channel {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| PluglineError::Channel {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        if !status.is_success() {
            return Err(PluglineError::channel(format!(
                "WhatsApp API returned {status}: {body}"
            )));
        }

        let parsed: SendResponse =
            serde_json::from_str(&body).map_err(|e| PluglineError::Channel {
                message: format!("failed to parse send response: {e}"),
                source: Some(Box::new(e)),
            })?;
        let id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| MessageId(m.id))
            .ok_or_else(|| PluglineError::channel("send response carried no message id"))?;
        debug!(recipient = %to, message_id = %id, "WhatsApp message accepted");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> WhatsAppConfig {
        WhatsAppConfig {
            access_token: Some("tok".into()),
            phone_number_id: Some("123".into()),
            base_url: base_url.to_string(),
            ..Default::default()
        }
    }

    fn customer() -> ConversationId {
        ConversationId::new("2348011111111")
    }

    #[test]
    fn missing_credentials_are_config_errors() {
        let err = WhatsAppChannel::new(&WhatsAppConfig::default()).unwrap_err();
        assert!(err.to_string().contains("access_token"));
    }

    #[test]
    fn image_body_omits_absent_caption() {
        let body = message_body(
            &customer(),
            &OutboundPayload::Image {
                media_id: "m1".into(),
                caption: None,
            },
        );
        assert_eq!(body["image"], json!({"id": "m1"}));
    }

    #[tokio::test]
    async fn sends_text_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/123/messages"))
            .and(header("authorization", "Bearer tok"))
            .and(body_partial_json(json!({
                "messaging_product": "whatsapp",
                "to": "2348011111111",
                "type": "text",
                "text": {"body": "hello"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messaging_product": "whatsapp",
                "contacts": [{"input": "2348011111111", "wa_id": "2348011111111"}],
                "messages": [{"id": "wamid.out1"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let id = channel
            .send(&customer(), OutboundPayload::text("hello"))
            .await
            .unwrap();
        assert_eq!(id, MessageId("wamid.out1".into()));
    }

    #[tokio::test]
    async fn sends_image_by_media_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/123/messages"))
            .and(body_partial_json(json!({
                "type": "image",
                "image": {"id": "media-1", "caption": "📷 Image from SP-1234"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"messages": [{"id": "wamid.out2"}]})),
            )
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let payload = OutboundPayload::Image {
            media_id: "media-1".into(),
            caption: Some("📷 Image from SP-1234".into()),
        };
        assert!(channel.send(&customer(), payload).await.is_ok());
    }

    #[tokio::test]
    async fn api_error_is_channel_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"message": "Recipient phone number not in allowed list", "code": 131030}
            })))
            .mount(&server)
            .await;

        let channel = WhatsAppChannel::new(&config(&server.uri())).unwrap();
        let err = channel
            .send(&customer(), OutboundPayload::text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, PluglineError::Channel { .. }));
        assert!(err.to_string().contains("400"));
    }
}
