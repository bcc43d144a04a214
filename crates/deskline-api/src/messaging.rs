//! Outbound messaging boundary.
//!
//! Callers treat every [`GatewayError`] as non-fatal: the resource mutation
//! that triggered the send has already committed, and nothing here retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReceipt {
    pub message_id: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("messaging gateway is not configured")]
    NotConfigured,

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_template_message(
        &self,
        recipient: &str,
        template: &str,
        parameters: &[String],
    ) -> Result<MessageReceipt, GatewayError>;
}

/// Reduces a phone number to its international digits: formatting
/// characters go, as does a leading `+` or `00`. Anything that is not 8 to 15
/// digits afterwards is rejected.
pub fn normalize_phone(raw: &str) -> Result<String, GatewayError> {
    let trimmed = raw.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut digits = String::with_capacity(body.len());
    for c in body.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return Err(GatewayError::InvalidRecipient(raw.to_string())),
        }
    }

    let digits = match digits.strip_prefix("00") {
        Some(rest) if !trimmed.starts_with('+') => rest.to_string(),
        _ => digits,
    };

    if !(8..=15).contains(&digits.len()) {
        return Err(GatewayError::InvalidRecipient(raw.to_string()));
    }
    Ok(digits)
}

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub api_base: String,
    pub token: String,
    pub phone_number_id: String,
    pub language: String,
}

/// WhatsApp Cloud API template sender.
pub struct WhatsAppGateway {
    client: Client,
    config: WhatsAppConfig,
}

impl WhatsAppGateway {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn payload(&self, to: &str, template: &str, parameters: &[String]) -> serde_json::Value {
        let parameters: Vec<_> = parameters
            .iter()
            .map(|text| json!({ "type": "text", "text": text }))
            .collect();
        json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": {
                "name": template,
                "language": { "code": self.config.language },
                "components": [{ "type": "body", "parameters": parameters }],
            },
        })
    }
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

#[async_trait]
impl MessagingGateway for WhatsAppGateway {
    async fn send_template_message(
        &self,
        recipient: &str,
        template: &str,
        parameters: &[String],
    ) -> Result<MessageReceipt, GatewayError> {
        let to = normalize_phone(recipient)?;
        let url = format!(
            "{}/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.phone_number_id
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.token)
            .json(&self.payload(&to, template, parameters))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: SendResponse = resp.json().await?;
        let message_id = sent
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .unwrap_or_default();
        debug!(template, message_id = %message_id, "Template message sent");
        Ok(MessageReceipt { message_id })
    }
}

/// Used when no WhatsApp credentials are configured.
pub struct DisabledGateway;

#[async_trait]
impl MessagingGateway for DisabledGateway {
    async fn send_template_message(
        &self,
        _recipient: &str,
        _template: &str,
        _parameters: &[String],
    ) -> Result<MessageReceipt, GatewayError> {
        Err(GatewayError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_formatting_is_stripped() {
        assert_eq!(normalize_phone("+34 600-111-222").unwrap(), "34600111222");
        assert_eq!(normalize_phone("0034 600 111 222").unwrap(), "34600111222");
        assert_eq!(normalize_phone("(555) 010.9999").unwrap(), "5550109999");
    }

    #[test]
    fn bad_phones_are_rejected() {
        for raw in ["", "1234567", "+1234567890123456", "34600abc222", "++34600111222"] {
            assert!(
                matches!(normalize_phone(raw), Err(GatewayError::InvalidRecipient(_))),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn template_payload_shape() {
        let gw = WhatsAppGateway::new(WhatsAppConfig {
            api_base: "https://example.invalid/v19.0".into(),
            token: "t".into(),
            phone_number_id: "42".into(),
            language: "es".into(),
        });
        let body = gw.payload("34600111222", "otp_code", &["123456".into()]);
        assert_eq!(body["to"], "34600111222");
        assert_eq!(body["template"]["name"], "otp_code");
        assert_eq!(body["template"]["language"]["code"], "es");
        assert_eq!(
            body["template"]["components"][0]["parameters"][0]["text"],
            "123456"
        );
    }

    #[tokio::test]
    async fn disabled_gateway_refuses() {
        let res = DisabledGateway
            .send_template_message("34600111222", "otp_code", &[])
            .await;
        assert!(matches!(res, Err(GatewayError::NotConfigured)));
    }
}
