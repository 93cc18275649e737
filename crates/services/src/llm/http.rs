use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use tutor_core::model::ConversationTurn;

use super::config::LlmConfig;
use super::transport::{LlmReply, LlmRequest, LlmTransport, TokenUsage};
use crate::error::{ErrorCode, LlmError};

/// Transport posting to the completion proxy endpoint.
#[derive(Clone)]
pub struct HttpLlmTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl HttpLlmTransport {
    #[must_use]
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint().to_string(),
            api_key: config.api_key().map(str::to_string),
            model: config.model().to_string(),
            max_tokens: config.max_tokens(),
        }
    }
}

#[async_trait]
impl LlmTransport for HttpLlmTransport {
    #[instrument(skip_all, level = "debug", fields(mode = %request.mode))]
    async fn send(&self, request: &LlmRequest) -> Result<LlmReply, LlmError> {
        let payload = WireRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &request.system,
            messages: &request.messages,
        };
        debug!(
            message_count = request.messages.len(),
            system_len = request.system.len(),
            model = %self.model,
            "sending completion request"
        );

        let mut builder = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<WireResponse>(&body);

        if !status.is_success() {
            let envelope = parsed.unwrap_or_default();
            let err = failure(status.as_u16(), envelope);
            warn!(status = status.as_u16(), code = %err.code(), "completion request failed");
            return Err(err);
        }

        let envelope = parsed.map_err(|e| LlmError::Decode(e.to_string()))?;
        if !envelope.success {
            let err = failure(status.as_u16(), envelope);
            warn!(code = %err.code(), "completion service reported an error");
            return Err(err);
        }

        let message = envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| LlmError::Decode("response has no message".into()))?;

        if let Some(usage) = envelope.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "completion received"
            );
        }

        Ok(LlmReply {
            message,
            usage: envelope.usage,
            is_mock: false,
        })
    }
}

fn failure(status: u16, envelope: WireResponse) -> LlmError {
    let code = envelope
        .error
        .as_deref()
        .map(ErrorCode::from_wire)
        .filter(|code| *code != ErrorCode::Unknown)
        .unwrap_or_else(|| ErrorCode::from_status(status));
    let message = envelope
        .message
        .or_else(|| Some(format!("API Error: {status}")));
    LlmError::from_code(code, message)
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ConversationTurn],
}

#[derive(Debug, Default, Deserialize)]
struct WireResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    error: Option<String>,
    usage: Option<TokenUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tutor_core::model::Mode;

    /// Serve exactly one HTTP exchange, returning the request body it saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0_u8; 4096];
            let request_body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let headers = text[..split].to_ascii_lowercase();
                    let length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if buf.len() >= split + 4 + length {
                        break text[split + 4..].to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request_body
        });
        (format!("http://{addr}/api/claude"), handle)
    }

    fn request() -> LlmRequest {
        LlmRequest {
            mode: Mode::Review,
            system: "system prompt".into(),
            messages: vec![
                ConversationTurn::user("hi"),
                ConversationTurn::assistant("hello"),
                ConversationTurn::user("what is osmosis?"),
            ],
            document_text: Arc::from("doc"),
            exam: None,
            reference_count: 0,
        }
    }

    fn transport(endpoint: &str) -> HttpLlmTransport {
        let config = LlmConfig::default()
            .with_endpoint(endpoint)
            .unwrap()
            .with_api_key("sk-test");
        HttpLlmTransport::new(&config)
    }

    #[tokio::test]
    async fn posts_wire_request_and_parses_success() {
        let (endpoint, server) = serve_once(
            "200 OK",
            r#"{"success":true,"message":"Osmosis is...","usage":{"input_tokens":12,"output_tokens":34}}"#,
        )
        .await;

        let reply = transport(&endpoint).send(&request()).await.unwrap();
        assert_eq!(reply.message, "Osmosis is...");
        assert_eq!(reply.usage, Some(TokenUsage { input_tokens: 12, output_tokens: 34 }));
        assert!(!reply.is_mock);

        let sent: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(sent["model"], "claude-sonnet-4-20250514");
        assert_eq!(sent["max_tokens"], 4096);
        assert_eq!(sent["system"], "system prompt");
        assert_eq!(sent["messages"].as_array().unwrap().len(), 3);
        assert_eq!(sent["messages"][1]["role"], "assistant");
        assert_eq!(sent["messages"][2]["content"], "what is osmosis?");
    }

    #[tokio::test]
    async fn maps_rate_limit_status() {
        let (endpoint, _server) = serve_once(
            "429 Too Many Requests",
            r#"{"success":false,"error":"RATE_LIMIT","message":"Rate limit exceeded. Please wait a moment."}"#,
        )
        .await;
        let err = transport(&endpoint).send(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::RateLimit);
    }

    #[tokio::test]
    async fn maps_overloaded_status_without_body() {
        let (endpoint, _server) = serve_once("529 Site Overloaded", "").await;
        let err = transport(&endpoint).send(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Overloaded);
    }

    #[tokio::test]
    async fn unknown_failure_keeps_message() {
        let (endpoint, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"success":false,"error":"UNKNOWN","message":"upstream exploded"}"#,
        )
        .await;
        let err = transport(&endpoint).send(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unknown);
        assert_eq!(err.to_string(), "upstream exploded");
    }

    #[tokio::test]
    async fn success_status_with_error_envelope_is_an_error() {
        let (endpoint, _server) = serve_once(
            "200 OK",
            r#"{"success":false,"error":"API_KEY_INVALID","message":"bad key"}"#,
        )
        .await;
        let err = transport(&endpoint).send(&request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ApiKeyInvalid);
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_error() {
        let (endpoint, _server) = serve_once("200 OK", "not json").await;
        let err = transport(&endpoint).send(&request()).await.unwrap_err();
        assert!(matches!(err, LlmError::Decode(_)));
    }
}
