//! Completion transport seam.
//!
//! The session talks to the model only through [`LlmTransport`]. Which
//! implementation it gets (HTTP or mock) is decided once, from the
//! configured credential, by [`transport_from_config`].

mod config;
mod http;
mod mock;
mod transport;

use std::sync::Arc;

use tracing::warn;

pub use crate::error::ErrorCode;
pub use config::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MOCK_DELAY, DEFAULT_MODEL, LlmConfig,
};
pub use http::HttpLlmTransport;
pub use mock::{MOCK_PREVIEW_CHARS, MockLlmTransport};
pub use transport::{LlmReply, LlmRequest, LlmTransport, TokenUsage};

/// Pick the transport for this configuration.
///
/// Without a usable credential the mock transport is returned and no network
/// call is ever made.
#[must_use]
pub fn transport_from_config(config: &LlmConfig) -> Arc<dyn LlmTransport> {
    if config.has_usable_credential() {
        Arc::new(HttpLlmTransport::new(config))
    } else {
        warn!("no usable API key configured; using mock responses");
        Arc::new(MockLlmTransport::new(config.mock_delay()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_selects_mock() {
        let transport = transport_from_config(&LlmConfig::default());
        assert!(transport.is_mock());

        let transport = transport_from_config(&LlmConfig::default().with_api_key("sk-real"));
        assert!(!transport.is_mock());
    }
}
