use std::env;
use std::fmt;
use std::time::Duration;

use tutor_core::model::HistoryWindow;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/claude";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_MOCK_DELAY: Duration = Duration::from_millis(1500);

const PLACEHOLDER_KEY: &str = "your_api_key_here";
const PLACEHOLDER_FRAGMENT: &str = "your-actual";

/// Settings for the completion endpoint.
#[derive(Clone)]
pub struct LlmConfig {
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    mock_delay: Duration,
    history_window: HistoryWindow,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            mock_delay: DEFAULT_MOCK_DELAY,
            history_window: HistoryWindow::Unbounded,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("mock_delay", &self.mock_delay)
            .field("history_window", &self.history_window)
            .finish()
    }
}

impl LlmConfig {
    /// Read settings from `TUTOR_AI_*` and `TUTOR_HISTORY_WINDOW`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a malformed endpoint or numeric value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`LlmConfig::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a malformed endpoint or numeric value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(endpoint) = non_blank(lookup("TUTOR_AI_ENDPOINT")) {
            config = config.with_endpoint(endpoint)?;
        }
        config.api_key = non_blank(lookup("TUTOR_AI_API_KEY"));
        if let Some(model) = non_blank(lookup("TUTOR_AI_MODEL")) {
            config.model = model;
        }
        if let Some(raw) = non_blank(lookup("TUTOR_AI_MAX_TOKENS")) {
            config.max_tokens = parse_number("TUTOR_AI_MAX_TOKENS", &raw)?;
        }
        if let Some(raw) = non_blank(lookup("TUTOR_HISTORY_WINDOW")) {
            let messages: usize = parse_number("TUTOR_HISTORY_WINDOW", &raw)?;
            config.history_window = match messages {
                0 => HistoryWindow::Unbounded,
                // A one-message window can never start on a user turn.
                1 => {
                    return Err(ConfigError::InvalidNumber {
                        name: "TUTOR_HISTORY_WINDOW",
                        value: raw,
                    });
                }
                n => HistoryWindow::LastMessages(n),
            };
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEndpoint` if `endpoint` is not an http(s) URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        match Url::parse(&endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {
                self.endpoint = endpoint;
                Ok(self)
            }
            _ => Err(ConfigError::InvalidEndpoint(endpoint)),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_mock_delay(mut self, delay: Duration) -> Self {
        self.mock_delay = delay;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, window: HistoryWindow) -> Self {
        self.history_window = window;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    #[must_use]
    pub fn mock_delay(&self) -> Duration {
        self.mock_delay
    }

    #[must_use]
    pub fn history_window(&self) -> HistoryWindow {
        self.history_window
    }

    /// False when the key is missing, blank, or still a template placeholder.
    #[must_use]
    pub fn has_usable_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| {
            let key = key.trim();
            !key.is_empty() && key != PLACEHOLDER_KEY && !key.contains(PLACEHOLDER_FRAGMENT)
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = LlmConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.max_tokens(), 4096);
        assert_eq!(config.history_window(), HistoryWindow::Unbounded);
        assert!(!config.has_usable_credential());
    }

    #[test]
    fn reads_all_variables() {
        let config = LlmConfig::from_lookup(lookup(&[
            ("TUTOR_AI_ENDPOINT", "https://tutor.example/api/claude"),
            ("TUTOR_AI_API_KEY", "sk-live"),
            ("TUTOR_AI_MODEL", "claude-test"),
            ("TUTOR_AI_MAX_TOKENS", "1024"),
            ("TUTOR_HISTORY_WINDOW", "20"),
        ]))
        .unwrap();

        assert_eq!(config.endpoint(), "https://tutor.example/api/claude");
        assert_eq!(config.api_key(), Some("sk-live"));
        assert_eq!(config.model(), "claude-test");
        assert_eq!(config.max_tokens(), 1024);
        assert_eq!(config.history_window(), HistoryWindow::LastMessages(20));
        assert!(config.has_usable_credential());
    }

    #[test]
    fn placeholder_keys_are_not_usable() {
        for key in ["", "   ", "your_api_key_here", "sk-your-actual-key"] {
            let config = LlmConfig::default().with_api_key(key);
            assert!(!config.has_usable_credential(), "{key:?} should be unusable");
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            LlmConfig::from_lookup(lookup(&[("TUTOR_AI_MAX_TOKENS", "lots")])),
            Err(ConfigError::InvalidNumber { name: "TUTOR_AI_MAX_TOKENS", .. })
        ));
        assert!(matches!(
            LlmConfig::from_lookup(lookup(&[("TUTOR_AI_ENDPOINT", "ftp://nope")])),
            Err(ConfigError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            LlmConfig::from_lookup(lookup(&[("TUTOR_HISTORY_WINDOW", "1")])),
            Err(ConfigError::InvalidNumber { name: "TUTOR_HISTORY_WINDOW", .. })
        ));
    }

    #[test]
    fn debug_output_hides_key() {
        let config = LlmConfig::default().with_api_key("sk-secret");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }
}
