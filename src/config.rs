use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::inference::openai::GROQ_BASE_URL;
use crate::tools::DEFAULT_TOOL_TIMEOUT;

pub const API_KEY_VAR: &str = "GROQ_API_KEY";
pub const WEATHER_API_KEY_VAR: &str = "WEATHER_API_KEY";
pub const MODEL_VAR: &str = "ALFRED_MODEL";
pub const BASE_URL_VAR: &str = "ALFRED_BASE_URL";

pub const DEFAULT_MODEL: &str = "gemma2-9b-it";

/// Agent loop configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Tool calls allowed per run before giving up with `ToolLoopExceeded`.
    pub max_tool_rounds: usize,
    pub tool_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            max_tokens: 1024,
            temperature: 0.1,
            max_tool_rounds: 10,
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// Everything needed to stand up the butler. Built once at startup and
/// handed to [`crate::Butler::from_settings`].
#[derive(Clone)]
pub struct Settings {
    pub api_key: String,
    pub weather_api_key: Option<String>,
    pub base_url: String,
    /// Guest list JSON; the bundled list is used when unset.
    pub guests_path: Option<PathBuf>,
    pub agent: AgentConfig,
}

impl Settings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            weather_api_key: None,
            base_url: GROQ_BASE_URL.into(),
            guests_path: None,
            agent: AgentConfig::default(),
        }
    }

    /// Read settings from the process environment. A missing model API key
    /// is fatal.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_key = get(API_KEY_VAR).ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;
        let mut settings = Self::new(api_key);
        settings.weather_api_key = get(WEATHER_API_KEY_VAR);
        if let Some(model) = get(MODEL_VAR) {
            settings.agent.model = model;
        }
        if let Some(url) = get(BASE_URL_VAR) {
            settings.base_url = url;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(API_KEY_VAR));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature",
                reason: format!("{} is outside 0.0..=2.0", self.agent.temperature),
            });
        }
        if self.agent.tool_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                field: "tool_timeout",
                reason: "must be greater than zero".into(),
            });
        }
        if self.agent.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field(
                "weather_api_key",
                &self.weather_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .field("guests_path", &self.guests_path)
            .field("agent", &self.agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_api_key_is_fatal() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(API_KEY_VAR)));

        let err = Settings::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(_)));
    }

    #[test]
    fn defaults_and_overrides() {
        let s = Settings::from_lookup(lookup(&[(API_KEY_VAR, "gsk_test")])).unwrap();
        assert_eq!(s.agent.model, DEFAULT_MODEL);
        assert_eq!(s.base_url, GROQ_BASE_URL);
        assert!(s.weather_api_key.is_none());
        assert_eq!(s.agent.max_tool_rounds, 10);

        let s = Settings::from_lookup(lookup(&[
            (API_KEY_VAR, "gsk_test"),
            (WEATHER_API_KEY_VAR, "owm"),
            (MODEL_VAR, "llama-3.1-8b-instant"),
            (BASE_URL_VAR, "http://localhost:8000"),
        ]))
        .unwrap();
        assert_eq!(s.weather_api_key.as_deref(), Some("owm"));
        assert_eq!(s.agent.model, "llama-3.1-8b-instant");
        assert_eq!(s.base_url, "http://localhost:8000");
    }

    #[test]
    fn rejects_bad_temperature() {
        let mut s = Settings::new("key");
        s.agent.temperature = 3.5;
        assert!(matches!(
            s.validate(),
            Err(ConfigError::Invalid { field: "temperature", .. })
        ));
    }

    #[test]
    fn debug_redacts_keys() {
        let mut s = Settings::new("gsk_secret");
        s.weather_api_key = Some("owm_secret".into());
        let out = format!("{s:?}");
        assert!(!out.contains("secret"), "{out}");
    }
}
