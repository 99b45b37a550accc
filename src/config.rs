//! Configuration types for aether.

use std::path::{Path, PathBuf};

use aether_sources::SourcesConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AetherError, Result};
use crate::intent::IntentRules;
use crate::persona::{DEFAULT_TONE, ToneTable};

/// Environment variable that overrides [`ServerConfig::port`].
pub const PORT_ENV: &str = "AETHER_PORT";

/// Default for [`ServerConfig::max_sessions`].
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AetherConfig {
    /// HTTP transport settings.
    pub server: ServerConfig,
    /// Chat-completions settings.
    pub llm: LlmConfig,
    /// Content provider settings.
    pub sources: SourcesConfig,
    /// Tone table and starting tone.
    pub persona: PersonaConfig,
    /// Intent keyword tables.
    pub intent: IntentRules,
    /// Briefing card settings.
    pub briefing: BriefingConfig,
}

/// HTTP transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Live conversations kept in memory. The least recently used one is
    /// dropped when a new conversation would exceed this.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 5050,
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

/// OpenAI-compatible chat-completions settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL (without `/v1`).
    pub base_url: String,
    pub model: String,
    /// Inline API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Sampling temperature for conversational replies.
    pub reply_temperature: f32,
    /// Token cap for conversational replies.
    pub reply_max_tokens: u32,
    /// Timeout for conversational replies, in seconds.
    pub reply_timeout_seconds: u64,
    /// Timeout for query refinement, in seconds.
    pub refine_timeout_seconds: u64,
    /// Timeout for the briefing remark, in seconds.
    pub reflect_timeout_seconds: u64,
    /// Rewrite non-news queries into search phrases before fetching.
    pub refine_queries: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_owned(),
            reply_temperature: 0.8,
            reply_max_tokens: 600,
            reply_timeout_seconds: 50,
            refine_timeout_seconds: 8,
            reflect_timeout_seconds: 10,
            refine_queries: true,
        }
    }
}

/// Persona settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaConfig {
    /// Tone new sessions start in.
    pub default_tone: String,
    /// Tone labels, triggers and directives.
    pub tones: ToneTable,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            default_tone: DEFAULT_TONE.to_owned(),
            tones: ToneTable::default(),
        }
    }
}

/// Briefing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefingConfig {
    /// Fixed seed for headline shuffling. `None` seeds from entropy.
    pub shuffle_seed: Option<u64>,
}

impl AetherConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AetherError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AetherError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/aether/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("aether").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("aether")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/aether-config/config.toml")
        }
    }

    /// Apply `AETHER_PORT` if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`AetherError::Config`] if the variable is not a valid port.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var(PORT_ENV) {
            self.server.port = parse_port(&raw)?;
        }
        Ok(())
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AetherError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.sources
            .validate()
            .map_err(|e| AetherError::Config(e.to_string()))?;
        if self.server.max_sessions == 0 {
            return Err(AetherError::Config(
                "server.max_sessions must be greater than 0".into(),
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(AetherError::Config("llm.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.reply_temperature) {
            return Err(AetherError::Config(
                "llm.reply_temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.llm.reply_max_tokens == 0 {
            return Err(AetherError::Config(
                "llm.reply_max_tokens must be greater than 0".into(),
            ));
        }
        if self.llm.reply_timeout_seconds == 0
            || self.llm.refine_timeout_seconds == 0
            || self.llm.reflect_timeout_seconds == 0
        {
            return Err(AetherError::Config(
                "llm timeouts must be greater than 0".into(),
            ));
        }
        if !self
            .persona
            .tones
            .tones
            .iter()
            .any(|t| t.label == self.persona.default_tone)
        {
            return Err(AetherError::Config(format!(
                "persona.default_tone {:?} is not in the tone table",
                self.persona.default_tone
            )));
        }
        Ok(())
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    raw.trim()
        .parse::<u16>()
        .map_err(|_| AetherError::Config(format!("{PORT_ENV} is not a valid port: {raw:?}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AetherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5050);
        assert_eq!(config.server.max_sessions, DEFAULT_MAX_SESSIONS);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.persona.default_tone, "casual");
        assert_eq!(config.sources.news.max_items, 30);
        assert!(config.briefing.shuffle_seed.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AetherConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [llm]
            model = "gpt-4o"

            [sources.reddit]
            max_items = 50

            [briefing]
            shuffle_seed = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "gpt-4o");
        assert!((config.llm.reply_temperature - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.sources.reddit.max_items, 50);
        assert_eq!(config.briefing.shuffle_seed, Some(9));
        assert_eq!(config.persona.tones.tones.len(), 17);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AetherConfig::default();
        config.server.port = 6060;
        config.persona.default_tone = "comic".into();
        config.save_to_file(&path).unwrap();

        let loaded = AetherConfig::from_file(&path).unwrap();
        assert_eq!(loaded.server.port, 6060);
        assert_eq!(loaded.persona.default_tone, "comic");
        assert_eq!(loaded.intent, IntentRules::default());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = AetherConfig::from_file(Path::new("/nonexistent/aether.toml")).unwrap_err();
        assert!(matches!(err, AetherError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = AetherConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, AetherError::Config(_)));
    }

    #[test]
    fn unknown_default_tone_rejected() {
        let mut config = AetherConfig::default();
        config.persona.default_tone = "pirate".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("pirate"));
    }

    #[test]
    fn invalid_source_limits_surface_as_config_errors() {
        let mut config = AetherConfig::default();
        config.sources.youtube.max_items = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AetherError::Config(_)));
        assert!(err.to_string().contains("youtube.max_items"));
    }

    #[test]
    fn temperature_out_of_range_rejected() {
        let mut config = AetherConfig::default();
        config.llm.reply_temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_sessions_rejected() {
        let mut config = AetherConfig::default();
        config.server.max_sessions = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.max_sessions"));
    }

    #[test]
    fn port_parsing() {
        assert_eq!(parse_port(" 7070 ").unwrap(), 7070);
        assert!(parse_port("seventy").is_err());
        assert!(parse_port("70000").is_err());
    }
}
