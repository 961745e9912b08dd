//! Startup configuration
//!
//! Two sources:
//! - Environment variables (optionally from a `.env` file) for backends,
//!   seeding and the data directory.
//! - The data directory itself: `config.json` names the active persona, whose
//!   document lives next to it as `<activeFriend>.json`.
//!
//! Any problem here is fatal; the runner refuses to start.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::ollama::{DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_MODEL};
use crate::openai::DEFAULT_OPENAI_MODEL;
use crate::persona::PersonalityProfile;

pub const DEFAULT_DATA_DIR: &str = "friends_data";
const CONFIG_FILE: &str = "config.json";

// ============ Environment ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanProvider {
    OpenAI,
    Anthropic,
}

impl CleanProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanProvider::OpenAI => "openai",
            CleanProvider::Anthropic => "anthropic",
        }
    }
}

impl FromStr for CleanProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(CleanProvider::OpenAI),
            "anthropic" => Ok(CleanProvider::Anthropic),
            _ => Err(ConfigError::InvalidValue {
                key: "CLEAN_BACKEND".to_string(),
                message: format!("expected 'openai' or 'anthropic', got '{}'", s),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub data_dir: PathBuf,
    pub clean_provider: CleanProvider,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub ollama_enabled: bool,
    pub ollama_host: String,
    pub ollama_model: String,
    pub seed: Option<u64>,
}

impl BotConfig {
    /// Read the process environment, loading `.env` first when present
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = get("OPENAI_API_KEY");
        let anthropic_api_key = get("ANTHROPIC_API_KEY");

        let clean_provider = match get("CLEAN_BACKEND") {
            Some(value) => value.parse::<CleanProvider>()?,
            None if openai_api_key.is_none() && anthropic_api_key.is_some() => {
                CleanProvider::Anthropic
            }
            None => CleanProvider::OpenAI,
        };

        let ollama_enabled = match get("OLLAMA_ENABLED") {
            Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::InvalidValue {
                key: "OLLAMA_ENABLED".to_string(),
                message: format!("expected a boolean, got '{}'", value),
            })?,
            None => true,
        };

        let seed = match get("BUDDYBOT_SEED") {
            Some(value) => Some(value.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "BUDDYBOT_SEED".to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };

        Ok(Self {
            data_dir: get("BOT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            clean_provider,
            openai_api_key,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            anthropic_api_key,
            anthropic_model: get("ANTHROPIC_MODEL")
                .unwrap_or_else(|| crate::anthropic::CLAUDE_HAIKU.to_string()),
            ollama_enabled,
            ollama_host: get("OLLAMA_HOST").unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string()),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            seed,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============ Persona documents ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataDirConfig {
    active_friend: String,
    #[serde(default)]
    bot_name: Option<String>,
    #[serde(default)]
    bot_description: Option<String>,
}

/// The persona the process runs as, resolved at startup
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub bot_name: String,
    pub bot_description: Option<String>,
    pub personality: PersonalityProfile,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `config.json` and the active persona document from `dir`.
///
/// `botName` falls back to the persona's own name.
pub fn load_personality_profile(dir: &Path) -> Result<BotIdentity, ConfigError> {
    let config: DataDirConfig = read_json(&dir.join(CONFIG_FILE))?;

    let friend = config.active_friend.trim();
    if friend.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "activeFriend".to_string(),
            message: "must name a persona document".to_string(),
        });
    }

    let personality: PersonalityProfile = read_json(&dir.join(format!("{}.json", friend)))?;

    Ok(BotIdentity {
        bot_name: config
            .bot_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| personality.name.clone()),
        bot_description: config.bot_description,
        personality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("friends_data"));
        assert_eq!(config.clean_provider, CleanProvider::OpenAI);
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
        assert_eq!(config.ollama_host, "http://localhost:11434");
        assert_eq!(config.ollama_model, "mixtral:8x7b");
        assert!(config.ollama_enabled);
        assert!(config.openai_api_key.is_none());
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_anthropic_chosen_when_only_its_key_is_set() {
        let config = BotConfig::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "sk-ant")])).unwrap();
        assert_eq!(config.clean_provider, CleanProvider::Anthropic);

        let config = BotConfig::from_lookup(lookup(&[
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("OPENAI_API_KEY", "sk-oa"),
        ]))
        .unwrap();
        assert_eq!(config.clean_provider, CleanProvider::OpenAI);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = BotConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let err = BotConfig::from_lookup(lookup(&[("BUDDYBOT_SEED", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BUDDYBOT_SEED"));

        let err = BotConfig::from_lookup(lookup(&[("OLLAMA_ENABLED", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = BotConfig::from_lookup(lookup(&[("CLEAN_BACKEND", "gemini")])).unwrap_err();
        assert!(err.to_string().contains("CLEAN_BACKEND"));
    }

    #[test]
    fn test_seed_and_flags() {
        let config = BotConfig::from_lookup(lookup(&[
            ("BUDDYBOT_SEED", "42"),
            ("OLLAMA_ENABLED", "false"),
            ("CLEAN_BACKEND", "Anthropic"),
        ]))
        .unwrap();
        assert_eq!(config.seed, Some(42));
        assert!(!config.ollama_enabled);
        assert_eq!(config.clean_provider, CleanProvider::Anthropic);
    }

    #[test]
    fn test_clean_provider_parses() {
        assert_eq!(" OpenAI ".parse::<CleanProvider>().unwrap(), CleanProvider::OpenAI);
        assert_eq!("anthropic".parse::<CleanProvider>().unwrap(), CleanProvider::Anthropic);
        for provider in [CleanProvider::OpenAI, CleanProvider::Anthropic] {
            assert_eq!(provider.as_str().parse::<CleanProvider>().unwrap(), provider);
        }
        let err = "gemini".parse::<CleanProvider>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CLEAN_BACKEND"));
    }

    #[test]
    fn test_load_personality_profile() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"activeFriend": "bunty", "botDescription": "Your desi buddy"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("bunty.json"),
            r#"{"name": "Bunty", "systemPrompt": "You are Bunty.", "catchphrases": ["Big dawg!"]}"#,
        )
        .unwrap();

        let identity = load_personality_profile(dir.path()).unwrap();
        assert_eq!(identity.bot_name, "Bunty");
        assert_eq!(identity.bot_description.as_deref(), Some("Your desi buddy"));
        assert_eq!(identity.personality.catchphrases, vec!["Big dawg!"]);
    }

    #[test]
    fn test_bot_name_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.json"),
            r#"{"activeFriend": "bunty", "botName": "BuntyBot"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("bunty.json"), r#"{"name": "Bunty"}"#).unwrap();

        let identity = load_personality_profile(dir.path()).unwrap();
        assert_eq!(identity.bot_name, "BuntyBot");
        assert_eq!(identity.personality.name, "Bunty");
    }

    #[test]
    fn test_missing_persona_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), r#"{"activeFriend": "ghost"}"#).unwrap();

        let err = load_personality_profile(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(ref p) if p.ends_with("ghost.json")));
        assert!(err.to_string().contains("Please create a personality file"));
    }

    #[test]
    fn test_missing_config_and_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_personality_profile(dir.path()),
            Err(ConfigError::MissingFile(_))
        ));

        fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        assert!(matches!(
            load_personality_profile(dir.path()),
            Err(ConfigError::Parse { .. })
        ));

        fs::write(dir.path().join("config.json"), r#"{"activeFriend": "bunty"}"#).unwrap();
        fs::write(dir.path().join("bunty.json"), r#"{"catchphrases": []}"#).unwrap();
        assert!(matches!(
            load_personality_profile(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_blank_active_friend() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.json"), r#"{"activeFriend": " "}"#).unwrap();
        assert!(matches!(
            load_personality_profile(dir.path()),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
