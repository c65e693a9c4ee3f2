use std::{env, path::PathBuf, time::Duration};
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_EXPANDER_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_GENERATOR_MODEL: &str = "moonshotai/kimi-k2-instruct";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid { var: &'static str, value: String, reason: String },
}

/// Connection settings for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub api_key: String,
    pub base_url: String,
    pub expander_model: String,
    pub generator_model: String,
    pub expander_temperature: f32,
    pub generator_temperature: f32,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_API_BASE.to_string(),
            expander_model: DEFAULT_EXPANDER_MODEL.to_string(),
            generator_model: DEFAULT_GENERATOR_MODEL.to_string(),
            expander_temperature: 0.8,
            generator_temperature: 0.7,
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl ModelConfig {
    /// Key preview safe to put in logs.
    pub fn redacted_key(&self) -> String {
        if self.api_key.is_empty() {
            return "<unset>".to_string();
        }
        let prefix: String = self.api_key.chars().take(6).collect();
        format!("{prefix}...")
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub output_dir: PathBuf,
    pub bind_addr: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            output_dir: PathBuf::from("."),
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the config from an arbitrary variable source so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let text = |var: &str, default: String| {
            lookup(var).filter(|v| !v.trim().is_empty()).unwrap_or(default)
        };

        let model = ModelConfig {
            api_key: lookup("GROQ_API_KEY").unwrap_or_default().trim().to_string(),
            base_url: text("GROQ_API_BASE", defaults.model.base_url.clone())
                .trim_end_matches('/')
                .to_string(),
            expander_model: text("EXPANDER_MODEL", defaults.model.expander_model.clone()),
            generator_model: text("GENERATOR_MODEL", defaults.model.generator_model.clone()),
            expander_temperature: parse_or(&lookup, "EXPANDER_TEMPERATURE", defaults.model.expander_temperature)?,
            generator_temperature: parse_or(&lookup, "GENERATOR_TEMPERATURE", defaults.model.generator_temperature)?,
            timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", defaults.model.timeout.as_secs())?),
            max_retries: parse_or(&lookup, "MAX_RETRIES", defaults.model.max_retries)?,
        };

        Ok(Self {
            model,
            output_dir: lookup("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            bind_addr: text("BIND_ADDR", defaults.bind_addr),
            port: parse_or(&lookup, "PORT", defaults.port)?,
        })
    }
}

fn parse_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: value.clone(),
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(cfg.model.base_url, DEFAULT_API_BASE);
        assert_eq!(cfg.model.expander_model, DEFAULT_EXPANDER_MODEL);
        assert_eq!(cfg.model.generator_model, DEFAULT_GENERATOR_MODEL);
        assert_eq!(cfg.model.timeout, Duration::from_secs(60));
        assert_eq!(cfg.model.max_retries, 2);
        assert_eq!(cfg.port, 8080);
        assert!(cfg.model.api_key.is_empty());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("GROQ_API_KEY", " gsk_secret "),
            ("GROQ_API_BASE", "http://localhost:9000/v1/"),
            ("GENERATOR_MODEL", "llama-3.3-70b"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(cfg.model.api_key, "gsk_secret");
        assert_eq!(cfg.model.base_url, "http://localhost:9000/v1");
        assert_eq!(cfg.model.generator_model, "llama-3.3-70b");
        assert_eq!(cfg.model.timeout, Duration::from_secs(5));
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("MAX_RETRIES", "lots")])).unwrap_err();
        assert!(err.to_string().contains("MAX_RETRIES"));
    }

    #[test]
    fn key_is_redacted() {
        let model = ModelConfig { api_key: "gsk_abcdefghijkl".into(), ..ModelConfig::default() };
        assert_eq!(model.redacted_key(), "gsk_ab...");
        assert_eq!(ModelConfig::default().redacted_key(), "<unset>");
    }
}
