//! Environment configuration for the relay

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 12;
const DEFAULT_LOG_WRITE_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Which inference backend shape is deployed.
///
/// Decides the outbound payload, the inbound fields that are required, and
/// the answer fields the normalizer looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendMode {
    /// Extractive question answering over a supplied context
    #[default]
    QaPair,
    /// Single free-text prompt (text generation, summarization)
    FreeText,
    /// Instruction-tuned generation with sampling parameters
    Instruction,
}

impl BackendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendMode::QaPair => "qa",
            BackendMode::FreeText => "free-text",
            BackendMode::Instruction => "instruction",
        }
    }

    /// Answer keys to look for in a backend result, in priority order
    pub fn candidate_fields(self) -> &'static [&'static str] {
        match self {
            BackendMode::QaPair => &["answer", "generated_text"],
            BackendMode::FreeText | BackendMode::Instruction => &["generated_text", "summary_text"],
        }
    }

    /// Reply used when the backend answered but nothing usable came back
    pub fn no_answer_fallback(self) -> &'static str {
        match self {
            BackendMode::QaPair => "I'm sorry, I could not find an answer in the provided context.",
            BackendMode::FreeText | BackendMode::Instruction => {
                "I'm sorry, I couldn't come up with a response. Please try rephrasing your message."
            }
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qa" | "qa-pair" | "question-answering" => Ok(BackendMode::QaPair),
            "free-text" | "freetext" | "text" => Ok(BackendMode::FreeText),
            "instruction" | "instruct" => Ok(BackendMode::Instruction),
            _ => Err(ConfigError::Invalid {
                name: "RELAY_MODE",
                value: s.to_string(),
            }),
        }
    }
}

/// Sampling parameters sent with instruction-mode requests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    /// `false` requests deterministic (greedy) decoding
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 256,
            temperature: 0.7,
            top_p: 0.9,
            do_sample: true,
        }
    }
}

/// Full relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub mode: BackendMode,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub db_path: String,
    pub log_write_timeout: Duration,
    pub port: u16,
    pub generation: GenerationParams,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mode = match var("RELAY_MODE") {
            Some(raw) => raw.parse()?,
            None => BackendMode::default(),
        };

        let endpoint = var("INFERENCE_ENDPOINT").ok_or(ConfigError::Missing("INFERENCE_ENDPOINT"))?;

        let db_path = var("RELAY_DB_PATH").unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            format!("{home}/.chat-relay/interactions.db")
        });

        let defaults = GenerationParams::default();
        let generation = GenerationParams {
            max_new_tokens: parse_or("GEN_MAX_NEW_TOKENS", var("GEN_MAX_NEW_TOKENS"), defaults.max_new_tokens)?,
            temperature: parse_float_where(
                "GEN_TEMPERATURE",
                var("GEN_TEMPERATURE"),
                defaults.temperature,
                |t| t > 0.0,
            )?,
            top_p: parse_float_where("GEN_TOP_P", var("GEN_TOP_P"), defaults.top_p, |p| {
                p > 0.0 && p <= 1.0
            })?,
            do_sample: parse_or("GEN_DO_SAMPLE", var("GEN_DO_SAMPLE"), defaults.do_sample)?,
        };

        Ok(Self {
            mode,
            endpoint,
            api_key: var("INFERENCE_API_KEY"),
            connect_timeout: Duration::from_secs(parse_or(
                "INFERENCE_CONNECT_TIMEOUT_SECS",
                var("INFERENCE_CONNECT_TIMEOUT_SECS"),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )?),
            read_timeout: Duration::from_secs(parse_or(
                "INFERENCE_READ_TIMEOUT_SECS",
                var("INFERENCE_READ_TIMEOUT_SECS"),
                DEFAULT_READ_TIMEOUT_SECS,
            )?),
            db_path,
            log_write_timeout: Duration::from_millis(parse_or(
                "RELAY_LOG_WRITE_TIMEOUT_MS",
                var("RELAY_LOG_WRITE_TIMEOUT_MS"),
                DEFAULT_LOG_WRITE_TIMEOUT_MS,
            )?),
            port: parse_or("RELAY_PORT", var("RELAY_PORT"), DEFAULT_PORT)?,
            generation,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid {
                name,
                value: value.clone(),
            }),
        None => Ok(default),
    }
}

/// Parse a float that must be finite and satisfy `valid`.
fn parse_float_where(
    name: &'static str,
    raw: Option<String>,
    default: f32,
    valid: impl Fn(f32) -> bool,
) -> Result<f32, ConfigError> {
    let Some(value) = raw else {
        return Ok(default);
    };
    match value.trim().parse::<f32>() {
        Ok(parsed) if parsed.is_finite() && valid(parsed) => Ok(parsed),
        _ => Err(ConfigError::Invalid { name, value }),
    }
}
