//! Inference configuration, resolved once per process from the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ConfigError;

pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV_VAR: &str = "JARVIS_MODEL";
pub const SYSTEM_PROMPT_ENV_VAR: &str = "JARVIS_SYSTEM_PROMPT";
pub const TIMEOUT_ENV_VAR: &str = "JARVIS_TIMEOUT";

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Everything the inference client needs. Passed into constructors; nothing
/// reads the environment after this is built.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl InferenceConfig {
    /// Build the configuration from environment variables and the system
    /// prompt file. `model_override` (from `--model`) wins over `JARVIS_MODEL`.
    pub fn from_env(model_override: Option<&str>) -> Result<Self, ConfigError> {
        let api_key = env::var(API_KEY_ENV_VAR)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let prompt_path = system_prompt_path()?;
        let system_prompt = read_system_prompt(&prompt_path)?;

        let model = model_override
            .map(str::to_string)
            .or_else(|| env::var(MODEL_ENV_VAR).ok().filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let base_url = env::var(BASE_URL_ENV_VAR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        debug!(model = %model, base_url = %base_url, "loaded inference config");

        Ok(Self {
            api_key,
            model,
            system_prompt,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: get_timeout(),
        })
    }
}

/// Location of the system prompt: `JARVIS_SYSTEM_PROMPT` if set, otherwise
/// `<config dir>/jarvis/system_prompt.txt`.
pub fn system_prompt_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = env::var(SYSTEM_PROMPT_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|dir| dir.join("jarvis").join("system_prompt.txt"))
        .ok_or(ConfigError::NoConfigDirectory)
}

fn read_system_prompt(path: &Path) -> Result<String, ConfigError> {
    let display = path.display().to_string();
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::MissingSystemPrompt(display));
        }
        Err(source) => {
            return Err(ConfigError::UnreadableSystemPrompt {
                path: display,
                source,
            });
        }
    };

    let trimmed = contents.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptySystemPrompt(display));
    }
    Ok(trimmed.to_string())
}

/// Request timeout from `JARVIS_TIMEOUT` (seconds), defaulting to 120.
///
/// Logs a warning if the variable is set but not a valid number.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}
