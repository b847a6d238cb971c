//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini model used by the analytics agent.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Service configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the response store and the rendered report.
    pub data_dir: PathBuf,
    /// CSV file with one row per completed intake.
    pub responses_file: PathBuf,
    /// Plain-text audience report.
    pub report_file: PathBuf,
    /// HTTP port.
    pub port: u16,
    /// Gemini API key. Analytics queries are disabled without it.
    pub gemini_api_key: Option<SecretString>,
    pub model: String,
    /// Directory for daily-rolling log files (stderr only when unset).
    pub log_dir: Option<PathBuf>,
    /// Upper bound on LLM → tool round trips per analytics query.
    pub max_tool_iterations: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./data");
        Self {
            responses_file: data_dir.join("responses.csv"),
            report_file: data_dir.join("audience_report.txt"),
            data_dir,
            port: 5000,
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            log_dir: None,
            max_tool_iterations: 8,
        }
    }
}

impl AppConfig {
    /// Build the configuration from `WARMUP_*` and `GEMINI_API_KEY` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let data_dir = lookup("WARMUP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let responses_file = lookup("WARMUP_RESPONSES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("responses.csv"));
        let report_file = lookup("WARMUP_REPORT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("audience_report.txt"));

        let port = parse_or(&lookup, "WARMUP_PORT", defaults.port)?;
        let max_tool_iterations = parse_or(
            &lookup,
            "WARMUP_MAX_TOOL_ITERATIONS",
            defaults.max_tool_iterations,
        )?;

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            data_dir,
            responses_file,
            report_file,
            port,
            gemini_api_key,
            model: lookup("WARMUP_MODEL").unwrap_or(defaults.model),
            log_dir: lookup("WARMUP_LOG_DIR").map(PathBuf::from),
            max_tool_iterations,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
