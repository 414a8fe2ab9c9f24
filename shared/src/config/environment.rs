//! Deployment environment and the log settings derived from it

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which backend project the app talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }

    pub fn is_development(&self) -> bool {
        *self == Environment::Development
    }

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    /// First of `ENVIRONMENT`, `ENV`, `RUST_ENV`; unknown values fall back to development
    pub fn from_env() -> Self {
        ["ENVIRONMENT", "ENV", "RUST_ENV"]
            .iter()
            .find_map(|key| std::env::var(key).ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    /// Per-environment dotenv file loaded after `.env`
    pub fn env_file(&self) -> String {
        format!(".env.{}", self.name())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "staging" | "preview" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

/// Output layout of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `aa_core=debug,info`
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,

    /// ANSI colours; off for JSON output
    #[serde(default)]
    pub ansi: bool,

    /// Attach file and line to each event
    #[serde(default)]
    pub with_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl LoggingConfig {
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self {
                filter: String::from("debug"),
                format: LogFormat::Pretty,
                ansi: true,
                with_location: true,
            },
            Environment::Staging => Self {
                filter: String::from("info"),
                format: LogFormat::Json,
                ansi: false,
                with_location: false,
            },
            Environment::Production => Self {
                filter: String::from("warn"),
                format: LogFormat::Json,
                ansi: false,
                with_location: false,
            },
        }
    }

    /// Environment defaults, overridden by `LOG_LEVEL` and `LOG_FORMAT`
    pub fn from_env(env: Environment) -> Self {
        let mut config = Self::for_environment(env);
        if let Ok(filter) = std::env::var("LOG_LEVEL") {
            config.filter = filter;
        }
        if let Some(format) = super::env_parse::<LogFormat>("LOG_FORMAT") {
            config.format = format;
            config.ansi = config.ansi && format != LogFormat::Json;
        }
        config
    }
}
