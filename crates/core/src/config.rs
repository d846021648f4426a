use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub discord: DiscordConfig,
    pub latency: LatencyConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub portrait_base_url: String,
    pub fallback_thumbnail_url: String,
    pub timeout_secs: u64,
    pub retry_max_attempts: u32,
    pub retry_delay_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
}

/// Round-trip latency thresholds for the liveness command, in
/// milliseconds. Below `good_under_ms` is the Good tier, below
/// `average_under_ms` is Average, everything else is Poor.
#[derive(Clone, Debug)]
pub struct LatencyConfig {
    pub good_under_ms: u64,
    pub average_under_ms: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub discord_bot_token: Option<String>,
    pub retry_delay_secs: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "https://api.gatheringwives.com".to_string(),
                portrait_base_url: "https://www.prydwen.gg".to_string(),
                fallback_thumbnail_url:
                    "https://wutheringlab.com/wp-content/uploads/2023/06/Wuthering-Waves-Chixia.png"
                        .to_string(),
                timeout_secs: 10,
                retry_max_attempts: 5,
                retry_delay_secs: 2,
            },
            discord: DiscordConfig { bot_token: String::new().into() },
            latency: LatencyConfig { good_under_ms: 300, average_under_ms: 500 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("wuwabot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(api) = patch.api {
            if let Some(base_url) = api.base_url {
                self.api.base_url = base_url;
            }
            if let Some(portrait_base_url) = api.portrait_base_url {
                self.api.portrait_base_url = portrait_base_url;
            }
            if let Some(fallback_thumbnail_url) = api.fallback_thumbnail_url {
                self.api.fallback_thumbnail_url = fallback_thumbnail_url;
            }
            if let Some(timeout_secs) = api.timeout_secs {
                self.api.timeout_secs = timeout_secs;
            }
            if let Some(retry_max_attempts) = api.retry_max_attempts {
                self.api.retry_max_attempts = retry_max_attempts;
            }
            if let Some(retry_delay_secs) = api.retry_delay_secs {
                self.api.retry_delay_secs = retry_delay_secs;
            }
        }

        if let Some(discord) = patch.discord {
            if let Some(bot_token_value) = discord.bot_token {
                self.discord.bot_token = secret_value(bot_token_value);
            }
        }

        if let Some(latency) = patch.latency {
            if let Some(good_under_ms) = latency.good_under_ms {
                self.latency.good_under_ms = good_under_ms;
            }
            if let Some(average_under_ms) = latency.average_under_ms {
                self.latency.average_under_ms = average_under_ms;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WUWABOT_API_BASE_URL") {
            self.api.base_url = value;
        }
        if let Some(value) = read_env("WUWABOT_API_PORTRAIT_BASE_URL") {
            self.api.portrait_base_url = value;
        }
        if let Some(value) = read_env("WUWABOT_API_FALLBACK_THUMBNAIL_URL") {
            self.api.fallback_thumbnail_url = value;
        }
        if let Some(value) = read_env("WUWABOT_API_TIMEOUT_SECS") {
            self.api.timeout_secs = parse_u64("WUWABOT_API_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("WUWABOT_API_RETRY_MAX_ATTEMPTS") {
            self.api.retry_max_attempts = parse_u32("WUWABOT_API_RETRY_MAX_ATTEMPTS", &value)?;
        }
        if let Some(value) = read_env("WUWABOT_API_RETRY_DELAY_SECS") {
            self.api.retry_delay_secs = parse_u64("WUWABOT_API_RETRY_DELAY_SECS", &value)?;
        }

        if let Some(value) = read_env("WUWABOT_DISCORD_BOT_TOKEN") {
            self.discord.bot_token = secret_value(value);
        }

        if let Some(value) = read_env("WUWABOT_LATENCY_GOOD_UNDER_MS") {
            self.latency.good_under_ms = parse_u64("WUWABOT_LATENCY_GOOD_UNDER_MS", &value)?;
        }
        if let Some(value) = read_env("WUWABOT_LATENCY_AVERAGE_UNDER_MS") {
            self.latency.average_under_ms = parse_u64("WUWABOT_LATENCY_AVERAGE_UNDER_MS", &value)?;
        }

        let log_level = read_env("WUWABOT_LOGGING_LEVEL").or_else(|| read_env("WUWABOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WUWABOT_LOGGING_FORMAT").or_else(|| read_env("WUWABOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(api_base_url) = overrides.api_base_url {
            self.api.base_url = api_base_url;
        }
        if let Some(discord_bot_token) = overrides.discord_bot_token {
            self.discord.bot_token = secret_value(discord_bot_token);
        }
        if let Some(retry_delay_secs) = overrides.retry_delay_secs {
            self.api.retry_delay_secs = retry_delay_secs;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_api(&self.api)?;
        validate_discord(&self.discord)?;
        validate_latency(&self.latency)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    api: Option<ApiPatch>,
    discord: Option<DiscordPatch>,
    latency: Option<LatencyPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPatch {
    base_url: Option<String>,
    portrait_base_url: Option<String>,
    fallback_thumbnail_url: Option<String>,
    timeout_secs: Option<u64>,
    retry_max_attempts: Option<u32>,
    retry_delay_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DiscordPatch {
    bot_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LatencyPatch {
    good_under_ms: Option<u64>,
    average_under_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("wuwabot.toml"), PathBuf::from("config/wuwabot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_api(api: &ApiConfig) -> Result<(), ConfigError> {
    let base_url = api.base_url.trim();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "api.base_url must be an http(s) URL".to_string(),
        ));
    }

    if api.timeout_secs == 0 || api.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "api.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if api.retry_max_attempts == 0 {
        return Err(ConfigError::Validation(
            "api.retry_max_attempts must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_discord(discord: &DiscordConfig) -> Result<(), ConfigError> {
    if discord.bot_token.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "discord.bot_token is required. Get it from the Discord Developer Portal > \
             Your App > Bot > Token"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_latency(latency: &LatencyConfig) -> Result<(), ConfigError> {
    if latency.good_under_ms == 0 || latency.good_under_ms >= latency.average_under_ms {
        return Err(ConfigError::Validation(
            "latency.good_under_ms must be nonzero and below latency.average_under_ms".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
    let level = logging.level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of trace|debug|info|warn|error, got `{level}`"
        )));
    }

    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
