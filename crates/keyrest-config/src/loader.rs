//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::{ConfigError, KeyrestConfig, LogFormat};

/// Environment prefix used by the `keyrest` binary.
pub const DEFAULT_ENV_PREFIX: &str = "KEYREST";

/// Config file syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
}

impl FromStr for FileFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .parse()
    }

    fn parse(self, content: &str) -> Result<KeyrestConfig, ConfigError> {
        Ok(match self {
            Self::Toml => toml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
        })
    }
}

/// Builds a [`KeyrestConfig`] from defaults, a file and the environment.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. `.env` file and environment variables (`PREFIX__SECTION__KEY`)
///
/// A file replaces the whole configuration; sections and fields it leaves
/// out take their default values.
///
/// # Example
///
/// ```no_run
/// use keyrest_config::ConfigLoader;
///
/// # fn main() -> Result<(), keyrest_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_optional_file("keyrest.toml")?
///     .with_dotenv()
///     .with_env_prefix("KEYREST")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: KeyrestConfig,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader starting from [`KeyrestConfig::default`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the development preset.
    ///
    /// ```
    /// use keyrest_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = KeyrestConfig::development();
        self
    }

    /// Loads a `.toml` or `.json` file.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = FileFormat::of(path)?;
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::Missing {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        self.config = format.parse(&content)?;
        Ok(self)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Loads configuration text in the given format (`toml` or `json`).
    ///
    /// ```
    /// use keyrest_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [server]
    ///     http_addr = "127.0.0.1:3000"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.server.http_addr, "127.0.0.1:3000");
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = format.parse::<FileFormat>()?.parse(content)?;
        Ok(self)
    }

    /// Exports variables from a `.env` file in the working directory, if any.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        self
    }

    /// Enables environment overrides of the form `PREFIX__SECTION__KEY`,
    /// e.g. `KEYREST__SERVER__HTTP_ADDR=0.0.0.0:9000`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Applies environment overrides and validates the result.
    pub fn load(mut self) -> Result<KeyrestConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            let marker = format!("{prefix}__");
            let mut vars: Vec<(String, String)> = env::vars()
                .filter(|(name, _)| name.starts_with(&marker))
                .collect();
            vars.sort();

            for (name, value) in vars {
                let setting = name[marker.len()..].to_ascii_lowercase().replace("__", ".");
                apply_override(&mut self.config, &setting, &value)
                    .map_err(|expected| ConfigError::env(&name, expected))?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

/// Sets one dotted setting from its string form. Unknown settings are
/// ignored; a malformed value yields what was expected instead.
fn apply_override(
    config: &mut KeyrestConfig,
    setting: &str,
    value: &str,
) -> Result<(), &'static str> {
    match setting {
        "server.http_addr" => config.server.http_addr = value.to_string(),
        "server.shutdown_timeout_secs" => config.server.shutdown_timeout_secs = number(value)?,
        "server.max_body_bytes" => config.server.max_body_bytes = number(value)?,

        "logging.level" => config.logging.level = value.to_string(),
        "logging.format" => {
            config.logging.format = value
                .parse::<LogFormat>()
                .map_err(|_| "'json' or 'pretty'")?;
        }

        "metrics.enabled" => config.metrics.enabled = boolean(value)?,
        "metrics.addr" => config.metrics.addr = value.to_string(),

        "errors.path_binding" => config.errors.path_binding = number(value)?,
        "errors.timestamp_format" => config.errors.timestamp_format = number(value)?,
        "errors.body_decode" => config.errors.body_decode = number(value)?,
        "errors.query_decode" => config.errors.query_decode = number(value)?,
        "errors.body_read" => config.errors.body_read = number(value)?,
        "errors.payload_too_large" => config.errors.payload_too_large = number(value)?,

        _ => tracing::debug!(setting, "ignoring unknown config override"),
    }
    Ok(())
}

fn number<T: FromStr>(value: &str) -> Result<T, &'static str> {
    value.trim().parse().map_err(|_| "an unsigned integer")
}

fn boolean(value: &str) -> Result<bool, &'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err("a boolean"),
    }
}
