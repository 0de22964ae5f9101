use crate::defaults;
use crate::error::{EmotagError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub table: TableConfig,
    pub audio: AudioConfig,
    pub text: TextConfig,
    pub batch: BatchConfig,
}

/// Metadata table layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TableConfig {
    /// Single-byte field delimiter.
    pub delimiter: char,
    pub audio_column: String,
    pub text_column: String,
    pub label_column: String,
}

/// Audio emotion classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackend,
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub token_env: String,
    /// Per-call timeout, e.g. "30s".
    pub timeout: String,
    /// Label returned by the `fixed` backend.
    pub fixed_label: String,
}

/// Text sentiment analyzer configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub backend: TextBackend,
    pub endpoint: String,
    pub language: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-call timeout, e.g. "30s".
    pub timeout: String,
    pub fixed_score: f64,
    pub fixed_magnitude: f64,
}

/// Batch driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Rows processed concurrently.
    pub jobs: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    Http,
    Fixed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextBackend {
    Google,
    Fixed,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            delimiter: defaults::DELIMITER as char,
            audio_column: defaults::AUDIO_COLUMN.to_string(),
            text_column: defaults::TEXT_COLUMN.to_string(),
            label_column: defaults::LABEL_COLUMN.to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            backend: AudioBackend::Http,
            endpoint: defaults::AUDIO_ENDPOINT.to_string(),
            model: defaults::AUDIO_MODEL.to_string(),
            token_env: defaults::AUDIO_TOKEN_ENV.to_string(),
            timeout: defaults::CLASSIFIER_TIMEOUT.to_string(),
            fixed_label: defaults::FIXED_AUDIO_LABEL.to_string(),
        }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            backend: TextBackend::Google,
            endpoint: defaults::TEXT_ENDPOINT.to_string(),
            language: defaults::TEXT_LANGUAGE.to_string(),
            api_key_env: defaults::TEXT_API_KEY_ENV.to_string(),
            timeout: defaults::CLASSIFIER_TIMEOUT.to_string(),
            fixed_score: 0.0,
            fixed_magnitude: 0.0,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: defaults::JOBS,
        }
    }
}

impl TableConfig {
    /// The delimiter as the byte the table codec expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(|b| b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r')
            .ok_or_else(|| EmotagError::ConfigInvalidValue {
                key: "table.delimiter".to_string(),
                message: format!("'{}' is not a usable single-byte delimiter", self.delimiter),
            })
    }
}

impl AudioConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_timeout("audio.timeout", &self.timeout)
    }
}

impl TextConfig {
    pub fn timeout(&self) -> Result<Duration> {
        parse_timeout("text.timeout", &self.timeout)
    }
}

/// Parse a timeout such as "30s", "1m30s" or a bare number of seconds.
fn parse_timeout(key: &str, value: &str) -> Result<Duration> {
    let value = value.trim();
    let duration = match value.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(value).map_err(|e| EmotagError::ConfigInvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?,
    };
    if duration.is_zero() {
        return Err(EmotagError::ConfigInvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(duration)
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - EMOTAG_AUDIO_ENDPOINT → audio.endpoint
    /// - EMOTAG_AUDIO_MODEL → audio.model
    /// - EMOTAG_TEXT_ENDPOINT → text.endpoint
    /// - EMOTAG_JOBS → batch.jobs (ignored unless a positive integer)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("EMOTAG_AUDIO_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.audio.endpoint = endpoint;
        }

        if let Ok(model) = std::env::var("EMOTAG_AUDIO_MODEL")
            && !model.is_empty()
        {
            self.audio.model = model;
        }

        if let Ok(endpoint) = std::env::var("EMOTAG_TEXT_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.text.endpoint = endpoint;
        }

        if let Ok(jobs) = std::env::var("EMOTAG_JOBS")
            && let Ok(jobs) = jobs.trim().parse::<usize>()
            && jobs > 0
        {
            self.batch.jobs = jobs;
        }

        self
    }

    /// Switch both classifiers to their fixed backends.
    pub fn dry_run(mut self) -> Self {
        self.audio.backend = AudioBackend::Fixed;
        self.text.backend = TextBackend::Fixed;
        self
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.table.delimiter_byte()?;
        for (key, value) in [
            ("table.audio_column", &self.table.audio_column),
            ("table.text_column", &self.table.text_column),
            ("table.label_column", &self.table.label_column),
        ] {
            if value.trim().is_empty() {
                return Err(EmotagError::ConfigInvalidValue {
                    key: key.to_string(),
                    message: "must not be empty".to_string(),
                });
            }
        }
        self.audio.timeout()?;
        self.text.timeout()?;
        if self.batch.jobs == 0 {
            return Err(EmotagError::ConfigInvalidValue {
                key: "batch.jobs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/emotag/config.toml on Linux, or a relative
    /// `emotag/config.toml` when no config directory can be determined.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("emotag")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_emotag_env() {
        remove_env("EMOTAG_AUDIO_ENDPOINT");
        remove_env("EMOTAG_AUDIO_MODEL");
        remove_env("EMOTAG_TEXT_ENDPOINT");
        remove_env("EMOTAG_JOBS");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.table.delimiter, '|');
        assert_eq!(config.table.audio_column, "audio_filename");
        assert_eq!(config.table.text_column, "text");
        assert_eq!(config.table.label_column, "emotion_label");

        assert_eq!(config.audio.backend, AudioBackend::Http);
        assert_eq!(config.audio.token_env, "HF_TOKEN");
        assert_eq!(config.audio.timeout().unwrap(), Duration::from_secs(30));

        assert_eq!(config.text.backend, TextBackend::Google);
        assert_eq!(config.text.language, "ja");
        assert_eq!(config.text.api_key_env, "GOOGLE_API_KEY");

        assert_eq!(config.batch.jobs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [table]
            delimiter = ","
            audio_column = "wav"
            text_column = "transcript"
            label_column = "label"

            [audio]
            backend = "fixed"
            fixed_label = "sad"
            timeout = "2m"

            [text]
            backend = "fixed"
            fixed_score = -0.4
            fixed_magnitude = 0.9
            timeout = "10"

            [batch]
            jobs = 8
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.table.delimiter_byte().unwrap(), b',');
        assert_eq!(config.table.audio_column, "wav");
        assert_eq!(config.table.text_column, "transcript");
        assert_eq!(config.table.label_column, "label");
        assert_eq!(config.audio.backend, AudioBackend::Fixed);
        assert_eq!(config.audio.fixed_label, "sad");
        assert_eq!(config.audio.timeout().unwrap(), Duration::from_secs(120));
        assert_eq!(config.text.backend, TextBackend::Fixed);
        assert_eq!(config.text.fixed_score, -0.4);
        assert_eq!(config.text.fixed_magnitude, 0.9);
        assert_eq!(config.text.timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(config.batch.jobs, 8);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [batch]
            jobs = 4
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.batch.jobs, 4);
        assert_eq!(config.table, TableConfig::default());
        assert_eq!(config.audio, AudioConfig::default());
        assert_eq!(config.text, TextConfig::default());
    }

    #[test]
    fn test_unknown_backend_is_error() {
        let toml_content = r#"
            [audio]
            backend = "whisper"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_env_override_endpoints() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_emotag_env();

        set_env("EMOTAG_AUDIO_ENDPOINT", "http://localhost:8080/classify");
        set_env("EMOTAG_AUDIO_MODEL", "local-ser");
        set_env("EMOTAG_TEXT_ENDPOINT", "http://localhost:8081/sentiment");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.endpoint, "http://localhost:8080/classify");
        assert_eq!(config.audio.model, "local-ser");
        assert_eq!(config.text.endpoint, "http://localhost:8081/sentiment");

        clear_emotag_env();
    }

    #[test]
    fn test_env_override_jobs() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_emotag_env();

        set_env("EMOTAG_JOBS", "6");
        assert_eq!(Config::default().with_env_overrides().batch.jobs, 6);

        set_env("EMOTAG_JOBS", "0");
        assert_eq!(Config::default().with_env_overrides().batch.jobs, 1);

        set_env("EMOTAG_JOBS", "many");
        assert_eq!(Config::default().with_env_overrides().batch.jobs, 1);

        clear_emotag_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_emotag_env();

        set_env("EMOTAG_AUDIO_MODEL", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.audio.model, defaults::AUDIO_MODEL);

        clear_emotag_env();
    }

    #[test]
    fn test_dry_run_switches_backends() {
        let config = Config::default().dry_run();
        assert_eq!(config.audio.backend, AudioBackend::Fixed);
        assert_eq!(config.text.backend, TextBackend::Fixed);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.batch.jobs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.table.delimiter = 'あ';
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.audio.timeout = "soon".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.text.timeout = "0s".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.table.text_column = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [audio
            endpoint = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_default_path_ends_with_emotag_config() {
        let path = Config::default_path();
        assert!(path.ends_with("emotag/config.toml"));
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_emotag_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }
}
