//! Service configuration loaded from TOML.
//!
//! ```toml
//! database_path = "/var/lib/vle/mirror.sqlite3"
//! moodle_wwwroot = "https://vle.example.com"
//! log_level = "info"
//! log_dir = "/var/log/vle"
//!
//! [sync_basic_auth]
//! username = "sync"
//! password = "secret"
//! ```

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

/// Shared basic-auth secret between the VLE and this service.
///
/// Used outbound for snapshot fetches and inbound to authorize mutation calls.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

impl Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VleConfig {
    pub database_path: PathBuf,
    pub moodle_wwwroot: String,
    pub sync_basic_auth: BasicAuthCredentials,
    /// Falls back to the build-mode default when absent.
    #[serde(default)]
    pub log_level: Option<String>,
    /// File logging stays off when absent.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl VleConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Configured level, or the build-mode default.
    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .unwrap_or_else(|| crate::logging::default_log_level())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path cannot be empty"));
        }
        let wwwroot = self.moodle_wwwroot.trim();
        if wwwroot.is_empty() {
            return Err(ConfigError::Invalid("moodle_wwwroot cannot be empty"));
        }
        if !(wwwroot.starts_with("http://") || wwwroot.starts_with("https://")) {
            return Err(ConfigError::Invalid(
                "moodle_wwwroot must start with http:// or https://",
            ));
        }
        if self.sync_basic_auth.username.is_empty() {
            return Err(ConfigError::Invalid("sync_basic_auth.username cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, VleConfig};
    use std::path::Path;

    const MINIMAL: &str = r#"
        database_path = "mirror.sqlite3"
        moodle_wwwroot = "https://vle.example.com"

        [sync_basic_auth]
        username = "sync"
        password = "secret"
    "#;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = VleConfig::from_toml_str(MINIMAL).unwrap();
        assert_eq!(config.database_path, Path::new("mirror.sqlite3"));
        assert_eq!(config.sync_basic_auth.password, "secret");
        assert!(config.log_dir.is_none());
        assert_eq!(config.log_level(), crate::logging::default_log_level());
    }

    #[test]
    fn rejects_empty_wwwroot() {
        let text = MINIMAL.replace("https://vle.example.com", "");
        let err = VleConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("moodle_wwwroot"));
    }

    #[test]
    fn rejects_missing_credentials_table() {
        let text = r#"
            database_path = "mirror.sqlite3"
            moodle_wwwroot = "https://vle.example.com"
        "#;
        assert!(matches!(
            VleConfig::from_toml_str(text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = VleConfig::from_toml_str(MINIMAL).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VleConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
