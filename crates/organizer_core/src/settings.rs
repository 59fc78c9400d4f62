//! File-based organizer settings.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid file.
//! - Unknown keys are rejected so typos do not silently fall back.

use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::model::organizer::DEFAULT_ORGANIZER_VIEW_ID;
use crate::repo::organizer_repo::DEFAULT_DOCUMENT_KEY;
use crate::service::reconcile::{ReconcileOptions, StaleResourcePolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Errors raised while loading settings.
#[derive(Debug)]
pub enum SettingsError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read settings `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse settings `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid settings: {message}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Organizer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizerSettings {
    /// SQLite file; `None` keeps the store in memory.
    pub db_path: Option<PathBuf>,
    pub document_key: String,
    pub default_view_id: String,
    pub stale_resource_policy: StaleResourcePolicy,
    /// Falls back to the build-mode default.
    pub log_level: Option<String>,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for OrganizerSettings {
    fn default() -> Self {
        Self {
            db_path: None,
            document_key: DEFAULT_DOCUMENT_KEY.to_string(),
            default_view_id: DEFAULT_ORGANIZER_VIEW_ID.to_string(),
            stale_resource_policy: StaleResourcePolicy::default(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl OrganizerSettings {
    /// Reads and checks a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.document_key.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "document_key must not be blank".to_string(),
            ));
        }
        if self.default_view_id.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "default_view_id must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            default_view_id: self.default_view_id.trim().to_string(),
            stale_policy: self.stale_resource_policy,
        }
    }

    pub fn effective_log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Starts file logging when `log_dir` is set. Returns whether it did.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(log_dir) = self.log_dir.as_deref() else {
            return Ok(false);
        };
        init_logging(self.effective_log_level(), log_dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::{OrganizerSettings, SettingsError};
    use crate::service::reconcile::StaleResourcePolicy;
    use std::io::Write;

    #[test]
    fn empty_object_yields_defaults() {
        let settings: OrganizerSettings =
            serde_json::from_str("{}").expect("empty settings should parse");
        assert_eq!(settings, OrganizerSettings::default());
        assert_eq!(settings.document_key, "docker");
        assert_eq!(settings.reconcile_options().default_view_id, "default");
    }

    #[test]
    fn load_reads_policy_and_paths() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        write!(
            file,
            r#"{{"db_path": "/var/lib/organizer.db", "stale_resource_policy": "retain", "log_level": "warn"}}"#
        )
        .expect("settings should be written");

        let settings = OrganizerSettings::load(file.path()).expect("settings should load");
        assert_eq!(
            settings.db_path.as_deref(),
            Some(std::path::Path::new("/var/lib/organizer.db"))
        );
        assert_eq!(settings.stale_resource_policy, StaleResourcePolicy::Retain);
        assert_eq!(settings.effective_log_level(), "warn");
        assert_eq!(
            settings.reconcile_options().stale_policy,
            StaleResourcePolicy::Retain
        );
    }

    #[test]
    fn unknown_keys_and_blank_values_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        write!(file, r#"{{"db_pth": "x"}}"#).expect("settings should be written");
        assert!(matches!(
            OrganizerSettings::load(file.path()),
            Err(SettingsError::Parse { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        write!(file, r#"{{"document_key": "  "}}"#).expect("settings should be written");
        assert!(matches!(
            OrganizerSettings::load(file.path()),
            Err(SettingsError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let err = OrganizerSettings::load(dir.path().join("absent.json"))
            .expect_err("missing file must fail");
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn logging_stays_off_without_log_dir() {
        let settings = OrganizerSettings::default();
        assert!(!settings.init_logging().expect("no-op init should succeed"));
    }
}
