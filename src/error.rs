// CLASSIFICATION: COMMUNITY
// Filename: error.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Error taxonomy for cloud-init seeding and lockdown.
//!
//! Nothing here is retried or swallowed: every failure is returned to the
//! caller, which decides whether the boot phase can continue.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Coarse classification of a [`CloudInitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Parse,
    Io,
    StateConflict,
    DataIntegrity,
}

#[derive(Debug, Error)]
pub enum CloudInitError {
    #[error("unable to configure cloud-init: {0}")]
    Configuration(String),
    #[error("unknown model grade {0:?}")]
    UnknownGrade(String),
    #[error("cannot parse {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("cannot parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot restrict cloud-init: {0}")]
    StateConflict(String),
    #[error("cloud-init error: {0}")]
    DataIntegrity(String),
}

impl CloudInitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::UnknownGrade(_) => ErrorKind::Configuration,
            Self::Yaml { .. } | Self::Json { .. } => ErrorKind::Parse,
            Self::Io { .. } => ErrorKind::Io,
            Self::StateConflict(_) => ErrorKind::StateConflict,
            Self::DataIntegrity(_) => ErrorKind::DataIntegrity,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: &Path, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudInitError>;
