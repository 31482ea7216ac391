// CLASSIFICATION: COMMUNITY
// Filename: status.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Current cloud-init state.
//!
//! Marker files written by the restriction step are checked first; only when
//! neither exists is the cloud-init executable asked for its status. Nothing
//! is cached, every query looks at the filesystem again.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CloudInitError, Result};
use crate::fsutil;
use crate::layout::RootLayout;

static STATUS_RE: Lazy<Regex> = Lazy::new(|| {
    // (?m): `cloud-init status` output spans several lines
    Regex::new(r"(?m)^status: (.*)$").expect("status regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudInitState {
    /// `cloud-init.disabled` is present.
    DisabledPermanently,
    /// Our pinning config `zzzz_snapd.cfg` is present.
    RestrictedBySnapd,
    /// cloud-init reports `disabled`: not triggered, but could still run.
    Untriggered,
    Done,
    /// `running`, `not run` and any status we do not recognise.
    Enabled,
    NotFound,
    Errored,
}

impl CloudInitState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DisabledPermanently => "disabled-permanently",
            Self::RestrictedBySnapd => "restricted",
            Self::Untriggered => "untriggered",
            Self::Done => "done",
            Self::Enabled => "enabled",
            Self::NotFound => "not-found",
            Self::Errored => "errored",
        }
    }

    fn from_status_word(word: &str) -> Self {
        match word.trim() {
            "disabled" => Self::Untriggered,
            "error" => Self::Errored,
            "done" => Self::Done,
            _ => Self::Enabled,
        }
    }
}

impl fmt::Display for CloudInitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running `cloud-init status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusOutput {
    pub success: bool,
    /// stdout followed by stderr.
    pub text: String,
}

/// Access to the external cloud-init program.
pub trait CloudInitAgent {
    /// Path of the executable, `None` when it is not installed.
    fn locate(&self) -> Option<PathBuf>;
    fn run_status(&self, bin: &Path) -> Result<StatusOutput>;
}

/// The real cloud-init, looked up on `PATH` or an explicit search path.
#[derive(Debug, Clone)]
pub struct SystemAgent {
    name: String,
    search_path: Option<OsString>,
}

impl Default for SystemAgent {
    fn default() -> Self {
        Self::new("cloud-init")
    }
}

impl SystemAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            search_path: None,
        }
    }

    pub fn with_search_path(mut self, paths: impl Into<OsString>) -> Self {
        self.search_path = Some(paths.into());
        self
    }
}

impl CloudInitAgent for SystemAgent {
    fn locate(&self) -> Option<PathBuf> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(&self.name, Some(paths), cwd)
            }
            None => which::which(&self.name),
        };
        match found {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("cannot locate {} executable: {e}", self.name);
                None
            }
        }
    }

    fn run_status(&self, bin: &Path) -> Result<StatusOutput> {
        let out = Command::new(bin)
            .arg("status")
            .output()
            .map_err(|e| CloudInitError::io(format!("cannot run {} status", bin.display()), e))?;
        let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok(StatusOutput {
            success: out.status.success(),
            text,
        })
    }
}

/// A state observed by [`query_state`].
///
/// Only the oracle can build one, and [`crate::restrict::restrict`] consumes
/// it, so restriction always acts on an observed state.
#[derive(Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    state: CloudInitState,
    diagnostic: Option<String>,
}

impl StatusSnapshot {
    pub(crate) fn new(state: CloudInitState) -> Self {
        Self {
            state,
            diagnostic: None,
        }
    }

    fn errored(raw: String) -> Self {
        Self {
            state: CloudInitState::Errored,
            diagnostic: Some(raw),
        }
    }

    pub fn state(&self) -> CloudInitState {
        self.state
    }

    /// Raw agent output when the agent failed or its output was not
    /// understood.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }
}

/// Observe the current cloud-init state under `layout`.
pub fn query_state(layout: &RootLayout, agent: &dyn CloudInitAgent) -> Result<StatusSnapshot> {
    if fsutil::file_exists(&layout.restrict_file()) {
        return Ok(StatusSnapshot::new(CloudInitState::RestrictedBySnapd));
    }
    if fsutil::file_exists(&layout.disabled_file()) {
        return Ok(StatusSnapshot::new(CloudInitState::DisabledPermanently));
    }
    let Some(bin) = agent.locate() else {
        return Ok(StatusSnapshot::new(CloudInitState::NotFound));
    };

    let out = agent.run_status(&bin)?;
    if !out.success {
        warn!("cloud-init status failed: {}", out.text.trim());
        return Ok(StatusSnapshot::errored(out.text));
    }
    let Some(word) = STATUS_RE.captures(&out.text).and_then(|c| c.get(1)) else {
        warn!("invalid cloud-init output: {:?}", out.text);
        return Ok(StatusSnapshot::errored(out.text));
    };
    let state = CloudInitState::from_status_word(word.as_str());
    debug!("cloud-init status {:?} -> {state}", word.as_str());
    Ok(StatusSnapshot::new(state))
}
