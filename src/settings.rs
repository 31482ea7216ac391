// CLASSIFICATION: COMMUNITY
// Filename: settings.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{CloudInitError, Result};
use crate::layout::RootLayout;
use crate::restrict::RestrictOptions;
use crate::status::SystemAgent;

pub const DEFAULT_SETTINGS_PATH: &str = "/etc/cohesix/cloudinit.yaml";

/// Optional on-device settings for `cohcloud`. Command line flags win.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub root: Option<PathBuf>,
    pub agent: Option<String>,
    pub agent_search_path: Option<String>,
    pub force_disable: bool,
    pub disable_local_after_first_run: bool,
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(CloudInitError::io(format!("cannot read {}", path.display()), e))
            }
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&data).map_err(|e| CloudInitError::yaml(path, e))
    }

    pub fn layout(&self) -> RootLayout {
        match &self.root {
            Some(root) => RootLayout::new(root),
            None => RootLayout::from_env(),
        }
    }

    pub fn agent(&self) -> SystemAgent {
        let agent = SystemAgent::new(self.agent.as_deref().unwrap_or("cloud-init"));
        match &self.agent_search_path {
            Some(paths) => agent.with_search_path(paths),
            None => agent,
        }
    }

    pub fn restrict_options(&self) -> RestrictOptions {
        RestrictOptions {
            force_disable: self.force_disable,
            disable_local_after_first_run: self.disable_local_after_first_run,
        }
    }
}
