// CLASSIFICATION: COMMUNITY
// Filename: layout.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Filesystem layout of the cloud-init files we read and write.
//!
//! All paths hang off an explicit root so image builds and tests can point
//! the whole subsystem at a scratch tree.

use std::path::{Path, PathBuf};

pub const CLOUD_DIR: &str = "etc/cloud";
pub const CLOUD_CFG_DIR: &str = "etc/cloud/cloud.cfg.d";
pub const DISABLED_FILE: &str = "etc/cloud/cloud-init.disabled";
pub const RESTRICT_FILE: &str = "etc/cloud/cloud.cfg.d/zzzz_snapd.cfg";
pub const STATUS_FILE: &str = "run/cloud-init/status.json";
pub const GADGET_CFG_NAME: &str = "80_device_gadget.cfg";
pub const SEED_CFG_PREFIX: &str = "90_";
pub const WRITABLE_DEFAULTS_DIR: &str = "_writable_defaults";

/// Root of the filesystem that cloud-init runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootLayout {
    root: PathBuf,
}

impl Default for RootLayout {
    fn default() -> Self {
        Self::new("/")
    }
}

impl RootLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root taken from `COHESIX_ROOT`, falling back to `/`.
    pub fn from_env() -> Self {
        std::env::var("COHESIX_ROOT")
            .map(Self::new)
            .unwrap_or_default()
    }

    /// Layout for the writable defaults of an image being built at `target`.
    pub fn writable_defaults(target: &Path) -> Self {
        Self::new(target.join(WRITABLE_DEFAULTS_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cloud_dir(&self) -> PathBuf {
        self.root.join(CLOUD_DIR)
    }

    pub fn cloud_cfg_dir(&self) -> PathBuf {
        self.root.join(CLOUD_CFG_DIR)
    }

    pub fn disabled_file(&self) -> PathBuf {
        self.root.join(DISABLED_FILE)
    }

    pub fn restrict_file(&self) -> PathBuf {
        self.root.join(RESTRICT_FILE)
    }

    pub fn status_file(&self) -> PathBuf {
        self.root.join(STATUS_FILE)
    }
}
