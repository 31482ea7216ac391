// CLASSIFICATION: COMMUNITY
// Filename: install.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Seeding of cloud-init configuration into an image at build time.
//!
//! Gadget configuration is always installed as `80_device_gadget.cfg`.
//! Seed-area `*.cfg` files are installed with a `90_` prefix, and only on
//! `dangerous` models, so that they override the gadget when cloud-init
//! merges `cloud.cfg.d` in filename order.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::datasource::{extract_datasources, DatasourceSet};
use crate::error::{CloudInitError, Result};
use crate::fsutil;
use crate::grade::TrustGrade;
use crate::layout::{RootLayout, GADGET_CFG_NAME, SEED_CFG_PREFIX};

const GADGET_CLOUD_CONF: &str = "cloud.conf";

/// Inputs for [`install_config`].
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// When false cloud-init is disabled outright and nothing is installed.
    pub allow_cloud_init: bool,
    pub grade: TrustGrade,
    /// Unpacked gadget directory, possibly containing `cloud.conf`.
    pub gadget_dir: Option<PathBuf>,
    /// Seed-area directory holding `*.cfg` documents.
    pub seed_dir: Option<PathBuf>,
    /// Root of the image being built.
    pub target_root: PathBuf,
}

/// What [`install_config`] left behind.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InstalledConfig {
    pub disabled: bool,
    pub files: Vec<PathBuf>,
    /// Datasources named by the gadget config, if one was installed.
    pub gadget_datasources: Option<DatasourceSet>,
}

/// Whether the gadget ships cloud-init configuration.
pub fn has_gadget_cloud_conf(gadget_dir: &Path) -> bool {
    fsutil::file_exists(&gadget_dir.join(GADGET_CLOUD_CONF))
}

/// Permanently disable cloud-init under `layout` by creating the empty
/// `cloud-init.disabled` sentinel.
pub fn disable_cloud_init(layout: &RootLayout) -> Result<()> {
    fsutil::ensure_dir(&layout.cloud_dir())?;
    fsutil::write_atomic(&layout.disabled_file(), b"")?;
    info!("cloud-init disabled via {}", layout.disabled_file().display());
    Ok(())
}

/// Install cloud-init configuration into `opts.target_root` according to the
/// model grade.
pub fn install_config(opts: &InstallOptions) -> Result<InstalledConfig> {
    if opts.target_root.as_os_str().is_empty() {
        return Err(CloudInitError::Configuration("missing target dir".into()));
    }
    let layout = RootLayout::writable_defaults(&opts.target_root);
    let mut installed = InstalledConfig::default();

    if !opts.allow_cloud_init {
        disable_cloud_init(&layout)?;
        installed.disabled = true;
        return Ok(installed);
    }

    if let Some(gadget_dir) = opts.gadget_dir.as_deref().filter(|d| has_gadget_cloud_conf(d)) {
        // TODO: cross-check seed-area datasources against the gadget ones
        // once signed models get filtered seed-area installation.
        let (file, datasources) = install_gadget_cfg(&gadget_dir.join(GADGET_CLOUD_CONF), &layout)?;
        installed.files.push(file);
        installed.gadget_datasources = Some(datasources);
    }

    match opts.grade {
        TrustGrade::Secured => {
            debug!("grade secured: only gadget cloud-init config permitted");
            return Ok(installed);
        }
        TrustGrade::Signed => {
            debug!("grade signed: seed-area cloud-init config not installed");
            return Ok(installed);
        }
        TrustGrade::Dangerous => {}
    }

    // With no seed dir cloud-init may still find NoCloud media at first boot;
    // that is dealt with by restriction after the first run.
    if let Some(seed_dir) = opts.seed_dir.as_deref() {
        installed
            .files
            .extend(install_cfg_dir(seed_dir, &layout, SEED_CFG_PREFIX)?);
    }
    Ok(installed)
}

fn install_gadget_cfg(src: &Path, layout: &RootLayout) -> Result<(PathBuf, DatasourceSet)> {
    let cfg_dir = layout.cloud_cfg_dir();
    fsutil::ensure_dir(&cfg_dir)?;
    let datasources = extract_datasources(src)?;
    let dst = cfg_dir.join(GADGET_CFG_NAME);
    fsutil::copy_file(src, &dst)?;
    info!(
        "installed gadget cloud-init config {} (datasources {:?})",
        dst.display(),
        datasources.mentioned
    );
    Ok((dst, datasources))
}

fn install_cfg_dir(src: &Path, layout: &RootLayout, prefix: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.cfg",
        glob::Pattern::escape(&src.to_string_lossy())
    );
    let entries = glob::glob(&pattern)
        .map_err(|e| CloudInitError::Configuration(format!("bad seed dir {}: {e}", src.display())))?;
    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| {
            CloudInitError::io(format!("cannot read {}", e.path().display()), e.into_error())
        })?;
        if path.is_file() {
            sources.push(path);
        }
    }
    if sources.is_empty() {
        return Ok(Vec::new());
    }
    sources.sort();

    let cfg_dir = layout.cloud_cfg_dir();
    fsutil::ensure_dir(&cfg_dir)?;
    let mut written = Vec::with_capacity(sources.len());
    for src in sources {
        let Some(name) = src.file_name() else { continue };
        let dst = cfg_dir.join(format!("{prefix}{}", name.to_string_lossy()));
        fsutil::copy_file(&src, &dst)?;
        info!("installed seed cloud-init config {}", dst.display());
        written.push(dst);
    }
    Ok(written)
}
