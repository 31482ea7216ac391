// CLASSIFICATION: COMMUNITY
// Filename: restrict.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Post-first-boot lockdown of cloud-init.
//!
//! Once cloud-init has run, later boots must not pick up configuration from
//! a different (possibly spoofed) datasource. Depending on the observed
//! state and the datasource cloud-init used, this either disables cloud-init
//! for good or pins it to that one datasource. Local sources like NoCloud
//! additionally lose filesystem-label discovery, so a USB stick labelled
//! CIDATA cannot be used to inject config later.

use std::fs::File;
use std::io::BufReader;

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CloudInitError, Result};
use crate::fsutil;
use crate::install::disable_cloud_init;
use crate::layout::RootLayout;
use crate::status::{query_state, CloudInitAgent, CloudInitState, StatusSnapshot};

static DATASOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DataSource([a-zA-Z0-9]+).*").expect("datasource regex"));

const LOCAL_DATASOURCES: &[&str] = &["NoCloud", "None"];
const NOCLOUD: &str = "NoCloud";

// manual_cache_clean keeps cloud-init trusting its cached instance-id; with
// fs_label nulled it could otherwise not find the instance again and would
// treat every boot as a new instance.
const NOCLOUD_RESTRICT_YAML: &str = "datasource_list: [NoCloud]
datasource:
  NoCloud:
    fs_label: null
manual_cache_clean: true
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RestrictAction {
    Disable,
    Restrict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionOutcome {
    pub action: RestrictAction,
    /// Datasource cloud-init used, when one was read from its results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestrictOptions {
    /// Disable even when cloud-init is errored or may still be running.
    pub force_disable: bool,
    /// Disable, rather than pin, when the first boot used a local datasource.
    pub disable_local_after_first_run: bool,
}

#[derive(Deserialize)]
struct StatusV1 {
    #[serde(default)]
    datasource: Option<String>,
}

#[derive(Deserialize)]
struct StatusRecord {
    v1: Option<StatusV1>,
}

/// Query the current state and restrict cloud-init accordingly.
pub fn restrict_cloud_init(
    layout: &RootLayout,
    agent: &dyn CloudInitAgent,
    opts: RestrictOptions,
) -> Result<RestrictionOutcome> {
    let snapshot = query_state(layout, agent)?;
    restrict(layout, snapshot, opts)
}

/// Restrict or disable cloud-init given the state in `snapshot`.
///
/// Meant to run once per boot after cloud-init had its chance to run. The
/// marker files are re-checked before acting, so a second call fails even
/// with a stale snapshot.
pub fn restrict(
    layout: &RootLayout,
    snapshot: StatusSnapshot,
    opts: RestrictOptions,
) -> Result<RestrictionOutcome> {
    if fsutil::file_exists(&layout.restrict_file()) {
        return Err(CloudInitError::StateConflict("already restricted".into()));
    }
    if fsutil::file_exists(&layout.disabled_file()) {
        return Err(CloudInitError::StateConflict("already disabled".into()));
    }

    match snapshot.state() {
        CloudInitState::Done => {}
        CloudInitState::RestrictedBySnapd => {
            return Err(CloudInitError::StateConflict("already restricted".into()));
        }
        CloudInitState::DisabledPermanently => {
            return Err(CloudInitError::StateConflict("already disabled".into()));
        }
        CloudInitState::Errored | CloudInitState::Enabled if !opts.force_disable => {
            return Err(CloudInitError::StateConflict(format!(
                "cloud-init is {}, refusing to restrict without force",
                snapshot.state()
            )));
        }
        state @ (CloudInitState::Errored
        | CloudInitState::Enabled
        | CloudInitState::Untriggered
        | CloudInitState::NotFound) => {
            if matches!(state, CloudInitState::Errored | CloudInitState::Enabled) {
                warn!("force disabling cloud-init in state {state}");
            }
            disable_cloud_init(layout)?;
            return Ok(RestrictionOutcome {
                action: RestrictAction::Disable,
                datasource: None,
            });
        }
    }

    let datasource = used_datasource(layout)?;

    if opts.disable_local_after_first_run && LOCAL_DATASOURCES.contains(&datasource.as_str()) {
        disable_cloud_init(layout)?;
        info!("cloud-init used local datasource {datasource}, disabled");
        return Ok(RestrictionOutcome {
            action: RestrictAction::Disable,
            datasource: Some(datasource),
        });
    }

    let pin = if datasource == NOCLOUD {
        NOCLOUD_RESTRICT_YAML.to_string()
    } else {
        format!("datasource_list: [{datasource}]\n")
    };
    fsutil::write_atomic(&layout.restrict_file(), pin.as_bytes())?;
    info!("cloud-init restricted to datasource {datasource}");
    Ok(RestrictionOutcome {
        action: RestrictAction::Restrict,
        datasource: Some(datasource),
    })
}

/// Datasource cloud-init used on this boot, from its `status.json`.
fn used_datasource(layout: &RootLayout) -> Result<String> {
    let path = layout.status_file();
    let file = File::open(&path)
        .map_err(|e| CloudInitError::io(format!("cannot open {}", path.display()), e))?;
    let record: StatusRecord = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| CloudInitError::Json {
            path: path.clone(),
            source,
        })?;
    let raw = record
        .v1
        .and_then(|v1| v1.datasource)
        .filter(|ds| !ds.is_empty())
        .ok_or_else(|| {
            CloudInitError::DataIntegrity("missing datasource from status.json".into())
        })?;
    parse_datasource(&raw)
}

/// Canonical datasource name from the free-text `v1.datasource` field,
/// e.g. `DataSourceNoCloud [seed=/dev/sr0][dsmode=net]` gives `NoCloud`.
pub fn parse_datasource(raw: &str) -> Result<String> {
    DATASOURCE_RE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            CloudInitError::DataIntegrity(format!("unexpected datasource format {raw:?}"))
        })
}
