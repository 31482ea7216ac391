// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Cloud-init seeding and lockdown for Cohesix images.
//!
//! At image build time [`install::install_config`] decides which gadget and
//! seed-area cloud-init configuration the device may trust. After the first
//! boot [`status::query_state`] observes cloud-init and
//! [`restrict::restrict`] pins it to the datasource it used, or disables it.

/// Error taxonomy shared by every module.
pub mod error;
/// Filesystem layout rooted at an explicit directory.
pub mod layout;
/// Model trust grade.
pub mod grade;
/// Datasource extraction from cloud-config documents.
pub mod datasource;
/// Build-time configuration installer.
pub mod install;
/// cloud-init status oracle.
pub mod status;
/// One-shot restriction engine.
pub mod restrict;
/// On-device settings for the `cohcloud` wrapper.
pub mod settings;
/// Command line wrapper.
pub mod cli;

mod fsutil;

pub use datasource::{extract_datasources, DatasourceSet};
pub use error::{CloudInitError, ErrorKind, Result};
pub use grade::TrustGrade;
pub use install::{disable_cloud_init, has_gadget_cloud_conf, install_config, InstallOptions};
pub use layout::RootLayout;
pub use restrict::{restrict, restrict_cloud_init, RestrictAction, RestrictOptions, RestrictionOutcome};
pub use status::{query_state, CloudInitAgent, CloudInitState, StatusSnapshot, SystemAgent};
