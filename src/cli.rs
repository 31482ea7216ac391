// CLASSIFICATION: COMMUNITY
// Filename: cli.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! `cohcloud` command line: seeding at image build, status and lockdown at
//! boot.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use crate::grade::TrustGrade;
use crate::install::{disable_cloud_init, install_config, InstallOptions};
use crate::layout::RootLayout;
use crate::restrict::restrict;
use crate::settings::{Settings, DEFAULT_SETTINGS_PATH};
use crate::status::query_state;

#[derive(Parser, Debug)]
#[command(name = "cohcloud", about = "Cohesix cloud-init seeding and lockdown", version)]
pub struct Cli {
    /// Filesystem root cloud-init runs against
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// Settings file
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install gadget and seed cloud-init config into an image
    Install {
        #[arg(long)]
        grade: String,
        #[arg(long)]
        target: PathBuf,
        #[arg(long = "gadget-dir")]
        gadget_dir: Option<PathBuf>,
        #[arg(long = "seed-dir")]
        seed_dir: Option<PathBuf>,
        /// Disable cloud-init in the image instead of seeding it
        #[arg(long)]
        disallow: bool,
    },
    /// Print the current cloud-init state
    Status,
    /// Restrict or disable cloud-init after its first run
    Restrict {
        #[arg(long = "force-disable")]
        force_disable: bool,
        #[arg(long = "disable-local")]
        disable_local: bool,
    },
    /// Permanently disable cloud-init in an image being built
    Disable {
        #[arg(long)]
        target: PathBuf,
    },
}

/// Execute the parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(&cli.config)?;
    let layout = match &cli.root {
        Some(root) => RootLayout::new(root),
        None => settings.layout(),
    };

    match cli.command {
        Commands::Install {
            grade,
            target,
            gadget_dir,
            seed_dir,
            disallow,
        } => {
            let opts = InstallOptions {
                allow_cloud_init: !disallow,
                grade: grade.parse::<TrustGrade>()?,
                gadget_dir,
                seed_dir,
                target_root: target,
            };
            let installed = install_config(&opts).context("cloud-init seeding failed")?;
            if installed.disabled {
                println!("cloud-init disabled");
            }
            for file in &installed.files {
                println!("{}", file.display());
            }
        }
        Commands::Status => {
            let snapshot = query_state(&layout, &settings.agent())?;
            println!("{}", snapshot.state());
            if let Some(raw) = snapshot.diagnostic() {
                anyhow::bail!("cloud-init status output: {}", raw.trim());
            }
        }
        Commands::Restrict {
            force_disable,
            disable_local,
        } => {
            let mut opts = settings.restrict_options();
            opts.force_disable |= force_disable;
            opts.disable_local_after_first_run |= disable_local;
            let snapshot = query_state(&layout, &settings.agent())?;
            info!("restricting cloud-init in state {}", snapshot.state());
            let outcome = restrict(&layout, snapshot, opts)?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
        Commands::Disable { target } => {
            disable_cloud_init(&RootLayout::writable_defaults(&target))?;
        }
    }
    Ok(())
}
