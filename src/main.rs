// CLASSIFICATION: COMMUNITY
// Filename: main.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! Entry point for `cohcloud`.

use clap::Parser;
use cohesix_cloudinit::cli::{self, Cli};

fn main() {
    env_logger::init();
    if let Err(err) = cli::run(Cli::parse()) {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
