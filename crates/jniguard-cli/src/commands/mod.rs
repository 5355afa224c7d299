//! CLI command implementations

pub mod init;
pub mod scan;

pub use init::InitArgs;
pub use scan::ScanArgs;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Trace a project's slice profiles for buffer misuse
    Scan(ScanArgs),

    /// Write a default jniguard.toml into a project directory
    Init(InitArgs),
}
