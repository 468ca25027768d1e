// CLI argument parsing and definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dock")]
#[command(about = "Run cluster machines as local containers")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the manager configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create and boot the container for a machine
    Start {
        /// Machine id (e.g. "0" or "1/lxc/0")
        machine_id: String,
        /// Image to run
        #[arg(long)]
        image: String,
        /// YAML file with the machine's boot configuration
        #[arg(long)]
        boot: PathBuf,
        /// Network: default, host, bridge or bridge:<name>
        #[arg(long, default_value = "default")]
        network: String,
    },
    /// Stop a container and retire its workspace
    Stop {
        /// Container name as reported by `start` or `list`
        name: String,
        /// Engine id of the container, when known
        #[arg(long)]
        engine_id: Option<String>,
    },
    /// List running containers of this manager
    List {
        /// Print instances as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the post-boot configuration pass again
    Configure {
        /// Container name
        name: String,
    },
}
