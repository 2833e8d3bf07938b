// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bosto_driver")]
#[command(author, version, about = "Bosto pen tablet userspace driver")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file path (default: ~/.config/bosto/driver.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List connected tablets
    #[command(visible_aliases = ["ls", "l"])]
    List,

    /// Drive the tablet through virtual input devices (default)
    #[command(visible_aliases = ["r"])]
    Run,

    /// Decode reports and log them without creating input devices
    #[command(visible_aliases = ["mon", "m"])]
    Monitor,
}
