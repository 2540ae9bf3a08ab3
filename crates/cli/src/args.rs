pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "stash")]
#[command(about = "Content-addressed attachment storage on S3")]
pub struct Args {
    /// Path to the stash config directory (defaults to ~/.stash)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    /// Directory for log files (logs to stderr only if not set)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
