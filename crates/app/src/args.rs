pub use clap::Parser;

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chainmail")]
#[command(about = "Encrypted, signed messaging over a hash-chained ledger")]
pub struct Args {
    /// Path to the chainmail state directory (defaults to ~/.chainmail)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Log level (overrides config.toml; RUST_LOG takes precedence over both)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: crate::Command,
}
