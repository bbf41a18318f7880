use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "feedback")]
#[command(about = "Share files behind unguessable links and collect comments on them")]
pub struct Args {
    /// Path to the feedback config directory (defaults to ~/.feedback)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
