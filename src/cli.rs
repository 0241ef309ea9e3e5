// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zen_docker::output::OutputMode;

#[derive(Parser)]
#[command(name = "zen-docker")]
#[command(about = "Build, push and run Docker targets declared in a build file")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print results as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory containing the build file
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List targets declared in the build file
    List,

    /// Show srcs, outs, tools and scripts of a target
    Show {
        /// Target name
        target: String,
    },

    /// Run one script (build, deploy, push, load) of a target
    Run {
        /// Target name
        target: String,

        /// Script name or alias
        script: String,
    },

    /// List the target types this tool understands
    Types,
}
