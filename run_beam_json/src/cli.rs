use beam::Float;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// `RUST_LOG` still applies, `level` only sets the default.
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

#[derive(Parser)]
#[command(name = "run_beam_json")]
#[command(about = "Cast beams through mirrors described in JSON, or run the prism scene")]
pub struct Cli {
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Cast every ray of a scene file and report where each one went
    Trace {
        scene: PathBuf,

        /// Also write the segments of every ray to this file, as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the prism scene without rendering it
    Prism {
        #[arg(long, default_value = "120")]
        frames: usize,

        /// Height of the visible world, the beam starts at its top edge
        #[arg(long, default_value = "10")]
        viewport_height: Float,

        #[arg(long, default_value = "60")]
        fps: Float,

        /// Horizontal offset of the prism, large enough offsets keep it in the dark
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        prism_x: Float,
    },
}
