// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use framegrab::backends::camera::FrameSize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

mod cli;

#[derive(Parser)]
#[command(name = "framegrab")]
#[command(about = "Time-lapse still capture for V4L2 cameras")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Capture frames at a fixed interval (default command)
    Capture(CaptureArgs),
}

#[derive(Args, Default)]
struct CaptureArgs {
    /// Settings file (default: ~/.config/framegrab/settings.json if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Save the resolved settings after setup
    #[arg(long)]
    save_config: bool,

    /// Device path, e.g. /dev/video0 (asked for when omitted)
    #[arg(short, long)]
    device: Option<String>,

    /// Four-character pixel format family
    #[arg(short, long)]
    format: Option<String>,

    /// Frame size as WIDTHxHEIGHT (asked for when omitted)
    #[arg(short, long, value_parser = parse_size)]
    size: Option<FrameSize>,

    /// Seconds between frames (asked for when omitted)
    #[arg(short, long)]
    interval: Option<f64>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    frames: Option<u64>,
}

fn parse_size(s: &str) -> Result<FrameSize, String> {
    FrameSize::parse(s).ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))
}

impl From<CaptureArgs> for cli::CaptureOptions {
    fn from(args: CaptureArgs) -> Self {
        Self {
            config: args.config,
            save_config: args.save_config,
            device: args.device,
            format: args.format,
            size: args.size,
            interval: args.interval,
            output: args.output,
            quality: args.quality,
            frames: args.frames,
        }
    }
}

/// One-line description of a fatal error for stderr
fn failure_message(err: &dyn std::error::Error) -> String {
    format!("Error: {}", err)
}

fn main() -> ExitCode {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=framegrab=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Capture(args)) => cli::run_capture(args.into()),
        None => cli::run_capture(CaptureArgs::default().into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "framegrab stopped");
            eprintln!("{}", failure_message(err.as_ref()));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegrab::backends::camera::BackendError;
    use framegrab::errors::{AppError, CaptureError};

    #[test]
    fn test_failure_message_uses_display() {
        let err: Box<dyn std::error::Error> = Box::new(AppError::Capture(CaptureError::Open(
            BackendError::DeviceNotFound("/dev/video9".to_string()),
        )));

        assert_eq!(
            failure_message(err.as_ref()),
            "Error: Capture error: open: Device not found: /dev/video9"
        );
    }
}
