//! scrollterm: an interactive scrollback console with in-place line
//! editing, driven by the `scrollterm-core` crate.

mod clipboard;
mod options;
mod tui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scrollterm_core::ConsoleConfig;

use crate::options::Options;

#[derive(Parser, Debug)]
#[command(
    name = "scrollterm",
    version,
    about = "Scrollback console with in-place line editing"
)]
struct Args {
    /// Options file (defaults to the platform config directory).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Prompt string.
    #[arg(long, default_value = "> ")]
    prompt: String,

    /// Arena byte capacity, overriding the options file.
    #[arg(long)]
    buffer_bytes: Option<usize>,

    /// Retained line ceiling, overriding the options file.
    #[arg(long)]
    buffer_lines: Option<usize>,

    /// Start with deferred bottom-pinning on.
    #[arg(long)]
    lazy: bool,

    /// Log filter, e.g. "debug" (SCROLLTERM_LOG is honored too).
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_deref());

    let options = match &args.config {
        Some(path) => Options::load(path)?,
        None => Options::load_default()?,
    };
    let mut config = options.apply(ConsoleConfig::default());
    if let Some(bytes) = args.buffer_bytes {
        config.buffer_bytes = bytes;
    }
    if let Some(lines) = args.buffer_lines {
        config.buffer_lines = lines;
    }
    let lazy = args.lazy || options.lazy_update.unwrap_or(false);

    tracing::info!(
        bytes = config.buffer_bytes,
        lines = config.buffer_lines,
        lazy,
        "starting console"
    );
    tui::run(&config, lazy, &args.prompt)
}

fn init_logging(filter: Option<&str>) {
    let filter = match filter {
        Some(spec) => EnvFilter::new(spec),
        None => EnvFilter::try_from_env("SCROLLTERM_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
