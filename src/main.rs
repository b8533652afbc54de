mod error;
mod report;
mod roadmap;

use std::io::{self, Read};
use std::process::ExitCode;

use canvas::config::{ConfigError, EngineConfig};
use canvas::consts::FIT_PADDING_PX;
use canvas::engine::EngineCore;
use canvas::error::ErrorCode;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::error::ToolError;

#[derive(Parser, Debug)]
#[command(name = "boardtool", about = "Inspect, fit and render canvas snapshots")]
struct Cli {
    #[command(flatten)]
    engine: EngineArgs,

    #[command(subcommand)]
    command: Command,
}

/// Engine knobs. Values are parsed by `EngineConfig` exactly as the
/// environment variables would be.
#[derive(Args, Debug, Default)]
struct EngineArgs {
    #[arg(long, env = "CANVAS_HISTORY_CAP")]
    history_cap: Option<String>,

    #[arg(long, env = "CANVAS_MARQUEE_POLICY")]
    marquee_policy: Option<String>,

    #[arg(long, env = "CANVAS_SNAP_TO_GRID")]
    snap_to_grid: Option<String>,

    #[arg(long, env = "CANVAS_GRID_SIZE")]
    grid_size: Option<String>,

    #[arg(long, env = "CANVAS_MIN_SIZE")]
    min_size: Option<String>,

    #[arg(long, env = "CANVAS_PASTE_OFFSET")]
    paste_offset: Option<String>,
}

impl EngineArgs {
    fn lookup(&self, key: &str) -> Option<String> {
        let value = match key {
            "CANVAS_HISTORY_CAP" => &self.history_cap,
            "CANVAS_MARQUEE_POLICY" => &self.marquee_policy,
            "CANVAS_SNAP_TO_GRID" => &self.snap_to_grid,
            "CANVAS_GRID_SIZE" => &self.grid_size,
            "CANVAS_MIN_SIZE" => &self.min_size,
            "CANVAS_PASTE_OFFSET" => &self.paste_offset,
            _ => return None,
        };
        value.clone()
    }

    fn config(&self) -> Result<EngineConfig, ConfigError> {
        EngineConfig::from_lookup(|key| self.lookup(key))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a JSON summary of a snapshot.
    Inspect {
        #[arg(default_value = "-", help = "Snapshot file path, or - for stdin")]
        input: String,
    },
    /// Print the viewport that fits a snapshot on a screen of the given size.
    Fit {
        #[arg(default_value = "-", help = "Snapshot file path, or - for stdin")]
        input: String,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 800.0)]
        height: f64,
        #[arg(long, default_value_t = FIT_PADDING_PX)]
        padding: f64,
    },
    /// Render a snapshot to a PNG file.
    Render {
        #[arg(default_value = "-", help = "Snapshot file path, or - for stdin")]
        input: String,
        #[arg(long)]
        out: String,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
    /// Re-export a snapshot after validation and normalization.
    Normalize {
        #[arg(default_value = "-", help = "Snapshot file path, or - for stdin")]
        input: String,
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Format a JSON roadmap as plain text.
    Roadmap {
        #[arg(default_value = "-", help = "Roadmap file path, or - for stdin")]
        input: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.error_code(), error = %e, "boardtool failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ToolError> {
    match cli.command {
        Command::Inspect { input } => {
            let core = load(&cli.engine, &input)?;
            print_json(&report::inspect(&core))
        }
        Command::Fit { input, width, height, padding } => {
            if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
                return Err(ToolError::ViewportSize { width, height });
            }
            let mut core = load(&cli.engine, &input)?;
            core.set_viewport_size(width, height);
            core.fit_to_screen(padding);
            print_json(&core.viewport())
        }
        Command::Render { input, out, scale } => {
            let core = load(&cli.engine, &input)?;
            let bytes = core.export_png(scale)?;
            std::fs::write(&out, &bytes).map_err(|source| ToolError::Write { path: out.clone(), source })?;
            tracing::info!(path = %out, bytes = bytes.len(), "wrote png");
            Ok(())
        }
        Command::Normalize { input, compact } => {
            let core = load(&cli.engine, &input)?;
            let rendered = if compact { core.export_snapshot_compact()? } else { core.export_snapshot()? };
            println!("{rendered}");
            Ok(())
        }
        Command::Roadmap { input } => {
            let raw = read_input(&input)?;
            let entries = roadmap::parse_entries(&raw).map_err(ToolError::Roadmap)?;
            print!("{}", roadmap::format_roadmap(&entries));
            Ok(())
        }
    }
}

fn load(args: &EngineArgs, input: &str) -> Result<EngineCore, ToolError> {
    let mut core = EngineCore::with_config(args.config()?);
    let raw = read_input(input)?;
    core.import_snapshot(&raw)?;
    Ok(core)
}

fn read_input(path: &str) -> Result<String, ToolError> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| ToolError::Read { path: "<stdin>".to_owned(), source })?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(|source| ToolError::Read { path: path.to_owned(), source })
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ToolError> {
    let rendered = serde_json::to_string_pretty(value).map_err(ToolError::Output)?;
    println!("{rendered}");
    Ok(())
}
