//! Playhead CLI
//!
//! Command-line interface for the Playhead playback engine.

use clap::Parser;
use env_logger::Env;
use log::info;

use playhead::cli::commands::{self, SimulateOptions};
use playhead::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Playhead v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Playhead v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { path } => {
            let info = commands::info(&path)?;
            println!("File:        {}", path.display());
            println!("Duration:    {:.3} ms", info.duration_millis);
            println!("Channels:    {}", info.channels);
            println!("Sample rate: {} Hz", info.sample_rate);
            Ok(())
        }
        Commands::Simulate {
            path,
            config,
            rate,
            volume,
            no_pitch_adjust,
            seek,
            run_ms,
            step_ms,
        } => {
            let report = commands::simulate(&SimulateOptions {
                path,
                config,
                rate,
                volume,
                no_pitch_adjust,
                seek_millis: seek,
                run_millis: run_ms,
                step_millis: step_ms,
            })?;

            let timeupdates = report
                .events
                .iter()
                .filter(|e| e.kind.name() == "timeupdate")
                .count();
            for event in report.events.iter().filter(|e| e.kind.name() != "timeupdate") {
                println!("event: {}", event.kind);
            }
            println!("timeupdate events: {}", timeupdates);
            println!("Virtual time:   {:.1} ms", report.elapsed_millis);
            println!(
                "Position:       {:.3} / {:.3} ms",
                report.final_position_millis, report.duration_millis
            );
            println!("Ended:          {}", report.ended);
            Ok(())
        }
    }
}
