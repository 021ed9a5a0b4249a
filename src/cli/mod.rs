//! CLI Module
//!
//! Command-line interface for inspecting tracks and simulating playback.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Playhead - precise playback engine
#[derive(Parser, Debug)]
#[command(name = "playhead")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a WAV file and print its properties
    #[command(name = "info")]
    Info {
        /// Path to the WAV file
        path: PathBuf,
    },

    /// Play a WAV file on the simulated backend with a virtual clock
    #[command(name = "simulate")]
    Simulate {
        /// Path to the WAV file
        path: PathBuf,

        /// JSON engine configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Playback rate (overrides the configuration)
        #[arg(short, long)]
        rate: Option<f64>,

        /// Volume in [0, 1] (overrides the configuration)
        #[arg(long)]
        volume: Option<f64>,

        /// Let pitch follow the playback rate
        #[arg(long)]
        no_pitch_adjust: bool,

        /// Start position in milliseconds
        #[arg(long)]
        seek: Option<f64>,

        /// Stop after this much virtual time (default: until the track ends)
        #[arg(long)]
        run_ms: Option<f64>,

        /// Virtual clock step in milliseconds
        #[arg(long, default_value_t = 16.0)]
        step_ms: f64,
    },
}
