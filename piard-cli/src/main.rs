//! piard - servo array tool
//! Validates manifests, prints servo state, encodes frames and drives servos

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use piard_cli::commands;
use piard_core::ServoField;
use piard_drivers::EncoderKind;

#[derive(Parser)]
#[command(name = "piard")]
#[command(author = "Silvano Neto <dev@silvanoneto.com>")]
#[command(version = "2026.1.16")]
#[command(about = "piard - configure and drive servo arrays", long_about = None)]
struct Cli {
    /// Manifest file, or a directory to search upward from for piard.toml
    #[arg(short, long, global = true, value_name = "PATH", env = "PIARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest and the driver selection
    Check,

    /// Print per-servo fields (default: index angle pulse_width value)
    Show {
        /// Field names, e.g. min_angle, servo_max, flip
        #[arg(value_name = "FIELD")]
        fields: Vec<ServoField>,
    },

    /// Print the frame a microcontroller would receive
    Encode {
        /// Frame format (comma or two-byte)
        #[arg(short, long, default_value = "comma")]
        format: EncoderKind,

        /// Comma-separated angles to encode instead of the initial position
        #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
        angles: Option<Vec<f64>>,
    },

    /// Move servos with key commands read line by line from stdin
    Drive,

    /// List drivers compiled into this build
    Drivers,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "piard=debug,piard_cli=debug,piard_core=debug,piard_drivers=debug"
    } else {
        "piard=info,piard_cli=info,piard_core=info,piard_drivers=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(config: Option<PathBuf>, command: Commands) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    let load = || commands::load_manifest(config.as_deref());

    match command {
        Commands::Check => {
            let (manifest, path) = load()?;
            commands::check(&manifest, &path, &mut out)
        }
        Commands::Show { fields } => {
            let (manifest, _) = load()?;
            commands::show(&manifest, &fields, &mut out)
        }
        Commands::Encode { format, angles } => {
            let (manifest, _) = load()?;
            commands::encode(&manifest, format, angles.as_deref(), &mut out).map(|_| ())
        }
        Commands::Drive => {
            let (manifest, _) = load()?;
            commands::drive(&manifest, io::stdin().lock(), &mut out)
        }
        Commands::Drivers => commands::drivers(&mut out),
    }
}

fn main() {
    let _ = dotenv::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.config, cli.command) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
