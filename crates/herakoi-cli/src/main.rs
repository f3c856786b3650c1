//! Herakoi CLI - sonify images by moving (recorded or scripted) fingertips over them.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "herakoi")]
#[command(author, version, about = "Herakoi image sonification CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sonify an image in real time following a detection track
    Play(commands::play::PlayArgs),

    /// Render a sonification session to a WAV file
    Render(commands::render::RenderArgs),

    /// Probe the color and tone under one point of an image
    Sample(commands::sample::SampleArgs),

    /// Create, list and inspect detection tracks
    Track(commands::track::TrackArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),

    /// Show, create and validate the configuration file
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Sample(args) => commands::sample::run(args),
        Commands::Track(args) => commands::track::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
