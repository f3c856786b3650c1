//! Detection track management command.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use herakoi_config::{
    ConfigError, ensure_user_tracks_dir, find_track, list_user_tracks, track_name_from_path,
    user_tracks_dir,
};
use herakoi_io::{DEFAULT_FRAME_INTERVAL_MS, DetectionTrack};

#[derive(Args)]
pub struct TrackArgs {
    #[command(subcommand)]
    command: TrackCommand,
}

#[derive(Subcommand)]
enum TrackCommand {
    /// Write a left-to-right sweep track
    Sweep {
        /// Track name, saved as NAME.json in the user track directory
        name: String,

        /// Number of frames
        #[arg(long, default_value = "150")]
        frames: usize,

        /// Number of hands
        #[arg(long, default_value = "1")]
        hands: usize,

        /// Milliseconds between frames
        #[arg(long, default_value_t = DEFAULT_FRAME_INTERVAL_MS)]
        interval_ms: u64,

        /// Write to this file instead of the user track directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List tracks in the user track directory
    List,

    /// Show a track summary
    Show {
        /// Track name or path
        name: String,
    },
}

pub fn run(args: TrackArgs) -> anyhow::Result<()> {
    match args.command {
        TrackCommand::Sweep {
            name,
            frames,
            hands,
            interval_ms,
            output,
        } => {
            if hands == 0 {
                anyhow::bail!("--hands must be at least 1");
            }
            let path = match output {
                Some(path) => path,
                None => ensure_user_tracks_dir()?.join(format!("{}.json", name)),
            };
            let track = DetectionTrack::horizontal_sweep(frames, hands, interval_ms);
            track.save(&path)?;
            tracing::info!(path = %path.display(), frames, hands, "sweep track written");
            println!("Wrote {} ({} frames) to {}", name, track.len(), path.display());
        }

        TrackCommand::List => {
            let tracks = list_user_tracks();
            if tracks.is_empty() {
                println!("No tracks in {}", user_tracks_dir().display());
                println!("\nCreate one with: herakoi track sweep <NAME>");
                return Ok(());
            }

            println!("Tracks");
            println!("======\n");
            for path in &tracks {
                let name = track_name_from_path(path).unwrap_or_default();
                match DetectionTrack::load(path) {
                    Ok(track) => println!(
                        "  {:<24} {:>5} frames  {:>6.1}s",
                        name,
                        track.len(),
                        track.duration().as_secs_f64()
                    ),
                    Err(e) => println!("  {:<24} (unreadable: {})", name, e),
                }
            }
        }

        TrackCommand::Show { name } => {
            let path = find_track(&name).ok_or_else(|| ConfigError::TrackNotFound(name.clone()))?;
            let track = DetectionTrack::load(&path)?;
            let hands = track
                .frames
                .iter()
                .flat_map(|f| f.points.iter().map(|p| p.hand))
                .max()
                .map_or(0, |h| h + 1);
            let empty = track.frames.iter().filter(|f| f.points.is_empty()).count();

            println!("Track: {}", path.display());
            println!("  Frames:         {}", track.len());
            println!("  Frame interval: {} ms", track.frame_interval_ms);
            println!("  Duration:       {:.2}s", track.duration().as_secs_f64());
            println!("  Hands:          {}", hands);
            println!("  Empty frames:   {}", empty);
        }
    }

    Ok(())
}
