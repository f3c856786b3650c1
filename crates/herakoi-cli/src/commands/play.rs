//! Real-time sonification command.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clap::Args;
use herakoi_core::MonotonicClock;
use herakoi_io::{CpalBackend, DetectionTrack, StreamSink};
use herakoi_synth::{DebugPanel, SyncReport, ToneObserver, TrackedPoint, VoiceRegistry};

use super::common::{SessionArgs, stream_config};

#[derive(Args)]
pub struct PlayArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Output device name (partial match)
    #[arg(long)]
    device: Option<String>,

    /// Run the session without opening an audio device
    #[arg(long)]
    dry_run: bool,

    /// Print the tone panel after every frame
    #[arg(long)]
    debug: bool,

    /// Repeat the track until interrupted
    #[arg(long = "loop")]
    repeat: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let mut config = args.session.load_config()?;
    if let Some(device) = &args.device {
        config.output.device = Some(device.clone());
    }
    let sampler = args.session.load_sampler()?;
    let track = args.session.load_track(config.tracking.max_hands)?;
    let driver = config.frame_driver();

    println!("Playing {}", args.session.image.display());
    println!("  Canvas:   {}x{}", sampler.width(), sampler.height());
    println!(
        "  Track:    {} frames, {} ms apart",
        track.len(),
        track.frame_interval_ms
    );
    println!("  Waveform: {}", config.voices.waveform);
    println!(
        "  Tone:     {:.0}-{:.0} Hz, volume {:.2}-{:.2}",
        config.tone.min_freq, config.tone.max_freq, config.tone.min_vol, config.tone.max_vol
    );
    if args.repeat {
        println!("\nPress Ctrl+C to stop...\n");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let sink = if args.dry_run {
        None
    } else {
        match StreamSink::open(&CpalBackend::new(), &stream_config(&config)) {
            Ok(sink) => Some(sink),
            Err(e) => {
                tracing::warn!(error = %e, "audio output unavailable, continuing without sound");
                None
            }
        }
    };

    let mut panel = DebugPanel::new();
    let played = match sink {
        Some(sink) => {
            tracing::info!(
                backend = sink.backend_name(),
                sample_rate = sink.sample_rate(),
                channels = sink.channels(),
                "audio output started"
            );
            let timing = config.timing();
            let mut registry =
                VoiceRegistry::with_clock(sink, MonotonicClock::new(), timing, config.voices.waveform);
            let mut totals = SyncReport::default();

            let played = play_frames(&track, args.repeat, &running, |points| {
                totals += driver.process_frame(&mut registry, points, Some(&sampler), &mut panel);
                if args.debug {
                    println!("{}\n", panel.render());
                }
            });

            registry.stop_all_voices();
            std::thread::sleep(timing.fade);
            totals.released += registry.complete_due_releases().len();

            let errors = registry.sink().stream_errors();
            if errors > 0 {
                tracing::warn!(errors, "audio stream reported errors");
            }
            println!("\nVoices:");
            println!("  Created:      {}", totals.created);
            println!("  Updated:      {}", totals.updated);
            println!("  Rate limited: {}", totals.rate_limited);
            println!("  Faded:        {}", totals.faded);
            println!("  Released:     {}", totals.released);
            played
        }
        None => play_frames(&track, args.repeat, &running, |points| {
            let plan = driver.plan_frame(points, Some(&sampler));
            panel.observe(&plan.samples);
            if args.debug {
                println!("{}\n", panel.render());
            }
        }),
    };

    println!("\nPlayed {} frame(s). Last tones:", played);
    println!("{}", panel.render());
    Ok(())
}

/// Feed the track's frames to `on_frame` at the track's frame rate.
///
/// Stops early when `running` is cleared. Returns the number of frames fed.
fn play_frames<F>(track: &DetectionTrack, repeat: bool, running: &AtomicBool, mut on_frame: F) -> usize
where
    F: FnMut(&[TrackedPoint]),
{
    let interval = track.frame_interval();
    let mut played = 0;
    loop {
        for frame in &track.frames {
            if !running.load(Ordering::SeqCst) {
                return played;
            }
            let started = Instant::now();
            on_frame(&frame.tracked_points());
            played += 1;
            if let Some(rest) = interval.checked_sub(started.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        if !repeat || track.is_empty() {
            return played;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_every_frame_once() {
        let track = DetectionTrack::horizontal_sweep(5, 1, 0);
        let running = AtomicBool::new(true);
        let mut seen = Vec::new();
        let played = play_frames(&track, false, &running, |points| seen.push(points.len()));
        assert_eq!(played, 5);
        assert_eq!(seen, vec![1; 5]);
    }

    #[test]
    fn stops_when_interrupted() {
        let track = DetectionTrack::horizontal_sweep(5, 1, 0);
        let running = AtomicBool::new(true);
        let played = play_frames(&track, true, &running, |_| {
            running.store(false, Ordering::SeqCst);
        });
        assert_eq!(played, 1);
    }

    #[test]
    fn empty_track_never_loops() {
        let track = DetectionTrack::new(0);
        let running = AtomicBool::new(true);
        assert_eq!(play_frames(&track, true, &running, |_| {}), 0);
    }
}
