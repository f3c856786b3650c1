//! Offline rendering of a sonification session to WAV.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use herakoi_config::HerakoiConfig;
use herakoi_core::{ColorSampler, ManualClock, RenderGraph};
use herakoi_io::{DetectionTrack, WavRecorder, WavSpec, read_wav_info};
use herakoi_synth::{SyncReport, TracingObserver, VoiceRegistry};
use indicatif::{ProgressBar, ProgressStyle};

use super::common::SessionArgs;

/// Frames rendered per block handed to the recorder.
const RENDER_BLOCK_FRAMES: u64 = 1024;

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    /// Output bit depth (16, 24 or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,

    /// Silence appended after the last fade, in milliseconds
    #[arg(long, default_value = "50")]
    tail_ms: u64,
}

/// What an offline render produced.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderSummary {
    /// Frames written per channel.
    pub frames: u64,
    /// Largest absolute sample value.
    pub peak: f32,
    /// Voice activity accumulated over every frame.
    pub report: SyncReport,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = args.session.load_config()?;
    let sampler = args.session.load_sampler()?;
    let track = args.session.load_track(config.tracking.max_hands)?;

    println!("Rendering {}...", args.session.image.display());
    println!(
        "  {} frames, {} ms apart, {} Hz, {} channel(s), {} mapping",
        track.len(),
        track.frame_interval_ms,
        config.output.sample_rate,
        config.output.channels,
        config.tone.mode
    );

    let spec = WavSpec {
        channels: config.output.channels,
        sample_rate: config.output.sample_rate,
        bits_per_sample: args.bit_depth,
    };
    let mut recorder = WavRecorder::create(&args.output, spec)?;

    let pb = ProgressBar::new(track.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let summary = render_session(
        &config,
        &sampler,
        &track,
        &mut recorder,
        Duration::from_millis(args.tail_ms),
        &pb,
    )?;
    pb.finish_with_message("done");
    recorder.finalize()?;

    let info = read_wav_info(&args.output)?;
    println!("\nWrote {}", args.output.display());
    println!(
        "  {} frames, {:.2}s, {}-bit",
        info.num_frames, info.duration_secs, info.spec.bits_per_sample
    );
    println!("  Peak: {:.3}", summary.peak);
    println!(
        "  Voices: {} created, {} faded, {} released",
        summary.report.created, summary.report.faded, summary.report.released
    );
    Ok(())
}

/// Render `track` over `sampler` into `recorder`.
///
/// The registry runs on a manual clock kept in lockstep with the graph, so
/// every frame's updates land exactly on the frame's sample position. After
/// the last frame every voice is stopped and the fade plus `tail` is
/// rendered.
pub fn render_session(
    config: &HerakoiConfig,
    sampler: &dyn ColorSampler,
    track: &DetectionTrack,
    recorder: &mut WavRecorder,
    tail: Duration,
    progress: &ProgressBar,
) -> anyhow::Result<RenderSummary> {
    let clock = ManualClock::new();
    let timing = config.timing();
    let mut registry = VoiceRegistry::with_clock(
        RenderGraph::new(config.output.sample_rate as f32),
        clock.clone(),
        timing,
        config.voices.waveform,
    );
    let driver = config.frame_driver();
    let mut renderer = BlockRenderer::new(config.output.sample_rate, config.output.channels);
    let mut summary = RenderSummary::default();
    let mut elapsed = Duration::ZERO;

    for frame in &track.frames {
        summary.report += driver.process_frame(
            &mut registry,
            &frame.tracked_points(),
            Some(sampler),
            &mut TracingObserver,
        );
        elapsed += track.frame_interval();
        renderer.render_until(registry.sink_mut(), elapsed, recorder)?;
        clock.set(elapsed);
        progress.inc(1);
    }

    registry.stop_all_voices();
    elapsed += timing.fade;
    renderer.render_until(registry.sink_mut(), elapsed, recorder)?;
    clock.set(elapsed);
    summary.report.released += registry.complete_due_releases().len();

    elapsed += tail;
    renderer.render_until(registry.sink_mut(), elapsed, recorder)?;

    summary.frames = registry.sink().frames_rendered();
    summary.peak = renderer.peak;
    tracing::debug!(
        frames = summary.frames,
        peak = summary.peak,
        "offline render finished"
    );
    Ok(summary)
}

/// Pulls interleaved blocks out of a graph up to a target time.
struct BlockRenderer {
    sample_rate: u32,
    channels: usize,
    block: Vec<f32>,
    peak: f32,
}

impl BlockRenderer {
    fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels: usize::from(channels.max(1)),
            block: Vec::new(),
            peak: 0.0,
        }
    }

    fn render_until(
        &mut self,
        graph: &mut RenderGraph,
        until: Duration,
        recorder: &mut WavRecorder,
    ) -> anyhow::Result<()> {
        let target = (until.as_secs_f64() * f64::from(self.sample_rate)).round() as u64;
        let mut remaining = target.saturating_sub(graph.frames_rendered());
        while remaining > 0 {
            let frames = remaining.min(RENDER_BLOCK_FRAMES) as usize;
            self.block.clear();
            self.block.resize(frames * self.channels, 0.0);
            graph.render_interleaved(&mut self.block, self.channels);
            self.peak = self
                .block
                .iter()
                .fold(self.peak, |peak, s| peak.max(s.abs()));
            recorder.write(&self.block)?;
            remaining -= frames as u64;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herakoi_io::{ImageSampler, read_wav};
    use tempfile::NamedTempFile;

    fn white(width: u32, height: u32) -> ImageSampler {
        let rgba = vec![255u8; (width * height * 4) as usize];
        ImageSampler::from_rgba(width, height, &rgba).unwrap()
    }

    fn render(
        config: &HerakoiConfig,
        sampler: &ImageSampler,
        track: &DetectionTrack,
    ) -> (RenderSummary, Vec<f32>, WavSpec) {
        let file = NamedTempFile::with_suffix(".wav").unwrap();
        let spec = WavSpec {
            channels: config.output.channels,
            sample_rate: config.output.sample_rate,
            bits_per_sample: 32,
        };
        let mut recorder = WavRecorder::create(file.path(), spec).unwrap();
        let summary = render_session(
            config,
            sampler,
            track,
            &mut recorder,
            Duration::from_millis(10),
            &ProgressBar::hidden(),
        )
        .unwrap();
        recorder.finalize().unwrap();
        let (samples, spec) = read_wav(file.path()).unwrap();
        (summary, samples, spec)
    }

    #[test]
    fn length_covers_track_fade_and_tail() {
        let mut config = HerakoiConfig::default();
        config.output.sample_rate = 8000;
        config.output.channels = 1;
        let track = DetectionTrack::horizontal_sweep(10, 1, 20);

        let (summary, samples, spec) = render(&config, &white(8, 8), &track);

        // 10 x 20 ms + 100 ms fade + 10 ms tail
        assert_eq!(summary.frames, 8000 * 310 / 1000);
        assert_eq!(samples.len() as u64, summary.frames);
        assert_eq!(spec.sample_rate, 8000);
    }

    #[test]
    fn voices_are_created_and_released() {
        let mut config = HerakoiConfig::default();
        config.output.sample_rate = 8000;
        config.output.channels = 2;
        let track = DetectionTrack::horizontal_sweep(8, 2, 25);

        let (summary, samples, _) = render(&config, &white(8, 8), &track);

        assert_eq!(summary.report.created, 2);
        assert_eq!(summary.report.released, 2);
        assert!(summary.peak > 0.0);
        assert!(samples.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn three_channel_white_image_is_loud_and_panned_left() {
        let mut config = HerakoiConfig::default();
        config.output.sample_rate = 8000;
        config.output.channels = 2;
        config.tone.mode = herakoi_core::MappingMode::ThreeChannel;
        let track = DetectionTrack::horizontal_sweep(5, 1, 20);

        let (summary, _, spec) = render(&config, &white(8, 8), &track);

        assert_eq!(spec.channels, 2);
        // White has zero saturation (hard left) and full brightness (gain 1.0).
        assert!(summary.peak > 0.9, "peak {}", summary.peak);
        assert_eq!(summary.report.created, 1);
    }

    #[test]
    fn black_image_is_silent() {
        let mut config = HerakoiConfig::default();
        config.output.sample_rate = 8000;
        config.output.channels = 1;
        let rgba: Vec<u8> = [0, 0, 0, 255].repeat(16);
        let black = ImageSampler::from_rgba(4, 4, &rgba).unwrap();
        let track = DetectionTrack::horizontal_sweep(5, 1, 20);

        let (summary, _, _) = render(&config, &black, &track);

        assert_eq!(summary.report.created, 1);
        assert!(summary.peak < 0.002);
    }

    #[test]
    fn empty_track_renders_only_fade_and_tail() {
        let mut config = HerakoiConfig::default();
        config.output.sample_rate = 8000;
        config.output.channels = 1;
        let track = DetectionTrack::new(33);

        let (summary, _, _) = render(&config, &white(2, 2), &track);

        assert_eq!(summary.frames, 8000 * 110 / 1000);
        assert_eq!(summary.report, SyncReport::default());
    }
}
