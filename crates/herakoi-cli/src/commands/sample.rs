//! Probe the color and tone under one point of an image.

use std::path::PathBuf;

use clap::Args;
use herakoi_core::MappingMode;
use herakoi_synth::{DebugPanel, ToneObserver, TrackedPoint, to_pixel};

use super::common::{load_config, load_sampler, parse_canvas, parse_mode};

#[derive(Args)]
pub struct SampleArgs {
    /// Image to probe
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Normalized x coordinate (0 = left edge, 1 = right edge)
    #[arg(allow_negative_numbers = true)]
    x: f32,

    /// Normalized y coordinate (0 = top edge, 1 = bottom edge)
    #[arg(allow_negative_numbers = true)]
    y: f32,

    /// Canvas the coordinates refer to, e.g. 640x480 (default: image size)
    #[arg(long, value_parser = parse_canvas)]
    canvas: Option<(u32, u32)>,

    /// Color mapping: hue-value or three-channel
    #[arg(long, value_parser = parse_mode)]
    mode: Option<MappingMode>,

    /// Mirror the x coordinate
    #[arg(long)]
    mirror: bool,

    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: SampleArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.tone.mode = mode;
    }
    config.validate()?;
    let sampler = load_sampler(&args.image, args.canvas)?;
    let mirror = args.mirror || config.tracking.mirror;
    let driver = config.frame_driver().with_mirror(mirror);

    let x = if mirror { 1.0 - args.x } else { args.x };
    let px = to_pixel(x, sampler.width());
    let py = to_pixel(args.y, sampler.height());
    println!(
        "Pixel ({}, {}) of {}x{}",
        px,
        py,
        sampler.width(),
        sampler.height()
    );

    let plan = driver.plan_frame(&[TrackedPoint::new(0, args.x, args.y)], Some(&sampler));
    if plan.samples.is_empty() {
        println!("Nothing to sample at ({}, {}).", args.x, args.y);
        return Ok(());
    }

    let mut panel = DebugPanel::new();
    panel.observe(&plan.samples);
    println!("{}", panel.render());
    Ok(())
}
