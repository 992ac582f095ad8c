use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use colored::Colorize;

use crate::cli::SourceArgs;
use crate::config::Config;
use crate::controller::SlideController;
use crate::export::document::hidden_sections;
use crate::export::ffmpeg::FfmpegCapture;
use crate::export::video::{MAX_FPS, SlideFrames, VideoCapture, VideoJob};
use crate::render::raster::SvgRasterizer;
use crate::slides::SLIDES;
use crate::theme::Theme;

/// Record the video headlessly. Time is simulated, so a 20 second video
/// takes only as long as encoding it does.
pub fn run(
    source: SourceArgs,
    output_dir: Option<PathBuf>,
    fps: Option<u32>,
    dwell_ms: Option<u64>,
    quiet: bool,
) -> Result<()> {
    let config = Config::load_or_default();
    let (table, language) = super::load_source(&source, &config)?;
    let theme = Theme::default();
    let output_dir = output_dir.unwrap_or_else(|| config.video_dir());
    let fps = fps.unwrap_or_else(|| config.fps());
    let dwell = dwell_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.dwell());
    if !(1..=MAX_FPS).contains(&fps) {
        anyhow::bail!("--fps must be between 1 and {MAX_FPS}");
    }
    if dwell.is_zero() {
        anyhow::bail!("--dwell-ms must be greater than zero");
    }

    let rasterizer = SvgRasterizer::new(config.fonts_dir());
    let sections = hidden_sections(&table, language, &theme);
    let job = VideoJob::new(sections.len(), dwell, fps);
    let mut frames = SlideFrames::new(sections, &rasterizer, theme.background);
    let capture_source = FfmpegCapture::new(&output_dir, theme.background);
    let mut controller = SlideController::new(SLIDES.len(), config.autoplay_interval(), false);

    if !quiet {
        eprintln!(
            "Recording {} slides ({}) at {} fps, {} ms each",
            job.script.total,
            language,
            fps,
            dwell.as_millis(),
        );
    }

    let start = Instant::now();
    let mut capture = VideoCapture::start(&capture_source, &mut controller, &job, start)?;
    let step = Duration::from_secs(1) / fps;
    let mut now = start;
    let mut shown = None;
    loop {
        match capture.poll(&mut controller, now, &mut frames) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => {
                capture.abort(&mut controller, now);
                return Err(e.into());
            }
        }
        if !quiet && shown != Some(controller.index()) {
            shown = Some(controller.index());
            eprintln!("  {} {}", "Recording".dimmed(), SLIDES[controller.index()]);
        }
        now += step;
    }

    let path = capture.finish(&mut controller, now)?;
    println!("{} {}", "Saved".green().bold(), path.display());
    Ok(())
}
