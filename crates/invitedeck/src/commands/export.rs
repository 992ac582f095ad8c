use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use crate::cli::SourceArgs;
use crate::config::Config;
use crate::controller::SlideController;
use crate::export::document::{self, DocumentJob};
use crate::export::pdf::{PageFormat, PageUnit, PdfDocument};
use crate::render::raster::SvgRasterizer;
use crate::slides::SLIDES;
use crate::theme::Theme;

pub fn run(
    source: SourceArgs,
    output_dir: Option<PathBuf>,
    unit: Option<PageUnit>,
    quiet: bool,
) -> Result<()> {
    let config = Config::load_or_default();
    let (table, language) = super::load_source(&source, &config)?;
    let theme = Theme::default();
    let output_dir = output_dir.unwrap_or_else(|| config.export_dir());

    let mut job = DocumentJob::new(&table, language, &theme, &output_dir);
    job.settle = config.settle();
    job.options.quality = config.jpeg_quality();
    let format = PageFormat::a4(unit.unwrap_or_else(|| config.page_unit()));

    if !quiet {
        eprintln!(
            "Exporting {} pages ({}) to {}",
            job.sections.len(),
            language,
            job.output_path().display(),
        );
    }

    let rasterizer = SvgRasterizer::new(config.fonts_dir());
    let mut controller = SlideController::new(SLIDES.len(), config.autoplay_interval(), false);
    let mut pdf = PdfDocument::new(format);
    let path = document::export_document(&mut controller, &job, &rasterizer, &mut pdf)?;

    println!("{} {}", "Saved".green().bold(), path.display());
    Ok(())
}
