//! Multi-page document export.
//!
//! Every slide is composed again as a print section, rasterized at 2x,
//! encoded as JPEG and placed full-bleed on its own A4 page. Sections are
//! processed strictly one at a time and the file is only written once the
//! whole document has been assembled.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

use eframe::egui::Color32;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};

use crate::content::{ContentTable, Language};
use crate::controller::SlideController;
use crate::export::{ExportError, ExportResult, blend_over};
use crate::render::raster::SvgRasterizer;
use crate::render::scene::Scene;
use crate::slides::SLIDES;
use crate::theme::Theme;

pub const DEFAULT_SCALE: f32 = 2.0;
pub const DEFAULT_JPEG_QUALITY: u8 = 95;
/// Grace period before rasterizing, so late-loading content can settle.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(500);

/// Shown to the user when the document export fails, whatever the cause.
pub const FAILURE_ALERT: &str =
    "Sorry, the invitation could not be saved as a PDF. Please try again.";

/// One print-ready page source.
pub struct Section {
    pub name: String,
    pub scene: Scene,
}

/// The off-screen print representation: one section per slide, in reading order.
pub fn hidden_sections(table: &ContentTable, language: Language, theme: &Theme) -> Vec<Section> {
    SLIDES
        .iter()
        .map(|slide| Section {
            name: slide.name().to_string(),
            scene: slide.compose(table.get(language), &table.common, language, theme),
        })
        .collect()
}

/// Turns a scene into pixels.
pub trait Rasterizer {
    fn rasterize(&self, scene: &Scene, scale: f32, fallback: Color32) -> Result<RgbaImage, String>;
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, scene: &Scene, scale: f32, fallback: Color32) -> Result<RgbaImage, String> {
        self.render(scene, scale, fallback)
    }
}

impl<T: Rasterizer + ?Sized> Rasterizer for &T {
    fn rasterize(&self, scene: &Scene, scale: f32, fallback: Color32) -> Result<RgbaImage, String> {
        (**self).rasterize(scene, scale, fallback)
    }
}

impl<T: Rasterizer + ?Sized> Rasterizer for Rc<T> {
    fn rasterize(&self, scene: &Scene, scale: f32, fallback: Color32) -> Result<RgbaImage, String> {
        (**self).rasterize(scene, scale, fallback)
    }
}

/// A paged output document. It starts with one empty page already present.
pub trait PageSink {
    fn add_page(&mut self) -> ExportResult<()>;

    /// Place a JPEG covering the whole current page.
    fn place_image(&mut self, jpeg: &[u8], width: u32, height: u32) -> ExportResult<()>;

    fn finish(&mut self) -> ExportResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy)]
pub struct AssembleOptions {
    pub scale: f32,
    pub quality: u8,
    /// Fill behind transparent regions of a section.
    pub fallback: Color32,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            quality: DEFAULT_JPEG_QUALITY,
            fallback: Theme::default().background,
        }
    }
}

/// Flatten `image` onto `fallback` and encode it as JPEG.
pub fn encode_jpeg(image: &RgbaImage, quality: u8, fallback: Color32) -> ExportResult<Vec<u8>> {
    let background = [fallback.r(), fallback.g(), fallback.b()];
    let rgb = RgbImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(blend_over(image.get_pixel(x, y).0, background))
    });
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(buf)
}

/// Rasterize, encode and place every section in order, returning the
/// finished document bytes.
///
/// The first section lands on the sink's implicit page; each later one is
/// preceded by `add_page`.
pub fn assemble<R, S>(
    sections: &[Section],
    rasterizer: &R,
    sink: &mut S,
    options: &AssembleOptions,
) -> ExportResult<Vec<u8>>
where
    R: Rasterizer + ?Sized,
    S: PageSink + ?Sized,
{
    if sections.is_empty() {
        return Err(ExportError::NoSections);
    }
    for (i, section) in sections.iter().enumerate() {
        let image = rasterizer
            .rasterize(&section.scene, options.scale, options.fallback)
            .map_err(|reason| ExportError::rasterize(&section.name, reason))?;
        let jpeg = encode_jpeg(&image, options.quality, options.fallback)?;
        if i > 0 {
            sink.add_page()?;
        }
        sink.place_image(&jpeg, image.width(), image.height())?;
        tracing::debug!(
            section = %section.name,
            width = image.width(),
            height = image.height(),
            bytes = jpeg.len(),
            "placed section"
        );
    }
    sink.finish()
}

/// Everything a single document export needs.
pub struct DocumentJob {
    pub sections: Vec<Section>,
    pub output_dir: PathBuf,
    pub file_name: String,
    pub settle: Duration,
    pub options: AssembleOptions,
}

impl DocumentJob {
    pub fn new(table: &ContentTable, language: Language, theme: &Theme, output_dir: &Path) -> Self {
        Self {
            sections: hidden_sections(table, language, theme),
            output_dir: output_dir.to_path_buf(),
            file_name: document_file_name(table, language),
            settle: DEFAULT_SETTLE,
            options: AssembleOptions {
                fallback: theme.background,
                ..AssembleOptions::default()
            },
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

/// `{groom}_{bride}_Invite.pdf` for the language being exported.
pub fn document_file_name(table: &ContentTable, language: Language) -> String {
    let Some(content) = table.get(language) else {
        return "Wedding_Invite.pdf".to_string();
    };
    let clean = |name: &str| {
        name.trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
            .collect::<String>()
    };
    format!(
        "{}_{}_Invite.pdf",
        clean(&content.groom_name),
        clean(&content.bride_name)
    )
}

/// Run a complete document export, blocking through the settle delay.
///
/// Refuses with [`ExportError::Busy`] if another export is running. The
/// exporting flag is cleared on every path; autoplay stays paused.
pub fn export_document<R, S>(
    controller: &mut SlideController,
    job: &DocumentJob,
    rasterizer: &R,
    sink: &mut S,
) -> ExportResult<PathBuf>
where
    R: Rasterizer + ?Sized,
    S: PageSink + ?Sized,
{
    if !controller.begin_export() {
        return Err(ExportError::Busy);
    }
    if !job.settle.is_zero() {
        std::thread::sleep(job.settle);
    }
    complete_document(controller, job, rasterizer, sink)
}

/// Second half of an export already begun with
/// [`SlideController::begin_export`]. Always ends the export.
pub fn complete_document<R, S>(
    controller: &mut SlideController,
    job: &DocumentJob,
    rasterizer: &R,
    sink: &mut S,
) -> ExportResult<PathBuf>
where
    R: Rasterizer + ?Sized,
    S: PageSink + ?Sized,
{
    let result = write_document(job, rasterizer, sink);
    controller.end_export(Instant::now());
    match &result {
        Ok(path) => tracing::info!(path = %path.display(), "document exported"),
        Err(e) => tracing::error!(error = %e, "document export failed"),
    }
    result
}

fn write_document<R, S>(job: &DocumentJob, rasterizer: &R, sink: &mut S) -> ExportResult<PathBuf>
where
    R: Rasterizer + ?Sized,
    S: PageSink + ?Sized,
{
    tracing::info!(sections = job.sections.len(), "assembling document");
    let bytes = assemble(&job.sections, rasterizer, sink, &job.options)?;

    std::fs::create_dir_all(&job.output_dir)?;
    let path = job.output_path();
    if let Err(source) = std::fs::write(&path, &bytes) {
        let _ = std::fs::remove_file(&path);
        return Err(ExportError::Write { path, source });
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::DEFAULT_AUTOPLAY_INTERVAL;
    use std::cell::RefCell;

    /// Paints a solid image. A rasterizer that knows the sections paints
    /// section `k` exactly `k + 1` pixels wide, so pages can be told apart.
    struct FakeRasterizer {
        fail_at: Option<usize>,
        calls: RefCell<usize>,
        known: Vec<String>,
    }

    impl FakeRasterizer {
        fn new() -> Self {
            Self {
                fail_at: None,
                calls: RefCell::new(0),
                known: Vec::new(),
            }
        }

        fn recognising(sections: &[Section]) -> Self {
            Self {
                known: sections.iter().map(|s| s.scene.to_svg()).collect(),
                ..Self::new()
            }
        }

        fn failing_at(index: usize) -> Self {
            Self {
                fail_at: Some(index),
                ..Self::new()
            }
        }
    }

    impl Rasterizer for FakeRasterizer {
        fn rasterize(&self, scene: &Scene, scale: f32, _: Color32) -> Result<RgbaImage, String> {
            let mut calls = self.calls.borrow_mut();
            let index = *calls;
            *calls += 1;
            if self.fail_at == Some(index) {
                return Err("canvas tainted".into());
            }
            if !self.known.is_empty() {
                let svg = scene.to_svg();
                let position = self
                    .known
                    .iter()
                    .position(|k| *k == svg)
                    .ok_or("unknown scene")?;
                return Ok(RgbaImage::from_pixel(
                    position as u32 + 1,
                    3,
                    image::Rgba([200, 10, 10, 255]),
                ));
            }
            let w = (scene.width() * scale / 100.0) as u32;
            let h = (scene.height() * scale / 100.0) as u32;
            Ok(RgbaImage::from_pixel(w, h, image::Rgba([200, 10, 10, 255])))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        ops: Vec<String>,
    }

    impl PageSink for RecordingSink {
        fn add_page(&mut self) -> ExportResult<()> {
            self.ops.push("add_page".into());
            Ok(())
        }

        fn place_image(&mut self, jpeg: &[u8], width: u32, height: u32) -> ExportResult<()> {
            assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "JPEG start-of-image marker");
            self.ops.push(format!("image {width}x{height}"));
            Ok(())
        }

        fn finish(&mut self) -> ExportResult<Vec<u8>> {
            self.ops.push("finish".into());
            Ok(b"%PDF-fake".to_vec())
        }
    }

    fn job(dir: &Path) -> DocumentJob {
        let table = ContentTable::builtin();
        let mut job = DocumentJob::new(&table, Language::English, &Theme::default(), dir);
        job.settle = Duration::ZERO;
        job
    }

    fn controller() -> SlideController {
        let mut c = SlideController::new(SLIDES.len(), DEFAULT_AUTOPLAY_INTERVAL, true);
        c.open_gate(Instant::now());
        c
    }

    #[test]
    fn sections_follow_reading_order() {
        let table = ContentTable::builtin();
        let sections = hidden_sections(&table, Language::English, &Theme::default());
        let names: Vec<_> = sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Cover", "Invite", "Programs", "Compliments"]);
    }

    #[test]
    fn one_page_per_section_with_implicit_first_page() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let mut sink = RecordingSink::default();
        assemble(&job.sections, &FakeRasterizer::new(), &mut sink, &job.options).unwrap();
        assert_eq!(
            sink.ops,
            [
                "image 15x22",
                "add_page",
                "image 15x22",
                "add_page",
                "image 15x22",
                "add_page",
                "image 15x22",
                "finish",
            ]
        );
    }

    #[test]
    fn pages_follow_section_order() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let rasterizer = FakeRasterizer::recognising(&job.sections);
        let distinct: std::collections::HashSet<_> = rasterizer.known.iter().collect();
        assert_eq!(distinct.len(), SLIDES.len());

        let mut sink = RecordingSink::default();
        assemble(&job.sections, &rasterizer, &mut sink, &job.options).unwrap();
        assert_eq!(
            sink.ops,
            [
                "image 1x3",
                "add_page",
                "image 2x3",
                "add_page",
                "image 3x3",
                "add_page",
                "image 4x3",
                "finish",
            ]
        );
    }

    #[test]
    fn no_sections_is_an_error() {
        let mut sink = RecordingSink::default();
        let err = assemble(
            &[],
            &FakeRasterizer::new(),
            &mut sink,
            &AssembleOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ExportError::NoSections));
        assert!(sink.ops.is_empty());
    }

    #[test]
    fn successful_export_writes_named_file_and_keeps_autoplay_paused() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let mut c = controller();
        let path = export_document(&mut c, &job, &FakeRasterizer::new(), &mut RecordingSink::default())
            .unwrap();
        assert_eq!(path, dir.path().join("Ibrahim_Zenab_Invite.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-fake");
        assert!(!c.state().exporting);
        assert!(!c.state().autoplay);
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn failure_midway_writes_nothing_and_clears_exporting() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let mut c = controller();
        let mut sink = RecordingSink::default();
        let err = export_document(&mut c, &job, &FakeRasterizer::failing_at(2), &mut sink)
            .unwrap_err();
        match err {
            ExportError::Rasterize { section, reason } => {
                assert_eq!(section, "Programs");
                assert_eq!(reason, "canvas tainted");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!job.output_path().exists());
        assert!(!sink.ops.contains(&"finish".to_string()));
        assert!(!c.state().exporting);
        assert!(!c.state().autoplay);
    }

    #[test]
    fn concurrent_export_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let mut c = controller();
        assert!(c.begin_export());
        let err = export_document(&mut c, &job, &FakeRasterizer::new(), &mut RecordingSink::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::Busy));
        assert!(c.state().exporting, "the running export keeps its flag");
        assert!(!job.output_path().exists());
    }

    #[test]
    fn file_name_uses_the_exported_language() {
        let table = ContentTable::builtin();
        assert_eq!(
            document_file_name(&table, Language::English),
            "Ibrahim_Zenab_Invite.pdf"
        );
        let empty = ContentTable::default();
        assert_eq!(
            document_file_name(&empty, Language::English),
            "Wedding_Invite.pdf"
        );
    }

    #[test]
    fn file_name_strips_path_separators() {
        let table = ContentTable::parse("en:\n  groom_name: A/B\n  bride_name: C\\D\n").unwrap();
        assert_eq!(
            document_file_name(&table, Language::English),
            "A_B_C_D_Invite.pdf"
        );
    }

    #[test]
    fn jpeg_flattens_transparency() {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([0, 0, 0, 0]));
        let jpeg = encode_jpeg(&image, 95, Color32::WHITE).unwrap();
        let decoded = image::load_from_memory(&jpeg).unwrap().to_rgb8();
        let px = decoded.get_pixel(4, 4).0;
        assert!(px.iter().all(|&c| c > 245), "{px:?}");
    }
}
