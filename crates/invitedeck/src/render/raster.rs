use std::path::Path;

use eframe::egui::Color32;
use image::{Rgba, RgbaImage};
use resvg::tiny_skia;

use crate::render::scene::Scene;

/// Turns scenes into bitmaps with `resvg`.
///
/// Font discovery is the expensive part, so one rasterizer is built per process
/// and shared by the viewer and the exporters.
pub struct SvgRasterizer {
    options: usvg::Options<'static>,
}

impl SvgRasterizer {
    pub fn new(fonts_dir: Option<&Path>) -> Self {
        let mut options = usvg::Options::default();
        let fontdb = options.fontdb_mut();
        fontdb.load_system_fonts();
        if let Some(dir) = fonts_dir {
            fontdb.load_fonts_dir(dir);
        }
        tracing::debug!(faces = fontdb.len(), "loaded font faces");
        Self { options }
    }

    /// Rasterize `scene` at `scale` onto an opaque `fallback` fill.
    ///
    /// The fill shows through anywhere the scene leaves transparent.
    pub fn render(&self, scene: &Scene, scale: f32, fallback: Color32) -> Result<RgbaImage, String> {
        let svg = scene.to_svg();
        let tree = usvg::Tree::from_str(&svg, &self.options).map_err(|e| e.to_string())?;

        let width = (scene.width() * scale).round() as u32;
        let height = (scene.height() * scale).round() as u32;
        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| format!("invalid raster size {width}x{height}"))?;
        pixmap.fill(tiny_skia::Color::from_rgba8(
            fallback.r(),
            fallback.g(),
            fallback.b(),
            255,
        ));
        resvg::render(
            &tree,
            tiny_skia::Transform::from_scale(scale, scale),
            &mut pixmap.as_mut(),
        );

        let mut image = RgbaImage::new(width, height);
        for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }
        Ok(image)
    }
}
