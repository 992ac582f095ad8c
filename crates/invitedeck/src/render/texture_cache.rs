use std::collections::{HashMap, HashSet};

use eframe::egui;

use crate::content::{ContentTable, Language};
use crate::render::raster::SvgRasterizer;
use crate::slides::SlideKind;
use crate::theme::Theme;

/// On-screen raster scale. Slides are drawn at 1.5x print size so they stay
/// sharp on high-density displays.
const SCREEN_SCALE: f32 = 1.5;

/// Lazily rasterized slide textures, one per slide and language.
pub struct SlideTextures {
    textures: HashMap<(SlideKind, Language), egui::TextureHandle>,
    failed: HashSet<(SlideKind, Language)>,
}

impl SlideTextures {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Texture for `slide` in `language`, rasterizing it on first use.
    ///
    /// A slide that fails to rasterize is remembered and not retried.
    pub fn get(
        &mut self,
        ctx: &egui::Context,
        rasterizer: &SvgRasterizer,
        table: &ContentTable,
        theme: &Theme,
        slide: SlideKind,
        language: Language,
    ) -> Option<&egui::TextureHandle> {
        let key = (slide, language);
        if self.failed.contains(&key) {
            return None;
        }
        if !self.textures.contains_key(&key) {
            let scene = slide.compose(table.get(language), &table.common, language, theme);
            match rasterizer.render(&scene, SCREEN_SCALE, scene.background()) {
                Ok(image) => {
                    let size = [image.width() as usize, image.height() as usize];
                    let color_image =
                        egui::ColorImage::from_rgba_unmultiplied(size, image.as_raw());
                    let name = format!("slide-{}-{}", slide.name(), language.code());
                    let handle = ctx.load_texture(name, color_image, egui::TextureOptions::LINEAR);
                    tracing::debug!(%slide, %language, "rasterized slide texture");
                    self.textures.insert(key, handle);
                }
                Err(e) => {
                    tracing::error!(%slide, %language, error = %e, "failed to rasterize slide");
                    self.failed.insert(key);
                    return None;
                }
            }
        }
        self.textures.get(&key)
    }
}
