pub mod compliments;
pub mod cover;
pub mod invite;
pub mod programs;

use eframe::egui::Color32;

use crate::content::{Common, Content, Language};
use crate::render::scene::TextStyle;
use crate::theme::Theme;

/// Everything a layout needs to compose one slide.
#[derive(Debug, Clone, Copy)]
pub struct SlideContext<'a> {
    /// `None` when the content table has no entry for `language`; layouts then
    /// draw decoration only.
    pub content: Option<&'a Content>,
    pub common: &'a Common,
    pub language: Language,
    pub theme: &'a Theme,
}

impl<'a> SlideContext<'a> {
    pub fn rtl(&self) -> bool {
        self.language.is_rtl()
    }

    /// Calligraphic style for names and titles.
    pub fn display(&self, size: f32, color: Color32) -> TextStyle {
        TextStyle::new(Theme::display_family(self.language), size, color).rtl(self.rtl())
    }

    pub fn body(&self, size: f32, color: Color32) -> TextStyle {
        TextStyle::new(Theme::body_family(self.language), size, color).rtl(self.rtl())
    }

    /// Tracked uppercase label style; tracking is dropped for the joined script.
    pub fn label(&self, size: f32, color: Color32) -> TextStyle {
        let spacing = if self.rtl() { 0.0 } else { size * 0.2 };
        self.body(size, color).bold().spacing(spacing)
    }
}
