use eframe::egui::Color32;

use crate::content::Language;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Page background, also the fallback fill behind rasterized sections.
    pub background: Color32,
    pub foreground: Color32,
    pub heading_color: Color32,
    pub accent: Color32,
    pub accent_light: Color32,
    pub panel: Color32,
    pub panel_foreground: Color32,
    pub card: Color32,
    pub muted: Color32,
    pub names_size: f32,
    pub h1_size: f32,
    pub h2_size: f32,
    pub body_size: f32,
    pub small_size: f32,
}

impl Theme {
    pub fn fatemi() -> Self {
        Self {
            background: Color32::from_rgb(0xF8, 0xF5, 0xF0),
            foreground: Color32::from_rgb(0x0A, 0x19, 0x2F),
            heading_color: Color32::from_rgb(0x1E, 0x3A, 0x8A),
            accent: Color32::from_rgb(0xB3, 0x87, 0x28),
            accent_light: Color32::from_rgb(0xFC, 0xF6, 0xBA),
            panel: Color32::from_rgb(0x0A, 0x19, 0x2F),
            panel_foreground: Color32::WHITE,
            card: Color32::WHITE,
            muted: Color32::from_rgb(0x4B, 0x55, 0x63),
            names_size: 96.0,
            h1_size: 72.0,
            h2_size: 40.0,
            body_size: 20.0,
            small_size: 14.0,
        }
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), (opacity * 255.0) as u8)
    }

    /// CSS hex notation, as used inside scene markup.
    pub fn hex(color: Color32) -> String {
        format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
    }

    /// Font family list for display text (names and titles).
    pub fn display_family(language: Language) -> &'static str {
        match language {
            Language::English => "'Great Vibes', 'Playfair Display', serif",
            Language::LisanUdDawat => "Amiri, 'Noto Naskh Arabic', 'Noto Sans Arabic', serif",
        }
    }

    /// Font family list for running text.
    pub fn body_family(language: Language) -> &'static str {
        match language {
            Language::English => "'Playfair Display', Cinzel, serif",
            Language::LisanUdDawat => "Amiri, 'Noto Naskh Arabic', 'Noto Sans Arabic', serif",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::fatemi()
    }
}
