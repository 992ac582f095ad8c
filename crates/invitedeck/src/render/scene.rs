use eframe::egui::Color32;

use crate::theme::Theme;

/// A4 at 96 dpi, in CSS pixels.
pub const PAGE_WIDTH: f32 = 794.0;
pub const PAGE_HEIGHT: f32 = 1123.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    fn as_svg(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TextStyle {
    pub family: &'static str,
    pub size: f32,
    pub color: Color32,
    pub bold: bool,
    pub anchor: Anchor,
    pub rtl: bool,
    pub letter_spacing: f32,
    pub opacity: f32,
}

impl TextStyle {
    pub fn new(family: &'static str, size: f32, color: Color32) -> Self {
        Self {
            family,
            size,
            color,
            bold: false,
            anchor: Anchor::Middle,
            rtl: false,
            letter_spacing: 0.0,
            opacity: 1.0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }

    pub fn spacing(mut self, letter_spacing: f32) -> Self {
        self.letter_spacing = letter_spacing;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Fill/stroke for shapes.
#[derive(Debug, Clone, Copy)]
pub struct Paint {
    pub fill: Option<Color32>,
    pub stroke: Option<(Color32, f32)>,
    pub opacity: f32,
}

impl Paint {
    pub fn fill(color: Color32) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            opacity: 1.0,
        }
    }

    pub fn stroke(color: Color32, width: f32) -> Self {
        Self {
            fill: None,
            stroke: Some((color, width)),
            opacity: 1.0,
        }
    }

    pub fn with_stroke(mut self, color: Color32, width: f32) -> Self {
        self.stroke = Some((color, width));
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    fn attrs(&self) -> String {
        let mut out = String::new();
        match self.fill {
            Some(c) => out.push_str(&format!(r#" fill="{}""#, Theme::hex(c))),
            None => out.push_str(r#" fill="none""#),
        }
        if let Some((c, w)) = self.stroke {
            out.push_str(&format!(r#" stroke="{}" stroke-width="{w}""#, Theme::hex(c)));
        }
        if self.opacity < 1.0 {
            out.push_str(&format!(r#" opacity="{}""#, self.opacity));
        }
        out
    }
}

/// An SVG composition of one slide.
///
/// Slides are laid out once at print size; the rasterizer scales them for the
/// screen, the PDF pages and the video frames.
#[derive(Debug, Clone)]
pub struct Scene {
    width: f32,
    height: f32,
    background: Color32,
    body: String,
}

impl Scene {
    pub fn new(width: f32, height: f32, background: Color32) -> Self {
        Self {
            width,
            height,
            background,
            body: String::new(),
        }
    }

    pub fn page(background: Color32) -> Self {
        Self::new(PAGE_WIDTH, PAGE_HEIGHT, background)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn background(&self) -> Color32 {
        self.background
    }

    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, paint: Paint) {
        self.body.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{radius}"{}/>"#,
            paint.attrs()
        ));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Color32, width: f32) {
        self.body.push_str(&format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="{}" stroke-width="{width}"/>"#,
            Theme::hex(color)
        ));
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32, paint: Paint) {
        self.body.push_str(&format!(
            r#"<circle cx="{cx}" cy="{cy}" r="{r}"{}/>"#,
            paint.attrs()
        ));
    }

    pub fn path(&mut self, d: &str, paint: Paint) {
        self.body
            .push_str(&format!(r#"<path d="{d}"{}/>"#, paint.attrs()));
    }

    /// A single line of text with its baseline at `y`.
    pub fn text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let mut attrs = format!(
            r#" x="{x}" y="{y}" font-family="{}" font-size="{}" fill="{}" text-anchor="{}""#,
            style.family,
            style.size,
            Theme::hex(style.color),
            style.anchor.as_svg()
        );
        if style.bold {
            attrs.push_str(r#" font-weight="bold""#);
        }
        if style.rtl {
            attrs.push_str(r#" direction="rtl""#);
        }
        if style.letter_spacing != 0.0 {
            attrs.push_str(&format!(r#" letter-spacing="{}""#, style.letter_spacing));
        }
        if style.opacity < 1.0 {
            attrs.push_str(&format!(r#" opacity="{}""#, style.opacity));
        }
        self.body
            .push_str(&format!("<text{attrs}>{}</text>", escape(text)));
    }

    /// Lines of text starting with the first baseline at `y`. Returns the y just
    /// below the last line.
    pub fn text_lines(
        &mut self,
        x: f32,
        y: f32,
        lines: &[String],
        line_height: f32,
        style: &TextStyle,
    ) -> f32 {
        let mut baseline = y;
        for line in lines {
            self.text(x, baseline, line, style);
            baseline += line_height;
        }
        baseline - line_height + style.size * 0.35
    }

    /// Draw into a group with an SVG `transform` and group opacity.
    pub fn group(&mut self, transform: &str, opacity: f32, draw: impl FnOnce(&mut Scene)) {
        self.body
            .push_str(&format!(r#"<g transform="{transform}" opacity="{opacity}">"#));
        draw(self);
        self.body.push_str("</g>");
    }

    pub fn to_svg(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="{bg}"/>{body}</svg>"#,
            w = self.width,
            h = self.height,
            bg = Theme::hex(self.background),
            body = self.body
        )
    }
}

/// Escape text for use as SVG character data.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
