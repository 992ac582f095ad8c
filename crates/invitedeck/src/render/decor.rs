use eframe::egui::Color32;

use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH, Paint, Scene};
use crate::theme::Theme;

const HEART: &str = "M19 14c1.49-1.46 3-3.21 3-5.5A5.5 5.5 0 0 0 16.5 3c-1.76 0-3 .5-4.5 2-1.5-1.5-2.74-2-4.5-2A5.5 5.5 0 0 0 2 8.5c0 2.3 1.5 4.05 3 5.5l7 7Z";
const ARCH: &str = "M 10,600 L 10,150 Q 10,10 200,10 Q 390,10 390,150 L 390,600";
const CORNER_SIZE: f32 = 192.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    fn rotation(self) -> f32 {
        match self {
            Self::TopLeft => 0.0,
            Self::TopRight => 90.0,
            Self::BottomRight => 180.0,
            Self::BottomLeft => 270.0,
        }
    }

    fn origin(self) -> (f32, f32) {
        match self {
            Self::TopLeft => (0.0, 0.0),
            Self::TopRight => (PAGE_WIDTH - CORNER_SIZE, 0.0),
            Self::BottomRight => (PAGE_WIDTH - CORNER_SIZE, PAGE_HEIGHT - CORNER_SIZE),
            Self::BottomLeft => (0.0, PAGE_HEIGHT - CORNER_SIZE),
        }
    }
}

/// Filled heart centred on `(cx, cy)`.
pub fn heart(scene: &mut Scene, cx: f32, cy: f32, size: f32, color: Color32) {
    let s = size / 24.0;
    let transform = format!(
        "translate({} {}) scale({s})",
        cx - size / 2.0,
        cy - size / 2.0
    );
    scene.group(&transform, 1.0, |g| {
        g.path(HEART, Paint::fill(color).with_stroke(color, 2.0));
    });
}

/// The pointed arch framing the cover, stretched over the whole page.
pub fn arch(scene: &mut Scene, theme: &Theme, opacity: f32) {
    let transform = format!("scale({} {})", PAGE_WIDTH / 400.0, PAGE_HEIGHT / 600.0);
    scene.group(&transform, opacity, |g| {
        g.path(ARCH, Paint::stroke(theme.accent, 2.0));
    });
}

/// Floral sweep in one page corner, rotated so it always curls inward.
pub fn floral_corner(scene: &mut Scene, theme: &Theme, corner: Corner) {
    let (x, y) = corner.origin();
    let half = CORNER_SIZE / 2.0;
    let transform = format!(
        "translate({x} {y}) rotate({} {half} {half}) scale({})",
        corner.rotation(),
        CORNER_SIZE / 100.0
    );
    scene.group(&transform, 1.0, |g| {
        g.path(
            "M0,0 Q60,0 100,100 L0,100 Z",
            Paint::fill(theme.heading_color).opacity(0.1),
        );
        g.path(
            "M10,10 C50,10 60,90 90,90",
            Paint::stroke(theme.heading_color, 2.0),
        );
        g.circle(90.0, 90.0, 4.0, Paint::fill(theme.accent));
        g.path("M20,20 C50,20 30,80 80,80", Paint::stroke(theme.accent, 1.5));
    });
}

pub fn floral_corners(scene: &mut Scene, theme: &Theme, corners: &[Corner]) {
    for corner in corners {
        floral_corner(scene, theme, *corner);
    }
}

/// A gold-ruled strip with a repeating diamond motif.
pub fn border_strip(scene: &mut Scene, theme: &Theme, x: f32, y: f32, width: f32, opacity: f32) {
    let height = 32.0;
    scene.group("translate(0 0)", opacity, |g| {
        g.line(x, y, x + width, y, theme.accent, 2.0);
        g.line(x, y + height, x + width, y + height, theme.accent, 2.0);
        let step = 24.0;
        let mut cx = x + step / 2.0;
        let cy = y + height / 2.0;
        while cx < x + width {
            let d = format!(
                "M{} {cy} L{cx} {} L{} {cy} L{cx} {} Z",
                cx - 6.0,
                cy - 6.0,
                cx + 6.0,
                cy + 6.0
            );
            g.path(&d, Paint::stroke(theme.accent, 1.0));
            cx += step;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_emit_one_group_each() {
        let theme = Theme::default();
        let mut scene = Scene::page(theme.background);
        floral_corners(&mut scene, &theme, &Corner::ALL);
        let svg = scene.to_svg();
        assert_eq!(svg.matches("<g ").count(), 4);
        assert!(svg.contains("rotate(270 96 96)"));
    }

    #[test]
    fn border_strip_stays_within_width() {
        let theme = Theme::default();
        let mut scene = Scene::page(theme.background);
        border_strip(&mut scene, &theme, 100.0, 10.0, 48.0, 1.0);
        // Diamonds at 112 and 136; the next one would start past 148.
        assert_eq!(scene.to_svg().matches("<path").count(), 2);
    }
}
