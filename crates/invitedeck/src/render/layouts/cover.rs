use crate::render::decor::{self, Corner};
use crate::render::layouts::SlideContext;
use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH, Paint, Scene};
use crate::render::text;

const COVER_HEADING: &str = "The Wedding Celebration Of";

/// Cover: framed couple names with the date of the first event.
pub fn compose(ctx: &SlideContext) -> Scene {
    let theme = ctx.theme;
    let mut scene = Scene::page(theme.background);

    decor::arch(&mut scene, theme, 0.6);
    decor::floral_corners(&mut scene, theme, &Corner::ALL);

    let inset = 64.0;
    let frame_w = PAGE_WIDTH - inset * 2.0;
    let frame_h = PAGE_HEIGHT - inset * 2.0;
    scene.rect(
        inset,
        inset,
        frame_w,
        frame_h,
        12.0,
        Paint::fill(theme.card)
            .opacity(0.3)
            .with_stroke(theme.accent, 4.0),
    );
    scene.rect(
        inset + 8.0,
        inset + 8.0,
        frame_w - 16.0,
        frame_h - 16.0,
        8.0,
        Paint::stroke(theme.accent, 1.5),
    );

    let Some(content) = ctx.content else {
        return scene;
    };

    let cx = PAGE_WIDTH / 2.0;
    let name_width = frame_w - 96.0;

    scene.text(
        cx,
        380.0,
        &text::upper(COVER_HEADING),
        &ctx.label(20.0, theme.accent).rtl(false),
    );

    let groom_size = text::fit_size(
        &content.groom_name,
        name_width,
        theme.names_size,
        text::DISPLAY_ADVANCE,
    );
    scene.text(
        cx,
        510.0,
        &content.groom_name,
        &ctx.display(groom_size, theme.heading_color),
    );

    decor::heart(&mut scene, cx, 570.0, 40.0, theme.accent);
    scene.line(cx - 130.0, 570.0, cx - 40.0, 570.0, theme.accent, 3.0);
    scene.line(cx + 40.0, 570.0, cx + 130.0, 570.0, theme.accent, 3.0);

    let bride_size = text::fit_size(
        &content.bride_name,
        name_width,
        theme.names_size,
        text::DISPLAY_ADVANCE,
    );
    scene.text(
        cx,
        690.0,
        &content.bride_name,
        &ctx.display(bride_size, theme.heading_color),
    );

    if let Some(first) = content.events.first() {
        scene.text(
            cx,
            800.0,
            &text::upper(&first.date),
            &ctx.label(18.0, theme.foreground),
        );
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentTable, Language};
    use crate::theme::Theme;

    #[test]
    fn cover_shows_names_and_first_date() {
        let table = ContentTable::builtin();
        let theme = Theme::default();
        let ctx = SlideContext {
            content: table.get(Language::English),
            common: &table.common,
            language: Language::English,
            theme: &theme,
        };
        let svg = compose(&ctx).to_svg();
        assert!(svg.contains(">Ibrahim<"));
        assert!(svg.contains(">Zenab<"));
        assert!(svg.contains(">AUG 18<"));
        assert!(svg.contains("THE WEDDING CELEBRATION OF"));
    }

    #[test]
    fn cover_without_content_is_decoration_only() {
        let table = ContentTable::default();
        let theme = Theme::default();
        let ctx = SlideContext {
            content: None,
            common: &table.common,
            language: Language::LisanUdDawat,
            theme: &theme,
        };
        let svg = compose(&ctx).to_svg();
        assert!(!svg.contains("<text"));
        assert!(svg.contains("<path"));
    }
}
