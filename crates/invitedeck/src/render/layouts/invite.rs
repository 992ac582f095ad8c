use crate::render::decor;
use crate::render::layouts::SlideContext;
use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH, Paint, Scene};
use crate::render::text;

const PADDING: f32 = 48.0;
const BANNER_HEIGHT: f32 = 120.0;

/// Main invitation: blessing, spiritual text, invite line, names, parents and
/// the ceremony location banner.
pub fn compose(ctx: &SlideContext) -> Scene {
    let theme = ctx.theme;
    let mut scene = Scene::page(theme.background);

    let inner_w = PAGE_WIDTH - PADDING * 2.0;
    decor::border_strip(&mut scene, theme, PADDING, 96.0, inner_w, 0.6);

    let cx = PAGE_WIDTH / 2.0;
    let mut y = 200.0;

    if let Some(bismillah) = &ctx.common.bismillah {
        let style = ctx.display(40.0, theme.accent).rtl(true);
        scene.text(cx, y, bismillah, &style);
        y += 64.0;
    }

    let Some(content) = ctx.content else {
        return scene;
    };

    let text_w = inner_w - 96.0;

    if let Some(body) = &content.spiritual_body {
        let size = theme.body_size;
        let lines = text::wrap(body, text_w, size, text::BODY_ADVANCE);
        let style = ctx.body(size, theme.heading_color).bold();
        y = scene.text_lines(cx, y, &lines, size * 1.8, &style) + 40.0;
    }

    if let Some(invite) = &content.invite_line {
        let size = 22.0;
        let lines = text::wrap(&text::upper(invite), text_w, size, text::BODY_ADVANCE + 0.1);
        let style = ctx.label(size, theme.accent);
        y = scene.text_lines(cx, y + size, &lines, size * 1.5, &style) + 32.0;
    }

    // Names between hairlines.
    scene.line(PADDING, y, PAGE_WIDTH - PADDING, y, theme.accent, 1.0);
    let name_size = text::fit_size(
        &content.groom_name,
        text_w,
        60.0,
        text::DISPLAY_ADVANCE,
    )
    .min(text::fit_size(
        &content.bride_name,
        text_w,
        60.0,
        text::DISPLAY_ADVANCE,
    ));
    let names = ctx.display(name_size, theme.heading_color);
    y += 32.0 + name_size * 0.8;
    scene.text(cx, y, &content.groom_name, &names);
    y += 48.0;
    scene.text(cx, y, &content.connector, &ctx.body(30.0, theme.accent));
    y += 24.0 + name_size * 0.8;
    scene.text(cx, y, &content.bride_name, &names);
    y += 32.0;
    scene.line(PADDING, y, PAGE_WIDTH - PADDING, y, theme.accent, 1.0);

    if let Some(parents) = &content.bride_parents_line {
        let size = 14.0;
        let lines = text::wrap(&text::upper(parents), text_w, size, text::BODY_ADVANCE + 0.1);
        scene.text_lines(
            cx,
            y + 40.0,
            &lines,
            size * 1.6,
            &ctx.label(size, theme.foreground),
        );
    }

    if let Some(location) = &content.nikah_loc {
        let top = PAGE_HEIGHT - PADDING - BANNER_HEIGHT;
        scene.rect(
            PADDING,
            top,
            inner_w,
            BANNER_HEIGHT,
            8.0,
            Paint::fill(theme.heading_color),
        );
        let size = 18.0;
        let lines = text::wrap(&text::upper(location), inner_w - 48.0, size, text::BODY_ADVANCE + 0.1);
        let line_height = size * 1.5;
        let block_h = line_height * lines.len() as f32;
        let first = top + (BANNER_HEIGHT - block_h) / 2.0 + size;
        scene.text_lines(
            cx,
            first,
            &lines,
            line_height,
            &ctx.label(size, theme.accent_light),
        );
    }

    scene
}
