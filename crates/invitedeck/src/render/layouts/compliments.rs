use crate::render::decor;
use crate::render::layouts::SlideContext;
use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH, Paint, Scene};
use crate::render::text;

const PADDING: f32 = 64.0;
const NAME_SIZE: f32 = 30.0;
const NAME_GAP: f32 = 24.0;

/// Family acknowledgements on the dark panel, closing with the RSVP line.
pub fn compose(ctx: &SlideContext) -> Scene {
    let theme = ctx.theme;
    let mut scene = Scene::page(theme.panel);

    // Faint lattice behind the card.
    scene.group("translate(0 0)", 0.2, |g| {
        let mut y = 40.0;
        while y < PAGE_HEIGHT {
            decor::border_strip(g, theme, 0.0, y, PAGE_WIDTH, 0.4);
            y += 120.0;
        }
    });

    let names: &[String] = ctx.content.map(|c| c.family_list.as_slice()).unwrap_or(&[]);
    let title = ctx.content.and_then(|c| c.compliments_title.as_deref());
    let title_size = if ctx.rtl() { 48.0 } else { 36.0 };

    let inner_h = 64.0
        + 48.0
        + if title.is_some() { title_size + 64.0 } else { 0.0 }
        + names.len() as f32 * (NAME_SIZE + NAME_GAP)
        + 96.0;
    let card_w = PAGE_WIDTH - PADDING * 2.0;
    let card_h = (inner_h + 128.0).min(PAGE_HEIGHT - PADDING * 2.0);
    let top = (PAGE_HEIGHT - card_h) / 2.0;

    scene.rect(
        PADDING,
        top,
        card_w,
        card_h,
        16.0,
        Paint::fill(theme.panel).with_stroke(theme.accent, 4.0),
    );

    let cx = PAGE_WIDTH / 2.0;
    let mut y = top + 64.0;
    decor::heart(&mut scene, cx, y + 32.0, 64.0, theme.accent);
    y += 64.0 + 48.0;

    if let Some(title) = title {
        let shown = if ctx.rtl() {
            title.to_string()
        } else {
            text::upper(title)
        };
        y += title_size;
        scene.text(
            cx,
            y,
            &shown,
            &ctx.label(title_size, theme.accent_light),
        );
        y += 64.0;
    }

    let footer = top + card_h - 64.0;
    let name_w = card_w - 96.0;
    for name in names {
        if y + NAME_SIZE > footer - 48.0 {
            tracing::warn!(name = %name, "family list truncated on the compliments page");
            break;
        }
        y += NAME_SIZE;
        let size = text::fit_size(name, name_w, NAME_SIZE, text::BODY_ADVANCE);
        scene.text(
            cx,
            y,
            name,
            &ctx.body(size, theme.panel_foreground).opacity(0.9),
        );
        y += NAME_GAP;
    }

    scene.line(
        PADDING + 64.0,
        footer - 32.0,
        PAGE_WIDTH - PADDING - 64.0,
        footer - 32.0,
        theme.panel_foreground,
        1.0,
    );
    scene.text(
        cx,
        footer,
        "RSVP",
        &ctx.label(14.0, theme.accent).rtl(false),
    );

    scene
}
