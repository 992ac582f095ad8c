use crate::content::Event;
use crate::render::decor::{self, Corner};
use crate::render::layouts::SlideContext;
use crate::render::scene::{Anchor, PAGE_HEIGHT, PAGE_WIDTH, Paint, Scene};
use crate::render::text;

const PADDING: f32 = 64.0;
const CARD_HEIGHT: f32 = 150.0;
const CARD_GAP: f32 = 32.0;
const BADGE_RADIUS: f32 = 48.0;
const BADGE_TEXT_SIZE: f32 = 22.0;
const BADGE_MAX_LINES: usize = 3;

/// Event schedule: title, then one card per event.
pub fn compose(ctx: &SlideContext) -> Scene {
    let theme = ctx.theme;
    let mut scene = Scene::page(theme.background);

    decor::floral_corners(&mut scene, theme, &[Corner::TopRight, Corner::BottomLeft]);
    decor::border_strip(
        &mut scene,
        theme,
        PADDING,
        PAGE_HEIGHT - PADDING - 32.0,
        PAGE_WIDTH - PADDING * 2.0,
        0.5,
    );

    let Some(content) = ctx.content else {
        return scene;
    };

    let cx = PAGE_WIDTH / 2.0;
    let mut y = PADDING + theme.h1_size;
    if let Some(title) = &content.events_title {
        scene.text(cx, y, title, &ctx.display(theme.h1_size, theme.heading_color));
    }
    y += 24.0;
    scene.rect(cx - 64.0, y, 128.0, 4.0, 2.0, Paint::fill(theme.accent));
    y += 72.0;

    // Cards that would run into the footer strip are left out.
    let bottom = PAGE_HEIGHT - PADDING - 48.0;
    for event in &content.events {
        if y + CARD_HEIGHT > bottom {
            tracing::warn!(title = %event.title, "event does not fit on the programs page");
            break;
        }
        event_card(&mut scene, ctx, event, y);
        y += CARD_HEIGHT + CARD_GAP;
    }

    scene
}

fn event_card(scene: &mut Scene, ctx: &SlideContext, event: &Event, top: f32) {
    let theme = ctx.theme;
    let left = PADDING;
    let width = PAGE_WIDTH - PADDING * 2.0;
    let cy = top + CARD_HEIGHT / 2.0;
    let rtl = ctx.rtl();

    scene.rect(left, top, width, CARD_HEIGHT, 12.0, Paint::fill(theme.card));
    let bar_x = if rtl { left + width - 8.0 } else { left };
    scene.rect(bar_x, top, 8.0, CARD_HEIGHT, 0.0, Paint::fill(theme.accent));

    let badge_cx = if rtl {
        left + width - 40.0 - BADGE_RADIUS
    } else {
        left + 40.0 + BADGE_RADIUS
    };
    scene.circle(
        badge_cx,
        cy,
        BADGE_RADIUS,
        Paint::fill(theme.heading_color).with_stroke(theme.accent_light, 2.0),
    );
    let (lines, date_size) = badge_lines(&event.date);
    let line_height = date_size * 1.15;
    let first = cy - line_height * lines.len().saturating_sub(1) as f32 / 2.0 + date_size * 0.35;
    scene.text_lines(
        badge_cx,
        first,
        &lines,
        line_height,
        &ctx.body(date_size, theme.panel_foreground).bold(),
    );

    // Text runs away from the badge; with rtl the start edge is on the right.
    let text_x = if rtl {
        badge_cx - BADGE_RADIUS - 32.0
    } else {
        badge_cx + BADGE_RADIUS + 32.0
    };
    let text_w = width - (BADGE_RADIUS * 2.0 + 40.0 + 32.0 + 24.0);
    let title_size = text::fit_size(&event.title, text_w, theme.h2_size, text::BODY_ADVANCE);
    scene.text(
        text_x,
        cy - 4.0,
        &event.title,
        &ctx.body(title_size, theme.heading_color)
            .bold()
            .anchor(Anchor::Start),
    );

    let details = [event.time.as_str(), event.loc.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("  \u{2022}  ");
    let details_size = text::fit_size(&details, text_w, 20.0, text::BODY_ADVANCE + 0.1);
    scene.text(
        text_x,
        cy + 36.0,
        &text::upper(&details),
        &ctx.body(details_size, theme.muted)
            .spacing(if rtl { 0.0 } else { 2.0 })
            .anchor(Anchor::Start),
    );
}

/// The whole date, wrapped to fit inside the badge, and its font size.
fn badge_lines(date: &str) -> (Vec<String>, f32) {
    let width = BADGE_RADIUS * 1.5;
    let mut lines = text::wrap(date, width, BADGE_TEXT_SIZE, text::BODY_ADVANCE);
    if lines.len() > BADGE_MAX_LINES {
        lines = vec![date.trim().to_string()];
    }
    let size = lines
        .iter()
        .map(|line| text::fit_size(line, width, BADGE_TEXT_SIZE, text::BODY_ADVANCE))
        .fold(BADGE_TEXT_SIZE, f32::min);
    (lines, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Common, Content, ContentTable, Language};
    use crate::theme::Theme;

    fn compose_with(content: &Content) -> String {
        let theme = Theme::default();
        let common = Common::default();
        let ctx = SlideContext {
            content: Some(content),
            common: &common,
            language: Language::English,
            theme: &theme,
        };
        compose(&ctx).to_svg()
    }

    #[test]
    fn one_card_per_event() {
        let table = ContentTable::builtin();
        let content = table.get(Language::English).unwrap();
        let svg = compose_with(content);
        assert!(svg.contains(">Celebration<"));
        assert!(svg.contains(">Majlis<"));
        assert!(svg.contains(">Nikah Darees<"));
        assert!(svg.contains("EVENING  \u{2022}  FAKHRI MANZIL"));
        // The full date sits in the badge.
        assert!(svg.contains(">Aug 18<"));
        assert!(svg.contains(">Aug 19<"));
    }

    #[test]
    fn long_dates_wrap_inside_the_badge() {
        let (lines, size) = badge_lines("18 August 2025");
        assert!(lines.len() > 1 && lines.len() <= BADGE_MAX_LINES);
        assert_eq!(lines.join(" "), "18 August 2025");
        for line in &lines {
            assert!(
                text::estimate_width(line, size, text::BODY_ADVANCE) <= BADGE_RADIUS * 1.5 + 0.01
            );
        }

        let (lines, size) = badge_lines("Aug 18");
        assert_eq!(lines, ["Aug 18"]);
        assert_eq!(size, BADGE_TEXT_SIZE);
    }

    #[test]
    fn missing_events_render_no_cards() {
        let content = Content {
            events_title: Some("Programs".into()),
            ..Content::default()
        };
        let svg = compose_with(&content);
        assert!(svg.contains(">Programs<"));
        assert_eq!(svg.matches("<circle").count(), 2, "only the corner dots");
    }

    #[test]
    fn overflowing_events_are_dropped() {
        let events = (0..20)
            .map(|i| Event {
                title: format!("Event {i}"),
                ..Event::default()
            })
            .collect();
        let content = Content {
            events,
            ..Content::default()
        };
        let svg = compose_with(&content);
        assert!(svg.contains(">Event 0<"));
        assert!(!svg.contains(">Event 19<"));
    }
}
