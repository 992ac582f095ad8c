use eframe::egui;
use std::rc::Rc;
use std::time::Instant;

use crate::cli::SourceArgs;
use crate::config::Config;
use crate::content::{ContentTable, Language};
use crate::controller::{Direction, SlideController};
use crate::export::document::{self, DocumentJob};
use crate::export::ffmpeg::FfmpegCapture;
use crate::export::pdf::{PageFormat, PdfDocument};
use crate::export::video::{self, SlideFrames, VideoCapture, VideoJob};
use crate::render::raster::SvgRasterizer;
use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH};
use crate::render::texture_cache::SlideTextures;
use crate::render::transition::{ActiveTransition, GateAnimation};
use crate::slides::SLIDES;
use crate::theme::Theme;

const PAGE_MARGIN: f32 = 24.0;
const CONTROLS_HEIGHT: f32 = 56.0;

pub struct ViewerOptions {
    pub source: SourceArgs,
    pub windowed: bool,
    /// 1-indexed
    pub slide: Option<usize>,
    pub autoplay: bool,
}

struct Toast {
    message: String,
    start: Instant,
}

impl Toast {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            start: Instant::now(),
        }
    }

    fn opacity(&self) -> f32 {
        let elapsed = self.start.elapsed().as_secs_f32();
        let duration = 2.0;
        let fade_start = 1.5;
        if elapsed < fade_start {
            1.0
        } else if elapsed < duration {
            1.0 - (elapsed - fade_start) / (duration - fade_start)
        } else {
            0.0
        }
    }

    fn is_expired(&self) -> bool {
        self.start.elapsed().as_secs_f32() >= 2.0
    }
}

/// A document export waiting out its settle delay.
struct PendingDocument {
    job: DocumentJob,
    format: PageFormat,
    ready_at: Instant,
}

struct VideoSession {
    capture: VideoCapture,
    frames: SlideFrames<Rc<SvgRasterizer>>,
}

/// What the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    Navigate(Direction),
    Wheel(f32),
    TogglePlay,
    ToggleLanguage,
    SaveDocument,
    RecordVideo,
    ToggleHud,
    DismissAlert,
}

struct InvitationApp {
    table: ContentTable,
    theme: Theme,
    config: Config,
    language: Language,
    controller: SlideController,
    rasterizer: Rc<SvgRasterizer>,
    textures: SlideTextures,
    /// The slide currently on screen; trails the controller during a fade.
    shown: usize,
    transition: Option<ActiveTransition>,
    gate: Option<GateAnimation>,
    show_hud: bool,
    toast: Option<Toast>,
    alert: Option<String>,
    pending_document: Option<PendingDocument>,
    video: Option<VideoSession>,
}

impl InvitationApp {
    fn new(
        table: ContentTable,
        language: Language,
        config: Config,
        start_slide: usize,
        autoplay: bool,
    ) -> Self {
        let now = Instant::now();
        let mut controller = SlideController::new(SLIDES.len(), config.autoplay_interval(), autoplay);
        controller.jump_to(start_slide, now);
        let rasterizer = Rc::new(SvgRasterizer::new(config.fonts_dir()));

        Self {
            table,
            theme: Theme::default(),
            language,
            shown: controller.index(),
            controller,
            rasterizer,
            textures: SlideTextures::new(),
            transition: None,
            gate: Some(GateAnimation::new(now)),
            show_hud: false,
            toast: None,
            alert: None,
            pending_document: None,
            video: None,
            config,
        }
    }

    fn texture(&mut self, ctx: &egui::Context, index: usize) -> Option<egui::TextureId> {
        let slide = *SLIDES.get(index)?;
        self.textures
            .get(
                ctx,
                &self.rasterizer,
                &self.table,
                &self.theme,
                slide,
                self.language,
            )
            .map(|t| t.id())
    }

    fn apply(&mut self, action: Action, now: Instant) {
        if self.alert.is_some() {
            if action == Action::DismissAlert {
                self.alert = None;
            }
            return;
        }
        match action {
            Action::Navigate(direction) => {
                self.controller.navigate(direction, now);
            }
            Action::Wheel(delta) => {
                self.controller.on_wheel(delta, now);
            }
            Action::TogglePlay => {
                if self.controller.is_exporting() {
                    return;
                }
                self.controller.toggle_autoplay(now);
                let label = if self.controller.state().autoplay {
                    "Autoplay on"
                } else {
                    "Autoplay paused"
                };
                self.toast = Some(Toast::new(label));
            }
            Action::ToggleLanguage => {
                self.language = self.language.toggled();
                self.toast = Some(Toast::new(self.language.label()));
                tracing::debug!(language = %self.language, "language toggled");
            }
            Action::SaveDocument => self.request_document(now),
            Action::RecordVideo => self.request_video(now),
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::DismissAlert => {}
        }
    }

    /// Enter the exporting state now; the pipeline runs once the settle
    /// delay has passed.
    fn request_document(&mut self, now: Instant) {
        if !self.controller.begin_export() {
            self.toast = Some(Toast::new("An export is already running"));
            return;
        }
        let mut job = DocumentJob::new(
            &self.table,
            self.language,
            &self.theme,
            &self.config.export_dir(),
        );
        job.settle = self.config.settle();
        job.options.quality = self.config.jpeg_quality();
        tracing::info!(language = %self.language, "document export requested");
        self.toast = Some(Toast::new("Preparing PDF\u{2026}"));
        self.pending_document = Some(PendingDocument {
            ready_at: now + job.settle,
            format: PageFormat::a4(self.config.page_unit()),
            job,
        });
    }

    fn run_pending_document(&mut self, now: Instant) {
        if self
            .pending_document
            .as_ref()
            .is_none_or(|p| now < p.ready_at)
        {
            return;
        }
        let Some(pending) = self.pending_document.take() else {
            return;
        };
        let mut pdf = PdfDocument::new(pending.format);
        match document::complete_document(
            &mut self.controller,
            &pending.job,
            &*self.rasterizer,
            &mut pdf,
        ) {
            Ok(path) => {
                self.toast = Some(Toast::new(format!("Saved {}", path.display())));
            }
            Err(_) => {
                self.alert = Some(document::FAILURE_ALERT.to_string());
            }
        }
    }

    fn request_video(&mut self, now: Instant) {
        if self.controller.is_exporting() {
            self.toast = Some(Toast::new("An export is already running"));
            return;
        }
        let sections = document::hidden_sections(&self.table, self.language, &self.theme);
        let job = VideoJob::new(sections.len(), self.config.dwell(), self.config.fps());
        let source = FfmpegCapture::new(self.config.video_dir(), self.theme.background);
        match VideoCapture::start(&source, &mut self.controller, &job, now) {
            Ok(capture) => {
                let frames =
                    SlideFrames::new(sections, Rc::clone(&self.rasterizer), self.theme.background);
                self.video = Some(VideoSession { capture, frames });
                self.toast = Some(Toast::new("Recording\u{2026}"));
            }
            Err(e) => {
                tracing::error!(error = %e, "video capture could not start");
                self.alert = Some(format!("{}\n\n{e}", video::FAILURE_ALERT));
            }
        }
    }

    fn poll_video(&mut self, now: Instant) {
        let Some(session) = self.video.as_mut() else {
            return;
        };
        match session
            .capture
            .poll(&mut self.controller, now, &mut session.frames)
        {
            Ok(false) => {}
            Ok(true) => {
                if let Some(session) = self.video.take() {
                    match session.capture.finish(&mut self.controller, now) {
                        Ok(path) => {
                            self.toast = Some(Toast::new(format!("Saved {}", path.display())));
                        }
                        Err(e) => {
                            self.alert = Some(format!("{}\n\n{e}", video::FAILURE_ALERT));
                        }
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "video capture failed");
                if let Some(session) = self.video.take() {
                    session.capture.abort(&mut self.controller, now);
                }
                self.alert = Some(format!("{}\n\n{e}", video::FAILURE_ALERT));
            }
        }
    }

    /// Start a fade whenever the controller has moved past what is shown.
    fn follow_controller(&mut self, now: Instant) {
        if let Some(t) = &self.transition {
            if t.is_complete(now) {
                self.shown = t.to;
                self.transition = None;
            }
        }
        let target = self.controller.index();
        if self.transition.is_none() && target != self.shown {
            self.transition = Some(ActiveTransition::new(self.shown, target, now));
        }
    }

    fn collect_actions(&self, ctx: &egui::Context) -> (Vec<Action>, Vec<egui::ViewportCommand>) {
        let mut actions = Vec::new();
        let mut viewport_cmds = Vec::new();
        ctx.input(|i| {
            if i.key_pressed(egui::Key::Q) {
                viewport_cmds.push(egui::ViewportCommand::Close);
                return;
            }
            if i.key_pressed(egui::Key::F) {
                viewport_cmds.push(egui::ViewportCommand::Fullscreen(
                    !i.viewport().fullscreen.unwrap_or(false),
                ));
            }
            if self.alert.is_some() {
                if i.key_pressed(egui::Key::Enter) || i.key_pressed(egui::Key::Escape) {
                    actions.push(Action::DismissAlert);
                }
                return;
            }
            if i.key_pressed(egui::Key::ArrowRight) || i.key_pressed(egui::Key::N) {
                actions.push(Action::Navigate(Direction::Forward));
            }
            if i.key_pressed(egui::Key::ArrowLeft) || i.key_pressed(egui::Key::P) {
                actions.push(Action::Navigate(Direction::Backward));
            }
            if i.key_pressed(egui::Key::Space) {
                actions.push(Action::TogglePlay);
            }
            if i.key_pressed(egui::Key::L) {
                actions.push(Action::ToggleLanguage);
            }
            if i.key_pressed(egui::Key::S) {
                actions.push(Action::SaveDocument);
            }
            if i.key_pressed(egui::Key::V) {
                actions.push(Action::RecordVideo);
            }
            if i.key_pressed(egui::Key::H) {
                actions.push(Action::ToggleHud);
            }
            // Scrolling down moves forward.
            let scroll = i.raw_scroll_delta.y;
            if scroll != 0.0 {
                actions.push(Action::Wheel(-scroll));
            }
        });
        (actions, viewport_cmds)
    }

    fn draw_controls(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let exporting = self.controller.is_exporting();
        let gate_open = self.controller.state().gate_opened;
        let playing = self.controller.state().autoplay;
        let accent = self.theme.accent;

        egui::Area::new(egui::Id::new("controls"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -12.0))
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(Theme::with_opacity(self.theme.panel, 0.85))
                    .stroke(egui::Stroke::new(1.0, accent))
                    .corner_radius(24.0)
                    .inner_margin(egui::Margin::symmetric(16, 8))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let nav = gate_open && !exporting;
                            if ui.add_enabled(nav, egui::Button::new("\u{25c0}")).clicked() {
                                actions.push(Action::Navigate(Direction::Backward));
                            }
                            let play = if playing { "\u{23f8}" } else { "\u{25b6}" };
                            if ui
                                .add_enabled(!exporting, egui::Button::new(play))
                                .clicked()
                            {
                                actions.push(Action::TogglePlay);
                            }
                            if ui.add_enabled(nav, egui::Button::new("\u{25b6}\u{25b6}")).clicked() {
                                actions.push(Action::Navigate(Direction::Forward));
                            }
                            ui.separator();
                            if ui
                                .button(self.language.toggled().label())
                                .clicked()
                            {
                                actions.push(Action::ToggleLanguage);
                            }
                            ui.separator();
                            let save_label = self
                                .table
                                .get(self.language)
                                .filter(|_| !self.language.is_rtl())
                                .and_then(|c| c.download_label.as_deref())
                                .unwrap_or("Save PDF");
                            let save_label = if self.pending_document.is_some() {
                                "Generating\u{2026}"
                            } else {
                                save_label
                            };
                            if ui
                                .add_enabled(!exporting, egui::Button::new(save_label))
                                .clicked()
                            {
                                actions.push(Action::SaveDocument);
                            }
                            let video_label = if self.video.is_some() {
                                "Recording\u{2026}"
                            } else {
                                "Export Video"
                            };
                            if ui
                                .add_enabled(!exporting, egui::Button::new(video_label))
                                .clicked()
                            {
                                actions.push(Action::RecordVideo);
                            }
                        });
                    });
            });
    }

    fn draw_alert(&self, ctx: &egui::Context, actions: &mut Vec<Action>) {
        let Some(message) = &self.alert else {
            return;
        };
        egui::Window::new("Export failed")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    actions.push(Action::DismissAlert);
                }
            });
    }

    fn draw_chrome(&self, ui: &egui::Ui, rect: egui::Rect) {
        let color = Theme::with_opacity(self.theme.panel_foreground, 0.5);

        let counter = format!("{} / {}", self.controller.index() + 1, self.controller.total());
        let galley = ui.painter().layout_no_wrap(
            counter,
            egui::FontId::monospace(self.theme.small_size),
            color,
        );
        let pos = egui::pos2(
            rect.right() - galley.rect.width() - 16.0,
            rect.bottom() - 30.0,
        );
        ui.painter().galley(pos, galley, color);

        if let Some(session) = &self.video {
            let text = format!(
                "\u{25cf} REC {:.0}%",
                session.capture.progress() * 100.0
            );
            let rec = egui::Color32::from_rgb(220, 38, 38);
            let galley = ui.painter().layout_no_wrap(
                text,
                egui::FontId::proportional(self.theme.small_size + 2.0),
                rec,
            );
            ui.painter()
                .galley(egui::pos2(rect.left() + 16.0, rect.top() + 12.0), galley, rec);
        }
    }

    fn draw_toast(&self, ui: &egui::Ui, rect: egui::Rect) {
        let Some(toast) = &self.toast else {
            return;
        };
        let opacity = toast.opacity();
        if opacity <= 0.0 {
            return;
        }
        let color = Theme::with_opacity(self.theme.panel_foreground, opacity * 0.95);
        let bg = Theme::with_opacity(self.theme.heading_color, opacity * 0.9);
        let galley = ui.painter().layout_no_wrap(
            toast.message.clone(),
            egui::FontId::proportional(18.0),
            color,
        );
        let padding = 14.0;
        let toast_rect = egui::Rect::from_min_size(
            egui::pos2(
                rect.center().x - galley.rect.width() / 2.0 - padding,
                rect.top() + 24.0,
            ),
            egui::vec2(
                galley.rect.width() + padding * 2.0,
                galley.rect.height() + padding * 2.0,
            ),
        );
        ui.painter().rect_filled(toast_rect, 8.0, bg);
        ui.painter().galley(
            egui::pos2(toast_rect.left() + padding, toast_rect.top() + padding),
            galley,
            color,
        );
    }
}

impl eframe::App for InvitationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        if self.gate.as_ref().is_some_and(|g| g.is_complete(now)) {
            self.gate = None;
            self.controller.open_gate(now);
        }

        // Viewport commands go out after the input closure has released its lock.
        let (mut actions, viewport_cmds) = self.collect_actions(ctx);
        for cmd in viewport_cmds {
            ctx.send_viewport_cmd(cmd);
        }

        self.draw_controls(ctx, &mut actions);
        self.draw_alert(ctx, &mut actions);
        for action in actions {
            self.apply(action, now);
        }

        self.controller.tick(now);
        self.run_pending_document(now);
        self.poll_video(now);
        self.follow_controller(now);

        if self.toast.as_ref().is_some_and(|t| t.is_expired()) {
            self.toast = None;
        }

        let (from, to, progress) = match &self.transition {
            Some(t) => (Some(t.from), t.to, t.progress(now)),
            None => (None, self.shown, 1.0),
        };
        let from_tex = from.and_then(|i| self.texture(ctx, i));
        let to_tex = self.texture(ctx, to);
        let openness = self.gate.as_ref().map(|g| g.openness(now));

        let bg = self.theme.panel;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(bg).inner_margin(0.0))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                ui.painter().rect_filled(rect, 0.0, bg);
                let page = page_rect(rect);

                if let Some(id) = from_tex {
                    paint_page(ui, id, page, 1.0 - progress);
                }
                match to_tex {
                    Some(id) => paint_page(ui, id, page, progress),
                    None => {
                        ui.painter()
                            .rect_filled(page, 0.0, self.theme.background);
                    }
                }
                if let Some(openness) = openness {
                    draw_gate(ui, &self.theme, page, openness);
                }

                self.draw_chrome(ui, rect);
                self.draw_toast(ui, rect);
                if self.show_hud {
                    draw_hud(ui, &self.theme, rect);
                }
            });

        let animating = self.transition.is_some()
            || self.gate.is_some()
            || self.toast.is_some()
            || self.video.is_some()
            || self.pending_document.is_some();
        if animating {
            ctx.request_repaint();
        } else if let Some(deadline) = self.controller.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

/// The largest A4-shaped rect that fits above the controls.
fn page_rect(area: egui::Rect) -> egui::Rect {
    let mut avail = area.shrink(PAGE_MARGIN);
    avail.max.y -= CONTROLS_HEIGHT;
    let aspect = PAGE_WIDTH / PAGE_HEIGHT;
    let (w, h) = if avail.width() / avail.height() > aspect {
        (avail.height() * aspect, avail.height())
    } else {
        (avail.width(), avail.width() / aspect)
    };
    egui::Rect::from_center_size(avail.center(), egui::vec2(w.max(0.0), h.max(0.0)))
}

fn paint_page(ui: &egui::Ui, texture: egui::TextureId, page: egui::Rect, opacity: f32) {
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    ui.painter().image(
        texture,
        page,
        uv,
        Theme::with_opacity(egui::Color32::WHITE, opacity),
    );
}

/// Two doors meeting at the page's centre line, sliding outward as
/// `openness` goes from 0 to 1.
fn draw_gate(ui: &egui::Ui, theme: &Theme, page: egui::Rect, openness: f32) {
    let painter = ui.painter().with_clip_rect(page);
    let half = page.width() / 2.0;
    let shift = half * openness;
    let doors = [
        egui::Rect::from_min_size(
            egui::pos2(page.left() - shift, page.top()),
            egui::vec2(half, page.height()),
        ),
        egui::Rect::from_min_size(
            egui::pos2(page.center().x + shift, page.top()),
            egui::vec2(half, page.height()),
        ),
    ];
    let trim = egui::Stroke::new(2.0, theme.accent);
    for (i, door) in doors.iter().enumerate() {
        painter.rect_filled(*door, 0.0, theme.heading_color);
        painter.rect_stroke(door.shrink(12.0), 4.0, trim, egui::StrokeKind::Inside);
        painter.rect_stroke(
            door.shrink(24.0),
            2.0,
            egui::Stroke::new(1.0, theme.accent_light),
            egui::StrokeKind::Inside,
        );

        // Each door carries half of the central medallion.
        let seam = if i == 0 { door.right() } else { door.left() };
        let half_painter = painter.with_clip_rect(door.intersect(page));
        let center = egui::pos2(seam, door.center().y);
        half_painter.circle_filled(center, 48.0, theme.accent);
        half_painter.circle_stroke(center, 40.0, egui::Stroke::new(2.0, theme.accent_light));
    }
}

fn draw_hud(ui: &egui::Ui, theme: &Theme, rect: egui::Rect) {
    let shortcuts = [
        ("N / \u{2192}", "Next slide (pauses autoplay)"),
        ("P / \u{2190}", "Previous slide (pauses autoplay)"),
        ("Wheel", "Next / previous slide"),
        ("Space", "Play / pause autoplay"),
        ("L", "Toggle language"),
        ("S", "Save as PDF"),
        ("V", "Export video"),
        ("F", "Toggle fullscreen"),
        ("H", "Toggle this HUD"),
        ("Q", "Quit"),
    ];

    let bg = Theme::with_opacity(theme.panel, 0.92);
    let text_color = Theme::with_opacity(theme.panel_foreground, 0.9);
    let key_color = theme.accent;

    let padding = 24.0;
    let line_height = 30.0;
    let hud_height = shortcuts.len() as f32 * line_height + padding * 2.0 + 40.0;
    let hud_width = 420.0;
    let hud_rect = egui::Rect::from_center_size(rect.center(), egui::vec2(hud_width, hud_height));

    ui.painter().rect_filled(hud_rect, 12.0, bg);
    ui.painter().rect_stroke(
        hud_rect,
        12.0,
        egui::Stroke::new(1.0, theme.accent),
        egui::StrokeKind::Outside,
    );

    let title_galley = ui.painter().layout_no_wrap(
        "Keyboard Shortcuts".to_string(),
        egui::FontId::proportional(20.0),
        theme.accent_light,
    );
    let title_pos = egui::pos2(hud_rect.left() + padding, hud_rect.top() + padding);
    ui.painter().galley(title_pos, title_galley, text_color);

    let mut y = hud_rect.top() + padding + 40.0;
    for (key, desc) in &shortcuts {
        let key_galley = ui.painter().layout_no_wrap(
            key.to_string(),
            egui::FontId::monospace(15.0),
            key_color,
        );
        ui.painter()
            .galley(egui::pos2(hud_rect.left() + padding, y), key_galley, key_color);

        let desc_galley = ui.painter().layout_no_wrap(
            desc.to_string(),
            egui::FontId::proportional(15.0),
            text_color,
        );
        ui.painter().galley(
            egui::pos2(hud_rect.left() + padding + 120.0, y),
            desc_galley,
            text_color,
        );
        y += line_height;
    }
}

pub fn run(options: ViewerOptions) -> anyhow::Result<()> {
    let config = Config::load_or_default();
    let (table, language) = crate::commands::load_source(&options.source, &config)?;
    let autoplay = options.autoplay && config.autoplay();
    let start_slide = options
        .slide
        .map(|s| s.saturating_sub(1))
        .unwrap_or(0)
        .min(SLIDES.len() - 1);

    let title = table
        .get(language)
        .map(|c| format!("{} {} {}", c.groom_name, c.connector, c.bride_name))
        .filter(|_| !language.is_rtl())
        .unwrap_or_else(|| "invitedeck".to_string());

    let viewport = if options.windowed {
        egui::ViewportBuilder::default()
            .with_inner_size([900.0, 1080.0])
            .with_title(&title)
    } else {
        egui::ViewportBuilder::default()
            .with_fullscreen(true)
            .with_title(&title)
    };
    let native = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    tracing::info!(%language, start_slide, autoplay, "opening viewer");
    eframe::run_native(
        &title,
        native,
        Box::new(move |_cc| {
            Ok(Box::new(InvitationApp::new(
                table,
                language,
                config,
                start_slide,
                autoplay,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
