//! Scripted video export.
//!
//! Capture is acquired first; only then does the controller enter the
//! exporting state and jump to the first slide. Each slide is then held for a
//! fixed dwell while frames are written at a constant rate.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui::Color32;
use image::RgbaImage;
use image::imageops;

use crate::controller::SlideController;
use crate::export::document::{Rasterizer, Section};
use crate::export::{ExportError, ExportResult};
use crate::render::scene::{PAGE_HEIGHT, PAGE_WIDTH};

pub const DEFAULT_DWELL: Duration = Duration::from_millis(5000);
pub const DEFAULT_FPS: u32 = 30;
/// Highest frame rate accepted from flags, config or a job.
pub const MAX_FPS: u32 = 120;
pub const VIDEO_FILE_NAME: &str = "wedding-invite-video.webm";
/// Video frames are rendered at print size.
pub const VIDEO_SCALE: f32 = 1.0;

/// Shown to the user when recording could not start or did not complete.
pub const FAILURE_ALERT: &str = "Video generation cancelled or failed.";

/// Which slide is on screen at a given point of the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoScript {
    pub dwell: Duration,
    pub total: usize,
}

impl VideoScript {
    pub fn new(dwell: Duration, total: usize) -> Self {
        Self { dwell, total }
    }

    pub fn duration(&self) -> Duration {
        self.dwell * self.total as u32
    }

    /// The slide shown `elapsed` into the recording, or `None` once it is over.
    pub fn slide_at(&self, elapsed: Duration) -> Option<usize> {
        if self.dwell.is_zero() || elapsed >= self.duration() {
            return None;
        }
        Some((elapsed.as_nanos() / self.dwell.as_nanos()) as usize)
    }

    /// Frames needed to cover the whole script at `fps`.
    pub fn frame_count(&self, fps: u32) -> u64 {
        (self.duration().as_nanos() * u128::from(fps)).div_ceil(1_000_000_000) as u64
    }
}

/// A live recording that accepts frames of a fixed size.
pub trait Recorder {
    fn write_frame(&mut self, frame: &RgbaImage) -> ExportResult<()>;

    /// Stop recording and hand back the finished file.
    fn finish(self: Box<Self>) -> ExportResult<PathBuf>;

    /// Stop recording and discard everything written so far.
    fn cancel(self: Box<Self>);
}

/// Grants a recorder. This is the consent step: refusing aborts the export
/// before any state changes.
pub trait CaptureSource {
    fn acquire(&self, width: u32, height: u32, fps: u32) -> ExportResult<Box<dyn Recorder>>;
}

/// Supplies the rendered frame for a slide.
pub trait FrameSource {
    fn frame(&mut self, index: usize) -> ExportResult<&RgbaImage>;
}

#[derive(Debug, Clone, Copy)]
pub struct VideoJob {
    pub script: VideoScript,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl VideoJob {
    /// A job over `total` print-size slides.
    pub fn new(total: usize, dwell: Duration, fps: u32) -> Self {
        Self {
            script: VideoScript::new(dwell, total),
            fps,
            width: (PAGE_WIDTH * VIDEO_SCALE).round() as u32,
            height: (PAGE_HEIGHT * VIDEO_SCALE).round() as u32,
        }
    }
}

/// Frames rasterized from the export sections, each rendered once on first use.
pub struct SlideFrames<R> {
    sections: Vec<Section>,
    rendered: Vec<Option<RgbaImage>>,
    rasterizer: R,
    fallback: Color32,
}

impl<R: Rasterizer> SlideFrames<R> {
    pub fn new(sections: Vec<Section>, rasterizer: R, fallback: Color32) -> Self {
        let rendered = sections.iter().map(|_| None).collect();
        Self {
            sections,
            rendered,
            rasterizer,
            fallback,
        }
    }
}

impl<R: Rasterizer> FrameSource for SlideFrames<R> {
    fn frame(&mut self, index: usize) -> ExportResult<&RgbaImage> {
        let section = self
            .sections
            .get(index)
            .ok_or_else(|| ExportError::rasterize(format!("#{index}"), "no such slide"))?;
        if self.rendered[index].is_none() {
            let image = self
                .rasterizer
                .rasterize(&section.scene, VIDEO_SCALE, self.fallback)
                .map_err(|reason| ExportError::rasterize(&section.name, reason))?;
            self.rendered[index] = Some(image);
        }
        self.rendered[index]
            .as_ref()
            .ok_or_else(|| ExportError::rasterize(&section.name, "frame missing"))
    }
}

/// Round both dimensions down to even numbers, as yuv420p requires.
pub fn even_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width & !1, height & !1)
}

/// A recording in progress.
pub struct VideoCapture {
    recorder: Option<Box<dyn Recorder>>,
    script: VideoScript,
    fps: u32,
    size: (u32, u32),
    started: Instant,
    frames_written: u64,
    total_frames: u64,
}

impl VideoCapture {
    /// Acquire a recorder and take over the controller.
    ///
    /// On any error the controller is left untouched.
    pub fn start(
        source: &dyn CaptureSource,
        controller: &mut SlideController,
        job: &VideoJob,
        now: Instant,
    ) -> ExportResult<Self> {
        if controller.is_exporting() {
            return Err(ExportError::Busy);
        }
        if job.script.total == 0 {
            return Err(ExportError::NoSections);
        }
        if job.fps == 0 || job.script.dwell.is_zero() {
            return Err(ExportError::recording(
                "frame rate and dwell time must be non-zero",
            ));
        }
        if job.fps > MAX_FPS {
            return Err(ExportError::recording(format!(
                "frame rate {} is above the maximum of {MAX_FPS}",
                job.fps
            )));
        }
        let (width, height) = even_dimensions(job.width, job.height);
        if width == 0 || height == 0 {
            return Err(ExportError::FrameSize {
                got: (job.width, job.height),
                expected: (2, 2),
            });
        }

        let recorder = source.acquire(width, height, job.fps)?;

        controller.begin_export();
        controller.jump_to(0, now);
        tracing::info!(
            width,
            height,
            fps = job.fps,
            slides = job.script.total,
            "video capture started"
        );

        Ok(Self {
            recorder: Some(recorder),
            script: job.script,
            fps: job.fps,
            size: (width, height),
            started: now,
            frames_written: 0,
            total_frames: job.script.frame_count(job.fps),
        })
    }

    pub fn is_done(&self) -> bool {
        self.frames_written >= self.total_frames
    }

    /// Fraction of the script recorded so far.
    pub fn progress(&self) -> f32 {
        if self.total_frames == 0 {
            return 1.0;
        }
        self.frames_written as f32 / self.total_frames as f32
    }

    /// Write every frame due by `now`, moving the controller along the
    /// script. Returns whether the script has been fully recorded.
    pub fn poll(
        &mut self,
        controller: &mut SlideController,
        now: Instant,
        frames: &mut dyn FrameSource,
    ) -> ExportResult<bool> {
        let elapsed = now.saturating_duration_since(self.started);
        let due = ((elapsed.as_nanos() * u128::from(self.fps)) / 1_000_000_000) as u64 + 1;
        let due = due.min(self.total_frames);

        while self.frames_written < due {
            let at = Duration::from_nanos(
                (u128::from(self.frames_written) * 1_000_000_000 / u128::from(self.fps)) as u64,
            );
            let Some(slide) = self.script.slide_at(at) else {
                break;
            };
            if slide != controller.index() {
                controller.jump_to(slide, now);
                tracing::debug!(slide, "recording next slide");
            }
            let frame = frames.frame(slide)?;
            let frame = fit_frame(frame, self.size)?;
            let recorder = self
                .recorder
                .as_mut()
                .ok_or_else(|| ExportError::recording("recorder already stopped"))?;
            recorder.write_frame(&frame)?;
            self.frames_written += 1;
        }
        Ok(self.is_done())
    }

    /// Stop recording and restore autoplay.
    pub fn finish(mut self, controller: &mut SlideController, now: Instant) -> ExportResult<PathBuf> {
        let result = match self.recorder.take() {
            Some(recorder) => recorder.finish(),
            None => Err(ExportError::recording("recorder already stopped")),
        };
        controller.end_export(now);
        match &result {
            Ok(path) => {
                controller.set_autoplay(true, now);
                tracing::info!(path = %path.display(), frames = self.frames_written, "video exported");
            }
            Err(e) => tracing::error!(error = %e, "video export failed"),
        }
        result
    }

    /// Discard the recording. Autoplay stays off.
    pub fn abort(mut self, controller: &mut SlideController, now: Instant) {
        if let Some(recorder) = self.recorder.take() {
            recorder.cancel();
        }
        controller.end_export(now);
        tracing::warn!(frames = self.frames_written, "video capture aborted");
    }
}

/// Crop `frame` to `size` from the top-left corner.
fn fit_frame(frame: &RgbaImage, size: (u32, u32)) -> ExportResult<RgbaImage> {
    let (w, h) = size;
    if frame.width() < w || frame.height() < h {
        return Err(ExportError::FrameSize {
            got: frame.dimensions(),
            expected: size,
        });
    }
    if frame.dimensions() == size {
        return Ok(frame.clone());
    }
    Ok(imageops::crop_imm(frame, 0, 0, w, h).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::DEFAULT_AUTOPLAY_INTERVAL;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        frames: Vec<(u32, u32, u8)>,
        finished: bool,
        cancelled: bool,
    }

    struct FakeRecorder(Rc<RefCell<Log>>);

    impl Recorder for FakeRecorder {
        fn write_frame(&mut self, frame: &RgbaImage) -> ExportResult<()> {
            let tag = frame.get_pixel(0, 0).0[0];
            self.0.borrow_mut().frames.push((frame.width(), frame.height(), tag));
            Ok(())
        }

        fn finish(self: Box<Self>) -> ExportResult<PathBuf> {
            self.0.borrow_mut().finished = true;
            Ok(PathBuf::from(VIDEO_FILE_NAME))
        }

        fn cancel(self: Box<Self>) {
            self.0.borrow_mut().cancelled = true;
        }
    }

    struct FakeSource {
        log: Rc<RefCell<Log>>,
        grant: bool,
    }

    impl CaptureSource for FakeSource {
        fn acquire(&self, _: u32, _: u32, _: u32) -> ExportResult<Box<dyn Recorder>> {
            if !self.grant {
                return Err(ExportError::capture_unavailable("user cancelled"));
            }
            Ok(Box::new(FakeRecorder(self.log.clone())))
        }
    }

    /// Odd-sized frames whose first red byte is the slide index.
    struct Frames(Vec<RgbaImage>);

    impl Frames {
        fn new(total: usize) -> Self {
            Self(
                (0..total)
                    .map(|i| RgbaImage::from_pixel(11, 7, image::Rgba([i as u8, 0, 0, 255])))
                    .collect(),
            )
        }
    }

    impl FrameSource for Frames {
        fn frame(&mut self, index: usize) -> ExportResult<&RgbaImage> {
            Ok(&self.0[index])
        }
    }

    fn setup(grant: bool) -> (FakeSource, Rc<RefCell<Log>>, SlideController, Instant) {
        let log = Rc::new(RefCell::new(Log::default()));
        let source = FakeSource {
            log: log.clone(),
            grant,
        };
        let now = Instant::now();
        let mut controller = SlideController::new(4, DEFAULT_AUTOPLAY_INTERVAL, true);
        controller.open_gate(now);
        controller.jump_to(2, now);
        (source, log, controller, now)
    }

    fn job() -> VideoJob {
        VideoJob {
            script: VideoScript::new(Duration::from_millis(1000), 4),
            fps: 2,
            width: 11,
            height: 7,
        }
    }

    #[test]
    fn script_timing() {
        let script = VideoScript::new(DEFAULT_DWELL, 4);
        assert_eq!(script.duration(), Duration::from_secs(20));
        assert_eq!(script.slide_at(Duration::ZERO), Some(0));
        assert_eq!(script.slide_at(Duration::from_millis(4999)), Some(0));
        assert_eq!(script.slide_at(Duration::from_millis(5000)), Some(1));
        assert_eq!(script.slide_at(Duration::from_millis(19_999)), Some(3));
        assert_eq!(script.slide_at(Duration::from_secs(20)), None);
        assert_eq!(script.frame_count(30), 600);
    }

    #[test]
    fn even_dimensions_round_down() {
        assert_eq!(even_dimensions(1191, 1684), (1190, 1684));
        assert_eq!(even_dimensions(1, 3), (0, 2));
    }

    #[test]
    fn start_resets_to_first_slide_and_suspends_autoplay() {
        let (source, _, mut c, now) = setup(true);
        let _capture = VideoCapture::start(&source, &mut c, &job(), now).unwrap();
        assert_eq!(c.index(), 0);
        assert!(c.state().exporting);
        assert!(!c.state().autoplay);
        assert!(c.next_deadline().is_none());
    }

    #[test]
    fn out_of_range_frame_rates_are_refused() {
        for fps in [0, MAX_FPS + 1, 2_000_000_000] {
            let (source, log, mut c, now) = setup(true);
            let job = VideoJob { fps, ..job() };
            assert!(VideoCapture::start(&source, &mut c, &job, now).is_err());
            assert!(!c.state().exporting);
            assert_eq!(c.index(), 2);
            assert!(log.borrow().frames.is_empty());
        }
    }

    #[test]
    fn refused_capture_changes_nothing() {
        let (source, log, mut c, now) = setup(false);
        let err = VideoCapture::start(&source, &mut c, &job(), now).err().unwrap();
        assert!(matches!(err, ExportError::CaptureUnavailable { .. }));
        assert_eq!(c.index(), 2);
        assert!(!c.state().exporting);
        assert!(c.state().autoplay);
        assert!(log.borrow().frames.is_empty());
    }

    #[test]
    fn records_each_slide_for_its_dwell_then_restores_autoplay() {
        let (source, log, mut c, now) = setup(true);
        let mut capture = VideoCapture::start(&source, &mut c, &job(), now).unwrap();
        let mut frames = Frames::new(4);

        // Half way: slides 0 and 1 recorded, two frames each.
        assert!(!capture.poll(&mut c, now + Duration::from_millis(1999), &mut frames).unwrap());
        assert_eq!(c.index(), 1);
        assert_eq!(log.borrow().frames.len(), 4);

        assert!(capture.poll(&mut c, now + Duration::from_secs(30), &mut frames).unwrap());
        assert_eq!(c.index(), 3);
        let tags: Vec<u8> = log.borrow().frames.iter().map(|f| f.2).collect();
        assert_eq!(tags, [0, 0, 1, 1, 2, 2, 3, 3]);
        assert!(log.borrow().frames.iter().all(|f| (f.0, f.1) == (10, 6)));

        let end = now + Duration::from_secs(31);
        let path = capture.finish(&mut c, end).unwrap();
        assert_eq!(path, PathBuf::from(VIDEO_FILE_NAME));
        assert!(log.borrow().finished);
        assert!(!c.state().exporting);
        assert!(c.state().autoplay);
        assert_eq!(c.next_deadline(), Some(end + DEFAULT_AUTOPLAY_INTERVAL));
    }

    #[test]
    fn abort_discards_and_keeps_autoplay_off() {
        let (source, log, mut c, now) = setup(true);
        let capture = VideoCapture::start(&source, &mut c, &job(), now).unwrap();
        capture.abort(&mut c, now);
        assert!(log.borrow().cancelled);
        assert!(!log.borrow().finished);
        assert!(!c.state().exporting);
        assert!(!c.state().autoplay);
    }

    #[test]
    fn capture_is_refused_during_another_export() {
        let (source, _, mut c, now) = setup(true);
        assert!(c.begin_export());
        let err = VideoCapture::start(&source, &mut c, &job(), now).err().unwrap();
        assert!(matches!(err, ExportError::Busy));
    }

    #[test]
    fn slide_frames_render_each_section_once() {
        use crate::render::scene::Scene;
        use std::cell::Cell;

        struct Counting(Cell<usize>);
        impl Rasterizer for Counting {
            fn rasterize(&self, scene: &Scene, _: f32, _: Color32) -> Result<RgbaImage, String> {
                self.0.set(self.0.get() + 1);
                Ok(RgbaImage::new(scene.width() as u32, scene.height() as u32))
            }
        }

        let rasterizer = Counting(Cell::new(0));
        let sections = (0..2)
            .map(|i| Section {
                name: format!("s{i}"),
                scene: Scene::new(4.0 + i as f32, 4.0, Color32::WHITE),
            })
            .collect();
        let mut frames = SlideFrames::new(sections, &rasterizer, Color32::WHITE);
        assert_eq!(frames.frame(1).unwrap().width(), 5);
        assert_eq!(frames.frame(1).unwrap().width(), 5);
        assert_eq!(frames.frame(0).unwrap().width(), 4);
        assert_eq!(rasterizer.0.get(), 2);
        assert!(frames.frame(2).is_err());
    }

    #[test]
    fn job_covers_a_print_page() {
        let job = VideoJob::new(4, DEFAULT_DWELL, DEFAULT_FPS);
        assert_eq!((job.width, job.height), (794, 1123));
        assert_eq!(even_dimensions(job.width, job.height), (794, 1122));
    }

    #[test]
    fn undersized_frames_are_rejected() {
        let frame = RgbaImage::new(4, 4);
        assert!(matches!(
            fit_frame(&frame, (6, 4)),
            Err(ExportError::FrameSize { .. })
        ));
        assert_eq!(fit_frame(&frame, (2, 2)).unwrap().dimensions(), (2, 2));
    }
}
