use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Output, Stdio};

use eframe::egui::Color32;
use image::RgbaImage;

use crate::export::video::{CaptureSource, Recorder, VIDEO_FILE_NAME};
use crate::export::{ExportError, ExportResult, blend_over};

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Records VP9/WebM through the system `ffmpeg` binary.
pub struct FfmpegCapture {
    output_dir: PathBuf,
    background: Color32,
}

impl FfmpegCapture {
    pub fn new(output_dir: impl Into<PathBuf>, background: Color32) -> Self {
        Self {
            output_dir: output_dir.into(),
            background,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(VIDEO_FILE_NAME)
    }
}

impl CaptureSource for FfmpegCapture {
    fn acquire(&self, width: u32, height: u32, fps: u32) -> ExportResult<Box<dyn Recorder>> {
        if !is_ffmpeg_on_path() {
            return Err(ExportError::capture_unavailable(
                "ffmpeg is required for video export, but was not found on PATH",
            ));
        }
        std::fs::create_dir_all(&self.output_dir)?;
        let recorder = FfmpegRecorder::spawn(
            self.output_path(),
            width,
            height,
            fps,
            self.background,
        )?;
        Ok(Box::new(recorder))
    }
}

/// A running `ffmpeg` fed raw RGBA frames on stdin.
///
/// Output goes to a `.part` file that only takes its final name once the
/// encoder exits cleanly.
pub struct FfmpegRecorder {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    background: [u8; 3],
    scratch: Vec<u8>,
    part_path: PathBuf,
    out_path: PathBuf,
}

impl FfmpegRecorder {
    fn spawn(
        out_path: PathBuf,
        width: u32,
        height: u32,
        fps: u32,
        background: Color32,
    ) -> ExportResult<Self> {
        let part_path = part_path(&out_path);

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &fps.to_string(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            "0",
            "-crf",
            "32",
            "-f",
            "webm",
        ])
        .arg(&part_path);

        let mut child = cmd.spawn().map_err(|e| {
            ExportError::capture_unavailable(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExportError::recording("failed to open ffmpeg stdin"))?;
        tracing::debug!(path = %part_path.display(), "ffmpeg started");

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            width,
            height,
            background: [background.r(), background.g(), background.b()],
            scratch: vec![0; (width * height * 4) as usize],
            part_path,
            out_path,
        })
    }

    fn kill(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            let _ = std::fs::remove_file(&self.part_path);
        }
    }
}

impl Recorder for FfmpegRecorder {
    fn write_frame(&mut self, frame: &RgbaImage) -> ExportResult<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(ExportError::FrameSize {
                got: frame.dimensions(),
                expected: (self.width, self.height),
            });
        }
        for (dst, src) in self.scratch.chunks_exact_mut(4).zip(frame.pixels()) {
            let [r, g, b] = blend_over(src.0, self.background);
            dst.copy_from_slice(&[r, g, b, 255]);
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ExportError::recording("ffmpeg encoder is already finalized"))?;
        stdin.write_all(&self.scratch).map_err(|e| {
            ExportError::recording(format!("failed to write frame to ffmpeg stdin: {e}"))
        })
    }

    fn finish(mut self: Box<Self>) -> ExportResult<PathBuf> {
        drop(self.stdin.take());
        let child = self
            .child
            .take()
            .ok_or_else(|| ExportError::recording("ffmpeg is not running"))?;
        publish(child.wait_with_output(), &self.part_path, &self.out_path)
    }

    fn cancel(mut self: Box<Self>) {
        self.kill();
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Move the finished partial file into place. On any failure the partial
/// file is removed.
fn publish(output: std::io::Result<Output>, part: &Path, out: &Path) -> ExportResult<PathBuf> {
    let result = match output {
        Err(e) => Err(ExportError::recording(format!(
            "failed to wait for ffmpeg to finish: {e}"
        ))),
        Ok(output) if !output.status.success() => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ExportError::recording(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )))
        }
        Ok(_) => std::fs::rename(part, out)
            .map(|()| out.to_path_buf())
            .map_err(ExportError::from),
    };
    if result.is_err() {
        let _ = std::fs::remove_file(part);
    }
    result
}

fn part_path(out_path: &Path) -> PathBuf {
    let mut name = out_path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    out_path.with_file_name(name)
}
