use std::path::PathBuf;

/// Failures of the document and video exports.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("an export is already in progress")]
    Busy,

    #[error("there are no sections to export")]
    NoSections,

    #[error("failed to rasterize section '{section}': {reason}")]
    Rasterize { section: String, reason: String },

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("document assembly failed: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("capture unavailable: {message}")]
    CaptureUnavailable { message: String },

    #[error("recording failed: {message}")]
    Recording { message: String },

    #[error("frame size mismatch: got {got:?}, expected {expected:?}")]
    FrameSize {
        got: (u32, u32),
        expected: (u32, u32),
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

impl ExportError {
    pub fn rasterize(section: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rasterize {
            section: section.into(),
            reason: reason.into(),
        }
    }

    pub fn capture_unavailable(msg: impl Into<String>) -> Self {
        Self::CaptureUnavailable {
            message: msg.into(),
        }
    }

    pub fn recording(msg: impl Into<String>) -> Self {
        Self::Recording {
            message: msg.into(),
        }
    }
}
