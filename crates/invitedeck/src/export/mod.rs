pub mod document;
pub mod error;
pub mod ffmpeg;
pub mod pdf;
pub mod video;

pub use error::{ExportError, ExportResult};

/// Composite a straight-alpha pixel over an opaque background.
pub(crate) fn blend_over(pixel: [u8; 4], background: [u8; 3]) -> [u8; 3] {
    let a = u16::from(pixel[3]);
    if a == 255 {
        return [pixel[0], pixel[1], pixel[2]];
    }
    let inv = 255 - a;
    let mix = |fg: u8, bg: u8| ((u16::from(fg) * a + u16::from(bg) * inv + 127) / 255) as u8;
    [
        mix(pixel[0], background[0]),
        mix(pixel[1], background[1]),
        mix(pixel[2], background[2]),
    ]
}
