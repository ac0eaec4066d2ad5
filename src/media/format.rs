//! The closed set of supported source formats and content sniffing.
//!
//! The declared filename of an upload is untrusted; the format that
//! drives every later decision is read from the magic bytes once, at
//! submission, and fixed for the session's lifetime.

use image::ImageFormat;

/// Supported source formats. PNG and JPEG are the two static encodings;
/// GIF is the animated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Png,
    Jpeg,
    Gif,
}

impl SourceFormat {
    /// Sniff the format from content magic bytes. `None` for anything
    /// outside the supported set, including valid images in other
    /// formats.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    /// File extension of the output artifact for this source family.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }

    /// Whether this format carries frame timing and must go through the
    /// animated processing path.
    pub fn is_animated(self) -> bool {
        matches!(self, Self::Gif)
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        })
    }
}
