use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libchunky` errors
pub enum Error {
    /// Error returned if a file cannot be opened, read or written
    #[error("i/o error")]
    Io(#[from] std::io::Error),
    /// Error returned if a declared length runs past the end of the input
    #[error("input is too short: {deficit} bytes missing")]
    TruncatedInput {
        /// How many bytes were still expected when the input ran out
        deficit: usize,
    },
    /// Error returned for bad magic numbers and unsupported header values
    #[error("format error: {0}")]
    Format(String),
    /// The first glyph of a font grid measured zero pixels high
    #[error("font has 0 height")]
    ZeroHeight,
    /// A glyph's height differs from the height fixed by the first glyph
    #[error("char #{glyph} has height {height} instead of {expected}")]
    InconsistentHeight {
        /// Character code of the offending glyph
        glyph: u8,
        /// Measured height
        height: usize,
        /// Font height
        expected: usize,
    },
    /// A font grid holds more glyphs than character codes 0-255 allow
    #[error("glyph #{glyph} is out of range")]
    OutOfRange {
        /// The character code that would have been assigned
        glyph: usize,
    },
    /// Error returned by the PNG encoder or decoder
    #[error("png error")]
    Image(#[from] ::image::ImageError),
    /// A pixel buffer could not be allocated
    #[error("out of memory")]
    OutOfMemory,
}

impl Error {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

/// Allocates a pixel buffer filled with `fill`, reporting allocation failure as [`Error::OutOfMemory`]
pub(crate) fn alloc_pixels(len: usize, fill: u8) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    buf.resize(len, fill);
    Ok(buf)
}
