//! Glyph extraction from a delimiter grid
//!
//! Glyphs are drawn in cells separated by lines of the delimiter color (255).
//! A cell whose top-left pixel is the delimiter is an empty character; a row of
//! cells ends at the first cell with no top border above it.
use tracing::{debug, instrument, trace};

use crate::{image::bitmap::ChunkyImage, Error, DELIMITER};

/// Position and width of one glyph inside the source image
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct GlyphRect {
    /// Left column of the glyph
    pub x: usize,
    /// Top row of the glyph
    pub y: usize,
    /// Width in pixels, 0 for characters without a glyph
    pub width: usize,
}

/// Glyph rectangles for all 256 character codes, plus the font height
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GlyphTable {
    rects: [GlyphRect; 256],
    height: usize,
    span: Option<(u8, u8)>,
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphTable {
    /// Creates an empty table with no height fixed yet
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rects: [GlyphRect {
                x: 0,
                y: 0,
                width: 0,
            }; 256],
            height: 0,
            span: None,
        }
    }

    /// Returns the rectangle recorded for `code`
    #[must_use]
    pub const fn rect(&self, code: u8) -> GlyphRect {
        self.rects[code as usize]
    }

    /// Font height, fixed by the first glyph found (0 until then)
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// First and last character codes covered by the grabs so far
    #[must_use]
    pub const fn span(&self) -> Option<(u8, u8)> {
        self.span
    }

    /// Returns true if no grab has recorded a character yet
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.span.is_none()
    }

    fn extend_span(&mut self, first: u8, last: u8) {
        self.span = Some(match self.span {
            Some((f, l)) => (f.min(first), l.max(last)),
            None => (first, last),
        });
    }
}

/// Scans a glyph grid whose top-left border corner is at (`x`, `y`) and records
/// the glyphs found in `table`, numbering them from `first_char`
///
/// Can be called repeatedly on the same table to grab several grids; all of
/// them must share one glyph height.
///
/// # Errors
///
/// - [`Error::ZeroHeight`] if the first glyph measures 0 pixels high
/// - [`Error::InconsistentHeight`] if a glyph's height differs from the font height
/// - [`Error::OutOfRange`] if the grid has cells past character code 255
#[instrument(skip(image, table), fields(width = image.width(), height = image.height()))]
pub fn extract_glyphs(
    image: &ChunkyImage,
    table: &mut GlyphTable,
    x: usize,
    y: usize,
    first_char: u8,
) -> Result<(), Error> {
    let (width, height) = (image.width(), image.height());
    let is_delimiter = |x: usize, y: usize| image.pixel_index(x, y) == Some(DELIMITER);

    let mut glyph = usize::from(first_char);
    // skip the top and left border lines
    let left = x + 1;
    let mut y = y + 1;

    while y < height {
        let mut x = left;
        while x < width {
            let code = u8::try_from(glyph).map_err(|_| Error::OutOfRange { glyph })?;

            if is_delimiter(x, y) {
                glyph += 1;
                x += 1;
                continue;
            }

            let bottom = (y + 1..height)
                .find(|&r| is_delimiter(x, r))
                .unwrap_or(height);
            let glyph_height = bottom - y;
            if table.height == 0 {
                if glyph_height == 0 {
                    return Err(Error::ZeroHeight);
                }
                debug!("font height is {glyph_height}");
                table.height = glyph_height;
            }

            let right = (x + 1..width)
                .find(|&r| is_delimiter(r, y))
                .unwrap_or(width);
            if !is_delimiter(right - 1, y - 1) {
                trace!("no top border over ({x}, {y}), ending row");
                break;
            }

            if glyph_height != table.height {
                return Err(Error::InconsistentHeight {
                    glyph: code,
                    height: glyph_height,
                    expected: table.height,
                });
            }

            let rect = GlyphRect {
                x,
                y,
                width: right - x,
            };
            trace!("char #{code}: {rect:?}");
            table.rects[usize::from(code)] = rect;

            glyph += 1;
            x = right + 1;
        }
        y += table.height + 1;
    }

    if glyph > usize::from(first_char) {
        let last = u8::try_from(glyph - 1).unwrap_or(u8::MAX);
        debug!("grabbed chars {first_char}..={last}");
        table.extend_span(first_char, last);
    }
    Ok(())
}
