#![allow(clippy::module_name_repetitions)]

pub(crate) mod fon1;
pub(crate) mod fon2;
pub(crate) mod grab;
pub(crate) mod palette;

use strum::{Display, EnumString, FromRepr, IntoStaticStr};
use tracing::{info, instrument};

use crate::{image::bitmap::ChunkyImage, Error};
use fon2::FontDescriptor;
use grab::{extract_glyphs, GlyphTable};
use palette::{compact_palette, CompactedPalette};

/// How a font's colors are applied when it is drawn
#[derive(
    Default, Debug, Eq, PartialEq, Copy, Clone, FromRepr, EnumString, Display, IntoStaticStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[repr(u8)]
pub enum ShadingType {
    /// Colors are used as stored
    #[default]
    Normal = 0,
    /// Console style shading
    Console = 1,
    /// No shading
    None = 2,
}

/// Turns a delimiter grid image into a [`FontDescriptor`]
///
/// ```rust
/// use libchunky::{ChunkyImage, FontBuilder};
///
/// # fn main() -> anyhow::Result<()> {
/// // a single 2x2 glyph boxed in by the delimiter color
/// let mut pixels = vec![255; 16];
/// for i in [5, 6, 9, 10] {
///     pixels[i] = 1;
/// }
/// let image = ChunkyImage::new(4, 4, 4, pixels, [[0; 3]; 256])?;
///
/// let mut builder = FontBuilder::new(image);
/// builder.grab(0, 0, b'A')?;
/// let font = builder.finish()?.expect("one glyph was grabbed");
/// assert_eq!((font.first_char(), font.last_char()), (b'A', b'A'));
/// assert_eq!(font.height(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FontBuilder {
    image: ChunkyImage,
    palette: CompactedPalette,
    glyphs: GlyphTable,
    shading: ShadingType,
}

impl FontBuilder {
    /// Compacts the palette of `image` and prepares an empty glyph table
    #[must_use]
    pub fn new(mut image: ChunkyImage) -> Self {
        let palette = compact_palette(&mut image);
        Self {
            image,
            palette,
            glyphs: GlyphTable::new(),
            shading: ShadingType::default(),
        }
    }

    /// Grabs the glyph grid whose top-left corner is at (`x`, `y`)
    ///
    /// # Errors
    ///
    /// See [`extract_glyphs`]
    pub fn grab(&mut self, x: usize, y: usize, first_char: u8) -> Result<&mut Self, Error> {
        extract_glyphs(&self.image, &mut self.glyphs, x, y, first_char)?;
        Ok(self)
    }

    /// Sets the shading type written to the font header
    pub fn set_shading(&mut self, shading: ShadingType) -> &mut Self {
        self.shading = shading;
        self
    }

    /// The image after palette compaction
    #[must_use]
    pub const fn image(&self) -> &ChunkyImage {
        &self.image
    }

    /// The compacted palette
    #[must_use]
    pub const fn palette(&self) -> &CompactedPalette {
        &self.palette
    }

    /// Glyphs grabbed so far
    #[must_use]
    pub const fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }

    /// Builds the font
    ///
    /// If nothing was grabbed yet, the grid at (0, 0) is grabbed starting with
    /// the space character. Returns [`None`] if there are still no characters.
    ///
    /// # Errors
    ///
    /// Errors from the implicit grab, or [`Error::Format`] for glyphs larger
    /// than 65535 pixels
    #[instrument(skip(self))]
    pub fn finish(mut self) -> Result<Option<FontDescriptor>, Error> {
        if self.glyphs.is_empty() {
            self.grab(0, 0, b' ')?;
        }
        let font =
            FontDescriptor::from_grid(&self.image, &self.palette, &self.glyphs, self.shading)?;
        if font.is_none() {
            info!("no glyphs found");
        }
        Ok(font)
    }
}
