//! FON2 proportional fonts
//!
//! ```text
//! "FON2" height:u16le first:u8 last:u8 constant:u8 shading:u8 palette_size:u8 pad:u8
//! widths:    one u16le if constant, else one per character in first..=last
//! palette:   palette_size RGB triples, then the delimiter color
//! glyphs:    one byte-run stream of width * height pixels per non-empty character
//! ```
use bon::Builder;
use itertools::Itertools;
use nom::{
    bytes::streaming::{tag, take},
    multi::count,
    number::streaming::{le_u16, u8 as byte},
    sequence::tuple,
    IResult,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::{
    error::alloc_pixels,
    font::{grab::GlyphTable, palette::CompactedPalette, ShadingType},
    image::{
        bitmap::ChunkyImage,
        parse::{handle_ires, rgb_triples},
        rle::{max_unpacked_len, pack_row, unpack},
        Rgb,
    },
    Error, DELIMITER,
};

/// Size of the fixed part of the header
pub(crate) const HEADER_LEN: usize = 12;

/// Fixed FON2 header
#[derive(Builder, Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub struct FontHeader {
    /// Glyph height in pixels
    pub height: u16,
    /// First character code
    pub first_char: u8,
    /// Last character code
    pub last_char: u8,
    /// All characters share the width of the first one
    #[builder(default)]
    pub constant_width: bool,
    /// How the font is shaded when drawn
    #[builder(default)]
    pub shading: ShadingType,
    /// Palette entries stored, transparent index 0 included
    pub palette_size: u8,
}

impl FontHeader {
    fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (_, height, first_char, last_char)) =
            tuple((tag(b"FON2".as_slice()), le_u16, byte, byte))(input)?;
        let (input, (constant_width, shading, palette_size, _pad)) =
            tuple((byte, byte, byte, byte))(input)?;
        let shading = ShadingType::from_repr(shading).unwrap_or_else(|| {
            warn!("unknown shading type {shading}, using normal");
            ShadingType::Normal
        });
        Ok((
            input,
            Self {
                height,
                first_char,
                last_char,
                constant_width: constant_width != 0,
                shading,
                palette_size,
            },
        ))
    }

    fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0; HEADER_LEN];
        out[..4].copy_from_slice(b"FON2");
        out[4..6].copy_from_slice(&self.height.to_le_bytes());
        out[6] = self.first_char;
        out[7] = self.last_char;
        out[8] = u8::from(self.constant_width);
        out[9] = self.shading as u8;
        out[10] = self.palette_size;
        out
    }

    /// Number of characters in `first_char..=last_char`
    #[must_use]
    pub const fn char_count(&self) -> usize {
        (self.last_char as usize + 1).saturating_sub(self.first_char as usize)
    }
}

/// A complete font: header, widths, palette and the pixels of every glyph
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FontDescriptor {
    header: FontHeader,
    /// One width per character in `first_char..=last_char`
    widths: Vec<u16>,
    palette: Vec<Rgb>,
    delimiter: Rgb,
    /// One `width * height` block per character, empty for zero-width characters
    glyphs: Vec<Vec<u8>>,
}

impl FontDescriptor {
    /// Builds a font from the glyphs recorded in `table`
    ///
    /// Delimiter pixels inside a glyph are replaced with the palette's
    /// substitute color. Returns [`None`] if the table holds no characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if a glyph lies outside `image` or is wider or
    /// taller than 65535 pixels
    #[instrument(skip_all)]
    pub fn from_grid(
        image: &ChunkyImage,
        palette: &CompactedPalette,
        table: &GlyphTable,
        shading: ShadingType,
    ) -> Result<Option<Self>, Error> {
        let Some((first_char, last_char)) = table.span() else {
            return Ok(None);
        };
        if palette.is_empty() {
            return Ok(None);
        }
        let too_large = |_| Error::format("glyphs are limited to 65535x65535");
        let height = table.height();
        let mut widths = Vec::with_capacity(usize::from(last_char - first_char) + 1);
        let mut glyphs = Vec::with_capacity(widths.capacity());

        for code in first_char..=last_char {
            let rect = table.rect(code);
            widths.push(u16::try_from(rect.width).map_err(too_large)?);
            let mut block = alloc_pixels(rect.width * height, 0)?;
            if rect.width > 0 {
                for (row, dest) in block.chunks_exact_mut(rect.width).enumerate() {
                    let src = image
                        .get_row(rect.y + row)
                        .and_then(|r| r.get(rect.x..rect.x + rect.width))
                        .ok_or_else(|| {
                            Error::format(format!("char #{code} lies outside the image"))
                        })?;
                    for (d, &s) in dest.iter_mut().zip(src) {
                        *d = if s == DELIMITER { palette.substitute() } else { s };
                    }
                }
            }
            glyphs.push(block);
        }

        let header = FontHeader::builder()
            .height(u16::try_from(height).map_err(too_large)?)
            .first_char(first_char)
            .last_char(last_char)
            .constant_width(widths.iter().all_equal())
            .shading(shading)
            .palette_size(u8::try_from(palette.len()).unwrap_or(u8::MAX))
            .build();
        debug!("{header:?}");

        Ok(Some(Self {
            header,
            widths,
            palette: palette.colors().to_vec(),
            delimiter: palette.delimiter(),
            glyphs,
        }))
    }

    /// Parses a FON2 file
    ///
    /// # Errors
    ///
    /// - [`Error::Format`] if the magic is wrong or `first_char > last_char`
    /// - [`Error::TruncatedInput`] if any field or glyph stream is cut short
    #[instrument(skip(data), fields(len = data.len()))]
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let (input, header) = handle_ires(FontHeader::parse, data)?;
        debug!("{header:?}");
        if header.first_char > header.last_char {
            return Err(Error::format(format!(
                "FON2 first char {} is after last char {}",
                header.first_char, header.last_char
            )));
        }
        let chars = header.char_count();

        let (input, widths) = if header.constant_width {
            let (input, width) = handle_ires(le_u16, input)?;
            (input, vec![width; chars])
        } else {
            handle_ires(|i| count(le_u16, chars)(i), input)?
        };
        let (input, palette) =
            handle_ires(rgb_triples(usize::from(header.palette_size)), input)?;
        let (mut input, delimiter) = handle_ires(|i| take(3usize)(i), input)?;
        let delimiter = [delimiter[0], delimiter[1], delimiter[2]];

        let height = usize::from(header.height);
        let pixels = widths
            .iter()
            .map(|&w| usize::from(w).saturating_mul(height))
            .fold(0, usize::saturating_add);
        let limit = max_unpacked_len(input.len());
        if pixels > limit {
            return Err(Error::TruncatedInput {
                deficit: pixels - limit,
            });
        }
        let mut glyphs = Vec::with_capacity(chars);
        for (code, &width) in (header.first_char..=header.last_char).zip(&widths) {
            let mut block = alloc_pixels(usize::from(width) * height, 0)?;
            if width > 0 {
                trace!("unpacking char #{code}");
                unpack(&mut input, &mut block)?;
            }
            glyphs.push(block);
        }

        Ok(Self {
            header,
            widths,
            palette,
            delimiter,
            glyphs,
        })
    }

    /// Serializes the font
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.header.to_bytes());
        if self.header.constant_width {
            let width = self.widths.first().copied().unwrap_or_default();
            out.extend_from_slice(&width.to_le_bytes());
        } else {
            out.extend(self.widths.iter().flat_map(|w| w.to_le_bytes()));
        }
        out.extend(self.palette.iter().flatten());
        out.extend_from_slice(&self.delimiter);

        for glyph in self.glyphs.iter().filter(|g| !g.is_empty()) {
            pack_row(glyph, &mut out);
        }
        info!("{} pixels of font glyphs stored", self.glyph_pixels());
        out
    }

    /// Lays the glyphs out in a delimiter grid that [`extract_glyphs`](crate::extract_glyphs)
    /// can read back
    ///
    /// The canvas is roughly square. Each row of glyphs is boxed in by the
    /// delimiter color and every glyph has a delimiter column on its left.
    /// The last column is never reached by a row, so a long row's bottom
    /// border cannot pass for the top border of a cell in a shorter row below.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the canvas cannot be allocated
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[instrument(skip(self))]
    pub fn into_grid(self) -> Result<ChunkyImage, Error> {
        let height = usize::from(self.header.height);
        let widths: Vec<usize> = self.widths.iter().map(|&w| usize::from(w)).collect();
        let max_width = widths.iter().copied().max().unwrap_or_default();
        let total_width = if self.header.constant_width {
            (max_width + 1) * widths.len() + 1
        } else {
            1 + widths.iter().map(|w| w + 1).sum::<usize>()
        };

        let pixels = total_width * (height + 2);
        let canvas_width = ((pixels as f64).sqrt() as usize).max(max_width + 3);

        let mut rows = 1;
        let mut j = 1;
        for &w in &widths {
            if j + w + 1 >= canvas_width {
                j = 1;
                rows += 1;
            }
            j += w + 1;
        }
        let canvas_height = rows * (height + 1) + 1;
        info!("Dimensions: {canvas_width} x {canvas_height}");

        let mut palette = [[0; 3]; 256];
        palette[..self.palette.len()].copy_from_slice(&self.palette);
        palette[usize::from(DELIMITER)] = self.delimiter;
        let mut grid = ChunkyImage::filled(canvas_width, canvas_width, canvas_height, 0, palette)?;

        let (mut j, mut k) = (1, 1);
        for (&w, glyph) in widths.iter().zip(&self.glyphs) {
            if j + w + 1 >= canvas_width {
                box_row(&mut grid, j, k, height);
                j = 1;
                k += height + 1;
            }
            for row in 0..height {
                grid.set_pixel_index(j - 1, k + row, DELIMITER);
                if let Some(dest) = grid.get_row_mut(k + row) {
                    dest[j..j + w].copy_from_slice(&glyph[row * w..(row + 1) * w]);
                }
            }
            j += w + 1;
        }
        box_row(&mut grid, j, k, height);

        Ok(grid)
    }

    /// Returns the fixed header
    #[must_use]
    pub const fn header(&self) -> &FontHeader {
        &self.header
    }

    /// Glyph height in pixels
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.header.height
    }

    /// First character code
    #[must_use]
    pub const fn first_char(&self) -> u8 {
        self.header.first_char
    }

    /// Last character code
    #[must_use]
    pub const fn last_char(&self) -> u8 {
        self.header.last_char
    }

    /// Shading type stored in the header
    #[must_use]
    pub const fn shading(&self) -> ShadingType {
        self.header.shading
    }

    /// Returns true if every character has the same width
    #[must_use]
    pub const fn is_constant_width(&self) -> bool {
        self.header.constant_width
    }

    /// Width of `code`, 0 outside `first_char..=last_char`
    #[must_use]
    pub fn width(&self, code: u8) -> u16 {
        code.checked_sub(self.header.first_char)
            .and_then(|i| self.widths.get(usize::from(i)))
            .copied()
            .unwrap_or_default()
    }

    /// Pixels of `code`, `width * height` bytes row by row
    #[must_use]
    pub fn glyph(&self, code: u8) -> Option<&[u8]> {
        code.checked_sub(self.header.first_char)
            .and_then(|i| self.glyphs.get(usize::from(i)))
            .map(Vec::as_slice)
    }

    /// Palette entries stored in the font, transparent index 0 first
    #[must_use]
    pub fn palette(&self) -> &[Rgb] {
        &self.palette
    }

    /// Color of the delimiter in the source grid
    #[must_use]
    pub const fn delimiter(&self) -> Rgb {
        self.delimiter
    }

    /// Total number of glyph pixels
    #[must_use]
    pub fn glyph_pixels(&self) -> usize {
        self.glyphs.iter().map(Vec::len).sum()
    }
}

/// Closes a row of glyphs ending at column `j - 1`, starting at row `k`
fn box_row(grid: &mut ChunkyImage, j: usize, k: usize, height: usize) {
    for x in 0..j {
        grid.set_pixel_index(x, k - 1, DELIMITER);
        grid.set_pixel_index(x, k + height, DELIMITER);
    }
    for y in k..k + height {
        grid.set_pixel_index(j - 1, y, DELIMITER);
    }
}

/// Serializes a font as FON2
#[must_use]
pub fn encode_font(font: &FontDescriptor) -> Vec<u8> {
    font.to_bytes()
}

/// Parses a FON2 file and lays its glyphs out as an editable grid image
///
/// # Errors
///
/// See [`FontDescriptor::parse`] and [`FontDescriptor::into_grid`]
pub fn decode_font(data: &[u8]) -> Result<ChunkyImage, Error> {
    FontDescriptor::parse(data)?.into_grid()
}
