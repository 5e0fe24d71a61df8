//! Palette compaction for font sources
use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::{
    image::{bitmap::ChunkyImage, Rgb},
    DELIMITER,
};

/// Starting distance for the delimiter substitute search, larger than any real distance
const FARTHEST: u32 = 256 * 256 * 4;

/// The palette of a font after [`compact_palette`]
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompactedPalette {
    colors: Vec<Rgb>,
    delimiter: Rgb,
    substitute: u8,
}

impl CompactedPalette {
    /// Number of palette entries, including the transparent index 0
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false: index 0 is part of every compacted palette
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// All entries, transparent index 0 first
    #[must_use]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// The entries the glyphs actually draw with, in ascending luma
    #[must_use]
    pub fn used_colors(&self) -> &[Rgb] {
        self.colors.get(1..).unwrap_or_default()
    }

    /// Original color of the delimiter index
    #[must_use]
    pub const fn delimiter(&self) -> Rgb {
        self.delimiter
    }

    /// Compacted index closest to the delimiter color, written in place of
    /// delimiter pixels found inside a glyph
    #[must_use]
    pub const fn substitute(&self) -> u8 {
        self.substitute
    }
}

fn luma([r, g, b]: Rgb) -> u32 {
    299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)
}

fn distance(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b)
        .map(|(&x, y)| u32::from(x.abs_diff(y)).pow(2))
        .sum()
}

/// Moves the colors an image uses to the front of its palette, ordered by
/// brightness, and rewrites the pixels to match
///
/// Index 0 (transparent) always maps to itself and index 255 (the glyph
/// delimiter) is never moved. Only the visible part of each row is scanned
/// and remapped. The image palette is updated so that it keeps describing
/// the remapped pixels.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn compact_palette(image: &mut ChunkyImage) -> CompactedPalette {
    let mut used = [false; 256];
    for &p in image.rows().flatten() {
        used[usize::from(p)] = true;
    }
    used[0] = true;

    let palette = *image.palette();
    let delimiter = palette[usize::from(DELIMITER)];
    let by_brightness = (1..DELIMITER)
        .filter(|&i| used[usize::from(i)])
        .sorted_by_key(|&i| luma(palette[usize::from(i)]));

    let mut remap = [0u8; 256];
    remap[usize::from(DELIMITER)] = DELIMITER;
    let mut colors = vec![palette[0]];
    let mut substitute = 0;
    let mut best = FARTHEST;
    for (new, old) in (1..DELIMITER).zip(by_brightness) {
        remap[usize::from(old)] = new;
        let color = palette[usize::from(old)];
        trace!("{old} -> {new} ({color:?})");
        colors.push(color);

        let dist = distance(color, delimiter);
        if dist < best {
            best = dist;
            substitute = new;
        }
    }
    debug!(
        "{} colors in use, delimiter substitute is {substitute}",
        colors.len()
    );

    for y in 0..image.height() {
        if let Some(row) = image.get_row_mut(y) {
            for p in row {
                *p = remap[usize::from(*p)];
            }
        }
    }
    image.palette_mut()[..colors.len()].copy_from_slice(&colors);

    CompactedPalette {
        colors,
        delimiter,
        substitute,
    }
}
