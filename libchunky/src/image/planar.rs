//! Chunky (one byte per pixel) <-> bitplane row conversion.
//!
//! Plane bytes are MSB-first: pixel 0 of a row lives in bit 7 of the first
//! byte of every plane.
use tracing::instrument;

use crate::Error;

/// Number of bytes one plane row occupies for `width` pixels (rows are padded to 16 pixels)
#[must_use]
pub const fn plane_width(width: usize) -> usize {
    ((width + 15) / 16) * 2
}

/// Width in pixels once padded to the plane alignment
#[must_use]
pub const fn padded_width(width: usize) -> usize {
    (width + 15) & !15
}

/// One scanline split into bitplanes
///
/// Holds `depth` plane rows back to back, optionally followed by a mask plane.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PlaneRows {
    depth: u8,
    plane_width: usize,
    planes: Vec<u8>,
    mask: Option<Vec<u8>>,
}

impl PlaneRows {
    /// Creates zeroed plane rows for a scanline of `width` pixels
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if `depth` is not in `1..=8`
    pub fn new(width: usize, depth: u8, with_mask: bool) -> Result<Self, Error> {
        if !(1..=8).contains(&depth) {
            return Err(Error::format(format!(
                "{depth} bitplanes are not supported (1-8)"
            )));
        }
        let plane_width = plane_width(width);
        Ok(Self {
            depth,
            plane_width,
            planes: vec![0; plane_width * usize::from(depth)],
            mask: with_mask.then(|| vec![0; plane_width]),
        })
    }

    /// Number of color planes (the mask plane is not counted)
    #[must_use]
    pub const fn depth(&self) -> u8 {
        self.depth
    }

    /// Length of each plane row in bytes
    #[must_use]
    pub const fn plane_width(&self) -> usize {
        self.plane_width
    }

    /// Returns a single color plane row
    #[must_use]
    pub fn plane(&self, plane: u8) -> &[u8] {
        let start = usize::from(plane) * self.plane_width;
        &self.planes[start..start + self.plane_width]
    }

    /// Returns a single color plane row mutably
    pub fn plane_mut(&mut self, plane: u8) -> &mut [u8] {
        let start = usize::from(plane) * self.plane_width;
        &mut self.planes[start..start + self.plane_width]
    }

    /// Returns the mask plane row, if the scanline carries one
    pub fn mask_mut(&mut self) -> Option<&mut [u8]> {
        self.mask.as_deref_mut()
    }

    fn clear(&mut self) {
        self.planes.fill(0);
        if let Some(mask) = self.mask.as_mut() {
            mask.fill(0);
        }
    }
}

/// Splits a chunky row into bitplanes
///
/// Only the low `planes.depth()` bits of each pixel are kept. Pixels between
/// `row.len()` and the padded width come out as index 0.
#[instrument(skip(row, planes), level = "trace")]
pub fn chunky_to_planes(row: &[u8], planes: &mut PlaneRows) {
    planes.clear();
    let max = planes.plane_width * 8;
    for (i, &chunk) in row.iter().enumerate().take(max) {
        let bit = 7 - (i & 7);
        let byte = i >> 3;
        for plane in 0..planes.depth {
            let start = usize::from(plane) * planes.plane_width;
            planes.planes[start + byte] |= ((chunk >> plane) & 1) << bit;
        }
    }
}

/// Merges bitplanes back into a chunky row
///
/// Writes `min(row.len(), padded width)` pixels. A mask plane, if present, is
/// not merged into the pixel values.
#[instrument(skip(planes, row), level = "trace")]
pub fn planes_to_chunky(planes: &PlaneRows, row: &mut [u8]) {
    let max = planes.plane_width * 8;
    for (i, pixel) in row.iter_mut().enumerate().take(max) {
        let sel = 7 - (i & 7);
        let byte = i >> 3;
        *pixel = (0..planes.depth).fold(0, |color, plane| {
            color | (((planes.plane(plane)[byte] >> sel) & 1) << plane)
        });
    }
}
