use crate::{
    error::{alloc_pixels, Error},
    image::{Palette, Rgb},
};

/// An 8-bit palettized image, one byte per pixel
///
/// Rows are `stride` bytes apart; only the first `width` bytes of each row are
/// part of the picture, the rest is alignment padding.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChunkyImage {
    /// Logical width of the image
    width: usize,
    /// Bytes per row
    stride: usize,
    /// The height of the image
    height: usize,
    /// Image pixels
    pixels: Vec<u8>,
    palette: Palette,
    /// Grab point (Doom "offsets")
    hotspot: Option<(i16, i16)>,
}

impl ChunkyImage {
    /// Creates a new [`ChunkyImage`] from existing pixel data
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if `width > stride` or if `pixels` does not
    /// hold exactly `stride * height` bytes
    pub fn new(
        width: usize,
        stride: usize,
        height: usize,
        pixels: Vec<u8>,
        palette: Palette,
    ) -> Result<Self, Error> {
        if width > stride {
            return Err(Error::format(format!(
                "width {width} is larger than row stride {stride}"
            )));
        }
        if pixels.len() != stride * height {
            return Err(Error::format(format!(
                "{} pixels do not fill {stride}x{height}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            stride,
            height,
            pixels,
            palette,
            hotspot: None,
        })
    }

    /// Creates a [`ChunkyImage`] with every pixel set to `fill`
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the pixel buffer cannot be allocated
    pub fn filled(
        width: usize,
        stride: usize,
        height: usize,
        fill: u8,
        palette: Palette,
    ) -> Result<Self, Error> {
        let stride = stride.max(width);
        let pixels = alloc_pixels(stride * height, fill)?;
        Self::new(width, stride, height, pixels, palette)
    }

    /// Returns the width of the image
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of bytes between the starts of two rows
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the height of the image
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns the whole pixel buffer, padding included
    #[must_use]
    pub fn pixel_indices(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the whole pixel buffer mutably, padding included
    pub fn pixel_indices_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Returns the palette
    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Returns the palette mutably
    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    /// Returns the hotspot, if the source format carried one
    #[must_use]
    pub const fn hotspot(&self) -> Option<(i16, i16)> {
        self.hotspot
    }

    /// Sets the hotspot
    pub fn set_hotspot(&mut self, hotspot: Option<(i16, i16)>) {
        self.hotspot = hotspot;
    }

    /// Returns the palette index at (x, y), or [`None`] outside the image
    #[must_use]
    pub fn pixel_index(&self, x: usize, y: usize) -> Option<u8> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.stride + x])
    }

    /// set the value of a specific pixel
    pub fn set_pixel_index(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            self.pixels[y * self.stride + x] = value;
        }
    }

    /// Returns the visible part of a row
    #[must_use]
    pub fn get_row(&self, y: usize) -> Option<&[u8]> {
        if y < self.height {
            let start_index = y * self.stride;
            Some(&self.pixels[start_index..start_index + self.width])
        } else {
            None
        }
    }

    /// Returns the visible part of a row mutably
    pub fn get_row_mut(&mut self, y: usize) -> Option<&mut [u8]> {
        if y < self.height {
            let start_index = y * self.stride;
            Some(&mut self.pixels[start_index..start_index + self.width])
        } else {
            None
        }
    }

    /// Iterates over the visible rows
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.pixels
            .chunks_exact(self.stride.max(1))
            .take(self.height)
            .map(|row| &row[..self.width])
    }

    /// Swaps pixel values 0 and `color` everywhere in the buffer
    ///
    /// Used for sources whose transparent color is not index 0.
    pub fn swap_transparent(&mut self, color: u8) {
        if color == 0 {
            return;
        }
        for p in &mut self.pixels {
            if *p == 0 {
                *p = color;
            } else if *p == color {
                *p = 0;
            }
        }
    }

    /// Returns an iterator over the palette colors of the visible pixels
    pub fn as_palette_iter(&self) -> impl Iterator<Item = Rgb> + '_ {
        self.rows()
            .flat_map(|row| row.iter().map(|&p| self.palette[usize::from(p)]))
    }
}
