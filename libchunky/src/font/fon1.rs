//! FON1 console fonts: 256 equally sized cells taken from a 16x16 grid
use nom::{bytes::streaming::tag, number::streaming::le_u16, sequence::tuple};
use tracing::{debug, info, instrument};

use crate::{
    error::alloc_pixels,
    image::{
        bitmap::ChunkyImage,
        parse::handle_ires,
        rle::{max_unpacked_len, pack_row, unpack},
    },
    Error,
};

/// Serializes an image as a console font
///
/// The image is split into a 16x16 grid of cells, character `i` being the cell
/// at column `i % 16` and row `i / 16`. Leftover pixels on the right and bottom
/// edges are ignored.
///
/// # Errors
///
/// Returns [`Error::Format`] if the image is smaller than 16x16 pixels or its
/// cells are larger than 65535 pixels on a side
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn write_console_font(image: &ChunkyImage) -> Result<Vec<u8>, Error> {
    let (cell_width, cell_height) = (image.width() / 16, image.height() / 16);
    if cell_width == 0 || cell_height == 0 {
        return Err(Error::format(format!(
            "{}x{} is too small for a console font",
            image.width(),
            image.height()
        )));
    }
    let too_large = |_| Error::format("console font cells are limited to 65535x65535");
    info!("Cell size: {cell_width} x {cell_height}");

    let mut out = Vec::new();
    out.extend_from_slice(b"FON1");
    out.extend_from_slice(&u16::try_from(cell_width).map_err(too_large)?.to_le_bytes());
    out.extend_from_slice(&u16::try_from(cell_height).map_err(too_large)?.to_le_bytes());

    let mut cell = alloc_pixels(cell_width * cell_height, 0)?;
    for code in 0..256 {
        let (left, top) = ((code & 15) * cell_width, (code >> 4) * cell_height);
        for (row, dest) in cell.chunks_exact_mut(cell_width).enumerate() {
            if let Some(src) = image.get_row(top + row) {
                dest.copy_from_slice(&src[left..left + cell_width]);
            }
        }
        pack_row(&cell, &mut out);
    }
    debug!("wrote {} byte console font", out.len());
    Ok(out)
}

/// Reads a console font back into its 16x16 grid
///
/// # Errors
///
/// Returns [`Error::Format`] if a cell dimension is 0, or
/// [`Error::TruncatedInput`] if the cells are cut short (checked against the
/// declared size before anything is allocated)
#[instrument(skip(data), fields(len = data.len()))]
pub(crate) fn read_console_font(data: &[u8]) -> Result<ChunkyImage, Error> {
    let (mut input, (_, cell_width, cell_height)) =
        handle_ires(|i| tuple((tag(b"FON1".as_slice()), le_u16, le_u16))(i), data)?;
    if cell_width == 0 || cell_height == 0 {
        return Err(Error::format("not a valid console font"));
    }
    let (cell_width, cell_height) = (usize::from(cell_width), usize::from(cell_height));
    let pixels = cell_width.saturating_mul(cell_height).saturating_mul(256);
    let limit = max_unpacked_len(input.len());
    if pixels > limit {
        return Err(Error::TruncatedInput {
            deficit: pixels - limit,
        });
    }
    let width = cell_width * 16;
    info!("Dimensions: {width} x {}", cell_height * 16);

    // console fonts have no palette: blue background, gray ramp for the rest
    let mut palette = [[0, 0, 255]; 256];
    for (i, color) in (1..=255u8).zip(palette.iter_mut().skip(1)) {
        *color = [i; 3];
    }

    let mut grid = ChunkyImage::filled(width, width, cell_height * 16, 0, palette)?;
    let mut cell = alloc_pixels(cell_width * cell_height, 0)?;
    for code in 0..256 {
        unpack(&mut input, &mut cell)?;
        let (left, top) = ((code & 15) * cell_width, (code >> 4) * cell_height);
        for (row, src) in cell.chunks_exact(cell_width).enumerate() {
            if let Some(dest) = grid.get_row_mut(top + row) {
                dest[left..left + cell_width].copy_from_slice(src);
            }
        }
    }
    Ok(grid)
}
