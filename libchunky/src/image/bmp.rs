//! Uncompressed 8-bit Windows bitmaps
use nom::{
    bytes::streaming::{tag, take},
    number::streaming::{le_i32, le_u16, le_u32},
    sequence::tuple,
};
use tracing::{info, instrument, warn};

use crate::{
    error::alloc_pixels,
    image::{bitmap::ChunkyImage, parse::handle_ires},
    Error,
};

const FILE_HEADER_LEN: usize = 14;
const INFO_HEADER_LEN: u32 = 40;
const PIXELS_PER_METRE: u32 = 5039;

const fn padded_row(width: usize) -> usize {
    (width + 3) & !3
}

/// Reads an uncompressed 8-bit BMP
///
/// # Errors
///
/// This function errors if the data is not a BMP, is not 8 bits per pixel with a
/// single plane, is compressed, or the pixel rows are truncated
#[instrument(skip(data), fields(len = data.len()))]
pub(crate) fn read_bmp(data: &[u8]) -> Result<ChunkyImage, Error> {
    let (_, (_, _size, _reserved, pixel_offset)) = handle_ires(
        |i| tuple((tag(b"BM".as_slice()), le_u32, le_u32, le_u32))(i),
        data,
    )
    .map_err(|_| Error::format("not a bmp file"))?;
    let (_, (info_len, width, height, planes, bit_count, compression, _, _, _, colors_used)) =
        handle_ires(
            |i| {
                let (i, _) = take(FILE_HEADER_LEN)(i)?;
                tuple((
                    le_u32, le_i32, le_i32, le_u16, le_u16, le_u32, le_u32, le_u32, le_u32, le_u32,
                ))(i)
            },
            data,
        )
        .map_err(|_| Error::format("bmp is missing BITMAPINFOHEADER"))?;

    if planes != 1 {
        return Err(Error::format(format!("bmp has {planes} planes (should be 1)")));
    }
    if bit_count != 8 {
        return Err(Error::format("bmp is not 8 bit"));
    }
    if compression != 0 {
        return Err(Error::format("bmp must be uncompressed"));
    }

    let width = usize::try_from(width).map_err(|_| Error::format("bmp has negative width"))?;
    let rows = usize::try_from(height.unsigned_abs()).unwrap_or(usize::MAX);
    let stride = padded_row(width);
    info!("Dimensions: {width} x {rows}");
    if width == 0 || rows == 0 {
        return Err(Error::format(format!("bmp has bad size {width}x{rows}")));
    }

    let mut palette = [[0; 3]; 256];
    let entries = match colors_used {
        0 => 256,
        n => usize::try_from(n).unwrap_or(256).min(256),
    };
    let palette_start = FILE_HEADER_LEN + usize::try_from(info_len).unwrap_or(usize::MAX);
    let colors = data.get(palette_start..).unwrap_or_default();
    let available = (colors.len() / 4).min(entries);
    if available < entries {
        warn!("bmp has an incomplete palette ({available} of {entries} entries)");
    }
    for (color, bgrx) in palette.iter_mut().zip(colors.chunks_exact(4)).take(available) {
        *color = [bgrx[2], bgrx[1], bgrx[0]];
    }

    let size = stride * rows;
    let mut pixels = alloc_pixels(size, 0)?;
    let pixel_data = data
        .get(usize::try_from(pixel_offset).unwrap_or(usize::MAX)..)
        .unwrap_or_default();
    if pixel_data.len() < size {
        return Err(Error::TruncatedInput {
            deficit: size - pixel_data.len(),
        });
    }

    for (i, src) in pixel_data.chunks_exact(stride).take(rows).enumerate() {
        // positive heights are stored bottom-up
        let y = if height > 0 { rows - 1 - i } else { i };
        pixels[y * stride..(y + 1) * stride].copy_from_slice(src);
    }

    ChunkyImage::new(width, stride, rows, pixels, palette)
}

/// Serializes an image as a bottom-up, uncompressed 8-bit BMP
///
/// # Errors
///
/// This will error if the image dimensions do not fit the header fields
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub(crate) fn write_bmp(image: &ChunkyImage) -> Result<Vec<u8>, Error> {
    let too_large = |_| Error::format("image is too large for bmp");
    let stride = padded_row(image.width());
    let image_size = u32::try_from(stride * image.height()).map_err(too_large)?;
    let pixel_offset = FILE_HEADER_LEN as u32 + INFO_HEADER_LEN + 1024;

    let mut out = Vec::with_capacity(pixel_offset as usize + stride * image.height());
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(pixel_offset + image_size).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&pixel_offset.to_le_bytes());

    out.extend_from_slice(&INFO_HEADER_LEN.to_le_bytes());
    out.extend_from_slice(&i32::try_from(image.width()).map_err(too_large)?.to_le_bytes());
    out.extend_from_slice(&i32::try_from(image.height()).map_err(too_large)?.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&image_size.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METRE.to_le_bytes());
    out.extend_from_slice(&PIXELS_PER_METRE.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());

    for &[r, g, b] in image.palette() {
        out.extend_from_slice(&[b, g, r, 0]);
    }

    let padding = [0u8; 3];
    let rows: Vec<&[u8]> = image.rows().collect();
    for row in rows.iter().rev() {
        out.extend_from_slice(row);
        out.extend_from_slice(&padding[..stride - row.len()]);
    }
    Ok(out)
}
