//! 256-color PCX images
use nom::{
    bytes::streaming::take,
    number::streaming::{le_u16, u8 as byte},
    sequence::tuple,
};
use tracing::{info, instrument};

use crate::{
    error::alloc_pixels,
    image::{bitmap::ChunkyImage, parse::handle_ires},
    Error,
};

const HEADER_LEN: usize = 128;
const PALETTE_MARKER: u8 = 12;
const RUN_MARKER: u8 = 0xC0;
const MAX_RUN: usize = 63;

/// Reads an 8-bit, single plane PCX file
///
/// # Errors
///
/// This function errors if the data is not a 256-color PCX or the pixel data is
/// truncated
#[instrument(skip(data), fields(len = data.len()))]
pub(crate) fn read_pcx(data: &[u8]) -> Result<ChunkyImage, Error> {
    let (_, (manufacturer, version, encoding, bits_per_pixel, xmin, ymin, xmax, ymax)) =
        handle_ires(
            |i| tuple((byte, byte, byte, byte, le_u16, le_u16, le_u16, le_u16))(i),
            data,
        )?;
    if manufacturer != 10 || encoding != 1 {
        return Err(Error::format("not a pcx file"));
    }
    let (_, (color_planes, bytes_per_line)) = handle_ires(
        |i| {
            let (i, _) = take(65usize)(i)?;
            tuple((byte, le_u16))(i)
        },
        data,
    )?;
    if version != 5 || bits_per_pixel != 8 || color_planes != 1 {
        return Err(Error::format("pcx file is not 256-color"));
    }

    let width = usize::from(xmax.wrapping_sub(xmin)) + 1;
    let height = usize::from(ymax.wrapping_sub(ymin)) + 1;
    let stride = usize::from(bytes_per_line);
    info!("Dimensions: {width} x {height}");
    if stride < width {
        return Err(Error::format(format!(
            "pcx line of {stride} bytes is shorter than width {width}"
        )));
    }

    let size = stride * height;
    let mut pixels = alloc_pixels(size, 0)?;
    let encoded = data.get(HEADER_LEN..).unwrap_or_default();
    let mut pos = 0;

    // uncompressed files are recognised by their exact size
    if data.len() == HEADER_LEN + size + 769 {
        pixels.copy_from_slice(&encoded[..size]);
        pos = size;
    } else {
        let mut x = 0;
        while x < size {
            let deficit = || Error::TruncatedInput { deficit: size - x };
            let c = *encoded.get(pos).ok_or_else(deficit)?;
            pos += 1;
            if c & RUN_MARKER == RUN_MARKER {
                let run = usize::from(c & 0x3F);
                let value = *encoded.get(pos).ok_or_else(deficit)?;
                pos += 1;
                let end = (x + run).min(size);
                pixels[x..end].fill(value);
                x += run;
            } else {
                pixels[x] = c;
                x += 1;
            }
        }
    }

    let mut palette = [[0; 3]; 256];
    match encoded.get(pos..) {
        Some([PALETTE_MARKER, colors @ ..]) if colors.len() >= 768 => {
            for (color, rgb) in palette.iter_mut().zip(colors.chunks_exact(3)) {
                *color = [rgb[0], rgb[1], rgb[2]];
            }
        }
        _ => {
            for (i, color) in (0..=255u8).zip(palette.iter_mut()) {
                *color = [i; 3];
            }
        }
    }

    ChunkyImage::new(width, stride, height, pixels, palette)
}

fn push_run(out: &mut Vec<u8>, mut run: usize, color: u8) {
    if run > 1 || color >= RUN_MARKER {
        while run > MAX_RUN {
            out.extend_from_slice(&[0xFF, color]);
            run -= MAX_RUN;
        }
        if run > 0 {
            out.push(RUN_MARKER | u8::try_from(run).unwrap_or(0));
        }
    }
    if run > 0 {
        out.push(color);
    }
}

/// Serializes an image as a run-length encoded 256-color PCX
///
/// # Errors
///
/// This will error if the image is empty or larger than 65535x65535
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub(crate) fn write_pcx(image: &ChunkyImage) -> Result<Vec<u8>, Error> {
    let too_large = || Error::format("pcx images must be between 1x1 and 65535x65535");
    let xmax = image
        .width()
        .checked_sub(1)
        .and_then(|w| u16::try_from(w).ok())
        .ok_or_else(too_large)?;
    let ymax = image
        .height()
        .checked_sub(1)
        .and_then(|h| u16::try_from(h).ok())
        .ok_or_else(too_large)?;
    let bytes_per_line =
        u16::try_from(image.width() + (image.width() & 1)).map_err(|_| too_large())?;

    let mut out = Vec::with_capacity(HEADER_LEN + image.width() * image.height() + 769);
    out.extend_from_slice(&[10, 5, 1, 8]);
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&xmax.to_le_bytes());
    out.extend_from_slice(&ymax.to_le_bytes());
    out.extend_from_slice(&75u16.to_le_bytes());
    out.extend_from_slice(&75u16.to_le_bytes());
    out.extend_from_slice(&[0; 48]);
    // reserved, one color plane
    out.extend_from_slice(&[0, 1]);
    out.extend_from_slice(&bytes_per_line.to_le_bytes());
    // palette type: not greyscale
    out.extend_from_slice(&1u16.to_le_bytes());
    out.resize(HEADER_LEN, 0);

    for row in image.rows() {
        let mut color = row[0];
        let mut run = 1;
        for &p in &row[1..] {
            if p == color {
                run += 1;
            } else {
                push_run(&mut out, run, color);
                color = p;
                run = 1;
            }
        }
        push_run(&mut out, run, color);
        if image.width() & 1 == 1 {
            out.push(0);
        }
    }

    out.push(PALETTE_MARKER);
    out.extend(image.palette().iter().flatten());
    Ok(out)
}
