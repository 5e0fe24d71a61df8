//! IMGZ raw images: a little-endian header followed by (optionally compressed) pixels
use bon::Builder;
use nom::{
    bytes::streaming::{tag, take},
    number::streaming::{le_i16, le_u16, u8 as byte},
    sequence::tuple,
    IResult,
};
use strum::FromRepr;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::alloc_pixels,
    image::{
        bitmap::ChunkyImage,
        parse::{copy_available, handle_ires},
        rle::{pack_row, unpack},
    },
    Error,
};

/// Header size on disk
pub(crate) const HEADER_LEN: usize = 24;

/// Pixel data encoding of an IMGZ file
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone, FromRepr)]
#[repr(u8)]
pub enum ImgzCompression {
    /// Raw pixels
    None = 0,
    /// Byte-run RLE, one run sequence per row
    #[default]
    ByteRun1 = 1,
}

/// IMGZ file header
#[derive(Builder, Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub struct RawImageHeader {
    /// Image width
    pub width: u16,
    /// Image height
    pub height: u16,
    /// Horizontal hotspot offset
    #[builder(default)]
    pub left_offset: i16,
    /// Vertical hotspot offset
    #[builder(default)]
    pub top_offset: i16,
    /// Pixel data encoding
    #[builder(default)]
    pub compression: ImgzCompression,
}

impl RawImageHeader {
    fn parse(input: &[u8]) -> IResult<&[u8], (Self, u8)> {
        let (input, (_, width, height, left_offset, top_offset, compression, _reserved)) =
            tuple((
                tag(b"IMGZ".as_slice()),
                le_u16,
                le_u16,
                le_i16,
                le_i16,
                byte,
                take(11usize),
            ))(input)?;
        let header = Self {
            width,
            height,
            left_offset,
            top_offset,
            compression: ImgzCompression::from_repr(compression).unwrap_or_default(),
        };
        Ok((input, (header, compression)))
    }

    fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0; HEADER_LEN];
        out[..4].copy_from_slice(b"IMGZ");
        out[4..6].copy_from_slice(&self.width.to_le_bytes());
        out[6..8].copy_from_slice(&self.height.to_le_bytes());
        out[8..10].copy_from_slice(&self.left_offset.to_le_bytes());
        out[10..12].copy_from_slice(&self.top_offset.to_le_bytes());
        out[12] = self.compression as u8;
        out
    }
}

/// Reads an IMGZ file
///
/// Short pixel data is not an error: the missing bytes are logged and left as 0.
///
/// # Errors
///
/// This function errors if the header is short, the size is 0 or the
/// compression is unknown
#[instrument(skip(data), fields(len = data.len()))]
pub(crate) fn read_imgz(data: &[u8]) -> Result<ChunkyImage, Error> {
    let (mut input, (header, compression)) = handle_ires(RawImageHeader::parse, data)?;
    info!(
        "Dimensions: {} x {}, Origin: ({}, {})",
        header.width, header.height, header.left_offset, header.top_offset
    );
    if header.width == 0 || header.height == 0 {
        return Err(Error::format("IMGZ has bad size"));
    }
    let (width, height) = (usize::from(header.width), usize::from(header.height));
    let wanted = width * height;
    let mut pixels = alloc_pixels(wanted, 0)?;

    let read = match ImgzCompression::from_repr(compression) {
        Some(ImgzCompression::None) => copy_available(&mut input, &mut pixels),
        Some(ImgzCompression::ByteRun1) => match unpack(&mut input, &mut pixels) {
            Ok(()) => wanted,
            Err(Error::TruncatedInput { deficit }) => wanted - deficit,
            Err(e) => return Err(e),
        },
        None => {
            return Err(Error::format(format!(
                "IMGZ has unknown compression {compression}"
            )))
        }
    };
    if read != wanted {
        warn!("Read {read} bytes of pixel data. Wanted {wanted}.");
    }

    // IMGZ carries no palette, so use a white to black ramp
    let mut palette = [[0; 3]; 256];
    for (i, color) in (0..=255u8).zip(palette.iter_mut()) {
        *color = [255 - i; 3];
    }

    let mut image = ChunkyImage::new(width, width, height, pixels, palette)?;
    image.set_hotspot(Some((header.left_offset, header.top_offset)));
    Ok(image)
}

/// Serializes an image as IMGZ with the given hotspot
///
/// Rows are byte-run compressed; when that turns out larger than the raw
/// pixels, the file is stored uncompressed instead.
///
/// # Errors
///
/// This will error if the image is wider or taller than 65535 pixels
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub(crate) fn write_imgz(image: &ChunkyImage, hotspot: (i16, i16)) -> Result<Vec<u8>, Error> {
    let too_large = |_| Error::format("IMGZ images are limited to 65535x65535");
    let header = RawImageHeader::builder()
        .width(u16::try_from(image.width()).map_err(too_large)?)
        .height(u16::try_from(image.height()).map_err(too_large)?)
        .left_offset(hotspot.0)
        .top_offset(hotspot.1)
        .compression(ImgzCompression::ByteRun1)
        .build();

    let raw_size = image.width() * image.height();
    let mut compressed = Vec::new();
    let packed_size: usize = image
        .rows()
        .map(|row| pack_row(row, &mut compressed))
        .sum();

    let mut out = Vec::with_capacity(HEADER_LEN + packed_size.min(raw_size));
    if packed_size > raw_size {
        warn!(
            "compressed to {packed_size} ({} larger than uncompressed), saving uncompressed",
            packed_size - raw_size
        );
        let header = RawImageHeader {
            compression: ImgzCompression::None,
            ..header
        };
        out.extend_from_slice(&header.to_bytes());
        image.rows().for_each(|row| out.extend_from_slice(row));
    } else {
        info!(
            "compressed to {packed_size} ({} smaller than uncompressed)",
            raw_size - packed_size
        );
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&compressed);
    }
    debug!("wrote {} byte IMGZ", out.len());
    Ok(out)
}
