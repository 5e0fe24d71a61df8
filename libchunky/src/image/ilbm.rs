//! IFF ILBM (interleaved bitplane) images
use bon::Builder;
use nom::{
    bytes::streaming::{tag, take},
    number::streaming::{be_i16, be_u16, be_u32, u8 as byte},
    sequence::tuple,
    IResult,
};
use strum::FromRepr;
use tracing::{debug, info, instrument, trace};

use crate::{
    error::alloc_pixels,
    image::{
        bitmap::ChunkyImage,
        parse::{copy_available, handle_ires, rgb_triples},
        planar::{chunky_to_planes, padded_width, planes_to_chunky, PlaneRows},
        rle::{pack_row, unpack},
    },
    Error,
};

const ANNOTATION: &[u8] = b"Created with chunky.\0";
/// Size of a `BMHD` chunk body
const BMHD_LEN: usize = 20;

/// How the transparent parts of an ILBM are described
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone, FromRepr)]
#[repr(u8)]
pub enum Masking {
    /// Opaque image
    #[default]
    None = 0,
    /// An extra mask plane follows the color planes of every row
    HasMask = 1,
    /// `transparent_color` marks transparent pixels
    HasTransparentColor = 2,
    /// Lasso
    Lasso = 3,
}

/// Compression applied to the plane rows of a `BODY`
#[derive(Default, Debug, Eq, PartialEq, Copy, Clone, FromRepr)]
#[repr(u8)]
pub enum Compression {
    /// Raw plane rows
    None = 0,
    /// Byte-run RLE, one run sequence per plane row
    #[default]
    ByteRun1 = 1,
}

/// The `BMHD` chunk
#[derive(Builder, Debug, Clone, Copy, Eq, PartialEq)]
#[non_exhaustive]
pub struct BitmapHeader {
    /// raster width in pixels
    pub width: u16,
    /// raster height in pixels
    pub height: u16,
    /// pixel position for this image
    #[builder(default)]
    pub x: i16,
    /// pixel position for this image
    #[builder(default)]
    pub y: i16,
    /// number of source bitplanes
    pub planes: u8,
    /// see [`Masking`]
    #[builder(default)]
    pub masking: Masking,
    /// see [`Compression`]
    #[builder(default)]
    pub compression: Compression,
    /// transparent "color number"
    #[builder(default)]
    pub transparent_color: u16,
    /// pixel aspect, a ratio width : height
    #[builder(default = 44)]
    pub x_aspect: u8,
    /// pixel aspect, a ratio width : height
    #[builder(default = 44)]
    pub y_aspect: u8,
    /// source "page" size in pixels
    pub page_width: i16,
    /// source "page" size in pixels
    pub page_height: i16,
}

impl BitmapHeader {
    fn parse(input: &[u8]) -> IResult<&[u8], (Self, u8, u8)> {
        let (
            input,
            (
                width,
                height,
                x,
                y,
                planes,
                masking,
                compression,
                _pad,
                transparent_color,
                x_aspect,
                y_aspect,
                page_width,
                page_height,
            ),
        ) = tuple((
            be_u16, be_u16, be_i16, be_i16, byte, byte, byte, byte, be_u16, byte, byte, be_i16,
            be_i16,
        ))(input)?;
        let header = Self {
            width,
            height,
            x,
            y,
            planes,
            masking: Masking::from_repr(masking).unwrap_or_default(),
            compression: Compression::from_repr(compression).unwrap_or_default(),
            transparent_color,
            x_aspect,
            y_aspect,
            page_width,
            page_height,
        };
        Ok((input, (header, masking, compression)))
    }

    fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BMHD_LEN);
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&self.x.to_be_bytes());
        out.extend_from_slice(&self.y.to_be_bytes());
        out.extend_from_slice(&[self.planes, self.masking as u8, self.compression as u8, 0]);
        out.extend_from_slice(&self.transparent_color.to_be_bytes());
        out.extend_from_slice(&[self.x_aspect, self.y_aspect]);
        out.extend_from_slice(&self.page_width.to_be_bytes());
        out.extend_from_slice(&self.page_height.to_be_bytes());
        out
    }
}

fn chunk_header(input: &[u8]) -> IResult<&[u8], (&[u8], u32)> {
    tuple((take(4usize), be_u32))(input)
}

/// Reads an ILBM file
///
/// # Errors
///
/// This function will error if the data is not an ILBM, if a chunk runs past the
/// end of the `FORM`, if `BODY` comes before `BMHD`, for unknown compression or
/// masking values, plane counts outside 1-8, or if the body is truncated
#[instrument(skip(data), fields(len = data.len()))]
pub(crate) fn read_ilbm(data: &[u8]) -> Result<ChunkyImage, Error> {
    let (mut input, (_, form_len, _)) = handle_ires(
        |i| tuple((tag(b"FORM".as_slice()), be_u32, tag(b"ILBM".as_slice())))(i),
        data,
    )
    .map_err(|_| Error::format("not an ILBM"))?;
    let form_end = usize::try_from(form_len).unwrap_or(usize::MAX).saturating_add(8);

    let mut pos: usize = 12;
    let mut header = None;
    let mut palette = [[0; 3]; 256];
    let mut hotspot = None;

    let body = loop {
        let (rest, (id, size)) = handle_ires(chunk_header, input)?;
        let size = usize::try_from(size).unwrap_or(usize::MAX);
        pos += 8;
        debug!("{} ({size} bytes)", String::from_utf8_lossy(id));

        if pos.saturating_add(size) > form_end {
            return Err(Error::format(format!(
                "ILBM is incomplete (form length: {form_end}, pos: {pos})"
            )));
        }

        if id == b"BODY" {
            break &rest[..size.min(rest.len())];
        }

        let (rest, chunk) = handle_ires(|i| take(size)(i), rest)?;
        match id {
            b"BMHD" => {
                let (_, (bmhd, masking, compression)) = handle_ires(BitmapHeader::parse, chunk)?;
                if Masking::from_repr(masking).is_none() {
                    return Err(Error::format(format!("unknown masking {masking}")));
                }
                if Compression::from_repr(compression).is_none() {
                    return Err(Error::format(format!("unknown compression {compression}")));
                }
                debug!("BMHD: {bmhd:?}");
                header = Some(bmhd);
            }
            b"CMAP" => {
                let entries = (size / 3).min(256);
                let (_, colors) = handle_ires(rgb_triples(entries), chunk)?;
                palette = [[0; 3]; 256];
                palette[..entries].copy_from_slice(&colors);
            }
            b"ANNO" => {
                info!("{}", String::from_utf8_lossy(chunk).trim_end_matches('\0'));
            }
            b"GRAB" => {
                let (_, grab) = handle_ires(|i| tuple((be_i16, be_i16))(i), chunk)?;
                debug!("GRAB: {grab:?}");
                hotspot = Some(grab);
            }
            _ => {}
        }
        // chunks are padded to an even length
        input = if size & 1 == 1 {
            rest.get(1..).unwrap_or_default()
        } else {
            rest
        };
        pos += size + (size & 1);
    };

    let header = header.ok_or_else(|| Error::format("BODY encountered before BMHD"))?;
    let (width, height) = (usize::from(header.width), usize::from(header.height));
    info!("Dimensions: {width} x {height}");
    if width == 0 || height == 0 {
        return Err(Error::format(format!("ILBM has bad size {width}x{height}")));
    }

    let stride = padded_width(width);
    let transparent = u8::try_from(header.transparent_color).unwrap_or(0);
    let mut pixels = alloc_pixels(stride * height, transparent)?;
    let mut planes = PlaneRows::new(width, header.planes, header.masking == Masking::HasMask)?;

    let mut body = body;
    for (y, row) in pixels.chunks_exact_mut(stride).enumerate() {
        trace!("decoding row {y}");
        for plane in 0..planes.depth() {
            read_plane_row(&mut body, planes.plane_mut(plane), header.compression)?;
        }
        // the mask is read to stay in step with the body, but never applied
        if let Some(mask) = planes.mask_mut() {
            read_plane_row(&mut body, mask, header.compression)?;
        }
        planes_to_chunky(&planes, row);
    }

    let mut image = ChunkyImage::new(width, stride, height, pixels, palette)?;
    image.set_hotspot(hotspot);

    if transparent != 0 {
        debug!("moving transparent color {transparent} to index 0");
        image.swap_transparent(transparent);
        image.palette_mut().swap(0, usize::from(transparent));
    }
    Ok(image)
}

fn read_plane_row(
    body: &mut &[u8],
    dest: &mut [u8],
    compression: Compression,
) -> Result<(), Error> {
    match compression {
        Compression::None => {
            let read = copy_available(body, dest);
            if read < dest.len() {
                return Err(Error::TruncatedInput {
                    deficit: dest.len() - read,
                });
            }
            Ok(())
        }
        Compression::ByteRun1 => unpack(body, dest),
    }
}

fn push_chunk(out: &mut Vec<u8>, id: &[u8; 4], data: &[u8]) -> Result<(), Error> {
    out.extend_from_slice(id);
    out.extend_from_slice(&chunk_len(data.len())?.to_be_bytes());
    out.extend_from_slice(data);
    if data.len() & 1 == 1 {
        out.push(0);
    }
    Ok(())
}

fn chunk_len(len: usize) -> Result<u32, Error> {
    u32::try_from(len).map_err(|_| Error::format("ILBM chunk is larger than 4GiB"))
}

/// Serializes an image as an 8-plane, byte-run compressed ILBM
///
/// # Errors
///
/// This will error if the image is wider or taller than 65535 pixels
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub(crate) fn write_ilbm(image: &ChunkyImage) -> Result<Vec<u8>, Error> {
    let too_large = |_| Error::format("ILBM images are limited to 65535x65535");
    let width = u16::try_from(image.width()).map_err(too_large)?;
    let height = u16::try_from(image.height()).map_err(too_large)?;
    let page = (
        i16::try_from(width).unwrap_or(i16::MAX),
        i16::try_from(height).unwrap_or(i16::MAX),
    );

    let mut out = Vec::new();
    out.extend_from_slice(b"FORM");
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(b"ILBM");

    push_chunk(&mut out, b"ANNO", ANNOTATION)?;
    if let Some((x, y)) = image.hotspot() {
        let grab = [x.to_be_bytes(), y.to_be_bytes()].concat();
        push_chunk(&mut out, b"GRAB", &grab)?;
    }
    let cmap: Vec<u8> = image.palette().iter().flatten().copied().collect();
    push_chunk(&mut out, b"CMAP", &cmap)?;

    let header = BitmapHeader::builder()
        .width(width)
        .height(height)
        .planes(8)
        .masking(Masking::HasTransparentColor)
        .compression(Compression::ByteRun1)
        .page_width(page.0)
        .page_height(page.1)
        .build();
    push_chunk(&mut out, b"BMHD", &header.to_bytes())?;

    out.extend_from_slice(b"BODY");
    let body_len_pos = out.len();
    out.extend_from_slice(&[0; 4]);

    let mut planes = PlaneRows::new(image.width(), 8, false)?;
    for row in image.rows() {
        chunky_to_planes(row, &mut planes);
        for plane in 0..planes.depth() {
            pack_row(planes.plane(plane), &mut out);
        }
    }

    let body_len = chunk_len(out.len() - body_len_pos - 4)?;
    out[body_len_pos..body_len_pos + 4].copy_from_slice(&body_len.to_be_bytes());
    if out.len() & 1 == 1 {
        out.push(0);
    }
    let form_len = chunk_len(out.len() - 8)?;
    out[4..8].copy_from_slice(&form_len.to_be_bytes());
    debug!("wrote {} byte ILBM", out.len());
    Ok(out)
}
