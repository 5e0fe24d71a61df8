//! PNG bridge through the [`image`] crate
use std::collections::HashMap;

use ::image::{codecs::png::PngEncoder, ImageEncoder};
use tracing::{debug, instrument};

use crate::{error::alloc_pixels, image::bitmap::ChunkyImage, Error};

/// Decodes a PNG and palettizes it by unique color, in first-seen order
///
/// # Errors
///
/// This function errors if the data cannot be decoded or uses more than 256
/// distinct colors
#[instrument(skip(data), fields(len = data.len()))]
pub(crate) fn read_png(data: &[u8]) -> Result<ChunkyImage, Error> {
    let img = ::image::load_from_memory(data)?.into_rgb8();
    let (width, height) = (img.width() as usize, img.height() as usize);

    let mut pixels = alloc_pixels(width * height, 0)?;
    let mut palette = [[0; 3]; 256];
    let mut map: HashMap<[u8; 3], u8> = HashMap::new();
    for (p, rgb) in pixels.iter_mut().zip(img.pixels()) {
        let i = match map.get(&rgb.0) {
            Some(&i) => i,
            None => {
                let i = u8::try_from(map.len())
                    .map_err(|_| Error::format("png has more than 256 colors"))?;
                map.insert(rgb.0, i);
                palette[usize::from(i)] = rgb.0;
                i
            }
        };
        *p = i;
    }
    debug!("Read {} unique colors from png", map.len());

    ChunkyImage::new(width, width, height, pixels, palette)
}

/// Applies the palette and encodes an RGB8 PNG
///
/// # Errors
///
/// This will error if the encoder rejects the image
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub(crate) fn write_png(image: &ChunkyImage) -> Result<Vec<u8>, Error> {
    let as_rgb: Vec<_> = image.as_palette_iter().flatten().collect();
    debug!("Length of RGB data: {}", as_rgb.len());

    let too_large = |_| Error::format("image is too large for png");
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    encoder.write_image(
        &as_rgb,
        u32::try_from(image.width()).map_err(too_large)?,
        u32::try_from(image.height()).map_err(too_large)?,
        ::image::ExtendedColorType::Rgb8,
    )?;
    Ok(out)
}
