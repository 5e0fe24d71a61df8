#![allow(clippy::module_name_repetitions)]

pub(crate) mod bitmap;
pub(crate) mod bmp;
pub(crate) mod ilbm;
pub(crate) mod imgz;
pub(crate) mod parse;
pub(crate) mod patch;
pub(crate) mod pcx;
pub(crate) mod planar;
pub(crate) mod png;
pub(crate) mod rle;

/// Module containing raw header types
///
/// Types in this module are considered "unchecked", the responsibility
/// of upholding validity is on the user
pub mod raw {
    /// Contains types related to image file headers
    pub mod header {
        pub use crate::font::fon2::FontHeader;
        pub use crate::image::ilbm::{BitmapHeader, Compression, Masking};
        pub use crate::image::imgz::{ImgzCompression, RawImageHeader};
    }
}

use crate::{
    error::Error,
    font::{fon1, fon2},
};
use anyhow::{Context, Result};
use bitmap::ChunkyImage;
use std::{
    ffi::OsStr,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::{debug, info};

/// One palette entry
pub type Rgb = [u8; 3];
/// A full 256 color palette
pub type Palette = [Rgb; 256];

#[derive(Debug, Eq, PartialEq, Copy, Clone, EnumString, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
/// Image formats a [`ChunkyImage`] can be exported to
pub enum ImageFormat {
    /// 256-color PCX
    Pcx,
    /// Uncompressed 8-bit Windows bitmap
    Bmp,
    /// 8-plane IFF ILBM
    Ilbm,
    /// RGB8 PNG
    Png,
}

impl ImageFormat {
    /// The file extension usually given to this format
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pcx => "pcx",
            Self::Bmp => "bmp",
            Self::Ilbm => "lbm",
            Self::Png => "png",
        }
    }
}

impl ChunkyImage {
    /// Reads an image from its file contents, recognised by magic number
    ///
    /// `FORM` is an ILBM, `IMGZ` a raw image, `FON1` a console font and `FON2`
    /// a font (laid out as an editable grid). Anything else is read as a Doom
    /// patch.
    ///
    /// # Errors
    ///
    /// This function will error if the data is not valid for the detected format
    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        match data.get(..4) {
            Some(b"FORM") => ilbm::read_ilbm(data),
            Some(b"IMGZ") => imgz::read_imgz(data),
            Some(b"FON1") => fon1::read_console_font(data),
            Some(b"FON2") => fon2::decode_font(data),
            _ => patch::read_patch(data),
        }
    }

    /// Tries to read [`Self`] from a provided file path
    ///
    /// `.pcx`, `.bmp` and `.png` files are recognised by their extension,
    /// everything else by its contents (see [`Self::from_bytes`]).
    ///
    /// # Errors
    ///
    /// This function will error if the file cannot be read or if the file contains invalid data.
    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self> {
        let path = filename.as_ref();
        let data =
            std::fs::read(path).with_context(|| format!("Could not open {}", path.display()))?;
        debug!("read {} bytes from {}", data.len(), path.display());

        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let image = match extension.as_deref() {
            Some("pcx") => pcx::read_pcx(&data),
            Some("bmp") => bmp::read_bmp(&data),
            Some("png") => png::read_png(&data),
            _ => Self::from_bytes(&data),
        }
        .with_context(|| format!("Could not read {}", path.display()))?;
        info!("Dimensions: {} x {}", image.width(), image.height());
        Ok(image)
    }

    /// Serializes [`Self`] in the given format
    ///
    /// # Errors
    ///
    /// This will error if the image does not fit the limits of the format
    pub fn to_bytes(&self, format: ImageFormat) -> Result<Vec<u8>, Error> {
        match format {
            ImageFormat::Pcx => pcx::write_pcx(self),
            ImageFormat::Bmp => bmp::write_bmp(self),
            ImageFormat::Ilbm => ilbm::write_ilbm(self),
            ImageFormat::Png => png::write_png(self),
        }
    }

    /// Serializes [`Self`] as an IMGZ raw image with the given hotspot
    ///
    /// # Errors
    ///
    /// This will error if the image is wider or taller than 65535 pixels
    pub fn to_imgz(&self, hotspot: (i16, i16)) -> Result<Vec<u8>, Error> {
        imgz::write_imgz(self, hotspot)
    }

    /// Serializes [`Self`] as a FON1 console font
    ///
    /// # Errors
    ///
    /// See [`write_console_font`](crate::write_console_font)
    pub fn to_console_font(&self) -> Result<Vec<u8>, Error> {
        fon1::write_console_font(self)
    }

    /// Attempts to serialize and save [`Self`] as a file at the provided path
    ///
    /// # Errors
    ///
    /// This will error if the image cannot be serialized in `format` or if
    /// unable to open and/or write to the provided filename
    pub fn into_file(self, filename: impl AsRef<Path>, format: ImageFormat) -> Result<()> {
        let data = self
            .to_bytes(format)
            .with_context(|| format!("Could not convert image to {format}"))?;
        write_file(filename, &data)
    }
}

/// Writes `data` to `filename`, replacing any existing file
///
/// # Errors
///
/// This will error if unable to open and/or write to the provided filename
pub fn write_file(filename: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = filename.as_ref();
    let f = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("Could not open {}", path.display()))?;
    let mut f = BufWriter::new(f);
    f.write_all(data).context("Write data to file")?;
    f.flush()?;
    info!("Finished writing {} bytes to {}", data.len(), path.display());
    Ok(())
}
