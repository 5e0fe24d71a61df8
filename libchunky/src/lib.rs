//! # libchunky
//!
//!
//! This library converts between 8-bit palettized ("chunky") images and the legacy formats used
//! by old game engines: IFF ILBM bitplane images, IMGZ raw images, Doom patches, and the FON1
//! (console) and FON2 (proportional) bitmap font containers. PCX, BMP and PNG are supported as
//! interchange formats.
//!
//! Every format is read into a [`ChunkyImage`]: one byte per pixel, a 256 entry palette, and an
//! optional hotspot. Index 0 is the transparent color, and in font sources index 255
//! ([`DELIMITER`]) draws the grid lines around the glyphs.
//!
//! ### Usage
//!
//! #### Converting an image
//!
//! Reading picks the right decoder by file extension or magic number; writing is a
//! [`ImageFormat`] away.
//!
//! ```rust,no_run
//! use libchunky::{ChunkyImage, ImageFormat};
//!
//! fn main() -> anyhow::Result<()> {
//!     let image = ChunkyImage::from_file("TITLEPIC.lmp")?;
//!     image.into_file("titlepic.png", ImageFormat::Png)?;
//!     Ok(())
//! }
//! ```
//!
//! #### Building a font
//!
//! A font source is an image with every glyph boxed in by the delimiter color. [`FontBuilder`]
//! compacts the palette, grabs the glyph grids and produces a [`FontDescriptor`], which
//! [`encode_font`] turns into a FON2 file.
//!
//! ```rust,no_run
//! use libchunky::{encode_font, ChunkyImage, FontBuilder, ShadingType};
//!
//! fn main() -> anyhow::Result<()> {
//!     let source = ChunkyImage::from_file("bigfont.lbm")?;
//!     let mut builder = FontBuilder::new(source);
//!     builder.grab(0, 0, b'!')?.set_shading(ShadingType::Normal);
//!
//!     match builder.finish()? {
//!         Some(font) => std::fs::write("bigfont.fon2", encode_font(&font))?,
//!         None => println!("nothing to save"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Decoding a FON2 file ([`decode_font`]) lays the glyphs back out as a grid image that can be
//! edited and grabbed again.
//!
//! #### Unstable API
//!
//! This crate is still very much a work-in-progress. Expect breaking changes between minor
//! releases until`v1.0`. The header types in [`image::raw`] carry the `#[non_exhaustive]`
//! attribute and implement the builder pattern.
//!
//!

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

mod error;
/// Module containing the font pipeline
mod font;
/// Module containing [`ChunkyImage`] and the image formats
pub mod image;

pub use error::Error;
pub use font::{
    fon1::write_console_font,
    fon2::{decode_font, encode_font, FontDescriptor},
    grab::{extract_glyphs, GlyphRect, GlyphTable},
    palette::{compact_palette, CompactedPalette},
    FontBuilder, ShadingType,
};
pub use image::bitmap::ChunkyImage;
pub use image::patch::DOOM_PALETTE;
pub use image::planar::{chunky_to_planes, plane_width, planes_to_chunky, PlaneRows};
pub use image::rle::{pack_row, unpack};
pub use image::{write_file, ImageFormat, Palette, Rgb};

/// Palette index of the lines separating glyphs in a font source
pub const DELIMITER: u8 = 255;
/// Palette index that `-0` style retransparency swaps with index 0
pub const RETRANS_COLOR: u8 = 247;
