use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, ensure, Context, Result};
use libchunky::{
    encode_font, write_file, ChunkyImage, FontBuilder, ImageFormat, ShadingType, RETRANS_COLOR,
};
use tracing::{debug, info, instrument};

/// Where a glyph grid starts in a font source, and the character of its first cell
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Grab {
    pub x: usize,
    pub y: usize,
    pub first_char: u8,
}

impl FromStr for Grab {
    type Err = anyhow::Error;

    /// Parses `X,Y,FIRST`, where `FIRST` is a character code or a single character
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, first] = parts[..] else {
            bail!("expected X,Y,FIRST, got {s:?}");
        };
        let first_char = match first.parse::<u8>() {
            Ok(code) => code,
            Err(_) => match first.as_bytes() {
                &[c] => c,
                _ => bail!("{first:?} is not a character code"),
            },
        };
        Ok(Self {
            x: x.parse().with_context(|| format!("bad x {x:?}"))?,
            y: y.parse().with_context(|| format!("bad y {y:?}"))?,
            first_char,
        })
    }
}

/// Builds `<dir>/<stem>.<extension>` next to `source`
///
/// # Errors
///
/// Errors if `source` has no usable file name, or if the result would
/// overwrite `source`
pub fn default_output(source: &Path, extension: &str) -> Result<PathBuf> {
    let Some(dir) = source.parent() else {
        bail!("Invalid source file");
    };
    let Some(Some(filename)) = source.file_stem().map(|os| os.to_str()) else {
        bail!("Invalid source file");
    };
    let mut output = PathBuf::new();
    output.push(dir);
    output.push(format!("{filename}.{extension}"));
    ensure!(
        output != source,
        "{} would overwrite the source, pass --output",
        output.display()
    );
    info!("output name: {}", output.display());
    Ok(output)
}

/// Reads a source image, optionally swapping colors 0 and 247
#[instrument]
pub fn load_source(source: &Path, retrans: bool) -> Result<ChunkyImage> {
    let mut image = ChunkyImage::from_file(source)?;
    if retrans {
        debug!("swapping colors 0 and {RETRANS_COLOR}");
        image.swap_transparent(RETRANS_COLOR);
    }
    Ok(image)
}

#[instrument]
pub fn convert_confont(source: &Path, output: &Path, retrans: bool) -> Result<()> {
    let image = load_source(source, retrans)?;
    let data = image
        .to_console_font()
        .with_context(|| format!("Could not make a console font from {}", source.display()))?;
    write_file(output, &data)
}

/// Builds a FON2 font from the grids in `source`
///
/// Returns `false` when the source holds no glyphs and nothing was written.
#[instrument]
pub fn convert_font(
    source: &Path,
    output: &Path,
    retrans: bool,
    shading: ShadingType,
    grabs: &[Grab],
) -> Result<bool> {
    let image = load_source(source, retrans)?;
    let mut builder = FontBuilder::new(image);
    builder.set_shading(shading);
    for grab in grabs {
        builder
            .grab(grab.x, grab.y, grab.first_char)
            .with_context(|| format!("Could not grab glyphs at ({}, {})", grab.x, grab.y))?;
    }

    let Some(font) = builder
        .finish()
        .with_context(|| format!("Could not grab glyphs from {}", source.display()))?
    else {
        return Ok(false);
    };
    info!(
        "chars {}..={}, height {}",
        font.first_char(),
        font.last_char(),
        font.height()
    );
    write_file(output, &encode_font(&font))?;
    Ok(true)
}

/// Writes `source` as an IMGZ raw image
///
/// The hotspot is the one stored in the source. Without one, crosshairs are
/// centered and plain images use (0, 0).
#[instrument]
pub fn convert_image(source: &Path, output: &Path, retrans: bool, crosshair: bool) -> Result<()> {
    let image = load_source(source, retrans)?;
    let hotspot = match image.hotspot() {
        Some(hotspot) => hotspot,
        None if crosshair => (
            i16::try_from(image.width() / 2).context("crosshair is too wide")?,
            i16::try_from(image.height() / 2).context("crosshair is too tall")?,
        ),
        None => (0, 0),
    };
    debug!("hotspot: {hotspot:?}");
    let data = image.to_imgz(hotspot)?;
    write_file(output, &data)
}

#[instrument]
pub fn convert_format(
    source: &Path,
    output: &Path,
    retrans: bool,
    format: ImageFormat,
) -> Result<()> {
    let image = load_source(source, retrans)?;
    image.into_file(output, format)?;
    info!("Successfully wrote {format} image to {}", output.display());
    Ok(())
}
