use std::path::{Path, PathBuf};

use chunky::{convert_font, convert_format, convert_image, default_output, load_source, Grab};
use libchunky::{ChunkyImage, ImageFormat, ShadingType, DELIMITER};
use mktemp::Temp;

fn gray_palette() -> libchunky::Palette {
    let mut palette = [[0; 3]; 256];
    for (i, color) in (0..=255u8).zip(palette.iter_mut()) {
        *color = [i; 3];
    }
    palette
}

/// Two rows of three 3x4 glyphs, saved as an ILBM
fn write_grid(dir: &Path) -> anyhow::Result<PathBuf> {
    let (width, height) = (13, 11);
    let pixels = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            if x % 4 == 0 || y % 5 == 0 {
                DELIMITER
            } else {
                u8::try_from(1 + x % 3)
                    .unwrap_or(1)
            }
        })
        .collect();
    let path = dir.join("grid.lbm");
    ChunkyImage::new(width, width, height, pixels, gray_palette())?
        .into_file(&path, ImageFormat::Ilbm)?;
    Ok(path)
}

#[test]
fn grab_specs() -> anyhow::Result<()> {
    assert_eq!(
        "0, 12,A".parse::<Grab>()?,
        Grab {
            x: 0,
            y: 12,
            first_char: b'A'
        }
    );
    assert_eq!("1,2,33".parse::<Grab>()?.first_char, 33);
    assert!("1,2".parse::<Grab>().is_err());
    assert!("1,2,AB".parse::<Grab>().is_err());
    assert!("x,2,A".parse::<Grab>().is_err());
    Ok(())
}

#[test]
fn output_defaults_next_to_source() -> anyhow::Result<()> {
    let output = default_output(Path::new("art/title.lbm"), "png")?;
    assert_eq!(output, Path::new("art/title.png"));
    assert!(default_output(Path::new("title.pcx"), "pcx").is_err());
    Ok(())
}

#[test]
fn font_from_grid_file() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();
    let source = write_grid(dir)?;
    let output = dir.join("grid.fon2");

    let grabs = [Grab {
        x: 0,
        y: 0,
        first_char: b'a',
    }];
    assert!(convert_font(&source, &output, false, ShadingType::None, &grabs)?);

    let data = std::fs::read(&output)?;
    assert_eq!(&data[..4], b"FON2");
    assert_eq!(data[4], 4);
    assert_eq!((data[6], data[7]), (b'a', b'f'));
    assert_eq!(data[9], 2);

    // and back into an editable grid
    let png = dir.join("grid.png");
    convert_format(&output, &png, false, ImageFormat::Png)?;
    let grid = ChunkyImage::from_file(&png)?;
    assert!(grid.width() >= 5);
    Ok(())
}

#[test]
fn empty_font_is_not_an_error() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();
    let source = dir.join("blank.bmp");
    ChunkyImage::filled(8, 8, 8, 0, gray_palette())?.into_file(&source, ImageFormat::Bmp)?;

    let output = dir.join("blank.fon2");
    assert!(!convert_font(&source, &output, false, ShadingType::Normal, &[])?);
    assert!(!output.exists());
    Ok(())
}

#[test]
fn crosshair_hotspot_defaults_to_center() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();
    let source = dir.join("xhair.pcx");
    ChunkyImage::filled(9, 9, 5, 3, gray_palette())?.into_file(&source, ImageFormat::Pcx)?;

    let xhair = dir.join("xhair.imgz");
    convert_image(&source, &xhair, false, true)?;
    assert_eq!(ChunkyImage::from_file(&xhair)?.hotspot(), Some((4, 2)));

    let plain = dir.join("plain.imgz");
    convert_image(&source, &plain, false, false)?;
    assert_eq!(ChunkyImage::from_file(&plain)?.hotspot(), Some((0, 0)));
    Ok(())
}

#[test]
fn retrans_swaps_0_and_247() -> anyhow::Result<()> {
    let dir = Temp::new_dir()?;
    let dir: &Path = dir.as_ref();
    let source = dir.join("patch.bmp");
    let pixels = vec![0, 247, 5, 0];
    ChunkyImage::new(4, 4, 1, pixels, gray_palette())?.into_file(&source, ImageFormat::Bmp)?;

    let image = load_source(&source, true)?;
    assert_eq!(image.get_row(0), Some([247, 0, 5, 247].as_slice()));
    Ok(())
}
