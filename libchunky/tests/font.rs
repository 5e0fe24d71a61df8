mod common;
use common::{cell_grid, gray_palette, image_from_fn, two_glyph_grid};
use libchunky::{
    compact_palette, decode_font, encode_font, extract_glyphs, pack_row, ChunkyImage, Error,
    FontBuilder, FontDescriptor, GlyphRect, GlyphTable, ShadingType, DELIMITER,
};

fn font_from(image: ChunkyImage, first_char: u8) -> anyhow::Result<FontDescriptor> {
    let mut builder = FontBuilder::new(image);
    builder.grab(0, 0, first_char)?;
    builder
        .finish()?
        .ok_or_else(|| anyhow::anyhow!("no glyphs found"))
}

#[test]
fn compaction_orders_used_colors_by_luma() -> anyhow::Result<()> {
    let mut palette = gray_palette();
    palette[40] = [255, 0, 0];
    palette[41] = [0, 255, 0];
    palette[42] = [0, 0, 255];
    let used = [0, 41, 40, 42, 200, 255];
    let mut image = image_from_fn(6, 1, palette, |x, _| used[x])?;

    let compacted = compact_palette(&mut image);
    assert_eq!(compacted.len(), 5);
    assert_eq!(
        compacted.used_colors(),
        [[0, 0, 255], [255, 0, 0], [0, 255, 0], [200, 200, 200]]
    );
    assert_eq!(image.get_row(0), Some([0, 3, 2, 1, 4, 255].as_slice()));
    assert_eq!(image.palette()[1], [0, 0, 255]);
    assert_eq!(compacted.delimiter(), [255, 255, 255]);
    assert_eq!(compacted.substitute(), 4);
    Ok(())
}

#[test]
fn compaction_keeps_index_0_and_sorts_stably() -> anyhow::Result<()> {
    let mut palette = gray_palette();
    palette[0] = [10, 20, 30];
    palette[5] = [50, 50, 50];
    palette[9] = [50, 50, 50];
    let mut image = image_from_fn(2, 2, palette, |x, y| [9, 5][(x + y) % 2])?;

    let compacted = compact_palette(&mut image);
    assert_eq!(compacted.colors()[0], [10, 20, 30]);
    assert_eq!(compacted.len(), 3);
    // equal luma keeps the original order: 5 before 9
    assert_eq!(image.get_row(0), Some([2, 1].as_slice()));
    Ok(())
}

#[test]
fn delimiter_substitute_is_nearest_color() -> anyhow::Result<()> {
    let mut palette = gray_palette();
    palette[255] = [100, 100, 100];
    let mut image = image_from_fn(4, 1, palette, |x, _| [10, 90, 120, 250][x])?;

    let compacted = compact_palette(&mut image);
    // 90 is closer to 100 than 120
    assert_eq!(compacted.substitute(), 2);
    Ok(())
}

#[test]
fn end_to_end_two_glyphs() -> anyhow::Result<()> {
    let mut image = two_glyph_grid()?;
    let compacted = compact_palette(&mut image);
    assert_eq!(compacted.len(), 4);
    assert_eq!(compacted.used_colors(), [[3, 3, 3], [7, 7, 7], [9, 9, 9]]);
    assert_eq!(image.pixel_index(2, 1), Some(1));
    assert_eq!(image.pixel_index(2, 4), Some(2));
    assert_eq!(image.pixel_index(1, 7), Some(3));
    assert_eq!(image.pixel_index(0, 0), Some(DELIMITER));

    let mut table = GlyphTable::new();
    extract_glyphs(&image, &mut table, 0, 0, b'A')?;
    assert_eq!(table.span(), Some((b'A', b'B')));
    assert_eq!(table.height(), 8);
    assert_eq!(table.rect(b'A'), GlyphRect { x: 1, y: 1, width: 5 });
    assert_eq!(table.rect(b'B'), GlyphRect { x: 7, y: 1, width: 6 });

    let font = FontDescriptor::from_grid(&image, &compacted, &table, ShadingType::Normal)?
        .ok_or_else(|| anyhow::anyhow!("no glyphs"))?;
    assert!(!font.is_constant_width());
    let bytes = encode_font(&font);
    assert_eq!(bytes[..12], *b"FON2\x08\x00\x41\x42\x00\x00\x04\x00");
    assert_eq!(bytes[12..16], [5, 0, 6, 0]);
    assert_eq!(bytes[16..28], [0, 0, 0, 3, 3, 3, 7, 7, 7, 9, 9, 9]);
    assert_eq!(bytes[28..31], [255, 255, 255]);
    Ok(())
}

#[test]
fn grabs_a_grid_of_cells() -> anyhow::Result<()> {
    let image = cell_grid(3, 2)?;
    let mut table = GlyphTable::new();
    extract_glyphs(&image, &mut table, 0, 0, b'a')?;

    assert_eq!(table.span(), Some((b'a', b'f')));
    assert_eq!(table.height(), 4);
    let positions = [(1, 1), (5, 1), (9, 1), (1, 6), (5, 6), (9, 6)];
    for (code, (x, y)) in (b'a'..=b'f').zip(positions) {
        assert_eq!(table.rect(code), GlyphRect { x, y, width: 3 });
    }
    assert_eq!(table.rect(b'g').width, 0);
    Ok(())
}

#[test]
fn double_delimiter_is_an_empty_char() -> anyhow::Result<()> {
    // glyph, empty char, glyph
    let image = image_from_fn(10, 6, gray_palette(), |x, y| {
        if y == 0 || y == 5 || [0, 4, 5, 9].contains(&x) {
            DELIMITER
        } else {
            1
        }
    })?;
    let mut table = GlyphTable::new();
    extract_glyphs(&image, &mut table, 0, 0, b'0')?;

    assert_eq!(table.span(), Some((b'0', b'2')));
    assert_eq!(table.rect(b'0'), GlyphRect { x: 1, y: 1, width: 3 });
    assert_eq!(table.rect(b'1').width, 0);
    assert_eq!(table.rect(b'2'), GlyphRect { x: 6, y: 1, width: 3 });
    Ok(())
}

#[test]
fn mismatched_height_is_an_error() -> anyhow::Result<()> {
    let mut image = two_glyph_grid()?;
    for x in 7..=12 {
        image.set_pixel_index(x, 6, DELIMITER);
    }
    let mut table = GlyphTable::new();
    let err = extract_glyphs(&image, &mut table, 0, 0, b'A').unwrap_err();
    assert!(
        matches!(
            err,
            Error::InconsistentHeight {
                glyph: b'B',
                height: 5,
                expected: 8
            }
        ),
        "{err:?}"
    );
    Ok(())
}

#[test]
fn grabs_share_the_font_height() -> anyhow::Result<()> {
    let image = cell_grid(2, 1)?;
    let mut table = GlyphTable::new();
    extract_glyphs(&image, &mut table, 0, 0, b'x')?;
    extract_glyphs(&image, &mut table, 0, 0, b'A')?;
    assert_eq!(table.span(), Some((b'A', b'y')));
    assert_eq!(table.rect(b'B'), table.rect(b'y'));
    Ok(())
}

#[test]
fn chars_past_255_are_out_of_range() -> anyhow::Result<()> {
    let image = cell_grid(3, 1)?;
    let mut table = GlyphTable::new();
    let err = extract_glyphs(&image, &mut table, 0, 0, 254).unwrap_err();
    assert!(matches!(err, Error::OutOfRange { glyph: 256 }), "{err:?}");
    Ok(())
}

#[test]
fn font_round_trips_through_its_grid() -> anyhow::Result<()> {
    let font = font_from(two_glyph_grid()?, b'A')?;
    let bytes = encode_font(&font);

    let grid = decode_font(&bytes)?;
    assert_eq!(grid.palette()[usize::from(DELIMITER)], [255, 255, 255]);
    let again = font_from(grid, b'A')?;

    assert_eq!(again.first_char(), b'A');
    assert_eq!(again.last_char(), b'B');
    assert_eq!(again.width(b'A'), 5);
    assert_eq!(again.width(b'B'), 6);
    assert_eq!(again.glyph(b'A'), font.glyph(b'A'));
    assert_eq!(again.glyph(b'B'), font.glyph(b'B'));
    assert_eq!(encode_font(&again), bytes);
    Ok(())
}

#[test]
fn delimiter_inside_a_glyph_is_substituted() -> anyhow::Result<()> {
    let mut image = two_glyph_grid()?;
    // a stray delimiter pixel that does not end the glyph
    image.set_pixel_index(3, 3, DELIMITER);
    let font = font_from(image, b'A')?;

    let glyph = font.glyph(b'A').unwrap_or_default();
    assert_eq!(glyph.len(), 5 * 8);
    assert!(!glyph.contains(&DELIMITER));
    assert_eq!(glyph[2 * 5 + 2], 3);
    Ok(())
}

#[test]
fn constant_width_fonts_store_one_width() -> anyhow::Result<()> {
    let font = font_from(cell_grid(3, 2)?, b'a')?;
    assert!(font.is_constant_width());
    let bytes = encode_font(&font);
    assert_eq!(bytes[8], 1);
    // header, one width, two colors and the delimiter
    assert_eq!(bytes[12..14], [3, 0]);
    assert_eq!(bytes[14..23], [0, 0, 0, 1, 1, 1, 255, 255, 255]);

    let grid = decode_font(&bytes)?;
    let again = font_from(grid, b'a')?;
    assert_eq!((again.first_char(), again.last_char()), (b'a', b'f'));
    assert!(again.is_constant_width());
    Ok(())
}

/// A constant-width FON2 with two colors, every glyph filled with index 1
fn constant_width_font(width: u16, height: u16, first: u8, last: u8) -> Vec<u8> {
    let mut data = b"FON2".to_vec();
    data.extend_from_slice(&height.to_le_bytes());
    data.extend_from_slice(&[first, last, 1, 0, 2, 0]);
    data.extend_from_slice(&width.to_le_bytes());
    data.extend_from_slice(&[0, 0, 0, 9, 9, 9, 255, 255, 255]);
    let glyph = vec![1; usize::from(width) * usize::from(height)];
    for _ in first..=last {
        pack_row(&glyph, &mut data);
    }
    data
}

#[test]
fn full_rows_leave_the_last_column_clear() -> anyhow::Result<()> {
    // 25 glyphs of 4x6 lay out on a 31 pixel wide canvas, 5 to a row
    let data = constant_width_font(4, 6, 33, 57);
    let grid = decode_font(&data)?;
    assert_eq!(grid.width(), 31);
    assert!((0..grid.height()).all(|y| grid.pixel_index(30, y) != Some(DELIMITER)));

    let font = font_from(grid, 33)?;
    assert_eq!((font.first_char(), font.last_char()), (33, 57));
    assert!(font.is_constant_width());
    assert!((33..=57).all(|code| font.width(code) == 4));
    assert_eq!(encode_font(&font), data);
    Ok(())
}

#[test]
fn huge_glyphs_in_a_short_font_are_truncated() {
    // one 65535x65535 glyph and no pixel data at all
    let mut data = b"FON2\xFF\xFF\x41\x41\x01\x00\x00\x00".to_vec();
    data.extend_from_slice(&[0xFF, 0xFF, 255, 255, 255]);
    assert_eq!(data.len(), 17);

    let err = decode_font(&data).unwrap_err();
    assert!(
        matches!(err, Error::TruncatedInput { deficit } if deficit == 65_535 * 65_535),
        "{err:?}"
    );
}

#[test]
fn truncated_font_is_reported() -> anyhow::Result<()> {
    let font = font_from(two_glyph_grid()?, b'A')?;
    let bytes = encode_font(&font);

    for len in [3, 11, 14, 20, 30, bytes.len() - 1] {
        let err = decode_font(&bytes[..len]).unwrap_err();
        assert!(
            matches!(err, Error::TruncatedInput { deficit } if deficit > 0),
            "len {len}: {err:?}"
        );
    }
    Ok(())
}

#[test]
fn empty_source_makes_no_font() -> anyhow::Result<()> {
    let image = image_from_fn(8, 8, gray_palette(), |_, _| 0)?;
    let builder = FontBuilder::new(image);
    assert!(builder.finish()?.is_none());
    Ok(())
}

#[test]
fn finish_grabs_from_space_by_default() -> anyhow::Result<()> {
    let mut builder = FontBuilder::new(cell_grid(2, 1)?);
    builder.set_shading(ShadingType::Console);
    let font = builder
        .finish()?
        .ok_or_else(|| anyhow::anyhow!("no glyphs"))?;
    assert_eq!((font.first_char(), font.last_char()), (b' ', b'!'));
    assert_eq!(font.shading(), ShadingType::Console);
    assert_eq!(encode_font(&font)[9], 1);
    Ok(())
}

#[test]
fn shading_parses_from_names() -> anyhow::Result<()> {
    assert_eq!("console".parse::<ShadingType>()?, ShadingType::Console);
    assert_eq!("None".parse::<ShadingType>()?, ShadingType::None);
    assert_eq!(ShadingType::Normal.to_string(), "normal");
    Ok(())
}
