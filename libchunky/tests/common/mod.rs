#![allow(dead_code)]

use libchunky::{ChunkyImage, Palette, DELIMITER};

/// Palette where entry `i` is the gray `(i, i, i)`
pub fn gray_palette() -> Palette {
    let mut palette = [[0; 3]; 256];
    for (i, color) in (0..=255u8).zip(palette.iter_mut()) {
        *color = [i; 3];
    }
    palette
}

/// Deterministic noise for codec tests
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (state >> 16) as u8
        })
        .collect()
}

/// Noise with long runs mixed in, so both run kinds get exercised
pub fn runny_noise(len: usize, seed: u32) -> Vec<u8> {
    let source = noise(len, seed);
    let mut out = Vec::with_capacity(len);
    let mut i = 0;
    while out.len() < len {
        let b = source[i % len.max(1)];
        let run = if b & 3 == 0 { usize::from(b) % 300 + 1 } else { 1 };
        out.extend(std::iter::repeat(b).take(run.min(len - out.len())));
        i += 1;
    }
    out
}

/// Builds an image by calling `f(x, y)` for every pixel
pub fn image_from_fn(
    width: usize,
    height: usize,
    palette: Palette,
    f: impl Fn(usize, usize) -> u8,
) -> anyhow::Result<ChunkyImage> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            pixels.push(f(x, y));
        }
    }
    Ok(ChunkyImage::new(width, width, height, pixels, palette)?)
}

pub const GLYPH_A: [[u8; 5]; 8] = [
    [0, 3, 3, 3, 0],
    [3, 0, 0, 0, 3],
    [3, 0, 0, 0, 3],
    [3, 7, 7, 7, 3],
    [3, 0, 0, 0, 3],
    [3, 0, 0, 0, 3],
    [9, 0, 0, 0, 9],
    [0, 0, 0, 0, 0],
];

pub const GLYPH_B: [[u8; 6]; 8] = [
    [7, 7, 7, 7, 0, 0],
    [7, 0, 0, 0, 7, 0],
    [7, 0, 0, 0, 7, 0],
    [7, 9, 9, 9, 0, 0],
    [7, 0, 0, 0, 9, 0],
    [7, 0, 0, 0, 9, 0],
    [7, 3, 3, 3, 0, 0],
    [0, 0, 0, 0, 0, 0],
];

/// A 32x32 font source: glyphs 'A' (5 wide) and 'B' (6 wide), 8 pixels
/// high, boxed by the delimiter in the top-left corner
pub fn two_glyph_grid() -> anyhow::Result<ChunkyImage> {
    image_from_fn(32, 32, gray_palette(), |x, y| match (x, y) {
        (0..=13, 0 | 9) | (0 | 6 | 13, 0..=9) => DELIMITER,
        (1..=5, 1..=8) => GLYPH_A[y - 1][x - 1],
        (7..=12, 1..=8) => GLYPH_B[y - 1][x - 7],
        _ => 0,
    })
}

/// A `columns` x `rows` grid of 3x4 glyphs, every glyph pixel set to `1`
pub fn cell_grid(columns: usize, rows: usize) -> anyhow::Result<ChunkyImage> {
    image_from_fn(columns * 4 + 1, rows * 5 + 1, gray_palette(), |x, y| {
        if x % 4 == 0 || y % 5 == 0 {
            DELIMITER
        } else {
            1
        }
    })
}
