mod common;
use common::noise;
use libchunky::{chunky_to_planes, plane_width, planes_to_chunky, PlaneRows};

#[test]
fn round_trips_odd_widths() -> anyhow::Result<()> {
    for width in [1, 15, 16, 17, 160] {
        let row = noise(width, 7);
        let mut planes = PlaneRows::new(width, 8, false)?;
        assert_eq!(planes.plane_width(), plane_width(width));

        chunky_to_planes(&row, &mut planes);
        let mut back = vec![0; width];
        planes_to_chunky(&planes, &mut back);
        assert_eq!(back, row, "width {width}");
    }
    Ok(())
}

#[test]
fn plane_rows_are_padded_to_16_pixels() {
    assert_eq!(plane_width(1), 2);
    assert_eq!(plane_width(16), 2);
    assert_eq!(plane_width(17), 4);
    assert_eq!(plane_width(160), 20);
}

#[test]
fn bits_are_msb_first() -> anyhow::Result<()> {
    let mut planes = PlaneRows::new(9, 8, false)?;
    let mut row = [0; 9];
    row[0] = 0b0000_0001;
    row[8] = 0b1000_0010;
    chunky_to_planes(&row, &mut planes);

    assert_eq!(planes.plane(0), [0x80, 0]);
    assert_eq!(planes.plane(1), [0, 0x80]);
    assert_eq!(planes.plane(7), [0, 0x80]);
    for plane in 2..7 {
        assert_eq!(planes.plane(plane), [0, 0]);
    }
    Ok(())
}

#[test]
fn padding_pixels_decode_as_zero() -> anyhow::Result<()> {
    let row = [0xFF; 17];
    let mut planes = PlaneRows::new(17, 8, false)?;
    chunky_to_planes(&row, &mut planes);

    let mut padded = [0xAA; 32];
    planes_to_chunky(&planes, &mut padded);
    assert_eq!(padded[..17], row);
    assert!(padded[17..].iter().all(|&p| p == 0));
    Ok(())
}

#[test]
fn shallow_images_keep_low_bits() -> anyhow::Result<()> {
    let row: Vec<u8> = (0..32).collect();
    let mut planes = PlaneRows::new(row.len(), 4, false)?;
    chunky_to_planes(&row, &mut planes);

    let mut back = vec![0; row.len()];
    planes_to_chunky(&planes, &mut back);
    let expected: Vec<u8> = row.iter().map(|p| p & 0x0F).collect();
    assert_eq!(back, expected);
    Ok(())
}

#[test]
fn mask_plane_is_not_merged() -> anyhow::Result<()> {
    let row = noise(40, 3);
    let mut planes = PlaneRows::new(row.len(), 8, true)?;
    chunky_to_planes(&row, &mut planes);
    if let Some(mask) = planes.mask_mut() {
        mask.fill(0xFF);
    }

    let mut back = vec![0; row.len()];
    planes_to_chunky(&planes, &mut back);
    assert_eq!(back, row);
    Ok(())
}

#[test]
fn depth_outside_1_to_8_is_rejected() {
    assert!(PlaneRows::new(16, 0, false).is_err());
    assert!(PlaneRows::new(16, 9, false).is_err());
}
