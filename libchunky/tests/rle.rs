mod common;
use common::{noise, runny_noise};
use libchunky::{pack_row, unpack, Error};

const LENGTHS: [usize; 14] = [0, 1, 2, 3, 4, 127, 128, 129, 255, 256, 257, 1000, 2049, 4096];

fn controls(packed: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < packed.len() {
        let control = packed[i];
        out.push(control);
        i += if control < 0x80 {
            usize::from(control) + 2
        } else {
            2
        };
    }
    out
}

#[test]
fn round_trips_every_kind_of_row() -> anyhow::Result<()> {
    for len in LENGTHS {
        for (seed, src) in [
            noise(len, 1),
            runny_noise(len, 2),
            vec![0xAB; len],
            (0..len).map(|i| (i / 2) as u8).collect(),
        ]
        .into_iter()
        .enumerate()
        {
            let mut packed = Vec::new();
            let written = pack_row(&src, &mut packed);
            assert_eq!(written, packed.len(), "len {len}, source {seed}");
            assert!(
                packed.len() <= len + len.div_ceil(128),
                "len {len}, source {seed}: packed to {}",
                packed.len()
            );
            assert!(!controls(&packed).contains(&0x80));

            let mut unpacked = vec![0; len];
            unpack(&mut packed.as_slice(), &mut unpacked)?;
            assert_eq!(unpacked, src, "len {len}, source {seed}");
        }
    }
    Ok(())
}

#[test]
fn pack_appends_and_reports_only_new_bytes() {
    let mut packed = vec![0xEE];
    assert_eq!(pack_row(&[1, 1, 1], &mut packed), 2);
    assert_eq!(packed, [0xEE, 0xFE, 1]);
}

#[test]
fn long_runs_are_split_at_128() {
    let mut packed = Vec::new();
    pack_row(&[9; 200], &mut packed);
    assert_eq!(packed, [0x81, 9, 0xB9, 9]);

    let src: Vec<u8> = (0..130).map(|i| i as u8).collect();
    packed.clear();
    pack_row(&src, &mut packed);
    assert_eq!(packed[0], 0x7F);
    assert_eq!(packed[129], 1);
    assert_eq!(packed.len(), 132);
}

#[test]
fn pairs_inside_a_literal_stay_literal() {
    let mut packed = Vec::new();
    pack_row(&[1, 2, 2, 3], &mut packed);
    assert_eq!(packed, [3, 1, 2, 2, 3]);
}

#[test]
fn nop_control_is_skipped() -> anyhow::Result<()> {
    let mut dest = [0; 3];
    unpack(&mut [0x80u8, 0xFE, 7].as_slice(), &mut dest)?;
    assert_eq!(dest, [7, 7, 7]);
    Ok(())
}

#[test]
fn truncated_stream_reports_exact_deficit() {
    let mut dest = [0; 10];
    let err = unpack(&mut [0xF7u8].as_slice(), &mut dest).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { deficit: 10 }), "{err:?}");

    let mut dest = [0; 4];
    let err = unpack(&mut [3u8, 1, 2].as_slice(), &mut dest).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { deficit: 2 }), "{err:?}");
    assert_eq!(dest[..2], [1, 2]);

    let mut dest = [0; 6];
    let err = unpack(&mut [0xFEu8, 4].as_slice(), &mut dest).unwrap_err();
    assert!(matches!(err, Error::TruncatedInput { deficit: 3 }), "{err:?}");
}

#[test]
fn run_past_destination_is_a_format_error() {
    let mut dest = [0; 4];
    let err = unpack(&mut [0xF7u8, 5].as_slice(), &mut dest).unwrap_err();
    assert!(matches!(err, Error::Format(_)), "{err:?}");
}

#[test]
fn unpack_leaves_trailing_input() -> anyhow::Result<()> {
    let mut input: &[u8] = &[0xFE, 1, 0, 2, 0xFF, 3];
    let mut first = [0; 4];
    unpack(&mut input, &mut first)?;
    assert_eq!(first, [1, 1, 1, 2]);
    assert_eq!(input, [0xFF, 3]);
    Ok(())
}
