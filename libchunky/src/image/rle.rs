//! Byte-run RLE ("ByteRun1"), shared by ILBM bodies, IMGZ pixel data and font glyphs.
//!
//! A stream is a sequence of control bytes, each followed by its payload:
//! - `0x00..=0x7F`: copy the next `control + 1` bytes literally
//! - `0x81..=0xFF`: repeat the next byte `257 - control` times
//! - `0x80`: no-op, never emitted by [`pack_row`]
use std::io::{Bytes, Read};
use tracing::{instrument, trace};

use crate::Error;

/// The longest span a single control byte can describe
const MAX_SPAN: usize = 128;
const NOP: u8 = 0x80;

/// Compresses `src` and appends the result to `compressed_buf`.
///
/// Returns the number of bytes appended, so callers can compare the compressed
/// size against the raw size.
#[instrument(skip(src, compressed_buf), fields(len = src.len()), level = "trace")]
pub fn pack_row(src: &[u8], compressed_buf: &mut Vec<u8>) -> usize {
    let start_len = compressed_buf.len();
    // start of the pending literal run
    let mut literal_start = 0;
    let mut i = 0;

    while i < src.len() {
        let run = run_length(&src[i..]);
        // A pair inside a literal run costs the same as two literal bytes,
        // but breaking the literal would cost another control byte.
        if run >= 3 || (run == 2 && i == literal_start) {
            push_literal(compressed_buf, &src[literal_start..i]);
            push_repeat(compressed_buf, run, src[i]);
            i += run;
            literal_start = i;
        } else {
            i += 1;
            if i - literal_start == MAX_SPAN {
                push_literal(compressed_buf, &src[literal_start..i]);
                literal_start = i;
            }
        }
    }
    push_literal(compressed_buf, &src[literal_start..]);

    let packed = compressed_buf.len() - start_len;
    trace!("packed {} bytes into {packed}", src.len());
    packed
}

/// Upper bound on the number of bytes `packed_len` bytes of byte-run data can
/// decompress to: every two input bytes yield at most [`MAX_SPAN`] pixels
#[must_use]
pub(crate) const fn max_unpacked_len(packed_len: usize) -> usize {
    packed_len.saturating_mul(MAX_SPAN / 2)
}

fn run_length(src: &[u8]) -> usize {
    let Some(&first) = src.first() else {
        return 0;
    };
    src.iter()
        .take(MAX_SPAN)
        .take_while(|&&b| b == first)
        .count()
}

fn push_literal(buf_out: &mut Vec<u8>, literal: &[u8]) {
    if literal.is_empty() {
        return;
    }
    debug_assert!(literal.len() <= MAX_SPAN);
    buf_out.push(u8::try_from(literal.len() - 1).unwrap_or(0x7F));
    buf_out.extend_from_slice(literal);
}

fn push_repeat(buf_out: &mut Vec<u8>, run: usize, value: u8) {
    debug_assert!((2..=MAX_SPAN).contains(&run));
    buf_out.push(u8::try_from(257 - run).unwrap_or(NOP + 1));
    buf_out.push(value);
}

/// Decompresses from `stream` until `dest` is full.
///
/// # Errors
///
/// - [`Error::TruncatedInput`] if `stream` ends early. The deficit is the exact
///   number of bytes of `dest` left unfilled; everything before it is valid.
/// - [`Error::Format`] if a run would write past the end of `dest`
/// - [`Error::Io`] if reading from `stream` fails
pub fn unpack(stream: &mut impl Read, dest: &mut [u8]) -> Result<(), Error> {
    let mut stream = stream.bytes();
    let total = dest.len();
    let mut filled = 0;

    while filled < total {
        let Some(control) = next_byte(&mut stream)? else {
            return Err(Error::TruncatedInput {
                deficit: total - filled,
            });
        };
        let count = match control {
            NOP => continue,
            0..=0x7F => usize::from(control) + 1,
            _ => 257 - usize::from(control),
        };
        if filled + count > total {
            return Err(Error::format(format!(
                "run of {count} overruns destination ({} bytes left)",
                total - filled
            )));
        }

        if control < NOP {
            for slot in &mut dest[filled..filled + count] {
                let Some(b) = next_byte(&mut stream)? else {
                    return Err(Error::TruncatedInput {
                        deficit: total - filled,
                    });
                };
                *slot = b;
                filled += 1;
            }
        } else {
            let Some(value) = next_byte(&mut stream)? else {
                return Err(Error::TruncatedInput {
                    deficit: total - filled,
                });
            };
            dest[filled..filled + count].fill(value);
            filled += count;
        }
    }
    Ok(())
}

fn next_byte<R: Read>(stream: &mut Bytes<R>) -> Result<Option<u8>, Error> {
    stream.next().transpose().map_err(Error::from)
}
