use nom::{bytes::streaming::take, combinator::map, IResult, Needed};

use crate::{image::Rgb, Error};

/// Runs a nom parser over a binary buffer, translating nom's errors
///
/// Parsers in this crate are the `streaming` variants, so running out of input
/// reports how many bytes were missing.
pub(crate) fn handle_ires<'a, NomFunc, T>(
    f: NomFunc,
    input: &'a [u8],
) -> Result<(&'a [u8], T), Error>
where
    NomFunc: FnOnce(&'a [u8]) -> IResult<&'a [u8], T>,
    T: 'a,
{
    f(input).map_err(|e| match e {
        nom::Err::Incomplete(Needed::Size(n)) => Error::TruncatedInput { deficit: n.get() },
        nom::Err::Incomplete(Needed::Unknown) => Error::TruncatedInput { deficit: 1 },
        nom::Err::Error(e) | nom::Err::Failure(e) => Error::format(format!(
            "{:?} with {} bytes left",
            e.code,
            e.input.len()
        )),
    })
}

/// Parses `n` packed RGB triples
pub(crate) fn rgb_triples(n: usize) -> impl FnMut(&[u8]) -> IResult<&[u8], Vec<Rgb>> {
    move |input| {
        map(take(n * 3), |bytes: &[u8]| {
            bytes
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect()
        })(input)
    }
}

/// Copies up to `dest.len()` bytes from the front of `input`
///
/// Returns the number of bytes copied; fewer than requested means the input
/// ran out.
pub(crate) fn copy_available(input: &mut &[u8], dest: &mut [u8]) -> usize {
    let n = dest.len().min(input.len());
    dest[..n].copy_from_slice(&input[..n]);
    *input = &input[n..];
    n
}
