//! Byte run-length coding: `(count, value)` pairs.

use crate::compat::Vec;
use crate::error::{DecodeError, Result};

/// Expand `input` into `output`, returning the number of bytes written.
///
/// A trailing unpaired byte is ignored.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<usize> {
    let mut written = 0;
    for pair in input.chunks_exact(2) {
        let (count, value) = (pair[0] as usize, pair[1]);
        let end = written + count;
        if end > output.len() {
            return Err(DecodeError::Overflow {
                capacity: output.len(),
            });
        }
        output[written..end].fill(value);
        written = end;
    }
    Ok(written)
}

/// Encode `input` as `(count, value)` pairs with runs of at most 255.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() / 2 + 2);
    let mut iter = input.iter().copied().peekable();
    while let Some(value) = iter.next() {
        let mut count: u8 = 1;
        while count < u8::MAX && iter.peek() == Some(&value) {
            iter.next();
            count += 1;
        }
        out.push(count);
        out.push(value);
    }
    out
}
