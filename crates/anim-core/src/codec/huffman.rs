//! Huffman stage of split payloads.
//!
//! Layout:
//!
//! ```text
//! u8        padding bits at the end of the bitstream
//! u16 (LE)  dictionary length in bytes
//! [entry]   symbol: u8, code_len: u8, code: ceil(code_len / 8) bytes, MSB first
//! [u8]      bitstream, MSB first
//! ```
//!
//! The decoded output is an RLE stream, not pixels.

use crate::compat::{format, Vec};
use crate::error::{DecodeError, Result};
use alloc::collections::BinaryHeap;
use core::cmp::Reverse;

const NO_CHILD: u32 = 0;

/// Binary decode tree. Node 0 is the root and is never a child, so `0`
/// doubles as the "no child" marker.
struct DecodeTree {
    children: Vec<[u32; 2]>,
    symbols: Vec<Option<u8>>,
}

impl DecodeTree {
    fn new() -> Self {
        Self {
            children: Vec::from([[NO_CHILD; 2]]),
            symbols: Vec::from([None]),
        }
    }

    fn insert(&mut self, symbol: u8, code: &[u8], code_len: usize) -> Result<()> {
        if code_len == 0 {
            return Err(DecodeError::Huffman(format!(
                "zero-length code for symbol {symbol}"
            )));
        }

        let mut node = 0usize;
        for i in 0..code_len {
            if self.symbols[node].is_some() {
                return Err(DecodeError::Huffman(format!(
                    "code for symbol {symbol} extends another code"
                )));
            }
            let bit = bit_at(code, i);
            let next = self.children[node][bit];
            node = if next == NO_CHILD {
                let id = self.children.len();
                self.children.push([NO_CHILD; 2]);
                self.symbols.push(None);
                self.children[node][bit] = id as u32;
                id
            } else {
                next as usize
            };
        }

        if self.symbols[node].is_some() || self.children[node] != [NO_CHILD; 2] {
            return Err(DecodeError::Huffman(format!(
                "code for symbol {symbol} collides with another code"
            )));
        }
        self.symbols[node] = Some(symbol);
        Ok(())
    }
}

#[inline]
fn bit_at(bytes: &[u8], index: usize) -> usize {
    ((bytes[index / 8] >> (7 - (index % 8))) & 1) as usize
}

/// Decode a Huffman payload (without the encoding tag) into `output`.
///
/// Returns the number of bytes written.
pub fn decode(input: &[u8], output: &mut [u8]) -> Result<usize> {
    if input.len() < 3 {
        return Err(DecodeError::Truncated {
            needed: 3,
            available: input.len(),
        });
    }

    let padding = input[0] as usize;
    if padding > 7 {
        return Err(DecodeError::Huffman(format!("padding {padding} > 7")));
    }
    let dict_len = u16::from_le_bytes([input[1], input[2]]) as usize;
    let dict_end = 3 + dict_len;
    if input.len() < dict_end {
        return Err(DecodeError::Truncated {
            needed: dict_end,
            available: input.len(),
        });
    }

    let tree = parse_dictionary(&input[3..dict_end])?;
    let stream = &input[dict_end..];
    let total_bits = (stream.len() * 8).saturating_sub(padding);

    let mut written = 0;
    let mut node = 0usize;
    for i in 0..total_bits {
        let next = tree.children[node][bit_at(stream, i)];
        if next == NO_CHILD {
            return Err(DecodeError::Huffman(format!("invalid code at bit {i}")));
        }
        node = next as usize;

        if let Some(symbol) = tree.symbols[node] {
            if written >= output.len() {
                return Err(DecodeError::Overflow {
                    capacity: output.len(),
                });
            }
            output[written] = symbol;
            written += 1;
            node = 0;
        }
    }

    if node != 0 {
        return Err(DecodeError::Huffman("bitstream ends mid-code".into()));
    }
    Ok(written)
}

fn parse_dictionary(dict: &[u8]) -> Result<DecodeTree> {
    let mut tree = DecodeTree::new();
    let mut pos = 0;
    while pos < dict.len() {
        if pos + 2 > dict.len() {
            return Err(DecodeError::Huffman("dictionary entry truncated".into()));
        }
        let symbol = dict[pos];
        let code_len = dict[pos + 1] as usize;
        let code_bytes = code_len.div_ceil(8);
        let start = pos + 2;
        let end = start + code_bytes;
        if end > dict.len() {
            return Err(DecodeError::Huffman(format!(
                "code for symbol {symbol} truncated"
            )));
        }
        tree.insert(symbol, &dict[start..end], code_len)?;
        pos = end;
    }
    Ok(tree)
}

/// Build a Huffman payload (without the encoding tag) for `input`.
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut freq = [0u64; 256];
    for &b in input {
        freq[b as usize] += 1;
    }
    let codes = build_codes(&freq);

    let mut dict = Vec::new();
    for (symbol, code) in codes.iter().enumerate() {
        if let Some((bits, len)) = code {
            dict.push(symbol as u8);
            dict.push(*len);
            let mut packed = Vec::new();
            push_bits(&mut packed, &mut 0, *bits, *len);
            dict.extend_from_slice(&packed);
        }
    }

    let mut stream = Vec::new();
    let mut bit_len = 0usize;
    for &b in input {
        if let Some((bits, len)) = codes[b as usize] {
            push_bits(&mut stream, &mut bit_len, bits, len);
        }
    }
    let padding = (stream.len() * 8 - bit_len) as u8;

    let mut out = Vec::with_capacity(3 + dict.len() + stream.len());
    out.push(padding);
    out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    out.extend_from_slice(&dict);
    out.extend_from_slice(&stream);
    out
}

fn push_bits(out: &mut Vec<u8>, bit_len: &mut usize, bits: u64, len: u8) {
    for i in (0..len).rev() {
        if *bit_len % 8 == 0 {
            out.push(0);
        }
        if (bits >> i) & 1 == 1 {
            let last = out.len() - 1;
            out[last] |= 1 << (7 - (*bit_len % 8));
        }
        *bit_len += 1;
    }
}

/// Code (value, length) per symbol; value's low `length` bits are the code.
fn build_codes(freq: &[u64; 256]) -> [Option<(u64, u8)>; 256] {
    let mut codes = [None; 256];

    // Node: (left, right) for internal nodes, symbol for leaves.
    let mut nodes: Vec<(Option<(usize, usize)>, u8)> = Vec::new();
    let mut heap = BinaryHeap::new();
    for (symbol, &count) in freq.iter().enumerate() {
        if count > 0 {
            heap.push(Reverse((count, nodes.len())));
            nodes.push((None, symbol as u8));
        }
    }

    match heap.len() {
        0 => return codes,
        1 => {
            let symbol = nodes[0].1;
            codes[symbol as usize] = Some((0, 1));
            return codes;
        }
        _ => {}
    }

    while heap.len() > 1 {
        let (Some(Reverse((a_count, a))), Some(Reverse((b_count, b)))) = (heap.pop(), heap.pop())
        else {
            break;
        };
        heap.push(Reverse((a_count + b_count, nodes.len())));
        nodes.push((Some((a, b)), 0));
    }

    let root = nodes.len() - 1;
    let mut stack = Vec::from([(root, 0u64, 0u8)]);
    while let Some((node, bits, len)) = stack.pop() {
        match nodes[node].0 {
            Some((left, right)) => {
                stack.push((left, bits << 1, len + 1));
                stack.push((right, (bits << 1) | 1, len + 1));
            }
            None => codes[nodes[node].1 as usize] = Some((bits, len)),
        }
    }
    codes
}
