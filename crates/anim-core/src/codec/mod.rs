//! Split payload codecs.
//!
//! Every split payload starts with a one-byte [`Encoding`] tag. RLE payloads
//! decode straight into indexed pixels. Huffman payloads decode to an RLE
//! stream first, which is then run-length expanded.

pub mod huffman;
pub mod rle;

use crate::error::DecodeError;

/// Split encoding tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Encoding {
    Rle = 0,
    Huffman = 1,
}

impl TryFrom<u8> for Encoding {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(Encoding::Rle),
            1 => Ok(Encoding::Huffman),
            other => Err(DecodeError::UnsupportedEncoding(other)),
        }
    }
}

impl From<Encoding> for u8 {
    fn from(encoding: Encoding) -> Self {
        encoding as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_tag() {
        assert_eq!(Encoding::try_from(0), Ok(Encoding::Rle));
        assert_eq!(Encoding::try_from(1), Ok(Encoding::Huffman));
        assert_eq!(
            Encoding::try_from(7),
            Err(DecodeError::UnsupportedEncoding(7))
        );
        assert_eq!(u8::from(Encoding::Huffman), 1);
    }
}
