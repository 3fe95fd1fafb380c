//! # Codeword Stream Finalizer
//!
//! Turns an encoded data stream into the complete codeword array of a
//! symbol: pad codewords up to the data capacity, then Reed-Solomon check
//! codewords, interleaved block by block.
//!
//! ## Padding
//!
//! The first free slot gets 129. Every later slot gets 129 randomised with
//! the 253-state algorithm keyed on its 1-based position, so pad runs do
//! not look like data.
//!
//! ## Interleaving
//!
//! With `b` blocks, data codeword `i` belongs to block `i % b`. Each block's
//! check codewords go back into the same interleaved order after the data:
//!
//! ```text
//! data:  d0 d1 d2 d3 d4 d5 ...      (b = 2: d0 d2 d4 -> block 0)
//! ecc:   e0,0 e1,0 e0,1 e1,1 ...    (ej,k = check codeword k of block j)
//! ```
//!
//! 144x144 has ten blocks of unequal length. Most readers expect the
//! check codewords of blocks 0-7 two slots later and blocks 8-9 eight
//! slots earlier; `iso_144` writes them in plain ISO order instead.

pub mod reed_solomon;

use crate::error::EncodeError;
use crate::protocol::codewords::{PAD, randomize_253};
use crate::symbol::SymbolSize;

/// Append pad codewords until `data` holds `capacity` codewords.
pub fn pad(data: &mut Vec<u8>, capacity: usize) {
    if data.len() < capacity {
        data.push(PAD);
    }
    while data.len() < capacity {
        let position = data.len() + 1;
        data.push(randomize_253(PAD, position));
    }
}

/// Append the interleaved check codewords for a full data area.
fn append_ecc(codewords: &mut Vec<u8>, size: &SymbolSize, iso_144: bool) {
    let data_len = size.capacity();
    let blocks = usize::from(size.blocks);
    let ecc_len = size.ecc_per_block();
    let skewed = size.is_144() && !iso_144;

    let mut ecc = vec![0u8; usize::from(size.ecc_codewords)];
    for block in 0..blocks {
        let block_data: Vec<u8> = codewords[..data_len]
            .iter()
            .skip(block)
            .step_by(blocks)
            .copied()
            .collect();
        let check = reed_solomon::check_codewords(&block_data, ecc_len);

        for (k, &value) in check.iter().enumerate() {
            let slot = block + k * blocks;
            let slot = match (skewed, block < 8) {
                (false, _) => slot,
                (true, true) => slot + 2,
                (true, false) => slot - 8,
            };
            ecc[slot] = value;
        }
    }

    codewords.extend(ecc);
}

/// # Finalize
///
/// Pad `data` to the capacity of `size` and append its check codewords.
///
/// ## Errors
///
/// `TooLong` (522) when `data` exceeds the capacity; this never happens
/// for streams produced by the encoders for the same size.
pub fn finalize(data: &[u8], size: &SymbolSize, iso_144: bool) -> Result<Vec<u8>, EncodeError> {
    if data.len() > size.capacity() {
        return Err(EncodeError::too_long(
            522,
            format!(
                "Input too long for Version {}, requires {} codewords (maximum {})",
                size.version,
                data.len(),
                size.capacity()
            ),
        ));
    }

    let mut codewords = Vec::with_capacity(size.capacity() + usize::from(size.ecc_codewords));
    codewords.extend_from_slice(data);
    pad(&mut codewords, size.capacity());
    append_ecc(&mut codewords, size, iso_144);

    tracing::trace!(
        rows = size.rows,
        columns = size.columns,
        data = data.len(),
        total = codewords.len(),
        "finalized codewords"
    );

    Ok(codewords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finalize_12x12() {
        let size = SymbolSize::by_version(2).unwrap();
        let codewords = finalize(&[0xEB, 0x80, 0xEB, 0x7F], size, false).unwrap();
        assert_eq!(
            codewords,
            vec![0xEB, 0x80, 0xEB, 0x7F, 0x81, 0x6F, 0xA8, 0x0F, 0x21, 0x6F, 0x5F, 0x88]
        );
    }

    #[test]
    fn test_pad_sequence() {
        let mut data = vec![1, 2, 3];
        pad(&mut data, 8);
        // 129, then 129 + (149p mod 253) + 1 wrapped at 254
        assert_eq!(data, vec![1, 2, 3, 129, 115, 11, 161, 56]);
    }

    #[test]
    fn test_exact_fit_has_no_pad() {
        let size = SymbolSize::by_version(1).unwrap();
        let codewords = finalize(&[10, 20, 30], size, false).unwrap();
        assert_eq!(&codewords[..3], &[10, 20, 30]);
        assert_eq!(codewords.len(), 8);
    }

    #[test]
    fn test_overflow_is_rejected() {
        let size = SymbolSize::by_version(1).unwrap();
        let err = finalize(&[1, 2, 3, 4], size, false).unwrap_err();
        assert_eq!(err.code(), 522);
        assert_eq!(
            err.message(),
            "Input too long for Version 1, requires 4 codewords (maximum 3)"
        );
    }

    #[test]
    fn test_interleaved_blocks_match_single_block_ecc() {
        let size = SymbolSize::by_dimensions(52, 52).unwrap();
        let data: Vec<u8> = (0..204).map(|i| (i * 7 % 251) as u8).collect();
        let codewords = finalize(&data, size, false).unwrap();

        let even: Vec<u8> = data.iter().step_by(2).copied().collect();
        let ecc = reed_solomon::check_codewords(&even, 42);
        let written: Vec<u8> = codewords[204..].iter().step_by(2).copied().collect();
        assert_eq!(written, ecc);
    }

    #[test]
    fn test_144_skew() {
        let size = SymbolSize::by_version(24).unwrap();
        let data: Vec<u8> = (0..1558).map(|i| (i % 200) as u8 + 1).collect();
        let skewed = finalize(&data, size, false).unwrap();
        let iso = finalize(&data, size, true).unwrap();
        assert_eq!(skewed.len(), 1558 + 620);
        assert_eq!(&skewed[..1558], &iso[..1558]);

        let ecc = &iso[1558..];
        let rotated = &skewed[1558..];
        // block 0 moves two slots later, block 8 eight slots earlier
        assert_eq!(rotated[2], ecc[0]);
        assert_eq!(rotated[0], ecc[8]);
        assert_eq!(rotated[1], ecc[9]);
        assert_eq!(rotated[11], ecc[19]);
    }
}
