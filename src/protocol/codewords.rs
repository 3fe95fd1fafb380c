//! # ECC200 Codewords
//!
//! Reserved codeword values and the small builders that turn values into
//! codewords. Everything here is a pure function of its arguments; the
//! stateful parts of encodation live in [`crate::encodation`].
//!
//! ## ASCII Codeword Map
//!
//! | Codeword | Meaning |
//! |----------|---------|
//! | 1..=128 | ASCII byte + 1 |
//! | 129 | Pad |
//! | 130..=229 | Digit pair 00..99 |
//! | 230 | Latch to C40 |
//! | 231 | Latch to Base 256 |
//! | 232 | FNC1 |
//! | 233 | Structured Append |
//! | 234 | Reader Programming |
//! | 235 | Upper Shift (next byte + 128) |
//! | 236 | 05 Macro |
//! | 237 | 06 Macro |
//! | 238 | Latch to X12 |
//! | 239 | Latch to Text |
//! | 240 | Latch to EDIFACT |
//! | 241 | ECI |
//! | 254 | Unlatch from C40, Text or X12 |

// ============================================================================
// RESERVED CODEWORDS
// ============================================================================

/// First pad codeword, written right after the last data codeword.
pub const PAD: u8 = 129;

/// Offset added to a two-digit value in ASCII encodation.
pub const DIGIT_PAIR_BASE: u8 = 130;

/// Latch from ASCII to C40.
pub const LATCH_C40: u8 = 230;

/// Latch from ASCII to Base 256.
pub const LATCH_BASE256: u8 = 231;

/// FNC1, the GS1 marker and field separator.
pub const FNC1: u8 = 232;

/// Structured Append header marker, followed by three parameter codewords.
pub const STRUCTURED_APPEND: u8 = 233;

/// Reader Programming, marks the symbol as a reader initialisation symbol.
pub const READER_PROGRAMMING: u8 = 234;

/// Upper Shift: the next ASCII codeword stands for its byte plus 128.
pub const UPPER_SHIFT: u8 = 235;

/// `[)>RS05GS` header with `RS EOT` trailer.
pub const MACRO_05: u8 = 236;

/// `[)>RS06GS` header with `RS EOT` trailer.
pub const MACRO_06: u8 = 237;

/// Latch from ASCII to ANSI X12.
pub const LATCH_X12: u8 = 238;

/// Latch from ASCII to Text.
pub const LATCH_TEXT: u8 = 239;

/// Latch from ASCII to EDIFACT.
pub const LATCH_EDIFACT: u8 = 240;

/// Extended Channel Interpretation escape.
pub const ECI: u8 = 241;

/// Unlatch from C40, Text or X12 back to ASCII.
pub const UNLATCH: u8 = 254;

/// EDIFACT value that returns to ASCII.
pub const EDIFACT_UNLATCH: u8 = 31;

// ============================================================================
// ASCII
// ============================================================================

/// Append the ASCII encodation of one byte (two codewords above 127).
pub fn push_ascii(out: &mut Vec<u8>, byte: u8) {
    if byte >= 128 {
        out.push(UPPER_SHIFT);
        out.push(byte - 127);
    } else {
        out.push(byte + 1);
    }
}

/// Codeword for two ASCII digits packed together.
pub fn digit_pair(first: u8, second: u8) -> u8 {
    DIGIT_PAIR_BASE + (first - b'0') * 10 + (second - b'0')
}

/// # ECI Escape
///
/// `241` followed by one to three codewords:
///
/// | ECI range | Codewords |
/// |-----------|-----------|
/// | 0..=126 | `eci + 1` |
/// | 127..=16382 | `(eci - 127) / 254 + 128`, `(eci - 127) % 254 + 1` |
/// | 16383.. | `(eci - 16383) / 64516 + 192`, `((eci - 16383) / 254) % 254 + 1`, `(eci - 16383) % 254 + 1` |
///
/// `eci` must be at most 999999; callers validate it first.
pub fn eci(eci: u32) -> Vec<u8> {
    debug_assert!(eci <= 999_999, "ECI {} out of range", eci);
    let mut out = Vec::with_capacity(4);
    out.push(ECI);
    if eci <= 126 {
        out.push((eci + 1) as u8);
    } else if eci <= 16382 {
        let v = eci - 127;
        out.push((v / 254 + 128) as u8);
        out.push((v % 254 + 1) as u8);
    } else {
        let v = eci - 16383;
        out.push((v / 64516 + 192) as u8);
        out.push(((v / 254) % 254 + 1) as u8);
        out.push((v % 254 + 1) as u8);
    }
    out
}

/// Number of codewords taken by an ECI escape, including the 241 marker.
pub fn eci_len(eci: u32) -> usize {
    match eci {
        0..=126 => 2,
        127..=16382 => 3,
        _ => 4,
    }
}

/// # Structured Append Header
///
/// `233`, the position byte (`index - 1` in the high nibble, `17 - count`
/// in the low nibble), then the two file identification codewords.
///
/// Requires `2 <= count <= 16` and `1 <= index <= count`; callers validate
/// the descriptor first.
pub fn structured_append(index: u8, count: u8, id1: u8, id2: u8) -> [u8; 4] {
    debug_assert!(
        (2..=16).contains(&count) && (1..=count).contains(&index),
        "Structured Append {} of {} out of range",
        index,
        count
    );
    [
        STRUCTURED_APPEND,
        ((index - 1) << 4) | (17 - count),
        id1,
        id2,
    ]
}

// ============================================================================
// PACKING
// ============================================================================

/// Pack three C40/Text/X12 values into two codewords.
pub fn triplet(v1: u8, v2: u8, v3: u8) -> [u8; 2] {
    let value = 1600 * u16::from(v1) + 40 * u16::from(v2) + u16::from(v3) + 1;
    [(value >> 8) as u8, (value & 0xFF) as u8]
}

/// Pack up to four EDIFACT values into codewords.
///
/// A full group yields three codewords. A shorter group (only after the
/// unlatch value) yields one codeword per value, which is enough to hold
/// every real bit.
pub fn edifact_group(values: &[u8]) -> Vec<u8> {
    let v = |i: usize| values.get(i).copied().unwrap_or(0);
    let packed = [
        (v(0) << 2) | ((v(1) & 0x30) >> 4),
        ((v(1) & 0x0F) << 4) | ((v(2) & 0x3C) >> 2),
        ((v(2) & 0x03) << 6) | v(3),
    ];
    packed[..values.len().min(3)].to_vec()
}

// ============================================================================
// RANDOMISING
// ============================================================================

/// 255-state randomising for a Base 256 codeword at 1-based `position`.
pub fn randomize_255(codeword: u8, position: usize) -> u8 {
    let prn = ((149 * position) % 255) + 1;
    ((usize::from(codeword) + prn) & 0xFF) as u8
}

/// 253-state randomising for a pad codeword at 1-based `position`.
pub fn randomize_253(codeword: u8, position: usize) -> u8 {
    let prn = ((149 * position) % 253) + 1;
    let value = usize::from(codeword) + prn;
    if value <= 254 {
        value as u8
    } else {
        (value - 254) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ascii_basic_and_extended() {
        let mut out = Vec::new();
        push_ascii(&mut out, b'A');
        push_ascii(&mut out, 0xFF);
        push_ascii(&mut out, 0x80);
        assert_eq!(out, vec![66, 235, 128, 235, 1]);
    }

    #[test]
    fn test_digit_pair() {
        assert_eq!(digit_pair(b'0', b'0'), 130);
        assert_eq!(digit_pair(b'1', b'2'), 142);
        assert_eq!(digit_pair(b'9', b'9'), 229);
    }

    #[test]
    fn test_eci_escapes() {
        assert_eq!(eci(3), vec![241, 4]);
        assert_eq!(eci(10), vec![241, 11]);
        assert_eq!(eci(126), vec![241, 127]);
        assert_eq!(eci(127), vec![241, 128, 1]);
        assert_eq!(eci(16382), vec![241, 191, 254]);
        assert_eq!(eci(16383), vec![241, 192, 1, 1]);
        assert_eq!(eci(810900), vec![241, 204, 81, 6]);
    }

    #[test]
    fn test_eci_len_matches_escape() {
        for value in [0, 3, 126, 127, 16382, 16383, 999_999] {
            assert_eq!(eci_len(value), eci(value).len(), "ECI {}", value);
        }
    }

    #[test]
    fn test_structured_append_header() {
        assert_eq!(structured_append(1, 2, 1, 1), [233, 15, 1, 1]);
        assert_eq!(structured_append(16, 16, 254, 254), [233, 0xF1, 254, 254]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_structured_append_rejects_index_zero() {
        structured_append(0, 2, 1, 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn test_eci_rejects_seven_digits() {
        eci(1_000_000);
    }

    #[test]
    fn test_triplet() {
        // "AIM" in C40: 14, 22, 26
        assert_eq!(triplet(14, 22, 26), [0x5B, 0x0B]);
    }

    #[test]
    fn test_edifact_group_lengths() {
        assert_eq!(edifact_group(&[1, 2, 3, 4]).len(), 3);
        assert_eq!(edifact_group(&[31]), vec![31 << 2]);
        assert_eq!(edifact_group(&[1, 31]).len(), 2);
        assert_eq!(edifact_group(&[1, 2, 31]).len(), 3);
    }

    #[test]
    fn test_pad_randomising() {
        // Second pad position 6 after five data codewords
        assert_eq!(randomize_253(PAD, 6), 11);
        assert!(randomize_253(PAD, 100) >= 1);
    }

    #[test]
    fn test_base256_randomising_wraps() {
        // Position 1: prn = 150
        assert_eq!(randomize_255(0, 1), 150);
        assert_eq!(randomize_255(200, 1), 94);
    }
}
