//! # Encodation Character Sets
//!
//! Value tables for the C40, Text, X12 and EDIFACT encodations.
//!
//! C40 and Text share one layout: a basic set reachable without a shift
//! and three shift sets selected by a prefix value (0, 1 or 2). They differ
//! only in whether uppercase or lowercase letters sit in the basic set.
//!
//! | Set | C40 | Text |
//! |-----|-----|------|
//! | Basic | space, 0-9, A-Z | space, 0-9, a-z |
//! | Shift 1 | control 0x00-0x1F | control 0x00-0x1F |
//! | Shift 2 | punctuation, FNC1 (27), Upper Shift (30) | same |
//! | Shift 3 | `` ` `` a-z `{|}~` DEL | `` ` `` A-Z `{|}~` DEL |

/// C40/Text value for FNC1 in shift set 2.
pub const CTX_FNC1: u8 = 27;

/// C40/Text value for Upper Shift in shift set 2.
pub const CTX_UPPER_SHIFT: u8 = 30;

/// Shift prefix value selecting shift set 2.
pub const CTX_SHIFT2: u8 = 1;

/// Shift prefix value selecting shift set 1, also used to pad a final triplet.
pub const CTX_SHIFT1: u8 = 0;

/// Which of the two triplet alphabets is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CtxSet {
    C40,
    Text,
}

/// Shift set (0 = basic, 1..=3) and value of a 7-bit byte.
fn ctx_entry(set: CtxSet, byte: u8) -> (u8, u8) {
    match (set, byte) {
        (_, 0..=31) => (1, byte),
        (_, b' ') => (0, 3),
        (_, 33..=47) => (2, byte - 33),
        (_, b'0'..=b'9') => (0, byte - b'0' + 4),
        (_, 58..=64) => (2, byte - 58 + 15),
        (CtxSet::C40, b'A'..=b'Z') => (0, byte - b'A' + 14),
        (CtxSet::Text, b'A'..=b'Z') => (3, byte - b'A' + 1),
        (_, 91..=95) => (2, byte - 91 + 22),
        (_, 96) => (3, 0),
        (CtxSet::C40, b'a'..=b'z') => (3, byte - b'a' + 1),
        (CtxSet::Text, b'a'..=b'z') => (0, byte - b'a' + 14),
        _ => (3, byte - 123 + 27),
    }
}

/// Append the C40 or Text values for `byte`, with any shift prefixes.
///
/// Bytes above 127 take Upper Shift (two values) before the value of the
/// byte minus 128, so one byte costs between one and four values.
pub fn push_ctx_values(set: CtxSet, byte: u8, out: &mut Vec<u8>) {
    let mut byte = byte;
    if byte >= 128 {
        out.push(CTX_SHIFT2);
        out.push(CTX_UPPER_SHIFT);
        byte -= 128;
    }
    let (shift, value) = ctx_entry(set, byte);
    if shift != 0 {
        out.push(shift - 1);
    }
    out.push(value);
}

/// Number of C40 or Text values `byte` takes.
pub fn ctx_len(set: CtxSet, byte: u8) -> usize {
    let extended = if byte >= 128 { 2 } else { 0 };
    let (shift, _) = ctx_entry(set, byte & 0x7F);
    extended + if shift != 0 { 2 } else { 1 }
}

/// Whether `byte` is in the basic (unshifted) set.
pub fn is_ctx_basic(set: CtxSet, byte: u8) -> bool {
    byte < 128 && ctx_entry(set, byte).0 == 0
}

/// X12 value of `byte`, or `None` outside the X12 alphabet.
pub fn x12_value(byte: u8) -> Option<u8> {
    match byte {
        b'\r' => Some(0),
        b'*' => Some(1),
        b'>' => Some(2),
        b' ' => Some(3),
        b'0'..=b'9' => Some(byte - b'0' + 4),
        b'A'..=b'Z' => Some(byte - b'A' + 14),
        _ => None,
    }
}

/// Whether `byte` is one of the X12 segment terminators or separators.
pub fn is_x12_terminator(byte: u8) -> bool {
    matches!(byte, b'\r' | b'*' | b'>')
}

/// EDIFACT value of `byte`, or `None` outside 0x20..=0x5E.
pub fn edifact_value(byte: u8) -> Option<u8> {
    match byte {
        b' '..=b'^' => Some(byte & 0x3F),
        _ => None,
    }
}
