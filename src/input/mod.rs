//! # Input Segmenter
//!
//! Turns caller segments and framing options into a [`Message`]: the
//! fixed header codewords plus the flat item sequence the encoders parse.
//!
//! ## Header Order
//!
//! ```text
//! [Structured Append 233 p id1 id2] [FNC1 232] [Reader Programming 234] [Macro 236/237]
//! ```
//!
//! Macro 05/06 only applies when nothing else precedes the data. The ECI of
//! the first segment is the first item rather than part of the header, so
//! the encoders see every ECI change the same way.
//!
//! ## Items
//!
//! | Item | Source |
//! |------|--------|
//! | `Byte(b)` | A data byte |
//! | `Fnc1` | GS (0x1D) in GS1 mode, unless GS separators are kept |
//! | `Eci(n)` | A segment whose ECI differs from the active one |

pub mod gs1;
pub mod structured_append;

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, Warning};
use crate::options::EncodeOptions;
use crate::protocol::codewords::{MACRO_05, MACRO_06, READER_PROGRAMMING, FNC1};

/// Longest input, in bytes, any symbol can hold (3116 digits).
pub const MAX_CHARACTERS: usize = 3116;

/// Highest ECI number that can be encoded.
pub const MAX_ECI: u32 = 999_999;

/// One run of input bytes under a single ECI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub data: Vec<u8>,
    /// 0 for the default interpretation
    #[serde(default)]
    pub eci: u32,
}

impl Segment {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            eci: 0,
        }
    }

    pub fn with_eci(data: impl Into<Vec<u8>>, eci: u32) -> Self {
        Self {
            data: data.into(),
            eci,
        }
    }
}

/// One unit of input for the encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Byte(u8),
    Fnc1,
    Eci(u32),
}

impl Item {
    /// The byte, if this is a plain data byte.
    #[inline]
    pub fn byte(self) -> Option<u8> {
        match self {
            Self::Byte(b) => Some(b),
            _ => None,
        }
    }

    /// The byte, if it is an ASCII digit.
    #[inline]
    pub fn digit(self) -> Option<u8> {
        self.byte().filter(u8::is_ascii_digit)
    }
}

/// Header codewords plus the items that follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Vec<u8>,
    pub items: Vec<Item>,
    pub warnings: Vec<Warning>,
}

impl Message {
    /// Number of data characters (bytes and FNC1s).
    pub fn char_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !matches!(item, Item::Eci(_)))
            .count()
    }

    /// A copy holding only the first `chars` data characters.
    pub fn truncated(&self, chars: usize) -> Self {
        let mut seen = 0;
        let end = self
            .items
            .iter()
            .position(|item| {
                if !matches!(item, Item::Eci(_)) {
                    seen += 1;
                }
                seen > chars
            })
            .unwrap_or(self.items.len());
        // An escape with no character after it is dead weight
        let end = self.items[..end]
            .iter()
            .rposition(|item| !matches!(item, Item::Eci(_)))
            .map_or(0, |last| last + 1);
        Self {
            header: self.header.clone(),
            items: self.items[..end].to_vec(),
            warnings: Vec::new(),
        }
    }
}

/// `[)>` RS `05`/`06` GS ... RS EOT envelope, returning the macro codeword.
fn macro_codeword(data: &[u8]) -> Option<u8> {
    if data.len() < 9 || !data.ends_with(b"\x1e\x04") {
        return None;
    }
    match &data[..7] {
        b"[)>\x1e05\x1d" => Some(MACRO_05),
        b"[)>\x1e06\x1d" => Some(MACRO_06),
        _ => None,
    }
}

fn validate_eci(eci: u32) -> Result<(), EncodeError> {
    if eci == 0 || (3..=MAX_ECI).contains(&eci) {
        Ok(())
    } else {
        Err(EncodeError::invalid_option(
            533,
            format!("ECI {} out of range (0 and 3 to {})", eci, MAX_ECI),
        ))
    }
}

/// # Prepare
///
/// Validate `segments` against `options` and build the [`Message`].
///
/// ## Errors
///
/// - `InvalidOption` for conflicting framing, a bad Structured Append
///   descriptor, an obsolete ECC level or an ECI out of range
/// - `InvalidData` for empty input or bytes GS1 cannot carry
/// - `TooLong` (719) when the segments hold more than [`MAX_CHARACTERS`]
///   bytes, counted before any Macro envelope is stripped
pub fn prepare(segments: &[Segment], options: &EncodeOptions) -> Result<Message, EncodeError> {
    if let Some(level) = options.ecc_level.filter(|&level| level != 200) {
        return Err(EncodeError::invalid_option(
            519,
            format!("Obsolete ECC level {}, only ECC200 is supported", level),
        ));
    }
    if segments.iter().all(|segment| segment.data.is_empty()) {
        return Err(EncodeError::invalid_data(205, "No input data"));
    }
    for segment in segments {
        validate_eci(segment.eci)?;
    }

    let length: usize = segments.iter().map(|segment| segment.data.len()).sum();
    if length > MAX_CHARACTERS {
        return Err(EncodeError::too_long(
            719,
            format!(
                "Input length {} too long (maximum {})",
                length, MAX_CHARACTERS
            ),
        ));
    }

    let mut header = Vec::with_capacity(6);

    if let Some(sa) = &options.structured_append {
        header.extend(structured_append::header(sa)?);
    }
    if options.gs1 {
        let joined: Vec<u8> = segments.iter().flat_map(|s| s.data.iter().copied()).collect();
        gs1::validate(&joined)?;
        header.push(FNC1);
    }
    if options.reader_init {
        if options.gs1 {
            return Err(EncodeError::invalid_option(
                521,
                "Cannot encode in GS1 mode and Reader Initialisation at the same time",
            ));
        }
        if options.structured_append.is_some() {
            return Err(EncodeError::invalid_option(
                727,
                "Cannot have Structured Append and Reader Initialisation at the same time",
            ));
        }
        header.push(READER_PROGRAMMING);
    }

    let mut first = &segments[0].data[..];
    if options.macro_header && segments.len() == 1 && segments[0].eci == 0 {
        if let Some(codeword) = macro_codeword(first) {
            if options.structured_append.is_some() {
                return Err(EncodeError::invalid_option(
                    728,
                    "Cannot have Structured Append and a Macro 05/06 header at the same time",
                ));
            }
            if header.is_empty() {
                tracing::debug!(codeword, "macro header");
                header.push(codeword);
                first = &first[7..first.len() - 2];
            }
        }
    }

    let fnc1_separators = options.gs1 && !options.gs1_gs_separator;
    let mut items = Vec::new();
    let mut warnings = Vec::new();
    let mut active = 0u32;

    for (index, segment) in segments.iter().enumerate() {
        let data = if index == 0 { first } else { &segment.data[..] };
        let mut eci = segment.eci;
        if eci == 0 && active != 0 {
            warnings.push(Warning::new(
                222,
                format!("ECI 0 after ECI {} encoded as ECI 3", active),
            ));
            eci = 3;
        }
        if eci != active {
            items.push(Item::Eci(eci));
            active = eci;
        }
        items.extend(data.iter().map(|&b| match b {
            gs1::GS if fnc1_separators => Item::Fnc1,
            _ => Item::Byte(b),
        }));
    }

    Ok(Message {
        header,
        items,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::StructuredAppend;
    use pretty_assertions::assert_eq;

    fn bytes(data: &[u8]) -> Vec<Item> {
        data.iter().map(|&b| Item::Byte(b)).collect()
    }

    #[test]
    fn test_plain_segment() {
        let message = prepare(&[Segment::new("AB")], &EncodeOptions::default()).unwrap();
        assert!(message.header.is_empty());
        assert_eq!(message.items, bytes(b"AB"));
        assert_eq!(message.char_count(), 2);
    }

    #[test]
    fn test_empty_input() {
        let err = prepare(&[Segment::new("")], &EncodeOptions::default()).unwrap_err();
        assert_eq!(err.code(), 205);
        assert!(matches!(err, EncodeError::InvalidData { .. }));
    }

    #[test]
    fn test_gs1_separators_become_fnc1() {
        let message = prepare(&[Segment::new("10A\x1d21B")], &EncodeOptions::gs1()).unwrap();
        assert_eq!(message.header, vec![232]);
        assert_eq!(message.items[3], Item::Fnc1);

        let options = EncodeOptions {
            gs1_gs_separator: true,
            ..EncodeOptions::gs1()
        };
        let message = prepare(&[Segment::new("10A\x1d21B")], &options).unwrap();
        assert_eq!(message.items[3], Item::Byte(0x1D));
    }

    #[test]
    fn test_reader_init_conflicts() {
        let options = EncodeOptions {
            reader_init: true,
            ..EncodeOptions::gs1()
        };
        let err = prepare(&[Segment::new("01")], &options).unwrap_err();
        assert_eq!(err.code(), 521);
        assert!(matches!(err, EncodeError::InvalidOption { .. }));

        let options = EncodeOptions {
            reader_init: true,
            structured_append: Some(StructuredAppend {
                index: 1,
                count: 2,
                id: None,
            }),
            ..EncodeOptions::default()
        };
        assert_eq!(prepare(&[Segment::new("A")], &options).unwrap_err().code(), 727);
    }

    #[test]
    fn test_reader_init_header() {
        let options = EncodeOptions {
            reader_init: true,
            ..EncodeOptions::default()
        };
        let message = prepare(&[Segment::new("A")], &options).unwrap();
        assert_eq!(message.header, vec![234]);
    }

    #[test]
    fn test_macro_05_is_stripped() {
        let message = prepare(
            &[Segment::new("[)>\x1e05\x1dABC\x1e\x04")],
            &EncodeOptions::default(),
        )
        .unwrap();
        assert_eq!(message.header, vec![236]);
        assert_eq!(message.items, bytes(b"ABC"));
    }

    #[test]
    fn test_macro_06_needs_trailer() {
        let message = prepare(
            &[Segment::new("[)>\x1e06\x1dABC\x1e")],
            &EncodeOptions::default(),
        )
        .unwrap();
        assert!(message.header.is_empty());
        assert_eq!(message.char_count(), 11);
    }

    #[test]
    fn test_macro_disabled() {
        let options = EncodeOptions {
            macro_header: false,
            ..EncodeOptions::default()
        };
        let message = prepare(&[Segment::new("[)>\x1e05\x1dABC\x1e\x04")], &options).unwrap();
        assert!(message.header.is_empty());
    }

    #[test]
    fn test_macro_with_structured_append() {
        let options = EncodeOptions {
            structured_append: Some(StructuredAppend {
                index: 1,
                count: 2,
                id: None,
            }),
            ..EncodeOptions::default()
        };
        let err = prepare(&[Segment::new("[)>\x1e05\x1dABC\x1e\x04")], &options).unwrap_err();
        assert_eq!(err.code(), 728);
    }

    #[test]
    fn test_macro_after_reader_init_is_literal() {
        let options = EncodeOptions {
            reader_init: true,
            ..EncodeOptions::default()
        };
        let message = prepare(&[Segment::new("[)>\x1e05\x1dABC\x1e\x04")], &options).unwrap();
        assert_eq!(message.header, vec![234]);
        assert_eq!(message.char_count(), 12);
    }

    #[test]
    fn test_eci_changes_between_segments() {
        let segments = [
            Segment::with_eci("A", 26),
            Segment::with_eci("B", 26),
            Segment::with_eci("C", 899),
        ];
        let message = prepare(&segments, &EncodeOptions::default()).unwrap();
        assert_eq!(
            message.items,
            vec![
                Item::Eci(26),
                Item::Byte(b'A'),
                Item::Byte(b'B'),
                Item::Eci(899),
                Item::Byte(b'C'),
            ]
        );
        assert!(message.warnings.is_empty());
    }

    #[test]
    fn test_default_eci_after_other_eci_warns() {
        let segments = [Segment::with_eci("A", 26), Segment::new("B")];
        let message = prepare(&segments, &EncodeOptions::default()).unwrap();
        assert_eq!(message.items[2], Item::Eci(3));
        assert_eq!(message.warnings.len(), 1);
        assert_eq!(message.warnings[0].code, 222);
        assert_eq!(message.warnings[0].message, "ECI 0 after ECI 26 encoded as ECI 3");
    }

    #[test]
    fn test_eci_range() {
        for eci in [1, 2, 1_000_000] {
            let err = prepare(&[Segment::with_eci("A", eci)], &EncodeOptions::default())
                .unwrap_err();
            assert_eq!(err.code(), 533);
        }
        assert!(prepare(&[Segment::with_eci("A", 999_999)], &EncodeOptions::default()).is_ok());
    }

    #[test]
    fn test_obsolete_ecc_level() {
        let options = EncodeOptions {
            ecc_level: Some(140),
            ..EncodeOptions::default()
        };
        let err = prepare(&[Segment::new("A")], &options).unwrap_err();
        assert_eq!(err.code(), 519);
        assert_eq!(err.message(), "Obsolete ECC level 140, only ECC200 is supported");
    }

    #[test]
    fn test_length_limit() {
        let data = vec![b'1'; 3117];
        let err = prepare(&[Segment::new(data)], &EncodeOptions::default()).unwrap_err();
        assert_eq!(err.code(), 719);
        assert_eq!(err.message(), "Input length 3117 too long (maximum 3116)");
    }

    #[test]
    fn test_length_limit_counts_macro_envelope() {
        let envelope = |digits: usize| {
            let mut data = b"[)>\x1e05\x1d".to_vec();
            data.extend(std::iter::repeat_n(b'1', digits));
            data.extend_from_slice(b"\x1e\x04");
            data
        };

        // 3108 digits once stripped, 3117 bytes as given
        let err = prepare(&[Segment::new(envelope(3108))], &EncodeOptions::default()).unwrap_err();
        assert_eq!(err.code(), 719);
        assert_eq!(err.message(), "Input length 3117 too long (maximum 3116)");

        let message = prepare(&[Segment::new(envelope(3107))], &EncodeOptions::default()).unwrap();
        assert_eq!(message.header, vec![MACRO_05]);
        assert_eq!(message.char_count(), 3107);
    }

    #[test]
    fn test_length_limit_spans_segments() {
        let segments = [Segment::new(vec![b'1'; 3000]), Segment::with_eci(vec![b'2'; 117], 26)];
        let err = prepare(&segments, &EncodeOptions::default()).unwrap_err();
        assert_eq!(err.code(), 719);
        assert_eq!(err.message(), "Input length 3117 too long (maximum 3116)");
    }

    #[test]
    fn test_truncated_keeps_eci_items() {
        let segments = [Segment::with_eci("AB", 26), Segment::with_eci("CD", 27)];
        let message = prepare(&segments, &EncodeOptions::default()).unwrap();
        let short = message.truncated(3);
        assert_eq!(short.char_count(), 3);
        assert_eq!(short.items[3], Item::Eci(27));
        assert_eq!(short.items.last(), Some(&Item::Byte(b'C')));
    }

    #[test]
    fn test_truncated_drops_trailing_eci() {
        let segments = [Segment::with_eci("AB", 26), Segment::with_eci("CD", 27)];
        let message = prepare(&segments, &EncodeOptions::default()).unwrap();
        assert_eq!(
            message.truncated(2).items,
            vec![Item::Eci(26), Item::Byte(b'A'), Item::Byte(b'B')]
        );
        assert!(message.truncated(0).items.is_empty());
    }
}
