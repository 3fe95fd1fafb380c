//! # Cuadrado - Data Matrix ECC200 Codeword Encoder
//!
//! Cuadrado turns bytes into the final codeword array of a Data Matrix
//! (ECC200) symbol, ready for a matrix renderer. It provides:
//!
//! - **Minimal encodation**: shortest codeword stream over the six modes
//! - **ISO encodation**: the Annex P look-ahead, for compatibility
//! - **Size selection**: 48 sizes, squares, rectangles and DMRE
//! - **Finalizing**: padding and interleaved Reed-Solomon check codewords
//! - **Framing**: ECI, GS1, Structured Append, Macro 05/06, Reader Init
//!
//! ## Quick Start
//!
//! ```
//! use cuadrado::{EncodeOptions, encode};
//!
//! let encoded = encode(b"\xff\xfe", &EncodeOptions::default())?;
//!
//! assert_eq!((encoded.size.rows, encoded.size.columns), (12, 12));
//! assert_eq!(encoded.data_codewords, 4);
//! assert_eq!(
//!     encoded.codewords,
//!     vec![0xEB, 0x80, 0xEB, 0x7F, 0x81, 0x6F, 0xA8, 0x0F, 0x21, 0x6F, 0x5F, 0x88]
//! );
//!
//! # Ok::<(), cuadrado::EncodeError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`input`] | Segments, framing headers, validation |
//! | [`encodation`] | Minimal and ISO encoders |
//! | [`symbol`] | Size table and selection |
//! | [`finalize`] | Padding and Reed-Solomon |
//! | [`protocol`] | Codeword values and character sets |
//! | [`options`] | Encode options |
//! | [`error`] | Error and warning types |

pub mod encodation;
pub mod error;
pub mod finalize;
pub mod input;
pub mod options;
pub mod protocol;
pub mod symbol;

use rayon::prelude::*;
use serde::Serialize;

// Re-exports for convenience
pub use error::{EncodeError, Warning};
pub use input::Segment;
pub use options::{EncodeOptions, Policy, Shape, StructuredAppend};
pub use symbol::SymbolSize;

use encodation::Outcome;
use input::Message;

/// A finished symbol's codewords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoded {
    pub size: SymbolSize,
    /// Data codewords before padding
    pub data_codewords: usize,
    /// Data, padding and interleaved check codewords
    pub codewords: Vec<u8>,
    pub warnings: Vec<Warning>,
}

/// Encode one segment of data in the default ECI.
pub fn encode(data: &[u8], options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    encode_segments(&[Segment::new(data)], options)
}

/// # Encode Segments
///
/// Encode segments that may each carry their own ECI.
///
/// ## Errors
///
/// - `InvalidOption` for a version outside 1..=48 or conflicting options
/// - `InvalidData` for empty input or invalid GS1 data
/// - `TooLong` when no permitted size holds the result
pub fn encode_segments(segments: &[Segment], options: &EncodeOptions) -> Result<Encoded, EncodeError> {
    let pinned = match options.version {
        Some(version) => Some(SymbolSize::by_version(version).ok_or_else(|| {
            EncodeError::invalid_option(525, format!("Version {} out of range (1 to 48)", version))
        })?),
        None => None,
    };

    let message = input::prepare(segments, options)?;

    let stream = match encodation::encode(options.policy, &message, options.shape, pinned)? {
        Outcome::Fits(stream) => stream,
        Outcome::Overflow { required, largest } => {
            return Err(too_long(&message, options, pinned, required, largest));
        }
    };

    tracing::debug!(
        policy = ?options.policy,
        codewords = stream.codewords.len(),
        rows = stream.size.rows,
        columns = stream.size.columns,
        "encoded"
    );

    let codewords = finalize::finalize(&stream.codewords, stream.size, options.iso_144)?;

    Ok(Encoded {
        size: *stream.size,
        data_codewords: stream.codewords.len(),
        codewords,
        warnings: message.warnings,
    })
}

/// Encode many inputs in parallel. Results keep the input order.
pub fn encode_batch(inputs: &[Vec<u8>], options: &EncodeOptions) -> Vec<Result<Encoded, EncodeError>> {
    inputs.par_iter().map(|data| encode(data, options)).collect()
}

/// Build the overflow error, naming the longest prefix that still fits.
fn too_long(
    message: &Message,
    options: &EncodeOptions,
    pinned: Option<&'static SymbolSize>,
    required: usize,
    largest: &'static SymbolSize,
) -> EncodeError {
    if let Some(size) = pinned {
        return EncodeError::too_long(
            522,
            format!(
                "Input too long for Version {}, requires {} codewords (maximum {})",
                size.version,
                required,
                size.capacity()
            ),
        );
    }

    let fits = |chars: usize| {
        matches!(
            encodation::encode(options.policy, &message.truncated(chars), options.shape, None),
            Ok(Outcome::Fits(_))
        )
    };

    // Longest fitting prefix: fits(lo) holds, fits(hi) does not
    let length = message.char_count();
    let (mut lo, mut hi) = (0, length);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    EncodeError::too_long(
        523,
        format!(
            "Input length {} too long (maximum {}), requires {} codewords (maximum {})",
            length,
            lo,
            required,
            largest.capacity()
        ),
    )
}
