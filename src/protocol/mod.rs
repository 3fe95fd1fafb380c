//! # ECC200 Wire Format
//!
//! Low-level building blocks of the Data Matrix ECC200 data codeword stream.
//!
//! ## Module Structure
//!
//! - [`codewords`]: Reserved codewords, ECI and Structured Append builders,
//!   triplet/EDIFACT packing and the two randomising functions
//! - [`charset`]: C40, Text, X12 and EDIFACT value tables
//!
//! ## Usage Example
//!
//! ```
//! use cuadrado::protocol::{charset, codewords};
//!
//! let mut data = Vec::new();
//! data.extend(codewords::eci(26));
//! codewords::push_ascii(&mut data, b'A');
//! data.push(codewords::digit_pair(b'4', b'2'));
//! assert_eq!(data, vec![241, 27, 66, 172]);
//!
//! assert_eq!(charset::x12_value(b'*'), Some(1));
//! ```
//!
//! ## Reference
//!
//! Based on ISO/IEC 16022:2006, section 5.2 (encodation schemes) and
//! Annex B (randomising algorithms).

pub mod charset;
pub mod codewords;
