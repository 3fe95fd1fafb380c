//! # Structured Append Header
//!
//! Validates a [`StructuredAppend`] descriptor and builds its four
//! header codewords.

use crate::error::EncodeError;
use crate::options::StructuredAppend;
use crate::protocol::codewords;

/// Build the header for `sa`, or report which field is out of range.
pub fn header(sa: &StructuredAppend) -> Result<[u8; 4], EncodeError> {
    if !(2..=16).contains(&sa.count) {
        return Err(EncodeError::invalid_option(
            720,
            format!(
                "Structured Append count '{}' out of range (2 to 16)",
                sa.count
            ),
        ));
    }
    if sa.index < 1 || sa.index > sa.count {
        return Err(EncodeError::invalid_option(
            721,
            format!(
                "Structured Append index '{}' out of range (1 to count {})",
                sa.index, sa.count
            ),
        ));
    }

    let (id1, id2) = match sa.id.as_deref() {
        None | Some("") => (1, 1),
        Some(id) => file_id(id)?,
    };

    Ok(codewords::structured_append(sa.index, sa.count, id1, id2))
}

/// Split a numeric id into its two file identifiers.
fn file_id(id: &str) -> Result<(u8, u8), EncodeError> {
    if id.len() > 6 {
        return Err(EncodeError::invalid_option(
            722,
            "Structured Append ID too long (6 digit maximum)",
        ));
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodeError::invalid_option(
            723,
            "Invalid Structured Append ID (digits only)",
        ));
    }

    let value: u32 = id.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'));
    let (id1, id2) = (value / 1000, value % 1000);
    let in_range = |v: u32| (1..=254).contains(&v);

    match (in_range(id1), in_range(id2)) {
        (true, true) => Ok((id1 as u8, id2 as u8)),
        (false, false) => Err(EncodeError::invalid_option(
            724,
            format!(
                "Structured Append ID1 '{:03}' and ID2 '{:03}' out of range (001 to 254) (ID \"{:03}{:03}\")",
                id1, id2, id1, id2
            ),
        )),
        (false, true) => Err(EncodeError::invalid_option(
            725,
            format!(
                "Structured Append ID1 '{:03}' out of range (001 to 254) (ID \"{:03}{:03}\")",
                id1, id1, id2
            ),
        )),
        (true, false) => Err(EncodeError::invalid_option(
            726,
            format!(
                "Structured Append ID2 '{:03}' out of range (001 to 254) (ID \"{:03}{:03}\")",
                id2, id1, id2
            ),
        )),
    }
}
