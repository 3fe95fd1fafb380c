//! GS1 data checks.
//!
//! Input is the already reduced element string: AIs and values with a GS
//! (0x1D) after each variable-length field. Bracket syntax and AI rules are
//! handled upstream.

use crate::error::EncodeError;

/// Group separator between GS1 fields.
pub const GS: u8 = 0x1D;

/// Reject bytes and separator placements a GS1 Data Matrix cannot carry.
pub fn validate(data: &[u8]) -> Result<(), EncodeError> {
    if let Some(position) = data.iter().position(|&b| b != GS && !(32..=126).contains(&b)) {
        return Err(EncodeError::invalid_data(
            530,
            format!(
                "GS1 data may only contain printable ASCII and GS separators (invalid byte {:#04x} at position {})",
                data[position],
                position + 1
            ),
        ));
    }
    if data.first() == Some(&GS) || data.last() == Some(&GS) {
        return Err(EncodeError::invalid_data(
            531,
            "GS1 data cannot start or end with a GS separator",
        ));
    }
    if data.windows(2).any(|pair| pair[0] == GS && pair[1] == GS) {
        return Err(EncodeError::invalid_data(
            532,
            "GS1 data cannot contain consecutive GS separators",
        ));
    }
    Ok(())
}
