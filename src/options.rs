//! # Encode Options
//!
//! Everything a caller can configure about one encode. Options are plain
//! data with serde support so the CLI (or any caller) can load them from
//! JSON and override single fields.
//!
//! ## Example
//!
//! ```
//! use cuadrado::options::{EncodeOptions, Policy, Shape};
//!
//! let options: EncodeOptions = serde_json::from_str(
//!     r#"{ "policy": "iso", "shape": "dmre", "gs1": true }"#,
//! ).unwrap();
//! assert_eq!(options.policy, Policy::Iso);
//! assert_eq!(options.shape, Shape::Dmre);
//! assert!(options.macro_header);
//! ```

use serde::{Deserialize, Serialize};

/// Encodation policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Shortest codeword stream over all mode sequences
    #[default]
    Minimal,
    /// Look-ahead heuristic of ISO/IEC 16022 Annex P, for compatibility
    Iso,
}

/// Which symbol sizes automatic selection may pick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Squares and ISO rectangles
    #[default]
    Auto,
    /// Squares only
    Square,
    /// Squares, ISO rectangles and DMRE rectangles
    Dmre,
}

/// # Structured Append
///
/// Position of this symbol in a set of 2 to 16 symbols. The optional `id`
/// is up to six digits: the thousands form the first file identifier and
/// the remainder the second, each 001 to 254.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAppend {
    pub index: u8,
    pub count: u8,
    #[serde(default)]
    pub id: Option<String>,
}

/// # Encode Options
///
/// | Field | Default | Effect |
/// |-------|---------|--------|
/// | `policy` | `Minimal` | Encodation policy |
/// | `shape` | `Auto` | Size family for automatic selection |
/// | `version` | `None` | Pin one size (1..=48) |
/// | `gs1` | `false` | Leading FNC1, GS becomes FNC1 |
/// | `gs1_gs_separator` | `false` | In GS1 mode keep GS as a literal byte |
/// | `reader_init` | `false` | Reader Programming codeword |
/// | `macro_header` | `true` | Compress `[)>` 05/06 envelopes |
/// | `structured_append` | `None` | Symbol position in a set |
/// | `iso_144` | `false` | ISO block order for 144x144 |
/// | `ecc_level` | `None` | Only ECC200 (`200`) is accepted |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    pub policy: Policy,
    pub shape: Shape,
    pub version: Option<u8>,
    pub gs1: bool,
    pub gs1_gs_separator: bool,
    pub reader_init: bool,
    pub macro_header: bool,
    pub structured_append: Option<StructuredAppend>,
    pub iso_144: bool,
    pub ecc_level: Option<u16>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            policy: Policy::Minimal,
            shape: Shape::Auto,
            version: None,
            gs1: false,
            gs1_gs_separator: false,
            reader_init: false,
            macro_header: true,
            structured_append: None,
            iso_144: false,
            ecc_level: None,
        }
    }
}

impl EncodeOptions {
    /// Options for GS1 data.
    pub fn gs1() -> Self {
        Self {
            gs1: true,
            ..Self::default()
        }
    }

    /// Same options with a different policy.
    pub fn with_policy(&self, policy: Policy) -> Self {
        Self {
            policy,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let options = EncodeOptions::default();
        assert_eq!(options.policy, Policy::Minimal);
        assert_eq!(options.shape, Shape::Auto);
        assert!(options.macro_header);
        assert!(!options.iso_144);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: EncodeOptions = serde_json::from_str(
            r#"{ "structured_append": { "index": 2, "count": 3, "id": "1001" } }"#,
        )
        .unwrap();
        assert_eq!(
            options.structured_append,
            Some(StructuredAppend {
                index: 2,
                count: 3,
                id: Some("1001".to_string()),
            })
        );
        assert_eq!(options.policy, Policy::Minimal);
        assert!(options.macro_header);
    }

    #[test]
    fn test_json_round_trip() {
        let options = EncodeOptions {
            version: Some(7),
            ..EncodeOptions::gs1().with_policy(Policy::Iso)
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: EncodeOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
