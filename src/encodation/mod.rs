//! # Encodation
//!
//! Turns a prepared [`Message`] into data codewords for one symbol size.
//!
//! Two policies share the same steps ([`ops`]) and the same code generator
//! ([`codegen`]):
//!
//! | Policy | Module | Result |
//! |--------|--------|--------|
//! | `Minimal` | [`minimal`] | Shortest stream over all mode sequences |
//! | `Iso` | [`iso`] | Annex P look-ahead, for compatibility |
//!
//! Both are plain functions of the message and the size constraints.

pub mod codegen;
pub mod iso;
pub mod minimal;
pub mod ops;

pub use codegen::CodewordWriter;
pub use ops::{Mode, Plan, Step};

use crate::error::EncodeError;
use crate::input::Message;
use crate::options::{Policy, Shape};
use crate::symbol::SymbolSize;

/// Data codewords chosen for a symbol, before padding.
#[derive(Debug, Clone)]
pub struct Stream {
    pub plan: Plan,
    pub codewords: Vec<u8>,
    pub size: &'static SymbolSize,
}

/// Result of running an encoder.
#[derive(Debug, Clone)]
pub enum Outcome {
    Fits(Stream),
    /// No permitted size holds the stream
    Overflow {
        required: usize,
        largest: &'static SymbolSize,
    },
}

/// Run the encoder selected by `policy`.
pub fn encode(
    policy: Policy,
    message: &Message,
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
) -> Result<Outcome, EncodeError> {
    match policy {
        Policy::Minimal => minimal::encode(message, shape, pinned),
        Policy::Iso => iso::encode(message, shape, pinned),
    }
}
