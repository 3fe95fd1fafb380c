//! # Symbol Sizes
//!
//! The static size table and the selector that picks a size for a
//! codeword stream.
//!
//! ## Modules
//!
//! - [`table`]: The 48 ECC200 sizes
//! - [`select`]: Smallest permitted size for a stream

pub mod select;
pub mod table;

pub use select::Overflow;
pub use table::{SizeClass, SymbolSize, SIZES};
