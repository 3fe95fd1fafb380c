//! # Symbol Size Selection
//!
//! Picks the smallest permitted size for a codeword stream. The caller
//! either knows the final stream length ([`select`]) or only knows, per
//! size, whether its stream can be made to fit ([`select_by`]); the minimal
//! encoder needs the latter because the end of a stream can be shortened
//! when it lands exactly on a symbol boundary.

use crate::options::Shape;

use super::table::{SizeClass, SymbolSize, SIZES};

/// Nothing permitted is large enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow {
    /// Largest permitted size, or the pinned one
    pub largest: &'static SymbolSize,
}

/// Whether automatic selection under `shape` may pick `size`.
pub fn permits(shape: Shape, size: &SymbolSize) -> bool {
    match shape {
        Shape::Auto => size.class != SizeClass::Dmre,
        Shape::Square => size.class == SizeClass::Square,
        Shape::Dmre => true,
    }
}

/// Sizes selection may consider, smallest first.
///
/// A pinned size stands alone. Callers validate the version number first.
pub fn candidates(
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
) -> impl Iterator<Item = &'static SymbolSize> {
    SIZES
        .iter()
        .filter(move |size| match pinned {
            Some(pin) => pin.version == size.version,
            None => permits(shape, size),
        })
}

/// Largest size selection may consider.
pub fn largest(shape: Shape, pinned: Option<&'static SymbolSize>) -> &'static SymbolSize {
    candidates(shape, pinned)
        .last()
        .unwrap_or(&SIZES[SIZES.len() - 1])
}

/// First candidate accepted by `fits`.
pub fn select_by(
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
    mut fits: impl FnMut(&SymbolSize) -> bool,
) -> Result<&'static SymbolSize, Overflow> {
    candidates(shape, pinned)
        .find(|size| fits(size))
        .ok_or(Overflow {
            largest: largest(shape, pinned),
        })
}

/// Smallest candidate holding `codewords` data codewords.
pub fn select(
    codewords: usize,
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
) -> Result<&'static SymbolSize, Overflow> {
    select_by(shape, pinned, |size| size.capacity() >= codewords)
}
