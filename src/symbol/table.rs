//! # Symbol Size Table
//!
//! The 48 ECC200 symbol sizes: 24 squares, 6 ISO rectangles and 18 DMRE
//! rectangles (ISO/IEC 21471). The table is ordered by data capacity; sizes
//! with equal capacity list squares first, then ISO rectangles, then DMRE.
//!
//! ## Version Numbers
//!
//! | Versions | Sizes |
//! |----------|-------|
//! | 1..=24 | Squares 10x10 to 144x144 |
//! | 25..=30 | Rectangles 8x18 to 16x48 |
//! | 31..=48 | DMRE 8x48 to 26x64 |
//!
//! ## Usage
//!
//! ```
//! use cuadrado::symbol::SymbolSize;
//!
//! let size = SymbolSize::by_version(24).unwrap();
//! assert_eq!((size.rows, size.columns), (144, 144));
//! assert_eq!(size.data_codewords, 1558);
//! ```

use serde::Serialize;

/// Family a size belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Square,
    Rectangle,
    Dmre,
}

/// # Symbol Size
///
/// Geometry and codeword budget of one ECC200 symbol size.
///
/// - **data_codewords**: capacity available to the encoded stream
/// - **ecc_codewords**: total Reed-Solomon check codewords over all blocks
/// - **blocks**: number of interleaved Reed-Solomon blocks
/// - **region_rows / region_columns**: size of one data region, without
///   the finder and timing patterns around it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SymbolSize {
    /// Selector number, 1..=48
    pub version: u8,

    /// Module rows including finder patterns
    pub rows: u16,

    /// Module columns including finder patterns
    pub columns: u16,

    pub region_rows: u8,
    pub region_columns: u8,

    pub data_codewords: u16,
    pub ecc_codewords: u16,
    pub blocks: u8,

    pub class: SizeClass,
}

impl SymbolSize {
    #[allow(clippy::too_many_arguments)]
    const fn new(
        version: u8,
        rows: u16,
        columns: u16,
        region: (u8, u8),
        data_codewords: u16,
        ecc_codewords: u16,
        blocks: u8,
        class: SizeClass,
    ) -> Self {
        Self {
            version,
            rows,
            columns,
            region_rows: region.0,
            region_columns: region.1,
            data_codewords,
            ecc_codewords,
            blocks,
            class,
        }
    }

    /// Data capacity in codewords.
    #[inline]
    pub fn capacity(&self) -> usize {
        usize::from(self.data_codewords)
    }

    /// Check codewords per Reed-Solomon block.
    #[inline]
    pub fn ecc_per_block(&self) -> usize {
        usize::from(self.ecc_codewords / u16::from(self.blocks))
    }

    /// Number of data regions vertically and horizontally.
    pub fn regions(&self) -> (u16, u16) {
        (
            self.rows / (u16::from(self.region_rows) + 2),
            self.columns / (u16::from(self.region_columns) + 2),
        )
    }

    /// Whether this is the largest square, which has an irregular block layout.
    #[inline]
    pub fn is_144(&self) -> bool {
        self.rows == 144
    }

    /// Look up a size by its selector number.
    pub fn by_version(version: u8) -> Option<&'static SymbolSize> {
        SIZES.iter().find(|size| size.version == version)
    }

    /// Look up a size by its module dimensions.
    pub fn by_dimensions(rows: u16, columns: u16) -> Option<&'static SymbolSize> {
        SIZES
            .iter()
            .find(|size| size.rows == rows && size.columns == columns)
    }

    /// All sizes in capacity order.
    pub fn iter() -> impl Iterator<Item = &'static SymbolSize> {
        SIZES.iter()
    }
}

use SizeClass::{Dmre, Rectangle, Square};

/// All 48 sizes, ascending by data capacity.
pub static SIZES: [SymbolSize; 48] = [
    SymbolSize::new(1, 10, 10, (8, 8), 3, 5, 1, Square),
    SymbolSize::new(2, 12, 12, (10, 10), 5, 7, 1, Square),
    SymbolSize::new(25, 8, 18, (6, 16), 5, 7, 1, Rectangle),
    SymbolSize::new(3, 14, 14, (12, 12), 8, 10, 1, Square),
    SymbolSize::new(26, 8, 32, (6, 14), 10, 11, 1, Rectangle),
    SymbolSize::new(4, 16, 16, (14, 14), 12, 12, 1, Square),
    SymbolSize::new(27, 12, 26, (10, 24), 16, 14, 1, Rectangle),
    SymbolSize::new(5, 18, 18, (16, 16), 18, 14, 1, Square),
    SymbolSize::new(31, 8, 48, (6, 22), 18, 15, 1, Dmre),
    SymbolSize::new(6, 20, 20, (18, 18), 22, 18, 1, Square),
    SymbolSize::new(28, 12, 36, (10, 16), 22, 18, 1, Rectangle),
    SymbolSize::new(32, 8, 64, (6, 14), 24, 18, 1, Dmre),
    SymbolSize::new(7, 22, 22, (20, 20), 30, 20, 1, Square),
    SymbolSize::new(29, 16, 36, (14, 16), 32, 24, 1, Rectangle),
    SymbolSize::new(33, 8, 80, (6, 18), 32, 22, 1, Dmre),
    SymbolSize::new(8, 24, 24, (22, 22), 36, 24, 1, Square),
    SymbolSize::new(34, 8, 96, (6, 22), 38, 28, 1, Dmre),
    SymbolSize::new(37, 12, 64, (10, 14), 43, 27, 1, Dmre),
    SymbolSize::new(9, 26, 26, (24, 24), 44, 28, 1, Square),
    SymbolSize::new(40, 20, 36, (18, 16), 44, 28, 1, Dmre),
    SymbolSize::new(30, 16, 48, (14, 22), 49, 28, 1, Rectangle),
    SymbolSize::new(35, 8, 120, (6, 18), 49, 32, 1, Dmre),
    SymbolSize::new(41, 20, 44, (18, 20), 56, 34, 1, Dmre),
    SymbolSize::new(10, 32, 32, (14, 14), 62, 36, 1, Square),
    SymbolSize::new(39, 16, 64, (14, 14), 62, 36, 1, Dmre),
    SymbolSize::new(36, 8, 144, (6, 22), 63, 36, 1, Dmre),
    SymbolSize::new(38, 12, 88, (10, 20), 64, 36, 1, Dmre),
    SymbolSize::new(46, 26, 40, (24, 18), 70, 38, 1, Dmre),
    SymbolSize::new(43, 22, 48, (20, 22), 72, 38, 1, Dmre),
    SymbolSize::new(44, 24, 48, (22, 22), 80, 41, 1, Dmre),
    SymbolSize::new(42, 20, 64, (18, 14), 84, 42, 1, Dmre),
    SymbolSize::new(11, 36, 36, (16, 16), 86, 42, 1, Square),
    SymbolSize::new(47, 26, 48, (24, 22), 90, 42, 1, Dmre),
    SymbolSize::new(45, 24, 64, (22, 14), 108, 46, 1, Dmre),
    SymbolSize::new(12, 40, 40, (18, 18), 114, 48, 1, Square),
    SymbolSize::new(48, 26, 64, (24, 14), 118, 50, 1, Dmre),
    SymbolSize::new(13, 44, 44, (20, 20), 144, 56, 1, Square),
    SymbolSize::new(14, 48, 48, (22, 22), 174, 68, 1, Square),
    SymbolSize::new(15, 52, 52, (24, 24), 204, 84, 2, Square),
    SymbolSize::new(16, 64, 64, (14, 14), 280, 112, 2, Square),
    SymbolSize::new(17, 72, 72, (16, 16), 368, 144, 4, Square),
    SymbolSize::new(18, 80, 80, (18, 18), 456, 192, 4, Square),
    SymbolSize::new(19, 88, 88, (20, 20), 576, 224, 4, Square),
    SymbolSize::new(20, 96, 96, (22, 22), 696, 272, 4, Square),
    SymbolSize::new(21, 104, 104, (24, 24), 816, 336, 6, Square),
    SymbolSize::new(22, 120, 120, (18, 18), 1050, 408, 6, Square),
    SymbolSize::new(23, 132, 132, (20, 20), 1304, 496, 8, Square),
    SymbolSize::new(24, 144, 144, (22, 22), 1558, 620, 10, Square),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_unique_and_complete() {
        let mut versions: Vec<u8> = SIZES.iter().map(|s| s.version).collect();
        versions.sort_unstable();
        assert_eq!(versions, (1..=48).collect::<Vec<u8>>());
    }

    #[test]
    fn test_capacity_order() {
        for pair in SIZES.windows(2) {
            assert!(pair[0].data_codewords <= pair[1].data_codewords);
        }
    }

    #[test]
    fn test_codewords_fill_data_regions() {
        for size in SIZES.iter() {
            let (v, h) = size.regions();
            let modules = u32::from(v)
                * u32::from(h)
                * u32::from(size.region_rows)
                * u32::from(size.region_columns);
            let codewords = u32::from(size.data_codewords + size.ecc_codewords);
            assert!(
                codewords * 8 <= modules && modules < codewords * 8 + 8,
                "{}x{}",
                size.rows,
                size.columns
            );
        }
    }

    #[test]
    fn test_region_layout_matches_dimensions() {
        for size in SIZES.iter() {
            let (v, h) = size.regions();
            assert_eq!(v * (u16::from(size.region_rows) + 2), size.rows);
            assert_eq!(h * (u16::from(size.region_columns) + 2), size.columns);
        }
    }

    #[test]
    fn test_blocks_divide_ecc() {
        for size in SIZES.iter() {
            assert_eq!(size.ecc_codewords % u16::from(size.blocks), 0);
        }
        assert_eq!(SymbolSize::by_version(24).unwrap().ecc_per_block(), 62);
    }

    #[test]
    fn test_lookup() {
        let size = SymbolSize::by_dimensions(8, 18).unwrap();
        assert_eq!(size.version, 25);
        assert_eq!(size.class, SizeClass::Rectangle);
        assert!(SymbolSize::by_version(49).is_none());
        assert!(SymbolSize::by_dimensions(11, 11).is_none());
    }
}
