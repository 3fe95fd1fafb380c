//! # Encodation Steps
//!
//! Both encoders describe their result as a [`Plan`]: a sequence of steps
//! over the message items. Steps say *what* to do with each item; the
//! [`CodewordWriter`](super::codegen::CodewordWriter) owns *how* values are
//! grouped, packed and randomised.
//!
//! ```text
//! Message → minimal | iso → Plan (inspectable) → Codegen → Codewords
//! ```

use crate::protocol::charset::CtxSet;
use crate::protocol::codewords;

/// An encodation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ascii,
    C40,
    Text,
    X12,
    Edifact,
    Base256,
}

impl Mode {
    /// Latch codeword from ASCII into this mode.
    pub fn latch(self) -> Option<u8> {
        match self {
            Self::Ascii => None,
            Self::C40 => Some(codewords::LATCH_C40),
            Self::Text => Some(codewords::LATCH_TEXT),
            Self::X12 => Some(codewords::LATCH_X12),
            Self::Edifact => Some(codewords::LATCH_EDIFACT),
            Self::Base256 => Some(codewords::LATCH_BASE256),
        }
    }

    /// Triplet alphabet for C40 and Text.
    pub fn ctx_set(self) -> Option<CtxSet> {
        match self {
            Self::C40 => Some(CtxSet::C40),
            Self::Text => Some(CtxSet::Text),
            _ => None,
        }
    }

    /// C40, Text and X12 pack values in threes.
    #[inline]
    pub fn is_triplet(self) -> bool {
        matches!(self, Self::C40 | Self::Text | Self::X12)
    }
}

/// One encodation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Switch from ASCII to another mode
    Latch(Mode),
    /// Return to ASCII from the current mode
    Unlatch,
    /// Encode item `i` in the current mode
    Item(usize),
    /// Encode items `i` and `i + 1` as one ASCII digit pair
    DigitPair(usize),
    /// Complete the final C40/Text triplet with a Shift 1 value
    PadTriplet,
    /// Encode item `i` as ASCII at the end of the symbol without unlatching
    /// (`pair` when items `i` and `i + 1` form a digit pair)
    AsciiTail { index: usize, pair: bool },
}

/// An ordered list of steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Modes in the order the plan enters them, for logging.
    pub fn modes(&self) -> Vec<Mode> {
        let mut modes = vec![Mode::Ascii];
        for step in &self.steps {
            match step {
                Step::Latch(mode) => modes.push(*mode),
                Step::Unlatch => modes.push(Mode::Ascii),
                _ => {}
            }
        }
        modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_codewords() {
        assert_eq!(Mode::Ascii.latch(), None);
        assert_eq!(Mode::C40.latch(), Some(230));
        assert_eq!(Mode::Base256.latch(), Some(231));
        assert_eq!(Mode::X12.latch(), Some(238));
        assert_eq!(Mode::Text.latch(), Some(239));
        assert_eq!(Mode::Edifact.latch(), Some(240));
    }

    #[test]
    fn test_plan_modes() {
        let mut plan = Plan::new();
        plan.push(Step::Latch(Mode::C40));
        plan.push(Step::Item(0));
        plan.push(Step::Unlatch);
        plan.push(Step::Latch(Mode::Base256));
        assert_eq!(
            plan.modes(),
            vec![Mode::Ascii, Mode::C40, Mode::Ascii, Mode::Base256]
        );
    }
}
