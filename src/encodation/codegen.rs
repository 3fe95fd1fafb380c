//! # Code Generation
//!
//! Converts plans to data codewords.
//!
//! [`CodewordWriter`] holds the per-mode state a plan runs through: pending
//! C40/Text/X12 values waiting for a full triplet, pending EDIFACT values
//! waiting for a full group, and the position of the open Base 256 length
//! field. The ISO encoder drives a writer step by step because its choices
//! depend on the running codeword count; the minimal encoder builds a whole
//! plan first and replays it once.

use super::ops::{Mode, Plan, Step};
use crate::error::EncodeError;
use crate::input::{Item, Message};
use crate::protocol::charset::{self, CTX_FNC1, CTX_SHIFT1, CTX_SHIFT2};
use crate::protocol::codewords::{self, EDIFACT_UNLATCH, FNC1, UNLATCH};

/// Incremental codeword writer.
#[derive(Debug, Clone)]
pub struct CodewordWriter<'a> {
    items: &'a [Item],
    out: Vec<u8>,
    mode: Mode,
    values: Vec<u8>,
    run_start: usize,
}

impl<'a> CodewordWriter<'a> {
    /// Writer positioned after the message header.
    pub fn new(message: &'a Message) -> Self {
        Self {
            items: &message.items,
            out: message.header.clone(),
            mode: Mode::Ascii,
            values: Vec::with_capacity(6),
            run_start: 0,
        }
    }

    /// Writer that has already applied `steps`.
    pub fn replay(message: &'a Message, steps: &[Step]) -> Result<Self, EncodeError> {
        let mut writer = Self::new(message);
        for &step in steps {
            writer.apply(step)?;
        }
        Ok(writer)
    }

    /// Codewords written so far (Base 256 length fields count one each).
    #[inline]
    pub fn len(&self) -> usize {
        self.out.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Values not yet packed into codewords.
    #[inline]
    pub fn pending(&self) -> usize {
        self.values.len()
    }

    fn unencodable(&self, index: usize) -> EncodeError {
        EncodeError::invalid_data(
            540,
            format!(
                "Character {} cannot be encoded in {:?} encodation",
                index + 1,
                self.mode
            ),
        )
    }

    /// Apply one step.
    pub fn apply(&mut self, step: Step) -> Result<(), EncodeError> {
        match step {
            Step::Latch(mode) => {
                if let Some(latch) = mode.latch() {
                    self.out.push(latch);
                }
                if mode == Mode::Base256 {
                    self.run_start = self.out.len();
                    self.out.push(0);
                }
                self.mode = mode;
                self.values.clear();
            }
            Step::Unlatch => {
                match self.mode {
                    Mode::C40 | Mode::Text | Mode::X12 => self.out.push(UNLATCH),
                    Mode::Edifact => {
                        self.values.push(EDIFACT_UNLATCH);
                        self.out.extend(codewords::edifact_group(&self.values));
                    }
                    Mode::Base256 => self.close_run(),
                    Mode::Ascii => {}
                }
                self.values.clear();
                self.mode = Mode::Ascii;
            }
            Step::Item(index) => self.encode_item(index)?,
            Step::DigitPair(index) => {
                let pair = self.digit_pair(index)?;
                self.out.push(pair);
            }
            Step::PadTriplet => {
                self.values.push(CTX_SHIFT1);
                self.flush_triplets();
            }
            Step::AsciiTail { index, pair } => {
                if pair {
                    let pair = self.digit_pair(index)?;
                    self.out.push(pair);
                } else {
                    match self.items.get(index) {
                        Some(Item::Byte(b)) => codewords::push_ascii(&mut self.out, *b),
                        Some(Item::Fnc1) => self.out.push(FNC1),
                        _ => return Err(self.unencodable(index)),
                    }
                }
                self.values.clear();
                self.mode = Mode::Ascii;
            }
        }
        Ok(())
    }

    fn digit_pair(&self, index: usize) -> Result<u8, EncodeError> {
        let first = self.items.get(index).and_then(|item| item.digit());
        let second = self.items.get(index + 1).and_then(|item| item.digit());
        match (first, second) {
            (Some(a), Some(b)) => Ok(codewords::digit_pair(a, b)),
            _ => Err(self.unencodable(index)),
        }
    }

    fn encode_item(&mut self, index: usize) -> Result<(), EncodeError> {
        let Some(&item) = self.items.get(index) else {
            return Err(self.unencodable(index));
        };

        match (self.mode, item) {
            (Mode::Ascii, Item::Byte(b)) => codewords::push_ascii(&mut self.out, b),
            (Mode::Ascii, Item::Fnc1) => self.out.push(FNC1),
            (Mode::Ascii, Item::Eci(eci)) => self.out.extend(codewords::eci(eci)),

            (Mode::C40 | Mode::Text, Item::Byte(b)) => {
                if let Some(set) = self.mode.ctx_set() {
                    charset::push_ctx_values(set, b, &mut self.values);
                }
                self.flush_triplets();
            }
            (Mode::C40 | Mode::Text, Item::Fnc1) => {
                self.values.push(CTX_SHIFT2);
                self.values.push(CTX_FNC1);
                self.flush_triplets();
            }

            (Mode::X12, Item::Byte(b)) => {
                let value = charset::x12_value(b).ok_or_else(|| self.unencodable(index))?;
                self.values.push(value);
                self.flush_triplets();
            }

            (Mode::Edifact, Item::Byte(b)) => {
                let value = charset::edifact_value(b).ok_or_else(|| self.unencodable(index))?;
                self.values.push(value);
                if self.values.len() == 4 {
                    self.out.extend(codewords::edifact_group(&self.values));
                    self.values.clear();
                }
            }

            (Mode::Base256, Item::Byte(b)) => self.out.push(b),

            _ => return Err(self.unencodable(index)),
        }
        Ok(())
    }

    fn flush_triplets(&mut self) {
        while self.values.len() >= 3 {
            self.out
                .extend(codewords::triplet(self.values[0], self.values[1], self.values[2]));
            self.values.drain(..3);
        }
    }

    /// Fill in the Base 256 length field and randomise the run.
    fn close_run(&mut self) {
        let len = self.out.len() - self.run_start - 1;
        if len <= 249 {
            self.out[self.run_start] = len as u8;
        } else {
            self.out[self.run_start] = (249 + len / 250) as u8;
            self.out.insert(self.run_start + 1, (len % 250) as u8);
        }
        self.randomize_run();
    }

    fn randomize_run(&mut self) {
        for (offset, codeword) in self.out[self.run_start..].iter_mut().enumerate() {
            *codeword = codewords::randomize_255(*codeword, self.run_start + offset + 1);
        }
    }

    /// # Finish
    ///
    /// End the stream for a symbol of `capacity` data codewords. The
    /// unlatch back to ASCII is written only where the symbol has room for
    /// more data after it:
    ///
    /// | Mode | End of symbol |
    /// |------|---------------|
    /// | C40/Text/X12 | 254 unless full |
    /// | EDIFACT | unlatch unless at most two codewords remain |
    /// | Base 256 | length 0 ("to the end") when full |
    pub fn finish(mut self, capacity: usize) -> Result<Vec<u8>, EncodeError> {
        let room = capacity.saturating_sub(self.out.len());
        match self.mode {
            Mode::Ascii => {}
            Mode::C40 | Mode::Text | Mode::X12 => {
                if !self.values.is_empty() {
                    return Err(self.unencodable(self.items.len().saturating_sub(1)));
                }
                if room > 0 {
                    self.out.push(UNLATCH);
                }
            }
            Mode::Edifact => {
                if !self.values.is_empty() || room > 2 {
                    self.values.push(EDIFACT_UNLATCH);
                    self.out.extend(codewords::edifact_group(&self.values));
                }
            }
            Mode::Base256 => {
                if room > 0 {
                    self.close_run();
                } else {
                    self.randomize_run();
                }
            }
        }
        Ok(self.out)
    }
}

impl Plan {
    /// Compile the plan for a symbol of `capacity` data codewords.
    pub fn to_codewords(&self, message: &Message, capacity: usize) -> Result<Vec<u8>, EncodeError> {
        CodewordWriter::replay(message, &self.steps)?.finish(capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Segment, prepare};
    use crate::options::EncodeOptions;
    use pretty_assertions::assert_eq;

    fn message(data: &[u8]) -> Message {
        prepare(&[Segment::new(data)], &EncodeOptions::default()).unwrap()
    }

    fn plan(steps: &[Step]) -> Plan {
        Plan {
            steps: steps.to_vec(),
        }
    }

    #[test]
    fn test_ascii_items() {
        let msg = message(b"A12\xff");
        let codewords = plan(&[Step::Item(0), Step::DigitPair(1), Step::Item(3)])
            .to_codewords(&msg, 5)
            .unwrap();
        assert_eq!(codewords, vec![66, 142, 235, 128]);
    }

    #[test]
    fn test_c40_triplets_and_unlatch() {
        let msg = message(b"AIMAIM");
        let steps: Vec<Step> = std::iter::once(Step::Latch(Mode::C40))
            .chain((0..6).map(Step::Item))
            .collect();
        let codewords = plan(&steps).to_codewords(&msg, 8).unwrap();
        assert_eq!(codewords, vec![230, 0x5B, 0x0B, 0x5B, 0x0B, 254]);

        // full symbol: no unlatch
        let codewords = plan(&steps).to_codewords(&msg, 5).unwrap();
        assert_eq!(codewords.len(), 5);
    }

    #[test]
    fn test_pad_triplet() {
        let msg = message(b"AB");
        let steps = [Step::Latch(Mode::C40), Step::Item(0), Step::Item(1), Step::PadTriplet];
        let codewords = plan(&steps).to_codewords(&msg, 3).unwrap();
        // A=14, B=15, Shift 1 = 0
        let value: u16 = 1600 * 14 + 40 * 15 + 1;
        assert_eq!(codewords, vec![230, (value >> 8) as u8, (value & 0xFF) as u8]);
    }

    #[test]
    fn test_ascii_tail_after_triplet() {
        let msg = message(b"ABCD");
        let steps = [
            Step::Latch(Mode::C40),
            Step::Item(0),
            Step::Item(1),
            Step::Item(2),
            Step::AsciiTail {
                index: 3,
                pair: false,
            },
        ];
        let codewords = plan(&steps).to_codewords(&msg, 4).unwrap();
        assert_eq!(codewords.len(), 4);
        assert_eq!(codewords[3], b'D' + 1);
    }

    #[test]
    fn test_edifact_unlatch_flushes_partial_group() {
        let msg = message(b"ABCDE");
        let mut steps = vec![Step::Latch(Mode::Edifact)];
        steps.extend((0..5).map(Step::Item));
        steps.push(Step::Unlatch);
        let codewords = plan(&steps).to_codewords(&msg, 10).unwrap();
        // latch, one full group, then E (5) and 31 in two codewords
        assert_eq!(codewords.len(), 1 + 3 + 2);
        assert_eq!(codewords[4], 5 << 2 | (31 & 0x30) >> 4);
    }

    #[test]
    fn test_edifact_end_without_unlatch() {
        let msg = message(b"ABCD");
        let mut steps = vec![Step::Latch(Mode::Edifact)];
        steps.extend((0..4).map(Step::Item));
        // two codewords left: no unlatch needed
        assert_eq!(plan(&steps).to_codewords(&msg, 6).unwrap().len(), 4);
        // three left: unlatch value in its own codeword
        assert_eq!(plan(&steps).to_codewords(&msg, 7).unwrap().len(), 5);
    }

    #[test]
    fn test_base256_run_is_randomised() {
        let msg = message(b"\x00\x01");
        let steps = [Step::Latch(Mode::Base256), Step::Item(0), Step::Item(1)];
        let codewords = plan(&steps).to_codewords(&msg, 8).unwrap();
        assert_eq!(codewords[0], 231);
        assert_eq!(codewords[1], codewords::randomize_255(2, 2));
        assert_eq!(codewords[2], codewords::randomize_255(0, 3));
        assert_eq!(codewords[3], codewords::randomize_255(1, 4));
    }

    #[test]
    fn test_base256_to_end_of_symbol() {
        let msg = message(b"\x00\x01");
        let steps = [Step::Latch(Mode::Base256), Step::Item(0), Step::Item(1)];
        let codewords = plan(&steps).to_codewords(&msg, 4).unwrap();
        assert_eq!(codewords[1], codewords::randomize_255(0, 2));
    }

    #[test]
    fn test_base256_long_length_field() {
        let data = vec![0x80u8; 300];
        let msg = message(&data);
        let mut steps = vec![Step::Latch(Mode::Base256)];
        steps.extend((0..300).map(Step::Item));
        let codewords = plan(&steps).to_codewords(&msg, 400).unwrap();
        assert_eq!(codewords.len(), 303);
        assert_eq!(codewords[1], codewords::randomize_255(250, 2));
        assert_eq!(codewords[2], codewords::randomize_255(50, 3));
    }

    #[test]
    fn test_unencodable_item_is_an_error() {
        let msg = message(b"a");
        let steps = [Step::Latch(Mode::X12), Step::Item(0)];
        let err = plan(&steps).to_codewords(&msg, 8).unwrap_err();
        assert_eq!(err.code(), 540);
    }
}
