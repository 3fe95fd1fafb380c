//! # ISO Look-Ahead Encodation
//!
//! Single greedy pass following the look-ahead procedure of ISO/IEC 16022
//! Annex P. Kept for output compatibility with other encoders; the minimal
//! encoder never produces a longer stream.
//!
//! Character counts are kept in twelfths so the fractional costs of the
//! procedure (2/3 of a codeword per C40 value, 3/4 per EDIFACT value)
//! stay exact:
//!
//! | Count | Twelfths |
//! |-------|----------|
//! | 1/2 (digit in ASCII) | 6 |
//! | 2/3 (basic C40/Text/X12) | 8 |
//! | 3/4 (EDIFACT) | 9 |
//! | 4/3 (shifted C40/Text) | 16 |
//! | 8/3 (upper-shifted C40/Text) | 32 |
//!
//! A mode switch is decided after at least five characters, or at the end
//! of the data. ECI escapes split the input into runs that each start and
//! end in ASCII.

use super::codegen::CodewordWriter;
use super::ops::{Mode, Plan, Step};
use super::{Outcome, Stream};
use crate::error::EncodeError;
use crate::input::{Item, Message};
use crate::options::Shape;
use crate::protocol::charset::{self, CtxSet};
use crate::symbol::{SymbolSize, select};

/// Longest stream the largest symbol holds.
const MAX_CODEWORDS: usize = 1558;

const MULT_1_DIV_2: i32 = 6;
const MULT_2_DIV_3: i32 = 8;
const MULT_3_DIV_4: i32 = 9;
const MULT_1: i32 = 12;
const MULT_5_DIV_4: i32 = 15;
const MULT_4_DIV_3: i32 = 16;
const MULT_2: i32 = 24;
const MULT_9_DIV_4: i32 = 27;
const MULT_8_DIV_3: i32 = 32;
const MULT_13_DIV_4: i32 = 39;
const MULT_10_DIV_3: i32 = 40;
const MULT_4: i32 = 48;
const MULT_17_DIV_4: i32 = 51;
const MULT_13_DIV_3: i32 = 52;

/// Round up to a whole codeword.
#[inline]
fn ceil(count: i32) -> i32 {
    ((count + MULT_1 - 1) / MULT_1) * MULT_1
}

fn is_ctx_basic(set: CtxSet, item: Item) -> bool {
    item.byte().is_some_and(|b| charset::is_ctx_basic(set, b))
}

fn is_x12(item: Item) -> bool {
    item.byte().and_then(charset::x12_value).is_some()
}

fn is_edifact(item: Item) -> bool {
    item.byte().and_then(charset::edifact_value).is_some()
}

fn is_extended(item: Item) -> bool {
    item.byte().is_some_and(|b| b >= 128)
}

/// An X12 terminator or separator occurs before the first non-X12 item.
fn x12_terminator_ahead(items: &[Item], position: usize) -> bool {
    items[position..]
        .iter()
        .take_while(|item| is_x12(**item))
        .any(|item| item.byte().is_some_and(charset::is_x12_terminator))
}

/// Per-mode running counts in twelfths of a codeword.
#[derive(Debug, Clone, Copy)]
struct Counts {
    ascii: i32,
    c40: i32,
    text: i32,
    x12: i32,
    edifact: i32,
    base256: i32,
}

impl Counts {
    fn start(mode: Mode) -> Self {
        let mut counts = if mode == Mode::Ascii {
            Self {
                ascii: 0,
                c40: MULT_1,
                text: MULT_1,
                x12: MULT_1,
                edifact: MULT_1,
                base256: MULT_5_DIV_4,
            }
        } else {
            Self {
                ascii: MULT_1,
                c40: MULT_2,
                text: MULT_2,
                x12: MULT_2,
                edifact: MULT_2,
                base256: MULT_9_DIV_4,
            }
        };
        match mode {
            Mode::Ascii => {}
            Mode::C40 => counts.c40 = 0,
            Mode::Text => counts.text = 0,
            Mode::X12 => counts.x12 = 0,
            Mode::Edifact => counts.edifact = 0,
            Mode::Base256 => counts.base256 = 0,
        }
        counts
    }

    fn add(&mut self, item: Item) {
        let extended = is_extended(item);

        self.ascii = match item.digit() {
            Some(_) => self.ascii + MULT_1_DIV_2,
            None if extended => ceil(self.ascii) + MULT_2,
            None => ceil(self.ascii) + MULT_1,
        };

        let ctx = |basic: bool| match (basic, extended) {
            (true, _) => MULT_2_DIV_3,
            (false, true) => MULT_8_DIV_3,
            (false, false) => MULT_4_DIV_3,
        };
        self.c40 += ctx(is_ctx_basic(CtxSet::C40, item));
        self.text += ctx(is_ctx_basic(CtxSet::Text, item));

        self.x12 += match (is_x12(item), extended) {
            (true, _) => MULT_2_DIV_3,
            (false, true) => MULT_13_DIV_3,
            (false, false) => MULT_10_DIV_3,
        };

        self.edifact += match (is_edifact(item), extended) {
            (true, _) => MULT_3_DIV_4,
            (false, true) => MULT_17_DIV_4,
            (false, false) => MULT_13_DIV_4,
        };

        self.base256 += if item == Item::Fnc1 { MULT_4 } else { MULT_1 };
    }

    fn rounded(self) -> Self {
        Self {
            ascii: ceil(self.ascii),
            c40: ceil(self.c40),
            text: ceil(self.text),
            x12: ceil(self.x12),
            edifact: ceil(self.edifact),
            base256: ceil(self.base256),
        }
    }
}

/// # Look-Ahead
///
/// Mode the procedure prefers for the items from `position` on, starting
/// from `mode`. `items` ends where the current run ends.
pub fn look_ahead(items: &[Item], position: usize, mode: Mode) -> Mode {
    let mut c = Counts::start(mode);

    for sp in position..items.len() {
        c.add(items[sp]);

        if sp < position + 4 {
            continue;
        }

        let n = c.ascii + MULT_1;
        if n <= c.base256 && n <= c.edifact && n <= c.text && n <= c.x12 && n <= c.c40 {
            return Mode::Ascii;
        }
        let n = c.base256 + MULT_1;
        if n <= c.ascii || (n < c.edifact && n < c.text && n < c.x12 && n < c.c40) {
            return Mode::Base256;
        }
        let n = c.edifact + MULT_1;
        if n < c.ascii && n < c.base256 && n < c.text && n < c.x12 && n < c.c40 {
            return Mode::Edifact;
        }
        let n = c.text + MULT_1;
        if n < c.ascii && n < c.base256 && n < c.edifact && n < c.x12 && n < c.c40 {
            return Mode::Text;
        }
        let n = c.x12 + MULT_1;
        if n < c.ascii && n < c.base256 && n < c.edifact && n < c.text && n < c.c40 {
            return Mode::X12;
        }
        let n = c.c40 + MULT_1;
        if n < c.ascii && n < c.base256 && n < c.edifact && n < c.text {
            if c.c40 < c.x12 {
                return Mode::C40;
            }
            if c.c40 == c.x12 {
                if x12_terminator_ahead(items, sp) {
                    return Mode::X12;
                }
                return Mode::C40;
            }
        }
    }

    // End of data
    let r = c.rounded();
    if r.ascii <= r.base256 && r.ascii <= r.edifact && r.ascii <= r.text && r.ascii <= r.x12 && r.ascii <= r.c40 {
        return Mode::Ascii;
    }
    if r.base256 < r.ascii && r.base256 < r.edifact && r.base256 < r.text && r.base256 < r.x12 && r.base256 < r.c40 {
        return Mode::Base256;
    }
    if r.edifact < r.ascii && r.edifact < r.base256 && r.edifact < r.text && r.edifact < r.x12 && r.edifact < r.c40 {
        return Mode::Edifact;
    }
    if r.text < r.ascii && r.text < r.base256 && r.text < r.edifact && r.text < r.x12 && r.text < r.c40 {
        return Mode::Text;
    }
    if r.x12 < r.ascii && r.x12 < r.base256 && r.x12 < r.edifact && r.x12 < r.text && r.x12 < r.c40 {
        return Mode::X12;
    }
    Mode::C40
}

/// Whether `mode` can take `item` as its first value.
fn accepts(mode: Mode, item: Item) -> bool {
    match mode {
        Mode::Ascii | Mode::C40 | Mode::Text => !matches!(item, Item::Eci(_)),
        Mode::X12 => is_x12(item),
        Mode::Edifact => is_edifact(item),
        Mode::Base256 => matches!(item, Item::Byte(_)),
    }
}

struct IsoEncoder<'a> {
    message: &'a Message,
    items: &'a [Item],
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
    plan: Plan,
    writer: CodewordWriter<'a>,
}

impl<'a> IsoEncoder<'a> {
    fn new(message: &'a Message, shape: Shape, pinned: Option<&'static SymbolSize>) -> Self {
        Self {
            message,
            items: &message.items,
            shape,
            pinned,
            plan: Plan::new(),
            writer: CodewordWriter::new(message),
        }
    }

    fn push(&mut self, step: Step) -> Result<(), EncodeError> {
        self.writer.apply(step)?;
        self.plan.push(step);
        if self.writer.len() > MAX_CODEWORDS {
            return Err(EncodeError::too_long(
                520,
                format!("Input too long, requires more than {} codewords", MAX_CODEWORDS),
            ));
        }
        Ok(())
    }

    /// Drop the last `count` steps and return the items they encoded.
    fn rewind(&mut self, count: usize) -> Result<Vec<usize>, EncodeError> {
        let keep = self.plan.steps.len().saturating_sub(count);
        let popped = self.plan.steps.split_off(keep);
        self.writer = CodewordWriter::replay(self.message, &self.plan.steps)?;
        Ok(popped
            .into_iter()
            .filter_map(|step| match step {
                Step::Item(index) => Some(index),
                _ => None,
            })
            .collect())
    }

    /// Trailing `Item` steps, at most `limit`.
    fn trailing_items(&self, limit: usize) -> usize {
        self.plan
            .steps
            .iter()
            .rev()
            .take(limit)
            .take_while(|step| matches!(step, Step::Item(_)))
            .count()
    }

    fn digit_pair_at(&self, position: usize, end: usize) -> bool {
        position + 1 < end
            && self.items[position].digit().is_some()
            && self.items[position + 1].digit().is_some()
    }

    /// Encode `indices` (consecutive) in ASCII.
    fn ascii_items(&mut self, indices: &[usize]) -> Result<(), EncodeError> {
        let mut k = 0;
        while k < indices.len() {
            let index = indices[k];
            if k + 1 < indices.len() && self.digit_pair_at(index, index + 2) {
                self.push(Step::DigitPair(index))?;
                k += 2;
            } else {
                self.push(Step::Item(index))?;
                k += 1;
            }
        }
        Ok(())
    }

    /// Leave X12, re-encoding values of an unfinished triplet in ASCII.
    fn leave_x12(&mut self) -> Result<(), EncodeError> {
        let pending = self.trailing_items(self.writer.pending());
        let popped = self.rewind(pending)?;
        self.push(Step::Unlatch)?;
        self.ascii_items(&popped)
    }

    /// Codewords left in the symbol the stream is heading for.
    fn symbols_left(&self) -> i64 {
        let tp = self.writer.len();
        let capacity = match self.pinned {
            Some(size) => size.capacity(),
            None => select::select(tp + self.writer.pending(), self.shape, None)
                .map(|size| size.capacity())
                .unwrap_or(0),
        };
        capacity as i64 - tp as i64
    }

    fn encode_run(&mut self, start: usize, end: usize) -> Result<(), EncodeError> {
        let items: &'a [Item] = self.items;
        let run = &items[..end];
        let mut sp = start;
        let mut next = Mode::Ascii;
        let mut not_first = false;

        while sp < end {
            let mode = next;
            let item = self.items[sp];

            match mode {
                Mode::Ascii => {
                    next = Mode::Ascii;
                    if self.digit_pair_at(sp, end) {
                        self.push(Step::DigitPair(sp))?;
                        sp += 2;
                    } else {
                        let preferred = look_ahead(run, sp, mode);
                        if preferred != Mode::Ascii && accepts(preferred, item) {
                            tracing::trace!(position = sp, mode = ?preferred, "latch");
                            self.push(Step::Latch(preferred))?;
                            next = preferred;
                            not_first = false;
                        } else {
                            self.push(Step::Item(sp))?;
                            sp += 1;
                        }
                    }
                }
                Mode::C40 | Mode::Text => {
                    next = mode;
                    if self.writer.pending() == 0 && not_first {
                        next = look_ahead(run, sp, mode);
                    }
                    if next != mode {
                        tracing::trace!(position = sp, "unlatch");
                        self.push(Step::Unlatch)?;
                        next = Mode::Ascii;
                    } else {
                        self.push(Step::Item(sp))?;
                        sp += 1;
                        not_first = true;
                    }
                }
                Mode::X12 => {
                    next = if !is_x12(item) {
                        Mode::Ascii
                    } else if self.writer.pending() == 0 && not_first {
                        look_ahead(run, sp, mode)
                    } else {
                        Mode::X12
                    };
                    if next != Mode::X12 {
                        tracing::trace!(position = sp, "unlatch");
                        self.leave_x12()?;
                        next = Mode::Ascii;
                    } else {
                        self.push(Step::Item(sp))?;
                        sp += 1;
                        not_first = true;
                    }
                }
                Mode::Edifact => {
                    next = if !is_edifact(item) {
                        Mode::Ascii
                    } else if self.writer.pending() == 3 {
                        look_ahead(run, sp, mode)
                    } else {
                        Mode::Edifact
                    };
                    if next != Mode::Edifact {
                        tracing::trace!(position = sp, "unlatch");
                        self.push(Step::Unlatch)?;
                        next = Mode::Ascii;
                    } else {
                        self.push(Step::Item(sp))?;
                        sp += 1;
                        not_first = true;
                    }
                }
                Mode::Base256 => {
                    next = if !accepts(Mode::Base256, item) {
                        Mode::Ascii
                    } else if not_first {
                        look_ahead(run, sp, mode)
                    } else {
                        Mode::Base256
                    };
                    if next != Mode::Base256 {
                        tracing::trace!(position = sp, "unlatch");
                        self.push(Step::Unlatch)?;
                        next = Mode::Ascii;
                    } else {
                        self.push(Step::Item(sp))?;
                        sp += 1;
                        not_first = true;
                    }
                }
            }
        }
        Ok(())
    }

    /// # End of Data
    ///
    /// Resolve pending values at the end of a run. Runs followed by an ECI
    /// escape always return to ASCII; the last run fits its ending to the
    /// space left in the symbol.
    fn end_run(&mut self, end: usize, last: bool) -> Result<(), EncodeError> {
        let symbols_left = if last { self.symbols_left() } else { i64::MAX };
        let pending = self.writer.pending();

        match self.writer.mode() {
            Mode::Ascii => {}
            mode @ (Mode::C40 | Mode::Text) => {
                let set = mode.ctx_set().unwrap_or(CtxSet::C40);
                let basic_last = end > 0 && is_ctx_basic(set, self.items[end - 1]);
                if pending == 0 {
                    if !last {
                        self.push(Step::Unlatch)?;
                    }
                } else if pending == 2 && symbols_left == 2 {
                    self.push(Step::PadTriplet)?;
                } else if pending == 1 && symbols_left <= 2 && basic_last {
                    self.rewind(1)?;
                    if symbols_left > 1 {
                        self.push(Step::Unlatch)?;
                        self.push(Step::Item(end - 1))?;
                    } else {
                        self.push(Step::AsciiTail {
                            index: end - 1,
                            pair: false,
                        })?;
                    }
                } else {
                    // Back to the last complete triplet
                    let mut residue = pending as i64;
                    let mut count = 0;
                    for step in self.plan.steps.iter().rev() {
                        if residue.rem_euclid(3) == 0 {
                            break;
                        }
                        let Step::Item(index) = *step else {
                            break;
                        };
                        residue -= match self.items[index] {
                            Item::Byte(b) => charset::ctx_len(set, b) as i64,
                            _ => 2,
                        };
                        count += 1;
                    }
                    let popped = self.rewind(count)?;
                    self.push(Step::Unlatch)?;
                    self.ascii_items(&popped)?;
                }
            }
            Mode::X12 => {
                if last && symbols_left == 1 && pending == 1 {
                    self.rewind(1)?;
                    self.push(Step::AsciiTail {
                        index: end - 1,
                        pair: false,
                    })?;
                } else if pending > 0 {
                    self.leave_x12()?;
                } else if !last {
                    self.push(Step::Unlatch)?;
                }
            }
            Mode::Edifact => {
                if last && symbols_left <= 2 && pending as i64 <= symbols_left {
                    let popped = self.rewind(pending)?;
                    for index in popped {
                        self.push(Step::AsciiTail { index, pair: false })?;
                    }
                } else if !last {
                    self.push(Step::Unlatch)?;
                }
            }
            Mode::Base256 => {
                if !last {
                    self.push(Step::Unlatch)?;
                }
            }
        }
        Ok(())
    }
}

/// # Encode
///
/// Look-ahead stream for `message` in the smallest permitted size.
pub fn encode(
    message: &Message,
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
) -> Result<Outcome, EncodeError> {
    let mut encoder = IsoEncoder::new(message, shape, pinned);
    let items = encoder.items;

    let mut start = 0;
    for (index, item) in items.iter().enumerate() {
        if let Item::Eci(_) = item {
            encoder.encode_run(start, index)?;
            encoder.end_run(index, false)?;
            encoder.push(Step::Item(index))?;
            start = index + 1;
        }
    }
    encoder.encode_run(start, items.len())?;
    encoder.end_run(items.len(), true)?;

    let IsoEncoder { plan, writer, .. } = encoder;
    let open = writer.clone().finish(usize::MAX)?;

    let chosen = select::select_by(shape, pinned, |size| {
        let capacity = size.capacity();
        writer
            .clone()
            .finish(capacity)
            .is_ok_and(|codewords| codewords.len() <= capacity)
    });

    match chosen {
        Ok(size) => {
            let codewords = writer.finish(size.capacity())?;
            tracing::trace!(modes = ?plan.modes(), "iso plan");
            Ok(Outcome::Fits(Stream {
                plan,
                codewords,
                size,
            }))
        }
        Err(overflow) => Ok(Outcome::Overflow {
            required: open.len(),
            largest: overflow.largest,
        }),
    }
}
