//! # Minimal Encodation
//!
//! Shortest-path search over (item position, encodation state). Every
//! state records the cheapest way to reach it and a back-pointer into the
//! same table, so the table is the arena and a path is rebuilt once at the
//! end.
//!
//! ## States
//!
//! | State | Sub-state |
//! |-------|-----------|
//! | ASCII | none |
//! | C40, Text, X12 | values pending in the current triplet (0-2) |
//! | EDIFACT | values pending in the current group (0-3) |
//! | Base 256 | bytes in the open run (carried along the best path) |
//!
//! Costs count codewords. A pending triplet or group costs nothing until it
//! completes; the unlatch of a partial EDIFACT group costs the codewords
//! the group then needs.
//!
//! ## Moves
//!
//! ```text
//! ASCII ──latch (+1, Base 256 +2)──▶ mode(0)
//! mode(0) ──unlatch (+1, EDIFACT(r) +1..3, Base 256 +0)──▶ ASCII
//! state ──item──▶ state'          (cost of any completed triplet/group)
//! ```
//!
//! ## End of Symbol
//!
//! A stream may end in several ways whose validity depends on the symbol
//! capacity `c`, so the search keeps one candidate per ending and the size
//! selector asks which endings fit each size:
//!
//! | Ending | Fits when |
//! |--------|-----------|
//! | Open (any mode, unlatch written if room) | cost <= c |
//! | Exact (no unlatch, ASCII tail, Shift 1 pad, Base 256 length 0) | cost == c |
//! | Short (EDIFACT, at most two ASCII codewords after the last group) | cost <= c <= base + 2 |
//!
//! Among equal-cost ways into a state, continuing the current mode wins
//! over a latch or unlatch. Base 256 compares run lengths first: the
//! shorter open run wins.

use super::ops::{Mode, Plan, Step};
use super::{Outcome, Stream};
use crate::error::EncodeError;
use crate::input::{Item, Message};
use crate::options::Shape;
use crate::protocol::charset::{self, CtxSet};
use crate::protocol::codewords;
use crate::symbol::{SymbolSize, select};

const STATES: usize = 15;

/// Edifact unlatch cost by pending values.
const EDIFACT_UNLATCH_COST: [u32; 4] = [1, 2, 3, 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ascii,
    C40(u8),
    Text(u8),
    X12(u8),
    Edifact(u8),
    Base256,
}

impl State {
    fn index(self) -> usize {
        match self {
            Self::Ascii => 0,
            Self::C40(r) => 1 + usize::from(r),
            Self::Text(r) => 4 + usize::from(r),
            Self::X12(r) => 7 + usize::from(r),
            Self::Edifact(r) => 10 + usize::from(r),
            Self::Base256 => 14,
        }
    }

    fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Ascii,
            1..=3 => Self::C40((index - 1) as u8),
            4..=6 => Self::Text((index - 4) as u8),
            7..=9 => Self::X12((index - 7) as u8),
            10..=13 => Self::Edifact((index - 10) as u8),
            _ => Self::Base256,
        }
    }

    fn mode(self) -> Mode {
        match self {
            Self::Ascii => Mode::Ascii,
            Self::C40(_) => Mode::C40,
            Self::Text(_) => Mode::Text,
            Self::X12(_) => Mode::X12,
            Self::Edifact(_) => Mode::Edifact,
            Self::Base256 => Mode::Base256,
        }
    }

    /// Triplet state for `mode` with `pending` values.
    fn triplet(mode: Mode, pending: u8) -> Self {
        match mode {
            Mode::C40 => Self::C40(pending),
            Mode::Text => Self::Text(pending),
            _ => Self::X12(pending),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    cost: u32,
    prev: Option<usize>,
    step: Option<Step>,
    /// Bytes in the open Base 256 run
    run: u32,
    continued: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    Open,
    Exact,
    Short { base: u32 },
}

#[derive(Debug, Clone)]
struct Terminal {
    cost: u32,
    ending: Ending,
    node: usize,
    tail: Vec<Step>,
}

impl Terminal {
    fn fits(&self, capacity: u32) -> bool {
        match self.ending {
            Ending::Open => self.cost <= capacity,
            Ending::Exact => self.cost == capacity,
            Ending::Short { base } => self.cost <= capacity && capacity <= base + 2,
        }
    }
}

/// The search table.
struct Search<'a> {
    items: &'a [Item],
    nodes: Vec<Option<Node>>,
}

impl<'a> Search<'a> {
    fn new(message: &'a Message) -> Self {
        let items = &message.items[..];
        let mut nodes = vec![None; (items.len() + 1) * STATES];
        nodes[0] = Some(Node {
            cost: message.header.len() as u32,
            prev: None,
            step: None,
            run: 0,
            continued: false,
        });
        Self { items, nodes }
    }

    #[inline]
    fn slot(pos: usize, state: State) -> usize {
        pos * STATES + state.index()
    }

    #[inline]
    fn node(&self, pos: usize, state: State) -> Option<Node> {
        self.nodes[Self::slot(pos, state)]
    }

    fn relax(&mut self, pos: usize, state: State, from: usize, edge: Edge) {
        let Some(source) = self.nodes[from] else {
            return;
        };
        let cost = source.cost + edge.cost;
        let run = edge.run.unwrap_or(source.run);
        let slot = Self::slot(pos, state);
        let better = match &self.nodes[slot] {
            None => true,
            Some(old) if cost != old.cost => cost < old.cost,
            // Equal cost: the shorter open run reaches byte 250 later, so it
            // is never worse afterwards
            Some(old) if state == State::Base256 && run != old.run => run < old.run,
            Some(old) => edge.continued && !old.continued,
        };
        if better {
            self.nodes[slot] = Some(Node {
                cost,
                prev: Some(from),
                step: edge.step,
                run,
                continued: edge.continued,
            });
        }
    }

    fn run(&mut self) {
        let n = self.items.len();
        for pos in 0..=n {
            self.unlatches(pos);
            if pos < n {
                self.latches(pos);
                self.consume(pos);
            }
        }
    }

    fn unlatches(&mut self, pos: usize) {
        let ascii = State::Ascii;
        for index in 1..STATES {
            let state = State::from_index(index);
            let cost = match state {
                State::C40(0) | State::Text(0) | State::X12(0) => 1,
                State::Edifact(r) => EDIFACT_UNLATCH_COST[usize::from(r)],
                State::Base256 => 0,
                _ => continue,
            };
            let from = Self::slot(pos, state);
            self.relax(pos, ascii, from, Edge::switch(cost, Step::Unlatch).with_run(0));
        }
    }

    fn latches(&mut self, pos: usize) {
        let from = Self::slot(pos, State::Ascii);
        for state in [State::C40(0), State::Text(0), State::X12(0), State::Edifact(0)] {
            self.relax(pos, state, from, Edge::switch(1, Step::Latch(state.mode())));
        }
        self.relax(
            pos,
            State::Base256,
            from,
            Edge::switch(2, Step::Latch(Mode::Base256)).with_run(0),
        );
    }

    fn consume(&mut self, pos: usize) {
        let item = self.items[pos];
        let step = Step::Item(pos);

        for index in 0..STATES {
            let state = State::from_index(index);
            let from = Self::slot(pos, state);
            let Some(node) = self.nodes[from] else {
                continue;
            };

            match state {
                State::Ascii => {
                    if let (Some(_), Some(_)) = (
                        item.digit(),
                        self.items.get(pos + 1).and_then(|next| next.digit()),
                    ) {
                        self.relax(pos + 2, state, from, Edge::keep(1, Step::DigitPair(pos)));
                    }
                    let cost = match item {
                        Item::Byte(b) if b >= 128 => 2,
                        Item::Byte(_) | Item::Fnc1 => 1,
                        Item::Eci(eci) => codewords::eci_len(eci) as u32,
                    };
                    self.relax(pos + 1, state, from, Edge::keep(cost, step));
                }
                State::C40(r) | State::Text(r) => {
                    let set = if matches!(state, State::C40(_)) {
                        CtxSet::C40
                    } else {
                        CtxSet::Text
                    };
                    let values = match item {
                        Item::Byte(b) => charset::ctx_len(set, b),
                        Item::Fnc1 => 2,
                        Item::Eci(_) => continue,
                    };
                    let total = usize::from(r) + values;
                    let next = State::triplet(state.mode(), (total % 3) as u8);
                    let cost = 2 * (total / 3) as u32;
                    self.relax(pos + 1, next, from, Edge::keep(cost, step));
                }
                State::X12(r) => {
                    if item.byte().and_then(charset::x12_value).is_some() {
                        let cost = if r == 2 { 2 } else { 0 };
                        self.relax(pos + 1, State::X12((r + 1) % 3), from, Edge::keep(cost, step));
                    }
                }
                State::Edifact(r) => {
                    if item.byte().and_then(charset::edifact_value).is_some() {
                        let cost = if r == 3 { 3 } else { 0 };
                        let next = State::Edifact((r + 1) % 4);
                        self.relax(pos + 1, next, from, Edge::keep(cost, step));
                    }
                }
                State::Base256 => {
                    if let Item::Byte(_) = item {
                        let run = node.run + 1;
                        // 250th byte widens the length field
                        let cost = if run == 250 { 2 } else { 1 };
                        self.relax(pos + 1, state, from, Edge::keep(cost, step).with_run(run));
                    }
                }
            }
        }
    }

    /// Every way the stream can end.
    fn terminals(&self) -> Vec<Terminal> {
        let n = self.items.len();
        let mut out = Vec::new();
        let mut push = |node: Option<Node>, slot: usize, cost: u32, ending: Ending, tail: Vec<Step>| {
            if let Some(node) = node {
                out.push(Terminal {
                    cost: node.cost + cost,
                    ending: match ending {
                        Ending::Short { base } => Ending::Short {
                            base: node.cost + base,
                        },
                        other => other,
                    },
                    node: slot,
                    tail,
                });
            }
        };

        let at_end = |state: State| (self.node(n, state), Self::slot(n, state));

        let (node, slot) = at_end(State::Ascii);
        push(node, slot, 0, Ending::Open, Vec::new());

        for state in [State::C40(0), State::Text(0), State::X12(0)] {
            let (node, slot) = at_end(state);
            push(node, slot, 1, Ending::Open, Vec::new());
            push(node, slot, 0, Ending::Exact, Vec::new());
        }
        for state in [State::C40(2), State::Text(2)] {
            let (node, slot) = at_end(state);
            push(node, slot, 2, Ending::Exact, vec![Step::PadTriplet]);
        }

        let (node, slot) = at_end(State::Edifact(0));
        push(node, slot, 1, Ending::Open, Vec::new());
        push(node, slot, 0, Ending::Short { base: 0 }, Vec::new());

        let (node, slot) = at_end(State::Base256);
        push(node, slot, 0, Ending::Open, Vec::new());
        if let Some(b256) = node.filter(|b256| b256.run >= 250) {
            // length field 0 saves the second length codeword
            out.push(Terminal {
                cost: b256.cost - 1,
                ending: Ending::Exact,
                node: slot,
                tail: Vec::new(),
            });
        }

        // One ASCII codeword after a completed triplet, no unlatch
        let ascii_tails = self.ascii_tails();
        for state in [State::C40(0), State::Text(0), State::X12(0)] {
            for (start, tail) in &ascii_tails {
                if tail.len() == 1 {
                    let slot = Self::slot(*start, state);
                    out.extend(self.nodes[slot].map(|node| Terminal {
                        cost: node.cost + 1,
                        ending: Ending::Exact,
                        node: slot,
                        tail: tail.clone(),
                    }));
                }
            }
        }

        // Up to two ASCII codewords after a completed EDIFACT group
        for (start, tail) in &ascii_tails {
            let slot = Self::slot(*start, State::Edifact(0));
            out.extend(self.nodes[slot].map(|node| Terminal {
                cost: node.cost + tail.len() as u32,
                ending: Ending::Short { base: node.cost },
                node: slot,
                tail: tail.clone(),
            }));
        }

        out
    }

    /// ASCII endings of one or two codewords: `(start position, steps)`.
    fn ascii_tails(&self) -> Vec<(usize, Vec<Step>)> {
        let n = self.items.len();
        let small = |pos: usize| matches!(self.items.get(pos), Some(Item::Byte(b)) if *b < 128);
        let tail = |index: usize| Step::AsciiTail { index, pair: false };

        let mut tails = Vec::new();
        if n >= 1 && small(n - 1) {
            tails.push((n - 1, vec![tail(n - 1)]));
        }
        if n >= 2 {
            let pair = self.items[n - 2].digit().is_some() && self.items[n - 1].digit().is_some();
            if pair {
                tails.push((n - 2, vec![Step::AsciiTail { index: n - 2, pair: true }]));
            }
            if small(n - 2) && small(n - 1) {
                tails.push((n - 2, vec![tail(n - 2), tail(n - 1)]));
            }
        }
        tails
    }

    fn plan(&self, terminal: &Terminal) -> Plan {
        let mut steps = Vec::new();
        let mut cursor = Some(terminal.node);
        while let Some(slot) = cursor {
            let Some(node) = self.nodes[slot] else {
                break;
            };
            if let Some(step) = node.step {
                steps.push(step);
            }
            cursor = node.prev;
        }
        steps.reverse();
        steps.extend(terminal.tail.iter().copied());
        Plan { steps }
    }
}

/// Edge weight and bookkeeping.
#[derive(Debug, Clone, Copy)]
struct Edge {
    cost: u32,
    step: Option<Step>,
    run: Option<u32>,
    continued: bool,
}

impl Edge {
    /// A move that stays in the current mode.
    fn keep(cost: u32, step: Step) -> Self {
        Self {
            cost,
            step: Some(step),
            run: None,
            continued: true,
        }
    }

    /// A latch or unlatch.
    fn switch(cost: u32, step: Step) -> Self {
        Self {
            cost,
            step: Some(step),
            run: None,
            continued: false,
        }
    }

    fn with_run(mut self, run: u32) -> Self {
        self.run = Some(run);
        self
    }
}

/// Cheapest ending that fits `capacity`; the first one wins ties.
fn best_fit(terminals: &[Terminal], capacity: usize) -> Option<&Terminal> {
    let capacity = capacity as u32;
    terminals
        .iter()
        .filter(|terminal| terminal.fits(capacity))
        .fold(None, |best: Option<&Terminal>, terminal| match best {
            Some(best) if best.cost <= terminal.cost => Some(best),
            _ => Some(terminal),
        })
}

/// # Encode
///
/// Shortest stream for `message` in the smallest permitted size.
pub fn encode(
    message: &Message,
    shape: Shape,
    pinned: Option<&'static SymbolSize>,
) -> Result<Outcome, EncodeError> {
    let mut search = Search::new(message);
    search.run();
    let terminals = search.terminals();

    let chosen = select::select_by(shape, pinned, |size| {
        best_fit(&terminals, size.capacity()).is_some()
    });

    let size = match chosen {
        Ok(size) => size,
        Err(overflow) => {
            let required = terminals
                .iter()
                .filter(|terminal| terminal.ending == Ending::Open)
                .map(|terminal| terminal.cost as usize)
                .min()
                .unwrap_or(usize::MAX);
            return Ok(Outcome::Overflow {
                required,
                largest: overflow.largest,
            });
        }
    };

    let Some(terminal) = best_fit(&terminals, size.capacity()) else {
        return Ok(Outcome::Overflow {
            required: size.capacity() + 1,
            largest: size,
        });
    };
    let plan = search.plan(terminal);
    let codewords = plan.to_codewords(message, size.capacity())?;

    tracing::trace!(modes = ?plan.modes(), "minimal plan");

    Ok(Outcome::Fits(Stream {
        plan,
        codewords,
        size,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Segment, prepare};
    use crate::options::EncodeOptions;
    use pretty_assertions::assert_eq;

    fn stream(data: &[u8], options: &EncodeOptions) -> Stream {
        let message = prepare(&[Segment::new(data)], options).unwrap();
        let pinned = options.version.and_then(SymbolSize::by_version);
        match encode(&message, options.shape, pinned).unwrap() {
            Outcome::Fits(stream) => stream,
            Outcome::Overflow { required, .. } => panic!("overflow, {} codewords", required),
        }
    }

    fn default_stream(data: &[u8]) -> Stream {
        stream(data, &EncodeOptions::default())
    }

    #[test]
    fn test_state_index_round_trip() {
        for index in 0..STATES {
            assert_eq!(State::from_index(index).index(), index);
        }
    }

    #[test]
    fn test_extended_pair_stays_ascii() {
        let s = default_stream(b"\xff\xfe");
        assert_eq!(s.codewords, vec![0xEB, 0x80, 0xEB, 0x7F]);
        assert_eq!((s.size.rows, s.size.columns), (12, 12));
    }

    #[test]
    fn test_digits_pack_in_pairs() {
        let s = default_stream(b"123456");
        assert_eq!(s.codewords, vec![142, 164, 186]);
        assert_eq!(s.size.rows, 10);
    }

    #[test]
    fn test_odd_digit_count() {
        // one single digit and two pairs, in some order
        let s = default_stream(b"12345");
        assert_eq!(s.codewords.len(), 3);
        assert_eq!(s.size.version, 1);
    }

    #[test]
    fn test_uppercase_run_uses_c40() {
        let s = default_stream(b"ABCDEFGHIJKL");
        // latch, four triplets and the unlatch
        assert_eq!(s.codewords[0], 230);
        assert_eq!(s.codewords.len(), 10);
        assert_eq!(s.codewords[9], 254);
    }

    #[test]
    fn test_lowercase_run_uses_text() {
        let s = default_stream(b"abcdefghijkl");
        assert_eq!(s.codewords[0], 239);
    }

    #[test]
    fn test_x12_run() {
        let s = default_stream(b"A*B*C*D*E*F*");
        assert_eq!(s.codewords[0], 238);
    }

    #[test]
    fn test_edifact_run() {
        let s = default_stream(b"A@B@C@D@E@F@G@H@");
        assert_eq!(s.codewords[0], 240);
    }

    #[test]
    fn test_binary_run_uses_base256() {
        let data: Vec<u8> = (0x80..0x90).collect();
        let s = default_stream(&data);
        assert_eq!(s.codewords[0], 231);
        assert_eq!(s.codewords.len(), 18);
    }

    #[test]
    fn test_base256_prefers_shorter_run_on_ties() {
        // Latching before the digit costs the same; the later latch keeps
        // the run one byte shorter
        let s = default_stream(b"1\x80\x81\x82\x83");
        assert_eq!(&s.plan.steps[..2], &[Step::Item(0), Step::Latch(Mode::Base256)]);
        assert_eq!(s.codewords.len(), 7);
        assert_eq!(s.codewords[0], b'1' + 1);
    }

    #[test]
    fn test_exact_fit_without_unlatch() {
        // one ASCII letter and three triplets fill 14x14 exactly
        let s = default_stream(b"ABCDEFGHIJ");
        assert_eq!(s.size.capacity(), 8);
        assert_eq!(s.codewords.len(), 8);
        assert!(s.codewords.contains(&230));
        assert!(!s.codewords.contains(&254));
    }

    #[test]
    fn test_pinned_size_too_small() {
        let message = prepare(&[Segment::new("ABCDEFGH")], &EncodeOptions::default()).unwrap();
        let outcome = encode(&message, Shape::Auto, SymbolSize::by_version(1)).unwrap();
        assert!(matches!(outcome, Outcome::Overflow { .. }));
    }

    #[test]
    fn test_largest_digit_input() {
        let data = vec![b'1'; 3116];
        let s = default_stream(&data);
        assert_eq!(s.size.version, 24);
        assert_eq!(s.codewords.len(), 1558);
    }

    #[test]
    fn test_largest_uppercase_input() {
        let data = vec![b'A'; 2335];
        let s = default_stream(&data);
        assert_eq!(s.size.version, 24);
        assert_eq!(s.codewords.len(), 1558);

        let message = prepare(&[Segment::new(vec![b'A'; 2336])], &EncodeOptions::default()).unwrap();
        let outcome = encode(&message, Shape::Auto, None).unwrap();
        assert!(matches!(outcome, Outcome::Overflow { .. }));
    }

    #[test]
    fn test_largest_binary_input() {
        let data = vec![0xA5u8; 1556];
        let s = default_stream(&data);
        assert_eq!(s.size.version, 24);
        assert_eq!(s.codewords.len(), 1558);

        let message = prepare(&[Segment::new(vec![0xA5u8; 1557])], &EncodeOptions::default()).unwrap();
        let outcome = encode(&message, Shape::Auto, None).unwrap();
        assert!(matches!(outcome, Outcome::Overflow { .. }));
    }
}
