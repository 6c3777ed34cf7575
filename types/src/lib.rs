//! Domain types for the Agda interaction protocol.
//!
//! This crate contains pure wire-level types with no IO and no async.
//! Agda reports source locations 1-based; editors address text 0-based.
//! The conversion between the two lives here, in exactly one place
//! ([`Position::offset`]), so callers never apply the `- 1` themselves.

use serde::Deserialize;

/// A point in source text as Agda reports it: all coordinates 1-based.
///
/// `pos` is the character offset into the file, `line`/`col` the
/// human-facing location of the same point.
/// `line` and `col` default to 0 when the compiler omits them; some
/// response payloads carry `pos`-only positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub pos: u32,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub col: u32,
}

impl Position {
    /// The 0-based character offset of this position.
    ///
    /// This is the only place the wire's 1-based coordinates are adjusted;
    /// a `pos` of 0 (which Agda never emits) saturates rather than wraps.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.pos as usize).saturating_sub(1)
    }
}

/// A contiguous span of source text, `start.pos <= end.pos`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Interval {
    pub start: Position,
    pub end: Position,
}

impl Interval {
    /// Whether the 0-based query span `[start0, end0]` lies inside this
    /// interval, bounds inclusive.
    #[must_use]
    pub fn contains(&self, start0: usize, end0: usize) -> bool {
        self.start.offset() <= start0 && end0 <= self.end.offset()
    }

    /// The interval as a 0-based `(start, end)` offset pair.
    #[must_use]
    pub fn offsets(&self) -> (usize, usize) {
        (self.start.offset(), self.end.offset())
    }
}

/// An ordered sequence of intervals; length 1 for a normal contiguous goal.
pub type Range = Vec<Interval>;

/// A numbered goal in the loaded document, paired with its current range.
///
/// Ids are only meaningful within one generation of the loaded file; a
/// fresh `Cmd_load` invalidates every previously issued id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionPoint {
    pub id: u32,
    #[serde(default)]
    pub range: Range,
}

impl InteractionPoint {
    /// The first interval of the goal's range, if any.
    #[must_use]
    pub fn first_interval(&self) -> Option<&Interval> {
        self.range.first()
    }
}

/// The expression Agda produced for a filled goal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GiveResult {
    /// `str` on the wire, which is a keyword here.
    #[serde(rename = "str", default)]
    pub text: String,
    #[serde(default)]
    pub paren: bool,
}
