//! Registry of the current generation of interaction points.
//!
//! The compiler enumerates goals afresh on every load; the registry keeps
//! exactly that one snapshot and is replaced wholesale, never merged. Ids
//! from an older generation silently stop resolving — the protocol itself
//! performs no staleness check, so using a stale id is a caller error.
//!
//! The type is plain data. If the task consuming `InteractionPoints`
//! responses and the task building goal-relative commands differ, the
//! caller must serialize access (single writer, any readers).

use aim_types::InteractionPoint;

/// A lookup that found nothing in the current generation.
///
/// Recoverable: the caller repositions the cursor or reloads the file.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no interaction point with id {0} in the current generation")]
    UnknownId(u32),
    #[error("no goal at that position; move the cursor inside a goal and reload if needed")]
    NoGoalAtRange,
}

/// The id → range table for goals in the loaded document.
#[derive(Debug, Default)]
pub struct InteractionPointRegistry {
    points: Vec<InteractionPoint>,
}

impl InteractionPointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a fresh generation, discarding the previous one in full.
    pub fn replace(&mut self, points: Vec<InteractionPoint>) {
        self.points = points;
    }

    /// All points of the current generation, in wire order.
    #[must_use]
    pub fn points(&self) -> &[InteractionPoint] {
        &self.points
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point with the given id, if it exists in this generation.
    pub fn lookup(&self, id: u32) -> Result<&InteractionPoint, LookupError> {
        self.points
            .iter()
            .find(|p| p.id == id)
            .ok_or(LookupError::UnknownId(id))
    }

    /// The point whose first interval contains the 0-based query span.
    ///
    /// Containment is inclusive on both ends; ids are assumed unique and
    /// goals non-overlapping, so the first hit wins.
    pub fn lookup_by_range(
        &self,
        start0: usize,
        end0: usize,
    ) -> Result<&InteractionPoint, LookupError> {
        self.points
            .iter()
            .find(|p| {
                p.first_interval()
                    .is_some_and(|interval| interval.contains(start0, end0))
            })
            .ok_or(LookupError::NoGoalAtRange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aim_types::{Interval, Position};

    fn point(id: u32, start: u32, end: u32) -> InteractionPoint {
        InteractionPoint {
            id,
            range: vec![Interval {
                start: Position {
                    pos: start,
                    line: 1,
                    col: start,
                },
                end: Position {
                    pos: end,
                    line: 1,
                    col: end,
                },
            }],
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![point(0, 10, 14), point(1, 30, 35)]);
        assert_eq!(registry.lookup(1).unwrap().id, 1);
        assert_eq!(registry.lookup(7), Err(LookupError::UnknownId(7)));
    }

    #[test]
    fn test_replace_discards_previous_generation() {
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![point(0, 10, 14), point(1, 30, 35)]);
        registry.replace(vec![point(2, 5, 9)]);

        assert_eq!(registry.lookup(0), Err(LookupError::UnknownId(0)));
        assert_eq!(registry.lookup(1), Err(LookupError::UnknownId(1)));
        assert_eq!(registry.lookup(2).unwrap().id, 2);
        assert_eq!(registry.points().len(), 1);
    }

    #[test]
    fn test_replace_with_empty_clears() {
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![point(0, 10, 14)]);
        registry.replace(vec![]);
        assert!(registry.is_empty());
        assert_eq!(registry.lookup(0), Err(LookupError::UnknownId(0)));
    }

    #[test]
    fn test_lookup_by_range_inclusive_bounds() {
        let mut registry = InteractionPointRegistry::new();
        // wire 10..14 contains 0-based queries within 9..13
        registry.replace(vec![point(0, 10, 14)]);

        assert_eq!(registry.lookup_by_range(9, 13).unwrap().id, 0);
        assert_eq!(registry.lookup_by_range(10, 12).unwrap().id, 0);
        assert_eq!(registry.lookup_by_range(9, 9).unwrap().id, 0);
        assert_eq!(registry.lookup_by_range(8, 13), Err(LookupError::NoGoalAtRange));
        assert_eq!(registry.lookup_by_range(9, 14), Err(LookupError::NoGoalAtRange));
    }

    #[test]
    fn test_lookup_by_range_picks_containing_goal() {
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![point(0, 10, 14), point(1, 30, 35)]);
        assert_eq!(registry.lookup_by_range(30, 33).unwrap().id, 1);
        assert_eq!(registry.lookup_by_range(20, 21), Err(LookupError::NoGoalAtRange));
    }

    #[test]
    fn test_lookup_by_range_skips_rangeless_points() {
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![InteractionPoint { id: 0, range: vec![] }, point(1, 10, 14)]);
        assert_eq!(registry.lookup_by_range(9, 13).unwrap().id, 1);
    }

    #[test]
    fn test_error_message_tells_caller_to_reposition() {
        let registry = InteractionPointRegistry::new();
        let err = registry.lookup_by_range(0, 0).unwrap_err();
        assert!(err.to_string().contains("move the cursor inside a goal"));
    }
}
