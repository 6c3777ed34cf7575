//! Editor boundary — how dispatched responses become text edits.
//!
//! The editor itself lives outside this crate; it shows up here only as
//! the [`TextSurface`] trait. All offsets crossing this boundary are
//! 0-based; the wire's 1-based positions are converted before any call.

use aim_types::InteractionPoint;

use crate::registry::InteractionPointRegistry;
use crate::response::Response;

/// The surface the controller edits in reaction to responses.
///
/// Offsets are 0-based character offsets into the document; `line_span`
/// resolves a 1-based source line (as the wire reports lines) to the
/// 0-based span of its text, which only the editor can know.
pub trait TextSurface {
    /// The current selection as `(start, end)` offsets.
    fn current_selection(&self) -> (usize, usize);
    /// The file path of the document under edit.
    fn document_identity(&self) -> String;
    /// Replace `[start, end]` with `text`.
    fn write_at(&mut self, start: usize, end: usize, text: &str);
    /// The `(start, end)` span of a source line, if the line exists.
    fn line_span(&self, line: usize) -> Option<(usize, usize)>;
    /// Render a status snapshot.
    fn show_status(&mut self, text: &str);
}

/// Apply one dispatched response to the surface and registry.
///
/// Responses with no text-surface meaning (including the unrecognized
/// sentinel) are ignored; the registry is only ever touched by a fresh
/// `InteractionPoints` enumeration.
pub fn apply_response<S: TextSurface>(
    surface: &mut S,
    registry: &mut InteractionPointRegistry,
    response: &Response,
) {
    match response {
        Response::InteractionPoints(points) => {
            tracing::debug!(count = points.len(), "new interaction point generation");
            registry.replace(points.clone());
        }
        Response::GiveAction {
            interaction_point,
            give_result,
        } => {
            if give_result.text.is_empty() {
                return;
            }
            let Some((start, end)) = goal_span(interaction_point) else {
                return;
            };
            surface.write_at(start, end, &give_result.text);
        }
        Response::MakeCase {
            interaction_point,
            clauses,
            ..
        } => {
            let Some(interval) = interaction_point.first_interval() else {
                tracing::warn!(id = interaction_point.id, "MakeCase for goal without a range");
                return;
            };
            let line = interval.start.line as usize;
            match surface.line_span(line) {
                Some((start, end)) => surface.write_at(start, end, &clauses.join("\n")),
                None => tracing::warn!(line, "MakeCase for a line the surface cannot resolve"),
            }
        }
        Response::SolveAll(solutions) => {
            // Rightmost first, so earlier splices don't shift later spans.
            let mut spans: Vec<(usize, usize, &str)> = solutions
                .iter()
                .filter_map(|solution| {
                    goal_span(&solution.interaction_point)
                        .map(|(start, end)| (start, end, solution.expression.as_str()))
                })
                .collect();
            spans.sort_by(|a, b| b.0.cmp(&a.0));
            for (start, end, expression) in spans {
                surface.write_at(start, end, expression);
            }
        }
        Response::DisplayInfo(info) => surface.show_status(&info.render()),
        Response::JumpToError { filepath, position } => {
            surface.show_status(&format!("Error at {filepath}:#{}", position.offset()));
        }
        Response::Unrecognized { kind } => {
            tracing::trace!(kind, "ignoring unrecognized response");
        }
        Response::ClearHighlighting
        | Response::DoneAborting
        | Response::DoneExiting
        | Response::ClearRunningInfo
        | Response::RunningInfo { .. }
        | Response::Status(_) => {}
    }
}

fn goal_span(point: &InteractionPoint) -> Option<(usize, usize)> {
    let span = point.first_interval().map(aim_types::Interval::offsets);
    if span.is_none() {
        tracing::warn!(id = point.id, "goal without a range");
    }
    span
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{DisplayInfo, Solution, decode_line};
    use aim_types::{GiveResult, Interval, Position};

    #[derive(Default)]
    struct MockSurface {
        writes: Vec<(usize, usize, String)>,
        statuses: Vec<String>,
        /// line → span, 1-based keys.
        lines: Vec<(usize, (usize, usize))>,
    }

    impl TextSurface for MockSurface {
        fn current_selection(&self) -> (usize, usize) {
            (0, 0)
        }

        fn document_identity(&self) -> String {
            "Foo.agda".into()
        }

        fn write_at(&mut self, start: usize, end: usize, text: &str) {
            self.writes.push((start, end, text.to_string()));
        }

        fn line_span(&self, line: usize) -> Option<(usize, usize)> {
            self.lines
                .iter()
                .find(|(l, _)| *l == line)
                .map(|(_, span)| *span)
        }

        fn show_status(&mut self, text: &str) {
            self.statuses.push(text.to_string());
        }
    }

    fn point(id: u32, start: u32, end: u32) -> InteractionPoint {
        InteractionPoint {
            id,
            range: vec![Interval {
                start: Position {
                    pos: start,
                    line: 3,
                    col: 1,
                },
                end: Position {
                    pos: end,
                    line: 3,
                    col: 1 + end - start,
                },
            }],
        }
    }

    #[test]
    fn test_interaction_points_replace_registry_generation() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![point(9, 1, 2)]);

        let response = decode_line(
            r#"JSON> {"kind":"InteractionPoints","interactionPoints":[{"id":0,"range":[]}]}"#,
        )
        .unwrap();
        apply_response(&mut surface, &mut registry, &response);

        assert_eq!(registry.lookup(0).unwrap().id, 0);
        assert!(registry.lookup(9).is_err());
        assert!(surface.writes.is_empty());
    }

    #[test]
    fn test_give_action_writes_goal_range_zero_based() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();

        // Wire positions 10/14 become the 0-based splice 9..13.
        let response = Response::GiveAction {
            interaction_point: point(2, 10, 14),
            give_result: GiveResult {
                text: "suc n".into(),
                paren: false,
            },
        };
        apply_response(&mut surface, &mut registry, &response);

        assert_eq!(surface.writes, vec![(9, 13, "suc n".to_string())]);
    }

    #[test]
    fn test_give_action_with_empty_text_writes_nothing() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();

        let response = Response::GiveAction {
            interaction_point: point(2, 10, 14),
            give_result: GiveResult {
                text: String::new(),
                paren: false,
            },
        };
        apply_response(&mut surface, &mut registry, &response);

        assert!(surface.writes.is_empty());
    }

    #[test]
    fn test_make_case_replaces_goal_line_with_joined_clauses() {
        let mut surface = MockSurface {
            lines: vec![(3, (40, 60))],
            ..MockSurface::default()
        };
        let mut registry = InteractionPointRegistry::new();

        let response = Response::MakeCase {
            interaction_point: point(1, 45, 50),
            variant: "Function".into(),
            clauses: vec!["f zero = ?".into(), "f (suc n) = ?".into()],
        };
        apply_response(&mut surface, &mut registry, &response);

        assert_eq!(
            surface.writes,
            vec![(40, 60, "f zero = ?\nf (suc n) = ?".to_string())]
        );
    }

    #[test]
    fn test_make_case_with_unresolvable_line_writes_nothing() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();

        let response = Response::MakeCase {
            interaction_point: point(1, 45, 50),
            variant: "Function".into(),
            clauses: vec!["f zero = ?".into()],
        };
        apply_response(&mut surface, &mut registry, &response);

        assert!(surface.writes.is_empty());
    }

    #[test]
    fn test_solve_all_writes_rightmost_first() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();

        let response = Response::SolveAll(vec![
            Solution {
                interaction_point: point(0, 10, 14),
                expression: "zero".into(),
            },
            Solution {
                interaction_point: point(1, 30, 35),
                expression: "suc n".into(),
            },
        ]);
        apply_response(&mut surface, &mut registry, &response);

        assert_eq!(
            surface.writes,
            vec![
                (29, 34, "suc n".to_string()),
                (9, 13, "zero".to_string()),
            ]
        );
    }

    #[test]
    fn test_display_info_shows_status() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();

        let response = Response::DisplayInfo(DisplayInfo::Error {
            message: "type mismatch".into(),
        });
        apply_response(&mut surface, &mut registry, &response);

        assert_eq!(surface.statuses, vec!["Error:\ntype mismatch\n".to_string()]);
        assert!(surface.writes.is_empty());
    }

    #[test]
    fn test_jump_to_error_shows_zero_based_offset() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();

        let response = decode_line(
            r#"{"kind":"JumpToError","filepath":"Foo.agda","position":{"pos":42,"line":3,"col":7}}"#,
        )
        .unwrap();
        apply_response(&mut surface, &mut registry, &response);

        assert_eq!(surface.statuses, vec!["Error at Foo.agda:#41".to_string()]);
    }

    #[test]
    fn test_unrecognized_response_has_no_effect() {
        let mut surface = MockSurface::default();
        let mut registry = InteractionPointRegistry::new();
        registry.replace(vec![point(0, 1, 2)]);

        let response = decode_line(r#"{"kind":"Bogus"}"#).unwrap();
        apply_response(&mut surface, &mut registry, &response);

        assert!(surface.writes.is_empty());
        assert!(surface.statuses.is_empty());
        assert_eq!(registry.points().len(), 1);
    }
}
