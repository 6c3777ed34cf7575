//! Outbound command encoding.
//!
//! Agda's interaction mode takes newline-delimited `IOTCM` expressions on
//! stdin. Commands are ephemeral values: built, encoded, written, dropped.
//! There is no request id on the wire — correlation with a later response
//! is by response content only.

use std::fmt::Write as _;

/// A single interaction-mode request.
///
/// Goal-relative variants carry the numeric goal index from the current
/// [`InteractionPointRegistry`](crate::InteractionPointRegistry) generation
/// and the goal's textual content where the command needs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Type-check the session file.
    Load { args: Vec<String> },
    /// Compile the session file with the default backend.
    Compile { args: Vec<String> },
    /// List outstanding constraints.
    Constraints,
    /// List unsolved metavariables.
    Metas,
    /// Show the contents of a top-level module.
    ShowModuleContents { module: String },
    /// Solve every solvable goal.
    SolveAll,
    /// Solve one goal.
    SolveOne { goal: u32, text: String },
    /// Run the Auto proof search on every goal.
    AutoAll,
    /// Run the Auto proof search on one goal, hinted by the goal content.
    AutoOne { goal: u32, text: String },
    /// Case split on a variable in a goal.
    MakeCase { goal: u32, variable: String },
    /// Refine a goal with the given expression.
    Refine { goal: u32, text: String },
    /// Ask for the type of a goal.
    GoalType { goal: u32 },
}

impl Command {
    /// Encode this command into the exact wire string for `file`.
    ///
    /// The result is `IOTCM "<file>" None Direct (<payload>)` followed by
    /// exactly one newline; the newline is the only framing the compiler
    /// has, and omitting it stalls the subprocess forever.
    ///
    /// Embedded text (file path, goal content, module name) is inserted
    /// verbatim with no escaping, matching what the compiler expects. A
    /// double quote inside goal content corrupts the payload grammar; the
    /// wire format offers no escape for it.
    #[must_use]
    pub fn encode(&self, file: &str) -> String {
        let mut payload = String::new();
        match self {
            Self::Load { args } => {
                let _ = write!(payload, r#"Cmd_load "{file}" [{}]"#, args.join(","));
            }
            Self::Compile { args } => {
                let _ = write!(payload, r#"Cmd_compile agda "{file}" [{}]"#, args.join(","));
            }
            Self::Constraints => payload.push_str("Cmd_constraints"),
            Self::Metas => payload.push_str("Cmd_metas"),
            Self::ShowModuleContents { module } => {
                let _ = write!(
                    payload,
                    r#"Cmd_show_module_contents_toplevel AsIs "{module}""#
                );
            }
            Self::SolveAll => payload.push_str("Cmd_solveAll AsIs"),
            Self::SolveOne { goal, text } => {
                let _ = write!(payload, r#"Cmd_solveOne AsIs {goal} noRange "{text}""#);
            }
            Self::AutoAll => payload.push_str("Cmd_autoAll AsIs"),
            Self::AutoOne { goal, text } => {
                let _ = write!(payload, r#"Cmd_autoOne {goal} noRange "{text}""#);
            }
            Self::MakeCase { goal, variable } => {
                let _ = write!(payload, r#"Cmd_make_case {goal} noRange "{variable}""#);
            }
            Self::Refine { goal, text } => {
                let _ = write!(payload, r#"Cmd_refine {goal} noRange "{text}""#);
            }
            Self::GoalType { goal } => {
                let _ = write!(payload, r#"Cmd_goal_type Simplified {goal} noRange """#);
            }
        }
        format!("IOTCM \"{file}\" None Direct ({payload})\n")
    }
}
