//! Inbound response decoding.
//!
//! Every line Agda writes is `JSON> {object}` — a fixed prompt marker
//! followed by a JSON object whose top-level `kind` string selects the
//! response variant. `DisplayInfo` and `GoalSpecific` repeat the same
//! discriminate-then-decode step one level deeper. A `kind` outside the
//! known set is not an error: it decodes to the [`Response::Unrecognized`]
//! sentinel so a future compiler can add variants without breaking us.

use aim_types::{GiveResult, InteractionPoint, Position, Range};
use serde::Deserialize;
use serde_json::Value;

/// Literal prefix Agda puts on every stdout line in interaction mode.
pub const PROMPT: &str = "JSON> ";

/// A line that could not be decoded.
///
/// Recoverable by policy: the caller logs it, drops the line, and keeps
/// reading. Only known-`kind` payloads with the wrong shape fail; unknown
/// kinds succeed as the sentinel.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("line is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response has no string `kind` discriminator")]
    MissingKind,
    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Decode one stdout line into a typed response.
///
/// The prompt marker is stripped when present; a line without it is used
/// unmodified (Agda omits the prompt on the very first line of a session).
pub fn decode_line(line: &str) -> Result<Response, DecodeError> {
    let body = line.strip_prefix(PROMPT).unwrap_or(line).trim_end();
    let value: Value = serde_json::from_str(body)?;
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingKind)?
        .to_string();

    let payload_err = |source| DecodeError::Payload {
        kind: kind.clone(),
        source,
    };

    let response = match kind.as_str() {
        "DisplayInfo" => {
            let info = value.get("info").cloned().unwrap_or(Value::Null);
            Response::DisplayInfo(DisplayInfo::decode(info)?)
        }
        "ClearHighlighting" => Response::ClearHighlighting,
        "DoneAborting" => Response::DoneAborting,
        "DoneExiting" => Response::DoneExiting,
        "ClearRunningInfo" => Response::ClearRunningInfo,
        "RunningInfo" => {
            let p: RunningInfoParams = serde_json::from_value(value).map_err(payload_err)?;
            Response::RunningInfo {
                debug_level: p.debug_level,
                message: p.message,
            }
        }
        "Status" => {
            let p: StatusParams = serde_json::from_value(value).map_err(payload_err)?;
            Response::Status(p.status)
        }
        "JumpToError" => {
            let p: JumpToErrorParams = serde_json::from_value(value).map_err(payload_err)?;
            Response::JumpToError {
                filepath: p.filepath,
                position: p.position,
            }
        }
        "InteractionPoints" => {
            let p: InteractionPointsParams =
                serde_json::from_value(value).map_err(payload_err)?;
            Response::InteractionPoints(p.interaction_points)
        }
        "GiveAction" => {
            let p: GiveActionParams = serde_json::from_value(value).map_err(payload_err)?;
            Response::GiveAction {
                interaction_point: p.interaction_point,
                give_result: p.give_result,
            }
        }
        "MakeCase" => {
            let p: MakeCaseParams = serde_json::from_value(value).map_err(payload_err)?;
            Response::MakeCase {
                interaction_point: p.interaction_point,
                variant: p.variant,
                clauses: p.clauses,
            }
        }
        "SolveAll" => {
            let p: SolveAllParams = serde_json::from_value(value).map_err(payload_err)?;
            Response::SolveAll(p.solutions)
        }
        _ => Response::Unrecognized { kind },
    };
    Ok(response)
}

/// One decoded response frame from the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    DisplayInfo(DisplayInfo),
    ClearHighlighting,
    DoneAborting,
    DoneExiting,
    ClearRunningInfo,
    RunningInfo { debug_level: i64, message: String },
    Status(Status),
    JumpToError { filepath: String, position: Position },
    /// Fresh enumeration of the goals in the loaded file. Replaces the
    /// registry's entire previous generation.
    InteractionPoints(Vec<InteractionPoint>),
    /// A goal was filled; carries the text to splice into its range.
    GiveAction {
        interaction_point: InteractionPoint,
        give_result: GiveResult,
    },
    /// A case split succeeded; carries the replacement clause lines.
    MakeCase {
        interaction_point: InteractionPoint,
        variant: String,
        clauses: Vec<String>,
    },
    SolveAll(Vec<Solution>),
    /// Forward-compatibility sentinel for a `kind` outside the known set.
    /// Forwarded like any response; consumers normally ignore it.
    Unrecognized { kind: String },
}

/// Compiler status line state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// Are implicit arguments displayed?
    #[serde(default)]
    pub show_implicit_arguments: bool,
    /// Has the module been successfully type-checked?
    #[serde(default)]
    pub checked: bool,
}

/// One solved goal from a `SolveAll` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub interaction_point: InteractionPoint,
    #[serde(default)]
    pub expression: String,
}

// Per-kind payload shells, one decode step away from the enum variants.
// Missing fields default, mirroring the leniency of the wire.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunningInfoParams {
    #[serde(default)]
    debug_level: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    #[serde(default)]
    status: Status,
}

#[derive(Debug, Deserialize)]
struct JumpToErrorParams {
    #[serde(default)]
    filepath: String,
    position: Position,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteractionPointsParams {
    #[serde(default)]
    interaction_points: Vec<InteractionPoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GiveActionParams {
    interaction_point: InteractionPoint,
    give_result: GiveResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MakeCaseParams {
    interaction_point: InteractionPoint,
    #[serde(default)]
    variant: String,
    #[serde(default)]
    clauses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SolveAllParams {
    #[serde(default)]
    solutions: Vec<Solution>,
}

/// Human-facing diagnostic payload, polymorphic over its own `kind`.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayInfo {
    CompilationOk {
        warnings: String,
        errors: String,
    },
    Constraints(Vec<OutputForm>),
    AllGoalsWarnings {
        warnings: String,
        errors: String,
        visible_goals: Vec<OutputConstraint>,
        invisible_goals: Vec<OutputConstraint>,
    },
    Time {
        time: String,
    },
    Error {
        message: String,
    },
    IntroNotFound,
    Auto {
        info: String,
    },
    ModuleContents {
        contents: Vec<NamedType>,
        names: Vec<String>,
        telescope: Vec<DomType>,
    },
    SearchAbout {
        results: Vec<Vec<NamedType>>,
        search: String,
    },
    WhyInScope {
        thing: String,
        filepath: String,
        message: String,
    },
    NormalForm {
        command_state: CommandState,
        compute_mode: String,
        time: String,
        expr: String,
    },
    InferredType {
        command_state: CommandState,
        time: String,
        expr: String,
    },
    Context {
        interaction_point: InteractionPoint,
        context: Vec<ContextEntry>,
    },
    Version {
        version: String,
    },
    GoalSpecific {
        interaction_point: InteractionPoint,
        goal_info: GoalInfo,
    },
    Unrecognized {
        kind: String,
    },
}

impl DisplayInfo {
    fn decode(info: Value) -> Result<Self, DecodeError> {
        let kind = info
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingKind)?
            .to_string();

        let payload_err = |source| DecodeError::Payload {
            kind: format!("DisplayInfo/{kind}"),
            source,
        };

        let decoded = match kind.as_str() {
            "CompilationOk" => {
                let p: WarningsErrorsParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::CompilationOk {
                    warnings: p.warnings,
                    errors: p.errors,
                }
            }
            "Constraints" => {
                let p: ConstraintsParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::Constraints(p.constraints)
            }
            "AllGoalsWarnings" => {
                let p: AllGoalsWarningsParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::AllGoalsWarnings {
                    warnings: p.warnings,
                    errors: p.errors,
                    visible_goals: p.visible_goals,
                    invisible_goals: p.invisible_goals,
                }
            }
            "Time" => {
                let p: TimeParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::Time { time: p.time }
            }
            "Error" => {
                let p: ErrorParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::Error { message: p.message }
            }
            "IntroNotFound" => Self::IntroNotFound,
            "Auto" => {
                let p: AutoParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::Auto { info: p.info }
            }
            "ModuleContents" => {
                let p: ModuleContentsParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::ModuleContents {
                    contents: p.contents,
                    names: p.names,
                    telescope: p.telescope,
                }
            }
            "SearchAbout" => {
                let p: SearchAboutParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::SearchAbout {
                    results: p.results,
                    search: p.search,
                }
            }
            "WhyInScope" => {
                let p: WhyInScopeParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::WhyInScope {
                    thing: p.thing,
                    filepath: p.filepath,
                    message: p.message,
                }
            }
            "NormalForm" => {
                let p: NormalFormParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::NormalForm {
                    command_state: p.command_state,
                    compute_mode: p.compute_mode,
                    time: p.time,
                    expr: p.expr,
                }
            }
            "InferredType" => {
                let p: InferredTypeParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::InferredType {
                    command_state: p.command_state,
                    time: p.time,
                    expr: p.expr,
                }
            }
            "Context" => {
                let p: ContextParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::Context {
                    interaction_point: p.interaction_point,
                    context: p.context,
                }
            }
            "Version" => {
                let p: VersionParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::Version { version: p.version }
            }
            "GoalSpecific" => {
                let interaction_point = serde_json::from_value(
                    info.get("interactionPoint").cloned().unwrap_or(Value::Null),
                )
                .map_err(payload_err)?;
                let goal_info =
                    GoalInfo::decode(info.get("goalInfo").cloned().unwrap_or(Value::Null))?;
                Self::GoalSpecific {
                    interaction_point,
                    goal_info,
                }
            }
            _ => Self::Unrecognized { kind },
        };
        Ok(decoded)
    }

    /// Plain-text snapshot of this payload for a status surface.
    #[must_use]
    pub fn render(&self) -> String {
        fn section(out: &mut String, title: &str, body: &str) {
            if !body.is_empty() {
                out.push_str(title);
                out.push_str(":\n");
                out.push_str(body);
                out.push('\n');
            }
        }

        let mut out = String::new();
        match self {
            Self::CompilationOk { warnings, errors } => {
                out.push_str("Compilation OK\n");
                section(&mut out, "Warnings", warnings);
                section(&mut out, "Errors", errors);
            }
            Self::Constraints(constraints) => {
                section(&mut out, "Constraints", &constraints.len().to_string());
            }
            Self::AllGoalsWarnings {
                warnings,
                errors,
                visible_goals,
                invisible_goals,
            } => {
                section(&mut out, "Warnings", warnings);
                section(&mut out, "Errors", errors);
                if !visible_goals.is_empty() {
                    out.push_str("VisibleGoals:\n");
                    for goal in visible_goals {
                        out.push_str(&goal.render_line());
                    }
                }
                if !invisible_goals.is_empty() {
                    out.push_str("InvisibleGoals:\n");
                    for goal in invisible_goals {
                        out.push_str(&goal.render_line());
                    }
                }
            }
            Self::Time { time } => section(&mut out, "Time", time),
            Self::Error { message } => section(&mut out, "Error", message),
            Self::IntroNotFound => out.push_str("Intro: no candidates found\n"),
            Self::Auto { info } => section(&mut out, "Auto", info),
            Self::ModuleContents { contents, .. } => {
                for named in contents {
                    out.push_str(&format!("{} : {}\n", named.name, named.term));
                }
            }
            Self::SearchAbout { results, search } => {
                section(&mut out, "Search", search);
                for group in results {
                    for named in group {
                        out.push_str(&format!("{} : {}\n", named.name, named.term));
                    }
                }
            }
            Self::WhyInScope { message, .. } => section(&mut out, "InScope", message),
            Self::NormalForm { expr, .. } | Self::InferredType { expr, .. } => {
                section(&mut out, "Expr", expr);
            }
            Self::Context { context, .. } => {
                for entry in context {
                    out.push_str(&format!("{}\n", entry.reified_name));
                }
            }
            Self::Version { version } => section(&mut out, "Agda", version),
            Self::GoalSpecific { goal_info, .. } => {
                if let Some(ty) = goal_info.goal_type() {
                    section(&mut out, "Goal", ty);
                }
            }
            Self::Unrecognized { kind } => {
                out.push_str(&format!("(unrecognized info: {kind})\n"));
            }
        }
        out
    }
}

#[derive(Debug, Deserialize)]
struct WarningsErrorsParams {
    #[serde(default)]
    warnings: String,
    #[serde(default)]
    errors: String,
}

#[derive(Debug, Deserialize)]
struct ConstraintsParams {
    #[serde(default)]
    constraints: Vec<OutputForm>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllGoalsWarningsParams {
    #[serde(default)]
    warnings: String,
    #[serde(default)]
    errors: String,
    #[serde(default)]
    visible_goals: Vec<OutputConstraint>,
    #[serde(default)]
    invisible_goals: Vec<OutputConstraint>,
}

#[derive(Debug, Deserialize)]
struct TimeParams {
    #[serde(default)]
    time: String,
}

#[derive(Debug, Deserialize)]
struct ErrorParams {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AutoParams {
    #[serde(default)]
    info: String,
}

#[derive(Debug, Deserialize)]
struct ModuleContentsParams {
    #[serde(default)]
    contents: Vec<NamedType>,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    telescope: Vec<DomType>,
}

#[derive(Debug, Deserialize)]
struct SearchAboutParams {
    #[serde(default)]
    results: Vec<Vec<NamedType>>,
    #[serde(default)]
    search: String,
}

#[derive(Debug, Deserialize)]
struct WhyInScopeParams {
    #[serde(default)]
    thing: String,
    #[serde(default)]
    filepath: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NormalFormParams {
    #[serde(default)]
    command_state: CommandState,
    #[serde(default)]
    compute_mode: String,
    #[serde(default)]
    time: String,
    #[serde(default)]
    expr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InferredTypeParams {
    #[serde(default)]
    command_state: CommandState,
    #[serde(default)]
    time: String,
    #[serde(default)]
    expr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextParams {
    interaction_point: InteractionPoint,
    #[serde(default)]
    context: Vec<ContextEntry>,
}

#[derive(Debug, Deserialize)]
struct VersionParams {
    #[serde(default)]
    version: String,
}

/// Goal-specific diagnostic payload, the second nested union.
#[derive(Debug, Clone, PartialEq)]
pub enum GoalInfo {
    HelperFunction {
        signature: Value,
    },
    NormalForm {
        compute_mode: String,
        expr: String,
    },
    GoalType {
        rewrite: String,
        type_aux: Value,
        expr: String,
        ty: String,
        boundary: Vec<String>,
        output_forms: Vec<String>,
    },
    CurrentGoal {
        rewrite: String,
        ty: String,
    },
    InferredType {
        expr: String,
    },
    Unrecognized {
        kind: String,
    },
}

impl GoalInfo {
    fn decode(info: Value) -> Result<Self, DecodeError> {
        let kind = info
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingKind)?
            .to_string();

        let payload_err = |source| DecodeError::Payload {
            kind: format!("GoalSpecific/{kind}"),
            source,
        };

        let decoded = match kind.as_str() {
            "HelperFunction" => {
                let p: HelperFunctionParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::HelperFunction {
                    signature: p.signature,
                }
            }
            "NormalForm" => {
                let p: GoalNormalFormParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::NormalForm {
                    compute_mode: p.compute_mode,
                    expr: p.expr,
                }
            }
            "GoalType" => {
                let p: GoalTypeParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::GoalType {
                    rewrite: p.rewrite,
                    type_aux: p.type_aux,
                    expr: p.expr,
                    ty: p.ty,
                    boundary: p.boundary,
                    output_forms: p.output_forms,
                }
            }
            "CurrentGoal" => {
                let p: CurrentGoalParams = serde_json::from_value(info).map_err(payload_err)?;
                Self::CurrentGoal {
                    rewrite: p.rewrite,
                    ty: p.ty,
                }
            }
            "InferredType" => {
                let p: GoalInferredTypeParams =
                    serde_json::from_value(info).map_err(payload_err)?;
                Self::InferredType { expr: p.expr }
            }
            _ => Self::Unrecognized { kind },
        };
        Ok(decoded)
    }

    /// The goal's type, for payloads that carry one.
    #[must_use]
    pub fn goal_type(&self) -> Option<&str> {
        match self {
            Self::GoalType { ty, .. } | Self::CurrentGoal { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct HelperFunctionParams {
    #[serde(default)]
    signature: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoalNormalFormParams {
    #[serde(default)]
    compute_mode: String,
    #[serde(default)]
    expr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoalTypeParams {
    #[serde(default)]
    rewrite: String,
    #[serde(default)]
    type_aux: Value,
    #[serde(default)]
    expr: String,
    #[serde(rename = "type", default)]
    ty: String,
    #[serde(default)]
    boundary: Vec<String>,
    #[serde(default)]
    output_forms: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CurrentGoalParams {
    #[serde(default)]
    rewrite: String,
    #[serde(rename = "type", default)]
    ty: String,
}

#[derive(Debug, Deserialize)]
struct GoalInferredTypeParams {
    #[serde(default)]
    expr: String,
}

// Auxiliary wire shapes shared by the diagnostic payloads. Agda's own
// encoding is irregular here; fields the compiler omits default, fields
// it types loosely stay `Value`.

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputForm {
    #[serde(default)]
    pub range: Range,
    #[serde(default)]
    pub problems: Vec<u32>,
    #[serde(default)]
    pub constraint: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConstraint {
    #[serde(default)]
    pub kind: String,
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub of_type: String,
    #[serde(default)]
    pub comparison: String,
    #[serde(default)]
    pub constraint_obj: Value,
    #[serde(default)]
    pub constraint_objs: Vec<Value>,
    #[serde(default)]
    pub value: String,
}

impl OutputConstraint {
    fn render_line(&self) -> String {
        let obj = match &self.constraint_obj {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        };
        format!("?{obj} : {}\n", self.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedType {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DomType {
    #[serde(default)]
    pub dom: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub finite: Value,
    #[serde(default)]
    pub cohesion: String,
    #[serde(default)]
    pub relevance: String,
    #[serde(default)]
    pub hiding: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandState {
    #[serde(default)]
    pub interaction_points: Vec<InteractionPoint>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextEntry {
    #[serde(default)]
    pub original_name: String,
    #[serde(default)]
    pub reified_name: String,
    #[serde(default)]
    pub binding: Value,
    #[serde(default)]
    pub in_scope: bool,
}
