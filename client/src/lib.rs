//! Client for Agda's `--interaction-json` protocol.
//!
//! Spawns the compiler as a subprocess, encodes `IOTCM` commands onto its
//! stdin, decodes the prompt-prefixed JSON response stream from stdout,
//! and tracks the current generation of interaction points so responses
//! can be mapped back to document offsets.

pub mod command;
pub mod registry;
pub mod response;
pub mod surface;

mod config;
mod session;

pub use command::Command;
pub use config::AgdaConfig;
pub use registry::{InteractionPointRegistry, LookupError};
pub use response::{DecodeError, DisplayInfo, GoalInfo, PROMPT, Response, decode_line};
pub use session::{AgdaSession, SessionEndReason, SessionEvent};
pub use surface::{TextSurface, apply_response};
