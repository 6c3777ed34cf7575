//! Configuration for the spawned Agda process.

use serde::Deserialize;

fn default_command() -> String {
    String::from("agda")
}

fn default_args() -> Vec<String> {
    vec![String::from("--interaction-json")]
}

/// How to launch the compiler.
///
/// The defaults launch `agda --interaction-json` from `PATH`; overriding
/// `args` replaces the argument list wholesale, so a custom list must keep
/// the interaction flag itself.
#[derive(Debug, Clone, Deserialize)]
pub struct AgdaConfig {
    /// Executable name or path.
    #[serde(default = "default_command")]
    pub command: String,
    /// Arguments passed to the executable.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
}

impl Default for AgdaConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: default_args(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AgdaConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.command, "agda");
        assert_eq!(config.args, vec!["--interaction-json"]);
    }

    #[test]
    fn test_override_command() {
        let config: AgdaConfig =
            serde_json::from_value(serde_json::json!({ "command": "/opt/agda/bin/agda" }))
                .unwrap();
        assert_eq!(config.command, "/opt/agda/bin/agda");
        assert_eq!(config.args, vec!["--interaction-json"]);
    }

    #[test]
    fn test_override_args_replaces_wholesale() {
        let config: AgdaConfig = serde_json::from_value(serde_json::json!({
            "args": ["--interaction-json", "+RTS", "-M4G", "-RTS"]
        }))
        .unwrap();
        assert_eq!(config.args.len(), 4);
    }
}
