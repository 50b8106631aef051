//! Typed failures of a single bpftool invocation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}: {}", exit_label(.code), .stderr.trim())]
    Exit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to decode output of `{command}`: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected output from `{command}`: {reason}")]
    Malformed { command: String, reason: String },
}

impl ProbeError {
    /// The command line that failed, for log lines and error panes.
    pub fn command(&self) -> &str {
        match self {
            Self::Launch { command, .. }
            | Self::Exit { command, .. }
            | Self::Decode { command, .. }
            | Self::Malformed { command, .. } => command,
        }
    }
}

/// Rejected map edits. Checked before bpftool runs so the kernel never sees
/// a wrongly sized key or value.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("{what} must be {expected} bytes, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("map {0} is frozen")]
    Frozen(u32),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
