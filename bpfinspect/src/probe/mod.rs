//! Invocation of the external `bpftool` binary.
//!
//! Every query is a [`Probe`]: a fixed argument list plus the serde schema its
//! JSON output must match. [`invoke`] runs one through a [`ToolRunner`] and
//! returns the decoded records, or a [`ProbeError`] telling launch, exit and
//! decode failures apart. Callers decide how severe a failure is.

pub mod schema;

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::de::DeserializeOwned;

use crate::error::ProbeError;

/// Captured output of a successful tool run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Something that can execute the introspection tool.
///
/// The production implementation is [`Bpftool`]; tests substitute scripted
/// runners so the pipeline can be exercised without root.
pub trait ToolRunner: Send + Sync {
    /// Run the tool with `args`. A non-zero exit is an error.
    fn run(&self, args: &[String]) -> Result<ToolOutput, ProbeError>;

    /// Human-readable command line, used in errors and logs.
    fn command_line(&self, args: &[String]) -> String {
        format!("bpftool {}", args.join(" "))
    }
}

/// Runs a real bpftool binary, through `sudo` when not already root.
#[derive(Debug, Clone)]
pub struct Bpftool {
    path: PathBuf,
    sudo: bool,
}

impl Bpftool {
    pub fn new(path: impl Into<PathBuf>, use_sudo: bool) -> Self {
        let sudo = use_sudo && !nix::unistd::geteuid().is_root();
        Self {
            path: path.into(),
            sudo,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uses_sudo(&self) -> bool {
        self.sudo
    }

    /// Ask sudo for credentials up front, while the terminal is still in
    /// cooked mode. Later invocations run with `sudo -n` and must not prompt.
    pub fn prime_sudo(&self) -> std::io::Result<bool> {
        if !self.sudo {
            return Ok(true);
        }
        Ok(Command::new("sudo").arg("-v").status()?.success())
    }

    fn command(&self) -> Command {
        if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg("-n").arg(&self.path);
            cmd
        } else {
            Command::new(&self.path)
        }
    }
}

impl ToolRunner for Bpftool {
    fn run(&self, args: &[String]) -> Result<ToolOutput, ProbeError> {
        let command = self.command_line(args);
        log::debug!("running `{command}`");

        let output = self
            .command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ProbeError::Launch {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Exit {
                command,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn command_line(&self, args: &[String]) -> String {
        let prefix = if self.sudo { "sudo -n " } else { "" };
        format!("{prefix}{} {}", self.path.display(), args.join(" "))
    }
}

/// One structured bpftool query.
pub trait Probe {
    /// Decoded shape of the tool's JSON output.
    type Output: DeserializeOwned;

    /// Arguments after the tool path, starting with `-j`.
    fn args(&self) -> Vec<String>;
}

/// Decoded records plus whatever the tool printed on stderr.
#[derive(Debug, Clone)]
pub struct ProbeOutput<T> {
    pub records: T,
    pub stderr: String,
}

/// Run `probe` and decode its output. Any schema mismatch fails the whole
/// probe; there is no partial result.
pub fn invoke<P: Probe>(
    runner: &dyn ToolRunner,
    probe: &P,
) -> Result<ProbeOutput<P::Output>, ProbeError> {
    let args = probe.args();
    let output = runner.run(&args)?;
    let records =
        serde_json::from_slice(&output.stdout).map_err(|source| ProbeError::Decode {
            command: runner.command_line(&args),
            source,
        })?;
    Ok(ProbeOutput {
        records,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run a command whose stdout carries no records (map update/delete).
/// Returns the tool's stderr.
pub fn run_action(runner: &dyn ToolRunner, args: &[String]) -> Result<String, ProbeError> {
    let output = runner.run(args)?;
    Ok(String::from_utf8_lossy(&output.stderr).into_owned())
}

/// Run a command whose output is plain text (`feature probe`). Returns stdout.
pub fn run_text(runner: &dyn ToolRunner, args: &[String]) -> Result<String, ProbeError> {
    let output = runner.run(args)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `["-j", object, verb...]`
pub(crate) fn json_args<I, S>(object: &str, rest: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut args = vec!["-j".to_string(), object.to_string()];
    args.extend(rest.into_iter().map(Into::into));
    args
}
