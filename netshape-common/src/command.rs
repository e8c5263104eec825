//! Utilities for running external programs through [`std::process::Command`].
//!
//! Commands are described by a [`CommandSpec`] and executed by a [`Runner`]. The production
//! runner, [`SystemRunner`], spawns the process and captures its output. Any
//! `Fn(&CommandSpec) -> Result<Output>` closure is a [`Runner`] too, which is how callers plug
//! in their own execution environment.

use std::{fmt, io, process};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("non-zero exit status ({}): {}", .0.status, .0.combined().trim())]
    NonZero(Output),
}

/// The captured result of a finished command.
#[derive(Debug, Clone)]
pub struct Output {
    pub status: process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    /// Standard output followed by standard error, the way a shell would interleave them for a
    /// command that writes diagnostics last.
    pub fn combined(&self) -> String {
        let mut combined = String::with_capacity(self.stdout.len() + self.stderr.len());
        combined.push_str(&self.stdout);
        combined.push_str(&self.stderr);
        combined
    }
}

impl From<process::Output> for Output {
    fn from(value: process::Output) -> Self {
        Self {
            status: value.status,
            stdout: String::from_utf8_lossy(&value.stdout).to_string(),
            stderr: String::from_utf8_lossy(&value.stderr).to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A program invocation: the program name and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }

        Ok(())
    }
}

/// Executes a [`CommandSpec`] and reports its captured output.
///
/// Implementations must return [`Error::NonZero`] when the program exits unsuccessfully, so that
/// callers can rely on `Ok` meaning success.
pub trait Runner {
    fn run(&self, cmd: &CommandSpec) -> Result<Output>;
}

impl<F> Runner for F
where
    F: Fn(&CommandSpec) -> Result<Output>,
{
    fn run(&self, cmd: &CommandSpec) -> Result<Output> {
        self(cmd)
    }
}

/// Runs commands as child processes of the current one.
///
/// Commands can optionally be prefixed by `sudo`, and by `ip netns exec <namespace>` to run them
/// inside a named network namespace.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    sudo: bool,
    namespace: Option<String>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every command through `sudo`.
    pub fn with_sudo(mut self, sudo: bool) -> Self {
        self.sudo = sudo;
        self
    }

    /// Run every command inside the named network namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Builds the [`process::Command`] for `spec`, including the configured prefixes.
    pub fn command(&self, spec: &CommandSpec) -> process::Command {
        let mut argv: Vec<&str> = Vec::with_capacity(spec.args.len() + 6);
        if self.sudo {
            argv.push("sudo");
        }
        if let Some(namespace) = &self.namespace {
            argv.extend(["ip", "netns", "exec", namespace.as_str()]);
        }
        argv.push(&spec.program);
        argv.extend(spec.args.iter().map(String::as_str));

        let mut cmd = process::Command::new(argv[0]);
        cmd.args(&argv[1..]);
        cmd
    }
}

impl Runner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<Output> {
        let mut cmd = self.command(spec);
        cmd.stderr(process::Stdio::piped()).stdout(process::Stdio::piped());

        tracing::debug!(?cmd, "running command");

        let output: Output = cmd.spawn()?.wait_with_output()?.into();

        if !output.status.success() {
            tracing::debug!(
                ?output.stderr,
                ?output.status,
                ?cmd,
                "command returned non-zero status"
            );
            return Err(Error::NonZero(output));
        }

        Ok(output)
    }
}
