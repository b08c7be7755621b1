//! The validated launch record handed to a supervisor.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Interpreter value meaning "execute `command` directly".
pub const NO_INTERPRETER: &str = "none";

/// One validated process-launch intent.
///
/// Values returned by [`crate::load`] satisfy the launch invariants: a
/// non-empty name unique within the set, and a non-empty command.
/// [`LaunchSpec::new`] and the `with_*` methods do not check them; they exist
/// for building expected values and export input. Pass such values through
/// [`crate::export`] and [`crate::load`] to get them checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchSpec {
    pub(crate) name: String,
    pub(crate) command: String,
    pub(crate) arguments: Vec<String>,
    pub(crate) watch_paths: BTreeSet<String>,
    pub(crate) ignore_watch: BTreeSet<String>,
    pub(crate) interpreter_override: Option<String>,
    pub(crate) cwd: Option<String>,
    pub(crate) environment: BTreeMap<String, String>,
}

impl LaunchSpec {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            arguments: Vec::new(),
            watch_paths: BTreeSet::new(),
            ignore_watch: BTreeSet::new(),
            interpreter_override: None,
            cwd: None,
            environment: BTreeMap::new(),
        }
    }

    pub fn with_arguments<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_watch_paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.watch_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_ignore_watch<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_watch = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter_override = Some(interpreter.into());
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn watch_paths(&self) -> &BTreeSet<String> {
        &self.watch_paths
    }

    pub fn ignore_watch(&self) -> &BTreeSet<String> {
        &self.ignore_watch
    }

    pub fn interpreter_override(&self) -> Option<&str> {
        self.interpreter_override.as_deref()
    }

    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    pub fn environment(&self) -> &BTreeMap<String, String> {
        &self.environment
    }

    /// True when the supervisor should skip interpreter detection.
    pub fn runs_directly(&self) -> bool {
        self.interpreter_override.as_deref() == Some(NO_INTERPRETER)
    }

    pub fn is_watched(&self) -> bool {
        !self.watch_paths.is_empty()
    }

    /// `command` and `arguments` quoted as a shell would need them.
    pub fn command_line(&self) -> String {
        shell_words::join(std::iter::once(&self.command).chain(&self.arguments))
    }
}
