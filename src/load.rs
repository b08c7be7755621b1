//! Launch descriptor loading: descriptor text in, validated specs out.
//!
//! `load` is a pure, single-shot transform. It either returns every entry of
//! the `apps` collection (in source order) or an error; never a subset.

use crate::Result;
use crate::descriptor::{self, Descriptor, Format, RawApp, RawArgs, RawEnv};
use crate::error::{EntryRef, LoadError};
use crate::launch::LaunchSpec;

use anyhow::{Context, anyhow};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Prefix marking a named environment overlay, e.g. `env_production`.
const ENV_PROFILE_PREFIX: &str = "env_";

/// How a string-valued `args` is turned into an argument vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgStyle {
    /// The whole string is one argument.
    #[default]
    Opaque,
    /// Split with POSIX shell quoting rules.
    ShellWords,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Descriptor encoding. `load_path` falls back to the file extension.
    pub format: Option<Format>,
    pub args: ArgStyle,
    /// Merge `env_<profile>` over `env` for every app.
    pub env_profile: Option<String>,
}

impl LoadOptions {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_arg_style(mut self, args: ArgStyle) -> Self {
        self.args = args;
        self
    }

    pub fn with_env_profile(mut self, profile: impl Into<String>) -> Self {
        self.env_profile = Some(profile.into());
        self
    }
}

/// Load descriptor text. Without an explicit format, JSON is assumed.
pub fn load(source: &str, options: &LoadOptions) -> std::result::Result<Vec<LaunchSpec>, LoadError> {
    let format = options.format.unwrap_or(Format::Json);
    let descriptor = descriptor::parse(source, format)?;
    validate_and_build(descriptor, options)
}

/// Read and load a descriptor file.
pub fn load_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Vec<LaunchSpec>> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => Format::from_path(path).ok_or_else(|| {
            anyhow!(
                "cannot tell descriptor format of {} from its extension; pass a format",
                path.display()
            )
        })?,
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("read descriptor file {}", path.display()))?;

    let options = LoadOptions {
        format: Some(format),
        ..options.clone()
    };
    let specs = load(&text, &options).with_context(|| format!("load {}", path.display()))?;

    tracing::info!(path = %path.display(), %format, apps = specs.len(), "descriptor loaded");
    Ok(specs)
}

/// Check launch invariants and normalize every raw entry.
///
/// Entries are checked in source order; the first violation aborts the load.
pub fn validate_and_build(
    descriptor: Descriptor,
    options: &LoadOptions,
) -> std::result::Result<Vec<LaunchSpec>, LoadError> {
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut specs = Vec::with_capacity(descriptor.apps.len());
    let mut profile_used = false;

    for (index, raw) in descriptor.apps.into_iter().enumerate() {
        let entry = EntryRef::new(index, &raw.name);

        if raw.name.trim().is_empty() {
            return Err(LoadError::invalid(entry, "name must not be empty"));
        }
        if let Some(prev) = first_seen.insert(raw.name.clone(), index) {
            return Err(LoadError::invalid(
                entry,
                format!(
                    "duplicate name {:?} (first defined by app #{})",
                    raw.name, prev
                ),
            ));
        }
        if raw.script.trim().is_empty() {
            return Err(LoadError::invalid(entry, "script must not be empty"));
        }

        let (spec, used) = build_spec(raw, &entry, options)?;
        profile_used |= used;

        tracing::debug!(
            name = spec.name(),
            command = %spec.command_line(),
            watched = spec.is_watched(),
            "app validated"
        );
        specs.push(spec);
    }

    if let Some(profile) = &options.env_profile
        && !profile_used
        && !specs.is_empty()
    {
        tracing::warn!(
            profile = profile.as_str(),
            "no app defines {}{}; using base env only",
            ENV_PROFILE_PREFIX,
            profile
        );
    }

    Ok(specs)
}

/// Normalize one entry. The returned flag reports whether the selected env
/// profile was present on it.
fn build_spec(
    raw: RawApp,
    entry: &EntryRef,
    options: &LoadOptions,
) -> std::result::Result<(LaunchSpec, bool), LoadError> {
    let RawApp {
        name,
        script,
        args,
        watch,
        ignore_watch,
        interpreter,
        cwd,
        env,
        extra,
    } = raw;

    let arguments = match args {
        None => Vec::new(),
        Some(RawArgs::List(list)) => list,
        Some(RawArgs::Line(line)) => split_args(&line, entry, options.args)?,
    };

    let mut environment = unique_env(env, entry, "env")?;

    let mut profile_used = false;
    for (key, value) in extra {
        let Some(profile) = key.strip_prefix(ENV_PROFILE_PREFIX) else {
            tracing::warn!(app = name.as_str(), key = key.as_str(), "ignoring unsupported key");
            continue;
        };
        if options.env_profile.as_deref() != Some(profile) {
            continue;
        }
        let overlay: RawEnv = serde_yaml::from_value(value)
            .map_err(|e| LoadError::malformed(format!("{} {}: {}", entry, key, e)))?;
        environment.extend(unique_env(overlay, entry, &key)?);
        profile_used = true;
    }

    let spec = LaunchSpec {
        name,
        command: script,
        arguments,
        watch_paths: watch.map(|w| w.into_paths()).unwrap_or_default().into_iter().collect(),
        ignore_watch: ignore_watch.into_iter().collect(),
        interpreter_override: interpreter,
        cwd,
        environment,
    };

    Ok((spec, profile_used))
}

fn split_args(
    line: &str,
    entry: &EntryRef,
    style: ArgStyle,
) -> std::result::Result<Vec<String>, LoadError> {
    match style {
        ArgStyle::Opaque => Ok(vec![line.to_string()]),
        ArgStyle::ShellWords => shell_words::split(line)
            .map_err(|e| LoadError::invalid(entry.clone(), format!("args {:?}: {}", line, e))),
    }
}

fn unique_env(
    env: RawEnv,
    entry: &EntryRef,
    block: &str,
) -> std::result::Result<BTreeMap<String, String>, LoadError> {
    let mut seen = BTreeSet::new();
    let mut out = BTreeMap::new();
    for (key, value) in env.0 {
        if key.is_empty() {
            return Err(LoadError::invalid(
                entry.clone(),
                format!("{} has an empty variable name", block),
            ));
        }
        if !seen.insert(key.clone()) {
            return Err(LoadError::invalid(
                entry.clone(),
                format!("{} defines {} more than once", block, key),
            ));
        }
        out.insert(key, value);
    }
    Ok(out)
}
