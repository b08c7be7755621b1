//! Descriptor layer: the raw, serde-friendly shape of a descriptor file.
//!
//! Shape (any of the supported formats):
//! {
//!   "apps": [
//!     {
//!       "name": "api",                 // required, unique
//!       "script": "/usr/bin/api",      // required, the executable
//!       "args": "serve" | ["serve"],   // optional
//!       "watch": ["."] | "." | true,   // optional
//!       "ignore_watch": ["logs"],      // optional
//!       "interpreter": "none",         // optional
//!       "cwd": "/srv/api",             // optional
//!       "env": { "PORT": 8080 },       // optional
//!       "env_production": { ... }      // optional named overlays
//!     }
//!   ]
//! }
//!
//! Nothing here enforces launch invariants; see `load::validate_and_build`.

pub mod ecosystem;
pub mod fields;

pub use fields::{RawArgs, RawEnv, RawWatch};

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Descriptor {
    pub apps: Vec<RawApp>,
}

/// Raw app entry as it appears in the descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawApp {
    pub name: String,

    pub script: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<RawArgs>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<RawWatch>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_watch: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    #[serde(default, skip_serializing_if = "RawEnv::is_empty")]
    pub env: RawEnv,

    /// Everything else: `env_<profile>` overlays and keys this crate ignores.
    /// Held as YAML values, which accept any JSON or YAML shape (including
    /// non-string map keys), so an ignored key can never fail the parse.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Supported descriptor encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
    /// JavaScript module (`module.exports = { apps: [...] }`).
    Ecosystem,
}

impl Format {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "js" | "cjs" | "mjs" => Some(Format::Ecosystem),
            _ => None,
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            "js" | "ecosystem" => Ok(Format::Ecosystem),
            other => Err(format!(
                "unknown descriptor format {:?} (expected json, yaml, or ecosystem)",
                other
            )),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Ecosystem => "ecosystem",
        })
    }
}

/// Parse descriptor text. Only structure is checked here.
pub fn parse(text: &str, format: Format) -> Result<Descriptor, LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    match format {
        Format::Json => serde_json::from_str(text).map_err(LoadError::malformed),
        Format::Yaml => serde_yaml::from_str(text).map_err(LoadError::malformed),
        Format::Ecosystem => {
            let json = ecosystem::to_json(text)?;
            serde_json::from_str(&json).map_err(LoadError::malformed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn format_from_extension() {
        assert_eq!(
            Format::from_path(Path::new("ecosystem.config.js")),
            Some(Format::Ecosystem)
        );
        assert_eq!(Format::from_path(Path::new("apps.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("apps.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("apps.toml")), None);
        assert_eq!(Format::from_path(Path::new("apps")), None);
    }

    #[test]
    fn format_from_str_round_trips_display() {
        for f in [Format::Json, Format::Yaml, Format::Ecosystem] {
            assert_eq!(f.to_string().parse::<Format>(), Ok(f));
        }
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let d = parse(
            r#"{"apps": [{"name": "a", "script": "x", "instances": 2, "env_prod": {"A": "1"}}]}"#,
            Format::Json,
        )
        .unwrap();
        let keys: Vec<&str> = d.apps[0].extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["env_prod", "instances"]);
    }

    #[test]
    fn yaml_descriptor_parses() {
        let d = parse(
            "apps:\n  - name: a\n    script: /bin/a\n    args: [x, y]\n    watch: true\n",
            Format::Yaml,
        )
        .unwrap();
        assert_eq!(d.apps.len(), 1);
        assert_eq!(
            d.apps[0].args,
            Some(RawArgs::List(vec!["x".to_string(), "y".to_string()]))
        );
        assert_eq!(d.apps[0].watch, Some(RawWatch::Enabled(true)));
    }

    #[test]
    fn missing_apps_is_malformed() {
        let err = parse(r#"{"processes": []}"#, Format::Json).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("apps"));
    }

    #[test]
    fn missing_script_is_malformed() {
        let err = parse(r#"{"apps": [{"name": "a"}]}"#, Format::Json).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("script"));
    }

    #[test]
    fn byte_order_mark_is_ignored_for_every_format() {
        for (text, format) in [
            ("\u{feff}{\"apps\": []}", Format::Json),
            ("\u{feff}apps: []\n", Format::Yaml),
            ("\u{feff}module.exports = { apps: [] }", Format::Ecosystem),
        ] {
            let d = parse(text, format).unwrap();
            assert!(d.apps.is_empty(), "{}", format);
        }
    }

    #[test]
    fn yaml_unknown_keys_accept_any_shape() {
        let d = parse(
            "apps:\n  - name: a\n    script: /a\n    instances: {1: x}\n",
            Format::Yaml,
        )
        .unwrap();
        assert!(d.apps[0].extra.contains_key("instances"));
    }
}
