//! Lenient field shapes accepted inside an app entry.
//!
//! Process-manager descriptors are hand written, so several keys accept more
//! than one shape:
//! - `args`: "a b" or ["a", "b"]
//! - `watch`: ["src"], "src", true, false
//! - `env`: { KEY: "str" | 1 | 1.5 | true }

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged, expecting = "a string or a sequence of strings")]
pub enum RawArgs {
    Line(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged, expecting = "a boolean, a path, or a sequence of paths")]
pub enum RawWatch {
    Enabled(bool),
    Path(String),
    Paths(Vec<String>),
}

impl RawWatch {
    /// Paths to watch. `true` means the working directory.
    pub fn into_paths(self) -> Vec<String> {
        match self {
            RawWatch::Enabled(true) => vec![".".to_string()],
            RawWatch::Enabled(false) => vec![],
            RawWatch::Path(p) => vec![p],
            RawWatch::Paths(ps) => ps,
        }
    }
}

/// Environment block, kept as written (duplicates included) so validation
/// can reject repeated keys instead of silently keeping the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEnv(pub Vec<(String, String)>);

impl RawEnv {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for RawEnv {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EnvVisitor;

        impl<'de> Visitor<'de> for EnvVisitor {
            type Value = RawEnv;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of environment variables")
            }

            fn visit_map<A>(self, mut map: A) -> Result<RawEnv, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, EnvValue>()? {
                    pairs.push((key, value.0));
                }
                Ok(RawEnv(pairs))
            }
        }

        deserializer.deserialize_map(EnvVisitor)
    }
}

impl Serialize for RawEnv {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// A scalar environment value rendered to its textual form.
struct EnvValue(String);

impl<'de> Deserialize<'de> for EnvValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ScalarVisitor;

        impl Visitor<'_> for ScalarVisitor {
            type Value = EnvValue;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string, number, or boolean")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<EnvValue, E> {
                Ok(EnvValue(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<EnvValue, E> {
                Ok(EnvValue(v))
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<EnvValue, E> {
                Ok(EnvValue(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<EnvValue, E> {
                Ok(EnvValue(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<EnvValue, E> {
                Ok(EnvValue(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<EnvValue, E> {
                Ok(EnvValue(v.to_string()))
            }
        }

        deserializer.deserialize_any(ScalarVisitor)
    }
}
