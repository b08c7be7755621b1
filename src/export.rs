//! Write loaded specs back out in descriptor form.
//!
//! Exported descriptors are normalized: `args` is always a sequence, the
//! selected env profile is already merged into `env`, and empty optional
//! fields are omitted. Reloading one yields the same specs.

use crate::Result;
use crate::descriptor::{Descriptor, Format, RawApp, RawArgs, RawEnv, RawWatch};
use crate::launch::LaunchSpec;

use anyhow::bail;
use std::collections::BTreeMap;

pub fn to_descriptor(specs: &[LaunchSpec]) -> Descriptor {
    let apps = specs
        .iter()
        .map(|spec| RawApp {
            name: spec.name.clone(),
            script: spec.command.clone(),
            args: (!spec.arguments.is_empty()).then(|| RawArgs::List(spec.arguments.clone())),
            watch: (!spec.watch_paths.is_empty())
                .then(|| RawWatch::Paths(spec.watch_paths.iter().cloned().collect())),
            ignore_watch: spec.ignore_watch.iter().cloned().collect(),
            interpreter: spec.interpreter_override.clone(),
            cwd: spec.cwd.clone(),
            env: RawEnv(
                spec.environment
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            extra: BTreeMap::new(),
        })
        .collect();

    Descriptor { apps }
}

/// Serialize specs as descriptor text.
pub fn export(specs: &[LaunchSpec], format: Format) -> Result<String> {
    let descriptor = to_descriptor(specs);
    let text = match format {
        Format::Json => {
            let mut s = serde_json::to_string_pretty(&descriptor)?;
            s.push('\n');
            s
        }
        Format::Yaml => serde_yaml::to_string(&descriptor)?,
        Format::Ecosystem => bail!("export to an ecosystem module is not supported; use json or yaml"),
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{LoadOptions, load};
    use pretty_assertions::assert_eq;

    fn fleet() -> Vec<LaunchSpec> {
        vec![
            LaunchSpec::new("api", "/usr/local/go/bin/go")
                .with_arguments(["run", "main.go"])
                .with_watch_paths(["."])
                .with_ignore_watch(["tmp"])
                .with_interpreter("none")
                .with_cwd("/srv/api")
                .with_env("GO111MODULE", "on"),
            LaunchSpec::new("worker", "/usr/bin/worker"),
        ]
    }

    #[test]
    fn json_export_reloads_equal() {
        let text = export(&fleet(), Format::Json).unwrap();
        let back = load(&text, &LoadOptions::default().with_format(Format::Json)).unwrap();
        assert_eq!(back, fleet());
    }

    #[test]
    fn yaml_export_reloads_equal() {
        let text = export(&fleet(), Format::Yaml).unwrap();
        let back = load(&text, &LoadOptions::default().with_format(Format::Yaml)).unwrap();
        assert_eq!(back, fleet());
    }

    #[test]
    fn export_omits_empty_fields() {
        let text = export(&fleet()[1..], Format::Json).unwrap();
        assert_eq!(
            text,
            "{\n  \"apps\": [\n    {\n      \"name\": \"worker\",\n      \"script\": \"/usr/bin/worker\"\n    }\n  ]\n}\n"
        );
    }

    #[test]
    fn ecosystem_export_is_refused() {
        assert!(export(&fleet(), Format::Ecosystem).is_err());
    }

    #[test]
    fn hand_built_specs_are_checked_on_reload() {
        let text = export(&[LaunchSpec::new("", "/bin/run")], Format::Json).unwrap();
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(err.is_validation());

        let text = export(&[LaunchSpec::new("svc", " ")], Format::Json).unwrap();
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid app #0 (svc): script must not be empty");
    }
}
