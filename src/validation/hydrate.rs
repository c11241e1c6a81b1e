//! Stage 3: environment-specific interpolation.
//!
//! Substitutions, applied depth-first and array-aware:
//! - `${env:KEY}` - value from the active environment's `defaults` map
//! - `${envIs:NAME}` - boolean, true when the active environment is NAME
//! - per-environment maps (`{dev: ..., prod: ...}`) collapse to the value
//!   for the active environment
//!
//! Unresolved placeholders are warnings, not errors. The stage also fills
//! the default compliance framework when the manifest omits one.

use std::collections::BTreeSet;

use regex::Regex;
use serde_json::{Map, Value};

use crate::core::manifest::DEFAULT_ENVIRONMENTS;

use super::{ManifestError, StageOutcome, ValidationRequest, ValidationStage};

/// Applies environment interpolation to the schema-validated tree.
pub struct HydrateStage {
    env_re: Regex,
    env_is_re: Regex,
}

struct HydrateCx {
    environment: String,
    defaults: Map<String, Value>,
    known_environments: BTreeSet<String>,
}

impl HydrateStage {
    pub fn new() -> Self {
        HydrateStage {
            env_re: Regex::new(r"\$\{env:([A-Za-z0-9_][A-Za-z0-9_.-]*)\}")
                .unwrap_or_else(|_| unreachable!("static regex")),
            env_is_re: Regex::new(r"\$\{envIs:([A-Za-z0-9_-]+)\}")
                .unwrap_or_else(|_| unreachable!("static regex")),
        }
    }

    fn hydrate_value(
        &self,
        value: &Value,
        cx: &HydrateCx,
        path: &str,
        warnings: &mut Vec<String>,
    ) -> Value {
        match value {
            Value::String(s) => self.hydrate_string(s, cx, path, warnings),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.hydrate_value(item, cx, &format!("{}/{}", path, i), warnings)
                    })
                    .collect(),
            ),
            Value::Object(map) => {
                // The `environments` block is keyed by environment names
                // and must survive hydration intact, everything under an
                // environment's definition included.
                if !in_environments_block(path)
                    && is_environment_map(map, &cx.known_environments)
                {
                    if let Some(selected) = map.get(&cx.environment) {
                        return self.hydrate_value(selected, cx, path, warnings);
                    }
                    warnings.push(format!(
                        "per-environment map at `{}` has no value for environment `{}`",
                        path, cx.environment
                    ));
                }
                Value::Object(
                    map.iter()
                        .map(|(key, item)| {
                            (
                                key.clone(),
                                self.hydrate_value(
                                    item,
                                    cx,
                                    &format!("{}/{}", path, key),
                                    warnings,
                                ),
                            )
                        })
                        .collect(),
                )
            }
            other => other.clone(),
        }
    }

    fn hydrate_string(
        &self,
        s: &str,
        cx: &HydrateCx,
        path: &str,
        warnings: &mut Vec<String>,
    ) -> Value {
        // A placeholder standing alone keeps the substituted value's type.
        if let Some(caps) = self.env_is_re.captures(s) {
            if &caps[0] == s {
                return Value::Bool(cx.environment == caps[1]);
            }
        }
        if let Some(caps) = self.env_re.captures(s) {
            if &caps[0] == s {
                match cx.defaults.get(&caps[1]) {
                    Some(value) => return value.clone(),
                    None => {
                        warnings.push(format!(
                            "unresolved placeholder `{}` at `{}`",
                            &caps[0], path
                        ));
                        return Value::String(s.to_owned());
                    }
                }
            }
        }

        // Placeholders embedded in a longer string substitute as text.
        let mut unresolved = Vec::new();
        let replaced = self
            .env_is_re
            .replace_all(s, |caps: &regex::Captures<'_>| {
                (cx.environment == caps[1]).to_string()
            });
        let replaced = self
            .env_re
            .replace_all(&replaced, |caps: &regex::Captures<'_>| {
                match cx.defaults.get(&caps[1]) {
                    Some(Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                    None => {
                        unresolved.push(caps[0].to_owned());
                        caps[0].to_owned()
                    }
                }
            });

        for placeholder in unresolved {
            warnings.push(format!(
                "unresolved placeholder `{}` at `{}`",
                placeholder, path
            ));
        }
        Value::String(replaced.into_owned())
    }
}

impl Default for HydrateStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationStage for HydrateStage {
    fn name(&self) -> &'static str {
        "hydration"
    }

    fn run(&self, request: &ValidationRequest, data: Value) -> Result<StageOutcome, ManifestError> {
        let mut warnings = Vec::new();

        let known_environments: BTreeSet<String> = match data
            .get("environments")
            .and_then(Value::as_object)
            .filter(|envs| !envs.is_empty())
        {
            Some(envs) => {
                if !envs.contains_key(&request.environment) {
                    warnings.push(format!(
                        "environment `{}` is not declared in the manifest's `environments` block",
                        request.environment
                    ));
                }
                envs.keys().cloned().collect()
            }
            None => DEFAULT_ENVIRONMENTS.iter().map(|e| (*e).to_owned()).collect(),
        };

        let defaults = data
            .pointer(&format!("/environments/{}/defaults", request.environment))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let cx = HydrateCx {
            environment: request.environment.clone(),
            defaults,
            known_environments,
        };

        let mut hydrated = self.hydrate_value(&data, &cx, "", &mut warnings);

        if let Some(root) = hydrated.as_object_mut() {
            root.entry("complianceFramework")
                .or_insert_with(|| Value::String("commercial".to_owned()));
        }

        Ok(StageOutcome {
            data: hydrated,
            warnings,
        })
    }
}

fn is_environment_map(map: &Map<String, Value>, known: &BTreeSet<String>) -> bool {
    !map.is_empty() && map.keys().all(|key| known.contains(key))
}

fn in_environments_block(path: &str) -> bool {
    path == "/environments" || path.starts_with("/environments/")
}
