use std::collections::BTreeMap;

use crate::model::Package;

use super::secret::{is_required_secret, placeholder};

/// Builds the `env` map for a package.
///
/// Base values come from the variable specs: required secrets get a
/// placeholder, other required variables get their default (or a placeholder),
/// optional variables appear only when they declare a default. Explicitly
/// secret variables never carry their default in plain text.
///
/// Non-blank credential values overwrite whatever the base put there. Without
/// credentials, every required secret (flag or name heuristic) that is still
/// blank is forced to its placeholder, so exports never contain an empty
/// required-secret slot.
pub fn build_env(
    package: &Package,
    credentials: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    for var in &package.environment_variables {
        let default = var.default_value.as_deref().filter(|v| !v.trim().is_empty());
        if var.is_required {
            let value = match (var.is_secret, default) {
                (false, Some(default)) => default.to_string(),
                _ => placeholder(&var.name),
            };
            env.insert(var.name.clone(), value);
        } else if let Some(default) = default {
            let value = if var.is_secret {
                placeholder(&var.name)
            } else {
                default.to_string()
            };
            env.insert(var.name.clone(), value);
        }
    }

    match credentials {
        Some(credentials) => {
            for (name, value) in credentials {
                if !value.trim().is_empty() {
                    env.insert(name.clone(), value.clone());
                }
            }
        }
        None => {
            for var in package
                .environment_variables
                .iter()
                .filter(|v| is_required_secret(v))
            {
                let blank = env.get(&var.name).is_none_or(|v| v.trim().is_empty());
                if blank {
                    env.insert(var.name.clone(), placeholder(&var.name));
                }
            }
        }
    }

    env
}
