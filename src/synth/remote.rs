use std::collections::{BTreeMap, BTreeSet};

use crate::model::{ArgumentKind, EnvironmentVariableSpec, LauncherConfig, Package};

use super::secret::{is_secret, placeholder};

pub const FALLBACK_REMOTE_URL: &str = "https://example.com/mcp";
pub const DEFAULT_TRANSPORT: &str = "http";

/// Hosted endpoints for services whose catalogue entries predate stored
/// `endpoint` arguments. Keyed by lowercase package name.
const KNOWN_REMOTE_URLS: &[(&str, &str)] = &[
    ("github/github-mcp-server", "https://api.githubcopilot.com/mcp/"),
    ("github-mcp-server", "https://api.githubcopilot.com/mcp/"),
];

/// Substrings that mark a stored header value as a placeholder to rewrite.
const PLACEHOLDER_MARKERS: &[&str] = &["YOUR_", "API_KEY", "TOKEN"];

const AUTH_SCHEMES: &[&str] = &["bearer", "token", "basic"];

/// `credentials` fill the `${VAR}` references in the headers; without them
/// the references are left for the host to resolve.
pub fn synthesize_remote(
    package: &Package,
    credentials: Option<&BTreeMap<String, String>>,
) -> LauncherConfig {
    let url = endpoint_url(package);
    let transport = package
        .package_arguments
        .iter()
        .find(|a| a.is_named("type"))
        .and_then(|a| a.effective_value())
        .unwrap_or(DEFAULT_TRANSPORT)
        .to_string();

    let mut headers = build_auth_headers(package);
    if let Some(credentials) = credentials {
        for value in headers.values_mut() {
            *value = fill_references(value, credentials);
        }
    }

    LauncherConfig::Remote {
        transport,
        url,
        headers,
    }
}

/// Replaces each `${NAME}` whose credential is non-blank with that value.
fn fill_references(value: &str, credentials: &BTreeMap<String, String>) -> String {
    credentials
        .iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .fold(value.to_string(), |acc, (name, v)| acc.replace(&placeholder(name), v))
}

fn endpoint_url(package: &Package) -> String {
    if let Some(url) = package
        .package_arguments
        .iter()
        .find(|a| a.kind == ArgumentKind::Url && a.is_named("endpoint"))
        .and_then(|a| a.effective_value())
    {
        return url.to_string();
    }

    let key = package.package_name.to_lowercase();
    KNOWN_REMOTE_URLS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, url)| (*url).to_string())
        .unwrap_or_else(|| FALLBACK_REMOTE_URL.to_string())
}

/// Headers for a remote endpoint. Stored `header` arguments win; placeholder
/// values in them are rewritten to `${VAR}` references. Without stored
/// headers a bearer header is inferred from the first secret variable whose
/// name mentions a token or key.
pub fn build_auth_headers(package: &Package) -> BTreeMap<String, String> {
    let stored: Vec<(&str, &str)> = package
        .package_arguments
        .iter()
        .filter(|a| a.kind == ArgumentKind::Header)
        .filter_map(|a| Some((a.name.as_deref()?, a.effective_value()?)))
        .collect();

    if !stored.is_empty() {
        return stored
            .into_iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    substitute_placeholder(name, value, &package.environment_variables),
                )
            })
            .collect();
    }

    let mut headers = BTreeMap::new();
    if let Some(var) = package.environment_variables.iter().find(|v| {
        let upper = v.name.to_uppercase();
        v.is_secret && (upper.contains("TOKEN") || upper.contains("KEY"))
    }) {
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", placeholder(&var.name)),
        );
    }
    headers
}

fn substitute_placeholder(header: &str, value: &str, vars: &[EnvironmentVariableSpec]) -> String {
    if value.contains("${") || !PLACEHOLDER_MARKERS.iter().any(|m| value.contains(m)) {
        return value.to_string();
    }
    let Some(var) = best_matching_var(header, value, vars) else {
        return value.to_string();
    };

    let reference = placeholder(&var.name);
    match value.split_once(' ') {
        Some((scheme, _)) if AUTH_SCHEMES.contains(&scheme.to_lowercase().as_str()) => {
            format!("{scheme} {reference}")
        }
        _ => reference,
    }
}

/// Picks the variable sharing the most name tokens with the header name and
/// value. Ties go to secret variables, then declaration order. With no
/// overlap at all the first secret variable is used.
fn best_matching_var<'a>(
    header: &str,
    value: &str,
    vars: &'a [EnvironmentVariableSpec],
) -> Option<&'a EnvironmentVariableSpec> {
    let mut context = tokens(header);
    context.extend(tokens(value));

    let mut best: Option<(usize, bool, &EnvironmentVariableSpec)> = None;
    for var in vars {
        let overlap = tokens(&var.name).intersection(&context).count();
        if overlap == 0 {
            continue;
        }
        let secret = is_secret(var);
        let better = match best {
            None => true,
            Some((score, best_secret, _)) => {
                overlap > score || (overlap == score && secret && !best_secret)
            }
        };
        if better {
            best = Some((overlap, secret, var));
        }
    }

    best.map(|(_, _, var)| var)
        .or_else(|| vars.iter().find(|v| is_secret(v)))
}

fn tokens(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_uppercase)
        .filter(|t| t != "YOUR" && t != "BEARER")
        .collect()
}
