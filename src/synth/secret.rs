use crate::model::EnvironmentVariableSpec;

/// Case-insensitive substrings that mark a variable name as secret-looking.
pub const SECRET_KEYWORDS: &[&str] = &[
    "KEY",
    "TOKEN",
    "SECRET",
    "PASSWORD",
    "PASS",
    "PWD",
    "AUTH",
    "CREDENTIAL",
    "API",
    "PRIVATE",
    "ACCESS",
];

/// Name heuristic used when a catalogue entry forgot to flag a variable as
/// secret. It over-matches (`APIVERSION`) and under-matches by nature; keep
/// the keyword table as is so exported configs stay stable.
pub fn looks_like_secret(name: &str) -> bool {
    matches_any_keyword(name, SECRET_KEYWORDS)
}

pub fn matches_any_keyword(name: &str, keywords: &[&str]) -> bool {
    let upper = name.to_uppercase();
    keywords
        .iter()
        .any(|keyword| upper.contains(&keyword.to_uppercase()))
}

/// Explicit flag or name heuristic.
pub fn is_secret(spec: &EnvironmentVariableSpec) -> bool {
    spec.is_secret || looks_like_secret(&spec.name)
}

pub fn is_required_secret(spec: &EnvironmentVariableSpec) -> bool {
    spec.is_required && is_secret(spec)
}

/// `${NAME}` reference emitted wherever a value must be filled in by the user.
pub fn placeholder(name: &str) -> String {
    format!("${{{name}}}")
}
