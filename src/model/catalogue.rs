use serde::{Deserialize, Serialize};

/// Registry a package is distributed through. Unknown tags are kept verbatim
/// and synthesized with the default command strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryKind {
    Npm,
    Pypi,
    Docker,
    Nuget,
    Remote,
    Other(String),
}

impl RegistryKind {
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "npm" => Self::Npm,
            "pypi" | "python" | "pip" => Self::Pypi,
            "docker" | "oci" | "container" => Self::Docker,
            "nuget" => Self::Nuget,
            "remote" | "http" | "sse" | "streamable-http" => Self::Remote,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// Launcher executable used when a package carries no runtime hint.
    pub fn default_command(&self) -> &'static str {
        match self {
            Self::Npm => "npx",
            Self::Pypi => "uvx",
            Self::Docker => "docker",
            Self::Nuget => "dnx",
            Self::Remote | Self::Other(_) => "npx",
        }
    }
}

impl std::fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Pypi => write!(f, "pypi"),
            Self::Docker => write!(f, "docker"),
            Self::Nuget => write!(f, "nuget"),
            Self::Remote => write!(f, "remote"),
            Self::Other(tag) => write!(f, "{tag}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentKind {
    Named,
    Positional,
    Url,
    Header,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EnvironmentVariableSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub is_secret: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageArgumentSpec {
    #[serde(rename = "type")]
    pub kind: ArgumentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl PackageArgumentSpec {
    /// Value to render: the explicit value, falling back to the declared default.
    pub fn effective_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or(self.default.as_deref())
            .filter(|v| !v.is_empty())
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Package {
    pub registry_name: String,
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvironmentVariableSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub package_arguments: Vec<PackageArgumentSpec>,
}

impl Package {
    pub fn registry(&self) -> RegistryKind {
        RegistryKind::parse(&self.registry_name)
    }

    /// Composite reference `serverId::registryName::packageName` used by
    /// connections to pin themselves to one package of one server.
    pub fn composite_id(&self, server_id: &str) -> String {
        format!("{server_id}::{}::{}", self.registry_name, self.package_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl CatalogueEntry {
    pub fn package(&self, index: usize) -> Option<&Package> {
        self.packages.get(index)
    }

    /// Finds the package a composite package id points at.
    pub fn package_by_composite_id(&self, composite: &str) -> Option<(usize, &Package)> {
        self.packages
            .iter()
            .enumerate()
            .find(|(_, p)| p.composite_id(&self.id) == composite)
    }

    pub fn matches_text(&self, needle_lower: &str) -> bool {
        self.id.to_lowercase().contains(needle_lower)
            || self.name.to_lowercase().contains(needle_lower)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle_lower))
            || self
                .categories
                .iter()
                .chain(self.keywords.iter())
                .any(|t| t.to_lowercase().contains(needle_lower))
    }
}
