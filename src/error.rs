use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of every [`BundlerError`], used by callers that
/// branch on the kind of failure rather than the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    EncodingConstraint,
    ExternalUnavailable,
    Storage,
}

#[derive(Debug, Error)]
pub enum BundlerError {
    #[error("failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory: {path}")]
    DirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("failed to determine data directory; set XDG_DATA_HOME or --data-dir")]
    DataDirNotFound,

    #[error("bundle '{id}' not found")]
    BundleNotFound { id: String },

    #[error("connection '{id}' not found")]
    ConnectionNotFound { id: String },

    #[error("server '{id}' not found in catalogue")]
    ServerNotFound { id: String },

    #[error("server '{server}' has no package at index {index}")]
    PackageNotFound { server: String, index: usize },

    #[error("name '{name}' matches more than one {kind}; use the id instead")]
    AmbiguousName { kind: &'static str, name: String },

    #[error("connection '{id}' is still used by bundle(s): {}", bundles.join(", "))]
    ConnectionInUse { id: String, bundles: Vec<String> },

    #[error("server '{server}' is not in bundle '{bundle}'")]
    ServerNotInBundle { bundle: String, server: String },

    #[error("invalid share token: {reason}")]
    InvalidShareToken { reason: String },

    #[error("invalid bundle format: {reason}")]
    InvalidBundleFormat { reason: String },

    #[error("no valid servers found")]
    NoValidServers,

    #[error("bundle name is {bytes} bytes of UTF-8; the share format allows at most 255")]
    NameTooLong { bytes: usize },

    #[error("server id '{id}' does not start with 8 hexadecimal characters")]
    ServerIdNotHex { id: String },

    #[error("invalid MCP config {path}: {reason}")]
    InvalidMcpConfig { path: PathBuf, reason: String },

    #[error("catalogue unavailable at {path}: {reason}")]
    CatalogueUnavailable { path: PathBuf, reason: String },

    #[error("encryption unavailable: {reason}")]
    CryptoUnavailable { reason: String },

    #[error("failed to decrypt credentials; wrong passphrase or corrupted data")]
    DecryptFailed,

    #[error("credentials for '{server}' are encrypted; a passphrase is required")]
    PassphraseRequired { server: String },

    #[error("invalid {key} value: {value} ({expected})")]
    InvalidSetting {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("unknown config key: {key}")]
    UnknownSetting { key: String },
}

impl BundlerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BundleNotFound { .. }
            | Self::ConnectionNotFound { .. }
            | Self::ServerNotFound { .. }
            | Self::PackageNotFound { .. } => ErrorKind::NotFound,
            Self::ConnectionInUse { .. } | Self::ServerNotInBundle { .. } => ErrorKind::Conflict,
            Self::AmbiguousName { .. }
            | Self::InvalidShareToken { .. }
            | Self::InvalidBundleFormat { .. }
            | Self::InvalidMcpConfig { .. }
            | Self::NoValidServers
            | Self::DecryptFailed
            | Self::PassphraseRequired { .. }
            | Self::InvalidSetting { .. }
            | Self::UnknownSetting { .. } => ErrorKind::Validation,
            Self::NameTooLong { .. } | Self::ServerIdNotHex { .. } => {
                ErrorKind::EncodingConstraint
            }
            Self::CatalogueUnavailable { .. } | Self::CryptoUnavailable { .. } => {
                ErrorKind::ExternalUnavailable
            }
            Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::DirCreate { .. }
            | Self::JsonParse { .. }
            | Self::JsonSerialize(_)
            | Self::ConfigParse(_)
            | Self::TomlSerialize(_)
            | Self::DataDirNotFound => ErrorKind::Storage,
        }
    }
}
