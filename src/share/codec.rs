//! Compact share tokens.
//!
//! Layout, big-endian:
//!
//! ```text
//! [name_len: u8][timestamp: u32][name: name_len bytes][server prefix: u32]*
//! ```
//!
//! Each server is referenced by the first 8 hex digits of its id. The bytes
//! are carried as unpadded URL-safe base64. Older links carried a base64 JSON
//! object instead, which decoding still accepts.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::BundlerError;
use crate::model::{Bundle, BundleServerEntry, StoredServerEntry};

/// Bundle names are cut to this many characters before encoding.
pub const NAME_CHAR_LIMIT: usize = 50;
const HEADER_LEN: usize = 5;
const PREFIX_HEX_DIGITS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactPayload {
    pub name: String,
    /// Unix seconds at encode time.
    pub timestamp: u32,
    pub server_prefixes: Vec<u32>,
}

impl CompactPayload {
    pub fn to_bytes(&self) -> Result<Vec<u8>, BundlerError> {
        let name = self.name.as_bytes();
        let name_len = u8::try_from(name.len())
            .map_err(|_| BundlerError::NameTooLong { bytes: name.len() })?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + name.len() + 4 * self.server_prefixes.len());
        bytes.push(name_len);
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        bytes.extend_from_slice(name);
        for prefix in &self.server_prefixes {
            bytes.extend_from_slice(&prefix.to_be_bytes());
        }
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BundlerError> {
        let invalid = |reason: &str| BundlerError::InvalidShareToken {
            reason: reason.to_string(),
        };
        if bytes.len() < HEADER_LEN {
            return Err(invalid("payload is shorter than the 5-byte header"));
        }

        let name_len = usize::from(bytes[0]);
        let timestamp = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        let name_end = HEADER_LEN + name_len;
        if bytes.len() < name_end {
            return Err(invalid("name runs past the end of the payload"));
        }
        let name = std::str::from_utf8(&bytes[HEADER_LEN..name_end])
            .map_err(|_| invalid("name is not valid UTF-8"))?;

        let rest = &bytes[name_end..];
        if rest.len() % 4 != 0 {
            return Err(invalid("server list is not a whole number of 4-byte ids"));
        }
        let server_prefixes = rest
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            name: name.to_string(),
            timestamp,
            server_prefixes,
        })
    }

    /// Server references as zero-padded lowercase hex, ready for prefix
    /// matching against catalogue ids.
    pub fn server_refs(&self) -> Vec<String> {
        self.server_prefixes
            .iter()
            .map(|p| format!("{p:08x}"))
            .collect()
    }

    pub fn encoded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.timestamp), 0)
    }
}

/// Older share format: a full bundle definition as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPayload {
    pub name: String,
    pub description: Option<String>,
    pub servers: Vec<BundleServerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharePayload {
    Compact(CompactPayload),
    Legacy(LegacyPayload),
}

impl SharePayload {
    pub fn name(&self) -> &str {
        match self {
            Self::Compact(p) => &p.name,
            Self::Legacy(p) => &p.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Compact(_) => None,
            Self::Legacy(p) => p.description.as_deref(),
        }
    }

    pub fn encoded_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Compact(p) => p.encoded_at(),
            Self::Legacy(_) => None,
        }
    }

    /// `(reference, package index)` for every server. Compact references are
    /// 8-digit id prefixes and always select the first package.
    pub fn server_refs(&self) -> Vec<(String, usize)> {
        match self {
            Self::Compact(p) => p.server_refs().into_iter().map(|r| (r, 0)).collect(),
            Self::Legacy(p) => p
                .servers
                .iter()
                .map(|e| (e.server_id.clone(), e.package_index))
                .collect(),
        }
    }
}

/// Parses the leading 8 hex digits of a server id.
pub fn server_prefix(id: &str) -> Result<u32, BundlerError> {
    let not_hex = || BundlerError::ServerIdNotHex { id: id.to_string() };
    let head = id.get(..PREFIX_HEX_DIGITS).ok_or_else(not_hex)?;
    if !head.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(not_hex());
    }
    u32::from_str_radix(head, 16).map_err(|_| not_hex())
}

/// Truncates to [`NAME_CHAR_LIMIT`] characters.
pub fn truncate_name(name: &str) -> &str {
    match name.char_indices().nth(NAME_CHAR_LIMIT) {
        Some((end, _)) => &name[..end],
        None => name,
    }
}

pub fn compact_payload(bundle: &Bundle, now: DateTime<Utc>) -> Result<CompactPayload, BundlerError> {
    let server_prefixes = bundle
        .servers
        .iter()
        .map(|e| server_prefix(&e.server_id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CompactPayload {
        name: truncate_name(&bundle.name).to_string(),
        timestamp: u32::try_from(now.timestamp().max(0)).unwrap_or(u32::MAX),
        server_prefixes,
    })
}

pub fn encode_payload(payload: &CompactPayload) -> Result<String, BundlerError> {
    Ok(URL_SAFE_NO_PAD.encode(payload.to_bytes()?))
}

pub fn encode_bundle(bundle: &Bundle, now: DateTime<Utc>) -> Result<String, BundlerError> {
    encode_payload(&compact_payload(bundle, now)?)
}

/// Decodes a bare token in either the compact or the legacy JSON format.
pub fn decode_token(token: &str) -> Result<SharePayload, BundlerError> {
    let bytes = decode_base64(token)?;

    if let Some(payload) = decode_legacy(&bytes)? {
        tracing::debug!(name = %payload.name, "decoded legacy share payload");
        return Ok(SharePayload::Legacy(payload));
    }

    let payload = CompactPayload::from_bytes(&bytes)?;
    tracing::debug!(name = %payload.name, servers = payload.server_prefixes.len(), "decoded compact share payload");
    Ok(SharePayload::Compact(payload))
}

/// Restores the standard alphabet and padding, then decodes.
fn decode_base64(token: &str) -> Result<Vec<u8>, BundlerError> {
    let mut normalized: String = token
        .trim()
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    if normalized.is_empty() {
        return Err(BundlerError::InvalidShareToken {
            reason: "token is empty".to_string(),
        });
    }
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| BundlerError::InvalidShareToken {
            reason: format!("not base64: {e}"),
        })
}

#[derive(Deserialize)]
struct RawLegacy {
    name: Option<serde_json::Value>,
    description: Option<String>,
    servers: Option<serde_json::Value>,
}

/// `Ok(None)` when the bytes are not a JSON object at all; a JSON object
/// missing its name or server list is an invalid bundle.
fn decode_legacy(bytes: &[u8]) -> Result<Option<LegacyPayload>, BundlerError> {
    let Ok(serde_json::Value::Object(object)) = serde_json::from_slice::<serde_json::Value>(bytes)
    else {
        return Ok(None);
    };
    let raw: RawLegacy = serde_json::from_value(serde_json::Value::Object(object)).map_err(|e| {
        BundlerError::InvalidBundleFormat {
            reason: e.to_string(),
        }
    })?;

    let name = match raw.name {
        Some(serde_json::Value::String(name)) if !name.trim().is_empty() => name,
        _ => {
            return Err(BundlerError::InvalidBundleFormat {
                reason: "missing name".to_string(),
            });
        }
    };
    let Some(serde_json::Value::Array(items)) = raw.servers else {
        return Err(BundlerError::InvalidBundleFormat {
            reason: "servers must be a list".to_string(),
        });
    };

    let mut servers: Vec<BundleServerEntry> = Vec::with_capacity(items.len());
    for item in items {
        let Ok(stored) = serde_json::from_value::<StoredServerEntry>(item) else {
            tracing::warn!("skipping malformed server entry in legacy share payload");
            continue;
        };
        let entry = stored.normalize();
        if !servers.iter().any(|e| e.server_id == entry.server_id) {
            servers.push(entry);
        }
    }

    Ok(Some(LegacyPayload {
        name,
        description: raw.description,
        servers,
    }))
}
