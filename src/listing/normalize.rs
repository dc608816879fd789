//! Mapping of raw upstream records into public listing items

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use super::partition::{AccessClass, PartitionKey, StorageClass};

/// Characters escaped in the `cid` link parameter (everything except
/// `A-Z a-z 0-9 - _ . ! ~ * ' ( )`)
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Record as returned by the upstream search API
///
/// Every field is optional so a partially populated record still lists. A
/// field of the wrong JSON type reads as absent instead of rejecting the
/// record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub public_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub filename: Option<String>,
}

impl RawRecord {
    /// Best-effort read of one upstream record; `None` when it is not an object
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub resource_type: StorageClass,
    #[serde(rename = "type")]
    pub access: AccessClass,
    pub link: String,
}

impl ResourceItem {
    pub fn partition(&self) -> PartitionKey {
        PartitionKey::new(self.resource_type, self.access)
    }
}

/// Derive the caller-facing identifier from a full provider path
///
/// Leading slashes are dropped, then one leading `folder` (with an optional
/// trailing slash). Paths outside the folder keep their full form.
pub fn short_id(path: &str, folder: &str) -> String {
    let path = path.trim_start_matches('/');

    let stripped = match path.strip_prefix(folder) {
        Some(rest) if !folder.is_empty() => rest.strip_prefix('/').unwrap_or(rest),
        _ => path,
    };

    if stripped.is_empty() {
        path.to_string()
    } else {
        stripped.to_string()
    }
}

/// Build the link that opens an item in the front-end
pub fn build_link(base_url: &str, id: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let encoded = utf8_percent_encode(id, COMPONENT);

    if trimmed.is_empty() {
        format!("/?cid={encoded}")
    } else {
        format!("{trimmed}/?cid={encoded}")
    }
}

pub fn normalize(
    raw: RawRecord,
    partition: PartitionKey,
    folder: &str,
    base_url: &str,
) -> ResourceItem {
    let id = short_id(raw.public_id.as_deref().unwrap_or_default(), folder);
    let link = build_link(base_url, &id);

    ResourceItem {
        id,
        public_id: raw.public_id,
        created_at: raw.created_at,
        bytes: raw.bytes,
        format: raw.format,
        filename: raw.filename,
        resource_type: partition.storage,
        access: partition.access,
        link,
    }
}
