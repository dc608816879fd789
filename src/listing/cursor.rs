//! Continuation token codec
//!
//! A [`ContinuationState`] maps each partition that still has more data to
//! the provider's own cursor for that partition. The caller only ever sees
//! the encoded form: URL-safe base64 (no padding) of a versioned JSON
//! envelope.
//!
//! ```json
//! { "v": 1, "cursors": { "raw:upload": "8edbc6...", "image:private": "1f0a..." } }
//! ```
//!
//! Tokens issued before the envelope existed were standard base64 of a flat
//! `{ "raw:upload": "..." }` object; those still decode.

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::partition::PartitionKey;

const CURSOR_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CursorError {
    #[error("token is not valid base64")]
    Base64,

    #[error("token payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported token version: {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u32,
    cursors: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Versioned(Envelope),
    Legacy(BTreeMap<String, String>),
}

/// Per-partition provider cursors; only non-empty tokens are stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationState {
    cursors: BTreeMap<PartitionKey, String>,
}

impl ContinuationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a partition's next token; an empty token clears the entry
    pub fn insert(&mut self, key: PartitionKey, token: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            self.cursors.remove(&key);
        } else {
            self.cursors.insert(key, token);
        }
    }

    pub fn get(&self, key: &PartitionKey) -> Option<&str> {
        self.cursors.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PartitionKey, &str)> {
        self.cursors.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Strict decode, used where the caller wants to know why a token was
    /// rejected. An empty token is a valid, empty state.
    pub fn try_decode(token: &str) -> Result<Self, CursorError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(Self::default());
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .or_else(|_| STANDARD.decode(token))
            .map_err(|_| CursorError::Base64)?;

        let raw = match serde_json::from_slice::<Payload>(&bytes)? {
            Payload::Versioned(envelope) if envelope.v == CURSOR_VERSION => envelope.cursors,
            Payload::Versioned(envelope) => {
                return Err(CursorError::UnsupportedVersion(envelope.v));
            }
            Payload::Legacy(map) => map,
        };

        let mut state = Self::default();
        for (key, value) in raw {
            match key.parse::<PartitionKey>() {
                Ok(partition) => state.insert(partition, value),
                Err(e) => tracing::debug!(key = %key, error = %e, "Dropping unknown cursor key"),
            }
        }

        Ok(state)
    }

    /// Soft decode: anything unusable becomes an empty state
    pub fn decode(token: &str) -> Self {
        Self::try_decode(token).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "Discarding malformed continuation token");
            Self::default()
        })
    }

    pub fn try_encode(&self) -> Result<String, CursorError> {
        if self.cursors.is_empty() {
            return Ok(String::new());
        }

        let envelope = Envelope {
            v: CURSOR_VERSION,
            cursors: self
                .cursors
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };

        let json = serde_json::to_vec(&envelope)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Soft encode: a serialization failure yields `""` (no further pages)
    pub fn encode(&self) -> String {
        self.try_encode().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to encode continuation token");
            String::new()
        })
    }
}

impl FromIterator<(PartitionKey, String)> for ContinuationState {
    fn from_iter<I: IntoIterator<Item = (PartitionKey, String)>>(iter: I) -> Self {
        let mut state = Self::default();
        for (key, token) in iter {
            state.insert(key, token);
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::partition::{AccessClass, StorageClass, partitions};

    fn key(storage: StorageClass, access: AccessClass) -> PartitionKey {
        PartitionKey::new(storage, access)
    }

    #[test]
    fn test_round_trip_full_state() {
        let state: ContinuationState = partitions()
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, format!("cursor-{i}+/=")))
            .collect();

        let decoded = ContinuationState::decode(&state.encode());
        assert_eq!(decoded, state);
        assert_eq!(decoded.len(), 9);
    }

    #[test]
    fn test_round_trip_partial_state() {
        let mut state = ContinuationState::new();
        state.insert(key(StorageClass::Raw, AccessClass::Upload), "abc");
        state.insert(key(StorageClass::Video, AccessClass::Private), "xyz");

        assert_eq!(ContinuationState::decode(&state.encode()), state);
    }

    #[test]
    fn test_empty_tokens_are_normalized_away() {
        let mut state = ContinuationState::new();
        state.insert(key(StorageClass::Raw, AccessClass::Upload), "abc");
        state.insert(key(StorageClass::Image, AccessClass::Upload), "");
        assert_eq!(state.len(), 1);

        state.insert(key(StorageClass::Raw, AccessClass::Upload), "");
        assert!(state.is_empty());
        assert_eq!(state.encode(), "");
    }

    #[test]
    fn test_encoded_token_is_url_safe() {
        let mut state = ContinuationState::new();
        state.insert(key(StorageClass::Raw, AccessClass::Upload), "??>>~~??");

        let token = state.encode();
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_decode_fails_soft() {
        assert!(ContinuationState::decode("").is_empty());
        assert!(ContinuationState::decode("not-base64!!").is_empty());
        assert!(ContinuationState::decode(&STANDARD.encode("hello world")).is_empty());
        assert!(ContinuationState::decode(&STANDARD.encode("[1,2,3]")).is_empty());
    }

    #[test]
    fn test_try_decode_reports_cause() {
        assert!(matches!(
            ContinuationState::try_decode("not-base64!!"),
            Err(CursorError::Base64)
        ));
        assert!(matches!(
            ContinuationState::try_decode(&URL_SAFE_NO_PAD.encode("{")),
            Err(CursorError::Json(_))
        ));

        let future = URL_SAFE_NO_PAD.encode(r#"{"v":2,"cursors":{}}"#);
        assert!(matches!(
            ContinuationState::try_decode(&future),
            Err(CursorError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn test_decode_legacy_flat_map() {
        let legacy = STANDARD.encode(
            r#"{"raw:upload":"abc","image:private":"","video:authenticated":"def"}"#,
        );

        let state = ContinuationState::decode(&legacy);
        assert_eq!(state.len(), 2);
        assert_eq!(
            state.get(&key(StorageClass::Raw, AccessClass::Upload)),
            Some("abc")
        );
        assert_eq!(
            state.get(&key(StorageClass::Video, AccessClass::Authenticated)),
            Some("def")
        );
        assert_eq!(state.get(&key(StorageClass::Image, AccessClass::Private)), None);
    }

    #[test]
    fn test_decode_drops_unknown_partitions() {
        let token = URL_SAFE_NO_PAD
            .encode(r#"{"v":1,"cursors":{"audio:upload":"x","raw:private":"y"}}"#);

        let state = ContinuationState::decode(&token);
        assert_eq!(state.len(), 1);
        assert_eq!(
            state.get(&key(StorageClass::Raw, AccessClass::Private)),
            Some("y")
        );
    }
}
