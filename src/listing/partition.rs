//! Partition layout for the upstream asset store
//!
//! Every listing call queries the full cross-product of storage classes and
//! access classes, storage-class-major:
//! - `raw:upload`, `raw:authenticated`, `raw:private`
//! - `image:upload`, `image:authenticated`, `image:private`
//! - `video:upload`, `video:authenticated`, `video:private`
//!
//! The text form `{storage}:{access}` is also the key used inside
//! continuation tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PartitionParseError {
    #[error("invalid partition key: {0}")]
    InvalidKey(String),

    #[error("unknown storage class: {0}")]
    UnknownStorageClass(String),

    #[error("unknown access class: {0}")]
    UnknownAccessClass(String),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    Raw,
    Image,
    Video,
}

impl StorageClass {
    pub const ALL: [StorageClass; 3] =
        [StorageClass::Raw, StorageClass::Image, StorageClass::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Raw => "raw",
            StorageClass::Image => "image",
            StorageClass::Video => "video",
        }
    }
}

impl FromStr for StorageClass {
    type Err = PartitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(StorageClass::Raw),
            "image" => Ok(StorageClass::Image),
            "video" => Ok(StorageClass::Video),
            other => Err(PartitionParseError::UnknownStorageClass(other.to_string())),
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessClass {
    Upload,
    Authenticated,
    Private,
}

impl AccessClass {
    pub const ALL: [AccessClass; 3] = [
        AccessClass::Upload,
        AccessClass::Authenticated,
        AccessClass::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessClass::Upload => "upload",
            AccessClass::Authenticated => "authenticated",
            AccessClass::Private => "private",
        }
    }
}

impl FromStr for AccessClass {
    type Err = PartitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upload" => Ok(AccessClass::Upload),
            "authenticated" => Ok(AccessClass::Authenticated),
            "private" => Ok(AccessClass::Private),
            other => Err(PartitionParseError::UnknownAccessClass(other.to_string())),
        }
    }
}

/// One independently paginated slice of the upstream listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionKey {
    pub storage: StorageClass,
    pub access: AccessClass,
}

pub const PARTITION_COUNT: usize = StorageClass::ALL.len() * AccessClass::ALL.len();

const PARTITIONS: [PartitionKey; PARTITION_COUNT] = build_partitions();

const fn build_partitions() -> [PartitionKey; PARTITION_COUNT] {
    let mut out = [PartitionKey {
        storage: StorageClass::Raw,
        access: AccessClass::Upload,
    }; PARTITION_COUNT];

    let mut s = 0;
    while s < StorageClass::ALL.len() {
        let mut a = 0;
        while a < AccessClass::ALL.len() {
            out[s * AccessClass::ALL.len() + a] = PartitionKey {
                storage: StorageClass::ALL[s],
                access: AccessClass::ALL[a],
            };
            a += 1;
        }
        s += 1;
    }

    out
}

/// All partitions in query order
pub fn partitions() -> &'static [PartitionKey; PARTITION_COUNT] {
    &PARTITIONS
}

impl PartitionKey {
    pub const fn new(storage: StorageClass, access: AccessClass) -> Self {
        Self { storage, access }
    }

    /// Position of this key in [`partitions`] order
    pub fn index(&self) -> usize {
        self.storage as usize * AccessClass::ALL.len() + self.access as usize
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.storage.as_str(), self.access.as_str())
    }
}

impl FromStr for PartitionKey {
    type Err = PartitionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (storage, access) = s
            .split_once(':')
            .ok_or_else(|| PartitionParseError::InvalidKey(s.to_string()))?;

        Ok(Self {
            storage: storage.parse()?,
            access: access.parse()?,
        })
    }
}
