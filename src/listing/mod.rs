//! Multi-partition listing engine
//!
//! The upstream asset store paginates each (storage class, access class)
//! partition independently. This module queries all of them, merges one page
//! from each into a single newest-first batch, and packs the per-partition
//! provider cursors into one opaque continuation token.
//!
//! ## Key Components
//!
//! - [`partitions`] - the nine partitions, in query order
//! - [`ContinuationState`] - per-partition cursors and their token codec
//! - [`PartitionSource`] - one page from one partition
//! - [`normalize`] - raw upstream record to [`ResourceItem`]
//! - [`Lister`] - drives a full listing call

mod aggregate;
mod cursor;
mod normalize;
mod partition;
mod source;

pub use aggregate::{
    FailurePolicy, Lister, ListingOptions, PageRequest, ResultPage, sort_newest_first,
};
pub use cursor::{ContinuationState, CursorError};
pub use normalize::{RawRecord, ResourceItem, build_link, normalize, short_id};
pub use partition::{
    AccessClass, PARTITION_COUNT, PartitionKey, PartitionParseError, StorageClass, partitions,
};
pub use source::{
    Credentials, DEFAULT_PAGE_SIZE, FetchError, MAX_PAGE_SIZE, PageQuery, PageSize,
    PartitionPage, PartitionSource,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("missing provider configuration: {}", .0.join(", "))]
    ConfigurationMissing(Vec<&'static str>),

    #[error("partition {partition} fetch failed: {source}")]
    PartitionFailed {
        partition: PartitionKey,
        #[source]
        source: FetchError,
    },
}
