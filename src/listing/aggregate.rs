use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ListingError;
use super::cursor::ContinuationState;
use super::normalize::{ResourceItem, normalize};
use super::partition::{PartitionKey, partitions};
use super::source::{
    Credentials, FetchError, PageQuery, PageSize, PartitionPage, PartitionSource,
};
use crate::observability::Metrics;

/// What to do when a single partition fetch fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The failing partition contributes nothing; the call still succeeds
    #[default]
    PartialDegrade,
    /// Any failing partition fails the whole call
    FailFast,
}

#[derive(Debug, Clone)]
pub struct ListingOptions {
    pub folder: String,
    pub prefix: String,
    pub partition_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            folder: "quotes".to_string(),
            prefix: "q-".to_string(),
            partition_timeout: Duration::from_secs(10),
            failure_policy: FailurePolicy::PartialDegrade,
        }
    }
}

/// One caller request
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    /// Caller's continuation token; empty starts every partition fresh
    pub token: String,
    pub page_size: PageSize,
    /// Restrict the listing to names starting with the configured prefix
    pub prefix_filter: bool,
    /// Base URL for item links; empty yields relative links
    pub base_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub items: Vec<ResourceItem>,
    /// Continuation token for the next call; empty when every partition is exhausted
    pub next: String,
}

/// Drives one listing call across all partitions
///
/// Every call queries all nine partitions concurrently, each resuming from
/// its own provider cursor, and sorts the merged batch newest first.
///
/// The ordering is per call only. A partition that holds many matching
/// records can still have unfetched items newer than ones already returned
/// from a sparser partition; paging on eventually surfaces them, but out of
/// global time order.
pub struct Lister {
    source: Arc<dyn PartitionSource>,
    options: ListingOptions,
    metrics: Arc<Metrics>,
}

type Outcome = (PartitionKey, Result<PartitionPage, FetchError>);

impl Lister {
    pub fn new(
        source: Arc<dyn PartitionSource>,
        options: ListingOptions,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            source,
            options,
            metrics,
        }
    }

    pub async fn list_page(
        &self,
        credentials: &Credentials,
        request: &PageRequest,
    ) -> Result<ResultPage, ListingError> {
        let incoming = match ContinuationState::try_decode(&request.token) {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Malformed continuation token, restarting all partitions");
                self.metrics.cursor_reset();
                ContinuationState::new()
            }
        };

        let prefix = Some(self.options.prefix.clone())
            .filter(|p| request.prefix_filter && !p.is_empty());

        let fetches = partitions().iter().map(|partition| {
            let query = PageQuery {
                partition: *partition,
                token: incoming.get(partition).unwrap_or_default().to_string(),
                page_size: request.page_size,
                folder: self.options.folder.clone(),
                prefix: prefix.clone(),
            };

            async move {
                let outcome = self.fetch_partition(credentials, &query).await;
                (query.partition, outcome)
            }
        });

        // join_all keeps input order, so outcomes stay in partition order
        let outcomes = join_all(fetches).await;
        let page = self.merge(outcomes, &request.base_url)?;

        self.metrics.page_served(page.items.len());
        info!(
            items = page.items.len(),
            resumed = incoming.len(),
            has_more = !page.next.is_empty(),
            "Listing page assembled"
        );

        Ok(page)
    }

    async fn fetch_partition(
        &self,
        credentials: &Credentials,
        query: &PageQuery,
    ) -> Result<PartitionPage, FetchError> {
        tokio::time::timeout(
            self.options.partition_timeout,
            self.source.fetch_page(credentials, query),
        )
        .await
        .unwrap_or(Err(FetchError::Timeout))
    }

    fn merge(&self, outcomes: Vec<Outcome>, base_url: &str) -> Result<ResultPage, ListingError> {
        let mut items = Vec::new();
        let mut outgoing = ContinuationState::new();

        for (partition, outcome) in outcomes {
            let page = match outcome {
                Ok(page) => page,
                Err(source) => {
                    self.metrics.partition_failed();
                    match self.options.failure_policy {
                        FailurePolicy::PartialDegrade => {
                            warn!(%partition, error = %source, "Partition fetch failed, skipping");
                            continue;
                        }
                        FailurePolicy::FailFast => {
                            warn!(%partition, error = %source, "Partition fetch failed, aborting listing");
                            return Err(ListingError::PartitionFailed { partition, source });
                        }
                    }
                }
            };

            debug!(
                %partition,
                records = page.records.len(),
                has_more = !page.next_token.is_empty(),
                "Partition page fetched"
            );

            outgoing.insert(partition, page.next_token);
            items.extend(
                page.records
                    .into_iter()
                    .map(|raw| normalize(raw, partition, &self.options.folder, base_url)),
            );
        }

        sort_newest_first(&mut items);

        Ok(ResultPage {
            items,
            next: outgoing.encode(),
        })
    }
}

/// Newest first; undated items last; ties by partition order, then id
pub fn sort_newest_first(items: &mut [ResourceItem]) {
    items.sort_by_cached_key(|item| {
        let created = item
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        (
            created.is_none(),
            Reverse(created),
            item.partition().index(),
            item.id.clone(),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::normalize::RawRecord;
    use crate::listing::partition::{AccessClass, StorageClass};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted source: fixed pages per partition, optional failures, and a
    /// log of the tokens each partition was asked for
    #[derive(Default)]
    struct StubSource {
        pages: HashMap<PartitionKey, PartitionPage>,
        failing: Vec<PartitionKey>,
        stalled: Vec<PartitionKey>,
        seen: Mutex<Vec<(PartitionKey, String, Option<String>)>>,
    }

    #[async_trait]
    impl PartitionSource for StubSource {
        async fn fetch_page(
            &self,
            _credentials: &Credentials,
            query: &PageQuery,
        ) -> Result<PartitionPage, FetchError> {
            self.seen.lock().unwrap().push((
                query.partition,
                query.token.clone(),
                query.prefix.clone(),
            ));

            if self.stalled.contains(&query.partition) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.failing.contains(&query.partition) {
                return Err(FetchError::Status {
                    status: 500,
                    body: "boom".to_string(),
                });
            }

            Ok(self.pages.get(&query.partition).cloned().unwrap_or_default())
        }
    }

    fn record(id: &str, created_at: &str) -> RawRecord {
        RawRecord {
            public_id: Some(format!("quotes/{id}")),
            created_at: Some(created_at.to_string()),
            bytes: Some(100),
            format: Some("pdf".to_string()),
            filename: Some(id.to_string()),
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            cloud_name: "demo".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
        }
    }

    fn lister(source: StubSource, policy: FailurePolicy) -> (Lister, Arc<StubSource>) {
        let source = Arc::new(source);
        let options = ListingOptions {
            partition_timeout: Duration::from_millis(200),
            failure_policy: policy,
            ..ListingOptions::default()
        };
        let lister = Lister::new(source.clone(), options, Arc::new(Metrics::new()));
        (lister, source)
    }

    /// Two records per partition with distinct timestamps; partition `i`
    /// reports `next-{i}` as its provider cursor
    fn two_per_partition() -> StubSource {
        let mut source = StubSource::default();
        for (i, partition) in partitions().iter().enumerate() {
            source.pages.insert(
                *partition,
                PartitionPage {
                    records: vec![
                        record(&format!("q-{i}-a"), &format!("2024-05-{:02}T10:00:00Z", i + 1)),
                        record(&format!("q-{i}-b"), &format!("2024-06-{:02}T10:00:00Z", i + 1)),
                    ],
                    next_token: format!("next-{i}"),
                },
            );
        }
        source
    }

    #[tokio::test]
    async fn test_merges_all_partitions_newest_first() {
        let (lister, source) = lister(two_per_partition(), FailurePolicy::PartialDegrade);
        let request = PageRequest {
            page_size: PageSize::parse(Some("10"), 50, 100),
            ..PageRequest::default()
        };

        let page = lister.list_page(&credentials(), &request).await.unwrap();

        assert_eq!(page.items.len(), 18);
        assert_eq!(page.items[0].id, "q-8-b");
        assert_eq!(page.items[17].id, "q-0-a");
        for pair in page.items.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        let next = ContinuationState::decode(&page.next);
        assert_eq!(next.len(), 9);
        for (i, partition) in partitions().iter().enumerate() {
            assert_eq!(next.get(partition), Some(format!("next-{i}").as_str()));
        }

        assert_eq!(source.seen.lock().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_resumes_each_partition_from_its_token() {
        let (lister, source) = lister(two_per_partition(), FailurePolicy::PartialDegrade);
        let raw_upload = PartitionKey::new(StorageClass::Raw, AccessClass::Upload);
        let video_private = PartitionKey::new(StorageClass::Video, AccessClass::Private);

        let mut incoming = ContinuationState::new();
        incoming.insert(raw_upload, "r-u");
        incoming.insert(video_private, "v-p");

        let request = PageRequest {
            token: incoming.encode(),
            prefix_filter: true,
            ..PageRequest::default()
        };
        lister.list_page(&credentials(), &request).await.unwrap();

        let seen = source.seen.lock().unwrap();
        assert_eq!(seen.len(), 9);
        for (partition, token, prefix) in seen.iter() {
            let expected = match *partition {
                p if p == raw_upload => "r-u",
                p if p == video_private => "v-p",
                _ => "",
            };
            assert_eq!(token, expected);
            assert_eq!(prefix.as_deref(), Some("q-"));
        }
    }

    #[tokio::test]
    async fn test_prefix_filter_disabled() {
        let (lister, source) = lister(StubSource::default(), FailurePolicy::PartialDegrade);

        lister
            .list_page(&credentials(), &PageRequest::default())
            .await
            .unwrap();

        assert!(source.seen.lock().unwrap().iter().all(|(_, _, p)| p.is_none()));
    }

    #[tokio::test]
    async fn test_exhausted_partitions_yield_empty_token() {
        let (lister, _) = lister(StubSource::default(), FailurePolicy::PartialDegrade);

        let page = lister
            .list_page(&credentials(), &PageRequest::default())
            .await
            .unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.next, "");
    }

    #[tokio::test]
    async fn test_malformed_token_restarts_partitions() {
        let (lister, source) = lister(two_per_partition(), FailurePolicy::PartialDegrade);
        let request = PageRequest {
            token: "not-base64!!".to_string(),
            ..PageRequest::default()
        };

        let page = lister.list_page(&credentials(), &request).await.unwrap();

        assert_eq!(page.items.len(), 18);
        assert!(source.seen.lock().unwrap().iter().all(|(_, t, _)| t.is_empty()));
        assert_eq!(lister.metrics.snapshot().cursor_resets, 1);
    }

    #[tokio::test]
    async fn test_partial_degrade_skips_failed_partition() {
        let failed = PartitionKey::new(StorageClass::Image, AccessClass::Authenticated);
        let mut source = two_per_partition();
        source.failing.push(failed);
        let (lister, _) = lister(source, FailurePolicy::PartialDegrade);

        let page = lister
            .list_page(&credentials(), &PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 16);
        assert!(page.items.iter().all(|item| item.partition() != failed));

        let next = ContinuationState::decode(&page.next);
        assert_eq!(next.len(), 8);
        assert_eq!(next.get(&failed), None);
        assert_eq!(lister.metrics.snapshot().partition_failures, 1);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_call() {
        let failed = PartitionKey::new(StorageClass::Video, AccessClass::Upload);
        let mut source = two_per_partition();
        source.failing.push(failed);
        let (lister, _) = lister(source, FailurePolicy::FailFast);

        let err = lister
            .list_page(&credentials(), &PageRequest::default())
            .await
            .unwrap_err();

        match err {
            ListingError::PartitionFailed { partition, source } => {
                assert_eq!(partition, failed);
                assert!(matches!(source, FetchError::Status { status: 500, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let stalled = PartitionKey::new(StorageClass::Raw, AccessClass::Private);
        let mut source = two_per_partition();
        source.stalled.push(stalled);
        let (lister, _) = lister(source, FailurePolicy::PartialDegrade);

        let page = lister
            .list_page(&credentials(), &PageRequest::default())
            .await
            .unwrap();

        assert_eq!(page.items.len(), 16);
        assert_eq!(ContinuationState::decode(&page.next).get(&stalled), None);
    }

    #[tokio::test]
    async fn test_same_token_is_idempotent() {
        let (lister, _) = lister(two_per_partition(), FailurePolicy::PartialDegrade);
        let mut incoming = ContinuationState::new();
        incoming.insert(PartitionKey::new(StorageClass::Image, AccessClass::Upload), "i-u");
        let request = PageRequest {
            token: incoming.encode(),
            ..PageRequest::default()
        };

        let first = lister.list_page(&credentials(), &request).await.unwrap();
        let second = lister.list_page(&credentials(), &request).await.unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_sort_orders_by_instant_then_tie_break() {
        let raw_upload = PartitionKey::new(StorageClass::Raw, AccessClass::Upload);
        let image_upload = PartitionKey::new(StorageClass::Image, AccessClass::Upload);
        let mut items = vec![
            normalize(record("undated", "yesterday"), raw_upload, "quotes", ""),
            normalize(record("older", "2024-01-01T00:00:00Z"), raw_upload, "quotes", ""),
            normalize(record("tie-b", "2024-03-01T00:00:00Z"), image_upload, "quotes", ""),
            normalize(record("tie-z", "2024-03-01T00:00:00Z"), raw_upload, "quotes", ""),
            normalize(record("tie-a", "2024-03-01T00:00:00Z"), raw_upload, "quotes", ""),
            // same instant as 2024-03-02T00:00:00Z, later local offset
            normalize(record("offset", "2024-03-02T08:00:00+08:00"), raw_upload, "quotes", ""),
            normalize(record("newest", "2024-03-02T00:00:01Z"), image_upload, "quotes", ""),
        ];

        sort_newest_first(&mut items);

        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["newest", "offset", "tie-a", "tie-z", "tie-b", "older", "undated"]
        );
    }
}
