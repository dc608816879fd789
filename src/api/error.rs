use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use crate::listing::ListingError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ConfigurationMissing(String),
    #[error("upstream listing failed for partition {partition}")]
    PartitionFetchFailed { partition: String, detail: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ConfigurationMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::PartitionFetchFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ConfigurationMissing(_) => "CONFIGURATION_MISSING",
            ApiError::PartitionFetchFailed { .. } => "PARTITION_FETCH_FAILED",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            ApiError::PartitionFetchFailed { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
            detail: self.detail(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ListingError> for ApiError {
    fn from(value: ListingError) -> Self {
        match value {
            ListingError::ConfigurationMissing(_) => {
                ApiError::ConfigurationMissing(value.to_string())
            }
            ListingError::PartitionFailed { partition, source } => {
                ApiError::PartitionFetchFailed {
                    partition: partition.to_string(),
                    detail: source.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{AccessClass, FetchError, PartitionKey, StorageClass};

    #[test]
    fn test_configuration_missing_maps_to_500() {
        let err = ApiError::from(ListingError::ConfigurationMissing(vec!["cloud_name"]));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "CONFIGURATION_MISSING");
        assert_eq!(err.to_string(), "missing provider configuration: cloud_name");
    }

    #[test]
    fn test_partition_failure_keeps_upstream_detail() {
        let err = ApiError::from(ListingError::PartitionFailed {
            partition: PartitionKey::new(StorageClass::Video, AccessClass::Private),
            source: FetchError::Status {
                status: 401,
                body: "invalid api_key".to_string(),
            },
        });

        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.to_string(),
            "upstream listing failed for partition video:private"
        );
        assert_eq!(
            err.detail().as_deref(),
            Some("upstream returned HTTP 401: invalid api_key")
        );
    }
}
