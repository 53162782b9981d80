#![doc = "Storage API client: implements the core `BucketDirectory` trait over the storage REST endpoints."]
//
//! # Storage Client
//!
//! [`StorageClient`] talks to `{storage_url}/bucket` with the project's
//! `service_role` key. It is the production implementation of
//! [`BucketDirectory`]; the reconciler never sees HTTP details.
//!
//! - Non-2xx responses and undecodable bodies become errors carrying the status and body.
//! - Each request is bounded by the client timeout; a timeout is an ordinary error.
//! - No retries.

use async_trait::async_trait;
use bucket_sync_core::contract::{
    ApiError, BucketDirectory, CreateBucketRequest, CreatedBucket, RemoteBucket,
    UpdateBucketRequest,
};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

pub struct StorageClient {
    http: Client,
    base_url: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, "Initialized StorageClient");
        Ok(StorageClient {
            http,
            base_url,
            service_key: service_key.into(),
        })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
    }
}

/// Passes 2xx responses through; turns anything else into an error with the response body.
async fn ensure_success(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(format!("Storage API error: status {status}: {body}").into())
}

#[async_trait]
impl BucketDirectory for StorageClient {
    async fn list_buckets(&self) -> Result<Vec<RemoteBucket>, ApiError> {
        tracing::info!(base_url = %self.base_url, "Listing storage buckets");
        let url = format!("{}/bucket", self.base_url);
        let resp = self.authorized(self.http.get(&url)).send().await;

        match resp {
            Ok(resp) => {
                let buckets: Vec<RemoteBucket> = ensure_success(resp).await?.json().await?;
                tracing::info!(count = buckets.len(), "Fetched storage buckets");
                Ok(buckets)
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to list storage buckets");
                Err(Box::new(e))
            }
        }
    }

    async fn create_bucket(&self, req: CreateBucketRequest) -> Result<CreatedBucket, ApiError> {
        tracing::info!(bucket = %req.name, "Creating storage bucket");
        let url = format!("{}/bucket", self.base_url);
        let resp = self.authorized(self.http.post(&url)).json(&req).send().await;

        match resp {
            Ok(resp) => {
                let created: CreatedBucket = ensure_success(resp).await?.json().await?;
                tracing::info!(bucket = %created.name, "Successfully created storage bucket");
                Ok(created)
            }
            Err(e) => {
                tracing::error!(error = ?e, bucket = %req.name, "API error creating storage bucket");
                Err(Box::new(e))
            }
        }
    }

    async fn update_bucket(&self, req: UpdateBucketRequest) -> Result<(), ApiError> {
        tracing::info!(bucket_id = %req.id, "Updating storage bucket");
        let url = format!("{}/bucket/{}", self.base_url, req.id);
        let resp = self.authorized(self.http.put(&url)).json(&req).send().await;

        match resp {
            Ok(resp) => {
                ensure_success(resp).await?;
                tracing::info!(bucket_id = %req.id, "Successfully updated storage bucket");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = ?e, bucket_id = %req.id, "API error updating storage bucket");
                Err(Box::new(e))
            }
        }
    }
}
