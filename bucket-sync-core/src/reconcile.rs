//! Bucket reconciliation: converge the remote bucket set towards a desired configuration.
//!
//! The reconciler walks the desired buckets in configuration order and, per bucket:
//!   - creates it when no remote bucket carries the same name,
//!   - replaces its properties when it exists and every filter accepts its id,
//!   - skips it when any filter rejects its id.
//!
//! Remote buckets that are not in the desired configuration are never touched.
//!
//! # Error Handling
//! Fail-fast and non-transactional: the first failing directory call aborts the run
//! and is returned unchanged. Buckets mutated before the failure stay mutated.
//!
//! # Navigation
//! - Main entrypoints: [`upsert_buckets`] (list, then reconcile) and [`reconcile`].
//! - Output: [`ReconcileReport`].

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::contract::{
    BucketConfig, BucketDirectory, CreateBucketRequest, RemoteBucket, UpdateBucketRequest,
};
use crate::error::ReconcileError;

/// Guard over remote bucket ids. Returning `false` leaves the bucket untouched.
pub type BucketFilter = dyn Fn(&str) -> bool + Send + Sync;

/// Outcome of a reconciliation run, bucket names in processing order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
}

impl ReconcileReport {
    /// True when the run issued no mutating call.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} created, {} updated, {} skipped",
            self.created.len(),
            self.updated.len(),
            self.skipped.len()
        )
    }
}

/// Lists the remote buckets, then reconciles `desired` against them.
pub async fn upsert_buckets<D>(
    directory: &D,
    desired: &BucketConfig,
    filters: &[&BucketFilter],
) -> Result<ReconcileReport, ReconcileError>
where
    D: BucketDirectory + ?Sized,
{
    let remote = match directory.list_buckets().await {
        Ok(buckets) => {
            info!(count = buckets.len(), "[RECONCILE] Listed remote buckets");
            buckets
        }
        Err(e) => {
            error!(error = ?e, "[RECONCILE][ERROR] Failed to list remote buckets");
            return Err(ReconcileError::Transport(e));
        }
    };
    reconcile(directory, desired, &remote, filters).await
}

/// Reconciles `desired` against an already fetched `remote` listing.
///
/// Buckets are matched by exact name. When the listing holds the same name
/// twice, the later entry wins.
pub async fn reconcile<D>(
    directory: &D,
    desired: &BucketConfig,
    remote: &[RemoteBucket],
    filters: &[&BucketFilter],
) -> Result<ReconcileReport, ReconcileError>
where
    D: BucketDirectory + ?Sized,
{
    let mut exists: HashMap<&str, &str> = HashMap::with_capacity(remote.len());
    for bucket in remote {
        exists.insert(bucket.name.as_str(), bucket.id.as_str());
    }

    let mut report = ReconcileReport::default();

    for (name, bucket) in desired {
        let props = bucket.props();

        if let Some(&bucket_id) = exists.get(name.as_str()) {
            if !filters.iter().all(|keep| keep(bucket_id)) {
                info!(bucket = %name, bucket_id, "[RECONCILE] Filtered out, skipping update");
                report.skipped.push(name.clone());
                continue;
            }

            eprintln!("Updating storage bucket: {bucket_id}");
            debug!(bucket_id, ?props, "[RECONCILE] Update payload");
            let req = UpdateBucketRequest {
                id: bucket_id.to_string(),
                props,
            };
            if let Err(e) = directory.update_bucket(req).await {
                error!(bucket_id, error = ?e, "[RECONCILE][ERROR] update_bucket failed");
                return Err(ReconcileError::Transport(e));
            }
            info!(bucket_id, "[RECONCILE] Updated bucket");
            report.updated.push(name.clone());
        } else {
            eprintln!("Creating storage bucket: {name}");
            debug!(bucket = %name, ?props, "[RECONCILE] Create payload");
            let req = CreateBucketRequest {
                name: name.clone(),
                props,
            };
            match directory.create_bucket(req).await {
                Ok(created) => {
                    info!(bucket = %created.name, "[RECONCILE] Created bucket");
                }
                Err(e) => {
                    error!(bucket = %name, error = ?e, "[RECONCILE][ERROR] create_bucket failed");
                    return Err(ReconcileError::Transport(e));
                }
            }
            report.created.push(name.clone());
        }
    }

    info!(summary = %report.summary(), "[RECONCILE] Reconciliation complete");
    Ok(report)
}
