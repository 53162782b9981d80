//! # contract: boundary types and traits for the remote services
//!
//! This module defines the two traits the core logic talks to, together with
//! the plain data types that cross them:
//!
//! - [`BucketDirectory`]: list, create and update buckets in the object-storage
//!   service. Implemented over HTTP by the CLI crate and by mocks in tests.
//! - [`SigningKeySource`]: fetch the shared JWT secret of a project from the
//!   control plane.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall`, so consumers can generate
//!   deterministic mocks (`MockBucketDirectory`, `MockSigningKeySource`) with
//!   the `test-export-mocks` feature.
//!
//! ## Adding New Directory Backends
//! - Implement [`BucketDirectory`] for the backend.
//! - Convert every upstream failure (network, non-2xx status, bad body) into an
//!   [`ApiError`]; the reconciler surfaces it unchanged.

use async_trait::async_trait;
use indexmap::IndexMap;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Error type for remote calls (boxed, like every transport error in this crate).
pub type ApiError = Box<dyn std::error::Error + Send + Sync>;

/// Desired state of a single bucket, keyed by name in a [`BucketConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredBucket {
    #[serde(default)]
    pub public: bool,
    /// Maximum object size in bytes; `None` leaves it to the service default.
    #[serde(default)]
    pub file_size_limit: Option<u64>,
    /// MIME patterns such as `image/*`. Empty means unrestricted.
    #[serde(default)]
    pub allowed_mime_types: Vec<String>,
}

impl DesiredBucket {
    /// The full property set sent on create and update.
    pub fn props(&self) -> BucketProps {
        BucketProps {
            public: self.public,
            file_size_limit: self.file_size_limit,
            allowed_mime_types: self.allowed_mime_types.clone(),
        }
    }
}

/// Ordered name → bucket mapping. Iteration order is insertion order, so
/// reconciliation order (and its diagnostics) follows the config file.
pub type BucketConfig = IndexMap<String, DesiredBucket>;

/// Bucket properties managed by reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketProps {
    pub public: bool,
    pub file_size_limit: Option<u64>,
    pub allowed_mime_types: Vec<String>,
}

/// A bucket as returned by the directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteBucket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub file_size_limit: Option<u64>,
    #[serde(default)]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Request to create a bucket that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBucketRequest {
    pub name: String,
    #[serde(flatten)]
    pub props: BucketProps,
}

/// Request to replace the properties of an existing bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateBucketRequest {
    pub id: String,
    #[serde(flatten)]
    pub props: BucketProps,
}

/// Returned by the service after a successful create.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedBucket {
    pub name: String,
}

/// Read/write access to the storage service's bucket set.
///
/// The trait is implemented by the HTTP client in the CLI crate and by test
/// mocks. Calls are awaited one at a time by the reconciler.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BucketDirectory: Send + Sync {
    /// List every bucket currently present in the project.
    async fn list_buckets(&self) -> Result<Vec<RemoteBucket>, ApiError>;

    /// Create a bucket with the given name and properties.
    async fn create_bucket(&self, req: CreateBucketRequest) -> Result<CreatedBucket, ApiError>;

    /// Replace all managed properties of the bucket identified by `req.id`.
    async fn update_bucket(&self, req: UpdateBucketRequest) -> Result<(), ApiError>;
}

/// Source of the project's shared JWT secret.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SigningKeySource: Send + Sync {
    /// Fetch the JWT secret configured for `project_ref`.
    async fn fetch_jwt_secret(&self, project_ref: &str) -> Result<String, ApiError>;
}
