//! Error taxonomy for the core crate.
//!
//! Nothing here is retried: every error is handed back to the immediate caller,
//! and the CLI reports it and exits.

use crate::contract::ApiError;

/// Missing or malformed inputs discovered before any remote mutation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// No project reference in the config file or the environment.
    #[error("Cannot find project ref. Set `project_ref` in the config file or the SUPABASE_PROJECT_ID environment variable")]
    MissingProjectRef,

    /// The project reference does not have the expected shape.
    #[error("Invalid project ref format: {0:?}. Must be like `abcdefghijklmnopqrst`")]
    InvalidProjectRef(String),

    /// The shared secret came back empty from the control plane.
    #[error("Shared JWT secret is missing for this project")]
    MissingSecret,
}

/// Raised while issuing a signed token.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("Signing secret must not be empty")]
    EmptySecret,

    #[error("Token expiry is out of range")]
    InvalidExpiry,

    #[error("Failed to encode token: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
}

/// Failure of a bucket reconciliation run.
///
/// Buckets already created or updated before the failure stay as they are.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The directory call failed; the underlying error is surfaced as-is.
    #[error(transparent)]
    Transport(ApiError),
}

/// Failure while producing the credential bundle for a project branch.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transport(ApiError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}
