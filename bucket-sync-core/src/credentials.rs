//! Deterministic credentials for a project branch.
//!
//! Nothing here is stored: every run recomputes the same values from the same
//! inputs. The password is a reproducible derivation, *not* a password hash;
//! there is no salt and no work factor.

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use tracing::{error, info};

use crate::contract::SigningKeySource;
use crate::error::{ConfigurationError, CredentialsError, SigningError};
use crate::project::ProjectRef;

/// Issuer claim stamped on every token.
pub const ISSUER: &str = "supabase";
pub const ANON_ROLE: &str = "anon";
pub const SERVICE_ROLE: &str = "service_role";

/// Token lifetime applied by [`default_expiry`].
pub const DEFAULT_TOKEN_YEARS: i32 = 10;

/// Claims carried by issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "ref")]
    pub project_ref: String,
    pub role: String,
    pub iss: String,
    pub exp: i64,
}

/// SHA-256 over `"{project_ref}:{secret}:{branch}"`, lower-case hex.
pub fn derive_password(project_ref: &str, secret: &str, branch: &str) -> String {
    let key = [project_ref, secret, branch].join(":");
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Issues an HS256 token for `role` on `project_ref`, expiring at `expiry`.
pub fn sign_token(
    project_ref: &str,
    role: &str,
    expiry: OffsetDateTime,
    signing_secret: &str,
) -> Result<String, SigningError> {
    if signing_secret.is_empty() {
        return Err(SigningError::EmptySecret);
    }
    let claims = TokenClaims {
        project_ref: project_ref.to_string(),
        role: role.to_string(),
        iss: ISSUER.to_string(),
        exp: expiry.unix_timestamp(),
    };
    let key = EncodingKey::from_secret(signing_secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| {
        error!(role, error = ?e, "Failed to sign token");
        SigningError::from(e)
    })
}

/// `now` plus ten calendar years. A February 29th start rolls over to March 1st.
pub fn default_expiry(now: OffsetDateTime) -> Result<OffsetDateTime, SigningError> {
    let target_year = now.year() + DEFAULT_TOKEN_YEARS;
    now.replace_year(target_year)
        .or_else(|_| (now + Duration::days(1)).replace_year(target_year))
        .map_err(|_| SigningError::InvalidExpiry)
}

/// Inputs for one credential derivation, passed explicitly instead of living in
/// process-wide state.
#[derive(Debug, Clone)]
pub struct CredentialContext {
    pub project_ref: ProjectRef,
    pub jwt_secret: String,
    pub branch: String,
    pub platform_domain: String,
}

/// The full credential bundle for a project branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCredentials {
    pub db_host: String,
    pub db_password: String,
    pub jwt_secret: String,
    pub anon_key: String,
    pub service_role_key: String,
}

impl CredentialContext {
    pub fn db_host(&self) -> String {
        format!(
            "{}-{}.{}",
            self.project_ref, self.branch, self.platform_domain
        )
    }

    pub fn password(&self) -> String {
        derive_password(self.project_ref.as_str(), &self.jwt_secret, &self.branch)
    }

    pub fn sign(&self, role: &str, expiry: OffsetDateTime) -> Result<String, SigningError> {
        sign_token(self.project_ref.as_str(), role, expiry, &self.jwt_secret)
    }

    /// Derives every credential. Either all of them are produced or none.
    pub fn derive(&self, expiry: OffsetDateTime) -> Result<ProjectCredentials, SigningError> {
        let anon_key = self.sign(ANON_ROLE, expiry)?;
        let service_role_key = self.sign(SERVICE_ROLE, expiry)?;
        Ok(ProjectCredentials {
            db_host: self.db_host(),
            db_password: self.password(),
            jwt_secret: self.jwt_secret.clone(),
            anon_key,
            service_role_key,
        })
    }
}

/// Fetches the project's shared secret. An empty secret is a configuration
/// problem, reported before anything is signed.
pub async fn fetch_signing_secret<S>(
    source: &S,
    project_ref: &ProjectRef,
) -> Result<String, CredentialsError>
where
    S: SigningKeySource + ?Sized,
{
    let jwt_secret = source
        .fetch_jwt_secret(project_ref.as_str())
        .await
        .map_err(|e| {
            error!(project_ref = %project_ref, error = ?e, "Failed to fetch JWT secret");
            CredentialsError::Transport(e)
        })?;
    if jwt_secret.is_empty() {
        error!(project_ref = %project_ref, "Platform returned an empty JWT secret");
        return Err(ConfigurationError::MissingSecret.into());
    }
    Ok(jwt_secret)
}

/// Fetches the project's shared secret from `source` and derives the branch credentials.
pub async fn generate_credentials<S>(
    source: &S,
    project_ref: &ProjectRef,
    branch: &str,
    platform_domain: &str,
    expiry: OffsetDateTime,
) -> Result<ProjectCredentials, CredentialsError>
where
    S: SigningKeySource + ?Sized,
{
    let jwt_secret = fetch_signing_secret(source, project_ref).await?;
    info!(project_ref = %project_ref, branch, "Deriving branch credentials");

    let context = CredentialContext {
        project_ref: project_ref.clone(),
        jwt_secret,
        branch: branch.to_string(),
        platform_domain: platform_domain.to_string(),
    };
    Ok(context.derive(expiry)?)
}
