use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, error};

use crate::error::ConfigurationError;

static PROJECT_REF_PATTERN: OnceLock<Regex> = OnceLock::new();

fn project_ref_pattern() -> &'static Regex {
    PROJECT_REF_PATTERN.get_or_init(|| Regex::new(r"^[a-z]{20}$").expect("valid project ref regex"))
}

/// A validated project reference: exactly 20 lower-case ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef(String);

impl ProjectRef {
    pub fn parse(raw: &str) -> Result<Self, ConfigurationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            error!("Project ref is empty");
            return Err(ConfigurationError::MissingProjectRef);
        }
        if !project_ref_pattern().is_match(trimmed) {
            error!(project_ref = %trimmed, "Project ref does not match expected format");
            return Err(ConfigurationError::InvalidProjectRef(trimmed.to_string()));
        }
        debug!(project_ref = %trimmed, "Project ref validated");
        Ok(Self(trimmed.to_string()))
    }

    /// Picks the first present candidate (e.g. environment, then config file) and validates it.
    pub fn resolve<I>(candidates: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = Option<String>>,
    {
        candidates
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .ok_or(ConfigurationError::MissingProjectRef)
            .and_then(|candidate| Self::parse(&candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectRef {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
