//! Component identity.
//!
//! A component identity becomes the Service name and the value of the
//! `component` selector label, so it must be a valid RFC 1123 DNS label.
//! Renaming a component breaks selector continuity with already-running
//! workloads.

use std::fmt;

use crate::error::{Error, Result};

/// Maximum length of a Kubernetes object name that is also a DNS label
pub const MAX_IDENTITY_LENGTH: usize = 63;

/// Validated, stable name token of a platform component.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentIdentity(String);

impl ComponentIdentity {
    /// Validate and wrap a component name.
    pub fn new(identity: impl Into<String>) -> Result<Self> {
        let identity = identity.into();
        validate_dns_label(&identity).map_err(|reason| Error::InvalidIdentity {
            identity: identity.clone(),
            reason,
        })?;
        Ok(Self(identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComponentIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validate an RFC 1123 DNS label.
///
/// Rules:
/// - Must not be empty or longer than 63 characters
/// - May contain lowercase letters, digits, and hyphens
/// - Must start and end with a lowercase letter or digit
fn validate_dns_label(s: &str) -> std::result::Result<(), String> {
    if s.is_empty() {
        return Err("identity cannot be empty".to_string());
    }

    if s.len() > MAX_IDENTITY_LENGTH {
        return Err(format!(
            "exceeds maximum length of {} characters",
            MAX_IDENTITY_LENGTH
        ));
    }

    if let Some(c) = s
        .chars()
        .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
    {
        return Err(format!(
            "invalid character '{}': must be lowercase alphanumeric or '-'",
            c
        ));
    }

    if s.starts_with('-') || s.ends_with('-') {
        return Err("must start and end with an alphanumeric character".to_string());
    }

    Ok(())
}
