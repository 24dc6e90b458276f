//! Operator verification.
//!
//! Submissions are gated behind an operator check. The check is a
//! [`CredentialVerifier`] handed in at startup; no credential is ever
//! compiled into the binary.

use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::error::{Error, Result};

/// Something that can vouch for an operator.
pub trait CredentialVerifier: Send + Sync + std::fmt::Debug {
    /// Accept or reject `operator` with `secret`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] if the credentials are rejected.
    fn verify(&self, operator: &str, secret: &str) -> Result<()>;
}

/// Digest a secret the way [`DigestVerifier`] expects it in configuration.
#[must_use]
pub fn digest_secret(secret: &str) -> String {
    blake3::hash(secret.as_bytes()).to_hex().to_string()
}

/// Verifies an operator name and the BLAKE3 digest of their password.
#[derive(Debug, Clone)]
pub struct DigestVerifier {
    operator: String,
    digest: blake3::Hash,
}

impl DigestVerifier {
    /// Build a verifier from an operator name and hex digest.
    ///
    /// # Errors
    ///
    /// Returns an error if `digest_hex` is not a 64-character hex digest.
    pub fn new(operator: impl Into<String>, digest_hex: &str) -> Result<Self> {
        let digest = blake3::Hash::from_hex(digest_hex).map_err(|e| Error::ConfigValidation {
            message: format!("auth.password_digest is not a valid digest: {e}"),
        })?;
        Ok(Self {
            operator: operator.into(),
            digest,
        })
    }

    /// Build a verifier from the `[auth]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredential`] if the operator or digest is unset.
    pub fn from_config(auth: &AuthConfig) -> Result<Self> {
        let operator = auth
            .operator
            .as_deref()
            .ok_or_else(|| Error::missing_credential("auth.operator"))?;
        let digest = auth
            .password_digest
            .as_deref()
            .ok_or_else(|| Error::missing_credential("auth.password_digest"))?;
        Self::new(operator, digest)
    }
}

impl CredentialVerifier for DigestVerifier {
    fn verify(&self, operator: &str, secret: &str) -> Result<()> {
        // blake3::Hash equality is constant-time.
        let digest_matches = blake3::hash(secret.as_bytes()) == self.digest;
        if operator == self.operator && digest_matches {
            debug!("Operator {} verified", operator);
            Ok(())
        } else {
            warn!("Rejected credentials for operator {}", operator);
            Err(Error::AuthenticationFailed {
                operator: operator.to_string(),
            })
        }
    }
}

/// Accepts everyone. Used when `auth.required` is false.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CredentialVerifier for AllowAll {
    fn verify(&self, operator: &str, _secret: &str) -> Result<()> {
        debug!("Operator verification disabled; accepting {}", operator);
        Ok(())
    }
}

/// Choose the verifier the configuration asks for.
///
/// # Errors
///
/// Returns an error if verification is required but not configured.
pub fn verifier_from_config(auth: &AuthConfig) -> Result<Box<dyn CredentialVerifier>> {
    if auth.required {
        Ok(Box::new(DigestVerifier::from_config(auth)?))
    } else {
        Ok(Box::new(AllowAll))
    }
}
