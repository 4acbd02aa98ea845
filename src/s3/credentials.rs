//! S3 Credentials Module
//!
//! Static access/secret key credentials taken from the run configuration and
//! handed to the AWS SDK.
//!
//! # Example
//!
//! ```
//! use s3_upload_bench::config::StorageConfig;
//! use s3_upload_bench::s3::CredentialsProvider;
//!
//! let config = StorageConfig::default();
//! let creds = CredentialsProvider::from_config(&config).unwrap();
//! assert_eq!(creds.access_key_id(), "minioadmin");
//! ```

use crate::config::StorageConfig;
use thiserror::Error;

/// Name reported to the SDK as the origin of these credentials
const PROVIDER_NAME: &str = "s3-upload-bench";

/// Credential loading errors
#[derive(Error, Debug)]
pub enum CredentialsError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Credentials for AWS authentication
#[derive(Clone)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
}

impl Credentials {
    /// Create new credentials
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Get the access key ID
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Get the secret access key
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Convert into the SDK credential type
    pub fn to_aws(&self) -> aws_credential_types::Credentials {
        aws_credential_types::Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            None,
            None,
            PROVIDER_NAME,
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Factory for [`Credentials`]
pub struct CredentialsProvider;

impl CredentialsProvider {
    /// Load credentials from StorageConfig
    ///
    /// Uses the `access_key` and `secret_key` fields; both must be non-empty.
    pub fn from_config(config: &StorageConfig) -> Result<Credentials, CredentialsError> {
        if config.access_key.is_empty() {
            return Err(CredentialsError::MissingCredentials(
                "access_key not set in config".into(),
            ));
        }

        if config.secret_key.is_empty() {
            return Err(CredentialsError::MissingCredentials(
                "secret_key not set in config".into(),
            ));
        }

        Ok(Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
        ))
    }
}
