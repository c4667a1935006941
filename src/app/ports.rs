use crate::error::Result;
use crate::types::{Lang, LangFields, StoredRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

// Outbound HTTP, used for endpoint probing and metadata lookups
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, url: &str) -> std::result::Result<HttpGetResult, String>;
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    /// `None` when the response carried no `Content-Type` header
    pub content_type: Option<String>,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Key-addressed persistence for registered layers
#[async_trait]
pub trait DocumentStorePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<StoredRecord>>;
    async fn put(&self, key: &str, record: &StoredRecord) -> Result<()>;
    /// Returns false when there was nothing to delete.
    async fn delete(&self, key: &str) -> Result<bool>;
    /// Keys of every record, or of records last written at or before `cutoff`.
    async fn list_keys(&self, cutoff: Option<DateTime<Utc>>) -> Result<Vec<String>>;
}

/// Links resolved from a language's metadata fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataLinks {
    pub metadata_url: Option<String>,
    pub catalogue_url: Option<String>,
}

#[async_trait]
pub trait MetadataResolverPort: Send + Sync {
    /// Fails with `RegistryError::Metadata` when the source is unusable.
    async fn resolve(&self, lang: Lang, fields: &LangFields) -> Result<MetadataLinks>;
}

pub trait RequestValidatorPort: Send + Sync {
    /// Every schema violation in `request`, empty when valid.
    fn validate(&self, request: &Value) -> Vec<String>;
}

/// What the signature check sees of an incoming request
#[derive(Clone, Debug)]
pub struct SignedRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub client_id: Option<&'a str>,
    pub timestamp: Option<&'a str>,
    pub signature: Option<&'a str>,
    pub body: &'a [u8],
}

pub trait AuthenticatorPort: Send + Sync {
    fn verify(&self, request: &SignedRequest<'_>) -> bool;
}
