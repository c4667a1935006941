use crate::app::ports::{HttpClientPort, MetadataLinks, MetadataResolverPort};
use crate::config::MetadataConfig;
use crate::error::{RegistryError, Result};
use crate::types::{Lang, LangFields, MetadataSource};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Resolves metadata links from a catalogue uuid or a direct metadata URL
pub struct CatalogueMetadataResolver {
    http: Arc<dyn HttpClientPort>,
    settings: MetadataConfig,
}

impl CatalogueMetadataResolver {
    pub fn new(http: Arc<dyn HttpClientPort>, settings: MetadataConfig) -> Self {
        Self { http, settings }
    }

    fn from_uuid(&self, lang: Lang, raw_uuid: &str) -> Result<MetadataLinks> {
        let uuid = Uuid::parse_str(raw_uuid.trim())
            .map_err(|e| RegistryError::Metadata(format!("invalid metadata uuid '{raw_uuid}': {e}")))?;
        let url_template = self.settings.url_template.as_deref().ok_or_else(|| {
            RegistryError::Metadata("metadata lookup by uuid is not configured".to_string())
        })?;

        Ok(MetadataLinks {
            metadata_url: Some(fill_template(url_template, lang, &uuid)),
            catalogue_url: self
                .settings
                .catalogue_template
                .as_deref()
                .map(|t| fill_template(t, lang, &uuid)),
        })
    }

    async fn from_url(&self, url: &str, source: &MetadataSource) -> Result<MetadataLinks> {
        let resp = self
            .http
            .get(url)
            .await
            .map_err(|e| RegistryError::Metadata(format!("metadata url {url} is unreachable: {e}")))?;
        if !resp.is_success() {
            return Err(RegistryError::Metadata(format!(
                "metadata url {url} returned HTTP {}",
                resp.status
            )));
        }
        Ok(MetadataLinks {
            metadata_url: Some(url.to_string()),
            catalogue_url: source.catalogue_url.clone(),
        })
    }
}

fn fill_template(template: &str, lang: Lang, uuid: &Uuid) -> String {
    template
        .replace("{uuid}", &uuid.to_string())
        .replace("{lang}", lang.as_str())
}

#[async_trait]
impl MetadataResolverPort for CatalogueMetadataResolver {
    async fn resolve(&self, lang: Lang, fields: &LangFields) -> Result<MetadataLinks> {
        let Some(source) = fields.metadata.as_ref() else {
            return Ok(MetadataLinks::default());
        };
        let links = if let Some(uuid) = source.uuid.as_deref() {
            self.from_uuid(lang, uuid)?
        } else if let Some(url) = source.url.as_deref() {
            self.from_url(url, source).await?
        } else {
            MetadataLinks::default()
        };
        debug!(lang = %lang, links = ?links, "Resolved metadata");
        Ok(links)
    }
}
