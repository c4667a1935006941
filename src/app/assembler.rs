use crate::app::normalizer::normalize;
use crate::app::ports::MetadataResolverPort;
use crate::app::prober::EndpointProber;
use crate::constants::RECORD_ID_PREFIX;
use crate::error::Result;
use crate::types::{Lang, LangRecord, LayerType, RawRequest, RecordData, RecordType, ServiceType};
use std::sync::Arc;
use tracing::{debug, warn};

/// Layer id (and name) for a key in one language.
pub fn make_id(key: &str, lang: Lang) -> String {
    format!("{RECORD_ID_PREFIX}.{key}.{lang}")
}

/// Result of running a request through the enrichment pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRecord {
    pub service_type: ServiceType,
    pub layer_type: LayerType,
    pub en: LangRecord,
    pub fr: LangRecord,
}

impl AssembledRecord {
    pub fn record_type(&self) -> RecordType {
        RecordType::from(self.layer_type)
    }

    /// Pair the assembled configs with the request they were built from.
    pub fn into_data(self, request: RawRequest) -> RecordData {
        RecordData {
            request: Some(request),
            en: self.en,
            fr: self.fr,
        }
    }
}

/// Builds the bilingual layer configuration for a registration request
pub struct RecordAssembler {
    prober: EndpointProber,
    metadata: Arc<dyn MetadataResolverPort>,
}

impl RecordAssembler {
    pub fn new(prober: EndpointProber, metadata: Arc<dyn MetadataResolverPort>) -> Self {
        Self { prober, metadata }
    }

    /// Probe, remap and resolve metadata for `request`.
    ///
    /// Only the English service URL is probed and its type is applied to both
    /// languages. A metadata failure in either language aborts the whole
    /// assembly; nothing partial is returned.
    pub async fn assemble(&self, key: &str, request: &RawRequest) -> Result<AssembledRecord> {
        let service_type = self.prober.probe(&request.en.service_url).await;
        let layer_type = normalize(service_type);
        debug!(key = %key, service_type = %service_type, layer_type = %layer_type, "Classified endpoint");

        let en = self.assemble_lang(key, Lang::En, layer_type, request).await?;
        let fr = self.assemble_lang(key, Lang::Fr, layer_type, request).await?;

        Ok(AssembledRecord {
            service_type,
            layer_type,
            en,
            fr,
        })
    }

    async fn assemble_lang(
        &self,
        key: &str,
        lang: Lang,
        layer_type: LayerType,
        request: &RawRequest,
    ) -> Result<LangRecord> {
        let fields = request.lang(lang);
        let id = make_id(key, lang);
        let mut record = LangRecord {
            id: id.clone(),
            name: id,
            layer_type,
            url: fields.service_url.clone(),
            metadata_url: None,
            catalogue_url: None,
        };

        let links = self.metadata.resolve(lang, fields).await.map_err(|e| {
            warn!(key = %key, lang = %lang, error = %e, "Metadata could not be retrieved for layer");
            e
        })?;
        if let Some(catalogue_url) = links.catalogue_url.filter(|c| !c.is_empty()) {
            record.metadata_url = links.metadata_url;
            record.catalogue_url = Some(catalogue_url);
        }
        Ok(record)
    }
}
