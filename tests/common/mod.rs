#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use layer_registry::app::ports::{
    AuthenticatorPort, DocumentStorePort, HttpClientPort, HttpGetResult,
};
use layer_registry::config::MetadataConfig;
use layer_registry::infra::in_memory_store::InMemoryDocumentStore;
use layer_registry::infra::metadata_resolver::CatalogueMetadataResolver;
use layer_registry::infra::schema_validator::JsonSchemaValidator;
use layer_registry::infra::signature::OpenAuthenticator;
use layer_registry::server::AppState;
use layer_registry::types::{
    LangRecord, LayerType, RecordData, RecordType, StoredRecord,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const UUID: &str = "5d2b1f7e-8f1a-4c0e-9b3a-0c6f2d9e4a11";

/// Canned HTTP responses keyed by URL; anything else is unreachable
#[derive(Default)]
pub struct StubHttp {
    responses: Mutex<HashMap<String, Result<HttpGetResult, String>>>,
    calls: Mutex<Vec<String>>,
}

impl StubHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, content_type: &str, body: &str) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            Ok(HttpGetResult {
                status,
                bytes: body.as_bytes().to_vec(),
                content_type: Some(content_type.to_string()),
            }),
        );
    }

    /// An ESRI REST endpoint whose `?f=json` description is `description`.
    pub fn esri_service(&self, url: &str, description: Value) {
        self.respond(url, 200, "text/html; charset=utf-8", "<html>ArcGIS</html>");
        self.respond(
            &format!("{url}?f=json"),
            200,
            "application/json",
            &description.to_string(),
        );
    }

    pub fn ogc_service(&self, url: &str) {
        self.respond(url, 200, "text/xml", "<WMS_Capabilities/>");
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClientPort for StubHttp {
    async fn get(&self, url: &str) -> Result<HttpGetResult, String> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(format!("error sending request for url ({url})")))
    }
}

pub fn metadata_settings() -> MetadataConfig {
    MetadataConfig {
        url_template: Some("http://csw.example.com/csw?id={uuid}".to_string()),
        catalogue_template: Some("http://open.example.com/data/{lang}/dataset/{uuid}".to_string()),
    }
}

pub struct Harness {
    pub http: Arc<StubHttp>,
    pub store: Arc<InMemoryDocumentStore>,
    pub state: AppState,
}

pub fn harness() -> Harness {
    harness_with_auth(Arc::new(OpenAuthenticator))
}

pub fn harness_with_auth(auth: Arc<dyn AuthenticatorPort>) -> Harness {
    let http = StubHttp::new();
    let store = Arc::new(InMemoryDocumentStore::new());
    let state = AppState::new(
        http.clone(),
        store.clone(),
        Arc::new(JsonSchemaValidator::new().unwrap()),
        Arc::new(CatalogueMetadataResolver::new(http.clone(), metadata_settings())),
        auth,
    );
    Harness { http, store, state }
}

/// A record as written before requests were cached alongside the config.
pub fn legacy_record(key: &str, updated_at: DateTime<Utc>) -> StoredRecord {
    let lang_record = |lang: &str| LangRecord {
        id: format!("rcs.{key}.{lang}"),
        name: format!("rcs.{key}.{lang}"),
        layer_type: LayerType::Dynamic,
        url: "http://legacy.example.com/arcgis/rest/services/Old/MapServer".to_string(),
        metadata_url: None,
        catalogue_url: None,
    };
    StoredRecord {
        record_type: RecordType::Layer(LayerType::Dynamic),
        updated_at,
        data: RecordData {
            request: None,
            en: lang_record("en"),
            fr: lang_record("fr"),
        },
    }
}

pub async fn stored_json(store: &InMemoryDocumentStore, key: &str) -> String {
    let record = store.get(key).await.unwrap().expect("record should exist");
    serde_json::to_string(&record).unwrap()
}
