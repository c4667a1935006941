use crate::app::ports::HttpClientPort;
use crate::constants::{ESRI_JSON_QUERY, OGC_XML_CONTENT_TYPE};
use crate::metrics;
use crate::types::ServiceType;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Classifies remote map services with live requests.
///
/// Probing fails open: an unreachable endpoint, a timeout or a body that is
/// not ESRI JSON all classify as [`ServiceType::Unknown`] so that registration
/// can still proceed.
pub struct EndpointProber {
    http: Arc<dyn HttpClientPort>,
}

impl EndpointProber {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self { http }
    }

    pub async fn probe(&self, url: &str) -> ServiceType {
        let t0 = Instant::now();
        let service_type = match self.try_probe(url).await {
            Ok(service_type) => service_type,
            Err(e) => {
                debug!(url = %url, error = %e, "Endpoint probe failed, classifying as unknown");
                ServiceType::Unknown
            }
        };
        metrics::probe::classified(service_type, t0.elapsed().as_secs_f64());
        service_type
    }

    async fn try_probe(&self, url: &str) -> Result<ServiceType, String> {
        let resp = self.http.get(url).await?;
        let content_type = resp
            .content_type
            .as_deref()
            .ok_or_else(|| "response has no content-type header".to_string())?;
        // WMTS capabilities are XML too and are not told apart from WMS here
        if content_type == OGC_XML_CONTENT_TYPE {
            return Ok(ServiceType::Wms);
        }

        let json_url = format!("{url}{ESRI_JSON_QUERY}");
        let resp = self.http.get(&json_url).await?;
        let body: Value = serde_json::from_slice(&resp.bytes).map_err(|e| e.to_string())?;
        Ok(classify_esri_json(&body))
    }
}

/// Loose truthiness: `false`, `null`, zero and empty values are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Classify the `?f=json` description of an ESRI REST resource.
pub fn classify_esri_json(body: &Value) -> ServiceType {
    if let Some(layer_type) = body.get("type") {
        return match layer_type.as_str() {
            Some("Feature Layer") => ServiceType::Feature,
            Some("Raster Layer") | Some("Group Layer") => ServiceType::MapServer,
            _ => ServiceType::Unknown,
        };
    }
    if let Some(cached) = body.get("singleFusedMapCache") {
        return if is_truthy(cached) {
            ServiceType::Tile
        } else {
            ServiceType::MapServer
        };
    }
    if body.get("allowGeometryUpdates").is_some() {
        return ServiceType::FeatureServer;
    }
    if body.get("allowedMosaicMethods").is_some() {
        return ServiceType::Image;
    }
    ServiceType::Unknown
}
