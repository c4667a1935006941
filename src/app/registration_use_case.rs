use crate::app::assembler::RecordAssembler;
use crate::app::ports::{DocumentStorePort, RequestValidatorPort};
use crate::error::{RegistryError, Result};
use crate::metrics::{self, error_reason};
use crate::types::{Lang, RawRequest, StoredRecord};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Field changes for an existing registration, split per language
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateFragment {
    pub en: Map<String, Value>,
    pub fr: Map<String, Value>,
}

impl UpdateFragment {
    /// An object holding exactly `en` and `fr` objects is taken per language;
    /// any other object is applied to both languages as is.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let Value::Object(obj) = payload else {
            return Err(RegistryError::Validation(vec![
                "update payload must be a JSON object".to_string(),
            ]));
        };
        if obj.len() == 2 {
            if let (Some(Value::Object(en)), Some(Value::Object(fr))) = (obj.get("en"), obj.get("fr")) {
                return Ok(Self {
                    en: en.clone(),
                    fr: fr.clone(),
                });
            }
        }
        Ok(Self {
            en: obj.clone(),
            fr: obj.clone(),
        })
    }

    fn lang(&self, lang: Lang) -> &Map<String, Value> {
        match lang {
            Lang::En => &self.en,
            Lang::Fr => &self.fr,
        }
    }

    /// Shallow-merge into a copy of `request`; untouched fields are kept.
    pub fn merged_into(&self, request: &RawRequest) -> Result<Value> {
        let mut merged = serde_json::to_value(request)?;
        for lang in Lang::ALL {
            if let Some(Value::Object(fields)) = merged.get_mut(lang.as_str()) {
                for (name, value) in self.lang(lang) {
                    fields.insert(name.clone(), value.clone());
                }
            }
        }
        Ok(merged)
    }
}

/// Create, update and delete operations over registered layers
pub struct RegistrationService {
    validator: Arc<dyn RequestValidatorPort>,
    assembler: Arc<RecordAssembler>,
    store: Arc<dyn DocumentStorePort>,
}

impl RegistrationService {
    pub fn new(
        validator: Arc<dyn RequestValidatorPort>,
        assembler: Arc<RecordAssembler>,
        store: Arc<dyn DocumentStorePort>,
    ) -> Self {
        Self {
            validator,
            assembler,
            store,
        }
    }

    /// Validate and register `body` under `key`, replacing any existing record.
    pub async fn create(&self, key: &str, body: &Value) -> Result<String> {
        let result = self.try_create(key, body).await;
        match &result {
            Ok(_) => metrics::registration::created(),
            Err(e) => metrics::registration::rejected(error_reason(e)),
        }
        result
    }

    async fn try_create(&self, key: &str, body: &Value) -> Result<String> {
        let request = self.parse_request(body)?;
        let assembled = self.assembler.assemble(key, &request).await?;
        debug!(key = %key, record = ?assembled, "Assembled layer config");

        let record = StoredRecord {
            record_type: assembled.record_type(),
            updated_at: Utc::now(),
            data: assembled.into_data(request),
        };
        self.store.put(key, &record).await?;
        info!(key = %key, record_type = %record.record_type, "Added a smallkey");
        Ok(key.to_string())
    }

    /// Apply `payload` to a registered feature layer and rebuild its config.
    ///
    /// The stored record is only written once the merged request validates
    /// and assembles; any failure leaves it untouched.
    pub async fn update(&self, key: &str, payload: &Value) -> Result<String> {
        let result = self.try_update(key, payload).await;
        match &result {
            Ok(_) => metrics::registration::updated(),
            Err(e) => metrics::registration::update_rejected(error_reason(e)),
        }
        result
    }

    async fn try_update(&self, key: &str, payload: &Value) -> Result<String> {
        let fragment = UpdateFragment::from_payload(payload)?;

        let stored = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        if !stored.record_type.is_feature() {
            return Err(RegistryError::TypeMismatch(key.to_string()));
        }
        let cached = stored.data.request.ok_or(RegistryError::StaleRecord)?;

        let merged = fragment.merged_into(&cached)?;
        let request = self.parse_request(&merged)?;
        let assembled = self.assembler.assemble(key, &request).await?;

        // A probe that fails open must not demote the record out of `feature`
        let record = StoredRecord {
            record_type: request.payload_type().unwrap_or(stored.record_type),
            updated_at: Utc::now(),
            data: assembled.into_data(request),
        };
        self.store.put(key, &record).await?;
        info!(key = %key, "Updated feature layer");
        Ok(key.to_string())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        if self.store.delete(key).await? {
            metrics::registration::deleted();
            info!(key = %key, "Removed a smallkey");
            Ok(())
        } else {
            metrics::registration::delete_not_found();
            info!(key = %key, "Smallkey was not found");
            Err(RegistryError::NotFound(key.to_string()))
        }
    }

    fn parse_request(&self, body: &Value) -> Result<RawRequest> {
        let errors = self.validator.validate(body);
        if !errors.is_empty() {
            info!(errors = ?errors, "Request failed schema validation");
            return Err(RegistryError::Validation(errors));
        }
        serde_json::from_value(body.clone()).map_err(|e| RegistryError::Validation(vec![e.to_string()]))
    }
}
