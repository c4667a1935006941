use crate::app::ports::RequestValidatorPort;
use crate::error::{RegistryError, Result};
use jsonschema::{Draft, JSONSchema, ValidationError};
use once_cell::sync::Lazy;
use serde_json::Value;

const REGISTRATION_SCHEMA_SOURCE: &str = include_str!("../../schemas/registration.v1.json");

static REGISTRATION_SCHEMA: Lazy<std::result::Result<Value, String>> =
    Lazy::new(|| serde_json::from_str(REGISTRATION_SCHEMA_SOURCE).map_err(|e| e.to_string()));

/// Validates registration requests against a draft-07 JSON Schema
pub struct JsonSchemaValidator {
    compiled: JSONSchema,
}

impl JsonSchemaValidator {
    /// Validator for the registration schema embedded in the binary.
    pub fn new() -> Result<Self> {
        let schema = REGISTRATION_SCHEMA
            .as_ref()
            .map_err(|e| RegistryError::Config(format!("embedded registration schema: {e}")))?;
        Self::compile(schema)
    }

    pub fn from_schema(schema: Value) -> Result<Self> {
        // jsonschema 0.17 wants the schema to outlive the compiled validator
        let schema_static: &'static Value = Box::leak(Box::new(schema));
        Self::compile(schema_static)
    }

    fn compile(schema: &'static Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(schema)
            .map_err(|e| RegistryError::Config(format!("Failed to compile JSON Schema: {e}")))?;
        Ok(Self { compiled })
    }
}

fn describe(error: &ValidationError<'_>) -> String {
    let path = error.instance_path.to_string();
    if path.is_empty() {
        error.to_string()
    } else {
        format!("{path}: {error}")
    }
}

impl RequestValidatorPort for JsonSchemaValidator {
    fn validate(&self, request: &Value) -> Vec<String> {
        match self.compiled.validate(request) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|e| describe(&e)).collect(),
        }
    }
}
