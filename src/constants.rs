//! Constants shared by the HTTP surface, the stores and the refresh job

/// Stored `type` for records whose layer is an ESRI feature layer
pub const FEATURE_RECORD_TYPE: &str = "feature";

/// Prefix for per-language layer ids (`rcs.<key>.<lang>`)
pub const RECORD_ID_PREFIX: &str = "rcs";

/// Reported by refresh for records written before requests were cached
pub const REQUEST_NOT_CACHED: &str =
    "previous request was not cached (request caching added in 1.8.0)";

/// Body returned for a request body that is not JSON
pub const UNPARSABLE_JSON: &str = "Unparsable json";

/// Returned for a malformed refresh argument
pub const INVALID_REFRESH_ARGUMENT: &str = "argument should be either 'all' or a positive integer";

/// Largest request body read before the signature check; larger bodies get 413
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Query appended to an endpoint when probing for ESRI JSON metadata
pub const ESRI_JSON_QUERY: &str = "?f=json";

/// The only content type classified as an OGC service
pub const OGC_XML_CONTENT_TYPE: &str = "text/xml";

// Signature headers checked before any registry operation
pub const CLIENT_HEADER: &str = "x-rcs-client";
pub const TIMESTAMP_HEADER: &str = "x-rcs-timestamp";
pub const SIGNATURE_HEADER: &str = "x-rcs-signature";

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_ENV_VAR: &str = "LAYER_REGISTRY_CONFIG";
