pub mod http_client;
pub mod in_memory_store;
pub mod metadata_resolver;
pub mod schema_validator;
pub mod signature;
pub mod sqlite_store;
