//! Registration catalog for map and feature layers.
//!
//! A registration request describes one layer in English and French. The
//! service probes the layer's endpoint to classify it, resolves links to its
//! metadata record, and stores the resulting viewer configuration under a
//! short key. Stored requests can later be replayed to refresh that
//! configuration.

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod types;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;
