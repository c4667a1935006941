//! Prometheus metrics for the registry
//!
//! Metric names live in [`MetricName`] so that recording sites never spell
//! out raw strings. Recording is a no-op until [`init_metrics`] installs the
//! exporter, which keeps tests and the CLI free of any setup.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ProbeClassifications,
    ProbeDuration,
    RegistrationsSuccess,
    RegistrationsError,
    UpdatesSuccess,
    UpdatesError,
    DeletesSuccess,
    DeletesNotFound,
    RefreshRecordsUpdated,
    RefreshRecordsFailed,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ProbeClassifications => "rcs_probe_classifications_total",
            MetricName::ProbeDuration => "rcs_probe_duration_seconds",
            MetricName::RegistrationsSuccess => "rcs_registrations_success_total",
            MetricName::RegistrationsError => "rcs_registrations_error_total",
            MetricName::UpdatesSuccess => "rcs_updates_success_total",
            MetricName::UpdatesError => "rcs_updates_error_total",
            MetricName::DeletesSuccess => "rcs_deletes_success_total",
            MetricName::DeletesNotFound => "rcs_deletes_not_found_total",
            MetricName::RefreshRecordsUpdated => "rcs_refresh_records_updated_total",
            MetricName::RefreshRecordsFailed => "rcs_refresh_records_failed_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Install the Prometheus exporter on `listen`.
pub fn init_metrics(listen: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(listen);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", listen),
        Err(e) => warn!("Prometheus exporter install failed (possibly already installed): {}", e),
    }
}

pub mod probe {
    use super::MetricName;
    use crate::types::ServiceType;

    pub fn classified(service_type: ServiceType, duration_secs: f64) {
        ::metrics::counter!(
            MetricName::ProbeClassifications.as_str(),
            "service_type" => service_type.as_str()
        )
        .increment(1);
        ::metrics::histogram!(MetricName::ProbeDuration.as_str()).record(duration_secs);
    }
}

pub mod registration {
    use super::MetricName;

    pub fn created() {
        ::metrics::counter!(MetricName::RegistrationsSuccess.as_str()).increment(1);
    }

    pub fn rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::RegistrationsError.as_str(), "reason" => reason)
            .increment(1);
    }

    pub fn updated() {
        ::metrics::counter!(MetricName::UpdatesSuccess.as_str()).increment(1);
    }

    pub fn update_rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::UpdatesError.as_str(), "reason" => reason).increment(1);
    }

    pub fn deleted() {
        ::metrics::counter!(MetricName::DeletesSuccess.as_str()).increment(1);
    }

    pub fn delete_not_found() {
        ::metrics::counter!(MetricName::DeletesNotFound.as_str()).increment(1);
    }
}

pub mod refresh {
    use super::MetricName;

    pub fn batch_finished(updated: usize, failed: usize) {
        ::metrics::counter!(MetricName::RefreshRecordsUpdated.as_str()).increment(updated as u64);
        ::metrics::counter!(MetricName::RefreshRecordsFailed.as_str()).increment(failed as u64);
    }
}

/// Short label for an error, used as a metric dimension.
pub fn error_reason(err: &crate::error::RegistryError) -> &'static str {
    use crate::error::RegistryError;
    match err {
        RegistryError::Validation(_) => "validation",
        RegistryError::Metadata(_) => "metadata",
        RegistryError::NotFound(_) => "not_found",
        RegistryError::TypeMismatch(_) => "type_mismatch",
        RegistryError::StaleRecord => "stale_record",
        RegistryError::InvalidAgeFilter(_) => "invalid_age_filter",
        RegistryError::Storage { .. } => "storage",
        _ => "internal",
    }
}
