use crate::app::assembler::RecordAssembler;
use crate::app::ports::DocumentStorePort;
use crate::constants::INVALID_REFRESH_ARGUMENT;
use crate::error::{RegistryError, Result};
use crate::metrics;
use crate::types::StoredRecord;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Which stored records a refresh should touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    All,
    /// Records last written at least this many days ago
    OlderThanDays(u32),
}

impl AgeFilter {
    /// Latest `updated_at` a record may have to be refreshed.
    ///
    /// A day count reaching past the earliest representable instant clamps to
    /// that instant, so no record qualifies.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            AgeFilter::All => None,
            AgeFilter::OlderThanDays(days) => Some(
                Duration::try_days(i64::from(*days))
                    .and_then(|age| now.checked_sub_signed(age))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
        }
    }
}

impl FromStr for AgeFilter {
    type Err = RegistryError;

    fn from_str(arg: &str) -> Result<Self> {
        if arg == "all" {
            return Ok(AgeFilter::All);
        }
        match arg.parse::<u32>() {
            Ok(days) if days >= 1 => Ok(AgeFilter::OlderThanDays(days)),
            _ => Err(RegistryError::InvalidAgeFilter(INVALID_REFRESH_ARGUMENT.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub updated: Vec<String>,
    pub errors: BTreeMap<String, String>,
}

/// Replays cached registration requests to pick up upstream changes
pub struct RefreshOrchestrator {
    assembler: Arc<RecordAssembler>,
    store: Arc<dyn DocumentStorePort>,
}

impl RefreshOrchestrator {
    pub fn new(assembler: Arc<RecordAssembler>, store: Arc<dyn DocumentStorePort>) -> Self {
        Self { assembler, store }
    }

    /// Rebuild every record matching `filter`, one at a time.
    ///
    /// A failing record is reported under its key and keeps its stored state;
    /// it never stops the remaining records from being refreshed. Only a
    /// failure to enumerate the store fails the batch.
    pub async fn refresh(&self, filter: AgeFilter) -> Result<RefreshSummary> {
        let keys = self.store.list_keys(filter.cutoff(Utc::now())).await?;
        info!(filter = ?filter, records = keys.len(), "Starting refresh");

        let mut summary = RefreshSummary::default();
        for key in keys {
            match self.refresh_record(&key).await {
                Ok(()) => summary.updated.push(key),
                Err(e) => {
                    match &e {
                        RegistryError::StaleRecord | RegistryError::Metadata(_) => {
                            warn!(key = %key, error = %e, "Record not refreshed")
                        }
                        _ => error!(key = %key, error = %e, "Record not refreshed"),
                    }
                    summary.errors.insert(key, e.to_string());
                }
            }
        }

        metrics::refresh::batch_finished(summary.updated.len(), summary.errors.len());
        info!(
            updated = summary.updated.len(),
            errors = summary.errors.len(),
            "Refresh finished"
        );
        Ok(summary)
    }

    async fn refresh_record(&self, key: &str) -> Result<()> {
        // Deleted between listing and now
        let stored = self
            .store
            .get(key)
            .await?
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))?;
        let request = stored.data.request.ok_or(RegistryError::StaleRecord)?;

        let assembled = self.assembler.assemble(key, &request).await?;
        let record = StoredRecord {
            record_type: request.payload_type().unwrap_or(stored.record_type),
            updated_at: Utc::now(),
            data: assembled.into_data(request),
        };
        self.store.put(key, &record).await
    }
}
