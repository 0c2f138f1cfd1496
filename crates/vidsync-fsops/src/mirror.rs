//! Sequential copy of shared videos into the private store.

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use vidsync_core::{PrivateStore, RecordId, SharedStorage, StorageError, VideoRecord};
use vidsync_events::{Event, EventBus};
use vidsync_telemetry::Metrics;

/// Step of a single record's copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorStage {
    /// Opening the shared-storage read stream.
    OpenSource,
    /// Opening the private-store write destination.
    OpenDestination,
    /// Streaming bytes and closing the writer.
    Copy,
    /// Publishing the staged destination.
    Commit,
}

impl MirrorStage {
    /// Stable label used in events, logs and metrics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenSource => "open_source",
            Self::OpenDestination => "open_destination",
            Self::Copy => "copy",
            Self::Commit => "commit",
        }
    }
}

/// A record copied into private storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirroredItem {
    /// Source record identifier.
    pub record_id: RecordId,
    /// Destination name.
    pub name: String,
    /// Bytes written.
    pub bytes: u64,
}

/// A record that could not be copied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorFailure {
    /// Source record identifier.
    pub record_id: RecordId,
    /// Destination name.
    pub name: String,
    /// Step that failed.
    pub stage: MirrorStage,
    /// Rendered failure message.
    pub message: String,
}

/// Per-item results of a mirror run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MirrorReport {
    /// Records copied, in input order.
    pub copied: Vec<MirroredItem>,
    /// Records that failed, in input order.
    pub failures: Vec<MirrorFailure>,
}

impl MirrorReport {
    /// True when no record failed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total bytes written across copied records.
    #[must_use]
    pub fn bytes_copied(&self) -> u64 {
        self.copied.iter().map(|item| item.bytes).sum()
    }
}

/// Copies records from shared storage into the private store, one at a time,
/// publishing progress events and copy metrics.
#[derive(Clone)]
pub struct StorageMirror {
    shared: Arc<dyn SharedStorage>,
    private: Arc<dyn PrivateStore>,
    events: EventBus,
    metrics: Metrics,
}

impl StorageMirror {
    /// Construct a mirror over the given source and destination.
    #[must_use]
    pub fn new(
        shared: Arc<dyn SharedStorage>,
        private: Arc<dyn PrivateStore>,
        events: EventBus,
        metrics: Metrics,
    ) -> Self {
        Self {
            shared,
            private,
            events,
            metrics,
        }
    }

    /// Copy every record in input order.
    ///
    /// A failing record is logged, reported and skipped; the run continues
    /// with the next one. Records sharing a name overwrite each other, so the
    /// later one wins.
    pub async fn mirror(&self, records: &[VideoRecord]) -> MirrorReport {
        self.events.publish(Event::MirrorStarted {
            total: records.len(),
        });

        let mut report = MirrorReport::default();
        for record in records {
            match self.copy_one(record).await {
                Ok(bytes) => {
                    self.metrics.inc_file_copied(bytes);
                    self.events.publish(Event::MirrorItemCopied {
                        record_id: record.id.0,
                        name: record.name.clone(),
                        bytes,
                    });
                    report.copied.push(MirroredItem {
                        record_id: record.id,
                        name: record.name.clone(),
                        bytes,
                    });
                }
                Err((stage, err)) => {
                    warn!(
                        record_id = %record.id,
                        name = %record.name,
                        stage = stage.as_str(),
                        error = %err,
                        error_detail = ?err,
                        "mirror item failed"
                    );
                    self.metrics.inc_copy_failure(stage.as_str());
                    let message = format!("{err}");
                    self.events.publish(Event::MirrorItemFailed {
                        record_id: record.id.0,
                        name: record.name.clone(),
                        stage: stage.as_str().to_string(),
                        message: message.clone(),
                    });
                    report.failures.push(MirrorFailure {
                        record_id: record.id,
                        name: record.name.clone(),
                        stage,
                        message,
                    });
                }
            }
        }

        self.events.publish(Event::MirrorCompleted {
            copied: report.copied.len(),
            failed: report.failures.len(),
        });
        info!(
            copied = report.copied.len(),
            failed = report.failures.len(),
            bytes = report.bytes_copied(),
            "mirror run finished"
        );
        report
    }

    async fn copy_one(&self, record: &VideoRecord) -> Result<u64, (MirrorStage, StorageError)> {
        let mut reader = self
            .shared
            .open_read(&record.location)
            .await
            .map_err(|err| (MirrorStage::OpenSource, err))?;
        let mut writer = self
            .private
            .open_write(&record.name)
            .await
            .map_err(|err| (MirrorStage::OpenDestination, err))?;

        let copied = async {
            let bytes = tokio::io::copy(&mut reader, &mut writer).await?;
            writer.shutdown().await?;
            Ok::<u64, std::io::Error>(bytes)
        }
        .await;
        drop(writer);
        drop(reader);

        let bytes = match copied {
            Ok(bytes) => bytes,
            Err(err) => {
                self.discard(&record.name).await;
                return Err((
                    MirrorStage::Copy,
                    StorageError::io("copy", record.name.as_str(), err),
                ));
            }
        };

        if let Err(err) = self.private.commit(&record.name).await {
            self.discard(&record.name).await;
            return Err((MirrorStage::Commit, err));
        }
        Ok(bytes)
    }

    async fn discard(&self, name: &str) {
        if let Err(err) = self.private.discard(name).await {
            warn!(name, error = %err, "failed to discard staged destination");
        }
    }
}
