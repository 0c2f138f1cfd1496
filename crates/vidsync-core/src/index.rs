//! Enumeration of video records from the platform media index.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::IndexError;
use crate::model::{MediaQuery, VideoRecord};
use crate::service::MediaIndex;

/// Reads video descriptors from a [`MediaIndex`].
#[derive(Clone)]
pub struct MediaIndexReader {
    index: Arc<dyn MediaIndex>,
}

impl MediaIndexReader {
    /// Construct a reader over `index`.
    #[must_use]
    pub fn new(index: Arc<dyn MediaIndex>) -> Self {
        Self { index }
    }

    /// List every video in the index, sorted by name ascending.
    ///
    /// An empty or inaccessible index yields an empty list. Rows repeating an
    /// identifier already seen in this pass are dropped.
    pub async fn enumerate(&self) -> Vec<VideoRecord> {
        let rows = match self.index.query(&MediaQuery::videos_by_name()).await {
            Ok(rows) => rows,
            Err(err) => {
                log_index_failure(&err);
                return Vec::new();
            }
        };

        let mut seen = HashSet::with_capacity(rows.len());
        let mut records: Vec<VideoRecord> = rows
            .into_iter()
            .filter(|row| {
                let fresh = seen.insert(row.id);
                if !fresh {
                    warn!(record_id = %row.id, name = %row.name, "duplicate media index row dropped");
                }
                fresh
            })
            .map(|row| VideoRecord {
                location: self.index.location_for(row.id),
                id: row.id,
                name: row.name,
                size: row.size,
                relative_path: row.relative_path,
            })
            .collect();

        records.sort_by(|left, right| left.name.cmp(&right.name));
        debug!(count = records.len(), "media index enumerated");
        records
    }
}

fn log_index_failure(err: &IndexError) {
    match err {
        IndexError::AccessDenied { collection } => {
            warn!(collection, "media index access denied; treating as empty");
        }
        IndexError::Unavailable { collection, detail } => {
            warn!(collection, detail = %detail, "media index unavailable; treating as empty");
        }
        IndexError::Io { operation, source } => {
            warn!(operation, error = %source, "media index io failure; treating as empty");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexResult;
    use crate::model::{IndexRow, Location, RecordId};
    use async_trait::async_trait;

    enum Fixture {
        Rows(Vec<IndexRow>),
        Denied,
        Unavailable,
    }

    struct FixtureIndex(Fixture);

    #[async_trait]
    impl MediaIndex for FixtureIndex {
        async fn query(&self, _query: &MediaQuery) -> IndexResult<Vec<IndexRow>> {
            match &self.0 {
                Fixture::Rows(rows) => Ok(rows.clone()),
                Fixture::Denied => Err(IndexError::AccessDenied { collection: "video" }),
                Fixture::Unavailable => Err(IndexError::Unavailable {
                    collection: "video",
                    detail: "provider crashed".into(),
                }),
            }
        }

        fn location_for(&self, id: RecordId) -> Location {
            Location::new(format!("content://media/external/video/media/{id}"))
        }
    }

    fn row(id: u64, name: &str) -> IndexRow {
        IndexRow {
            id: RecordId(id),
            name: name.to_string(),
            size: id * 10,
            relative_path: Some("Movies/".into()),
        }
    }

    fn reader(fixture: Fixture) -> MediaIndexReader {
        MediaIndexReader::new(Arc::new(FixtureIndex(fixture)))
    }

    #[tokio::test]
    async fn enumerate_returns_every_row_sorted_by_name() {
        let records = reader(Fixture::Rows(vec![
            row(3, "zebra.mp4"),
            row(1, "alpha.mkv"),
            row(2, "middle.webm"),
        ]))
        .enumerate()
        .await;

        let names: Vec<_> = records.iter().map(|record| record.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.mkv", "middle.webm", "zebra.mp4"]);
        assert_eq!(
            records[0].location,
            Location::new("content://media/external/video/media/1")
        );
        assert_eq!(records[0].size, 10);
        assert_eq!(records[0].relative_path.as_deref(), Some("Movies/"));
    }

    #[tokio::test]
    async fn enumerate_keeps_equal_names_in_index_order() {
        let records = reader(Fixture::Rows(vec![row(5, "same.mp4"), row(4, "same.mp4")]))
            .enumerate()
            .await;
        let ids: Vec<_> = records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![RecordId(5), RecordId(4)]);
    }

    #[tokio::test]
    async fn enumerate_drops_duplicate_identifiers() {
        let records = reader(Fixture::Rows(vec![row(1, "a.mp4"), row(1, "b.mp4")]))
            .enumerate()
            .await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "a.mp4");
    }

    #[tokio::test]
    async fn empty_or_inaccessible_index_yields_nothing() {
        assert!(reader(Fixture::Rows(Vec::new())).enumerate().await.is_empty());
        assert!(reader(Fixture::Denied).enumerate().await.is_empty());
        assert!(reader(Fixture::Unavailable).enumerate().await.is_empty());
    }
}
