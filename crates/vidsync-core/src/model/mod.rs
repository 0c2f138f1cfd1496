//! Core media domain types shared across the workspace.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vidsync_events::DeletionPhase;

/// Identifier assigned to a record by the media index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque reference to the bytes behind a record (a content URI on mobile
/// platforms, a `file://` URL for directory-backed bindings).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Wrap a raw location string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw location string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lightweight descriptor of a video held in shared storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Index-assigned identifier, unique within one enumeration pass.
    pub id: RecordId,
    /// Display name, used verbatim as the destination file name.
    pub name: String,
    /// Size in bytes as reported by the index.
    pub size: u64,
    /// Where the source bytes can be read from.
    pub location: Location,
    /// Directory of the entry relative to its storage volume, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
}

/// Raw row returned by a media index query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    /// Index-assigned identifier.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Directory relative to the storage volume.
    pub relative_path: Option<String>,
}

/// Media collections a query can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Video content.
    Video,
}

/// Sort orders supported by index queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending by display name.
    NameAscending,
}

/// Content filter and sort order passed to the media index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaQuery {
    /// Collection to query.
    pub kind: MediaKind,
    /// Requested ordering.
    pub sort: SortOrder,
}

impl MediaQuery {
    /// All videos ordered by display name.
    #[must_use]
    pub const fn videos_by_name() -> Self {
        Self {
            kind: MediaKind::Video,
            sort: SortOrder::NameAscending,
        }
    }
}

/// Capabilities that must be granted by the user before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read access to shared media.
    ReadSharedMedia,
}

impl Capability {
    /// Stable label used in prompts and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReadSharedMedia => "read_shared_media",
        }
    }
}

/// Per-capability answers returned by a permission prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionGrants(HashMap<Capability, bool>);

impl PermissionGrants {
    /// Record a decision for `capability`.
    pub fn set(&mut self, capability: Capability, granted: bool) {
        self.0.insert(capability, granted);
    }

    /// Builder-style variant of [`Self::set`].
    #[must_use]
    pub fn with(mut self, capability: Capability, granted: bool) -> Self {
        self.set(capability, granted);
        self
    }

    /// Missing capabilities count as denied.
    #[must_use]
    pub fn is_granted(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }
}

/// Handle identifying a deletion that awaits user consent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentToken {
    /// Unique token identifier.
    pub id: Uuid,
    /// Entries covered by the request, for display in the consent prompt.
    pub locations: Vec<Location>,
}

impl ConsentToken {
    /// Issue a fresh token covering `locations`.
    #[must_use]
    pub fn issue(locations: Vec<Location>) -> Self {
        Self {
            id: Uuid::new_v4(),
            locations,
        }
    }
}

/// Final answer from the user-consent step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
    /// The user approved the deletion.
    Confirmed,
    /// The user declined the deletion.
    Denied,
}

/// Immediate answer from the storage service to a deletion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteResponse {
    /// The entries were deleted outright.
    Granted,
    /// The service needs explicit user consent before deleting.
    ConsentRequired(ConsentToken),
}

/// Deletion awaiting the second protocol step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConsent {
    /// Token to hand to the consent flow.
    pub token: ConsentToken,
}

/// Outcome of a deletion protocol step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Entries were deleted.
    Confirmed,
    /// The request needs user consent; call `resolve` next.
    DeferredToUser(PendingConsent),
    /// The user declined.
    Denied,
    /// The request failed.
    Failed {
        /// Rendered failure message.
        message: String,
    },
}

impl DeletionOutcome {
    /// Phase of the deletion state machine this outcome lands in.
    #[must_use]
    pub fn phase(&self) -> DeletionPhase {
        match self {
            Self::Confirmed => DeletionPhase::Confirmed,
            Self::DeferredToUser(_) => DeletionPhase::DeferredToUser,
            Self::Denied => DeletionPhase::Denied,
            Self::Failed { message } => DeletionPhase::Failed {
                message: message.clone(),
            },
        }
    }

    /// Whether the outcome ends the protocol.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::DeferredToUser(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_grants_count_as_denied() {
        let grants = PermissionGrants::default();
        assert!(!grants.is_granted(Capability::ReadSharedMedia));

        let grants = grants.with(Capability::ReadSharedMedia, true);
        assert!(grants.is_granted(Capability::ReadSharedMedia));
    }

    #[test]
    fn outcome_maps_to_phase() {
        let pending = DeletionOutcome::DeferredToUser(PendingConsent {
            token: ConsentToken::issue(vec![Location::new("content://media/1")]),
        });
        assert_eq!(pending.phase(), DeletionPhase::DeferredToUser);
        assert!(!pending.is_terminal());

        let failed = DeletionOutcome::Failed {
            message: "backend".into(),
        };
        assert_eq!(
            failed.phase(),
            DeletionPhase::Failed {
                message: "backend".into()
            }
        );
        assert!(failed.is_terminal());
    }

    #[test]
    fn record_identifiers_render_verbatim() {
        let record = VideoRecord {
            id: RecordId(7),
            name: "clip.mp4".into(),
            size: 12,
            location: Location::new("file:///shared/clip.mp4"),
            relative_path: None,
        };
        let rendered = format!("{record:?}");
        assert!(rendered.contains("clip.mp4"));
        assert_eq!(record.id.to_string(), "7");
        assert_eq!(record.location.to_string(), "file:///shared/clip.mp4");
    }
}
