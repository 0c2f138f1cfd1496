//! Event payloads and the shared state enums they carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to each event emitted by the workflow.
pub type EventId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// Typed domain events surfaced by the synchronization workflow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The read permission for shared media changed.
    PermissionChanged {
        /// Resulting permission state.
        state: PermissionState,
    },
    /// Records were cleared ahead of a fresh enumeration.
    RecordsCleared,
    /// An enumeration pass finished.
    RecordsLoaded {
        /// Number of records returned by the media index.
        count: usize,
    },
    /// The busy flag flipped.
    BusyChanged {
        /// New busy value.
        busy: bool,
    },
    /// A mirror run started.
    MirrorStarted {
        /// Number of records scheduled for copying.
        total: usize,
    },
    /// A single record was copied into private storage.
    MirrorItemCopied {
        /// Identifier of the copied record.
        record_id: u64,
        /// Destination name inside the private store.
        name: String,
        /// Bytes written.
        bytes: u64,
    },
    /// A single record failed to copy.
    MirrorItemFailed {
        /// Identifier of the failing record.
        record_id: u64,
        /// Destination name inside the private store.
        name: String,
        /// Step that failed (`open_source`, `open_destination`, `copy`, `commit`).
        stage: String,
        /// Rendered failure message.
        message: String,
    },
    /// A mirror run finished.
    MirrorCompleted {
        /// Records copied successfully.
        copied: usize,
        /// Records that failed.
        failed: usize,
    },
    /// The deletion state machine moved to a new phase.
    DeletionPhaseChanged {
        /// Phase entered.
        phase: DeletionPhase,
    },
}

impl Event {
    /// Machine-friendly discriminator for log filtering and front-ends.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PermissionChanged { .. } => "permission_changed",
            Self::RecordsCleared => "records_cleared",
            Self::RecordsLoaded { .. } => "records_loaded",
            Self::BusyChanged { .. } => "busy_changed",
            Self::MirrorStarted { .. } => "mirror_started",
            Self::MirrorItemCopied { .. } => "mirror_item_copied",
            Self::MirrorItemFailed { .. } => "mirror_item_failed",
            Self::MirrorCompleted { .. } => "mirror_completed",
            Self::DeletionPhaseChanged { .. } => "deletion_phase_changed",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Sequential identifier.
    pub id: EventId,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
    /// Event payload.
    pub event: Event,
}

/// Whether the workflow may read shared media.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// The permission has not been requested yet.
    #[default]
    Unknown,
    /// The user granted the permission.
    Granted,
    /// The user denied the permission.
    Denied,
}

impl PermissionState {
    /// Returns `true` when enumeration is allowed.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Phases of the deletion protocol.
///
/// `Idle → Requesting → {Confirmed, DeferredToUser → {Confirmed, Denied, Failed}, Failed}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DeletionPhase {
    /// No deletion has been requested.
    #[default]
    Idle,
    /// The storage service is evaluating the request.
    Requesting,
    /// The storage service wants explicit user consent.
    DeferredToUser,
    /// Entries were deleted.
    Confirmed,
    /// The user declined the deletion.
    Denied,
    /// The request failed.
    Failed {
        /// Rendered failure message.
        message: String,
    },
}

impl DeletionPhase {
    /// Terminal phases end a deletion attempt.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Denied | Self::Failed { .. })
    }

    /// Whether moving from `self` to `next` is a legal transition.
    ///
    /// A terminal phase may start a new attempt by moving to `Requesting`.
    #[must_use]
    pub const fn can_advance_to(&self, next: &Self) -> bool {
        match (self, next) {
            (Self::Idle, Self::Requesting) => true,
            (Self::Requesting, Self::Confirmed | Self::DeferredToUser | Self::Failed { .. }) => {
                true
            }
            (Self::DeferredToUser, Self::Confirmed | Self::Denied | Self::Failed { .. }) => true,
            (current, Self::Requesting) => current.is_terminal(),
            _ => false,
        }
    }

    /// Move to `next` when the transition is legal; returns whether it moved.
    pub fn advance(&mut self, next: Self) -> bool {
        if self.can_advance_to(&next) {
            *self = next;
            true
        } else {
            false
        }
    }

    /// Stable label used in logs and metrics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::DeferredToUser => "deferred_to_user",
            Self::Confirmed => "confirmed",
            Self::Denied => "denied",
            Self::Failed { .. } => "failed",
        }
    }
}
