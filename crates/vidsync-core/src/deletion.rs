//! Two-step deletion protocol: `request → maybe defer → resolve`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ConsentError;
use crate::model::{
    ConsentDecision, DeleteResponse, DeletionOutcome, Location, PendingConsent, VideoRecord,
};
use crate::service::{ConsentFlow, DeletionService};

/// Drives shared-storage deletions through the platform service and, when the
/// platform asks for it, the user-consent step.
#[derive(Clone)]
pub struct DeletionRequester {
    service: Arc<dyn DeletionService>,
    consent: Arc<dyn ConsentFlow>,
}

impl DeletionRequester {
    /// Construct a requester over a deletion service and consent flow.
    #[must_use]
    pub fn new(service: Arc<dyn DeletionService>, consent: Arc<dyn ConsentFlow>) -> Self {
        Self { service, consent }
    }

    /// First protocol step: ask the service to delete every record's entry.
    ///
    /// Returns `Confirmed` when the service deleted outright,
    /// `DeferredToUser` when consent is needed, or `Failed` on any fault. An
    /// empty list is confirmed without contacting the service.
    pub async fn request(&self, records: &[VideoRecord]) -> DeletionOutcome {
        if records.is_empty() {
            return DeletionOutcome::Confirmed;
        }

        let locations: Vec<Location> = records
            .iter()
            .map(|record| record.location.clone())
            .collect();

        match self.service.request_delete(&locations).await {
            Ok(DeleteResponse::Granted) => {
                info!(count = locations.len(), "shared entries deleted");
                DeletionOutcome::Confirmed
            }
            Ok(DeleteResponse::ConsentRequired(token)) => {
                info!(token = %token.id, count = locations.len(), "deletion deferred to user");
                DeletionOutcome::DeferredToUser(PendingConsent { token })
            }
            Err(err) => {
                warn!(error = %err, error_detail = ?err, "deletion request failed");
                DeletionOutcome::Failed {
                    message: format!("{err}"),
                }
            }
        }
    }

    /// Second protocol step: present the consent flow and report its answer.
    ///
    /// A dismissed prompt counts as a denial. The token is finalized on every
    /// path, including consent failures.
    pub async fn resolve(&self, pending: PendingConsent) -> DeletionOutcome {
        let token = pending.token;
        let decision = match self.consent.resolve(&token).await {
            Ok(decision) => decision,
            Err(ConsentError::Dismissed) => {
                info!(token = %token.id, "consent prompt dismissed; treating as denied");
                ConsentDecision::Denied
            }
            Err(err) => {
                warn!(token = %token.id, error = %err, "consent flow failed");
                if let Err(release) = self.service.finalize(&token, ConsentDecision::Denied).await
                {
                    warn!(token = %token.id, error = %release, "failed to release consent token");
                }
                return DeletionOutcome::Failed {
                    message: format!("{err}"),
                };
            }
        };

        if let Err(err) = self.service.finalize(&token, decision).await {
            warn!(token = %token.id, error = %err, error_detail = ?err, "deletion finalize failed");
            return DeletionOutcome::Failed {
                message: format!("{err}"),
            };
        }

        match decision {
            ConsentDecision::Confirmed => {
                info!(token = %token.id, "user confirmed deletion");
                DeletionOutcome::Confirmed
            }
            ConsentDecision::Denied => {
                info!(token = %token.id, "user denied deletion");
                DeletionOutcome::Denied
            }
        }
    }

    /// Run both protocol steps and return the terminal outcome.
    pub async fn request_and_resolve(&self, records: &[VideoRecord]) -> DeletionOutcome {
        match self.request(records).await {
            DeletionOutcome::DeferredToUser(pending) => self.resolve(pending).await,
            terminal => terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConsentResult, DeletionError, DeletionResult};
    use crate::model::{ConsentToken, RecordId};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingService {
        owned: bool,
        fail: bool,
        finalized: Mutex<Vec<ConsentDecision>>,
        requests: Mutex<usize>,
    }

    #[async_trait]
    impl DeletionService for RecordingService {
        async fn request_delete(&self, locations: &[Location]) -> DeletionResult<DeleteResponse> {
            *self.requests.lock().expect("requests lock") += 1;
            if self.fail {
                return Err(DeletionError::Rejected {
                    reason: "read_only_volume",
                    location: None,
                });
            }
            if self.owned {
                Ok(DeleteResponse::Granted)
            } else {
                Ok(DeleteResponse::ConsentRequired(ConsentToken::issue(
                    locations.to_vec(),
                )))
            }
        }

        async fn finalize(
            &self,
            _token: &ConsentToken,
            decision: ConsentDecision,
        ) -> DeletionResult<()> {
            self.finalized.lock().expect("finalized lock").push(decision);
            Ok(())
        }
    }

    struct FixedConsent(Option<ConsentDecision>);

    #[async_trait]
    impl ConsentFlow for FixedConsent {
        async fn resolve(&self, _token: &ConsentToken) -> ConsentResult<ConsentDecision> {
            self.0.ok_or(ConsentError::Dismissed)
        }
    }

    fn record(id: u64) -> VideoRecord {
        VideoRecord {
            id: RecordId(id),
            name: format!("clip-{id}.mp4"),
            size: 1,
            location: Location::new(format!("content://media/{id}")),
            relative_path: None,
        }
    }

    fn requester(
        service: Arc<RecordingService>,
        consent: Option<ConsentDecision>,
    ) -> DeletionRequester {
        DeletionRequester::new(service, Arc::new(FixedConsent(consent)))
    }

    #[tokio::test]
    async fn owned_entries_confirm_without_consent() {
        let service = Arc::new(RecordingService {
            owned: true,
            ..RecordingService::default()
        });
        let outcome = requester(service.clone(), None)
            .request_and_resolve(&[record(1), record(2)])
            .await;
        assert_eq!(outcome, DeletionOutcome::Confirmed);
        assert!(service.finalized.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn foreign_entries_defer_then_follow_user_decision() {
        let service = Arc::new(RecordingService::default());
        let requester = requester(service.clone(), Some(ConsentDecision::Denied));

        let first = requester.request(&[record(1)]).await;
        let DeletionOutcome::DeferredToUser(pending) = first else {
            panic!("expected deferral, got {first:?}");
        };
        assert_eq!(
            pending.token.locations,
            vec![Location::new("content://media/1")]
        );

        assert_eq!(requester.resolve(pending).await, DeletionOutcome::Denied);
        assert_eq!(
            *service.finalized.lock().expect("lock"),
            vec![ConsentDecision::Denied]
        );
    }

    #[tokio::test]
    async fn service_faults_surface_as_failed() {
        let service = Arc::new(RecordingService {
            fail: true,
            ..RecordingService::default()
        });
        let outcome = requester(service, None).request(&[record(1)]).await;
        assert_eq!(
            outcome,
            DeletionOutcome::Failed {
                message: "deletion rejected".into()
            }
        );
    }

    #[tokio::test]
    async fn dismissed_consent_is_denied_and_finalized() {
        let service = Arc::new(RecordingService::default());
        let outcome = requester(service.clone(), None)
            .request_and_resolve(&[record(1)])
            .await;
        assert_eq!(outcome, DeletionOutcome::Denied);
        assert_eq!(
            *service.finalized.lock().expect("lock"),
            vec![ConsentDecision::Denied]
        );
    }

    struct BrokenConsent;

    #[async_trait]
    impl ConsentFlow for BrokenConsent {
        async fn resolve(&self, _token: &ConsentToken) -> ConsentResult<ConsentDecision> {
            Err(ConsentError::Io {
                source: std::io::Error::other("terminal closed"),
            })
        }
    }

    #[tokio::test]
    async fn consent_io_failure_releases_the_token() {
        let service = Arc::new(RecordingService::default());
        let outcome = DeletionRequester::new(service.clone(), Arc::new(BrokenConsent))
            .request_and_resolve(&[record(1)])
            .await;
        assert_eq!(
            outcome,
            DeletionOutcome::Failed {
                message: "consent prompt io failure".into()
            }
        );
        assert_eq!(
            *service.finalized.lock().expect("lock"),
            vec![ConsentDecision::Denied]
        );
    }

    #[tokio::test]
    async fn empty_request_skips_the_service() {
        let service = Arc::new(RecordingService::default());
        let outcome = requester(service.clone(), None).request(&[]).await;
        assert_eq!(outcome, DeletionOutcome::Confirmed);
        assert_eq!(*service.requests.lock().expect("lock"), 0);
    }
}
