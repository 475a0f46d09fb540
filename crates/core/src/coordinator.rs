use std::sync::Arc;
use std::time::Duration;

use rendezvous_store::CoordinationStore;

use crate::clock::Clock;
use crate::error::CoordinationError;
use crate::outcome::Verdict;
use crate::poller::{PollSettings, VerdictPoller};
use crate::publisher::{validate_identity, Publisher};

/// Identity of one analysis attempt awaiting an external verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    pub run_id: String,
    pub template_name: String,
    /// Optional; empty means the record key is the run id alone.
    pub cluster_id: String,
    /// Optional; for reference only.
    pub namespace: String,
}

impl HandshakeRequest {
    /// Check required inputs without touching any store.
    pub fn validate(&self) -> Result<(), CoordinationError> {
        validate_identity(&self.run_id, &self.template_name)
    }
}

/// Sequences one publish followed by one polling session.
///
/// The publish deadline and the poll deadline are independent: polling
/// always gets its full timeout regardless of how long the publish took.
pub struct Coordinator {
    publisher: Publisher,
    poller: VerdictPoller,
}

impl Coordinator {
    pub fn new(store: Arc<dyn CoordinationStore>) -> Self {
        Coordinator {
            publisher: Publisher::new(store.clone()),
            poller: VerdictPoller::new(store),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.publisher = self.publisher.with_clock(clock);
        self
    }

    pub fn with_publish_deadline(mut self, deadline: Duration) -> Self {
        self.publisher = self.publisher.with_deadline(deadline);
        self
    }

    /// Publish the request, then wait for and classify the verdict.
    pub async fn run(
        &self,
        request: &HandshakeRequest,
        settings: PollSettings,
    ) -> Result<Verdict, CoordinationError> {
        self.publisher
            .publish(
                &request.run_id,
                &request.template_name,
                &request.cluster_id,
                &request.namespace,
            )
            .await?;

        let result = self
            .poller
            .await_verdict(&request.run_id, &request.cluster_id, settings)
            .await?;
        Ok(Verdict::from_result(result))
    }
}
