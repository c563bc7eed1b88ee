//! Session-scoped studio context.
//!
//! A [`StudioSession`] owns the client, the last result and at most one
//! active [`PollState`]. Starting a new operation discards whatever the
//! previous one left pending; jobs already submitted keep running
//! server-side.

use crate::client::StudioClient;
use crate::error::Result;
use crate::normalize::CanonicalResult;
use crate::operations::OperationRequest;
use crate::poll::{PollState, Poller, UrlProber};
use std::sync::Arc;

/// One user's studio session.
pub struct StudioSession {
    client: StudioClient,
    prober: Arc<dyn UrlProber>,
    poller: Poller,
    last_result: Option<CanonicalResult>,
    poll: Option<PollState>,
}

impl std::fmt::Debug for StudioSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioSession")
            .field("client", &self.client)
            .field("poller", &self.poller)
            .field("last_result", &self.last_result)
            .field("poll", &self.poll)
            .finish()
    }
}

impl StudioSession {
    /// Creates a session probing result URLs through `client`.
    pub fn new(client: StudioClient) -> Self {
        let prober: Arc<dyn UrlProber> = Arc::new(client.clone());
        Self {
            client,
            prober,
            poller: Poller::default(),
            last_result: None,
            poll: None,
        }
    }

    /// Replaces the poll budget.
    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    /// Replaces the URL prober.
    pub fn with_prober(mut self, prober: Arc<dyn UrlProber>) -> Self {
        self.prober = prober;
        self
    }

    /// The underlying client.
    pub fn client(&self) -> &StudioClient {
        &self.client
    }

    /// Result of the most recent operation, updated as polling resolves URLs.
    pub fn last_result(&self) -> Option<&CanonicalResult> {
        self.last_result.as_ref()
    }

    /// Active poll session, if anything is still pending.
    pub fn poll_state(&self) -> Option<&PollState> {
        self.poll.as_ref()
    }

    /// All URLs of the current result that are ready.
    pub fn ready_urls(&self) -> &[String] {
        self.last_result
            .as_ref()
            .map(|r| r.ready_urls.as_slice())
            .unwrap_or_default()
    }

    /// URLs of the current result still being awaited.
    pub fn pending_urls(&self) -> &[String] {
        self.poll.as_ref().map(PollState::pending).unwrap_or_default()
    }

    /// Drops the current result and any pending poll state.
    pub fn reset(&mut self) {
        if let Some(poll) = self.poll.take() {
            tracing::debug!(
                pending = poll.pending().len(),
                "discarding previous poll session"
            );
        }
        self.last_result = None;
    }

    /// Submits an operation and runs the automatic poll rounds if needed.
    pub async fn execute(&mut self, request: &OperationRequest) -> Result<&CanonicalResult> {
        self.reset();
        tracing::info!(operation = %request.kind(), "executing operation");
        let result = self.client.run(request).await?;
        Ok(self.absorb(result).await)
    }

    /// Adopts a result as the session's current one and polls its pending URLs.
    pub async fn absorb(&mut self, result: CanonicalResult) -> &CanonicalResult {
        self.reset();

        let mut state = if result.has_pending() {
            Some(self.poller.start(result.pending_urls.iter().cloned()))
        } else {
            None
        };

        let current = self.last_result.insert(result);
        if let Some(state) = state.as_mut() {
            let ready = self.poller.run(state, self.prober.as_ref()).await;
            current.ready_urls.extend(ready);
            current.pending_urls = state.pending().to_vec();
        }

        self.poll = state.filter(|s| !s.is_complete());
        current
    }

    /// Re-probes pending URLs once. Returns the URLs that became ready.
    ///
    /// Manual rechecks are unbounded and never consume automatic attempts.
    pub async fn recheck(&mut self) -> Vec<String> {
        let Some(state) = self.poll.as_mut() else {
            return Vec::new();
        };

        let ready = self.poller.probe_round(state, self.prober.as_ref()).await;
        if let Some(current) = self.last_result.as_mut() {
            current.ready_urls.extend(ready.iter().cloned());
            current.pending_urls = state.pending().to_vec();
        }

        if state.is_complete() {
            tracing::info!("all pending results ready");
            self.poll = None;
        }
        ready
    }

    /// Enhances a prompt, returning the original on failure.
    pub async fn enhance_prompt(&self, prompt: &str) -> String {
        self.client.enhance_prompt(prompt).await
    }
}
