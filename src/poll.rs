//! Completion polling for asynchronous submissions.
//!
//! The service has no push channel; a pending URL becomes ready once a
//! lightweight probe against it succeeds. The [`Poller`] runs a bounded
//! number of automatic rounds and stops at the first round that resolves
//! anything, so partial results surface immediately. Whatever is still
//! pending stays in [`PollState`] for user-triggered rechecks.

use async_trait::async_trait;
use futures::future::join_all;
use std::time::Duration;

/// Automatic probe rounds per poll session.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;
/// Pause before each automatic round.
pub const DEFAULT_ROUND_INTERVAL: Duration = Duration::from_secs(2);

/// Checks whether a result URL has content yet.
///
/// Implementations must not fail: any error means "not ready".
#[async_trait]
pub trait UrlProber: Send + Sync {
    /// Returns true if the URL is ready.
    async fn is_ready(&self, url: &str) -> bool;
}

/// URLs still awaited in one poll session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pending: Vec<String>,
    attempts_remaining: u32,
}

impl PollState {
    /// Creates a state tracking `urls`, deduplicated in first-seen order.
    pub fn new(urls: impl IntoIterator<Item = String>, attempts: u32) -> Self {
        let mut pending: Vec<String> = Vec::new();
        for url in urls {
            if !pending.contains(&url) {
                pending.push(url);
            }
        }
        Self {
            pending,
            attempts_remaining: attempts,
        }
    }

    /// URLs not yet ready.
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Automatic rounds left.
    pub fn attempts_remaining(&self) -> u32 {
        self.attempts_remaining
    }

    /// Returns true once nothing is pending.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns true if automatic polling should continue.
    pub fn can_auto_poll(&self) -> bool {
        !self.is_complete() && self.attempts_remaining > 0
    }
}

/// Drives probe rounds over a [`PollState`].
#[derive(Debug, Clone)]
pub struct Poller {
    max_rounds: u32,
    interval: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            interval: DEFAULT_ROUND_INTERVAL,
        }
    }
}

impl Poller {
    /// Creates a poller with the default budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of automatic rounds.
    pub fn max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = rounds;
        self
    }

    /// Sets the pause before each automatic round.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts a session for the given pending URLs.
    pub fn start(&self, urls: impl IntoIterator<Item = String>) -> PollState {
        PollState::new(urls, self.max_rounds)
    }

    /// Probes every pending URL once and moves ready ones out of `state`.
    ///
    /// Does not consume an automatic attempt; this is the manual recheck.
    pub async fn probe_round(&self, state: &mut PollState, prober: &dyn UrlProber) -> Vec<String> {
        if state.pending.is_empty() {
            return Vec::new();
        }

        let checks = state.pending.iter().map(|url| prober.is_ready(url));
        let outcomes = join_all(checks).await;

        let mut ready = Vec::new();
        let mut still_pending = Vec::new();
        for (url, is_ready) in state.pending.drain(..).zip(outcomes) {
            if is_ready {
                ready.push(url);
            } else {
                still_pending.push(url);
            }
        }
        state.pending = still_pending;

        tracing::debug!(
            ready = ready.len(),
            pending = state.pending.len(),
            "probe round finished"
        );
        ready
    }

    /// Runs automatic rounds until something is ready or attempts run out.
    ///
    /// Returns the URLs resolved in the first productive round, or nothing.
    /// Never fails; unresolved URLs stay in `state`.
    pub async fn run(&self, state: &mut PollState, prober: &dyn UrlProber) -> Vec<String> {
        let mut round = 0u32;
        while state.can_auto_poll() {
            if !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }

            round += 1;
            tracing::debug!(round, pending = state.pending.len(), "automatic probe round");
            let ready = self.probe_round(state, prober).await;
            state.attempts_remaining -= 1;

            if !ready.is_empty() {
                tracing::info!(
                    round,
                    ready = ready.len(),
                    pending = state.pending.len(),
                    attempts_remaining = state.attempts_remaining,
                    "results ready"
                );
                return ready;
            }
        }

        if !state.is_complete() {
            tracing::info!(
                pending = state.pending.len(),
                "automatic polling exhausted, results still pending"
            );
        }
        Vec::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted prober: each URL becomes ready on a given probe number.
    #[derive(Default)]
    pub(crate) struct ScriptedProber {
        ready_on: HashMap<String, usize>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl ScriptedProber {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn ready_on(mut self, url: &str, probe: usize) -> Self {
            self.ready_on.insert(url.to_string(), probe);
            self
        }

        pub(crate) fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl UrlProber for ScriptedProber {
        async fn is_ready(&self, url: &str) -> bool {
            let mut calls = self.calls.lock().unwrap();
            let n = calls.entry(url.to_string()).or_insert(0);
            *n += 1;
            self.ready_on.get(url).is_some_and(|on| *n >= *on)
        }
    }

    fn fast_poller() -> Poller {
        Poller::new().interval(Duration::ZERO)
    }

    fn urls(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_first_round_partial_result() {
        let poller = fast_poller();
        let prober = ScriptedProber::new().ready_on("b", 1);
        let mut state = poller.start(urls(&["a", "b", "c"]));

        let ready = poller.run(&mut state, &prober).await;

        assert_eq!(ready, vec!["b"]);
        assert_eq!(state.pending(), ["a", "c"]);
        assert_eq!(state.attempts_remaining(), DEFAULT_MAX_ROUNDS - 1);
        // Stopped after the productive round.
        assert_eq!(prober.calls("a"), 1);
    }

    #[tokio::test]
    async fn test_exhausted_rounds_keep_everything() {
        let poller = fast_poller();
        let prober = ScriptedProber::new();
        let mut state = poller.start(urls(&["a", "b", "c"]));

        let ready = poller.run(&mut state, &prober).await;

        assert!(ready.is_empty());
        assert_eq!(state.pending(), ["a", "b", "c"]);
        assert_eq!(state.attempts_remaining(), 0);
        assert_eq!(prober.calls("a"), 3);
        assert!(!state.can_auto_poll());
    }

    #[tokio::test]
    async fn test_ready_on_later_round() {
        let poller = fast_poller();
        let prober = ScriptedProber::new().ready_on("a", 3).ready_on("b", 3);
        let mut state = poller.start(urls(&["a", "b"]));

        let ready = poller.run(&mut state, &prober).await;

        assert_eq!(ready, vec!["a", "b"]);
        assert!(state.is_complete());
        assert_eq!(state.attempts_remaining(), 0);
    }

    #[tokio::test]
    async fn test_manual_recheck_after_exhaustion() {
        let poller = fast_poller();
        let prober = ScriptedProber::new().ready_on("a", 5);
        let mut state = poller.start(urls(&["a"]));

        assert!(poller.run(&mut state, &prober).await.is_empty());
        assert_eq!(state.attempts_remaining(), 0);

        // Automatic polling is done; manual rechecks are unbounded.
        assert!(poller.run(&mut state, &prober).await.is_empty());
        assert!(poller.probe_round(&mut state, &prober).await.is_empty());
        assert_eq!(poller.probe_round(&mut state, &prober).await, vec!["a"]);
        assert!(state.is_complete());
        assert_eq!(state.attempts_remaining(), 0);
    }

    #[tokio::test]
    async fn test_empty_state_is_noop() {
        let poller = fast_poller();
        let prober = ScriptedProber::new();
        let mut state = poller.start(Vec::new());

        assert!(poller.run(&mut state, &prober).await.is_empty());
        assert_eq!(state.attempts_remaining(), DEFAULT_MAX_ROUNDS);
    }

    #[test]
    fn test_state_dedupes_urls() {
        let state = PollState::new(urls(&["a", "b", "a"]), 2);
        assert_eq!(state.pending(), ["a", "b"]);
        assert_eq!(state.attempts_remaining(), 2);
    }

    #[tokio::test]
    async fn test_default_interval_applies() {
        let poller = Poller::new().max_rounds(1).interval(Duration::from_millis(20));
        let prober = ScriptedProber::new();
        let mut state = poller.start(urls(&["a"]));

        let started = std::time::Instant::now();
        poller.run(&mut state, &prober).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(state.attempts_remaining(), 0);
    }
}
