//! Conversation controller.
//!
//! Each exchange walks `Idle -> Sending -> AwaitingResult -> Idle`. A send is
//! accepted only from `Idle` with non-blank input; anything else is dropped
//! without touching history or state. Acceptance happens in one critical
//! section, which yields a [`PendingExchange`] that performs the provider call.
//! The mode, mock toggle and location are captured at acceptance, so flipping
//! them mid-flight only affects the next exchange.

use parking_lot::Mutex;
use providers::{ProviderKind, ProviderRequest, ResponseProvider};
use shared::console::{format_uptime, GeoLocation, Message, OperationMode, SystemState};
use shared::settings::ConsoleSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Idle,
    /// Accepted, provider call not started yet.
    Sending,
    AwaitingResult,
}

/// Why a send attempt was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    BlankInput,
    Busy,
}

/// A finished exchange.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub reply: Message,
    pub latency_ms: u64,
    pub provider: ProviderKind,
    /// Position of the reply in the session history.
    pub log_index: usize,
    /// The live provider fell back to a recovery message.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub enum SendOutcome {
    Completed(Exchange),
    Ignored(IgnoreReason),
}

impl SendOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed(_))
    }
}

/// Convert a measured round-trip into the recorded latency figure.
pub fn scaled_latency(elapsed: Duration, kind: ProviderKind) -> u64 {
    (elapsed.as_secs_f64() * 1000.0 * kind.latency_multiplier()).round() as u64
}

/// Values captured at dispatch time.
struct Dispatch {
    prompt: String,
    mode: OperationMode,
    use_mock: bool,
    location: Option<GeoLocation>,
}

struct Session {
    history: Vec<Message>,
    input: String,
    phase: ExchangePhase,
    selected_mode: OperationMode,
    location: Option<GeoLocation>,
    state: SystemState,
}

impl Session {
    fn check_ready(&self, text: &str) -> Result<(), IgnoreReason> {
        if text.trim().is_empty() {
            return Err(IgnoreReason::BlankInput);
        }
        if self.phase != ExchangePhase::Idle {
            return Err(IgnoreReason::Busy);
        }
        Ok(())
    }

    /// Accept `prompt`: record it and capture the dispatch values.
    fn accept(&mut self, prompt: String) -> Dispatch {
        self.phase = ExchangePhase::Sending;
        self.input.clear();
        self.history.push(Message::user(prompt.clone()));
        Dispatch {
            prompt,
            mode: self.selected_mode,
            use_mock: self.state.is_mock_enabled,
            location: self.location,
        }
    }

    fn begin_send(&mut self) -> Result<Dispatch, IgnoreReason> {
        self.check_ready(&self.input)?;
        let prompt = std::mem::take(&mut self.input);
        Ok(self.accept(prompt))
    }

    fn begin_submit(&mut self, text: String) -> Result<Dispatch, IgnoreReason> {
        self.check_ready(&text)?;
        Ok(self.accept(text))
    }

    fn finish(&mut self, reply: Message, mode: OperationMode, latency_ms: u64) {
        self.history.push(reply);
        self.state.latency_ms = latency_ms;
        self.state.active_mode = mode;
        self.phase = ExchangePhase::Idle;
    }
}

/// An accepted exchange whose provider call has not completed. Owns what it
/// needs, so it can be moved into a spawned task.
///
/// Dropping it before [`PendingExchange::complete`] returns (a cancelled
/// future or a panicking provider) puts the session back to `Idle`. The user
/// message stays in history with no reply.
pub struct PendingExchange {
    session: Arc<Mutex<Session>>,
    provider: Arc<dyn ResponseProvider>,
    kind: ProviderKind,
    dispatch: Dispatch,
    finished: bool,
}

impl PendingExchange {
    pub fn prompt(&self) -> &str {
        &self.dispatch.prompt
    }

    pub fn mode(&self) -> OperationMode {
        self.dispatch.mode
    }

    pub fn provider(&self) -> ProviderKind {
        self.kind
    }

    /// Call the provider and record the reply.
    pub async fn complete(mut self) -> Exchange {
        let request = ProviderRequest::new(self.dispatch.prompt.clone(), self.dispatch.mode)
            .with_location(self.dispatch.location);
        self.session.lock().phase = ExchangePhase::AwaitingResult;

        let started = Instant::now();
        let outcome = self.provider.execute(&request).await;
        let latency_ms = scaled_latency(started.elapsed(), self.kind);

        let degraded = outcome.is_degraded();
        let result = outcome.into_reply();
        let mode = self.dispatch.mode;
        let use_mock = self.dispatch.use_mock;
        let reply = Message::assistant(result.text, mode, result.links, use_mock);

        let log_index = {
            let mut session = self.session.lock();
            session.finish(reply.clone(), mode, latency_ms);
            session.history.len() - 1
        };
        self.finished = true;

        info!(
            mode = %mode,
            mock = use_mock,
            degraded,
            latency_ms,
            links = reply.grounding_links.len(),
            "exchange complete"
        );

        Exchange {
            reply,
            latency_ms,
            provider: self.kind,
            log_index,
            degraded,
        }
    }
}

impl Drop for PendingExchange {
    fn drop(&mut self) {
        if !self.finished {
            warn!(mode = %self.dispatch.mode, "exchange abandoned before a reply");
            self.session.lock().phase = ExchangePhase::Idle;
        }
    }
}

/// Owns one console session. Safe to share between tasks; the internal lock
/// is never held across a provider call.
pub struct ConversationController {
    session: Arc<Mutex<Session>>,
    live: Arc<dyn ResponseProvider>,
    mock: Arc<dyn ResponseProvider>,
}

impl ConversationController {
    pub fn new(live: Arc<dyn ResponseProvider>, mock: Arc<dyn ResponseProvider>) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session {
                history: Vec::new(),
                input: String::new(),
                phase: ExchangePhase::Idle,
                selected_mode: OperationMode::default(),
                location: None,
                state: SystemState::default(),
            })),
            live,
            mock,
        }
    }

    /// Apply the starting mode and mock toggle from settings.
    pub fn with_settings(self, settings: &ConsoleSettings) -> Self {
        {
            let mut s = self.session.lock();
            s.selected_mode = settings.default_mode;
            s.state.active_mode = settings.default_mode;
            s.state.is_mock_enabled = settings.start_in_mock_mode;
        }
        self
    }

    pub fn with_location(self, location: Option<GeoLocation>) -> Self {
        self.session.lock().location = location;
        self
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.session.lock().input = text.into();
    }

    pub fn input(&self) -> String {
        self.session.lock().input.clone()
    }

    pub fn set_mode(&self, mode: OperationMode) {
        self.session.lock().selected_mode = mode;
    }

    pub fn mode(&self) -> OperationMode {
        self.session.lock().selected_mode
    }

    pub fn set_mock_enabled(&self, enabled: bool) {
        self.session.lock().state.is_mock_enabled = enabled;
    }

    /// Flip the mock toggle and return the new value.
    pub fn toggle_mock(&self) -> bool {
        let mut s = self.session.lock();
        s.state.is_mock_enabled = !s.state.is_mock_enabled;
        s.state.is_mock_enabled
    }

    pub fn set_location(&self, location: Option<GeoLocation>) {
        self.session.lock().location = location;
    }

    pub fn location(&self) -> Option<GeoLocation> {
        self.session.lock().location
    }

    pub fn history(&self) -> Vec<Message> {
        self.session.lock().history.clone()
    }

    pub fn history_len(&self) -> usize {
        self.session.lock().history.len()
    }

    pub fn state(&self) -> SystemState {
        self.session.lock().state.clone()
    }

    pub fn phase(&self) -> ExchangePhase {
        self.session.lock().phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase() != ExchangePhase::Idle
    }

    /// Refresh the uptime string. Independent of the request lifecycle.
    pub fn tick(&self, uptime: Duration) {
        self.session.lock().state.uptime = format_uptime(uptime);
    }

    fn pending(&self, dispatch: Dispatch) -> PendingExchange {
        let (provider, kind) = if dispatch.use_mock {
            (self.mock.clone(), ProviderKind::Mock)
        } else {
            (self.live.clone(), ProviderKind::Live)
        };
        PendingExchange {
            session: self.session.clone(),
            provider,
            kind,
            dispatch,
            finished: false,
        }
    }

    /// Accept the current input buffer, if the session is idle.
    pub fn begin_send(&self) -> Result<PendingExchange, IgnoreReason> {
        let accepted = self.session.lock().begin_send();
        match accepted {
            Ok(dispatch) => Ok(self.pending(dispatch)),
            Err(reason) => {
                debug!(?reason, "send ignored");
                Err(reason)
            }
        }
    }

    /// Accept `text` directly, bypassing the input buffer. A dropped attempt
    /// leaves the session untouched.
    pub fn begin_submit(&self, text: impl Into<String>) -> Result<PendingExchange, IgnoreReason> {
        let accepted = self.session.lock().begin_submit(text.into());
        match accepted {
            Ok(dispatch) => Ok(self.pending(dispatch)),
            Err(reason) => {
                debug!(?reason, "submit ignored");
                Err(reason)
            }
        }
    }

    /// Submit `text` and wait for the reply.
    pub async fn submit(&self, text: impl Into<String>) -> SendOutcome {
        match self.begin_submit(text) {
            Ok(pending) => SendOutcome::Completed(pending.complete().await),
            Err(reason) => SendOutcome::Ignored(reason),
        }
    }

    /// Send the current input buffer and wait for the reply.
    pub async fn send(&self) -> SendOutcome {
        match self.begin_send() {
            Ok(pending) => SendOutcome::Completed(pending.complete().await),
            Err(reason) => SendOutcome::Ignored(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::MockProvider;
    use shared::console::Role;

    fn mock_only() -> ConversationController {
        let mock: Arc<dyn ResponseProvider> = Arc::new(MockProvider::seeded(11));
        ConversationController::new(mock.clone(), mock)
    }

    #[test]
    fn test_scaled_latency() {
        let t = Duration::from_millis(100);
        assert_eq!(scaled_latency(t, ProviderKind::Mock), 100);
        assert_eq!(scaled_latency(t, ProviderKind::Live), 520);
        assert_eq!(scaled_latency(Duration::from_micros(1_500), ProviderKind::Live), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_is_ignored() {
        let ctrl = mock_only();
        let before = ctrl.state();

        let outcome = ctrl.submit("   \n\t").await;
        assert!(matches!(outcome, SendOutcome::Ignored(IgnoreReason::BlankInput)));

        ctrl.set_input("  \t");
        let outcome = ctrl.send().await;
        assert!(matches!(outcome, SendOutcome::Ignored(IgnoreReason::BlankInput)));

        assert_eq!(ctrl.history_len(), 0);
        assert_eq!(ctrl.phase(), ExchangePhase::Idle);
        assert_eq!(ctrl.state(), before);
        // Input buffer untouched when a send is dropped.
        assert_eq!(ctrl.input(), "  \t");
    }

    #[test]
    fn test_accepted_submit_is_sending_until_completed() {
        let ctrl = mock_only();
        ctrl.set_input("draft");
        ctrl.set_mode(OperationMode::DataSynthesis);

        let pending = ctrl.begin_submit("scan sector 4").unwrap();
        assert_eq!(pending.prompt(), "scan sector 4");
        assert_eq!(pending.mode(), OperationMode::DataSynthesis);
        assert_eq!(pending.provider(), ProviderKind::Live);
        assert_eq!(ctrl.phase(), ExchangePhase::Sending);
        assert_eq!(ctrl.input(), "");
        assert_eq!(ctrl.history_len(), 1);

        // A second attempt leaves history and input alone.
        ctrl.set_input("typed meanwhile");
        assert!(matches!(
            ctrl.begin_submit("scan sector 5"),
            Err(IgnoreReason::Busy)
        ));
        assert!(matches!(ctrl.begin_send(), Err(IgnoreReason::Busy)));
        assert_eq!(ctrl.input(), "typed meanwhile");
        assert_eq!(ctrl.history_len(), 1);
        drop(pending);
    }

    #[test]
    fn test_dropped_pending_exchange_returns_to_idle() {
        let ctrl = mock_only();
        let pending = ctrl.begin_submit("abandon me").unwrap();
        assert!(ctrl.is_busy());

        drop(pending);
        assert_eq!(ctrl.phase(), ExchangePhase::Idle);
        assert_eq!(ctrl.history_len(), 1);
        assert!(ctrl.begin_submit("next").is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_clears_input_and_appends_pair() {
        let ctrl = mock_only();
        ctrl.set_mock_enabled(true);
        ctrl.set_mode(OperationMode::SpatialAnalysis);

        let outcome = ctrl.submit("map the grid").await;
        let exchange = match outcome {
            SendOutcome::Completed(e) => e,
            other => panic!("expected completion, got {:?}", other),
        };

        assert_eq!(ctrl.input(), "");
        assert_eq!(ctrl.phase(), ExchangePhase::Idle);
        let history = ctrl.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "map the grid");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].mode, Some(OperationMode::SpatialAnalysis));
        assert!(history[1].is_mock());
        assert_eq!(exchange.provider, ProviderKind::Mock);
        assert_eq!(ctrl.state().active_mode, OperationMode::SpatialAnalysis);
        assert_eq!(ctrl.state().latency_ms, exchange.latency_ms);
        assert_eq!(exchange.log_index, 1);
    }

    #[test]
    fn test_toggle_and_tick() {
        let ctrl = mock_only();
        assert!(ctrl.toggle_mock());
        assert!(!ctrl.toggle_mock());
        ctrl.tick(Duration::from_secs(3_725));
        assert_eq!(ctrl.state().uptime, "01:02:05");
    }

    #[test]
    fn test_with_settings() {
        let settings = ConsoleSettings {
            start_in_mock_mode: true,
            default_mode: OperationMode::DataSynthesis,
            ..ConsoleSettings::default()
        };
        let ctrl = mock_only()
            .with_settings(&settings)
            .with_location(Some(GeoLocation::new(1.0, 2.0)));
        assert!(ctrl.state().is_mock_enabled);
        assert_eq!(ctrl.mode(), OperationMode::DataSynthesis);
        assert_eq!(ctrl.state().active_mode, OperationMode::DataSynthesis);
        assert_eq!(ctrl.location(), Some(GeoLocation::new(1.0, 2.0)));
    }
}
