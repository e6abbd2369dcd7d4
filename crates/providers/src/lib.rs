//! Response providers for the console.
//!
//! Two interchangeable implementations of one request/response contract:
//! - [`gemini::LiveProvider`] calls the remote generation endpoint
//! - [`mock::MockProvider`] answers from a local canned-response buffer
//!
//! Both resolve to a [`ProviderOutcome`]; neither ever returns an error.

pub mod gemini;
pub mod mock;
pub mod modes;

use async_trait::async_trait;
use shared::console::{GeoLocation, GroundingLink, OperationMode, LIVE_LATENCY_MULTIPLIER};

pub use gemini::{ContentTransport, HttpTransport, LiveProvider};
pub use mock::MockProvider;
pub use modes::{ModeConfig, ModeRegistry, ToolConfiguration};

/// Which implementation produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Live,
    Mock,
}

impl ProviderKind {
    /// Factor applied to the measured round-trip before it is recorded.
    pub fn latency_multiplier(&self) -> f64 {
        match self {
            ProviderKind::Live => LIVE_LATENCY_MULTIPLIER,
            ProviderKind::Mock => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub prompt: String,
    pub mode: OperationMode,
    pub location: Option<GeoLocation>,
}

impl ProviderRequest {
    pub fn new(prompt: impl Into<String>, mode: OperationMode) -> Self {
        Self {
            prompt: prompt.into(),
            mode,
            location: None,
        }
    }

    pub fn with_location(mut self, location: Option<GeoLocation>) -> Self {
        self.location = location;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub text: String,
    pub links: Vec<GroundingLink>,
}

/// Result of a provider call. A degraded reply is still a displayable
/// message; callers handle both arms the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    Delivered(ProviderReply),
    Degraded(ProviderReply),
}

impl ProviderOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ProviderOutcome::Degraded(_))
    }

    pub fn into_reply(self) -> ProviderReply {
        match self {
            ProviderOutcome::Delivered(r) | ProviderOutcome::Degraded(r) => r,
        }
    }
}

/// Common contract for live and mock backends.
#[async_trait]
pub trait ResponseProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn execute(&self, request: &ProviderRequest) -> ProviderOutcome;
}
