//! Agent Host - conversation controller for the console
//!
//! This crate owns the per-session conversation:
//! - Message history (append-only, chronological)
//! - The single-outstanding-request exchange state machine
//! - Dispatch to the live or mock provider chosen at send time
//! - Latency bookkeeping and uptime for the status panel

pub mod controller;

pub use controller::{
    scaled_latency, ConversationController, Exchange, ExchangePhase, IgnoreReason, PendingExchange,
    SendOutcome,
};
