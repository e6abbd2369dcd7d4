//! Local canned-response provider used when the console runs offline.
//!
//! The prompt is never inspected. Each call sleeps for a random interval to
//! imitate network latency, then answers with one of three fixed strings for
//! the requested mode. The random source is injectable so tests can seed it.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::console::{GroundingLink, GroundingSource, OperationMode};
use shared::settings::MockLatency;
use std::ops::Range;
use std::time::Duration;
use tracing::debug;

use crate::{ProviderKind, ProviderOutcome, ProviderReply, ProviderRequest, ResponseProvider};

pub const MOCK_BANNER: &str = "[LOCAL_HYPERCACHE_SIMULATION]";

pub const MOCK_DISCLAIMER: &str = "NOTE: This output is generated from the local simulation buffer and does not represent live neural sync data.";

const ARCHITECT_RESPONSES: [&str; 3] = [
    "STRUCTURAL_ANALYSIS_COMPLETE: The proposed hyper-converged architecture demonstrates a 14% improvement in data throughput. Recommendation: Deploy redundant kernel nodes with automated failover sharding.",
    "ARCHITECTURE_MODEL_V3: Successfully mapped the microservices mesh. Latency bottleneck identified at the ingress gateway. Suggested fix: Implement a decentralized auth-relay for token validation.",
    "SIMULATION_RESULT: The multi-layered defense mesh successfully mitigated a Tier-4 hypothetical breach. Integrity remains at 99.8%. No architectural drift detected.",
];

const SYNTHESIS_RESPONSES: [&str; 3] = [
    "NEURAL_SYNTHESIS: Cross-referencing public data streams... Found 3 correlating architectural patterns in recent open-source repository snapshots. Intelligence confidence: 94%.",
    "INTEL_LOG: Historical trend analysis suggests a shift towards edge-native deployment patterns. Current public vectors indicate rising demand for high-latency-tolerant data models.",
    "DATA_STREAM_SYNC: Analyzing public cloud infrastructure benchmarks. Result: Standard provisioned throughput for Tier-1 storage is currently matching the predicted V32 curve.",
];

const SPATIAL_RESPONSES: [&str; 3] = [
    "SPATIAL_VECTOR_LOCK: Modeling environmental constraints for the specified coordinates. Public geospatial data confirms a 12m elevation gradient within the zone of interest.",
    "MAPPING_DYNAMICS: Simulated dependency paths for local utility grids (Public Record) indicate a potential single-point-of-failure in the Northwest quadrant.",
    "GEOSPATIAL_SYNCHRONIZATION: Correlating map tiles with public traffic flow models. Simulation suggests optimal node placement at Grid-Sector-7 for maximum coverage density.",
];

/// Fixed canned answers for a mode.
pub fn canned_responses(mode: OperationMode) -> &'static [&'static str; 3] {
    match mode {
        OperationMode::ArchitecturalModeling => &ARCHITECT_RESPONSES,
        OperationMode::DataSynthesis => &SYNTHESIS_RESPONSES,
        OperationMode::SpatialAnalysis => &SPATIAL_RESPONSES,
    }
}

/// The two citations attached to roughly half of all mock replies.
pub fn mock_links() -> Vec<GroundingLink> {
    vec![
        GroundingLink::new(
            "https://simulation.arise-v32.local/docs",
            "Local Architectural Reference",
            Some(GroundingSource::Search),
        ),
        GroundingLink::new(
            "https://maps.arise.local/sector-7",
            "Mock Geospatial Buffer",
            Some(GroundingSource::Maps),
        ),
    ]
}

/// Wrap a canned answer in the simulation banner and disclaimer.
pub fn wrap_canned(text: &str) -> String {
    format!("{}\n\n{}\n\n{}", MOCK_BANNER, text, MOCK_DISCLAIMER)
}

pub struct MockProvider {
    rng: Mutex<StdRng>,
    latency_ms: Range<u64>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    pub fn from_rng(rng: StdRng) -> Self {
        let window = MockLatency::default();
        Self {
            rng: Mutex::new(rng),
            latency_ms: window.min..window.max,
        }
    }

    /// Replace the simulated latency window. An empty window falls back to
    /// a fixed delay of `min`.
    pub fn with_latency(mut self, window: MockLatency) -> Self {
        self.latency_ms = window.min..window.max;
        self
    }

    /// Draw delay, answer and link decision in one go so the lock is
    /// released before sleeping.
    fn draw(&self, mode: OperationMode) -> (Duration, &'static str, bool) {
        let mut rng = self.rng.lock();
        let delay_ms = if self.latency_ms.is_empty() {
            self.latency_ms.start
        } else {
            rng.gen_range(self.latency_ms.clone())
        };
        let responses = canned_responses(mode);
        let text = responses[rng.gen_range(0..responses.len())];
        let attach_links = rng.gen_bool(0.5);
        (Duration::from_millis(delay_ms), text, attach_links)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseProvider for MockProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mock
    }

    async fn execute(&self, request: &ProviderRequest) -> ProviderOutcome {
        let (delay, text, attach_links) = self.draw(request.mode);
        debug!(mode = %request.mode, delay_ms = delay.as_millis() as u64, "simulating mock latency");
        tokio::time::sleep(delay).await;

        ProviderOutcome::Delivered(ProviderReply {
            text: wrap_canned(text),
            links: if attach_links { mock_links() } else { Vec::new() },
        })
    }
}
