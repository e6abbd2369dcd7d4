//! Console data model: operation modes, chat messages and grounding links.
//!
//! Everything here is plain data shared by the providers, the conversation
//! controller and the terminal front-end.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::error::ConsoleError;

/// Status label shown while the console is operational.
pub const GOVERNOR_STATUS: &str = "ARCHITECT_CORE_V32";

/// Flavor figure displayed in the status panel. Not backed by any measurement.
pub const STORAGE_INDEX: &str = "128.4GB_SYNC";

pub const CORE_REVISION: &str = "32.5.2-ARCH";

/// Cosmetic inflation applied to live round-trip times before they are shown.
pub const LIVE_LATENCY_MULTIPLIER: f64 = 5.2;

/// Task category selected by the operator. Controls model choice, prompt
/// framing and which retrieval tools are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationMode {
    #[default]
    ArchitecturalModeling,
    DataSynthesis,
    SpatialAnalysis,
}

impl OperationMode {
    pub fn all() -> &'static [OperationMode] {
        &[
            OperationMode::ArchitecturalModeling,
            OperationMode::DataSynthesis,
            OperationMode::SpatialAnalysis,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OperationMode::ArchitecturalModeling => "Omni-Architecture",
            OperationMode::DataSynthesis => "Quantum Intelligence",
            OperationMode::SpatialAnalysis => "Reality Mapping",
        }
    }

    /// Sub-label used in the mode picker.
    pub fn vector_label(&self) -> &'static str {
        match self {
            OperationMode::ArchitecturalModeling => "ARCHITECTURAL_MODELING",
            OperationMode::DataSynthesis => "DATA_SYNTHESIS",
            OperationMode::SpatialAnalysis => "SPATIAL_VECTOR_ANALYSIS",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OperationMode {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "1" | "architect" | "omniarchitect" | "omniarchitecture" | "architecturalmodeling" => {
                Ok(OperationMode::ArchitecturalModeling)
            }
            "2" | "intel" | "quantumintel" | "quantumintelligence" | "datasynthesis" => {
                Ok(OperationMode::DataSynthesis)
            }
            "3" | "mapping" | "realitymapping" | "spatialanalysis" | "spatialvectoranalysis" => {
                Ok(OperationMode::SpatialAnalysis)
            }
            _ => Err(ConsoleError::UnknownMode(s.trim().to_string())),
        }
    }
}

// Serialised by display name so stored settings read like the mode picker.
impl Serialize for OperationMode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

impl<'de> Deserialize<'de> for OperationMode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Which retrieval tool produced a grounding citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroundingSource {
    Search,
    Maps,
}

/// A citation returned alongside generated text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingLink {
    pub uri: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<GroundingSource>,
}

impl GroundingLink {
    pub fn new(
        uri: impl Into<String>,
        title: impl Into<String>,
        source: Option<GroundingSource>,
    ) -> Self {
        Self {
            uri: uri.into(),
            title: title.into(),
            source,
        }
    }

    /// Title when present, otherwise the uri.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.uri
        } else {
            &self.title
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One entry of the conversation history. Built once per exchange side and
/// never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<OperationMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_links: Vec<GroundingLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mock: Option<bool>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            mode: None,
            grounding_links: Vec::new(),
            is_mock: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        mode: OperationMode,
        links: Vec<GroundingLink>,
        is_mock: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            mode: Some(mode),
            grounding_links: links,
            is_mock: Some(is_mock),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.is_mock.unwrap_or(false)
    }
}

/// Transient session state owned by the conversation controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    pub is_operational: bool,
    pub is_mock_enabled: bool,
    pub active_mode: OperationMode,
    /// Last recorded exchange latency in milliseconds (live values are inflated).
    pub latency_ms: u64,
    pub uptime: String,
    pub governor_status: String,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            is_operational: true,
            is_mock_enabled: false,
            active_mode: OperationMode::default(),
            latency_ms: 0,
            uptime: format_uptime(Duration::ZERO),
            governor_status: GOVERNOR_STATUS.to_string(),
        }
    }
}

/// Format an elapsed session time as `HH:MM:SS`. Hours keep growing past 99.
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let hours = total / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}
