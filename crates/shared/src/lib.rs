pub mod console;
pub mod error;

pub use console::{
    format_uptime, GeoLocation, GroundingLink, GroundingSource, Message, OperationMode, Role,
    SystemState,
};
pub use error::ConsoleError;

pub mod settings {
    use serde::{Deserialize, Serialize};

    use crate::console::{GeoLocation, OperationMode};
    use crate::error::ConsoleError;

    fn default_api_key_env() -> String {
        "GEMINI_API_KEY".into()
    }

    fn default_api_base_url() -> String {
        "https://generativelanguage.googleapis.com".into()
    }

    fn default_request_timeout_secs() -> u64 {
        120
    }

    /// Per-mode model identifiers. `None` keeps the registry default.
    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    pub struct ModelOverrides {
        pub architectural_modeling: Option<String>,
        pub data_synthesis: Option<String>,
        pub spatial_analysis: Option<String>,
    }

    impl ModelOverrides {
        pub fn for_mode(&self, mode: OperationMode) -> Option<&str> {
            match mode {
                OperationMode::ArchitecturalModeling => self.architectural_modeling.as_deref(),
                OperationMode::DataSynthesis => self.data_synthesis.as_deref(),
                OperationMode::SpatialAnalysis => self.spatial_analysis.as_deref(),
            }
        }
    }

    /// Bounds of the simulated mock latency, in milliseconds (max exclusive).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct MockLatency {
        pub min: u64,
        pub max: u64,
    }

    impl Default for MockLatency {
        fn default() -> Self {
            Self {
                min: 800,
                max: 2000,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ConsoleSettings {
        #[serde(default)]
        pub start_in_mock_mode: bool,
        #[serde(default)]
        pub default_mode: OperationMode,
        /// Name of the environment variable holding the API credential.
        #[serde(default = "default_api_key_env")]
        pub api_key_env: String,
        #[serde(default = "default_api_base_url")]
        pub api_base_url: String,
        #[serde(default = "default_request_timeout_secs")]
        pub request_timeout_secs: u64,
        #[serde(default)]
        pub models: ModelOverrides,
        #[serde(default)]
        pub mock_latency_ms: MockLatency,
        /// Static observer position used when no location comes from the environment.
        #[serde(default)]
        pub location: Option<GeoLocation>,
    }

    impl Default for ConsoleSettings {
        fn default() -> Self {
            Self {
                start_in_mock_mode: false,
                default_mode: OperationMode::default(),
                api_key_env: default_api_key_env(),
                api_base_url: default_api_base_url(),
                request_timeout_secs: default_request_timeout_secs(),
                models: ModelOverrides::default(),
                mock_latency_ms: MockLatency::default(),
                location: None,
            }
        }
    }

    impl ConsoleSettings {
        /// Apply `ARISE_*` overrides read through `lookup`.
        ///
        /// Returns the first override that could not be parsed; earlier
        /// overrides stay applied.
        pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConsoleError>
        where
            F: Fn(&str) -> Option<String>,
        {
            if let Some(val) = lookup("ARISE_MOCK") {
                self.start_in_mock_mode = parse_flag(&val);
            }
            if let Some(val) = lookup("ARISE_API_BASE_URL") {
                if !val.trim().is_empty() {
                    self.api_base_url = val.trim().trim_end_matches('/').to_string();
                }
            }
            if let Some(val) = lookup("ARISE_MODE") {
                self.default_mode = val.parse()?;
            }
            Ok(())
        }

        /// Validate bounds that would otherwise panic further down.
        pub fn validate(&self) -> Result<(), ConsoleError> {
            if self.mock_latency_ms.min >= self.mock_latency_ms.max {
                return Err(ConsoleError::Settings(format!(
                    "mock_latency_ms.min ({}) must be below max ({})",
                    self.mock_latency_ms.min, self.mock_latency_ms.max
                )));
            }
            if self.request_timeout_secs == 0 {
                return Err(ConsoleError::Settings(
                    "request_timeout_secs must be positive".into(),
                ));
            }
            Ok(())
        }
    }

    /// Read an observer position from `ARISE_LATITUDE` / `ARISE_LONGITUDE`.
    ///
    /// `Ok(None)` when neither is set.
    pub fn location_from<F>(lookup: F) -> Result<Option<GeoLocation>, ConsoleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lat = lookup("ARISE_LATITUDE");
        let lng = lookup("ARISE_LONGITUDE");
        match (lat, lng) {
            (None, None) => Ok(None),
            (Some(lat), Some(lng)) => {
                let latitude = parse_coordinate(&lat, 90.0, "latitude")?;
                let longitude = parse_coordinate(&lng, 180.0, "longitude")?;
                Ok(Some(GeoLocation::new(latitude, longitude)))
            }
            _ => Err(ConsoleError::Location(
                "both ARISE_LATITUDE and ARISE_LONGITUDE are required".into(),
            )),
        }
    }

    fn parse_coordinate(raw: &str, limit: f64, name: &str) -> Result<f64, ConsoleError> {
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| ConsoleError::Location(format!("invalid {}: {}", name, raw)))?;
        if !value.is_finite() || value.abs() > limit {
            return Err(ConsoleError::Location(format!(
                "{} out of range: {}",
                name, value
            )));
        }
        Ok(value)
    }

    fn parse_flag(val: &str) -> bool {
        let v = val.trim().to_ascii_lowercase();
        v == "1" || v == "true" || v == "yes" || v == "on"
    }

}
