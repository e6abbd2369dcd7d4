//! Mode registry: maps each operation mode to a model, a system prompt and a
//! retrieval tool configuration.
//!
//! Resolution is a pure lookup. The system prompt is always the governance
//! preamble followed by the mode's task line.

use shared::console::{GeoLocation, OperationMode};
use shared::settings::ModelOverrides;

/// Base instructions shared by every mode.
pub const GOVERNANCE_PREAMBLE: &str = r#"ARISE-V32-SIM | ARCHITECTURAL INTELLIGENCE & DEFENSIVE SIMULATION CORE
IDENTITY: You are a high-level systems architect and defensive analyst. You operate within a structured, educational simulation environment.

CORE DIRECTIVES:
1. STRICT SIMULATION: You do NOT have access to private systems, satellites, or non-public data. All scenarios are hypothetical models based on public information.
2. PROFESSIONAL TONE: Maintain a calm, analytical, and objective "Mission Control" persona. Avoid aggressive or misleading "hacking" terminology.
3. ARCHITECTURE OVER ROLEPLAY: Focus on providing technical frameworks, defensive strategies, and structural designs.
4. DEFENSIVE ALIGNMENT: If a query involves security vulnerabilities, address it from a defensive, "Blue Team," or risk-mitigation perspective only.
5. FOCUS_UI PROTOCOL: Responses must be technical, precise, and devoid of sensationalism or filler.

GOVERNANCE:
- Do not claim to "hack," "hijack," or "breach" any entity.
- Instead, use terms like "Simulated Defense Analysis," "Architecture Modeling," or "Public Vector Mapping."
- If intent is ambiguous, default to the most constructive and safe interpretation.
"#;

pub const THINKING_BUDGET: u32 = 32768;

/// Retrieval/tooling block attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolConfiguration {
    /// Extended reasoning, no external tools.
    Reasoning { thinking_budget: u32 },
    /// Generic web-search grounding.
    WebSearch,
    /// Maps grounding, optionally anchored at the observer's position.
    Maps { location: Option<GeoLocation> },
}

/// Everything the live provider needs to build a request for one mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeConfig {
    pub model: String,
    pub system_prompt: String,
    pub tools: ToolConfiguration,
}

#[derive(Debug)]
struct ModeProfile {
    model: &'static str,
    task: &'static str,
}

const ARCHITECT_PROFILE: ModeProfile = ModeProfile {
    model: "gemini-3-pro-preview",
    task: "\nTASK: SYSTEMS ARCHITECTURE. Design robust, hypothetical frameworks.",
};

const SYNTHESIS_PROFILE: ModeProfile = ModeProfile {
    model: "gemini-3-flash-preview",
    task: "\nTASK: DATA SYNTHESIS. Analyze and cross-reference public data streams.",
};

const SPATIAL_PROFILE: ModeProfile = ModeProfile {
    model: "gemini-2.5-flash",
    task: "\nTASK: GEOSPATIAL ANALYSIS. Model environmental dependencies using public mapping vectors.",
};

fn profile(mode: OperationMode) -> &'static ModeProfile {
    match mode {
        OperationMode::ArchitecturalModeling => &ARCHITECT_PROFILE,
        OperationMode::DataSynthesis => &SYNTHESIS_PROFILE,
        OperationMode::SpatialAnalysis => &SPATIAL_PROFILE,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModeRegistry {
    models: ModelOverrides,
}

impl ModeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose model identifiers are replaced where `models` sets one.
    pub fn with_models(models: ModelOverrides) -> Self {
        Self { models }
    }

    pub fn default_model(mode: OperationMode) -> &'static str {
        profile(mode).model
    }

    /// Mode-specific line appended to the preamble.
    pub fn task_suffix(mode: OperationMode) -> &'static str {
        profile(mode).task
    }

    pub fn model_for(&self, mode: OperationMode) -> &str {
        self.models
            .for_mode(mode)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| Self::default_model(mode))
    }

    pub fn resolve(&self, mode: OperationMode, location: Option<GeoLocation>) -> ModeConfig {
        let system_prompt = format!("{}{}", GOVERNANCE_PREAMBLE, Self::task_suffix(mode));
        let tools = match mode {
            OperationMode::ArchitecturalModeling => ToolConfiguration::Reasoning {
                thinking_budget: THINKING_BUDGET,
            },
            OperationMode::DataSynthesis => ToolConfiguration::WebSearch,
            OperationMode::SpatialAnalysis => ToolConfiguration::Maps { location },
        };
        ModeConfig {
            model: self.model_for(mode).to_string(),
            system_prompt,
            tools,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_preamble_plus_task() {
        let registry = ModeRegistry::new();
        for mode in OperationMode::all() {
            let config = registry.resolve(*mode, None);
            assert!(config.system_prompt.starts_with(GOVERNANCE_PREAMBLE));
            assert!(config.system_prompt.ends_with(ModeRegistry::task_suffix(*mode)));
            assert_eq!(
                config.system_prompt.len(),
                GOVERNANCE_PREAMBLE.len() + ModeRegistry::task_suffix(*mode).len()
            );
        }
    }

    #[test]
    fn test_models_per_mode() {
        let registry = ModeRegistry::new();
        assert_eq!(
            registry.resolve(OperationMode::ArchitecturalModeling, None).model,
            "gemini-3-pro-preview"
        );
        assert_eq!(
            registry.resolve(OperationMode::DataSynthesis, None).model,
            "gemini-3-flash-preview"
        );
        assert_eq!(
            registry.resolve(OperationMode::SpatialAnalysis, None).model,
            "gemini-2.5-flash"
        );
    }

    #[test]
    fn test_tools_per_mode() {
        let registry = ModeRegistry::new();
        assert_eq!(
            registry.resolve(OperationMode::ArchitecturalModeling, None).tools,
            ToolConfiguration::Reasoning {
                thinking_budget: 32768
            }
        );
        assert_eq!(
            registry.resolve(OperationMode::DataSynthesis, None).tools,
            ToolConfiguration::WebSearch
        );
    }

    #[test]
    fn test_location_only_reaches_maps_tool_when_supplied() {
        let registry = ModeRegistry::new();
        let here = GeoLocation::new(48.85, 2.35);

        assert_eq!(
            registry.resolve(OperationMode::SpatialAnalysis, Some(here)).tools,
            ToolConfiguration::Maps {
                location: Some(here)
            }
        );
        assert_eq!(
            registry.resolve(OperationMode::SpatialAnalysis, None).tools,
            ToolConfiguration::Maps { location: None }
        );
        // Other modes ignore the location entirely.
        assert_eq!(
            registry.resolve(OperationMode::DataSynthesis, Some(here)).tools,
            ToolConfiguration::WebSearch
        );
    }

    #[test]
    fn test_model_override() {
        let registry = ModeRegistry::with_models(ModelOverrides {
            data_synthesis: Some("gemini-custom".into()),
            spatial_analysis: Some("  ".into()),
            ..Default::default()
        });
        assert_eq!(registry.model_for(OperationMode::DataSynthesis), "gemini-custom");
        assert_eq!(
            registry.model_for(OperationMode::SpatialAnalysis),
            "gemini-2.5-flash"
        );
        assert_eq!(
            registry.model_for(OperationMode::ArchitecturalModeling),
            "gemini-3-pro-preview"
        );
    }
}
