//! Plain-text rendering of the console: message log, status header and
//! mode picker.

use shared::console::{
    GroundingLink, GroundingSource, Message, OperationMode, Role, SystemState, CORE_REVISION,
    STORAGE_INDEX,
};

pub const THINKING_INDICATOR: &str = "ANALYZING_SYSTEM_V32...";

pub fn splash() -> String {
    [
        "ARISE_CORE",
        "SYSTEM_IDENT: V32_ARCHITECTURAL_GOVERNOR",
        "ANALYTICAL_SIMULATION_CORE_ACTIVE",
        "AWAITING_STRUCTURAL_DIRECTIVE",
    ]
    .join("\n")
}

pub fn help() -> &'static str {
    "/mode <name|1|2|3>  select operation mode\n\
     /modes              list operation modes\n\
     /mock               toggle local hypercache simulation\n\
     /status             show system status\n\
     /history            replay the session log\n\
     /help               show this help\n\
     /quit               leave the console"
}

/// Input hint and activity label for the current data layer.
pub fn input_hint(mock_enabled: bool) -> (&'static str, &'static str) {
    if mock_enabled {
        (
            "INITIATE OFFLINE SIMULATION SEQUENCE...",
            "LOCAL_HYPERCACHE_SIMULATION_ACTIVE",
        )
    } else {
        (
            "INITIATE ARCHITECTURAL ANALYSIS...",
            "STRUCTURAL_SIMULATION_ACTIVE",
        )
    }
}

pub fn data_layer_label(mock_enabled: bool) -> &'static str {
    if mock_enabled {
        "LOCAL_HYPERCACHE"
    } else {
        "LIVE_NEURAL_LINK"
    }
}

fn sender_label(msg: &Message) -> &'static str {
    match (msg.role, msg.is_mock()) {
        (Role::User, _) => ">> OPERATOR_SIG",
        (Role::System, _) => ">> SYSTEM",
        (Role::Assistant, true) => ">> OFFLINE_BUFFER",
        (Role::Assistant, false) => ">> ANALYST_SIM",
    }
}

fn link_line(link: &GroundingLink) -> String {
    let marker = match link.source {
        Some(GroundingSource::Maps) => "[maps]",
        _ => "[link]",
    };
    format!("  {} {} <{}>", marker, link.label(), link.uri)
}

/// Render one history entry. `index` is its position in the session log.
pub fn render_message(index: usize, msg: &Message) -> String {
    let mut header = format!("{}  LOG_{:04}", sender_label(msg), index);
    if msg.is_mock() {
        header.push_str("  MOCK_LAYER");
    }
    if let Some(mode) = msg.mode {
        header.push_str(&format!("  [{}]", mode));
    }

    let mut out = vec![header, msg.content.clone()];
    if !msg.grounding_links.is_empty() {
        out.push(String::new());
        out.push(
            if msg.is_mock() {
                "Cached Grounding Data:"
            } else {
                "Verified Grounding Data:"
            }
            .to_string(),
        );
        out.extend(msg.grounding_links.iter().map(link_line));
    }
    out.join("\n")
}

/// Status header. `system_time` is the wall-clock string to display.
pub fn render_status(state: &SystemState, system_time: &str) -> String {
    let mock = state.is_mock_enabled;
    let (title, tagline) = if mock {
        ("V32_OFFLINE", "Hypercache Simulation")
    } else {
        ("V32_SIM", "Sovereign Authority")
    };
    let (origin, load, protocol, link) = if mock {
        (
            "LOCAL_STORAGE",
            "LOW_EMULATION",
            "SIM_UNRESTRICTED",
            "LOCAL_BYPASS_MODE",
        )
    } else {
        (
            "NEURAL_SYNAPSE",
            "98.42%_ACTIVE",
            "USR_SIM_882",
            "ENCRYPTED_LINK",
        )
    };
    let operational = if state.is_operational {
        "OPERATIONAL"
    } else {
        "HALTED"
    };

    [
        format!("{} | {} | {}", title, tagline, link),
        format!(
            "Data Origin: {} | Processor Load: {} | System Time: {} | Access Protocol: {}",
            origin, load, system_time, protocol
        ),
        format!(
            "Mode: {} | Latency: {}ms | Uptime: {} | Data Layer: {}",
            state.active_mode,
            state.latency_ms,
            state.uptime,
            data_layer_label(mock)
        ),
        format!(
            "Storage Index: {} | Status: {} ({}) | Core_Rev: {}",
            STORAGE_INDEX, state.governor_status, operational, CORE_REVISION
        ),
    ]
    .join("\n")
}

pub fn render_modes(selected: OperationMode) -> String {
    OperationMode::all()
        .iter()
        .enumerate()
        .map(|(i, mode)| {
            let marker = if *mode == selected { '*' } else { ' ' };
            format!(
                "{} {}. {:<22} {}",
                marker,
                i + 1,
                mode.display_name(),
                mode.vector_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
