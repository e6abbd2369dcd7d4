//! Parsing of console input lines.

use shared::console::OperationMode;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Free text to send to the active provider.
    Prompt(String),
    SetMode(OperationMode),
    ListModes,
    ToggleMock,
    Status,
    History,
    Help,
    Quit,
    /// Slash command that could not be understood; carries a message for the operator.
    Invalid(String),
    Empty,
}

pub fn parse(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Prompt(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_ascii_lowercase().as_str() {
        "mode" if arg.is_empty() => Command::ListModes,
        "mode" => match arg.parse() {
            Ok(mode) => Command::SetMode(mode),
            Err(e) => Command::Invalid(e.to_string()),
        },
        "modes" => Command::ListModes,
        "mock" => Command::ToggleMock,
        "status" => Command::Status,
        "history" | "log" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Invalid(format!("unknown command: /{}", other)),
    }
}
