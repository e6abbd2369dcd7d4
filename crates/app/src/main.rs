use agent_host::ConversationController;
use anyhow::Result;
use providers::{LiveProvider, MockProvider, ResponseProvider};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;
mod settings;

use commands::Command;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Quiet by default so log lines don't interleave with the console.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_controller() -> ConversationController {
    let settings = settings::load_settings_or_default();
    let location = settings::resolve_location(&settings, |key| std::env::var(key).ok());
    tracing::info!(
        mode = %settings.default_mode,
        mock = settings.start_in_mock_mode,
        located = location.is_some(),
        "session starting"
    );

    let live: Arc<dyn ResponseProvider> = Arc::new(LiveProvider::from_settings(&settings));
    let mock: Arc<dyn ResponseProvider> =
        Arc::new(MockProvider::new().with_latency(settings.mock_latency_ms));

    ConversationController::new(live, mock)
        .with_settings(&settings)
        .with_location(location)
}

fn system_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn prompt_marker() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Accept a prompt and run its exchange in the background. A prompt entered
/// while another is in flight is dropped by the controller.
fn spawn_exchange(controller: &ConversationController, text: String) {
    let pending = match controller.begin_submit(text) {
        Ok(pending) => pending,
        Err(reason) => {
            tracing::debug!(?reason, "prompt dropped");
            return;
        }
    };
    println!("{}", render::THINKING_INDICATOR);

    tokio::spawn(async move {
        let exchange = pending.complete().await;
        println!("\n{}", render::render_message(exchange.log_index, &exchange.reply));
        println!("(latency {}ms)\n", exchange.latency_ms);
        prompt_marker();
    });
}

async fn run() -> Result<()> {
    init_tracing();

    let controller = Arc::new(build_controller());
    let started = Instant::now();

    let ticker = {
        let controller = controller.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                controller.tick(started.elapsed());
            }
        })
    };

    println!("{}\n", render::splash());
    println!("{}\n", render::render_status(&controller.state(), &system_time()));
    let (hint, activity) = render::input_hint(controller.state().is_mock_enabled);
    println!("{} [{}]  (/help for commands)", hint, activity);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt_marker();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match commands::parse(&line) {
            Command::Empty => {}
            Command::Prompt(text) => spawn_exchange(&controller, text),
            Command::SetMode(mode) => {
                controller.set_mode(mode);
                println!("mode: {} ({})", mode, mode.vector_label());
            }
            Command::ListModes => println!("{}", render::render_modes(controller.mode())),
            Command::ToggleMock => {
                let enabled = controller.toggle_mock();
                let (hint, activity) = render::input_hint(enabled);
                println!("data layer: {}", render::data_layer_label(enabled));
                println!("{} [{}]", hint, activity);
            }
            Command::Status => {
                println!("{}", render::render_status(&controller.state(), &system_time()))
            }
            Command::History => {
                let history = controller.history();
                if history.is_empty() {
                    println!("{}", render::splash());
                }
                for (i, msg) in history.iter().enumerate() {
                    println!("{}\n", render::render_message(i, msg));
                }
            }
            Command::Help => println!("{}", render::help()),
            Command::Quit => break,
            Command::Invalid(msg) => println!("{}", msg),
        }
    }

    // Requests are never cancelled; let an in-flight exchange land first.
    while controller.is_busy() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    ticker.abort();
    Ok(())
}
