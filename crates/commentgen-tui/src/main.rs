use anyhow::Result;
use commentgen_core::Config;
use tracing::{info, warn};

mod app;
mod handler;
mod input;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui, TICK_RATE};

#[tokio::main]
async fn main() -> Result<()> {
    let log_path = logging::init()?;
    info!(version = env!("CARGO_PKG_VERSION"), log = %log_path.display(), "starting comment-gen");

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "could not load config, using defaults");
        Config::new().with_env_overrides(|name| std::env::var(name).ok())
    });

    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(TICK_RATE);

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    if let Some(task) = app.generation_task.take() {
        task.abort();
    }
    info!("exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event)?;
        app.poll_generation().await;
    }
    Ok(())
}
