use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use quote_cards::config::{self, ENV_API_KEY};
use quote_cards::{App, CardId, Config, Event, EventHandler, KeyOutcome, QuoteClient};
use quote_cards::{TerminalGuard, Transport, Tui, init_panic_hook, init_tui, logging, spawn_fetch};

fn main() -> Result<()>
{
    let matches = config::command().get_matches();

    let config = Config::load(&matches)?;
    config.validate()?;

    let log_path = config
        .log_file
        .clone()
        .map_or_else(logging::default_log_path, Ok)?;

    // Clear log if requested
    if matches.get_flag("clear-log")
    {
        logging::clear_log_file(&log_path)?;
        println!("Removed {}", log_path.display());
        return Ok(());
    }

    logging::init_logging(&log_path)?;
    info!("Using endpoint {} with agent {}", config.endpoint, config.agent_id);

    if config.api_key.is_none()
    {
        warn!("No API key configured ({ENV_API_KEY}), requests will likely be rejected");
    }

    let client = Arc::new(QuoteClient::from_config(&config));

    // Headless mode: one quote, no TUI
    if let Some(&card_id) = matches.get_one::<CardId>("once")
    {
        println!("{}", client.fetch_quote(card_id));
        return Ok(());
    }

    init_panic_hook();

    // Use RAII to ensure terminal cleanup happens
    let _terminal_guard = TerminalGuard::new().context("Failed to set up the terminal")?;

    let mut terminal = init_tui()?;

    let app = App::new(config.resolve_policy);

    // 250ms ticks drive the loading spinner
    let event_handler = EventHandler::new(Duration::from_millis(250));

    // Terminal will be cleaned up automatically when _terminal_guard is dropped
    run_app(&mut terminal, app, &event_handler, &client)
}

/// Run the main loop.
///
/// # Arguments
///
/// * `terminal` - The terminal to draw to
/// * `app` - The app to run
/// * `event_handler` - Source of input, ticks and fetch results
/// * `client` - Client shared with the fetch workers.
///
/// # Errors
///
/// Returns an error if the terminal fails to draw to the screen or the event
/// channel breaks.
fn run_app<T>(
    terminal: &mut Tui,
    mut app: App,
    event_handler: &EventHandler,
    client: &Arc<QuoteClient<T>>,
) -> Result<()>
where
    T: Transport + 'static,
{
    loop
    {
        terminal.draw(|frame| app.render(frame))?;

        let activated = match event_handler.next()?
        {
            Event::Key(key) => match app.handle_key(key)
            {
                KeyOutcome::Activated(ticket) => Some(ticket),
                KeyOutcome::Consumed | KeyOutcome::Ignored => None,
            },
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            Event::QuoteReady { ticket, quote } =>
            {
                app.apply_quote(ticket, quote);
                None
            }
            Event::QuoteFailed(ticket) =>
            {
                app.apply_failure(ticket);
                None
            }
            Event::Tick =>
            {
                app.on_tick();
                None
            }
            // Redrawn at the top of the loop
            Event::Resize(..) => None,
            Event::InputFailed(reason) => bail!("Terminal input failed: {reason}"),
        };

        if let Some(ticket) = activated
        {
            if let Err(err) = spawn_fetch(client, ticket, event_handler.sender())
            {
                error!("{err:#}");
                app.apply_failure(ticket);
            }
        }

        if app.should_quit
        {
            break;
        }
    }

    Ok(())
}
