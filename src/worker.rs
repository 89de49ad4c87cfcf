//! Background quote fetches.
//!
//! Every activation runs its request on its own short-lived thread so the UI
//! keeps drawing while the request is outstanding. The outcome is posted back
//! to the event loop, which is the only place card state changes.
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use anyhow::{Context, Result};
use log::{debug, error};

use crate::cards::Ticket;
use crate::client::{QuoteClient, Transport};
use crate::ui::Event;

/// Starts fetching the quote for `ticket` in the background.
///
/// Sends [`Event::QuoteReady`] with the quote when done, or
/// [`Event::QuoteFailed`] if the fetch panicked. A closed channel means the
/// application is shutting down and the outcome is dropped.
///
/// # Errors
///
/// Returns an error if the worker thread cannot be spawned. No event is sent
/// in that case.
pub fn spawn_fetch<T>(
    client: &Arc<QuoteClient<T>>,
    ticket: Ticket,
    events: Sender<Event>,
) -> Result<()>
where
    T: Transport + 'static,
{
    let client = Arc::clone(client);

    thread::Builder::new()
        .name(format!("quote-card-{}", ticket.card_id))
        .spawn(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| client.fetch_quote(ticket.card_id)));

            let event = if let Ok(quote) = outcome
            {
                Event::QuoteReady { ticket, quote }
            }
            else
            {
                error!("Quote worker for card {} panicked", ticket.card_id);
                Event::QuoteFailed(ticket)
            };

            if events.send(event).is_err()
            {
                debug!("Event loop gone, dropping quote for card {}", ticket.card_id);
            }
        })
        .context(format!("Failed to start quote worker for card {}", ticket.card_id))?;

    Ok(())
}
