//! Event handling module for the application.
//!
//! This module funnels everything the main loop reacts to through a single
//! channel: terminal input polled on a dedicated thread, periodic ticks, and
//! quote results posted by fetch workers.
//!
//! The `EventHandler` struct manages the input thread and hands out senders
//! so that workers can post into the same channel.
use std::io;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use log::error;

use crate::cards::Ticket;

/// Events that can be processed by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event
{
    /// Regular time tick for updating UI elements.
    Tick,
    /// Keyboard input event.
    Key(KeyEvent),
    /// Mouse input event.
    Mouse(MouseEvent),
    /// Terminal resize event with new dimensions.
    Resize(u16, u16),
    /// A fetch finished with a quote.
    QuoteReady
    {
        /// Activation the quote belongs to.
        ticket: Ticket,
        /// Text to show.
        quote: String,
    },
    /// A fetch could not be carried out.
    QuoteFailed(Ticket),
    /// Terminal input broke down; no more keys or ticks will arrive.
    InputFailed(String),
}

/// Handles terminal events.
///
/// Manages event handling in a separate thread and provides
/// a way to receive events through a channel.
pub struct EventHandler
{
    /// Receiver side of the event channel.
    event_receiver: mpsc::Receiver<Event>,
    /// Sender handed out to fetch workers.
    event_sender: mpsc::Sender<Event>,
    /// Sender for shutdown the thread for graceful shutdown.
    // The receiver is moved to the thread
    shutdown_sender: mpsc::Sender<()>,
    /// Handle to keep the thread alive.
    // Option is used to move the handle in `drop`
    // since we can't move the handle out of the `&mut self`
    // for calling `join` in `drop`
    thread_handle: Option<JoinHandle<()>>,
}

/// Waits up to the given timeout for one terminal event.
///
/// `Ok(None)` means the timeout passed without input.
pub type InputSource =
    Box<dyn FnMut(Duration) -> io::Result<Option<CrosstermEvent>> + Send + 'static>;

/// Reads the real terminal through crossterm.
fn read_terminal(timeout: Duration) -> io::Result<Option<CrosstermEvent>>
{
    if event::poll(timeout)?
    {
        event::read().map(Some)
    }
    else
    {
        Ok(None)
    }
}

/// Maps the terminal events the application cares about.
fn translate(input: CrosstermEvent) -> Option<Event>
{
    match input
    {
        CrosstermEvent::Key(key) => Some(Event::Key(key)),
        CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
        CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
        _ => None,
    }
}

impl EventHandler
{
    /// Creates a new event handler reading the terminal.
    ///
    /// # Arguments
    ///
    /// * `tick_rate` - The duration between tick events.
    ///
    /// # Returns
    ///
    /// A new `EventHandler` instance with a running background thread.
    #[must_use]
    pub fn new(tick_rate: Duration) -> Self
    {
        Self::with_source(tick_rate, Box::new(read_terminal))
    }

    /// Creates an event handler reading input from `source`.
    ///
    /// When the source fails, [`Event::InputFailed`] is posted and the input
    /// thread stops. Workers may still hold senders, so the channel itself
    /// stays open and the failure has to travel as an event.
    #[must_use]
    pub fn with_source(tick_rate: Duration, mut source: InputSource) -> Self
    {
        let (event_sender, event_receiver) = mpsc::channel();
        let (shutdown_sender, shutdown_receiver) = mpsc::channel();
        let input_sender = event_sender.clone();

        // Spawn a thread that continuously polls for terminal events
        // Move the `shutdown_receiver` to the thread.
        let handle = thread::spawn(move || {
            let mut last_tick = Instant::now();

            loop
            {
                if shutdown_receiver.try_recv().is_ok()
                {
                    break;
                }

                // If more time than tick_rate has passed, don't wait at all
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());

                match source(timeout)
                {
                    Ok(input) =>
                    {
                        // Break the loop if sending fails (receiver dropped)
                        if input
                            .and_then(translate)
                            .is_some_and(|event| input_sender.send(event).is_err())
                        {
                            break;
                        }
                    }
                    Err(err) =>
                    {
                        error!("Error reading terminal events: {err}");
                        let _ = input_sender.send(Event::InputFailed(err.to_string()));
                        break;
                    }
                }

                // Generate tick events for animations and regular updates
                if last_tick.elapsed() >= tick_rate
                {
                    if input_sender.send(Event::Tick).is_err()
                    {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self {
            event_receiver,
            event_sender,
            shutdown_sender,
            thread_handle: Some(handle),
        }
    }

    /// Returns a sender that posts into the event channel.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<Event>
    {
        self.event_sender.clone()
    }

    /// Gets the next event from the event channel.
    ///
    /// This method blocks until an event is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is disconnected.
    pub fn next(&self) -> Result<Event>
    {
        self.event_receiver
            .recv()
            .context("Event channel disconnected")
    }
}

impl Drop for EventHandler
{
    fn drop(&mut self)
    {
        // Signal shutdown (ignore if already closed)
        let _ = self.shutdown_sender.send(());

        if let Some(handle) = self.thread_handle.take()
        {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests
{
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;

    const TICK: Duration = Duration::from_millis(20);

    #[test]
    fn broken_input_is_reported_instead_of_going_silent()
    {
        let handler = EventHandler::with_source(
            TICK,
            Box::new(|_| Err(io::Error::other("no tty"))),
        );
        // a worker may still hold a sender
        let _worker = handler.sender();

        match handler.next().expect("event")
        {
            Event::InputFailed(reason) => assert!(reason.contains("no tty")),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn key_presses_are_forwarded()
    {
        let mut sent = false;
        let handler = EventHandler::with_source(
            Duration::from_secs(60),
            Box::new(move |timeout| {
                if sent
                {
                    thread::sleep(timeout.min(Duration::from_millis(5)));
                    return Ok(None);
                }
                sent = true;
                Ok(Some(CrosstermEvent::Key(KeyEvent::new(
                    KeyCode::Enter,
                    KeyModifiers::NONE,
                ))))
            }),
        );

        assert_eq!(
            handler.next().expect("event"),
            Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
        );
    }

    #[test]
    fn idle_input_still_ticks()
    {
        let handler = EventHandler::with_source(
            TICK,
            Box::new(|timeout| {
                thread::sleep(timeout);
                Ok(None)
            }),
        );

        assert_eq!(handler.next().expect("event"), Event::Tick);
    }

    #[test]
    fn worker_events_share_the_channel()
    {
        let handler = EventHandler::with_source(
            Duration::from_secs(60),
            Box::new(|timeout| {
                thread::sleep(timeout.min(Duration::from_millis(5)));
                Ok(None)
            }),
        );
        let ticket = Ticket {
            card_id: 1,
            generation: 1,
        };

        handler
            .sender()
            .send(Event::QuoteFailed(ticket))
            .expect("send");

        assert_eq!(handler.next().expect("event"), Event::QuoteFailed(ticket));
    }
}
