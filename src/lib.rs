//! Quote Cards Library.
//!
//! Three cards in a terminal, each asking a remote inference endpoint for a
//! motivational quote when activated.
//!
//! # Modules
//!
//! - `cards`: card records and the state container that updates them.
//! - `client`: HTTP client that turns a card id into a quote.
//! - `config`: settings from defaults, environment and command line.
//! - `ident`: throwaway user and session identifiers.
//! - `worker`: background fetches that report back to the event loop.
//! - `ui`: terminal user interface components and event handling.
pub mod cards;
pub mod client;
pub mod config;
pub mod ident;
pub mod ui;
pub mod worker;

pub use cards::{Card, CardId, CardPanel, ResolvePolicy, Ticket};
pub use client::{QuoteClient, Transport, UreqTransport};
pub use config::Config;
pub use ui::logging;
pub use ui::{App, AppMode, Event, EventHandler, KeyOutcome};
pub use ui::{TerminalGuard, Tui, init_panic_hook, init_tui};
pub use worker::spawn_fetch;
