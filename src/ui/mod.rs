//! Terminal user interface for the quote cards.
//!
//! Contains the application state, the card widget, event handling,
//! terminal setup and logging.
mod app;
mod card_view;
mod event;
mod guard;
pub mod logging;

pub use app::{App, AppMode, KeyOutcome, card_layout};
pub use card_view::CardView;
pub use event::{Event, EventHandler};
pub use guard::{TerminalGuard, Tui, init_panic_hook, init_tui};
