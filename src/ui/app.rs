//! Application module for the quote cards.
//!
//! This module provides the main application state: the card panel, which
//! card holds focus, and the help overlay. It turns key presses and mouse
//! clicks into card activations and renders everything.
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, info};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::{Line, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::card_view::{CardView, SPINNER_FRAMES};
use crate::cards::{CardId, CardPanel, ResolvePolicy, Ticket};

/// Below this width the cards are stacked instead of placed side by side.
const SIDE_BY_SIDE_MIN_WIDTH: u16 = 60;

const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

/// Application mode that determines the current UI state.
///
/// Controls what is displayed and how user input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode
{
    /// Cards are shown and accept input.
    Normal,
    /// Help overlay is displayed.
    Help,
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome
{
    /// A card was activated; its fetch must be started.
    Activated(Ticket),
    /// The key was used and must not be handled any further.
    Consumed,
    /// The key means nothing here.
    Ignored,
}

/// Main application state.
pub struct App
{
    /// The cards and their quotes.
    pub panel: CardPanel,
    /// Index of the card holding keyboard focus.
    pub focused: usize,
    /// Current application mode.
    pub mode: AppMode,
    /// Flag indicating if the application should exit.
    pub should_quit: bool,
    /// Spinner frame shown on loading cards.
    spinner_frame: usize,
    /// Where each card was drawn last, used for mouse hit testing.
    card_areas: Vec<Rect>,
}

impl App
{
    /// Creates the application with the initial cards.
    #[must_use]
    pub fn new(policy: ResolvePolicy) -> Self
    {
        Self {
            panel: CardPanel::new(policy),
            focused: 0,
            mode: AppMode::Normal,
            should_quit: false,
            spinner_frame: 0,
            card_areas: Vec::new(),
        }
    }

    /// Renders the application UI to the provided frame.
    ///
    /// Remembers where each card ended up so clicks can be mapped back to
    /// cards.
    pub fn render(&mut self, frame: &mut Frame)
    {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(frame.area());

        let header = Paragraph::new(Line::from("Quote Cards - Press ? for help"))
            .alignment(Alignment::Center);
        frame.render_widget(header, chunks[0]);

        self.card_areas = card_layout(chunks[1], self.panel.cards().len());

        for (index, (card, area)) in self
            .panel
            .cards()
            .iter()
            .zip(&self.card_areas)
            .enumerate()
        {
            CardView::new(card, index == self.focused, self.spinner_frame).render(frame, *area);
        }

        let footer = Paragraph::new(Line::styled(
            "←/→ move  Enter/Space generate  1-3 pick  ? help  q quit",
            FOOTER_STYLE,
        ))
        .alignment(Alignment::Center);
        frame.render_widget(footer, chunks[2]);

        if self.mode == AppMode::Help
        {
            Self::render_help(frame);
        }
    }

    /// Renders the help overlay with keyboard shortcuts.
    fn render_help(frame: &mut Frame)
    {
        let area = centered_rect(60, 60, frame.area());

        // Clear the area first to make it fully opaque
        frame.render_widget(Clear, area);

        let text = Text::from(vec![
            Line::from("Quote Cards Help:"),
            Line::from(""),
            Line::from("←/→, h/l or Tab/Shift-Tab: Move focus"),
            Line::from("Enter or Space: Generate a quote for the focused card"),
            Line::from("1/2/3: Generate a quote for that card"),
            Line::from("Mouse click: Generate a quote for the clicked card"),
            Line::from("q: Quit"),
            Line::from("?: Toggle help"),
        ]);

        let help_box = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help")
                    .style(Style::default()),
            )
            .style(Style::default())
            .wrap(Wrap { trim: true });

        frame.render_widget(help_box, area);
    }

    /// Handles a key press.
    ///
    /// Enter and Space activate the focused card and are always consumed, so
    /// Space never falls through to scrolling.
    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome
    {
        if key.kind != KeyEventKind::Press
        {
            return KeyOutcome::Ignored;
        }

        match (self.mode, key.code)
        {
            (AppMode::Normal, KeyCode::Char('q') | KeyCode::Esc) =>
            {
                self.should_quit = true;
                KeyOutcome::Consumed
            }
            (AppMode::Normal | AppMode::Help, KeyCode::Char('?')) |
            (AppMode::Help, KeyCode::Esc) =>
            {
                self.toggle_help();
                KeyOutcome::Consumed
            }
            (AppMode::Normal, KeyCode::Enter | KeyCode::Char(' ')) =>
            {
                self.activate_focused()
                    .map_or(KeyOutcome::Consumed, KeyOutcome::Activated)
            }
            (AppMode::Normal, KeyCode::Char(digit @ '1'..='9')) =>
            {
                let Some(index) = digit
                    .to_digit(10)
                    .and_then(|value| usize::try_from(value).ok())
                    .and_then(|value| value.checked_sub(1))
                else
                {
                    return KeyOutcome::Ignored;
                };
                let Some(card_id) = self
                    .panel
                    .cards()
                    .get(index)
                    .map(|card| card.id)
                else
                {
                    return KeyOutcome::Ignored;
                };

                self.focused = index;
                self.activate(card_id)
                    .map_or(KeyOutcome::Consumed, KeyOutcome::Activated)
            }
            (AppMode::Normal, KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab) =>
            {
                self.focus_next();
                KeyOutcome::Consumed
            }
            (AppMode::Normal, KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab) =>
            {
                self.focus_previous();
                KeyOutcome::Consumed
            }
            (AppMode::Normal, KeyCode::Char('c'))
                if key.modifiers.contains(KeyModifiers::CONTROL) =>
            {
                self.should_quit = true;
                KeyOutcome::Consumed
            }
            _ => KeyOutcome::Ignored,
        }
    }

    /// Handles a mouse event; a left click on a card activates it.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<Ticket>
    {
        if self.mode != AppMode::Normal ||
            mouse.kind != MouseEventKind::Down(MouseButton::Left)
        {
            return None;
        }

        let index = self
            .card_areas
            .iter()
            .position(|area| area.contains(Position::new(mouse.column, mouse.row)))?;

        let card_id = self.panel.cards().get(index)?.id;
        self.focused = index;
        self.activate(card_id)
    }

    /// Starts loading a card.
    ///
    /// # Returns
    ///
    /// The ticket the fetch must carry, or `None` for an unknown card.
    pub fn activate(&mut self, card_id: CardId) -> Option<Ticket>
    {
        let ticket = self.panel.begin(card_id)?;
        info!(
            "Card {card_id} activated (generation {})",
            ticket.generation
        );
        Some(ticket)
    }

    /// Starts loading the focused card.
    pub fn activate_focused(&mut self) -> Option<Ticket>
    {
        let card_id = self.panel.cards().get(self.focused)?.id;
        self.activate(card_id)
    }

    /// Writes a finished fetch into its card.
    pub fn apply_quote(&mut self, ticket: Ticket, quote: String)
    {
        if !self.panel.resolve(ticket, quote)
        {
            debug!(
                "Dropped result of superseded fetch for card {} (generation {})",
                ticket.card_id, ticket.generation
            );
        }
    }

    /// Resets a card whose fetch could not be run.
    pub fn apply_failure(&mut self, ticket: Ticket)
    {
        if !self.panel.fail(ticket)
        {
            debug!(
                "Ignored failure of superseded fetch for card {}",
                ticket.card_id
            );
        }
    }

    /// Advances the spinner while any card is loading.
    pub fn on_tick(&mut self)
    {
        if self
            .panel
            .cards()
            .iter()
            .any(|card| card.is_loading)
        {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    /// Moves focus to the next card, wrapping around.
    pub fn focus_next(&mut self)
    {
        let count = self.panel.cards().len();
        if count > 0
        {
            self.focused = (self.focused + 1) % count;
        }
    }

    /// Moves focus to the previous card, wrapping around.
    pub fn focus_previous(&mut self)
    {
        let count = self.panel.cards().len();
        if count > 0
        {
            self.focused = self
                .focused
                .checked_sub(1)
                .unwrap_or(count - 1);
        }
    }

    /// Toggles the help overlay.
    pub fn toggle_help(&mut self)
    {
        self.mode = if self.mode == AppMode::Help
        {
            AppMode::Normal
        }
        else
        {
            AppMode::Help
        };
    }
}

/// Splits `area` into one slot per card.
///
/// Cards sit side by side when the area is wide enough and are stacked
/// otherwise.
#[must_use]
pub fn card_layout(area: Rect, count: usize) -> Vec<Rect>
{
    if count == 0
    {
        return Vec::new();
    }

    let direction = if area.width >= SIDE_BY_SIDE_MIN_WIDTH
    {
        Direction::Horizontal
    }
    else
    {
        Direction::Vertical
    };

    let count_u32 = u32::try_from(count).unwrap_or(u32::MAX);

    Layout::default()
        .direction(direction)
        .constraints(vec![Constraint::Ratio(1, count_u32); count])
        .split(area)
        .to_vec()
}

/// Creates a centered rectangle inside the given area.
///
/// # Arguments
///
/// * `percent_x` - Width of the rectangle as a percentage of the parent area
/// * `percent_y` - Height of the rectangle as a percentage of the parent area
/// * `area` - Parent rectangle.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect
{
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests
{
    use crossterm::event::KeyEventState;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn press(code: KeyCode) -> KeyEvent
    {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn click(column: u16, row: u16) -> MouseEvent
    {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn draw(app: &mut App, width: u16, height: u16) -> String
    {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("terminal");
        terminal
            .draw(|frame| app.render(frame))
            .expect("draw");

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn loading_flags(app: &App) -> Vec<bool>
    {
        app.panel
            .cards()
            .iter()
            .map(|card| card.is_loading)
            .collect()
    }

    #[test]
    fn enter_and_space_activate_the_focused_card()
    {
        for code in [KeyCode::Enter, KeyCode::Char(' ')]
        {
            let mut app = App::new(ResolvePolicy::default());
            app.focus_next();

            let outcome = app.handle_key(press(code));

            assert_eq!(
                outcome,
                KeyOutcome::Activated(Ticket {
                    card_id: 2,
                    generation: 1,
                })
            );
            assert_eq!(loading_flags(&app), [false, true, false]);
        }
    }

    #[test]
    fn keyboard_and_click_give_the_same_transition()
    {
        let mut by_key = App::new(ResolvePolicy::default());
        by_key.focused = 2;
        let KeyOutcome::Activated(key_ticket) = by_key.handle_key(press(KeyCode::Enter))
        else
        {
            panic!("Enter did not activate");
        };

        let mut by_click = App::new(ResolvePolicy::default());
        draw(&mut by_click, 90, 20);
        let third = by_click.card_areas[2];
        let click_ticket = by_click
            .handle_mouse(click(third.x + 1, third.y + 1))
            .expect("click activates");

        assert_eq!(key_ticket, click_ticket);
        assert_eq!(by_key.panel.cards(), by_click.panel.cards());
        assert_eq!(by_click.focused, 2);
    }

    #[test]
    fn click_outside_cards_does_nothing()
    {
        let mut app = App::new(ResolvePolicy::default());
        draw(&mut app, 90, 20);

        // header row
        assert!(app.handle_mouse(click(1, 0)).is_none());
        assert_eq!(loading_flags(&app), [false, false, false]);
    }

    #[test]
    fn only_left_button_press_activates()
    {
        let mut app = App::new(ResolvePolicy::default());
        draw(&mut app, 90, 20);
        let first = app.card_areas[0];

        let mut release = click(first.x + 1, first.y + 1);
        release.kind = MouseEventKind::Up(MouseButton::Left);
        assert!(app.handle_mouse(release).is_none());

        let mut right = click(first.x + 1, first.y + 1);
        right.kind = MouseEventKind::Down(MouseButton::Right);
        assert!(app.handle_mouse(right).is_none());
    }

    #[test]
    fn digits_pick_cards_directly()
    {
        let mut app = App::new(ResolvePolicy::default());

        assert!(matches!(
            app.handle_key(press(KeyCode::Char('3'))),
            KeyOutcome::Activated(Ticket { card_id: 3, .. })
        ));
        assert_eq!(app.focused, 2);
        assert_eq!(app.handle_key(press(KeyCode::Char('7'))), KeyOutcome::Ignored);
    }

    #[test]
    fn key_release_is_ignored()
    {
        let mut app = App::new(ResolvePolicy::default());
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };

        assert_eq!(app.handle_key(release), KeyOutcome::Ignored);
        assert_eq!(loading_flags(&app), [false, false, false]);
    }

    #[test]
    fn help_blocks_activation()
    {
        let mut app = App::new(ResolvePolicy::default());
        app.handle_key(press(KeyCode::Char('?')));
        assert_eq!(app.mode, AppMode::Help);

        assert_eq!(app.handle_key(press(KeyCode::Enter)), KeyOutcome::Ignored);
        assert_eq!(loading_flags(&app), [false, false, false]);

        app.handle_key(press(KeyCode::Esc));
        assert_eq!(app.mode, AppMode::Normal);
        assert!(!app.should_quit);
    }

    #[test]
    fn focus_wraps_around()
    {
        let mut app = App::new(ResolvePolicy::default());

        app.focus_previous();
        assert_eq!(app.focused, 2);
        app.focus_next();
        assert_eq!(app.focused, 0);
    }

    #[test]
    fn quit_keys()
    {
        let mut app = App::new(ResolvePolicy::default());
        app.handle_key(press(KeyCode::Char('q')));
        assert!(app.should_quit);

        let mut app = App::new(ResolvePolicy::default());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn results_are_applied_per_ticket()
    {
        let mut app = App::new(ResolvePolicy::default());
        let ticket = app.activate(1).expect("card 1");

        app.apply_quote(ticket, "Be bold.".to_owned());

        let card = app.panel.card(1).expect("card 1");
        assert_eq!(card.quote, "Be bold.");
        assert!(!card.is_loading);
    }

    #[test]
    fn layout_stacks_on_narrow_terminals()
    {
        let wide = card_layout(Rect::new(0, 0, 90, 20), 3);
        assert!(wide.iter().all(|area| area.y == 0));

        let narrow = card_layout(Rect::new(0, 0, 40, 30), 3);
        assert!(narrow.iter().all(|area| area.x == 0));
        assert!(narrow[0].y < narrow[1].y);
    }

    #[test]
    fn render_shows_all_titles()
    {
        let mut app = App::new(ResolvePolicy::default());
        let screen = draw(&mut app, 90, 20);

        for title in ["Inspiration", "Motivation", "Wisdom"]
        {
            assert!(screen.contains(title), "missing {title}");
        }
    }

    #[test]
    fn spinner_only_moves_while_loading()
    {
        let mut app = App::new(ResolvePolicy::default());
        app.on_tick();
        assert_eq!(app.spinner_frame, 0);

        app.activate(2);
        app.on_tick();
        assert_eq!(app.spinner_frame, 1);
    }
}
