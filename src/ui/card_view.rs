//! Card widget.
//!
//! Draws one quote card in one of its three looks: idle (id badge and a
//! hint), loading (spinner), or showing its quote.
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use textwrap::wrap;

use crate::cards::Card;

const CARD_BORDER_STYLE: Style = Style::new().fg(Color::Gray);

const FOCUSED_BORDER_STYLE: Style = Style::new()
    .fg(Color::LightYellow)
    .add_modifier(Modifier::BOLD);

const TITLE_STYLE: Style = Style::new()
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);

const HINT_STYLE: Style = Style::new().fg(Color::DarkGray);

const QUOTE_STYLE: Style = Style::new().fg(Color::White);

/// Frames of the loading spinner.
pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

/// Hint shown on a card that has no quote yet.
pub const IDLE_HINT: &str = "Press Enter or click to generate a motivational quote";

/// Text shown under the spinner.
pub const LOADING_TEXT: &str = "Generating quote...";

/// Borrowed view of a card ready to be drawn.
pub struct CardView<'card>
{
    /// Card to draw.
    card: &'card Card,
    /// Whether the card holds keyboard focus.
    focused: bool,
    /// Current spinner frame.
    spinner_frame: usize,
}

impl<'card> CardView<'card>
{
    /// Creates the view of a card.
    #[must_use]
    pub const fn new(card: &'card Card, focused: bool, spinner_frame: usize) -> Self
    {
        Self {
            card,
            focused,
            spinner_frame,
        }
    }

    /// Renders the card into `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect)
    {
        let border_style = if self.focused
        {
            FOCUSED_BORDER_STYLE
        }
        else
        {
            CARD_BORDER_STYLE
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Line::styled(format!(" {} ", self.card.title), TITLE_STYLE))
            .title_alignment(Alignment::Center);

        // 2 for the border
        let inner_width = usize::from(area.width.saturating_sub(2)).max(1);
        let inner_height = usize::from(area.height.saturating_sub(2));

        let body = self.body(inner_width);
        let padding = inner_height.saturating_sub(body.lines.len()) / 2;

        let mut lines = vec![Line::raw(""); padding];
        lines.extend(body.lines);

        let paragraph = Paragraph::new(Text::from(lines))
            .block(block)
            .alignment(Alignment::Center);

        frame.render_widget(paragraph, area);
    }

    /// Builds the lines shown inside the border.
    fn body(&self, width: usize) -> Text<'static>
    {
        if self.card.is_loading
        {
            let spinner = SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()];

            return Text::from(vec![
                Line::styled(spinner.to_owned(), TITLE_STYLE),
                Line::raw(""),
                Line::styled(LOADING_TEXT, HINT_STYLE),
            ]);
        }

        if !self.card.quote.is_empty()
        {
            return wrap(&self.card.quote, width)
                .into_iter()
                .map(|line| Line::styled(line.into_owned(), QUOTE_STYLE))
                .collect::<Vec<Line>>()
                .into();
        }

        let mut lines = vec![
            Line::from(Span::styled(format!("( {} )", self.card.id), TITLE_STYLE)),
            Line::raw(""),
        ];
        lines.extend(
            wrap(IDLE_HINT, width)
                .into_iter()
                .map(|line| Line::styled(line.into_owned(), HINT_STYLE)),
        );

        Text::from(lines)
    }
}

#[cfg(test)]
mod tests
{
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;

    fn draw(card: &Card, focused: bool) -> String
    {
        let mut terminal = Terminal::new(TestBackend::new(30, 12)).expect("terminal");
        terminal
            .draw(|frame| CardView::new(card, focused, 0).render(frame, frame.area()))
            .expect("draw");

        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn idle_card_shows_id_and_hint()
    {
        let screen = draw(&Card::new(2, "Motivation"), false);

        assert!(screen.contains("Motivation"));
        assert!(screen.contains("( 2 )"));
        assert!(screen.contains("Press Enter"));
    }

    #[test]
    fn loading_card_shows_spinner_text()
    {
        let mut card = Card::new(1, "Inspiration");
        card.is_loading = true;
        card.quote = "previous".to_owned();

        let screen = draw(&card, true);

        assert!(screen.contains(LOADING_TEXT));
        assert!(!screen.contains("previous"));
    }

    #[test]
    fn quote_is_wrapped_inside_the_card()
    {
        let mut card = Card::new(3, "Wisdom");
        card.quote = "Every journey begins with a single step.".to_owned();

        let screen = draw(&card, false);

        assert!(screen.contains("Every journey begins"));
        assert!(screen.contains("single step."));
        assert!(!screen.contains("Press Enter"));
    }
}
