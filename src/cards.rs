//! Card state container.
//!
//! Holds the fixed set of quote cards and applies every change as a pure
//! transformation of the card list keyed by card id. The whole list is
//! replaced on each update, so no card is ever mutated in place.
//!
//! Each activation of a card bumps that card's generation and produces a
//! [`Ticket`]. The ticket travels with the background fetch and is handed back
//! when the result arrives, which lets the panel tell a superseded fetch from
//! the latest one.

/// Identifier of a card, also shown as its label.
pub type CardId = u32;

/// The cards shown when the panel starts.
pub const INITIAL_CARDS: [(CardId, &str); 3] = [
    (1, "Inspiration"),
    (2, "Motivation"),
    (3, "Wisdom"),
];

/// Quote written into a card when the fetch could not be run at all.
pub const IDLE_FALLBACK: &str = "Click to generate a quote!";

/// One quote card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card
{
    /// Stable identity of the card.
    pub id: CardId,
    /// Fixed display label.
    pub title: String,
    /// Last quote written into the card, empty until the first fetch resolves.
    pub quote: String,
    /// True while a fetch for this card is outstanding.
    pub is_loading: bool,
    /// Number of activations so far.
    generation: u64,
}

impl Card
{
    /// Creates an idle card with no quote.
    #[must_use]
    pub fn new(id: CardId, title: impl Into<String>) -> Self
    {
        Self {
            id,
            title: title.into(),
            quote: String::new(),
            is_loading: false,
            generation: 0,
        }
    }

    /// Number of times this card has been activated.
    #[must_use]
    pub const fn generation(&self) -> u64
    {
        self.generation
    }
}

/// Handle for one activation of one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket
{
    /// Card the fetch belongs to.
    pub card_id: CardId,
    /// Generation of the card when the fetch started.
    pub generation: u64,
}

/// How results of overlapping fetches for the same card are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolvePolicy
{
    /// Only the most recent activation may write its result. Results of
    /// superseded activations are dropped and the card keeps loading until
    /// the most recent one resolves.
    #[default]
    LatestActivation,
    /// Whichever fetch resolves last writes its result, even if it was
    /// started before a newer activation.
    LastResolved,
}

/// State change requested for a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction
{
    /// A fetch was started for the card.
    Begin(CardId),
    /// A fetch finished with a quote.
    Resolve
    {
        /// Activation that produced the quote.
        ticket: Ticket,
        /// Text to display.
        quote: String,
    },
    /// The fetch could not be carried out.
    Fail(Ticket),
}

impl CardAction
{
    /// Card targeted by this action.
    #[must_use]
    pub const fn card_id(&self) -> CardId
    {
        match self
        {
            Self::Begin(card_id) => *card_id,
            Self::Resolve { ticket, .. } | Self::Fail(ticket) => ticket.card_id,
        }
    }
}

/// Computes the next state of a single card for an action aimed at it.
///
/// Returns `None` when the action has no effect on the card.
fn transition(card: &Card, action: &CardAction, policy: ResolvePolicy) -> Option<Card>
{
    let is_current = |ticket: &Ticket| {
        policy == ResolvePolicy::LastResolved || ticket.generation == card.generation
    };

    match action
    {
        CardAction::Begin(_) => Some(Card {
            is_loading: true,
            generation: card.generation.saturating_add(1),
            ..card.clone()
        }),
        CardAction::Resolve { ticket, quote } if is_current(ticket) => Some(Card {
            quote: quote.clone(),
            is_loading: false,
            ..card.clone()
        }),
        CardAction::Fail(ticket) if is_current(ticket) => Some(Card {
            quote: IDLE_FALLBACK.to_owned(),
            is_loading: false,
            ..card.clone()
        }),
        CardAction::Resolve { .. } | CardAction::Fail(_) => None,
    }
}

/// Applies an action to a card list, producing the replacement list.
///
/// Cards other than the targeted one are carried over unchanged.
#[must_use]
pub fn reduce(cards: &[Card], action: &CardAction, policy: ResolvePolicy) -> Vec<Card>
{
    cards
        .iter()
        .map(|card| {
            if card.id == action.card_id()
            {
                transition(card, action, policy).unwrap_or_else(|| card.clone())
            }
            else
            {
                card.clone()
            }
        })
        .collect()
}

/// Owner of the card list.
#[derive(Debug, Clone)]
pub struct CardPanel
{
    /// Cards in display order.
    cards: Vec<Card>,
    /// How overlapping results are applied.
    policy: ResolvePolicy,
}

impl CardPanel
{
    /// Creates the panel with the three initial cards.
    #[must_use]
    pub fn new(policy: ResolvePolicy) -> Self
    {
        Self::with_cards(
            INITIAL_CARDS
                .iter()
                .map(|&(id, title)| Card::new(id, title)),
            policy,
        )
    }

    /// Creates a panel from an arbitrary set of cards.
    #[must_use]
    pub fn with_cards(cards: impl IntoIterator<Item = Card>, policy: ResolvePolicy) -> Self
    {
        Self {
            cards: cards.into_iter().collect(),
            policy,
        }
    }

    /// Cards in display order.
    #[must_use]
    pub fn cards(&self) -> &[Card]
    {
        &self.cards
    }

    /// Looks up a card by id.
    #[must_use]
    pub fn card(&self, card_id: CardId) -> Option<&Card>
    {
        self.cards
            .iter()
            .find(|card| card.id == card_id)
    }

    /// Replaces the card list with the result of `action`.
    pub fn dispatch(&mut self, action: &CardAction)
    {
        self.cards = reduce(&self.cards, action, self.policy);
    }

    /// Marks a card as loading and returns the ticket of the new fetch.
    ///
    /// The current quote stays visible until the fetch resolves.
    ///
    /// # Returns
    ///
    /// `None` if no card has the given id.
    pub fn begin(&mut self, card_id: CardId) -> Option<Ticket>
    {
        self.card(card_id)?;
        self.dispatch(&CardAction::Begin(card_id));

        self.card(card_id).map(|card| Ticket {
            card_id,
            generation: card.generation,
        })
    }

    /// Writes the result of a fetch into its card.
    ///
    /// # Returns
    ///
    /// `true` if the quote was applied, `false` if the ticket was superseded
    /// or names an unknown card.
    pub fn resolve(&mut self, ticket: Ticket, quote: String) -> bool
    {
        let before = self.card(ticket.card_id).cloned();
        self.dispatch(&CardAction::Resolve { ticket, quote });
        before.is_some_and(|card| self.card(ticket.card_id) != Some(&card))
    }

    /// Resets a card whose fetch could not be run.
    ///
    /// # Returns
    ///
    /// `true` if the card was reset.
    pub fn fail(&mut self, ticket: Ticket) -> bool
    {
        let before = self.card(ticket.card_id).cloned();
        self.dispatch(&CardAction::Fail(ticket));
        before.is_some_and(|card| self.card(ticket.card_id) != Some(&card))
    }
}

impl Default for CardPanel
{
    fn default() -> Self
    {
        Self::new(ResolvePolicy::default())
    }
}
