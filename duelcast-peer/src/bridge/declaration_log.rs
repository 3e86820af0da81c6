use duelcast_core::CardDeclaration;
use std::collections::VecDeque;

pub const DEFAULT_DECLARATION_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationOrigin {
    Local,
    Remote,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredCard {
    pub card: CardDeclaration,
    pub origin: DeclarationOrigin,
}

/// Newest-first history of the cards declared during a duel.
///
/// The relay delivers at least once, so a card equal to the newest entry by
/// timestamp and name is taken as a redelivery and not recorded again.
#[derive(Debug)]
pub struct DeclarationLog {
    entries: VecDeque<DeclaredCard>,
    capacity: usize,
}

impl DeclarationLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_DECLARATION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns false when the card was dropped as a redelivery.
    pub fn record(&mut self, card: CardDeclaration, origin: DeclarationOrigin) -> bool {
        if let Some(newest) = self.entries.front()
            && card.is_redelivery_of(&newest.card)
        {
            return false;
        }

        self.entries.push_front(DeclaredCard { card, origin });
        self.entries.truncate(self.capacity);
        true
    }

    pub fn entries(&self) -> Vec<DeclaredCard> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest_received(&self) -> Option<&CardDeclaration> {
        self.entries
            .iter()
            .find(|entry| entry.origin == DeclarationOrigin::Remote)
            .map(|entry| &entry.card)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DeclarationLog {
    fn default() -> Self {
        Self::new()
    }
}
