use super::episode::VocabularyItem;

/// Flip-to-reveal practice over one episode's key vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FlashcardDeck {
    cards: Vec<VocabularyItem>,
    index: usize,
    flipped: bool,
}

impl FlashcardDeck {
    /// Opening always starts at the first card, face up. `None` when there is
    /// nothing to practice.
    pub(crate) fn open(vocabulary: &[VocabularyItem]) -> Option<Self> {
        if vocabulary.is_empty() {
            return None;
        }
        Some(Self {
            cards: vocabulary.to_vec(),
            index: 0,
            flipped: false,
        })
    }

    pub(crate) fn current(&self) -> &VocabularyItem {
        &self.cards[self.index]
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn len(&self) -> usize {
        self.cards.len()
    }

    pub(crate) fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub(crate) fn flip(&mut self) {
        self.flipped = !self.flipped;
    }

    pub(crate) fn next(&mut self) {
        self.flipped = false;
        self.index = (self.index + 1) % self.cards.len();
    }

    pub(crate) fn previous(&mut self) {
        self.flipped = false;
        self.index = (self.index + self.cards.len() - 1) % self.cards.len();
    }

    pub(crate) fn title(&self) -> String {
        format!("Vocabulary Practice ({}/{})", self.index() + 1, self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(names: &[&str]) -> Vec<VocabularyItem> {
        names
            .iter()
            .map(|name| VocabularyItem {
                word: name.to_string(),
                definition: format!("meaning of {name}"),
                ..VocabularyItem::default()
            })
            .collect()
    }

    #[test]
    fn empty_vocabulary_has_no_deck() {
        assert!(FlashcardDeck::open(&[]).is_none());
    }

    #[test]
    fn navigation_wraps_and_unflips() {
        let mut deck = FlashcardDeck::open(&words(&["a", "b", "c"])).expect("deck");
        deck.previous();
        assert_eq!(deck.current().word, "c");
        deck.flip();
        assert!(deck.is_flipped());
        deck.next();
        assert_eq!(deck.index(), 0);
        assert!(!deck.is_flipped());
        assert_eq!(deck.title(), "Vocabulary Practice (1/3)");
    }

    #[test]
    fn reopening_starts_over() {
        let vocabulary = words(&["a", "b"]);
        let mut deck = FlashcardDeck::open(&vocabulary).expect("deck");
        deck.next();
        deck.flip();
        let deck = FlashcardDeck::open(&vocabulary).expect("deck");
        assert_eq!(deck.index(), 0);
        assert!(!deck.is_flipped());
        assert_eq!(deck.len(), 2);
    }
}
