use ratatui::style::Color;

use super::episode::VocabularyItem;
use super::theme::Appearance;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VocabularyCategory {
    Verb,
    Noun,
    Adjective,
    Adverb,
    Phrase,
    Preposition,
    Conjunction,
    Pronoun,
    Interjection,
}

impl VocabularyCategory {
    pub(crate) fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "verb" => Some(Self::Verb),
            "noun" => Some(Self::Noun),
            "adjective" => Some(Self::Adjective),
            "adverb" => Some(Self::Adverb),
            "phrase" => Some(Self::Phrase),
            "preposition" => Some(Self::Preposition),
            "conjunction" => Some(Self::Conjunction),
            "pronoun" => Some(Self::Pronoun),
            "interjection" => Some(Self::Interjection),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedWord {
    pub(crate) word: String,
    pub(crate) category: Option<String>,
    pub(crate) subcategory: Option<String>,
}

/// Splits `"word (category, subcategory)"`. Everything after the first comma
/// belongs to the subcategory.
pub(crate) fn parse_word(raw: &str) -> ParsedWord {
    let plain = || ParsedWord {
        word: raw.to_string(),
        category: None,
        subcategory: None,
    };

    let trimmed = raw.trim_end();
    let Some(body) = trimmed.strip_suffix(')') else {
        return plain();
    };
    let Some(open) = body.find('(') else {
        return plain();
    };
    let word = body[..open].trim();
    let inner = body[open + 1..].trim();
    if word.is_empty() || inner.is_empty() || inner.contains(')') {
        return plain();
    }

    let mut parts = inner.split(',').map(str::trim);
    let category = parts.next().map(str::to_string);
    let rest: Vec<&str> = parts.collect();
    let subcategory = if rest.is_empty() {
        None
    } else {
        Some(rest.join(", "))
    };
    ParsedWord {
        word: word.to_string(),
        category,
        subcategory,
    }
}

/// Badges for one entry: the embedded form wins, the explicit fields fill in.
pub(crate) fn display_word(item: &VocabularyItem) -> ParsedWord {
    let mut parsed = parse_word(&item.word);
    if parsed.category.is_none() {
        parsed.category = item.category.clone().filter(|c| !c.trim().is_empty());
        parsed.subcategory = item.subcategory.clone().filter(|c| !c.trim().is_empty());
    }
    parsed
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BadgeColors {
    pub(crate) bg: Color,
    pub(crate) fg: Color,
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const fn badge(appearance: Appearance, dark: (u32, u32), light: (u32, u32)) -> BadgeColors {
    let (bg, fg) = match appearance {
        Appearance::Dark => dark,
        Appearance::Light => light,
    };
    BadgeColors {
        bg: rgb(bg),
        fg: rgb(fg),
    }
}

pub(crate) fn category_badge(category: Option<&str>, appearance: Appearance) -> BadgeColors {
    use VocabularyCategory::*;
    match category.and_then(VocabularyCategory::from_label) {
        Some(Verb) => badge(appearance, (0x1e3a8a, 0x93c5fd), (0xdbeafe, 0x1e40af)),
        Some(Noun) => badge(appearance, (0x14532d, 0x86efac), (0xdcfce7, 0x15803d)),
        Some(Adjective) => badge(appearance, (0x581c87, 0xd8b4fe), (0xf3e8ff, 0x7e22ce)),
        Some(Adverb) => badge(appearance, (0x713f12, 0xfde047), (0xfef9c3, 0xa16207)),
        Some(Phrase) => badge(appearance, (0x831843, 0xf9a8d4), (0xfce7f3, 0xbe185d)),
        Some(Preposition) => badge(appearance, (0x312e81, 0xa5b4fc), (0xe0e7ff, 0x4f46e5)),
        _ => badge(appearance, (0x374151, 0xd1d5db), (0xf3f4f6, 0x1f2937)),
    }
}

pub(crate) fn subcategory_badge(subcategory: Option<&str>, appearance: Appearance) -> BadgeColors {
    let Some(lower) = subcategory.map(str::to_lowercase) else {
        return badge(appearance, (0x374151, 0xd1d5db), (0xf3f4f6, 0x6b7280));
    };
    let has = |needles: &[&str]| needles.iter().any(|needle| lower.contains(needle));

    if has(&["singular", "plural"]) {
        badge(appearance, (0x064e3b, 0x6ee7b7), (0xd1fae5, 0x047857))
    } else if has(&["common", "proper"]) {
        badge(appearance, (0x134e4a, 0x5eead4), (0xccfbf1, 0x0f766e))
    } else if has(&["transitive"]) {
        // also covers "intransitive"
        badge(appearance, (0x0c4a6e, 0x7dd3fc), (0xe0f2fe, 0x0369a1))
    } else if has(&["modal", "auxiliary"]) {
        badge(appearance, (0x164e63, 0x67e8f9), (0xcffafe, 0x0e7490))
    } else if has(&["comparative", "superlative"]) {
        badge(appearance, (0x5b21b6, 0xc4b5fd), (0xede9fe, 0x6d28d9))
    } else {
        badge(appearance, (0x475569, 0xcbd5e1), (0xe2e8f0, 0x475569))
    }
}

/// Scroll and visibility state of the transcript pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TranscriptView {
    pub(crate) visible: bool,
    pub(crate) scroll: u16,
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self {
            visible: true,
            scroll: 0,
        }
    }
}

impl TranscriptView {
    pub(crate) fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub(crate) fn scroll_by(&mut self, delta: i32) {
        self.scroll = (i32::from(self.scroll) + delta).clamp(0, i32::from(u16::MAX)) as u16;
    }

    /// New episode: back to the top, visibility kept.
    pub(crate) fn reset_scroll(&mut self) {
        self.scroll = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_category_and_subcategory() {
        let parsed = parse_word("reservation (noun, countable, singular)");
        assert_eq!(parsed.word, "reservation");
        assert_eq!(parsed.category.as_deref(), Some("noun"));
        assert_eq!(parsed.subcategory.as_deref(), Some("countable, singular"));

        let only_category = parse_word("order(verb)");
        assert_eq!(only_category.word, "order");
        assert_eq!(only_category.category.as_deref(), Some("verb"));
        assert_eq!(only_category.subcategory, None);
    }

    #[test]
    fn plain_words_pass_through() {
        for raw in ["menu", "(noun)", "check (", "a (b) c"] {
            let parsed = parse_word(raw);
            assert_eq!(parsed.word, raw);
            assert_eq!(parsed.category, None, "{raw}");
        }
    }

    #[test]
    fn explicit_fields_fill_in_for_plain_words() {
        let item = VocabularyItem {
            word: "tip".to_string(),
            definition: "extra money".to_string(),
            category: Some("noun".to_string()),
            subcategory: Some("common".to_string()),
            ..VocabularyItem::default()
        };
        let shown = display_word(&item);
        assert_eq!(shown.word, "tip");
        assert_eq!(shown.category.as_deref(), Some("noun"));
        assert_eq!(shown.subcategory.as_deref(), Some("common"));
    }

    #[test]
    fn badge_palette_depends_on_appearance() {
        let dark = category_badge(Some("Verb"), Appearance::Dark);
        let light = category_badge(Some("verb"), Appearance::Light);
        assert_eq!(dark.bg, Color::Rgb(0x1e, 0x3a, 0x8a));
        assert_eq!(light.bg, Color::Rgb(0xdb, 0xea, 0xfe));
        assert_eq!(
            category_badge(Some("conjunction"), Appearance::Dark),
            category_badge(None, Appearance::Dark)
        );
    }

    #[test]
    fn subcategory_keywords_pick_palette() {
        let transitive = subcategory_badge(Some("intransitive"), Appearance::Light);
        assert_eq!(transitive.bg, Color::Rgb(0xe0, 0xf2, 0xfe));
        let plural = subcategory_badge(Some("Plural"), Appearance::Dark);
        assert_eq!(plural.bg, Color::Rgb(0x06, 0x4e, 0x3b));
        let other = subcategory_badge(Some("phrasal"), Appearance::Dark);
        assert_eq!(other.bg, Color::Rgb(0x47, 0x55, 0x69));
    }

    #[test]
    fn transcript_starts_visible_and_toggles() {
        let mut view = TranscriptView::default();
        assert!(view.visible);
        view.toggle();
        assert!(!view.visible);
        view.scroll_by(-5);
        assert_eq!(view.scroll, 0);
        view.scroll_by(7);
        view.reset_scroll();
        assert_eq!(view.scroll, 0);
    }
}
