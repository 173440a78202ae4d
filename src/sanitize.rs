//! # Text Sanitizer
//!
//! Thermal printer firmware ships a single-byte font table. Anything outside
//! the Basic Latin and Latin-1 Supplement blocks prints as garbage (or not at
//! all), and control characters would be interpreted as printer commands.
//!
//! [`sanitize`] makes any string printable:
//!
//! 1. Fully representable text is returned unchanged.
//! 2. Otherwise the [`Transliterator`] table is consulted: a whole-string
//!    match wins, then every contained phrase is replaced by its equivalent.
//! 3. Whatever is still unsupported is stripped.
//! 4. An empty residue becomes the literal `"Item"`.
//!
//! The function is total: it never fails.
//!
//! ## Example
//!
//! ```
//! use tillprint::sanitize::sanitize;
//!
//! assert_eq!(sanitize("Fried Rice"), "Fried Rice");
//! assert_eq!(sanitize("ကြက်သား"), "Chicken");
//! assert_eq!(sanitize("ကြက်သားဟင်း"), "Chicken Curry");
//! assert_eq!(sanitize("炒饭"), "Item");
//! ```

use std::sync::OnceLock;

/// Replacement for names with nothing printable left
pub const FALLBACK_NAME: &str = "Item";

/// Burmese food words and their English equivalents.
const BURMESE_FOOD: &[(&str, &str)] = &[
    ("ကြက်သား", "Chicken"),
    ("ဝက်သား", "Pork"),
    ("ငါး", "Fish"),
    ("ထမင်း", "Rice"),
    ("လက်ဖက်ရည်", "Tea"),
    ("ကော်ဖီ", "Coffee"),
    ("မုန်လာဥနီ", "Monlani"),
    ("ကြက်ဥ", "Egg"),
    ("ချက်ခင်း", "Fried"),
    ("အသား", "Meat"),
    ("အမဲသား", "Beef"),
    ("ရေ", "Water"),
    ("ပုဇွန်", "Shrimp"),
    ("ဟင်း", "Curry"),
];

/// Whether the printer font can render `c`.
///
/// Printable Basic Latin (U+0020–U+007E) and the printable half of
/// Latin-1 Supplement (U+00A0–U+00FF).
#[inline]
pub fn is_representable(c: char) -> bool {
    matches!(c as u32, 0x20..=0x7E | 0xA0..=0xFF)
}

/// Whether every character of `s` is representable
pub fn is_printable(s: &str) -> bool {
    s.chars().all(is_representable)
}

/// Phrase table consulted for non-representable text.
///
/// Entries are matched longest phrase first so that a compound word is
/// replaced before any of its parts.
#[derive(Debug, Clone, Default)]
pub struct Transliterator {
    entries: Vec<(String, String)>,
}

impl Transliterator {
    /// An empty table: unsupported text is only stripped.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in table (Burmese menu vocabulary).
    pub fn builtin() -> Self {
        Self::empty().with_entries(BURMESE_FOOD.iter().copied())
    }

    /// Add one phrase. A later entry for the same phrase replaces the earlier one.
    pub fn with_entry(mut self, phrase: impl Into<String>, replacement: impl Into<String>) -> Self {
        let phrase = phrase.into();
        if phrase.is_empty() {
            return self;
        }
        let replacement = replacement.into();
        self.entries.retain(|(p, _)| *p != phrase);
        self.entries.push((phrase, replacement));
        // Longest phrase first; ties keep insertion order.
        self.entries
            .sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        self
    }

    pub fn with_entries<I, P, R>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        entries
            .into_iter()
            .fold(self, |table, (p, r)| table.with_entry(p, r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Make `text` printable. See the module docs for the rules.
    pub fn sanitize(&self, text: &str) -> String {
        if is_printable(text) {
            return text.to_string();
        }

        let trimmed = text.trim();
        if let Some((_, replacement)) = self.entries.iter().find(|(p, _)| p == trimmed) {
            return finish(replacement);
        }

        let mut working = trimmed.to_string();
        for (phrase, replacement) in &self.entries {
            if working.contains(phrase.as_str()) {
                working = working.replace(phrase.as_str(), &format!(" {} ", replacement));
            }
        }
        finish(&working)
    }
}

/// Strip what is left unsupported, collapse whitespace, never return empty.
fn finish(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| is_representable(c))
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        collapsed
    }
}

fn builtin() -> &'static Transliterator {
    static TABLE: OnceLock<Transliterator> = OnceLock::new();
    TABLE.get_or_init(Transliterator::builtin)
}

/// Sanitize with the built-in table.
pub fn sanitize(name: &str) -> String {
    builtin().sanitize(name)
}

// ============================================================================
// TESTS
// ============================================================================
