//! Deferred translations.
//!
//! A [`LazyMessage`] remembers what to translate and is evaluated later
//! against a concrete locale source. Lazy messages concatenate with strings
//! and with each other; the result is another lazy message whose
//! evaluation translates every lazy part and keeps plain parts verbatim.
//!
//! ```
//! use tadek_core::locale::{Translations, lazy};
//!
//! let greeting = "*" + lazy("hello") + "!";
//! assert_eq!(greeting.to_string(), "*hello!");
//!
//! let translations = Translations::new("tadek", "/nonexistent");
//! assert_eq!(greeting.translate(&translations, "C"), "*hello!");
//! ```
use std::fmt;
use std::ops::Add;

use super::{LocaleSource, Translations};

/// A piece of text that is either final or still to be translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Text {
    /// Used verbatim.
    Plain(String),
    /// Translated on evaluation.
    Lazy(LazyMessage),
}

impl Text {
    /// Evaluate against the locale of `source`.
    pub fn translate<S: LocaleSource + ?Sized>(
        &self,
        translations: &Translations,
        source: &S,
    ) -> String {
        match self {
            Self::Plain(s) => s.clone(),
            Self::Lazy(m) => m.translate(translations, source),
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(s) => f.write_str(s),
            Self::Lazy(m) => m.fmt(f),
        }
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_string())
    }
}

impl From<String> for Text {
    fn from(s: String) -> Self {
        Self::Plain(s)
    }
}

impl From<LazyMessage> for Text {
    fn from(m: LazyMessage) -> Self {
        Self::Lazy(m)
    }
}

/// A message translated on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazyMessage {
    /// `gettext(message)`.
    Single(String),
    /// `ngettext(singular, plural, n)`.
    Plural {
        /// Singular source form.
        singular: String,
        /// Plural source form.
        plural: String,
        /// Count selecting the form.
        n: u64,
    },
    /// Concatenation of two parts.
    Sum(Box<Text>, Box<Text>),
}

/// Lazy `gettext`.
#[must_use]
pub fn lazy(message: &str) -> LazyMessage {
    LazyMessage::Single(message.to_string())
}

/// Lazy `ngettext`.
#[must_use]
pub fn lazy_plural(singular: &str, plural: &str, n: u64) -> LazyMessage {
    LazyMessage::Plural {
        singular: singular.to_string(),
        plural: plural.to_string(),
        n,
    }
}

impl LazyMessage {
    fn sum(left: impl Into<Text>, right: impl Into<Text>) -> Self {
        Self::Sum(Box::new(left.into()), Box::new(right.into()))
    }

    /// Evaluate against the locale of `source`.
    pub fn translate<S: LocaleSource + ?Sized>(
        &self,
        translations: &Translations,
        source: &S,
    ) -> String {
        match self {
            Self::Single(message) => translations.gettext(message, source),
            Self::Plural {
                singular,
                plural,
                n,
            } => translations.ngettext(singular, plural, *n, source),
            Self::Sum(left, right) => {
                let mut out = left.translate(translations, source);
                out.push_str(&right.translate(translations, source));
                out
            }
        }
    }
}

/// The untranslated source text.
impl fmt::Display for LazyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(message) => f.write_str(message),
            Self::Plural {
                singular,
                plural,
                n,
            } => f.write_str(if *n == 1 { singular } else { plural }),
            Self::Sum(left, right) => write!(f, "{left}{right}"),
        }
    }
}

impl Add for LazyMessage {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::sum(self, rhs)
    }
}

impl Add<&str> for LazyMessage {
    type Output = Self;

    fn add(self, rhs: &str) -> Self {
        Self::sum(self, rhs)
    }
}

impl Add<String> for LazyMessage {
    type Output = Self;

    fn add(self, rhs: String) -> Self {
        Self::sum(self, rhs)
    }
}

impl Add<LazyMessage> for &str {
    type Output = LazyMessage;

    fn add(self, rhs: LazyMessage) -> LazyMessage {
        LazyMessage::sum(self, rhs)
    }
}

impl Add<LazyMessage> for String {
    type Output = LazyMessage;

    fn add(self, rhs: LazyMessage) -> LazyMessage {
        LazyMessage::sum(self, rhs)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locale::catalog::CatalogBuilder;

    fn polish() -> (tempfile::TempDir, Translations) {
        let tmp = tempfile::tempdir().unwrap();
        CatalogBuilder::new()
            .message("hello", "witaj")
            .message("stranger", "nieznajomy")
            .plural("apple", "apples", &["jabłko", "jabłka"])
            .write(&tmp.path().join("pl/LC_MESSAGES/tadek.mo"))
            .unwrap();
        let translations = Translations::new("tadek", tmp.path().join("none"));
        translations.add(tmp.path());
        (tmp, translations)
    }

    #[test]
    fn sum_translates_lazy_parts_only() {
        let (_tmp, translations) = polish();
        let message = "*" + lazy("hello") + " " + lazy("stranger") + "!*";
        assert_eq!(message.to_string(), "*hello stranger!*");
        assert_eq!(message.translate(&translations, "pl_PL"), "*witaj nieznajomy!*");
    }

    #[test]
    fn plain_text_is_never_translated() {
        let (_tmp, translations) = polish();
        let message = String::from("hello ") + lazy("hello");
        assert_eq!(message.translate(&translations, "pl_PL"), "hello witaj");
    }

    #[test]
    fn addition_is_associative_but_not_commutative() {
        let (_tmp, translations) = polish();
        let left = (lazy("hello") + lazy("stranger")) + "x";
        let right = lazy("hello") + (lazy("stranger") + "x");
        assert_eq!(
            left.translate(&translations, "pl"),
            right.translate(&translations, "pl")
        );
        let swapped = lazy("stranger") + lazy("hello");
        assert_ne!(
            (lazy("hello") + lazy("stranger")).translate(&translations, "pl"),
            swapped.translate(&translations, "pl")
        );
    }

    #[test]
    fn plural_messages() {
        let (_tmp, translations) = polish();
        let one = lazy_plural("apple", "apples", 1);
        let two = lazy_plural("apple", "apples", 2);
        assert_eq!(one.to_string(), "apple");
        assert_eq!(two.to_string(), "apples");
        assert_eq!(two.translate(&translations, "pl"), "jabłka");
    }

    #[test]
    fn escape_passes_plain_text() {
        let (_tmp, translations) = polish();
        assert_eq!(translations.escape(&Text::from("hello"), "pl"), "hello");
        assert_eq!(
            translations.escape(&Text::from(lazy("hello")), "pl"),
            "witaj"
        );
    }

    #[test]
    fn untranslated_locale_keeps_source() {
        let (_tmp, translations) = polish();
        let message = lazy("hello") + String::from("!");
        assert_eq!(message.translate(&translations, "de_DE"), "hello!");
    }
}
