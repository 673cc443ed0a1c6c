//! Message translation against a device locale.
//!
//! [`Translations`] keeps an ordered list of locale directories. Each one is
//! searched for `{lang}/LC_MESSAGES/{domain}.mo`; catalogs found for a locale
//! are chained in registration order, followed by the built-in default
//! directory. Catalogs are loaded once per (directory, locale) and cached
//! until [`Translations::reset`].
pub mod catalog;
pub mod lazy;
pub mod plural;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use catalog::Catalog;
pub use lazy::{LazyMessage, Text, lazy, lazy_plural};

/// Anything carrying a locale name, typically a device.
pub trait LocaleSource {
    /// Locale such as `pl_PL.UTF-8`; empty or `C` disables translation.
    fn locale(&self) -> String;
}

impl LocaleSource for str {
    fn locale(&self) -> String {
        self.to_string()
    }
}

impl LocaleSource for String {
    fn locale(&self) -> String {
        self.clone()
    }
}

/// Whether a locale means "no translation".
#[must_use]
pub fn is_neutral(locale: &str) -> bool {
    locale.is_empty() || locale.eq_ignore_ascii_case("C")
}

/// Candidate language directories for a locale, most specific first.
///
/// A locale `ll_CC.codeset@modifier` expands into every combination of its
/// optional parts, the way gettext searches catalogs.
///
/// ```
/// use tadek_core::locale::expand_language;
///
/// assert_eq!(expand_language("pl_PL"), ["pl_PL", "pl"]);
/// assert_eq!(
///     expand_language("de_DE.UTF-8"),
///     ["de_DE.UTF-8", "de_DE", "de.UTF-8", "de"]
/// );
/// ```
#[must_use]
pub fn expand_language(locale: &str) -> Vec<String> {
    const CODESET: u8 = 1;
    const TERRITORY: u8 = 2;
    const MODIFIER: u8 = 4;

    let (rest, modifier) = split_part(locale, '@');
    let (rest, codeset) = split_part(rest, '.');
    let (language, territory) = split_part(rest, '_');

    let mut present = 0;
    for (part, bit) in [(codeset, CODESET), (territory, TERRITORY), (modifier, MODIFIER)] {
        if part.is_some() {
            present |= bit;
        }
    }

    (0..8_u8)
        .rev()
        .filter(|mask| mask & !present == 0)
        .map(|mask| {
            let mut candidate = language.to_string();
            if let Some(t) = territory.filter(|_| mask & TERRITORY != 0) {
                candidate.push('_');
                candidate.push_str(t);
            }
            if let Some(c) = codeset.filter(|_| mask & CODESET != 0) {
                candidate.push('.');
                candidate.push_str(c);
            }
            if let Some(m) = modifier.filter(|_| mask & MODIFIER != 0) {
                candidate.push('@');
                candidate.push_str(m);
            }
            candidate
        })
        .collect()
}

fn split_part(s: &str, separator: char) -> (&str, Option<&str>) {
    s.split_once(separator)
        .map_or((s, None), |(head, tail)| (head, Some(tail)))
}

/// Per-directory cache: locale → catalog, `None` when nothing matched.
type Bucket = HashMap<String, Option<Arc<Catalog>>>;

#[derive(Debug, Default)]
struct State {
    paths: Vec<PathBuf>,
    buckets: HashMap<PathBuf, Bucket>,
    default: Bucket,
}

/// Registered locale directories and their loaded catalogs.
#[derive(Debug)]
pub struct Translations {
    domain: String,
    default_dir: PathBuf,
    state: Mutex<State>,
}

impl Translations {
    /// Create a cache for `domain` with the built-in catalog directory.
    #[must_use]
    pub fn new(domain: impl Into<String>, default_dir: impl Into<PathBuf>) -> Self {
        Self {
            domain: domain.into(),
            default_dir: default_dir.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// Catalog domain, i.e. the `.mo` file stem.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Built-in catalog directory.
    #[must_use]
    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a locale directory; returns `false` if it already was.
    pub fn add(&self, path: &Path) -> bool {
        let mut state = self.lock();
        if state.paths.iter().any(|p| p == path) {
            return false;
        }
        tracing::debug!("registered locale directory {}", path.display());
        state.paths.push(path.to_path_buf());
        true
    }

    /// Deregister a locale directory and drop its catalogs.
    pub fn remove(&self, path: &Path) -> bool {
        let mut state = self.lock();
        state.buckets.remove(path);
        let before = state.paths.len();
        state.paths.retain(|p| p != path);
        before != state.paths.len()
    }

    /// Drop every loaded catalog; registered directories stay.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.buckets.clear();
        state.default.clear();
    }

    /// Registered directories in lookup order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.lock().paths.clone()
    }

    /// Catalogs consulted for `locale`, highest priority first.
    #[must_use]
    pub fn catalogs(&self, locale: &str) -> Vec<Arc<Catalog>> {
        let mut state = self.lock();
        let State {
            paths,
            buckets,
            default,
        } = &mut *state;

        let mut chain = Vec::new();
        for path in paths.iter() {
            let bucket = buckets.entry(path.clone()).or_default();
            let found = bucket
                .entry(locale.to_string())
                .or_insert_with(|| find_catalog(path, &self.domain, locale));
            chain.extend(found.clone());
        }
        if self.default_dir.is_dir() {
            let found = default
                .entry(locale.to_string())
                .or_insert_with(|| find_catalog(&self.default_dir, &self.domain, locale));
            chain.extend(found.clone());
        }
        chain
    }

    /// Translate a message for the locale of `source`.
    pub fn gettext<S: LocaleSource + ?Sized>(&self, message: &str, source: &S) -> String {
        let locale = source.locale();
        if is_neutral(&locale) {
            return message.to_string();
        }
        self.catalogs(&locale)
            .iter()
            .find_map(|c| c.gettext(message).map(str::to_string))
            .unwrap_or_else(|| message.to_string())
    }

    /// Translate a plural message; untranslated falls back to `n == 1`.
    pub fn ngettext<S: LocaleSource + ?Sized>(
        &self,
        singular: &str,
        plural: &str,
        n: u64,
        source: &S,
    ) -> String {
        let fallback = || String::from(if n == 1 { singular } else { plural });
        let locale = source.locale();
        if is_neutral(&locale) {
            return fallback();
        }
        self.catalogs(&locale)
            .iter()
            .find_map(|c| c.ngettext(singular, n).map(str::to_string))
            .unwrap_or_else(fallback)
    }

    /// Evaluate lazy text; plain text passes through.
    pub fn escape<S: LocaleSource + ?Sized>(&self, text: &Text, source: &S) -> String {
        text.translate(self, source)
    }
}

fn find_catalog(dir: &Path, domain: &str, locale: &str) -> Option<Arc<Catalog>> {
    for language in expand_language(locale) {
        let path = dir
            .join(&language)
            .join("LC_MESSAGES")
            .join(format!("{domain}.mo"));
        if !path.is_file() {
            continue;
        }
        match Catalog::load(&path) {
            Ok(catalog) => {
                tracing::debug!("loaded catalog {}", path.display());
                return Some(Arc::new(catalog));
            }
            Err(e) => tracing::warn!("skipping catalog: {e}"),
        }
    }
    None
}
