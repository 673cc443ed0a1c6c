//! GNU `.mo` message catalogs.
//!
//! [`Catalog`] reads compiled catalogs in either byte order; plural entries
//! keep their forms together and context-qualified ids are joined with
//! [`CONTEXT_SEPARATOR`]. [`CatalogBuilder`] produces the same format.
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use super::plural::PluralRule;
use crate::error::LocaleError;

const MAGIC: u32 = 0x9504_12de;
const HEADER_LEN: usize = 28;

/// Separator between a message context and its id.
pub const CONTEXT_SEPARATOR: char = '\u{4}';

/// Separator between plural forms.
const PLURAL_SEPARATOR: char = '\0';

struct Reader<'a> {
    bytes: &'a [u8],
    big_endian: bool,
    origin: &'a str,
}

impl<'a> Reader<'a> {
    fn truncated(&self, offset: usize) -> LocaleError {
        LocaleError::Truncated {
            path: self.origin.to_string(),
            offset,
        }
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], LocaleError> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or_else(|| self.truncated(offset))
    }

    fn u32_at(&self, offset: usize) -> Result<u32, LocaleError> {
        let chunk: [u8; 4] = self
            .slice(offset, 4)?
            .try_into()
            .map_err(|_| self.truncated(offset))?;
        Ok(if self.big_endian {
            u32::from_be_bytes(chunk)
        } else {
            u32::from_le_bytes(chunk)
        })
    }

    fn usize_at(&self, offset: usize) -> Result<usize, LocaleError> {
        self.u32_at(offset)
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX))
    }

    /// The `index`-th string of the descriptor table at `table`.
    fn string(&self, table: usize, index: usize) -> Result<String, LocaleError> {
        let entry = index
            .checked_mul(8)
            .and_then(|o| o.checked_add(table))
            .ok_or_else(|| self.truncated(table))?;
        let len = self.usize_at(entry)?;
        let offset = self.usize_at(entry + 4)?;
        Ok(String::from_utf8_lossy(self.slice(offset, len)?).into_owned())
    }
}

/// A loaded message catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
    plurals: HashMap<String, Vec<String>>,
    headers: BTreeMap<String, String>,
    nplurals: usize,
    rule: PluralRule,
}

impl Catalog {
    /// Read a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid catalog.
    pub fn load(path: &Path) -> Result<Self, LocaleError> {
        let bytes = fs::read(path).map_err(|source| LocaleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&bytes, &path.display().to_string())
    }

    /// Parse catalog bytes; `origin` names the source in errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic number, revision, tables or
    /// `Plural-Forms` header are invalid.
    pub fn parse(bytes: &[u8], origin: &str) -> Result<Self, LocaleError> {
        let mut reader = Reader {
            bytes,
            big_endian: false,
            origin,
        };
        match reader.u32_at(0) {
            Ok(MAGIC) => {}
            Ok(m) if m.swap_bytes() == MAGIC => reader.big_endian = true,
            _ => {
                return Err(LocaleError::BadMagic {
                    path: origin.to_string(),
                });
            }
        }
        let revision = reader.u32_at(4)? >> 16;
        if revision > 1 {
            return Err(LocaleError::UnsupportedRevision {
                path: origin.to_string(),
                revision,
            });
        }
        if bytes.len() < HEADER_LEN {
            return Err(reader.truncated(bytes.len()));
        }
        let count = reader.usize_at(8)?;
        let originals = reader.usize_at(12)?;
        let translations = reader.usize_at(16)?;

        let mut catalog = Self {
            nplurals: 2,
            ..Self::default()
        };
        for index in 0..count {
            let msgid = reader.string(originals, index)?;
            let msgstr = reader.string(translations, index)?;
            if msgid.is_empty() {
                catalog.read_headers(&msgstr)?;
            } else if let Some((singular, _)) = msgid.split_once(PLURAL_SEPARATOR) {
                let forms = msgstr.split(PLURAL_SEPARATOR).map(str::to_string).collect();
                catalog.plurals.insert(singular.to_string(), forms);
            } else if !msgstr.is_empty() {
                catalog.messages.insert(msgid, msgstr);
            }
        }
        Ok(catalog)
    }

    fn read_headers(&mut self, raw: &str) -> Result<(), LocaleError> {
        for line in raw.lines() {
            if let Some((key, value)) = line.split_once(':') {
                self.headers
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        let Some(forms) = self.headers.get("Plural-Forms") else {
            return Ok(());
        };
        for part in forms.split(';').map(str::trim) {
            if let Some(expr) = part.strip_prefix("plural=") {
                self.rule = PluralRule::parse(expr)?;
            } else if let Some(n) = part.strip_prefix("nplurals=") {
                self.nplurals = n.trim().parse().unwrap_or(2);
            }
        }
        Ok(())
    }

    /// Translation of a message.
    #[must_use]
    pub fn gettext(&self, message: &str) -> Option<&str> {
        self.messages.get(message).map(String::as_str)
    }

    /// Plural form of `singular` selected for `n`.
    #[must_use]
    pub fn ngettext(&self, singular: &str, n: u64) -> Option<&str> {
        let forms = self.plurals.get(singular)?;
        let index = usize::try_from(self.rule.index(n)).ok()?;
        forms.get(index).map(String::as_str)
    }

    /// Translation of a message within a context.
    #[must_use]
    pub fn pgettext(&self, context: &str, message: &str) -> Option<&str> {
        self.gettext(&format!("{context}{CONTEXT_SEPARATOR}{message}"))
    }

    /// A header value from the catalog metadata entry.
    #[must_use]
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Declared number of plural forms.
    #[must_use]
    pub const fn nplurals(&self) -> usize {
        self.nplurals
    }

    /// Plural rule from the `Plural-Forms` header.
    #[must_use]
    pub const fn plural_rule(&self) -> &PluralRule {
        &self.rule
    }

    /// Number of translated entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.plurals.len()
    }

    /// Whether the catalog translates nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Writes little-endian `.mo` catalogs.
///
/// ```
/// use tadek_core::locale::catalog::{Catalog, CatalogBuilder};
///
/// let bytes = CatalogBuilder::new().message("hello", "witaj").to_bytes();
/// let catalog = Catalog::parse(&bytes, "<memory>").unwrap();
/// assert_eq!(catalog.gettext("hello"), Some("witaj"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    headers: Vec<(String, String)>,
    entries: BTreeMap<String, String>,
}

impl CatalogBuilder {
    /// Start an empty catalog with a UTF-8 content type.
    #[must_use]
    pub fn new() -> Self {
        Self::default().header("Content-Type", "text/plain; charset=UTF-8")
    }

    /// Add a metadata header.
    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Declare the plural rule.
    #[must_use]
    pub fn plural_forms(self, nplurals: usize, expression: &str) -> Self {
        self.header(
            "Plural-Forms",
            &format!("nplurals={nplurals}; plural={expression};"),
        )
    }

    /// Add a singular message.
    #[must_use]
    pub fn message(mut self, msgid: &str, msgstr: &str) -> Self {
        self.entries.insert(msgid.to_string(), msgstr.to_string());
        self
    }

    /// Add a message within a context.
    #[must_use]
    pub fn context(self, context: &str, msgid: &str, msgstr: &str) -> Self {
        self.message(&format!("{context}{CONTEXT_SEPARATOR}{msgid}"), msgstr)
    }

    /// Add a plural message with its translated forms.
    #[must_use]
    pub fn plural(mut self, singular: &str, plural: &str, forms: &[&str]) -> Self {
        self.entries.insert(
            format!("{singular}{PLURAL_SEPARATOR}{plural}"),
            forms.join(&PLURAL_SEPARATOR.to_string()),
        );
        self
    }

    /// Encode the catalog.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut entries = self.entries.clone();
        let header: String = self
            .headers
            .iter()
            .map(|(k, v)| format!("{k}: {v}\n"))
            .collect();
        entries.insert(String::new(), header);

        let count = entries.len();
        let originals = HEADER_LEN;
        let translations = originals + 8 * count;
        let mut data_offset = translations + 8 * count;
        let word = |v: usize| u32::try_from(v).unwrap_or(u32::MAX).to_le_bytes();

        let mut tables = Vec::with_capacity(16 * count);
        let mut data = Vec::new();
        let strings = entries
            .keys()
            .map(String::as_bytes)
            .chain(entries.values().map(String::as_bytes));
        for s in strings {
            tables.extend_from_slice(&word(s.len()));
            tables.extend_from_slice(&word(data_offset));
            data.extend_from_slice(s);
            data.push(0);
            data_offset += s.len() + 1;
        }

        let mut out = Vec::with_capacity(HEADER_LEN + tables.len() + data.len());
        out.extend_from_slice(&MAGIC.to_le_bytes());
        for v in [0, count, originals, translations, 0, translations + 8 * count] {
            out.extend_from_slice(&word(v));
        }
        out.extend_from_slice(&tables);
        out.extend_from_slice(&data);
        out
    }

    /// Write the catalog, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), LocaleError> {
        let io = |source| LocaleError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        fs::write(path, self.to_bytes()).map_err(io)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn polish() -> Catalog {
        let bytes = CatalogBuilder::new()
            .plural_forms(
                3,
                "(n==1 ? 0 : n%10>=2 && n%10<=4 && (n%100<10 || n%100>=20) ? 1 : 2)",
            )
            .message("hello", "witaj")
            .context("menu", "Open", "Otwórz")
            .plural("file", "files", &["plik", "pliki", "plików"])
            .to_bytes();
        Catalog::parse(&bytes, "pl.mo").unwrap()
    }

    #[test]
    fn singular_lookup() {
        let catalog = polish();
        assert_eq!(catalog.gettext("hello"), Some("witaj"));
        assert_eq!(catalog.gettext("bye"), None);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn plural_lookup_uses_header_rule() {
        let catalog = polish();
        assert_eq!(catalog.nplurals(), 3);
        assert_eq!(catalog.ngettext("file", 1), Some("plik"));
        assert_eq!(catalog.ngettext("file", 3), Some("pliki"));
        assert_eq!(catalog.ngettext("file", 5), Some("plików"));
        assert_eq!(catalog.ngettext("hello", 5), None);
    }

    #[test]
    fn context_lookup() {
        let catalog = polish();
        assert_eq!(catalog.pgettext("menu", "Open"), Some("Otwórz"));
        assert_eq!(catalog.gettext("Open"), None);
    }

    #[test]
    fn headers_are_exposed() {
        let catalog = polish();
        assert_eq!(
            catalog.header("Content-Type"),
            Some("text/plain; charset=UTF-8")
        );
    }

    #[test]
    fn big_endian_catalog() {
        let le = CatalogBuilder::new().message("a", "b").to_bytes();
        let be: Vec<u8> = le
            .get(..HEADER_LEN + 32)
            .unwrap()
            .chunks(4)
            .flat_map(|w| {
                let v = u32::from_le_bytes(w.try_into().unwrap());
                v.to_be_bytes()
            })
            .chain(le.get(HEADER_LEN + 32..).unwrap().iter().copied())
            .collect();
        let catalog = Catalog::parse(&be, "be.mo").unwrap();
        assert_eq!(catalog.gettext("a"), Some("b"));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Catalog::parse(b"not a catalog at all, really not", "x.mo"),
            Err(LocaleError::BadMagic { .. })
        ));
        assert!(matches!(
            Catalog::parse(&[], "x.mo"),
            Err(LocaleError::BadMagic { .. })
        ));
    }

    #[test]
    fn rejects_truncated_tables() {
        let bytes = CatalogBuilder::new().message("a", "b").to_bytes();
        let cut = bytes.get(..HEADER_LEN + 4).unwrap();
        assert!(matches!(
            Catalog::parse(cut, "x.mo"),
            Err(LocaleError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_future_revision() {
        let mut bytes = CatalogBuilder::new().to_bytes();
        bytes
            .get_mut(4..8)
            .unwrap()
            .copy_from_slice(&0x0002_0000_u32.to_le_bytes());
        assert!(matches!(
            Catalog::parse(&bytes, "x.mo"),
            Err(LocaleError::UnsupportedRevision { revision: 2, .. })
        ));
    }

    #[test]
    fn write_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("pl/LC_MESSAGES/tadek.mo");
        CatalogBuilder::new()
            .message("yes", "tak")
            .write(&path)
            .unwrap();
        assert_eq!(Catalog::load(&path).unwrap().gettext("yes"), Some("tak"));
    }
}
