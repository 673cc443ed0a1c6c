//! INI documents: parsing, editing and serialization.
//!
//! Only the flat `[section]` / `key = value` dialect is supported. Values are
//! kept verbatim (no inline comment stripping). A value that would not
//! survive a plain line (surrounding whitespace, line breaks, or enclosing
//! double quotes) is written double-quoted with `\\`, `\"`, `\n`, `\r` and
//! `\t` escapes, so anything stored with [`IniDocument::set`] reads back
//! unchanged after a save and reload.
use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use crate::error::ConfigError;

/// A key-value section; entries keep their insertion order.
///
/// # Examples
///
/// ```
/// use tadek_core::config::ini::KvSection;
///
/// let mut section = KvSection::new("desktop");
/// section.set("address", "10.0.0.2");
/// assert_eq!(section.get("address"), Some("10.0.0.2"));
/// assert_eq!(section.keys().collect::<Vec<_>>(), ["address"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvSection {
    /// The raw section header (e.g., `"desktop"`).
    pub header: String,
    /// Key-value entries within this section.
    pub entries: Vec<(String, String)>,
}

impl KvSection {
    /// Create an empty section.
    #[must_use]
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            entries: Vec::new(),
        }
    }

    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Remove `key`; returns whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k != key);
        self.entries.len() != before
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// An ordered collection of [`KvSection`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<KvSection>,
}

impl IniDocument {
    /// Create an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sections: Vec::new(),
        }
    }

    /// Read and parse `path`; a missing file is an empty document.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse INI content; `file` only labels error messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use tadek_core::config::ini::IniDocument;
    ///
    /// let doc = IniDocument::parse("[desktop]\naddress = 10.0.0.2\nport: 8089\n", "<string>").unwrap();
    /// assert_eq!(doc.get("desktop", "address"), Some("10.0.0.2"));
    /// assert_eq!(doc.get("desktop", "port"), Some("8089"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A line is neither a header, a comment nor a `key = value` pair
    /// - An entry appears outside of a section header
    pub fn parse(content: &str, file: &str) -> Result<Self, ConfigError> {
        let mut doc = Self::new();
        let mut current: Option<String> = None;

        for (line_num, line) in content.lines().enumerate() {
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(header) = parse_raw_header(trimmed) {
                doc.ensure_section(&header);
                current = Some(header);
            } else if let Some(ref section) = current {
                let Some((key, value)) = parse_kv_line(trimmed) else {
                    return Err(ConfigError::InvalidSyntax {
                        file: file.to_string(),
                        line: line_num + 1,
                        message: format!("invalid key-value pair: {trimmed}"),
                    });
                };
                doc.set(section, &key, value);
            } else {
                return Err(ConfigError::InvalidSyntax {
                    file: file.to_string(),
                    line: line_num + 1,
                    message: format!("entry outside of section: {trimmed}"),
                });
            }
        }

        Ok(doc)
    }

    /// Serialize to INI text.
    #[must_use]
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            writeln!(out, "[{}]", section.header).ok();
            for (key, value) in &section.entries {
                writeln!(out, "{key} = {}", encode_value(value)).ok();
            }
        }
        out
    }

    /// Write the document to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(io_err)
    }

    /// Whether the document has no sections.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Sections in order.
    pub fn sections(&self) -> impl Iterator<Item = &KvSection> {
        self.sections.iter()
    }

    /// Section names in order.
    #[must_use]
    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.header.clone()).collect()
    }

    /// Look up a section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&KvSection> {
        self.sections.iter().find(|s| s.header == name)
    }

    /// Mutable lookup of a section by name.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut KvSection> {
        self.sections.iter_mut().find(|s| s.header == name)
    }

    /// Return the named section, appending an empty one if needed.
    #[allow(clippy::indexing_slicing)] // `pos` comes from the vector itself
    pub fn ensure_section(&mut self, name: &str) -> &mut KvSection {
        let pos = if let Some(pos) = self.sections.iter().position(|s| s.header == name) {
            pos
        } else {
            self.sections.push(KvSection::new(name));
            self.sections.len() - 1
        };
        &mut self.sections[pos]
    }

    /// Remove a whole section; returns whether it existed.
    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.header != name);
        self.sections.len() != before
    }

    /// Value of `option` in `section`.
    #[must_use]
    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.section(section)?.get(option)
    }

    /// Insert or overwrite `option` in `section`, creating the section.
    pub fn set(&mut self, section: &str, option: &str, value: impl Into<String>) {
        self.ensure_section(section).set(option, value);
    }

    /// Remove `option` from `section`; returns whether it existed.
    pub fn remove_option(&mut self, section: &str, option: &str) -> bool {
        self.section_mut(section)
            .is_some_and(|s| s.remove(option))
    }

    /// Overlay `other` onto `self`; entries of `other` win.
    pub fn merge(&mut self, other: &Self) {
        for section in &other.sections {
            let target = self.ensure_section(&section.header);
            for (key, value) in &section.entries {
                target.set(key, value.clone());
            }
        }
    }
}

/// Parse a `[header]` line preserving original case.
fn parse_raw_header(line: &str) -> Option<String> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

/// Parse a `key = value` or `key: value` line; the first delimiter wins.
///
/// # Examples
///
/// - `"port = 8089"` → `("port", "8089")`
/// - `"url: http://host"` → `("url", "http://host")`
fn parse_kv_line(line: &str) -> Option<(String, String)> {
    let idx = line.find(['=', ':'])?;
    let (key, value) = (line.get(..idx)?, line.get(idx + 1..)?);
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), decode_value(value.trim()).into_owned()))
}

fn needs_quotes(value: &str) -> bool {
    value != value.trim()
        || value.contains(['\n', '\r'])
        || (value.len() >= 2 && value.starts_with('"') && value.ends_with('"'))
}

/// Value as written after `key = `.
///
/// # Examples
///
/// - `plain` is written as is
/// - ` padded` becomes `" padded"`
/// - a line break becomes `\n` inside quotes
fn encode_value(value: &str) -> Cow<'_, str> {
    if !needs_quotes(value) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    Cow::Owned(out)
}

/// Inverse of [`encode_value`]; anything that is not a well-formed quoted
/// value (bad escape, bare inner quote) is taken verbatim.
fn decode_value(raw: &str) -> Cow<'_, str> {
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .filter(|_| raw.len() >= 2)
    else {
        return Cow::Borrowed(raw);
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {}
            '"' => return Cow::Borrowed(raw),
            c => {
                out.push(c);
                continue;
            }
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            _ => return Cow::Borrowed(raw),
        }
    }
    Cow::Owned(out)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Ok(String::new());
    }
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn parse_kv_simple() {
        let content = "[section]\nkey1 = value1\nkey2 = value2\n";
        let doc = IniDocument::parse(content, "t").expect("test data should parse");
        assert_eq!(doc.section_names(), ["section"]);
        assert_eq!(
            doc.section("section").expect("section should exist").entries,
            vec![
                ("key1".to_string(), "value1".to_string()),
                ("key2".to_string(), "value2".to_string()),
            ]
        );
    }

    #[test]
    fn parse_kv_with_equals_in_value() {
        let doc = IniDocument::parse("[section]\nkey = val=ue\n", "t").unwrap();
        assert_eq!(doc.get("section", "key"), Some("val=ue"));
    }

    #[test]
    fn parse_colon_delimiter() {
        let doc = IniDocument::parse("[s]\nurl: http://host:80\n", "t").unwrap();
        assert_eq!(doc.get("s", "url"), Some("http://host:80"));
    }

    #[test]
    fn parse_keeps_hash_inside_value() {
        let doc = IniDocument::parse("[s]\nkey = value # not a comment\n", "t").unwrap();
        assert_eq!(doc.get("s", "key"), Some("value # not a comment"));
    }

    #[test]
    fn parse_comments_and_blank_lines_ignored() {
        let doc = IniDocument::parse("# top\n\n[s]\n; note\nk = v\n\n", "t").unwrap();
        assert_eq!(doc.get("s", "k"), Some("v"));
        assert_eq!(doc.section("s").unwrap().entries.len(), 1);
    }

    #[test]
    fn parse_preserves_header_case() {
        let doc = IniDocument::parse("[Desktop]\nk = v\n", "t").unwrap();
        assert_eq!(doc.section_names(), ["Desktop"]);
    }

    #[test]
    fn parse_duplicate_sections_merge() {
        let doc = IniDocument::parse("[s]\na = 1\n[t]\n[s]\nb = 2\na = 3\n", "t").unwrap();
        assert_eq!(doc.section_names(), ["s", "t"]);
        assert_eq!(doc.get("s", "a"), Some("3"));
        assert_eq!(doc.get("s", "b"), Some("2"));
    }

    #[test]
    fn parse_empty_value() {
        let doc = IniDocument::parse("[s]\nk =\n", "t").unwrap();
        assert_eq!(doc.get("s", "k"), Some(""));
    }

    #[test]
    fn parse_entry_outside_section_fails() {
        let err = IniDocument::parse("orphan = 1\n", "foo.conf").unwrap_err();
        assert!(err.to_string().contains("foo.conf"));
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn parse_line_without_delimiter_fails() {
        assert!(IniDocument::parse("[s]\njust words\n", "t").is_err());
    }

    #[test]
    fn serialize_then_parse_is_stable() {
        let mut doc = IniDocument::new();
        doc.set("b", "x", "1");
        doc.set("a", "y", "two words");
        doc.ensure_section("empty");
        let text = doc.to_ini_string();
        assert_eq!(text, "[b]\nx = 1\n\n[a]\ny = two words\n\n[empty]\n");
        assert_eq!(IniDocument::parse(&text, "t").unwrap(), doc);
    }

    #[test]
    fn multiline_value_keeps_following_options() {
        let mut doc = IniDocument::new();
        doc.set("s", "k", "line one\nline two");
        doc.set("s", "other", "keep");
        let text = doc.to_ini_string();
        assert_eq!(text, "[s]\nk = \"line one\\nline two\"\nother = keep\n");
        let back = IniDocument::parse(&text, "t").unwrap();
        assert_eq!(back.get("s", "k"), Some("line one\nline two"));
        assert_eq!(back.get("s", "other"), Some("keep"));
    }

    #[test]
    fn quoted_values_survive_serialization() {
        let values = [
            "  padded  ",
            "\"quoted\"",
            "\"",
            "back\\slash\r\n",
            "\ttab",
            "\"a\\q\"",
        ];
        let mut doc = IniDocument::new();
        for (i, value) in values.iter().enumerate() {
            doc.set("s", &format!("k{i}"), *value);
        }
        let back = IniDocument::parse(&doc.to_ini_string(), "t").unwrap();
        for (i, value) in values.iter().enumerate() {
            assert_eq!(back.get("s", &format!("k{i}")), Some(*value), "value {value:?}");
        }
    }

    #[test]
    fn hand_written_quotes_are_lenient() {
        let doc = IniDocument::parse(
            "[s]\na = \"x y\"\nb = \"bad \\q\"\nc = \"x\" and \"y\"\nd = say \"hi\"\n",
            "t",
        )
        .unwrap();
        assert_eq!(doc.get("s", "a"), Some("x y"));
        assert_eq!(doc.get("s", "b"), Some("\"bad \\q\""));
        assert_eq!(doc.get("s", "c"), Some("\"x\" and \"y\""));
        assert_eq!(doc.get("s", "d"), Some("say \"hi\""));
    }

    #[test]
    fn remove_option_and_section() {
        let mut doc = IniDocument::parse("[s]\na = 1\nb = 2\n", "t").unwrap();
        assert!(doc.remove_option("s", "a"));
        assert!(!doc.remove_option("s", "a"));
        assert!(!doc.remove_option("missing", "a"));
        assert_eq!(doc.get("s", "b"), Some("2"));
        assert!(doc.remove_section("s"));
        assert!(doc.is_empty());
    }

    #[test]
    fn merge_overlays_entries() {
        let mut base = IniDocument::parse("[s]\na = 1\nb = 2\n", "t").unwrap();
        let over = IniDocument::parse("[s]\nb = 20\n[t]\nc = 3\n", "t").unwrap();
        base.merge(&over);
        assert_eq!(base.get("s", "a"), Some("1"));
        assert_eq!(base.get("s", "b"), Some("20"));
        assert_eq!(base.get("t", "c"), Some("3"));
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = IniDocument::load(&dir.path().join("none.conf")).unwrap();
        assert!(doc.is_empty());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/c.conf");
        let mut doc = IniDocument::new();
        doc.set("s", "k", "v");
        doc.save(&path).unwrap();
        assert_eq!(IniDocument::load(&path).unwrap(), doc);
    }
}
