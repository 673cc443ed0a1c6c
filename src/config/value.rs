//! Conversion of values to and from their raw configuration strings.
//!
//! Values are always stored as strings. Typed readers parse on demand and
//! return `None` when the string does not parse; callers layer their own
//! default on top.

/// Separator between list items.
///
/// Items are not escaped, so a comma can never be part of an item.
pub const LIST_SEPARATOR: char = ',';

/// A value that can be written to a configuration option.
pub trait ToConfigValue {
    /// The raw string stored on disk.
    fn to_config_value(&self) -> String;
}

impl ToConfigValue for str {
    fn to_config_value(&self) -> String {
        self.to_string()
    }
}

impl ToConfigValue for String {
    fn to_config_value(&self) -> String {
        self.clone()
    }
}

impl ToConfigValue for bool {
    fn to_config_value(&self) -> String {
        self.to_string()
    }
}

macro_rules! display_value {
    ($($ty:ty),+ $(,)?) => {
        $(impl ToConfigValue for $ty {
            fn to_config_value(&self) -> String {
                self.to_string()
            }
        })+
    };
}

display_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, char);

impl<T: ToConfigValue + ?Sized> ToConfigValue for &T {
    fn to_config_value(&self) -> String {
        (**self).to_config_value()
    }
}

impl<T: ToConfigValue> ToConfigValue for [T] {
    fn to_config_value(&self) -> String {
        join_list(self.iter().map(ToConfigValue::to_config_value))
    }
}

impl<T: ToConfigValue, const N: usize> ToConfigValue for [T; N] {
    fn to_config_value(&self) -> String {
        self.as_slice().to_config_value()
    }
}

impl<T: ToConfigValue> ToConfigValue for Vec<T> {
    fn to_config_value(&self) -> String {
        self.as_slice().to_config_value()
    }
}

/// Join already stringified items with [`LIST_SEPARATOR`].
pub fn join_list(items: impl IntoIterator<Item = String>) -> String {
    items
        .into_iter()
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

/// Parse an integer; surrounding whitespace is ignored.
///
/// ```
/// use tadek_core::config::value::parse_int;
///
/// assert_eq!(parse_int(" 8089 "), Some(8089));
/// assert_eq!(parse_int("80a"), None);
/// ```
#[must_use]
pub fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Parse a boolean the way INI files usually spell them.
///
/// ```
/// use tadek_core::config::value::parse_bool;
///
/// assert_eq!(parse_bool("Yes"), Some(true));
/// assert_eq!(parse_bool("off"), Some(false));
/// assert_eq!(parse_bool("maybe"), None);
/// ```
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Split a list value; the empty string is the empty list.
#[must_use]
pub fn parse_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(LIST_SEPARATOR).map(str::to_string).collect()
}
