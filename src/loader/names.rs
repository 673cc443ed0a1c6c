//! Normalization of dotted test names.
use crate::packages::is_within;

/// Clean up requested test names.
///
/// Whitespace and surrounding dots are stripped and empty names dropped.
/// A name already covered by another one (equal, or below it in the dotted
/// hierarchy) is dropped; first occurrences keep their order.
///
/// ```
/// use tadek_core::loader::normalize_names;
///
/// let names = normalize_names(&[" a.b ", "a", ".c.", "", "a.b.c", "c"]);
/// assert_eq!(names, ["a", "c"]);
/// ```
#[must_use]
pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let cleaned: Vec<&str> = names
        .iter()
        .map(|n| n.as_ref().trim().trim_matches('.'))
        .filter(|n| !n.is_empty())
        .collect();

    let mut kept: Vec<String> = Vec::new();
    for name in &cleaned {
        let covered = cleaned
            .iter()
            .any(|other| other != name && is_within(name, other));
        if !covered && !kept.iter().any(|k| k == name) {
            kept.push((*name).to_string());
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_whitespace_and_dots() {
        assert_eq!(normalize_names(&["  pkg.mdl  ", "..x.."]), ["pkg.mdl", "x"]);
    }

    #[test]
    fn drops_empty_names() {
        let names: [&str; 3] = ["", "   ", "..."];
        assert!(normalize_names(&names).is_empty());
    }

    #[test]
    fn shorter_prefix_wins() {
        assert_eq!(
            normalize_names(&["pkg.mdl.Suite", "pkg.mdl", "pkg.other"]),
            ["pkg.mdl", "pkg.other"]
        );
    }

    #[test]
    fn prefix_must_end_at_a_dot() {
        assert_eq!(normalize_names(&["pkg", "pkg2"]), ["pkg", "pkg2"]);
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(normalize_names(&["a.b", " a.b", "a.b."]), ["a.b"]);
    }

    #[test]
    fn accepts_owned_strings() {
        let names = vec![String::from("x"), String::from("x.y")];
        assert_eq!(normalize_names(&names), ["x"]);
    }
}
