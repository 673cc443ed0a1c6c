//! Nested view of loaded suites keyed by dotted module path.
use std::collections::BTreeMap;

use super::registry::TestSuite;

/// One level of the suite tree.
///
/// `children` are keyed by the next module path segment; `suites` holds
/// the suites loaded from the module ending at this node.
#[derive(Debug, Default)]
pub struct SuiteTree {
    /// Sub-modules by segment.
    pub children: BTreeMap<String, SuiteTree>,
    /// Suites of the module at this node.
    pub suites: Vec<Box<dyn TestSuite>>,
}

impl SuiteTree {
    /// An empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Node at a dotted path, created on the way.
    pub fn node_mut(&mut self, dotted: &str) -> &mut Self {
        dotted
            .split('.')
            .fold(self, |node, segment| node.children.entry(segment.to_string()).or_default())
    }

    /// Node at a dotted path.
    #[must_use]
    pub fn get(&self, dotted: &str) -> Option<&Self> {
        dotted
            .split('.')
            .try_fold(self, |node, segment| node.children.get(segment))
    }

    /// Whether the tree holds no suites and no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty() && self.children.is_empty()
    }

    /// Total number of suites in the tree.
    #[must_use]
    pub fn count(&self) -> usize {
        self.suites.len() + self.children.values().map(Self::count).sum::<usize>()
    }

    /// Every suite with its module path, depth first in key order.
    #[must_use]
    pub fn flatten(self) -> Vec<(String, Box<dyn TestSuite>)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(self, path: &str, out: &mut Vec<(String, Box<dyn TestSuite>)>) {
        for suite in self.suites {
            out.push((path.to_string(), suite));
        }
        for (segment, child) in self.children {
            let child_path = if path.is_empty() {
                segment
            } else {
                format!("{path}.{segment}")
            };
            child.flatten_into(&child_path, out);
        }
    }

    /// Lines describing the tree, indented two spaces per level.
    #[must_use]
    pub fn outline(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.outline_into(0, &mut lines);
        lines
    }

    fn outline_into(&self, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        for suite in &self.suites {
            lines.push(format!("{indent}{} ({} cases)", suite.name(), suite.cases().len()));
        }
        for (segment, child) in &self.children {
            lines.push(format!("{indent}{segment}"));
            child.outline_into(depth + 1, lines);
        }
    }
}
