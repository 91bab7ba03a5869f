//! Wildcard matching of component/package names.
//!
//! `*` matches any run of characters; everything else is literal. Matching is anchored
//! and case-insensitive, and a set of patterns is disjunctive.

use crate::notice::{Generated, Notice};
use regex::{Regex, RegexBuilder};

/// Fallback used when a pattern list ends up empty.
pub const DEFAULT_PACKAGE_PATTERN: &str = "*pkg*";

/// Anchored regex source for a wildcard pattern.
pub fn wildcard_to_regex(pattern: &str) -> String {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    format!("^{}$", body.join(".*"))
}

/// A compiled wildcard pattern.
#[derive(Clone, Debug)]
pub struct PackagePattern {
    source: String,
    re: Regex,
}

impl PackagePattern {
    pub fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let re = RegexBuilder::new(&wildcard_to_regex(pattern))
            .case_insensitive(true)
            .build()?;
        Ok(Self {
            source: pattern.to_string(),
            re,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn matches(&self, name: &str) -> bool {
        self.re.is_match(name)
    }
}

/// Whether `name` matches the wildcard `pattern`.
pub fn matches_package_pattern(name: &str, pattern: &str) -> bool {
    PackagePattern::compile(pattern).is_ok_and(|p| p.matches(name))
}

/// Whether `name` matches any of `patterns`.
pub fn matches_any_pattern<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    patterns
        .iter()
        .any(|p| matches_package_pattern(name, p.as_ref()))
}

/// Patterns compiled once for repeated matching.
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    patterns: Vec<PackagePattern>,
}

impl PatternSet {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| PackagePattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches_any(&self, name: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(name))
    }

    /// Names matched by any pattern, in input order.
    pub fn select<'a, S: AsRef<str>>(&self, names: &'a [S]) -> Vec<&'a str> {
        names
            .iter()
            .map(|n| n.as_ref())
            .filter(|n| self.matches_any(n))
            .collect()
    }
}

/// Impact targets: the component names matched by any pattern, in input order.
pub fn select_targets<S: AsRef<str>, P: AsRef<str>>(
    components: &[S],
    patterns: &[P],
) -> Vec<String> {
    match PatternSet::compile(patterns) {
        Ok(set) => set.select(components).into_iter().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

/// Trim patterns and drop blanks. An empty result falls back to
/// [`DEFAULT_PACKAGE_PATTERN`] with a validation notice.
pub fn normalize_patterns<S: AsRef<str>>(raw: &[S]) -> Generated<Vec<String>> {
    let cleaned: Vec<String> = raw
        .iter()
        .map(|p| p.as_ref().trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if cleaned.is_empty() {
        tracing::warn!("empty package pattern list, using default");
        return Generated::with_notices(
            vec![DEFAULT_PACKAGE_PATTERN.to_string()],
            vec![Notice::validation(
                "packagePatterns",
                format!("pattern list is empty; using `{DEFAULT_PACKAGE_PATTERN}`"),
            )],
        );
    }
    Generated::clean(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_examples() {
        assert!(matches_package_pattern("display_pkg_01", "*pkg*"));
        assert!(!matches_package_pattern("camera", "*pkg*"));
        assert!(matches_package_pattern("Camera01", "camera*"));
    }

    #[test]
    fn anchored_and_literal() {
        assert!(!matches_package_pattern("xcamera", "camera*"));
        assert!(matches_package_pattern("a.b", "a.b"));
        assert!(!matches_package_pattern("aXb", "a.b"));
        assert!(matches_package_pattern("pcb(main)", "pcb(*)"));
        assert!(matches_package_pattern("", "*"));
        assert_eq!(wildcard_to_regex("a*b"), "^a.*b$");
    }

    #[test]
    fn any_is_disjunctive() {
        let pats = ["*bat*", "lcd*"];
        assert!(matches_any_pattern("LCD_module", &pats));
        assert!(matches_any_pattern("main_battery", &pats));
        assert!(!matches_any_pattern("speaker", &pats));
        assert!(!matches_any_pattern::<&str>("speaker", &[]));
    }

    #[test]
    fn selects_targets_in_order() {
        let comps = ["frame", "display_pkg", "soc_pkg", "Battery"];
        assert_eq!(
            select_targets(&comps, &["*PKG", "bat*"]),
            vec!["display_pkg", "soc_pkg", "Battery"]
        );
    }

    #[test]
    fn blank_lists_fall_back() {
        let out = normalize_patterns(&["  ", ""]);
        assert_eq!(out.value, vec![DEFAULT_PACKAGE_PATTERN.to_string()]);
        assert_eq!(out.notices.len(), 1);
        let ok = normalize_patterns(&[" lcd* ", "*pkg*"]);
        assert!(ok.is_clean());
        assert_eq!(ok.value, vec!["lcd*", "*pkg*"]);
    }
}
