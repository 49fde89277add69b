//! Output filters reproducing the device's pipe operators.

use std::fmt;

use log::debug;
use regex::{Regex, RegexBuilder};

/// Text returned by `find` when the pattern does not occur.
pub const PATTERN_NOT_FOUND: &str = "Pattern not found";

/// A pipe operator understood by the local pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Except,
    Match,
    Last,
    Trim,
    Count,
    Find,
}

impl FilterKind {
    /// The order filters are applied in, whatever order the command lists them.
    pub const CANONICAL_ORDER: [FilterKind; 6] = [
        FilterKind::Except,
        FilterKind::Match,
        FilterKind::Last,
        FilterKind::Trim,
        FilterKind::Count,
        FilterKind::Find,
    ];

    /// Look up an operator by its CLI keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "except" => Some(FilterKind::Except),
            "match" => Some(FilterKind::Match),
            "last" => Some(FilterKind::Last),
            "trim" => Some(FilterKind::Trim),
            "count" => Some(FilterKind::Count),
            "find" => Some(FilterKind::Find),
            _ => None,
        }
    }

    /// The CLI keyword for this operator.
    pub fn keyword(&self) -> &'static str {
        match self {
            FilterKind::Except => "except",
            FilterKind::Match => "match",
            FilterKind::Last => "last",
            FilterKind::Trim => "trim",
            FilterKind::Count => "count",
            FilterKind::Find => "find",
        }
    }

    /// Apply this filter to `text`. A missing argument behaves as `""`.
    pub fn apply(&self, text: &str, argument: Option<&str>) -> String {
        let argument = argument.unwrap_or_default();
        match self {
            FilterKind::Except => filter_lines(text, argument, false),
            FilterKind::Match => filter_lines(text, argument, true),
            FilterKind::Last => last(text, argument),
            FilterKind::Trim => trim(text, argument),
            FilterKind::Count => count(text),
            FilterKind::Find => find(text, argument),
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Compile `template` with `{}` replaced by `pattern`, case-insensitively.
///
/// Patterns that are not valid regexes are matched literally.
fn build_regex(template: &str, pattern: &str, whole_text: bool) -> Option<Regex> {
    let build = |p: &str| {
        RegexBuilder::new(&template.replace("{}", p))
            .case_insensitive(true)
            .multi_line(whole_text)
            .dot_matches_new_line(whole_text)
            .build()
    };

    build(pattern)
        .or_else(|e| {
            debug!("'{}' is not a valid regex ({}), matching literally", pattern, e);
            build(&regex::escape(pattern))
        })
        .ok()
}

/// Keep (`keep == true`) or drop lines matching `pattern` anywhere.
fn filter_lines(text: &str, pattern: &str, keep: bool) -> String {
    let Some(re) = build_regex("^.*({}).*$", pattern, false) else {
        return text.to_string();
    };
    text.lines()
        .filter(|line| re.is_match(line) == keep)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keep the final `n` lines. `0` keeps none; negative counts pass through.
fn last(text: &str, n: &str) -> String {
    let Ok(n) = n.parse::<usize>() else {
        return text.to_string();
    };
    let lines: Vec<&str> = text.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

/// Drop the first `n` characters of every line. Negative counts pass through.
fn trim(text: &str, n: &str) -> String {
    let Ok(n) = n.parse::<usize>() else {
        return text.to_string();
    };
    text.lines()
        .map(|line| line.chars().skip(n).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn count(text: &str) -> String {
    format!("Count: {} lines", text.lines().count())
}

/// Return `pattern` followed by everything after its first occurrence.
fn find(text: &str, pattern: &str) -> String {
    build_regex("({})", pattern, true)
        .and_then(|re| re.find(text))
        .map(|m| format!("{}{}", pattern, &text[m.end()..]))
        .unwrap_or_else(|| PATTERN_NOT_FOUND.to_string())
}
