//! Local emulation of CLI output piping.
//!
//! The RPC interface only renders a single command; it does not honour
//! `| match ... | count` chains. This module parses the pipe segments of a
//! command and applies them to the text the device returned, producing what
//! the interactive CLI would have shown.
//!
//! Filters always run in [`FilterKind::CANONICAL_ORDER`], not in the order
//! they were written, so `| count | match x` and `| match x | count` agree.
//!
//! # Example
//!
//! ```rust
//! use ferrisnc::pipeline::Pipeline;
//!
//! let output = "ge-0/0/0 up\nge-0/0/1 down\nlo0 up";
//! let pipeline = Pipeline::parse("show interfaces terse | count | match up");
//! assert_eq!(pipeline.apply(output), "Count: 2 lines");
//! ```

mod filter;
mod lexer;

pub use filter::{FilterKind, PATTERN_NOT_FOUND};
pub use lexer::{split_segments, tokenize};

use std::collections::HashMap;

use log::trace;

/// The filter chain requested by a command.
///
/// Each operator appears at most once; when a command repeats one, the last
/// occurrence's argument wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    operations: HashMap<FilterKind, Option<String>>,
}

impl Pipeline {
    /// Parse the pipe segments of `command`.
    ///
    /// Segments whose first token is not a known operator (such as
    /// `display xml` or `no-more`) are ignored. Only the first token after
    /// the operator is kept as its argument.
    pub fn parse(command: &str) -> Self {
        let mut operations = HashMap::new();

        for segment in split_segments(command).into_iter().skip(1) {
            let mut tokens = tokenize(segment).into_iter();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            match FilterKind::from_keyword(&keyword) {
                Some(kind) => {
                    operations.insert(kind, tokens.next());
                }
                None => trace!("ignoring pipe segment '{}'", segment.trim()),
            }
        }

        Self { operations }
    }

    /// Whether the command requested no filtering at all.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether the given operator was requested.
    pub fn contains(&self, kind: FilterKind) -> bool {
        self.operations.contains_key(&kind)
    }

    /// The argument given to an operator; `None` if the operator is absent.
    pub fn argument(&self, kind: FilterKind) -> Option<Option<&str>> {
        self.operations.get(&kind).map(Option::as_deref)
    }

    /// Requested operators with their arguments, in application order.
    pub fn operations(&self) -> impl Iterator<Item = (FilterKind, Option<&str>)> + '_ {
        FilterKind::CANONICAL_ORDER
            .into_iter()
            .filter_map(|kind| self.argument(kind).map(|arg| (kind, arg)))
    }

    /// Run the filter chain over `text`.
    ///
    /// Empty input is returned untouched without running any filter.
    pub fn apply(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        let mut output = text.to_string();
        for (kind, argument) in self.operations() {
            output = kind.apply(&output, argument);
        }
        output
    }
}

/// Parse `command` and apply its filters to `text`.
pub fn process(command: &str, text: &str) -> String {
    Pipeline::parse(command).apply(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
Interface               Admin Link Proto    Local
ge-0/0/0                up    up
ge-0/0/0.0              up    up   inet     10.0.0.1/30
ge-0/0/1                up    down
ge-0/0/1.0              up    down inet     10.0.1.1/30
lo0                     up    up
lo0.0                   up    up   inet     192.0.2.1/32";

    #[test]
    fn test_no_pipe_is_identity() {
        for command in ["show interfaces terse", "show version detail", ""] {
            assert_eq!(process(command, OUTPUT), OUTPUT);
        }
        assert!(Pipeline::parse("show interfaces terse").is_empty());
    }

    #[test]
    fn test_unknown_segments_are_identity() {
        assert_eq!(process("show interfaces | display xml | no-more", OUTPUT), OUTPUT);
    }

    #[test]
    fn test_count_whole_output() {
        assert_eq!(process("show interfaces terse | count", OUTPUT), "Count: 7 lines");
    }

    #[test]
    fn test_canonical_order_invariant() {
        let a = process("show interfaces terse | match inet | count", OUTPUT);
        let b = process("show interfaces terse | count | match inet", OUTPUT);
        assert_eq!(a, "Count: 3 lines");
        assert_eq!(a, b);

        let c = process("show interfaces terse | last 2 | except down", OUTPUT);
        let d = process("show interfaces terse | except down | last 2", OUTPUT);
        assert_eq!(c, d);
        assert_eq!(c, "lo0                     up    up\nlo0.0                   up    up   inet     192.0.2.1/32");
    }

    #[test]
    fn test_last_occurrence_wins() {
        let pipeline = Pipeline::parse("show x | match ge- | match lo0");
        assert_eq!(pipeline.argument(FilterKind::Match), Some(Some("lo0")));
        assert_eq!(
            pipeline.apply(OUTPUT),
            "lo0                     up    up\nlo0.0                   up    up   inet     192.0.2.1/32"
        );
    }

    #[test]
    fn test_quoted_argument() {
        let pipeline = Pipeline::parse(r#"show interfaces terse | match "up    down""#);
        assert_eq!(pipeline.argument(FilterKind::Match), Some(Some("up    down")));
        assert_eq!(
            pipeline.apply(OUTPUT),
            "ge-0/0/1                up    down\nge-0/0/1.0              up    down inet     10.0.1.1/30"
        );
    }

    #[test]
    fn test_quoted_pipe_is_not_a_segment() {
        let pipeline = Pipeline::parse(r#"show log messages | match "ge-|lo0" | count"#);
        assert_eq!(pipeline.argument(FilterKind::Match), Some(Some("ge-|lo0")));
        assert!(pipeline.contains(FilterKind::Count));
        assert_eq!(pipeline.apply(OUTPUT), "Count: 6 lines");
    }

    #[test]
    fn test_only_first_argument_token_is_kept() {
        let pipeline = Pipeline::parse("show x | match up down");
        assert_eq!(pipeline.argument(FilterKind::Match), Some(Some("up")));
    }

    #[test]
    fn test_operator_without_argument() {
        let pipeline = Pipeline::parse("show x | count | trim");
        assert_eq!(pipeline.argument(FilterKind::Count), Some(None));
        assert_eq!(pipeline.argument(FilterKind::Trim), Some(None));
        assert_eq!(pipeline.argument(FilterKind::Last), None);
    }

    #[test]
    fn test_empty_segments_skipped() {
        let pipeline = Pipeline::parse("show x || count |");
        assert_eq!(pipeline.operations().count(), 1);
    }

    #[test]
    fn test_empty_text_short_circuits() {
        assert_eq!(process("show x | count", ""), "");
        assert_eq!(process("show x | find foo", ""), "");
    }

    #[test]
    fn test_operations_in_canonical_order() {
        let pipeline = Pipeline::parse("show x | find a | count | trim 2 | last 3 | match b | except c");
        let kinds: Vec<FilterKind> = pipeline.operations().map(|(k, _)| k).collect();
        assert_eq!(kinds, FilterKind::CANONICAL_ORDER.to_vec());
    }

    #[test]
    fn test_trim_then_find() {
        let out = process("show interfaces terse | match lo0 | trim 24 | find up", OUTPUT);
        assert_eq!(out, "up    up\nup    up   inet     192.0.2.1/32");
    }

    #[test]
    fn test_find_round_trip() {
        let out = process("show interfaces terse | find \"ge-0/0/1\"", OUTPUT);
        assert_eq!(out.find("ge-0/0/1"), Some(0));
    }
}
