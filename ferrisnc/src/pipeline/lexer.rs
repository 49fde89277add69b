//! Quote-aware splitting of command strings.
//!
//! Double-quoted spans are opaque: neither `|` nor whitespace inside them
//! splits anything. An unterminated quote runs to the end of the input.

/// Split a command into its `|`-delimited segments.
///
/// The first segment is the base command. Segments are returned as raw
/// slices of the input, quotes included.
pub fn split_segments(command: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (i, c) in command.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '|' if !quoted => {
                segments.push(&command[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&command[start..]);
    segments
}

/// Split a segment into whitespace-separated tokens.
///
/// Quoted spans become part of a single token with the quote characters
/// removed, so `match "ge-0/0/0 up"` yields `["match", "ge-0/0/0 up"]`.
pub fn tokenize(segment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in segment.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
