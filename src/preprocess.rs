//! Source-level preformatting applied before any lexing.
//!
//! The reader's scanning is whitespace-sensitive at line boundaries, so a
//! small fixed set of literal substitutions guarantees a space after
//! certain line-ending delimiters. The substitutions are exact find/replace
//! operations applied in order over the whole source string.

use lazy_static::lazy_static;
use regex::Regex;

/// Ordered literal substitutions. Each pattern is replaced everywhere
/// before the next one is considered.
const SUBSTITUTIONS: &[(&str, &str)] = &[
    ("]\n", "] \n"),
    ("}\n", "} \n"),
    ("$\n", "$ \n"),
    ("\\\\\n", "\\\\ \n"),
];

lazy_static! {
    static ref LINE_ENDINGS: Regex = Regex::new("\r\n?").unwrap();
    static ref TRAILING_TABS: Regex = Regex::new("[ \t]+\n").unwrap();
}

/// Normalize line endings and apply the literal substitution table.
pub fn preformat(source: &str) -> String {
    let mut text = LINE_ENDINGS.replace_all(source, "\n").into_owned();
    // Collapse trailing blanks first so the delimiter substitutions see the
    // delimiter directly against the newline.
    text = TRAILING_TABS.replace_all(&text, "\n").into_owned();
    for (find, replace) in SUBSTITUTIONS {
        text = text.replace(find, replace);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_is_normalized() {
        assert_eq!(preformat("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn line_ending_delimiters_gain_a_space() {
        assert_eq!(preformat("x$\ny"), "x$ \ny");
        assert_eq!(preformat("{a}\nb"), "{a} \nb");
        assert_eq!(preformat("[opt]\nb"), "[opt] \nb");
    }

    #[test]
    fn line_break_command_gains_a_space() {
        assert_eq!(preformat("a\\\\\nb"), "a\\\\ \nb");
    }

    #[test]
    fn substitutions_apply_in_order() {
        // "}\n" fires before "$\n" could see anything; order is stable
        assert_eq!(preformat("a}\n$\n"), "a} \n$ \n");
    }

    #[test]
    fn trailing_blanks_are_stripped_first() {
        assert_eq!(preformat("x$  \ny"), "x$ \ny");
    }
}
