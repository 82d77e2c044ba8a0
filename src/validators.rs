//! RFC 6749 Appendix A character-class predicates.
//!
//! Every predicate is anchored: it is `true` iff the entire input matches
//! the class. Empty input fails every class. Callers treat absent optional
//! parameters as "not tested".

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref NCHAR: Regex = Regex::new(r"^[-._0-9A-Za-z]+$").unwrap();
    static ref NQCHAR: Regex = Regex::new(r"^[\x21\x23-\x5B\x5D-\x7E]+$").unwrap();
    static ref NQSCHAR: Regex = Regex::new(r"^[\x20-\x21\x23-\x5B\x5D-\x7E]+$").unwrap();
    static ref UCHAR: Regex = Regex::new(
        r"^[\x09\x20-\x7E\x80-\x{D7FF}\x{E000}-\x{FFFD}\x{10000}-\x{10FFFF}]+$"
    )
    .unwrap();
    static ref URI: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+:").unwrap();
    static ref VSCHAR: Regex = Regex::new(r"^[\x20-\x7E]+$").unwrap();
}

/// NCHAR: ASCII letters, digits, `-`, `.` and `_`.
pub fn is_nchar(value: &str) -> bool {
    NCHAR.is_match(value)
}

/// NQCHAR: visible ASCII excluding `"` and `\`.
pub fn is_nqchar(value: &str) -> bool {
    NQCHAR.is_match(value)
}

/// NQSCHAR: NQCHAR plus the space character.
pub fn is_nqschar(value: &str) -> bool {
    NQSCHAR.is_match(value)
}

/// UNICODECHARNOCRLF: any Unicode code point except control characters
/// (tab allowed), surrogates and non-characters.
pub fn is_uchar(value: &str) -> bool {
    UCHAR.is_match(value)
}

/// URI scheme-prefix check only: `scheme ":"` with a valid scheme.
pub fn is_uri(value: &str) -> bool {
    URI.is_match(value)
}

/// VSCHAR: printable ASCII including space.
pub fn is_vschar(value: &str) -> bool {
    VSCHAR.is_match(value)
}
