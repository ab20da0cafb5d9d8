//! Identifier validation for generated code.
//!
//! Component and topology IDs become Python variable and function names in
//! the emitted script, so they must be valid identifiers.

use regex::Regex;
use std::sync::LazyLock;

static IDENT_PATTERN: LazyLock<Regex> = LazyLock::new(||
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier regex")
);

/// Check whether a string can be used as a variable name in the generated
/// script.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENT_PATTERN.is_match(name)
}
