//! A module implementing lexical analysis (tokenization) of a single input line.
//!
//! The shell has no grammar: a line is a flat sequence of words separated by
//! delimiter bytes. Quotes, backslashes and other metacharacters are ordinary
//! characters and end up inside the words unchanged.

/// Bytes that separate tokens: space, tab, carriage return, newline and alert (BEL).
pub const DELIMITERS: [char; 5] = [' ', '\t', '\r', '\n', '\x07'];

/// Returns `true` if `ch` separates two tokens.
pub fn is_delimiter(ch: char) -> bool {
    DELIMITERS.contains(&ch)
}

/// The main entry point function to perform lexical analysis.
///
/// Splits `line` on [`DELIMITERS`]. Runs of delimiters collapse into one, and
/// leading or trailing delimiters produce nothing, so every returned token is
/// non-empty. The tokens borrow from `line` and live as long as it does.
///
/// # Arguments
/// * `line` - The string to be tokenized.
///
/// # Returns
/// The tokens in the order they appear; empty for a blank line.
pub fn split_into_tokens(line: &str) -> Vec<&str> {
    line.split(is_delimiter)
        .filter(|token| !token.is_empty())
        .collect()
}
