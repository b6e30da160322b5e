//! Translation of the supported regular-expression subset to LIKE patterns.
//!
//! Only `.` (any character) and the `^`/`$` anchors are representable. The
//! produced pattern uses `\` as its escape character.

use thiserror::Error;

const UNSUPPORTED: &[char] = &['\\', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '^'];

/// Pattern uses a construct LIKE cannot express.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// A metacharacter outside the supported subset.
    #[error("regex '{pattern}' uses unsupported symbol '{symbol}'")]
    Unsupported {
        /// Offending pattern.
        pattern: String,
        /// First unsupported character.
        symbol: char,
    },
}

/// Translates `pattern` into an equivalent LIKE pattern.
///
/// Unanchored ends match anything (`abc` becomes `%abc%`); anchors are
/// dropped (`^abc$` becomes `abc`).
pub fn translate(pattern: &str) -> Result<String, RegexError> {
    let (body, anchored_start) = match pattern.strip_prefix('^') {
        Some(rest) => (rest, true),
        None => (pattern, false),
    };
    let (body, anchored_end) = match body.strip_suffix('$') {
        Some(rest) => (rest, true),
        None => (body, false),
    };

    let mut out = String::with_capacity(body.len() + 2);
    if !anchored_start {
        out.push('%');
    }
    for ch in body.chars() {
        match ch {
            '_' => out.push_str("\\_"),
            '%' => out.push_str("\\%"),
            '.' => out.push('_'),
            '$' => out.push_str("\\$"),
            c if UNSUPPORTED.contains(&c) => {
                return Err(RegexError::Unsupported {
                    pattern: pattern.to_owned(),
                    symbol: c,
                })
            }
            c => out.push(c),
        }
    }
    if !anchored_end {
        out.push('%');
    }
    Ok(out)
}
