//! The attribute grammar, written out by hand.
//!
//! ```text
//! markup    := space* (parameter &(space | end) space*)* end
//! parameter := key space* '=' space* value
//! key       := [A-Za-z0-9_-]+
//! value     := '"' quoted('"') '"' | "'" quoted("'") "'" | variable
//! quoted(q) := ( [^q\\] | '\\' [^\n] )*
//! variable  := [A-Za-z0-9_.-]+
//! space     := [ \t\r\n\x0c\x0b]
//! ```

use winnow::{
    ModalResult, Parser as _,
    error::{ContextError, ErrMode},
    token::take_while,
};

use super::RawValue;

/// Scans the whole markup into `(key, value)` pairs, in order.
///
/// Returns `None` if any part of the markup falls outside the grammar.
pub(super) fn parameters(markup: &str) -> Option<Vec<(&str, RawValue<'_>)>> {
    let input: &mut &str = &mut &*markup;
    let mut pairs = Vec::new();

    // leading space is fine, and so is a markup that's nothing but space
    space.parse_next(input).ok()?;

    while !input.is_empty() {
        let pair = match parameter.parse_next(input) {
            Ok(p) => p,
            Err(_) => {
                log::debug!(
                    "Markup stopped matching at byte `{}`: `{input}`",
                    markup.len() - input.len()
                );
                return None;
            }
        };

        // each pair has to end at whitespace or at the end of the markup
        if input.chars().next().is_some_and(|c| !is_space(c)) {
            log::debug!("No whitespace after parameter `{}`: `{input}`", pair.0);
            return None;
        }

        space.parse_next(input).ok()?;
        pairs.push(pair);
    }

    Some(pairs)
}

/// One `key=value` pair.
fn parameter<'m>(input: &mut &'m str) -> ModalResult<(&'m str, RawValue<'m>)> {
    (key, space, '=', space, value)
        .map(|(key, (), _, (), value)| (key, value))
        .parse_next(input)
}

fn key<'m>(input: &mut &'m str) -> ModalResult<&'m str> {
    take_while(1.., is_key_char).parse_next(input)
}

fn value<'m>(input: &mut &'m str) -> ModalResult<RawValue<'m>> {
    match input.chars().next() {
        Some('"') => quoted(input, '"').map(RawValue::DoubleQuoted),
        Some('\'') => quoted(input, '\'').map(RawValue::SingleQuoted),
        _ => take_while(1.., is_variable_char)
            .map(RawValue::Variable)
            .parse_next(input),
    }
}

/// Takes a literal wrapped in `quote`, returning what's between the quotes.
///
/// A backslash escapes whatever single character follows it, except for a
/// newline. Escapes are left in the output.
fn quoted<'m>(input: &mut &'m str, quote: char) -> ModalResult<&'m str> {
    let Some(body) = input.strip_prefix(quote) else {
        return Err(ErrMode::Backtrack(ContextError::new()));
    };

    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if escaped {
            if c == '\n' {
                break;
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            *input = &body[idx + quote.len_utf8()..];
            return Ok(&body[..idx]);
        }
    }

    // ran off the end (or hit an escaped newline) without a closing quote
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn space(input: &mut &str) -> ModalResult<()> {
    take_while(0.., is_space).void().parse_next(input)
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | '\x0c' | '\x0b')
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_key_char(c: char) -> bool {
    is_word_char(c) || c == '-'
}

fn is_variable_char(c: char) -> bool {
    is_word_char(c) || c == '.' || c == '-'
}
