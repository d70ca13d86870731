//! `{name}` tokens and `{! comments !}`.
use std::borrow::Cow;
use std::fmt::Write;

use crate::model::Model;
use crate::scanner::buffer::{Buffer, INERT_CLOSE, INERT_OPEN};
use crate::scanner::lookup;
use crate::scanner::matcher::skip_inert;
use crate::state::State;
use crate::utils::{HtmlEscape, UndefinedBehavior};
use crate::value::Value;

/// What the resolver did at a `{`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// A server side comment was dropped.
    Comment,
    /// A token was replaced (or left alone because it did not resolve).
    Token,
    /// The brace does not start a token and was emitted as text.
    Literal,
}

/// A parsed `{name|s|p}` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub name: String,
    /// `|s`: do not escape.
    pub safe: bool,
    /// `|p`: never scan the value again.
    pub inert: bool,
    /// Length of the token including braces.
    pub len: usize,
}

#[cfg(feature = "unicode")]
fn is_name_char(c: char) -> bool {
    matches!(c, '.' | '$' | '-') || unicode_ident::is_xid_continue(c)
}

#[cfg(not(feature = "unicode"))]
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '$' | '-')
}

/// Parses the token starting at `offset`.
pub(crate) fn parse_token(buf: &Buffer, offset: usize) -> Option<Token> {
    if buf.peek_at(offset) != Some('{') {
        return None;
    }
    let mut idx = offset + 1;
    let mut name = String::new();
    while let Some(c) = buf.peek_at(idx).filter(|&c| is_name_char(c)) {
        name.push(c);
        idx += 1;
    }
    if name.is_empty() {
        return None;
    }
    let mut safe = false;
    let mut inert = false;
    while buf.peek_at(idx) == Some('|') {
        match some!(buf.peek_at(idx + 1)) {
            's' => safe = true,
            'p' => inert = true,
            _ => return None,
        }
        idx += 2;
    }
    if buf.peek_at(idx) != Some('}') {
        return None;
    }
    Some(Token {
        name,
        safe,
        inert,
        len: idx + 1 - offset,
    })
}

/// Returns the length of the (nestable) comment starting at `offset`.
pub(crate) fn comment_len(buf: &Buffer, offset: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = offset;
    loop {
        if buf.starts_with_at(idx, "{!") {
            depth += 1;
            idx += 2;
        } else if buf.starts_with_at(idx, "!}") {
            depth -= 1;
            idx += 2;
            if depth == 0 {
                return Some(idx - offset);
            }
        } else {
            some!(buf.peek_at(idx));
            idx += 1;
        }
    }
}

/// Resolves the token or comment at the start of the buffer.
///
/// With `raw` set values are never escaped, which is what attribute values
/// of directives need.
pub(crate) fn resolve(
    state: &State<'_, '_>,
    buf: &mut Buffer,
    model: &Model<'_>,
    out: &mut String,
    raw: bool,
) -> Outcome {
    if buf.peek_at(1) == Some('!') {
        if let Some(len) = comment_len(buf, 0) {
            buf.skip(len);
            return Outcome::Comment;
        }
    }

    let Some(token) = parse_token(buf, 0) else {
        buf.pop();
        out.push('{');
        return Outcome::Literal;
    };

    match lookup(state, model, &token.name) {
        Some(value) => {
            buf.skip(token.len);
            write_value(state, model, &token, &value, raw, out);
        }
        None => {
            match state.env.undefined_behavior() {
                UndefinedBehavior::Display => out.push_str(&buf.slice(0, token.len)),
                UndefinedBehavior::Hide => {}
            }
            buf.skip(token.len);
        }
    }
    Outcome::Token
}

fn write_value(
    state: &State<'_, '_>,
    model: &Model<'_>,
    token: &Token,
    value: &Value,
    raw: bool,
    out: &mut String,
) {
    let text = match value.as_str() {
        Some(s) if s.contains('{') => {
            let mut chain = vec![token.name.clone()];
            Cow::Owned(expand(state, model, s, &mut chain))
        }
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(value.to_string()),
    };
    if token.inert {
        out.push(INERT_OPEN);
    }
    if raw || token.safe || value.is_safe() {
        out.push_str(&text);
    } else {
        write!(out, "{}", HtmlEscape(&text)).ok();
    }
    if token.inert {
        out.push(INERT_CLOSE);
    }
}

/// Resolves tokens inside of a value.
///
/// Nested values are inserted unescaped, the escaping of the outer token
/// applies to the whole result.  Names already being resolved are left
/// alone and marked inert, so self referencing values reach a fixed point
/// instead of growing with every pass.
fn expand(state: &State<'_, '_>, model: &Model<'_>, text: &str, chain: &mut Vec<String>) -> String {
    let mut buf = Buffer::new(text);
    let mut rv = String::with_capacity(text.len());
    while let Some(c) = buf.peek() {
        if c == INERT_OPEN {
            let end = skip_inert(&buf, 0);
            rv.push_str(&buf.take(end));
            continue;
        }
        if c != '{' {
            rv.push(c);
            buf.pop();
            continue;
        }
        let token = parse_token(&buf, 0);
        if let Some(token) = token.as_ref().filter(|token| chain.contains(&token.name)) {
            rv.push(INERT_OPEN);
            rv.push_str(&buf.take(token.len));
            rv.push(INERT_CLOSE);
            continue;
        }
        let resolved =
            token.and_then(|token| lookup(state, model, &token.name).map(|value| (token, value)));
        match resolved {
            Some((token, value)) => {
                buf.skip(token.len);
                match value.as_str() {
                    Some(s) if s.contains('{') => {
                        chain.push(token.name);
                        rv.push_str(&expand(state, model, s, chain));
                        chain.pop();
                    }
                    Some(s) => rv.push_str(s),
                    None => {
                        write!(rv, "{}", value).ok();
                    }
                }
            }
            None => {
                rv.push('{');
                buf.pop();
            }
        }
    }
    rv
}

/// Resolves only the tokens of a text, copying everything else.
///
/// This is used for loop bodies without directives and for the attributes
/// of rewritten tags.
pub(crate) fn substitute(state: &State<'_, '_>, text: &str, model: &Model<'_>, raw: bool) -> String {
    if !text.contains('{') {
        return text.to_string();
    }
    let mut buf = Buffer::new(text);
    let mut out = String::with_capacity(text.len());
    while let Some(c) = buf.peek() {
        match c {
            '{' => {
                resolve(state, &mut buf, model, &mut out, raw);
            }
            INERT_OPEN => {
                let end = skip_inert(&buf, 0);
                out.push_str(&buf.take(end));
            }
            c => {
                out.push(c);
                buf.pop();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_parse_token() {
        let token = parse_token(&Buffer::new("{user.name|s|p}!"), 0).unwrap();
        assert_eq!(token.name, "user.name");
        assert!(token.safe);
        assert!(token.inert);
        assert_eq!(token.len, 15);

        assert_eq!(parse_token(&Buffer::new("{ color: red }"), 0), None);
        assert_eq!(parse_token(&Buffer::new("{}"), 0), None);
        assert_eq!(parse_token(&Buffer::new("{x|q}"), 0), None);
        assert_eq!(parse_token(&Buffer::new("{x"), 0), None);
    }

    #[test]
    fn test_comment_len() {
        assert_eq!(comment_len(&Buffer::new("{! a !}b"), 0), Some(7));
        assert_eq!(comment_len(&Buffer::new("{! a {! b !} c !}d"), 0), Some(17));
        assert_eq!(comment_len(&Buffer::new("{! never closed"), 0), None);
    }
}
