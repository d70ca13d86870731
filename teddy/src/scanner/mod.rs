//! The directive scanner.
//!
//! Templates are never parsed into a tree.  Instead the scanner walks the
//! text from the front, resolves every directive it meets against the model
//! and either appends the result to the output or splices it back into the
//! buffer so it is scanned next.  A render repeats this until the text no
//! longer changes.
use std::borrow::Cow;

use crate::environment::Environment;
use crate::error::Error;
use crate::model::Model;
use crate::state::State;
use crate::value::Value;

use self::buffer::{Buffer, INERT_CLOSE, INERT_OPEN};
use self::matcher::{find_close, skip_inert, Directive};
use self::signatures::{Signature, ARG_CLOSE, ARG_OPEN, NOTEDDY_CLOSE, NOTEDDY_OPEN};
use self::variable::Outcome;

mod attrs;
mod buffer;
mod conditional;
mod include;
mod loops;
mod matcher;
mod oneline;
mod signatures;
mod variable;

pub(crate) use self::buffer::is_space;

#[cfg(feature = "stacker")]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(64 * 1024, 1024 * 1024, f)
}

#[cfg(not(feature = "stacker"))]
#[inline(always)]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Looks up a dotted path, falling back to enclosing loop iterations.
pub(crate) fn lookup(state: &State<'_, '_>, model: &Model<'_>, path: &str) -> Option<Value> {
    model
        .lookup(path)
        .or_else(|| state.contexts.resolve(path, model))
}

/// Renders a template source to a fixed point.
pub(crate) fn render(env: &Environment<'_>, source: &str, root: Value) -> Result<String, Error> {
    let mut state = State::new(env);
    let model = Model::new(root);
    let mut current = Cow::Borrowed(source);
    let mut passes = 0u32;
    loop {
        let next = ok!(scan(&mut state, &current, &model));
        passes += 1;
        if next == *current {
            break;
        }
        ok!(state.budget.consume());
        current = Cow::Owned(next);
    }
    diag_debug!(
        env,
        passes,
        budget_used = state.budget.used(),
        "render reached a fixed point"
    );
    Ok(strip_inert(&current))
}

/// Removes the markers that keep text from being scanned again.
pub(crate) fn strip_inert(text: &str) -> String {
    if text.contains([INERT_OPEN, INERT_CLOSE]) {
        text.chars()
            .filter(|&c| c != INERT_OPEN && c != INERT_CLOSE)
            .collect()
    } else {
        text.to_string()
    }
}

/// Scans a text once and returns the output.
pub(crate) fn scan(state: &mut State<'_, '_>, text: &str, model: &Model<'_>) -> Result<String, Error> {
    ensure_sufficient_stack(|| scan_text(state, text, model))
}

fn scan_text(state: &mut State<'_, '_>, text: &str, model: &Model<'_>) -> Result<String, Error> {
    let mut buf = Buffer::new(text);
    let mut out = String::with_capacity(text.len());
    // a directive or comment was just resolved
    let mut boundary = false;

    while let Some(c) = buf.peek() {
        ok!(state.budget.check());
        if buf.is_mark_at(0) {
            boundary = true;
        }
        match c {
            INERT_OPEN => {
                let end = skip_inert(&buf, 0);
                out.push_str(&buf.take(end));
                boundary = false;
            }
            '{' => {
                boundary = match variable::resolve(state, &mut buf, model, &mut out, false) {
                    Outcome::Comment => true,
                    Outcome::Token | Outcome::Literal => false,
                };
            }
            '<' => match matcher::classify(&buf, 0) {
                Some(directive) => {
                    if ok!(dispatch(state, &mut buf, model, &mut out, directive)) {
                        out.push_str(&buf.drain());
                        break;
                    }
                    boundary = true;
                }
                None => {
                    buf.pop();
                    out.push('<');
                    boundary = false;
                }
            },
            c if is_space(c) => {
                let run = buf.space_run(0);
                if run >= 2 && (boundary || out.ends_with('>') || next_is_boundary(&buf, run)) {
                    let newline = (0..run).any(|idx| buf.peek_at(idx) == Some('\n'));
                    out.push(if newline { '\n' } else { ' ' });
                    buf.skip(run);
                } else {
                    out.push_str(&buf.take(run));
                }
                boundary = false;
            }
            c => {
                buf.pop();
                out.push(c);
                boundary = false;
            }
        }
    }

    Ok(out)
}

fn next_is_boundary(buf: &Buffer, offset: usize) -> bool {
    buf.peek_at(offset) == Some('<') || buf.starts_with_at(offset, "{!") || buf.is_mark_at(offset)
}

/// Resolves one directive.  Returns `true` if the scan may end early.
fn dispatch(
    state: &mut State<'_, '_>,
    buf: &mut Buffer,
    model: &Model<'_>,
    out: &mut String,
    directive: Directive,
) -> Result<bool, Error> {
    match directive {
        Directive::Conditional(kind) => conditional::resolve(state, buf, model, kind),
        Directive::Loop => return loops::resolve(state, buf, model, out),
        Directive::Include => ok!(include::resolve(state, buf, model)),
        Directive::OneLine => oneline::resolve(state, buf, model, out),
        Directive::NoTeddy => {
            let open = NOTEDDY_OPEN.len();
            match find_close(buf, open, &NOTEDDY_OPEN, &NOTEDDY_CLOSE) {
                Some(close) => {
                    out.push(INERT_OPEN);
                    out.push_str(&buf.slice(open, close));
                    out.push(INERT_CLOSE);
                    buf.skip(close + NOTEDDY_CLOSE.len());
                }
                None => buf.skip(open),
            }
        }
        Directive::OrphanBranch(kind) => drop_orphan(state, buf, kind.open(), kind.close()),
        Directive::OrphanArg => drop_orphan(state, buf, &ARG_OPEN, &ARG_CLOSE),
        Directive::Stray(len) => {
            diag_info!(state.env, tag = %buf.slice(0, len), "dropping stray directive tag");
            buf.skip(len);
        }
    }
    Ok(false)
}

/// Drops a sibling or argument that has no directive to belong to.
fn drop_orphan(state: &State<'_, '_>, buf: &mut Buffer, open: &Signature, close: &Signature) {
    let open_len = attrs::tag_end(buf, 0).map_or(open.len(), |x| x + 1);
    diag_info!(state.env, tag = %buf.slice(0, open_len), "dropping orphaned tag");
    match find_close(buf, open_len, open, close) {
        Some(close_at) => buf.skip(close_at + close.len()),
        None => buf.skip(open_len),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context;
    use similar_asserts::assert_eq;

    fn render_with(source: &str, ctx: Value) -> String {
        render(&Environment::new(), source, ctx).unwrap()
    }

    #[test]
    fn test_identity() {
        let source = "<html><body class=\"x\"><p>Hello  World</p></body></html>";
        assert_eq!(render_with(source, context!()), source);
    }

    #[test]
    fn test_whitespace_collapsing() {
        assert_eq!(render_with("<p>\n    <b>x</b>  y</p>", context!()), "<p>\n<b>x</b> y</p>");
        assert_eq!(render_with("a  b", context!()), "a  b");
        assert_eq!(render_with("a {! note !}   b", context!()), "a  b");
        assert_eq!(
            render_with("<if x>a</if>   \n  b", context!(x => true)),
            "a\nb"
        );
    }

    #[test]
    fn test_inert_content() {
        assert_eq!(
            render_with("<noteddy><if x>{y}</if></noteddy>", context!(x => true, y => 1)),
            "<if x>{y}</if>"
        );
        assert_eq!(
            render_with("{code|p}", context!(code => "{y}")),
            "{y}"
        );
    }

    #[test]
    fn test_strays_and_orphans() {
        assert_eq!(render_with("a<if>b</if>c", context!()), "abc");
        assert_eq!(render_with("a</ if>b", context!()), "ab");
        assert_eq!(render_with("a<else>gone</else>b", context!()), "ab");
        assert_eq!(render_with("a<arg x>gone</arg>b", context!()), "ab");
        assert_eq!(render_with("a<if x>never closed", context!(x => true)), "anever closed");
    }

    #[test]
    fn test_strip_inert() {
        let text = format!("a{INERT_OPEN}b{INERT_CLOSE}c");
        assert_eq!(strip_inert(&text), "abc");
    }
}
