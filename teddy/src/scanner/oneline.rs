//! One-line conditionals: `<p if-name='x' true="class='a'" false="class='b'">`.
use crate::model::Model;
use crate::scanner::attrs::{parse_start_tag, tag_end, Attr};
use crate::scanner::buffer::Buffer;
use crate::scanner::conditional::operand;
use crate::scanner::variable::substitute;
use crate::state::State;

fn is_directive_attr(attr: &Attr<'_>) -> bool {
    attr.name.starts_with("if-") || attr.name == "true" || attr.name == "false"
}

/// Rewrites the element tag at the start of the buffer.
///
/// The chosen fragment is appended after the remaining attributes.  Tokens
/// in the rewritten tag are resolved right away so that loop variables are
/// still in scope.
pub(crate) fn resolve(state: &State<'_, '_>, buf: &mut Buffer, model: &Model<'_>, out: &mut String) {
    let Some(end) = tag_end(buf, 0) else {
        out.push_str(&buf.drain());
        return;
    };
    let text = buf.take(end + 1);
    let Some(tag) = parse_start_tag(&text) else {
        out.push_str(&text);
        return;
    };

    let truth = tag
        .attrs
        .iter()
        .find(|attr| attr.name.len() > 3 && attr.name.starts_with("if-"))
        .map_or(false, |attr| {
            operand(state, model, &attr.name[3..], attr.value)
        });
    let fragment = tag
        .get(if truth { "true" } else { "false" })
        .map(str::trim)
        .filter(|x| !x.is_empty());

    let mut rv = String::with_capacity(text.len());
    rv.push('<');
    rv.push_str(tag.name);
    for attr in tag.attrs.iter().filter(|attr| !is_directive_attr(attr)) {
        rv.push(' ');
        rv.push_str(attr.raw);
    }
    if let Some(fragment) = fragment {
        rv.push(' ');
        rv.push_str(fragment);
    }
    if tag.self_closing {
        rv.push('/');
    }
    rv.push('>');

    out.push_str(&substitute(state, &rv, model, false));
}
