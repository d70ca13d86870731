use crate::error::{Error, ErrorKind};
use crate::model::Model;
use crate::scanner::attrs::{parse_start_tag, tag_end};
use crate::scanner::buffer::{Buffer, INERT_CLOSE, INERT_OPEN};
use crate::scanner::matcher::{find_arg_close, find_close, skip_inert};
use crate::scanner::signatures::{ARG_CLOSE, ARG_OPEN, INCLUDE_CLOSE, INCLUDE_OPEN};
use crate::scanner::{scan, strip_inert};
use crate::scanner::variable::substitute;
use crate::state::State;
use crate::value::Value;

/// An `<arg name>value</arg>` child of an include.
#[derive(Debug, PartialEq, Eq)]
struct Arg {
    name: String,
    value: String,
}

/// Collects the arguments of an include body.
///
/// Arguments of nested includes belong to those and are skipped.
fn parse_args(body: &str) -> Vec<Arg> {
    let buf = Buffer::new(body);
    let mut rv = Vec::new();
    let mut offset = 0;
    while let Some(c) = buf.peek_at(offset) {
        if c == INERT_OPEN {
            offset = skip_inert(&buf, offset);
            continue;
        }
        if c != '<' {
            offset += 1;
            continue;
        }
        if buf.matches_at(offset, &INCLUDE_OPEN) {
            let close = tag_end(&buf, offset)
                .and_then(|end| find_close(&buf, end + 1, &INCLUDE_OPEN, &INCLUDE_CLOSE));
            match close {
                Some(close) => offset = close + INCLUDE_CLOSE.len(),
                None => offset += INCLUDE_OPEN.len(),
            }
            continue;
        }
        if !buf.matches_at(offset, &ARG_OPEN) {
            offset += 1;
            continue;
        }
        let Some(open_end) = tag_end(&buf, offset) else {
            break;
        };
        let Some(close) = find_arg_close(&buf, open_end + 1) else {
            break;
        };
        let tag_text = buf.slice(offset, open_end + 1);
        if let Some(name) = parse_start_tag(&tag_text)
            .and_then(|tag| tag.attrs.first().map(|attr| attr.name.to_string()))
        {
            rv.push(Arg {
                name,
                value: buf.slice(open_end + 1, close),
            });
        }
        offset = close + ARG_CLOSE.len();
    }
    rv
}

/// Resolves the include at the start of the buffer.
///
/// The rendered template replaces the whole construct in the buffer.
pub(crate) fn resolve(
    state: &mut State<'_, '_>,
    buf: &mut Buffer,
    model: &Model<'_>,
) -> Result<(), Error> {
    let Some(open_len) = tag_end(buf, 0).map(|x| x + 1) else {
        diag_info!(state.env, "dropping unterminated include tag");
        buf.skip(INCLUDE_OPEN.len());
        return Ok(());
    };
    let tag_text = buf.slice(0, open_len);
    let Some(tag) = parse_start_tag(&tag_text) else {
        buf.skip(open_len);
        return Ok(());
    };
    let (consumed, body) = match tag.self_closing {
        true => (open_len, None),
        false => match find_close(buf, open_len, &INCLUDE_OPEN, &INCLUDE_CLOSE) {
            Some(close) => (close + INCLUDE_CLOSE.len(), Some(buf.slice(open_len, close))),
            None => (open_len, None),
        },
    };

    let Some(src) = tag.get("src") else {
        diag_info!(state.env, tag = %tag_text, "include without src attribute");
        buf.skip(consumed);
        return Ok(());
    };
    let name = substitute(state, src, model, true);

    let env = state.env;
    let source = match env.get_source(&name) {
        Ok(source) => source,
        Err(err) if err.kind() == ErrorKind::TemplateNotFound => {
            diag_warn!(env, name = %name, "included template not found");
            buf.skip(consumed);
            return Ok(());
        }
        Err(mut err) => {
            err.set_name(&name);
            return Err(err);
        }
    };

    if tag.has("noparse") || tag.has("noteddy") {
        let mut rv = String::with_capacity(source.len() + 2);
        rv.push(INERT_OPEN);
        rv.push_str(source);
        rv.push(INERT_CLOSE);
        buf.splice(consumed, &rv);
        return Ok(());
    }

    let mut child = model.extend();
    for arg in body.as_deref().map(parse_args).unwrap_or_default() {
        let value = ok!(scan(state, &arg.value, model));
        let self_referencing = model
            .lookup(&arg.name)
            .as_ref()
            .and_then(Value::as_str)
            .map_or(false, |existing| {
                existing.contains('{') && existing == strip_inert(&value)
            });
        if self_referencing {
            diag_warn!(env, arg = %arg.name, "include argument references itself");
            state.budget.exhaust();
            return Err(Error::new_pass_limit(env.max_passes()));
        }
        child.set(&arg.name, Value::from_safe_string(value));
    }

    if !source.is_empty() {
        ok!(state.budget.consume());
    }
    let rendered = ok!(scan(state, source, &child));
    buf.splice(consumed, &rendered);
    Ok(())
}
