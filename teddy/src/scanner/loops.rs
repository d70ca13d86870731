use crate::error::Error;
use crate::model::Model;
use crate::scanner::attrs::{parse_start_tag, tag_end};
use crate::scanner::buffer::{is_space, Buffer};
use crate::scanner::matcher::{find_close, has_directives, is_plain};
use crate::scanner::signatures::{LOOP_CLOSE, LOOP_OPEN};
use crate::scanner::variable::substitute;
use crate::scanner::{lookup, scan};
use crate::state::State;

/// Loop output after which the scanner may stop early.
const EARLY_EXIT_THRESHOLD: usize = 64 * 1024;

/// Strips the braces from `through="{items}"`.
fn strip_braces(path: &str) -> &str {
    path.strip_prefix('{')
        .and_then(|x| x.strip_suffix('}'))
        .unwrap_or(path)
}

fn has_nested_loop(body: &str) -> bool {
    body.match_indices("<loop").any(|(idx, m)| {
        body[idx + m.len()..]
            .chars()
            .next()
            .map_or(false, is_space)
    })
}

/// Resolves the loop at the start of the buffer.
///
/// Iteration output is appended to `out`.  Returns `true` when the scanner
/// may copy the rest of the buffer without looking at it.
pub(crate) fn resolve(
    state: &mut State<'_, '_>,
    buf: &mut Buffer,
    model: &Model<'_>,
    out: &mut String,
) -> Result<bool, Error> {
    let Some(open_len) = tag_end(buf, 0).map(|x| x + 1) else {
        diag_info!(state.env, "dropping unterminated loop tag");
        buf.skip(LOOP_OPEN.len());
        return Ok(false);
    };
    let Some(close_at) = find_close(buf, open_len, &LOOP_OPEN, &LOOP_CLOSE) else {
        diag_info!(
            state.env,
            tag = %buf.slice(0, open_len),
            "dropping loop without matching close tag"
        );
        buf.skip(open_len);
        return Ok(false);
    };
    let tag_text = buf.slice(0, open_len);
    let body = buf.slice(open_len, close_at);
    buf.skip(close_at + LOOP_CLOSE.len());

    let Some(tag) = parse_start_tag(&tag_text) else {
        return Ok(false);
    };
    let key_name = tag.get("key");
    let val_name = tag.get("val");
    if key_name.is_none() && val_name.is_none() {
        diag_info!(state.env, tag = %tag_text, "loop binds neither key nor val");
        return Ok(false);
    }
    let Some(through) = tag.get("through").map(strip_braces) else {
        diag_info!(state.env, tag = %tag_text, "loop without through attribute");
        return Ok(false);
    };
    let Some(source) = lookup(state, model, through) else {
        diag_info!(state.env, through, "loop source does not resolve");
        return Ok(false);
    };
    let Some(entries) = source.entries() else {
        diag_info!(state.env, through, kind = %source.kind(), "loop source is not iterable");
        return Ok(false);
    };

    let nested = has_nested_loop(&body);
    let directives = has_directives(&body);

    for (key, value) in entries {
        ok!(state.budget.check());
        let mut child = model.extend();
        if let Some(name) = val_name {
            child.set(name, value);
        }
        if let Some(name) = key_name {
            child.set(name, key.clone());
        }

        let pushed = match (nested, val_name) {
            (true, Some(name)) => {
                state.contexts.push(name, format!("{through}.{key}"));
                true
            }
            _ => false,
        };
        let rendered = if directives {
            scan(state, &body, &child)
        } else {
            Ok(substitute(state, &body, &child, false))
        };
        if pushed {
            state.contexts.pop();
        }
        out.push_str(&ok!(rendered));
    }

    Ok(out.len() > EARLY_EXIT_THRESHOLD && is_plain(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_loop_detection() {
        assert!(has_nested_loop("<p><loop through=x val=y></loop></p>"));
        assert!(!has_nested_loop("<p><looper></looper></p>"));
        assert!(!has_nested_loop("<p>{item}</p>"));
    }

    #[test]
    fn test_strip_braces() {
        assert_eq!(strip_braces("{items}"), "items");
        assert_eq!(strip_braces("items"), "items");
    }
}
