//! `<if>` / `<unless>` statements with their `<elseif>`, `<elseunless>` and
//! `<else>` siblings.
use crate::model::Model;
use crate::scanner::attrs::{parse_start_tag, tag_end, Attr};
use crate::scanner::buffer::Buffer;
use crate::scanner::lookup;
use crate::scanner::matcher::{find_close, BranchKind, CondKind};
use crate::scanner::signatures::{Signature, IF_CLOSE, IF_OPEN, UNLESS_CLOSE, UNLESS_OPEN};
use crate::state::State;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Op {
    And,
    Or,
    Xor,
}

/// One branch of a conditional chain, as offsets into the buffer.
#[derive(Debug)]
struct Branch {
    inverted: bool,
    unconditional: bool,
    /// The open tag.
    tag: (usize, usize),
    body: (usize, usize),
    /// An HTML comment right before the branch tag.
    comment: Option<(usize, usize)>,
}

fn signatures(kind: CondKind) -> (&'static Signature, &'static Signature) {
    match kind {
        CondKind::If => (&IF_OPEN, &IF_CLOSE),
        CondKind::Unless => (&UNLESS_OPEN, &UNLESS_CLOSE),
    }
}

/// Resolves the conditional chain at the start of the buffer.
///
/// The body of the selected branch is spliced back into the buffer so that
/// the directives it contains are scanned next.
pub(crate) fn resolve(state: &State<'_, '_>, buf: &mut Buffer, model: &Model<'_>, kind: CondKind) {
    let (open, close) = signatures(kind);
    let Some(open_len) = tag_end(buf, 0).map(|x| x + 1) else {
        diag_info!(state.env, tag = open.tag, "dropping unterminated conditional tag");
        buf.skip(open.len());
        return;
    };
    let Some(close_at) = find_close(buf, open_len, open, close) else {
        diag_info!(
            state.env,
            tag = %buf.slice(0, open_len),
            "dropping conditional without matching close tag"
        );
        buf.skip(open_len);
        return;
    };

    let mut branches = vec![Branch {
        inverted: kind == CondKind::Unless,
        unconditional: false,
        tag: (0, open_len),
        body: (open_len, close_at),
        comment: None,
    }];
    let mut end = close_at + close.len();

    loop {
        let (probe, comment) = skip_separators(buf, end);
        let Some(branch_kind) = BranchKind::at(buf, probe) else {
            break;
        };
        let tag_len = match branch_kind {
            BranchKind::Else => branch_kind.open().len(),
            _ => match tag_end(buf, probe) {
                Some(x) => x + 1 - probe,
                None => break,
            },
        };
        let body_start = probe + tag_len;
        let Some(close_at) = find_close(buf, body_start, branch_kind.open(), branch_kind.close())
        else {
            break;
        };
        branches.push(Branch {
            inverted: branch_kind == BranchKind::ElseUnless,
            unconditional: branch_kind == BranchKind::Else,
            tag: (probe, body_start),
            body: (body_start, close_at),
            comment,
        });
        end = close_at + branch_kind.close().len();
        if branch_kind == BranchKind::Else {
            break;
        }
    }

    let selected = branches
        .iter()
        .find(|branch| branch.unconditional || is_true(state, buf, model, branch));
    let replacement = match selected {
        Some(branch) => {
            let mut rv = String::new();
            if let Some((start, end)) = branch.comment {
                rv.push_str(&buf.slice(start, end));
            }
            rv.push_str(&buf.slice(branch.body.0, branch.body.1));
            rv
        }
        None => String::new(),
    };
    buf.splice(end, &replacement);
}

/// Skips whitespace and HTML comments between siblings.
///
/// Returns the offset after them and the last comment seen.
fn skip_separators(buf: &Buffer, from: usize) -> (usize, Option<(usize, usize)>) {
    let mut probe = from;
    let mut comment = None;
    loop {
        probe += buf.space_run(probe);
        if !buf.starts_with_at(probe, "<!--") {
            break;
        }
        match buf.find_str(probe + 4, "-->") {
            Some(close) => {
                comment = Some((probe, close + 3));
                probe = close + 3;
            }
            None => break,
        }
    }
    (probe, comment)
}

fn is_true(state: &State<'_, '_>, buf: &Buffer, model: &Model<'_>, branch: &Branch) -> bool {
    let text = buf.slice(branch.tag.0, branch.tag.1);
    let rv = parse_start_tag(&text).map_or(false, |tag| evaluate(state, model, &tag.attrs));
    rv != branch.inverted
}

/// Evaluates the operands and operators of a condition.
///
/// Operators apply left to right.  Two operands without an operator in
/// between are combined with `and`.
pub(crate) fn evaluate(state: &State<'_, '_>, model: &Model<'_>, attrs: &[Attr<'_>]) -> bool {
    let mut result = None;
    let mut op = None;
    let mut negate = false;

    for attr in attrs {
        match (attr.name, attr.value) {
            ("and", None) => op = Some(Op::And),
            ("or", None) => op = Some(Op::Or),
            ("xor", None) => op = Some(Op::Xor),
            ("not", None) => negate = !negate,
            (name, literal) => {
                let (name, inverted) = match name.strip_prefix("not:") {
                    Some(name) => (name, true),
                    None => (name, false),
                };
                let value = operand(state, model, name, literal) != (inverted != negate);
                negate = false;
                result = Some(match (result, op.take()) {
                    (None, _) => value,
                    (Some(acc), Some(Op::Or)) => acc || value,
                    (Some(acc), Some(Op::Xor)) => acc != value,
                    (Some(acc), Some(Op::And) | None) => acc && value,
                });
            }
        }
    }

    result.unwrap_or(false)
}

/// Evaluates a single `name` or `name='literal'` operand.
pub(crate) fn operand(
    state: &State<'_, '_>,
    model: &Model<'_>,
    name: &str,
    literal: Option<&str>,
) -> bool {
    match (lookup(state, model, name), literal) {
        (Some(value), Some(literal)) => value.matches_literal(literal),
        (Some(value), None) => value.is_true(),
        (None, _) => false,
    }
}
