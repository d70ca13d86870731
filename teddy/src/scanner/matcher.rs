use crate::scanner::attrs::{parse_start_tag, tag_end};
use crate::scanner::buffer::{is_space, Buffer, INERT_CLOSE, INERT_OPEN};
use crate::scanner::signatures::{
    Signature, ARG_CLOSE, ARG_OPEN, BARE_OPENS, CLOSES, ELSEIF_CLOSE, ELSEIF_OPEN,
    ELSEUNLESS_CLOSE, ELSEUNLESS_OPEN, ELSE_CLOSE, ELSE_OPEN, IF_OPEN, INCLUDE_OPEN, KEYWORDS,
    LOOP_OPEN, NOTEDDY_CLOSE, NOTEDDY_OPEN, UNLESS_OPEN,
};

/// The two kinds of conditional statements.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum CondKind {
    If,
    Unless,
}

/// Siblings that may follow a conditional.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum BranchKind {
    ElseIf,
    ElseUnless,
    Else,
}

impl BranchKind {
    pub fn open(self) -> &'static Signature {
        match self {
            BranchKind::ElseIf => &ELSEIF_OPEN,
            BranchKind::ElseUnless => &ELSEUNLESS_OPEN,
            BranchKind::Else => &ELSE_OPEN,
        }
    }

    pub fn close(self) -> &'static Signature {
        match self {
            BranchKind::ElseIf => &ELSEIF_CLOSE,
            BranchKind::ElseUnless => &ELSEUNLESS_CLOSE,
            BranchKind::Else => &ELSE_CLOSE,
        }
    }

    /// Identifies the sibling starting at the given offset.
    pub fn at(buf: &Buffer, offset: usize) -> Option<BranchKind> {
        [BranchKind::ElseIf, BranchKind::ElseUnless, BranchKind::Else]
            .into_iter()
            .find(|kind| buf.matches_at(offset, kind.open()))
    }
}

/// What starts at a `<` in the buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Directive {
    Conditional(CondKind),
    Loop,
    Include,
    NoTeddy,
    /// An element with an `if-` attribute.
    OneLine,
    /// An `<elseif>`, `<elseunless>` or `<else>` without a conditional.
    OrphanBranch(BranchKind),
    /// An `<arg>` outside of an include.
    OrphanArg,
    /// A tag of the given length that is dropped.
    Stray(usize),
}

/// Classifies the tag starting at `offset`.
pub(crate) fn classify(buf: &Buffer, offset: usize) -> Option<Directive> {
    if buf.peek_at(offset) != Some('<') {
        return None;
    }
    match some!(buf.peek_at(offset + 1)) {
        '/' => classify_close(buf, offset),
        c if c.is_ascii_alphabetic() => classify_open(buf, offset),
        _ => None,
    }
}

fn classify_open(buf: &Buffer, offset: usize) -> Option<Directive> {
    let directive = if buf.matches_at(offset, &IF_OPEN) {
        Directive::Conditional(CondKind::If)
    } else if buf.matches_at(offset, &UNLESS_OPEN) {
        Directive::Conditional(CondKind::Unless)
    } else if buf.matches_at(offset, &LOOP_OPEN) {
        Directive::Loop
    } else if buf.matches_at(offset, &INCLUDE_OPEN) {
        Directive::Include
    } else if buf.matches_at(offset, &NOTEDDY_OPEN) {
        Directive::NoTeddy
    } else if buf.matches_at(offset, &ARG_OPEN) {
        Directive::OrphanArg
    } else if let Some(kind) = BranchKind::at(buf, offset) {
        Directive::OrphanBranch(kind)
    } else if let Some(sig) = BARE_OPENS.iter().find(|sig| buf.matches_at(offset, sig)) {
        Directive::Stray(sig.len())
    } else if has_if_attr(buf, offset) {
        Directive::OneLine
    } else {
        return None;
    };
    Some(directive)
}

fn classify_close(buf: &Buffer, offset: usize) -> Option<Directive> {
    if let Some(sig) = CLOSES.iter().find(|sig| buf.matches_at(offset, sig)) {
        return Some(Directive::Stray(sig.len()));
    }

    // `</ if>` and friends
    let ws = buf.space_run(offset + 2);
    if ws == 0 {
        return None;
    }
    let start = offset + 2 + ws;
    KEYWORDS.iter().find_map(|kw| {
        if !buf.starts_with_at(start, kw) {
            return None;
        }
        let after = start + kw.len();
        let end = after + buf.space_run(after);
        (buf.peek_at(end) == Some('>')).then(|| Directive::Stray(end + 1 - offset))
    })
}

/// Checks if the start tag at `offset` carries an `if-<name>` attribute.
fn has_if_attr(buf: &Buffer, offset: usize) -> bool {
    let Some(end) = tag_end(buf, offset) else {
        return false;
    };
    let mut probe = offset;
    let mut found = false;
    while probe + 3 < end {
        if buf.peek_at(probe).map_or(false, is_space) && buf.starts_with_at(probe + 1, "if-") {
            found = true;
            break;
        }
        probe += 1;
    }
    if !found {
        return false;
    }
    let text = buf.slice(offset, end + 1);
    parse_start_tag(&text).map_or(false, |tag| {
        tag.attrs
            .iter()
            .any(|attr| attr.name.len() > 3 && attr.name.starts_with("if-"))
    })
}

/// Returns the offset right after the inert span starting at `offset`.
pub(crate) fn skip_inert(buf: &Buffer, offset: usize) -> usize {
    let mut depth = 0usize;
    let mut idx = offset;
    while let Some(c) = buf.peek_at(idx) {
        idx += 1;
        if c == INERT_OPEN {
            depth += 1;
        } else if c == INERT_CLOSE {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return idx;
            }
        }
    }
    buf.len()
}

/// Finds the close tag matching an already consumed open tag.
///
/// `from` is the offset right after the open tag.  Nested opens of the same
/// kind increase the depth, inert spans and `<noteddy>` blocks are skipped.
pub(crate) fn find_close(
    buf: &Buffer,
    from: usize,
    open: &Signature,
    close: &Signature,
) -> Option<usize> {
    let mut depth = 0usize;
    let mut offset = from;
    loop {
        match some!(buf.peek_at(offset)) {
            INERT_OPEN => {
                offset = skip_inert(buf, offset);
                continue;
            }
            '<' => {
                if buf.matches_at(offset, close) {
                    if depth == 0 {
                        return Some(offset);
                    }
                    depth -= 1;
                    offset += close.len();
                    continue;
                }
                if buf.matches_at(offset, open) {
                    depth += 1;
                    offset += open.len();
                    continue;
                }
                if buf.matches_at(offset, &NOTEDDY_OPEN) {
                    let body = offset + NOTEDDY_OPEN.len();
                    if let Some(end) = find_close(buf, body, &NOTEDDY_OPEN, &NOTEDDY_CLOSE) {
                        offset = end + NOTEDDY_CLOSE.len();
                        continue;
                    }
                }
            }
            _ => {}
        }
        offset += 1;
    }
}

/// Finds the `</arg>` that closes an argument.
pub(crate) fn find_arg_close(buf: &Buffer, from: usize) -> Option<usize> {
    find_close(buf, from, &ARG_OPEN, &ARG_CLOSE)
}

/// Checks if the buffer holds nothing the scanner would resolve.
///
/// Plain text can be copied to the output as is.
pub(crate) fn is_plain(buf: &Buffer) -> bool {
    let mut offset = 0;
    while let Some(c) = buf.peek_at(offset) {
        match c {
            '{' => return false,
            '<' if classify(buf, offset).is_some() => return false,
            _ => {}
        }
        offset += 1;
    }
    true
}

/// Checks if a text contains any directive tag.
///
/// Variable tokens do not count.
pub(crate) fn has_directives(text: &str) -> bool {
    if !text.contains('<') && !text.contains(INERT_OPEN) {
        return false;
    }
    let buf = Buffer::new(text);
    let mut offset = 0;
    while let Some(c) = buf.peek_at(offset) {
        match c {
            INERT_OPEN => return true,
            '<' if classify(&buf, offset).is_some() => return true,
            _ => {}
        }
        offset += 1;
    }
    false
}
