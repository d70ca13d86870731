//! The tag signature table.
//!
//! A signature is the exact character sequence that identifies a directive
//! tag.  Patterns are stored reversed so they can be compared directly
//! against the scan buffer, and a space in the tag text stands for any
//! whitespace character.

/// One element of a signature pattern.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SigChar {
    Lit(char),
    Space,
}

/// A directive tag signature.
#[derive(Debug)]
pub(crate) struct Signature {
    pub tag: &'static str,
    pub pattern: &'static [SigChar],
}

impl Signature {
    /// The number of characters the signature covers.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.pattern.len()
    }
}

/// Reverses an ASCII tag into a signature pattern.
pub(crate) const fn reversed<const N: usize>(tag: &str) -> [SigChar; N] {
    let bytes = tag.as_bytes();
    let mut rv = [SigChar::Space; N];
    let mut idx = 0;
    while idx < N {
        let b = bytes[N - 1 - idx];
        rv[idx] = if b == b' ' {
            SigChar::Space
        } else {
            SigChar::Lit(b as char)
        };
        idx += 1;
    }
    rv
}

macro_rules! signature {
    ($tag:literal) => {{
        const PATTERN: [SigChar; $tag.len()] = reversed::<{ $tag.len() }>($tag);
        Signature {
            tag: $tag,
            pattern: &PATTERN,
        }
    }};
}

pub(crate) static IF_OPEN: Signature = signature!("<if ");
pub(crate) static IF_BARE: Signature = signature!("<if>");
pub(crate) static IF_CLOSE: Signature = signature!("</if>");
pub(crate) static UNLESS_OPEN: Signature = signature!("<unless ");
pub(crate) static UNLESS_BARE: Signature = signature!("<unless>");
pub(crate) static UNLESS_CLOSE: Signature = signature!("</unless>");
pub(crate) static ELSEIF_OPEN: Signature = signature!("<elseif ");
pub(crate) static ELSEIF_BARE: Signature = signature!("<elseif>");
pub(crate) static ELSEIF_CLOSE: Signature = signature!("</elseif>");
pub(crate) static ELSEUNLESS_OPEN: Signature = signature!("<elseunless ");
pub(crate) static ELSEUNLESS_BARE: Signature = signature!("<elseunless>");
pub(crate) static ELSEUNLESS_CLOSE: Signature = signature!("</elseunless>");
pub(crate) static ELSE_OPEN: Signature = signature!("<else>");
pub(crate) static ELSE_CLOSE: Signature = signature!("</else>");
pub(crate) static LOOP_OPEN: Signature = signature!("<loop ");
pub(crate) static LOOP_BARE: Signature = signature!("<loop>");
pub(crate) static LOOP_CLOSE: Signature = signature!("</loop>");
pub(crate) static INCLUDE_OPEN: Signature = signature!("<include ");
pub(crate) static INCLUDE_BARE: Signature = signature!("<include>");
pub(crate) static INCLUDE_CLOSE: Signature = signature!("</include>");
pub(crate) static ARG_OPEN: Signature = signature!("<arg ");
pub(crate) static ARG_BARE: Signature = signature!("<arg>");
pub(crate) static ARG_CLOSE: Signature = signature!("</arg>");
pub(crate) static NOTEDDY_OPEN: Signature = signature!("<noteddy>");
pub(crate) static NOTEDDY_CLOSE: Signature = signature!("</noteddy>");

/// Open tags that lack their required attributes.
pub(crate) static BARE_OPENS: [&Signature; 7] = [
    &IF_BARE,
    &UNLESS_BARE,
    &ELSEIF_BARE,
    &ELSEUNLESS_BARE,
    &LOOP_BARE,
    &INCLUDE_BARE,
    &ARG_BARE,
];

/// Close tags of every directive.
pub(crate) static CLOSES: [&Signature; 9] = [
    &IF_CLOSE,
    &UNLESS_CLOSE,
    &ELSEIF_CLOSE,
    &ELSEUNLESS_CLOSE,
    &ELSE_CLOSE,
    &LOOP_CLOSE,
    &INCLUDE_CLOSE,
    &ARG_CLOSE,
    &NOTEDDY_CLOSE,
];

/// Keywords that are recognized in malformed close tags (`</ if>`).
pub(crate) static KEYWORDS: [&str; 9] = [
    "if",
    "unless",
    "elseif",
    "elseunless",
    "else",
    "loop",
    "include",
    "arg",
    "noteddy",
];

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_reversed_pattern() {
        assert_eq!(
            IF_OPEN.pattern,
            &[
                SigChar::Space,
                SigChar::Lit('f'),
                SigChar::Lit('i'),
                SigChar::Lit('<'),
            ]
        );
        assert_eq!(IF_CLOSE.len(), 5);
        assert_eq!(ELSEUNLESS_OPEN.tag, "<elseunless ");
    }

    #[test]
    fn test_table_consistency() {
        for sig in CLOSES.iter().chain(BARE_OPENS.iter()) {
            assert_eq!(sig.len(), sig.tag.chars().count());
            assert_eq!(sig.pattern[0], SigChar::Lit('>'));
        }
    }
}
