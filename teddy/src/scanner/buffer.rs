use std::fmt;

use crate::scanner::signatures::{SigChar, Signature};

/// Marks the start of a span that must not be scanned again.
pub(crate) const INERT_OPEN: char = '\u{E000}';

/// Marks the end of a span that must not be scanned again.
pub(crate) const INERT_CLOSE: char = '\u{E001}';

/// Whitespace as far as whitespace collapsing and signatures are concerned.
#[inline(always)]
pub(crate) fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// The text under interpretation.
///
/// Characters are held in reverse order so that the next character to
/// consume is the last element of the vector.  All offsets taken by the
/// methods on this type are relative to the consuming end: offset `0` is
/// the next character, offset `1` the one after it and so forth.
pub(crate) struct Buffer {
    chars: Vec<char>,
    /// Remaining length at the end of the last splice.
    mark: Option<usize>,
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.slice(0, self.len()), f)
    }
}

impl Buffer {
    pub fn new(text: &str) -> Buffer {
        Buffer {
            chars: text.chars().rev().collect(),
            mark: None,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Returns the next character.
    #[inline(always)]
    pub fn peek(&self) -> Option<char> {
        self.chars.last().copied()
    }

    /// Returns the character at the given offset.
    #[inline(always)]
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        let len = self.chars.len();
        if offset < len {
            Some(self.chars[len - 1 - offset])
        } else {
            None
        }
    }

    /// Consumes the next character.
    #[inline(always)]
    pub fn pop(&mut self) -> Option<char> {
        self.chars.pop()
    }

    /// Drops the next `n` characters.
    pub fn skip(&mut self, n: usize) {
        let len = self.chars.len();
        self.chars.truncate(len.saturating_sub(n));
    }

    /// Replaces the next `consumed` characters with `replacement`.
    ///
    /// The replacement becomes the next text to be consumed.
    pub fn splice(&mut self, consumed: usize, replacement: &str) {
        self.skip(consumed);
        self.mark = Some(self.chars.len());
        self.chars.extend(replacement.chars().rev());
    }

    /// Checks if the given offset is where the last spliced text ended.
    pub fn is_mark_at(&self, offset: usize) -> bool {
        self.mark
            .map_or(false, |mark| mark + offset == self.chars.len())
    }

    /// Returns the text between the two offsets in reading order.
    pub fn slice(&self, start: usize, end: usize) -> String {
        let len = self.chars.len();
        let end = end.min(len);
        if start >= end {
            return String::new();
        }
        self.chars[len - end..len - start].iter().rev().collect()
    }

    /// Consumes and returns the next `n` characters.
    pub fn take(&mut self, n: usize) -> String {
        let rv = self.slice(0, n);
        self.skip(n);
        rv
    }

    /// Consumes everything that is left.
    pub fn drain(&mut self) -> String {
        let rv: String = self.chars.iter().rev().collect();
        self.chars.clear();
        rv
    }

    /// Checks if the signature starts at the given offset.
    pub fn matches_at(&self, offset: usize, sig: &Signature) -> bool {
        let len = self.chars.len();
        let n = sig.pattern.len();
        if offset + n > len {
            return false;
        }
        self.chars[len - offset - n..len - offset]
            .iter()
            .zip(sig.pattern.iter())
            .all(|(&c, p)| match *p {
                SigChar::Lit(l) => c == l,
                SigChar::Space => is_space(c),
            })
    }

    /// Checks if the literal string starts at the given offset.
    pub fn starts_with_at(&self, offset: usize, needle: &str) -> bool {
        let mut idx = offset;
        for c in needle.chars() {
            if self.peek_at(idx) != Some(c) {
                return false;
            }
            idx += 1;
        }
        true
    }

    /// Finds the first offset at or after `from` holding `c`.
    pub fn find_char(&self, from: usize, c: char) -> Option<usize> {
        let len = self.chars.len();
        if from >= len {
            return None;
        }
        self.chars[..len - from]
            .iter()
            .rev()
            .position(|&x| x == c)
            .map(|pos| from + pos)
    }

    /// Finds the first offset at or after `from` where `needle` starts.
    pub fn find_str(&self, from: usize, needle: &str) -> Option<usize> {
        let first = some!(needle.chars().next());
        let mut offset = from;
        loop {
            offset = some!(self.find_char(offset, first));
            if self.starts_with_at(offset, needle) {
                return Some(offset);
            }
            offset += 1;
        }
    }

    /// Counts the whitespace characters starting at the given offset.
    pub fn space_run(&self, from: usize) -> usize {
        let mut n = 0;
        while self.peek_at(from + n).map_or(false, is_space) {
            n += 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_consume_in_order() {
        let mut buf = Buffer::new("abc");
        assert_eq!(buf.peek(), Some('a'));
        assert_eq!(buf.peek_at(2), Some('c'));
        assert_eq!(buf.peek_at(3), None);
        assert_eq!(buf.pop(), Some('a'));
        assert_eq!(buf.drain(), "bc");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_splice() {
        let mut buf = Buffer::new("<if x>yes</if> tail");
        buf.splice(14, "yes");
        assert_eq!(buf.slice(0, buf.len()), "yes tail");
        assert!(buf.is_mark_at(3));
        assert_eq!(buf.take(3), "yes");
        assert!(buf.is_mark_at(0));
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_find() {
        let buf = Buffer::new("ab</if>cd</if>");
        assert_eq!(buf.find_char(0, '<'), Some(2));
        assert_eq!(buf.find_str(3, "</if>"), Some(9));
        assert_eq!(buf.find_str(10, "</if>"), None);
        assert_eq!(buf.find_char(100, '<'), None);
    }

    #[test]
    fn test_space_run() {
        let buf = Buffer::new("x \t\n y");
        assert_eq!(buf.space_run(0), 0);
        assert_eq!(buf.space_run(1), 4);
    }
}
