//! Start tag and attribute parsing.
//!
//! Directives carry their arguments as HTML attributes, so this is shared by
//! conditions, loops, includes and one-line conditionals.  The parser is
//! deliberately lenient: anything it does not understand ends the tag.
use crate::scanner::buffer::{is_space, Buffer};

/// One attribute of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attr<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    /// The attribute as written, including the value and its quotes.
    pub raw: &'a str,
}

/// A parsed start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartTag<'a> {
    pub name: &'a str,
    pub attrs: Vec<Attr<'a>>,
    pub self_closing: bool,
}

impl<'a> StartTag<'a> {
    /// Looks up an attribute value by name.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.attrs
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| attr.value)
    }

    /// Checks for a flag attribute.
    pub fn has(&self, name: &str) -> bool {
        self.attrs.iter().any(|attr| attr.name == name)
    }
}

/// Finds the offset of the `>` that ends the tag starting at `offset`.
///
/// Quoted attribute values may contain `>`.
pub(crate) fn tag_end(buf: &Buffer, offset: usize) -> Option<usize> {
    let mut quote = None;
    let mut idx = offset + 1;
    loop {
        let c = some!(buf.peek_at(idx));
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == '>' => return Some(idx),
            None => {}
        }
        idx += 1;
    }
}

/// Parses a complete start tag (`<name attr=value ...>`).
pub(crate) fn parse_start_tag(text: &str) -> Option<StartTag<'_>> {
    let rest = some!(text.strip_prefix('<'));
    let name_len = rest
        .find(|c: char| is_space(c) || c == '>' || c == '/')
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let name = &rest[..name_len];
    let mut rest = &rest[name_len..];
    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        rest = rest.trim_start_matches(is_space);
        if rest.starts_with('>') {
            break;
        }
        if rest.starts_with("/>") {
            self_closing = true;
            break;
        }
        let (attr, after) = some!(parse_attr(rest));
        attrs.push(attr);
        rest = after;
    }

    Some(StartTag {
        name,
        attrs,
        self_closing,
    })
}

fn parse_attr(text: &str) -> Option<(Attr<'_>, &str)> {
    let name_len = text
        .find(|c: char| is_space(c) || c == '=' || c == '>' || c == '"' || c == '\'')
        .unwrap_or(text.len());
    let mut name = &text[..name_len];
    // a trailing slash belongs to `/>`, not to the attribute
    if name.ends_with('/') && text[name_len..].starts_with('>') {
        name = &name[..name.len() - 1];
    }
    if name.is_empty() {
        return None;
    }
    let after_name = &text[name.len()..];
    let trimmed = after_name.trim_start_matches(is_space);
    let Some(value_part) = trimmed.strip_prefix('=') else {
        let raw = name;
        return Some((
            Attr {
                name,
                value: None,
                raw,
            },
            after_name,
        ));
    };
    let value_part = value_part.trim_start_matches(is_space);
    let (value, after) = match value_part.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let end = some!(value_part[1..].find(q)) + 1;
            (&value_part[1..end], &value_part[end + 1..])
        }
        Some(_) => {
            let end = value_part
                .find(|c: char| is_space(c) || c == '>')
                .unwrap_or(value_part.len());
            (&value_part[..end], &value_part[end..])
        }
        None => return None,
    };
    let raw = &text[..text.len() - after.len()];
    Some((
        Attr {
            name,
            value: Some(value),
            raw,
        },
        after,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_condition_attrs() {
        let tag = parse_start_tag("<if a='x' and not:b>").unwrap();
        assert_eq!(tag.name, "if");
        let names: Vec<_> = tag.attrs.iter().map(|x| x.name).collect();
        assert_eq!(names, vec!["a", "and", "not:b"]);
        assert_eq!(tag.get("a"), Some("x"));
        assert!(tag.has("and"));
        assert!(!tag.self_closing);
    }

    #[test]
    fn test_nested_quotes() {
        let tag = parse_start_tag(r#"<p if-x true="class='on'" false='class="off"'>"#).unwrap();
        assert_eq!(tag.get("true"), Some("class='on'"));
        assert_eq!(tag.get("false"), Some(r#"class="off""#));
        assert_eq!(tag.attrs[1].raw, r#"true="class='on'""#);
    }

    #[test]
    fn test_self_closing() {
        let tag = parse_start_tag(r#"<include src="partial"/>"#).unwrap();
        assert!(tag.self_closing);
        assert_eq!(tag.get("src"), Some("partial"));

        let tag = parse_start_tag("<input disabled/>").unwrap();
        assert!(tag.self_closing);
        assert_eq!(tag.attrs[0].name, "disabled");
    }

    #[test]
    fn test_unquoted_and_spaced() {
        let tag = parse_start_tag("<loop through = items val=item>").unwrap();
        assert_eq!(tag.get("through"), Some("items"));
        assert_eq!(tag.get("val"), Some("item"));
    }

    #[test]
    fn test_tag_end() {
        let buf = Buffer::new(r#"<p title="a>b">rest"#);
        assert_eq!(tag_end(&buf, 0), Some(14));
        let buf = Buffer::new("<p title='never");
        assert_eq!(tag_end(&buf, 0), None);
    }
}
