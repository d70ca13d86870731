use std::fmt;

/// Un-trusted size hint for preallocations.
#[inline(always)]
pub(crate) fn untrusted_size_hint(value: usize) -> usize {
    value.min(1024)
}

/// Defines what happens to `{name}` tokens that do not resolve.
///
/// Teddy renders templates in multiple passes and a token that is unknown
/// to the model might be meant for a later consumer of the output (for
/// instance a client side template).  Because of this the default leaves
/// such tokens alone.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum UndefinedBehavior {
    /// Unresolved tokens are left in the output verbatim.
    #[default]
    Display,
    /// Unresolved tokens render as an empty string.
    Hide,
}

/// Helper to HTML escape a string.
///
/// The characters `<`, `>`, `&`, `"`, `'` and `/` are replaced with
/// entities so the result can be placed in text and in quoted attributes.
///
/// ```
/// # use teddy::HtmlEscape;
/// assert_eq!(
///     HtmlEscape("<a href='/'>").to_string(),
///     "&lt;a href=&#x27;&#x2f;&#x27;&gt;"
/// );
/// ```
pub struct HtmlEscape<'a>(pub &'a str);

impl<'a> fmt::Display for HtmlEscape<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[cfg(feature = "v_htmlescape")]
        {
            fmt::Display::fmt(&v_htmlescape::escape(self.0), f)
        }
        #[cfg(not(feature = "v_htmlescape"))]
        {
            let mut rest = self.0;
            while let Some(idx) = rest.find(['<', '>', '&', '"', '\'', '/']) {
                ok!(f.write_str(&rest[..idx]));
                ok!(f.write_str(match rest.as_bytes()[idx] {
                    b'<' => "&lt;",
                    b'>' => "&gt;",
                    b'&' => "&amp;",
                    b'"' => "&quot;",
                    b'\'' => "&#x27;",
                    _ => "&#x2f;",
                }));
                rest = &rest[idx + 1..];
            }
            f.write_str(rest)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_html_escape() {
        assert_eq!(HtmlEscape("plain").to_string(), "plain");
        assert_eq!(
            HtmlEscape(r#"<b class="x">Tom & 'Jerry'</b>"#).to_string(),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;&#x2f;b&gt;"
        );
        assert_eq!(HtmlEscape("é<ü").to_string(), "é&lt;ü");
    }

    #[test]
    fn test_untrusted_size_hint() {
        assert_eq!(untrusted_size_hint(10), 10);
        assert_eq!(untrusted_size_hint(usize::MAX), 1024);
    }
}
