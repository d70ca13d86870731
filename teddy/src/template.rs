use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;

use crate::environment::Environment;
use crate::error::Error;
use crate::scanner::{self, is_space};
use crate::value::Value;

/// A template as held by the environment.
///
/// Server side comments are removed when a template is loaded, everything
/// else is kept as written.
#[derive(Clone)]
pub(crate) struct LoadedTemplate<'source> {
    name: Cow<'source, str>,
    source: Cow<'source, str>,
}

impl fmt::Debug for LoadedTemplate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedTemplate")
            .field("name", &self.name)
            .finish()
    }
}

impl<'source> LoadedTemplate<'source> {
    pub fn new(name: Cow<'source, str>, source: Cow<'source, str>) -> LoadedTemplate<'source> {
        let source = match strip_comments(&source) {
            Some(stripped) => Cow::Owned(stripped),
            None => source,
        };
        LoadedTemplate { name, source }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Returns the length of the comment at the start of `s`.
fn comment_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut idx = 0;
    while idx + 1 < bytes.len() {
        match (bytes[idx], bytes[idx + 1]) {
            (b'{', b'!') => {
                depth += 1;
                idx += 2;
            }
            (b'!', b'}') => {
                depth -= 1;
                idx += 2;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => idx += 1,
        }
    }
    None
}

/// Removes `{! comments !}` from a template source.
///
/// Whitespace runs next to a removed comment collapse the same way the
/// scanner collapses them next to a directive.  Returns `None` if there was
/// nothing to remove.  Unterminated comments are kept.
pub(crate) fn strip_comments(source: &str) -> Option<String> {
    if !source.contains("{!") {
        return None;
    }
    let mut rv = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{!") {
        let Some(len) = comment_len(&rest[start..]) else {
            break;
        };
        let before = &rest[..start];
        let text = before.trim_end_matches(is_space);
        rv.push_str(text);
        push_separator(&mut rv, &before[text.len()..]);
        let after = &rest[start + len..];
        let run = after.len() - after.trim_start_matches(is_space).len();
        push_separator(&mut rv, &after[..run]);
        rest = &after[run..];
    }
    rv.push_str(rest);
    Some(rv)
}

fn push_separator(rv: &mut String, run: &str) {
    if run.chars().nth(1).is_some() {
        rv.push(if run.contains('\n') { '\n' } else { ' ' });
    } else {
        rv.push_str(run);
    }
}

#[derive(Clone)]
pub(crate) enum TemplateRef<'env> {
    Borrowed(&'env LoadedTemplate<'env>),
    Owned(Arc<LoadedTemplate<'env>>),
}

impl<'env> Deref for TemplateRef<'env> {
    type Target = LoadedTemplate<'env>;

    fn deref(&self) -> &Self::Target {
        match self {
            TemplateRef::Borrowed(tmpl) => tmpl,
            TemplateRef::Owned(tmpl) => tmpl,
        }
    }
}

/// Represents a handle to a template.
///
/// Templates are stored in the [`Environment`] and looked up with
/// [`Environment::get_template`] which returns this handle.  The handle only
/// holds references and can be cheaply cloned.
///
/// To render the [`render`](Template::render) method can be used.
#[derive(Clone)]
pub struct Template<'env, 'source> {
    env: &'env Environment<'source>,
    tmpl: TemplateRef<'env>,
}

impl fmt::Debug for Template<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name())
            .finish()
    }
}

impl<'env, 'source> Template<'env, 'source> {
    pub(crate) fn new(
        env: &'env Environment<'source>,
        tmpl: TemplateRef<'env>,
    ) -> Template<'env, 'source> {
        Template { env, tmpl }
    }

    /// Returns the name of the template.
    pub fn name(&self) -> &str {
        self.tmpl.name()
    }

    /// Returns the source of the template with comments removed.
    pub fn source(&self) -> &str {
        self.tmpl.source()
    }

    /// Renders the template into a string.
    ///
    /// The provided value is used as the model for the template.  It can be
    /// any object that implements [`Serialize`](serde::Serialize).  You can
    /// either create your own struct and derive `Serialize` for it or the
    /// [`context!`](crate::context) macro can be used to create an ad-hoc
    /// model.
    ///
    /// ```
    /// # use teddy::{Environment, context};
    /// # let mut env = Environment::new();
    /// # env.add_template("hello", "<p>Hello {name}!</p>");
    /// let tmpl = env.get_template("hello").unwrap();
    /// println!("{}", tmpl.render(context!(name => "John")).unwrap());
    /// ```
    pub fn render<S: Serialize>(&self, ctx: S) -> Result<String, Error> {
        let root = ok!(Value::try_from_serialize(&ctx));
        scanner::render(self.env, self.source(), root).map_err(|mut err| {
            err.set_name(self.name());
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_strip_comments() {
        assert_eq!(strip_comments("<p>no comments</p>"), None);
        assert_eq!(
            strip_comments("a{! one !}b{! two {! nested !} !}c").as_deref(),
            Some("abc")
        );
        assert_eq!(strip_comments("a{! open").as_deref(), Some("a{! open"));
    }

    #[test]
    fn test_strip_comments_collapses_whitespace() {
        assert_eq!(strip_comments("a   {! c !}   b").as_deref(), Some("a  b"));
        assert_eq!(strip_comments("a {! c !} b").as_deref(), Some("a  b"));
        assert_eq!(
            strip_comments("<ul>\n    {! items !}\n    <li>").as_deref(),
            Some("<ul>\n\n<li>")
        );
    }

    #[test]
    fn test_loaded_template() {
        let tmpl = LoadedTemplate::new("x".into(), "<p>{!hidden!}{shown}</p>".into());
        assert_eq!(tmpl.name(), "x");
        assert_eq!(tmpl.source(), "<p>{shown}</p>");
    }
}
