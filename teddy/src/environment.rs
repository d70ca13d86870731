use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, ErrorKind};
use crate::loader::LoaderStore;
use crate::template::{LoadedTemplate, Template, TemplateRef};
use crate::utils::UndefinedBehavior;

const DEFAULT_MAX_PASSES: u32 = 1000;
const DEFAULT_VERBOSITY: u8 = 1;

/// An abstraction that holds the engine configuration.
///
/// This object holds the central configuration state for templates.  It is
/// also the container for all templates that can be included by name.
///
/// The environment holds references to the source the templates were created
/// from.  Templates can either be added directly with
/// [`add_template`](Self::add_template) or produced on demand by a loader
/// configured with [`set_loader`](Self::set_loader).
///
/// ```
/// # use teddy::{Environment, context};
/// let mut env = Environment::new();
/// env.add_template("greeting", "<p>Hello {name}!</p>");
/// let rv = env.render("greeting", context!(name => "World")).unwrap();
/// assert_eq!(rv, "<p>Hello World!</p>");
/// ```
#[derive(Clone)]
pub struct Environment<'source> {
    templates: LoaderStore<'source>,
    max_passes: u32,
    verbosity: u8,
    undefined_behavior: UndefinedBehavior,
}

impl<'source> Default for Environment<'source> {
    fn default() -> Self {
        Environment::new()
    }
}

impl<'source> fmt::Debug for Environment<'source> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("templates", &self.templates)
            .field("max_passes", &self.max_passes)
            .field("verbosity", &self.verbosity)
            .field("undefined_behavior", &self.undefined_behavior)
            .finish()
    }
}

impl<'source> Environment<'source> {
    /// Creates a new environment with sensible defaults.
    ///
    /// The environment does not contain any templates, allows up to 1000
    /// passes per render and reports warnings.
    pub fn new() -> Environment<'source> {
        Environment {
            templates: LoaderStore::default(),
            max_passes: DEFAULT_MAX_PASSES,
            verbosity: DEFAULT_VERBOSITY,
            undefined_behavior: UndefinedBehavior::default(),
        }
    }

    /// Adds a template to the environment.
    ///
    /// The `name` is what `<include src="...">` refers to.  Server side
    /// comments are removed from the source right away.
    ///
    /// ```
    /// # use teddy::Environment;
    /// let mut env = Environment::new();
    /// env.add_template("nav", "<nav>{!menu!}</nav>");
    /// assert_eq!(env.get_template("nav").unwrap().source(), "<nav></nav>");
    /// ```
    pub fn add_template(&mut self, name: &'source str, source: &'source str) {
        self.templates.insert(name, source);
    }

    /// Adds a template without borrowing.
    ///
    /// This lets an environment with a `'static` lifetime hold templates that
    /// were created at runtime.
    pub fn add_template_owned<N, S>(&mut self, name: N, source: S)
    where
        N: Into<Cow<'source, str>>,
        S: Into<Cow<'source, str>>,
    {
        self.templates.insert_cow(name.into(), source.into());
    }

    /// Removes a template by name.
    pub fn remove_template(&mut self, name: &str) {
        self.templates.remove(name);
    }

    /// Removes all stored templates.
    ///
    /// Templates produced by a loader are removed too and will be loaded
    /// again on next use.
    pub fn clear_templates(&mut self) {
        self.templates.clear();
    }

    /// Registers a template loader as source of templates.
    ///
    /// When a template is looked up and it was not added with
    /// [`add_template`](Self::add_template), the loader is invoked with the
    /// name.  It returns `Ok(None)` if the template does not exist.  Results
    /// are cached until the templates are cleared.
    ///
    /// ```rust
    /// # use teddy::Environment;
    /// fn create_env() -> Environment<'static> {
    ///     let mut env = Environment::new();
    ///     env.set_loader(|name| {
    ///         if name == "layout" {
    ///             Ok(Some("<main>{body|s}</main>".into()))
    ///         } else {
    ///             Ok(None)
    ///         }
    ///     });
    ///     env
    /// }
    /// ```
    pub fn set_loader<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static,
    {
        self.templates.set_loader(f);
    }

    /// Fetches a template by name.
    ///
    /// Fails with [`ErrorKind::TemplateNotFound`] if the template is neither
    /// stored nor produced by the loader.
    pub fn get_template(&self, name: &str) -> Result<Template<'_, 'source>, Error> {
        let tmpl = ok!(self.templates.get(name));
        Ok(Template::new(self, TemplateRef::Borrowed(tmpl)))
    }

    /// Returns the comment free source of a named template.
    pub(crate) fn get_source(&self, name: &str) -> Result<&str, Error> {
        self.templates.get(name).map(|tmpl| tmpl.source())
    }

    /// Creates a template from a string that is not stored in the environment.
    pub fn template_from_str(&self, source: &'source str) -> Template<'_, 'source> {
        self.template_from_named_str("<string>", source)
    }

    /// Like [`template_from_str`](Self::template_from_str) but with a name.
    ///
    /// The name shows up in errors.
    pub fn template_from_named_str(
        &self,
        name: &'source str,
        source: &'source str,
    ) -> Template<'_, 'source> {
        let tmpl = LoadedTemplate::new(name.into(), source.into());
        Template::new(self, TemplateRef::Owned(Arc::new(tmpl)))
    }

    /// Renders a template given by name or by text.
    ///
    /// An argument that contains markup, a token or a line break is always
    /// rendered as template text.  Anything else is looked up as a template
    /// name first and rendered as text if no such template exists.
    ///
    /// ```
    /// # use teddy::{Environment, context};
    /// let env = Environment::new();
    /// let rv = env.render("<if ok>yes</if>", context!(ok => true)).unwrap();
    /// assert_eq!(rv, "yes");
    /// ```
    pub fn render<S: Serialize>(&self, name_or_text: &str, ctx: S) -> Result<String, Error> {
        if !name_or_text.contains(['<', '{', '\n']) {
            match self.get_template(name_or_text) {
                Ok(tmpl) => return tmpl.render(ctx),
                Err(err) if err.kind() == ErrorKind::TemplateNotFound => {}
                Err(err) => return Err(err),
            }
        }
        self.render_str(name_or_text, ctx)
    }

    /// Renders a template source directly.
    ///
    /// ```
    /// # use teddy::{Environment, context};
    /// let env = Environment::new();
    /// let rv = env.render_str("<p>{greeting}</p>", context!(greeting => "hi"));
    /// assert_eq!(rv.unwrap(), "<p>hi</p>");
    /// ```
    pub fn render_str<S: Serialize>(&self, source: &str, ctx: S) -> Result<String, Error> {
        self.render_named_str("<string>", source, ctx)
    }

    /// Like [`render_str`](Self::render_str) but with a name for errors.
    pub fn render_named_str<S: Serialize>(
        &self,
        name: &str,
        source: &str,
        ctx: S,
    ) -> Result<String, Error> {
        let tmpl = LoadedTemplate::new(name.into(), source.into());
        Template::new(self, TemplateRef::Owned(Arc::new(tmpl))).render(ctx)
    }

    /// Sets the maximum number of passes a render may take.
    ///
    /// Each additional pass over the output and each include consumes one
    /// pass.  The budget is shared by the whole render, so includes that are
    /// merely siblings count as well: a `<loop>` over 1500 rows that includes
    /// a partial per row needs a limit above 1500 even though nothing is
    /// circular.  A render that reaches the limit fails with
    /// [`ErrorKind::PassLimitExceeded`].  Values below one are raised to one.
    pub fn set_max_passes(&mut self, max_passes: u32) {
        self.max_passes = max_passes.max(1);
    }

    /// Returns the maximum number of passes.
    pub fn max_passes(&self) -> u32 {
        self.max_passes
    }

    /// Sets how chatty the engine is.
    ///
    /// Diagnostics are emitted through `tracing`.  `0` is silent, `1` reports
    /// warnings such as missing includes, `2` adds notes about dropped
    /// malformed tags and `3` adds per-render debug output.
    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.verbosity = verbosity;
    }

    /// Returns the verbosity level.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Changes what happens to tokens that do not resolve.
    pub fn set_undefined_behavior(&mut self, behavior: UndefinedBehavior) {
        self.undefined_behavior = behavior;
    }

    /// Returns the current undefined behavior.
    pub fn undefined_behavior(&self) -> UndefinedBehavior {
        self.undefined_behavior
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context;
    use similar_asserts::assert_eq;

    #[test]
    fn test_is_send_and_sync() {
        fn test<T: Send + Sync>() {}
        test::<Environment>();
        test::<Template>();
    }

    #[test]
    fn test_render_name_or_text() {
        let mut env = Environment::new();
        env.add_template("hello", "<b>{name}</b>");
        assert_eq!(env.render("hello", context!(name => "x")).unwrap(), "<b>x</b>");
        assert_eq!(env.render("plain words", context!()).unwrap(), "plain words");
        assert_eq!(env.render("{name}", context!(name => "y")).unwrap(), "y");
    }

    #[test]
    fn test_max_passes_clamped() {
        let mut env = Environment::new();
        env.set_max_passes(0);
        assert_eq!(env.max_passes(), 1);
    }
}
