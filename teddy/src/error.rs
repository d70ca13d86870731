use std::borrow::Cow;
use std::fmt;

/// Represents template errors.
///
/// Teddy is deliberately forgiving: malformed directives are dropped and
/// unresolved references are left in the output.  The errors that remain
/// are the ones that make a render impossible to complete, most importantly
/// [`ErrorKind::PassLimitExceeded`] which aborts runaway renders.
///
/// # Example
///
/// Here is an example of how you might want to render errors:
///
/// ```rust
/// # let env = teddy::Environment::new();
/// match env.render_str("<p>{name}</p>", teddy::context!(name => "World")) {
///     Ok(result) => println!("{}", result),
///     Err(err) => {
///         eprintln!("Could not render template:");
///         eprintln!("  {}", err);
///     }
/// }
/// ```
pub struct Error {
    kind: ErrorKind,
    detail: Option<Cow<'static, str>>,
    name: Option<String>,
    pass_limit: Option<u32>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("detail", &self.detail)
            .field("name", &self.name)
            .field("pass_limit", &self.pass_limit)
            .field("source", &self.source)
            .finish()
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl Eq for Error {}

/// An enum describing the error kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The render needed more passes than the configured maximum.
    ///
    /// This is what circular includes and self referencing include
    /// arguments turn into.
    PassLimitExceeded,
    /// A template was requested by name and could not be found.
    TemplateNotFound,
    /// An operation failed, for instance a loader could not read a file.
    InvalidOperation,
    /// A model value could not be converted into the internal format.
    BadSerialization,
}

impl ErrorKind {
    fn description(self) -> &'static str {
        match self {
            ErrorKind::PassLimitExceeded => "render aborted",
            ErrorKind::TemplateNotFound => "template not found",
            ErrorKind::InvalidOperation => "invalid operation",
            ErrorKind::BadSerialization => "could not serialize to internal format",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref detail) = self.detail {
            write!(f, "{}: {}", self.kind, detail)?;
        } else {
            write!(f, "{}", self.kind)?;
        }
        if let Some(ref filename) = self.name {
            write!(f, " (in {})", filename)?
        }
        Ok(())
    }
}

impl Error {
    /// Creates a new error with kind and detail.
    pub fn new<D: Into<Cow<'static, str>>>(kind: ErrorKind, detail: D) -> Error {
        Error {
            kind,
            detail: Some(detail.into()),
            name: None,
            pass_limit: None,
            source: None,
        }
    }

    pub(crate) fn new_not_found(name: &str) -> Error {
        Error::new(
            ErrorKind::TemplateNotFound,
            format!("template {name:?} does not exist"),
        )
    }

    pub(crate) fn new_pass_limit(limit: u32) -> Error {
        let mut err = Error::new(
            ErrorKind::PassLimitExceeded,
            format!("exceeded the maximum of {limit} passes (every include uses one), check for circular includes"),
        );
        err.pass_limit = Some(limit);
        err
    }

    pub(crate) fn set_name(&mut self, filename: &str) {
        if self.name.is_none() {
            self.name = Some(filename.into());
        }
    }

    /// Attaches another error as source to this error.
    #[allow(unused)]
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error detail
    ///
    /// The detail is an error message that provides further details about
    /// the error kind.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the name of the template that was rendered.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the configured pass limit for aborted renders.
    ///
    /// This is only set for [`ErrorKind::PassLimitExceeded`] and lets a
    /// caller retry with a higher budget.
    pub fn pass_limit(&self) -> Option<u32> {
        self.pass_limit
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|err| err.as_ref() as _)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            kind,
            detail: None,
            name: None,
            pass_limit: None,
            source: None,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Error::new(ErrorKind::BadSerialization, msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_display() {
        let mut err = Error::new_pass_limit(20);
        assert_eq!(
            err.to_string(),
            "render aborted: exceeded the maximum of 20 passes (every include uses one), check for circular includes"
        );
        err.set_name("index.html");
        assert_eq!(err.name(), Some("index.html"));
        assert!(err.to_string().ends_with(" (in index.html)"));
        assert_eq!(err.pass_limit(), Some(20));
    }

    #[test]
    fn test_kind_equality() {
        assert_eq!(
            Error::new_not_found("a"),
            Error::from(ErrorKind::TemplateNotFound)
        );
        assert_eq!(Error::from(ErrorKind::InvalidOperation).detail(), None);
    }
}
