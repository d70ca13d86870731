use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "loader")]
use std::fs;
#[cfg(feature = "loader")]
use std::io;
#[cfg(feature = "loader")]
use std::path::{Path, PathBuf};

use memo_map::MemoMap;

use crate::error::Error;
#[cfg(feature = "loader")]
use crate::error::ErrorKind;
use crate::template::LoadedTemplate;

type LoadFunc = dyn for<'a> Fn(&'a str) -> Result<Option<String>, Error> + Send + Sync;

/// Holds the templates known to an environment.
///
/// Templates added with borrowed names and sources are kept as they are,
/// everything else (including templates produced by the loader) is owned.
/// Loaded templates are memoized so a loader is consulted once per name.
#[derive(Clone, Default)]
pub(crate) struct LoaderStore<'source> {
    loader: Option<Arc<LoadFunc>>,
    owned_templates: MemoMap<Arc<str>, Arc<LoadedTemplate<'static>>>,
    borrowed_templates: BTreeMap<&'source str, Arc<LoadedTemplate<'source>>>,
}

impl fmt::Debug for LoaderStore<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut l = f.debug_list();
        for key in self.owned_templates.keys() {
            l.entry(key);
        }
        for key in self.borrowed_templates.keys() {
            if !self.owned_templates.contains_key(*key) {
                l.entry(key);
            }
        }
        l.finish()
    }
}

impl<'source> LoaderStore<'source> {
    pub fn insert(&mut self, name: &'source str, source: &'source str) {
        self.insert_cow(Cow::Borrowed(name), Cow::Borrowed(source))
    }

    pub fn insert_cow(&mut self, name: Cow<'source, str>, source: Cow<'source, str>) {
        match (name, source) {
            (Cow::Borrowed(name), Cow::Borrowed(source)) => {
                self.owned_templates.remove(name);
                self.borrowed_templates.insert(
                    name,
                    Arc::new(LoadedTemplate::new(name.into(), source.into())),
                );
            }
            (name, source) => {
                self.borrowed_templates.remove(&name as &str);
                let name: Arc<str> = name.into();
                let tmpl = LoadedTemplate::new(
                    Cow::Owned(name.to_string()),
                    Cow::Owned(source.into_owned()),
                );
                self.owned_templates.replace(name, Arc::new(tmpl));
            }
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.borrowed_templates.remove(name);
        self.owned_templates.remove(name);
    }

    pub fn clear(&mut self) {
        self.borrowed_templates.clear();
        self.owned_templates.clear();
    }

    pub fn get(&self, name: &str) -> Result<&LoadedTemplate<'source>, Error> {
        if let Some(rv) = self.borrowed_templates.get(name) {
            return Ok(&**rv);
        }
        let key: Arc<str> = name.into();
        self.owned_templates
            .get_or_try_insert(&key, || -> Result<_, Error> {
                let source = match self.loader {
                    Some(ref loader) => ok!(loader(name)),
                    None => None,
                };
                match source {
                    Some(source) => Ok(Arc::new(LoadedTemplate::new(
                        Cow::Owned(name.to_string()),
                        Cow::Owned(source),
                    ))),
                    None => Err(Error::new_not_found(name)),
                }
            })
            .map(|x| &**x)
    }

    pub fn set_loader<F>(&mut self, f: F)
    where
        F: Fn(&str) -> Result<Option<String>, Error> + Send + Sync + 'static,
    {
        self.loader = Some(Arc::new(f));
    }
}

/// Safely joins a template name to a base directory.
///
/// Segments starting with a dot or containing a backslash are refused.
#[cfg(feature = "loader")]
pub(crate) fn safe_join(base: &Path, template: &str) -> Option<PathBuf> {
    let mut rv = base.to_path_buf();
    for segment in template.split('/') {
        if segment.is_empty() || segment.starts_with('.') || segment.contains('\\') {
            return None;
        }
        rv.push(segment);
    }
    Some(rv)
}

#[cfg(feature = "loader")]
fn read_template(path: &Path) -> Result<Option<String>, Error> {
    if path.is_dir() {
        return Ok(None);
    }
    match fs::read_to_string(path) {
        Ok(result) => Ok(Some(result)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(
            Error::new(ErrorKind::InvalidOperation, "could not read template").with_source(err),
        ),
    }
}

/// Helper to load templates from a given directory.
///
/// This creates a dynamic loader which looks up templates in the given
/// directory.  A name is first tried as a path relative to the directory and
/// then with `.html` appended, so `<include src="partials/nav">` finds
/// `partials/nav.html`.  Names that contain a segment starting with a dot
/// (`.`) cannot be loaded.
///
/// # Example
///
/// ```rust
/// # use teddy::{path_loader, Environment};
/// fn create_env() -> Environment<'static> {
///     let mut env = Environment::new();
///     env.set_loader(path_loader("path/to/templates"));
///     env
/// }
/// ```
#[cfg(feature = "loader")]
#[cfg_attr(docsrs, doc(cfg(feature = "loader")))]
pub fn path_loader<'x, P: AsRef<Path> + 'x>(
    dir: P,
) -> impl for<'a> Fn(&'a str) -> Result<Option<String>, Error> + Send + Sync + 'static {
    let dir = dir.as_ref().to_path_buf();
    move |name| {
        let path = match safe_join(&dir, name) {
            Some(path) => path,
            None => return Ok(None),
        };
        if let Some(rv) = ok!(read_template(&path)) {
            return Ok(Some(rv));
        }
        if name.ends_with(".html") {
            return Ok(None);
        }
        let mut with_ext = path.into_os_string();
        with_ext.push(".html");
        read_template(Path::new(&with_ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_store_borrowed_and_owned() {
        let mut store = LoaderStore::default();
        store.insert("a", "<p>{!x!}a</p>");
        store.insert_cow("b".to_string().into(), "b".into());
        assert_eq!(store.get("a").unwrap().source(), "<p>a</p>");
        assert_eq!(store.get("b").unwrap().source(), "b");
        store.remove("a");
        assert!(store.get("a").is_err());
        store.clear();
        assert!(store.get("b").is_err());
    }

    #[test]
    fn test_store_loader_memoizes() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let mut store = LoaderStore::default();
        store.set_loader({
            let calls = calls.clone();
            move |name| {
                calls.fetch_add(1, Ordering::Relaxed);
                Ok((name == "known").then(|| "hello".to_string()))
            }
        });
        assert_eq!(store.get("known").unwrap().source(), "hello");
        assert_eq!(store.get("known").unwrap().source(), "hello");
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(
            store.get("unknown").unwrap_err().kind(),
            crate::ErrorKind::TemplateNotFound
        );
    }

    #[cfg(feature = "loader")]
    #[test]
    fn test_safe_join() {
        assert_eq!(
            safe_join(Path::new("foo"), "bar/baz"),
            Some(PathBuf::from("foo").join("bar").join("baz"))
        );
        assert_eq!(safe_join(Path::new("foo"), ".bar/baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar/.baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar/../baz"), None);
        assert_eq!(safe_join(Path::new("foo"), "bar\\baz"), None);
    }
}
