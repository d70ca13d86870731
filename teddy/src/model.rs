use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

type Locals = BTreeMap<Arc<str>, Value>;

pub(crate) enum ModelBase<'m> {
    Root(Value),
    Parent(&'m Model<'m>),
}

/// The data a scan resolves names against.
///
/// Loops and includes never mutate the model they were handed.  Instead they
/// extend it with a child that shadows some names and falls back to its
/// parent for the rest.
pub(crate) struct Model<'m> {
    base: ModelBase<'m>,
    locals: Locals,
}

impl<'m> fmt::Debug for Model<'m> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn dump<'a>(
            m: &mut fmt::DebugMap<'_, '_>,
            seen: &mut HashSet<&'a str>,
            model: &'a Model<'a>,
        ) {
            for (key, value) in model.locals.iter() {
                if seen.insert(&**key) {
                    m.entry(key, value);
                }
            }
            match model.base {
                ModelBase::Parent(parent) => dump(m, seen, parent),
                ModelBase::Root(ref value) => {
                    if let Some(entries) = value.entries() {
                        for (key, value) in entries {
                            if let Some(key) = key.as_str() {
                                if !seen.contains(key) {
                                    m.entry(&key, &value);
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut m = f.debug_map();
        let mut seen = HashSet::new();
        dump(&mut m, &mut seen, self);
        m.finish()
    }
}

impl Model<'static> {
    /// Creates the model of a top-level render.
    pub fn new(root: Value) -> Model<'static> {
        Model {
            base: ModelBase::Root(root),
            locals: Locals::new(),
        }
    }
}

impl<'m> Model<'m> {
    /// Creates a child model that shadows this one.
    pub fn extend(&'m self) -> Model<'m> {
        Model {
            base: ModelBase::Parent(self),
            locals: Locals::new(),
        }
    }

    /// Binds a name in this model.
    pub fn set(&mut self, name: &str, value: Value) {
        self.locals.insert(Arc::from(name), value);
    }

    /// Looks up a top-level name.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.locals.get(name) {
            return Some(value.clone());
        }
        match self.base {
            ModelBase::Parent(parent) => parent.get(name),
            ModelBase::Root(ref value) => value.get_attr(name),
        }
    }

    /// Looks up a dotted path such as `page.links.0.title`.
    ///
    /// Segments after the first walk into mappings by key and into sequences
    /// by index.
    pub fn lookup(&self, path: &str) -> Option<Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        if head.is_empty() {
            return None;
        }
        let value = some!(self.get(head));
        match rest {
            Some(rest) => value.get_path(rest),
            None => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::context;
    use similar_asserts::assert_eq;

    #[test]
    fn test_shadowing() {
        let root = Model::new(context!(name => "root", other => 1));
        let mut child = root.extend();
        child.set("name", Value::from("child"));
        assert_eq!(child.lookup("name"), Some(Value::from("child")));
        assert_eq!(child.lookup("other"), Some(Value::from(1)));
        assert_eq!(root.lookup("name"), Some(Value::from("root")));
    }

    #[test]
    fn test_dotted_lookup() {
        let root = Model::new(context!(page => context!(links => vec!["a", "b"])));
        assert_eq!(root.lookup("page.links.1"), Some(Value::from("b")));
        assert_eq!(root.lookup("page.missing"), None);
        assert_eq!(root.lookup(".links"), None);
    }

    #[test]
    fn test_debug_shows_visible_names() {
        let root = Model::new(context!(a => 1, b => 2));
        let mut child = root.extend();
        child.set("a", Value::from(3));
        assert_eq!(format!("{:?}", child), "{\"a\": 3, \"b\": 2}");
    }
}
