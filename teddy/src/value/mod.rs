//! Provides a dynamic value type abstraction.
//!
//! This module gives access to a dynamically typed value which is used by
//! the template engine during rendering.  Every model handed to a render is
//! converted into a [`Value`] through [`serde`], so in most cases you never
//! construct one by hand:
//!
//! ```
//! # use teddy::value::Value;
//! let value = Value::from_serialize(&vec![1, 2, 3]);
//! assert_eq!(value.to_string(), "[1, 2, 3]");
//! ```
//!
//! # Truthiness
//!
//! Conditionals (`<if>`, `<unless>` and the one-line `if-` attribute) ask a
//! value whether it [is true](Value::is_true).  A value is true unless it is
//! `false`, none, undefined, an empty sequence or an empty mapping.  Note
//! that unlike in many scripting languages empty strings and zero are true;
//! use a literal comparison (`<if name=''>`) to test for those.
//!
//! # Safe Strings
//!
//! Strings can be marked as safe with [`Value::from_safe_string`].  Safe
//! strings are emitted without HTML escaping.  Include arguments are bound as
//! safe strings because they contain already rendered markup.
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::Error;

pub use crate::value::serialize::ValueSerializer;

mod serialize;

/// The mapping type used by [`Value`].
///
/// Mappings keep their insertion order so loops over a mapping follow the
/// order of the source collection.
pub type ValueMap = indexmap::IndexMap<Arc<str>, Value>;

/// Describes the kind of value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[non_exhaustive]
pub enum ValueKind {
    /// The value is undefined
    Undefined,
    /// The value is the none singleton ([`()`])
    None,
    /// The value is a [`bool`]
    Bool,
    /// The value is a number of a supported type.
    Number,
    /// The value is a string.
    String,
    /// The value is an array of other values.
    Seq,
    /// The value is a key/value mapping.
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            ValueKind::Undefined => "undefined",
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "map",
        })
    }
}

/// Type type of string
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum StringType {
    Normal,
    Safe,
}

#[derive(Clone)]
pub(crate) enum ValueRepr {
    Undefined,
    None,
    Bool(bool),
    U64(u64),
    I64(i64),
    F64(f64),
    String(Arc<str>, StringType),
    Seq(Arc<Vec<Value>>),
    Map(Arc<ValueMap>),
}

impl fmt::Debug for ValueRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueRepr::Undefined => f.write_str("undefined"),
            ValueRepr::None => f.write_str("none"),
            ValueRepr::Bool(val) => fmt::Debug::fmt(val, f),
            ValueRepr::U64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::I64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::F64(val) => fmt::Debug::fmt(val, f),
            ValueRepr::String(val, _) => fmt::Debug::fmt(val, f),
            ValueRepr::Seq(val) => f.debug_list().entries(val.iter()).finish(),
            ValueRepr::Map(val) => f.debug_map().entries(val.iter()).finish(),
        }
    }
}

/// Represents a dynamically typed value in the template engine.
#[derive(Clone)]
pub struct Value(pub(crate) ValueRepr);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (ValueRepr::Undefined, ValueRepr::Undefined) => true,
            (ValueRepr::None, ValueRepr::None) => true,
            (ValueRepr::Bool(a), ValueRepr::Bool(b)) => a == b,
            (ValueRepr::String(a, _), ValueRepr::String(b, _)) => a == b,
            (ValueRepr::Seq(a), ValueRepr::Seq(b)) => a == b,
            (ValueRepr::Map(a), ValueRepr::Map(b)) => a == b,
            _ => match (as_f64(self), as_f64(other)) {
                (Some(a), Some(b)) => a.partial_cmp(&b) == Some(Ordering::Equal),
                _ => false,
            },
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value.0 {
        ValueRepr::U64(x) => Some(x as f64),
        ValueRepr::I64(x) => Some(x as f64),
        ValueRepr::F64(x) => Some(x),
        _ => None,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            ValueRepr::Undefined | ValueRepr::None => Ok(()),
            ValueRepr::Bool(val) => val.fmt(f),
            ValueRepr::U64(val) => val.fmt(f),
            ValueRepr::I64(val) => val.fmt(f),
            ValueRepr::F64(val) => {
                if val.is_nan() {
                    f.write_str("NaN")
                } else if val.is_infinite() {
                    write!(
                        f,
                        "{}Infinity",
                        if val.is_sign_negative() { "-" } else { "" }
                    )
                } else {
                    val.fmt(f)
                }
            }
            ValueRepr::String(val, _) => f.write_str(val),
            ValueRepr::Seq(items) => {
                ok!(f.write_str("["));
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(", "));
                    }
                    ok!(write_nested(f, item));
                }
                f.write_str("]")
            }
            ValueRepr::Map(map) => {
                ok!(f.write_str("{"));
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        ok!(f.write_str(", "));
                    }
                    ok!(write!(f, "{:?}: ", key));
                    ok!(write_nested(f, value));
                }
                f.write_str("}")
            }
        }
    }
}

/// Strings inside of containers are shown quoted.
fn write_nested(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value.0 {
        ValueRepr::String(ref s, _) => write!(f, "{:?}", s),
        ValueRepr::Undefined | ValueRepr::None => f.write_str("null"),
        _ => fmt::Display::fmt(value, f),
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::UNDEFINED
    }
}

#[allow(clippy::len_without_is_empty)]
impl Value {
    /// The undefined value.
    ///
    /// This constant exists because the undefined type does not exist in Rust
    /// and this is the only way to construct it.
    pub const UNDEFINED: Value = Value(ValueRepr::Undefined);

    /// Creates a value from something that can be serialized.
    ///
    /// This is the method that Teddy will generally use whenever a serializable
    /// object is passed to one of the APIs that internally want to create a value.
    /// For instance this is what [`context!`](crate::context) and
    /// [`render`](crate::Template::render) will use.
    ///
    /// ```
    /// # use teddy::value::Value;
    /// let val = Value::from_serialize(&vec![1, 2, 3]);
    /// ```
    ///
    /// This method does not fail.  If the [`Serialize`] implementation of the
    /// value errors, the undefined value is returned instead.  To observe the
    /// error use [`try_from_serialize`](Self::try_from_serialize).
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Value {
        Value::try_from_serialize(value).unwrap_or(Value::UNDEFINED)
    }

    /// Creates a value from something that can be serialized or fails.
    pub fn try_from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
        value.serialize(ValueSerializer)
    }

    /// Creates a value from a safe string.
    ///
    /// A safe string is one that will bypass auto escaping.  For instance if you
    /// want to have a model value that produces some HTML markup you can use
    /// this.
    pub fn from_safe_string(value: String) -> Value {
        Value(ValueRepr::String(Arc::from(value), StringType::Safe))
    }

    /// Creates a mapping value from a [`ValueMap`].
    pub fn from_map(map: ValueMap) -> Value {
        Value(ValueRepr::Map(Arc::new(map)))
    }

    /// Returns the kind of the value.
    ///
    /// This can be used to determine what's in the value before trying to
    /// perform operations on it.
    pub fn kind(&self) -> ValueKind {
        match self.0 {
            ValueRepr::Undefined => ValueKind::Undefined,
            ValueRepr::None => ValueKind::None,
            ValueRepr::Bool(_) => ValueKind::Bool,
            ValueRepr::U64(_) | ValueRepr::I64(_) | ValueRepr::F64(_) => ValueKind::Number,
            ValueRepr::String(..) => ValueKind::String,
            ValueRepr::Seq(_) => ValueKind::Seq,
            ValueRepr::Map(_) => ValueKind::Map,
        }
    }

    /// Is this value true?
    ///
    /// Everything is true except for `false`, none, undefined and empty
    /// sequences and mappings.
    pub fn is_true(&self) -> bool {
        match self.0 {
            ValueRepr::Bool(val) => val,
            ValueRepr::None | ValueRepr::Undefined => false,
            ValueRepr::Seq(ref items) => !items.is_empty(),
            ValueRepr::Map(ref map) => !map.is_empty(),
            ValueRepr::U64(_) | ValueRepr::I64(_) | ValueRepr::F64(_) | ValueRepr::String(..) => {
                true
            }
        }
    }

    /// Returns `true` if this value is safe.
    pub fn is_safe(&self) -> bool {
        matches!(&self.0, ValueRepr::String(_, StringType::Safe))
    }

    /// Returns `true` if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(&self.0, ValueRepr::Undefined)
    }

    /// Returns `true` if this value is none.
    pub fn is_none(&self) -> bool {
        matches!(&self.0, ValueRepr::None)
    }

    /// If the value is a string, return it.
    pub fn as_str(&self) -> Option<&str> {
        match &self.0 {
            ValueRepr::String(ref s, _) => Some(s as &str),
            _ => None,
        }
    }

    /// Returns the length of the contained value.
    ///
    /// Strings report their length in characters, sequences and mappings
    /// their number of items.
    pub fn len(&self) -> Option<usize> {
        match self.0 {
            ValueRepr::String(ref s, _) => Some(s.chars().count()),
            ValueRepr::Seq(ref items) => Some(items.len()),
            ValueRepr::Map(ref map) => Some(map.len()),
            _ => None,
        }
    }

    /// Looks up an attribute by name.
    ///
    /// Mappings are looked up by key, sequences by a numeric index.
    ///
    /// ```
    /// # use teddy::value::Value;
    /// # use teddy::context;
    /// let ctx = context!(letters => vec!["a", "b"]);
    /// let letters = ctx.get_attr("letters").unwrap();
    /// assert_eq!(letters.get_attr("1"), Some(Value::from("b")));
    /// ```
    pub fn get_attr(&self, key: &str) -> Option<Value> {
        match self.0 {
            ValueRepr::Map(ref map) => map.get(key).cloned(),
            ValueRepr::Seq(ref items) => key
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx))
                .cloned(),
            _ => None,
        }
    }

    /// Looks up a dotted path (`a.b.0.c`) below this value.
    pub fn get_path(&self, path: &str) -> Option<Value> {
        let mut rv = self.clone();
        for segment in path.split('.') {
            rv = some!(rv.get_attr(segment));
        }
        Some(rv)
    }

    /// Iterates over the entries of a sequence or mapping.
    ///
    /// Sequence entries are paired with their index, mapping entries with
    /// their key.  Returns `None` for values that cannot be looped over.
    pub fn entries(&self) -> Option<Entries<'_>> {
        match self.0 {
            ValueRepr::Seq(ref items) => Some(Entries::Seq(items.iter().enumerate())),
            ValueRepr::Map(ref map) => Some(Entries::Map(map.iter())),
            _ => None,
        }
    }

    /// Checks the value against a literal from a template.
    ///
    /// This compares the display form of the value with the literal.
    /// Undefined values never match, not even an empty literal.
    pub(crate) fn matches_literal(&self, literal: &str) -> bool {
        match self.0 {
            ValueRepr::Undefined => false,
            ValueRepr::String(ref s, _) => &**s == literal,
            _ => self.to_string() == literal,
        }
    }
}

/// Iterator over the entries of a sequence or mapping.
///
/// Created by [`Value::entries`].
pub enum Entries<'a> {
    #[doc(hidden)]
    Seq(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
    #[doc(hidden)]
    Map(indexmap::map::Iter<'a, Arc<str>, Value>),
}

impl<'a> Iterator for Entries<'a> {
    type Item = (Value, Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Entries::Seq(iter) => iter.next().map(|(idx, v)| (Value::from(idx), v.clone())),
            Entries::Map(iter) => iter
                .next()
                .map(|(k, v)| (Value(ValueRepr::String(k.clone(), StringType::Normal)), v.clone())),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Entries::Seq(iter) => iter.size_hint(),
            Entries::Map(iter) => iter.size_hint(),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Value {
        Value(ValueRepr::None)
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Value {
        Value(ValueRepr::Bool(val))
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Value {
        Value(ValueRepr::String(Arc::from(val), StringType::Normal))
    }
}

impl From<String> for Value {
    fn from(val: String) -> Value {
        Value(ValueRepr::String(Arc::from(val), StringType::Normal))
    }
}

impl From<Arc<str>> for Value {
    fn from(val: Arc<str>) -> Value {
        Value(ValueRepr::String(val, StringType::Normal))
    }
}

macro_rules! value_from_unsigned {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Value {
                    Value(ValueRepr::U64(val as u64))
                }
            }
        )*
    };
}

macro_rules! value_from_signed {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Value {
                    Value(ValueRepr::I64(val as i64))
                }
            }
        )*
    };
}

value_from_unsigned!(u8, u16, u32, u64, usize);
value_from_signed!(i8, i16, i32, i64, isize);

impl From<f32> for Value {
    fn from(val: f32) -> Value {
        Value(ValueRepr::F64(val as f64))
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Value {
        Value(ValueRepr::F64(val))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(val: Vec<T>) -> Value {
        Value(ValueRepr::Seq(Arc::new(
            val.into_iter().map(Into::into).collect(),
        )))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(val: Option<T>) -> Value {
        match val {
            Some(val) => val.into(),
            None => Value(ValueRepr::None),
        }
    }
}

impl From<ValueMap> for Value {
    fn from(val: ValueMap) -> Value {
        Value::from_map(val)
    }
}

impl<K: Into<Arc<str>>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Value {
        Value::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use similar_asserts::assert_eq;

    #[test]
    fn test_truthiness() {
        assert!(!Value::UNDEFINED.is_true());
        assert!(!Value::from(()).is_true());
        assert!(!Value::from(false).is_true());
        assert!(!Value::from(Vec::<i32>::new()).is_true());
        assert!(!Value::from_map(ValueMap::new()).is_true());
        assert!(Value::from(true).is_true());
        assert!(Value::from("").is_true());
        assert!(Value::from(0).is_true());
        assert!(Value::from(vec![1]).is_true());
    }

    #[test]
    fn test_get_path() {
        let value = Value::from_serialize(&serde_json::json!({
            "a": {"b": [{"c": 42}]}
        }));
        assert_eq!(value.get_path("a.b.0.c"), Some(Value::from(42)));
        assert_eq!(value.get_path("a.b.1.c"), None);
        assert_eq!(value.get_path("a.x"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(1.0).to_string(), "1");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::from(()).to_string(), "");
        assert_eq!(
            Value::from_serialize(&serde_json::json!({"a": ["x", null, 2]})).to_string(),
            r#"{"a": ["x", null, 2]}"#
        );
    }

    #[test]
    fn test_matches_literal() {
        assert!(Value::from("hello").matches_literal("hello"));
        assert!(Value::from(5).matches_literal("5"));
        assert!(Value::from(true).matches_literal("true"));
        assert!(Value::from(()).matches_literal(""));
        assert!(!Value::UNDEFINED.matches_literal(""));
    }

    #[test]
    fn test_entries_keep_order() {
        let value = Value::from_serialize(&serde_json::json!({"z": 1, "a": 2}));
        let keys: Vec<_> = value
            .entries()
            .unwrap()
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
