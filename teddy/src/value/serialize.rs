use std::sync::Arc;

use serde::{ser, Serialize, Serializer};

use crate::error::Error;
use crate::utils::untrusted_size_hint;
use crate::value::{StringType, Value, ValueMap, ValueRepr};

fn transform<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    value.serialize(ValueSerializer)
}

fn value_map_with_capacity(capacity: usize) -> ValueMap {
    ValueMap::with_capacity(untrusted_size_hint(capacity))
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            ValueRepr::Bool(b) => serializer.serialize_bool(b),
            ValueRepr::U64(u) => serializer.serialize_u64(u),
            ValueRepr::I64(i) => serializer.serialize_i64(i),
            ValueRepr::F64(f) => serializer.serialize_f64(f),
            ValueRepr::None | ValueRepr::Undefined => serializer.serialize_unit(),
            ValueRepr::String(ref s, _) => serializer.serialize_str(s),
            ValueRepr::Seq(ref elements) => elements.serialize(serializer),
            ValueRepr::Map(ref entries) => {
                use serde::ser::SerializeMap;
                let mut map = ok!(serializer.serialize_map(Some(entries.len())));
                for (k, v) in entries.iter() {
                    ok!(map.serialize_entry(&**k, v));
                }
                map.end()
            }
        }
    }
}

/// Serializer that turns any [`Serialize`] type into a [`Value`].
///
/// This is what [`Value::from_serialize`] uses internally.  Byte strings are
/// decoded lossily as UTF-8, map keys are converted to their display form.
pub struct ValueSerializer;

impl Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeSeq;
    type SerializeTuple = SerializeSeq;
    type SerializeTupleStruct = SerializeSeq;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value, Error> {
        Ok(Value(ValueRepr::Bool(v)))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v as i64)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v as i64)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v as i64)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, Error> {
        Ok(Value(ValueRepr::I64(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, Error> {
        Ok(match i64::try_from(v) {
            Ok(v) => Value(ValueRepr::I64(v)),
            Err(_) => Value(ValueRepr::F64(v as f64)),
        })
    }

    fn serialize_u8(self, v: u8) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v as u64)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v as u64)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v as u64)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, Error> {
        Ok(Value(ValueRepr::U64(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, Error> {
        Ok(match u64::try_from(v) {
            Ok(v) => Value(ValueRepr::U64(v)),
            Err(_) => Value(ValueRepr::F64(v as f64)),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<Value, Error> {
        Ok(Value(ValueRepr::F64(v as f64)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, Error> {
        Ok(Value(ValueRepr::F64(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value, Error> {
        Ok(Value::from(v.to_string()))
    }

    fn serialize_str(self, value: &str) -> Result<Value, Error> {
        Ok(Value(ValueRepr::String(
            Arc::from(value),
            StringType::Normal,
        )))
    }

    fn serialize_bytes(self, value: &[u8]) -> Result<Value, Error> {
        Ok(Value::from(String::from_utf8_lossy(value).into_owned()))
    }

    fn serialize_none(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::None))
    }

    fn serialize_some<T: ?Sized>(self, value: &T) -> Result<Value, Error>
    where
        T: Serialize,
    {
        transform(value)
    }

    fn serialize_unit(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::None))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, Error> {
        Ok(Value(ValueRepr::None))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, Error> {
        Ok(Value::from(variant))
    }

    fn serialize_newtype_struct<T: ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize,
    {
        transform(value)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, Error>
    where
        T: Serialize,
    {
        let mut map = value_map_with_capacity(1);
        map.insert(Arc::from(variant), ok!(transform(value)));
        Ok(Value::from_map(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeSeq, Error> {
        Ok(SerializeSeq {
            elements: Vec::with_capacity(untrusted_size_hint(len.unwrap_or(0))),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeSeq, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeSeq, Error> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, Error> {
        Ok(SerializeTupleVariant {
            name: variant,
            fields: Vec::with_capacity(untrusted_size_hint(len)),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap, Error> {
        Ok(SerializeMap {
            entries: value_map_with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeStruct, Error> {
        Ok(SerializeStruct {
            fields: value_map_with_capacity(len),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeStructVariant, Error> {
        Ok(SerializeStructVariant {
            variant,
            map: value_map_with_capacity(len),
        })
    }
}

pub struct SerializeSeq {
    elements: Vec<Value>,
}

impl SerializeSeq {
    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        self.elements.push(ok!(transform(value)));
        Ok(())
    }

    fn finish(self) -> Result<Value, Error> {
        Ok(Value(ValueRepr::Seq(Arc::new(self.elements))))
    }
}

impl ser::SerializeSeq for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        self.finish()
    }
}

impl ser::SerializeTuple for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SerializeSeq {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value, Error> {
        self.finish()
    }
}

pub struct SerializeTupleVariant {
    name: &'static str,
    fields: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.fields.push(ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut map = value_map_with_capacity(1);
        map.insert(
            Arc::from(self.name),
            Value(ValueRepr::Seq(Arc::new(self.fields))),
        );
        Ok(Value::from_map(map))
    }
}

pub struct SerializeMap {
    entries: ValueMap,
    key: Option<Arc<str>>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized>(&mut self, key: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        let key = ok!(transform(key));
        self.key = Some(match key.0 {
            ValueRepr::String(s, _) => s,
            _ => Arc::from(key.to_string()),
        });
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        match self.key.take() {
            Some(key) => {
                self.entries.insert(key, ok!(transform(value)));
                Ok(())
            }
            None => Err(ser::Error::custom("serialize_value called before serialize_key")),
        }
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::from_map(self.entries))
    }
}

pub struct SerializeStruct {
    fields: ValueMap,
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.fields.insert(Arc::from(key), ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        Ok(Value::from_map(self.fields))
    }
}

pub struct SerializeStructVariant {
    variant: &'static str,
    map: ValueMap,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error>
    where
        T: Serialize,
    {
        self.map.insert(Arc::from(key), ok!(transform(value)));
        Ok(())
    }

    fn end(self) -> Result<Value, Error> {
        let mut rv = value_map_with_capacity(1);
        rv.insert(Arc::from(self.variant), Value::from_map(self.map));
        Ok(Value::from_map(rv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde::Serialize;
    use similar_asserts::assert_eq;

    #[derive(Serialize)]
    struct Page {
        title: &'static str,
        tags: Vec<&'static str>,
        kind: Kind,
    }

    #[derive(Serialize)]
    #[allow(dead_code)]
    enum Kind {
        Article,
        Redirect(String),
    }

    #[test]
    fn test_struct_serialization() {
        let value = Value::from_serialize(&Page {
            title: "Home",
            tags: vec!["a", "b"],
            kind: Kind::Article,
        });
        assert_eq!(value.get_path("title"), Some(Value::from("Home")));
        assert_eq!(value.get_path("tags.1"), Some(Value::from("b")));
        assert_eq!(value.get_path("kind"), Some(Value::from("Article")));
    }

    #[test]
    fn test_newtype_variant() {
        let value = Value::from_serialize(&Kind::Redirect("/x".into()));
        assert_eq!(value.get_path("Redirect"), Some(Value::from("/x")));
    }

    #[test]
    fn test_non_string_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(1, "one");
        let value = Value::from_serialize(&map);
        assert_eq!(value.get_attr("1"), Some(Value::from("one")));
    }

    #[test]
    fn test_roundtrip_through_json() {
        let value = Value::from_serialize(&serde_json::json!({"a": [1, true, null]}));
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"a":[1,true,null]}"#
        );
    }
}
