//! Native hierarchical structure: plain maps, lists and scalars.
//!
//! This is the shape handed to and received from the rest of the host
//! program. It shares nothing with the tree it was produced from.

use std::fmt;
use std::mem;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::domain::scalar::Scalar;

/// A nested map/list/scalar value mirroring the shape of a tree.
#[derive(Debug)]
pub enum Nested {
    Scalar(Scalar),
    List(Vec<Nested>),
    Map(IndexMap<String, Nested>),
}

impl Default for Nested {
    fn default() -> Self {
        Nested::Map(IndexMap::new())
    }
}

impl Nested {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Nested::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Nested>> {
        match self {
            Nested::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Nested>> {
        match self {
            Nested::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Nested>> {
        match self {
            Nested::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<String, Nested>> {
        match self {
            Nested::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Take the map out of this value, leaving an empty one behind.
    pub fn into_map(mut self) -> Option<IndexMap<String, Nested>> {
        self.as_map_mut().map(mem::take)
    }

    /// Take the list out of this value, leaving an empty one behind.
    pub fn into_list(mut self) -> Option<Vec<Nested>> {
        self.as_list_mut().map(mem::take)
    }

    /// Look up a value by map keys; an empty path returns `self`.
    pub fn get(&self, path: &[&str]) -> Option<&Nested> {
        let mut current = self;
        for segment in path {
            current = current.as_map()?.get(*segment)?;
        }
        Some(current)
    }
}

impl PartialEq for Nested {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            match (a, b) {
                (Nested::Scalar(x), Nested::Scalar(y)) => {
                    if x != y {
                        return false;
                    }
                }
                (Nested::List(x), Nested::List(y)) => {
                    if x.len() != y.len() {
                        return false;
                    }
                    stack.extend(x.iter().zip(y.iter()));
                }
                (Nested::Map(x), Nested::Map(y)) => {
                    if x.len() != y.len() {
                        return false;
                    }
                    for (key, value) in x {
                        match y.get(key) {
                            Some(other_value) => stack.push((value, other_value)),
                            None => return false,
                        }
                    }
                }
                _ => return false,
            }
        }
        true
    }
}

impl Clone for Nested {
    fn clone(&self) -> Self {
        enum Frame<'a> {
            Enter(&'a Nested),
            ExitList(usize),
            ExitMap(Vec<String>),
        }

        let mut work = vec![Frame::Enter(self)];
        let mut done: Vec<Nested> = Vec::new();
        while let Some(frame) = work.pop() {
            match frame {
                Frame::Enter(Nested::Scalar(value)) => done.push(Nested::Scalar(value.clone())),
                Frame::Enter(Nested::List(items)) => {
                    work.push(Frame::ExitList(items.len()));
                    work.extend(items.iter().rev().map(Frame::Enter));
                }
                Frame::Enter(Nested::Map(map)) => {
                    work.push(Frame::ExitMap(map.keys().cloned().collect()));
                    work.extend(map.values().rev().map(Frame::Enter));
                }
                Frame::ExitList(len) => {
                    let items = done.split_off(done.len() - len);
                    done.push(Nested::List(items));
                }
                Frame::ExitMap(keys) => {
                    let values = done.split_off(done.len() - keys.len());
                    done.push(Nested::Map(keys.into_iter().zip(values).collect()));
                }
            }
        }
        done.pop().unwrap_or_default()
    }
}

impl Drop for Nested {
    fn drop(&mut self) {
        let mut stack: Vec<Nested> = match self {
            Nested::Scalar(_) => return,
            Nested::List(items) => mem::take(items),
            Nested::Map(map) => mem::take(map).into_values().collect(),
        };
        while let Some(mut value) = stack.pop() {
            match &mut value {
                Nested::Scalar(_) => {}
                Nested::List(items) => stack.append(items),
                Nested::Map(map) => stack.extend(mem::take(map).into_values()),
            }
        }
    }
}

impl From<Scalar> for Nested {
    fn from(value: Scalar) -> Self {
        Nested::Scalar(value)
    }
}

impl From<Vec<Nested>> for Nested {
    fn from(items: Vec<Nested>) -> Self {
        Nested::List(items)
    }
}

impl From<IndexMap<String, Nested>> for Nested {
    fn from(map: IndexMap<String, Nested>) -> Self {
        Nested::Map(map)
    }
}

macro_rules! nested_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Nested {
                fn from(value: $t) -> Self {
                    Nested::Scalar(Scalar::from(value))
                }
            }
        )*
    };
}

nested_from_scalar!(&str, String, i64, i32, u32, f64, bool);

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Boolean(b) => serializer.serialize_bool(*b),
            Scalar::Opaque(_) => Err(ser::Error::custom(
                "opaque values have no serialized representation",
            )),
        }
    }
}

/// Deepest nesting (root = 1) that `Serialize for Nested` will emit.
///
/// Serializers recurse on the call stack, so deeper structures are refused
/// with a serialization error rather than serialized.
pub const MAX_SERIALIZE_DEPTH: usize = 128;

struct Bounded<'a> {
    value: &'a Nested,
    depth: usize,
}

impl Serialize for Bounded<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.depth > MAX_SERIALIZE_DEPTH {
            return Err(ser::Error::custom(format!(
                "nesting exceeds {} levels and cannot be serialized",
                MAX_SERIALIZE_DEPTH
            )));
        }
        let depth = self.depth + 1;
        match self.value {
            Nested::Scalar(s) => s.serialize(serializer),
            Nested::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for value in items {
                    seq.serialize_element(&Bounded { value, depth })?;
                }
                seq.end()
            }
            Nested::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, &Bounded { value, depth })?;
                }
                out.end()
            }
        }
    }
}

impl Serialize for Nested {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Bounded {
            value: self,
            depth: 1,
        }
        .serialize(serializer)
    }
}

struct NestedVisitor;

impl<'de> Visitor<'de> for NestedVisitor {
    type Value = Nested;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string, number, boolean, sequence or map with string keys")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Nested, E> {
        Ok(Nested::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Nested, E> {
        Ok(Nested::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Nested, E> {
        i64::try_from(v)
            .map(Nested::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &"an integer within i64 range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Nested, E> {
        Ok(Nested::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Nested, E> {
        Ok(Nested::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Nested, E> {
        Ok(Nested::from(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Nested, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Nested::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Nested, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, Nested>()? {
            map.insert(key, value);
        }
        Ok(Nested::Map(map))
    }
}

impl<'de> Deserialize<'de> for Nested {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NestedVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_json_document_when_deserializing_then_keeps_shape_and_order() {
        let nested: Nested =
            serde_json::from_str(r#"{"z": 1, "a": [true, "x", 2.5], "m": {}}"#).unwrap();
        let map = nested.as_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(
            map["a"],
            Nested::List(vec![Nested::from(true), Nested::from("x"), Nested::from(2.5)])
        );
        assert_eq!(map["m"], Nested::default());
    }

    #[test]
    fn given_null_when_deserializing_then_rejected() {
        assert!(serde_json::from_str::<Nested>(r#"{"a": null}"#).is_err());
    }

    #[test]
    fn given_opaque_scalar_when_serializing_then_fails() {
        let nested = Nested::from(Scalar::opaque(42u8));
        assert!(serde_json::to_string(&nested).is_err());
    }

    fn chain(depth: usize) -> Nested {
        let mut value = Nested::from("bottom");
        for _ in 1..depth {
            let mut map = IndexMap::new();
            map.insert("child".to_string(), value);
            value = Nested::Map(map);
        }
        value
    }

    #[test]
    fn given_nesting_at_limit_when_serializing_then_succeeds() {
        let rendered = serde_json::to_string(&chain(MAX_SERIALIZE_DEPTH)).unwrap();
        assert_eq!(rendered.matches("child").count(), MAX_SERIALIZE_DEPTH - 1);
    }

    #[test]
    fn given_nesting_past_limit_when_serializing_then_fails() {
        let err = serde_json::to_string(&chain(MAX_SERIALIZE_DEPTH + 1)).unwrap_err();
        assert!(err.to_string().contains("nesting exceeds 128 levels"), "got: {err}");

        let mut list = Nested::List(vec![]);
        for _ in 0..MAX_SERIALIZE_DEPTH {
            list = Nested::List(vec![list]);
        }
        assert!(serde_json::to_string(&list).is_err());
    }

    #[test]
    fn given_nested_when_serializing_to_toml_then_renders_tables() {
        let mut db = IndexMap::new();
        db.insert("host".to_string(), Nested::from("localhost"));
        let mut root = IndexMap::new();
        root.insert("db".to_string(), Nested::Map(db));

        let rendered = toml::to_string(&Nested::Map(root)).unwrap();
        assert_eq!(rendered.trim(), "[db]\nhost = \"localhost\"");
    }

    #[test]
    fn given_map_when_taking_it_out_then_returns_entries() {
        let mut map = IndexMap::new();
        map.insert("k".to_string(), Nested::from(1));
        let taken = Nested::Map(map).into_map().unwrap();
        assert_eq!(taken.len(), 1);
        assert!(Nested::from(1).into_map().is_none());
    }
}
