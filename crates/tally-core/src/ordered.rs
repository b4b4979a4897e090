//! Serde helpers for JSON objects whose key order carries meaning.
//!
//! Use with `#[serde(with = "tally_core::ordered")]` on a `Vec<(String, T)>`
//! field. Keys are written in vector order and read back in document order.
//! A repeated key keeps its first position and takes the last value.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S, T>(pairs: &[(String, T)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (key, value) in pairs {
        map.serialize_entry(key, value)?;
    }
    map.end()
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    deserializer.deserialize_map(PairsVisitor(PhantomData))
}

struct PairsVisitor<T>(PhantomData<T>);

impl<'de, T> Visitor<'de> for PairsVisitor<T>
where
    T: Deserialize<'de>,
{
    type Value = Vec<(String, T)>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut pairs: Vec<(String, T)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, T>()? {
            if let Some(slot) = pairs.iter_mut().find(|(existing, _)| *existing == key) {
                slot.1 = value;
            } else {
                pairs.push((key, value));
            }
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "crate::ordered")]
        items: Vec<(String, u32)>,
    }

    #[test]
    fn keeps_document_order() {
        let parsed: Wrapper = serde_json::from_str(r#"{"items":{"zeta":1,"alpha":2,"mid":3}}"#).unwrap();
        let keys: Vec<&str> = parsed.items.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn writes_vector_order() {
        let wrapper = Wrapper {
            items: vec![("b".to_string(), 2), ("a".to_string(), 1)],
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, r#"{"items":{"b":2,"a":1}}"#);
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let parsed: Wrapper = serde_json::from_str(r#"{"items":{"a":1,"b":2,"a":3}}"#).unwrap();
        assert_eq!(
            parsed.items,
            vec![("a".to_string(), 3), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn rejects_non_object() {
        let result: Result<Wrapper, _> = serde_json::from_str(r#"{"items":[1,2]}"#);
        assert!(result.is_err());
    }
}
