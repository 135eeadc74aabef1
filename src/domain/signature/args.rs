//! Call arguments and bound argument mappings

use std::collections::{BTreeMap, BTreeSet};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::MemoError;

/// Raw arguments of one call, before binding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a call made only of keyword arguments
    pub fn from_kwargs<I, K, V>(kwargs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let keyword = kwargs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        Self {
            positional: Vec::new(),
            keyword,
        }
    }

    /// Appends a positional argument
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a keyword argument; a repeated name replaces the earlier value
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }
}

/// Flat, ordered name→value view of a bound call
///
/// Equality is set equality over (name, value) pairs, independent of how the
/// call was spelled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Returns the raw value bound to `name`
    pub fn get_raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Deserializes the value bound to `name`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, MemoError> {
        let value = self
            .0
            .get(name)
            .ok_or_else(|| MemoError::binding(format!("No argument named '{}'", name)))?;

        T::deserialize(value).map_err(|e| {
            MemoError::binding(format!("Argument '{}' has an unexpected type: {}", name, e))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Copy of the mapping with the given names removed
    pub fn without(&self, excluded: &BTreeSet<String>) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(name, _)| !excluded.contains(*name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }

    /// Rebuilds a mapping from a decoded record
    pub fn from_value(value: Value) -> Result<Self, MemoError> {
        match value {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            other => Err(MemoError::serialization(format!(
                "Input record is not a mapping: {}",
                other
            ))),
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_args_builder() {
        let args = CallArgs::new().arg(1).arg("two").kwarg("x", 5);

        assert_eq!(args.positional(), &[json!(1), json!("two")]);
        assert_eq!(args.keyword().get("x"), Some(&json!(5)));
    }

    #[test]
    fn test_call_args_from_kwargs() {
        let args = CallArgs::from_kwargs([("a", 1), ("b", 2)]);

        assert!(args.positional().is_empty());
        assert_eq!(args.keyword().len(), 2);
    }

    #[test]
    fn test_arguments_get_typed() {
        let args: Arguments = [("a", json!(3)), ("name", json!("x"))].into_iter().collect();

        assert_eq!(args.get::<i64>("a").unwrap(), 3);
        assert_eq!(args.get::<String>("name").unwrap(), "x");
    }

    #[test]
    fn test_arguments_get_missing_or_mistyped() {
        let args: Arguments = [("a", json!("not a number"))].into_iter().collect();

        assert!(matches!(args.get::<i64>("a"), Err(MemoError::Binding { .. })));
        assert!(matches!(args.get::<i64>("b"), Err(MemoError::Binding { .. })));
    }

    #[test]
    fn test_arguments_without() {
        let args: Arguments = [("a", json!(1)), ("conn", json!("db://"))]
            .into_iter()
            .collect();
        let excluded: BTreeSet<String> = ["conn".to_string()].into_iter().collect();

        let keyed = args.without(&excluded);
        assert!(keyed.contains("a"));
        assert!(!keyed.contains("conn"));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_arguments_value_round_trip() {
        let args: Arguments = [("a", json!(1)), ("b", json!([1, 2])), ("c", json!({"k": null}))]
            .into_iter()
            .collect();

        let restored = Arguments::from_value(args.to_value()).unwrap();
        assert_eq!(restored, args);
    }

    #[test]
    fn test_arguments_from_value_rejects_non_object() {
        let result = Arguments::from_value(json!([1, 2]));
        assert!(matches!(result, Err(MemoError::Serialization { .. })));
    }
}
