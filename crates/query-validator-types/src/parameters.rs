//! Named substitution values for `${name}` placeholders.
//!
//! A context is assembled through [`ParameterContextBuilder`] (append-only,
//! single writer) and frozen with [`ParameterContextBuilder::build`] before it
//! is handed to a validation call. The frozen [`ParameterContext`] has no
//! mutating methods, so a context cannot change while it is being read.
//!
//! Keys are not unique: [`ParameterContext::lookup`] returns the value that was
//! appended last for a key.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Append-only builder for a [`ParameterContext`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterContextBuilder {
    entries: Vec<(String, String)>,
}

impl ParameterContextBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one pair, keeping insertion order.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    /// By-value form of [`append`](Self::append) for chained construction.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the builder into an immutable snapshot.
    pub fn build(self) -> ParameterContext {
        ParameterContext {
            entries: self.entries,
        }
    }
}

/// Immutable, ordered snapshot of parameter pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterContext {
    entries: Vec<(String, String)>,
}

impl ParameterContext {
    /// An empty context.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Most recently appended value for `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pairs in insertion order, duplicates included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for ParameterContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut builder = ParameterContextBuilder::new();
        for (key, value) in iter {
            builder.append(key, value);
        }
        builder.build()
    }
}

impl From<ParameterContextBuilder> for ParameterContext {
    fn from(builder: ParameterContextBuilder) -> Self {
        builder.build()
    }
}

/// Accepted JSON shapes: `{"k": "v"}` or `[["k", "v"], ...]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawParameters {
    Pairs(Vec<(String, String)>),
    Map(BTreeMap<String, String>),
}

impl<'de> Deserialize<'de> for ParameterContext {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let context = match RawParameters::deserialize(deserializer)? {
            RawParameters::Pairs(pairs) => pairs.into_iter().collect(),
            RawParameters::Map(map) => map.into_iter().collect(),
        };
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_on_empty_context_is_absent() {
        let ctx = ParameterContextBuilder::new().build();
        assert!(ctx.is_empty());
        assert_eq!(ctx.lookup("min_height"), None);
    }

    #[test]
    fn last_appended_value_wins() {
        let mut builder = ParameterContextBuilder::new();
        builder.append("limit", "10").append("other", "x");
        builder.append("limit", "20");
        let ctx = builder.build();

        assert_eq!(ctx.lookup("limit"), Some("20"));
        assert_eq!(ctx.lookup("other"), Some("x"));
        assert_eq!(ctx.len(), 3);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let ctx = ParameterContextBuilder::new()
            .with("b", "1")
            .with("a", "2")
            .with("b", "3")
            .build();

        let keys: Vec<_> = ctx.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
    }

    #[test]
    fn deserializes_from_object_and_pairs() {
        let ctx: ParameterContext = serde_json::from_str(r#"{"min_height": "100"}"#).unwrap();
        assert_eq!(ctx.lookup("min_height"), Some("100"));

        let ctx: ParameterContext =
            serde_json::from_str(r#"[["k", "1"], ["k", "2"]]"#).unwrap();
        assert_eq!(ctx.lookup("k"), Some("2"));
    }

    #[test]
    fn keys_are_case_sensitive() {
        let ctx: ParameterContext = [("Height", "1")].into_iter().collect();
        assert_eq!(ctx.lookup("height"), None);
        assert!(ctx.contains("Height"));
    }
}
