//! Structural match criteria.
//!
//! A criterion is a mapping from property name to a rule: presence check,
//! scalar equality, or a recursive nested criterion. The JSON wire shape
//! is the one used by site configuration files: `true` for presence, an
//! object for nesting, any other scalar for equality.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProbeError, Result};
use crate::value::Value;

/// A scalar literal compared against a property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Literal {
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Literal::Null, Value::Null) => true,
            (Literal::Bool(a), Value::Bool(b)) => a == b,
            (Literal::Number(a), Value::Number(b)) => a == b,
            (Literal::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Requirement placed on a single property.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionRule {
    /// The property must exist (and be non-null).
    Present,
    /// The property must equal a scalar literal.
    Equals(Literal),
    /// The property must be an object satisfying a nested criterion.
    Nested(Criterion),
}

/// An ordered set of property rules; an object matches when every rule
/// is satisfied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Criterion {
    rules: Vec<(String, CriterionRule)>,
}

impl Criterion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(mut self, key: impl Into<String>, rule: CriterionRule) -> Self {
        self.rules.push((key.into(), rule));
        self
    }

    pub fn present(self, key: impl Into<String>) -> Self {
        self.require(key, CriterionRule::Present)
    }

    pub fn equals(self, key: impl Into<String>, literal: Literal) -> Self {
        self.require(key, CriterionRule::Equals(literal))
    }

    pub fn nested(self, key: impl Into<String>, criterion: Criterion) -> Self {
        self.require(key, CriterionRule::Nested(criterion))
    }

    pub fn rules(&self) -> &[(String, CriterionRule)] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parses the JSON wire shape: `{"userInfo": true}` (presence),
    /// `{"client": {"queryCache": true}}` (nesting), `{"kind": "map"}`
    /// (equality). Arrays are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let map = json
            .as_object()
            .ok_or_else(|| ProbeError::InvalidCriterion("criterion must be an object".into()))?;

        let mut criterion = Criterion::new();
        for (key, value) in map {
            let rule = match value {
                serde_json::Value::Bool(true) => CriterionRule::Present,
                serde_json::Value::Bool(false) => CriterionRule::Equals(Literal::Bool(false)),
                serde_json::Value::Null => CriterionRule::Equals(Literal::Null),
                serde_json::Value::Number(n) => {
                    CriterionRule::Equals(Literal::Number(n.as_f64().unwrap_or(0.0)))
                }
                serde_json::Value::String(s) => CriterionRule::Equals(Literal::Str(s.clone())),
                serde_json::Value::Object(_) => CriterionRule::Nested(Criterion::from_json(value)?),
                serde_json::Value::Array(_) => {
                    return Err(ProbeError::InvalidCriterion(format!(
                        "array rule not supported for key {:?}",
                        key
                    )));
                }
            };
            criterion.rules.push((key.clone(), rule));
        }
        Ok(criterion)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (key, rule) in &self.rules {
            let value = match rule {
                CriterionRule::Present => serde_json::Value::Bool(true),
                CriterionRule::Equals(Literal::Null) => serde_json::Value::Null,
                CriterionRule::Equals(Literal::Bool(b)) => serde_json::Value::Bool(*b),
                CriterionRule::Equals(Literal::Number(n)) => serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                CriterionRule::Equals(Literal::Str(s)) => serde_json::Value::String(s.clone()),
                CriterionRule::Nested(nested) => nested.to_json(),
            };
            map.insert(key.clone(), value);
        }
        serde_json::Value::Object(map)
    }
}

impl TryFrom<&serde_json::Value> for Criterion {
    type Error = ProbeError;

    fn try_from(json: &serde_json::Value) -> Result<Self> {
        Criterion::from_json(json)
    }
}

impl Serialize for Criterion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Criterion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Criterion::from_json(&json).map_err(D::Error::custom)
    }
}

/// A labelled group of criteria, as found in site configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaGroup {
    pub label: String,
    pub criteria: Vec<Criterion>,
}

impl CriteriaGroup {
    pub fn new(label: impl Into<String>, criteria: Vec<Criterion>) -> Self {
        Self {
            label: label.into(),
            criteria,
        }
    }
}

/// Flattens labelled groups into the ordered criteria list a search
/// config consumes. Group order is preserved, so criterion indices in
/// results line up with the flattened sequence.
pub fn flatten_groups(groups: &[CriteriaGroup]) -> Vec<Criterion> {
    groups
        .iter()
        .flat_map(|group| group.criteria.iter().cloned())
        .collect()
}
