use std::fmt;

use serde_json::Value;

use crate::core::{EngineError, EngineResult};

use super::particles::MetaMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredicateOp {
    Eq,
    Ne,
}

impl PredicateOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "==" => Some(PredicateOp::Eq),
            "!=" => Some(PredicateOp::Ne),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            PredicateOp::Eq => "==",
            PredicateOp::Ne => "!=",
        }
    }
}

/// `[op, key, literal]` test over a particle's metadata.
///
/// A missing key never equals any literal: `==` fails and `!=` passes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Predicate {
    pub op: PredicateOp,
    pub key: String,
    pub literal: String,
}

impl Predicate {
    pub fn new(op: PredicateOp, key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            op,
            key: key.into(),
            literal: literal.into(),
        }
    }

    pub fn equals(key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(PredicateOp::Eq, key, literal)
    }

    pub fn not_equals(key: impl Into<String>, literal: impl Into<String>) -> Self {
        Self::new(PredicateOp::Ne, key, literal)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| EngineError::config("test", e.to_string()))?;
        Self::parse(&value, "test")
    }

    /// Accepts `["==", key, literal]` or `{ "op": "==", "key": .., "value": .. }`.
    pub fn parse(value: &Value, path: &str) -> EngineResult<Self> {
        let (op, key, literal) = match value {
            Value::Array(items) => {
                if items.len() != 3 {
                    return Err(EngineError::config(
                        path,
                        format!("predicate needs exactly 3 elements, got {}", items.len()),
                    ));
                }
                (&items[0], &items[1], &items[2])
            }
            Value::Object(map) => {
                let field = |name: &str| {
                    map.get(name).ok_or_else(|| {
                        EngineError::config(path, format!("predicate object is missing `{}`", name))
                    })
                };
                (field("op")?, field("key")?, field("value")?)
            }
            other => {
                return Err(EngineError::config(
                    path,
                    format!("predicate must be an array [op, key, literal], got {}", other),
                ))
            }
        };

        let op_str = string_field(op, path, "operator")?;
        let op = PredicateOp::parse(op_str).ok_or_else(|| {
            EngineError::config(path, format!("unknown predicate operator `{}`", op_str))
        })?;
        let key = string_field(key, path, "key")?;
        let literal = string_field(literal, path, "literal")?;

        Ok(Self::new(op, key, literal))
    }

    /// Evaluate against the value stored under `self.key`, if any.
    #[inline]
    pub fn matches_value(&self, value: Option<&str>) -> bool {
        let equal = value == Some(self.literal.as_str());
        match self.op {
            PredicateOp::Eq => equal,
            PredicateOp::Ne => !equal,
        }
    }

    #[inline]
    pub fn matches(&self, meta: &MetaMap) -> bool {
        self.matches_value(meta.get(&self.key).map(String::as_str))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.key, self.op.as_str(), self.literal)
    }
}

fn string_field<'a>(value: &'a Value, path: &str, what: &str) -> EngineResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| EngineError::config(path, format!("predicate {} must be a string, got {}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta(pairs: &[(&str, &str)]) -> MetaMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_key_never_equals() {
        let empty = MetaMap::new();
        assert!(!Predicate::equals("static", "true").matches(&empty));
        assert!(Predicate::not_equals("static", "true").matches(&empty));
        // Not even the empty string.
        assert!(!Predicate::equals("static", "").matches(&empty));
    }

    #[test]
    fn compares_present_values() {
        let m = meta(&[("static", "true")]);
        assert!(Predicate::equals("static", "true").matches(&m));
        assert!(!Predicate::not_equals("static", "true").matches(&m));
        assert!(Predicate::not_equals("static", "false").matches(&m));
    }

    #[test]
    fn parses_array_and_object_forms() {
        let a = Predicate::parse(&json!(["!=", "static", "true"]), "test").unwrap();
        assert_eq!(a, Predicate::not_equals("static", "true"));

        let o = Predicate::parse(&json!({ "op": "==", "key": "k", "value": "v" }), "test").unwrap();
        assert_eq!(o, Predicate::equals("k", "v"));

        assert_eq!(Predicate::from_json(r#"["==", "a", "b"]"#).unwrap(), Predicate::equals("a", "b"));
    }

    #[test]
    fn rejects_malformed_predicates() {
        for bad in [
            json!(["==", "static"]),
            json!(["==", "static", "true", "extra"]),
            json!(["<", "static", "true"]),
            json!(["==", 1, "true"]),
            json!(["==", "static", true]),
            json!("static == true"),
            json!({ "op": "==", "key": "k" }),
        ] {
            let err = Predicate::parse(&bad, "behaviours[0].params.test").unwrap_err();
            assert!(err.is_configuration(), "{} should be rejected", bad);
        }
    }
}
