//! Behaviour tree: the compiled, validated form of the declarative config.
//!
//! Config grammar (recursive):
//! ```text
//! tree  := [node, ...]
//! node  := [kind, params?, children?]
//!        | { "behaviour": kind, "params": {...}, "children": tree }
//! test  := [op, key, literal]          op in {"==", "!="}
//! ```
//! Nodes live in a flat arena and reference their children by [`NodeId`].
//! Compilation is all-or-nothing: any malformed subtree rejects the whole
//! tree and nothing partial escapes.

use glam::Vec3;
use serde_json::{Map, Value};

use crate::core::vector::point_from_slice;
use crate::core::{EngineError, EngineResult};

use super::predicate::Predicate;

/// Index into [`BehaviourTree`]'s node arena. Only meaningful for the tree
/// that produced it.
pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq)]
pub enum Behaviour {
    /// Push away from neighbours within `radius`, or from a fixed `point`.
    Repel {
        force: f32,
        radius: Option<f32>,
        point: Option<Vec3>,
    },
    /// Pull toward a fixed `point`, or toward neighbours within `radius`.
    Attract {
        force: f32,
        point: Option<Vec3>,
        radius: Option<f32>,
    },
    /// Scale the carried-over velocity by `1 - factor`.
    Dampen { factor: f32 },
    /// Run children when a neighbour within `radius` passes `test`.
    Collide {
        radius: f32,
        test: Option<Predicate>,
    },
    Set { key: String, value: String },
    Stop,
    If { test: Predicate },
}

impl Behaviour {
    pub fn kind(&self) -> &'static str {
        match self {
            Behaviour::Repel { .. } => "repel",
            Behaviour::Attract { .. } => "attract",
            Behaviour::Dampen { .. } => "dampen",
            Behaviour::Collide { .. } => "collide",
            Behaviour::Set { .. } => "set",
            Behaviour::Stop => "stop",
            Behaviour::If { .. } => "if",
        }
    }

    /// Radius this node hands to the spatial index, if it queries neighbours.
    pub fn neighbor_radius(&self) -> Option<f32> {
        match self {
            Behaviour::Repel { radius, point: None, .. } => *radius,
            Behaviour::Attract { radius, point: None, .. } => *radius,
            Behaviour::Collide { radius, .. } => Some(*radius),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BehaviourNode {
    pub behaviour: Behaviour,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Debug)]
pub struct BehaviourTree {
    nodes: Vec<BehaviourNode>,
    roots: Vec<NodeId>,
    dims: usize,
}

impl BehaviourTree {
    pub fn from_json(json: &str, dims: usize) -> EngineResult<Self> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| EngineError::config("behaviours", e.to_string()))?;
        Self::compile(&value, dims)
    }

    pub fn compile(config: &Value, dims: usize) -> EngineResult<Self> {
        let mut compiler = Compiler {
            dims,
            nodes: Vec::new(),
        };
        let roots = compiler.sequence(config, "behaviours")?;
        Ok(Self {
            nodes: compiler.nodes,
            roots,
            dims,
        })
    }

    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &BehaviourNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[BehaviourNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Largest radius any neighbour-querying node uses.
    ///
    /// `None` when no node needs the spatial index at all.
    pub fn max_neighbor_radius(&self) -> Option<f32> {
        self.nodes
            .iter()
            .filter_map(|n| n.behaviour.neighbor_radius())
            .fold(None, |acc, r| Some(acc.map_or(r, |a: f32| a.max(r))))
    }
}

// === COMPILER ===

struct Compiler {
    dims: usize,
    nodes: Vec<BehaviourNode>,
}

impl Compiler {
    fn sequence(&mut self, value: &Value, path: &str) -> EngineResult<Vec<NodeId>> {
        let items = value.as_array().ok_or_else(|| {
            EngineError::config(path, format!("expected an array of behaviours, got {}", value))
        })?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| self.node(item, &format!("{}[{}]", path, i)))
            .collect()
    }

    fn node(&mut self, value: &Value, path: &str) -> EngineResult<NodeId> {
        let (kind, params, children) = split_node(value, path)?;
        let params = Params::new(params, path)?;

        let behaviour = match kind.to_ascii_lowercase().as_str() {
            "repel" => {
                params.allow(&["f", "r", "p"])?;
                let radius = params.radius("r")?;
                let point = params.point("p", self.dims)?;
                if radius.is_none() && point.is_none() {
                    return Err(params.missing("r"));
                }
                Behaviour::Repel {
                    force: params.required_number("f")?,
                    radius,
                    point,
                }
            }
            "attract" => {
                params.allow(&["f", "r", "p"])?;
                let radius = params.radius("r")?;
                let point = params.point("p", self.dims)?;
                if radius.is_none() && point.is_none() {
                    return Err(params.missing("r"));
                }
                Behaviour::Attract {
                    force: params.required_number("f")?,
                    point,
                    radius,
                }
            }
            "dampen" => {
                params.allow(&["f"])?;
                let factor = params.required_number("f")?;
                if !(0.0..=1.0).contains(&factor) {
                    return Err(params.invalid("f", format!("must be within [0, 1], got {}", factor)));
                }
                Behaviour::Dampen { factor }
            }
            "collide" => {
                params.allow(&["r", "test"])?;
                let radius = params.radius("r")?.ok_or_else(|| params.missing("r"))?;
                Behaviour::Collide {
                    radius,
                    test: params.predicate("test")?,
                }
            }
            "set" => {
                params.allow(&["key", "value"])?;
                Behaviour::Set {
                    key: params.required_string("key")?,
                    value: params.required_string("value")?,
                }
            }
            "stop" => {
                params.allow(&[])?;
                Behaviour::Stop
            }
            "if" => {
                params.allow(&["test"])?;
                Behaviour::If {
                    test: params.predicate("test")?.ok_or_else(|| params.missing("test"))?,
                }
            }
            _ => {
                return Err(EngineError::config(
                    path,
                    format!("unknown behaviour kind `{}`", kind),
                ))
            }
        };

        let takes_children = matches!(behaviour, Behaviour::If { .. } | Behaviour::Collide { .. });
        if children.is_some() && !takes_children {
            return Err(EngineError::config(
                path,
                format!("`{}` does not take children", behaviour.kind()),
            ));
        }

        let id = self.nodes.len();
        self.nodes.push(BehaviourNode {
            behaviour,
            children: Vec::new(),
        });

        if let Some(children) = children {
            let ids = self.sequence(children, &format!("{}.children", path))?;
            self.nodes[id].children = ids;
        }

        Ok(id)
    }
}

/// Pull `(kind, params, children)` out of either node form.
fn split_node<'a>(
    value: &'a Value,
    path: &str,
) -> EngineResult<(&'a str, Option<&'a Value>, Option<&'a Value>)> {
    let (kind, params, children) = match value {
        Value::Array(items) => {
            if items.is_empty() || items.len() > 3 {
                return Err(EngineError::config(
                    path,
                    format!("node must be [kind, params?, children?], got {} elements", items.len()),
                ));
            }
            (&items[0], items.get(1), items.get(2))
        }
        Value::Object(map) => {
            let kind = map
                .get("behaviour")
                .ok_or_else(|| EngineError::config(path, "node object is missing `behaviour`"))?;
            (kind, map.get("params"), map.get("children"))
        }
        other => {
            return Err(EngineError::config(
                path,
                format!("node must be an array or object, got {}", other),
            ))
        }
    };

    let kind = kind
        .as_str()
        .ok_or_else(|| EngineError::config(path, format!("behaviour kind must be a string, got {}", kind)))?;

    let children = children.filter(|c| !c.is_null());
    Ok((kind, params.filter(|p| !p.is_null()), children))
}

struct Params<'a> {
    map: Option<&'a Map<String, Value>>,
    path: &'a str,
}

impl<'a> Params<'a> {
    fn new(value: Option<&'a Value>, path: &'a str) -> EngineResult<Self> {
        let map = match value {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(EngineError::config(
                    format!("{}.params", path),
                    format!("params must be an object, got {}", other),
                ))
            }
        };
        Ok(Self { map, path })
    }

    fn field_path(&self, name: &str) -> String {
        format!("{}.params.{}", self.path, name)
    }

    fn missing(&self, name: &str) -> EngineError {
        EngineError::config(self.field_path(name), "required parameter is missing")
    }

    fn invalid(&self, name: &str, reason: String) -> EngineError {
        EngineError::config(self.field_path(name), reason)
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.and_then(|m| m.get(name))
    }

    fn allow(&self, names: &[&str]) -> EngineResult<()> {
        if let Some(map) = self.map {
            if let Some(unknown) = map.keys().find(|k| !names.contains(&k.as_str())) {
                return Err(self.invalid(unknown, "unknown parameter".to_string()));
            }
        }
        Ok(())
    }

    fn number(&self, name: &str) -> EngineResult<Option<f32>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let n = value
            .as_f64()
            .map(|n| n as f32)
            .ok_or_else(|| self.invalid(name, format!("expected a number, got {}", value)))?;
        if !n.is_finite() {
            return Err(self.invalid(name, format!("must be finite, got {}", value)));
        }
        Ok(Some(n))
    }

    fn required_number(&self, name: &str) -> EngineResult<f32> {
        self.number(name)?.ok_or_else(|| self.missing(name))
    }

    fn radius(&self, name: &str) -> EngineResult<Option<f32>> {
        match self.number(name)? {
            Some(r) if r < 0.0 => Err(self.invalid(name, format!("radius must be >= 0, got {}", r))),
            other => Ok(other),
        }
    }

    fn point(&self, name: &str, dims: usize) -> EngineResult<Option<Vec3>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let items = value
            .as_array()
            .ok_or_else(|| self.invalid(name, format!("expected a point array, got {}", value)))?;
        if items.len() != dims {
            return Err(self.invalid(
                name,
                format!("point has {} components but the simulation is {}D", items.len(), dims),
            ));
        }
        let mut coords = Vec::with_capacity(dims);
        for item in items {
            let c = item
                .as_f64()
                .map(|c| c as f32)
                .filter(|c| c.is_finite())
                .ok_or_else(|| self.invalid(name, format!("point components must be finite numbers, got {}", item)))?;
            coords.push(c);
        }
        Ok(Some(point_from_slice(&coords)))
    }

    fn predicate(&self, name: &str) -> EngineResult<Option<Predicate>> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => Predicate::parse(value, &self.field_path(name)).map(Some),
        }
    }

    fn required_string(&self, name: &str) -> EngineResult<String> {
        let value = self.get(name).ok_or_else(|| self.missing(name))?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(name, format!("expected a string, got {}", value)))
    }
}
