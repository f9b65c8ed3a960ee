// Core types for relationship resolution

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque entity identifier, either an integer or a string, compared by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Sentinel written into a foreign key to mean "no relation".
    pub const CLEARED: EntityId = EntityId::Int(0);

    /// Parse an identifier taken from a route segment. Only the canonical
    /// spelling of an integer becomes an integer id; `"007"` and `"+5"` stay strings.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => EntityId::Int(n),
            _ => EntityId::Str(raw.to_string()),
        }
    }

    /// Read an identifier out of a JSON value; empty strings are not identifiers.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(EntityId::Int),
            Value::String(s) if !s.trim().is_empty() => Some(EntityId::parse(s)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            EntityId::Int(n) => Value::from(*n),
            EntityId::Str(s) => Value::from(s.as_str()),
        }
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::CLEARED
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{n}"),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId::Int(value)
    }
}

impl From<i32> for EntityId {
    fn from(value: i32) -> Self {
        EntityId::Int(i64::from(value))
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId::parse(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        EntityId::parse(&value)
    }
}

/// A persisted row as seen through the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub entity_type: String,
    pub id: Option<EntityId>,
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            fields: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// True when the stored field equals `id`.
    pub fn links_to(&self, field: &str, id: &EntityId) -> bool {
        self.fields
            .get(field)
            .and_then(EntityId::from_json)
            .is_some_and(|linked| linked == *id)
    }
}

/// Conjunction of `field == value` conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(field, value)| record.get(field) == Some(value))
    }
}

/// Result of loading a named relation off a record
#[derive(Debug, Clone, PartialEq)]
pub enum RelationData {
    One(Option<Record>),
    Many(Vec<Record>),
}

impl RelationData {
    pub fn records(&self) -> Vec<&Record> {
        match self {
            RelationData::One(record) => record.iter().collect(),
            RelationData::Many(records) => records.iter().collect(),
        }
    }
}

/// Which record carries the foreign key of a direct relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwningSide {
    /// The primary record holds `<related>_id`.
    Primary,
    /// The related record holds `<primary>_id`.
    Related,
}

/// Name order in which a pivot entity was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotDirection {
    /// `PrimaryRelated`
    Forward,
    /// `RelatedPrimary`
    Inverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// One-to-one or one-to-many through a foreign key. `owning` is `None`
    /// when ownership must be probed against the related schema.
    Direct { owning: Option<OwningSide> },
    ManyToMany {
        pivot_type: String,
        direction: PivotDirection,
    },
}

/// How a (primary, related) pair is linked; derived per call and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    pub primary_type: String,
    pub related_type: String,
    pub kind: RelationKind,
}

impl RelationDescriptor {
    pub fn is_many_to_many(&self) -> bool {
        matches!(self.kind, RelationKind::ManyToMany { .. })
    }
}

impl fmt::Display for RelationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RelationKind::Direct { owning: Some(side) } => write!(
                f,
                "{} -> {}: direct, foreign key on {:?} side",
                self.primary_type, self.related_type, side
            ),
            RelationKind::Direct { owning: None } => write!(
                f,
                "{} -> {}: direct, ownership probed at write time",
                self.primary_type, self.related_type
            ),
            RelationKind::ManyToMany {
                pivot_type,
                direction,
            } => write!(
                f,
                "{} -> {}: many-to-many via {} ({:?})",
                self.primary_type, self.related_type, pivot_type, direction
            ),
        }
    }
}

/// Which records a direct unlink touches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkScope {
    /// Every related record linked to the primary is unlinked, whatever id
    /// the request named.
    #[default]
    AllLinked,
    /// Only the related record whose id was requested is unlinked.
    RequestedOnly,
}
