// Decoding of JSON-API relationship bodies into a normalized payload

use serde_json::Value;

use super::errors::ResolverError;
use super::types::EntityId;

const DATA: &str = "data";
const ID: &str = "id";
const RELATIONSHIPS: &str = "relationships";

/// Target ids of one named relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    One(EntityId),
    Many(Vec<EntityId>),
}

impl RelationTarget {
    pub fn ids(&self) -> Vec<&EntityId> {
        match self {
            RelationTarget::One(id) => vec![id],
            RelationTarget::Many(ids) => ids.iter().collect(),
        }
    }
}

/// Relation name to target ids, in request order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipPayload {
    entries: Vec<(String, RelationTarget)>,
}

impl RelationshipPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, relation: impl Into<String>, target: RelationTarget) -> Self {
        self.entries.push((relation.into(), target));
        self
    }

    /// Decode the body of a `/{entity}/{id}/relationships/{relation}` request:
    /// `{"data": {"id": ..}}` or `{"data": [{"id": ..}, ..]}`.
    pub fn from_relation_body(relation: &str, body: &str) -> Result<Self, ResolverError> {
        if body.trim().is_empty() {
            return Ok(Self::new());
        }
        let json: Value = serde_json::from_str(body)?;
        Self::from_relation_value(relation, &json)
    }

    pub fn from_relation_value(relation: &str, json: &Value) -> Result<Self, ResolverError> {
        let mut payload = Self::new();
        if let Some(target) = decode_target(relation, json)? {
            payload.entries.push((relation.to_string(), target));
        }
        Ok(payload)
    }

    /// Decode `data.relationships` of a resource create/update document.
    pub fn from_resource_document(json: &Value) -> Result<Self, ResolverError> {
        let mut payload = Self::new();
        let Some(relationships) = json
            .get(DATA)
            .and_then(|data| data.get(RELATIONSHIPS))
            .and_then(Value::as_object)
        else {
            return Ok(payload);
        };

        for (relation, value) in relationships {
            if let Some(target) = decode_target(relation, value)? {
                payload.entries.push((relation.clone(), target));
            }
        }
        Ok(payload)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &RelationTarget)> {
        self.entries
            .iter()
            .map(|(relation, target)| (relation.as_str(), target))
    }

    /// Every target id of `relation`, in request order
    pub fn ids_for(&self, relation: &str) -> Vec<&EntityId> {
        self.entries
            .iter()
            .filter(|(name, _)| name == relation)
            .flat_map(|(_, target)| target.ids())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A missing or null `data` member is an empty relation set, not an error.
fn decode_target(relation: &str, value: &Value) -> Result<Option<RelationTarget>, ResolverError> {
    match value.get(DATA) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| decode_id(relation, item))
            .collect::<Result<Vec<_>, _>>()
            .map(|ids| Some(RelationTarget::Many(ids))),
        Some(item @ Value::Object(_)) => {
            decode_id(relation, item).map(|id| Some(RelationTarget::One(id)))
        }
        Some(other) => Err(invalid(relation, other)),
    }
}

fn decode_id(relation: &str, item: &Value) -> Result<EntityId, ResolverError> {
    let raw = item.get(ID).unwrap_or(&Value::Null);
    EntityId::from_json(raw).ok_or_else(|| invalid(relation, raw))
}

fn invalid(relation: &str, value: &Value) -> ResolverError {
    ResolverError::InvalidIdentifier {
        relation: relation.to_string(),
        value: value.to_string(),
    }
}
