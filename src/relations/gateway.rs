// In-memory entity gateway - no side effects, records every call it serves

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::errors::GatewayError;
use super::traits::EntityGateway;
use super::types::{EntityId, Filter, Record, RelationData};

/// How the gateway loads a named relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationDefinition {
    /// The record holds `foreign_key` pointing at one `related` row.
    BelongsTo { related: String, foreign_key: String },
    /// One `related` row holds `foreign_key` pointing at the record.
    HasOne { related: String, foreign_key: String },
    /// Many `related` rows hold `foreign_key` pointing at the record.
    HasMany { related: String, foreign_key: String },
    /// Rows of `pivot` join the record (`local_key`) to `related` (`related_key`).
    BelongsToMany {
        related: String,
        pivot: String,
        local_key: String,
        related_key: String,
    },
}

/// Calls served by [`MemoryGateway`], in order
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    FindById { entity: String, id: EntityId },
    FindWhere { entity: String, filter: Filter },
    Save { entity: String, id: Option<EntityId> },
    Delete { entity: String, id: Option<EntityId> },
    LoadRelation { entity: String, relation: String },
    HasField { entity: String, field: String },
}

impl GatewayCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, GatewayCall::Save { .. } | GatewayCall::Delete { .. })
    }
}

/// Entity store kept in memory, keyed by entity type
#[derive(Debug)]
pub struct MemoryGateway {
    schemas: HashMap<String, Vec<String>>,
    relations: HashMap<(String, String), RelationDefinition>,
    rows: RefCell<HashMap<String, Vec<Record>>>,
    next_id: Cell<i64>,
    calls: RefCell<Vec<GatewayCall>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
            relations: HashMap::new(),
            rows: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Declare an entity type and its columns
    pub fn with_entity(mut self, entity: &str, columns: &[&str]) -> Self {
        self.schemas.insert(
            entity.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        );
        self.rows.borrow_mut().entry(entity.to_string()).or_default();
        self
    }

    pub fn with_relation(
        mut self,
        entity: &str,
        relation: &str,
        definition: RelationDefinition,
    ) -> Self {
        self.relations
            .insert((entity.to_string(), relation.to_string()), definition);
        self
    }

    /// Seed a row without recording a call
    pub fn insert(&self, record: Record) -> Result<Record, GatewayError> {
        self.store(record)
    }

    pub fn rows(&self, entity: &str) -> Vec<Record> {
        self.rows.borrow().get(entity).cloned().unwrap_or_default()
    }

    pub fn get(&self, entity: &str, id: impl Into<EntityId>) -> Option<Record> {
        let id = id.into();
        self.rows(entity)
            .into_iter()
            .find(|record| record.id.as_ref() == Some(&id))
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.borrow().clone()
    }

    pub fn mutations(&self) -> Vec<GatewayCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    fn record_call(&self, call: GatewayCall) {
        self.calls.borrow_mut().push(call);
    }

    fn ensure_entity(&self, entity: &str) -> Result<&[String], GatewayError> {
        self.schemas
            .get(entity)
            .map(Vec::as_slice)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))
    }

    fn store(&self, mut record: Record) -> Result<Record, GatewayError> {
        let columns = self.ensure_entity(&record.entity_type)?;
        for column in columns {
            record
                .fields
                .entry(column.clone())
                .or_insert(serde_json::Value::Null);
        }

        let mut rows = self.rows.borrow_mut();
        let table = rows.entry(record.entity_type.clone()).or_default();
        match &record.id {
            Some(id) => {
                if let Some(existing) = table.iter_mut().find(|row| row.id.as_ref() == Some(id)) {
                    *existing = record.clone();
                } else {
                    table.push(record.clone());
                }
            }
            None => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                record.id = Some(EntityId::Int(id));
                table.push(record.clone());
            }
        }
        Ok(record)
    }

    fn select(&self, entity: &str, filter: &Filter) -> Vec<Record> {
        self.rows(entity)
            .into_iter()
            .filter(|record| filter.matches(record))
            .collect()
    }
}

impl EntityGateway for MemoryGateway {
    fn find_by_id(&self, entity_type: &str, id: &EntityId) -> Result<Option<Record>, GatewayError> {
        self.record_call(GatewayCall::FindById {
            entity: entity_type.to_string(),
            id: id.clone(),
        });
        self.ensure_entity(entity_type)?;
        Ok(self.get(entity_type, id.clone()))
    }

    fn find_where(&self, entity_type: &str, filter: &Filter) -> Result<Vec<Record>, GatewayError> {
        self.record_call(GatewayCall::FindWhere {
            entity: entity_type.to_string(),
            filter: filter.clone(),
        });
        self.ensure_entity(entity_type)?;
        Ok(self.select(entity_type, filter))
    }

    fn save(&self, record: &Record) -> Result<Record, GatewayError> {
        self.record_call(GatewayCall::Save {
            entity: record.entity_type.clone(),
            id: record.id.clone(),
        });
        self.store(record.clone())
    }

    fn delete(&self, record: &Record) -> Result<(), GatewayError> {
        self.record_call(GatewayCall::Delete {
            entity: record.entity_type.clone(),
            id: record.id.clone(),
        });
        self.ensure_entity(&record.entity_type)?;
        if let Some(table) = self.rows.borrow_mut().get_mut(&record.entity_type) {
            table.retain(|row| row.id != record.id);
        }
        Ok(())
    }

    fn load_relation(&self, record: &Record, relation: &str) -> Result<RelationData, GatewayError> {
        self.record_call(GatewayCall::LoadRelation {
            entity: record.entity_type.clone(),
            relation: relation.to_string(),
        });
        let definition = self
            .relations
            .get(&(record.entity_type.clone(), relation.to_string()))
            .ok_or_else(|| {
                GatewayError::UnknownRelation(format!("{}.{relation}", record.entity_type))
            })?;
        let Some(id) = record.id.clone() else {
            return Ok(RelationData::Many(Vec::new()));
        };

        let data = match definition {
            RelationDefinition::BelongsTo {
                related,
                foreign_key,
            } => {
                let target = record.get(foreign_key).and_then(EntityId::from_json);
                RelationData::One(target.and_then(|target| self.get(related, target)))
            }
            RelationDefinition::HasOne {
                related,
                foreign_key,
            } => RelationData::One(
                self.select(related, &Filter::new().eq(foreign_key.as_str(), id.to_json()))
                    .into_iter()
                    .next(),
            ),
            RelationDefinition::HasMany {
                related,
                foreign_key,
            } => RelationData::Many(
                self.select(related, &Filter::new().eq(foreign_key.as_str(), id.to_json())),
            ),
            RelationDefinition::BelongsToMany {
                related,
                pivot,
                local_key,
                related_key,
            } => RelationData::Many(
                self.select(pivot, &Filter::new().eq(local_key.as_str(), id.to_json()))
                    .iter()
                    .filter_map(|row| row.get(related_key).and_then(EntityId::from_json))
                    .filter_map(|target| self.get(related, target))
                    .collect(),
            ),
        };
        Ok(data)
    }

    fn has_field(&self, entity_type: &str, field: &str) -> Result<bool, GatewayError> {
        self.record_call(GatewayCall::HasField {
            entity: entity_type.to_string(),
            field: field.to_string(),
        });
        Ok(self.ensure_entity(entity_type)?.iter().any(|c| c == field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> MemoryGateway {
        MemoryGateway::new()
            .with_entity("Post", &["title", "author_id"])
            .with_entity("Comment", &["body", "post_id"])
            .with_relation(
                "Post",
                "comments",
                RelationDefinition::HasMany {
                    related: "Comment".to_string(),
                    foreign_key: "post_id".to_string(),
                },
            )
    }

    #[test]
    fn test_insert_assigns_ids_and_fills_columns() {
        let gateway = gateway();
        let post = gateway.insert(Record::new("Post").with_field("title", "a")).unwrap();

        assert_eq!(post.id, Some(EntityId::Int(1)));
        assert_eq!(post.get("author_id"), Some(&serde_json::Value::Null));
        assert!(gateway.calls().is_empty());
    }

    #[test]
    fn test_save_updates_existing_row() {
        let gateway = gateway();
        let mut post = gateway.insert(Record::new("Post").with_field("title", "a")).unwrap();
        post.set("title", "b");
        gateway.save(&post).unwrap();

        assert_eq!(gateway.rows("Post").len(), 1);
        assert_eq!(
            gateway.get("Post", 1).unwrap().get("title"),
            Some(&serde_json::Value::from("b"))
        );
        assert_eq!(gateway.mutations().len(), 1);
    }

    #[test]
    fn test_has_many_relation() {
        let gateway = gateway();
        let post = gateway.insert(Record::new("Post")).unwrap();
        gateway
            .insert(Record::new("Comment").with_field("post_id", 1))
            .unwrap();
        gateway
            .insert(Record::new("Comment").with_field("post_id", 99))
            .unwrap();

        let comments = gateway.load_relation(&post, "comments").unwrap();
        assert_eq!(comments.records().len(), 1);
        assert!(matches!(
            gateway.load_relation(&post, "tags"),
            Err(GatewayError::UnknownRelation(_))
        ));
    }

    #[test]
    fn test_unknown_entity() {
        let gateway = gateway();
        assert_eq!(
            gateway.find_by_id("Tag", &EntityId::Int(1)),
            Err(GatewayError::UnknownEntity("Tag".to_string()))
        );
    }
}
