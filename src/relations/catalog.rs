// Declared relationship metadata, consulted before any runtime probing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::traits::PivotResolver;
use super::types::{OwningSide, PivotDirection, RelationDescriptor, RelationKind};
use crate::naming;
use crate::state_machine::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclaredKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// One declared relation: `{ kind, owning_side?, pivot?, related? }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub kind: DeclaredKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_side: Option<OwningSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pivot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

impl RelationSpec {
    pub fn direct(kind: DeclaredKind, owning_side: OwningSide) -> Self {
        Self {
            kind,
            owning_side: Some(owning_side),
            pivot: None,
            related: None,
        }
    }

    pub fn many_to_many(pivot: impl Into<String>) -> Self {
        Self {
            kind: DeclaredKind::ManyToMany,
            owning_side: None,
            pivot: Some(pivot.into()),
            related: None,
        }
    }

    pub fn with_related(mut self, related: impl Into<String>) -> Self {
        self.related = Some(related.into());
        self
    }
}

/// Entity name -> relation name -> declared relation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationCatalog {
    entities: HashMap<String, HashMap<String, RelationSpec>>,
}

impl RelationCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(
        mut self,
        entity: impl Into<String>,
        relation: impl Into<String>,
        spec: RelationSpec,
    ) -> Self {
        self.entities
            .entry(entity.into())
            .or_default()
            .insert(relation.into(), spec);
        self
    }

    /// Entity keys are matched by table name, so `BlogPost` and `blog_post`
    /// name the same entity. Relation names match case-insensitively.
    pub fn lookup(&self, entity: &str, relation: &str) -> Option<&RelationSpec> {
        let table = naming::table_name(entity);
        self.entities
            .iter()
            .find(|(name, _)| naming::table_name(name) == table)
            .and_then(|(_, relations)| {
                relations
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(relation))
                    .map(|(_, spec)| spec)
            })
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.values().map(HashMap::len).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (entity, relations) in &self.entities {
            for (relation, spec) in relations {
                let invalid = |reason: &str| ConfigurationError::InvalidRelation {
                    entity: entity.clone(),
                    relation: relation.clone(),
                    reason: reason.to_string(),
                };
                match spec.kind {
                    DeclaredKind::ManyToMany if spec.pivot.as_deref().is_none_or(str::is_empty) => {
                        return Err(invalid("many_to_many requires a pivot entity"));
                    }
                    DeclaredKind::OneToOne | DeclaredKind::OneToMany if spec.pivot.is_some() => {
                        return Err(invalid("only many_to_many relations take a pivot"));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Descriptor for a declared relation, `None` when nothing is declared.
    pub fn describe(&self, primary: &str, relation: &str) -> Option<RelationDescriptor> {
        let spec = self.lookup(primary, relation)?;
        let primary_type = naming::class_name(primary);
        let related_type = spec
            .related
            .clone()
            .unwrap_or_else(|| naming::class_name(relation));

        let kind = match (&spec.kind, &spec.pivot) {
            (DeclaredKind::ManyToMany, Some(pivot)) => RelationKind::ManyToMany {
                pivot_type: pivot.clone(),
                direction: if *pivot == naming::pivot_name(&related_type, &primary_type) {
                    PivotDirection::Inverse
                } else {
                    PivotDirection::Forward
                },
            },
            _ => RelationKind::Direct {
                owning: spec.owning_side,
            },
        };

        Some(RelationDescriptor {
            primary_type,
            related_type,
            kind,
        })
    }

    pub fn pivots(&self) -> impl Iterator<Item = &str> {
        self.entities
            .values()
            .flat_map(HashMap::values)
            .filter_map(|spec| spec.pivot.as_deref())
    }
}

/// Pivot existence answered from declared metadata only
#[derive(Debug, Clone, Copy)]
pub struct CatalogPivotResolver<'a> {
    catalog: &'a RelationCatalog,
}

impl<'a> CatalogPivotResolver<'a> {
    pub fn new(catalog: &'a RelationCatalog) -> Self {
        Self { catalog }
    }
}

impl PivotResolver for CatalogPivotResolver<'_> {
    fn pivot_exists(&self, first: &str, second: &str) -> bool {
        let wanted = naming::pivot_name(first, second);
        self.catalog.pivots().any(|pivot| pivot == wanted)
    }
}
