use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::catalog::RelationCatalog;
use super::errors::ResolverError;
use super::payload::{RelationTarget, RelationshipPayload};
use super::traits::{EntityGateway, PivotResolver};
use super::types::{
    EntityId, Filter, OwningSide, PivotDirection, Record, RelationDescriptor, RelationKind,
    UnlinkScope,
};
use crate::jsonapi::{ApiResponse, Document};
use crate::naming;
use crate::observability::{resolver_metrics, OperationTimer};
use crate::telemetry::{generate_correlation_id, relation_span};

/// Reads and writes the relations of one primary entity type.
///
/// Holds no state between calls. Each call derives the relation descriptor
/// from the catalog, or by probing pivots in both name orders and the related
/// schema for the owning foreign key.
pub struct RelationshipResolver<'a> {
    entity: String,
    gateway: &'a dyn EntityGateway,
    pivots: &'a dyn PivotResolver,
    catalog: Option<&'a RelationCatalog>,
    unlink_scope: UnlinkScope,
}

impl<'a> RelationshipResolver<'a> {
    pub fn new(
        entity: &str,
        gateway: &'a dyn EntityGateway,
        pivots: &'a dyn PivotResolver,
    ) -> Self {
        Self {
            entity: naming::class_name(entity),
            gateway,
            pivots,
            catalog: None,
            unlink_scope: UnlinkScope::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: &'a RelationCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_unlink_scope(mut self, scope: UnlinkScope) -> Self {
        self.unlink_scope = scope;
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// GET the related resources of one entity
    pub fn read_relation(&self, id: &EntityId, relation: &str) -> Result<Document, ResolverError> {
        let span = relation_span(
            "read",
            &self.entity,
            &id.to_string(),
            relation,
            &generate_correlation_id(),
        );
        let _guard = span.enter();

        let primary = self.fetch_primary(id)?;
        let related = self.gateway.load_relation(&primary, relation)?;
        debug!(count = related.records().len(), "Relation loaded");
        Ok(Document::relation(&related))
    }

    /// POST relationships for one entity
    pub fn create_relation(
        &self,
        id: &EntityId,
        relation: &str,
        body: &str,
    ) -> Result<Document, ResolverError> {
        let span = relation_span(
            "create",
            &self.entity,
            &id.to_string(),
            relation,
            &generate_correlation_id(),
        );
        let _guard = span.enter();
        self.preset_relation(id, relation, body)
    }

    /// PATCH relationships for one entity; identical to create at this layer
    pub fn update_relation(
        &self,
        id: &EntityId,
        relation: &str,
        body: &str,
    ) -> Result<Document, ResolverError> {
        let span = relation_span(
            "update",
            &self.entity,
            &id.to_string(),
            relation,
            &generate_correlation_id(),
        );
        let _guard = span.enter();
        self.preset_relation(id, relation, body)
    }

    /// DELETE relationships for one entity. Direct links are cleared by writing
    /// the sentinel id into the foreign key; related rows are never deleted.
    pub fn delete_relation(
        &self,
        id: &EntityId,
        relation: &str,
        body: &str,
    ) -> Result<ApiResponse, ResolverError> {
        let span = relation_span(
            "delete",
            &self.entity,
            &id.to_string(),
            relation,
            &generate_correlation_id(),
        );
        let _guard = span.enter();
        let timer = OperationTimer::new("delete_relation");

        self.fetch_primary(id)?;
        let payload = RelationshipPayload::from_relation_body(relation, body)?;
        let related_ids = payload.ids_for(relation);
        if related_ids.is_empty() {
            debug!("Empty relationship payload, nothing to delete");
            return Ok(ApiResponse::no_content());
        }

        let descriptor = self.describe(relation);
        let mut removed = 0u64;
        for related_id in related_ids {
            removed += match &descriptor.kind {
                RelationKind::ManyToMany { pivot_type, .. } => {
                    self.delete_pivot_rows(pivot_type, &descriptor, id, related_id)?
                }
                RelationKind::Direct { owning } => {
                    self.unlink_direct(&descriptor, *owning, id, Some(related_id))?
                }
            };
        }

        resolver_metrics().record_links_removed(removed);
        info!(removed, "Relationships deleted");
        timer.finish();
        Ok(ApiResponse::no_content())
    }

    /// Persist `data.relationships` of a resource create/update document for
    /// entity `id`. Every pivot is cleared once before its first insert.
    /// Returns the number of links written.
    pub fn save_resource_relationships(
        &self,
        id: &EntityId,
        body: &str,
    ) -> Result<usize, ResolverError> {
        let span = relation_span(
            "save_resource",
            &self.entity,
            &id.to_string(),
            "*",
            &generate_correlation_id(),
        );
        let _guard = span.enter();

        self.fetch_primary(id)?;
        if body.trim().is_empty() {
            return Ok(0);
        }
        let document: serde_json::Value = serde_json::from_str(body)?;
        let payload = RelationshipPayload::from_resource_document(&document)?;
        let written = self.set_relationships(&payload, id, true)?;
        info!(written, relations = payload.len(), "Resource relationships saved");
        Ok(written)
    }

    /// Work out how `relation` links the primary entity to its related type.
    pub fn describe(&self, relation: &str) -> RelationDescriptor {
        if let Some(declared) = self
            .catalog
            .and_then(|catalog| catalog.describe(&self.entity, relation))
        {
            return declared;
        }

        let related_type = naming::class_name(relation);
        let kind = if self.pivots.pivot_exists(&self.entity, &related_type) {
            RelationKind::ManyToMany {
                pivot_type: naming::pivot_name(&self.entity, &related_type),
                direction: PivotDirection::Forward,
            }
        } else if self.pivots.pivot_exists(&related_type, &self.entity) {
            RelationKind::ManyToMany {
                pivot_type: naming::pivot_name(&related_type, &self.entity),
                direction: PivotDirection::Inverse,
            }
        } else {
            RelationKind::Direct { owning: None }
        };

        RelationDescriptor {
            primary_type: self.entity.clone(),
            related_type,
            kind,
        }
    }

    /// Persist every relation in `payload` for entity `id`. With `removable`,
    /// existing pivot rows of the entity are dropped before the first insert
    /// into each pivot. Returns the number of links written.
    pub fn set_relationships(
        &self,
        payload: &RelationshipPayload,
        id: &EntityId,
        removable: bool,
    ) -> Result<usize, ResolverError> {
        let mut cleared = HashSet::new();
        let mut written = 0;

        for (relation, target) in payload.entries() {
            let ids = match target {
                RelationTarget::One(related_id) => vec![related_id],
                RelationTarget::Many(related_ids) => related_ids.iter().collect(),
            };
            for related_id in ids {
                self.save_relationship(relation, id, related_id, removable, &mut cleared)?;
                written += 1;
            }
        }
        Ok(written)
    }

    fn preset_relation(
        &self,
        id: &EntityId,
        relation: &str,
        body: &str,
    ) -> Result<Document, ResolverError> {
        self.fetch_primary(id)?;
        let payload = RelationshipPayload::from_relation_body(relation, body)?;
        let written = self.set_relationships(&payload, id, true)?;
        info!(written, "Relationships saved");

        let primary = self.fetch_primary(id)?;
        let related = self.gateway.load_relation(&primary, relation)?;
        Ok(Document::resource(&primary).with_included(&related))
    }

    fn save_relationship(
        &self,
        relation: &str,
        id: &EntityId,
        related_id: &EntityId,
        removable: bool,
        cleared: &mut HashSet<String>,
    ) -> Result<(), ResolverError> {
        let descriptor = self.describe(relation);
        match &descriptor.kind {
            RelationKind::ManyToMany { pivot_type, .. } => {
                if removable && cleared.insert(pivot_type.clone()) {
                    self.clear_pivot(pivot_type, id)?;
                }
                self.save_pivot(pivot_type, &descriptor, id, related_id)
            }
            RelationKind::Direct { owning } if related_id.is_cleared() => {
                self.unlink_direct(&descriptor, *owning, id, None).map(|_| ())
            }
            RelationKind::Direct { owning } => {
                self.save_model(&descriptor, *owning, id, related_id)
            }
        }
    }

    fn clear_pivot(&self, pivot_type: &str, id: &EntityId) -> Result<(), ResolverError> {
        let filter = Filter::new().eq(naming::foreign_key(&self.entity), id.to_json());
        let rows = self.gateway.find_where(pivot_type, &filter)?;
        for row in &rows {
            self.gateway.delete(row)?;
        }

        resolver_metrics().record_pivot_clear();
        debug!(pivot = %pivot_type, removed = rows.len(), "Cleared pivot rows before save");
        Ok(())
    }

    fn save_pivot(
        &self,
        pivot_type: &str,
        descriptor: &RelationDescriptor,
        id: &EntityId,
        related_id: &EntityId,
    ) -> Result<(), ResolverError> {
        let row = Record::new(pivot_type)
            .with_field(naming::foreign_key(&descriptor.related_type), related_id.to_json())
            .with_field(naming::foreign_key(&self.entity), id.to_json());
        self.gateway.save(&row)?;

        resolver_metrics().record_link_created();
        debug!(pivot = %pivot_type, related_id = %related_id, "Pivot row saved");
        Ok(())
    }

    /// Point the owning record's foreign key at the other side.
    fn save_model(
        &self,
        descriptor: &RelationDescriptor,
        owning: Option<OwningSide>,
        id: &EntityId,
        related_id: &EntityId,
    ) -> Result<(), ResolverError> {
        let (mut record, foreign_key, target) = match self.owning_side(descriptor, owning)? {
            OwningSide::Related => (
                self.fetch(&descriptor.related_type, related_id)?,
                naming::foreign_key(&self.entity),
                id,
            ),
            OwningSide::Primary => {
                self.fetch(&descriptor.related_type, related_id)?;
                (
                    self.fetch_primary(id)?,
                    naming::foreign_key(&descriptor.related_type),
                    related_id,
                )
            }
        };

        record.set(foreign_key.as_str(), target.to_json());
        self.gateway.save(&record)?;

        resolver_metrics().record_link_created();
        debug!(
            entity = %record.entity_type,
            foreign_key = %foreign_key,
            target = %target,
            "Foreign key saved"
        );
        Ok(())
    }

    fn delete_pivot_rows(
        &self,
        pivot_type: &str,
        descriptor: &RelationDescriptor,
        id: &EntityId,
        related_id: &EntityId,
    ) -> Result<u64, ResolverError> {
        let filter = Filter::new()
            .eq(naming::foreign_key(&self.entity), id.to_json())
            .eq(naming::foreign_key(&descriptor.related_type), related_id.to_json());
        let rows = self.gateway.find_where(pivot_type, &filter)?;
        if rows.is_empty() {
            warn!(pivot = %pivot_type, related_id = %related_id, "No pivot row matched");
        }
        for row in &rows {
            self.gateway.delete(row)?;
        }
        Ok(rows.len() as u64)
    }

    /// Write the sentinel id into the foreign key linking the two sides.
    /// `requested` is the related id named by the request, if any.
    fn unlink_direct(
        &self,
        descriptor: &RelationDescriptor,
        owning: Option<OwningSide>,
        id: &EntityId,
        requested: Option<&EntityId>,
    ) -> Result<u64, ResolverError> {
        let candidates = match self.owning_side(descriptor, owning)? {
            OwningSide::Related => {
                let foreign_key = naming::foreign_key(&self.entity);
                let filter = Filter::new().eq(foreign_key.as_str(), id.to_json());
                self.gateway
                    .find_where(&descriptor.related_type, &filter)?
                    .into_iter()
                    .map(|record| (record, foreign_key.clone()))
                    .collect::<Vec<_>>()
            }
            OwningSide::Primary => {
                let foreign_key = naming::foreign_key(&descriptor.related_type);
                let primary = self.fetch_primary(id)?;
                if primary.links_to(&foreign_key, &EntityId::CLEARED) {
                    Vec::new()
                } else {
                    vec![(primary, foreign_key)]
                }
            }
        };

        let mut unlinked = 0;
        for (mut record, foreign_key) in candidates {
            if let Some(requested) = requested {
                let is_requested = if record.entity_type == descriptor.related_type {
                    record.id.as_ref() == Some(requested)
                } else {
                    record.links_to(&foreign_key, requested)
                };
                if !is_requested {
                    if self.unlink_scope == UnlinkScope::RequestedOnly {
                        continue;
                    }
                    warn!(
                        entity = %record.entity_type,
                        record_id = ?record.id,
                        requested = %requested,
                        "Unlinking a record that does not match the requested id"
                    );
                }
            }

            record.set(foreign_key.as_str(), EntityId::CLEARED.to_json());
            self.gateway.save(&record)?;
            unlinked += 1;
        }

        if unlinked == 0 {
            warn!(related = %descriptor.related_type, "No linked record to unlink");
        }
        Ok(unlinked)
    }

    fn owning_side(
        &self,
        descriptor: &RelationDescriptor,
        declared: Option<OwningSide>,
    ) -> Result<OwningSide, ResolverError> {
        if let Some(side) = declared {
            return Ok(side);
        }
        let foreign_key = naming::foreign_key(&self.entity);
        if self.gateway.has_field(&descriptor.related_type, &foreign_key)? {
            Ok(OwningSide::Related)
        } else {
            debug!(
                related = %descriptor.related_type,
                foreign_key = %foreign_key,
                "Related schema has no link back, foreign key is on the primary"
            );
            Ok(OwningSide::Primary)
        }
    }

    fn fetch_primary(&self, id: &EntityId) -> Result<Record, ResolverError> {
        self.fetch(&self.entity, id)
    }

    fn fetch(&self, entity: &str, id: &EntityId) -> Result<Record, ResolverError> {
        self.gateway.find_by_id(entity, id)?.ok_or_else(|| {
            resolver_metrics().record_not_found();
            warn!(entity = %entity, id = %id, "Database object not found");
            ResolverError::NotFound {
                entity: entity.to_string(),
                id: id.clone(),
            }
        })
    }
}
