// Traits for dependency injection - the resolver only talks to these seams

use super::errors::GatewayError;
use super::types::{EntityId, Filter, Record, RelationData};

/// Persistence contract consumed by the resolver
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait EntityGateway {
    /// Fetch one record by primary key
    fn find_by_id(&self, entity_type: &str, id: &EntityId) -> Result<Option<Record>, GatewayError>;

    /// Fetch every record matching the filter
    fn find_where(&self, entity_type: &str, filter: &Filter) -> Result<Vec<Record>, GatewayError>;

    /// Insert a record without an id, update one with an id. Returns the stored record.
    fn save(&self, record: &Record) -> Result<Record, GatewayError>;

    /// Delete a stored record
    fn delete(&self, record: &Record) -> Result<(), GatewayError>;

    /// Load a named relation of a record through the gateway's own relation definitions
    fn load_relation(&self, record: &Record, relation: &str) -> Result<RelationData, GatewayError>;

    /// Whether the entity's schema declares the given column
    fn has_field(&self, entity_type: &str, field: &str) -> Result<bool, GatewayError>;
}

/// Answers whether a pivot entity named `<first><second>` exists
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PivotResolver {
    fn pivot_exists(&self, first: &str, second: &str) -> bool;
}
