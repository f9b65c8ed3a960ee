// Relations Module - request-time relationship resolution
//
// Decides per call whether a relation is a direct foreign key or a pivot join,
// probing both name orders when nothing is declared, and persists through the
// injected gateway.

pub mod catalog;
pub mod errors;
pub mod gateway;
pub mod payload;
pub mod pivot;
pub mod resolver;
pub mod traits;
pub mod types;


pub use catalog::{CatalogPivotResolver, DeclaredKind, RelationCatalog, RelationSpec};
pub use errors::{GatewayError, ResolverError};
pub use gateway::{GatewayCall, MemoryGateway, RelationDefinition};
pub use payload::{RelationTarget, RelationshipPayload};
pub use pivot::FilePivotResolver;
pub use resolver::RelationshipResolver;
pub use traits::{EntityGateway, PivotResolver};
pub use types::{
    EntityId, Filter, OwningSide, PivotDirection, Record, RelationData, RelationDescriptor,
    RelationKind, UnlinkScope,
};

#[cfg(any(test, feature = "testing"))]
pub use traits::{MockEntityGateway, MockPivotResolver};
