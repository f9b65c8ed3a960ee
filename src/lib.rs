// apiforge - runtime core of a generated JSON-API module
// State machine validation and relationship resolution, exposed for the
// request layer, the CLI and tests.

pub mod cli;
pub mod config;
pub mod jsonapi;
pub mod naming;
pub mod observability;
pub mod relations;
pub mod state_machine;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, init_config, ApiForgeConfig};
pub use jsonapi::{ApiResponse, Document, ErrorDocument, ErrorObject, ResourceObject};
pub use observability::{resolver_metrics, OperationTimer, ResolverMetrics};
pub use relations::{
    EntityGateway, EntityId, FilePivotResolver, MemoryGateway, PivotResolver, Record,
    RelationCatalog, RelationDescriptor, RelationKind, RelationshipPayload, RelationshipResolver,
    ResolverError, UnlinkScope,
};
pub use state_machine::{
    ConfigurationError, EntityMachineConfig, FieldMachineConfig, StateConfigProvider,
    StateMachine, StateValue, TransitionError,
};
pub use telemetry::{generate_correlation_id, init_telemetry, relation_span};
