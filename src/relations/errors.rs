use thiserror::Error;

use super::types::EntityId;
use crate::jsonapi::{ErrorDocument, ErrorObject};

pub const HTTP_NOT_FOUND: u16 = 404;
pub const HTTP_BAD_REQUEST: u16 = 400;
pub const HTTP_INTERNAL_ERROR: u16 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Unknown entity type: {0}")]
    UnknownEntity(String),
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum ResolverError {
    #[error("Database object {entity} with id = {id} - not found.")]
    NotFound { entity: String, id: EntityId },
    #[error("Malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("Invalid identifier for relation \"{relation}\": {value}")]
    InvalidIdentifier { relation: String, value: String },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ResolverError {
    pub fn status(&self) -> u16 {
        match self {
            ResolverError::NotFound { .. } => HTTP_NOT_FOUND,
            ResolverError::MalformedBody(_) | ResolverError::InvalidIdentifier { .. } => {
                HTTP_BAD_REQUEST
            }
            ResolverError::Gateway(_) => HTTP_INTERNAL_ERROR,
        }
    }

    /// JSON-API error document for the request layer to send back
    pub fn to_error_document(&self) -> ErrorDocument {
        ErrorDocument::single(ErrorObject::new(self.status(), self.to_string()))
    }
}
