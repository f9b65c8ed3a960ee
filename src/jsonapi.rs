// JSON-API document shapes returned to the request layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::naming;
use crate::relations::{Record, RelationData};
use crate::state_machine::ConfigurationError;

pub const HTTP_NO_CONTENT: u16 = 204;
pub const HTTP_UNPROCESSABLE: u16 = 422;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
}

impl From<&Record> for ResourceObject {
    fn from(record: &Record) -> Self {
        Self {
            resource_type: naming::table_name(&record.entity_type),
            id: record.id.as_ref().map(ToString::to_string),
            attributes: record.fields.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Collection(Vec<ResourceObject>),
    Single(Option<ResourceObject>),
}

impl From<&RelationData> for PrimaryData {
    fn from(data: &RelationData) -> Self {
        match data {
            RelationData::One(record) => PrimaryData::Single(record.as_ref().map(Into::into)),
            RelationData::Many(records) => {
                PrimaryData::Collection(records.iter().map(Into::into).collect())
            }
        }
    }
}

/// A top-level JSON-API document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub data: PrimaryData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
}

impl Document {
    pub fn resource(record: &Record) -> Self {
        Self {
            data: PrimaryData::Single(Some(record.into())),
            included: Vec::new(),
        }
    }

    pub fn relation(data: &RelationData) -> Self {
        Self {
            data: data.into(),
            included: Vec::new(),
        }
    }

    pub fn with_included(mut self, related: &RelationData) -> Self {
        self.included
            .extend(related.records().into_iter().map(ResourceObject::from));
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub status: String,
    pub code: String,
    pub title: String,
}

impl ErrorObject {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            code: status.to_string(),
            title: title.into(),
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code.to_string();
        self
    }
}

impl From<&ConfigurationError> for ErrorObject {
    fn from(err: &ConfigurationError) -> Self {
        ErrorObject::new(HTTP_UNPROCESSABLE, err.to_string()).with_code(err.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

impl ErrorDocument {
    pub fn single(error: ErrorObject) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

/// Status plus optional body, ready for the transport layer
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn no_content() -> Self {
        Self {
            status: HTTP_NO_CONTENT,
            body: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_document_shape() {
        let record = Record::new("BlogPost")
            .with_id(10)
            .with_field("title", "Hello");
        let value = Document::resource(&record).to_value();

        assert_eq!(
            value,
            json!({"data": {"type": "blog_post", "id": "10", "attributes": {"title": "Hello"}}})
        );
    }

    #[test]
    fn test_empty_single_relation_is_null() {
        let value = Document::relation(&RelationData::One(None)).to_value();
        assert_eq!(value, json!({"data": null}));
    }

    #[test]
    fn test_configuration_error_object_carries_code() {
        let err = ConfigurationError::MissingInitial {
            field: "status".to_string(),
        };
        let object = ErrorObject::from(&err);

        assert_eq!(object.status, "422");
        assert_eq!(object.code, "4002");
    }
}
