// Typed state machine configuration, validated once at load time

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::errors::ConfigurationError;

/// Key inside a field's `states` block that lists the entry states.
pub const INITIAL_KEY: &str = "initial";

/// A scalar state value. Values come from external configuration and may be
/// strings or integers; equality is by value and never coerces between the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Int(i64),
    Str(String),
}

impl StateValue {
    /// Interpret a mapping key. Keys spelled as canonical integers become
    /// integer states.
    pub fn from_key(key: &str) -> Self {
        match key.parse::<i64>() {
            Ok(n) if n.to_string() == key => StateValue::Int(n),
            _ => StateValue::Str(key.to_string()),
        }
    }

    pub fn to_key(&self) -> String {
        match self {
            StateValue::Int(n) => n.to_string(),
            StateValue::Str(s) => s.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            StateValue::Int(n) => serde_json::Value::from(*n),
            StateValue::Str(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Read a state from a stored field value; anything but a string or an
    /// integer is not a state.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(StateValue::Str(s.clone())),
            serde_json::Value::Number(n) => n.as_i64().map(StateValue::Int),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Int(n) => write!(f, "{n}"),
            StateValue::Str(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Str(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Str(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        StateValue::Int(i64::from(value))
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        StateValue::Int(value)
    }
}

/// Shape of a field block as written in configuration documents:
/// `{ enabled, states: { <state>: [<next>...], initial: [<state>...] } }`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct RawFieldMachine {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    states: BTreeMap<String, Vec<StateValue>>,
}

/// Transition map and entry states for one state-tracked field
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawFieldMachine", into = "RawFieldMachine")]
pub struct FieldMachineConfig {
    pub enabled: bool,
    pub transitions: HashMap<StateValue, Vec<StateValue>>,
    pub initial: Vec<StateValue>,
}

impl From<RawFieldMachine> for FieldMachineConfig {
    fn from(raw: RawFieldMachine) -> Self {
        let mut states = raw.states;
        let initial = states.remove(INITIAL_KEY).unwrap_or_default();
        let transitions = states
            .into_iter()
            .map(|(key, next)| (StateValue::from_key(&key), next))
            .collect();

        Self {
            enabled: raw.enabled,
            transitions,
            initial,
        }
    }
}

impl From<FieldMachineConfig> for RawFieldMachine {
    fn from(config: FieldMachineConfig) -> Self {
        let mut states: BTreeMap<String, Vec<StateValue>> = config
            .transitions
            .into_iter()
            .map(|(state, next)| (state.to_key(), next))
            .collect();
        if !config.initial.is_empty() {
            states.insert(INITIAL_KEY.to_string(), config.initial);
        }

        Self {
            enabled: config.enabled,
            states,
        }
    }
}

impl FieldMachineConfig {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    pub fn with_transitions<I, S>(mut self, from: impl Into<StateValue>, to: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateValue>,
    {
        self.transitions
            .insert(from.into(), to.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_initial<I, S>(mut self, initial: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<StateValue>,
    {
        self.initial = initial.into_iter().map(Into::into).collect();
        self
    }

    /// Load-time invariant: an enabled machine needs states and an entry state.
    pub fn validate(&self, table: &str, field: &str) -> Result<(), ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidMachine {
            table: table.to_string(),
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if field.trim().is_empty() {
            return Err(invalid("state field name is empty"));
        }
        if !self.enabled {
            return Ok(());
        }
        if self.transitions.is_empty() {
            return Err(invalid("enabled machine has no states"));
        }
        if self.initial.is_empty() {
            return Err(invalid("enabled machine has no initial state"));
        }
        Ok(())
    }
}

/// All state-tracked fields of one table, in declaration order.
///
/// Order matters: the first declared field is the one the machine tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMachineConfig {
    fields: Vec<(String, FieldMachineConfig)>,
}

impl EntityMachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: impl Into<String>, config: FieldMachineConfig) -> Self {
        let field = field.into();
        self.fields.retain(|(name, _)| *name != field);
        self.fields.push((field, config));
        self
    }

    pub fn first_field(&self) -> Option<&str> {
        self.fields.first().map(|(name, _)| name.as_str())
    }

    pub fn field(&self, field: &str) -> Option<&FieldMachineConfig> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, config)| config)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldMachineConfig)> {
        self.fields.iter().map(|(name, config)| (name.as_str(), config))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn validate(&self, table: &str) -> Result<(), ConfigurationError> {
        self.fields
            .iter()
            .try_for_each(|(field, config)| config.validate(table, field))
    }
}

impl Serialize for EntityMachineConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, config) in &self.fields {
            map.serialize_entry(field, config)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EntityMachineConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = EntityMachineConfig;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to state machine block")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut config = EntityMachineConfig::new();
                while let Some((field, block)) =
                    access.next_entry::<String, FieldMachineConfig>()?
                {
                    config = config.with_field(field, block);
                }
                Ok(config)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}
