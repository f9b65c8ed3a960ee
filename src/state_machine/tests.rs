// Tests for the state machine

use std::collections::HashMap;

use super::errors::*;
use super::machine::*;
use super::types::*;

fn post_machine() -> HashMap<String, EntityMachineConfig> {
    let status = FieldMachineConfig::new(true)
        .with_transitions("draft", ["published"])
        .with_transitions("published", ["archived"])
        .with_initial(["draft"]);

    HashMap::from([(
        "post".to_string(),
        EntityMachineConfig::new().with_field("status", status),
    )])
}

fn prepared(provider: &HashMap<String, EntityMachineConfig>) -> StateMachine {
    let mut machine = StateMachine::new("Post", provider);
    machine.set_states("status").unwrap();
    machine.set_initial("status").unwrap();
    machine
}

#[test]
fn test_post_scenario() {
    let provider = post_machine();
    let machine = prepared(&provider);

    assert!(machine.is_transitive(&"draft".into(), &"published".into()));
    assert!(!machine.is_transitive(&"published".into(), &"draft".into()));
    assert!(!machine.is_transitive(&"archived".into(), &"draft".into()));
    assert!(machine.is_initial(&"draft".into()));
    assert!(!machine.is_initial(&"published".into()));
    assert_eq!(machine.initial(), Some(&StateValue::from("draft")));
    assert_eq!(machine.field(), Some("status"));
}

#[test]
fn test_self_transition_without_outgoing_states() {
    let provider = post_machine();
    let machine = prepared(&provider);

    let archived = StateValue::from("archived");
    assert!(machine.is_transitive(&archived, &archived));
    let unknown = StateValue::Int(42);
    assert!(machine.is_transitive(&unknown, &unknown));
}

#[test]
fn test_unknown_entity_is_empty_machine() {
    let provider = post_machine();
    let machine = StateMachine::new("Comment", &provider);

    assert_eq!(machine.field(), None);
    assert!(!machine.is_stated_field("status"));
    assert_eq!(machine.initial(), None);
    assert!(!machine.is_transitive(&"draft".into(), &"published".into()));
}

#[test]
fn test_initial_is_unset_before_set_initial() {
    let provider = post_machine();
    let mut machine = StateMachine::new("Post", &provider);

    assert_eq!(machine.initial(), None);
    machine.set_initial("status").unwrap();
    assert_eq!(machine.initial(), Some(&StateValue::from("draft")));
}

#[test]
fn test_disabled_field_is_not_stated() {
    let field = FieldMachineConfig::new(false)
        .with_transitions("open", ["closed"])
        .with_initial(["open"]);
    let provider = HashMap::from([(
        "ticket".to_string(),
        EntityMachineConfig::new().with_field("state", field),
    )]);
    let machine = StateMachine::new("Ticket", &provider);

    assert_eq!(machine.field(), Some("state"));
    assert!(!machine.is_stated_field("state"));
}

#[test]
fn test_set_states_rejects_missing_states() {
    let provider = HashMap::from([(
        "ticket".to_string(),
        EntityMachineConfig::new().with_field("state", FieldMachineConfig::new(false)),
    )]);
    let mut machine = StateMachine::new("Ticket", &provider);

    let err = machine.set_states("state").unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::MissingStates {
            field: "state".to_string()
        }
    );
    assert_eq!(err.code(), CODE_MISSING_STATES);

    let err = machine.set_states("missing").unwrap_err();
    assert_eq!(err.code(), CODE_MISSING_STATES);
}

#[test]
fn test_set_initial_rejects_missing_initial() {
    let field = FieldMachineConfig::new(false).with_transitions("open", ["closed"]);
    let provider = HashMap::from([(
        "ticket".to_string(),
        EntityMachineConfig::new().with_field("state", field),
    )]);
    let mut machine = StateMachine::new("Ticket", &provider);

    machine.set_states("state").unwrap();
    let err = machine.set_initial("state").unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingInitial { ref field } if field == "state"));
    assert_eq!(err.code(), CODE_MISSING_INITIAL);
    assert_ne!(CODE_MISSING_INITIAL, CODE_MISSING_STATES);
}

#[test]
fn test_blank_initial_is_missing() {
    let field = FieldMachineConfig::new(false)
        .with_transitions("open", ["closed"])
        .with_initial([""]);
    let provider = HashMap::from([(
        "ticket".to_string(),
        EntityMachineConfig::new().with_field("state", field),
    )]);
    let mut machine = StateMachine::new("Ticket", &provider);

    assert!(machine.set_initial("state").is_err());
}

#[test]
fn test_integer_states_compare_by_value() {
    let field = FieldMachineConfig::new(true)
        .with_transitions(1i64, [2i64, 3])
        .with_initial([1i64]);
    let provider = HashMap::from([(
        "order_item".to_string(),
        EntityMachineConfig::new().with_field("stage", field),
    )]);
    let mut machine = StateMachine::new("OrderItem", &provider);
    machine.set_states("stage").unwrap();

    assert!(machine.is_transitive(&StateValue::Int(1), &StateValue::Int(3)));
    assert!(!machine.is_transitive(&StateValue::Int(1), &StateValue::from("3")));
    assert!(machine.is_initial(&StateValue::Int(1)));
}

#[test]
fn test_tracked_field_is_first_declared() {
    let first = FieldMachineConfig::new(true)
        .with_transitions("a", ["b"])
        .with_initial(["a"]);
    let second = FieldMachineConfig::new(true)
        .with_transitions("x", ["y"])
        .with_initial(["x"]);
    let provider = HashMap::from([(
        "job".to_string(),
        EntityMachineConfig::new()
            .with_field("phase", first)
            .with_field("color", second),
    )]);

    let machine = StateMachine::new("Job", &provider);
    assert_eq!(machine.field(), Some("phase"));
}

#[test]
fn test_check_transition_reports_rejection() {
    let provider = post_machine();
    let machine = prepared(&provider);

    assert!(machine
        .check_transition(&"draft".into(), &"published".into())
        .is_ok());
    let err = machine
        .check_transition(&"published".into(), &"draft".into())
        .unwrap_err();
    assert!(matches!(err, TransitionError::NotAllowed { ref field, .. } if field == "status"));
}

#[test]
fn test_check_entry() {
    let provider = post_machine();
    let machine = prepared(&provider);

    assert!(machine.check_entry(&"draft".into()).is_ok());
    assert!(matches!(
        machine.check_entry(&"archived".into()),
        Err(TransitionError::NotInitial { .. })
    ));

    let untracked = StateMachine::new("Comment", &provider);
    assert!(matches!(
        untracked.check_entry(&"draft".into()),
        Err(TransitionError::UntrackedEntity { .. })
    ));
}

#[test]
fn test_load_tracked() {
    let provider = post_machine();

    let machine = StateMachine::load_tracked("Post", &provider).unwrap().unwrap();
    assert_eq!(machine.initial(), Some(&StateValue::from("draft")));
    assert!(StateMachine::load_tracked("Comment", &provider)
        .unwrap()
        .is_none());
}

#[test]
fn test_validate_rejects_enabled_without_initial() {
    let field = FieldMachineConfig::new(true).with_transitions("open", ["closed"]);
    let config = EntityMachineConfig::new().with_field("state", field);

    let err = config.validate("ticket").unwrap_err();
    assert_eq!(err.code(), CODE_INVALID_MACHINE);
}

#[test]
fn test_validate_rejects_enabled_without_states() {
    let field = FieldMachineConfig::new(true).with_initial(["open"]);
    let config = EntityMachineConfig::new().with_field("state", field);

    assert!(matches!(
        config.validate("ticket"),
        Err(ConfigurationError::InvalidMachine { .. })
    ));
}

#[test]
fn test_validate_accepts_disabled_empty_field() {
    let config = EntityMachineConfig::new().with_field("state", FieldMachineConfig::new(false));
    assert!(config.validate("ticket").is_ok());
}

#[test]
fn test_deserialize_preserves_field_order_and_splits_initial() {
    let json = serde_json::json!({
        "status": {
            "enabled": true,
            "states": {
                "draft": ["published"],
                "published": ["archived"],
                "initial": ["draft"]
            }
        },
        "moderation": {
            "enabled": false,
            "states": {}
        }
    });

    let config: EntityMachineConfig = serde_json::from_value(json).unwrap();
    assert_eq!(config.first_field(), Some("status"));

    let status = config.field("status").unwrap();
    assert!(status.enabled);
    assert_eq!(status.initial, vec![StateValue::from("draft")]);
    assert_eq!(status.transitions.len(), 2);
    assert!(!status.transitions.contains_key(&StateValue::from("initial")));
}

#[test]
fn test_integer_keys_become_integer_states() {
    let json = serde_json::json!({
        "stage": {
            "enabled": true,
            "states": { "1": [2], "2": [3], "initial": [1] }
        }
    });

    let config: EntityMachineConfig = serde_json::from_value(json).unwrap();
    let stage = config.field("stage").unwrap();
    assert_eq!(
        stage.transitions.get(&StateValue::Int(1)),
        Some(&vec![StateValue::Int(2)])
    );
}

#[test]
fn test_padded_keys_stay_string_states() {
    assert_eq!(StateValue::from_key("10"), StateValue::Int(10));
    assert_eq!(StateValue::from_key("010"), StateValue::from("010"));
    assert_eq!(StateValue::from_key("+1"), StateValue::from("+1"));
}
