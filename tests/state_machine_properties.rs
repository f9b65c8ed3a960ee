// Property-Based Testing for the state machine
// Transition and entry checks must agree with the configured map for any input

use apiforge::state_machine::{EntityMachineConfig, FieldMachineConfig, StateMachine, StateValue};
use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::HashMap;

#[derive(Debug, Clone, Arbitrary)]
struct Edge {
    #[proptest(strategy = "state_strategy()")]
    from: StateValue,
    #[proptest(strategy = "prop::collection::vec(state_strategy(), 0..4)")]
    to: Vec<StateValue>,
}

#[derive(Debug, Clone, Arbitrary)]
struct Query {
    #[proptest(strategy = "state_strategy()")]
    from: StateValue,
    #[proptest(strategy = "state_strategy()")]
    to: StateValue,
}

// Mix of string and integer states, including values that never appear in a config
fn state_strategy() -> impl Strategy<Value = StateValue> {
    prop_oneof![
        Just(StateValue::from("draft")),
        Just(StateValue::from("review")),
        Just(StateValue::from("published")),
        Just(StateValue::from("archived")),
        (0i64..4).prop_map(StateValue::Int),
    ]
}

type TransitionMap = HashMap<StateValue, Vec<StateValue>>;

fn build(edges: &[Edge], initial: &[StateValue]) -> (StateMachine, TransitionMap) {
    let mut field = FieldMachineConfig::new(true).with_initial(initial.to_vec());
    let mut expected: TransitionMap = HashMap::new();
    for edge in edges {
        field = field.with_transitions(edge.from.clone(), edge.to.clone());
        expected.insert(edge.from.clone(), edge.to.clone());
    }

    let mut tables = HashMap::new();
    tables.insert(
        "post".to_string(),
        EntityMachineConfig::new().with_field("status", field),
    );

    let mut machine = StateMachine::new("Post", &tables);
    machine.set_states("status").unwrap();
    (machine, expected)
}

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn prop_transition_matches_configured_map() {
        let mut runner = proptest::test_runner::TestRunner::default();

        runner
            .run(
                &(
                    prop::collection::vec(any::<Edge>(), 1..6),
                    prop::collection::vec(any::<Query>(), 1..20),
                ),
                |(edges, queries)| {
                    let (machine, expected) = build(&edges, &[StateValue::from("draft")]);

                    for query in queries {
                        let configured = expected
                            .get(&query.from)
                            .is_some_and(|allowed| allowed.contains(&query.to));
                        prop_assert_eq!(
                            machine.is_transitive(&query.from, &query.to),
                            query.from == query.to || configured,
                            "{} -> {}",
                            query.from,
                            query.to
                        );
                    }
                    Ok(())
                },
            )
            .unwrap();
    }

    #[test]
    fn prop_self_transition_always_allowed() {
        let mut runner = proptest::test_runner::TestRunner::default();

        runner
            .run(
                &(prop::collection::vec(any::<Edge>(), 1..6), state_strategy()),
                |(edges, state)| {
                    let (machine, _) = build(&edges, &[StateValue::from("draft")]);
                    prop_assert!(machine.is_transitive(&state, &state));
                    Ok(())
                },
            )
            .unwrap();
    }

    #[test]
    fn prop_entry_requires_initial_membership() {
        let mut runner = proptest::test_runner::TestRunner::default();

        runner
            .run(
                &(
                    prop::collection::vec(any::<Edge>(), 1..6),
                    prop::collection::vec(state_strategy(), 1..3),
                    state_strategy(),
                ),
                |(edges, initial, state)| {
                    let (machine, _) = build(&edges, &initial);
                    prop_assert_eq!(machine.is_initial(&state), initial.contains(&state));
                    prop_assert_eq!(machine.check_entry(&state).is_ok(), initial.contains(&state));
                    Ok(())
                },
            )
            .unwrap();
    }

    #[test]
    fn prop_int_and_string_states_never_coerce() {
        let mut runner = proptest::test_runner::TestRunner::default();

        runner
            .run(&(0i64..4), |n| {
                let edges = vec![Edge {
                    from: StateValue::Int(n),
                    to: vec![StateValue::Int(n + 1)],
                }];
                let (machine, _) = build(&edges, &[StateValue::Int(n)]);

                prop_assert!(machine.is_transitive(&StateValue::Int(n), &StateValue::Int(n + 1)));
                prop_assert!(!machine.is_transitive(
                    &StateValue::Str(n.to_string()),
                    &StateValue::Str((n + 1).to_string())
                ));
                Ok(())
            })
            .unwrap();
    }
}
