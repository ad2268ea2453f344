//! Dependency engine (C10): a small dataflow scheduler that runs validators
//! in parallel while respecting declared dependencies, folding their
//! outcomes into one [`CompositeResult`].
//!
//! Modeled directly on the workflow executor's job graph: a two-pass graph
//! build (forward deps, then reverse `dependents`), DFS cycle detection, and
//! Kahn's-algorithm topological batching. Unlike a workflow, there is no
//! cancellation at this layer and no required-vs-optional distinction —
//! every validator always runs, and the composite result is the AND of all
//! of them.

use crate::input::Input;
use crate::result::{CompositeResult, ValidationResult, ValidatorName};
use crate::validator::{Validator, ValidatorMap};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validator '{validator}' depends on '{dependency}' which is not in the map")]
    UnknownDependency {
        validator: String,
        dependency: String,
    },
    #[error("dependency cycle detected involving validator '{0}'")]
    CycleDetected(String),
}

struct Node {
    deps: Vec<ValidatorName>,
    dependents: Vec<ValidatorName>,
}

/// Runs a [`ValidatorMap`] against one [`Input`], producing a
/// [`CompositeResult`].
pub struct DependencyEngine;

impl DependencyEngine {
    pub fn new() -> Self {
        Self
    }

    pub async fn validate(
        &self,
        validators: &ValidatorMap,
        input: &Input,
    ) -> Result<CompositeResult, EngineError> {
        let graph = Self::build_graph(validators)?;
        Self::detect_cycles(&graph)?;
        let batches = Self::execution_order(&graph)?;

        let mut results: HashMap<ValidatorName, ValidationResult> = HashMap::new();

        for batch in batches {
            debug!(?batch, "running validator batch");
            let mut handles = Vec::with_capacity(batch.len());

            for name in batch {
                let validator = Arc::clone(&validators[&name]);
                let deps = graph[&name].deps.clone();
                let predecessors: Vec<ValidationResult> = deps
                    .iter()
                    .map(|dep| {
                        results
                            .get(dep)
                            .cloned()
                            .expect("predecessor already completed by topological order")
                    })
                    .collect();
                let input = input.clone();

                handles.push(tokio::spawn(async move {
                    let result = validator.validate(&input, &predecessors).await;
                    (name, result)
                }));
            }

            for handle in handles {
                let (name, result) = handle.await.expect("validator task panicked");
                results.insert(name, result);
            }
        }

        Ok(CompositeResult::new(results))
    }

    fn build_graph(validators: &ValidatorMap) -> Result<HashMap<ValidatorName, Node>, EngineError> {
        let mut graph: HashMap<ValidatorName, Node> = validators
            .iter()
            .map(|(name, validator)| {
                (
                    name.clone(),
                    Node {
                        deps: validator.deps(),
                        dependents: Vec::new(),
                    },
                )
            })
            .collect();

        let names: Vec<ValidatorName> = graph.keys().cloned().collect();
        for name in &names {
            let deps = graph[name].deps.clone();
            for dep in deps {
                if let Some(dep_node) = graph.get_mut(&dep) {
                    dep_node.dependents.push(name.clone());
                } else {
                    return Err(EngineError::UnknownDependency {
                        validator: name.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }

        Ok(graph)
    }

    fn detect_cycles(graph: &HashMap<ValidatorName, Node>) -> Result<(), EngineError> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();

        for name in graph.keys() {
            if !visited.contains(name) && Self::has_cycle(name, graph, &mut visited, &mut rec_stack) {
                return Err(EngineError::CycleDetected(name.to_string()));
            }
        }

        Ok(())
    }

    fn has_cycle(
        name: &ValidatorName,
        graph: &HashMap<ValidatorName, Node>,
        visited: &mut HashSet<ValidatorName>,
        rec_stack: &mut HashSet<ValidatorName>,
    ) -> bool {
        visited.insert(name.clone());
        rec_stack.insert(name.clone());

        if let Some(node) = graph.get(name) {
            for dep in &node.deps {
                if !visited.contains(dep) {
                    if Self::has_cycle(dep, graph, visited, rec_stack) {
                        return true;
                    }
                } else if rec_stack.contains(dep) {
                    return true;
                }
            }
        }

        rec_stack.remove(name);
        false
    }

    fn execution_order(
        graph: &HashMap<ValidatorName, Node>,
    ) -> Result<Vec<Vec<ValidatorName>>, EngineError> {
        let mut in_degree: HashMap<ValidatorName, usize> = graph
            .iter()
            .map(|(name, node)| (name.clone(), node.deps.len()))
            .collect();

        let mut queue: VecDeque<ValidatorName> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| name.clone())
            .collect();

        let mut order = Vec::new();
        while !queue.is_empty() {
            let batch: Vec<ValidatorName> = queue.drain(..).collect();
            for name in &batch {
                for dependent in &graph[name].dependents {
                    let degree = in_degree.get_mut(dependent).unwrap();
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent.clone());
                    }
                }
            }
            order.push(batch);
        }

        let processed: usize = order.iter().map(|b| b.len()).sum();
        if processed != graph.len() {
            return Err(EngineError::CycleDetected(
                "unable to resolve all dependencies".to_string(),
            ));
        }

        Ok(order)
    }
}

impl Default for DependencyEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::result::ValidatorName;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed {
        deps: Vec<ValidatorName>,
        valid: bool,
        sleep: Duration,
    }

    #[async_trait]
    impl Validator for Fixed {
        fn deps(&self) -> Vec<ValidatorName> {
            self.deps.clone()
        }

        async fn validate(
            &self,
            _input: &Input,
            predecessors: &[ValidationResult],
        ) -> ValidationResult {
            if !self.sleep.is_zero() {
                tokio::time::sleep(self.sleep).await;
            }
            let preds_valid = predecessors.iter().all(|r| r.is_valid());
            if self.valid && preds_valid {
                ValidationResult::valid(ValidatorName::new("fixed"))
            } else {
                ValidationResult::invalid(
                    crate::stage_error::ValidationError::Other("failed".to_string()),
                    ValidatorName::new("fixed"),
                )
            }
        }
    }

    fn input() -> Input {
        Input::new(Address::from_string("user@example.com"))
    }

    #[tokio::test]
    async fn independent_validators_fail_independently() {
        let mut map: ValidatorMap = HashMap::new();
        map.insert(
            ValidatorName::new("test1"),
            Arc::new(Fixed { deps: vec![], valid: true, sleep: Duration::ZERO }),
        );
        map.insert(
            ValidatorName::new("test2"),
            Arc::new(Fixed { deps: vec![], valid: true, sleep: Duration::ZERO }),
        );
        map.insert(
            ValidatorName::new("test3"),
            Arc::new(Fixed { deps: vec![], valid: false, sleep: Duration::ZERO }),
        );

        let engine = DependencyEngine::new();
        let composite = engine.validate(&map, &input()).await.unwrap();
        assert!(!composite.is_valid());
    }

    #[tokio::test]
    async fn dependent_validator_waits_for_predecessors() {
        let mut map: ValidatorMap = HashMap::new();
        map.insert(
            ValidatorName::new("test1"),
            Arc::new(Fixed {
                deps: vec![],
                valid: true,
                sleep: Duration::from_millis(30),
            }),
        );
        map.insert(
            ValidatorName::new("test2"),
            Arc::new(Fixed {
                deps: vec![],
                valid: true,
                sleep: Duration::from_millis(30),
            }),
        );
        map.insert(
            ValidatorName::new("test3"),
            Arc::new(Fixed {
                deps: vec![ValidatorName::new("test1"), ValidatorName::new("test2")],
                valid: true,
                sleep: Duration::from_millis(30),
            }),
        );

        let engine = DependencyEngine::new();
        let composite = engine.validate(&map, &input()).await.unwrap();
        assert!(composite.is_valid());
    }

    #[tokio::test]
    async fn cycle_is_a_fatal_configuration_error() {
        let mut map: ValidatorMap = HashMap::new();
        map.insert(
            ValidatorName::new("a"),
            Arc::new(Fixed {
                deps: vec![ValidatorName::new("b")],
                valid: true,
                sleep: Duration::ZERO,
            }),
        );
        map.insert(
            ValidatorName::new("b"),
            Arc::new(Fixed {
                deps: vec![ValidatorName::new("a")],
                valid: true,
                sleep: Duration::ZERO,
            }),
        );

        let engine = DependencyEngine::new();
        let err = engine.validate(&map, &input()).await.unwrap_err();
        assert!(matches!(err, EngineError::CycleDetected(_)));
    }

    #[tokio::test]
    async fn unknown_dependency_is_rejected() {
        let mut map: ValidatorMap = HashMap::new();
        map.insert(
            ValidatorName::new("a"),
            Arc::new(Fixed {
                deps: vec![ValidatorName::new("missing")],
                valid: true,
                sleep: Duration::ZERO,
            }),
        );

        let engine = DependencyEngine::new();
        let err = engine.validate(&map, &input()).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownDependency { .. }));
    }
}
