//! Layer dependency graph and deployment ordering

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{LayerImage, SystemImage};
use crate::{Error, Result};

/// Problems found in a layer dependency graph.
#[derive(Debug, Default)]
pub(crate) struct GraphProblems {
    /// `(layer, dependency)` pairs naming a layer that does not exist
    pub unknown: Vec<(String, String)>,
    /// Layers on or between cycles, sorted by name
    pub cyclic: Vec<String>,
}

/// Dependency graph over the first occurrence of every layer name.
struct LayerGraph<'a> {
    layers: Vec<&'a LayerImage>,
    /// For each layer, the layers that depend on it
    dependents: Vec<Vec<usize>>,
    /// For each layer, the number of distinct known dependencies
    indegree: Vec<usize>,
    unknown: Vec<(String, String)>,
}

impl<'a> LayerGraph<'a> {
    fn build(layers: &'a [LayerImage]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut nodes = Vec::new();
        for layer in layers {
            if !index.contains_key(layer.name.as_str()) {
                index.insert(layer.name.as_str(), nodes.len());
                nodes.push(layer);
            }
        }

        let mut dependents = vec![Vec::new(); nodes.len()];
        let mut indegree = vec![0; nodes.len()];
        let mut unknown = Vec::new();

        for (i, layer) in nodes.iter().enumerate() {
            let mut seen = HashSet::new();
            for dep in &layer.dependencies {
                if !seen.insert(dep.as_str()) {
                    continue;
                }
                match index.get(dep.as_str()) {
                    Some(&d) => {
                        dependents[d].push(i);
                        indegree[i] += 1;
                    }
                    None => unknown.push((layer.name.clone(), dep.clone())),
                }
            }
        }

        Self {
            layers: nodes,
            dependents,
            indegree,
            unknown,
        }
    }

    /// Kahn's algorithm. Among ready layers the lowest `(priority, name)`
    /// goes first. Returns the order and the indices left unplaced.
    fn sort(&self) -> (Vec<usize>, Vec<usize>) {
        let mut indegree = self.indegree.clone();
        let mut ready: BTreeSet<(i32, &str, usize)> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| (self.layers[i].priority, self.layers[i].name.as_str(), i))
            .collect();

        let mut order = Vec::with_capacity(self.layers.len());
        while let Some(next) = ready.pop_first() {
            let i = next.2;
            order.push(i);
            for &dependent in &self.dependents[i] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    let layer = self.layers[dependent];
                    ready.insert((layer.priority, layer.name.as_str(), dependent));
                }
            }
        }

        let remaining = (0..self.layers.len())
            .filter(|i| indegree[*i] > 0)
            .collect();
        (order, remaining)
    }

    /// Narrow unplaced layers down to those on (or between) cycles by
    /// peeling off layers nothing else in the set depends on.
    fn cyclic_names(&self, remaining: Vec<usize>) -> Vec<String> {
        let mut set: HashSet<usize> = remaining.into_iter().collect();
        loop {
            let leaves: Vec<usize> = set
                .iter()
                .copied()
                .filter(|i| !self.dependents[*i].iter().any(|d| set.contains(d)))
                .collect();
            if leaves.is_empty() {
                break;
            }
            for leaf in leaves {
                set.remove(&leaf);
            }
        }
        let mut names: Vec<String> = set.into_iter().map(|i| self.layers[i].name.clone()).collect();
        names.sort();
        names
    }
}

/// Inspect the layer graph for unknown dependencies and cycles.
pub(crate) fn graph_problems(layers: &[LayerImage]) -> GraphProblems {
    let graph = LayerGraph::build(layers);
    let (_, remaining) = graph.sort();
    GraphProblems {
        cyclic: if remaining.is_empty() {
            Vec::new()
        } else {
            graph.cyclic_names(remaining)
        },
        unknown: graph.unknown,
    }
}

/// Order in which the image's layers deploy.
///
/// Every layer comes after all of its dependencies; among layers whose
/// dependencies are satisfied, lower `priority` deploys first and equal
/// priorities fall back to name order.
///
/// # Errors
///
/// Fails on duplicate layer names, dependencies on unknown layers and
/// dependency cycles.
pub fn deployment_order(image: &SystemImage) -> Result<Vec<&LayerImage>> {
    let mut names = HashSet::new();
    for layer in &image.layers {
        if !names.insert(layer.name.as_str()) {
            return Err(Error::DuplicateLayer {
                name: layer.name.clone(),
            });
        }
    }

    let graph = LayerGraph::build(&image.layers);
    if let Some((layer, dependency)) = graph.unknown.first() {
        return Err(Error::UnknownDependency {
            layer: layer.clone(),
            dependency: dependency.clone(),
        });
    }

    let (order, remaining) = graph.sort();
    if !remaining.is_empty() {
        return Err(Error::DependencyCycle {
            layers: graph.cyclic_names(remaining),
        });
    }

    Ok(order.into_iter().map(|i| graph.layers[i]).collect())
}
