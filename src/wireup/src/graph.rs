use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A static view of a definition set as a mapping from each declared name to
/// the names it depends on.
///
/// A [`DependencyGraph`] doesn't resolve anything. It only answers the two
/// questions that decide whether a definition set may become an injector at
/// all: are all referenced names declared, and can every name be constructed
/// in some order. Both checks run in `O(V + E)` time for `V` names and `E`
/// dependency references, and both report their results as sorted sets so
/// that the outcome is deterministic regardless of registration order.
pub struct DependencyGraph {
    dependencies: BTreeMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new(dependencies: BTreeMap<String, Vec<String>>) -> Self {
        Self { dependencies }
    }

    /// Lists every name which appears in some dependency list but is not
    /// itself declared in the graph.
    pub fn list_missing_dependencies(&self) -> BTreeSet<String> {
        let mut missing = BTreeSet::new();
        for dependencies in self.dependencies.values() {
            for dependency in dependencies {
                if !self.dependencies.contains_key(dependency) {
                    missing.insert(dependency.clone());
                }
            }
        }
        missing
    }

    /// Lists every name which takes part in a dependency cycle, plus every
    /// name which directly or transitively depends on such a cycle.
    ///
    /// The check is Kahn's algorithm run for its failure set: each name
    /// starts with an unmet-dependency count equal to the length of its own
    /// dependency list, names with no dependencies seed the ready queue, and
    /// draining the queue decrements the count of every dependant along the
    /// reversed edges. A name whose count never reaches zero can't be
    /// constructed in any order and is reported here.
    ///
    /// A name referencing an undeclared dependency never becomes ready
    /// either, so callers are expected to rule out missing references with
    /// [`list_missing_dependencies`](Self::list_missing_dependencies) before
    /// interpreting this result as a cycle report.
    pub fn list_dependency_cycle(&self) -> BTreeSet<String> {
        let mut unmet_counts: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(name, dependencies)| (name.as_str(), dependencies.len()))
            .collect();
        let dependants = self.reverse_edges();

        let mut ready: VecDeque<&str> = unmet_counts
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&name, _)| name)
            .collect();

        while let Some(name) = ready.pop_front() {
            let Some(dependants_of) = dependants.get(name) else {
                continue;
            };

            for &dependant in dependants_of {
                if let Some(count) = unmet_counts.get_mut(dependant) {
                    *count -= 1;
                    if *count == 0 {
                        ready.push_back(dependant);
                    }
                }
            }
        }

        unmet_counts
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .map(|(name, _)| name.to_owned())
            .collect()
    }

    fn reverse_edges(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut dependants: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, dependencies) in &self.dependencies {
            for dependency in dependencies {
                dependants
                    .entry(dependency.as_str())
                    .or_default()
                    .push(name.as_str());
            }
        }
        dependants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(entries: &[(&str, &[&str])]) -> DependencyGraph {
        let dependencies = entries
            .iter()
            .map(|&(name, dependencies)| {
                let dependencies = dependencies.iter().map(|&dep| dep.to_owned()).collect();
                (name.to_owned(), dependencies)
            })
            .collect();
        DependencyGraph::new(dependencies)
    }

    fn names(expected: &[&str]) -> BTreeSet<String> {
        expected.iter().map(|&name| name.to_owned()).collect()
    }

    #[test]
    fn list_missing_dependencies_approves_empty_graph() {
        assert_eq!(graph(&[]).list_missing_dependencies(), names(&[]));
    }

    #[test]
    fn list_missing_dependencies_approves_met_dependencies() {
        let graph = graph(&[("a", &["b", "c"]), ("b", &["c"]), ("c", &[])]);
        assert_eq!(graph.list_missing_dependencies(), names(&[]));
    }

    #[test]
    fn list_missing_dependencies_finds_undeclared_name() {
        let graph = graph(&[("a", &["b", "c"]), ("b", &["c"])]);
        assert_eq!(graph.list_missing_dependencies(), names(&["c"]));
    }

    #[test]
    fn list_dependency_cycle_approves_empty_graph() {
        assert_eq!(graph(&[]).list_dependency_cycle(), names(&[]));
    }

    #[test]
    fn list_dependency_cycle_approves_acyclic_chain() {
        let graph = graph(&[
            ("a", &["b", "c", "d"]),
            ("b", &["c", "d"]),
            ("c", &["d"]),
            ("d", &[]),
        ]);
        assert_eq!(graph.list_dependency_cycle(), names(&[]));
    }

    #[test]
    fn list_dependency_cycle_finds_cycle_and_spares_clean_subgraph() {
        let graph = graph(&[
            ("a", &["b", "d"]),
            ("b", &["c"]),
            ("c", &["a"]),
            ("d", &["e"]),
            ("e", &[]),
        ]);
        assert_eq!(graph.list_dependency_cycle(), names(&["a", "b", "c"]));
    }

    #[test]
    fn list_dependency_cycle_includes_names_downstream_of_cycle() {
        let graph = graph(&[
            ("a", &["b"]),
            ("b", &["a"]),
            ("watcher", &["a"]),
            ("free", &[]),
        ]);
        assert_eq!(
            graph.list_dependency_cycle(),
            names(&["a", "b", "watcher"]),
        );
    }

    #[test]
    fn list_dependency_cycle_finds_self_loop() {
        let graph = graph(&[("a", &["a"]), ("b", &[])]);
        assert_eq!(graph.list_dependency_cycle(), names(&["a"]));
    }
}
