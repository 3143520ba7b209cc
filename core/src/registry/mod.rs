//! Module registry and dependency resolver.
//!
//! Modules register in a deterministic order; `resolve` builds a directed
//! graph from their declared dependencies and computes topological layers.
//! All modules in one layer share a single replay pass and finalize
//! together before the next layer starts. Ties within a layer keep
//! registration order, so output ordering is reproducible.

use hashbrown::HashMap;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::analysis::AnalysisModule;
use crate::errors::RegistryError;

#[derive(Default)]
pub struct ModuleRegistry {
    modules: Vec<Box<dyn AnalysisModule>>,
    index: HashMap<&'static str, usize>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Names must be unique.
    pub fn register(&mut self, module: Box<dyn AnalysisModule>) -> Result<(), RegistryError> {
        let name = module.name();
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateModule(name.to_string()));
        }
        self.index.insert(name, self.modules.len());
        self.modules.push(module);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Compute dependency layers: indices into the module list, grouped so
    /// that every module's dependencies sit in strictly earlier layers.
    ///
    /// Fails before any event is dispatched when a dependency name is
    /// unregistered or the graph has no topological order.
    pub fn resolve(&self) -> Result<Vec<Vec<usize>>, RegistryError> {
        let mut graph: DiGraph<usize, ()> = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..self.modules.len()).map(|i| graph.add_node(i)).collect();

        for (i, module) in self.modules.iter().enumerate() {
            for dep in module.dependencies() {
                let &j = self
                    .index
                    .get(dep)
                    .ok_or_else(|| RegistryError::UnknownModule {
                        module: module.name().to_string(),
                        dependency: dep.to_string(),
                    })?;
                // dependency -> dependent
                graph.add_edge(nodes[j], nodes[i], ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            RegistryError::DependencyCycle(self.modules[graph[cycle.node_id()]].name().to_string())
        })?;

        // Layer = longest dependency chain feeding the node.
        let mut level: HashMap<NodeIndex, usize> = HashMap::new();
        for &node in &order {
            let l = graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|dep| level[&dep] + 1)
                .max()
                .unwrap_or(0);
            level.insert(node, l);
        }

        let depth = level.values().copied().max().map_or(0, |m| m + 1);
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); depth];
        for (node, &l) in &level {
            layers[l].push(graph[*node]);
        }
        for layer in &mut layers {
            // Within-layer tiebreak: registration order.
            layer.sort_unstable();
        }

        debug!(modules = self.modules.len(), layers = layers.len(), "resolved module graph");
        Ok(layers)
    }

    /// Consume the registry, yielding the modules in registration order.
    pub(crate) fn into_modules(self) -> Vec<Box<dyn AnalysisModule>> {
        self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisContext;
    use crate::errors::ModuleFault;
    use crate::events::{Event, EventKind};
    use crate::report::Finding;

    struct Stub {
        name: &'static str,
        deps: Vec<&'static str>,
    }

    impl Stub {
        fn boxed(name: &'static str, deps: &[&'static str]) -> Box<dyn AnalysisModule> {
            Box::new(Self {
                name,
                deps: deps.to_vec(),
            })
        }
    }

    impl AnalysisModule for Stub {
        fn name(&self) -> &'static str {
            self.name
        }

        fn dependencies(&self) -> &[&'static str] {
            &self.deps
        }

        fn subscriptions(&self) -> &'static [EventKind] {
            &[]
        }

        fn on_event(&mut self, _: &Event, _: &AnalysisContext<'_>) -> Result<(), ModuleFault> {
            Ok(())
        }

        fn finalize(&mut self, _: &AnalysisContext<'_>) -> Result<Vec<Finding>, ModuleFault> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_independent_modules_share_one_layer() {
        let mut registry = ModuleRegistry::new();
        registry.register(Stub::boxed("a", &[])).unwrap();
        registry.register(Stub::boxed("b", &[])).unwrap();

        assert_eq!(registry.resolve().unwrap(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_dependents_land_in_later_layers() {
        let mut registry = ModuleRegistry::new();
        registry.register(Stub::boxed("c", &["b"])).unwrap();
        registry.register(Stub::boxed("a", &[])).unwrap();
        registry.register(Stub::boxed("b", &["a"])).unwrap();

        // a, then b, then c; indices follow registration order.
        assert_eq!(registry.resolve().unwrap(), vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_reversed_registration_changes_only_within_layer_order() {
        let mut forward = ModuleRegistry::new();
        forward.register(Stub::boxed("a", &[])).unwrap();
        forward.register(Stub::boxed("b", &[])).unwrap();
        forward.register(Stub::boxed("c", &["a", "b"])).unwrap();

        let mut reversed = ModuleRegistry::new();
        reversed.register(Stub::boxed("b", &[])).unwrap();
        reversed.register(Stub::boxed("a", &[])).unwrap();
        reversed.register(Stub::boxed("c", &["a", "b"])).unwrap();

        // Cross-layer structure is identical; only the tiebreak within the
        // first layer follows registration order.
        assert_eq!(forward.resolve().unwrap(), vec![vec![0, 1], vec![2]]);
        assert_eq!(reversed.resolve().unwrap(), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_cycle_is_fatal() {
        let mut registry = ModuleRegistry::new();
        registry.register(Stub::boxed("a", &["b"])).unwrap();
        registry.register(Stub::boxed("b", &["a"])).unwrap();

        assert!(matches!(
            registry.resolve(),
            Err(RegistryError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut registry = ModuleRegistry::new();
        registry.register(Stub::boxed("a", &["a"])).unwrap();

        assert!(matches!(
            registry.resolve(),
            Err(RegistryError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_unknown_dependency_is_fatal() {
        let mut registry = ModuleRegistry::new();
        registry.register(Stub::boxed("a", &["ghost"])).unwrap();

        match registry.resolve() {
            Err(RegistryError::UnknownModule { module, dependency }) => {
                assert_eq!(module, "a");
                assert_eq!(dependency, "ghost");
            }
            other => panic!("expected UnknownModule, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_name_rejected_at_registration() {
        let mut registry = ModuleRegistry::new();
        registry.register(Stub::boxed("a", &[])).unwrap();
        assert!(matches!(
            registry.register(Stub::boxed("a", &[])),
            Err(RegistryError::DuplicateModule(_))
        ));
    }
}
