use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use snafu::prelude::*;

use crate::graph::DependencyGraph;
use crate::injector::{Injector, Object, INJECTOR_NAME};
use crate::producer::value::AliasProducer;
use crate::producer::{Component, ComponentProducer, Factory, FactoryProducer, Produce, ValueProducer};

/// A single registered recipe: the declared dependency names and the
/// producer that turns their values into this name's value.
pub(crate) struct Declaration {
    pub(crate) dependencies: Vec<String>,
    pub(crate) producer: Box<dyn Produce>,
}

/// An append-only set of named dependency definitions.
///
/// Definitions are collected here, then validated and frozen into an
/// [`Injector`] by [`build_injector`](Self::build_injector). The builder is
/// consumed by finalization, so a built injector can never observe later
/// mutation.
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use wireup::definitions::Definitions;
/// let mut definitions = Definitions::new();
/// definitions.register_value("base", 21i64)?;
/// definitions.register("doubled", &["base"], |base: Arc<i64>| {
///     Ok::<_, Infallible>(2 * *base)
/// })?;
///
/// let injector = definitions.build_injector()?;
/// assert_eq!(*injector.get::<i64>("doubled")?, 42);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Definitions {
    declarations: BTreeMap<String, Declaration>,
    parent: Option<Injector>,
}

impl Definitions {
    /// Creates an empty definition set for a root injector.
    pub fn new() -> Self {
        Self {
            declarations: BTreeMap::new(),
            parent: None,
        }
    }

    /// Creates an empty definition set whose injector will draw unresolved
    /// names from `parent`.
    ///
    /// Local registrations may reuse names the parent provides; the local
    /// definition shadows the parent's for everything resolved through the
    /// child.
    pub fn draw_from(parent: Injector) -> Self {
        Self {
            declarations: BTreeMap::new(),
            parent: Some(parent),
        }
    }

    /// Registers a factory closure under `name`, to be called with the
    /// values of `dependencies` in the given order.
    ///
    /// The closure runs only if the name is requested, and even then only
    /// once per injector.
    ///
    /// # Errors
    ///
    /// Returns [`DefineError::BadName`] if the name is empty or reserved,
    /// and [`DefineError::DuplicateName`] if it is already registered in
    /// this set. Names provided by the parent are not considered duplicates.
    pub fn register<F, D>(
        &mut self,
        name: &str,
        dependencies: &[&str],
        factory: F,
    ) -> Result<(), DefineError>
    where
        F: Factory<D>,
        D: Send + Sync + 'static,
    {
        self.insert(
            name.to_owned(),
            to_owned_names(dependencies),
            Box::new(FactoryProducer::new(factory)),
        )
    }

    /// Registers a pre-built value under `name`.
    ///
    /// Equivalent to registering a dependency-free factory that returns the
    /// value: every request shares the one registered instance.
    ///
    /// # Errors
    ///
    /// Fails the same way [`register`](Self::register) does.
    pub fn register_value<T>(&mut self, name: &str, value: T) -> Result<(), DefineError>
    where
        T: Send + Sync + 'static,
    {
        let object: Object = Arc::new(value);
        self.insert(name.to_owned(), Vec::new(), Box::new(ValueProducer::new(object)))
    }

    /// Registers the constructible type `C` under `name`, to be built with
    /// the values of `dependencies` as positional constructor arguments.
    ///
    /// # Errors
    ///
    /// Fails the same way [`register`](Self::register) does.
    pub fn register_component<C>(
        &mut self,
        name: &str,
        dependencies: &[&str],
    ) -> Result<(), DefineError>
    where
        C: Component,
    {
        self.insert(
            name.to_owned(),
            to_owned_names(dependencies),
            Box::new(ComponentProducer::<C>::new()),
        )
    }

    /// Registers `alias_name` as another name for `existing_name`.
    ///
    /// Equivalent to registering an identity factory depending only on
    /// `existing_name`; whether that name exists is checked by
    /// [`build_injector`](Self::build_injector), not here.
    ///
    /// # Errors
    ///
    /// Fails the same way [`register`](Self::register) does, judged against
    /// `alias_name`.
    pub fn alias(&mut self, existing_name: &str, alias_name: &str) -> Result<(), DefineError> {
        self.insert(
            alias_name.to_owned(),
            vec![existing_name.to_owned()],
            Box::new(AliasProducer),
        )
    }

    /// Validates the declared dependency graph and freezes the set into an
    /// [`Injector`].
    ///
    /// Names the parent can provide count as already satisfied; the parent's
    /// own graph was validated when the parent was built and is not checked
    /// again. Missing references are reported before cycles, each with the
    /// full set of offending names. No injector exists unless validation
    /// passes.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::MissingDependencies`] or
    /// [`BuildError::CircularDependencies`].
    pub fn build_injector(self) -> Result<Injector, BuildError> {
        let graph = self.make_dependency_graph();

        let missing = graph.list_missing_dependencies();
        if !missing.is_empty() {
            return Err(BuildError::MissingDependencies { names: missing });
        }

        let cyclic = graph.list_dependency_cycle();
        if !cyclic.is_empty() {
            return Err(BuildError::CircularDependencies { names: cyclic });
        }

        Ok(Injector::from_parts(self.declarations, self.parent))
    }

    pub(crate) fn insert(
        &mut self,
        name: String,
        dependencies: Vec<String>,
        producer: Box<dyn Produce>,
    ) -> Result<(), DefineError> {
        if name.is_empty() || name == INJECTOR_NAME {
            return Err(DefineError::BadName { name });
        }
        if self.declarations.contains_key(&name) {
            return Err(DefineError::DuplicateName { name });
        }

        self.declarations.insert(
            name,
            Declaration {
                dependencies,
                producer,
            },
        );
        Ok(())
    }

    fn make_dependency_graph(&self) -> DependencyGraph {
        let mut dependencies: BTreeMap<String, Vec<String>> = self
            .declarations
            .iter()
            .map(|(name, declaration)| (name.clone(), declaration.dependencies.clone()))
            .collect();

        // The injector provides itself, and parent-provided names were
        // validated when the parent was built; both count as satisfied
        // leaves here.
        dependencies.entry(INJECTOR_NAME.to_owned()).or_default();
        if let Some(parent) = &self.parent {
            for name in parent.provided_names() {
                dependencies.entry(name).or_default();
            }
        }

        DependencyGraph::new(dependencies)
    }
}

fn to_owned_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|&name| name.to_owned()).collect()
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DefineError {
    #[snafu(display("{name:?} is not a usable dependency name"))]
    #[non_exhaustive]
    BadName { name: String },
    #[snafu(display("the name {name:?} is already registered"))]
    #[non_exhaustive]
    DuplicateName { name: String },
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum BuildError {
    #[snafu(display("missing dependencies: {}", NameListDisplayer::new(names)))]
    #[non_exhaustive]
    MissingDependencies { names: BTreeSet<String> },
    #[snafu(display(
        "circular dependencies, cannot resolve dependency tree for: {}",
        NameListDisplayer::new(names)
    ))]
    #[non_exhaustive]
    CircularDependencies { names: BTreeSet<String> },
}

struct NameListDisplayer<'a> {
    names: &'a BTreeSet<String>,
}

impl<'a> NameListDisplayer<'a> {
    fn new(names: &'a BTreeSet<String>) -> Self {
        Self { names }
    }
}

impl Display for NameListDisplayer<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}
