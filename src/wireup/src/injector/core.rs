use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use oneshot::{Receiver, Sender};
use parking_lot::{RwLock, RwLockWriteGuard};

use crate::definitions::Declaration;
use crate::injector::{Object, ResolveError, INJECTOR_NAME};
use crate::producer::{Arguments, Component, Factory};

const AD_HOC_TARGET: &str = "<invocation>";

/// A finalized, queryable container which resolves names to values.
///
/// An [`Injector`] is a cheaply cloneable handle; clones share the factories
/// and the value cache. Every declared producer runs at most once per
/// container, no matter how many clones, threads or dependency paths request
/// its name. Names not declared locally are delegated to the parent
/// injector, which resolves them against its own definitions and cache.
///
/// The only way to obtain an [`Injector`] is
/// [`Definitions::build_injector`], which validates the whole dependency
/// graph first.
///
/// [`Definitions::build_injector`]: crate::definitions::Definitions::build_injector
#[derive(Clone)]
pub struct Injector {
    core: Arc<InjectorCore>,
}

struct InjectorCore {
    declarations: BTreeMap<String, Declaration>,
    parent: Option<Injector>,
    resolved: RwLock<ResolvedValueData>,
}

impl Injector {
    pub(crate) fn from_parts(
        declarations: BTreeMap<String, Declaration>,
        parent: Option<Injector>,
    ) -> Self {
        Self {
            core: Arc::new(InjectorCore {
                declarations,
                parent,
                resolved: RwLock::new(ResolvedValueData::new()),
            }),
        }
    }

    /// Resolves `name` and downcasts the value to `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is provided neither locally nor by an
    /// ancestor, if its producer fails, or if the resolved value is not a
    /// `T`.
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, ResolveError>
    where
        T: Send + Sync + 'static,
    {
        self.get_object(name)?
            .downcast::<T>()
            .map_err(|_| ResolveError::TypeMismatch {
                name: name.to_owned(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolves `name` to its type-erased value.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is provided neither locally nor by an
    /// ancestor, or if its producer fails.
    pub fn get_object(&self, name: &str) -> Result<Object, ResolveError> {
        if self.provides_locally(name) {
            self.get_local_object(name)
        } else if let Some(parent) = self.parent_providing(name) {
            parent.get_object(name)
        } else {
            Err(ResolveError::MissingDependency {
                name: name.to_owned(),
            })
        }
    }

    /// Returns true if this injector or an ancestor provides `name`.
    pub fn has(&self, name: &str) -> bool {
        self.provides_locally(name) || self.parent_providing(name).is_some()
    }

    /// Lists every name this injector can resolve, its own and its
    /// ancestors' combined.
    pub fn provided_names(&self) -> BTreeSet<String> {
        let mut names: BTreeSet<String> = self.core.declarations.keys().cloned().collect();
        names.insert(INJECTOR_NAME.to_owned());
        if let Some(parent) = &self.core.parent {
            names.extend(parent.provided_names());
        }
        names
    }

    /// Calls `factory` with the values of `dependencies`, resolved in the
    /// given order.
    ///
    /// This is the same mechanism [`get`](Self::get) uses to run a declared
    /// factory, except that the result is returned directly instead of being
    /// cached under a name. Producer failures are reported against the
    /// pseudo-target `"<invocation>"`.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be resolved or if the factory
    /// itself fails.
    pub fn invoke<F, D>(&self, factory: F, dependencies: &[&str]) -> Result<F::Constructed, ResolveError>
    where
        F: Factory<D>,
        D: Send + Sync + 'static,
    {
        let mut args = self.resolve_arguments(AD_HOC_TARGET, dependencies.iter().copied())?;
        match factory.run(&mut args) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ResolveError::ProducerFailure {
                name: AD_HOC_TARGET.to_owned(),
                source: Arc::from(err.into()),
            }),
            Err(err) => Err(err),
        }
    }

    /// Constructs a `C` with the values of `dependencies`, resolved in the
    /// given order and passed as positional constructor arguments.
    ///
    /// The counterpart of [`invoke`](Self::invoke) for constructible types.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency can't be resolved or if the
    /// constructor itself fails.
    pub fn construct<C>(&self, dependencies: &[&str]) -> Result<C, ResolveError>
    where
        C: Component,
    {
        let mut args = self.resolve_arguments(AD_HOC_TARGET, dependencies.iter().copied())?;
        match C::construct(&mut args) {
            Ok(Ok(component)) => Ok(component),
            Ok(Err(err)) => Err(ResolveError::ProducerFailure {
                name: AD_HOC_TARGET.to_owned(),
                source: Arc::from(err.into()),
            }),
            Err(err) => Err(err),
        }
    }

    fn provides_locally(&self, name: &str) -> bool {
        name == INJECTOR_NAME || self.core.declarations.contains_key(name)
    }

    fn parent_providing(&self, name: &str) -> Option<&Injector> {
        self.core.parent.as_ref().filter(|parent| parent.has(name))
    }

    fn get_local_object(&self, name: &str) -> Result<Object, ResolveError> {
        if name == INJECTOR_NAME {
            // Not cached: a self handle stored in the cache would keep the
            // container alive through its own state.
            let object: Object = Arc::new(self.clone());
            return Ok(object);
        }

        if let Some(object) = self.try_get_resolved_object(name) {
            return Ok(object);
        }

        let mut resolved = self.core.resolved.write();
        if let Some(object) = resolved.values.get(name) {
            return Ok(object.clone());
        }

        if let Some(pending) = resolved.constructing.get_mut(name) {
            if pending.is_constructed_by_current_thread() {
                Err(self.stop_construction_on_cyclic_resolution(resolved, name))
            } else {
                self.wait_for_resolved_object(resolved, name)
            }
        } else {
            self.construct_object(resolved, name)
        }
    }

    fn try_get_resolved_object(&self, name: &str) -> Option<Object> {
        let resolved = self.core.resolved.read();
        resolved.values.get(name).cloned()
    }

    fn stop_construction_on_cyclic_resolution(
        &self,
        resolved: RwLockWriteGuard<'_, ResolvedValueData>,
        name: &str,
    ) -> ResolveError {
        let err = ResolveError::CyclicResolution {
            name: name.to_owned(),
        };
        self.notify_waiters(resolved, name, WaitOutcome::Failed(err.clone()));
        err
    }

    fn wait_for_resolved_object(
        &self,
        resolved: RwLockWriteGuard<'_, ResolvedValueData>,
        name: &str,
    ) -> Result<Object, ResolveError> {
        let receiver = self.register_waiter_on_pending_construction(resolved, name);
        self.get_object_on_wait_outcome(receiver, name)
    }

    fn register_waiter_on_pending_construction(
        &self,
        mut resolved: RwLockWriteGuard<'_, ResolvedValueData>,
        name: &str,
    ) -> Receiver<WaitOutcome> {
        let (sender, receiver) = oneshot::channel();
        let Some(pending) = resolved.constructing.get_mut(name) else {
            unreachable!("whether `pending` exists should be checked before calling this method")
        };
        pending.register_waiter(sender);
        receiver
    }

    fn get_object_on_wait_outcome(
        &self,
        receiver: Receiver<WaitOutcome>,
        name: &str,
    ) -> Result<Object, ResolveError> {
        match receiver.recv() {
            Ok(WaitOutcome::Resolved) => {
                let resolved = self.core.resolved.read();
                let Some(object) = resolved.values.get(name) else {
                    unreachable!("`object` should already be put into `resolved.values`")
                };
                Ok(object.clone())
            }
            Ok(WaitOutcome::Failed(err)) => Err(err),
            Err(_) => unreachable!("the constructing thread should send an outcome"),
        }
    }

    fn construct_object(
        &self,
        mut resolved: RwLockWriteGuard<'_, ResolvedValueData>,
        name: &str,
    ) -> Result<Object, ResolveError> {
        let on_thread = thread::current().id();
        resolved
            .constructing
            .insert(name.to_owned(), PendingConstruction::new(on_thread));
        drop(resolved);

        match self.run_producer(name) {
            Ok(object) => {
                let mut resolved = self.core.resolved.write();
                resolved.values.insert(name.to_owned(), object.clone());
                self.notify_waiters(resolved, name, WaitOutcome::Resolved);
                Ok(object)
            }
            Err(err) => {
                let resolved = self.core.resolved.write();
                self.notify_waiters(resolved, name, WaitOutcome::Failed(err.clone()));
                Err(err)
            }
        }
    }

    fn run_producer(&self, name: &str) -> Result<Object, ResolveError> {
        let Some(declaration) = self.core.declarations.get(name) else {
            unreachable!("locally provided names should have a declaration")
        };
        let dependencies = declaration.dependencies.iter().map(String::as_str);
        let args = self.resolve_arguments(name, dependencies)?;
        declaration.producer.dyn_produce(args)
    }

    fn resolve_arguments<'a, I>(&self, target: &str, dependencies: I) -> Result<Arguments, ResolveError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut items = VecDeque::new();
        for name in dependencies {
            items.push_back((name.to_owned(), self.get_object(name)?));
        }
        Ok(Arguments::new(target, items))
    }

    fn notify_waiters(
        &self,
        mut resolved: RwLockWriteGuard<'_, ResolvedValueData>,
        name: &str,
        outcome: WaitOutcome,
    ) {
        if let Some(pending) = resolved.constructing.remove(name) {
            drop(resolved);
            pending.notify(outcome);
        }
    }
}

struct ResolvedValueData {
    values: HashMap<String, Object>,
    constructing: HashMap<String, PendingConstruction>,
}

impl ResolvedValueData {
    fn new() -> Self {
        Self {
            values: HashMap::new(),
            constructing: HashMap::new(),
        }
    }
}

struct PendingConstruction {
    on_thread: ThreadId,
    waiters: Vec<Sender<WaitOutcome>>,
}

impl PendingConstruction {
    fn new(on_thread: ThreadId) -> Self {
        Self {
            on_thread,
            waiters: Vec::new(),
        }
    }

    fn is_constructed_by_current_thread(&self) -> bool {
        thread::current().id() == self.on_thread
    }

    fn register_waiter(&mut self, sender: Sender<WaitOutcome>) {
        self.waiters.push(sender);
    }

    fn notify(self, outcome: WaitOutcome) {
        for sender in self.waiters {
            let _ = sender.send(outcome.clone());
        }
    }
}

#[derive(Clone)]
enum WaitOutcome {
    Resolved,
    Failed(ResolveError),
}
