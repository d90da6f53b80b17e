pub mod component;
pub mod factory;
pub mod value;

use std::any;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::injector::{Object, ResolveError};

pub use component::{Component, ComponentProducer};
pub use factory::{Factory, FactoryProducer};
pub use value::ValueProducer;

/// A universal recipe which constructs the value registered under one name.
///
/// A [`Produce`] implementation receives its declared dependencies already
/// resolved, as a positional [`Arguments`] list in declaration order, and
/// returns a type-erased shared [`Object`]. The injector invokes a producer
/// at most once per container; afterwards the constructed object is served
/// from the cache.
///
/// Usually you don't need to implement [`Produce`] manually. Registering
/// through [`Definitions`] wraps closures ([`Factory`]), constructible types
/// ([`Component`]), plain values and aliases in the right producer for you.
///
/// [`Definitions`]: crate::definitions::Definitions
#[cfg_attr(test, mockall::automock)]
pub trait Produce: Send + Sync + 'static {
    /// Builds the object from the resolved dependency list.
    ///
    /// # Errors
    ///
    /// Returns an error if an argument doesn't match the type the producer
    /// expects or if the underlying constructor itself fails.
    fn dyn_produce(&self, args: Arguments) -> Result<Object, ResolveError>;
}

/// The positional argument list handed to a producer, one entry per declared
/// dependency name, in declaration order.
pub struct Arguments {
    target: String,
    items: VecDeque<(String, Object)>,
}

impl Arguments {
    pub(crate) fn new(target: impl Into<String>, items: VecDeque<(String, Object)>) -> Self {
        Self {
            target: target.into(),
            items,
        }
    }

    /// The name whose value is being constructed.
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Takes the next positional argument, downcast to `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ArgumentExhausted`] if more arguments are
    /// taken than dependencies were declared, and
    /// [`ResolveError::TypeMismatch`] if the resolved value is not a `T`.
    pub fn take<T>(&mut self) -> Result<Arc<T>, ResolveError>
    where
        T: Send + Sync + 'static,
    {
        let (name, object) = self.next_item()?;
        object.downcast::<T>().map_err(|_| ResolveError::TypeMismatch {
            name,
            expected: any::type_name::<T>(),
        })
    }

    /// Takes the next positional argument without downcasting it.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::ArgumentExhausted`] if more arguments are
    /// taken than dependencies were declared.
    pub fn take_object(&mut self) -> Result<Object, ResolveError> {
        self.next_item().map(|(_, object)| object)
    }

    fn next_item(&mut self) -> Result<(String, Object), ResolveError> {
        self.items
            .pop_front()
            .ok_or_else(|| ResolveError::ArgumentExhausted {
                name: self.target.clone(),
            })
    }
}
