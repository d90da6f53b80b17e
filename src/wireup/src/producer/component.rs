use std::error::Error;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::injector::{Object, ResolveError};
use crate::producer::{Arguments, Produce};

/// A type that has a dedicated constructor for dependency injection.
///
/// The constructor receives the declared dependencies as a positional
/// [`Arguments`] list, in declaration order, and pulls them off with
/// [`Arguments::take`]:
///
/// ```rust
/// # use std::convert::Infallible;
/// # use std::sync::Arc;
/// # use wireup::injector::ResolveError;
/// # use wireup::producer::{Arguments, Component};
/// #
/// struct Repository {
///     connection_url: Arc<String>,
///     pool_size: Arc<usize>,
/// }
///
/// impl Component for Repository {
///     type Error = Infallible;
///
///     fn construct(args: &mut Arguments) -> Result<Result<Self, Self::Error>, ResolveError> {
///         Ok(Ok(Self {
///             connection_url: args.take()?,
///             pool_size: args.take()?,
///         }))
///     }
/// }
/// ```
///
/// Register a component with [`Definitions::register_component`], or build
/// one ad hoc with [`Injector::construct`].
///
/// [`Definitions::register_component`]: crate::definitions::Definitions::register_component
/// [`Injector::construct`]: crate::injector::Injector::construct
pub trait Component: Sized + Send + Sync + 'static {
    /// The error occurred in construction after all dependencies are
    /// resolved.
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Creates the component from the resolved dependency list.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments don't match the constructor's
    /// expectations.
    ///
    /// Returns an inner error [`Component::Error`] wrapped in the outer
    /// [`Ok`] if the construction itself fails.
    fn construct(args: &mut Arguments) -> Result<Result<Self, Self::Error>, ResolveError>;
}

/// A [`Produce`] implementation which constructs instances of a
/// [`Component`].
pub struct ComponentProducer<C>
where
    C: Component,
{
    _marker: PhantomData<C>,
}

impl<C> ComponentProducer<C>
where
    C: Component,
{
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C> Produce for ComponentProducer<C>
where
    C: Component,
{
    fn dyn_produce(&self, mut args: Arguments) -> Result<Object, ResolveError> {
        match C::construct(&mut args) {
            Ok(Ok(component)) => {
                let object: Object = Arc::new(component);
                Ok(object)
            }
            Ok(Err(err)) => Err(ResolveError::ProducerFailure {
                name: args.target().to_owned(),
                source: Arc::from(err.into()),
            }),
            Err(err) => Err(err),
        }
    }
}
