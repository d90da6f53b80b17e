use std::error::Error;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::injector::{Object, ResolveError};
use crate::producer::{Arguments, Produce};

/// A specialized form of [`Fn`] that can be called with values resolved from
/// an injector.
///
/// Closures of `Fn(Arc<A1>, Arc<A2>, ...) -> Result<T, E>` where each `Ai`
/// is `Send + Sync + 'static` are [`Factory`]. Arguments arrive in the order
/// the dependency names were declared, each one a shared handle to the
/// memoized value registered under that name.
///
/// Due to the lack of support for functions of variable length parameters,
/// [`Factory`] is only implemented for closures whose arity is at most 16.
pub trait Factory<D>: Send + Sync + 'static
where
    D: Send + Sync + 'static,
{
    /// The successfully constructed value.
    type Constructed: Send + Sync + 'static;

    /// The error occurred in construction after all dependencies are
    /// resolved.
    type Error: Into<Box<dyn Error + Send + Sync>>;

    /// Takes this factory's arguments from `args` and calls `self` with
    /// them.
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments don't match the closure's
    /// signature.
    ///
    /// Returns an inner error [`Factory::Error`] wrapped in the outer [`Ok`]
    /// if the construction itself fails.
    fn run(&self, args: &mut Arguments) -> Result<Result<Self::Constructed, Self::Error>, ResolveError>;
}

impl<F, T, E> Factory<()> for F
where
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    T: Send + Sync + 'static,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    type Constructed = T;

    type Error = E;

    fn run(&self, _args: &mut Arguments) -> Result<Result<T, E>, ResolveError> {
        Ok(self())
    }
}

macro_rules! for_all_tuples {
    ($implementation:ident) => {
        $implementation!(D1);
        $implementation!(D1, D2);
        $implementation!(D1, D2, D3);
        $implementation!(D1, D2, D3, D4);
        $implementation!(D1, D2, D3, D4, D5);
        $implementation!(D1, D2, D3, D4, D5, D6);
        $implementation!(D1, D2, D3, D4, D5, D6, D7);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12, D13);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12, D13, D14);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12, D13, D14, D15);
        $implementation!(D1, D2, D3, D4, D5, D6, D7, D8, D9, D10, D11, D12, D13, D14, D15, D16);
    };
}

macro_rules! impl_factory {
    ($($dep:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, T, E, $($dep,)*> Factory<($($dep,)*)> for F
        where
            F: Fn($(Arc<$dep>,)*) -> Result<T, E> + Send + Sync + 'static,
            T: Send + Sync + 'static,
            E: Into<Box<dyn Error + Send + Sync>>,
            $($dep: Send + Sync + 'static,)*
        {
            type Constructed = T;

            type Error = E;

            fn run(&self, args: &mut Arguments) -> Result<Result<T, E>, ResolveError> {
                $(
                    let $dep = args.take::<$dep>()?;
                )*
                Ok(self($($dep,)*))
            }
        }
    };
}

for_all_tuples!(impl_factory);

/// A [`Produce`] implementation which supplies objects from a [`Factory`]
/// closure.
pub struct FactoryProducer<C, D>
where
    C: Factory<D>,
    D: Send + Sync + 'static,
{
    factory: C,
    _marker: PhantomData<D>,
}

impl<C, D> FactoryProducer<C, D>
where
    C: Factory<D>,
    D: Send + Sync + 'static,
{
    pub fn new(factory: C) -> Self {
        Self {
            factory,
            _marker: PhantomData,
        }
    }
}

impl<C, D> Produce for FactoryProducer<C, D>
where
    C: Factory<D>,
    D: Send + Sync + 'static,
{
    fn dyn_produce(&self, mut args: Arguments) -> Result<Object, ResolveError> {
        match self.factory.run(&mut args) {
            Ok(Ok(value)) => {
                let object: Object = Arc::new(value);
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

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use crate::producer::test_util;

    use super::*;

    #[test]
    fn factory_run_succeeds_for_each_arity() {
        #[allow(dead_code)]
        fn factory_with_four_parameters() {
            let factory =
                |_: Arc<i32>, _: Arc<i32>, _: Arc<i32>, _: Arc<i32>| Ok::<_, Infallible>("str");
            let mut args = test_util::arguments("target", &[]);
            let _ = factory.run(&mut args);
        }

        #[allow(dead_code)]
        fn factory_with_no_parameter() {
            let factory = || Ok::<_, Infallible>("str");
            let mut args = test_util::arguments("target", &[]);
            let _ = factory.run(&mut args);
        }
    }

    #[test]
    fn factory_producer_succeeds() {
        let value: Object = Arc::new(21i32);
        let producer = FactoryProducer::new(|v: Arc<i32>| Ok::<_, Infallible>(2 * *v));

        let args = test_util::arguments("doubled", &[("value", value)]);
        let object = producer.dyn_produce(args).unwrap();
        assert_eq!(*object.downcast::<i32>().unwrap(), 42);
    }

    #[test]
    fn factory_producer_fails_when_construction_fails() {
        let producer = FactoryProducer::new(|| Err::<i32, _>("out of luck"));

        let args = test_util::arguments("unlucky", &[]);
        let err = producer.dyn_produce(args).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ProducerFailure { name, .. } if name == "unlucky"
        ));
    }

    #[test]
    fn factory_producer_fails_when_argument_type_differs() {
        let value: Object = Arc::new("not a number");
        let producer = FactoryProducer::new(|v: Arc<i32>| Ok::<_, Infallible>(*v));

        let args = test_util::arguments("doubled", &[("value", value)]);
        let err = producer.dyn_produce(args).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::TypeMismatch { name, .. } if name == "value"
        ));
    }
}
