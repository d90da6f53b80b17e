use std::sync::Arc;

use crate::injector::{Object, ResolveError};
use crate::producer::{Arguments, Produce};

/// A [`Produce`] implementation which hands out a pre-built value.
///
/// Every request shares the same underlying allocation, which matches the
/// memoization contract: the value behaves exactly like a zero-dependency
/// factory that was invoked once.
pub struct ValueProducer {
    object: Object,
}

impl ValueProducer {
    pub fn new(object: Object) -> Self {
        Self { object }
    }
}

impl Produce for ValueProducer {
    fn dyn_produce(&self, _args: Arguments) -> Result<Object, ResolveError> {
        Ok(Arc::clone(&self.object))
    }
}

/// A [`Produce`] implementation which forwards its single declared
/// dependency unchanged. Backs [`Definitions::alias`].
///
/// [`Definitions::alias`]: crate::definitions::Definitions::alias
pub(crate) struct AliasProducer;

impl Produce for AliasProducer {
    fn dyn_produce(&self, mut args: Arguments) -> Result<Object, ResolveError> {
        args.take_object()
    }
}

#[cfg(test)]
mod tests {
    use crate::producer::test_util;

    use super::*;

    #[test]
    fn value_producer_shares_the_same_allocation() {
        let object: Object = Arc::new(42i32);
        let producer = ValueProducer::new(Arc::clone(&object));

        let first = producer.dyn_produce(test_util::arguments("value", &[])).unwrap();
        let second = producer.dyn_produce(test_util::arguments("value", &[])).unwrap();

        assert!(Arc::ptr_eq(&first, &object));
        assert!(Arc::ptr_eq(&second, &object));
    }

    #[test]
    fn alias_producer_forwards_first_argument() {
        let object: Object = Arc::new("aliased");

        let args = test_util::arguments("alias", &[("original", Arc::clone(&object))]);
        let forwarded = AliasProducer.dyn_produce(args).unwrap();

        assert!(Arc::ptr_eq(&forwarded, &object));
    }
}
