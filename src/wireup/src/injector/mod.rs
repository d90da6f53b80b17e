mod core;

use std::any::Any;
use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

pub use self::core::Injector;

/// The reserved name under which every injector provides itself.
///
/// Any declaration may list this name as a dependency to receive the
/// injector resolving it, and [`Injector::get`] on it returns the injector's
/// own handle. Registering a definition under this name is rejected with
/// [`DefineError::BadName`].
///
/// [`Injector::get`]: crate::injector::Injector::get
/// [`DefineError::BadName`]: crate::definitions::DefineError::BadName
pub const INJECTOR_NAME: &str = "injector";

/// A type-erased shared handle to a resolved dependency value.
pub type Object = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum ResolveError {
    #[snafu(display("could not find a dependency named {name:?}"))]
    #[non_exhaustive]
    MissingDependency { name: String },
    #[snafu(display("could not construct {name:?} which depends on itself somehow"))]
    #[non_exhaustive]
    CyclicResolution { name: String },
    #[snafu(display("could not use the value of {name:?} where a {expected} is expected"))]
    #[non_exhaustive]
    TypeMismatch { name: String, expected: &'static str },
    #[snafu(display("could not supply more arguments than {name:?} declared"))]
    #[non_exhaustive]
    ArgumentExhausted { name: String },
    #[snafu(display("could not construct the value of {name:?}"))]
    #[non_exhaustive]
    ProducerFailure {
        name: String,
        source: Arc<dyn Error + Send + Sync>,
    },
}
