#![allow(clippy::new_without_default)]

pub mod definitions;
pub mod graph;
pub mod injector;
pub mod producer;

pub mod prelude {
    pub use crate::definitions::{BuildError, DefineError, Definitions};
    pub use crate::injector::{Injector, Object, ResolveError, INJECTOR_NAME};
    pub use crate::producer::{Arguments, Component, Factory};
}
