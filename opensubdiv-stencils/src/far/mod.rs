//! Stencil factorization and the tables it produces.
//!
//! The [`StencilBuilder`] is fed by a refiner, one destination vertex at a
//! time. Once refinement is done it is turned into a read-only
//! [`StencilTable`] or, when derivative weights were accumulated, a
//! [`LimitStencilTable`].
pub mod stencil_builder;
pub mod stencil_table;
pub mod weight;

pub(crate) mod weight_table;

pub use stencil_builder::*;
pub use stencil_table::*;
pub use weight::PointDerivWeight;
pub use weight_table::{initial_capacity, MAX_INITIAL_CAPACITY};
