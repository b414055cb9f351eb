//#![warn(missing_docs)]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/virtualritz/opensubdiv/master/osd-logo.png"
)]
//! # Factorized Subdivision Stencils
//!
//! This crate builds the *stencils* of a refined
//! [subdivision surface](https://en.wikipedia.org/wiki/Subdivision_surface):
//! for every vertex a mesh refiner produces, at any level, a stencil expresses
//! that vertex as a weighted sum of the *original, coarse* control vertices.
//!
//! A refiner discovers level by level how each new vertex is computed from
//! the vertices of the previous level. The [`StencilBuilder`](far::StencilBuilder)
//! resolves that chain of references as it goes. Whenever a vertex is added
//! that is itself the result of an earlier refinement step, its already
//! factorized stencil is expanded in place. Arbitrarily deep refinement thus
//! collapses into one flat table which can be applied in a single pass over the
//! control points.
//!
//! ## Example
//!
//! ```
//! use opensubdiv_stencils::{far, Index};
//!
//! // Three control vertices.
//! let mut builder = far::StencilBuilder::new(3, far::StencilBuilderOptions::default());
//!
//! // Vertex 3 sits on the first control vertex.
//! builder.index(3u32).add_with_weight(Index(0), 1.0);
//!
//! // Vertex 4 blends control vertices 1 and 2.
//! let mut v4 = builder.index(4u32);
//! v4.add_with_weight(Index(1), 0.6);
//! v4.add_with_weight(Index(2), 0.4);
//!
//! // Vertex 5 is the midpoint of the two refined vertices above.
//! let mut v5 = builder.index(5u32);
//! v5.add_with_weight(Index(3), 0.5);
//! v5.add_with_weight(Index(4), 0.5);
//!
//! let table = builder.into_stencil_table();
//! let stencil = table.stencil(Index(5)).unwrap();
//!
//! assert_eq!(stencil.indices(), &[Index(0), Index(1), Index(2)]);
//! assert_eq!(stencil.weights(), &[0.5, 0.3, 0.2]);
//! ```
//!
//! ## Sequential Contract
//!
//! Stencils must be built strictly one destination vertex after the other,
//! and a refined vertex may only be used as a source once its own stencil is
//! complete. The [`StencilIndex`](far::StencilIndex) handle mutably borrows its
//! builder, so two destinations can never be written to at the same time.
//!
//! ## Features
#![doc = document_features::document_features!()]
//!
//! ## API Changes From C++
//!
//! Naming follows the conventions of the `opensubdiv-petite` wrapper:
//! * Be verbose consistently.
//! * Use canonical Rust naming  – (`GetNumVerticesTotal()` becomes
//!   `contribution_count()`).
//! * Option structs use the
//!   [init struct pattern](https://xaeroxe.github.io/init-struct-pattern/).
//! * Use unsigned integer types for anything that can only contain positive
//!   values (indices, sizes/lengths/counts).

pub mod error;
pub mod far;

pub use error::{Error, Result};

/// A vertex index in the refined topology.
///
/// Indices below the control vertex count of a
/// [`StencilBuilder`](far::StencilBuilder) refer to coarse control vertices.
/// All others refer to refined vertices whose stencils are built by it.
///
/// # Examples
///
/// ```
/// use opensubdiv_stencils::Index;
///
/// // Create an index from a u32
/// let idx = Index::from(42u32);
/// assert_eq!(idx.0, 42);
///
/// // Convert back to u32
/// let value: u32 = idx.into();
/// assert_eq!(value, 42);
///
/// // Create from usize
/// let idx = Index::from(100usize);
/// let as_usize: usize = idx.into();
/// assert_eq!(as_usize, 100);
/// ```
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bytemuck::Pod,
    bytemuck::Zeroable,
    derive_more::Display,
)]
#[repr(transparent)]
pub struct Index(pub u32);

impl From<u32> for Index {
    fn from(value: u32) -> Self {
        Index(value)
    }
}

impl From<Index> for u32 {
    fn from(index: Index) -> Self {
        index.0
    }
}

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index(value as u32)
    }
}

impl From<Index> for usize {
    fn from(index: Index) -> Self {
        index.0 as usize
    }
}
