//! Error types for the opensubdiv-stencils crate.
//!
//! Building stencils is infallible. Breaking the sequential contract is a
//! programmer error that is caught by debug assertions when the
//! `stencil_validation` feature is on. These errors are only produced by the
//! explicit `validate()` passes over a finished table.

use thiserror::Error;

/// Main error type for opensubdiv-stencils operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A factorized stencil references a vertex that is not a control vertex.
    #[error(
        "Stencil {stencil} references vertex {vertex} which is not one of the {control_vertex_count} control vertices"
    )]
    NonCoarseSource {
        stencil: usize,
        vertex: usize,
        control_vertex_count: usize,
    },

    /// A compacted stencil references the same control vertex more than once.
    #[error("Stencil {stencil} references vertex {vertex} more than once")]
    DuplicateSource { stencil: usize, vertex: usize },

    /// A stencil's range lies outside the flat storage.
    #[error("Stencil {stencil} spans {start}..{end} but the table only holds {len} entries")]
    StencilOutOfBounds {
        stencil: usize,
        start: usize,
        end: usize,
        len: usize,
    },

    /// The per-stencil metadata columns disagree in length.
    #[error("Invalid stencil metadata: {offsets} offsets for {sizes} sizes")]
    MetadataMismatch { offsets: usize, sizes: usize },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
