//! Incremental, factorizing construction of stencils.
//!
//! A refiner opens each new vertex as a [`StencilIndex`] and adds the
//! weighted vertices (or stencils) of the previous level it is computed from.
//! The [`StencilBuilder`] immediately resolves these down to the control
//! vertices so the finished stencils can be evaluated in a single pass.
//!
//! ## Example
//! ```
//! use opensubdiv_stencils::{far, Index};
//!
//! // A quad with control vertices 0..4.
//! let mut builder = far::StencilBuilder::new(4, far::StencilBuilderOptions::default());
//!
//! // Face point of the quad.
//! let mut face_point = builder.index(4u32);
//! for v in 0..4u32 {
//!     face_point.add_with_weight(Index(v), 0.25);
//! }
//!
//! // A point halfway between the face point and control vertex 0.
//! let mut p = builder.index(5u32);
//! p.add_with_weight(Index(4), 0.5);
//! p.add_with_weight(Index(0), 0.5);
//!
//! assert_eq!(builder.stencil_size(Index(5)), 4);
//! builder.validate().unwrap();
//! ```
use tracing::debug;

use crate::far::stencil_table::{LimitStencilTable, Stencil, StencilTable};
use crate::far::weight::{PointDerivAccumulator, PointDerivWeight, ScalarAccumulator};
use crate::far::weight_table::{initial_capacity, WeightTable};
use crate::{Index, Result};

/// Options for creating a [`StencilBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct StencilBuilderOptions {
    /// Pre-populate the table with a trivial stencil for each control vertex
    /// so these can be treated like any other stencil. Default: `false`.
    pub generate_control_vertex_stencils: bool,
    /// Combine multiple contributions of the same control vertex to a
    /// stencil into a single entry. Default: `true`.
    pub compact_weights: bool,
    /// Number of stencil entries to reserve up front. `None` uses
    /// [`initial_capacity()`](crate::far::initial_capacity).
    pub capacity: Option<usize>,
}

impl Default for StencilBuilderOptions {
    fn default() -> Self {
        Self {
            generate_control_vertex_stencils: false,
            compact_weights: true,
            capacity: None,
        }
    }
}

/// A stencil supplied from outside a [`StencilBuilder`].
///
/// The stencil must already be factorized, i.e. only reference control
/// vertices of the builder it is added to.
pub trait StencilSource {
    /// Returns the indices of the control vertices.
    fn indices(&self) -> &[Index];

    /// Returns the interpolation weights, parallel to [`indices()`](Self::indices).
    fn weights(&self) -> &[f32];

    /// Returns the number of contributions.
    #[inline]
    fn len(&self) -> usize {
        self.indices().len()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        0 == self.len()
    }
}

impl StencilSource for Stencil<'_> {
    #[inline]
    fn indices(&self) -> &[Index] {
        Stencil::indices(self)
    }

    #[inline]
    fn weights(&self) -> &[f32] {
        Stencil::weights(self)
    }
}

impl<'a> StencilSource for (&'a [Index], &'a [f32]) {
    #[inline]
    fn indices(&self) -> &[Index] {
        self.0
    }

    #[inline]
    fn weights(&self) -> &[f32] {
        self.1
    }
}

/// Builds factorized stencils, one destination vertex at a time.
///
/// See the [module level documentation](crate::far::stencil_builder) for an
/// example.
#[derive(Clone, Debug)]
pub struct StencilBuilder {
    table: WeightTable,
}

impl StencilBuilder {
    /// Creates a builder for a mesh with `control_vertex_count` control
    /// vertices.
    ///
    /// Any [`Index`] below `control_vertex_count` refers to a control vertex.
    pub fn new(control_vertex_count: usize, options: StencilBuilderOptions) -> Self {
        let capacity = options
            .capacity
            .unwrap_or_else(|| initial_capacity(control_vertex_count));

        debug!(
            "Creating stencil builder: {} control vertices, {} entries reserved, compaction {}",
            control_vertex_count,
            capacity,
            if options.compact_weights { "on" } else { "off" }
        );

        Self {
            table: WeightTable::new(
                control_vertex_count,
                options.generate_control_vertex_stencils,
                options.compact_weights,
                capacity,
            ),
        }
    }

    /// Opens the stencil of vertex `index` for writing.
    ///
    /// All contributions to a vertex must be added before the next vertex is
    /// opened. Reopening a vertex after another vertex was written to is not
    /// supported.
    #[inline]
    pub fn index(&mut self, index: impl Into<Index>) -> StencilIndex<'_> {
        StencilIndex {
            owner: self,
            index: index.into(),
        }
    }

    /// Returns the number of control vertices.
    #[inline]
    pub fn control_vertex_count(&self) -> usize {
        self.table.control_vertex_count()
    }

    /// Returns whether contributions of the same control vertex are combined.
    #[inline]
    pub fn compact_weights(&self) -> bool {
        self.table.compact_weights()
    }

    /// Returns the total number of stencil entries over all stencils.
    #[inline]
    pub fn contribution_count(&self) -> usize {
        self.table.weights().len()
    }

    /// Returns the number of entries in the stencil of vertex `index`.
    ///
    /// This is `0` for vertices whose stencil was never built, including any
    /// index past the last one written to.
    #[inline]
    pub fn stencil_size(&self, index: impl Into<Index>) -> usize {
        self.table.stencil_size(index.into())
    }

    /// Returns the offset of each stencil into the flat entry columns.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        self.table.offsets()
    }

    /// Returns the number of entries of each stencil.
    #[inline]
    pub fn sizes(&self) -> &[u32] {
        self.table.sizes()
    }

    /// Returns the control vertex index of every entry.
    #[inline]
    pub fn sources(&self) -> &[Index] {
        self.table.sources()
    }

    /// Returns the interpolation weight of every entry.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        self.table.weights()
    }

    /// Returns the du derivative weights.
    ///
    /// Empty unless derivative weights were added.
    #[inline]
    pub fn du_weights(&self) -> &[f32] {
        self.table.du_weights()
    }

    /// Returns the dv derivative weights.
    ///
    /// Empty unless derivative weights were added.
    #[inline]
    pub fn dv_weights(&self) -> &[f32] {
        self.table.dv_weights()
    }

    /// Checks that every stencil only references control vertices and, with
    /// compaction on, references each of them at most once.
    pub fn validate(&self) -> Result<()> {
        self.table.validate()
    }

    /// Turns the builder into a read-only [`StencilTable`].
    ///
    /// Derivative weights are dropped.
    pub fn into_stencil_table(self) -> StencilTable {
        let control_vertex_count = self.table.control_vertex_count();
        let (offsets, sizes, sources, columns) = self.table.into_parts();

        debug!(
            "Finished stencil table: {} stencils, {} entries",
            sizes.len(),
            sources.len()
        );

        StencilTable::from_parts(control_vertex_count, offsets, sizes, sources, columns.weights)
    }

    /// Turns the builder into a read-only [`LimitStencilTable`].
    ///
    /// Entries that were added without derivatives get zero du/dv weights.
    pub fn into_limit_stencil_table(self) -> LimitStencilTable {
        let control_vertex_count = self.table.control_vertex_count();
        let (offsets, sizes, sources, mut columns) = self.table.into_parts();
        columns.pad_derivatives();

        debug!(
            "Finished limit stencil table: {} stencils, {} entries",
            sizes.len(),
            sources.len()
        );

        LimitStencilTable::from_parts(
            StencilTable::from_parts(control_vertex_count, offsets, sizes, sources, columns.weights),
            columns.du_weights,
            columns.dv_weights,
        )
    }
}

/// Write handle to the stencil of a single destination vertex.
///
/// Obtained from [`StencilBuilder::index()`]. Zero weight contributions are
/// ignored.
#[derive(Debug)]
pub struct StencilIndex<'a> {
    owner: &'a mut StencilBuilder,
    index: Index,
}

impl StencilIndex<'_> {
    /// Returns the destination vertex this handle writes to.
    #[inline]
    pub fn index(&self) -> Index {
        self.index
    }

    /// Returns the number of entries the stencil has so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.owner.table.stencil_size(self.index)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Adds vertex `src` scaled by `weight`.
    ///
    /// `src` is either a control vertex or a vertex whose stencil was
    /// finished before this one was opened.
    #[inline]
    pub fn add_with_weight(&mut self, src: impl Into<Index>, weight: f32) -> &mut Self {
        if 0.0 != weight {
            self.owner
                .table
                .add_with_weight::<ScalarAccumulator>(src.into(), self.index, weight);
        }
        self
    }

    /// Adds vertex `src` with point and derivative weights.
    ///
    /// If `src` is a refined vertex, each of its entries is scaled per
    /// channel, i.e. its point weight by `weight`, its du weight by `du` and
    /// its dv weight by `dv`.
    #[inline]
    pub fn add_with_derivatives(
        &mut self,
        src: impl Into<Index>,
        weight: f32,
        du: f32,
        dv: f32,
    ) -> &mut Self {
        let weight = PointDerivWeight::new(weight, du, dv);
        if !weight.is_zero() {
            self.owner
                .table
                .add_with_weight::<PointDerivAccumulator>(src.into(), self.index, weight);
        }
        self
    }

    /// Adds an external, factorized stencil scaled by `weight`.
    ///
    /// Entries with zero weight are skipped.
    pub fn add_stencil_with_weight<S>(&mut self, src: &S, weight: f32) -> &mut Self
    where
        S: StencilSource + ?Sized,
    {
        if 0.0 == weight {
            return self;
        }

        for (&index, &w) in src.indices().iter().zip(src.weights()).take(src.len()) {
            if 0.0 == w {
                continue;
            }
            self.owner
                .table
                .add_with_weight::<ScalarAccumulator>(index, self.index, weight * w);
        }
        self
    }

    /// Adds an external, factorized stencil with point and derivative
    /// weights.
    ///
    /// Every entry contributes `(weight, du, dv)` scaled by its own weight.
    /// Nothing is added if all of `weight`, `du` and `dv` are zero. Entries
    /// with zero weight are skipped.
    pub fn add_stencil_with_derivatives<S>(
        &mut self,
        src: &S,
        weight: f32,
        du: f32,
        dv: f32,
    ) -> &mut Self
    where
        S: StencilSource + ?Sized,
    {
        let weight = PointDerivWeight::new(weight, du, dv);
        if weight.is_zero() {
            return self;
        }

        for (&index, &w) in src.indices().iter().zip(src.weights()).take(src.len()) {
            if 0.0 == w {
                continue;
            }
            self.owner.table.add_with_weight::<PointDerivAccumulator>(
                index,
                self.index,
                weight * PointDerivWeight::splat(w),
            );
        }
        self
    }
}
