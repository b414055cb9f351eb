//! Table of subdivision stencils.
//!
//! Stencils are the most direct method of evaluation of locations on the limit
//! of a surface. Every point of a limit surface can be computed by linearly
//! blending a collection of coarse control vertices.
//!
//! A stencil assigns a series of control vertex indices with a blending weight
//! that corresponds to a unique parametric location of the limit surface. When
//! the control vertices move in space, the limit location can be very
//! efficiently recomputed simply by applying the blending weights to the
//! series of coarse control vertices.
//!
//! Tables are created by finishing a
//! [`StencilBuilder`](crate::far::StencilBuilder) and are read-only.
use crate::far::weight_table::validate_stencils;
use crate::{Index, Result};

/// Gives read access to a single stencil in a [`StencilTable`].
#[derive(Clone, Copy, Debug)]
pub struct Stencil<'a> {
    indices: &'a [Index],
    weights: &'a [f32],
}

impl<'a> Stencil<'a> {
    /// Returns the indices of the control vertices.
    #[inline]
    pub fn indices(&self) -> &'a [Index] {
        self.indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &'a [f32] {
        self.weights
    }

    /// Returns the number of control vertices in the stencil.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterates over `(control vertex, weight)` pairs.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (Index, f32)> + 'a {
        self.indices.iter().copied().zip(self.weights.iter().copied())
    }
}

/// Gives read access to a single stencil in a [`LimitStencilTable`],
/// including its derivative weights.
#[derive(Clone, Copy, Debug)]
pub struct LimitStencil<'a> {
    stencil: Stencil<'a>,
    du_weights: &'a [f32],
    dv_weights: &'a [f32],
}

impl<'a> LimitStencil<'a> {
    /// Returns the point part of the stencil.
    #[inline]
    pub fn stencil(&self) -> Stencil<'a> {
        self.stencil
    }

    /// Returns the indices of the control vertices.
    #[inline]
    pub fn indices(&self) -> &'a [Index] {
        self.stencil.indices
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &'a [f32] {
        self.stencil.weights
    }

    /// Returns the u derivative weights.
    #[inline]
    pub fn du_weights(&self) -> &'a [f32] {
        self.du_weights
    }

    /// Returns the v derivative weights.
    #[inline]
    pub fn dv_weights(&self) -> &'a [f32] {
        self.dv_weights
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stencil.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stencil.is_empty()
    }
}

/// Container for stencil data.
///
/// Stencils are indexed by the vertex they compute. Vertices that never had
/// a stencil built have an empty one.
#[derive(Clone, Debug, Default)]
pub struct StencilTable {
    control_vertex_count: usize,
    offsets: Vec<u32>,
    sizes: Vec<u32>,
    control_indices: Vec<Index>,
    weights: Vec<f32>,
}

impl StencilTable {
    pub(crate) fn from_parts(
        control_vertex_count: usize,
        offsets: Vec<u32>,
        sizes: Vec<u32>,
        control_indices: Vec<Index>,
        weights: Vec<f32>,
    ) -> Self {
        Self {
            control_vertex_count,
            offsets,
            sizes,
            control_indices,
            weights,
        }
    }

    /// Returns the number of stencils in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        0 == self.len()
    }

    /// Returns the number of control vertices indexed in the table.
    #[inline]
    pub fn control_vertex_count(&self) -> usize {
        self.control_vertex_count
    }

    /// Returns a Stencil at index i in the table.
    #[inline]
    pub fn stencil(&self, i: Index) -> Option<Stencil<'_>> {
        let i = usize::from(i);
        let start = *self.offsets.get(i)? as usize;
        let end = start + *self.sizes.get(i)? as usize;

        Some(Stencil {
            indices: self.control_indices.get(start..end)?,
            weights: self.weights.get(start..end)?,
        })
    }

    /// Iterates over all stencils in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = Stencil<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.stencil(Index::from(i)))
    }

    /// Returns the number of control vertices of each stencil in the table.
    #[inline]
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Returns the offset to a given stencil.
    #[inline]
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    /// Returns the indices of the control vertices.
    #[inline]
    pub fn control_indices(&self) -> &[Index] {
        &self.control_indices
    }

    /// Returns the indices of the control vertices as plain integers, e.g. for
    /// uploading them to a GPU buffer.
    #[inline]
    pub fn control_indices_u32(&self) -> &[u32] {
        bytemuck::cast_slice(&self.control_indices)
    }

    /// Returns the stencil interpolation weights.
    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Checks that every stencil lies within the table and only references
    /// control vertices.
    pub fn validate(&self) -> Result<()> {
        validate_stencils(
            self.control_vertex_count,
            false,
            &self.offsets,
            &self.sizes,
            &self.control_indices,
        )
    }
}

/// Table of limit stencils with derivative weights.
///
/// Dereferences to the [`StencilTable`] holding the point weights.
#[derive(Clone, Debug, Default, derive_more::Deref)]
pub struct LimitStencilTable {
    #[deref]
    table: StencilTable,
    du_weights: Vec<f32>,
    dv_weights: Vec<f32>,
}

impl LimitStencilTable {
    pub(crate) fn from_parts(
        table: StencilTable,
        du_weights: Vec<f32>,
        dv_weights: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(table.weights.len(), du_weights.len());
        debug_assert_eq!(table.weights.len(), dv_weights.len());

        Self {
            table,
            du_weights,
            dv_weights,
        }
    }

    /// Returns the table holding the point weights.
    #[inline]
    pub fn stencil_table(&self) -> &StencilTable {
        &self.table
    }

    /// Returns the limit stencil at index i in the table.
    pub fn limit_stencil(&self, i: Index) -> Option<LimitStencil<'_>> {
        let stencil = self.table.stencil(i)?;
        let start = self.table.offsets[usize::from(i)] as usize;
        let end = start + stencil.len();

        Some(LimitStencil {
            stencil,
            du_weights: self.du_weights.get(start..end)?,
            dv_weights: self.dv_weights.get(start..end)?,
        })
    }

    /// Returns the u derivative weights.
    #[inline]
    pub fn du_weights(&self) -> &[f32] {
        &self.du_weights
    }

    /// Returns the v derivative weights.
    #[inline]
    pub fn dv_weights(&self) -> &[f32] {
        &self.dv_weights
    }

    /// Consumes the table, returning its point part.
    pub fn into_stencil_table(self) -> StencilTable {
        self.table
    }
}
