//! The engine behind [`StencilBuilder`](super::StencilBuilder).
//!
//! A [`WeightTable`] owns the flat stencil storage and resolves each incoming
//! contribution down to the control vertices. Since stencils are built in
//! dependency order, every finished stencil only ever references control
//! vertices. Adding a refined vertex thus means merging its (already flat)
//! stencil, scaled by the incoming weight.
use tracing::warn;

use crate::far::weight::{Accumulator, Weight, WeightColumns};
use crate::{Error, Index, Result};

/// Upper bound of the number of entries [`initial_capacity()`] reserves.
pub const MAX_INITIAL_CAPACITY: usize = 5 * 1024 * 1024;

/// Returns the number of stencil entries to reserve up front for a mesh with
/// `control_vertex_count` control vertices.
///
/// This is twice the number of control vertices, clamped to
/// [`MAX_INITIAL_CAPACITY`] but never less than the control vertex count. The
/// flat storage grows as needed, so this only affects performance.
///
/// ```
/// use opensubdiv_stencils::far::{initial_capacity, MAX_INITIAL_CAPACITY};
///
/// assert_eq!(initial_capacity(100), 200);
/// assert_eq!(initial_capacity(4 * 1024 * 1024), MAX_INITIAL_CAPACITY);
/// assert_eq!(initial_capacity(6 * 1024 * 1024), 6 * 1024 * 1024);
/// ```
#[inline]
pub fn initial_capacity(control_vertex_count: usize) -> usize {
    control_vertex_count.max(MAX_INITIAL_CAPACITY.min(control_vertex_count.saturating_mul(2)))
}

/// The stencil currently being built.
#[derive(Clone, Copy, Debug)]
struct OpenStencil {
    dest: Index,
    // Start of the stencil in the flat storage.
    offset: usize,
}

/// Flat, factorized stencil storage.
///
/// All columns are non-interleaved. `sources` and the weight columns hold one
/// entry per (stencil, control vertex) pair, grouped by destination vertex.
/// `offsets` and `sizes` are indexed by destination vertex.
#[derive(Clone, Debug)]
pub(crate) struct WeightTable {
    sources: Vec<Index>,
    columns: WeightColumns,

    offsets: Vec<u32>,
    sizes: Vec<u32>,

    // Ends implicitly when the next destination begins.
    open: Option<OpenStencil>,
    control_vertex_count: usize,
    compact_weights: bool,
}

impl WeightTable {
    pub(crate) fn new(
        control_vertex_count: usize,
        generate_control_vertex_stencils: bool,
        compact_weights: bool,
        capacity: usize,
    ) -> Self {
        let mut table = Self {
            sources: Vec::with_capacity(capacity),
            columns: WeightColumns::with_capacity(capacity),
            offsets: Vec::new(),
            sizes: Vec::new(),
            open: None,
            control_vertex_count,
            compact_weights,
        };

        if generate_control_vertex_stencils {
            // Trivial stencils: each control vertex is its own sole source.
            table.sources.extend((0..control_vertex_count).map(Index::from));
            table.columns.weights.resize(control_vertex_count, 1.0);
            table.offsets.extend(0..control_vertex_count as u32);
            table.sizes.resize(control_vertex_count, 1);
        }

        table
    }

    /// Adds `weight` times the stencil of `src` to the stencil of `dest`.
    ///
    /// Control vertices are merged directly. Any other `src` must have a
    /// finished stencil which is expanded into its control vertices.
    pub(crate) fn add_with_weight<A: Accumulator>(
        &mut self,
        src: Index,
        dest: Index,
        weight: A::Weight,
    ) {
        if usize::from(src) < self.control_vertex_count {
            self.merge::<A>(src, dest, weight, <A::Weight as Weight>::ONE);
            return;
        }

        let len = self.stencil_size(src);
        if 0 == len {
            return;
        }
        let start = self.offsets[usize::from(src)] as usize;

        for i in start..start + len {
            let source = self.sources[i];
            // Stencils are finished in dependency order so expanding one can
            // only ever yield control vertices.
            #[cfg(feature = "stencil_validation")]
            debug_assert!(
                usize::from(source) < self.control_vertex_count,
                "vertex {src} was used as a source before its stencil was finished"
            );

            self.merge::<A>(source, dest, A::get(&self.columns, i), weight);
        }
    }

    // Merges a single control vertex weight into the stencil of `dest`,
    // combining it with an existing entry for `src` if there is one.
    //
    // This is the hottest function of the whole factorization.
    #[inline]
    fn merge<A: Accumulator>(
        &mut self,
        src: Index,
        dest: Index,
        weight: A::Weight,
        weight_factor: A::Weight,
    ) {
        let weight = weight * weight_factor;

        if self.compact_weights {
            if let Some(open) = self.open.filter(|open| open.dest == dest) {
                // Stencils are short. A linear scan beats any lookup structure.
                if let Some(i) = self.sources[open.offset..]
                    .iter()
                    .position(|&source| source == src)
                {
                    A::add(&mut self.columns, open.offset + i, weight);
                    return;
                }
            }
        }

        self.push::<A>(src, dest, weight);
    }

    // Appends a new entry to the stencil of `dest`, beginning that stencil if
    // `dest` is not the one currently open.
    #[inline]
    fn push<A: Accumulator>(&mut self, src: Index, dest: Index, weight: A::Weight) {
        if self.open.map_or(true, |open| open.dest != dest) {
            self.begin_stencil(dest);
        }

        self.sizes[usize::from(dest)] += 1;
        self.sources.push(src);
        A::push_back(&mut self.columns, weight);
    }

    fn begin_stencil(&mut self, dest: Index) {
        let d = usize::from(dest);
        if self.offsets.len() <= d {
            self.offsets.resize(d + 1, 0);
            self.sizes.resize(d + 1, 0);
        }

        let size = self.sizes[d];
        if 0 != size {
            warn!(
                "Stencil of vertex {dest} was reopened after another vertex was built; \
                 its previous {size} entries are orphaned"
            );
        }
        #[cfg(feature = "stencil_validation")]
        debug_assert!(0 == size, "stencil of vertex {dest} was reopened");

        let offset = self.sources.len();
        self.offsets[d] = stencil_offset(offset);
        self.sizes[d] = 0;
        self.open = Some(OpenStencil { dest, offset });
    }

    /// Number of entries in the stencil of `dest`, `0` if it was never built.
    #[inline]
    pub(crate) fn stencil_size(&self, dest: Index) -> usize {
        self.sizes
            .get(usize::from(dest))
            .map_or(0, |&size| size as usize)
    }

    #[inline]
    pub(crate) fn control_vertex_count(&self) -> usize {
        self.control_vertex_count
    }

    #[inline]
    pub(crate) fn compact_weights(&self) -> bool {
        self.compact_weights
    }

    #[inline]
    pub(crate) fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    #[inline]
    pub(crate) fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    #[inline]
    pub(crate) fn sources(&self) -> &[Index] {
        &self.sources
    }

    #[inline]
    pub(crate) fn weights(&self) -> &[f32] {
        &self.columns.weights
    }

    #[inline]
    pub(crate) fn du_weights(&self) -> &[f32] {
        &self.columns.du_weights
    }

    #[inline]
    pub(crate) fn dv_weights(&self) -> &[f32] {
        &self.columns.dv_weights
    }

    pub(crate) fn validate(&self) -> Result<()> {
        validate_stencils(
            self.control_vertex_count,
            self.compact_weights,
            &self.offsets,
            &self.sizes,
            &self.sources,
        )
    }

    /// Splits the table into `(offsets, sizes, sources, weight columns)`.
    pub(crate) fn into_parts(self) -> (Vec<u32>, Vec<u32>, Vec<Index>, WeightColumns) {
        (self.offsets, self.sizes, self.sources, self.columns)
    }
}

// Offsets are stored as `u32`, like every other index of the table.
#[inline]
fn stencil_offset(offset: usize) -> u32 {
    #[cfg(feature = "stencil_validation")]
    debug_assert!(
        u32::try_from(offset).is_ok(),
        "stencil offset {offset} exceeds the u32 index range"
    );
    offset as u32
}

/// Checks that every stencil lies within `sources`, only references control
/// vertices and, if `unique` is set, references each of them at most once.
pub(crate) fn validate_stencils(
    control_vertex_count: usize,
    unique: bool,
    offsets: &[u32],
    sizes: &[u32],
    sources: &[Index],
) -> Result<()> {
    if offsets.len() != sizes.len() {
        return Err(Error::MetadataMismatch {
            offsets: offsets.len(),
            sizes: sizes.len(),
        });
    }

    for (stencil, (&offset, &size)) in offsets.iter().zip(sizes).enumerate() {
        let start = offset as usize;
        let end = start + size as usize;
        let entries = sources
            .get(start..end)
            .ok_or(Error::StencilOutOfBounds {
                stencil,
                start,
                end,
                len: sources.len(),
            })?;

        for (i, &source) in entries.iter().enumerate() {
            let vertex = usize::from(source);
            if control_vertex_count <= vertex {
                return Err(Error::NonCoarseSource {
                    stencil,
                    vertex,
                    control_vertex_count,
                });
            }
            if unique && entries[..i].contains(&source) {
                return Err(Error::DuplicateSource { stencil, vertex });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::far::weight::{PointDerivAccumulator, PointDerivWeight, ScalarAccumulator};

    fn table(control_vertex_count: usize, compact_weights: bool) -> WeightTable {
        WeightTable::new(
            control_vertex_count,
            false,
            compact_weights,
            initial_capacity(control_vertex_count),
        )
    }

    #[test]
    fn capacity_heuristic() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(1), 2);
        assert_eq!(initial_capacity(MAX_INITIAL_CAPACITY / 2), MAX_INITIAL_CAPACITY);
        assert_eq!(initial_capacity(MAX_INITIAL_CAPACITY - 1), MAX_INITIAL_CAPACITY);
        assert_eq!(initial_capacity(usize::MAX), usize::MAX);
    }

    #[test]
    fn control_vertex_stencils() {
        let table = WeightTable::new(4, true, true, 8);

        assert_eq!(table.sources(), &[Index(0), Index(1), Index(2), Index(3)]);
        assert_eq!(table.weights(), &[1.0; 4]);
        assert_eq!(table.offsets(), &[0, 1, 2, 3]);
        assert_eq!(table.sizes(), &[1; 4]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn coarse_contribution_begins_stencil() {
        let mut table = table(2, true);
        table.add_with_weight::<ScalarAccumulator>(Index(1), Index(5), 0.75);

        assert_eq!(table.offsets().len(), 6);
        assert_eq!(table.stencil_size(Index(5)), 1);
        assert_eq!(table.stencil_size(Index(4)), 0);
        assert_eq!(table.stencil_size(Index(100)), 0);
        assert_eq!(table.offsets()[5], 0);
        assert_eq!(table.sources(), &[Index(1)]);
        assert_eq!(table.weights(), &[0.75]);
    }

    #[test]
    fn compaction_merges_duplicates() {
        let mut table = table(3, true);
        table.add_with_weight::<ScalarAccumulator>(Index(2), Index(3), 0.25);
        table.add_with_weight::<ScalarAccumulator>(Index(0), Index(3), 0.5);
        table.add_with_weight::<ScalarAccumulator>(Index(2), Index(3), 0.25);

        assert_eq!(table.sources(), &[Index(2), Index(0)]);
        assert_eq!(table.weights(), &[0.5, 0.5]);
        assert_eq!(table.stencil_size(Index(3)), 2);
    }

    #[test]
    fn compaction_disabled_keeps_duplicates() {
        let mut table = table(3, false);
        table.add_with_weight::<ScalarAccumulator>(Index(2), Index(3), 0.25);
        table.add_with_weight::<ScalarAccumulator>(Index(2), Index(3), 0.75);

        assert_eq!(table.sources(), &[Index(2), Index(2)]);
        assert_eq!(table.weights(), &[0.25, 0.75]);
        assert_eq!(table.stencil_size(Index(3)), 2);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn compaction_scan_is_bounded_by_open_stencil() {
        let mut table = table(2, true);
        table.add_with_weight::<ScalarAccumulator>(Index(0), Index(2), 1.0);
        // Same control vertex, different destination: a new entry.
        table.add_with_weight::<ScalarAccumulator>(Index(0), Index(3), 1.0);

        assert_eq!(table.sources(), &[Index(0), Index(0)]);
        assert_eq!(table.offsets(), &[0, 0, 0, 1]);
        assert_eq!(table.sizes(), &[0, 0, 1, 1]);
    }

    #[test]
    fn refined_sources_are_expanded() {
        let mut table = table(3, true);
        table.add_with_weight::<ScalarAccumulator>(Index(0), Index(3), 1.0);
        table.add_with_weight::<ScalarAccumulator>(Index(1), Index(4), 0.5);
        table.add_with_weight::<ScalarAccumulator>(Index(2), Index(4), 0.5);

        table.add_with_weight::<ScalarAccumulator>(Index(3), Index(5), 0.5);
        table.add_with_weight::<ScalarAccumulator>(Index(4), Index(5), 0.5);

        let start = table.offsets()[5] as usize;
        assert_eq!(table.stencil_size(Index(5)), 3);
        assert_eq!(&table.sources()[start..], &[Index(0), Index(1), Index(2)]);
        assert_eq!(&table.weights()[start..], &[0.5, 0.25, 0.25]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn unbuilt_refined_source_contributes_nothing() {
        let mut table = table(2, true);
        table.add_with_weight::<ScalarAccumulator>(Index(7), Index(3), 1.0);

        assert!(table.sources().is_empty());
        assert_eq!(table.stencil_size(Index(3)), 0);
    }

    #[test]
    fn point_deriv_expansion_scales_per_channel() {
        let mut table = table(2, true);
        table.add_with_weight::<PointDerivAccumulator>(
            Index(0),
            Index(2),
            PointDerivWeight::new(1.0, 2.0, 3.0),
        );
        table.add_with_weight::<PointDerivAccumulator>(
            Index(2),
            Index(3),
            PointDerivWeight::new(0.5, 0.5, 0.5),
        );

        assert_eq!(table.weights(), &[1.0, 0.5]);
        assert_eq!(table.du_weights(), &[2.0, 1.0]);
        assert_eq!(table.dv_weights(), &[3.0, 1.5]);
    }

    #[test]
    fn stencil_offsets_in_range() {
        assert_eq!(stencil_offset(0), 0);
        assert_eq!(stencil_offset(u32::MAX as usize), u32::MAX);
    }

    #[cfg(all(debug_assertions, feature = "stencil_validation", target_pointer_width = "64"))]
    #[test]
    #[should_panic(expected = "exceeds the u32 index range")]
    fn stencil_offset_overflow_asserts() {
        stencil_offset(u32::MAX as usize + 1);
    }

    #[test]
    fn validation_reports_broken_tables() {
        let sources = [Index(0), Index(3), Index(1), Index(1)];

        assert_eq!(
            validate_stencils(2, true, &[0], &[2], &sources),
            Err(Error::NonCoarseSource {
                stencil: 0,
                vertex: 3,
                control_vertex_count: 2
            })
        );
        assert_eq!(
            validate_stencils(2, true, &[0, 2], &[0, 2], &sources),
            Err(Error::DuplicateSource {
                stencil: 1,
                vertex: 1
            })
        );
        assert!(validate_stencils(2, false, &[0, 2], &[0, 2], &sources).is_ok());
        assert_eq!(
            validate_stencils(2, false, &[3], &[2], &sources),
            Err(Error::StencilOutOfBounds {
                stencil: 0,
                start: 3,
                end: 5,
                len: 4
            })
        );
        assert_eq!(
            validate_stencils(2, false, &[0], &[], &sources),
            Err(Error::MetadataMismatch {
                offsets: 1,
                sizes: 0
            })
        );
    }
}
