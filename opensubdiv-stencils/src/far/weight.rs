//! Weight payloads and the accumulators that write them into flat storage.
//!
//! Stencil factorization is written once, generic over an [`Accumulator`].
//! Plain interpolation uses the [`ScalarAccumulator`] which only touches the
//! weight column. Limit stencils use the [`PointDerivAccumulator`] which keeps
//! the point, du and dv columns in lock step.
use std::ops::{AddAssign, Mul};

/// A weight payload that can be scaled and accumulated.
pub trait Weight: Copy + Mul<Output = Self> + AddAssign {
    /// The multiplicative identity.
    const ONE: Self;
}

impl Weight for f32 {
    const ONE: Self = 1.0;
}

/// A point weight together with its first derivative weights.
///
/// Multiplication and addition act on each channel independently.
///
/// ```
/// use opensubdiv_stencils::far::PointDerivWeight;
///
/// let w = PointDerivWeight::new(1.0, 2.0, 3.0) * PointDerivWeight::new(0.5, 0.5, 2.0);
/// assert_eq!(w, PointDerivWeight::new(0.5, 1.0, 6.0));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, derive_more::Add, derive_more::AddAssign)]
pub struct PointDerivWeight {
    pub p: f32,
    pub du: f32,
    pub dv: f32,
}

impl PointDerivWeight {
    #[inline]
    pub const fn new(p: f32, du: f32, dv: f32) -> Self {
        Self { p, du, dv }
    }

    /// Returns a weight with all three channels set to `w`.
    #[inline]
    pub const fn splat(w: f32) -> Self {
        Self::new(w, w, w)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        0.0 == self.p && 0.0 == self.du && 0.0 == self.dv
    }
}

impl From<f32> for PointDerivWeight {
    #[inline]
    fn from(w: f32) -> Self {
        Self::splat(w)
    }
}

impl Mul for PointDerivWeight {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            p: self.p * rhs.p,
            du: self.du * rhs.du,
            dv: self.dv * rhs.dv,
        }
    }
}

impl Weight for PointDerivWeight {
    const ONE: Self = Self::splat(1.0);
}

/// The weight columns of a [`WeightTable`](super::weight_table::WeightTable).
///
/// Stored non-interleaved to reduce cache misses. The derivative columns
/// stay empty until the first derivative weight is written. From then on all
/// three columns have the same length.
#[derive(Clone, Debug, Default)]
pub(crate) struct WeightColumns {
    pub(crate) weights: Vec<f32>,
    pub(crate) du_weights: Vec<f32>,
    pub(crate) dv_weights: Vec<f32>,
}

impl WeightColumns {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            weights: Vec::with_capacity(capacity),
            du_weights: Vec::new(),
            dv_weights: Vec::new(),
        }
    }

    /// Zero-extends the derivative columns to the length of the weight column.
    ///
    /// Entries written through the [`ScalarAccumulator`] have no derivative
    /// weights of their own.
    #[inline]
    pub(crate) fn pad_derivatives(&mut self) {
        let len = self.weights.len();
        if self.du_weights.len() < len {
            self.du_weights.resize(len, 0.0);
        }
        if self.dv_weights.len() < len {
            self.dv_weights.resize(len, 0.0);
        }
    }
}

/// Writes one payload shape into the [`WeightColumns`].
pub(crate) trait Accumulator {
    type Weight: Weight;

    /// Appends a new entry.
    fn push_back(columns: &mut WeightColumns, weight: Self::Weight);

    /// Accumulates into the existing entry `i`.
    fn add(columns: &mut WeightColumns, i: usize, weight: Self::Weight);

    /// Reads back entry `i`.
    fn get(columns: &WeightColumns, i: usize) -> Self::Weight;
}

/// Accumulates plain interpolation weights.
pub(crate) struct ScalarAccumulator;

impl Accumulator for ScalarAccumulator {
    type Weight = f32;

    #[inline]
    fn push_back(columns: &mut WeightColumns, weight: f32) {
        columns.weights.push(weight);
        if !columns.du_weights.is_empty() {
            columns.du_weights.push(0.0);
            columns.dv_weights.push(0.0);
        }
    }

    #[inline]
    fn add(columns: &mut WeightColumns, i: usize, weight: f32) {
        columns.weights[i] += weight;
    }

    #[inline]
    fn get(columns: &WeightColumns, i: usize) -> f32 {
        columns.weights[i]
    }
}

/// Accumulates point weights together with their du/dv derivative weights.
pub(crate) struct PointDerivAccumulator;

impl Accumulator for PointDerivAccumulator {
    type Weight = PointDerivWeight;

    #[inline]
    fn push_back(columns: &mut WeightColumns, weight: PointDerivWeight) {
        columns.pad_derivatives();
        columns.weights.push(weight.p);
        columns.du_weights.push(weight.du);
        columns.dv_weights.push(weight.dv);
    }

    #[inline]
    fn add(columns: &mut WeightColumns, i: usize, weight: PointDerivWeight) {
        if columns.du_weights.len() <= i {
            columns.pad_derivatives();
        }
        columns.weights[i] += weight.p;
        columns.du_weights[i] += weight.du;
        columns.dv_weights[i] += weight.dv;
    }

    #[inline]
    fn get(columns: &WeightColumns, i: usize) -> PointDerivWeight {
        PointDerivWeight {
            p: columns.weights[i],
            du: columns.du_weights.get(i).copied().unwrap_or(0.0),
            dv: columns.dv_weights.get(i).copied().unwrap_or(0.0),
        }
    }
}
