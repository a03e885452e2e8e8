//! Coefficient domains - the rectangular search lattices over polynomial pairs
//!
//! A GCF candidate is a pair of integer polynomials `(a(n), b(n))` given by
//! their coefficient tuples. A [`CoefficientDomain`] describes every candidate
//! in a search as the Cartesian product of per-coefficient integer intervals,
//! one axis set for each series. Everything downstream (enumeration,
//! checkpointing, splitting) works in terms of these axis ranges.

use serde::{Deserialize, Serialize};

/// The two coefficient series of a GCF candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    A,
    B,
}

impl Series {
    pub fn other(self) -> Series {
        match self {
            Series::A => Series::B,
            Series::B => Series::A,
        }
    }
}

/// An inclusive integer interval `[lo, hi]` for one polynomial coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisRange {
    pub lo: i64,
    pub hi: i64,
}

impl AxisRange {
    pub fn new(lo: i64, hi: i64) -> AxisRange {
        AxisRange { lo, hi }
    }

    pub fn size(&self) -> u64 {
        debug_assert!(self.lo <= self.hi);
        (self.hi - self.lo) as u64 + 1
    }

    /// Materialize the explicit value list for this axis.
    pub fn values(&self) -> Vec<i64> {
        (self.lo..=self.hi).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("empty axis range [{lo}, {hi}] at {series:?} axis {index}")]
    EmptyAxis {
        series: Series,
        index: usize,
        lo: i64,
        hi: i64,
    },

    #[error("no axis {index} in {series:?} series (degree {degree})")]
    NoSuchAxis {
        series: Series,
        index: usize,
        degree: usize,
    },
}

/// A rectangular lattice of coefficient tuples for the two polynomials.
///
/// Coefficients are ordered from the highest-degree term down, so axis 0 of a
/// series is the leading coefficient. The domain is immutable once built;
/// narrowing an axis goes through [`CoefficientDomain::with_axis_override`],
/// which rebuilds a fresh value rather than patching this one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CoefficientDomain {
    a_axes: Vec<AxisRange>,
    b_axes: Vec<AxisRange>,
}

impl CoefficientDomain {
    /// Build the domain for polynomials of degree `a_deg` and `b_deg`, every
    /// coefficient of a series drawn from the same shared range.
    ///
    /// When `lead_coef_positive` is set and the leading `a` axis straddles
    /// zero, its low bound is clamped to 1. A candidate whose `a`
    /// coefficients are all negated converges to the same value with the
    /// opposite sign, so enumerating both halves of the range would search
    /// every fraction twice.
    pub fn new(
        a_deg: usize,
        a_range: (i64, i64),
        b_deg: usize,
        b_range: (i64, i64),
        lead_coef_positive: bool,
    ) -> Result<CoefficientDomain, DomainError> {
        let mut a_axes = vec![AxisRange::new(a_range.0, a_range.1); a_deg + 1];
        if lead_coef_positive && a_axes[0].lo <= 0 && a_axes[0].hi >= 1 {
            a_axes[0].lo = 1;
        }
        let b_axes = vec![AxisRange::new(b_range.0, b_range.1); b_deg + 1];
        CoefficientDomain::from_axes(a_axes, b_axes)
    }

    /// Build a domain from explicit per-axis ranges.
    pub fn from_axes(
        a_axes: Vec<AxisRange>,
        b_axes: Vec<AxisRange>,
    ) -> Result<CoefficientDomain, DomainError> {
        for (series, axes) in [(Series::A, &a_axes), (Series::B, &b_axes)] {
            for (index, axis) in axes.iter().enumerate() {
                if axis.lo > axis.hi {
                    return Err(DomainError::EmptyAxis {
                        series,
                        index,
                        lo: axis.lo,
                        hi: axis.hi,
                    });
                }
            }
        }
        Ok(CoefficientDomain { a_axes, b_axes })
    }

    pub fn axis_ranges(&self, series: Series) -> &[AxisRange] {
        match series {
            Series::A => &self.a_axes,
            Series::B => &self.b_axes,
        }
    }

    /// Number of coefficient tuples in one series.
    pub fn size(&self, series: Series) -> u128 {
        self.axis_ranges(series)
            .iter()
            .map(|axis| axis.size() as u128)
            .product()
    }

    /// Number of `(a, b)` candidate pairs in the whole domain.
    pub fn total_size(&self) -> u128 {
        self.size(Series::A) * self.size(Series::B)
    }

    /// Materialize each axis's explicit value list.
    ///
    /// Callers must ensure the series is small enough to walk in reasonable
    /// time; this is a correctness precondition, not an enforced limit.
    pub fn expand(&self, series: Series) -> Vec<Vec<i64>> {
        self.axis_ranges(series)
            .iter()
            .map(AxisRange::values)
            .collect()
    }

    /// The first coefficient tuple of a series in enumeration order.
    pub fn origin(&self, series: Series) -> Vec<i64> {
        self.axis_ranges(series).iter().map(|axis| axis.lo).collect()
    }

    /// A copy of this domain with a single axis range replaced, all derived
    /// quantities recomputed from scratch. Used by the splitter.
    pub fn with_axis_override(
        &self,
        series: Series,
        index: usize,
        range: AxisRange,
    ) -> Result<CoefficientDomain, DomainError> {
        let degree = self.axis_ranges(series).len() - 1;
        if index > degree {
            return Err(DomainError::NoSuchAxis {
                series,
                index,
                degree,
            });
        }
        let mut a_axes = self.a_axes.clone();
        let mut b_axes = self.b_axes.clone();
        match series {
            Series::A => a_axes[index] = range,
            Series::B => b_axes[index] = range,
        }
        CoefficientDomain::from_axes(a_axes, b_axes)
    }
}

/// Degree of a compact polynomial, skipping leading zero coefficients.
///
/// The all-zero polynomial has no degree; by convention this returns 0 for it.
pub fn compact_degree(coefs: &[i64]) -> usize {
    coefs
        .iter()
        .position(|&c| c != 0)
        .map(|i| coefs.len() - 1 - i)
        .unwrap_or(0)
}
