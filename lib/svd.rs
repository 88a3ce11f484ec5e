//! Bond factorization policy: singular value decomposition plus the
//! cutoff/minm/maxm truncation rule.
//!
//! The quantities truncated are density-matrix eigenvalues, i.e. squared
//! singular values of the two-site tensor, normalized to unit total weight.
//! The policy has a fixed precedence:
//!
//! 1. weights are sorted descending;
//! 2. trailing weights are discarded while the accumulated discarded
//!    fraction stays below `cutoff`, but never past `minm` kept states;
//! 3. the kept count is capped at `maxm` unconditionally.
//!
//! The discarded fraction is reported as the truncation error alongside the
//! kept spectrum.

use ndarray as nd;
use ndarray_linalg::SVDInto;
use num_complex::ComplexFloat;
use num_traits::{ Float, Zero };
use crate::ComplexFloatExt;

/// Which side of a bond the orthogonality center approaches from.
///
/// `FromLeft` makes the left factor of the bond isometric and moves the
/// center right; `FromRight` mirrors this.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    FromLeft,
    FromRight,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FromLeft => write!(f, "l2r"),
            Self::FromRight => write!(f, "r2l"),
        }
    }
}

/// Truncation parameters for one bond factorization.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TruncSpec<R> {
    /// Largest allowed discarded weight fraction.
    pub cutoff: R,
    /// Smallest number of states to keep, cutoff notwithstanding.
    pub minm: usize,
    /// Largest number of states to keep, everything else notwithstanding.
    pub maxm: usize,
}

impl<R: Float> TruncSpec<R> {
    /// Create a new spec.
    pub fn new(cutoff: R, minm: usize, maxm: usize) -> Self {
        Self { cutoff, minm, maxm }
    }

    /// No truncation at all: zero cutoff, unbounded kept count.
    pub fn exact() -> Self {
        Self { cutoff: R::zero(), minm: 1, maxm: usize::MAX }
    }
}

/// Kept density-matrix spectrum of one bond factorization.
///
/// Eigenvalues are normalized to the pre-truncation total and sorted
/// descending; `truncerr` is the discarded fraction. An empty spectrum
/// (`m() == 0`) is the distinct signature of a vanishing two-site tensor and
/// is never produced otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum<R> {
    eigs: Vec<R>,
    truncerr: R,
}

impl<R: Float> Spectrum<R> {
    pub(crate) fn new(eigs: Vec<R>, truncerr: R) -> Self { Self { eigs, truncerr } }

    /// Spectrum of a vanishing tensor.
    pub(crate) fn empty() -> Self { Self { eigs: Vec::new(), truncerr: R::zero() } }

    /// Number of kept states.
    #[inline]
    pub fn m(&self) -> usize { self.eigs.len() }

    /// Kept eigenvalues, descending, normalized.
    #[inline]
    pub fn eigs(&self) -> &[R] { &self.eigs }

    /// Discarded weight fraction.
    #[inline]
    pub fn truncerr(&self) -> R { self.truncerr }

    /// Von Neumann entropy of the kept spectrum.
    pub fn entropy(&self) -> R {
        self.eigs.iter()
            .filter(|p| **p > R::zero())
            .map(|p| -(*p) * p.ln())
            .fold(R::zero(), R::add)
    }
}

/// Apply the truncation policy to a bag of non-negative weights.
///
/// Sorts `weights` descending in place, then returns `(kept, truncerr,
/// total)`: the number of leading entries to keep, the discarded fraction,
/// and the pre-truncation total. An all-zero bag keeps nothing.
pub(crate) fn truncate_weights<R: Float>(weights: &mut [R], spec: &TruncSpec<R>)
    -> (usize, R, R)
{
    weights.sort_by(|a, b| b.partial_cmp(a).unwrap());
    let total: R = weights.iter().copied().fold(R::zero(), R::add);
    if total <= R::zero() { return (0, R::zero(), R::zero()); }
    let minm = spec.minm.max(1);
    let maxm = spec.maxm.max(1);
    let mut m = weights.len();
    let mut err = R::zero();
    while m > 1
        && (m > maxm || (m > minm && err + weights[m - 1] < spec.cutoff * total))
    {
        err = err + weights[m - 1];
        m -= 1;
    }
    (m, err / total, total)
}

/// Truncation decision over several weight bags at once (one per charge
/// sector): the policy is applied to the pooled weights, and the kept count
/// is handed back per bag.
///
/// Returns the per-bag kept counts and the pooled [`Spectrum`].
pub(crate) fn truncate_pooled<R: Float>(bags: &[Vec<R>], spec: &TruncSpec<R>)
    -> (Vec<usize>, Spectrum<R>)
{
    let mut pooled: Vec<(R, usize)> = bags.iter()
        .enumerate()
        .flat_map(|(k, bag)| bag.iter().map(move |w| (*w, k)))
        .collect();
    pooled.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
    let mut weights: Vec<R> = pooled.iter().map(|wk| wk.0).collect();
    let (m, truncerr, total) = truncate_weights(&mut weights, spec);
    let mut kept = vec![0; bags.len()];
    pooled.iter().take(m).for_each(|(_, k)| { kept[*k] += 1; });
    let eigs: Vec<R> = weights.into_iter().take(m).map(|w| w / total).collect();
    (kept, Spectrum::new(eigs, truncerr))
}

/// Truncated factorization of a matrix.
pub(crate) struct MatSvd<A: ComplexFloat> {
    /// Left factor, `nrows × m`, isometric columns.
    pub u: nd::Array2<A>,
    /// Kept singular values of the input, descending.
    pub s: Vec<A::Real>,
    /// Right factor, `m × ncols`, isometric rows.
    pub vt: nd::Array2<A>,
    /// Kept spectrum.
    pub spectrum: Spectrum<A::Real>,
}

/// Factor a matrix and truncate per `spec`.
///
/// A vanishing input produces zero kept columns and an empty spectrum rather
/// than an error.
pub(crate) fn do_svd_trunc<A>(q: nd::Array2<A>, spec: &TruncSpec<A::Real>)
    -> MatSvd<A>
where
    A: ComplexFloat + ComplexFloatExt,
    nd::Array2<A>: SVDInto<U = nd::Array2<A>, Sigma = nd::Array1<A::Real>, VT = nd::Array2<A>>,
{
    let (Some(u), s, Some(vt)) = q.svd_into(true, true).unwrap()
        else { unreachable!() };
    let mut weights: Vec<A::Real> =
        s.iter().map(|sj| Float::powi(*sj, 2)).collect();
    let (m, truncerr, total) = truncate_weights(&mut weights, spec);
    let eigs: Vec<A::Real> = if total > A::Real::zero() {
        weights.iter().take(m).map(|w| *w / total).collect()
    } else {
        Vec::new()
    };
    let u = u.slice(nd::s![.., ..m]).to_owned();
    let vt = vt.slice(nd::s![..m, ..]).to_owned();
    let s = s.into_iter().take(m).collect();
    MatSvd { u, s, vt, spectrum: Spectrum::new(eigs, truncerr) }
}
