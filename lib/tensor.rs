//! Dense tensors over named indices, and the capability interface shared by
//! every tensor flavor.
//!
//! A [`Tensor`] pairs a list of [`Index`]es with an n-dimensional element
//! array and a [`LogScale`] magnitude. Axes are addressed by index identity
//! (name plus prime level), never by position: contraction sums over every
//! index the two operands share, regardless of where those axes sit.
//!
//! ```text
//!        a                b                a · b
//!   i ---[ ]--- j    j ---[ ]--- k     i ---[ ]--- k
//!                                          Σ_j
//! ```
//!
//! [`TensorAlg`] is the seam the rest of the crate is written against: chain
//! containers, environment caches, the local effective operator, and the
//! eigensolver are generic over it, so the dense flavor here and the
//! block-sparse flavor in [`crate::block`] are interchangeable end to end.

use std::fmt;
use itertools::Itertools;
use ndarray::{ self as nd, Dimension };
use ndarray_linalg::SVDInto;
use num_complex::ComplexFloat;
use num_traits::{ Float, One, Zero };
use rand::{
    Rng,
    distributions::{ Distribution, Standard },
};
use thiserror::Error;
use crate::{
    ComplexFloatExt,
    index::{ Index, Kind },
    scale::LogScale,
    svd::{ Direction, MatSvd, Spectrum, TruncSpec, do_svd_trunc },
};

#[derive(Debug, Error)]
pub enum TensorError {
    /// Returned when an elementwise operation requires two equal index sets.
    #[error("tensors do not share a common index set")]
    IncompatibleIndices,

    /// Returned when a tensor is constructed with a repeated index.
    #[error("repeated index in tensor construction")]
    DuplicateIndex,

    /// Returned when element data does not match the index dimensions.
    #[error("array shape {0:?} does not match index dimensions {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Returned when a scalar value is demanded of a tensor of nonzero rank.
    #[error("tensor is not a scalar")]
    NotScalar,

    /// Returned when a bond factorization names an index the tensor lacks.
    #[error("tensor does not have an index named {0}")]
    MissingIndex(String),

    /// Returned when a bond factorization would leave one side empty.
    #[error("bond factorization requires a nonempty split on both sides")]
    BadSplit,

    /// Returned when a graded operation meets an ungraded index.
    #[error("operation requires charge-graded indices")]
    UngradedIndex,

    /// Returned when the blocks of a graded tensor disagree on total charge.
    #[error("blocks disagree on total charge divergence")]
    MixedDivergence,

    /// Returned when a block key does not address a valid sector combination.
    #[error("block key does not address a valid sector combination")]
    BadBlockKey,
}
use TensorError::*;
pub type TensorResult<T> = Result<T, TensorError>;

/// Real type underlying a tensor's elements.
pub type RealOf<T> = <<T as TensorAlg>::Elem as ComplexFloat>::Real;

/// Two factors of a bond factorization, joined by a fresh link index.
///
/// The singular weights are pre-absorbed into `vt` ([`Direction::FromLeft`])
/// or `u` ([`Direction::FromRight`]); the kept weights remain readable in
/// `spectrum`.
#[derive(Clone, Debug)]
pub struct BondSvd<T, R> {
    pub u: T,
    pub vt: T,
    pub link: Index,
    pub spectrum: Spectrum<R>,
}

/// Capability interface of an indexed tensor.
///
/// Everything above the raw tensor layer is written once against this trait
/// and instantiated with either the dense [`Tensor`] or the block-sparse
/// [`BlockTensor`][crate::block::BlockTensor].
pub trait TensorAlg: Clone + fmt::Debug + Sized {
    type Elem: ComplexFloat + ComplexFloatExt + 'static;

    /// All indices, in axis order.
    fn indices(&self) -> &[Index];

    /// Number of axes.
    fn rank(&self) -> usize { self.indices().len() }

    /// Return `true` if `ix` is one of this tensor's indices.
    fn has_index(&self, ix: &Index) -> bool { self.indices().contains(ix) }

    /// Number of independent elements the tensor ranges over.
    fn total_dim(&self) -> usize;

    /// Contract with `other` over all shared indices; an outer product if
    /// none are shared.
    fn contract(&self, other: &Self) -> Self;

    /// Elementwise sum. The index sets must be equal up to axis order.
    fn add(&self, other: &Self) -> TensorResult<Self>;

    /// Multiply by a complex factor.
    fn scale_by(&mut self, z: Self::Elem);

    /// Multiply by a real factor. O(1): only the log-scale is touched.
    fn scale_by_real(&mut self, r: <Self::Elem as ComplexFloat>::Real);

    /// Elementwise complex conjugate; graded flavors also reverse every index
    /// arrow. A no-op on real-valued content.
    fn conj(&self) -> Self;

    /// Move every index at prime level `p` to level `q`.
    fn map_prime(&mut self, p: u32, q: u32);

    /// Move every index of the given kind at prime level `p` to level `q`.
    fn map_prime_kind(&mut self, kind: Kind, p: u32, q: u32);

    /// Frobenius norm.
    fn norm(&self) -> <Self::Elem as ComplexFloat>::Real;

    /// Full inner product `⟨self|other⟩`: conjugate, contract, extract.
    ///
    /// Fails if the two index sets are not dual to each other.
    fn dot(&self, other: &Self) -> TensorResult<Self::Elem> {
        self.conj().contract(other).as_scalar()
    }

    /// Value of a rank-0 tensor.
    fn as_scalar(&self) -> TensorResult<Self::Elem>;

    /// Return `true` if the tensor is exactly zero.
    fn is_vanishing(&self) -> bool;

    /// Factor across the given row indices, truncating per `spec`, with the
    /// singular weights absorbed toward `dir`. The new bond carries
    /// `link_name`.
    ///
    /// A vanishing tensor factors recoverably: validly shaped factors joined
    /// by a zero-dimensional link, with an empty spectrum.
    fn svd_bond(
        &self,
        rows: &[Index],
        link_name: &str,
        spec: &TruncSpec<<Self::Elem as ComplexFloat>::Real>,
        dir: Direction,
    ) -> TensorResult<BondSvd<Self, <Self::Elem as ComplexFloat>::Real>>;
}

/// A dense tensor: named indices over an n-dimensional element array, kept
/// near unit magnitude with the overall scale held separately in log space.
#[derive(Clone)]
pub struct Tensor<A: ComplexFloat> {
    idxs: Vec<Index>,
    data: nd::ArrayD<A>,
    scale: LogScale<A::Real>,
}

impl<A: ComplexFloat> fmt::Debug for Tensor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor[")?;
        self.idxs.iter().enumerate()
            .try_for_each(|(k, ix)| {
                if k > 0 { write!(f, ", ")?; }
                write!(f, "{ix}")
            })?;
        write!(f, "]")
    }
}

pub(crate) fn check_indices(idxs: &[Index]) -> TensorResult<()> {
    idxs.iter().enumerate()
        .all(|(k, ix)| !idxs[k + 1..].contains(ix))
        .then_some(())
        .ok_or(DuplicateIndex)
}

impl<A> Tensor<A>
where A: ComplexFloat + ComplexFloatExt
{
    /// Create a new tensor from bare element data.
    ///
    /// Fails if an index is repeated or the array shape does not match the
    /// index dimensions.
    pub fn from_array(idxs: Vec<Index>, data: nd::ArrayD<A>)
        -> TensorResult<Self>
    {
        check_indices(&idxs)?;
        let dims: Vec<usize> = idxs.iter().map(|ix| ix.dim()).collect();
        if data.shape() != dims {
            return Err(ShapeMismatch(data.shape().to_vec(), dims));
        }
        let mut new = Self { idxs, data, scale: LogScale::one() };
        new.rescale();
        Ok(new)
    }

    /// Create a new tensor using a function over index values.
    pub fn from_fn<F>(idxs: Vec<Index>, mut elems: F) -> TensorResult<Self>
    where F: FnMut(&[usize]) -> A
    {
        check_indices(&idxs)?;
        let dims: Vec<usize> = idxs.iter().map(|ix| ix.dim()).collect();
        let data =
            nd::ArrayD::from_shape_fn(nd::IxDyn(&dims), |at| elems(at.slice()));
        let mut new = Self { idxs, data, scale: LogScale::one() };
        new.rescale();
        Ok(new)
    }

    /// Create a new tensor with all elements zero.
    pub fn zeros(idxs: Vec<Index>) -> TensorResult<Self> {
        check_indices(&idxs)?;
        let dims: Vec<usize> = idxs.iter().map(|ix| ix.dim()).collect();
        let data = nd::ArrayD::zeros(nd::IxDyn(&dims));
        Ok(Self { idxs, data, scale: LogScale::zero() })
    }

    /// Create a new rank-0 tensor.
    pub fn new_scalar(z: A) -> Self {
        let mut new = Self {
            idxs: Vec::new(),
            data: nd::arr0(z).into_dyn(),
            scale: LogScale::one(),
        };
        new.rescale();
        new
    }

    /// Create a new tensor with elements drawn uniformly from the unit square
    /// about zero.
    pub fn random<R>(idxs: Vec<Index>, rng: &mut R) -> TensorResult<Self>
    where
        R: Rng + ?Sized,
        Standard: Distribution<A::Real>,
    {
        let one = A::Real::one();
        let two = one + one;
        Self::from_fn(idxs, |_| {
            A::from_components(
                two * rng.gen::<A::Real>() - one,
                two * rng.gen::<A::Real>() - one,
            )
        })
    }

    /// Single element, with the scale folded back in.
    pub fn elem(&self, at: &[usize]) -> A {
        self.data[at] * A::from_real(self.scale.expand())
    }

    fn pos(&self, ix: &Index) -> Option<usize> {
        self.idxs.iter().position(|jx| jx == ix)
    }

    // pull the largest element magnitude out into the scale
    fn rescale(&mut self) {
        let mx: A::Real = self.data.iter()
            .map(|a| a.abs())
            .fold(A::Real::zero(), A::Real::max);
        if mx.is_zero() {
            self.scale = LogScale::zero();
            return;
        }
        if !Float::is_finite(mx) { return; }
        let inv = Float::recip(mx);
        self.data.mapv_inplace(|a| a * A::from_real(inv));
        self.scale *= LogScale::from_real(mx);
    }
}

impl<A> TensorAlg for Tensor<A>
where
    A: ComplexFloat + ComplexFloatExt + 'static,
    nd::Array2<A>: SVDInto<U = nd::Array2<A>, Sigma = nd::Array1<A::Real>, VT = nd::Array2<A>>,
{
    type Elem = A;

    fn indices(&self) -> &[Index] { &self.idxs }

    fn total_dim(&self) -> usize { self.data.len() }

    fn contract(&self, other: &Self) -> Self {
        // positions of the shared indices, paired up
        let common: Vec<(usize, usize)> = self.idxs.iter().enumerate()
            .filter_map(|(k, ix)| other.pos(ix).map(|j| (k, j)))
            .collect();
        debug_assert!(
            common.iter()
                .all(|(k, j)| self.idxs[*k].compatible(&other.idxs[*j])),
            "contract: shared indices with unequal spaces",
        );
        let scale = self.scale * other.scale;
        if common.is_empty() {
            let idxs: Vec<Index> =
                self.idxs.iter().chain(&other.idxs).cloned().collect();
            let dims: Vec<usize> = idxs.iter().map(|ix| ix.dim()).collect();
            let elems: Vec<A> =
                self.data.iter().cartesian_product(other.data.iter())
                    .map(|(a, b)| *a * *b)
                    .collect();
            let data =
                nd::ArrayD::from_shape_vec(nd::IxDyn(&dims), elems).unwrap();
            let mut new = Self { idxs, data, scale };
            new.rescale();
            return new;
        }
        let lfree: Vec<usize> = (0..self.idxs.len())
            .filter(|k| !common.iter().any(|(c, _)| c == k))
            .collect();
        let rfree: Vec<usize> = (0..other.idxs.len())
            .filter(|j| !common.iter().any(|(_, c)| c == j))
            .collect();
        let lperm: Vec<usize> =
            lfree.iter().chain(common.iter().map(|(k, _)| k))
                .copied()
                .collect();
        let rperm: Vec<usize> =
            common.iter().map(|(_, j)| j).chain(rfree.iter())
                .copied()
                .collect();
        let m: usize = lfree.iter().map(|k| self.idxs[*k].dim()).product();
        let kdim: usize =
            common.iter().map(|(k, _)| self.idxs[*k].dim()).product();
        let n: usize = rfree.iter().map(|j| other.idxs[*j].dim()).product();
        // a permuted view stays permuted through `to_owned`; force row-major
        // before reshaping
        let a = self.data.view().permuted_axes(lperm.as_slice())
            .as_standard_layout()
            .into_owned()
            .into_shape((m, kdim))
            .unwrap();
        let b = other.data.view().permuted_axes(rperm.as_slice())
            .as_standard_layout()
            .into_owned()
            .into_shape((kdim, n))
            .unwrap();
        let prod = a.dot(&b);
        let idxs: Vec<Index> =
            lfree.iter().map(|k| self.idxs[*k].clone())
                .chain(rfree.iter().map(|j| other.idxs[*j].clone()))
                .collect();
        let dims: Vec<usize> = idxs.iter().map(|ix| ix.dim()).collect();
        let data = prod.into_shape(nd::IxDyn(&dims)).unwrap();
        let mut new = Self { idxs, data, scale };
        new.rescale();
        new
    }

    fn add(&self, other: &Self) -> TensorResult<Self> {
        if self.idxs.len() != other.idxs.len() {
            return Err(IncompatibleIndices);
        }
        let operm: Vec<usize> = self.idxs.iter()
            .map(|ix| other.pos(ix).ok_or(IncompatibleIndices))
            .collect::<TensorResult<_>>()?;
        if self.is_vanishing() { return Ok(other.clone()); }
        if other.is_vanishing() { return Ok(self.clone()); }
        let target = self.scale.max_mag(other.scale);
        let fa = A::from_real(self.scale.ratio_to(&target));
        let fb = A::from_real(other.scale.ratio_to(&target));
        let mut data = self.data.mapv(|a| a * fa);
        data.zip_mut_with(
            &other.data.view().permuted_axes(operm.as_slice()),
            |o, b| { *o = *o + *b * fb; },
        );
        let mut new = Self { idxs: self.idxs.clone(), data, scale: target };
        new.rescale();
        Ok(new)
    }

    fn scale_by(&mut self, z: A) {
        let r = z.abs();
        if r.is_zero() {
            self.scale = LogScale::zero();
            return;
        }
        self.scale *= LogScale::from_real(r);
        let phase = z / A::from_real(r);
        if phase != A::one() {
            self.data.mapv_inplace(|a| a * phase);
        }
    }

    fn scale_by_real(&mut self, r: A::Real) {
        if r.is_zero() {
            self.scale = LogScale::zero();
        } else {
            self.scale *= LogScale::from_real(r);
        }
    }

    fn conj(&self) -> Self {
        Self {
            idxs: self.idxs.clone(),
            data: self.data.mapv(|a| a.conj()),
            scale: self.scale,
        }
    }

    fn map_prime(&mut self, p: u32, q: u32) {
        self.idxs.iter_mut()
            .for_each(|ix| {
                if ix.prime() == p { *ix = ix.at_prime(q); }
            });
    }

    fn map_prime_kind(&mut self, kind: Kind, p: u32, q: u32) {
        self.idxs.iter_mut()
            .for_each(|ix| {
                if ix.kind() == kind && ix.prime() == p {
                    *ix = ix.at_prime(q);
                }
            });
    }

    fn norm(&self) -> A::Real {
        let sq: A::Real = self.data.iter()
            .map(|a| a.abs() * a.abs())
            .fold(A::Real::zero(), |acc, x| acc + x);
        Float::sqrt(sq) * Float::abs(self.scale.expand())
    }

    fn as_scalar(&self) -> TensorResult<A> {
        if !self.idxs.is_empty() { return Err(NotScalar); }
        Ok(self.data[nd::IxDyn(&[])] * A::from_real(self.scale.expand()))
    }

    fn is_vanishing(&self) -> bool { self.scale.is_zero() }

    fn svd_bond(
        &self,
        rows: &[Index],
        link_name: &str,
        spec: &TruncSpec<A::Real>,
        dir: Direction,
    ) -> TensorResult<BondSvd<Self, A::Real>> {
        let rpos: Vec<usize> = rows.iter()
            .map(|r| self.pos(r).ok_or_else(|| MissingIndex(r.to_string())))
            .collect::<TensorResult<_>>()?;
        let cpos: Vec<usize> = (0..self.idxs.len())
            .filter(|k| !rpos.contains(k))
            .collect();
        if rpos.is_empty() || cpos.is_empty() { return Err(BadSplit); }
        let rdims: Vec<usize> =
            rpos.iter().map(|k| self.idxs[*k].dim()).collect();
        let cdims: Vec<usize> =
            cpos.iter().map(|k| self.idxs[*k].dim()).collect();
        let m: usize = rdims.iter().product();
        let n: usize = cdims.iter().product();

        let build = |k: usize, svals: Option<&[A::Real]>,
                     mut u: nd::Array2<A>, mut vt: nd::Array2<A>|
            -> (Self, Self)
        {
            let link = Index::link(link_name, k);
            match (dir, svals) {
                (Direction::FromLeft, Some(s)) => {
                    vt.axis_iter_mut(nd::Axis(0)).zip(s)
                        .for_each(|(mut row, sv)| {
                            row.mapv_inplace(|x| x * A::from_real(*sv));
                        });
                }
                (Direction::FromRight, Some(s)) => {
                    u.axis_iter_mut(nd::Axis(1)).zip(s)
                        .for_each(|(mut col, sv)| {
                            col.mapv_inplace(|x| x * A::from_real(*sv));
                        });
                }
                _ => { }
            }
            let mut ushape = rdims.clone();
            ushape.push(k);
            let mut vshape = vec![k];
            vshape.extend_from_slice(&cdims);
            let uidxs: Vec<Index> = rpos.iter()
                .map(|p| self.idxs[*p].clone())
                .chain([link.clone()])
                .collect();
            let vidxs: Vec<Index> = [link].into_iter()
                .chain(cpos.iter().map(|p| self.idxs[*p].clone()))
                .collect();
            let mut ut = Self {
                idxs: uidxs,
                data: u.into_shape(nd::IxDyn(&ushape)).unwrap(),
                scale: LogScale::one(),
            };
            let mut vtt = Self {
                idxs: vidxs,
                data: vt.into_shape(nd::IxDyn(&vshape)).unwrap(),
                scale: self.scale,
            };
            if dir == Direction::FromRight {
                std::mem::swap(&mut ut.scale, &mut vtt.scale);
            }
            ut.rescale();
            vtt.rescale();
            (ut, vtt)
        };

        if self.is_vanishing() {
            let (ut, vtt) = build(
                0, None, nd::Array2::zeros((m, 0)), nd::Array2::zeros((0, n)));
            let link = ut.idxs.last().unwrap().clone();
            return Ok(BondSvd {
                u: ut, vt: vtt, link, spectrum: Spectrum::empty(),
            });
        }

        let perm: Vec<usize> = rpos.iter().chain(&cpos).copied().collect();
        let q = self.data.view().permuted_axes(perm.as_slice())
            .as_standard_layout()
            .into_owned()
            .into_shape((m, n))
            .unwrap();
        let MatSvd { u, s, vt, spectrum } = do_svd_trunc(q, spec);
        let k = spectrum.m();
        if k == 0 {
            let (ut, vtt) = build(
                0, None, nd::Array2::zeros((m, 0)), nd::Array2::zeros((0, n)));
            let link = ut.idxs.last().unwrap().clone();
            return Ok(BondSvd {
                u: ut, vt: vtt, link, spectrum: Spectrum::empty(),
            });
        }
        let (ut, vtt) = build(k, Some(&s), u, vt);
        let link = ut.idxs.last().unwrap().clone();
        Ok(BondSvd { u: ut, vt: vtt, link, spectrum })
    }
}
