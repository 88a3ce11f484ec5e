//! Shared one-dimensional chain container for matrix-product states and
//! operators.
//!
//! An MPS and an MPO differ only in payload: one site index per tensor
//! versus an unprimed/primed pair. Everything structural — the orthogonality
//! window, bond factorization, gauge moves — is identical, so both are the
//! same [`Chain`] type under the [`MPS`]/[`MPO`] aliases.
//!
//! ```text
//!   data:   [0]---[1]---[2]--- ... ---[n-1]
//!   window:  0..llim left-orthonormal, rlim..n right-orthonormal
//! ```
//!
//! The window never overstates what is known: `svd_bond` applies the exact
//! update laws and `set_site` loosens the window around the replaced site.
//! The orthogonality center is defined only when the window pinches to a
//! single site (`rlim == llim + 1`).

use num_complex::ComplexFloat;
use num_traits::{ Float, NumCast, Zero };
use thiserror::Error;
use crate::{
    index::{ Index, Kind },
    svd::{ Direction, Spectrum, TruncSpec },
    tensor::{ BondSvd, RealOf, TensorAlg, TensorError },
};

#[derive(Debug, Error)]
pub enum ChainError {
    /// Returned when an operation needs at least one site tensor.
    #[error("chain holds no site tensors")]
    EmptyChain,

    /// Returned when a site index is out of range.
    #[error("site {0} out of range for a chain of {1}")]
    SiteOutOfRange(usize, usize),

    /// Returned when a bond index is out of range.
    #[error("bond {0} out of range for a chain of {1}")]
    BondOutOfRange(usize, usize),

    /// Returned when two chains that must walk in lock step have different
    /// lengths.
    #[error("chains have different lengths {0} and {1}")]
    LengthMismatch(usize, usize),

    /// A tensor-level failure.
    #[error("tensor error: {0}")]
    TensorFailure(#[from] TensorError),
}
use ChainError::*;
pub type ChainResult<T> = Result<T, ChainError>;

/// A matrix-product state.
pub type MPS<T> = Chain<T>;
/// A matrix-product operator.
pub type MPO<T> = Chain<T>;

/// A row of site tensors with an orthogonality window.
#[derive(Clone, Debug)]
pub struct Chain<T> {
    data: Vec<T>,
    llim: usize,
    rlim: usize,
    tag: String,
}

impl<T: TensorAlg> Chain<T> {
    /// Wrap a row of site tensors. No orthonormality is assumed.
    pub fn from_tensors(data: Vec<T>) -> ChainResult<Self> {
        if data.is_empty() { return Err(EmptyChain); }
        let n = data.len();
        Ok(Self { data, llim: 0, rlim: n, tag: "l".into() })
    }

    // the recoverable zero of `mul_mpo`/`apply_mpo`
    fn empty(tag: &str) -> Self {
        Self { data: Vec::new(), llim: 0, rlim: 0, tag: tag.into() }
    }

    /// Number of sites.
    #[inline]
    pub fn len(&self) -> usize { self.data.len() }

    /// `true` if the chain holds no site tensors.
    #[inline]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// All site tensors, left to right.
    #[inline]
    pub fn tensors(&self) -> &[T] { &self.data }

    /// Site tensor `i`.
    pub fn site(&self, i: usize) -> ChainResult<&T> {
        self.data.get(i).ok_or(SiteOutOfRange(i, self.data.len()))
    }

    /// Replace site tensor `i`, loosening the orthogonality window around
    /// it.
    pub fn set_site(&mut self, i: usize, t: T) -> ChainResult<()> {
        if i >= self.data.len() {
            return Err(SiteOutOfRange(i, self.data.len()));
        }
        self.data[i] = t;
        self.llim = self.llim.min(i);
        self.rlim = self.rlim.max(i + 1);
        Ok(())
    }

    /// The orthogonality center, if the window pinches to a single site.
    #[inline]
    pub fn ortho_center(&self) -> Option<usize> {
        (self.rlim == self.llim + 1).then_some(self.llim)
    }

    /// Factor the two-site tensor `phi` over bond `b` and store the two
    /// factors, with the singular weights absorbed into the factor the
    /// center moves toward.
    ///
    /// `phi` must carry exactly the outer indices of sites `b` and `b+1`.
    /// Returns the kept spectrum.
    pub fn svd_bond(
        &mut self,
        b: usize,
        phi: &T,
        spec: &TruncSpec<RealOf<T>>,
        dir: Direction,
    ) -> ChainResult<Spectrum<RealOf<T>>> {
        let n = self.data.len();
        if n < 2 || b > n - 2 { return Err(BondOutOfRange(b, n)); }
        let rows: Vec<Index> = self.data[b].indices().iter()
            .filter(|ix| !self.data[b + 1].has_index(ix))
            .cloned()
            .collect();
        let link_name = format!("{}{}", self.tag, b);
        let BondSvd { u, vt, link: _, spectrum } =
            phi.svd_bond(&rows, &link_name, spec, dir)?;
        self.data[b] = u;
        self.data[b + 1] = vt;
        match dir {
            Direction::FromLeft => {
                self.llim = b + 1;
                if self.rlim < b + 2 { self.rlim = b + 2; }
            }
            Direction::FromRight => {
                self.rlim = b + 1;
                if self.llim > b { self.llim = b; }
            }
        }
        Ok(spectrum)
    }

    /// Move the orthogonality center to site `i` by repeated bond
    /// factorizations. A no-op when the center is already there.
    pub fn position(&mut self, i: usize, spec: &TruncSpec<RealOf<T>>)
        -> ChainResult<()>
    {
        let n = self.data.len();
        if i >= n { return Err(SiteOutOfRange(i, n)); }
        while self.llim < i {
            let b = self.llim;
            let phi = self.data[b].contract(&self.data[b + 1]);
            self.svd_bond(b, &phi, spec, Direction::FromLeft)?;
        }
        while self.rlim > i + 1 {
            let b = self.rlim - 2;
            let phi = self.data[b].contract(&self.data[b + 1]);
            self.svd_bond(b, &phi, spec, Direction::FromRight)?;
        }
        Ok(())
    }

    /// Re-gauge the whole chain: center to the last site, then back to site
    /// zero.
    pub fn orthogonalize(&mut self, spec: &TruncSpec<RealOf<T>>)
        -> ChainResult<()>
    {
        let n = self.data.len();
        if n == 0 { return Err(EmptyChain); }
        self.position(n - 1, spec)?;
        self.position(0, spec)
    }

    /// Frobenius norm of the whole chain state.
    ///
    /// O(1) when the window is pinched; a full ladder contraction
    /// otherwise.
    pub fn norm(&self) -> ChainResult<RealOf<T>> {
        if let Some(c) = self.ortho_center() {
            return Ok(self.data[c].norm());
        }
        let v = inner(self, self)?;
        Ok(Float::sqrt(Float::max(v.re(), <RealOf<T>>::zero())))
    }

    /// Scale the chain to unit norm. Returns the previous norm; a vanishing
    /// chain is left untouched.
    pub fn normalize(&mut self) -> ChainResult<RealOf<T>> {
        let nrm = self.norm()?;
        if nrm.is_zero() { return Ok(nrm); }
        let at = self.ortho_center().unwrap_or(0);
        self.data[at].scale_by_real(Float::recip(nrm));
        Ok(nrm)
    }
}

/// Inner product `⟨a|b⟩` by a left-to-right ladder contraction.
///
/// The bra's link indices are primed while walking so the two chains' links
/// stay apart; only site indices are contracted across the rungs.
pub fn inner<T: TensorAlg>(a: &Chain<T>, b: &Chain<T>)
    -> ChainResult<T::Elem>
{
    if a.len() != b.len() { return Err(LengthMismatch(a.len(), b.len())); }
    if a.is_empty() { return Err(EmptyChain); }
    let mut acc: Option<T> = None;
    for (ak, bk) in a.data.iter().zip(&b.data) {
        let mut bra = ak.conj();
        bra.map_prime_kind(Kind::Link, 0, 1);
        let step = match acc {
            None => bra.contract(bk),
            Some(prev) => prev.contract(bk).contract(&bra),
        };
        acc = Some(step);
    }
    let Some(out) = acc else { unreachable!() };
    Ok(out.as_scalar()?)
}

/// Real part of [`inner`], warning on stderr when the dropped imaginary
/// part is meaningful relative to the magnitude.
pub fn inner_re<T: TensorAlg>(a: &Chain<T>, b: &Chain<T>)
    -> ChainResult<RealOf<T>>
{
    inner(a, b).map(|z| really(z, "inner_re"))
}

/// Matrix element `⟨a|h|b⟩` by a three-row ladder contraction with the bra
/// fully primed.
pub fn expect<T: TensorAlg>(a: &Chain<T>, h: &Chain<T>, b: &Chain<T>)
    -> ChainResult<T::Elem>
{
    if a.len() != h.len() { return Err(LengthMismatch(a.len(), h.len())); }
    if a.len() != b.len() { return Err(LengthMismatch(a.len(), b.len())); }
    if a.is_empty() { return Err(EmptyChain); }
    let mut acc: Option<T> = None;
    for ((ak, hk), bk) in a.data.iter().zip(&h.data).zip(&b.data) {
        let mut bra = ak.conj();
        bra.map_prime(0, 1);
        let step = match acc {
            None => bk.contract(hk).contract(&bra),
            Some(prev) => prev.contract(bk).contract(hk).contract(&bra),
        };
        acc = Some(step);
    }
    let Some(out) = acc else { unreachable!() };
    Ok(out.as_scalar()?)
}

/// Real part of [`expect`], warning on stderr when the dropped imaginary
/// part is meaningful.
pub fn expect_re<T: TensorAlg>(a: &Chain<T>, h: &Chain<T>, b: &Chain<T>)
    -> ChainResult<RealOf<T>>
{
    expect(a, h, b).map(|z| really(z, "expect_re"))
}

fn really<A: ComplexFloat>(z: A, what: &str) -> A::Real {
    let tol: A::Real =
        NumCast::from(1.0e-12_f64).unwrap_or_else(A::Real::epsilon);
    if Float::abs(z.im()) > tol * z.abs() {
        eprintln!("{what}: dropping a nonzero imaginary part");
    }
    z.re()
}

/// Operator product `a · b` of two MPOs by zip-up factorization.
///
/// `a` is applied after `b`: the result maps unprimed inputs to singly
/// primed outputs, like its factors. If the running cluster tensor vanishes
/// identically the product is an empty chain, with a stderr diagnostic.
pub fn mul_mpo<T: TensorAlg>(
    a: &Chain<T>,
    b: &Chain<T>,
    spec: &TruncSpec<RealOf<T>>,
) -> ChainResult<Chain<T>>
{
    if a.len() != b.len() { return Err(LengthMismatch(a.len(), b.len())); }
    if a.is_empty() { return Err(EmptyChain); }
    let n = a.len();
    // lift a's sites to (1, 2) and its links to prime 1 so nothing collides
    // with b while the shared prime-1 site level contracts away
    let lift = |t: &T| {
        let mut at = t.clone();
        at.map_prime_kind(Kind::Site, 1, 2);
        at.map_prime(0, 1);
        at
    };
    let mut out = Chain::<T>::empty("q");
    let mut cluster: Option<T> = None;
    for k in 0..n {
        let ak = lift(&a.data[k]);
        let c = match cluster.take() {
            None => b.data[k].contract(&ak),
            Some(cl) => cl.contract(&b.data[k]).contract(&ak),
        };
        if c.is_vanishing() {
            eprintln!("mul_mpo: operator product vanished at site {k}");
            return Ok(Chain::empty("q"));
        }
        if k == n - 1 {
            out.data.push(c);
            break;
        }
        let rows: Vec<Index> = c.indices().iter()
            .filter(|ix| {
                !b.data[k + 1].has_index(ix)
                    && !(ix.kind() == Kind::Link && ix.prime() == 1
                        && a.data[k + 1].has_index(&ix.at_prime(0)))
            })
            .cloned()
            .collect();
        let BondSvd { u, vt, .. } =
            c.svd_bond(&rows, &format!("q{k}"), spec, Direction::FromLeft)?;
        out.data.push(u);
        cluster = Some(vt);
    }
    out.data.iter_mut()
        .for_each(|t| { t.map_prime_kind(Kind::Site, 2, 1); });
    out.llim = n - 1;
    out.rlim = n;
    Ok(out)
}

/// Apply an MPO to an MPS by the same zip-up scheme, un-priming the result
/// back to ket convention.
pub fn apply_mpo<T: TensorAlg>(
    h: &Chain<T>,
    psi: &Chain<T>,
    spec: &TruncSpec<RealOf<T>>,
) -> ChainResult<Chain<T>>
{
    if h.len() != psi.len() {
        return Err(LengthMismatch(h.len(), psi.len()));
    }
    if h.is_empty() { return Err(EmptyChain); }
    let n = h.len();
    let lift = |t: &T| {
        let mut ht = t.clone();
        ht.map_prime_kind(Kind::Link, 0, 1);
        ht
    };
    let mut out = Chain::<T>::empty("q");
    let mut cluster: Option<T> = None;
    for k in 0..n {
        let hk = lift(&h.data[k]);
        let c = match cluster.take() {
            None => psi.data[k].contract(&hk),
            Some(cl) => cl.contract(&psi.data[k]).contract(&hk),
        };
        if c.is_vanishing() {
            eprintln!("apply_mpo: state vanished at site {k}");
            return Ok(Chain::empty("q"));
        }
        if k == n - 1 {
            out.data.push(c);
            break;
        }
        let rows: Vec<Index> = c.indices().iter()
            .filter(|ix| {
                !psi.data[k + 1].has_index(ix)
                    && !(ix.kind() == Kind::Link && ix.prime() == 1
                        && h.data[k + 1].has_index(&ix.at_prime(0)))
            })
            .cloned()
            .collect();
        let BondSvd { u, vt, .. } =
            c.svd_bond(&rows, &format!("q{k}"), spec, Direction::FromLeft)?;
        out.data.push(u);
        cluster = Some(vt);
    }
    out.data.iter_mut()
        .for_each(|t| { t.map_prime_kind(Kind::Site, 1, 0); });
    out.llim = n - 1;
    out.rlim = n;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C64;
    use rand::{ SeedableRng, rngs::StdRng };
    use crate::tensor::Tensor;

    fn c(re: f64) -> C64 { C64::new(re, 0.0) }

    fn random_mps(n: usize, seed: u64) -> Chain<Tensor<C64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let sites: Vec<Index> =
            (0..n).map(|k| Index::site(format!("s{k}"), 2)).collect();
        let links: Vec<Index> =
            (0..n - 1).map(|k| Index::link(format!("l{k}"), 3)).collect();
        let data: Vec<Tensor<C64>> = (0..n)
            .map(|k| {
                let mut idxs = Vec::new();
                if k > 0 { idxs.push(links[k - 1].clone()); }
                idxs.push(sites[k].clone());
                if k < n - 1 { idxs.push(links[k].clone()); }
                Tensor::random(idxs, &mut rng).unwrap()
            })
            .collect();
        Chain::from_tensors(data).unwrap()
    }

    // |0...0> as a bond-dimension-1 chain
    fn basis_mps(bits: &[usize]) -> Chain<Tensor<C64>> {
        let n = bits.len();
        let data: Vec<Tensor<C64>> = (0..n)
            .map(|k| {
                let mut idxs = Vec::new();
                if k > 0 { idxs.push(Index::link(format!("l{}", k - 1), 1)); }
                idxs.push(Index::site(format!("s{k}"), 2));
                if k < n - 1 { idxs.push(Index::link(format!("l{k}"), 1)); }
                let bit = bits[k];
                Tensor::from_fn(idxs, |at| {
                    let s = if k == 0 { at[0] } else { at[1] };
                    if s == bit { c(1.0) } else { c(0.0) }
                }).unwrap()
            })
            .collect();
        Chain::from_tensors(data).unwrap()
    }

    // two-site identity operator with unit bond
    fn identity_mpo2() -> Chain<Tensor<C64>> {
        let m = Index::link("m0", 1);
        let w0 = Tensor::from_fn(
            vec![
                Index::site("s0", 2),
                Index::site("s0", 2).primed(),
                m.clone(),
            ],
            |at| if at[0] == at[1] { c(1.0) } else { c(0.0) },
        ).unwrap();
        let w1 = Tensor::from_fn(
            vec![m, Index::site("s1", 2), Index::site("s1", 2).primed()],
            |at| if at[1] == at[2] { c(1.0) } else { c(0.0) },
        ).unwrap();
        Chain::from_tensors(vec![w0, w1]).unwrap()
    }

    #[test]
    fn product_states_have_expected_overlaps() {
        let up = basis_mps(&[0, 0]);
        let dn = basis_mps(&[1, 1]);
        assert!((inner(&up, &up).unwrap() - c(1.0)).norm() < 1e-12);
        assert!(inner(&up, &dn).unwrap().norm() < 1e-12);
        assert!((up.norm().unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn svd_bond_moves_the_window() {
        let mut psi = random_mps(2, 1);
        assert_eq!(psi.ortho_center(), None);
        let phi = psi.site(0).unwrap().contract(psi.site(1).unwrap());
        psi.svd_bond(0, &phi, &TruncSpec::exact(), Direction::FromLeft)
            .unwrap();
        assert_eq!(psi.ortho_center(), Some(1));
        let phi = psi.site(0).unwrap().contract(psi.site(1).unwrap());
        psi.svd_bond(0, &phi, &TruncSpec::exact(), Direction::FromRight)
            .unwrap();
        assert_eq!(psi.ortho_center(), Some(0));
        assert!(psi.svd_bond(
            1, &phi, &TruncSpec::exact(), Direction::FromLeft).is_err());
    }

    #[test]
    fn position_is_norm_preserving_and_idempotent() {
        let psi0 = random_mps(4, 5);
        let full = inner(&psi0, &psi0).unwrap();
        let mut psi = psi0.clone();
        psi.position(2, &TruncSpec::exact()).unwrap();
        assert_eq!(psi.ortho_center(), Some(2));
        // center norm equals the full ladder norm only if every tensor
        // outside the window is isometric
        let via_center = psi.norm().unwrap();
        assert!((via_center.powi(2) - full.re).abs() < 1e-8 * full.re);
        // the gauged chain still represents the same state
        let cross = inner(&psi0, &psi).unwrap();
        assert!((cross - full).norm() < 1e-8 * full.re);
        // no numerical churn when already positioned
        let snapshot = psi.site(2).unwrap().clone();
        psi.position(2, &TruncSpec::exact()).unwrap();
        assert!(
            (snapshot.norm() - psi.site(2).unwrap().norm()).abs() < 1e-15
        );
        psi.position(0, &TruncSpec::exact()).unwrap();
        assert_eq!(psi.ortho_center(), Some(0));
        let cross = inner(&psi0, &psi).unwrap();
        assert!((cross - full).norm() < 1e-8 * full.re);
    }

    #[test]
    fn identity_mpo_acts_trivially() {
        let psi = basis_mps(&[0, 1]);
        let h = identity_mpo2();
        let hpsi = apply_mpo(&h, &psi, &TruncSpec::exact()).unwrap();
        assert_eq!(hpsi.len(), 2);
        let ov = inner(&hpsi, &psi).unwrap();
        assert!((ov - c(1.0)).norm() < 1e-10);
        assert!((expect(&psi, &h, &psi).unwrap() - c(1.0)).norm() < 1e-10);
    }

    #[test]
    fn mpo_product_composes() {
        let h = identity_mpo2();
        let hh = mul_mpo(&h, &h, &TruncSpec::exact()).unwrap();
        assert_eq!(hh.len(), 2);
        let psi = basis_mps(&[1, 0]);
        assert!((expect(&psi, &hh, &psi).unwrap() - c(1.0)).norm() < 1e-10);
    }

    #[test]
    fn vanishing_product_returns_an_empty_chain() {
        let h = identity_mpo2();
        let mut z = identity_mpo2();
        let dead = Tensor::zeros(z.site(0).unwrap().indices().to_vec())
            .unwrap();
        z.set_site(0, dead).unwrap();
        let prod = mul_mpo(&z, &h, &TruncSpec::exact()).unwrap();
        assert!(prod.is_empty());
    }
}
