//! The effective operator seen by one bond of the chain.
//!
//! Projecting `H` into the basis of a gauged chain leaves a small operator
//! acting on the two-site bond tensor: left environment, the two bond MPO
//! tensors, right environment. [`LocalOp`] borrows those pieces and applies
//! them matrix-free, which is all an iterative eigensolver needs.
//!
//! Penalty windows shift previously found states up in the spectrum:
//! each window `w_o` contributes `weight · conj(w_o) · (w_o · phi)`, the
//! bond-projected form of `weight |o⟩⟨o|`.

use num_traits::Zero;
use crate::{
    index::Kind,
    tensor::{ RealOf, TensorAlg, TensorResult },
};

/// Matrix-free effective operator at one bond.
///
/// `apply` carries a bond tensor `phi` through the sandwich and un-primes
/// the result, so the output lives in the same index space as the input.
pub struct LocalOp<'a, T: TensorAlg> {
    left: Option<&'a T>,
    right: Option<&'a T>,
    h1: &'a T,
    h2: &'a T,
    weight: RealOf<T>,
    windows: Vec<T>,
}

impl<'a, T: TensorAlg> LocalOp<'a, T> {
    /// Assemble the operator at a bond from the cached environments and the
    /// two bond MPO tensors. `None` environments are the identity.
    pub fn new(
        left: Option<&'a T>,
        right: Option<&'a T>,
        h1: &'a T,
        h2: &'a T,
    ) -> Self {
        Self {
            left,
            right,
            h1,
            h2,
            weight: RealOf::<T>::zero(),
            windows: Vec::new(),
        }
    }

    /// Add overlap windows of previously found states, each penalized by
    /// `weight`.
    pub fn with_penalty(mut self, weight: RealOf<T>, windows: Vec<T>)
        -> Self
    {
        self.weight = weight;
        self.windows = windows;
        self
    }

    /// Dimension of the space the operator acts on, read off the site
    /// indices of the bond tensors and the dangling links of the
    /// environments.
    pub fn size(&self) -> usize {
        let site_dim = |h: &T| h.indices().iter()
            .find(|ix| ix.kind() == Kind::Site && ix.prime() == 0)
            .map(|ix| ix.dim())
            .unwrap_or(1);
        let edge_dim = |env: Option<&T>, h: &T| env
            .map(|e| {
                e.indices().iter()
                    .filter(|ix| {
                        ix.kind() == Kind::Link && ix.prime() == 0
                            && !h.has_index(ix)
                    })
                    .map(|ix| ix.dim())
                    .product::<usize>()
            })
            .unwrap_or(1);
        edge_dim(self.left, self.h1)
            * site_dim(self.h1)
            * site_dim(self.h2)
            * edge_dim(self.right, self.h2)
    }

    /// Apply the operator to a bond tensor.
    pub fn apply(&self, phi: &T) -> T {
        let mut out = match self.left {
            Some(l) => l.contract(phi),
            None => phi.clone(),
        };
        out = out.contract(self.h1).contract(self.h2);
        if let Some(r) = self.right { out = out.contract(r); }
        out.map_prime(1, 0);
        for win in self.windows.iter() {
            // the window is a bra: it pairs with phi over every index
            let Ok(ov) = win.contract(phi).as_scalar() else { unreachable!() };
            let mut pen = win.conj();
            pen.scale_by(ov);
            pen.scale_by_real(self.weight);
            let Ok(next) = out.add(&pen) else { unreachable!() };
            out = next;
        }
        out
    }

    /// Rayleigh quotient `⟨phi|H_eff|phi⟩ / ⟨phi|phi⟩`.
    pub fn expect(&self, phi: &T) -> TensorResult<T::Elem> {
        let hphi = self.apply(phi);
        let num = phi.dot(&hphi)?;
        let den = phi.dot(phi)?;
        Ok(num / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C64;
    use crate::{
        chain::Chain,
        env::EnvCache,
        index::Index,
        svd::Direction,
        tensor::Tensor,
    };

    fn c(re: f64) -> C64 { C64::new(re, 0.0) }

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

    fn identity_mpo(n: usize) -> Chain<Tensor<C64>> {
        let data: Vec<Tensor<C64>> = (0..n)
            .map(|k| {
                let mut idxs = Vec::new();
                if k > 0 { idxs.push(Index::link(format!("m{}", k - 1), 1)); }
                let s = Index::site(format!("s{k}"), 2);
                idxs.push(s.clone());
                idxs.push(s.primed());
                if k < n - 1 { idxs.push(Index::link(format!("m{k}"), 1)); }
                Tensor::from_fn(idxs, |at| {
                    let (a, b) = if k == 0 { (at[0], at[1]) }
                        else { (at[1], at[2]) };
                    if a == b { c(1.0) } else { c(0.0) }
                }).unwrap()
            })
            .collect();
        Chain::from_tensors(data).unwrap()
    }

    // szsz coupling on a single bond, unit operator links
    fn szsz_mpo2() -> Chain<Tensor<C64>> {
        let sz = |a: usize, b: usize| {
            if a != b { c(0.0) }
            else if a == 0 { c(0.5) }
            else { c(-0.5) }
        };
        let m = Index::link("m0", 1);
        let w0 = Tensor::from_fn(
            vec![
                Index::site("s0", 2),
                Index::site("s0", 2).primed(),
                m.clone(),
            ],
            |at| sz(at[0], at[1]),
        ).unwrap();
        let w1 = Tensor::from_fn(
            vec![m, Index::site("s1", 2), Index::site("s1", 2).primed()],
            |at| sz(at[1], at[2]),
        ).unwrap();
        Chain::from_tensors(vec![w0, w1]).unwrap()
    }

    fn diff_norm(a: &Tensor<C64>, b: &Tensor<C64>) -> f64 {
        let mut neg = b.clone();
        neg.scale_by_real(-1.0);
        a.add(&neg).unwrap().norm()
    }

    #[test]
    fn identity_bond_operator_fixes_its_input() {
        let psi = basis_mps(&[0, 1]);
        let h = identity_mpo(2);
        let op = LocalOp::new(None, None, &h.tensors()[0], &h.tensors()[1]);
        assert_eq!(op.size(), 4);
        let phi = psi.tensors()[0].contract(&psi.tensors()[1]);
        let hphi = op.apply(&phi);
        assert!(diff_norm(&hphi, &phi) < 1e-12);
        assert!((op.expect(&phi).unwrap() - c(1.0)).norm() < 1e-12);
    }

    #[test]
    fn szsz_bond_operator_weighs_alignment() {
        let h = szsz_mpo2();
        let op = LocalOp::new(None, None, &h.tensors()[0], &h.tensors()[1]);
        let up = basis_mps(&[0, 0]);
        let phi = up.tensors()[0].contract(&up.tensors()[1]);
        assert!((op.expect(&phi).unwrap() - c(0.25)).norm() < 1e-12);
        let anti = basis_mps(&[0, 1]);
        let phi = anti.tensors()[0].contract(&anti.tensors()[1]);
        assert!((op.expect(&phi).unwrap() - c(-0.25)).norm() < 1e-12);
    }

    #[test]
    fn environments_complete_the_sandwich() {
        let psi = basis_mps(&[0, 1, 0, 1]);
        let h = identity_mpo(4);
        let mut env = EnvCache::new(&psi, &h, &[], None, None).unwrap();
        env.update(0, Direction::FromLeft, &psi, &h);
        let op = LocalOp::new(
            env.left(1),
            env.right(1),
            &h.tensors()[1],
            &h.tensors()[2],
        );
        assert_eq!(op.size(), 4);
        let phi = psi.tensors()[1].contract(&psi.tensors()[2]);
        let hphi = op.apply(&phi);
        assert!(diff_norm(&hphi, &phi) < 1e-12);
    }

    #[test]
    fn penalty_shifts_the_penalized_direction() {
        let psi = basis_mps(&[0, 1]);
        let h = identity_mpo(2);
        let phi = psi.tensors()[0].contract(&psi.tensors()[1]);
        let op = LocalOp::new(None, None, &h.tensors()[0], &h.tensors()[1])
            .with_penalty(10.0, vec![phi.conj()]);
        // phi itself is penalized: identity plus the full weight
        assert!((op.expect(&phi).unwrap() - c(11.0)).norm() < 1e-12);
        // an orthogonal direction is untouched
        let other = basis_mps(&[1, 0]);
        let chi = other.tensors()[0].contract(&other.tensors()[1]);
        assert!((op.expect(&chi).unwrap() - c(1.0)).norm() < 1e-12);
    }
}
