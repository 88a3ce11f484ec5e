//! Cached boundary environments for sweeping over a sandwiched chain.
//!
//! A two-site update at bond `b` sees the Hamiltonian through three pieces:
//! everything left of site `b`, the two bond MPO tensors, and everything
//! right of site `b+1`. The outer pieces change by one column per sweep
//! step, so they are cached in a slot array `lr` and updated incrementally:
//! slots left of the active bond hold left environments, slots right of it
//! hold right environments, and the two end slots are `None` (identity) or
//! user-supplied boundary tensors.
//!
//! For runs that penalize previously found states the cache also keeps one
//! overlap ladder per penalized state, advanced under the same slot
//! discipline but with no operator row.

use thiserror::Error;
use crate::{
    chain::{ MPO, MPS },
    index::Kind,
    svd::Direction,
    tensor::TensorAlg,
};

#[derive(Debug, Error)]
pub enum EnvError {
    /// Returned when the state and operator chains have different lengths.
    #[error("chains have different lengths {0} and {1}")]
    LengthMismatch(usize, usize),

    /// Returned when the chain is too short to have a bond.
    #[error("environments need at least two sites, got {0}")]
    TooShort(usize),
}
use EnvError::*;
pub type EnvResult<T> = Result<T, EnvError>;

// one column of the operator sandwich; the bra row is fully primed
fn grow<T: TensorAlg>(prev: Option<&T>, psi_k: &T, h_k: &T) -> T {
    let mut bra = psi_k.conj();
    bra.map_prime(0, 1);
    match prev {
        None => psi_k.contract(h_k).contract(&bra),
        Some(p) => p.contract(psi_k).contract(h_k).contract(&bra),
    }
}

// one column of a bare overlap ladder; only the bra links are primed
fn grow_overlap<T: TensorAlg>(prev: Option<&T>, o_k: &T, psi_k: &T) -> T {
    let mut bra = o_k.conj();
    bra.map_prime_kind(Kind::Link, 0, 1);
    match prev {
        None => bra.contract(psi_k),
        Some(p) => p.contract(psi_k).contract(&bra),
    }
}

// overlap ladder slots for one penalized state, which the cache owns
#[derive(Clone, Debug)]
struct OrthoEnv<T> {
    state: MPS<T>,
    lr: Vec<Option<T>>,
}

/// Slot cache of left/right environments for one `⟨psi|H|psi⟩` sandwich.
///
/// At bond `b`, `left(b)` covers sites `0..b` and `right(b)` covers sites
/// `b+2..n`; a `None` means the identity boundary.
#[derive(Clone, Debug)]
pub struct EnvCache<T> {
    lr: Vec<Option<T>>,
    ortho: Vec<OrthoEnv<T>>,
}

impl<T: TensorAlg> EnvCache<T> {
    /// Build the cache for a sweep starting at bond 0: every right slot
    /// down to bond 1 is filled from the right edge, and optional boundary
    /// tensors seed the two end slots.
    pub fn new(
        psi: &MPS<T>,
        h: &MPO<T>,
        orthos: &[MPS<T>],
        ledge: Option<T>,
        redge: Option<T>,
    ) -> EnvResult<Self> {
        let n = psi.len();
        if h.len() != n { return Err(LengthMismatch(n, h.len())); }
        if n < 2 { return Err(TooShort(n)); }
        let mut lr: Vec<Option<T>> = vec![None; n];
        lr[0] = ledge;
        lr[n - 1] = redge;
        for j in (1..=n - 2).rev() {
            lr[j] = Some(grow(
                lr[j + 1].as_ref(),
                &psi.tensors()[j + 1],
                &h.tensors()[j + 1],
            ));
        }
        let mut ortho: Vec<OrthoEnv<T>> = Vec::with_capacity(orthos.len());
        for o in orthos {
            if o.len() != n { return Err(LengthMismatch(n, o.len())); }
            let mut olr: Vec<Option<T>> = vec![None; n];
            for j in (1..=n - 2).rev() {
                olr[j] = Some(grow_overlap(
                    olr[j + 1].as_ref(),
                    &o.tensors()[j + 1],
                    &psi.tensors()[j + 1],
                ));
            }
            ortho.push(OrthoEnv { state: o.clone(), lr: olr });
        }
        Ok(Self { lr, ortho })
    }

    /// Number of sites spanned.
    #[inline]
    pub fn len(&self) -> usize { self.lr.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.lr.is_empty() }

    /// Number of penalized states tracked alongside the sandwich.
    #[inline]
    pub fn n_ortho(&self) -> usize { self.ortho.len() }

    /// Left environment at bond `b`, `None` at the open boundary.
    #[inline]
    pub fn left(&self, b: usize) -> Option<&T> { self.lr[b].as_ref() }

    /// Right environment at bond `b`, `None` at the open boundary.
    #[inline]
    pub fn right(&self, b: usize) -> Option<&T> { self.lr[b + 1].as_ref() }

    /// Advance the cache after the bond-`b` tensors of `psi` have been
    /// replaced: moving right absorbs column `b` into the left slots,
    /// moving left absorbs column `b+1` into the right slots.
    pub fn update(
        &mut self,
        b: usize,
        dir: Direction,
        psi: &MPS<T>,
        h: &MPO<T>,
    ) {
        match dir {
            Direction::FromLeft => {
                self.lr[b + 1] = Some(grow(
                    self.lr[b].as_ref(),
                    &psi.tensors()[b],
                    &h.tensors()[b],
                ));
                for oe in self.ortho.iter_mut() {
                    oe.lr[b + 1] = Some(grow_overlap(
                        oe.lr[b].as_ref(),
                        &oe.state.tensors()[b],
                        &psi.tensors()[b],
                    ));
                }
            }
            Direction::FromRight => {
                self.lr[b] = Some(grow(
                    self.lr[b + 1].as_ref(),
                    &psi.tensors()[b + 1],
                    &h.tensors()[b + 1],
                ));
                for oe in self.ortho.iter_mut() {
                    oe.lr[b] = Some(grow_overlap(
                        oe.lr[b + 1].as_ref(),
                        &oe.state.tensors()[b + 1],
                        &psi.tensors()[b + 1],
                    ));
                }
            }
        }
    }

    /// Overlap window of penalized state `j` against the two open sites of
    /// bond `b`: the state's bond tensors, conjugated, with both overlap
    /// ladders folded in. The result carries exactly the outer indices of
    /// the bond tensor, all unprimed.
    pub fn window(&self, j: usize, b: usize) -> T {
        let oe = &self.ortho[j];
        let mut ob = oe.state.tensors()[b].conj();
        ob.map_prime_kind(Kind::Link, 0, 1);
        let mut ob1 = oe.state.tensors()[b + 1].conj();
        ob1.map_prime_kind(Kind::Link, 0, 1);
        let mut win = match oe.lr[b].as_ref() {
            Some(l) => l.contract(&ob),
            None => ob,
        };
        win = win.contract(&ob1);
        if let Some(r) = oe.lr[b + 1].as_ref() {
            win = win.contract(r);
        }
        win
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C64;
    use crate::{
        chain::{ Chain, expect },
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

    // n-site identity operator with unit bonds
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

    #[test]
    fn fresh_cache_fills_right_slots() {
        let psi = basis_mps(&[0, 1, 0, 1]);
        let h = identity_mpo(4);
        let env = EnvCache::new(&psi, &h, &[], None, None).unwrap();
        assert_eq!(env.len(), 4);
        assert!(env.left(0).is_none());
        assert!(env.right(0).is_some());
        assert!(env.right(1).is_some());
        assert!(env.right(2).is_none());
    }

    #[test]
    fn folded_columns_reproduce_the_sandwich() {
        let psi = basis_mps(&[0, 1, 1]);
        let h = identity_mpo(3);
        let mut acc: Option<Tensor<C64>> = None;
        for (pk, hk) in psi.tensors().iter().zip(h.tensors()) {
            acc = Some(grow(acc.as_ref(), pk, hk));
        }
        let folded = acc.unwrap().as_scalar().unwrap();
        let direct = expect(&psi, &h, &psi).unwrap();
        assert!((folded - direct).norm() < 1e-12);
    }

    #[test]
    fn update_follows_the_sweep() {
        let psi = basis_mps(&[0, 0, 1, 1]);
        let h = identity_mpo(4);
        let mut env = EnvCache::new(&psi, &h, &[], None, None).unwrap();
        env.update(0, Direction::FromLeft, &psi, &h);
        assert!(env.left(1).is_some());
        env.update(1, Direction::FromLeft, &psi, &h);
        assert!(env.left(2).is_some());
        env.update(2, Direction::FromRight, &psi, &h);
        assert!(env.right(1).is_some());
    }

    #[test]
    fn overlap_window_pairs_with_the_bond_tensor() {
        let psi = basis_mps(&[0, 1, 0]);
        let h = identity_mpo(3);
        let mut env = EnvCache::new(&psi, &h, &[psi.clone()], None, None)
            .unwrap();
        assert_eq!(env.n_ortho(), 1);
        let phi = psi.tensors()[0].contract(&psi.tensors()[1]);
        let win = env.window(0, 0);
        assert_eq!(win.rank(), phi.rank());
        let ov = win.contract(&phi).as_scalar().unwrap();
        assert!((ov - c(1.0)).norm() < 1e-12);
        // advance to bond 1 before asking for its window
        env.update(0, Direction::FromLeft, &psi, &h);
        let phi = psi.tensors()[1].contract(&psi.tensors()[2]);
        let win = env.window(0, 1);
        assert_eq!(win.rank(), phi.rank());
        let ov = win.contract(&phi).as_scalar().unwrap();
        assert!((ov - c(1.0)).norm() < 1e-12);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let psi = basis_mps(&[0, 1]);
        let h = identity_mpo(3);
        assert!(EnvCache::new(&psi, &h, &[], None, None).is_err());
    }
}
