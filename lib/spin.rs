//! Spin-1/2 toolbox: local operator matrices, product and random states,
//! and ready-made chain operators.
//!
//! The local basis is `{0: up, 1: down}` everywhere, and graded indices
//! grade by twice the magnetization, `Qn(+1)` for up and `Qn(-1)` for
//! down, so a dense state and its graded counterpart agree slot for slot.

use ndarray as nd;
use num_complex::Complex64 as C64;
use once_cell::sync::Lazy;
use rand::Rng;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;
use crate::{
    block::BlockTensor,
    chain::{ Chain, ChainError, MPO, MPS },
    index::{ Arrow, Index, Qn, Sector },
    tensor::{ Tensor, TensorError },
};

#[derive(Debug, Error)]
pub enum SpinError {
    /// Returned when a product configuration holds anything but 0 or 1.
    #[error("spin-1/2 configurations are binary, got {0}")]
    BadSpinConfig(usize),

    /// Returned when a random state is requested with no bond capacity.
    #[error("bond dimension must be at least one")]
    ZeroBondDim,

    /// Returned when a coupled-chain operator has nothing to couple.
    #[error("a coupled chain needs at least two sites, got {0}")]
    TooFewSites(usize),

    /// A chain-level failure.
    #[error("chain error: {0}")]
    ChainFailure(#[from] ChainError),

    /// A tensor-level failure.
    #[error("tensor error: {0}")]
    TensorFailure(#[from] TensorError),
}
use SpinError::*;
pub type SpinResult<T> = Result<T, SpinError>;

fn cr(x: f64) -> C64 { C64::new(x, 0.0) }

/// The 2x2 identity.
pub static ID: Lazy<nd::Array2<C64>> = Lazy::new(|| nd::array![
    [cr(1.0), cr(0.0)],
    [cr(0.0), cr(1.0)],
]);

/// `S^z`, diagonal in the up/down basis.
pub static SZ: Lazy<nd::Array2<C64>> = Lazy::new(|| nd::array![
    [cr(0.5), cr(0.0)],
    [cr(0.0), cr(-0.5)],
]);

/// `S^+ = S^x + i S^y`, raising down to up.
pub static SP: Lazy<nd::Array2<C64>> = Lazy::new(|| nd::array![
    [cr(0.0), cr(1.0)],
    [cr(0.0), cr(0.0)],
]);

/// `S^- = S^x - i S^y`, lowering up to down.
pub static SM: Lazy<nd::Array2<C64>> = Lazy::new(|| nd::array![
    [cr(0.0), cr(0.0)],
    [cr(1.0), cr(0.0)],
]);

fn site_sectors() -> Vec<Sector> {
    vec![Sector::new(Qn(1), 1), Sector::new(Qn(-1), 1)]
}

/// A dense spin-1/2 site index.
pub fn spin_half_site<S: Into<String>>(name: S) -> Index {
    Index::site(name, 2)
}

/// A magnetization-graded spin-1/2 site index in ket convention.
pub fn spin_half_site_graded<S: Into<String>>(name: S) -> Index {
    Index::site_graded(name, site_sectors(), Arrow::Out)
}

/// An unentangled state over dense sites, one bit per site.
pub fn product_mps(config: &[usize]) -> SpinResult<MPS<Tensor<C64>>> {
    let n = config.len();
    let mut data: Vec<Tensor<C64>> = Vec::with_capacity(n);
    for (k, &bit) in config.iter().enumerate() {
        if bit > 1 { return Err(BadSpinConfig(bit)); }
        let mut idxs = Vec::new();
        if k > 0 { idxs.push(Index::link(format!("l{}", k - 1), 1)); }
        idxs.push(spin_half_site(format!("s{k}")));
        if k < n - 1 { idxs.push(Index::link(format!("l{k}"), 1)); }
        let t = Tensor::from_fn(idxs, |at| {
            let s = if k == 0 { at[0] } else { at[1] };
            if s == bit { cr(1.0) } else { cr(0.0) }
        })?;
        data.push(t);
    }
    Ok(Chain::from_tensors(data)?)
}

/// The same unentangled state over graded sites, with each bond link
/// carrying the accumulated magnetization charge.
pub fn product_mps_graded(config: &[usize])
    -> SpinResult<MPS<BlockTensor<C64>>>
{
    let n = config.len();
    let mut data: Vec<BlockTensor<C64>> = Vec::with_capacity(n);
    let mut carried = Qn::zero();
    for (k, &bit) in config.iter().enumerate() {
        if bit > 1 { return Err(BadSpinConfig(bit)); }
        let qk = if bit == 0 { Qn(1) } else { Qn(-1) };
        let prev = carried;
        carried = carried - qk;
        let mut idxs = Vec::new();
        let mut key = Vec::new();
        if k > 0 {
            idxs.push(Index::link_graded(
                format!("l{}", k - 1),
                vec![Sector::new(prev, 1)],
                Arrow::In,
            ));
            key.push(0);
        }
        idxs.push(spin_half_site_graded(format!("s{k}")));
        key.push(bit);
        if k < n - 1 {
            idxs.push(Index::link_graded(
                format!("l{k}"),
                vec![Sector::new(carried, 1)],
                Arrow::Out,
            ));
            key.push(0);
        }
        let rank = idxs.len();
        let block =
            nd::ArrayD::from_elem(nd::IxDyn(&vec![1; rank]), cr(1.0));
        data.push(BlockTensor::from_blocks(idxs, [(key, block)])?);
    }
    Ok(Chain::from_tensors(data)?)
}

fn neel_bits(n: usize) -> Vec<usize> {
    (0..n).map(|k| k % 2).collect()
}

/// The alternating up/down product state.
pub fn neel_mps(n: usize) -> SpinResult<MPS<Tensor<C64>>> {
    product_mps(&neel_bits(n))
}

/// The alternating product state over graded sites.
pub fn neel_mps_graded(n: usize) -> SpinResult<MPS<BlockTensor<C64>>> {
    product_mps_graded(&neel_bits(n))
}

/// A dense state with uniform bond dimension `m` and entries drawn from
/// the unit square. Not normalized.
pub fn random_mps<R>(n: usize, m: usize, rng: &mut R)
    -> SpinResult<MPS<Tensor<C64>>>
where R: Rng + ?Sized
{
    if m == 0 { return Err(ZeroBondDim); }
    let mut data: Vec<Tensor<C64>> = Vec::with_capacity(n);
    for k in 0..n {
        let mut idxs = Vec::new();
        if k > 0 { idxs.push(Index::link(format!("l{}", k - 1), m)); }
        idxs.push(spin_half_site(format!("s{k}")));
        if k < n - 1 { idxs.push(Index::link(format!("l{k}"), m)); }
        data.push(Tensor::random(idxs, rng)?);
    }
    Ok(Chain::from_tensors(data)?)
}

// the five-channel nearest-neighbor Heisenberg row, indexed
// (left channel, right channel)
fn wterm(a: usize, b: usize) -> Option<(f64, &'static nd::Array2<C64>)> {
    match (a, b) {
        (0, 0) | (4, 4) => Some((1.0, &*ID)),
        (1, 0) => Some((1.0, &*SP)),
        (2, 0) => Some((1.0, &*SM)),
        (3, 0) | (4, 3) => Some((1.0, &*SZ)),
        (4, 1) => Some((0.5, &*SM)),
        (4, 2) => Some((0.5, &*SP)),
        _ => None,
    }
}

/// Antiferromagnetic Heisenberg chain
/// `H = sum_k [Sz_k Sz_{k+1} + (S+_k S-_{k+1} + S-_k S+_{k+1}) / 2]`
/// as a five-channel MPO with the edge rows folded in.
pub fn heisenberg_mpo(n: usize) -> SpinResult<MPO<Tensor<C64>>> {
    if n < 2 { return Err(TooFewSites(n)); }
    let mut data: Vec<Tensor<C64>> = Vec::with_capacity(n);
    for k in 0..n {
        let s = spin_half_site(format!("s{k}"));
        let mut idxs = Vec::new();
        if k > 0 { idxs.push(Index::link(format!("m{}", k - 1), 5)); }
        idxs.push(s.clone());
        idxs.push(s.primed());
        if k < n - 1 { idxs.push(Index::link(format!("m{k}"), 5)); }
        let t = Tensor::from_fn(idxs, |at| {
            let (a, s_in, s_out, b) =
                if k == 0 { (4, at[0], at[1], at[2]) }
                else if k == n - 1 { (at[0], at[1], at[2], 0) }
                else { (at[0], at[1], at[2], at[3]) };
            wterm(a, b)
                .map(|(w, m)| cr(w) * m[[s_out, s_in]])
                .unwrap_or_else(|| cr(0.0))
        })?;
        data.push(t);
    }
    Ok(Chain::from_tensors(data)?)
}

// channel charges making every graded row tensor divergence-free:
// the raising channel owes +2, the lowering channel -2
fn mpo_link_sectors() -> Vec<Sector> {
    vec![
        Sector::new(Qn(0), 1),
        Sector::new(Qn(2), 1),
        Sector::new(Qn(-2), 1),
        Sector::new(Qn(0), 1),
        Sector::new(Qn(0), 1),
    ]
}

/// The same Heisenberg MPO over magnetization-graded indices.
pub fn heisenberg_mpo_graded(n: usize)
    -> SpinResult<MPO<BlockTensor<C64>>>
{
    if n < 2 { return Err(TooFewSites(n)); }
    let mut data: Vec<BlockTensor<C64>> = Vec::with_capacity(n);
    for k in 0..n {
        let s_in =
            Index::site_graded(format!("s{k}"), site_sectors(), Arrow::In);
        let s_out =
            Index::site_graded(format!("s{k}"), site_sectors(), Arrow::Out)
                .primed();
        let mut idxs = Vec::new();
        if k > 0 {
            idxs.push(Index::link_graded(
                format!("m{}", k - 1),
                mpo_link_sectors(),
                Arrow::In,
            ));
        }
        idxs.push(s_in);
        idxs.push(s_out);
        if k < n - 1 {
            idxs.push(Index::link_graded(
                format!("m{k}"),
                mpo_link_sectors(),
                Arrow::Out,
            ));
        }
        let mut blocks: HashMap<Vec<usize>, nd::ArrayD<C64>> =
            HashMap::default();
        for a in 0..5 {
            for b in 0..5 {
                // the edge tensors pin the start and stop channels
                if (k == 0 && a != 4) || (k == n - 1 && b != 0) { continue; }
                let Some((w, m)) = wterm(a, b) else { continue; };
                for s in 0..2 {
                    for sp in 0..2 {
                        let z = cr(w) * m[[sp, s]];
                        if z.norm() == 0.0 { continue; }
                        let mut key = Vec::new();
                        if k > 0 { key.push(a); }
                        key.push(s);
                        key.push(sp);
                        if k < n - 1 { key.push(b); }
                        let rank = key.len();
                        let block = nd::ArrayD::from_elem(
                            nd::IxDyn(&vec![1; rank]),
                            z,
                        );
                        blocks.insert(key, block);
                    }
                }
            }
        }
        data.push(BlockTensor::from_blocks(idxs, blocks)?);
    }
    Ok(Chain::from_tensors(data)?)
}

/// The identity operator with unit bonds.
pub fn identity_mpo(n: usize) -> SpinResult<MPO<Tensor<C64>>> {
    let mut data: Vec<Tensor<C64>> = Vec::with_capacity(n);
    for k in 0..n {
        let s = spin_half_site(format!("s{k}"));
        let mut idxs = Vec::new();
        if k > 0 { idxs.push(Index::link(format!("m{}", k - 1), 1)); }
        idxs.push(s.clone());
        idxs.push(s.primed());
        if k < n - 1 { idxs.push(Index::link(format!("m{k}"), 1)); }
        let t = Tensor::from_fn(idxs, |at| {
            let (a, b) = if k == 0 { (at[0], at[1]) } else { (at[1], at[2]) };
            if a == b { cr(1.0) } else { cr(0.0) }
        })?;
        data.push(t);
    }
    Ok(Chain::from_tensors(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ SeedableRng, rngs::StdRng };
    use crate::{
        chain::{ apply_mpo, expect_re, inner, inner_re },
        svd::TruncSpec,
    };

    #[test]
    fn operator_matrices_obey_the_algebra() {
        assert_eq!(SZ[[0, 0]], cr(0.5));
        assert_eq!(SZ[[1, 1]], cr(-0.5));
        assert_eq!(SP[[0, 1]], cr(1.0));
        assert_eq!(SM[[1, 0]], cr(1.0));
        // [S+, S-] = 2 Sz
        let comm = SP.dot(&*SM) - SM.dot(&*SP);
        let two_sz = SZ.mapv(|z| 2.0 * z);
        assert_eq!(comm, two_sz);
    }

    #[test]
    fn product_states_are_unit_and_orthogonal() {
        let a = product_mps(&[0, 1, 0]).unwrap();
        let b = product_mps(&[0, 1, 1]).unwrap();
        assert!((a.norm().unwrap() - 1.0).abs() < 1e-12);
        assert!(inner(&a, &b).unwrap().norm() < 1e-12);
        let neel = neel_mps(4).unwrap();
        let same = product_mps(&[0, 1, 0, 1]).unwrap();
        assert!((inner(&neel, &same).unwrap() - cr(1.0)).norm() < 1e-12);
        assert!(product_mps(&[0, 2]).is_err());
    }

    #[test]
    fn heisenberg_sandwich_matches_hand_values() {
        let h = heisenberg_mpo(2).unwrap();
        let neel = neel_mps(2).unwrap();
        assert!((expect_re(&neel, &h, &neel).unwrap() + 0.25).abs() < 1e-12);
        let h = heisenberg_mpo(4).unwrap();
        let neel = neel_mps(4).unwrap();
        assert!((expect_re(&neel, &h, &neel).unwrap() + 0.75).abs() < 1e-12);
        let up = product_mps(&[0, 0, 0, 0]).unwrap();
        assert!((expect_re(&up, &h, &up).unwrap() - 0.75).abs() < 1e-12);
        assert!(heisenberg_mpo(1).is_err());
    }

    #[test]
    fn graded_and_dense_sandwiches_agree() {
        let hd = heisenberg_mpo(4).unwrap();
        let nl = neel_mps(4).unwrap();
        let dense = expect_re(&nl, &hd, &nl).unwrap();
        let hg = heisenberg_mpo_graded(4).unwrap();
        let ng = neel_mps_graded(4).unwrap();
        assert!((inner_re(&ng, &ng).unwrap() - 1.0).abs() < 1e-12);
        let graded = expect_re(&ng, &hg, &ng).unwrap();
        assert!((dense - graded).abs() < 1e-12);
        assert!((graded + 0.75).abs() < 1e-12);
    }

    #[test]
    fn applied_operator_has_the_right_norm() {
        // H |01> = -1/4 |01> + 1/2 |10>
        let h = heisenberg_mpo(2).unwrap();
        let neel = neel_mps(2).unwrap();
        let hpsi = apply_mpo(&h, &neel, &TruncSpec::exact()).unwrap();
        let n2 = inner_re(&hpsi, &hpsi).unwrap();
        assert!((n2 - 0.3125).abs() < 1e-12);
        let hg = heisenberg_mpo_graded(2).unwrap();
        let ng = neel_mps_graded(2).unwrap();
        let hpsi = apply_mpo(&hg, &ng, &TruncSpec::exact()).unwrap();
        let n2 = inner_re(&hpsi, &hpsi).unwrap();
        assert!((n2 - 0.3125).abs() < 1e-12);
    }

    #[test]
    fn random_states_regauge_to_unit_norm() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut psi = random_mps(5, 4, &mut rng).unwrap();
        psi.normalize().unwrap();
        psi.orthogonalize(&TruncSpec::exact()).unwrap();
        assert_eq!(psi.ortho_center(), Some(0));
        assert!((psi.norm().unwrap() - 1.0).abs() < 1e-10);
        assert!(random_mps(3, 0, &mut rng).is_err());
    }

    #[test]
    fn identity_operator_is_transparent() {
        let id = identity_mpo(3).unwrap();
        let psi = product_mps(&[1, 0, 1]).unwrap();
        assert!((expect_re(&psi, &id, &psi).unwrap() - 1.0).abs() < 1e-12);
    }
}
