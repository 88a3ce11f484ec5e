//! Two-site density-matrix renormalization group over a chain operator.
//!
//! Each sweep walks the zig-zag bond path: at every bond the two site
//! tensors are fused, the effective operator assembled from cached
//! environments is handed to the Lanczos solver with the fused tensor as a
//! warm start, and the improved bond tensor is factorized back under the
//! sweep's truncation window. Environments advance one column per step.
//!
//! `dmrg` targets the ground state; `dmrg_orth` additionally penalizes
//! overlap with previously found states, pushing the search into the
//! orthogonal complement to reach excited states.

use std::fmt;
use ndarray as nd;
use ndarray_linalg::Eigh;
use num_traits::{ Float, One, Zero };
use thiserror::Error;
use crate::{
    chain::{ ChainError, MPO, MPS },
    env::{ EnvCache, EnvError },
    lanczos::lanczos,
    localop::LocalOp,
    svd::TruncSpec,
    sweep::{ SweepError, Sweeps, sweep_path },
    tensor::{ RealOf, TensorAlg, TensorError },
};

#[derive(Debug, Error)]
pub enum DmrgError {
    /// A chain-level failure.
    #[error("chain error: {0}")]
    ChainFailure(#[from] ChainError),

    /// An environment-cache failure.
    #[error("environment error: {0}")]
    EnvFailure(#[from] EnvError),

    /// A sweep-schedule failure.
    #[error("sweep error: {0}")]
    SweepFailure(#[from] SweepError),

    /// A tensor-level failure.
    #[error("tensor error: {0}")]
    TensorFailure(#[from] TensorError),
}
pub type DmrgResult<T> = Result<T, DmrgError>;

/// Driver options.
///
/// `errgoal` ends the run early once the energy change between sweeps
/// drops below it, checked after every even sweep (1-based) so each check
/// sees one full left-right round trip. Boundary tensors seed the two end
/// environment slots for setups where the chain continues beyond the
/// window.
#[derive(Clone)]
pub struct DmrgOpts<T: TensorAlg> {
    /// Suppress the per-sweep report lines.
    pub quiet: bool,
    /// Early-exit threshold on the energy change between sweeps.
    pub errgoal: Option<RealOf<T>>,
    /// Penalty weight for `dmrg_orth`; must exceed the gap to push a
    /// penalized state above the target.
    pub orth_weight: RealOf<T>,
    /// Left boundary environment seed.
    pub ledge: Option<T>,
    /// Right boundary environment seed.
    pub redge: Option<T>,
}

// a derive would bound `T: Debug` but not `RealOf<T>: Debug`
impl<T> fmt::Debug for DmrgOpts<T>
where
    T: TensorAlg,
    RealOf<T>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DmrgOpts")
            .field("quiet", &self.quiet)
            .field("errgoal", &self.errgoal)
            .field("orth_weight", &self.orth_weight)
            .field("ledge", &self.ledge)
            .field("redge", &self.redge)
            .finish()
    }
}

impl<T: TensorAlg> Default for DmrgOpts<T> {
    fn default() -> Self {
        Self {
            quiet: false,
            errgoal: None,
            orth_weight: RealOf::<T>::one(),
            ledge: None,
            redge: None,
        }
    }
}

/// What a run did, sweep by sweep.
#[derive(Clone, Debug)]
pub struct DmrgReport<R> {
    /// Energy after the final sweep.
    pub energy: R,
    /// Energy after each sweep.
    pub sweep_energies: Vec<R>,
    /// Largest bond dimension kept in each sweep.
    pub sweep_maxm: Vec<usize>,
    /// Worst relative truncation error in each sweep.
    pub sweep_truncerr: Vec<R>,
    /// Sweeps actually run, counting early exit.
    pub sweeps_run: usize,
}

/// Ground-state search: sweep `psi` against `h` under the given schedule.
///
/// `psi` is re-gauged to site 0 and normalized before the first sweep and
/// left normalized with its center at site 0 afterwards.
pub fn dmrg<T>(
    psi: &mut MPS<T>,
    h: &MPO<T>,
    sweeps: &Sweeps<RealOf<T>>,
    opts: &DmrgOpts<T>,
) -> DmrgResult<DmrgReport<RealOf<T>>>
where
    T: TensorAlg,
    RealOf<T>: fmt::LowerExp,
    nd::Array2<RealOf<T>>: Eigh<
        EigVal = nd::Array1<RealOf<T>>,
        EigVec = nd::Array2<RealOf<T>>,
    >,
{
    dmrg_orth(psi, h, &[], sweeps, opts)
}

/// Like [`dmrg`], but penalizing overlap with each state in `orthos` by
/// `opts.orth_weight`, so repeated runs climb the spectrum.
pub fn dmrg_orth<T>(
    psi: &mut MPS<T>,
    h: &MPO<T>,
    orthos: &[MPS<T>],
    sweeps: &Sweeps<RealOf<T>>,
    opts: &DmrgOpts<T>,
) -> DmrgResult<DmrgReport<RealOf<T>>>
where
    T: TensorAlg,
    RealOf<T>: fmt::LowerExp,
    nd::Array2<RealOf<T>>: Eigh<
        EigVal = nd::Array1<RealOf<T>>,
        EigVec = nd::Array2<RealOf<T>>,
    >,
{
    let n = psi.len();
    psi.position(0, &TruncSpec::exact())?;
    psi.normalize()?;
    let mut env = EnvCache::new(
        psi,
        h,
        orthos,
        opts.ledge.clone(),
        opts.redge.clone(),
    )?;
    let mut report = DmrgReport {
        energy: RealOf::<T>::zero(),
        sweep_energies: Vec::with_capacity(sweeps.n()),
        sweep_maxm: Vec::with_capacity(sweeps.n()),
        sweep_truncerr: Vec::with_capacity(sweeps.n()),
        sweeps_run: 0,
    };
    let mut last_energy: Option<RealOf<T>> = None;
    let mut energy = RealOf::<T>::zero();
    for (isw, params) in sweeps.iter().enumerate() {
        let spec = params.trunc();
        let mut max_m = 0_usize;
        let mut worst_err = RealOf::<T>::zero();
        for (b, dir) in sweep_path(n) {
            let phi = psi.site(b)?.contract(psi.site(b + 1)?);
            let mut op = LocalOp::new(
                env.left(b),
                env.right(b),
                &h.tensors()[b],
                &h.tensors()[b + 1],
            );
            if env.n_ortho() > 0 {
                let wins: Vec<T> =
                    (0..env.n_ortho()).map(|j| env.window(j, b)).collect();
                op = op.with_penalty(opts.orth_weight, wins);
            }
            let (e, ground) = lanczos(|v| op.apply(v), &phi, params.niter);
            energy = e;
            let spectrum = psi.svd_bond(b, &ground, &spec, dir)?;
            if spectrum.m() == 0 {
                // the cached environments no longer describe `psi`; stop
                // rather than sweep on against them
                eprintln!(
                    "dmrg: factorization at bond {b} ({dir}) vanished; \
                     stopping",
                );
                report.energy = energy;
                return Ok(report);
            }
            max_m = max_m.max(spectrum.m());
            worst_err = Float::max(worst_err, spectrum.truncerr());
            env.update(b, dir, psi, h);
        }
        psi.normalize()?;
        report.sweep_energies.push(energy);
        report.sweep_maxm.push(max_m);
        report.sweep_truncerr.push(worst_err);
        report.sweeps_run = isw + 1;
        if !opts.quiet {
            println!(
                "sweep {} energy {:.10e} maxm {} truncerr {:.2e}",
                isw + 1, energy, max_m, worst_err,
            );
        }
        if (isw + 1) % 2 == 0 {
            if let (Some(goal), Some(prev)) = (opts.errgoal, last_energy) {
                if Float::abs(energy - prev) < goal {
                    if !opts.quiet {
                        println!("dmrg: converged after {} sweeps", isw + 1);
                    }
                    break;
                }
            }
        }
        last_energy = Some(energy);
    }
    report.energy = energy;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C64;
    use crate::{
        block::BlockTensor,
        chain::inner,
        spin::{
            heisenberg_mpo, heisenberg_mpo_graded, identity_mpo, neel_mps,
            neel_mps_graded, product_mps,
        },
        sweep::SweepParams,
        tensor::Tensor,
    };

    // open four-site Heisenberg chain, exactly -(3 + 2 sqrt(3))/4
    const E0_4: f64 = -1.616_025_403_784_438_7;

    fn schedule(nsweeps: usize) -> Sweeps<f64> {
        Sweeps::uniform(
            nsweeps,
            SweepParams { cutoff: 1e-12, minm: 1, maxm: 16, niter: 4 },
        ).unwrap()
    }

    fn quiet_opts<T: TensorAlg>() -> DmrgOpts<T> {
        DmrgOpts { quiet: true, ..DmrgOpts::default() }
    }

    #[test]
    fn four_site_ground_state_dense() {
        let h = heisenberg_mpo(4).unwrap();
        let mut psi = neel_mps(4).unwrap();
        let opts = DmrgOpts::<Tensor<C64>> {
            errgoal: Some(1e-9),
            ..quiet_opts()
        };
        let report = dmrg(&mut psi, &h, &schedule(20), &opts).unwrap();
        assert!((report.energy - E0_4).abs() < 1e-6);
        assert!(report.sweeps_run < 20);
        assert!((psi.norm().unwrap() - 1.0).abs() < 1e-8);
    }

    #[test]
    fn four_site_ground_state_graded() {
        let h = heisenberg_mpo_graded(4).unwrap();
        let mut psi = neel_mps_graded(4).unwrap();
        let opts = DmrgOpts::<BlockTensor<C64>> {
            errgoal: Some(1e-9),
            ..quiet_opts()
        };
        let report = dmrg(&mut psi, &h, &schedule(20), &opts).unwrap();
        assert!((report.energy - E0_4).abs() < 1e-6);
    }

    #[test]
    fn identity_operator_pins_energy_at_one() {
        let h = identity_mpo(4).unwrap();
        let mut psi = neel_mps(4).unwrap();
        let report =
            dmrg(&mut psi, &h, &schedule(2), &quiet_opts()).unwrap();
        assert!((report.energy - 1.0).abs() < 1e-10);
    }

    #[test]
    fn sweep_energies_do_not_climb() {
        let h = heisenberg_mpo(6).unwrap();
        let mut psi = neel_mps(6).unwrap();
        let report =
            dmrg(&mut psi, &h, &schedule(6), &quiet_opts()).unwrap();
        for pair in report.sweep_energies.windows(2) {
            assert!(pair[1] <= pair[0] + 1e-8);
        }
        assert_eq!(report.sweep_energies.len(), report.sweeps_run);
        assert_eq!(report.sweep_maxm.len(), report.sweeps_run);
    }

    #[test]
    fn penalized_run_finds_an_orthogonal_state() {
        let h = heisenberg_mpo(4).unwrap();
        let mut ground = neel_mps(4).unwrap();
        let opts = DmrgOpts::<Tensor<C64>> {
            errgoal: Some(1e-10),
            ..quiet_opts()
        };
        let report0 = dmrg(&mut ground, &h, &schedule(20), &opts).unwrap();
        let mut excited = product_mps(&[0, 0, 1, 1]).unwrap();
        let opts = DmrgOpts::<Tensor<C64>> {
            errgoal: Some(1e-10),
            orth_weight: 2.0,
            ..quiet_opts()
        };
        let report1 = dmrg_orth(
            &mut excited, &h, &[ground.clone()], &schedule(24), &opts,
        ).unwrap();
        assert!(report1.energy > report0.energy + 1e-3);
        assert!(report1.energy < 0.0);
        let ov = inner(&ground, &excited).unwrap();
        assert!(ov.norm() < 1e-6);
    }

    #[test]
    fn vanished_factorization_ends_the_run() {
        let h = heisenberg_mpo(3).unwrap();
        let mut psi = product_mps(&[0, 1, 0]).unwrap();
        let dead =
            Tensor::zeros(psi.tensors()[1].indices().to_vec()).unwrap();
        psi.set_site(1, dead).unwrap();
        let report =
            dmrg(&mut psi, &h, &schedule(3), &quiet_opts()).unwrap();
        assert_eq!(report.sweeps_run, 0);
        assert!(report.sweep_energies.is_empty());
        assert_eq!(report.energy, 0.0);
    }

    #[test]
    fn single_site_chains_are_rejected() {
        let h = identity_mpo(1).unwrap();
        let mut psi = product_mps(&[0]).unwrap();
        assert!(
            dmrg(&mut psi, &h, &schedule(2), &quiet_opts()).is_err()
        );
    }

    #[test]
    fn options_debug_covers_every_field() {
        let dump = format!("{:?}", DmrgOpts::<Tensor<C64>>::default());
        for field in ["quiet", "errgoal", "orth_weight", "ledge", "redge"] {
            assert!(dump.contains(field));
        }
    }
}
