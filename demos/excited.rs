//! Ground and first excited state of a short Heisenberg chain, with the
//! excited state found by penalizing overlap with the ground state.
//!
//! Run with `cargo run --release --example excited`.

use num_complex::ComplexFloat;
use rand::{ SeedableRng, rngs::StdRng };
use dmrg_net::{
    chain::inner,
    dmrg::{ DmrgOpts, dmrg, dmrg_orth },
    spin::{ heisenberg_mpo, neel_mps, random_mps },
    sweep::{ SweepParams, Sweeps },
};

const N: usize = 8;

fn main() {
    let h = heisenberg_mpo(N).unwrap();
    let params = SweepParams { cutoff: 1e-12, minm: 1, maxm: 64, niter: 4 };
    let sweeps = Sweeps::uniform(10, params).unwrap();
    let opts = DmrgOpts {
        quiet: true,
        errgoal: Some(1e-11),
        ..DmrgOpts::default()
    };

    let mut ground = neel_mps(N).unwrap();
    let report0 = dmrg(&mut ground, &h, &sweeps, &opts).unwrap();

    let mut rng = StdRng::seed_from_u64(10);
    let mut excited = random_mps(N, 8, &mut rng).unwrap();
    let opts1 = DmrgOpts { orth_weight: 10.0, ..opts };
    let report1 =
        dmrg_orth(&mut excited, &h, &[ground.clone()], &sweeps, &opts1)
        .unwrap();

    let overlap = inner(&ground, &excited).unwrap();
    println!("E0 = {:.10}", report0.energy);
    println!("E1 = {:.10}", report1.energy);
    println!("gap = {:.10}", report1.energy - report0.energy);
    println!("|<0|1>| = {:.3e}", overlap.abs());
}
