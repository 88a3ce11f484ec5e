//! Ground state of the open antiferromagnetic Heisenberg chain.
//!
//! Run with `cargo run --release --example heisenberg`.

use dmrg_net::{
    dmrg::{ DmrgOpts, dmrg },
    spin::{ heisenberg_mpo, neel_mps },
    sweep::{ SweepParams, Sweeps },
};

const N: usize = 16;

fn main() {
    let h = heisenberg_mpo(N).unwrap();
    let mut psi = neel_mps(N).unwrap();

    let rows: Vec<SweepParams<f64>> =
        [10, 20, 50, 100]
        .into_iter()
        .map(|maxm| SweepParams { cutoff: 1e-10, minm: 1, maxm, niter: 4 })
        .collect();
    let sweeps = Sweeps::from_table(12, rows).unwrap();
    let opts = DmrgOpts {
        errgoal: Some(1e-10),
        ..DmrgOpts::default()
    };

    let report = dmrg(&mut psi, &h, &sweeps, &opts).unwrap();
    println!("E0 = {:.12}", report.energy);
    println!("E0 / N = {:.12}", report.energy / N as f64);
    println!("sweeps run: {}", report.sweeps_run);
}
