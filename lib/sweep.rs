//! Sweep schedules: per-sweep truncation and solver settings, plus the
//! zig-zag bond path a single sweep walks.

use num_traits::Float;
use thiserror::Error;
use crate::svd::{ Direction, TruncSpec };

#[derive(Debug, Error)]
pub enum SweepError {
    /// Returned when a schedule has no parameter rows.
    #[error("sweep table holds no rows")]
    EmptyTable,

    /// Returned when a schedule would run zero sweeps.
    #[error("sweep count must be at least one")]
    ZeroSweeps,
}
use SweepError::*;
pub type SweepResult<T> = Result<T, SweepError>;

/// Knobs for a single sweep: truncation window and eigensolver effort.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepParams<R> {
    /// Relative spectral weight to discard at each bond.
    pub cutoff: R,
    /// Keep at least this many singular values.
    pub minm: usize,
    /// Keep at most this many singular values.
    pub maxm: usize,
    /// Lanczos applications per bond.
    pub niter: usize,
}

impl<R: Float> SweepParams<R> {
    /// The truncation window as a bond factorization spec.
    pub fn trunc(&self) -> TruncSpec<R> {
        TruncSpec {
            cutoff: self.cutoff,
            minm: self.minm,
            maxm: self.maxm,
        }
    }
}

/// A schedule of sweeps. Rows beyond the table repeat the last row, so a
/// short table ramps up and then holds.
#[derive(Clone, Debug)]
pub struct Sweeps<R> {
    count: usize,
    rows: Vec<SweepParams<R>>,
}

impl<R: Float> Sweeps<R> {
    /// Schedule `count` sweeps over a table of parameter rows.
    pub fn from_table(count: usize, rows: Vec<SweepParams<R>>)
        -> SweepResult<Self>
    {
        if rows.is_empty() { return Err(EmptyTable); }
        if count == 0 { return Err(ZeroSweeps); }
        Ok(Self { count, rows })
    }

    /// Schedule `count` identical sweeps.
    pub fn uniform(count: usize, params: SweepParams<R>)
        -> SweepResult<Self>
    {
        Self::from_table(count, vec![params])
    }

    /// Number of sweeps to run.
    #[inline]
    pub fn n(&self) -> usize { self.count }

    /// Parameters for sweep `i`, with the last table row repeating.
    pub fn row(&self, i: usize) -> &SweepParams<R> {
        &self.rows[i.min(self.rows.len() - 1)]
    }

    /// All scheduled sweeps in order.
    pub fn iter(&self) -> impl Iterator<Item = &SweepParams<R>> + '_ {
        (0..self.count).map(|i| self.row(i))
    }
}

/// The bond path of one full sweep over `n` sites: every bond left to
/// right, then the same bonds right to left, turning around on the last
/// bond. Fewer than two sites leaves nothing to walk.
pub fn sweep_path(n: usize) -> Vec<(usize, Direction)> {
    if n < 2 { return Vec::new(); }
    let mut path: Vec<(usize, Direction)> = Vec::with_capacity(2 * (n - 1));
    for b in 0..=n - 2 { path.push((b, Direction::FromLeft)); }
    for b in (0..=n - 2).rev() { path.push((b, Direction::FromRight)); }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svd::Direction::*;

    fn p(maxm: usize) -> SweepParams<f64> {
        SweepParams { cutoff: 1e-10, minm: 1, maxm, niter: 3 }
    }

    #[test]
    fn last_row_repeats() {
        let sw = Sweeps::from_table(5, vec![p(4), p(8), p(16)]).unwrap();
        assert_eq!(sw.n(), 5);
        let maxms: Vec<usize> = sw.iter().map(|r| r.maxm).collect();
        assert_eq!(maxms, vec![4, 8, 16, 16, 16]);
    }

    #[test]
    fn uniform_holds_steady() {
        let sw = Sweeps::uniform(3, p(10)).unwrap();
        assert!(sw.iter().all(|r| *r == p(10)));
    }

    #[test]
    fn degenerate_schedules_are_rejected() {
        assert!(Sweeps::<f64>::from_table(3, Vec::new()).is_err());
        assert!(Sweeps::from_table(0, vec![p(4)]).is_err());
    }

    #[test]
    fn params_map_onto_a_trunc_spec() {
        let t = p(8).trunc();
        assert_eq!(t.cutoff, 1e-10);
        assert_eq!(t.minm, 1);
        assert_eq!(t.maxm, 8);
    }

    #[test]
    fn path_zigzags_and_turns_on_the_last_bond() {
        assert_eq!(
            sweep_path(4),
            vec![
                (0, FromLeft), (1, FromLeft), (2, FromLeft),
                (2, FromRight), (1, FromRight), (0, FromRight),
            ],
        );
        assert_eq!(sweep_path(2), vec![(0, FromLeft), (0, FromRight)]);
        assert!(sweep_path(1).is_empty());
    }
}
