//! Matrix-free Lanczos ground-state solver.
//!
//! Builds a Krylov basis from repeated application of a Hermitian operator,
//! reorthogonalizing each new vector against the whole basis, then solves
//! the small tridiagonal problem and assembles the Ritz pair. The caller
//! supplies the operator as a closure and a warm-start vector; the basis
//! never grows past the dimension of the space.
//!
//! The iteration budget is exhausted silently, returning the best Ritz
//! pair found so far. A vanishing recurrence residual means the Krylov
//! space closed early and is also an exit, not an error.

use ndarray as nd;
use ndarray_linalg::{ Eigh, UPLO };
use num_complex::ComplexFloat;
use num_traits::{ Float, One, Zero };
use crate::tensor::{ RealOf, TensorAlg };

fn braket<T: TensorAlg>(a: &T, b: &T) -> T::Elem {
    let Ok(z) = a.dot(b) else { unreachable!() };
    z
}

/// Lowest Ritz pair of a Hermitian operator, reached from `start` in at
/// most `niter` applications of `apply`.
///
/// A vanishing `start` is returned unchanged with eigenvalue zero.
pub fn lanczos<T, F>(apply: F, start: &T, niter: usize) -> (RealOf<T>, T)
where
    T: TensorAlg,
    F: Fn(&T) -> T,
    nd::Array2<RealOf<T>>: Eigh<
        EigVal = nd::Array1<RealOf<T>>,
        EigVec = nd::Array2<RealOf<T>>,
    >,
{
    let nrm0 = start.norm();
    if nrm0.is_zero() { return (RealOf::<T>::zero(), start.clone()); }
    let mut v0 = start.clone();
    v0.scale_by_real(Float::recip(nrm0));
    let cap = niter.max(1).min(start.total_dim());
    let mut vs: Vec<T> = vec![v0];
    let mut alphas: Vec<RealOf<T>> = Vec::new();
    let mut betas: Vec<RealOf<T>> = Vec::new();
    for j in 0.. {
        let mut w = apply(&vs[j]);
        alphas.push(braket(&vs[j], &w).re());
        if alphas.len() == cap { break; }
        // one full reorthogonalization pass subsumes the three-term
        // recurrence
        for vi in vs.iter() {
            let ov = braket(vi, &w);
            let mut sub = vi.clone();
            sub.scale_by(-ov);
            let Ok(next) = w.add(&sub) else { unreachable!() };
            w = next;
        }
        let beta = w.norm();
        let scale_est = alphas.iter()
            .fold(RealOf::<T>::one(), |m, a| Float::max(m, Float::abs(*a)));
        if beta <= Float::sqrt(RealOf::<T>::epsilon()) * scale_est {
            // the Krylov space closed on an invariant subspace
            break;
        }
        w.scale_by_real(Float::recip(beta));
        betas.push(beta);
        vs.push(w);
    }
    let k = alphas.len();
    let mut tri = nd::Array2::<RealOf<T>>::zeros((k, k));
    for (i, a) in alphas.iter().enumerate() { tri[[i, i]] = *a; }
    for (i, b) in betas.iter().enumerate() { tri[[i + 1, i]] = *b; }
    let (evals, evecs) = tri.eigh(UPLO::Lower).unwrap();
    let mut x = vs[0].clone();
    x.scale_by_real(evecs[[0, 0]]);
    for (i, vi) in vs.iter().enumerate().skip(1) {
        let mut term = vi.clone();
        term.scale_by_real(evecs[[i, 0]]);
        let Ok(next) = x.add(&term) else { unreachable!() };
        x = next;
    }
    (evals[0], x)
}
