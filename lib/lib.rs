//! Tools for computing ground and low-lying excited states of
//! one-dimensional quantum lattice models with the density-matrix
//! renormalization group on matrix-product chains.

use num_complex::{ Complex, ComplexFloat };
use num_traits::{ Float, Zero };

pub mod index;
pub mod scale;
pub mod svd;

pub mod tensor;
pub mod block;

pub mod chain;
pub mod env;
pub mod localop;
pub mod lanczos;
pub mod sweep;
pub mod dmrg;

pub mod spin;

/// Extension trait for [`ComplexFloat`].
pub trait ComplexFloatExt: ComplexFloat {
    /// Convert from `Self::Real`.
    ///
    /// Should adhere to the usual relationship between ordinary complex and
    /// real numbers, i.e. the result should have imaginary part equal to zero.
    fn from_real(x: Self::Real) -> Self;

    /// Construct from real and imaginary components.
    fn from_components(re: Self::Real, im: Self::Real) -> Self;
}

impl<T> ComplexFloatExt for Complex<T>
where
    Complex<T>: ComplexFloat<Real = T>,
    T: Zero + Float,
{
    fn from_real(x: Self::Real) -> Self {
        Self { re: x, im: <Self::Real as Zero>::zero() }
    }

    fn from_components(re: Self::Real, im: Self::Real) -> Self {
        Self { re, im }
    }
}
