//! Named, primeable tensor indices, optionally graded by a conserved charge.
//!
//! An [`Index`] identifies one axis of a tensor. Identity is structural: two
//! indices refer to the same axis if and only if their names and prime levels
//! agree. Everything else an index carries — its [`Kind`], its [`Space`] — is
//! payload that must be *consistent* between two occurrences of the same
//! index, but plays no part in identity. Consistency is checked by assertions
//! at contraction sites rather than by `Result`s, since a mismatch there is
//! always a programming error.
//!
//! Graded indices partition their dimension into charge [`Sector`]s and carry
//! an [`Arrow`] giving the direction in which charge flows through the axis.
//! A valid contraction joins an `Out` occurrence to an `In` occurrence with
//! identical sector lists.

use std::{
    fmt,
    ops::{ Add, AddAssign, Neg, Sub, SubAssign },
};

/// Physical or virtual character of an index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A physical degree of freedom on one lattice site.
    Site,
    /// A virtual degree of freedom on a bond between sites.
    Link,
}

/// Direction of charge flow through a graded index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arrow {
    /// Charge flows into the tensor.
    In,
    /// Charge flows out of the tensor.
    Out,
}

impl Arrow {
    /// Return the opposite direction.
    #[inline]
    pub fn rev(self) -> Self {
        match self {
            Self::In => Self::Out,
            Self::Out => Self::In,
        }
    }

    /// `+1` for [`Out`][Self::Out], `-1` for [`In`][Self::In].
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Self::In => -1,
            Self::Out => 1,
        }
    }
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "In"),
            Self::Out => write!(f, "Out"),
        }
    }
}

/// An additive conserved charge.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Qn(pub i32);

impl Qn {
    /// The zero charge.
    #[inline]
    pub fn zero() -> Self { Self(0) }

    /// `self` counted along `dir`: unchanged for [`Arrow::Out`], negated for
    /// [`Arrow::In`].
    #[inline]
    pub fn signed(self, dir: Arrow) -> Self { Self(self.0 * dir.sign()) }
}

impl Add for Qn {
    type Output = Self;

    fn add(self, rhs: Self) -> Self { Self(self.0 + rhs.0) }
}

impl AddAssign for Qn {
    fn add_assign(&mut self, rhs: Self) { self.0 += rhs.0; }
}

impl Sub for Qn {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self { Self(self.0 - rhs.0) }
}

impl SubAssign for Qn {
    fn sub_assign(&mut self, rhs: Self) { self.0 -= rhs.0; }
}

impl Neg for Qn {
    type Output = Self;

    fn neg(self) -> Self { Self(-self.0) }
}

impl fmt::Display for Qn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+}", self.0)
    }
}

/// One charge block of a graded index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sector {
    /// Charge carried by every state in the block.
    pub qn: Qn,
    /// Number of states in the block.
    pub dim: usize,
}

impl Sector {
    /// Create a new sector.
    #[inline]
    pub fn new(qn: Qn, dim: usize) -> Self { Self { qn, dim } }
}

/// The state space spanned by an index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Space {
    /// An undifferentiated space of a given dimension.
    Dense(usize),
    /// A direct sum of charge sectors, with an overall flow direction.
    Graded(Vec<Sector>, Arrow),
}

impl Space {
    /// Total dimension.
    pub fn dim(&self) -> usize {
        match self {
            Self::Dense(d) => *d,
            Self::Graded(secs, _) => secs.iter().map(|s| s.dim).sum(),
        }
    }
}

/// A named, primeable tensor index.
///
/// Ordinary value semantics; see the [module docs][self] for the identity
/// rules.
#[derive(Clone, Debug)]
pub struct Index {
    name: String,
    kind: Kind,
    prime: u32,
    space: Space,
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.prime == other.prime
    }
}

impl Eq for Index { }

impl std::hash::Hash for Index {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.prime.hash(state);
    }
}

impl Index {
    /// Create an unprimed dense site index.
    pub fn site<S: Into<String>>(name: S, dim: usize) -> Self {
        Self { name: name.into(), kind: Kind::Site, prime: 0, space: Space::Dense(dim) }
    }

    /// Create an unprimed dense link index.
    pub fn link<S: Into<String>>(name: S, dim: usize) -> Self {
        Self { name: name.into(), kind: Kind::Link, prime: 0, space: Space::Dense(dim) }
    }

    /// Create an unprimed graded site index.
    pub fn site_graded<S: Into<String>>(name: S, sectors: Vec<Sector>, dir: Arrow) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Site,
            prime: 0,
            space: Space::Graded(sectors, dir),
        }
    }

    /// Create an unprimed graded link index.
    pub fn link_graded<S: Into<String>>(name: S, sectors: Vec<Sector>, dir: Arrow) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Link,
            prime: 0,
            space: Space::Graded(sectors, dir),
        }
    }

    /// Index name, without prime marks.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// Physical or virtual.
    #[inline]
    pub fn kind(&self) -> Kind { self.kind }

    /// Prime level.
    #[inline]
    pub fn prime(&self) -> u32 { self.prime }

    /// The spanned space.
    #[inline]
    pub fn space(&self) -> &Space { &self.space }

    /// Total dimension.
    #[inline]
    pub fn dim(&self) -> usize { self.space.dim() }

    /// `true` if the index is charge-graded.
    #[inline]
    pub fn is_graded(&self) -> bool { matches!(self.space, Space::Graded(..)) }

    /// Flow direction, if graded.
    #[inline]
    pub fn arrow(&self) -> Option<Arrow> {
        match &self.space {
            Space::Dense(_) => None,
            Space::Graded(_, dir) => Some(*dir),
        }
    }

    /// Charge sectors, if graded.
    #[inline]
    pub fn sectors(&self) -> Option<&[Sector]> {
        match &self.space {
            Space::Dense(_) => None,
            Space::Graded(secs, _) => Some(secs),
        }
    }

    /// Copy of `self` with the prime level raised by one.
    pub fn primed(&self) -> Self {
        let mut ix = self.clone();
        ix.prime += 1;
        ix
    }

    /// Copy of `self` at a fixed prime level.
    pub fn at_prime(&self, prime: u32) -> Self {
        let mut ix = self.clone();
        ix.prime = prime;
        ix
    }

    /// Copy of `self` with the flow direction (and hence every block flow)
    /// reversed. No-op on dense indices.
    pub fn rev(&self) -> Self {
        let mut ix = self.clone();
        if let Space::Graded(_, dir) = &mut ix.space { *dir = dir.rev(); }
        ix
    }

    /// `true` if `self` and `other` agree on everything an index carries, not
    /// just identity. Used in consistency assertions.
    pub fn compatible(&self, other: &Self) -> bool {
        self == other && self.kind == other.kind && match (&self.space, &other.space) {
            (Space::Dense(d), Space::Dense(e)) => d == e,
            (Space::Graded(s, _), Space::Graded(t, _)) => s == t,
            _ => false,
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        (0..self.prime).try_for_each(|_| write!(f, "'"))?;
        write!(f, "<{}>", self.dim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graded() -> Index {
        Index::site_graded(
            "s0",
            vec![Sector::new(Qn(1), 1), Sector::new(Qn(-1), 1)],
            Arrow::Out,
        )
    }

    #[test]
    fn identity_is_name_and_prime() {
        let a = Index::site("s0", 2);
        let b = Index::site("s0", 2);
        let c = Index::link("s0", 7);
        assert_eq!(a, b);
        assert_eq!(a, c); // identity ignores kind and dimension
        assert!(!a.compatible(&c));
        assert_ne!(a, a.primed());
        assert_eq!(a.primed().at_prime(0), a);
    }

    #[test]
    fn graded_dims_and_arrows() {
        let s = graded();
        assert_eq!(s.dim(), 2);
        assert_eq!(s.arrow(), Some(Arrow::Out));
        let r = s.rev();
        assert_eq!(r.arrow(), Some(Arrow::In));
        assert_eq!(r, s); // reversal does not change identity
        assert_eq!(Qn(1).signed(Arrow::In), Qn(-1));
        assert_eq!(Qn(1).signed(Arrow::Out) + Qn(-1).signed(Arrow::Out), Qn::zero());
    }
}
