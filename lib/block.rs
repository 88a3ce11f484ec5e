//! Block-sparse tensors over charge-graded indices.
//!
//! A [`BlockTensor`] stores only the sector blocks allowed by an abelian
//! charge symmetry. Every index is [`Space::Graded`][crate::index::Space]
//! with an [`Arrow`]; a block is keyed by one sector position per axis, and
//! every stored block carries the same total charge divergence
//!
//! ```text
//!   div = Σ_axes sign(arrow) · qn(sector)
//! ```
//!
//! Contraction joins blocks whose shared-sector signatures match and runs a
//! dense matrix product on each matched pair, so the symmetry does the
//! pruning that dense contraction pays for in zeros. Bond factorization is
//! blockwise too: the two-site matrix splits into one dense matrix per
//! bridge charge, each is factored in full, and the truncation is decided
//! globally across charges.
//!
//! Shared-index arrow and sector agreement are structural invariants of a
//! well-formed network; they are checked with debug assertions here, while
//! errors reachable from user-supplied data surface as [`TensorResult`]s.

use ndarray as nd;
use ndarray_linalg::SVDInto;
use itertools::Itertools;
use num_complex::ComplexFloat;
use num_traits::{ Float, Zero };
use rustc_hash::FxHashMap as HashMap;
use std::fmt;
use crate::{
    ComplexFloatExt,
    index::{ Arrow, Index, Kind, Qn, Sector },
    scale::LogScale,
    svd::{ Direction, MatSvd, Spectrum, TruncSpec, do_svd_trunc, truncate_pooled },
    tensor::{ BondSvd, TensorAlg, TensorResult, check_indices },
};
use crate::tensor::TensorError::*;

/// A block-sparse tensor: graded indices over a map from sector keys to
/// dense blocks, kept near unit magnitude with the overall scale held
/// separately in log space.
#[derive(Clone)]
pub struct BlockTensor<A: ComplexFloat> {
    idxs: Vec<Index>,
    blocks: HashMap<Vec<usize>, nd::ArrayD<A>>,
    scale: LogScale<A::Real>,
}

impl<A: ComplexFloat> fmt::Debug for BlockTensor<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockTensor[")?;
        self.idxs.iter().enumerate()
            .try_for_each(|(k, ix)| {
                if k > 0 { write!(f, ", ")?; }
                write!(f, "{ix}")
            })?;
        write!(f, "; {} blocks]", self.blocks.len())
    }
}

// total charge of one block
fn block_div(idxs: &[Index], key: &[usize]) -> Qn {
    idxs.iter().zip(key)
        .map(|(ix, p)| {
            ix.sectors().unwrap()[*p].qn.signed(ix.arrow().unwrap())
        })
        .fold(Qn::zero(), |acc, q| acc + q)
}

// per composite charge: (sector positions, combined dim, running offset),
// enumerated in lexicographic order and sorted by charge
fn charge_combos(idxs: &[Index], pos: &[usize])
    -> Vec<(Qn, Vec<(Vec<usize>, usize, usize)>)>
{
    let mut acc: HashMap<Qn, Vec<(Vec<usize>, usize, usize)>> =
        HashMap::default();
    pos.iter()
        .map(|k| 0..idxs[*k].sectors().unwrap().len())
        .multi_cartesian_product()
        .for_each(|combo| {
            let q: Qn = combo.iter().zip(pos)
                .map(|(p, k)| {
                    let ix = &idxs[*k];
                    ix.sectors().unwrap()[*p].qn.signed(ix.arrow().unwrap())
                })
                .fold(Qn::zero(), |a, b| a + b);
            let len: usize = combo.iter().zip(pos)
                .map(|(p, k)| idxs[*k].sectors().unwrap()[*p].dim)
                .product();
            let entry = acc.entry(q).or_default();
            let off = entry.last().map(|(_, l, o)| l + o).unwrap_or(0);
            entry.push((combo, len, off));
        });
    let mut combos: Vec<_> = acc.into_iter().collect();
    combos.sort_by_key(|(q, _)| *q);
    combos
}

// per-bridge-charge dense factorization, pre-truncation
struct ChargeFac<'a, A: ComplexFloat> {
    q: Qn,
    rlist: &'a [(Vec<usize>, usize, usize)],
    clist: &'a [(Vec<usize>, usize, usize)],
    u: nd::Array2<A>,
    s: Vec<A::Real>,
    vt: nd::Array2<A>,
}

impl<A> BlockTensor<A>
where A: ComplexFloat + ComplexFloatExt
{
    /// Create a new tensor with no stored blocks (exactly zero).
    ///
    /// Fails if an index is repeated or ungraded.
    pub fn new(idxs: Vec<Index>) -> TensorResult<Self> {
        check_indices(&idxs)?;
        if !idxs.iter().all(|ix| ix.is_graded()) {
            return Err(UngradedIndex);
        }
        Ok(Self { idxs, blocks: HashMap::default(), scale: LogScale::zero() })
    }

    /// Create a new tensor from explicit sector blocks.
    ///
    /// Every key addresses one sector per axis; block shapes must match the
    /// addressed sector dimensions, and all blocks must carry the same total
    /// charge divergence.
    pub fn from_blocks<I>(idxs: Vec<Index>, blocks: I) -> TensorResult<Self>
    where I: IntoIterator<Item = (Vec<usize>, nd::ArrayD<A>)>
    {
        check_indices(&idxs)?;
        if !idxs.iter().all(|ix| ix.is_graded()) {
            return Err(UngradedIndex);
        }
        let mut map: HashMap<Vec<usize>, nd::ArrayD<A>> = HashMap::default();
        let mut div: Option<Qn> = None;
        for (key, data) in blocks {
            let valid =
                key.len() == idxs.len()
                && key.iter().zip(&idxs)
                    .all(|(p, ix)| *p < ix.sectors().unwrap().len());
            if !valid { return Err(BadBlockKey); }
            let dims: Vec<usize> = key.iter().zip(&idxs)
                .map(|(p, ix)| ix.sectors().unwrap()[*p].dim)
                .collect();
            if data.shape() != dims {
                return Err(ShapeMismatch(data.shape().to_vec(), dims));
            }
            let d = block_div(&idxs, &key);
            if *div.get_or_insert(d) != d { return Err(MixedDivergence); }
            if map.insert(key, data).is_some() { return Err(BadBlockKey); }
        }
        let mut new = Self { idxs, blocks: map, scale: LogScale::one() };
        new.rescale();
        Ok(new)
    }

    /// Create a new rank-0 tensor.
    pub fn new_scalar(z: A) -> Self {
        let mut blocks: HashMap<Vec<usize>, nd::ArrayD<A>> = HashMap::default();
        blocks.insert(Vec::new(), nd::arr0(z).into_dyn());
        let mut new = Self { idxs: Vec::new(), blocks, scale: LogScale::one() };
        new.rescale();
        new
    }

    /// Single element at global (cross-sector) coordinates, with the scale
    /// folded back in. Elements of absent blocks are zero.
    pub fn elem(&self, at: &[usize]) -> A {
        let mut key: Vec<usize> = Vec::with_capacity(at.len());
        let mut inner: Vec<usize> = Vec::with_capacity(at.len());
        for (g, ix) in at.iter().zip(&self.idxs) {
            let secs = ix.sectors().unwrap();
            let mut rem = *g;
            let mut found = secs.len();
            for (p, sec) in secs.iter().enumerate() {
                if rem < sec.dim { found = p; break; }
                rem -= sec.dim;
            }
            assert!(found < secs.len(), "elem: coordinate out of range");
            key.push(found);
            inner.push(rem);
        }
        self.blocks.get(&key)
            .map(|b| b[inner.as_slice()] * A::from_real(self.scale.expand()))
            .unwrap_or_else(A::zero)
    }

    /// Total charge shared by all stored blocks, or `None` if no blocks are
    /// stored.
    pub fn divergence(&self) -> Option<Qn> {
        let first = self.blocks.keys().next()?;
        let div = block_div(&self.idxs, first);
        debug_assert!(
            self.blocks.keys().all(|k| block_div(&self.idxs, k) == div),
            "divergence: stored blocks disagree on total charge",
        );
        Some(div)
    }

    /// Stored block at a sector key, if present.
    pub fn block(&self, key: &[usize]) -> Option<&nd::ArrayD<A>> {
        self.blocks.get(key)
    }

    /// Number of stored blocks.
    #[inline]
    pub fn n_blocks(&self) -> usize { self.blocks.len() }

    fn pos(&self, ix: &Index) -> Option<usize> {
        self.idxs.iter().position(|jx| jx == ix)
    }

    // pull the largest element magnitude out into the scale; an all-zero
    // tensor drops its blocks entirely
    fn rescale(&mut self) {
        let mx: A::Real = self.blocks.values()
            .flat_map(|b| b.iter())
            .map(|a| a.abs())
            .fold(A::Real::zero(), A::Real::max);
        if mx.is_zero() {
            self.scale = LogScale::zero();
            self.blocks.clear();
            return;
        }
        if !Float::is_finite(mx) { return; }
        let inv = Float::recip(mx);
        self.blocks.values_mut()
            .for_each(|b| b.mapv_inplace(|a| a * A::from_real(inv)));
        self.scale *= LogScale::from_real(mx);
    }

    fn empty_factors(&self, rpos: &[usize], cpos: &[usize], link_name: &str)
        -> BondSvd<Self, A::Real>
    {
        let link = Index::link_graded(link_name, Vec::new(), Arrow::Out);
        let uidxs: Vec<Index> = rpos.iter()
            .map(|p| self.idxs[*p].clone())
            .chain([link.clone()])
            .collect();
        let vidxs: Vec<Index> = [link.rev()].into_iter()
            .chain(cpos.iter().map(|p| self.idxs[*p].clone()))
            .collect();
        let u = Self {
            idxs: uidxs,
            blocks: HashMap::default(),
            scale: LogScale::zero(),
        };
        let vt = Self {
            idxs: vidxs,
            blocks: HashMap::default(),
            scale: LogScale::zero(),
        };
        BondSvd { u, vt, link, spectrum: Spectrum::empty() }
    }
}

impl<A> TensorAlg for BlockTensor<A>
where
    A: ComplexFloat + ComplexFloatExt + 'static,
    nd::Array2<A>: SVDInto<U = nd::Array2<A>, Sigma = nd::Array1<A::Real>, VT = nd::Array2<A>>,
{
    type Elem = A;

    fn indices(&self) -> &[Index] { &self.idxs }

    fn total_dim(&self) -> usize {
        self.blocks.values().map(|b| b.len()).sum()
    }

    fn contract(&self, other: &Self) -> Self {
        let common: Vec<(usize, usize)> = self.idxs.iter().enumerate()
            .filter_map(|(k, ix)| other.pos(ix).map(|j| (k, j)))
            .collect();
        debug_assert!(
            common.iter().all(|(k, j)| {
                let a = &self.idxs[*k];
                let b = &other.idxs[*j];
                a.compatible(b)
                    && a.arrow().zip(b.arrow())
                        .is_some_and(|(x, y)| x == y.rev())
            }),
            "contract: shared graded indices must have equal sectors and \
             opposite arrows",
        );
        let scale = self.scale * other.scale;
        let lfree: Vec<usize> = (0..self.idxs.len())
            .filter(|k| !common.iter().any(|(c, _)| c == k))
            .collect();
        let rfree: Vec<usize> = (0..other.idxs.len())
            .filter(|j| !common.iter().any(|(_, c)| c == j))
            .collect();
        let idxs: Vec<Index> =
            lfree.iter().map(|k| self.idxs[*k].clone())
                .chain(rfree.iter().map(|j| other.idxs[*j].clone()))
                .collect();
        let mut out: HashMap<Vec<usize>, nd::ArrayD<A>> = HashMap::default();
        if common.is_empty() {
            for (ka, ba) in &self.blocks {
                for (kb, bb) in &other.blocks {
                    let key: Vec<usize> =
                        ka.iter().chain(kb).copied().collect();
                    let dims: Vec<usize> =
                        ba.shape().iter().chain(bb.shape()).copied().collect();
                    let elems: Vec<A> =
                        ba.iter().cartesian_product(bb.iter())
                            .map(|(x, y)| *x * *y)
                            .collect();
                    let blk =
                        nd::ArrayD::from_shape_vec(nd::IxDyn(&dims), elems)
                        .unwrap();
                    out.insert(key, blk);
                }
            }
        } else {
            let lperm: Vec<usize> =
                lfree.iter().chain(common.iter().map(|(k, _)| k))
                    .copied()
                    .collect();
            let rperm: Vec<usize> =
                common.iter().map(|(_, j)| j).chain(rfree.iter())
                    .copied()
                    .collect();
            let mut buckets: HashMap<Vec<usize>, Vec<Vec<usize>>> =
                HashMap::default();
            for kb in other.blocks.keys() {
                let sig: Vec<usize> =
                    common.iter().map(|(_, j)| kb[*j]).collect();
                buckets.entry(sig).or_default().push(kb.clone());
            }
            for (ka, ba) in &self.blocks {
                let sig: Vec<usize> =
                    common.iter().map(|(k, _)| ka[*k]).collect();
                let Some(matches) = buckets.get(&sig) else { continue; };
                let m: usize =
                    lfree.iter().map(|k| ba.shape()[*k]).product();
                let kdim: usize =
                    common.iter().map(|(k, _)| ba.shape()[*k]).product();
                // permuted views must be repacked row-major before reshaping
                let amat = ba.view().permuted_axes(lperm.as_slice())
                    .as_standard_layout()
                    .into_owned()
                    .into_shape((m, kdim))
                    .unwrap();
                for kb in matches {
                    let bb = &other.blocks[kb];
                    let n: usize =
                        rfree.iter().map(|j| bb.shape()[*j]).product();
                    let bmat = bb.view().permuted_axes(rperm.as_slice())
                        .as_standard_layout()
                        .into_owned()
                        .into_shape((kdim, n))
                        .unwrap();
                    let prod = amat.dot(&bmat);
                    let okey: Vec<usize> =
                        lfree.iter().map(|k| ka[*k])
                            .chain(rfree.iter().map(|j| kb[*j]))
                            .collect();
                    let odims: Vec<usize> =
                        lfree.iter().map(|k| ba.shape()[*k])
                            .chain(rfree.iter().map(|j| bb.shape()[*j]))
                            .collect();
                    let blk = prod.into_shape(nd::IxDyn(&odims)).unwrap();
                    out.entry(okey)
                        .and_modify(|acc| {
                            acc.zip_mut_with(&blk, |o, x| { *o = *o + *x; });
                        })
                        .or_insert(blk);
                }
            }
        }
        let mut new = Self { idxs, blocks: out, scale };
        new.rescale();
        new
    }

    fn add(&self, other: &Self) -> TensorResult<Self> {
        if self.idxs.len() != other.idxs.len() {
            return Err(IncompatibleIndices);
        }
        let operm: Vec<usize> = self.idxs.iter()
            .map(|ix| other.pos(ix).ok_or(IncompatibleIndices))
            .collect::<TensorResult<_>>()?;
        debug_assert!(
            self.idxs.iter().zip(&operm).all(|(ix, j)| {
                let jx = &other.idxs[*j];
                ix.compatible(jx) && ix.arrow() == jx.arrow()
            }),
            "add: graded indices must agree on sectors and arrows",
        );
        if let (Some(da), Some(db)) = (self.divergence(), other.divergence()) {
            if da != db { return Err(MixedDivergence); }
        }
        if self.is_vanishing() { return Ok(other.clone()); }
        if other.is_vanishing() { return Ok(self.clone()); }
        let target = self.scale.max_mag(other.scale);
        let fa = A::from_real(self.scale.ratio_to(&target));
        let fb = A::from_real(other.scale.ratio_to(&target));
        let mut out: HashMap<Vec<usize>, nd::ArrayD<A>> = self.blocks.iter()
            .map(|(k, b)| (k.clone(), b.mapv(|a| a * fa)))
            .collect();
        for (kb, bb) in &other.blocks {
            let skey: Vec<usize> = operm.iter().map(|j| kb[*j]).collect();
            let pb = bb.view().permuted_axes(operm.as_slice());
            out.entry(skey)
                .and_modify(|acc| {
                    acc.zip_mut_with(&pb, |o, x| { *o = *o + *x * fb; });
                })
                .or_insert_with(|| pb.mapv(|x| x * fb));
        }
        let mut new = Self {
            idxs: self.idxs.clone(),
            blocks: out,
            scale: target,
        };
        new.rescale();
        Ok(new)
    }

    fn scale_by(&mut self, z: A) {
        let r = z.abs();
        if r.is_zero() {
            self.scale = LogScale::zero();
            self.blocks.clear();
            return;
        }
        self.scale *= LogScale::from_real(r);
        let phase = z / A::from_real(r);
        if phase != A::one() {
            self.blocks.values_mut()
                .for_each(|b| b.mapv_inplace(|a| a * phase));
        }
    }

    fn scale_by_real(&mut self, r: A::Real) {
        if r.is_zero() {
            self.scale = LogScale::zero();
            self.blocks.clear();
        } else {
            self.scale *= LogScale::from_real(r);
        }
    }

    fn conj(&self) -> Self {
        Self {
            idxs: self.idxs.iter().map(|ix| ix.rev()).collect(),
            blocks: self.blocks.iter()
                .map(|(k, b)| (k.clone(), b.mapv(|a| a.conj())))
                .collect(),
            scale: self.scale,
        }
    }

    fn map_prime(&mut self, p: u32, q: u32) {
        self.idxs.iter_mut()
            .for_each(|ix| {
                if ix.prime() == p { *ix = ix.at_prime(q); }
            });
    }

    fn map_prime_kind(&mut self, kind: Kind, p: u32, q: u32) {
        self.idxs.iter_mut()
            .for_each(|ix| {
                if ix.kind() == kind && ix.prime() == p {
                    *ix = ix.at_prime(q);
                }
            });
    }

    fn norm(&self) -> A::Real {
        let sq: A::Real = self.blocks.values()
            .flat_map(|b| b.iter())
            .map(|a| a.abs() * a.abs())
            .fold(A::Real::zero(), |acc, x| acc + x);
        Float::sqrt(sq) * Float::abs(self.scale.expand())
    }

    fn as_scalar(&self) -> TensorResult<A> {
        if !self.idxs.is_empty() { return Err(NotScalar); }
        match self.blocks.values().next() {
            Some(b) => {
                Ok(b[nd::IxDyn(&[])] * A::from_real(self.scale.expand()))
            }
            None => Ok(A::zero()),
        }
    }

    fn is_vanishing(&self) -> bool { self.scale.is_zero() }

    fn svd_bond(
        &self,
        rows: &[Index],
        link_name: &str,
        spec: &TruncSpec<A::Real>,
        dir: Direction,
    ) -> TensorResult<BondSvd<Self, A::Real>> {
        let rpos: Vec<usize> = rows.iter()
            .map(|r| self.pos(r).ok_or_else(|| MissingIndex(r.to_string())))
            .collect::<TensorResult<_>>()?;
        let cpos: Vec<usize> = (0..self.idxs.len())
            .filter(|k| !rpos.contains(k))
            .collect();
        if rpos.is_empty() || cpos.is_empty() { return Err(BadSplit); }
        if self.is_vanishing() {
            return Ok(self.empty_factors(&rpos, &cpos, link_name));
        }
        let Some(div) = self.divergence() else { unreachable!() };

        let rcombos = charge_combos(&self.idxs, &rpos);
        let ccombos = charge_combos(&self.idxs, &cpos);
        let cmap: HashMap<Qn, &[(Vec<usize>, usize, usize)]> =
            ccombos.iter().map(|(q, v)| (*q, v.as_slice())).collect();
        let perm: Vec<usize> = rpos.iter().chain(&cpos).copied().collect();

        // one dense matrix per bridge charge, assembled from stored blocks
        let mut facs: Vec<ChargeFac<A>> = Vec::new();
        let mut bags: Vec<Vec<A::Real>> = Vec::new();
        for (qrow, rlist) in &rcombos {
            let Some(clist) = cmap.get(&(div - *qrow)).copied()
                else { continue; };
            let mm: usize = rlist.last().map(|(_, l, o)| l + o).unwrap_or(0);
            let nn: usize = clist.last().map(|(_, l, o)| l + o).unwrap_or(0);
            if mm == 0 || nn == 0 { continue; }
            let mut mat = nd::Array2::<A>::zeros((mm, nn));
            let mut any = false;
            for (rc, rlen, roff) in rlist {
                for (cc, clen, coff) in clist.iter() {
                    let mut key = vec![0_usize; self.idxs.len()];
                    rpos.iter().zip(rc).for_each(|(ax, p)| { key[*ax] = *p; });
                    cpos.iter().zip(cc).for_each(|(ax, p)| { key[*ax] = *p; });
                    let Some(blk) = self.blocks.get(&key) else { continue; };
                    any = true;
                    let sub = blk.view().permuted_axes(perm.as_slice())
                        .as_standard_layout()
                        .into_owned()
                        .into_shape((*rlen, *clen))
                        .unwrap();
                    mat.slice_mut(
                        nd::s![*roff..*roff + *rlen, *coff..*coff + *clen])
                        .assign(&sub);
                }
            }
            if !any { continue; }
            let MatSvd { u, s, vt, spectrum: _ } =
                do_svd_trunc(mat, &TruncSpec::exact());
            bags.push(s.iter().map(|sj| Float::powi(*sj, 2)).collect());
            facs.push(ChargeFac { q: *qrow, rlist, clist, u, s, vt });
        }
        let (kept, spectrum) = truncate_pooled(&bags, spec);

        let mut lsecs: Vec<Sector> = Vec::new();
        let mut ublocks: HashMap<Vec<usize>, nd::ArrayD<A>> =
            HashMap::default();
        let mut vblocks: HashMap<Vec<usize>, nd::ArrayD<A>> =
            HashMap::default();
        for (fac, k) in facs.iter().zip(&kept) {
            let k = *k;
            if k == 0 { continue; }
            let ls = lsecs.len();
            let lq = match dir {
                Direction::FromLeft => -fac.q,
                Direction::FromRight => div - fac.q,
            };
            lsecs.push(Sector::new(lq, k));
            let mut uk = fac.u.slice(nd::s![.., ..k]).to_owned();
            let mut vtk = fac.vt.slice(nd::s![..k, ..]).to_owned();
            match dir {
                Direction::FromLeft => {
                    vtk.axis_iter_mut(nd::Axis(0)).zip(&fac.s[..k])
                        .for_each(|(mut row, sv)| {
                            row.mapv_inplace(|x| x * A::from_real(*sv));
                        });
                }
                Direction::FromRight => {
                    uk.axis_iter_mut(nd::Axis(1)).zip(&fac.s[..k])
                        .for_each(|(mut col, sv)| {
                            col.mapv_inplace(|x| x * A::from_real(*sv));
                        });
                }
            }
            for (rc, rlen, roff) in fac.rlist {
                let sub = uk.slice(nd::s![*roff..*roff + *rlen, ..])
                    .to_owned();
                let mut shape: Vec<usize> = rc.iter().zip(&rpos)
                    .map(|(p, ax)| self.idxs[*ax].sectors().unwrap()[*p].dim)
                    .collect();
                shape.push(k);
                let mut key: Vec<usize> = rc.clone();
                key.push(ls);
                ublocks.insert(key, sub.into_shape(nd::IxDyn(&shape)).unwrap());
            }
            for (cc, clen, coff) in fac.clist {
                let sub = vtk.slice(nd::s![.., *coff..*coff + *clen])
                    .to_owned();
                let mut shape: Vec<usize> = vec![k];
                shape.extend(
                    cc.iter().zip(&cpos)
                        .map(|(p, ax)| {
                            self.idxs[*ax].sectors().unwrap()[*p].dim
                        })
                );
                let mut key: Vec<usize> = vec![ls];
                key.extend_from_slice(cc);
                vblocks.insert(key, sub.into_shape(nd::IxDyn(&shape)).unwrap());
            }
        }
        if lsecs.is_empty() {
            return Ok(self.empty_factors(&rpos, &cpos, link_name));
        }
        let link = Index::link_graded(link_name, lsecs, Arrow::Out);
        let uidxs: Vec<Index> = rpos.iter()
            .map(|p| self.idxs[*p].clone())
            .chain([link.clone()])
            .collect();
        let vidxs: Vec<Index> = [link.rev()].into_iter()
            .chain(cpos.iter().map(|p| self.idxs[*p].clone()))
            .collect();
        let mut ut = Self {
            idxs: uidxs,
            blocks: ublocks,
            scale: LogScale::one(),
        };
        let mut vtt = Self {
            idxs: vidxs,
            blocks: vblocks,
            scale: self.scale,
        };
        if dir == Direction::FromRight {
            std::mem::swap(&mut ut.scale, &mut vtt.scale);
        }
        ut.rescale();
        vtt.rescale();
        Ok(BondSvd { u: ut, vt: vtt, link, spectrum })
    }
}
