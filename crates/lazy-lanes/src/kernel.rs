//! Fixed-width elementwise kernels.
//!
//! Every slice kernel walks its inputs one hardware lane at a time and falls back to scalar
//! arithmetic for the final `len % LANES` elements. Callers are responsible for matching
//! lengths; the kernels only assert them in debug builds.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Binary opcodes recorded by the lazy engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub const ALL: [BinaryOp; 4] = [BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div];

    /// Infix symbol used when rendering plans.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
        }
    }

    #[inline]
    pub fn apply_scalar<T: Element>(self, lhs: T, rhs: T) -> T {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }

    #[inline]
    pub fn apply_lane<T: Element>(self, lhs: T::Lane, rhs: T::Lane) -> T::Lane {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lane width used for `T`.
pub const fn lane_width<T: Element>() -> usize {
    T::LANES
}

/// Number of elements of a `len`-element buffer covered by whole lanes.
pub const fn lane_aligned_len<T: Element>(len: usize) -> usize {
    len / T::LANES * T::LANES
}

/// Writes `lhs op rhs` into `out`.
pub fn binary_into<T: Element>(op: BinaryOp, out: &mut [T], lhs: &[T], rhs: &[T]) {
    debug_assert_eq!(out.len(), lhs.len());
    debug_assert_eq!(lhs.len(), rhs.len());

    let n = T::LANES;
    let full = lane_aligned_len::<T>(out.len());
    let (out_lanes, out_tail) = out.split_at_mut(full);

    for ((dst, a), b) in out_lanes
        .chunks_exact_mut(n)
        .zip(lhs[..full].chunks_exact(n))
        .zip(rhs[..full].chunks_exact(n))
    {
        T::store(op.apply_lane::<T>(T::load(a), T::load(b)), dst);
    }
    for ((dst, &a), &b) in out_tail.iter_mut().zip(&lhs[full..]).zip(&rhs[full..]) {
        *dst = op.apply_scalar(a, b);
    }
}

/// Updates `acc` in place with `acc op rhs`.
pub fn binary_assign<T: Element>(op: BinaryOp, acc: &mut [T], rhs: &[T]) {
    debug_assert_eq!(acc.len(), rhs.len());

    let n = T::LANES;
    let full = lane_aligned_len::<T>(acc.len());
    let (acc_lanes, acc_tail) = acc.split_at_mut(full);

    for (dst, b) in acc_lanes.chunks_exact_mut(n).zip(rhs[..full].chunks_exact(n)) {
        let lane = op.apply_lane::<T>(T::load(dst), T::load(b));
        T::store(lane, dst);
    }
    for (dst, &b) in acc_tail.iter_mut().zip(&rhs[full..]) {
        *dst = op.apply_scalar(*dst, b);
    }
}

/// Writes the fused `a * b + c` into `out`.
pub fn mul_add_into<T: Element>(out: &mut [T], a: &[T], b: &[T], c: &[T]) {
    debug_assert_eq!(out.len(), a.len());
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(b.len(), c.len());

    let n = T::LANES;
    let full = lane_aligned_len::<T>(out.len());
    let (out_lanes, out_tail) = out.split_at_mut(full);

    for (((dst, x), y), z) in out_lanes
        .chunks_exact_mut(n)
        .zip(a[..full].chunks_exact(n))
        .zip(b[..full].chunks_exact(n))
        .zip(c[..full].chunks_exact(n))
    {
        T::store(T::lane_mul_add(T::load(x), T::load(y), T::load(z)), dst);
    }
    for (((dst, &x), &y), &z) in out_tail
        .iter_mut()
        .zip(&a[full..])
        .zip(&b[full..])
        .zip(&c[full..])
    {
        *dst = x.mul_add(y, z);
    }
}
