//! Owned dense buffer used for inputs, eager results, and evaluation outputs.

use std::ops::{Deref, DerefMut};

use crate::element::Element;
use crate::error::{ExprError, ExprResult};
use crate::kernel::{self, BinaryOp};

/// Contiguous, fixed-length storage for one element type.
///
/// The backing allocation never moves while the buffer is borrowed, so expression handles
/// can refer to it for the whole of construction and evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Buffer<T> {
    data: Vec<T>,
}

impl<T: Element> Buffer<T> {
    /// Returns a buffer of `len` copies of `value`.
    pub fn filled(len: usize, value: T) -> Self {
        Buffer {
            data: vec![value; len],
        }
    }

    pub fn zeros(len: usize) -> Self {
        Self::filled(len, T::default())
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Buffer { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Number of whole lanes covering the buffer.
    pub fn full_lanes(&self) -> usize {
        self.data.len() / T::LANES
    }

    /// Number of trailing elements that do not fill a lane.
    pub fn tail_len(&self) -> usize {
        self.data.len() % T::LANES
    }

    /// Reports whether every element equals `value`.
    pub fn all_eq(&self, value: T) -> bool {
        self.data.iter().all(|&x| x == value)
    }

    /// Eagerly computes `self op rhs` into a new buffer.
    pub fn zip_with(&self, op: BinaryOp, rhs: &[T]) -> ExprResult<Self> {
        check_len(op, self.len(), rhs.len())?;
        let mut out = Self::zeros(self.len());
        kernel::binary_into(op, &mut out.data, &self.data, rhs);
        Ok(out)
    }

    pub fn add(&self, rhs: &[T]) -> ExprResult<Self> {
        self.zip_with(BinaryOp::Add, rhs)
    }

    pub fn sub(&self, rhs: &[T]) -> ExprResult<Self> {
        self.zip_with(BinaryOp::Sub, rhs)
    }

    pub fn mul(&self, rhs: &[T]) -> ExprResult<Self> {
        self.zip_with(BinaryOp::Mul, rhs)
    }

    pub fn div(&self, rhs: &[T]) -> ExprResult<Self> {
        self.zip_with(BinaryOp::Div, rhs)
    }

    /// Updates the buffer in place with `self op rhs`.
    pub fn apply_assign(&mut self, op: BinaryOp, rhs: &[T]) -> ExprResult<()> {
        check_len(op, self.len(), rhs.len())?;
        kernel::binary_assign(op, &mut self.data, rhs);
        Ok(())
    }

    /// Eagerly computes the fused `self * b + c`.
    pub fn mul_add(&self, b: &[T], c: &[T]) -> ExprResult<Self> {
        check_len(BinaryOp::Mul, self.len(), b.len())?;
        check_len(BinaryOp::Add, self.len(), c.len())?;
        let mut out = Self::zeros(self.len());
        kernel::mul_add_into(&mut out.data, &self.data, b, c);
        Ok(out)
    }
}

fn check_len(op: BinaryOp, expected: usize, found: usize) -> ExprResult<()> {
    if expected != found {
        return Err(ExprError::LengthMismatch {
            op,
            expected,
            found,
        });
    }
    Ok(())
}

impl<T> Deref for Buffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T> DerefMut for Buffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T> AsRef<[T]> for Buffer<T> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<T> From<Vec<T>> for Buffer<T> {
    fn from(data: Vec<T>) -> Self {
        Buffer { data }
    }
}

impl<T> FromIterator<T> for Buffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Buffer {
            data: iter.into_iter().collect(),
        }
    }
}
