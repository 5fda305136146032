//! Operand and chain handles whose arithmetic operators record instead of compute.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use crate::buffer::Buffer;
use crate::element::Element;
use crate::error::{ExprError, ExprResult};
use crate::eval::EvalReport;
use crate::kernel::BinaryOp;

use super::builder::Expression;
use super::descriptor::{ChainId, VarId};

pub(crate) use sealed::Term;

mod sealed {
    use super::{ChainId, Element, Expression, VarId};

    /// Operand as seen by the recorder.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Term {
        Var(VarId),
        Chain { id: ChainId, generation: u32 },
        /// A chain whose recording failed; the failure is already latched.
        Poisoned,
    }

    pub trait Sealed<'a, T: Element> {
        fn into_term(self) -> (&'a Expression<'a, T>, Term);
    }
}

/// Anything that can appear on either side of a recorded operator.
pub trait LazyValue<'a, T: Element>: sealed::Sealed<'a, T> + Sized {
    /// Records `self op rhs` and returns the chain extending `self`.
    fn apply<R: LazyValue<'a, T>>(self, op: BinaryOp, rhs: R) -> Chain<'a, T> {
        let (expr, lhs) = self.into_term();
        let (rhs_expr, rhs) = rhs.into_term();
        if !std::ptr::eq(expr, rhs_expr) {
            expr.latch(ExprError::ForeignOperand);
            return Chain::poisoned(expr);
        }
        expr.record(lhs, rhs, op)
    }
}

/// Reference-only handle to one buffer registered with an [`Expression`].
///
/// Copying the handle aliases the same buffer; no data is read until evaluation.
#[derive(Clone, Copy)]
pub struct Operand<'a, T: Element> {
    expr: &'a Expression<'a, T>,
    var: VarId,
}

impl<'a, T: Element> Operand<'a, T> {
    pub(crate) fn new(expr: &'a Expression<'a, T>, var: VarId) -> Self {
        Operand { expr, var }
    }

    pub fn id(&self) -> VarId {
        self.var
    }

    /// The buffer this handle refers to.
    pub fn data(&self) -> &'a [T] {
        self.expr.data(self.var)
    }

    /// Evaluates the bare variable, returning a copy of its buffer.
    pub fn eval(self) -> ExprResult<Buffer<T>> {
        self.expr.evaluate(Term::Var(self.var)).map(|(out, _)| out)
    }
}

impl<'a, T: Element> sealed::Sealed<'a, T> for Operand<'a, T> {
    fn into_term(self) -> (&'a Expression<'a, T>, Term) {
        (self.expr, Term::Var(self.var))
    }
}

impl<'a, T: Element> LazyValue<'a, T> for Operand<'a, T> {}

impl<T: Element> fmt::Debug for Operand<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operand")
            .field("var", &self.var)
            .field("len", &self.data().len())
            .finish()
    }
}

/// Result of one or more recorded operators.
///
/// A chain names the running value of a sub-expression. It is move-only: folding it into
/// another operator or evaluating it consumes it, so every computed value is used once.
#[must_use = "a chain computes nothing until it is evaluated or folded into another chain"]
pub struct Chain<'a, T: Element> {
    expr: &'a Expression<'a, T>,
    id: Option<ChainId>,
    generation: u32,
}

impl<'a, T: Element> Chain<'a, T> {
    pub(crate) fn new(expr: &'a Expression<'a, T>, id: Option<ChainId>, generation: u32) -> Self {
        Chain {
            expr,
            id,
            generation,
        }
    }

    fn poisoned(expr: &'a Expression<'a, T>) -> Self {
        Chain {
            expr,
            id: None,
            generation: 0,
        }
    }

    /// Identifier of the sub-chain, or `None` when recording it failed.
    pub fn id(&self) -> Option<ChainId> {
        self.id
    }

    pub fn expression(&self) -> &'a Expression<'a, T> {
        self.expr
    }

    pub(crate) fn term(&self) -> Term {
        match self.id {
            Some(id) => Term::Chain {
                id,
                generation: self.generation,
            },
            None => Term::Poisoned,
        }
    }

    /// Evaluates the expression rooted at this chain into a new buffer.
    pub fn eval(self) -> ExprResult<Buffer<T>> {
        self.eval_with_report().map(|(out, _)| out)
    }

    pub fn eval_with_report(self) -> ExprResult<(Buffer<T>, EvalReport)> {
        self.expr.evaluate(self.term())
    }

    /// Evaluates into a caller-supplied buffer of the root's length.
    pub fn eval_into(self, out: &mut [T]) -> ExprResult<EvalReport> {
        self.expr.evaluate_into(self.term(), out)
    }
}

impl<'a, T: Element> sealed::Sealed<'a, T> for Chain<'a, T> {
    fn into_term(self) -> (&'a Expression<'a, T>, Term) {
        (self.expr, self.term())
    }
}

impl<'a, T: Element> LazyValue<'a, T> for Chain<'a, T> {}

impl<T: Element> fmt::Debug for Chain<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish()
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl_binary_op!(@pair $trait, $method, $op, Operand, Operand);
        impl_binary_op!(@pair $trait, $method, $op, Operand, Chain);
        impl_binary_op!(@pair $trait, $method, $op, Chain, Operand);
        impl_binary_op!(@pair $trait, $method, $op, Chain, Chain);
    };
    (@pair $trait:ident, $method:ident, $op:expr, $lhs:ident, $rhs:ident) => {
        impl<'a, T: Element> $trait<$rhs<'a, T>> for $lhs<'a, T> {
            type Output = Chain<'a, T>;

            fn $method(self, rhs: $rhs<'a, T>) -> Chain<'a, T> {
                self.apply($op, rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, BinaryOp::Add);
impl_binary_op!(Sub, sub, BinaryOp::Sub);
impl_binary_op!(Mul, mul, BinaryOp::Mul);
impl_binary_op!(Div, div, BinaryOp::Div);
