//! Lazy elementwise arithmetic over fixed-width hardware lanes.
//!
//! Arithmetic on [`Operand`] and [`Chain`] handles is recorded into an [`Expression`]'s
//! operation log instead of being computed. Evaluating the root chain links sub-chains to
//! their consumers, plans temporary slots, and runs every operator lane by lane in a single
//! pass over the output, without materialising intermediate buffers.

pub mod buffer;
pub mod element;
mod env;
pub mod error;
pub mod eval;
pub mod expr;
pub mod kernel;
pub mod plan;
pub mod resolve;

pub use buffer::Buffer;
pub use element::Element;
pub use error::{ExprError, ExprResult};
pub use eval::{EvalOptions, EvalReport, Remainder};
pub use expr::{Chain, ChainId, Expression, LazyValue, OpDescriptor, Operand, Rhs, VarId};
pub use kernel::BinaryOp;
pub use plan::{Plan, PlanRoot, Source, Step, Target};

pub type Result<T> = ExprResult<T>;

/// Evaluates the expression rooted at `chain` into a new buffer.
pub fn eval<T: Element>(chain: Chain<'_, T>) -> Result<Buffer<T>> {
    chain.eval()
}
