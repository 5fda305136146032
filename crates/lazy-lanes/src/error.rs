use thiserror::Error;

use crate::kernel::BinaryOp;

/// Failures reported by expression recording, planning, and evaluation.
///
/// Recording never fails eagerly: the first problem seen while an expression is being
/// written is latched and returned by the evaluation that consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("{op} expects operands of equal length: left has {expected} elements, right has {found}")]
    LengthMismatch {
        op: BinaryOp,
        expected: usize,
        found: usize,
    },
    #[error("output buffer holds {found} elements but the expression root holds {expected}")]
    OutputLength { expected: usize, found: usize },
    #[error("operand belongs to a different expression")]
    ForeignOperand,
    #[error("chain was recorded before the expression was last evaluated or cleared")]
    StaleChain,
    #[error("{count} recorded sub-expression(s) never feed the evaluated root")]
    UnconsumedChains { count: usize },
    #[error("descriptor #{sequence_id} consumes a chain with no recorded producer")]
    UnresolvedChain { sequence_id: usize },
    #[error("invalid value `{value}` for {key}")]
    InvalidOption { key: &'static str, value: String },
}

pub type ExprResult<T> = Result<T, ExprError>;
