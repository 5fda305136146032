use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kernel::BinaryOp;

/// Symbolic identifier of a buffer registered with an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub u32);

impl VarId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Symbolic name of a sub-chain: the value currently flowing out of it.
///
/// A chain keeps its identifier however many operators are applied to it, so a later
/// descriptor naming the chain on its right-hand side refers to the chain's final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u32);

impl ChainId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Right-hand operand of a recorded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rhs {
    /// Raw buffer contents.
    Var(VarId),
    /// Final value of another sub-chain.
    Chain(ChainId),
}

impl fmt::Display for Rhs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rhs::Var(var) => write!(f, "{var}"),
            Rhs::Chain(chain) => write!(f, "{chain}"),
        }
    }
}

/// One recorded binary operator application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpDescriptor {
    /// Position in the operation log.
    pub sequence_id: usize,
    /// Sub-chain this operation extends.
    pub anchor: ChainId,
    /// Left-most operand of the sub-chain; shared by every descriptor of the chain.
    pub origin: VarId,
    /// True for the first descriptor of its chain, which reads `origin` directly.
    pub opens: bool,
    pub rhs: Rhs,
    pub op: BinaryOp,
    /// Earlier descriptor whose output replaces the raw right-hand operand.
    pub producer: Option<usize>,
    /// Set once a later descriptor has linked to this one as its producer.
    pub claimed: bool,
}

impl OpDescriptor {
    pub fn new(
        sequence_id: usize,
        anchor: ChainId,
        origin: VarId,
        opens: bool,
        rhs: Rhs,
        op: BinaryOp,
    ) -> Self {
        OpDescriptor {
            sequence_id,
            anchor,
            origin,
            opens,
            rhs,
            op,
            producer: None,
            claimed: false,
        }
    }
}
