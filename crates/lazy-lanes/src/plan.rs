//! Lowers a resolved operation log into an explicit evaluation schedule.
//!
//! Every descriptor becomes one [`Step`] reading two [`Source`]s and writing one
//! [`Target`]. Steps on the root chain accumulate in place in the output buffer; every
//! other sub-chain runs in a temporary slot that it holds from its first descriptor until
//! the descriptor consuming it. Released slots go back to a free list, so the pool only
//! grows to the number of sub-chains alive at the same time.

use std::collections::HashMap;
use std::fmt;

use smallvec::SmallVec;

use crate::error::{ExprError, ExprResult};
use crate::expr::{ChainId, OpDescriptor, Rhs, VarId};
use crate::kernel::BinaryOp;

/// Where a step reads one operand lane from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Running value of the root chain, held in the output buffer.
    Accumulator,
    /// Temporary slot holding a sub-chain's running value.
    Slot(usize),
    /// Raw contents of a registered buffer.
    Var(VarId),
}

/// Where a step writes its lane result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Accumulator,
    Slot(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Index of the descriptor this step executes.
    pub descriptor: usize,
    pub op: BinaryOp,
    pub lhs: Source,
    pub rhs: Source,
    pub dst: Target,
}

/// Identity and extent of the value being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanRoot {
    /// Buffer the output is seeded from.
    pub origin: VarId,
    /// Root chain, or `None` when a bare variable is evaluated.
    pub chain: Option<ChainId>,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    steps: SmallVec<[Step; 8]>,
    slots: usize,
    root: PlanRoot,
}

impl Plan {
    /// Builds the schedule for `root` from descriptors already passed through
    /// [`resolve`](crate::resolve::resolve).
    pub fn build(descriptors: &[OpDescriptor], root: PlanRoot) -> ExprResult<Plan> {
        let mut steps: SmallVec<[Step; 8]> = SmallVec::with_capacity(descriptors.len());
        let mut slot_of: HashMap<ChainId, usize> = HashMap::new();
        let mut free: SmallVec<[usize; 4]> = SmallVec::new();
        let mut slots = 0usize;

        for (index, descriptor) in descriptors.iter().enumerate() {
            let unresolved = ExprError::UnresolvedChain {
                sequence_id: descriptor.sequence_id,
            };

            let rhs = match descriptor.rhs {
                Rhs::Var(var) => Source::Var(var),
                Rhs::Chain(_) => {
                    let producer = descriptor.producer.ok_or_else(|| unresolved.clone())?;
                    let chain = descriptors
                        .get(producer)
                        .map(|p| p.anchor)
                        .ok_or_else(|| unresolved.clone())?;
                    let slot = slot_of.remove(&chain).ok_or_else(|| unresolved.clone())?;
                    Source::Slot(slot)
                }
            };

            let (lhs, dst) = if Some(descriptor.anchor) == root.chain {
                (Source::Accumulator, Target::Accumulator)
            } else if descriptor.opens {
                let slot = free.pop().unwrap_or_else(|| {
                    slots += 1;
                    slots - 1
                });
                slot_of.insert(descriptor.anchor, slot);
                (Source::Var(descriptor.origin), Target::Slot(slot))
            } else {
                let slot = *slot_of.get(&descriptor.anchor).ok_or(unresolved)?;
                (Source::Slot(slot), Target::Slot(slot))
            };

            if let Source::Slot(released) = rhs {
                free.push(released);
            }

            steps.push(Step {
                descriptor: index,
                op: descriptor.op,
                lhs,
                rhs,
                dst,
            });
        }

        if !slot_of.is_empty() {
            return Err(ExprError::UnconsumedChains {
                count: slot_of.len(),
            });
        }

        Ok(Plan { steps, slots, root })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of temporary slots the evaluation needs.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Number of descriptors the plan executes, one step each.
    pub fn descriptor_count(&self) -> usize {
        self.steps.len()
    }

    pub fn root(&self) -> PlanRoot {
        self.root
    }

    pub fn origin(&self) -> VarId {
        self.root.origin
    }

    /// Element count of the evaluated buffer.
    pub fn len(&self) -> usize {
        self.root.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.len == 0
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Accumulator => f.write_str("acc"),
            Source::Slot(slot) => write!(f, "s{slot}"),
            Source::Var(var) => write!(f, "{var}"),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Accumulator => f.write_str("acc"),
            Target::Slot(slot) => write!(f, "s{slot}"),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} = {} {} {}",
            self.descriptor,
            self.dst,
            self.lhs,
            self.op.symbol(),
            self.rhs
        )
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "plan len={} slots={} acc <- {}",
            self.root.len, self.slots, self.root.origin
        )?;
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        Ok(())
    }
}
