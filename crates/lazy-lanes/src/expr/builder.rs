//! Expression builder owning the operation log for one lazily written expression.

use std::cell::RefCell;
use std::fmt;

use crate::buffer::Buffer;
use crate::element::Element;
use crate::error::{ExprError, ExprResult};
use crate::eval::{self, EvalOptions, EvalReport};
use crate::kernel::BinaryOp;
use crate::plan::{Plan, PlanRoot};
use crate::resolve;

use super::descriptor::{ChainId, OpDescriptor, Rhs, VarId};
use super::handle::{Chain, Operand, Term};

/// Explicit "begin expression" object.
///
/// Handles created through [`Expression::var`] record operations into this builder's log
/// when combined with `+ - * /`. Evaluating a chain consumes the log: descriptors are
/// resolved, planned, executed, and cleared in one call, after which the builder can record
/// the next expression over the same variables.
pub struct Expression<'a, T: Element> {
    log: RefCell<ExprLog<'a, T>>,
    options: EvalOptions,
}

#[derive(Debug, Clone, Copy)]
struct ChainRecord {
    origin: VarId,
    len: usize,
}

struct ExprLog<'a, T> {
    vars: Vec<&'a [T]>,
    descriptors: Vec<OpDescriptor>,
    chains: Vec<ChainRecord>,
    generation: u32,
    error: Option<ExprError>,
}

/// Everything an evaluation needs once the log has been taken.
pub(crate) struct Prepared<'a, T> {
    pub(crate) plan: Plan,
    pub(crate) vars: Vec<&'a [T]>,
}

impl<'a, T: Element> ExprLog<'a, T> {
    fn new() -> Self {
        ExprLog {
            vars: Vec::new(),
            descriptors: Vec::new(),
            chains: Vec::new(),
            generation: 0,
            error: None,
        }
    }

    fn latch(&mut self, err: ExprError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn live_chain(&mut self, id: ChainId, generation: u32) -> Option<ChainRecord> {
        if generation != self.generation {
            self.latch(ExprError::StaleChain);
            return None;
        }
        self.chains.get(id.index()).copied()
    }

    fn open_chain(&mut self, origin: VarId, len: usize) -> ChainId {
        let id = ChainId(self.chains.len() as u32);
        self.chains.push(ChainRecord { origin, len });
        id
    }

    /// Appends one descriptor, latching the first error instead of recording on failure.
    fn push(&mut self, lhs: Term, rhs: Term, op: BinaryOp) -> Option<ChainId> {
        let (anchor, origin, expected) = match lhs {
            Term::Var(var) => (None, var, self.vars[var.index()].len()),
            Term::Chain { id, generation } => {
                let record = self.live_chain(id, generation)?;
                (Some(id), record.origin, record.len)
            }
            Term::Poisoned => return None,
        };
        let (rhs, found) = match rhs {
            Term::Var(var) => (Rhs::Var(var), self.vars[var.index()].len()),
            Term::Chain { id, generation } => {
                (Rhs::Chain(id), self.live_chain(id, generation)?.len)
            }
            Term::Poisoned => return None,
        };
        if expected != found {
            self.latch(ExprError::LengthMismatch {
                op,
                expected,
                found,
            });
            return None;
        }

        let opens = anchor.is_none();
        let anchor = match anchor {
            Some(id) => id,
            None => self.open_chain(origin, expected),
        };
        let sequence_id = self.descriptors.len();
        self.descriptors.push(OpDescriptor::new(
            sequence_id,
            anchor,
            origin,
            opens,
            rhs,
            op,
        ));
        Some(anchor)
    }

    fn root_of(&self, root: Term) -> ExprResult<PlanRoot> {
        match root {
            Term::Var(var) => Ok(PlanRoot {
                origin: var,
                chain: None,
                len: self.vars[var.index()].len(),
            }),
            Term::Chain { id, generation } if generation == self.generation => {
                let record = self
                    .chains
                    .get(id.index())
                    .ok_or(ExprError::StaleChain)?;
                Ok(PlanRoot {
                    origin: record.origin,
                    chain: Some(id),
                    len: record.len,
                })
            }
            _ => Err(ExprError::StaleChain),
        }
    }

    /// Empties the log and starts a new generation, returning what was recorded.
    fn take(&mut self) -> (Vec<OpDescriptor>, Option<ExprError>) {
        let descriptors = std::mem::take(&mut self.descriptors);
        self.chains.clear();
        let error = self.error.take();
        self.generation = self.generation.wrapping_add(1);
        (descriptors, error)
    }
}

impl<'a, T: Element> Expression<'a, T> {
    /// Begins an expression using the process-wide default options.
    pub fn new() -> Self {
        Self::with_options(EvalOptions::default())
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Expression {
            log: RefCell::new(ExprLog::new()),
            options,
        }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Registers a buffer and returns a handle aliasing it.
    ///
    /// Registrations live as long as the expression and survive evaluation and
    /// [`clear`](Self::clear). Register each buffer once and reuse its handle across
    /// expressions rather than calling this in a loop.
    pub fn var<B: AsRef<[T]> + ?Sized>(&'a self, data: &'a B) -> Operand<'a, T> {
        let mut log = self.log.borrow_mut();
        let var = VarId(log.vars.len() as u32);
        log.vars.push(data.as_ref());
        Operand::new(self, var)
    }

    /// Registers several buffers at once, in order.
    pub fn vars<B: AsRef<[T]> + ?Sized, const K: usize>(
        &'a self,
        data: [&'a B; K],
    ) -> [Operand<'a, T>; K] {
        data.map(|buf| self.var(buf))
    }

    /// Number of descriptors recorded since the last evaluation.
    pub fn len(&self) -> usize {
        self.log.borrow().descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the operation log as recorded, before resolution.
    pub fn descriptors(&self) -> Vec<OpDescriptor> {
        self.log.borrow().descriptors.clone()
    }

    /// Snapshot of the operation log with producer links resolved.
    pub fn resolved(&self) -> Vec<OpDescriptor> {
        let mut descriptors = self.descriptors();
        resolve::resolve(&mut descriptors);
        descriptors
    }

    /// Builds the evaluation plan for `root` without consuming the log.
    pub fn plan(&self, root: &Chain<'a, T>) -> ExprResult<Plan> {
        if !std::ptr::eq(root.expression(), self) {
            return Err(ExprError::ForeignOperand);
        }
        let log = self.log.borrow();
        if let Some(err) = &log.error {
            return Err(err.clone());
        }
        let root = log.root_of(root.term())?;
        let mut descriptors = log.descriptors.clone();
        resolve::resolve(&mut descriptors);
        Plan::build(&descriptors, root)
    }

    /// Discards everything recorded so far without evaluating it.
    pub fn clear(&self) {
        let _ = self.log.borrow_mut().take();
    }

    pub(crate) fn record(&'a self, lhs: Term, rhs: Term, op: BinaryOp) -> Chain<'a, T> {
        let mut log = self.log.borrow_mut();
        let generation = log.generation;
        let id = log.push(lhs, rhs, op);
        Chain::new(self, id, generation)
    }

    pub(crate) fn latch(&self, err: ExprError) {
        self.log.borrow_mut().latch(err);
    }

    /// Takes the log, resolves it, and plans the evaluation of `root`.
    ///
    /// The log is cleared whether or not planning succeeds.
    pub(crate) fn prepare(&self, root: Term) -> ExprResult<Prepared<'a, T>> {
        let mut log = self.log.borrow_mut();
        let vars = log.vars.clone();
        let resolved_root = log.root_of(root);
        let (mut descriptors, error) = log.take();
        drop(log);

        if let Some(err) = error {
            return Err(err);
        }
        let root = resolved_root?;
        let links = resolve::resolve(&mut descriptors);
        tracing::trace!(
            descriptors = descriptors.len(),
            links,
            "resolved operation log"
        );
        let plan = Plan::build(&descriptors, root)?;
        Ok(Prepared { plan, vars })
    }

    pub(crate) fn evaluate(&self, root: Term) -> ExprResult<(Buffer<T>, EvalReport)> {
        let prepared = self.prepare(root)?;
        let mut out = Buffer::zeros(prepared.plan.len());
        let report = eval::execute(&prepared.plan, &prepared.vars, &mut out, &self.options)?;
        Ok((out, report))
    }

    pub(crate) fn evaluate_into(&self, root: Term, out: &mut [T]) -> ExprResult<EvalReport> {
        let prepared = self.prepare(root)?;
        eval::execute(&prepared.plan, &prepared.vars, out, &self.options)
    }

    pub(crate) fn data(&self, var: VarId) -> &'a [T] {
        self.log.borrow().vars[var.index()]
    }
}

impl<T: Element> Default for Expression<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> fmt::Debug for Expression<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let log = self.log.borrow();
        f.debug_struct("Expression")
            .field("element", &T::NAME)
            .field("vars", &log.vars.len())
            .field("descriptors", &log.descriptors.len())
            .field("generation", &log.generation)
            .field("options", &self.options)
            .finish()
    }
}
