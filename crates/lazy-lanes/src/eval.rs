//! Batched execution of an evaluation plan.
//!
//! The output buffer doubles as the root chain's accumulator: it is seeded with the root
//! origin and every accumulator step updates it in place. Sub-chains live in a temporary
//! pool sized for one batch, so memory use depends on the plan's slot count and the batch
//! width, never on the buffer length.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::env;
use crate::error::{ExprError, ExprResult};
use crate::kernel::lane_aligned_len;
use crate::plan::{Plan, Source, Target};

/// What happens to the `len % LANES` elements after the last whole lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Remainder {
    /// Run every step with scalar arithmetic over the tail.
    #[default]
    ScalarTail,
    /// Leave the tail holding the seeded root values.
    Truncate,
}

impl Remainder {
    pub fn as_str(self) -> &'static str {
        match self {
            Remainder::ScalarTail => "scalar_tail",
            Remainder::Truncate => "truncate",
        }
    }
}

impl fmt::Display for Remainder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Remainder {
    type Err = ExprError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "scalar" | "scalar_tail" | "scalar-tail" => Ok(Remainder::ScalarTail),
            "truncate" => Ok(Remainder::Truncate),
            _ => Err(ExprError::InvalidOption {
                key: env::REMAINDER_VAR,
                value: value.trim().to_string(),
            }),
        }
    }
}

pub const DEFAULT_LANES_PER_BATCH: usize = 1;

/// Evaluation knobs.
///
/// `Default` honours the `LAZY_LANES_REMAINDER` and `LAZY_LANES_BATCH` overrides;
/// [`EvalOptions::builtin`] ignores the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalOptions {
    pub remainder: Remainder,
    /// Whole lanes processed per batch. Zero is treated as one, and values beyond the
    /// buffer's lane count are capped to it.
    pub lanes_per_batch: usize,
}

impl EvalOptions {
    pub const fn new(remainder: Remainder, lanes_per_batch: usize) -> Self {
        EvalOptions {
            remainder,
            lanes_per_batch,
        }
    }

    pub const fn builtin() -> Self {
        Self::new(Remainder::ScalarTail, DEFAULT_LANES_PER_BATCH)
    }

    /// Reads the environment now, reporting the first invalid override.
    pub fn from_env() -> ExprResult<Self> {
        env::options_from_env()
    }

    pub fn with_remainder(mut self, remainder: Remainder) -> Self {
        self.remainder = remainder;
        self
    }

    pub fn with_lanes_per_batch(mut self, lanes_per_batch: usize) -> Self {
        self.lanes_per_batch = lanes_per_batch.max(1);
        self
    }
}

impl Default for EvalOptions {
    fn default() -> Self {
        env::default_options()
    }
}

/// Work counters for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EvalReport {
    pub elements: usize,
    pub full_lanes: usize,
    /// Tail elements computed with scalar arithmetic.
    pub tail_elements: usize,
    /// Tail elements left at their seeded value.
    pub skipped_elements: usize,
    pub steps: usize,
    pub slots: usize,
    pub lane_ops: usize,
    pub scalar_ops: usize,
}

impl EvalReport {
    /// Elements holding the evaluated expression.
    pub fn computed_elements(&self) -> usize {
        self.elements - self.skipped_elements
    }
}

/// Per-batch scratch space for sub-chain slots.
struct TempPool<T> {
    data: Vec<T>,
    stride: usize,
}

impl<T: Element> TempPool<T> {
    fn new(slots: usize, stride: usize) -> Self {
        TempPool {
            data: vec![T::default(); slots * stride],
            stride,
        }
    }

    #[inline]
    fn offset(&self, slot: usize, local: usize) -> usize {
        slot * self.stride + local
    }
}

/// Borrowed state for one evaluation pass.
struct Frame<'p, 'v, T> {
    out: &'p mut [T],
    vars: &'p [&'v [T]],
    pool: TempPool<T>,
}

impl<T: Element> Frame<'_, '_, T> {
    #[inline]
    fn load(&self, src: Source, at: usize, local: usize) -> T::Lane {
        match src {
            Source::Accumulator => T::load(&self.out[at..]),
            Source::Slot(slot) => T::load(&self.pool.data[self.pool.offset(slot, local)..]),
            Source::Var(var) => T::load(&self.vars[var.index()][at..]),
        }
    }

    #[inline]
    fn store(&mut self, dst: Target, lane: T::Lane, at: usize, local: usize) {
        match dst {
            Target::Accumulator => T::store(lane, &mut self.out[at..]),
            Target::Slot(slot) => {
                let offset = self.pool.offset(slot, local);
                T::store(lane, &mut self.pool.data[offset..]);
            }
        }
    }

    #[inline]
    fn get(&self, src: Source, at: usize, local: usize) -> T {
        match src {
            Source::Accumulator => self.out[at],
            Source::Slot(slot) => self.pool.data[self.pool.offset(slot, local)],
            Source::Var(var) => self.vars[var.index()][at],
        }
    }

    #[inline]
    fn set(&mut self, dst: Target, value: T, at: usize, local: usize) {
        match dst {
            Target::Accumulator => self.out[at] = value,
            Target::Slot(slot) => {
                let offset = self.pool.offset(slot, local);
                self.pool.data[offset] = value;
            }
        }
    }
}

/// Runs `plan` over `vars`, writing the root's value into `out`.
pub(crate) fn execute<T: Element>(
    plan: &Plan,
    vars: &[&[T]],
    out: &mut [T],
    options: &EvalOptions,
) -> ExprResult<EvalReport> {
    let len = plan.len();
    if out.len() != len {
        return Err(ExprError::OutputLength {
            expected: len,
            found: out.len(),
        });
    }

    let n = T::LANES;
    let full = lane_aligned_len::<T>(len);
    // A batch never spans more lanes than the buffer has.
    let batch = options.lanes_per_batch.clamp(1, (full / n).max(1)) * n;
    let tail = len - full;
    let steps = plan.steps();

    out.copy_from_slice(&vars[plan.origin().index()][..len]);

    let mut frame = Frame {
        out,
        vars,
        pool: TempPool::new(plan.slot_count(), batch),
    };

    for base in (0..full).step_by(batch) {
        let width = batch.min(full - base);
        for step in steps {
            for local in (0..width).step_by(n) {
                let at = base + local;
                let lhs = frame.load(step.lhs, at, local);
                let rhs = frame.load(step.rhs, at, local);
                frame.store(step.dst, step.op.apply_lane::<T>(lhs, rhs), at, local);
            }
        }
    }

    let tail_elements = match options.remainder {
        Remainder::ScalarTail => {
            for step in steps {
                for at in full..len {
                    let local = at - full;
                    let lhs = frame.get(step.lhs, at, local);
                    let rhs = frame.get(step.rhs, at, local);
                    frame.set(step.dst, step.op.apply_scalar(lhs, rhs), at, local);
                }
            }
            tail
        }
        Remainder::Truncate => 0,
    };

    let report = EvalReport {
        elements: len,
        full_lanes: full / n,
        tail_elements,
        skipped_elements: tail - tail_elements,
        steps: steps.len(),
        slots: plan.slot_count(),
        lane_ops: steps.len() * (full / n),
        scalar_ops: steps.len() * tail_elements,
    };
    tracing::debug!(
        element = T::NAME,
        elements = report.elements,
        steps = report.steps,
        slots = report.slots,
        full_lanes = report.full_lanes,
        lanes_per_batch = batch / n,
        remainder = %options.remainder,
        skipped = report.skipped_elements,
        "evaluated expression"
    );
    Ok(report)
}
