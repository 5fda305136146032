//! Lazy expression recording.
//!
//! An [`Expression`] owns the operation log for one expression at a time. Buffers are
//! registered as [`Operand`] handles; combining handles with `+ - * /` appends an
//! [`OpDescriptor`] to the log and returns a [`Chain`] naming the running value of the
//! sub-expression, without touching any buffer. Evaluating the root chain resolves,
//! plans, and executes the whole log in one pass and then clears it.
//!
//! ```
//! use lazy_lanes::{Buffer, Expression};
//!
//! let a: Buffer<f64> = Buffer::filled(16, 1.0);
//! let b = Buffer::filled(16, 2.0);
//! let c = Buffer::filled(16, 3.0);
//!
//! let expr = Expression::<f64>::new();
//! let [x, y, z] = expr.vars([&a, &b, &c]);
//! let result = (x * y + z).eval().unwrap();
//! assert!(result.all_eq(5.0));
//! ```

mod builder;
mod descriptor;
mod handle;

pub use builder::Expression;
pub use descriptor::{ChainId, OpDescriptor, Rhs, VarId};
pub use handle::{Chain, LazyValue, Operand};
