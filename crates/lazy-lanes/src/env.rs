use std::env;
use std::sync::OnceLock;

use crate::error::{ExprError, ExprResult};
use crate::eval::{EvalOptions, Remainder};

pub(crate) const REMAINDER_VAR: &str = "LAZY_LANES_REMAINDER";
pub(crate) const BATCH_VAR: &str = "LAZY_LANES_BATCH";

static DEFAULT_OPTIONS: OnceLock<EvalOptions> = OnceLock::new();

fn read(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

pub(crate) fn parse_remainder(value: &str) -> ExprResult<Remainder> {
    value.parse()
}

pub(crate) fn parse_batch(value: &str) -> ExprResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(lanes) if lanes > 0 => Ok(lanes),
        _ => Err(ExprError::InvalidOption {
            key: BATCH_VAR,
            value: value.to_string(),
        }),
    }
}

/// Options from the environment, failing on the first unparsable override.
pub(crate) fn options_from_env() -> ExprResult<EvalOptions> {
    let mut options = EvalOptions::builtin();
    if let Some(value) = read(REMAINDER_VAR) {
        options.remainder = parse_remainder(&value)?;
    }
    if let Some(value) = read(BATCH_VAR) {
        options.lanes_per_batch = parse_batch(&value)?;
    }
    Ok(options)
}

/// Process-wide defaults, read once. Invalid overrides fall back to the built-in value.
pub(crate) fn default_options() -> EvalOptions {
    *DEFAULT_OPTIONS.get_or_init(|| {
        let builtin = EvalOptions::builtin();
        let remainder = read(REMAINDER_VAR)
            .map(|value| {
                parse_remainder(&value).unwrap_or_else(|err| {
                    tracing::warn!(%err, "using default remainder policy");
                    builtin.remainder
                })
            })
            .unwrap_or(builtin.remainder);
        let lanes_per_batch = read(BATCH_VAR)
            .map(|value| {
                parse_batch(&value).unwrap_or_else(|err| {
                    tracing::warn!(%err, "using default lanes per batch");
                    builtin.lanes_per_batch
                })
            })
            .unwrap_or(builtin.lanes_per_batch);
        EvalOptions {
            remainder,
            lanes_per_batch,
        }
    })
}
