use lazy_lanes::{EvalOptions, ExprError, Remainder};

// Single test: environment variables are process-wide.
#[test]
fn from_env_reads_and_validates_overrides() {
    std::env::remove_var("LAZY_LANES_REMAINDER");
    std::env::remove_var("LAZY_LANES_BATCH");
    assert_eq!(EvalOptions::from_env().unwrap(), EvalOptions::builtin());

    std::env::set_var("LAZY_LANES_REMAINDER", "truncate");
    std::env::set_var("LAZY_LANES_BATCH", "4");
    assert_eq!(
        EvalOptions::from_env().unwrap(),
        EvalOptions::new(Remainder::Truncate, 4)
    );

    std::env::set_var("LAZY_LANES_BATCH", "zero");
    assert_eq!(
        EvalOptions::from_env().unwrap_err(),
        ExprError::InvalidOption {
            key: "LAZY_LANES_BATCH",
            value: "zero".to_string()
        }
    );

    std::env::set_var("LAZY_LANES_BATCH", " ");
    std::env::set_var("LAZY_LANES_REMAINDER", "scalar");
    assert_eq!(EvalOptions::from_env().unwrap(), EvalOptions::builtin());
}
