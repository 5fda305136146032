use lazy_lanes::{
    BinaryOp, Buffer, ChainId, EvalOptions, ExprError, Expression, OpDescriptor, Rhs, VarId,
};

fn expression<'a>() -> Expression<'a, f32> {
    Expression::with_options(EvalOptions::builtin())
}

#[test]
fn recording_computes_nothing() {
    let a = Buffer::filled(16, 1.0f32);
    let b = Buffer::filled(16, 2.0);
    let c = Buffer::filled(16, 3.0);
    let expr = expression();
    let [x, y, z] = expr.vars([&a, &b, &c]);

    let root = x * y + z;
    assert_eq!(expr.len(), 2);
    assert_eq!(
        expr.descriptors(),
        vec![
            OpDescriptor::new(0, ChainId(0), VarId(0), true, Rhs::Var(VarId(1)), BinaryOp::Mul),
            OpDescriptor::new(1, ChainId(0), VarId(0), false, Rhs::Var(VarId(2)), BinaryOp::Add),
        ]
    );
    assert!(a.all_eq(1.0) && b.all_eq(2.0) && c.all_eq(3.0));

    let out = root.eval().expect("eval");
    assert!(out.all_eq(5.0));
    assert!(expr.is_empty());
}

#[test]
fn parenthesised_operand_opens_a_new_chain() {
    let bufs: Vec<Buffer<f32>> = (0..3).map(|_| Buffer::filled(8, 1.0)).collect();
    let expr = expression();
    let [a, b, c] = expr.vars([&bufs[0], &bufs[1], &bufs[2]]);

    let root = a + b * c;
    let log = expr.descriptors();
    assert_eq!(log[0].anchor, ChainId(0));
    assert_eq!(log[0].origin, VarId(1));
    assert_eq!(log[1].anchor, ChainId(1));
    assert_eq!(log[1].origin, VarId(0));
    assert!(log[1].opens);
    assert_eq!(log[1].rhs, Rhs::Chain(ChainId(0)));
    assert_eq!(root.id(), Some(ChainId(1)));
    assert!(root.eval().expect("eval").all_eq(2.0));
}

#[test]
fn operand_handles_alias_their_buffer() {
    let a = Buffer::from_vec(vec![1.0f32, 2.0, 3.0]);
    let expr = expression();
    let x = expr.var(&a);
    let y = x;
    assert_eq!(x.id(), y.id());
    assert_eq!(y.data().as_ptr(), a.as_ptr());
    assert_eq!((x * y).eval().expect("eval").as_slice(), &[1.0, 4.0, 9.0]);
}

#[test]
fn length_mismatch_is_reported_by_evaluation() {
    let a = Buffer::filled(8, 1.0f32);
    let b = Buffer::filled(9, 1.0f32);
    let expr = expression();
    let [x, y] = expr.vars([&a, &b]);

    let err = (x + y).eval().unwrap_err();
    assert_eq!(
        err,
        ExprError::LengthMismatch {
            op: BinaryOp::Add,
            expected: 8,
            found: 9
        }
    );
    assert!(expr.is_empty());
}

#[test]
fn first_recording_error_wins() {
    let a = Buffer::filled(8, 1.0f32);
    let b = Buffer::filled(4, 1.0f32);
    let expr = expression();
    let other = expression();
    let [x, y] = expr.vars([&a, &b]);
    let foreign = other.var(&a);

    let bad = x * y;
    let err = (bad + foreign).eval().unwrap_err();
    assert!(matches!(err, ExprError::LengthMismatch { op: BinaryOp::Mul, .. }));
    assert!(other.is_empty());
}

#[test]
fn foreign_operand_is_rejected() {
    let a = Buffer::filled(8, 1.0f32);
    let first = expression();
    let second = expression();
    let x = first.var(&a);
    let y = second.var(&a);

    assert_eq!((x + y).eval().unwrap_err(), ExprError::ForeignOperand);
    assert!(first.is_empty() && second.is_empty());
}

#[test]
fn chain_from_cleared_log_is_stale() {
    let a = Buffer::filled(8, 1.0f32);
    let b = Buffer::filled(8, 2.0f32);
    let expr = expression();
    let [x, y] = expr.vars([&a, &b]);

    let old = x * y;
    expr.clear();
    assert_eq!((old + x).eval().unwrap_err(), ExprError::StaleChain);

    let old = x * y;
    expr.clear();
    assert_eq!(old.eval().unwrap_err(), ExprError::StaleChain);
}

#[test]
fn dangling_subchain_is_reported() {
    let a = Buffer::filled(8, 1.0f32);
    let b = Buffer::filled(8, 2.0f32);
    let expr = expression();
    let [x, y] = expr.vars([&a, &b]);

    let _dangling = x * y;
    let err = (x + y).eval().unwrap_err();
    assert_eq!(err, ExprError::UnconsumedChains { count: 1 });
}

#[test]
fn builder_recovers_after_failed_evaluation() {
    let a = Buffer::filled(8, 1.0f32);
    let b = Buffer::filled(3, 2.0f32);
    let c = Buffer::filled(8, 2.0f32);
    let expr = expression();
    let [x, y, z] = expr.vars([&a, &b, &c]);

    assert!((x + y).eval().is_err());
    assert!((x + z).eval().expect("eval").all_eq(3.0));
}

#[test]
fn free_function_evaluates_chain() {
    let a = Buffer::filled(12, 3.0f64);
    let expr = Expression::with_options(EvalOptions::builtin());
    let x = expr.var(&a);
    let out = lazy_lanes::eval(x * x - x).expect("eval");
    assert!(out.all_eq(6.0));
}
