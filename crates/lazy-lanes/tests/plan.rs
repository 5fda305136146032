use lazy_lanes::resolve::resolve;
use lazy_lanes::{
    BinaryOp, Buffer, ChainId, EvalOptions, ExprError, Expression, OpDescriptor, Plan, PlanRoot,
    Rhs, Source, Target, VarId,
};

fn buffers(count: usize, len: usize) -> Vec<Buffer<f32>> {
    (0..count).map(|i| Buffer::filled(len, i as f32 + 1.0)).collect()
}

#[test]
fn accumulator_chain_needs_no_slots() {
    let l = buffers(3, 16);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [x, y, z] = expr.vars([&l[0], &l[1], &l[2]]);
    let root = x * y + z;

    let plan = expr.plan(&root).expect("plan");
    assert_eq!(plan.slot_count(), 0);
    assert_eq!(plan.len(), 16);
    assert_eq!(plan.origin(), VarId(0));
    assert_eq!(
        plan.root(),
        PlanRoot {
            origin: VarId(0),
            chain: root.id(),
            len: 16,
        }
    );
    assert_eq!(plan.descriptor_count(), 2);
    assert_eq!(
        plan.to_string(),
        "plan len=16 slots=0 acc <- v0\n  #0 acc = acc * v1\n  #1 acc = acc + v2\n"
    );

    // planning leaves the log in place
    assert_eq!(expr.len(), 2);
    assert!(root.eval().expect("eval").all_eq(5.0));
}

#[test]
fn canonical_products_share_one_slot() {
    let l = buffers(5, 8);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [l0, l1, l2, l3, l4] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
    let root = l0 * l1 + l2 * l3 + l4 * l1 + l2 * l3 + l4 * l1;

    let plan = expr.plan(&root).expect("plan");
    assert_eq!(plan.slot_count(), 1);
    let steps = plan.steps();
    assert_eq!(steps.len(), 9);
    assert_eq!(steps[1].lhs, Source::Var(VarId(2)));
    assert_eq!(steps[1].rhs, Source::Var(VarId(3)));
    assert_eq!(steps[1].dst, Target::Slot(0));
    assert_eq!(steps[2].lhs, Source::Accumulator);
    assert_eq!(steps[2].rhs, Source::Slot(0));
    assert_eq!(steps[2].dst, Target::Accumulator);
    assert!(root.eval().expect("eval").all_eq(46.0));
}

#[test]
fn nested_subchains_hold_slots_until_consumed() {
    let l = buffers(5, 8);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [a, b, c, d, e] = expr.vars([&l[0], &l[1], &l[2], &l[3], &l[4]]);
    let root = a + b * (c * (d * e));

    let plan = expr.plan(&root).expect("plan");
    assert_eq!(plan.slot_count(), 2);
    let rendered: Vec<String> = plan.steps().iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "#0 s0 = v3 * v4",
            "#1 s1 = v2 * s0",
            "#2 s0 = v1 * s1",
            "#3 acc = acc + s0",
        ]
    );
    // 1 + 2 * (3 * (4 * 5))
    assert!(root.eval().expect("eval").all_eq(121.0));
}

#[test]
fn continued_subchain_updates_its_slot_in_place() {
    let l = buffers(4, 8);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [a, c, d, e] = expr.vars([&l[0], &l[1], &l[2], &l[3]]);
    let root = a + (c * d + e);

    let plan = expr.plan(&root).expect("plan");
    let step = plan.steps()[1];
    assert_eq!(step.op, BinaryOp::Add);
    assert_eq!(step.lhs, Source::Slot(0));
    assert_eq!(step.dst, Target::Slot(0));
    assert_eq!(plan.steps()[2].rhs, Source::Slot(0));
}

#[test]
fn unconsumed_subchain_fails_planning() {
    let l = buffers(3, 8);
    let expr = Expression::with_options(EvalOptions::builtin());
    let [x, y, z] = expr.vars([&l[0], &l[1], &l[2]]);
    let _left_over = y * z;
    let _other = z - y;
    let root = x + y;

    assert_eq!(
        expr.plan(&root).unwrap_err(),
        ExprError::UnconsumedChains { count: 2 }
    );
}

#[test]
fn chain_operand_without_producer_is_unresolved() {
    let mut log = vec![
        OpDescriptor::new(0, ChainId(0), VarId(0), true, Rhs::Var(VarId(1)), BinaryOp::Add),
        OpDescriptor::new(1, ChainId(0), VarId(0), false, Rhs::Chain(ChainId(3)), BinaryOp::Mul),
    ];
    resolve(&mut log);
    let root = PlanRoot {
        origin: VarId(0),
        chain: Some(ChainId(0)),
        len: 4,
    };
    assert_eq!(
        Plan::build(&log, root).unwrap_err(),
        ExprError::UnresolvedChain { sequence_id: 1 }
    );
}

#[test]
fn chain_from_another_expression_is_rejected() {
    let l = buffers(4, 8);
    let first = Expression::with_options(EvalOptions::builtin());
    let second = Expression::with_options(EvalOptions::builtin());
    let [x, y] = first.vars([&l[0], &l[1]]);
    let [u, v] = second.vars([&l[2], &l[3]]);
    let mine = x * y;
    let theirs = u - v;

    assert_eq!(first.plan(&theirs).unwrap_err(), ExprError::ForeignOperand);
    assert_eq!(second.plan(&mine).unwrap_err(), ExprError::ForeignOperand);
    assert!(second.plan(&theirs).is_ok());

    // both logs are untouched
    assert!(mine.eval().expect("eval").all_eq(2.0));
    assert!(theirs.eval().expect("eval").all_eq(-1.0));
}
